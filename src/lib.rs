//! # Site Gallery
//!
//! Image galleries for static site generators. Each directory under the
//! gallery root is an album; building an album copies its images and renders
//! a thumbnail and a set of named sizes per image.
//!
//! # How It Hooks In
//!
//! The plugin attaches to a site generator through lifecycle signals and a
//! markup directive (see [`host`] for the model of the generator side):
//!
//! ```text
//! generator_init               →  remember the first generator
//! article_generator_finalized  →  article.album / article.gallery_images
//! page_generator_finalized     →  page.gallery (album → image filenames)
//! .. gallery:: <name>          →  gallery HTML via the `gallery` template
//! ```
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use site_gallery::config::load_site_settings;
//! use site_gallery::host::{Generator, Site};
//! use site_gallery::plugin::GalleryPlugin;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut site = Site::new();
//! GalleryPlugin::new().register(&mut site);
//!
//! let settings = load_site_settings("site.toml".as_ref())?;
//! let generator = Arc::new(Generator::with_builtin_templates(settings));
//! site.signals.send_generator_init(&generator);
//!
//! let html = site_gallery::directive::expand(".. gallery:: harbour\n", &site.directives)?;
//! # Ok(())
//! # }
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | `site.toml` loading, layered gallery settings, validation, stock config |
//! | [`scan`] | Album and image discovery |
//! | [`naming`] | `NNN-name` ordering and display titles |
//! | [`imaging`] | Pure-Rust image operations: identify, resize, thumbnail |
//! | [`cache`] | Content-addressed cache that skips unchanged renders |
//! | [`gallery`] | Builds one album into a [`gallery::Gallery`] |
//! | [`host`] | Generator, articles, pages, signals and directive registry |
//! | [`plugin`] | Signal handlers and the shared generator handle |
//! | [`directive`] | `.. name:: argument` parsing and the `gallery` directive |
//! | [`templates`] | Built-in Maud `gallery` template |
//! | [`output`] | CLI output formatting |
//!
//! # Settings Precedence
//!
//! ```text
//! stock defaults  <  [gallery] in site.toml  <  directive options / params
//! ```
//!
//! Missing albums are not errors: [`gallery::build_gallery`] returns `None`
//! and the template renders a placeholder.

pub mod cache;
pub mod config;
pub mod directive;
pub mod gallery;
pub mod host;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod plugin;
pub mod scan;
pub mod templates;

#[cfg(test)]
pub(crate) mod test_helpers;
