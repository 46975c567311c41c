//! The gallery plugin.
//!
//! [`GalleryPlugin::register`] hooks the plugin into a [`Site`]:
//!
//! | Hook | Handler | Effect |
//! |---|---|---|
//! | `generator_init` | [`GalleryPlugin::generator_init`] | remember the first generator |
//! | `article_generator_finalized` | [`add_gallery_post`] | `album` + `gallery_images` on articles with `gallery` metadata |
//! | `page_generator_finalized` | [`generate_gallery_page`] | album → images map on pages with `template: gallery` |
//! | directive `gallery` | [`GalleryDirective`] | embedded gallery HTML |
//!
//! The remembered generator supplies the settings and templates for the
//! directive and for [`GalleryPlugin::get_gallery`].

use crate::config::{ConfigError, GallerySettings, SiteSettings, resolve_gallery_settings};
use crate::directive::GalleryDirective;
use crate::gallery::{self, Gallery, GalleryError};
use crate::host::{ArticlesGenerator, Generator, PagesGenerator, Site};
use crate::imaging::RustBackend;
use crate::scan::{self, ScanError};
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum PluginError {
    #[error("gallery plugin used before generator init")]
    NotInitialized,
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Gallery(#[from] GalleryError),
}

/// Handle shared by every hook the plugin registers.
#[derive(Debug, Clone, Default)]
pub struct GalleryPlugin {
    generator: Arc<OnceLock<Arc<Generator>>>,
}

impl GalleryPlugin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect the signal handlers and the `gallery` directive.
    pub fn register(&self, site: &mut Site) {
        let plugin = self.clone();
        site.signals
            .connect_generator_init(move |generator| plugin.generator_init(generator));
        site.signals
            .connect_article_generator_finalized(|articles| Ok(add_gallery_post(articles)?));
        site.signals
            .connect_page_generator_finalized(|pages| Ok(generate_gallery_page(pages)?));
        site.directives
            .register("gallery", GalleryDirective::new(self.clone()));
    }

    /// Remember `generator` for templates and settings.
    ///
    /// Only the first generator is kept; any of them carries the same
    /// settings and templates.
    pub fn generator_init(&self, generator: &Arc<Generator>) {
        if self.generator.set(Arc::clone(generator)).is_err() {
            debug!("generator already registered, ignoring");
        }
    }

    /// The remembered generator.
    pub fn generator(&self) -> Result<&Arc<Generator>, PluginError> {
        self.generator.get().ok_or(PluginError::NotInitialized)
    }

    /// Build gallery `name` with the remembered generator's settings, with
    /// `params` applied on top.
    ///
    /// `Ok(None)` when the album directory does not exist.
    pub fn get_gallery(
        &self,
        name: &str,
        params: Option<&toml::Table>,
    ) -> Result<Option<Gallery>, PluginError> {
        let generator = self.generator()?;
        let built = gallery::get_gallery(&RustBackend::new(), &generator.settings, name, params)?;
        Ok(built.map(|(gallery, _)| gallery))
    }
}

fn content_root(site: &SiteSettings) -> Result<(GallerySettings, PathBuf), PluginError> {
    let settings = resolve_gallery_settings(site, None)?;
    let root = site.gallery_content_root(&settings);
    Ok((settings, root))
}

/// Attach `album` and `gallery_images` to every article with `gallery`
/// metadata. A missing album directory yields an empty image list.
pub fn add_gallery_post(generator: &mut ArticlesGenerator) -> Result<(), PluginError> {
    let (settings, root) = content_root(&generator.generator.settings)?;

    for article in &mut generator.articles {
        let Some(album) = article.metadata.get("gallery").cloned() else {
            continue;
        };
        article.gallery_images = if gallery::validate_name(&album).is_ok() {
            scan::list_images(&root.join(&album), &settings)?
        } else {
            warn!(album = %album, source = %article.source.display(), "invalid gallery name");
            Vec::new()
        };
        debug!(album = %album, images = article.gallery_images.len(), "article gallery");
        article.album = Some(album);
    }
    Ok(())
}

/// Attach the album → images map to every page whose `template` metadata is
/// `gallery`.
pub fn generate_gallery_page(generator: &mut PagesGenerator) -> Result<(), PluginError> {
    let wants_gallery = |page: &crate::host::Page| {
        page.metadata.get("template").map(String::as_str) == Some("gallery")
    };
    if !generator.pages.iter().any(wants_gallery) {
        return Ok(());
    }

    let (settings, root) = content_root(&generator.generator.settings)?;
    let galleries = scan::scan_galleries(&root, &settings)?;

    for page in generator.pages.iter_mut().filter(|p| wants_gallery(p)) {
        page.gallery = Some(galleries.clone());
    }
    Ok(())
}
