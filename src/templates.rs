//! Built-in templates.
//!
//! The `gallery` template renders the context `{ name, gallery }` produced by
//! the `gallery` directive:
//!
//! ```html
//! <div class="gallery" data-gallery="harbour">
//!   <figure>
//!     <a href="/images/gallery/harbour/001-boats.jpg">
//!       <img src="/images/gallery/harbour/thumbnails/001-boats.jpg" alt="boats" ...>
//!     </a>
//!     <figcaption>boats</figcaption>
//!   </figure>
//! </div>
//! ```
//!
//! A `null` gallery (no such album) renders an empty
//! `div.gallery.gallery-missing` so the page still builds.

use crate::gallery::Gallery;
use crate::host::{Template, TemplateError};
use maud::{Markup, html};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct GalleryContext {
    name: String,
    gallery: Option<Gallery>,
}

/// The `gallery` template.
#[derive(Debug, Default, Clone, Copy)]
pub struct GalleryTemplate;

impl Template for GalleryTemplate {
    fn render(&self, context: &serde_json::Value) -> Result<String, TemplateError> {
        let ctx = GalleryContext::deserialize(context)?;
        Ok(render_gallery(&ctx.name, ctx.gallery.as_ref()).into_string())
    }
}

/// Renders a gallery as a grid of linked thumbnails.
pub fn render_gallery(name: &str, gallery: Option<&Gallery>) -> Markup {
    html! {
        @if let Some(gallery) = gallery {
            div.gallery data-gallery=(name) {
                @for image in gallery.ordered() {
                    figure {
                        a href={ "/" (image.link) } {
                            img src={ "/" (image.thumbnail) } alt=(image.title) loading="lazy";
                        }
                        figcaption { (image.title) }
                    }
                }
            }
        } @else {
            div.gallery.gallery-missing data-gallery=(name) {}
        }
    }
}
