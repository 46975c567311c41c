//! Minimal site-generator host.
//!
//! Models the parts of a static site generator the gallery plugin hooks into:
//!
//! - a [`Generator`] holding site settings and named templates
//! - article and page generators, each with their finished content
//! - [`Signals`], the lifecycle hooks plugins connect to
//! - a [`DirectiveRegistry`] of markup directives
//!
//! A generator run looks like:
//!
//! ```text
//! send_generator_init(generator)            # once per generator
//! send_article_generator_finalized(articles)
//! send_page_generator_finalized(pages)
//! directive::expand(text, registry)         # per document
//! ```
//!
//! Handlers run in registration order. A failing handler stops dispatch.

use crate::config::SiteSettings;
use crate::directive::Directive;
use crate::templates;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Invalid template context: {0}")]
    Context(#[from] serde_json::Error),
    #[error("Template render failed: {0}")]
    Render(String),
}

#[derive(Error, Debug)]
pub enum SignalError {
    #[error("{signal} handler failed: {source}")]
    Handler {
        signal: &'static str,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// A template renders a JSON context to HTML.
pub trait Template: Send + Sync {
    fn render(&self, context: &serde_json::Value) -> Result<String, TemplateError>;
}

/// Site settings plus the templates available to content.
pub struct Generator {
    pub settings: SiteSettings,
    templates: HashMap<String, Box<dyn Template>>,
}

impl Generator {
    /// A generator with no templates.
    pub fn new(settings: SiteSettings) -> Self {
        Self {
            settings,
            templates: HashMap::new(),
        }
    }

    /// A generator with the built-in templates registered.
    pub fn with_builtin_templates(settings: SiteSettings) -> Self {
        let mut generator = Self::new(settings);
        generator.add_template("gallery", templates::GalleryTemplate);
        generator
    }

    /// Register `template` under `name`, replacing any previous one.
    pub fn add_template(&mut self, name: &str, template: impl Template + 'static) {
        self.templates.insert(name.to_string(), Box::new(template));
    }

    pub fn get_template(&self, name: &str) -> Option<&dyn Template> {
        self.templates.get(name).map(|t| t.as_ref())
    }
}

impl std::fmt::Debug for Generator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.templates.keys().collect();
        names.sort();
        f.debug_struct("Generator")
            .field("settings", &self.settings)
            .field("templates", &names)
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Article {
    pub source: PathBuf,
    pub metadata: BTreeMap<String, String>,
    /// Album named by the `gallery` metadata key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    /// Image filenames of `album`.
    pub gallery_images: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Page {
    pub source: PathBuf,
    pub metadata: BTreeMap<String, String>,
    /// Album → image filenames, for pages using the `gallery` template.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gallery: Option<BTreeMap<String, Vec<String>>>,
}

#[derive(Debug)]
pub struct ArticlesGenerator {
    pub generator: Arc<Generator>,
    pub articles: Vec<Article>,
}

#[derive(Debug)]
pub struct PagesGenerator {
    pub generator: Arc<Generator>,
    pub pages: Vec<Page>,
}

pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

type InitHandler = Box<dyn Fn(&Arc<Generator>)>;
type ArticlesHandler = Box<dyn Fn(&mut ArticlesGenerator) -> HandlerResult>;
type PagesHandler = Box<dyn Fn(&mut PagesGenerator) -> HandlerResult>;

/// Lifecycle hooks.
#[derive(Default)]
pub struct Signals {
    generator_init: Vec<InitHandler>,
    article_generator_finalized: Vec<ArticlesHandler>,
    page_generator_finalized: Vec<PagesHandler>,
}

impl Signals {
    pub fn connect_generator_init(&mut self, handler: impl Fn(&Arc<Generator>) + 'static) {
        self.generator_init.push(Box::new(handler));
    }

    pub fn connect_article_generator_finalized(
        &mut self,
        handler: impl Fn(&mut ArticlesGenerator) -> HandlerResult + 'static,
    ) {
        self.article_generator_finalized.push(Box::new(handler));
    }

    pub fn connect_page_generator_finalized(
        &mut self,
        handler: impl Fn(&mut PagesGenerator) -> HandlerResult + 'static,
    ) {
        self.page_generator_finalized.push(Box::new(handler));
    }

    pub fn send_generator_init(&self, generator: &Arc<Generator>) {
        for handler in &self.generator_init {
            handler(generator);
        }
    }

    pub fn send_article_generator_finalized(
        &self,
        generator: &mut ArticlesGenerator,
    ) -> Result<(), SignalError> {
        for handler in &self.article_generator_finalized {
            handler(generator).map_err(|source| SignalError::Handler {
                signal: "article_generator_finalized",
                source,
            })?;
        }
        Ok(())
    }

    pub fn send_page_generator_finalized(
        &self,
        generator: &mut PagesGenerator,
    ) -> Result<(), SignalError> {
        for handler in &self.page_generator_finalized {
            handler(generator).map_err(|source| SignalError::Handler {
                signal: "page_generator_finalized",
                source,
            })?;
        }
        Ok(())
    }
}

/// Markup directives by name.
#[derive(Default)]
pub struct DirectiveRegistry {
    directives: HashMap<String, Box<dyn Directive>>,
}

impl DirectiveRegistry {
    pub fn register(&mut self, name: &str, directive: impl Directive + 'static) {
        self.directives.insert(name.to_string(), Box::new(directive));
    }

    pub fn get(&self, name: &str) -> Option<&dyn Directive> {
        self.directives.get(name).map(|d| d.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }
}

/// Everything a plugin registers onto.
#[derive(Default)]
pub struct Site {
    pub signals: Signals,
    pub directives: DirectiveRegistry,
}

impl Site {
    pub fn new() -> Self {
        Self::default()
    }
}
