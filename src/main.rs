use clap::{Parser, Subcommand};
use site_gallery::host::{Article, ArticlesGenerator, Generator, Page, PagesGenerator, Site};
use site_gallery::{config, directive, gallery, imaging::RustBackend, output, plugin, scan};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "site-gallery")]
#[command(about = "Image galleries for static sites")]
#[command(long_about = "\
Image galleries for static sites

Each directory under the gallery root is an album. Building an album copies
its images, renders a thumbnail and a set of named sizes per image, and makes
the result available to articles, pages and the `gallery` directive.

Content structure:

  site.toml                        # Site settings (optional)
  content/
  ├── images/gallery/
  │   ├── 010-Harbour/             # Album (numbered = ordered first)
  │   │   ├── 001-boats.jpg
  │   │   └── 002-pier.jpg
  │   └── lighthouse/
  │       └── beam.jpg
  ├── harbour.rst                  # :gallery: 010-Harbour
  └── photos.rst                   # :template: gallery

Embed a gallery in a document:

  .. gallery:: 010-Harbour
     :quality: 70

Run 'site-gallery gen-config' to generate a documented site.toml.")]
#[command(version)]
struct Cli {
    /// Site settings file
    #[arg(long, default_value = "site.toml", global = true)]
    config: PathBuf,

    /// Log every file operation
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List albums and their images
    Albums,
    /// Render originals, thumbnails and sizes for albums (default: all)
    Build {
        /// Album names
        names: Vec<String>,
        /// Disable the processing cache and re-encode every image
        #[arg(long)]
        no_cache: bool,
    },
    /// Expand gallery directives in a document and print the result
    Render { file: PathBuf },
    /// Run the article (or page) handler on a document and print its gallery data as JSON
    Attach {
        file: PathBuf,
        /// Treat the document as a page instead of an article
        #[arg(long)]
        page: bool,
    },
    /// Validate settings without building
    Check,
    /// Print a stock site.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Albums => {
            let site = config::load_site_settings(&cli.config)?;
            let settings = config::resolve_gallery_settings(&site, None)?;
            let root = site.gallery_content_root(&settings);
            let galleries = scan::scan_galleries(&root, &settings)?;
            output::print_albums_output(&galleries, &root);
        }
        Command::Build { names, no_cache } => {
            let site = config::load_site_settings(&cli.config)?;
            let mut settings = config::resolve_gallery_settings(&site, None)?;
            if no_cache {
                settings.use_cache = false;
            }
            let backend = RustBackend::new();

            let built = if names.is_empty() {
                gallery::build_all(&backend, &site, &settings)?
            } else {
                let mut built = Vec::new();
                for name in &names {
                    match gallery::build_gallery(&backend, &site, &settings, name)? {
                        Some(result) => built.push(result),
                        None => warn!(album = %name, "no such album, skipping"),
                    }
                }
                built
            };

            let mut cache = site_gallery::cache::CacheStats::default();
            let mut images = 0;
            for (i, (gallery, report)) in built.iter().enumerate() {
                output::print_build_output(i + 1, gallery, report, &settings);
                cache.absorb(report.cache);
                images += report.images;
            }
            output::print_build_summary(built.len(), images, &cache);
        }
        Command::Render { file } => {
            let text = std::fs::read_to_string(&file)?;
            let site = start_site(&cli.config)?;
            print!("{}", directive::expand(&text, &site.hooks.directives)?);
        }
        Command::Attach { file, page } => {
            let text = std::fs::read_to_string(&file)?;
            let metadata = read_metadata(&text);
            let site = start_site(&cli.config)?;
            let generator = Arc::clone(site.plugin.generator()?);

            let json = if page {
                let mut pages = PagesGenerator {
                    generator,
                    pages: vec![Page {
                        source: file,
                        metadata,
                        gallery: None,
                    }],
                };
                site.hooks.signals.send_page_generator_finalized(&mut pages)?;
                serde_json::to_string_pretty(&pages.pages[0])?
            } else {
                let mut articles = ArticlesGenerator {
                    generator,
                    articles: vec![Article {
                        source: file,
                        metadata,
                        ..Article::default()
                    }],
                };
                site.hooks
                    .signals
                    .send_article_generator_finalized(&mut articles)?;
                serde_json::to_string_pretty(&articles.articles[0])?
            };
            println!("{json}");
        }
        Command::Check => {
            let site = config::load_site_settings(&cli.config)?;
            let settings = config::resolve_gallery_settings(&site, None)?;
            let albums = scan::list_albums(&site.gallery_content_root(&settings))?;
            output::print_check_output(&site, &settings, albums.len());
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// `RUST_LOG` wins; otherwise warnings only, or debug with `--verbose`.
fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// A site with the gallery plugin registered and a generator initialized.
struct RunningSite {
    hooks: Site,
    plugin: plugin::GalleryPlugin,
}

fn start_site(config_path: &Path) -> Result<RunningSite, config::ConfigError> {
    let settings = config::load_site_settings(config_path)?;
    let generator = Arc::new(Generator::with_builtin_templates(settings));
    let mut hooks = Site::new();
    let plugin = plugin::GalleryPlugin::new();
    plugin.register(&mut hooks);
    hooks.signals.send_generator_init(&generator);
    Ok(RunningSite { hooks, plugin })
}

/// Document metadata from top-level `:key: value` field lines.
fn read_metadata(text: &str) -> BTreeMap<String, String> {
    text.lines()
        .filter_map(directive::parse_field)
        .collect()
}
