//! Markup directives.
//!
//! A directive block starts with `.. name:: argument` and owns every
//! following line indented deeper than the marker, blank lines included:
//!
//! ```text
//! Some text.
//!
//! .. gallery:: Summer Trip
//!    :quality: 70
//!    :thumbnail.crop: false
//!
//! More text.
//! ```
//!
//! The argument is the rest of the marker line with the ends trimmed, so
//! `Summer Trip` is a single argument. Indented lines directly below the
//! marker, up to the first blank or option line, continue the argument and
//! are joined with single spaces. Leading `:key: value` body lines
//! are options; for `gallery` they override gallery settings for this one
//! call (`70` parses as an integer, `false` as a boolean, anything that is
//! not a TOML value as a string).
//!
//! [`expand`] replaces each block handled by a registered directive with the
//! directive's HTML. Text outside those blocks, including unknown
//! directives, is left untouched.

use crate::gallery;
use crate::host::{DirectiveRegistry, TemplateError};
use crate::plugin::{GalleryPlugin, PluginError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DirectiveError {
    #[error("line {line}: `{directive}` directive requires an argument")]
    MissingArgument { directive: String, line: usize },
    #[error("line {line}: template `{name}` not found")]
    UnknownTemplate { name: String, line: usize },
    #[error("line {line}: gallery failed: {source}")]
    Gallery { line: usize, source: PluginError },
    #[error("line {line}: {source}")]
    Template { line: usize, source: TemplateError },
}

/// One parsed directive block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveBlock {
    pub name: String,
    /// `None` when the marker line has nothing after `::`.
    pub argument: Option<String>,
    pub options: Vec<(String, String)>,
    /// Remaining content lines, dedented, without surrounding blank lines.
    pub content: Vec<String>,
    /// 1-based line of the marker.
    pub line: usize,
}

/// A named directive that renders a block to raw HTML.
pub trait Directive {
    fn run(&self, block: &DirectiveBlock) -> Result<String, DirectiveError>;
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

/// Parse a marker line into `(indent, name, argument)`.
fn parse_marker(line: &str) -> Option<(usize, &str, Option<&str>)> {
    let body = line.trim_start().strip_prefix("..")?;
    if !body.starts_with(char::is_whitespace) {
        return None;
    }
    let (name, rest) = body.trim_start().split_once("::")?;
    if name.is_empty() || name.contains(char::is_whitespace) {
        return None;
    }
    let argument = rest.trim();
    Some((
        indent_of(line),
        name,
        (!argument.is_empty()).then_some(argument),
    ))
}

/// Parse a `:key: value` field line.
pub fn parse_field(line: &str) -> Option<(String, String)> {
    let (key, value) = line.strip_prefix(':')?.split_once(':')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key.to_string(), value.trim().to_string()))
}

/// Split a block's body into argument continuation lines, options and
/// content.
fn parse_body(lines: &[&str]) -> (Vec<String>, Vec<(String, String)>, Vec<String>) {
    let dedent = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| indent_of(l))
        .min()
        .unwrap_or(0);
    let mut body = lines
        .iter()
        .map(|l| l.get(dedent..).unwrap_or("").trim_end())
        .peekable();

    // Lines before the first blank or option line continue the argument
    let mut continuation = Vec::new();
    while let Some(line) = body.next_if(|l| !l.is_empty() && parse_field(l).is_none()) {
        continuation.push(line.trim_start().to_string());
    }

    let mut body = body.skip_while(|l| l.is_empty()).peekable();
    let mut options = Vec::new();
    while let Some(option) = body.peek().and_then(|l| parse_field(l)) {
        options.push(option);
        body.next();
    }

    let mut content: Vec<String> = body
        .skip_while(|l| l.is_empty())
        .map(str::to_string)
        .collect();
    while content.last().is_some_and(|l| l.is_empty()) {
        content.pop();
    }
    (continuation, options, content)
}

/// Find every directive block in `text`, with the line range it spans.
pub fn parse(text: &str) -> Vec<(std::ops::Range<usize>, DirectiveBlock)> {
    let lines: Vec<&str> = text.lines().collect();
    let mut blocks = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        let Some((indent, name, argument)) = parse_marker(lines[i]) else {
            i += 1;
            continue;
        };

        // Trailing blank lines stay outside the block
        let mut end = i + 1;
        let mut j = i + 1;
        while j < lines.len() {
            if lines[j].trim().is_empty() {
                j += 1;
            } else if indent_of(lines[j]) > indent {
                j += 1;
                end = j;
            } else {
                break;
            }
        }

        let (continuation, options, content) = parse_body(&lines[i + 1..end]);
        let argument = argument
            .map(str::to_string)
            .into_iter()
            .chain(continuation)
            .collect::<Vec<_>>()
            .join(" ");
        blocks.push((
            i..end,
            DirectiveBlock {
                name: name.to_string(),
                argument: (!argument.is_empty()).then_some(argument),
                options,
                content,
                line: i + 1,
            },
        ));
        i = end;
    }
    blocks
}

/// Replace every registered directive block in `text` with its output.
///
/// Everything else, line endings included, is copied through unchanged.
pub fn expand(text: &str, registry: &DirectiveRegistry) -> Result<String, DirectiveError> {
    let lines: Vec<&str> = text.split_inclusive('\n').collect();
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;

    for (range, block) in parse(text) {
        let Some(directive) = registry.get(&block.name) else {
            continue;
        };
        let html = directive.run(&block)?;
        out.extend(lines[cursor..range.start].iter().copied());
        out.push_str(&html);
        let last = lines[range.end - 1];
        out.push_str(&last[last.trim_end_matches(['\r', '\n']).len()..]);
        cursor = range.end;
    }
    out.extend(lines[cursor..].iter().copied());
    Ok(out)
}

/// `.. gallery:: <name>`: render an album through the `gallery` template.
#[derive(Clone)]
pub struct GalleryDirective {
    plugin: GalleryPlugin,
}

impl GalleryDirective {
    pub fn new(plugin: GalleryPlugin) -> Self {
        Self { plugin }
    }
}

impl Directive for GalleryDirective {
    fn run(&self, block: &DirectiveBlock) -> Result<String, DirectiveError> {
        let line = block.line;
        let name = block
            .argument
            .as_deref()
            .ok_or_else(|| DirectiveError::MissingArgument {
                directive: block.name.clone(),
                line,
            })?;

        let generator = self
            .plugin
            .generator()
            .map_err(|source| DirectiveError::Gallery { line, source })?;
        let template =
            generator
                .get_template("gallery")
                .ok_or_else(|| DirectiveError::UnknownTemplate {
                    name: "gallery".to_string(),
                    line,
                })?;

        let params = (!block.options.is_empty()).then(|| {
            gallery::params_from_pairs(
                block
                    .options
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.as_str())),
            )
        });
        let gallery = self
            .plugin
            .get_gallery(name, params.as_ref())
            .map_err(|source| DirectiveError::Gallery { line, source })?;

        let context = serde_json::json!({ "name": name, "gallery": gallery });
        template
            .render(&context)
            .map_err(|source| DirectiveError::Template { line, source })
    }
}
