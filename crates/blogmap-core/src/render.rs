//! Markdown to HTML rendering for paper bodies.
//!
//! Uses pulldown-cmark with the GFM extensions the editor preview supports.
//! Raw HTML in the source is kept, then the whole document is cleaned by
//! ammonia against a fixed tag and attribute allowlist.

use std::collections::HashSet;

use ammonia::Builder;
use pulldown_cmark::{Options, Parser, html};

/// Turns a raw markdown body into HTML that is safe to embed in a page.
pub trait MarkdownSanitizer: Send + Sync {
    fn render(&self, raw: &str) -> String;
}

/// Tags that may carry `align`, on top of ammonia's defaults.
const ALIGNABLE: &[&str] = &["p", "h1", "h2", "h3", "h4", "h5", "h6"];

/// Link attributes allowed on `<a>`.
const LINK_ATTRIBUTES: &[&str] = &["href", "name", "target"];

/// URL schemes links and images may use. Relative URLs pass through.
const URL_SCHEMES: &[&str] = &["http", "https", "mailto", "ftp", "tel"];

/// Default sanitizer: markdown is rendered with raw HTML passed through,
/// then everything outside the allowlist is stripped. Script and style
/// elements are dropped with their content, event handler attributes are
/// removed, and link or image targets with other schemes lose the attribute.
#[derive(Debug, Clone, Copy, Default)]
pub struct SafeHtml;

impl SafeHtml {
    pub fn new() -> Self {
        Self
    }

    fn options() -> Options {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options
    }

    fn cleaner() -> Builder<'static> {
        let mut builder = Builder::default();
        builder
            .url_schemes(URL_SCHEMES.iter().copied().collect::<HashSet<_>>())
            .add_tag_attributes("a", LINK_ATTRIBUTES.iter().copied())
            .add_tag_attributes("img", ["src"])
            // Task list checkboxes.
            .add_tags(["input"])
            .add_tag_attributes("input", ["type", "checked", "disabled"]);
        for &tag in ALIGNABLE {
            builder.add_tag_attributes(tag, ["align"]);
        }
        builder
    }
}

impl MarkdownSanitizer for SafeHtml {
    fn render(&self, raw: &str) -> String {
        let parser = Parser::new_ext(raw, Self::options());
        let mut unsafe_html = String::with_capacity(raw.len() * 3 / 2);
        html::push_html(&mut unsafe_html, parser);

        Self::cleaner().clean(&unsafe_html).to_string()
    }
}
