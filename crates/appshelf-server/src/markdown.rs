//! Markdown documents for the spec viewer.

use std::path::Path;

use pulldown_cmark::{html, Event, Options, Parser};
use tracing::debug;

use appshelf_core::apps::SpecEntry;
use appshelf_core::{Error, Result};

/// Render markdown to HTML. Thematic breaks (`---`) are dropped.
pub fn render_markdown(source: &str) -> String {
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_FOOTNOTES;
    let parser = Parser::new_ext(source, options).filter(|event| !matches!(event, Event::Rule));
    let mut out = String::with_capacity(source.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Placeholder shown when a registered document has no file yet.
fn placeholder(entry: &SpecEntry) -> String {
    format!(
        "# {}\n\nNo document yet. Add `{}.md` to the specs directory to fill this page.\n",
        entry.label, entry.key
    )
}

/// Markdown source for `entry` from `specs_dir/{key}.md`, or a placeholder
/// when the file does not exist. Returns the source and whether it was found.
pub fn load_source(specs_dir: &Path, entry: &SpecEntry) -> Result<(String, bool)> {
    let path = specs_dir.join(format!("{}.md", entry.key));
    match std::fs::read_to_string(&path) {
        Ok(source) => Ok((source, true)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No spec file at {}", path.display());
            Ok((placeholder(entry), false))
        }
        Err(e) => Err(Error::Io(e)),
    }
}
