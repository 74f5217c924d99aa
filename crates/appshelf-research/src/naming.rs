//! File names for papers saved to the library.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use appshelf_core::now_millis;

use crate::types::{Author, Paper};

static UNSAFE_FILENAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"[/\\:*?"<>|]"#).unwrap());

const TITLE_CHARS: usize = 60;
const MAX_SUFFIX: u32 = 200;

/// `"{last name of first author} - {title} ({year}).pdf"`.
pub fn make_pdf_name(paper: &Paper) -> String {
    let author = paper
        .authors
        .first()
        .and_then(|a| a.name.split_whitespace().last())
        .unwrap_or("Unknown");
    let title: String = paper.title.chars().take(TITLE_CHARS).collect();
    let title = UNSAFE_FILENAME_RE.replace_all(&title, "");
    let year = paper
        .year
        .map(|y| y.to_string())
        .unwrap_or_else(|| "n.d.".to_string());
    format!("{} - {} ({}).pdf", author, title.trim(), year)
}

/// `base` if free, else `"{stem} (2).pdf"`, `"{stem} (3).pdf"`, and so on.
pub fn make_unique_name(base: &str, existing: &HashSet<String>) -> String {
    if !existing.contains(base) {
        return base.to_string();
    }
    let stem = base.strip_suffix(".pdf").unwrap_or(base);
    (2..MAX_SUFFIX)
        .map(|i| format!("{} ({}).pdf", stem, i))
        .find(|candidate| !existing.contains(candidate))
        .unwrap_or_else(|| format!("{} ({}).pdf", stem, now_millis()))
}

/// Up to three names, then "et al.".
pub fn format_authors(authors: &[Author]) -> String {
    if authors.is_empty() {
        return "Unknown authors".to_string();
    }
    let names: Vec<&str> = authors.iter().take(3).map(|a| a.name.as_str()).collect();
    if authors.len() <= 3 {
        names.join(", ")
    } else {
        format!("{} et al.", names.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::tests::paper;
    use crate::types::ResultSource;

    fn author(name: &str) -> Author {
        Author { name: name.to_string(), author_id: None }
    }

    #[test]
    fn test_pdf_name() {
        let mut p = paper("x", 0, None, ResultSource::OpenAlex);
        p.authors = vec![author("Fischer Black"), author("Myron Scholes")];
        p.title = "The Pricing of Options: and Corporate Liabilities?".into();
        p.year = Some(1973);
        assert_eq!(
            make_pdf_name(&p),
            "Black - The Pricing of Options and Corporate Liabilities (1973).pdf"
        );

        p.authors.clear();
        p.year = None;
        p.title = "A".repeat(80);
        let name = make_pdf_name(&p);
        assert!(name.starts_with("Unknown - "));
        assert!(name.ends_with(&format!("{} (n.d.).pdf", "A".repeat(60))));
    }

    #[test]
    fn test_unique_name() {
        let mut existing = HashSet::new();
        assert_eq!(make_unique_name("a.pdf", &existing), "a.pdf");

        existing.insert("a.pdf".to_string());
        existing.insert("a (2).pdf".to_string());
        assert_eq!(make_unique_name("a.pdf", &existing), "a (3).pdf");
    }

    #[test]
    fn test_format_authors() {
        assert_eq!(format_authors(&[]), "Unknown authors");
        assert_eq!(format_authors(&[author("A"), author("B")]), "A, B");
        assert_eq!(
            format_authors(&[author("A"), author("B"), author("C"), author("D")]),
            "A, B, C et al."
        );
    }
}
