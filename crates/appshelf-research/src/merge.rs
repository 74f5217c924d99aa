//! Merge, order, and filter results from the two sources.

use std::collections::{HashMap, HashSet};

use crate::naming::{format_authors, make_pdf_name};
use crate::types::{Paper, PaperView, ResultSource, SortKey};

fn fill<T>(slot: &mut Option<T>, other: Option<T>) {
    if slot.is_none() {
        *slot = other;
    }
}

/// Fold `other` into `existing`, keeping every value `existing` already has.
fn absorb(existing: &mut Paper, other: Paper) {
    if existing.source != other.source {
        existing.source = ResultSource::Both;
    }
    if existing.authors.is_empty() {
        existing.authors = other.authors;
    }
    fill(&mut existing.abstract_text, other.abstract_text);
    fill(&mut existing.journal, other.journal);
    fill(&mut existing.open_access_url, other.open_access_url);
    fill(&mut existing.year, other.year);
    fill(&mut existing.citation_count, other.citation_count);
    fill(&mut existing.influential_citation_count, other.influential_citation_count);
    fill(&mut existing.doi_url, other.doi_url);
}

/// Merge by DOI with the first list taking precedence. Records without a
/// DOI follow all DOI records, in input order.
pub fn merge_results(first: Vec<Paper>, second: Vec<Paper>) -> Vec<Paper> {
    let mut with_doi: Vec<Paper> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut without_doi: Vec<Paper> = Vec::new();

    for paper in first.into_iter().chain(second) {
        match paper.doi.clone() {
            Some(doi) => match index.get(&doi) {
                // Repeats within one source also keep the earlier record.
                Some(&at) => absorb(&mut with_doi[at], paper),
                None => {
                    index.insert(doi, with_doi.len());
                    with_doi.push(paper);
                }
            },
            None => without_doi.push(paper),
        }
    }

    with_doi.extend(without_doi);
    with_doi
}

/// Stable sort by `key`. Missing counts sort as -1, missing years last.
pub fn sort_results(papers: &mut [Paper], key: SortKey) {
    match key {
        SortKey::Relevance => papers.sort_by_key(|p| p.rank),
        SortKey::Citations => papers.sort_by_key(|p| std::cmp::Reverse(p.citation_count.unwrap_or(-1))),
        SortKey::Influential => {
            papers.sort_by_key(|p| std::cmp::Reverse(p.influential_citation_count.unwrap_or(-1)))
        }
        SortKey::Newest => papers.sort_by_key(|p| std::cmp::Reverse(p.year.unwrap_or(0))),
        SortKey::Oldest => papers.sort_by_key(|p| p.year.unwrap_or(9999)),
    }
}

/// Whether the paper is already in the library under its generated name.
pub fn in_library(paper: &Paper, library: &HashSet<String>) -> bool {
    library.contains(&make_pdf_name(paper))
}

/// Results shown in the search view: those that can be added or are already
/// in the library, sorted by `key`.
pub fn visible_results(papers: &[Paper], key: SortKey, library: &HashSet<String>) -> Vec<PaperView> {
    let mut shown: Vec<Paper> = papers
        .iter()
        .filter(|p| p.open_access_url.is_some() || in_library(p, library))
        .cloned()
        .collect();
    sort_results(&mut shown, key);

    shown
        .into_iter()
        .map(|paper| {
            let in_library = in_library(&paper, library);
            PaperView {
                authors_label: format_authors(&paper.authors),
                can_add: !in_library && paper.open_access_url.is_some(),
                in_library,
                paper,
            }
        })
        .collect()
}
