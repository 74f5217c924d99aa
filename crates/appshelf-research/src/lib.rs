//! Literature search across Semantic Scholar and OpenAlex.
//!
//! Both indexes are queried concurrently; results are merged by DOI, can be
//! sorted several ways, and open-access PDFs can be saved into the local
//! document library.

pub mod doi;
pub mod merge;
pub mod naming;
pub mod openalex;
pub mod semantic_scholar;
pub mod service;
pub mod source;
pub mod types;

pub use merge::{merge_results, sort_results, visible_results};
pub use naming::{format_authors, make_pdf_name, make_unique_name};
pub use service::ResearchService;
pub use source::{PaperIndex, PdfFetcher};
pub use types::*;
