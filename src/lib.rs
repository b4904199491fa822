//! # pdfweave
//!
//! Programmatic construction of PDF documents.
//!
//! This library holds the in-memory object model of a PDF under
//! construction: the cross-reference placeholder, trailer, information
//! dictionary, catalog and the hierarchical page tree, together with the
//! operations that edit the page tree while keeping it well formed.
//!
//! ## Quick Start
//!
//! ```
//! use pdfweave::{Document, Page};
//!
//! fn main() -> pdfweave::Result<()> {
//!     let mut doc = Document::new();
//!     let cover = Page::a4();
//!
//!     doc.append_page(Page::a4())?
//!         .append_page(Page::letter())?
//!         .insert_page(cover.clone(), 0)?;
//!
//!     assert_eq!(doc.page_count(), 3);
//!     assert!(doc.get_page(0)?.ptr_eq(&cover));
//!
//!     let removed = doc.pop_page(-1)?;
//!     assert_eq!(removed.get_size(), Some((612.0, 792.0)));
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Typed primitives**: names, literal/hex strings and dates stay distinct
//! - **Nested page trees**: insert and remove anywhere in arbitrarily deep trees
//! - **Identity semantics**: pages are shared handles located by identity
//! - **Non-owning back links**: `/Parent` never keeps a node alive
//! - **Reproducible output**: clock and identifier source are injectable

pub mod error;
pub mod model;
pub mod options;
pub mod render;

// Re-export commonly used types
pub use error::{Error, Result};
pub use model::{
    Dictionary, Document, Environment, FixedEnvironment, Name, Object, Page, PdfDate, PdfString,
    Reference, StringKind, SystemEnvironment, WeakReference,
};
pub use options::{Conformance, DocumentOptions};
pub use render::JsonFormat;

/// Dump a document's object graph to JSON.
///
/// # Example
///
/// ```
/// use pdfweave::{to_json, Document, JsonFormat, Page};
///
/// let mut doc = Document::new();
/// doc.append_page(Page::a4()).unwrap();
/// let json = to_json(&doc, JsonFormat::Compact).unwrap();
/// assert!(json.contains("\"Count\":1"));
/// ```
pub fn to_json(doc: &Document, format: JsonFormat) -> Result<String> {
    render::to_json(doc, format)
}
