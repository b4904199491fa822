//! Document model types.
//!
//! This module defines the in-memory object graph of a PDF under
//! construction: the primitive values, the document skeleton (trailer,
//! information dictionary, catalog) and the page tree.

mod date;
mod document;
mod object;
mod page;
mod page_tree;
mod skeleton;

pub use date::PdfDate;
pub use document::Document;
pub use object::{Dictionary, Name, NodeId, Object, PdfString, Reference, StringKind, WeakReference};
pub use page::Page;
pub use skeleton::{Environment, FixedEnvironment, SystemEnvironment, PRODUCER};
