//! Error types for pdfweave library.

use thiserror::Error;

/// Result type alias for pdfweave operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while building a PDF document.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Page index is outside the valid range for the operation.
    #[error("Page index {index} is out of range (document has {page_count} pages)")]
    IndexOutOfRange {
        /// The index that was requested
        index: isize,
        /// Number of pages in the document at the time of the call
        page_count: usize,
    },

    /// Text does not match the expected grammar (e.g. a malformed date string).
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// A name object was constructed from empty or illegal text.
    #[error("Invalid name: {0:?}")]
    InvalidName(String),

    /// The page tree is not in a consistent state. This indicates a bug.
    #[error("Page tree invariant violated: {0}")]
    InvariantViolation(String),

    /// The page already belongs to a page tree.
    #[error("Page is already attached to a document")]
    PageAlreadyAttached,

    /// A leaf offered to the page tree is not a `/Page` dictionary.
    #[error("Expected a /Page dictionary, found /Type {0}")]
    NotAPage(String),

    /// Error while rendering the object graph.
    #[error("Rendering error: {0}")]
    Render(String),
}

impl Error {
    pub(crate) fn invariant(message: impl Into<String>) -> Self {
        Error::InvariantViolation(message.into())
    }
}
