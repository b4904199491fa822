//! Document construction options.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Options recorded on a document when it is created.
///
/// None of these change how the page tree behaves; they are stored for
/// validators that run on the finished document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentOptions {
    /// Conformance profile the document is meant to satisfy
    pub conformance: Option<Conformance>,

    /// Print a warning when a validator finds a violation
    pub on_non_conformance_print_warning: bool,

    /// Fail hard when a validator finds a violation
    pub on_non_conformance_throw_assert: bool,
}

impl DocumentOptions {
    /// Create new document options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the conformance profile.
    pub fn with_conformance(mut self, conformance: Conformance) -> Self {
        self.conformance = Some(conformance);
        self
    }

    /// Print a warning on non-conformance.
    pub fn with_warnings(mut self, enabled: bool) -> Self {
        self.on_non_conformance_print_warning = enabled;
        self
    }

    /// Fail on non-conformance.
    pub fn with_assertions(mut self, enabled: bool) -> Self {
        self.on_non_conformance_throw_assert = enabled;
        self
    }

    /// Shorthand for warnings and assertions together.
    pub fn strict(self) -> Self {
        self.with_warnings(true).with_assertions(true)
    }
}

/// Conformance profiles (PDF/A and PDF/UA variants).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Conformance {
    #[serde(rename = "PDF/A-1a")]
    PdfA1a,
    #[serde(rename = "PDF/A-1b")]
    PdfA1b,
    #[serde(rename = "PDF/A-2a")]
    PdfA2a,
    #[serde(rename = "PDF/A-2b")]
    PdfA2b,
    #[serde(rename = "PDF/A-2u")]
    PdfA2u,
    #[serde(rename = "PDF/A-3a")]
    PdfA3a,
    #[serde(rename = "PDF/A-3b")]
    PdfA3b,
    #[serde(rename = "PDF/A-3u")]
    PdfA3u,
    #[serde(rename = "PDF/A-4")]
    PdfA4,
    #[serde(rename = "PDF/A-4e")]
    PdfA4e,
    #[serde(rename = "PDF/A-4f")]
    PdfA4f,
    #[serde(rename = "PDF/UA-1")]
    PdfUa1,
}

impl Conformance {
    /// The ISO part number (1 for PDF/A-1, 4 for PDF/A-4, ...).
    pub fn part(&self) -> u8 {
        match self {
            Conformance::PdfA1a | Conformance::PdfA1b | Conformance::PdfUa1 => 1,
            Conformance::PdfA2a | Conformance::PdfA2b | Conformance::PdfA2u => 2,
            Conformance::PdfA3a | Conformance::PdfA3b | Conformance::PdfA3u => 3,
            Conformance::PdfA4 | Conformance::PdfA4e | Conformance::PdfA4f => 4,
        }
    }

    /// Whether the profile requires a tagged (accessible) document.
    pub fn requires_tagging(&self) -> bool {
        matches!(
            self,
            Conformance::PdfA1a | Conformance::PdfA2a | Conformance::PdfA3a | Conformance::PdfUa1
        )
    }
}

impl fmt::Display for Conformance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Conformance::PdfA1a => "PDF/A-1a",
            Conformance::PdfA1b => "PDF/A-1b",
            Conformance::PdfA2a => "PDF/A-2a",
            Conformance::PdfA2b => "PDF/A-2b",
            Conformance::PdfA2u => "PDF/A-2u",
            Conformance::PdfA3a => "PDF/A-3a",
            Conformance::PdfA3b => "PDF/A-3b",
            Conformance::PdfA3u => "PDF/A-3u",
            Conformance::PdfA4 => "PDF/A-4",
            Conformance::PdfA4e => "PDF/A-4e",
            Conformance::PdfA4f => "PDF/A-4f",
            Conformance::PdfUa1 => "PDF/UA-1",
        };
        f.write_str(label)
    }
}
