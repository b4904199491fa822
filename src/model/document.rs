//! Document-level types.

use std::cell::{Ref, RefCell, RefMut};
use std::collections::HashSet;
use std::rc::{Rc, Weak};

use super::date::PdfDate;
use super::object::{Dictionary, Name, NodeId, Object, PdfString, Reference};
use super::skeleton::{self, Environment, SystemEnvironment};
use crate::error::{Error, Result};
use crate::options::{Conformance, DocumentOptions};

/// Shared state that pages point back to.
pub(crate) struct DocumentCore {
    objects: RefCell<Dictionary>,
    options: DocumentOptions,
    environment: Box<dyn Environment>,
}

/// A PDF document under construction.
///
/// The document owns its skeleton and every interior page-tree node.
/// Pages are shared with whatever handles the caller keeps.
pub struct Document {
    core: Rc<DocumentCore>,
}

impl Document {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self::with_options(DocumentOptions::default())
    }

    /// Create a new empty document with the given options.
    pub fn with_options(options: DocumentOptions) -> Self {
        Self::with_environment(options, SystemEnvironment)
    }

    /// Create a new empty document that takes its clock and identifiers
    /// from `environment`.
    pub fn with_environment(options: DocumentOptions, environment: impl Environment + 'static) -> Self {
        if let Some(conformance) = options.conformance {
            if options.on_non_conformance_print_warning {
                log::warn!("Conformance to {} is recorded but not enforced", conformance);
            } else {
                log::debug!("Creating document targeting {}", conformance);
            }
        }
        Self {
            core: Rc::new(DocumentCore {
                objects: RefCell::new(Dictionary::new()),
                options,
                environment: Box::new(environment),
            }),
        }
    }

    /// Options the document was created with.
    pub fn options(&self) -> &DocumentOptions {
        &self.core.options
    }

    /// Conformance profile the document was created with.
    pub fn conformance_at_create(&self) -> Option<Conformance> {
        self.core.options.conformance
    }

    /// Fill in any missing skeleton entries. Existing entries are kept.
    pub fn normalize(&mut self) -> Result<&mut Self> {
        self.ensure_skeleton()?;
        Ok(self)
    }

    pub(crate) fn ensure_skeleton(&self) -> Result<()> {
        let mut objects = self.core.objects.borrow_mut();
        skeleton::normalize(&mut objects, self.core.environment.as_ref())
    }

    /// The top-level object mapping (`/XRef`, `/Trailer`).
    pub fn objects(&self) -> Ref<'_, Dictionary> {
        self.core.objects.borrow()
    }

    /// Mutable access to the top-level object mapping.
    pub fn objects_mut(&mut self) -> RefMut<'_, Dictionary> {
        self.core.objects.borrow_mut()
    }

    /// The catalog (`/Trailer/Root`), once the skeleton exists.
    pub fn catalog(&self) -> Option<Reference> {
        skeleton::catalog(&self.objects())
    }

    /// The root of the page tree (`/Trailer/Root/Pages`).
    pub fn root_pages(&self) -> Option<Reference> {
        skeleton::root_pages(&self.objects())
    }

    /// The information dictionary (`/Trailer/Info`).
    pub fn info(&self) -> Option<Reference> {
        skeleton::info(&self.objects())
    }

    /// The two halves of `/Trailer/ID`.
    pub fn identifier(&self) -> Option<Vec<PdfString>> {
        skeleton::identifier(&self.objects())
    }

    /// Number of pages, as recorded on the root of the page tree.
    pub fn page_count(&self) -> usize {
        let Some(root) = self.root_pages() else {
            return 0;
        };
        let count = root.borrow().get("Count").and_then(Object::as_integer);
        count
            .and_then(|count| usize::try_from(count).ok())
            .unwrap_or(0)
    }

    /// Check if the document has any pages.
    pub fn is_empty(&self) -> bool {
        self.page_count() == 0
    }

    pub fn author(&self) -> Option<String> {
        self.info_text("Author")
    }

    pub fn creator(&self) -> Option<String> {
        self.info_text("Creator")
    }

    pub fn keywords(&self) -> Option<String> {
        self.info_text("Keywords")
    }

    pub fn producer(&self) -> Option<String> {
        self.info_text("Producer")
    }

    pub fn subject(&self) -> Option<String> {
        self.info_text("Subject")
    }

    pub fn title(&self) -> Option<String> {
        self.info_text("Title")
    }

    /// `/CreationDate`; `None` if missing or malformed.
    pub fn creation_date(&self) -> Option<PdfDate> {
        self.info_date("CreationDate")
    }

    /// `/ModDate`; `None` if missing or malformed.
    pub fn modification_date(&self) -> Option<PdfDate> {
        self.info_date("ModDate")
    }

    pub fn set_author(&mut self, author: impl Into<String>) -> Result<&mut Self> {
        self.set_info_text(Name::AUTHOR, author.into())
    }

    pub fn set_creator(&mut self, creator: impl Into<String>) -> Result<&mut Self> {
        self.set_info_text(Name::CREATOR, creator.into())
    }

    pub fn set_keywords(&mut self, keywords: impl Into<String>) -> Result<&mut Self> {
        self.set_info_text(Name::KEYWORDS, keywords.into())
    }

    pub fn set_producer(&mut self, producer: impl Into<String>) -> Result<&mut Self> {
        self.set_info_text(Name::PRODUCER, producer.into())
    }

    pub fn set_subject(&mut self, subject: impl Into<String>) -> Result<&mut Self> {
        self.set_info_text(Name::SUBJECT, subject.into())
    }

    pub fn set_title(&mut self, title: impl Into<String>) -> Result<&mut Self> {
        self.set_info_text(Name::TITLE, title.into())
    }

    fn info_text(&self, key: &str) -> Option<String> {
        let info = self.info()?;
        let info = info.borrow();
        info.get(key).and_then(Object::as_string).map(PdfString::to_text)
    }

    fn info_date(&self, key: &str) -> Option<PdfDate> {
        let info = self.info()?;
        let info = info.borrow();
        match info.get(key)? {
            Object::Date(date) => Some(*date),
            // Persisted values may arrive as plain strings.
            Object::String(text) => PdfDate::parse(&text.to_text()).ok(),
            _ => None,
        }
    }

    fn set_info_text(&mut self, key: Name, value: String) -> Result<&mut Self> {
        self.ensure_skeleton()?;
        let info = self
            .info()
            .ok_or_else(|| Error::invariant("/Trailer/Info missing after normalization"))?;
        info.borrow_mut().set(key, Object::literal(value));
        Ok(self)
    }

    pub(crate) fn downgrade(&self) -> Weak<DocumentCore> {
        Rc::downgrade(&self.core)
    }

    pub(crate) fn owns(&self, document: &Weak<DocumentCore>) -> bool {
        Weak::ptr_eq(document, &self.downgrade())
    }

    /// Check every page-tree invariant.
    ///
    /// Verifies that each interior `/Count` matches the pages below it, that
    /// every page's `/Parent` is the node listing it, that the root has no
    /// `/Parent`, that no node is reachable twice, and that every page points
    /// back at this document. A document without a skeleton is trivially
    /// valid.
    pub fn validate(&self) -> Result<()> {
        let Some(root) = self.root_pages() else {
            return Ok(());
        };
        if root.borrow().contains_key("Parent") {
            return Err(Error::invariant("root of the page tree has a /Parent"));
        }
        let mut seen = HashSet::new();
        seen.insert(root.id());
        self.validate_node(&root, &mut seen)?;
        Ok(())
    }

    /// Returns the number of pages below `node`.
    fn validate_node(&self, node: &Reference, seen: &mut HashSet<NodeId>) -> Result<i64> {
        let dict = node.borrow();
        if dict.has_type("Page") {
            if !self.owns(&node.document()) {
                return Err(Error::invariant("page does not point back at its document"));
            }
            return Ok(1);
        }
        if !dict.has_type("Pages") {
            return Err(Error::invariant(format!(
                "page-tree node has /Type {:?}",
                dict.type_name()
            )));
        }

        let kids = dict
            .get("Kids")
            .and_then(Object::as_array)
            .ok_or_else(|| Error::invariant("interior node has no /Kids array"))?;
        let mut total = 0;
        for kid in kids {
            let kid = kid
                .as_reference()
                .ok_or_else(|| Error::invariant(format!("/Kids entry is a {}", kid.type_name())))?;
            if !seen.insert(kid.id()) {
                return Err(Error::invariant("node is reachable more than once"));
            }
            let (is_page, parent_ok) = {
                let kid = kid.borrow();
                let parent = kid.get("Parent");
                let points_here = parent
                    .and_then(Object::as_back_reference)
                    .is_some_and(|parent| parent.points_to(node));
                (kid.has_type("Page"), points_here || (parent.is_none() && !kid.has_type("Page")))
            };
            if !parent_ok {
                return Err(Error::invariant(if is_page {
                    "page /Parent does not point at the node listing it"
                } else {
                    "interior node /Parent does not point at the node listing it"
                }));
            }
            total += self.validate_node(kid, seen)?;
        }

        let count = dict.get("Count").and_then(Object::as_integer);
        if count != Some(total) {
            return Err(Error::invariant(format!(
                "/Count is {:?} but {} pages are reachable",
                count, total
            )));
        }
        Ok(total)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("options", &self.core.options)
            .field("page_count", &self.page_count())
            .finish()
    }
}
