//! Page-level types.

use std::cell::{Ref, RefMut};

use super::document::Document;
use super::object::{Dictionary, Name, Object, Reference};

/// A single page: a leaf of the page tree.
///
/// `Page` is a shared handle. Cloning it does not copy the page; the clone
/// and the original are the same leaf. A page is *detached* until it is
/// added to a document, at which point it gains a `/Parent` entry and a
/// back-reference to the document. Neither link keeps its target alive.
#[derive(Debug, Clone)]
pub struct Page {
    node: Reference,
}

impl Page {
    /// Create a new page with the given dimensions in points.
    pub fn new(width: f64, height: f64) -> Self {
        let mut dict = Dictionary::with_type(Name::PAGE);
        dict.set(
            Name::MEDIA_BOX,
            vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(width),
                Object::Real(height),
            ],
        );
        Self::from_dictionary(dict)
    }

    /// Create a new page with standard Letter size (8.5 x 11 inches).
    pub fn letter() -> Self {
        Self::new(612.0, 792.0) // 8.5 * 72, 11 * 72
    }

    /// Create a new page with standard A4 size (210 x 297 mm).
    pub fn a4() -> Self {
        Self::new(595.0, 842.0) // 210mm * 2.834, 297mm * 2.834
    }

    /// Wrap an attribute dictionary. `/Type /Page` is added if missing.
    pub fn from_dictionary(mut dict: Dictionary) -> Self {
        dict.get_or_insert_with(Name::TYPE, || Object::Name(Name::PAGE));
        Self {
            node: Reference::new(dict),
        }
    }

    pub(crate) fn from_reference(node: Reference) -> Self {
        Self { node }
    }

    /// The shared dictionary handle behind this page.
    pub fn reference(&self) -> &Reference {
        &self.node
    }

    pub fn dictionary(&self) -> Ref<'_, Dictionary> {
        self.node.borrow()
    }

    pub fn dictionary_mut(&self) -> RefMut<'_, Dictionary> {
        self.node.borrow_mut()
    }

    /// Page dimensions as a (width, height) tuple, read from `/MediaBox`.
    pub fn get_size(&self) -> Option<(f64, f64)> {
        let dict = self.dictionary();
        let media_box = dict.get("MediaBox")?.as_array()?;
        let [llx, lly, urx, ury] = media_box.as_slice() else {
            return None;
        };
        Some((
            (urx.as_number()? - llx.as_number()?).abs(),
            (ury.as_number()? - lly.as_number()?).abs(),
        ))
    }

    /// Check if the page is in landscape orientation.
    pub fn is_landscape(&self) -> bool {
        self.get_size().is_some_and(|(width, height)| width > height)
    }

    /// The interior node listing this page, while attached.
    pub fn parent(&self) -> Option<Reference> {
        let dict = self.dictionary();
        dict.get("Parent")?.as_back_reference()?.upgrade()
    }

    /// Whether the page currently belongs to a live document.
    pub fn is_attached(&self) -> bool {
        self.node.document().strong_count() > 0 || self.parent().is_some()
    }

    /// Whether the page belongs to `document`.
    pub fn belongs_to(&self, document: &Document) -> bool {
        document.owns(&self.node.document())
    }

    /// Identity comparison: true if both handles are the same leaf.
    pub fn ptr_eq(&self, other: &Page) -> bool {
        self.node.ptr_eq(&other.node)
    }

    pub(crate) fn attach(&self, parent: &Reference, document: &Document) {
        self.node
            .borrow_mut()
            .set(Name::PARENT, Object::BackReference(parent.downgrade()));
        self.node.set_document(document.downgrade());
    }

    pub(crate) fn detach(&self) {
        self.node.borrow_mut().remove("Parent");
        self.node.set_document(Default::default());
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::a4()
    }
}
