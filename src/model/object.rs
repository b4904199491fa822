//! PDF object types.
//!
//! Every value stored in a document is an [`Object`]. Dictionaries that need
//! an identity of their own (the catalog, page-tree nodes, pages) are held
//! behind a [`Reference`], the in-memory counterpart of an indirect object.
//! A [`WeakReference`] is the only non-owning edge in the graph and is used
//! for `Parent` links.

use std::borrow::{Borrow, Cow};
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use super::date::PdfDate;
use super::document::DocumentCore;
use crate::error::{Error, Result};

/// A name object (e.g. `/Type`, `/Pages`).
///
/// Names are distinct from strings even when their characters coincide.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Name(Cow<'static, str>);

impl Name {
    pub const TYPE: Name = Name::from_static("Type");
    pub const CATALOG: Name = Name::from_static("Catalog");
    pub const PAGES: Name = Name::from_static("Pages");
    pub const PAGE: Name = Name::from_static("Page");
    pub const KIDS: Name = Name::from_static("Kids");
    pub const COUNT: Name = Name::from_static("Count");
    pub const PARENT: Name = Name::from_static("Parent");
    pub const MEDIA_BOX: Name = Name::from_static("MediaBox");
    pub const XREF: Name = Name::from_static("XRef");
    pub const TRAILER: Name = Name::from_static("Trailer");
    pub const ROOT: Name = Name::from_static("Root");
    pub const INFO: Name = Name::from_static("Info");
    pub const ID: Name = Name::from_static("ID");
    pub const AUTHOR: Name = Name::from_static("Author");
    pub const CREATION_DATE: Name = Name::from_static("CreationDate");
    pub const CREATOR: Name = Name::from_static("Creator");
    pub const KEYWORDS: Name = Name::from_static("Keywords");
    pub const MOD_DATE: Name = Name::from_static("ModDate");
    pub const PRODUCER: Name = Name::from_static("Producer");
    pub const SUBJECT: Name = Name::from_static("Subject");
    pub const TITLE: Name = Name::from_static("Title");

    /// Create a name.
    ///
    /// Fails with [`Error::InvalidName`] for empty text or text containing NUL.
    pub fn new(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        if text.is_empty() || text.contains('\0') {
            return Err(Error::InvalidName(text));
        }
        Ok(Self(Cow::Owned(text)))
    }

    const fn from_static(text: &'static str) -> Self {
        Self(Cow::Borrowed(text))
    }

    /// The characters of the name, without the leading slash.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Name {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for Name {
    type Error = Error;

    fn try_from(text: &str) -> Result<Self> {
        Self::new(text)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.0)
    }
}

/// How a string is spelled on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringKind {
    /// `(text)`
    Literal,
    /// `<48656C6C6F>`
    Hex,
}

/// A string object with its sub-kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PdfString {
    kind: StringKind,
    bytes: Vec<u8>,
}

impl PdfString {
    /// Create a literal string.
    pub fn literal(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            kind: StringKind::Literal,
            bytes: bytes.into(),
        }
    }

    /// Create a hex string from raw bytes.
    pub fn hex(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            kind: StringKind::Hex,
            bytes: bytes.into(),
        }
    }

    /// Create a hex string from its digits (`"48656C6C6F"`).
    pub fn from_hex_digits(digits: &str) -> Result<Self> {
        if digits.len() % 2 != 0 {
            return Err(Error::InvalidFormat(format!(
                "odd number of hex digits: {:?}",
                digits
            )));
        }
        let bytes = (0..digits.len())
            .step_by(2)
            .map(|i| {
                digits
                    .get(i..i + 2)
                    .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                    .ok_or_else(|| Error::InvalidFormat(format!("not hex digits: {:?}", digits)))
            })
            .collect::<Result<Vec<u8>>>()?;
        Ok(Self::hex(bytes))
    }

    pub fn kind(&self) -> StringKind {
        self.kind
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Decode the bytes as UTF-8, replacing invalid sequences.
    pub fn to_text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }

    /// Upper-case hex digits of the bytes.
    pub fn to_hex_digits(&self) -> String {
        self.bytes.iter().map(|b| format!("{:02X}", b)).collect()
    }
}

/// Insertion-ordered mapping from names to objects.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dictionary(IndexMap<Name, Object>);

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a dictionary with the given `/Type`.
    pub fn with_type(type_name: Name) -> Self {
        let mut dict = Self::new();
        dict.set(Name::TYPE, type_name);
        dict
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Object> {
        self.0.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Object> {
        self.0.get_mut(key)
    }

    /// Insert or replace an entry, returning the previous value.
    pub fn set(&mut self, key: Name, value: impl Into<Object>) -> Option<Object> {
        self.0.insert(key, value.into())
    }

    /// Remove an entry, keeping the order of the remaining ones.
    pub fn remove(&mut self, key: &str) -> Option<Object> {
        self.0.shift_remove(key)
    }

    /// Get the entry for `key`, inserting `default()` if it is missing.
    pub fn get_or_insert_with(&mut self, key: Name, default: impl FnOnce() -> Object) -> &mut Object {
        self.0.entry(key).or_insert_with(default)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Name, &Object)> {
        self.0.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Name> {
        self.0.keys()
    }

    /// The `/Type` entry, if it is a name.
    pub fn type_name(&self) -> Option<&str> {
        self.get("Type").and_then(Object::as_name).map(Name::as_str)
    }

    pub fn has_type(&self, type_name: &str) -> bool {
        self.type_name() == Some(type_name)
    }
}

impl FromIterator<(Name, Object)> for Dictionary {
    fn from_iter<I: IntoIterator<Item = (Name, Object)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Stable identity of a referenced dictionary, valid while it is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

struct Node {
    dictionary: RefCell<Dictionary>,
    document: RefCell<Weak<DocumentCore>>,
}

/// Owning, shared handle to a dictionary with an identity.
///
/// Cloning the handle shares the dictionary. `PartialEq` compares content;
/// use [`Reference::ptr_eq`] for identity.
#[derive(Clone)]
pub struct Reference(Rc<Node>);

impl Reference {
    pub fn new(dictionary: Dictionary) -> Self {
        Self(Rc::new(Node {
            dictionary: RefCell::new(dictionary),
            document: RefCell::new(Weak::new()),
        }))
    }

    pub fn borrow(&self) -> Ref<'_, Dictionary> {
        self.0.dictionary.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, Dictionary> {
        self.0.dictionary.borrow_mut()
    }

    pub fn ptr_eq(&self, other: &Reference) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn id(&self) -> NodeId {
        NodeId(Rc::as_ptr(&self.0) as usize)
    }

    /// A non-owning handle to the same dictionary.
    pub fn downgrade(&self) -> WeakReference {
        WeakReference(Rc::downgrade(&self.0))
    }

    pub(crate) fn document(&self) -> Weak<DocumentCore> {
        self.0.document.borrow().clone()
    }

    pub(crate) fn set_document(&self, document: Weak<DocumentCore>) {
        *self.0.document.borrow_mut() = document;
    }
}

impl PartialEq for Reference {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || *self.borrow() == *other.borrow()
    }
}

impl fmt::Debug for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.dictionary.try_borrow() {
            Ok(dict) => f.debug_tuple("Reference").field(&*dict).finish(),
            Err(_) => f.write_str("Reference(<borrowed>)"),
        }
    }
}

/// Non-owning back edge to a referenced dictionary.
#[derive(Clone, Default)]
pub struct WeakReference(Weak<Node>);

impl WeakReference {
    /// The target, if it is still alive.
    pub fn upgrade(&self) -> Option<Reference> {
        self.0.upgrade().map(Reference)
    }

    /// Whether this edge points at `target`.
    pub fn points_to(&self, target: &Reference) -> bool {
        Weak::ptr_eq(&self.0, &Rc::downgrade(&target.0))
    }
}

impl PartialEq for WeakReference {
    fn eq(&self, other: &Self) -> bool {
        Weak::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for WeakReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.strong_count() > 0 {
            f.write_str("BackReference")
        } else {
            f.write_str("BackReference(<dangling>)")
        }
    }
}

/// PDF object types - the value universe of a document.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    Name(Name),
    String(PdfString),
    Date(PdfDate),
    Array(Vec<Object>),
    Dictionary(Dictionary),
    /// Owning edge to a dictionary with identity
    Reference(Reference),
    /// Non-owning edge, never followed by serializers
    BackReference(WeakReference),
}

impl Object {
    /// Create a name object.
    pub fn name(text: impl Into<String>) -> Result<Self> {
        Name::new(text).map(Object::Name)
    }

    /// Create a literal string object.
    pub fn literal(text: impl Into<Vec<u8>>) -> Self {
        Object::String(PdfString::literal(text))
    }

    /// Create a hex string object.
    pub fn hex(bytes: impl Into<Vec<u8>>) -> Self {
        Object::String(PdfString::hex(bytes))
    }

    /// Create a date object from date-string text.
    pub fn date(text: &str) -> Result<Self> {
        PdfDate::parse(text).map(Object::Date)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Object::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Object::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Object::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<f64> {
        match self {
            Object::Real(n) => Some(*n),
            _ => None,
        }
    }

    /// Numeric value (integer or real coerced to f64)
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Object::Integer(n) => Some(*n as f64),
            Object::Real(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_name(&self) -> Option<&Name> {
        match self {
            Object::Name(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&PdfString> {
        match self {
            Object::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<&PdfDate> {
        match self {
            Object::Date(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Object>> {
        match self {
            Object::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Object>> {
        match self {
            Object::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_dictionary(&self) -> Option<&Dictionary> {
        match self {
            Object::Dictionary(dict) => Some(dict),
            _ => None,
        }
    }

    pub fn as_dictionary_mut(&mut self) -> Option<&mut Dictionary> {
        match self {
            Object::Dictionary(dict) => Some(dict),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<&Reference> {
        match self {
            Object::Reference(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_back_reference(&self) -> Option<&WeakReference> {
        match self {
            Object::BackReference(r) => Some(r),
            _ => None,
        }
    }

    /// Kind name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Null => "null",
            Object::Boolean(_) => "boolean",
            Object::Integer(_) => "integer",
            Object::Real(_) => "real",
            Object::Name(_) => "name",
            Object::String(s) => match s.kind() {
                StringKind::Literal => "string",
                StringKind::Hex => "hex string",
            },
            Object::Date(_) => "date",
            Object::Array(_) => "array",
            Object::Dictionary(_) => "dictionary",
            Object::Reference(_) => "reference",
            Object::BackReference(_) => "back reference",
        }
    }
}

impl From<bool> for Object {
    fn from(value: bool) -> Self {
        Object::Boolean(value)
    }
}

impl From<i32> for Object {
    fn from(value: i32) -> Self {
        Object::Integer(value.into())
    }
}

impl From<i64> for Object {
    fn from(value: i64) -> Self {
        Object::Integer(value)
    }
}

impl From<usize> for Object {
    fn from(value: usize) -> Self {
        Object::Integer(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<f64> for Object {
    fn from(value: f64) -> Self {
        Object::Real(value)
    }
}

impl From<Name> for Object {
    fn from(value: Name) -> Self {
        Object::Name(value)
    }
}

impl From<PdfString> for Object {
    fn from(value: PdfString) -> Self {
        Object::String(value)
    }
}

impl From<PdfDate> for Object {
    fn from(value: PdfDate) -> Self {
        Object::Date(value)
    }
}

impl From<Vec<Object>> for Object {
    fn from(value: Vec<Object>) -> Self {
        Object::Array(value)
    }
}

impl From<Dictionary> for Object {
    fn from(value: Dictionary) -> Self {
        Object::Dictionary(value)
    }
}

impl From<Reference> for Object {
    fn from(value: Reference) -> Self {
        Object::Reference(value)
    }
}

impl From<WeakReference> for Object {
    fn from(value: WeakReference) -> Self {
        Object::BackReference(value)
    }
}
