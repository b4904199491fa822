//! Document skeleton: trailer, information dictionary, catalog and the
//! root of the page tree.
//!
//! A fresh document is an empty dictionary. [`normalize`] fills in the
//! minimal well-formed object graph and never overwrites entries that are
//! already present, so running it any number of times is the same as
//! running it once.

use chrono::{DateTime, Utc};

use super::date::PdfDate;
use super::object::{Dictionary, Name, Object, PdfString, Reference};
use crate::error::{Error, Result};

/// Library identifier written to `/Producer`.
pub const PRODUCER: &str = concat!("pdfweave ", env!("CARGO_PKG_VERSION"));

/// Clock and identifier source consulted during normalization.
pub trait Environment {
    /// Current time.
    fn now(&self) -> DateTime<Utc>;

    /// A fresh identifier of 32 hexadecimal digits.
    fn identifier(&self) -> String;
}

/// Wall clock and random (UUID v4) identifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnvironment;

impl Environment for SystemEnvironment {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn identifier(&self) -> String {
        uuid::Uuid::new_v4().simple().to_string().to_uppercase()
    }
}

/// Fixed clock and identifier, for reproducible documents.
#[derive(Debug, Clone)]
pub struct FixedEnvironment {
    pub now: DateTime<Utc>,
    pub identifier: String,
}

impl FixedEnvironment {
    pub fn new(now: DateTime<Utc>, identifier: impl Into<String>) -> Self {
        Self {
            now,
            identifier: identifier.into(),
        }
    }
}

impl Environment for FixedEnvironment {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }

    fn identifier(&self) -> String {
        self.identifier.clone()
    }
}

/// Fill in the missing parts of the skeleton.
///
/// Fails with [`Error::InvariantViolation`] when an existing entry on the
/// skeleton path has the wrong kind, since it cannot be repaired without
/// overwriting it. Every check runs before the first insertion, so a failed
/// call leaves `objects` untouched.
pub(crate) fn normalize(objects: &mut Dictionary, environment: &dyn Environment) -> Result<()> {
    check_existing(objects)?;
    let identifier = match trailer(objects) {
        Some(trailer) if trailer.contains_key("ID") => None,
        _ => Some(PdfString::from_hex_digits(&environment.identifier())?),
    };

    objects.get_or_insert_with(Name::XREF, || Object::Dictionary(Dictionary::new()));

    let trailer = objects
        .get_or_insert_with(Name::TRAILER, || Object::Dictionary(Dictionary::new()))
        .as_dictionary_mut()
        .ok_or_else(|| Error::invariant("/Trailer is not a dictionary"))?;

    if let Some(identifier) = identifier {
        log::debug!("Generated document identifier {}", identifier.to_hex_digits());
        trailer.set(
            Name::ID,
            vec![Object::String(identifier.clone()), Object::String(identifier)],
        );
    }

    let info = expect_reference(
        trailer.get_or_insert_with(Name::INFO, || Object::Reference(Reference::new(Dictionary::new()))),
        "/Trailer/Info",
    )?;
    {
        let mut info = info.borrow_mut();
        if !info.contains_key("CreationDate") || !info.contains_key("ModDate") {
            let now = PdfDate::new(environment.now());
            info.get_or_insert_with(Name::CREATION_DATE, || Object::Date(now));
            info.get_or_insert_with(Name::MOD_DATE, || Object::Date(now));
        }
        info.get_or_insert_with(Name::PRODUCER, || Object::literal(PRODUCER));
    }

    let catalog = expect_reference(
        trailer.get_or_insert_with(Name::ROOT, || Object::Reference(Reference::new(Dictionary::new()))),
        "/Trailer/Root",
    )?;
    let mut catalog = catalog.borrow_mut();
    catalog.get_or_insert_with(Name::TYPE, || Object::Name(Name::CATALOG));

    let pages = expect_reference(
        catalog.get_or_insert_with(Name::PAGES, || Object::Reference(Reference::new(Dictionary::new()))),
        "/Trailer/Root/Pages",
    )?;
    let mut pages = pages.borrow_mut();
    pages.get_or_insert_with(Name::TYPE, || Object::Name(Name::PAGES));
    pages.get_or_insert_with(Name::COUNT, || Object::Integer(0));
    pages.get_or_insert_with(Name::KIDS, || Object::Array(Vec::new()));

    Ok(())
}

/// Kind checks for the skeleton entries that already exist.
fn check_existing(objects: &Dictionary) -> Result<()> {
    let Some(trailer) = objects.get("Trailer") else {
        return Ok(());
    };
    let trailer = trailer
        .as_dictionary()
        .ok_or_else(|| Error::invariant("/Trailer is not a dictionary"))?;

    if let Some(info) = trailer.get("Info") {
        expect_reference(info, "/Trailer/Info")?;
    }
    if let Some(root) = trailer.get("Root") {
        let catalog = expect_reference(root, "/Trailer/Root")?;
        let catalog = catalog.borrow();
        if let Some(pages) = catalog.get("Pages") {
            expect_reference(pages, "/Trailer/Root/Pages")?;
        }
    }
    Ok(())
}

fn expect_reference(object: &Object, path: &str) -> Result<Reference> {
    object
        .as_reference()
        .cloned()
        .ok_or_else(|| Error::invariant(format!("{} is a {}, not a reference", path, object.type_name())))
}

fn trailer(objects: &Dictionary) -> Option<&Dictionary> {
    objects.get("Trailer").and_then(Object::as_dictionary)
}

/// `/Trailer/Info`, if present.
pub(crate) fn info(objects: &Dictionary) -> Option<Reference> {
    trailer(objects)?.get("Info")?.as_reference().cloned()
}

/// `/Trailer/Root`, if present.
pub(crate) fn catalog(objects: &Dictionary) -> Option<Reference> {
    trailer(objects)?.get("Root")?.as_reference().cloned()
}

/// `/Trailer/Root/Pages`, if present.
pub(crate) fn root_pages(objects: &Dictionary) -> Option<Reference> {
    let catalog = catalog(objects)?;
    let catalog = catalog.borrow();
    catalog.get("Pages")?.as_reference().cloned()
}

/// `/Trailer/ID`, if present.
pub(crate) fn identifier(objects: &Dictionary) -> Option<Vec<PdfString>> {
    trailer(objects)?
        .get("ID")?
        .as_array()?
        .iter()
        .map(|o| o.as_string().cloned())
        .collect()
}
