//! Page-tree manipulation.
//!
//! The page tree is an arbitrarily deep, arbitrarily unbalanced tree of
//! `/Pages` nodes whose leaves are `/Page` dictionaries. Reading order is a
//! left-to-right pre-order walk. All operations here keep the following
//! true after they return:
//!
//! - every interior `/Count` equals the number of pages below it,
//! - every page's `/Parent` is the node whose `/Kids` holds it,
//! - the root has no `/Parent`,
//! - every page appears exactly once,
//! - every page points back at the document that holds it.
//!
//! Nodes are located by identity, never by value: two pages with equal
//! attributes stay distinguishable. Each mutating operation checks all of
//! its preconditions before touching the tree, so a failed call leaves the
//! document exactly as it was.

use std::collections::HashMap;

use super::document::Document;
use super::object::{Dictionary, NodeId, Object, Reference};
use super::page::Page;
use crate::error::{Error, Result};

/// One pre-order walk over the tree.
struct TreeWalk {
    root: Reference,
    /// Interior node holding each visited node, keyed by identity
    parent_of: HashMap<NodeId, Reference>,
    /// Pages in reading order
    leaves: Vec<Reference>,
}

impl TreeWalk {
    fn collect(root: &Reference) -> Result<Self> {
        let mut walk = Self {
            root: root.clone(),
            parent_of: HashMap::new(),
            leaves: Vec::new(),
        };

        let mut stack = vec![root.clone()];
        while let Some(node) = stack.pop() {
            let dict = node.borrow();
            if dict.has_type("Page") {
                walk.leaves.push(node.clone());
                continue;
            }
            if !dict.has_type("Pages") {
                return Err(Error::invariant(format!(
                    "page-tree node has /Type {:?}",
                    dict.type_name()
                )));
            }
            let kids = kids_of(&dict)?;
            for kid in kids.iter().rev() {
                let kid = kid.as_reference().ok_or_else(|| {
                    Error::invariant(format!("/Kids entry is a {}", kid.type_name()))
                })?;
                if kid.ptr_eq(&walk.root) || walk.parent_of.insert(kid.id(), node.clone()).is_some() {
                    return Err(Error::invariant("node is reachable more than once"));
                }
                stack.push(kid.clone());
            }
        }

        log::trace!(
            "Walked page tree: {} pages, {} nodes",
            walk.leaves.len(),
            walk.parent_of.len() + 1
        );
        Ok(walk)
    }

    fn leaf(&self, index: usize) -> Result<&Reference> {
        self.leaves.get(index).ok_or_else(|| {
            Error::invariant(format!(
                "root /Count covers index {} but only {} pages are reachable",
                index,
                self.leaves.len()
            ))
        })
    }

    fn parent(&self, node: &Reference) -> Result<&Reference> {
        self.parent_of
            .get(&node.id())
            .ok_or_else(|| Error::invariant("page has no parent in the tree"))
    }

    /// `node` and every node above it, ending with the root.
    fn ancestry(&self, node: &Reference) -> Vec<Reference> {
        let mut chain = vec![node.clone()];
        let mut current = node.clone();
        while let Some(parent) = self.parent_of.get(&current.id()) {
            chain.push(parent.clone());
            current = parent.clone();
        }
        chain
    }
}

fn kids_of(dict: &Dictionary) -> Result<&Vec<Object>> {
    dict.get("Kids")
        .and_then(Object::as_array)
        .ok_or_else(|| Error::invariant("interior node has no /Kids array"))
}

/// Position of `target` in `parent`'s `/Kids`, by identity.
fn position_in(parent: &Reference, target: &Reference) -> Result<usize> {
    let dict = parent.borrow();
    kids_of(&dict)?
        .iter()
        .position(|kid| kid.as_reference().is_some_and(|kid| kid.ptr_eq(target)))
        .ok_or_else(|| Error::invariant("page is missing from its parent's /Kids"))
}

/// Check that every node in `chain` can absorb `delta` in its `/Count`.
fn check_counts(chain: &[Reference], delta: i64) -> Result<()> {
    for node in chain {
        let count = node.borrow().get("Count").and_then(Object::as_integer);
        match count {
            Some(count) if count.checked_add(delta).is_some_and(|next| next >= 0) => {}
            Some(count) => {
                return Err(Error::invariant(format!(
                    "/Count {} cannot be adjusted by {}",
                    count, delta
                )))
            }
            None => return Err(Error::invariant("interior node has no integer /Count")),
        }
    }
    Ok(())
}

fn adjust_counts(chain: &[Reference], delta: i64) {
    for node in chain {
        if let Some(Object::Integer(count)) = node.borrow_mut().get_mut("Count") {
            if let Some(next) = count.checked_add(delta) {
                *count = next;
            }
        }
    }
}

impl Document {
    /// The existing root, or a fresh skeleton's root if there is none yet.
    /// Callers still run `ensure_skeleton` once their own checks
    /// pass.
    fn page_tree_root(&self) -> Result<Reference> {
        if let Some(root) = self.root_pages() {
            return Ok(root);
        }
        self.ensure_skeleton()?;
        self.root_pages()
            .ok_or_else(|| Error::invariant("/Trailer/Root/Pages missing after normalization"))
    }

    /// A page can join the tree only as a detached `/Page` leaf.
    fn ensure_insertable(page: &Page) -> Result<()> {
        if page.is_attached() {
            return Err(Error::PageAlreadyAttached);
        }
        let dict = page.dictionary();
        if !dict.has_type("Page") {
            let found = match dict.get("Type") {
                Some(Object::Name(name)) => name.to_string(),
                Some(other) => other.type_name().to_string(),
                None => "(missing)".to_string(),
            };
            return Err(Error::NotAPage(found));
        }
        Ok(())
    }

    /// Add `page` as the last page of the document.
    ///
    /// Fails with [`Error::PageAlreadyAttached`] if the page already belongs
    /// to a document, and with [`Error::NotAPage`] if its `/Type` is not
    /// `/Page`.
    pub fn append_page(&mut self, page: Page) -> Result<&mut Self> {
        Self::ensure_insertable(&page)?;
        let root = self.page_tree_root()?;
        kids_of(&root.borrow())?;
        check_counts(std::slice::from_ref(&root), 1)?;
        self.ensure_skeleton()?;

        if let Some(kids) = root.borrow_mut().get_mut("Kids").and_then(Object::as_array_mut) {
            kids.push(Object::Reference(page.reference().clone()));
        }
        adjust_counts(std::slice::from_ref(&root), 1);
        page.attach(&root, self);

        log::debug!("Appended page, document now has {} pages", self.page_count());
        Ok(self)
    }

    /// Move every page of `other`, in order, to the end of this document.
    ///
    /// Pages keep their identity: afterwards `other` is empty and each
    /// handle the caller held on one of its pages refers to a page of this
    /// document.
    pub fn append_document(&mut self, other: &mut Document) -> Result<&mut Self> {
        let root = self.page_tree_root()?;
        kids_of(&root.borrow())?;
        check_counts(std::slice::from_ref(&root), 1)?;

        let moved = other.page_count();
        if moved == 0 {
            return Ok(self);
        }
        let other_root = other.page_tree_root()?;
        let walk = TreeWalk::collect(&other_root)?;
        walk.leaf(moved - 1)?;

        let mut pages = Vec::with_capacity(moved);
        for _ in 0..moved {
            pages.push(other.pop_page(-1)?);
        }
        pages.reverse();
        for page in pages {
            self.append_page(page)?;
        }

        log::debug!("Moved {} pages from another document", moved);
        Ok(self)
    }

    /// The page at zero-based `index` in reading order.
    pub fn get_page(&self, index: usize) -> Result<Page> {
        let count = self.page_count();
        let out_of_range = || Error::IndexOutOfRange {
            index: isize::try_from(index).unwrap_or(isize::MAX),
            page_count: count,
        };
        if index >= count {
            return Err(out_of_range());
        }
        let root = self.root_pages().ok_or_else(out_of_range)?;

        let walk = TreeWalk::collect(&root)?;
        Ok(Page::from_reference(walk.leaf(index)?.clone()))
    }

    /// All pages in reading order.
    pub fn pages(&self) -> Result<Vec<Page>> {
        let Some(root) = self.root_pages() else {
            return Ok(Vec::new());
        };
        let walk = TreeWalk::collect(&root)?;
        Ok(walk.leaves.into_iter().map(Page::from_reference).collect())
    }

    /// Insert `page` so that it becomes the page at `index`.
    ///
    /// `index` of `-1` or equal to the page count appends. The page goes
    /// into the same interior node as the page currently at `index`, right
    /// before it, and every `/Count` from that node up to the root grows by
    /// one.
    pub fn insert_page(&mut self, page: Page, index: isize) -> Result<&mut Self> {
        let count = self.page_count();
        if index == -1 || usize::try_from(index).is_ok_and(|i| i == count) {
            return self.append_page(page);
        }
        let position = usize::try_from(index)
            .ok()
            .filter(|&i| i < count)
            .ok_or(Error::IndexOutOfRange {
                index,
                page_count: count,
            })?;
        Self::ensure_insertable(&page)?;

        let root = self.page_tree_root()?;
        let walk = TreeWalk::collect(&root)?;
        let target = walk.leaf(position)?;
        let parent = walk.parent(target)?.clone();
        let slot = position_in(&parent, target)?;
        let chain = walk.ancestry(&parent);
        check_counts(&chain, 1)?;
        self.ensure_skeleton()?;

        if let Some(kids) = parent.borrow_mut().get_mut("Kids").and_then(Object::as_array_mut) {
            kids.insert(slot, Object::Reference(page.reference().clone()));
        }
        adjust_counts(&chain, 1);
        page.attach(&parent, self);

        log::debug!(
            "Inserted page at index {} (slot {} of a node at depth {})",
            position,
            slot,
            chain.len() - 1
        );
        Ok(self)
    }

    /// Remove and return the page at `index`; `-1` is the last page.
    ///
    /// The returned page keeps its attributes but loses its `/Parent` and
    /// document links, so it can be added to a document again.
    pub fn pop_page(&mut self, index: isize) -> Result<Page> {
        let count = self.page_count();
        let out_of_range = Error::IndexOutOfRange {
            index,
            page_count: count,
        };
        let position = if index == -1 {
            count.checked_sub(1).ok_or(out_of_range)?
        } else {
            usize::try_from(index)
                .ok()
                .filter(|&i| i < count)
                .ok_or(out_of_range)?
        };

        let root = self.page_tree_root()?;
        let walk = TreeWalk::collect(&root)?;
        let target = walk.leaf(position)?.clone();
        let parent = walk.parent(&target)?.clone();
        let slot = position_in(&parent, &target)?;
        let chain = walk.ancestry(&parent);
        check_counts(&chain, -1)?;
        self.ensure_skeleton()?;

        if let Some(kids) = parent.borrow_mut().get_mut("Kids").and_then(Object::as_array_mut) {
            kids.remove(slot);
        }
        adjust_counts(&chain, -1);

        let page = Page::from_reference(target);
        page.detach();

        log::debug!("Popped page at index {}, {} pages remain", position, self.page_count());
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::object::Name;

    fn tagged(label: i64) -> Page {
        let page = Page::a4();
        page.dictionary_mut().set(Name::new("Label").unwrap(), label);
        page
    }

    fn labels(doc: &Document) -> Vec<i64> {
        doc.pages()
            .unwrap()
            .iter()
            .map(|p| p.dictionary().get("Label").and_then(Object::as_integer).unwrap())
            .collect()
    }

    #[test]
    fn test_append_and_get() {
        let mut doc = Document::new();
        doc.append_page(tagged(1)).unwrap().append_page(tagged(2)).unwrap();
        assert_eq!(doc.page_count(), 2);
        assert_eq!(labels(&doc), vec![1, 2]);
        doc.validate().unwrap();
    }

    #[test]
    fn test_get_page_out_of_range() {
        let mut doc = Document::new();
        assert!(matches!(
            doc.get_page(0),
            Err(Error::IndexOutOfRange { index: 0, page_count: 0 })
        ));
        doc.append_page(Page::a4()).unwrap();
        assert!(doc.get_page(0).is_ok());
        assert!(matches!(doc.get_page(1), Err(Error::IndexOutOfRange { .. })));
    }

    #[test]
    fn test_insert_sentinels() {
        let mut doc = Document::new();
        doc.insert_page(tagged(1), -1).unwrap();
        doc.insert_page(tagged(2), 1).unwrap();
        doc.insert_page(tagged(0), 0).unwrap();
        assert_eq!(labels(&doc), vec![0, 1, 2]);
        doc.validate().unwrap();
    }

    #[test]
    fn test_insert_out_of_range_leaves_tree_unchanged() {
        let mut doc = Document::new();
        doc.append_page(tagged(1)).unwrap();
        let page = tagged(9);
        for index in [2, 5, -2] {
            assert!(matches!(
                doc.insert_page(page.clone(), index),
                Err(Error::IndexOutOfRange { .. })
            ));
        }
        assert_eq!(labels(&doc), vec![1]);
        assert!(!page.is_attached());
    }

    #[test]
    fn test_pop_sentinel_and_range() {
        let mut doc = Document::new();
        assert!(matches!(doc.pop_page(-1), Err(Error::IndexOutOfRange { .. })));
        assert!(matches!(doc.pop_page(0), Err(Error::IndexOutOfRange { .. })));

        doc.append_page(tagged(1)).unwrap().append_page(tagged(2)).unwrap();
        let last = doc.pop_page(-1).unwrap();
        assert_eq!(last.dictionary().get("Label").and_then(Object::as_integer), Some(2));
        assert!(!last.is_attached());
        assert!(matches!(doc.pop_page(1), Err(Error::IndexOutOfRange { .. })));
        assert_eq!(labels(&doc), vec![1]);
        doc.validate().unwrap();
    }

    #[test]
    fn test_duplicate_attachment_rejected() {
        let mut doc = Document::new();
        let page = Page::a4();
        doc.append_page(page.clone()).unwrap();
        assert_eq!(doc.append_page(page.clone()).unwrap_err(), Error::PageAlreadyAttached);
        assert_eq!(doc.insert_page(page.clone(), 0).unwrap_err(), Error::PageAlreadyAttached);

        let mut other = Document::new();
        assert_eq!(other.append_page(page).unwrap_err(), Error::PageAlreadyAttached);
        assert_eq!(doc.page_count(), 1);
        assert_eq!(other.page_count(), 0);
    }

    #[test]
    fn test_equal_pages_located_by_identity() {
        let mut doc = Document::new();
        let first = Page::a4();
        let second = Page::a4();
        assert_eq!(first.reference(), second.reference());
        doc.append_page(first.clone()).unwrap().append_page(second.clone()).unwrap();

        let popped = doc.pop_page(1).unwrap();
        assert!(popped.ptr_eq(&second));
        assert!(doc.get_page(0).unwrap().ptr_eq(&first));
        assert!(first.is_attached());
    }

    #[test]
    fn test_popped_page_can_be_reattached() {
        let mut doc = Document::new();
        doc.append_page(tagged(1)).unwrap().append_page(tagged(2)).unwrap();
        let page = doc.pop_page(0).unwrap();
        doc.append_page(page.clone()).unwrap();
        assert_eq!(labels(&doc), vec![2, 1]);
        assert!(page.belongs_to(&doc));
        doc.validate().unwrap();
    }

    #[test]
    fn test_append_document_moves_pages() {
        let mut doc = Document::new();
        doc.append_page(tagged(1)).unwrap();
        let mut other = Document::new();
        let moved = tagged(2);
        other.append_page(moved.clone()).unwrap().append_page(tagged(3)).unwrap();

        doc.append_document(&mut other).unwrap();
        assert_eq!(labels(&doc), vec![1, 2, 3]);
        assert!(other.is_empty());
        assert!(moved.belongs_to(&doc));
        assert!(!moved.belongs_to(&other));
        assert!(doc.get_page(1).unwrap().ptr_eq(&moved));
        doc.validate().unwrap();
        other.validate().unwrap();
    }

    #[test]
    fn test_append_empty_document() {
        let mut doc = Document::new();
        let mut other = Document::new();
        doc.append_document(&mut other).unwrap();
        assert!(doc.is_empty());
        assert!(doc.root_pages().is_some());
    }

    #[test]
    fn test_malformed_kids_is_invariant_violation() {
        let mut doc = Document::new();
        doc.append_page(tagged(1)).unwrap();
        doc.root_pages()
            .unwrap()
            .borrow_mut()
            .set(Name::KIDS, vec![Object::Integer(4)]);
        assert!(matches!(
            doc.insert_page(tagged(2), 0),
            Err(Error::InvariantViolation(_))
        ));
        assert!(matches!(doc.pop_page(0), Err(Error::InvariantViolation(_))));
    }

    #[test]
    fn test_count_larger_than_tree_is_invariant_violation() {
        let mut doc = Document::new();
        doc.append_page(tagged(1)).unwrap();
        doc.root_pages().unwrap().borrow_mut().set(Name::COUNT, 3);
        assert!(matches!(doc.get_page(2), Err(Error::InvariantViolation(_))));
        assert!(matches!(doc.pop_page(2), Err(Error::InvariantViolation(_))));
    }

    #[test]
    fn test_cycle_is_invariant_violation() {
        let mut doc = Document::new();
        doc.normalize().unwrap();
        let root = doc.root_pages().unwrap();
        let mut inner = Dictionary::with_type(Name::PAGES);
        inner.set(Name::KIDS, vec![Object::Reference(root.clone())]);
        inner.set(Name::COUNT, 0);
        root.borrow_mut()
            .set(Name::KIDS, vec![Object::Reference(Reference::new(inner))]);
        assert!(matches!(doc.pages(), Err(Error::InvariantViolation(_))));
    }

    #[test]
    fn test_get_page_on_cycle_is_invariant_violation() {
        let mut doc = Document::new();
        doc.normalize().unwrap();
        let root = doc.root_pages().unwrap();
        let mut inner = Dictionary::with_type(Name::PAGES);
        inner.set(Name::KIDS, vec![Object::Reference(root.clone())]);
        inner.set(Name::COUNT, 1);
        root.borrow_mut()
            .set(Name::KIDS, vec![Object::Reference(Reference::new(inner))]);
        root.borrow_mut().set(Name::COUNT, 1);

        assert!(matches!(doc.get_page(0), Err(Error::InvariantViolation(_))));
    }

    #[test]
    fn test_get_page_reports_non_reference_kids() {
        let mut doc = Document::new();
        doc.append_page(tagged(1)).unwrap();
        let root = doc.root_pages().unwrap();
        root.borrow_mut()
            .set(Name::KIDS, vec![Object::Integer(7), Object::Reference(tagged(2).reference().clone())]);

        assert!(matches!(doc.get_page(0), Err(Error::InvariantViolation(_))));
    }

    #[test]
    fn test_interior_node_rejected_as_leaf() {
        let mut doc = Document::new();
        doc.append_page(tagged(1)).unwrap();
        let before = crate::render::to_json(&doc, crate::render::JsonFormat::Compact).unwrap();

        let interior = Page::from_dictionary(Dictionary::with_type(Name::PAGES));
        assert_eq!(
            doc.append_page(interior.clone()).unwrap_err(),
            Error::NotAPage("/Pages".to_string())
        );
        assert_eq!(
            doc.insert_page(interior.clone(), 0).unwrap_err(),
            Error::NotAPage("/Pages".to_string())
        );
        assert!(!interior.is_attached());

        let untyped = Page::a4();
        untyped.dictionary_mut().remove("Type");
        assert!(matches!(doc.append_page(untyped), Err(Error::NotAPage(_))));

        assert_eq!(doc.page_count(), 1);
        assert_eq!(
            crate::render::to_json(&doc, crate::render::JsonFormat::Compact).unwrap(),
            before
        );
        doc.insert_page(tagged(0), 0).unwrap();
        doc.validate().unwrap();
    }

    #[test]
    fn test_failed_pop_does_not_fill_skeleton() {
        let mut doc = Document::new();
        doc.append_page(tagged(1)).unwrap();
        let info_removed = doc
            .objects_mut()
            .get_mut("Trailer")
            .and_then(Object::as_dictionary_mut)
            .and_then(|trailer| trailer.remove("Info"));
        assert!(info_removed.is_some());
        doc.root_pages()
            .unwrap()
            .borrow_mut()
            .set(Name::KIDS, vec![Object::Integer(4)]);

        assert!(matches!(doc.pop_page(0), Err(Error::InvariantViolation(_))));
        assert!(doc.info().is_none());
    }

    #[test]
    fn test_count_overflow_is_invariant_violation() {
        let mut doc = Document::new();
        doc.append_page(tagged(1)).unwrap();
        let root = doc.root_pages().unwrap();
        root.borrow_mut().set(Name::COUNT, i64::MAX);

        let page = tagged(2);
        assert!(matches!(
            doc.append_page(page.clone()),
            Err(Error::InvariantViolation(_))
        ));
        assert!(!page.is_attached());
        assert_eq!(root.borrow().get("Count").and_then(Object::as_integer), Some(i64::MAX));
        assert_eq!(
            root.borrow().get("Kids").and_then(Object::as_array).map(Vec::len),
            Some(1)
        );
    }
}
