//! Property-Based Tests
//!
//! Random sequences of page-tree edits on random nested trees, checked
//! against a plain `Vec` model:
//! - the tree stays valid after every step
//! - the root `/Count` always equals the number of reachable pages
//! - insert followed by get returns the inserted page
//! - pop shifts the following pages down by one

use chrono::{TimeZone, Utc};
use pdfweave::{Dictionary, Document, Name, Object, Page, PdfDate, Reference};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Append,
    Insert(usize),
    Pop(usize),
    PopLast,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Append),
        any::<usize>().prop_map(Op::Insert),
        any::<usize>().prop_map(Op::Pop),
        Just(Op::PopLast),
    ]
}

fn assert_matches_model(doc: &Document, model: &[Page]) -> Result<(), TestCaseError> {
    prop_assert!(doc.validate().is_ok(), "tree invalid: {:?}", doc.validate());
    prop_assert_eq!(doc.page_count(), model.len());

    let pages = doc.pages().unwrap();
    prop_assert_eq!(pages.len(), model.len());
    for (actual, expected) in pages.iter().zip(model) {
        prop_assert!(actual.ptr_eq(expected));
    }
    Ok(())
}

/// Interior node over `kids`, pointing their `/Parent` at it.
fn interior(kids: Vec<Reference>, leaves: usize) -> Reference {
    let mut dict = Dictionary::with_type(Name::PAGES);
    dict.set(
        Name::KIDS,
        kids.iter().cloned().map(Object::Reference).collect::<Vec<_>>(),
    );
    dict.set(Name::COUNT, leaves);
    let node = Reference::new(dict);
    for kid in &kids {
        kid.borrow_mut().set(Name::PARENT, node.downgrade());
    }
    node
}

/// Shape of a page tree: runs of pages, each run wrapped in some number of
/// interior nodes, with optional empty interior nodes between runs.
#[derive(Debug, Clone)]
struct Shape {
    pages: usize,
    widths: Vec<usize>,
    depths: Vec<usize>,
    empties: Vec<bool>,
}

fn shape_strategy() -> impl Strategy<Value = Shape> {
    (
        0usize..16,
        prop::collection::vec(1usize..5, 1..5),
        prop::collection::vec(0usize..4, 1..5),
        prop::collection::vec(any::<bool>(), 1..5),
    )
        .prop_map(|(pages, widths, depths, empties)| Shape {
            pages,
            widths,
            depths,
            empties,
        })
}

/// Builds a document with the given shape; returns it with its pages in
/// reading order.
fn build(shape: &Shape) -> (Document, Vec<Page>) {
    let mut doc = Document::new();
    let pages: Vec<Page> = (0..shape.pages).map(|_| Page::a4()).collect();
    for page in &pages {
        doc.append_page(page.clone()).unwrap();
    }
    doc.normalize().unwrap();
    let root = doc.root_pages().unwrap();

    let mut kids = Vec::new();
    let mut rest = pages.as_slice();
    let mut run = 0;
    while !rest.is_empty() {
        let width = shape.widths[run % shape.widths.len()].min(rest.len());
        let depth = shape.depths[run % shape.depths.len()];
        let (chunk, tail) = rest.split_at(width);
        rest = tail;

        let mut nodes: Vec<Reference> = chunk.iter().map(|p| p.reference().clone()).collect();
        for _ in 0..depth {
            nodes = vec![interior(nodes, width)];
        }
        kids.extend(nodes);
        if shape.empties[run % shape.empties.len()] {
            kids.push(interior(Vec::new(), 0));
        }
        run += 1;
    }

    for kid in &kids {
        kid.borrow_mut().set(Name::PARENT, root.downgrade());
    }
    root.borrow_mut().set(
        Name::KIDS,
        kids.into_iter().map(Object::Reference).collect::<Vec<_>>(),
    );
    (doc, pages)
}

// ============================================================================
// Page Tree Properties
// ============================================================================

/// Property: generated trees start out valid and in the expected order
#[test]
fn proptest_generated_trees_are_valid() {
    proptest!(|(shape in shape_strategy())| {
        let (doc, model) = build(&shape);
        assert_matches_model(&doc, &model)?;
        for (index, page) in model.iter().enumerate() {
            prop_assert!(doc.get_page(index).unwrap().ptr_eq(page));
        }
    });
}

/// Property: any edit sequence keeps the tree consistent with a flat list
#[test]
fn proptest_edit_sequences_match_model() {
    proptest!(|(shape in shape_strategy(), ops in prop::collection::vec(op_strategy(), 0..40))| {
        let (mut doc, mut model) = build(&shape);

        for op in ops {
            match op {
                Op::Append => {
                    let page = Page::a4();
                    doc.append_page(page.clone()).unwrap();
                    model.push(page);
                }
                Op::Insert(raw) => {
                    let index = raw % (model.len() + 1);
                    let page = Page::letter();
                    doc.insert_page(page.clone(), index as isize).unwrap();
                    prop_assert!(doc.get_page(index).unwrap().ptr_eq(&page));
                    model.insert(index, page);
                }
                Op::Pop(raw) => {
                    if model.is_empty() {
                        prop_assert!(doc.pop_page(0).is_err());
                        continue;
                    }
                    let index = raw % model.len();
                    let popped = doc.pop_page(index as isize).unwrap();
                    let expected = model.remove(index);
                    prop_assert!(popped.ptr_eq(&expected));
                    prop_assert!(!popped.is_attached());
                    if index < model.len() {
                        prop_assert!(doc.get_page(index).unwrap().ptr_eq(&model[index]));
                    }
                }
                Op::PopLast => {
                    match model.pop() {
                        Some(expected) => {
                            let popped = doc.pop_page(-1).unwrap();
                            prop_assert!(popped.ptr_eq(&expected));
                        }
                        None => prop_assert!(doc.pop_page(-1).is_err()),
                    }
                }
            }
            assert_matches_model(&doc, &model)?;
        }
    });
}

/// Property: out-of-range indices fail and leave the document untouched
#[test]
fn proptest_out_of_range_is_rejected() {
    proptest!(|(shape in shape_strategy(), extra in 1isize..100)| {
        let (mut doc, model) = build(&shape);

        let beyond = model.len() as isize + extra;
        prop_assert!(doc.insert_page(Page::a4(), beyond).is_err());
        prop_assert!(doc.pop_page(beyond - 1).is_err());
        prop_assert!(doc.pop_page(-1 - extra).is_err());
        prop_assert!(doc.get_page(beyond as usize).is_err());
        assert_matches_model(&doc, &model)?;
    });
}

// ============================================================================
// Primitive Properties
// ============================================================================

/// Property: the write form of any whole-second UTC instant reads back
#[test]
fn proptest_date_write_form_reads_back() {
    proptest!(|(seconds in 0i64..4_102_444_800)| {
        let instant = Utc.timestamp_opt(seconds, 0).unwrap();
        let date = PdfDate::new(instant);
        let text = date.to_pdf_string();
        prop_assert!(text.starts_with("D:") && text.ends_with("Z00"));
        prop_assert_eq!(PdfDate::parse(&text).unwrap(), date);
    });
}

/// Property: names accept any non-empty text without NUL
#[test]
fn proptest_name_accepts_printable_text() {
    proptest!(|(text in "[A-Za-z0-9_.#-]{1,32}")| {
        let name = Name::new(text.clone()).unwrap();
        prop_assert_eq!(name.as_str(), text.as_str());
        prop_assert_eq!(name.to_string(), format!("/{}", text));
    });
}
