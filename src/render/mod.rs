//! Rendering of the object graph for inspection.

mod json;

pub use json::{object_to_value, to_json, JsonFormat};
