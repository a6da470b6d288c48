//! The host page as the pipeline sees it: a document tree, mutation records
//! and the selector-based lookups into it.
pub mod document;
pub mod locator;
pub mod selector;

pub use document::{Document, DomNode, ElementData, MutationRecord, Registration};
pub use locator::{Locator, SelectorLocator};
pub use selector::AttributeSelector;
