// ABOUTME: Field and content extraction from parsed pages via declarative selector rules.
// ABOUTME: Groups the rule model, built-in table loader, selector cache, resolver and stop-list.

//! Extraction module.
//!
//! Submodules:
//! - `rules`: selector rule data model (`SelectorTable`, `FieldRule`).
//! - `loader`: the built-in table embedded as JSON.
//! - `select`: the selector resolver for scalar and set fields.
//! - `content`: main-content location, link and image collection.

pub mod compiled;
pub mod content;
pub mod loader;
pub mod rules;
pub mod select;
pub mod stoplist;
