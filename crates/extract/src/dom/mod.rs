// ABOUTME: Owned-tree HTML utilities and the individual content normalization passes.
// ABOUTME: Each pass is a pure function from one node list to another.

//! DOM utilities for content fragments.
//!
//! The fragment located in a page is copied into an owned [`tree::Node`]
//! tree, then run through the passes in [`crate::normalize`].

pub mod brs;
pub mod cleaners;
pub mod encoding;
pub mod repair;
pub mod tree;
pub mod whitespace;

pub use tree::{parse_fragment, to_html, Element, Node};
