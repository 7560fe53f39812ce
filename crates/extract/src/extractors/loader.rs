// ABOUTME: Loader for the built-in selector table embedded as JSON.
// ABOUTME: Provides load_builtin_table() used as the default Options selector table.

use crate::extractors::compiled::precompile_selectors;
use crate::extractors::rules::SelectorTable;

/// Embedded JSON containing the built-in candidate lists.
const BUILTIN_SELECTORS_JSON: &str = include_str!("../../data/selectors.json");

/// Loads the built-in selector table and warms the selector cache.
///
/// # Panics
///
/// Panics if the embedded JSON is malformed or cannot be deserialized.
pub fn load_builtin_table() -> SelectorTable {
    let table = SelectorTable::from_json(BUILTIN_SELECTORS_JSON)
        .expect("failed to parse builtin selector table");
    precompile_selectors(table.all_selectors());
    table
}
