//! Shared runtime utilities for the vegetation map.
//!
//! This crate re-exports the data contracts from `vg_schema` and holds the
//! stateless text helpers that sit between user input and the taxonomy
//! engine in `core_vg`: advanced-filter parsing, code formatting, the view
//! query codec and the command language used by the harness.

pub use vg_schema::*;

pub mod code_text;
pub mod command_text;
pub mod filter_text;
pub mod view_query;

pub use code_text::{describe_with_name, format_code, normalize_search_query};
pub use command_text::{parse_command_line, CommandParseError, MapCommand};
pub use filter_text::{classify_code, parse_advanced_filter_codes, FilterParseError};
pub use view_query::{format_view_query, merge_view_query, parse_view_query, DEFAULT_VIEW};
