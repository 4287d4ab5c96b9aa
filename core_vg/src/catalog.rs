//! Searchable list of every selectable code, backing the legend filter
//! picker. Selections made here are written back as advanced filter text.

use serde::Serialize;
use vg_runtime::{normalize_search_query, parse_advanced_filter_codes, FilterParseError};
use vg_schema::{is_special_source, Granularity, RawCode};

use crate::{legend::describe_code, taxonomy::Taxonomy};

pub const CATALOG_PAGE_LIMIT: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub code: RawCode,
    pub granularity: Granularity,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogPage {
    pub selected: Vec<CatalogEntry>,
    pub matches: Vec<CatalogEntry>,
    /// More entries matched than fit on the page.
    pub truncated: bool,
}

#[derive(Debug, Clone)]
pub struct CodeCatalog {
    entries: Vec<CatalogEntry>,
}

impl CodeCatalog {
    pub fn new(taxonomy: &Taxonomy) -> Self {
        let entries = Granularity::ALL
            .iter()
            .flat_map(|granularity| {
                taxonomy
                    .codes(*granularity)
                    .filter(|code| *code != 0 && !is_special_source(*code))
                    .filter_map(move |code| {
                        let description = describe_code(taxonomy, code, *granularity)?;
                        Some(CatalogEntry {
                            code,
                            granularity: *granularity,
                            label: format!("{code}: {description}"),
                        })
                    })
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Selected entries first, then up to [`CATALOG_PAGE_LIMIT`] unselected
    /// entries whose code or label contains the normalized query.
    pub fn search(&self, query: &str, selected: &[RawCode]) -> CatalogPage {
        let needle = normalize_search_query(query);
        let selected_entries = self
            .entries
            .iter()
            .filter(|entry| selected.contains(&entry.code))
            .cloned()
            .collect();

        let mut remaining = self.entries.iter().filter(|entry| {
            !selected.contains(&entry.code)
                && (entry.code.to_string().contains(needle) || entry.label.contains(needle))
        });
        let matches: Vec<CatalogEntry> = remaining
            .by_ref()
            .take(CATALOG_PAGE_LIMIT)
            .cloned()
            .collect();
        let truncated = remaining.next().is_some();

        CatalogPage {
            selected: selected_entries,
            matches,
            truncated,
        }
    }
}

/// Codes currently selected by an advanced filter text.
pub fn selected_codes(filter_text: &str) -> Result<Vec<RawCode>, FilterParseError> {
    Ok(parse_advanced_filter_codes(filter_text)?
        .into_iter()
        .map(|(code, _)| code)
        .collect())
}

/// Checks or unchecks `code` and returns the new selection together with
/// the advanced filter text it corresponds to.
pub fn toggle_code(selected: &[RawCode], code: RawCode, checked: bool) -> (Vec<RawCode>, String) {
    let mut codes: Vec<RawCode> = selected.iter().copied().filter(|c| *c != code).collect();
    if checked {
        codes.push(code);
    }
    let text = codes
        .iter()
        .map(RawCode::to_string)
        .collect::<Vec<_>>()
        .join(",");
    (codes, text)
}
