//! Compiles code lists and ecological categories into per-layer filters.

use vg_runtime::{parse_advanced_filter_codes, FilterParseError};
use vg_schema::{
    special_transform, CategoryFilter, Granularity, LayerFilter, LayerFilters, RawCode,
};

use crate::taxonomy::{Ecology, Taxonomy};

/// Whether a feature with `raw` on the `layer` granularity belongs to the
/// selector `(code, selector)`.
///
/// Selectors only reach down: a medium selector matches its own medium code
/// and the fine codes beneath it, never the coarse layer.
pub fn selector_matches(
    layer: Granularity,
    raw: RawCode,
    code: RawCode,
    selector: Granularity,
) -> bool {
    match (layer, selector) {
        (Granularity::Coarse, Granularity::Coarse) => {
            raw == code || special_transform(raw) == Some(code)
        }
        _ => layer.ancestor_code(raw, selector) == Some(code),
    }
}

/// Filters for an explicit selector list. Every layer gets a predicate, even
/// an empty one, so the renderer hides what no selector reaches.
pub fn compile_codes_layer_filters(
    taxonomy: &Taxonomy,
    selectors: &[(RawCode, Granularity)],
) -> LayerFilters {
    let layer = |granularity: Granularity| {
        let codes: Vec<RawCode> = taxonomy
            .codes(granularity)
            .filter(|raw| {
                selectors
                    .iter()
                    .any(|(code, selector)| selector_matches(granularity, *raw, *code, *selector))
            })
            .collect();
        Some(LayerFilter::new(granularity, codes))
    };
    LayerFilters {
        coarse: layer(Granularity::Coarse),
        medium: layer(Granularity::Medium),
        fine: layer(Granularity::Fine),
    }
}

/// Filters for the advanced filter text box. Blank text lifts every
/// restriction; a bad token rejects the whole text.
pub fn compile_advanced_layer_filters(
    taxonomy: &Taxonomy,
    text: &str,
) -> Result<LayerFilters, FilterParseError> {
    if text.trim().is_empty() {
        return Ok(LayerFilters::unrestricted());
    }
    let selectors = parse_advanced_filter_codes(text)?;
    // Separators only, such as ",,": treated like empty text.
    if selectors.is_empty() {
        return Ok(LayerFilters::unrestricted());
    }
    let filters = compile_codes_layer_filters(taxonomy, &selectors);
    tracing::debug!(
        target: "vegmap::filters",
        selectors = selectors.len(),
        coarse = filters.coarse.as_ref().map_or(0, |f| f.codes.len()),
        medium = filters.medium.as_ref().map_or(0, |f| f.codes.len()),
        fine = filters.fine.as_ref().map_or(0, |f| f.codes.len()),
        "filters.compiled=advanced"
    );
    Ok(filters)
}

pub fn compile_category_layer_filters(
    taxonomy: &Taxonomy,
    category: CategoryFilter,
) -> LayerFilters {
    let ecology = match category {
        CategoryFilter::Natural => Ecology::Natural,
        CategoryFilter::Secondary => Ecology::Secondary,
        CategoryFilter::All | CategoryFilter::Disabled => return LayerFilters::unrestricted(),
    };
    let partition = taxonomy.partition();
    let layer = |granularity: Granularity| {
        Some(LayerFilter::new(
            granularity,
            partition.codes(ecology, granularity).to_vec(),
        ))
    };
    LayerFilters {
        coarse: layer(Granularity::Coarse),
        medium: layer(Granularity::Medium),
        fine: layer(Granularity::Fine),
    }
}
