//! Fill opacity of each layer for the current selection.

use vg_schema::{display_coarse_code, special_aliases, Granularity, OpacityValue, RawCode};

use crate::{filters::selector_matches, taxonomy::Taxonomy, viewer_config::OpacityConfig};

/// Codes on the `target` layer that stand for the same feature as the
/// selection. `None` when the selection does not propagate to that layer.
pub fn target_codes(
    taxonomy: &Taxonomy,
    raw: RawCode,
    selection: Granularity,
    target: Granularity,
) -> Option<Vec<RawCode>> {
    use Granularity::*;
    match (selection, target) {
        (from, to) if from == to => Some(vec![raw]),
        // Fine selections leave the coarse layer alone.
        (Fine, Coarse) => None,
        (Fine, Medium) => Some(vec![raw / 100]),
        (Medium, Coarse) => {
            let ancestor = raw / 100;
            let mut codes = vec![ancestor];
            codes.extend(special_aliases(ancestor));
            Some(codes)
        }
        (Coarse, finer) => {
            let code = display_coarse_code(raw);
            Some(
                taxonomy
                    .codes(finer)
                    .filter(|candidate| selector_matches(finer, *candidate, code, Coarse))
                    .collect(),
            )
        }
        (Medium, Fine) => Some(taxonomy.descendants(raw, Medium, Fine)),
        _ => None,
    }
}

/// Fill opacity for the `target` layer given the current selection.
pub fn compute_fill_opacity(
    taxonomy: &Taxonomy,
    config: &OpacityConfig,
    selected: Option<RawCode>,
    selection: Granularity,
    target: Granularity,
) -> OpacityValue {
    let resting = OpacityValue::Constant(config.default_for(target));
    let Some(raw) = selected else {
        return resting;
    };
    match target_codes(taxonomy, raw, selection, target) {
        Some(codes) => OpacityValue::Match {
            granularity: target,
            codes,
            selected: config.selected_for(target),
            otherwise: config.dimmed(),
        },
        None => resting,
    }
}
