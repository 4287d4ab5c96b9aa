//! Which granularity the map shows at a zoom level, and moving a selected
//! code between levels.

use thiserror::Error;
use vg_schema::{Granularity, RawCode};

use crate::viewer_config::ZoomConfig;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RescaleError {
    #[error("cannot rescale code {code} from {from} to finer {to}")]
    Widening {
        code: RawCode,
        from: Granularity,
        to: Granularity,
    },
}

/// Granularity whose layer is visible at `zoom`.
pub fn granularity_for_zoom(config: &ZoomConfig, zoom: f64) -> Granularity {
    if zoom >= config.fine_min_zoom() {
        Granularity::Fine
    } else if zoom >= config.medium_min_zoom() {
        Granularity::Medium
    } else {
        Granularity::Coarse
    }
}

/// Narrows `code` from `from` to `to`. Narrowing drops two digits per step;
/// widening would have to invent them and is refused.
pub fn rescale_code(
    code: RawCode,
    from: Granularity,
    to: Granularity,
) -> Result<RawCode, RescaleError> {
    from.ancestor_code(code, to)
        .ok_or(RescaleError::Widening { code, from, to })
}

/// Legend level to show for a selection made at `code_granularity` once the
/// map shows `map_granularity`. The legend follows the map toward coarser
/// levels and never invents detail the selection does not carry.
pub fn legend_granularity_after_zoom(
    code_granularity: Granularity,
    map_granularity: Granularity,
) -> Granularity {
    code_granularity.min(map_granularity)
}
