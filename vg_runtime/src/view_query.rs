//! Map center and zoom <-> page query string.
//!
//! The parameter names are historical: `x` carries the latitude and `y` the
//! longitude.

use crate::ViewState;

/// Tokyo station at a zoom where fine codes are visible.
pub const DEFAULT_VIEW: ViewState = ViewState {
    lng: 139.7669975,
    lat: 35.6812505,
    zoom: 11.0,
};

const VIEW_KEYS: [&str; 3] = ["x", "y", "z"];

fn query_pairs(query: &str) -> impl Iterator<Item = (&str, &str)> {
    query
        .trim_start_matches('?')
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
}

fn query_float(query: &str, key: &str) -> Option<f64> {
    query_pairs(query)
        .find(|(name, _)| *name == key)
        .and_then(|(_, value)| value.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite())
}

/// Reads the view from a query string. Coordinates fall back together when
/// either is missing; a missing or zero zoom falls back on its own.
pub fn parse_view_query(query: &str, fallback: ViewState) -> ViewState {
    let (lng, lat) = match (query_float(query, "y"), query_float(query, "x")) {
        (Some(lng), Some(lat)) => (lng, lat),
        _ => (fallback.lng, fallback.lat),
    };
    let zoom = query_float(query, "z")
        .filter(|zoom| *zoom != 0.0)
        .unwrap_or(fallback.zoom);
    ViewState { lng, lat, zoom }
}

pub fn format_view_query(view: &ViewState) -> String {
    format!("x={:.5}&y={:.5}&z={:.5}", view.lat, view.lng, view.zoom)
}

/// Replaces the view parameters of `existing`, keeping every other parameter
/// in place.
pub fn merge_view_query(existing: &str, view: &ViewState) -> String {
    let mut parts: Vec<String> = query_pairs(existing)
        .filter(|(name, _)| !VIEW_KEYS.contains(name))
        .map(|(name, value)| {
            if value.is_empty() {
                name.to_string()
            } else {
                format!("{name}={value}")
            }
        })
        .collect();
    parts.push(format_view_query(view));
    format!("?{}", parts.join("&"))
}
