use crate::{Granularity, RawCode};

/// Renders a code the way printed legends do: `01****`, `5701**`, `570101`.
///
/// `99` and `9999` are "no information" placeholders one level down and are
/// padded as such.
pub fn format_code(code: RawCode) -> String {
    if code < 99 {
        format!("{code:02}****")
    } else if code < 9_999 {
        format!("{code:04}**")
    } else {
        format!("{code:06}")
    }
}

/// `"中区分/<name>"` style label used in pickers and filter previews.
pub fn describe_with_name(granularity: Granularity, name: &str) -> String {
    format!("{}/{}", granularity.label(), name)
}

/// Search box normalization: surrounding whitespace, trailing `*` wildcards and
/// leading zeros carry no meaning.
pub fn normalize_search_query(query: &str) -> &str {
    query.trim().trim_end_matches('*').trim_start_matches('0')
}
