use std::num::ParseIntError;

use thiserror::Error;

use crate::{special_transform, Granularity, RawCode, MAX_RAW_CODE};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FilterParseError {
    #[error("\"{token}\" is not an integer: {source}")]
    InvalidInteger {
        token: String,
        #[source]
        source: ParseIntError,
    },
    #[error("{value} is outside of range(1, {})", MAX_RAW_CODE + 1)]
    OutOfRange { value: u64 },
}

/// Parses a comma separated code list such as `"01****, 1305**, 991234"`.
///
/// Trailing `*` wildcards and leading zeros are ignored, empty tokens are
/// skipped. The whole text is rejected on the first bad token.
pub fn parse_advanced_filter_codes(
    text: &str,
) -> Result<Vec<(RawCode, Granularity)>, FilterParseError> {
    text.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(parse_filter_token)
        .collect()
}

fn parse_filter_token(token: &str) -> Result<(RawCode, Granularity), FilterParseError> {
    let digits = token.trim_end_matches('*').trim();
    let significant = digits.trim_start_matches('0');
    let value = if significant.is_empty() && !digits.is_empty() {
        0
    } else {
        significant
            .parse::<u64>()
            .map_err(|source| FilterParseError::InvalidInteger {
                token: token.to_string(),
                source,
            })?
    };

    if value == 0 || value > u64::from(MAX_RAW_CODE) {
        return Err(FilterParseError::OutOfRange { value });
    }

    Ok(classify_code(value as RawCode))
}

/// Granularity of a user-typed code, decided by magnitude alone. Coarse codes
/// are mapped through the special transform.
pub fn classify_code(value: RawCode) -> (RawCode, Granularity) {
    if value < 100 {
        (
            special_transform(value).unwrap_or(value),
            Granularity::Coarse,
        )
    } else if value < 10_000 {
        (value, Granularity::Medium)
    } else {
        (value, Granularity::Fine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mixed_granularities() {
        let parsed = parse_advanced_filter_codes("91,1305**,991234").unwrap();
        assert_eq!(
            parsed,
            vec![
                (58, Granularity::Coarse),
                (1305, Granularity::Medium),
                (991_234, Granularity::Fine),
            ]
        );
    }

    #[test]
    fn strips_leading_zeros_and_wildcards() {
        let parsed = parse_advanced_filter_codes(" 01**** , 0101** ,").unwrap();
        assert_eq!(
            parsed,
            vec![(1, Granularity::Coarse), (101, Granularity::Medium)]
        );
    }

    #[test]
    fn rejects_zero_and_garbage() {
        assert!(matches!(
            parse_advanced_filter_codes("0"),
            Err(FilterParseError::OutOfRange { value: 0 })
        ));
        assert!(matches!(
            parse_advanced_filter_codes("0000**"),
            Err(FilterParseError::OutOfRange { value: 0 })
        ));
        assert!(matches!(
            parse_advanced_filter_codes("abc"),
            Err(FilterParseError::InvalidInteger { .. })
        ));
        assert!(matches!(
            parse_advanced_filter_codes("**"),
            Err(FilterParseError::InvalidInteger { .. })
        ));
    }

    #[test]
    fn rejects_out_of_range() {
        let err = parse_advanced_filter_codes("1000000").unwrap_err();
        assert_eq!(err.to_string(), "1000000 is outside of range(1, 1000000)");
        assert!(parse_advanced_filter_codes("999999").is_ok());
    }

    #[test]
    fn one_bad_token_rejects_everything() {
        assert!(parse_advanced_filter_codes("57,5701,nope,570101").is_err());
    }

    #[test]
    fn empty_text_parses_to_nothing() {
        assert!(parse_advanced_filter_codes("").unwrap().is_empty());
        assert!(parse_advanced_filter_codes(" , ").unwrap().is_empty());
    }

    #[test]
    fn classification_boundaries() {
        assert_eq!(classify_code(99), (57, Granularity::Coarse));
        assert_eq!(classify_code(100), (100, Granularity::Medium));
        assert_eq!(classify_code(9_999), (9_999, Granularity::Medium));
        assert_eq!(classify_code(10_000), (10_000, Granularity::Fine));
    }
}
