//! Forgiving parsers for operator input.
//!
//! Every parser returns `None` on malformed input; callers treat `None` as
//! "skip the operation".

use tracing::debug;

use crate::types::Coordinate;

/// Parses a decimal integer, ignoring surrounding whitespace.
pub fn parse_int(input: &str) -> Option<i64> {
    let parsed = input.trim().parse::<i64>().ok();
    if parsed.is_none() {
        debug!("Rejected integer input {:?}", input);
    }
    parsed
}

/// Parses an integer that must fit in `i32`.
pub fn parse_i32(input: &str) -> Option<i32> {
    parse_int(input).and_then(|v| i32::try_from(v).ok())
}

/// Parses an integer that must be zero or positive.
pub fn parse_u32(input: &str) -> Option<u32> {
    parse_int(input).and_then(|v| u32::try_from(v).ok())
}

/// Parses a zero-based index.
pub fn parse_index(input: &str) -> Option<usize> {
    parse_int(input).and_then(|v| usize::try_from(v).ok())
}

/// Parses an operator list row of the form `X: <x> Y: <y>`.
///
/// Tokens are whitespace separated; the labels are not checked, only their
/// positions, matching how list rows are produced by [`Coordinate`]'s
/// `Display`.
pub fn parse_coordinate_row(row: &str) -> Option<Coordinate> {
    let tokens: Vec<&str> = row.split_whitespace().collect();
    match tokens.as_slice() {
        [_, x, _, y] => Some(Coordinate::new(parse_i32(x)?, parse_i32(y)?)),
        _ => {
            debug!("Rejected coordinate row {:?}", row);
            None
        }
    }
}

/// Parses every row, dropping malformed ones.
pub fn parse_coordinate_rows<S: AsRef<str>>(rows: &[S]) -> Vec<Coordinate> {
    rows.iter()
        .filter_map(|row| parse_coordinate_row(row.as_ref()))
        .collect()
}

/// Formats coordinates as operator list rows.
pub fn format_coordinate_rows(coords: &[Coordinate]) -> Vec<String> {
    coords.iter().map(ToString::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_int_forgiving() {
        assert_eq!(parse_int(" 42 "), Some(42));
        assert_eq!(parse_int("-3"), Some(-3));
        assert_eq!(parse_int("4.5"), None);
        assert_eq!(parse_int("abc"), None);
        assert_eq!(parse_int(""), None);
    }

    #[test]
    fn test_parse_unsigned_rejects_negative() {
        assert_eq!(parse_u32("-1"), None);
        assert_eq!(parse_u32("11"), Some(11));
        assert_eq!(parse_index("-2"), None);
    }

    #[test]
    fn test_coordinate_rows() {
        let rows = ["X: 10 Y: 20", "garbage", "X: 1 Y: two", "X: -5 Y: 7"];
        let coords = parse_coordinate_rows(&rows);
        assert_eq!(coords, vec![Coordinate::new(10, 20), Coordinate::new(-5, 7)]);
        assert_eq!(format_coordinate_rows(&coords), vec!["X: 10 Y: 20", "X: -5 Y: 7"]);
    }
}
