/// Draws returned by the read endpoint when no usable limit is given
pub const DEFAULT_RESULTS_LIMIT: i64 = 10;
pub const MAX_RESULTS_LIMIT: i64 = 100;

/// Interpret the `limit` query parameter: missing, non-numeric or
/// non-positive values fall back to the default, large ones are capped.
pub fn parse_limit(raw: Option<&str>) -> i64 {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|&limit| limit > 0)
        .map_or(DEFAULT_RESULTS_LIMIT, |limit| limit.min(MAX_RESULTS_LIMIT))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_parsing() {
        assert_eq!(parse_limit(None), DEFAULT_RESULTS_LIMIT);
        assert_eq!(parse_limit(Some("3")), 3);
        assert_eq!(parse_limit(Some(" 25 ")), 25);
        assert_eq!(parse_limit(Some("abc")), DEFAULT_RESULTS_LIMIT);
        assert_eq!(parse_limit(Some("0")), DEFAULT_RESULTS_LIMIT);
        assert_eq!(parse_limit(Some("-4")), DEFAULT_RESULTS_LIMIT);
        assert_eq!(parse_limit(Some("5000")), MAX_RESULTS_LIMIT);
    }
}
