use chrono::NaiveDateTime;

pub const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
pub const DAY_FIRST_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

const ISO_LEN: usize = 19;

pub const NA_TOKENS: &[&str] = &["", "na", "n/a", "nan", "null", "none", "error"];

/// Parses `YYYY-MM-DDTHH:MM:SS` or `DD/MM/YYYY HH:MM:SS`.
///
/// ISO strings with a fractional or zone suffix are accepted by reading only
/// their first 19 characters.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    static FORMATS: &[&str] = &[ISO_FORMAT, DAY_FIRST_FORMAT];
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    for fmt in FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt);
        }
    }

    if trimmed.contains('T') && trimmed.chars().count() >= ISO_LEN {
        let end = trimmed
            .char_indices()
            .nth(ISO_LEN)
            .map_or(trimmed.len(), |(idx, _)| idx);
        return NaiveDateTime::parse_from_str(&trimmed[..end], ISO_FORMAT).ok();
    }
    None
}

pub fn format_timestamp(value: &NaiveDateTime) -> String {
    value.format(ISO_FORMAT).to_string()
}

/// Parses a voltage cell. Comma decimals are accepted; NA tokens, unparseable
/// and non-finite values are `None`.
pub fn parse_value(value: Option<&str>) -> Option<f64> {
    let normalized = value?.trim().replace(',', ".").to_lowercase();
    if NA_TOKENS.contains(&normalized.as_str()) {
        return None;
    }
    normalized
        .parse::<f64>()
        .ok()
        .filter(|parsed| parsed.is_finite())
}

pub fn format_fixed3(value: f64) -> String {
    format!("{value:.3}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|date| date.and_hms_opt(h, min, s))
            .unwrap()
    }

    #[test]
    fn parses_both_explicit_formats() {
        assert_eq!(
            parse_timestamp("2024-01-01T00:00:00"),
            Some(at(2024, 1, 1, 0, 0, 0))
        );
        assert_eq!(
            parse_timestamp("31/12/2023 23:59:58"),
            Some(at(2023, 12, 31, 23, 59, 58))
        );
    }

    #[test]
    fn trims_before_parsing() {
        assert_eq!(
            parse_timestamp("  2024-03-05T10:20:30 \t"),
            Some(at(2024, 3, 5, 10, 20, 30))
        );
    }

    #[test]
    fn truncates_iso_suffixes() {
        let expected = Some(at(2024, 6, 1, 12, 0, 5));
        assert_eq!(parse_timestamp("2024-06-01T12:00:05.123456"), expected);
        assert_eq!(parse_timestamp("2024-06-01T12:00:05Z"), expected);
        assert_eq!(parse_timestamp("2024-06-01T12:00:05+02:00"), expected);
    }

    #[test]
    fn rejects_unknown_shapes() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("   "), None);
        assert_eq!(parse_timestamp("not-a-date"), None);
        assert_eq!(parse_timestamp("2024-01-01 00:00:00"), None);
        assert_eq!(parse_timestamp("2024-13-01T00:00:00"), None);
        assert_eq!(parse_timestamp("2024-01-01T00:00"), None);
        assert_eq!(parse_timestamp("XXXXXXXXXXTXXXXXXXXXXXX"), None);
    }

    #[test]
    fn accepts_comma_decimals() {
        assert_eq!(parse_value(Some("5,6")), Some(5.6));
        assert_eq!(parse_value(Some(" 0.4 ")), Some(0.4));
        assert_eq!(parse_value(Some("-1,25")), Some(-1.25));
    }

    #[test]
    fn na_tokens_are_missing() {
        for token in ["", "NA", "n/a", "NaN", "NULL", "None", "ERROR", "  nan  "] {
            assert_eq!(parse_value(Some(token)), None, "token {token:?}");
        }
        assert_eq!(parse_value(None), None);
    }

    #[test]
    fn rejects_garbage_and_infinities() {
        assert_eq!(parse_value(Some("abc")), None);
        assert_eq!(parse_value(Some("1,234.5")), None);
        assert_eq!(parse_value(Some("inf")), None);
        assert_eq!(parse_value(Some("-Infinity")), None);
    }

    #[test]
    fn formats_with_three_decimals() {
        assert_eq!(format_fixed3(0.4), "0.400");
        assert_eq!(format_fixed3(-30.0), "-30.000");
        assert_eq!(format_timestamp(&at(2024, 1, 2, 3, 4, 5)), "2024-01-02T03:04:05");
    }
}
