//! ISK amount parsing and formatting
//!
//! Admins type ransom amounts the way they say them in game ("1.5b",
//! "250m", "12,000"); the database stores plain integers.

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::OnceLock;

fn amount_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+(?:\.\d+)?)([kmb])?$").expect("valid ISK regex"))
}

/// Parse a human ISK amount. Anything unparseable is zero.
pub fn parse_isk(raw: &str) -> i64 {
    let cleaned: String = raw
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, ',' | ' ' | '_'))
        .collect();
    if cleaned.is_empty() {
        return 0;
    }

    let value = match amount_re().captures(&cleaned) {
        Some(caps) => {
            let base: f64 = caps[1].parse().unwrap_or(0.0);
            let scale = match caps.get(2).map(|m| m.as_str()) {
                Some("k") => 1e3,
                Some("m") => 1e6,
                Some("b") => 1e9,
                _ => 1.0,
            };
            base * scale
        }
        None => cleaned.parse::<f64>().unwrap_or(0.0),
    };

    round_isk(value)
}

fn round_isk(value: f64) -> i64 {
    if value.is_finite() {
        value.round() as i64
    } else {
        0
    }
}

/// Short display form: `1.5b`, `250m`, `12.34k`, or the plain number
pub fn format_isk_short(amount: i64) -> String {
    let x = amount as f64;
    let scaled = if x >= 1e9 {
        Some((x / 1e9, 'b'))
    } else if x >= 1e6 {
        Some((x / 1e6, 'm'))
    } else if x >= 1e3 {
        Some((x / 1e3, 'k'))
    } else {
        None
    };

    match scaled {
        Some((v, suffix)) => {
            let fixed = format!("{:.2}", v);
            let trimmed = fixed.strip_suffix(".00").unwrap_or(&fixed);
            format!("{}{}", trimmed, suffix)
        }
        None => amount.to_string(),
    }
}

/// An ISK amount accepted either as a JSON number or a human string
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Isk(pub i64);

impl<'de> Deserialize<'de> for Isk {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
            Null(Option<()>),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Isk(round_isk(n)),
            Raw::Text(s) => Isk(parse_isk(&s)),
            Raw::Null(_) => Isk(0),
        })
    }
}

impl From<Isk> for i64 {
    fn from(isk: Isk) -> Self {
        isk.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_suffixes() {
        assert_eq!(parse_isk("1.5b"), 1_500_000_000);
        assert_eq!(parse_isk("250m"), 250_000_000);
        assert_eq!(parse_isk("3 k"), 3_000);
        assert_eq!(parse_isk("2B"), 2_000_000_000);
    }

    #[test]
    fn test_parse_plain_and_separators() {
        assert_eq!(parse_isk("12,000"), 12_000);
        assert_eq!(parse_isk("1_000_000"), 1_000_000);
        assert_eq!(parse_isk("  42 "), 42);
        assert_eq!(parse_isk("1e6"), 1_000_000);
    }

    #[test]
    fn test_parse_garbage_is_zero() {
        assert_eq!(parse_isk(""), 0);
        assert_eq!(parse_isk("lots"), 0);
        assert_eq!(parse_isk("1.5x"), 0);
    }

    #[test]
    fn test_format_short() {
        assert_eq!(format_isk_short(1_500_000_000), "1.50b");
        assert_eq!(format_isk_short(2_000_000_000), "2b");
        assert_eq!(format_isk_short(250_000_000), "250m");
        assert_eq!(format_isk_short(12_500), "12.50k");
        assert_eq!(format_isk_short(999), "999");
        assert_eq!(format_isk_short(0), "0");
    }

    #[test]
    fn test_deserialize_number_or_string() {
        let n: Isk = serde_json::from_str("1500000000.4").unwrap();
        assert_eq!(n, Isk(1_500_000_000));
        let s: Isk = serde_json::from_str("\"1.5b\"").unwrap();
        assert_eq!(s, Isk(1_500_000_000));
        let null: Isk = serde_json::from_str("null").unwrap();
        assert_eq!(null, Isk(0));
    }
}
