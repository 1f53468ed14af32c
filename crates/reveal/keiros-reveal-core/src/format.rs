//! Display formatting for counter values.
//!
//! Precedence when inferring from a target: percent suffix, then >= 100 000
//! (kilo), then >= 1 000 (grouped), then plain.

use serde::{Deserialize, Serialize};

const KILO_FROM: f64 = 100_000.0;
const GROUPED_FROM: f64 = 1_000.0;

fn default_decimals() -> u8 {
    2
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Formatter {
    /// Floor to an integer, append the suffix verbatim.
    Plain {
        #[serde(default)]
        suffix: String,
    },
    /// Fixed decimals followed by `%`.
    Percent {
        #[serde(default = "default_decimals")]
        decimals: u8,
    },
    /// Floor to an integer with `,` group separators, append the suffix.
    Thousands {
        #[serde(default)]
        suffix: String,
    },
    /// Divide by 1000, one decimal, `K`.
    Kilo,
}

impl Default for Formatter {
    fn default() -> Self {
        Formatter::Plain {
            suffix: String::new(),
        }
    }
}

impl Formatter {
    /// Pick the formatter for a counter ending at `end` with the page's `data-suffix`.
    pub fn infer(end: f64, suffix: &str) -> Self {
        if suffix == "%" {
            Formatter::Percent {
                decimals: default_decimals(),
            }
        } else if end >= KILO_FROM {
            Formatter::Kilo
        } else if end >= GROUPED_FROM {
            Formatter::Thousands {
                suffix: suffix.to_string(),
            }
        } else {
            Formatter::Plain {
                suffix: suffix.to_string(),
            }
        }
    }

    pub fn format(&self, value: f64) -> String {
        match self {
            Formatter::Plain { suffix } => format!("{}{}", floor_int(value), suffix),
            Formatter::Percent { decimals } => {
                format!("{:.*}%", usize::from(*decimals), value)
            }
            Formatter::Thousands { suffix } => {
                format!("{}{}", group_thousands(floor_int(value)), suffix)
            }
            Formatter::Kilo => format!("{:.1}K", value / 1000.0),
        }
    }
}

#[inline]
fn floor_int(value: f64) -> i64 {
    // Saturating cast; counters never leave the i64 range in practice.
    value.floor() as i64
}

/// `1234567` → `"1,234,567"` (en-US grouping).
pub fn group_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    let lead = digits.len() % 3;
    for (i, ch) in digits.chars().enumerate() {
        if i != 0 && (i + 3 - lead) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grouping() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1247), "1,247");
        assert_eq!(group_thousands(85234), "85,234");
        assert_eq!(group_thousands(1234567), "1,234,567");
        assert_eq!(group_thousands(-1234), "-1,234");
    }

    #[test]
    fn inference_precedence() {
        assert_eq!(
            Formatter::infer(99.97, "%"),
            Formatter::Percent { decimals: 2 }
        );
        // percent wins even for large targets
        assert_eq!(
            Formatter::infer(250_000.0, "%"),
            Formatter::Percent { decimals: 2 }
        );
        assert_eq!(Formatter::infer(150_000.0, "+"), Formatter::Kilo);
        assert_eq!(
            Formatter::infer(1247.0, "+"),
            Formatter::Thousands { suffix: "+".into() }
        );
        assert_eq!(
            Formatter::infer(485.0, ""),
            Formatter::Plain { suffix: "".into() }
        );
    }

    #[test]
    fn formatting_rules() {
        assert_eq!(Formatter::Percent { decimals: 2 }.format(99.97), "99.97%");
        assert_eq!(Formatter::Kilo.format(85234.0), "85.2K");
        assert_eq!(
            Formatter::Thousands { suffix: "".into() }.format(1247.9),
            "1,247"
        );
        assert_eq!(
            Formatter::Plain { suffix: "ms".into() }.format(485.6),
            "485ms"
        );
    }

    #[test]
    fn serde_shape() {
        let f: Formatter = serde_json::from_str(r#"{ "kind": "percent" }"#).unwrap();
        assert_eq!(f, Formatter::Percent { decimals: 2 });
        let f: Formatter = serde_json::from_str(r#"{ "kind": "kilo" }"#).unwrap();
        assert_eq!(f, Formatter::Kilo);
    }
}
