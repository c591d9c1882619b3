//! Column operations
//!
//! Text operations applied in order to a column value. Every operation maps a
//! string to a string, so results can be written straight back into a CSV row.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

static YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}").expect("valid year pattern"));

/// All available column operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
    /// Remove leading and trailing whitespace
    Trim,

    /// Convert to uppercase
    Uppercase,

    /// Convert to lowercase
    Lowercase,

    /// Replace using regex pattern
    Replace {
        pattern: String,
        #[serde(default)]
        value: String,
    },

    /// Pad string at start to reach target length
    PadStart {
        length: usize,
        #[serde(default = "default_pad_char")]
        char: String,
    },

    /// Pad string at end to reach target length
    PadEnd {
        length: usize,
        #[serde(default = "default_pad_char")]
        char: String,
    },

    /// Extract year (4 digits) from a date string
    ExtractYear,

    /// Ensure string starts with given prefix
    EnsurePrefix { value: String },

    /// Ensure string ends with given suffix
    EnsureSuffix { value: String },

    /// Map values using a lookup table
    Map {
        mapping: HashMap<String, String>,
        #[serde(default)]
        case_insensitive: bool,
        /// Value used when nothing matches (none = empty)
        #[serde(default)]
        default_unmapped: Option<String>,
    },

    /// Render as `true` or `false`
    ToBoolean {
        #[serde(default = "default_true_values")]
        true_values: Vec<String>,
    },

    /// Keep sign and digits of an integer
    ToNumber,

    /// Take `length` characters from `start`
    Substring {
        start: usize,
        #[serde(default)]
        length: Option<usize>,
    },

    /// Remove all non-alphanumeric characters
    Alphanumeric,

    /// Remove all non-digit characters
    DigitsOnly,
}

fn default_pad_char() -> String {
    "0".to_string()
}

fn default_true_values() -> Vec<String> {
    vec![
        "true".to_string(),
        "1".to_string(),
        "yes".to_string(),
        "y".to_string(),
    ]
}

impl Operation {
    /// Apply this operation to a value.
    ///
    /// `replace` compiles its pattern on each call and fails if the pattern is
    /// invalid. [`MatrixExecutor`](super::MatrixExecutor) compiles patterns once
    /// and rejects invalid ones before any row is read.
    pub fn apply(&self, value: &str) -> Result<String, regex::Error> {
        let result = match self {
            Operation::Trim => value.trim().to_string(),
            Operation::Uppercase => value.to_uppercase(),
            Operation::Lowercase => value.to_lowercase(),
            Operation::Replace { pattern, value: replacement } => {
                Self::apply_replace(value, &Regex::new(pattern)?, replacement)
            }
            Operation::PadStart { length, char } => Self::pad(value, *length, char, true),
            Operation::PadEnd { length, char } => Self::pad(value, *length, char, false),
            Operation::ExtractYear => YEAR
                .find(value)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
            Operation::EnsurePrefix { value: prefix } => {
                if value.starts_with(prefix.as_str()) {
                    value.to_string()
                } else {
                    format!("{}{}", prefix, value)
                }
            }
            Operation::EnsureSuffix { value: suffix } => {
                if value.ends_with(suffix.as_str()) {
                    value.to_string()
                } else {
                    format!("{}{}", value, suffix)
                }
            }
            Operation::Map { mapping, case_insensitive, default_unmapped } => {
                Self::apply_map(value, mapping, *case_insensitive, default_unmapped.as_deref())
            }
            Operation::ToBoolean { true_values } => {
                let lower = value.trim().to_lowercase();
                let truthy = true_values.iter().any(|tv| tv.to_lowercase() == lower);
                truthy.to_string()
            }
            Operation::ToNumber => Self::apply_to_number(value),
            Operation::Substring { start, length } => {
                let chars = value.chars().skip(*start);
                match length {
                    Some(len) => chars.take(*len).collect(),
                    None => chars.collect(),
                }
            }
            Operation::Alphanumeric => value.chars().filter(|c| c.is_alphanumeric()).collect(),
            Operation::DigitsOnly => value.chars().filter(|c| c.is_ascii_digit()).collect(),
        };
        Ok(result)
    }

    /// `replace` with an already compiled pattern.
    pub fn apply_replace(value: &str, re: &Regex, replacement: &str) -> String {
        re.replace_all(value, replacement).into_owned()
    }

    fn pad(value: &str, length: usize, pad_char: &str, at_start: bool) -> String {
        let count = value.chars().count();
        if count >= length {
            return value.to_string();
        }
        let pad = pad_char.chars().next().unwrap_or('0');
        let padding: String = std::iter::repeat(pad).take(length - count).collect();
        if at_start {
            format!("{}{}", padding, value)
        } else {
            format!("{}{}", value, padding)
        }
    }

    fn apply_map(
        value: &str,
        mapping: &HashMap<String, String>,
        case_insensitive: bool,
        default_unmapped: Option<&str>,
    ) -> String {
        let found = if case_insensitive {
            let key = value.to_lowercase();
            mapping.iter().find(|(k, _)| k.to_lowercase() == key).map(|(_, v)| v)
        } else {
            mapping.get(value)
        };

        match found {
            Some(v) => v.clone(),
            None => default_unmapped.unwrap_or_default().to_string(),
        }
    }

    fn apply_to_number(value: &str) -> String {
        let is_negative = value.trim().starts_with('-');
        let digits: String = value.chars().filter(|c| c.is_ascii_digit()).collect();
        let digits = digits.trim_start_matches('0');

        match (digits.is_empty(), is_negative) {
            (true, _) if value.contains('0') => "0".to_string(),
            (true, _) => String::new(),
            (false, true) => format!("-{}", digits),
            (false, false) => digits.to_string(),
        }
    }
}

/// Get a description of all available operations
pub fn operations_description() -> String {
    r#"Available column operations:

| Operation | Description | Parameters |
|-----------|-------------|------------|
| trim | Remove leading/trailing whitespace | - |
| uppercase | Convert to uppercase | - |
| lowercase | Convert to lowercase | - |
| replace | Regex pattern replacement | pattern: regex, value: replacement |
| pad_start | Pad string at start | length: target length, char: pad character (default "0") |
| pad_end | Pad string at end | length: target length, char: pad character (default "0") |
| extract_year | Extract 4-digit year from date | - |
| ensure_prefix | Add prefix if not present | value: prefix string |
| ensure_suffix | Add suffix if not present | value: suffix string |
| map | Map values using lookup table | mapping: {source: target}, case_insensitive: bool, default_unmapped: string |
| to_boolean | Render as true/false | true_values: list of truthy strings |
| to_number | Keep sign and digits of an integer | - |
| substring | Extract substring | start: start index, length: optional length |
| alphanumeric | Keep only alphanumeric chars | - |
| digits_only | Keep only digits | - |

Example operations in JSON:
[
  {"type": "trim"},
  {"type": "replace", "pattern": "[-. ]", "value": ""},
  {"type": "map", "mapping": {"CA": "Composer", "A": "Author"}, "case_insensitive": true},
  {"type": "to_number"},
  {"type": "ensure_prefix", "value": "T"}
]"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim() {
        assert_eq!(Operation::Trim.apply("  hello  ").unwrap(), "hello");
    }

    #[test]
    fn test_replace() {
        let op = Operation::Replace {
            pattern: "[-. ]".to_string(),
            value: String::new(),
        };
        assert_eq!(op.apply("T-123.456 789").unwrap(), "T123456789");
    }

    #[test]
    fn test_invalid_pattern_is_an_error() {
        let op = Operation::Replace {
            pattern: "(".to_string(),
            value: String::new(),
        };
        assert!(op.apply("abc").is_err());
    }

    #[test]
    fn test_map() {
        let mut mapping = HashMap::new();
        mapping.insert("CA".to_string(), "Composer".to_string());
        mapping.insert("A".to_string(), "Author".to_string());

        let op = Operation::Map { mapping: mapping.clone(), case_insensitive: true, default_unmapped: None };
        assert_eq!(op.apply("ca").unwrap(), "Composer");
        assert_eq!(op.apply("Unknown").unwrap(), "");

        let op_with_default = Operation::Map { mapping, case_insensitive: false, default_unmapped: Some("Other".to_string()) };
        assert_eq!(op_with_default.apply("ca").unwrap(), "Other");
        assert_eq!(op_with_default.apply("A").unwrap(), "Author");
    }

    #[test]
    fn test_to_number() {
        assert_eq!(Operation::ToNumber.apply("123-456-789").unwrap(), "123456789");
        assert_eq!(Operation::ToNumber.apply(" -0042").unwrap(), "-42");
        assert_eq!(Operation::ToNumber.apply("000").unwrap(), "0");
        assert_eq!(Operation::ToNumber.apply("n/a").unwrap(), "");
    }

    #[test]
    fn test_extract_year() {
        assert_eq!(Operation::ExtractYear.apply("15/03/2024").unwrap(), "2024");
        assert_eq!(Operation::ExtractYear.apply("2023-12-25").unwrap(), "2023");
        assert_eq!(Operation::ExtractYear.apply("unknown").unwrap(), "");
    }

    #[test]
    fn test_ensure_prefix_and_suffix() {
        let op = Operation::EnsurePrefix { value: "T".to_string() };
        assert_eq!(op.apply("1234567890").unwrap(), "T1234567890");
        assert_eq!(op.apply("T1234567890").unwrap(), "T1234567890");

        let op = Operation::EnsureSuffix { value: ".csv".to_string() };
        assert_eq!(op.apply("report").unwrap(), "report.csv");
        assert_eq!(op.apply("report.csv").unwrap(), "report.csv");
    }

    #[test]
    fn test_padding_counts_chars() {
        let op = Operation::PadStart { length: 5, char: "0".to_string() };
        assert_eq!(op.apply("42").unwrap(), "00042");
        assert_eq!(op.apply("123456").unwrap(), "123456");

        let op = Operation::PadEnd { length: 4, char: "·".to_string() };
        assert_eq!(op.apply("é").unwrap(), "é···");
    }

    #[test]
    fn test_to_boolean() {
        let op = Operation::ToBoolean { true_values: default_true_values() };
        assert_eq!(op.apply("Yes").unwrap(), "true");
        assert_eq!(op.apply("no").unwrap(), "false");
    }

    #[test]
    fn test_substring_and_filters() {
        let op = Operation::Substring { start: 1, length: Some(3) };
        assert_eq!(op.apply("abcdef").unwrap(), "bcd");
        assert_eq!(Operation::Substring { start: 10, length: None }.apply("abc").unwrap(), "");
        assert_eq!(Operation::Alphanumeric.apply("a-b c!1").unwrap(), "abc1");
        assert_eq!(Operation::DigitsOnly.apply("+33 (0)1 23").unwrap(), "330123");
    }

    #[test]
    fn test_deserialize_tagged() {
        let ops: Vec<Operation> = serde_json::from_str(
            r#"[{"type": "trim"}, {"type": "pad_start", "length": 3}, {"type": "to_boolean"}]"#,
        )
        .unwrap();
        assert_eq!(ops[0], Operation::Trim);
        assert_eq!(ops[1], Operation::PadStart { length: 3, char: "0".to_string() });
        assert!(matches!(&ops[2], Operation::ToBoolean { true_values } if true_values.len() == 4));
    }
}
