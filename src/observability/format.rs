//! Formatting helpers for log lines.
//!
//! Pure functions: status code colorization by bucket, tolerant JSON parsing,
//! and pretty-printing of payloads with per-token colors.

use colored::{Color, ColoredString, Colorize};
use serde_json::Value;

/// Status code classes that share a color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusBucket {
    /// 1xx, 2xx and anything unrecognized.
    Success,
    /// 3xx.
    Redirect,
    /// 4xx.
    ClientError,
    /// 5xx.
    ServerError,
}

impl StatusBucket {
    /// Classify by the leading digit.
    pub fn of(status: u16) -> Self {
        match status / 100 {
            3 => StatusBucket::Redirect,
            4 => StatusBucket::ClientError,
            5 => StatusBucket::ServerError,
            _ => StatusBucket::Success,
        }
    }

    pub fn color(self) -> Color {
        match self {
            StatusBucket::Success => Color::BrightGreen,
            StatusBucket::Redirect => Color::BrightMagenta,
            StatusBucket::ClientError => Color::Yellow,
            StatusBucket::ServerError => Color::BrightRed,
        }
    }
}

/// Status code painted with its bucket color.
pub fn format_status_code(status: u16) -> ColoredString {
    status.to_string().color(StatusBucket::of(status).color())
}

/// Parse JSON, yielding `None` instead of an error.
pub fn safe_parse_json(input: &str) -> Option<Value> {
    serde_json::from_str(input).ok()
}

/// Token classes recognized when colorizing JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenClass {
    Key,
    String,
    Number,
    Boolean,
    Null,
    /// Structural characters and anything else.
    Other,
}

impl TokenClass {
    pub fn paint(self, token: &str) -> ColoredString {
        match self {
            TokenClass::Key => token.bright_blue().bold(),
            TokenClass::String => token.green(),
            TokenClass::Number => token.yellow(),
            TokenClass::Boolean => token.blue(),
            TokenClass::Null => token.red(),
            TokenClass::Other => token.normal(),
        }
    }
}

/// Options for [`format_json`].
#[derive(Debug, Clone, Copy)]
pub struct JsonFormat {
    pub colors: bool,
    pub minify: bool,
}

impl Default for JsonFormat {
    fn default() -> Self {
        Self {
            colors: true,
            minify: false,
        }
    }
}

/// Pretty-print a payload for a log line.
///
/// Input that is empty, not valid JSON, or parses to a falsy scalar (`null`,
/// `false`, `0`, `""`) is returned unchanged.
pub fn format_json(payload: &str, options: JsonFormat) -> String {
    if payload.is_empty() {
        return String::new();
    }

    let value = match safe_parse_json(payload) {
        Some(value) if !is_falsy(&value) => value,
        _ => return payload.to_string(),
    };

    format_value(&value, options)
}

/// Pretty-print an already parsed value.
pub fn format_value(value: &Value, options: JsonFormat) -> String {
    if !options.colors {
        let rendered = if options.minify {
            serde_json::to_string(value)
        } else {
            serde_json::to_string_pretty(value)
        };
        return rendered.unwrap_or_else(|_| value.to_string());
    }

    colored_tokens(value, options.minify)
        .iter()
        .map(ToString::to_string)
        .collect()
}

/// Painted pieces of a value, in output order.
fn colored_tokens(value: &Value, minify: bool) -> Vec<ColoredString> {
    let mut writer = ColorWriter {
        out: Vec::new(),
        minify,
    };
    writer.value(value, 0);
    writer.out
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

struct ColorWriter {
    out: Vec<ColoredString>,
    minify: bool,
}

impl ColorWriter {
    fn push(&mut self, class: TokenClass, token: &str) {
        self.out.push(class.paint(token));
    }

    fn newline(&mut self, depth: usize) {
        if !self.minify {
            let indent = format!("\n{}", "  ".repeat(depth));
            self.out.push(indent.as_str().normal());
        }
    }

    fn value(&mut self, value: &Value, depth: usize) {
        match value {
            Value::Null => self.push(TokenClass::Null, "null"),
            Value::Bool(b) => self.push(TokenClass::Boolean, if *b { "true" } else { "false" }),
            Value::Number(n) => self.push(TokenClass::Number, &n.to_string()),
            Value::String(_) => self.push(TokenClass::String, &value.to_string()),
            Value::Array(items) => {
                if items.is_empty() {
                    self.push(TokenClass::Other, "[]");
                    return;
                }
                self.push(TokenClass::Other, "[");
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.push(TokenClass::Other, ",");
                    }
                    self.newline(depth + 1);
                    self.value(item, depth + 1);
                }
                self.newline(depth);
                self.push(TokenClass::Other, "]");
            }
            Value::Object(map) => {
                if map.is_empty() {
                    self.push(TokenClass::Other, "{}");
                    return;
                }
                self.push(TokenClass::Other, "{");
                for (i, (key, item)) in map.iter().enumerate() {
                    if i > 0 {
                        self.push(TokenClass::Other, ",");
                    }
                    self.newline(depth + 1);
                    // Keys lose their quotes once colored.
                    self.push(TokenClass::Key, key);
                    self.out.push(":".bright_white());
                    if !self.minify {
                        self.out.push(" ".normal());
                    }
                    self.value(item, depth + 1);
                }
                self.newline(depth);
                self.push(TokenClass::Other, "}");
            }
        }
    }
}

/// Prefix a framework log line with the crate tag.
pub fn tagged(parts: &[&str], colors: bool) -> String {
    let message = parts.join(" ");
    if colors {
        format!("{}{}", "[trellis] ".yellow(), message.green())
    } else {
        format!("[trellis] {}", message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PLAIN: JsonFormat = JsonFormat {
        colors: false,
        minify: false,
    };

    #[test]
    fn test_status_buckets() {
        assert_eq!(StatusBucket::of(200), StatusBucket::Success);
        assert_eq!(StatusBucket::of(202), StatusBucket::Success);
        assert_eq!(StatusBucket::of(300), StatusBucket::Redirect);
        assert_eq!(StatusBucket::of(302), StatusBucket::Redirect);
        assert_eq!(StatusBucket::of(400), StatusBucket::ClientError);
        assert_eq!(StatusBucket::of(404), StatusBucket::ClientError);
        assert_eq!(StatusBucket::of(500), StatusBucket::ServerError);
        assert_eq!(StatusBucket::of(502), StatusBucket::ServerError);
    }

    #[test]
    fn test_bucket_colors() {
        assert_eq!(StatusBucket::of(200).color(), Color::BrightGreen);
        assert_eq!(StatusBucket::of(302).color(), Color::BrightMagenta);
        assert_eq!(StatusBucket::of(404).color(), Color::Yellow);
        assert_eq!(StatusBucket::of(500).color(), Color::BrightRed);
    }

    #[test]
    fn test_format_status_code_keeps_digits() {
        colored::control::set_override(false);
        assert_eq!(format_status_code(404).to_string(), "404");
    }

    #[test]
    fn test_safe_parse_json() {
        assert_eq!(
            safe_parse_json(r#"{"hello":"world"}"#),
            Some(json!({ "hello": "world" }))
        );
        assert_eq!(safe_parse_json("{'hello': 'syntaxerror}"), None);
    }

    #[test]
    fn test_format_json_passthrough() {
        assert_eq!(format_json("", PLAIN), "");
        assert_eq!(format_json("{{}", PLAIN), "{{}");
        assert_eq!(format_json("plain text", PLAIN), "plain text");
        assert_eq!(format_json("null", PLAIN), "null");
    }

    #[test]
    fn test_format_json_pretty() {
        let value = json!({ "hello": "world" });
        assert_eq!(
            format_json(&value.to_string(), PLAIN),
            serde_json::to_string_pretty(&value).unwrap()
        );
    }

    #[test]
    fn test_colored_layout_matches_plain_layout() {
        colored::control::set_override(false);
        let value = json!({ "a": [1, true, null], "b": { "c": "d" }, "e": [] });
        let colored = format_value(&value, JsonFormat::default());

        // Without escape codes only the key quotes differ.
        let plain = serde_json::to_string_pretty(&value).unwrap();
        let unquoted = ["a", "b", "c", "e"]
            .iter()
            .fold(plain, |acc, key| acc.replace(&format!("\"{key}\":"), &format!("{key}:")));
        assert_eq!(colored, unquoted);
    }

    #[test]
    fn test_token_classes_are_distinct() {
        let value = json!({ "name": "widget", "count": 3, "active": true, "owner": null });
        let tokens = colored_tokens(&value, true);
        let color_of = |text: &str| {
            tokens
                .iter()
                .find(|token| token.input == text)
                .and_then(|token| token.fgcolor())
        };

        let key = color_of("name");
        let string = color_of("\"widget\"");
        let number = color_of("3");
        let boolean = color_of("true");
        let null = color_of("null");

        let classes = [key, string, number, boolean, null];
        assert!(classes.iter().all(Option::is_some));
        for (i, a) in classes.iter().enumerate() {
            for b in &classes[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_eq!(key, Some(Color::BrightBlue));
        assert_eq!(string, Some(Color::Green));
        assert_eq!(number, Some(Color::Yellow));
        assert_eq!(boolean, Some(Color::Blue));
        assert_eq!(null, Some(Color::Red));
        assert!(color_of("{").is_none());
    }

    #[test]
    fn test_tagged() {
        assert_eq!(tagged(&["Hello", "World"], false), "[trellis] Hello World");
    }
}
