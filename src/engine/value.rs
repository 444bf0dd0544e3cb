// src/engine/value.rs
//
// Cell value normalization. Every numeric cell normalizes to exactly one of
// integer, float or Absent; Absent never participates in arithmetic (it is
// 0 for sums and excluded from denominators and averages).

use once_cell::sync::Lazy;
use regex::Regex;

/// Period-like token: academic or financial year such as "2022-23".
pub static PERIOD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{4}-\d{2}").expect("Failed to compile PERIOD_RE"));

/// A normalized cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Text(String),
    Absent,
}

impl Value {
    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    /// Numeric view; `Text` and `Absent` have none.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Numeric view for summation, where Absent counts as 0.
    pub fn as_f64_or_zero(&self) -> f64 {
        self.as_f64().unwrap_or(0.0)
    }

    /// Raw rendering for report/export output. Stored values are always raw
    /// numeric; locale grouping is applied separately at display time.
    pub fn render(&self) -> String {
        match self {
            Value::Int(i) => i.to_string(),
            Value::Float(f) => format!("{:.2}", f),
            Value::Text(s) => s.clone(),
            Value::Absent => String::new(),
        }
    }
}

/// Collapses embedded line breaks to spaces and trims. Applied once to
/// every header / label cell before any matching.
pub fn collapse(raw: &str) -> String {
    raw.replace('\n', " ").trim().to_string()
}

/// Normalizes an integer count cell: strips thousands separators, then
/// parses. Blank, bare-dash and non-numeric cells are Absent.
pub fn normalize_count(raw: &str) -> Value {
    let cleaned = collapse(raw).replace(',', "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() || cleaned == "-" {
        return Value::Absent;
    }
    match cleaned.parse::<i64>() {
        Ok(n) => Value::Int(n),
        Err(_) => Value::Absent,
    }
}

/// Normalizes a currency cell that may carry a parenthetical annotation,
/// e.g. "₹1,234 (One thousand two hundred...)": only the text before the
/// first opening parenthesis is considered, then all non-digit characters
/// are stripped.
pub fn normalize_currency(raw: &str) -> Value {
    let before_note = raw.split('(').next().unwrap_or("");
    let digits: String = before_note.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return Value::Absent;
    }
    match digits.parse::<i64>() {
        Ok(n) => Value::Int(n),
        Err(_) => Value::Absent,
    }
}

/// Normalizes a period label cell: line-break collapse and trim only.
/// Returns None when the result does not contain a period-like token.
pub fn normalize_period(raw: &str) -> Option<String> {
    let cleaned = collapse(raw);
    if PERIOD_RE.is_match(&cleaned) {
        Some(cleaned)
    } else {
        None
    }
}

/// Formats a number in Indian currency style: last three digits, then
/// groups of two ("₹ 12,34,56,789"). Pure presentation; used only when
/// rendering a value for display or export.
pub fn format_indian_currency(number: f64) -> String {
    let n = number.round() as i64;
    let (sign, n) = if n < 0 { ("-", -n) } else { ("", n) };
    let s = n.to_string();
    if s.len() <= 3 {
        return format!("₹ {}{}", sign, s);
    }
    let (rest, last3) = s.split_at(s.len() - 3);
    let mut parts: Vec<String> = Vec::new();
    let mut rest = rest.to_string();
    while rest.len() > 2 {
        parts.push(rest.split_off(rest.len() - 2));
    }
    if !rest.is_empty() {
        parts.push(rest);
    }
    parts.reverse();
    format!("₹ {}{},{}", sign, parts.join(","), last3)
}
