//! Plain-text strategies: explicit "answer is X" phrases and bare numbers.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

fn bool_phrase_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)\banswer\s+is\s*[:=]?\s*["'`]?(true|false)\b"#).expect("valid regex")
    })
}

fn word_phrase_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)\banswer\s+is\s*[:=]?\s*["'`]?([\w.\-]+)"#).expect("valid regex")
    })
}

fn number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // no lookbehind in `regex`: the number must start the text or follow a
    // separator, so digits inside words, URLs and dates are skipped
    RE.get_or_init(|| Regex::new(r"(?:^|[^\w.\-])(-?\d+(?:\.\d+)?)").expect("valid regex"))
}

/// Find an explicit `answer is <value>` phrase.
///
/// A `true`/`false` literal anywhere in the text takes precedence over the
/// first free-form capture. Numeric captures become numbers.
pub fn answer_phrase(text: &str) -> Option<Value> {
    if let Some(cap) = bool_phrase_re().captures(text) {
        let literal = cap.get(1)?.as_str();
        return Some(Value::Bool(literal.eq_ignore_ascii_case("true")));
    }
    let cap = word_phrase_re().captures(text)?;
    let word = cap.get(1)?.as_str().trim_end_matches(['.', '-']);
    if word.is_empty() {
        return None;
    }
    Some(parse_token(word).unwrap_or_else(|| Value::String(word.to_string())))
}

/// Every free-standing numeric token in `text`, as written.
pub fn numeric_tokens(text: &str) -> Vec<&str> {
    number_re()
        .captures_iter(text)
        .filter_map(|cap| cap.get(1))
        .map(|m| m.as_str())
        .collect()
}

/// The bare-number fallback.
///
/// No tokens means `true` (the page just wants an acknowledgement), one
/// token is the answer, several are summed. Integers stay integers unless a
/// decimal is involved or the sum overflows.
pub fn bare_number(text: &str) -> Value {
    let tokens = numeric_tokens(text);
    match tokens.as_slice() {
        [] => Value::Bool(true),
        [single] => parse_token(single).unwrap_or(Value::Bool(true)),
        many => sum_tokens(many),
    }
}

fn parse_token(token: &str) -> Option<Value> {
    if !token.contains('.') {
        if let Ok(i) = token.parse::<i64>() {
            return Some(Value::from(i));
        }
    }
    token
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
}

fn sum_tokens(tokens: &[&str]) -> Value {
    let all_int = tokens.iter().all(|t| !t.contains('.'));
    if all_int {
        let total = tokens.iter().try_fold(0i64, |acc, t| {
            t.parse::<i64>().ok().and_then(|v| acc.checked_add(v))
        });
        if let Some(total) = total {
            return Value::from(total);
        }
    }
    let total: f64 = tokens.iter().filter_map(|t| t.parse::<f64>().ok()).sum();
    serde_json::Number::from_f64(total)
        .map(Value::Number)
        .unwrap_or(Value::Bool(true))
}
