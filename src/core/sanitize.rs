// src/core/sanitize.rs
use std::borrow::Cow;
use std::sync::OnceLock;

use regex::Regex;

fn number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[-+]?\d+(?:\.\d+)?").expect("static regex"))
}

fn non_alnum_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-z0-9]+").expect("static regex"))
}

pub fn normalize_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_space { out.push(' '); prev_space = true; }
        } else { out.push(ch); prev_space = false; }
    }
    out.trim().to_string()
}

/// Visible name → slug: lowercase, runs of non-alphanumerics become one `-`,
/// no leading/trailing `-`. `"Nature's Prophet"` → `"nature-s-prophet"`.
pub fn slugify(name: &str) -> String {
    let lower = name.trim().to_lowercase();
    non_alnum_re()
        .replace_all(&lower, "-")
        .trim_matches('-')
        .to_string()
}

/// First signed decimal in `s`, or NaN when there is none.
/// `"56.31%"` → 56.31, `"-3.11"` → -3.11, `"—"` → NaN.
pub fn first_number(s: &str) -> f64 {
    number_re()
        .find(s)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .unwrap_or(f64::NAN)
}

/// Parse a raw attribute value as a float, falling back to the first number in it.
pub fn parse_float(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => first_number(raw),
    }
}

/// Drop every non-digit then parse. `"153,542"` → 153542; `""`/`"n/a"` → 0.
pub fn digits_to_u64(s: &str) -> u64 {
    let digits: String = s.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

/// Rewrite the bare `NaN` / `Infinity` / `-Infinity` tokens Python's `json`
/// module emits into `null`, leaving string contents alone. Strict JSON
/// passes through unchanged.
pub fn nonfinite_to_null(json: &str) -> Cow<'_, str> {
    const TOKENS: [&str; 3] = ["-Infinity", "Infinity", "NaN"];
    if !TOKENS.iter().any(|t| json.contains(t)) {
        return Cow::Borrowed(json);
    }

    let mut out = String::with_capacity(json.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut rest = json;
    while let Some(ch) = rest.chars().next() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
        } else if ch == '"' {
            in_string = true;
        } else if let Some(tok) = TOKENS.iter().find(|t| rest.starts_with(**t)) {
            out.push_str("null");
            rest = &rest[tok.len()..];
            continue;
        }
        out.push(ch);
        rest = &rest[ch.len_utf8()..];
    }
    Cow::Owned(out)
}
