//! Pure, stateless field-level transforms shared by the per-entity cleaners.

use chrono::NaiveDate;

/// Formats attempted when the ambiguous day/month positions are read
/// month-first, in order. ISO forms go first so unambiguous inputs never
/// reach the ambiguous patterns.
const MONTH_FIRST_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%m-%d-%Y", "%m/%d/%y", "%b %d, %Y", "%B %d, %Y",
];

/// Same positions read day-first.
const DAY_FIRST_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y", "%d/%m/%y", "%d %b %Y", "%d %B %Y",
];

/// Canonicalize a phone number to `+91XXXXXXXXXX`.
///
/// Strips everything that is not a digit, then drops a leading `0` from an
/// 11-digit number or a leading `91` from a 12-digit number. Anything that
/// does not end up as exactly 10 digits is unusable and becomes None.
pub fn standardize_phone(raw: &str) -> Option<String> {
    let mut digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.len() == 11 && digits.starts_with('0') {
        digits.remove(0);
    }
    if digits.len() == 12 && digits.starts_with("91") {
        digits.drain(..2);
    }

    (digits.len() == 10).then(|| format!("+91{digits}"))
}

/// Lowercase + deliberately permissive validation: an address is usable iff
/// it contains both `@` and `.`. Not RFC validation.
pub fn standardize_email(raw: &str) -> Option<String> {
    let s = raw.trim().to_lowercase();
    (s.contains('@') && s.contains('.')).then_some(s)
}

/// Parse a mixed-format date, trying the month-first interpretation in full
/// before falling back to day-first. The first successful parse wins.
///
/// Known limitation, preserved for compatibility with existing loads: an
/// input valid under both interpretations ("03/04/2024") silently resolves
/// month-first, which may not be what the source meant.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    for formats in [MONTH_FIRST_FORMATS, DAY_FIRST_FORMATS] {
        for format in formats {
            if let Ok(date) = NaiveDate::parse_from_str(s, format) {
                return Some(date);
            }
        }
    }
    None
}

/// Map the known category spellings onto their canonical names; anything
/// outside the closed vocabulary passes through title-cased.
pub fn standardize_category(raw: &str) -> String {
    let s = raw.trim().to_lowercase();
    match s.as_str() {
        "electronics" => "Electronics".to_string(),
        "fashion" => "Fashion".to_string(),
        "groceries" => "Groceries".to_string(),
        _ => title_case(&s),
    }
}

/// Uppercase the first letter of every alphabetic run, lowercase the rest.
pub fn title_case(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut at_word_start = true;
    for c in raw.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

/// Lenient numeric coercion: trimmed decimal parse, non-finite rejected.
pub fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Round to 2 decimals, half away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
