//! Canonical style-number normalization and best-effort guessing.
//!
//! Uses manual char scanning rather than `regex` to stay dependency-light.

/// Normalizes any identifier used for canonical lookups: trim + upper-case.
#[must_use]
pub fn normalize_style_number(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Guesses a canonical style number for a supplier part with no explicit
/// mapping.
///
/// Heuristic, in order:
/// 1. Part id shaped like one optional leading letter followed by 4+ digits
///    (`C1717`, `18500`): strip the letter, return the digits.
/// 2. Brand known: 3-letter upper-case brand prefix, a dash, and the part id
///    reduced to its alphanumeric characters (`Gildan` + `G-500` → `GIL-G500`).
/// 3. Otherwise the part id verbatim, normalized.
///
/// The result is not guaranteed unique; callers must tolerate a later
/// re-link when an explicit mapping shows up.
#[must_use]
pub fn guess_style_number(supplier_part_id: &str, brand: Option<&str>) -> String {
    let part = normalize_style_number(supplier_part_id);

    if let Some(digits) = strip_letter_prefix_digits(&part) {
        return digits.to_string();
    }

    if let Some(brand) = brand.map(str::trim).filter(|b| !b.is_empty()) {
        let prefix: String = brand
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .take(3)
            .collect::<String>()
            .to_uppercase();
        if !prefix.is_empty() {
            let alnum: String = part.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
            return format!("{prefix}-{alnum}");
        }
    }

    part
}

/// Matches `[A-Z]?\d{4,}` against the whole token and returns the digit run.
fn strip_letter_prefix_digits(part: &str) -> Option<&str> {
    let rest = match part.as_bytes() {
        [first, ..] if first.is_ascii_uppercase() => &part[1..],
        _ => part,
    };
    if rest.len() >= 4 && rest.bytes().all(|b| b.is_ascii_digit()) {
        Some(rest)
    } else {
        None
    }
}
