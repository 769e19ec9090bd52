//! Fixed apparel size ordering for inventory matrix columns.

/// Canonical column order for recognized apparel sizes.
const SIZE_ORDER: [&str; 11] = [
    "XXS", "XS", "S", "M", "L", "XL", "2XL", "3XL", "4XL", "5XL", "6XL",
];

/// Sort key for a size code: recognized apparel sizes first in fixed order,
/// then numeric codes (shoe/waist sizes) in numeric order, then everything
/// else lexicographically.
#[must_use]
pub fn size_sort_key(code: &str) -> (u8, i64, String) {
    let upper = code.trim().to_uppercase();
    let canonical = match upper.as_str() {
        "XXL" => "2XL",
        "XXXL" => "3XL",
        other => other,
    };

    if let Some(rank) = SIZE_ORDER.iter().position(|s| *s == canonical) {
        return (0, i64::try_from(rank).unwrap_or(i64::MAX), String::new());
    }

    if let Ok(value) = upper.parse::<f64>() {
        // Two decimal places is enough for half sizes.
        #[allow(clippy::cast_possible_truncation)]
        let scaled = (value * 100.0).round() as i64;
        return (1, scaled, upper);
    }

    (2, 0, upper)
}

/// Sorts size codes in place using [`size_sort_key`].
pub fn sort_size_codes(codes: &mut [String]) {
    codes.sort_by_key(|c| size_sort_key(c));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apparel_sizes_follow_fixed_order() {
        let mut codes: Vec<String> = ["L", "XS", "3XL", "M", "S", "2XL", "XL"]
            .iter()
            .map(ToString::to_string)
            .collect();
        sort_size_codes(&mut codes);
        assert_eq!(codes, ["XS", "S", "M", "L", "XL", "2XL", "3XL"]);
    }

    #[test]
    fn xxl_aliases_to_2xl_slot() {
        assert_eq!(size_sort_key("XXL"), size_sort_key("2xl"));
    }

    #[test]
    fn numeric_sizes_sort_numerically_after_apparel() {
        let mut codes: Vec<String> = ["10", "9.5", "6XL", "8"]
            .iter()
            .map(ToString::to_string)
            .collect();
        sort_size_codes(&mut codes);
        assert_eq!(codes, ["6XL", "8", "9.5", "10"]);
    }

    #[test]
    fn unrecognized_codes_sort_last_lexicographically() {
        let mut codes: Vec<String> = ["OSFA", "M", "ADJ"].iter().map(ToString::to_string).collect();
        sort_size_codes(&mut codes);
        assert_eq!(codes, ["M", "ADJ", "OSFA"]);
    }
}
