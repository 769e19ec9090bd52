//! Fuzzy color-name reconciliation between catalog and inventory feeds.
//!
//! The two feeds spell the same color differently ("Hthr Grey" vs
//! "Heather Gray"), so matching runs a priority-ordered chain of key
//! normalization strategies. Each strategy transforms the output of the
//! previous one, and the first level at which an inventory name's key equals
//! a catalog name's key wins. Strategies are a chain so new ones can be
//! appended without touching call sites.

/// One key-normalization step. Receives the output of the previous step.
pub trait ColorKeyStrategy: Send + Sync {
    fn apply(&self, input: &str) -> String;
}

/// Upper-cased alphanumeric characters only.
struct AlnumOnly;

impl ColorKeyStrategy for AlnumOnly {
    fn apply(&self, input: &str) -> String {
        input
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .collect::<String>()
            .to_uppercase()
    }
}

/// Drops vowels, keeping the leading character so "OLIVE" and "ALIVE" stay
/// distinct.
struct VowelStripped;

impl ColorKeyStrategy for VowelStripped {
    fn apply(&self, input: &str) -> String {
        input
            .chars()
            .enumerate()
            .filter(|&(i, c)| i == 0 || !matches!(c, 'A' | 'E' | 'I' | 'O' | 'U'))
            .map(|(_, c)| c)
            .collect()
    }
}

/// Collapses runs of the same character ("GRRN" → "GRN").
struct RunDeduplicated;

impl ColorKeyStrategy for RunDeduplicated {
    fn apply(&self, input: &str) -> String {
        let mut out = String::with_capacity(input.len());
        let mut prev = None;
        for c in input.chars() {
            if prev != Some(c) {
                out.push(c);
            }
            prev = Some(c);
        }
        out
    }
}

fn default_chain() -> Vec<Box<dyn ColorKeyStrategy>> {
    vec![
        Box::new(AlnumOnly),
        Box::new(VowelStripped),
        Box::new(RunDeduplicated),
    ]
}

/// Produces the cumulative key ladder for a color name, most exact first.
#[must_use]
pub fn color_key_candidates(name: &str) -> Vec<String> {
    let mut keys = Vec::new();
    let mut current = name.to_string();
    for strategy in default_chain() {
        current = strategy.apply(&current);
        keys.push(current.clone());
    }
    keys
}

/// Outcome of resolving an inventory color name against catalog colors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorResolution {
    /// The catalog color code on a match, or a sanitized form of the raw
    /// name when nothing matched.
    pub code: String,
    pub matched: bool,
}

/// Resolves a raw inventory color name to a catalog `(code, name)` pair.
///
/// Keys are tried level by level across the whole catalog: an exact
/// alphanumeric match on any catalog color beats a vowel-stripped match on
/// any other, regardless of catalog order. No match at any level falls back
/// to the sanitized raw name.
#[must_use]
pub fn resolve_color_code(raw_name: &str, catalog: &[(String, String)]) -> ColorResolution {
    let candidate_keys = color_key_candidates(raw_name);
    let catalog_keys: Vec<(usize, Vec<String>)> = catalog
        .iter()
        .enumerate()
        .map(|(i, (_, name))| (i, color_key_candidates(name)))
        .collect();

    for level in 0..candidate_keys.len() {
        let wanted = &candidate_keys[level];
        if wanted.is_empty() {
            continue;
        }
        for (i, keys) in &catalog_keys {
            if keys.get(level) == Some(wanted) {
                return ColorResolution {
                    code: catalog[*i].0.clone(),
                    matched: true,
                };
            }
        }
    }

    ColorResolution {
        code: sanitize_color_name(raw_name),
        matched: false,
    }
}

/// Fallback code for a color the catalog does not know: alphanumerics only,
/// upper-cased, empty input mapped to `"UNSPECIFIED"`.
#[must_use]
pub fn sanitize_color_name(raw_name: &str) -> String {
    let sanitized = AlnumOnly.apply(raw_name);
    if sanitized.is_empty() {
        "UNSPECIFIED".to_string()
    } else {
        sanitized
    }
}
