//! Line-level parsing for the pipe-delimited SanMar inventory feed.
//!
//! Expected columns: `part_number|color_name|size|warehouse_code|quantity`.
//! An optional header row repeats the column names and is skipped.

/// One parsed feed row, fields trimmed but otherwise verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedLine {
    pub part_number: String,
    pub color_name: String,
    pub size: String,
    pub warehouse_code: String,
    pub quantity: i64,
}

/// Why a feed line was rejected. Carried into the skip log, never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineIssue {
    /// Wrong number of pipe-delimited fields.
    FieldCount(usize),
    /// A required field was empty after trimming.
    EmptyField(&'static str),
    /// The quantity column did not parse as an integer.
    BadQuantity(String),
}

impl std::fmt::Display for LineIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LineIssue::FieldCount(n) => write!(f, "expected 5 fields, found {n}"),
            LineIssue::EmptyField(name) => write!(f, "empty {name} field"),
            LineIssue::BadQuantity(raw) => write!(f, "quantity is not an integer: {raw:?}"),
        }
    }
}

/// True when the line repeats the column names instead of carrying data.
#[must_use]
pub fn is_header_line(line: &str) -> bool {
    line.split('|')
        .next()
        .is_some_and(|first| first.trim().eq_ignore_ascii_case("part_number"))
}

/// Parses one data line.
///
/// Negative quantities are accepted; upstream uses them for oversold cells
/// and the matrix layer displays them as-is.
///
/// # Errors
///
/// Returns a [`LineIssue`] describing the first problem found.
pub fn parse_feed_line(line: &str) -> Result<FeedLine, LineIssue> {
    let fields: Vec<&str> = line.split('|').map(str::trim).collect();
    if fields.len() != 5 {
        return Err(LineIssue::FieldCount(fields.len()));
    }

    let [part_number, color_name, size, warehouse_code, quantity_raw] =
        [fields[0], fields[1], fields[2], fields[3], fields[4]];

    for (name, value) in [
        ("part_number", part_number),
        ("color_name", color_name),
        ("size", size),
        ("warehouse_code", warehouse_code),
    ] {
        if value.is_empty() {
            return Err(LineIssue::EmptyField(name));
        }
    }

    let quantity = quantity_raw
        .parse::<i64>()
        .map_err(|_| LineIssue::BadQuantity(quantity_raw.to_string()))?;

    Ok(FeedLine {
        part_number: part_number.to_string(),
        color_name: color_name.to_string(),
        size: size.to_string(),
        warehouse_code: warehouse_code.to_string(),
        quantity,
    })
}
