use std::cmp::Ordering;

/// Calculates the 1-based line and column number for a given byte position in the source text.
/// This function is designed to be called only when an error occurs, as it iterates through
/// the source text to determine the position.
pub fn get_line_and_column(source: &str, position: usize) -> (usize, usize) {
    let mut line = 1;
    let mut column = 1;
    for (i, c) in source.char_indices() {
        if i >= position {
            break;
        }
        if c == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    (line, column)
}

/// Orders two optional revision dates. A missing revision is older than any date.
///
/// Dates are compared as strings; valid `YYYY-MM-DD` dates order lexicographically
/// the same way they order chronologically.
pub fn compare_revisions(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => a.cmp(b),
    }
}

/// Splits `prefix:name` into its parts. Unprefixed identifiers yield `None` as the prefix.
pub fn split_prefixed(id: &str) -> (Option<&str>, &str) {
    match id.split_once(':') {
        Some((prefix, name)) => (Some(prefix), name),
        None => (None, id),
    }
}
