//! CLI argument validators.

/// Parse a count that must be at least `min`.
pub fn parse_min_count(s: &str, min: usize, name: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid count"))?;

    if value < min {
        return Err(format!("{name} must be at least {min}, got {value}"));
    }

    Ok(value)
}

/// Parse a cross-validation fold count (at least 2).
pub fn parse_folds(s: &str) -> Result<usize, String> {
    parse_min_count(s, 2, "folds")
}
