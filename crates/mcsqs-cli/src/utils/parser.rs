use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid cluster specification '{0}'. Expected 'SIZE=CUTOFF' (e.g., '2=5.5').")]
    InvalidClusterFormat(String),

    #[error("Invalid supercell '{0}'. Expected three positive integers 'A,B,C' (e.g., '2,2,2').")]
    InvalidSupercellFormat(String),

    #[error("Invalid override '{0}'. Expected 'KEY=VALUE'.")]
    InvalidKeyValue(String),
}

/// Parses a `SIZE=CUTOFF` cluster specification such as `2=5.5`.
///
/// Range checks on the values are left to the engine's input validation.
pub fn parse_cluster(spec: &str) -> Result<(u32, f64), ParseError> {
    let error = || ParseError::InvalidClusterFormat(spec.to_string());
    let (size, cutoff) = spec.split_once('=').ok_or_else(error)?;
    let size = size.trim().parse().map_err(|_| error())?;
    let cutoff = cutoff.trim().parse().map_err(|_| error())?;
    Ok((size, cutoff))
}

/// Parses `A,B,C` supercell multipliers.
pub fn parse_supercell(spec: &str) -> Result<[u32; 3], ParseError> {
    let error = || ParseError::InvalidSupercellFormat(spec.to_string());
    let values = spec
        .split(',')
        .map(|part| part.trim().parse::<u32>().map_err(|_| error()))
        .collect::<Result<Vec<_>, _>>()?;
    match values.as_slice() {
        &[a, b, c] if a > 0 && b > 0 && c > 0 => Ok([a, b, c]),
        _ => Err(error()),
    }
}

/// Splits a `KEY=VALUE` override at the first `=`.
pub fn parse_key_value(pair: &str) -> Result<(&str, &str), ParseError> {
    match pair.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim(), value.trim())),
        _ => Err(ParseError::InvalidKeyValue(pair.to_string())),
    }
}
