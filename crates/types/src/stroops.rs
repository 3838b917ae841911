use thiserror::Error;

/// Smallest ledger unit per whole token.
pub const STROOPS_PER_UNIT: i64 = 10_000_000;

/// The ledger carries seven decimal places, no more.
pub const MAX_FRACTIONAL_DIGITS: usize = 7;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AmountError {
    #[error("empty amount")]
    Empty,
    #[error("malformed amount: {0:?}")]
    Malformed(String),
    #[error("negative amount: {0:?}")]
    Negative(String),
    #[error("amount {0:?} has more than {MAX_FRACTIONAL_DIGITS} fractional digits")]
    TooPrecise(String),
    #[error("amount {0:?} overflows the ledger unit range")]
    Overflow(String),
}

/// Convert a human decimal amount ("0.50") into stroops (5_000_000).
///
/// Pure integer decimal math; float rounding never touches user amounts.
pub fn to_stroops(amount: &str) -> Result<i64, AmountError> {
    let trimmed = amount.trim();
    if trimmed.is_empty() {
        return Err(AmountError::Empty);
    }
    if trimmed.starts_with('-') {
        return Err(AmountError::Negative(trimmed.to_string()));
    }

    let (whole, frac) = match trimmed.split_once('.') {
        Some((w, f)) => (w, f),
        None => (trimmed, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(AmountError::Malformed(trimmed.to_string()));
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(AmountError::Malformed(trimmed.to_string()));
    }
    if frac.len() > MAX_FRACTIONAL_DIGITS {
        return Err(AmountError::TooPrecise(trimmed.to_string()));
    }

    let whole_units: i64 = if whole.is_empty() {
        0
    } else {
        whole
            .parse()
            .map_err(|_| AmountError::Overflow(trimmed.to_string()))?
    };
    let mut frac_stroops: i64 = if frac.is_empty() {
        0
    } else {
        frac.parse()
            .map_err(|_| AmountError::Malformed(trimmed.to_string()))?
    };
    for _ in frac.len()..MAX_FRACTIONAL_DIGITS {
        frac_stroops *= 10;
    }

    whole_units
        .checked_mul(STROOPS_PER_UNIT)
        .and_then(|v| v.checked_add(frac_stroops))
        .ok_or_else(|| AmountError::Overflow(trimmed.to_string()))
}
