use crate::error::{Error, Result};
use crate::table::{DataType, Decimal};

/// `TRY_CAST(.. AS INTEGER)`: optional whitespace and sign, 32-bit range,
/// `None` on any failure.
pub fn try_cast_integer(raw: &str) -> Option<i64> {
    raw.trim().parse::<i32>().ok().map(i64::from)
}

/// Unguarded integer cast: null stays null, anything unparsable is an error.
pub fn cast_integer(column: &str, raw: Option<&str>) -> Result<Option<i64>> {
    raw.map(|s| try_cast_integer(s).ok_or_else(|| Error::cast(column, s, DataType::Integer)))
        .transpose()
}

/// Unguarded decimal cast, three fractional digits.
pub fn cast_decimal(column: &str, raw: Option<&str>) -> Result<Option<Decimal>> {
    raw.map(|s| Decimal::parse(s).ok_or_else(|| Error::cast(column, s, DataType::Decimal)))
        .transpose()
}
