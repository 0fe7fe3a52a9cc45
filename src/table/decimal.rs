use std::fmt;

/// Fixed-point number with three fractional digits, stored as a scaled `i128`.
///
/// Matches the default `DECIMAL(18,3)` of analytical engines for parsed prices
/// and widens to 38 digits of precision for sums.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Decimal(i128);

impl Decimal {
    pub const SCALE: i8 = 3;
    pub const PRECISION: u8 = 38;
    const FACTOR: i128 = 1_000;
    const MAX_UNITS: i128 = 10_i128.pow(Self::PRECISION as u32) - 1;

    pub const ZERO: Decimal = Decimal(0);

    /// Wrap a raw value already scaled by 10^3.
    pub fn from_units(units: i128) -> Option<Self> {
        (units.unsigned_abs() <= Self::MAX_UNITS as u128).then_some(Self(units))
    }

    /// The raw value scaled by 10^3.
    pub fn units(self) -> i128 {
        self.0
    }

    pub fn checked_add(self, rhs: Decimal) -> Option<Decimal> {
        self.0.checked_add(rhs.0).and_then(Self::from_units)
    }

    pub fn checked_mul_int(self, rhs: i64) -> Option<Decimal> {
        self.0.checked_mul(rhs as i128).and_then(Self::from_units)
    }

    /// Parse a plain decimal literal (`"1700"`, `"-11.95"`, `".5"`).
    ///
    /// Surrounding whitespace is ignored. Digits past the third fractional
    /// place round half away from zero. Exponents are not accepted.
    pub fn parse(raw: &str) -> Option<Self> {
        let s = raw.trim();
        let (negative, s) = match s.as_bytes().first()? {
            b'-' => (true, &s[1..]),
            b'+' => (false, &s[1..]),
            _ => (false, s),
        };
        let (int_part, frac_part) = match s.split_once('.') {
            Some((i, f)) => (i, f),
            None => (s, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return None;
        }
        if !int_part.bytes().all(|b| b.is_ascii_digit())
            || !frac_part.bytes().all(|b| b.is_ascii_digit())
        {
            return None;
        }

        let mut units: i128 = 0;
        for b in int_part.bytes() {
            units = units.checked_mul(10)?.checked_add((b - b'0') as i128)?;
        }
        units = units.checked_mul(Self::FACTOR)?;

        let frac = frac_part.as_bytes();
        let mut place = Self::FACTOR / 10;
        for &b in frac.iter().take(Self::SCALE as usize) {
            units = units.checked_add((b - b'0') as i128 * place)?;
            place /= 10;
        }
        if frac.get(Self::SCALE as usize).is_some_and(|&b| b >= b'5') {
            units = units.checked_add(1)?;
        }

        Self::from_units(if negative { -units } else { units })
    }
}

impl From<i64> for Decimal {
    fn from(v: i64) -> Self {
        Self(v as i128 * Self::FACTOR)
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let factor = Self::FACTOR as u128;
        write!(f, "{}{}.{:03}", sign, abs / factor, abs % factor)
    }
}
