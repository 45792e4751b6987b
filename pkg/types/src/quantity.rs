use anyhow::{Result, anyhow, bail};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Internal precision: quantities are compared in nano-units.
const NANO_EXPONENT: i32 = 9;

/// A resource amount in cluster quantity notation (`2`, `500m`, `1.5Gi`, `1e3`).
///
/// Two quantities are equal when their values are equal, regardless of the
/// notation used (`1k == 1000`). The original notation is kept for display and
/// serialization. Values finer than one nano-unit are rounded up.
#[derive(Debug, Clone)]
pub struct Quantity {
    raw: String,
    nanos: i128,
}

enum Scale {
    /// Multiply by 10^n.
    Decimal(i32),
    /// Multiply by 2^n.
    Binary(u32),
}

impl Quantity {
    pub fn zero() -> Self {
        Self {
            raw: "0".to_string(),
            nanos: 0,
        }
    }

    /// A plain object count such as `pods: 5`.
    pub fn from_count(count: u64) -> Self {
        Self {
            raw: count.to_string(),
            nanos: i128::from(count) * 10i128.pow(NANO_EXPONENT as u32),
        }
    }

    /// Value expressed in nano-units.
    pub fn nanos(&self) -> i128 {
        self.nanos
    }

    pub fn is_zero(&self) -> bool {
        self.nanos == 0
    }

    pub fn is_negative(&self) -> bool {
        self.nanos < 0
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self::zero()
    }
}

impl FromStr for Quantity {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let raw = s.trim();
        if raw.is_empty() {
            bail!("quantity must not be empty");
        }

        let (negative, unsigned) = match raw.as_bytes()[0] {
            b'-' => (true, &raw[1..]),
            b'+' => (false, &raw[1..]),
            _ => (false, raw),
        };

        let number_end = unsigned
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(unsigned.len());
        let (number, suffix) = unsigned.split_at(number_end);
        let (int_part, frac_part) = number.split_once('.').unwrap_or((number, ""));

        if int_part.is_empty() && frac_part.is_empty() {
            bail!("quantity '{}' has no digits", raw);
        }
        if frac_part.contains('.') {
            bail!("quantity '{}' has more than one decimal point", raw);
        }

        let mantissa: i128 = format!("{}{}", int_part, frac_part)
            .parse()
            .map_err(|_| anyhow!("quantity '{}' is too large", raw))?;

        let mut exponent = NANO_EXPONENT - frac_part.len() as i32;
        let mut value = mantissa;
        match parse_suffix(suffix).ok_or_else(|| anyhow!("quantity '{}' has unknown suffix '{}'", raw, suffix))? {
            Scale::Decimal(power) => {
                exponent = exponent
                    .checked_add(power)
                    .ok_or_else(|| anyhow!("quantity '{}' has an out of range exponent", raw))?;
            }
            Scale::Binary(shift) => {
                value = value
                    .checked_mul(1i128 << shift)
                    .ok_or_else(|| anyhow!("quantity '{}' is too large", raw))?;
            }
        }
        let value = scale_by_pow10(value, exponent)
            .ok_or_else(|| anyhow!("quantity '{}' is too large", raw))?;

        Ok(Self {
            raw: raw.to_string(),
            nanos: if negative { -value } else { value },
        })
    }
}

fn parse_suffix(suffix: &str) -> Option<Scale> {
    let scale = match suffix {
        "" => Scale::Decimal(0),
        "n" => Scale::Decimal(-9),
        "u" => Scale::Decimal(-6),
        "m" => Scale::Decimal(-3),
        "k" => Scale::Decimal(3),
        "M" => Scale::Decimal(6),
        "G" => Scale::Decimal(9),
        "T" => Scale::Decimal(12),
        "P" => Scale::Decimal(15),
        "E" => Scale::Decimal(18),
        "Ki" => Scale::Binary(10),
        "Mi" => Scale::Binary(20),
        "Gi" => Scale::Binary(30),
        "Ti" => Scale::Binary(40),
        "Pi" => Scale::Binary(50),
        "Ei" => Scale::Binary(60),
        // `1e3`, `1E-2`; a bare `E` was matched above as exa.
        other if other.starts_with(['e', 'E']) => Scale::Decimal(other[1..].parse().ok()?),
        _ => return None,
    };
    Some(scale)
}

/// `value * 10^exponent`, rounding up when the exponent is negative.
fn scale_by_pow10(value: i128, exponent: i32) -> Option<i128> {
    if exponent >= 0 {
        return value.checked_mul(10i128.checked_pow(exponent as u32)?);
    }
    match 10i128.checked_pow(exponent.unsigned_abs()) {
        Some(divisor) => Some(value / divisor + i128::from(value % divisor != 0)),
        None => Some(i128::from(value != 0)),
    }
}

impl PartialEq for Quantity {
    fn eq(&self, other: &Self) -> bool {
        self.nanos == other.nanos
    }
}

impl Eq for Quantity {}

impl PartialOrd for Quantity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Quantity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.nanos.cmp(&other.nanos)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(QuantityVisitor)
    }
}

struct QuantityVisitor;

impl Visitor<'_> for QuantityVisitor {
    type Value = Quantity;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a quantity string such as \"500m\" or \"2Gi\", or a number")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Quantity, E> {
        v.parse().map_err(|e: anyhow::Error| E::custom(e))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Quantity, E> {
        Ok(Quantity::from_count(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Quantity, E> {
        self.visit_str(&v.to_string())
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Quantity, E> {
        self.visit_str(&v.to_string())
    }
}
