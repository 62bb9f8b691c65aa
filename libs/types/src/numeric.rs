//! Fixed-point integer types for prices and quantities
//!
//! Prices are non-negative integers in minor units (e.g. cents). The
//! external string form must carry exactly two fractional digits; parsing
//! happens once at order construction and all internal arithmetic is plain
//! integer arithmetic.

use crate::errors::OrderError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Sub, SubAssign};
use std::str::FromStr;

/// Price in minor units
///
/// `"100.00"` parses to `Price(10000)`. Accepted string form is
/// `digits '.' two-digits` and nothing else: no sign, no missing decimal
/// point, no other fractional width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(u32);

impl Price {
    /// Create directly from minor units
    pub fn from_minor(minor: u32) -> Self {
        Self(minor)
    }

    /// Get the minor-unit value
    pub fn as_minor(&self) -> u32 {
        self.0
    }
}

impl FromStr for Price {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || OrderError::InvalidPrice(s.to_string());

        let (major, fraction) = s.split_once('.').ok_or_else(invalid)?;
        if major.is_empty()
            || fraction.len() != 2
            || !major.bytes().all(|b| b.is_ascii_digit())
            || !fraction.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }

        let major: u32 = major.parse().map_err(|_| invalid())?;
        let fraction: u32 = fraction.parse().map_err(|_| invalid())?;
        major
            .checked_mul(100)
            .and_then(|m| m.checked_add(fraction))
            .map(Price)
            .ok_or_else(invalid)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

/// Order quantity
///
/// Strictly positive at submission time (enforced by the order
/// constructors) and monotonically non-increasing afterwards; reaching zero
/// means the order is filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(u32);

impl Quantity {
    pub const ZERO: Quantity = Quantity(0);

    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// The smaller of two quantities
    pub fn min(self, other: Quantity) -> Quantity {
        Quantity(self.0.min(other.0))
    }
}

impl Sub for Quantity {
    type Output = Quantity;

    fn sub(self, rhs: Quantity) -> Quantity {
        assert!(rhs.0 <= self.0, "quantity underflow: {} - {}", self.0, rhs.0);
        Quantity(self.0 - rhs.0)
    }
}

impl SubAssign for Quantity {
    fn sub_assign(&mut self, rhs: Quantity) {
        *self = *self - rhs;
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
