//! Type-safe price representation using decimal arithmetic.
//!
//! Prices are currency-agnostic amounts. Every shop on the platform charges
//! in rupees, so `Display` renders the `Rs.` label the storefront shows next
//! to menu items and cart totals.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Display label prefixed to formatted prices.
pub const CURRENCY_LABEL: &str = "Rs.";

/// A non-negative price amount.
///
/// Serialized as a decimal string (`"120.50"`); deserializes from either a
/// string or a JSON number since the backend emits both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// A zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Get the underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price of `quantity` units.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }

    /// Whether the amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl From<i64> for Price {
    fn from(amount: i64) -> Self {
        Self(Decimal::from(amount))
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{CURRENCY_LABEL} {}", self.0.normalize())
    }
}

impl FromStr for Price {
    type Err = rust_decimal::Error;

    /// Parse `"120"`, `"120.50"` or the display form `"Rs. 120"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let amount = trimmed
            .strip_prefix(CURRENCY_LABEL)
            .map_or(trimmed, str::trim_start);
        Decimal::from_str(amount).map(Self)
    }
}
