//! Status enums for orders, payments and user roles.
//!
//! Orders and payments are mutated only by the backend. The client mirrors
//! whatever status the backend returns and does not enforce a transition
//! table: an owner may set any state through the update endpoints.

use serde::{Deserialize, Serialize};

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum OrderStatus {
    #[default]
    Pending,
    Preparing,
    Accepted,
    Delivered,
    Rejected,
    Discarded,
}

impl OrderStatus {
    /// Every order status, in the order the owner console lists them.
    pub const ALL: [Self; 6] = [
        Self::Pending,
        Self::Preparing,
        Self::Accepted,
        Self::Delivered,
        Self::Rejected,
        Self::Discarded,
    ];

    /// Wire name of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Preparing => "preparing",
            Self::Accepted => "accepted",
            Self::Delivered => "delivered",
            Self::Rejected => "rejected",
            Self::Discarded => "discarded",
        }
    }

    /// Whether the order no longer needs attention from the shop.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(self, Self::Delivered | Self::Rejected | Self::Discarded)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for OrderStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| format!("invalid order status: {s}"))
    }
}

/// Payment verification status.
///
/// Payments are screenshots reviewed by the shop owner, so `Verified` is set
/// by a human rather than a payment processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Verified,
    Rejected,
    Failed,
}

impl PaymentStatus {
    /// Every payment status.
    pub const ALL: [Self; 4] = [Self::Pending, Self::Verified, Self::Rejected, Self::Failed];

    /// Wire name of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Verified => "verified",
            Self::Rejected => "rejected",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for PaymentStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| format!("invalid payment status: {s}"))
    }
}

/// Role claim carried in the bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Manages a shop through the owner console.
    ShopOwner,
    /// Orders from the storefront.
    Student,
    /// Orders from the storefront.
    Teacher,
    /// Any role this client does not know about.
    #[serde(other)]
    Unknown,
}

impl Role {
    /// Whether the role may shop on the storefront.
    #[must_use]
    pub const fn is_customer(&self) -> bool {
        matches!(self, Self::Student | Self::Teacher)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ShopOwner => write!(f, "shop_owner"),
            Self::Student => write!(f, "student"),
            Self::Teacher => write!(f, "teacher"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}
