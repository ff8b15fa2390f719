//! Orders and order status.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::id::{OrderId, UserId};
use crate::types::phone::PhoneNumber;
use crate::types::user::CartItem;

/// Lifecycle status of an order.
///
/// The flows only ever produce `New` and `Completed`. `Processing`,
/// `Delivered`, and `Cancelled` are legacy values still present in older
/// data files; they decode fine and count as open orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Just placed, awaiting handling.
    New,
    /// Legacy: being prepared.
    Processing,
    /// Legacy: handed to the customer.
    Delivered,
    /// Legacy: cancelled before completion.
    Cancelled,
    /// Fulfilled and closed.
    Completed,
}

impl OrderStatus {
    /// Whether the order still needs attention.
    #[must_use]
    pub const fn is_open(self) -> bool {
        !matches!(self, Self::Completed)
    }

    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Processing => "processing",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }
}

/// A placed order: an immutable snapshot of a cart at checkout time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Order ID.
    pub id: OrderId,
    /// Customer who placed the order.
    pub user_id: UserId,
    /// Cart lines captured at checkout. Prices are not stored per line;
    /// `total` carries the checkout-time sum.
    pub items: Vec<CartItem>,
    /// Current status.
    pub status: OrderStatus,
    /// When the order was placed.
    pub created_at: DateTime<Utc>,
    /// Delivery phone captured at checkout.
    pub phone: PhoneNumber,
    /// Delivery address captured at checkout.
    pub address: String,
    /// Requested delivery slot, when one was chosen.
    #[serde(default)]
    pub delivery_time: Option<String>,
    /// Total at checkout time.
    pub total: Decimal,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_openness() {
        assert!(OrderStatus::New.is_open());
        assert!(OrderStatus::Processing.is_open());
        assert!(OrderStatus::Delivered.is_open());
        assert!(OrderStatus::Cancelled.is_open());
        assert!(!OrderStatus::Completed.is_open());
    }

    #[test]
    fn test_status_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Completed).unwrap(),
            "\"completed\""
        );
        let legacy: OrderStatus = serde_json::from_str("\"delivered\"").unwrap();
        assert_eq!(legacy, OrderStatus::Delivered);
    }

    #[test]
    fn test_order_decode_without_delivery_time() {
        let json = r#"{
            "id": 1,
            "user_id": 2,
            "items": [{"product_id": 3, "quantity": "0.5"}],
            "status": "new",
            "created_at": "2026-01-15T10:30:00Z",
            "phone": "+7-912-345-67-89",
            "address": "12 Market Lane",
            "total": "90.25"
        }"#;
        let order: Order = serde_json::from_str(json).unwrap();
        assert!(order.delivery_time.is_none());
        assert_eq!(order.total, Decimal::new(9025, 2));
    }
}
