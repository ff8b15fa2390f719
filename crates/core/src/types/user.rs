//! Users, carts, and favorites.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::id::{ProductId, UserId};
use crate::types::phone::PhoneNumber;

/// One line in a shopping cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    /// Product being purchased.
    pub product_id: ProductId,
    /// Quantity in the product's unit of sale.
    pub quantity: Decimal,
}

/// A bot user with their saved contact data, favorites, and cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Chat-network user ID.
    pub id: UserId,
    /// Chat-network username, when the network exposes one.
    #[serde(default)]
    pub username: Option<String>,
    /// Saved delivery phone, set on first completed checkout.
    #[serde(default)]
    pub phone: Option<PhoneNumber>,
    /// Saved delivery address, set on first completed checkout.
    #[serde(default)]
    pub address: Option<String>,
    /// Favorite products, in insertion order.
    #[serde(default)]
    pub favorites: Vec<ProductId>,
    /// Current cart contents.
    #[serde(default)]
    pub cart: Vec<CartItem>,
    /// Persisted admin flag (in addition to the configured admin ID).
    #[serde(default)]
    pub is_admin: bool,
}

impl User {
    /// Create a fresh user record with empty cart and favorites.
    #[must_use]
    pub const fn new(id: UserId) -> Self {
        Self {
            id,
            username: None,
            phone: None,
            address: None,
            favorites: Vec::new(),
            cart: Vec::new(),
            is_admin: false,
        }
    }

    /// Add a quantity of a product to the cart.
    ///
    /// Adding a product already in the cart increases the existing line's
    /// quantity rather than creating a duplicate line.
    pub fn add_to_cart(&mut self, product_id: ProductId, quantity: Decimal) {
        if let Some(line) = self.cart.iter_mut().find(|l| l.product_id == product_id) {
            line.quantity += quantity;
        } else {
            self.cart.push(CartItem {
                product_id,
                quantity,
            });
        }
    }

    /// Remove the cart line for a product, if present.
    pub fn remove_cart_line(&mut self, product_id: ProductId) {
        self.cart.retain(|l| l.product_id != product_id);
    }

    /// Empty the cart.
    pub fn clear_cart(&mut self) {
        self.cart.clear();
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn cart_is_empty(&self) -> bool {
        self.cart.is_empty()
    }

    /// Whether a product is in the favorites list.
    #[must_use]
    pub fn is_favorite(&self, product_id: ProductId) -> bool {
        self.favorites.contains(&product_id)
    }

    /// Add a product to favorites. Duplicates are ignored.
    pub fn add_favorite(&mut self, product_id: ProductId) {
        if !self.is_favorite(product_id) {
            self.favorites.push(product_id);
        }
    }

    /// Remove a product from favorites, if present.
    pub fn remove_favorite(&mut self, product_id: ProductId) {
        self.favorites.retain(|&id| id != product_id);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dec(mantissa: i64, scale: u32) -> Decimal {
        Decimal::new(mantissa, scale)
    }

    #[test]
    fn test_add_to_cart_merges_lines() {
        let mut user = User::new(UserId::new(1));
        let product = ProductId::new(10);
        user.add_to_cart(product, dec(5, 1)); // 0.5
        user.add_to_cart(product, dec(25, 2)); // 0.25
        assert_eq!(user.cart.len(), 1);
        assert_eq!(user.cart.first().unwrap().quantity, dec(75, 2));
    }

    #[test]
    fn test_add_to_cart_distinct_products() {
        let mut user = User::new(UserId::new(1));
        user.add_to_cart(ProductId::new(1), dec(1, 0));
        user.add_to_cart(ProductId::new(2), dec(2, 0));
        assert_eq!(user.cart.len(), 2);
    }

    #[test]
    fn test_remove_cart_line() {
        let mut user = User::new(UserId::new(1));
        user.add_to_cart(ProductId::new(1), dec(1, 0));
        user.add_to_cart(ProductId::new(2), dec(1, 0));
        user.remove_cart_line(ProductId::new(1));
        assert_eq!(user.cart.len(), 1);
        assert_eq!(user.cart.first().unwrap().product_id, ProductId::new(2));
    }

    #[test]
    fn test_favorites_toggle_semantics() {
        let mut user = User::new(UserId::new(1));
        let product = ProductId::new(3);
        user.add_favorite(product);
        user.add_favorite(product);
        assert_eq!(user.favorites.len(), 1);
        user.remove_favorite(product);
        assert!(!user.is_favorite(product));
    }

    #[test]
    fn test_decode_minimal_record() {
        let json = r#"{"id":99}"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.id, UserId::new(99));
        assert!(user.cart_is_empty());
        assert!(!user.is_admin);
    }
}
