//! Catalogue records: categories, products, and units of sale.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::id::{CategoryId, ProductId};

/// Unit a product is sold in.
///
/// `Kg` products accept fractional quantities; `Piece` products are
/// counted in whole units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    /// Sold by the kilogram.
    Kg,
    /// Sold per piece.
    Piece,
}

impl Unit {
    /// Short display label for the unit.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Kg => "kg",
            Self::Piece => "pc",
        }
    }

    /// Whether fractional quantities are allowed for this unit.
    #[must_use]
    pub const fn allows_fractional(self) -> bool {
        matches!(self, Self::Kg)
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Opaque handle to an image held by the chat network.
///
/// The engine never interprets the contents; it only stores the handle the
/// transport supplied and echoes it back when rendering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    /// Wrap a transport-supplied handle.
    #[must_use]
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    /// The raw handle string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Category ID.
    pub id: CategoryId,
    /// Display name.
    pub name: String,
}

/// A product in the catalogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Product ID.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Owning category.
    pub category_id: CategoryId,
    /// Price per unit.
    pub price: Decimal,
    /// Unit of sale.
    pub unit: Unit,
    /// Optional product photo.
    #[serde(default)]
    pub image: Option<ImageRef>,
    /// Whether the product is currently offered.
    #[serde(default = "default_available")]
    pub available: bool,
}

const fn default_available() -> bool {
    true
}

/// Explicit patch for updating a product.
///
/// `None` fields are left untouched; `image` uses a nested `Option` so a
/// patch can also clear the photo.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductUpdate {
    /// New display name.
    pub name: Option<String>,
    /// New price per unit.
    pub price: Option<Decimal>,
    /// `Some(None)` clears the photo, `Some(Some(_))` replaces it.
    pub image: Option<Option<ImageRef>>,
    /// New availability flag.
    pub available: Option<bool>,
}

impl ProductUpdate {
    /// Apply the patch to a product in place.
    pub fn apply(self, product: &mut Product) {
        if let Some(name) = self.name {
            product.name = name;
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(image) = self.image {
            product.image = image;
        }
        if let Some(available) = self.available {
            product.available = available;
        }
    }
}
