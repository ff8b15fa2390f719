//! Per-conversation session state.
//!
//! Every `(user, chat)` pair owns a [`Session`]: the current conversation
//! state plus an untyped scratch map for multi-step flows (draft product
//! fields, the phone digit buffer, the orders list view, and so on).
//! Sessions live in memory only; a restart drops them all back to
//! [`BotState::Start`].

use std::collections::HashMap;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use greengrocer_core::{ChatId, UserId};

/// Conversation states.
///
/// Input states (`*Input`) accept text (or photo/contact) messages; the
/// rest react to inline buttons only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BotState {
    /// Admin landing screen with mode choice.
    #[default]
    Start,
    /// Customer main menu.
    CustomerMode,
    /// Admin main menu.
    AdminMode,

    // Admin: category management
    /// Waiting for a new category name.
    CategoryNameInput,
    /// Choosing a category to rename.
    CategoryEditSelect,
    /// Waiting for the replacement category name.
    CategoryEditNameInput,
    /// Choosing a category to delete.
    CategoryDeleteSelect,

    // Admin: product creation wizard
    /// Choosing the category for a new product.
    ProductCategorySelect,
    /// Waiting for the new product's name.
    ProductNameInput,
    /// Waiting for the new product's price.
    ProductPriceInput,
    /// Choosing the new product's unit of sale.
    ProductUnitSelect,
    /// Waiting for a photo (or skip) for the new product.
    ProductImageInput,

    // Admin: product editing
    /// Choosing a category whose products to edit.
    ProductEditSelect,
    /// Product edit action menu.
    ProductEditMenu,
    /// Waiting for the replacement product name.
    ProductEditNameInput,
    /// Waiting for the replacement product price.
    ProductEditPriceInput,
    /// Waiting for the replacement product photo.
    ProductEditImageInput,
    /// Choosing a product to delete (and confirming).
    ProductDeleteSelect,

    // Admin: data and analytics
    /// Choosing a backup to restore.
    BackupSelect,
    /// Viewing the analytics report.
    AnalyticsView,

    // Customer: browsing
    /// Viewing one category's products.
    CategoryView,
    /// Viewing one product's detail screen.
    ProductDetail,
    /// Viewing the favorites list.
    FavoritesView,
    /// Waiting for a search query.
    SearchInput,
    /// Viewing search results.
    SearchResults,
    /// Waiting for a custom weight quantity.
    CustomQuantityInput,

    // Customer: cart and checkout
    /// Viewing the cart.
    CartView,
    /// Checkout entry screen.
    CheckoutStart,
    /// Entering the delivery phone.
    PhoneInput,
    /// Entering the delivery address.
    AddressInput,
    /// Choosing a delivery slot.
    DeliveryTimeSelect,

    // Orders
    /// Admin orders list.
    OrdersList,
    /// Single order detail.
    OrderDetail,
}

/// Key identifying one conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionKey {
    /// The user.
    pub user: UserId,
    /// The chat the conversation happens in.
    pub chat: ChatId,
}

impl SessionKey {
    /// Create a session key.
    #[must_use]
    pub const fn new(user: UserId, chat: ChatId) -> Self {
        Self { user, chat }
    }
}

/// Scratch-data keys used by the flows.
pub mod keys {
    /// Draft category id while renaming (`CategoryEditNameInput`).
    pub const EDIT_CATEGORY_ID: &str = "edit_category_id";

    /// Draft product fields for the creation wizard.
    pub const DRAFT_PRODUCT_CATEGORY: &str = "draft_product_category";
    /// New product name staged by the wizard.
    pub const DRAFT_PRODUCT_NAME: &str = "draft_product_name";
    /// New product price staged by the wizard.
    pub const DRAFT_PRODUCT_PRICE: &str = "draft_product_price";
    /// New product unit staged by the wizard.
    pub const DRAFT_PRODUCT_UNIT: &str = "draft_product_unit";

    /// Product being edited (`ProductEdit*Input`, `ProductEditMenu`).
    pub const EDIT_PRODUCT_ID: &str = "edit_product_id";
    /// Product pending delete confirmation.
    pub const DELETE_PRODUCT_ID: &str = "delete_product_id";

    /// Category the customer is browsing, for Back reconstruction.
    pub const CURRENT_CATEGORY_ID: &str = "current_category_id";
    /// Product whose detail screen is open.
    pub const CURRENT_PRODUCT_ID: &str = "current_product_id";
    /// Product awaiting a custom quantity.
    pub const QUANTITY_PRODUCT_ID: &str = "quantity_product_id";
    /// Last search query, for re-rendering results.
    pub const SEARCH_QUERY: &str = "search_query";

    /// Digit buffer for the virtual phone pad.
    pub const PHONE_DIGITS: &str = "phone_digits";
    /// Delivery slot chosen during checkout, if any.
    pub const DELIVERY_TIME: &str = "delivery_time";
    /// Normalized phone captured before the address step.
    pub const CHECKOUT_PHONE: &str = "checkout_phone";

    /// Per-session orders list view (filter/sort/pagination).
    pub const ORDERS_VIEW: &str = "orders_view";
    /// Where an open order detail should return to.
    pub const ORDER_RETURN_STATE: &str = "order_return_state";
}

/// One conversation's state.
#[derive(Debug, Clone, Default)]
pub struct Session {
    /// Current conversation state.
    pub state: BotState,
    /// Untyped scratch data for multi-step flows.
    pub data: HashMap<String, Value>,
}

/// In-memory store of all sessions.
///
/// Single-writer: the event loop is the only caller, so no interior
/// locking is needed.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<SessionKey, Session>,
}

impl SessionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state for a conversation, defaulting to [`BotState::Start`].
    #[must_use]
    pub fn state(&self, key: SessionKey) -> BotState {
        self.sessions
            .get(&key)
            .map(|s| s.state)
            .unwrap_or_default()
    }

    /// Move a conversation to a new state.
    pub fn set_state(&mut self, key: SessionKey, state: BotState) {
        self.sessions.entry(key).or_default().state = state;
    }

    /// Store a serializable value under a scratch key.
    pub fn put<T: Serialize>(&mut self, key: SessionKey, name: &str, value: &T) {
        if let Ok(value) = serde_json::to_value(value) {
            self.sessions
                .entry(key)
                .or_default()
                .data
                .insert(name.to_owned(), value);
        }
    }

    /// Read a scratch value, leaving it in place.
    #[must_use]
    pub fn get<T: DeserializeOwned>(&self, key: SessionKey, name: &str) -> Option<T> {
        self.sessions
            .get(&key)
            .and_then(|s| s.data.get(name))
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Remove and return a scratch value.
    pub fn take<T: DeserializeOwned>(&mut self, key: SessionKey, name: &str) -> Option<T> {
        self.sessions
            .get_mut(&key)
            .and_then(|s| s.data.remove(name))
            .and_then(|v| serde_json::from_value(v).ok())
    }

    /// Remove a scratch value without reading it.
    pub fn remove(&mut self, key: SessionKey, name: &str) {
        if let Some(session) = self.sessions.get_mut(&key) {
            session.data.remove(name);
        }
    }

    /// Drop all scratch data for a conversation, keeping its state.
    pub fn clear_data(&mut self, key: SessionKey) {
        if let Some(session) = self.sessions.get_mut(&key) {
            session.data.clear();
        }
    }

    /// Reset a conversation to a state with no scratch data.
    pub fn reset(&mut self, key: SessionKey, state: BotState) {
        let session = self.sessions.entry(key).or_default();
        session.state = state;
        session.data.clear();
    }
}
