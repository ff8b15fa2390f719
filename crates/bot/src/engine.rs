//! The event router.
//!
//! [`Bot::handle_event`] is the single entry point: the deployment's event
//! loop feeds it one [`Event`] at a time. Dispatch is strictly ordered:
//!
//! 1. commands (`/start`);
//! 2. callback payloads are parsed once into [`CallbackData`]; malformed
//!    payloads are logged and dropped;
//! 3. admin-only payloads re-check admin identity on every press;
//! 4. `Back` goes through the state-keyed back table;
//! 5. a few payloads are valid from any state (mode switches, order
//!    links);
//! 6. everything else must match the current state, otherwise the press
//!    is a stale button and is ignored;
//! 7. text, photo, and contact messages dispatch purely on state.

use tracing::{debug, instrument, warn};

use greengrocer_core::{ChatId, ImageRef, UserId};

use crate::callback::CallbackData;
use crate::config::BotConfig;
use crate::error::Result;
use crate::session::{BotState, SessionKey, SessionStore, keys};
use crate::store::JsonStore;
use crate::transport::{ChatTransport, Event, Keyboard, MessageRef, TransportError};

/// Everything a handler needs to know about the triggering event.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Ctx {
    /// Session of the conversation.
    pub key: SessionKey,
    /// User who acted.
    pub user: UserId,
    /// Chat to render into.
    pub chat: ChatId,
    /// Message to edit in place, for button presses.
    pub edit: Option<MessageRef>,
}

impl Ctx {
    fn from_event(event: &Event) -> Self {
        let user = event.user();
        let chat = event.chat();
        let edit = match event {
            Event::Callback { message, .. } => Some(*message),
            _ => None,
        };
        Self {
            key: SessionKey::new(user, chat),
            user,
            chat,
            edit,
        }
    }
}

/// The conversation engine.
pub struct Bot<T: ChatTransport> {
    pub(crate) transport: T,
    pub(crate) store: JsonStore,
    pub(crate) sessions: SessionStore,
    pub(crate) config: BotConfig,
}

impl<T: ChatTransport> Bot<T> {
    /// Assemble the engine.
    #[must_use]
    pub fn new(transport: T, store: JsonStore, config: BotConfig) -> Self {
        Self {
            transport,
            store,
            sessions: SessionStore::new(),
            config,
        }
    }

    /// The persisted data, for inspection.
    #[must_use]
    pub const fn store(&self) -> &JsonStore {
        &self.store
    }

    /// Mutable access to the persisted data, for seeding and migrations.
    pub fn store_mut(&mut self) -> &mut JsonStore {
        &mut self.store
    }

    /// The transport, for inspection in tests.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutable access to the transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Handle one incoming event.
    ///
    /// # Errors
    ///
    /// Only infrastructure failures (persistence, delivery) surface here;
    /// user mistakes are answered in-conversation.
    #[instrument(skip(self, event), fields(user = %event.user(), chat = %event.chat()))]
    pub fn handle_event(&mut self, event: &Event) -> Result<()> {
        let ctx = Ctx::from_event(event);
        match event {
            Event::Command { name, username, .. } => {
                if name == "start" {
                    self.on_start(ctx, username.clone())
                } else {
                    debug!(command = %name, "unknown command ignored");
                    Ok(())
                }
            }
            Event::Callback { payload, .. } => self.handle_callback(ctx, payload),
            Event::Text { text, .. } => self.handle_text(ctx, text),
            Event::Photo { image, .. } => self.handle_photo(ctx, image),
            Event::Contact { phone_text, .. } => self.handle_contact(ctx, phone_text),
        }
    }

    // =========================================================================
    // Callback dispatch
    // =========================================================================

    fn handle_callback(&mut self, ctx: Ctx, payload: &str) -> Result<()> {
        let Some(data) = CallbackData::parse(payload) else {
            warn!(%payload, "malformed callback payload ignored");
            return Ok(());
        };

        if data.requires_admin() && !self.is_admin(ctx.user) {
            warn!(user = %ctx.user, action = ?data, "non-admin pressed an admin button");
            return self.deny_access(ctx);
        }

        let state = self.sessions.state(ctx.key);

        // Context-sensitive Back first.
        if data == CallbackData::Back {
            return self.on_back(ctx, state);
        }

        // Payloads valid from any state.
        match &data {
            CallbackData::ModeCustomer => return self.show_customer_menu(ctx),
            CallbackData::ModeAdmin => return self.show_admin_menu(ctx),
            CallbackData::BackToStart => return self.on_back_to_start(ctx),
            CallbackData::ViewOrder(id) => return self.on_view_order(ctx, *id),
            CallbackData::Noop => return Ok(()),
            _ => {}
        }

        self.dispatch_in_state(ctx, state, data)
    }

    #[allow(clippy::too_many_lines)] // one row per (state, payload) pair
    fn dispatch_in_state(&mut self, ctx: Ctx, state: BotState, data: CallbackData) -> Result<()> {
        use CallbackData as D;

        match (state, data) {
            // Customer browsing
            (BotState::CustomerMode, D::Category(id)) => self.on_category(ctx, id),
            (BotState::CustomerMode, D::Favorites) => self.on_favorites(ctx),
            (BotState::CustomerMode, D::Search) => self.on_search(ctx),
            (BotState::CustomerMode | BotState::CheckoutStart, D::Cart) => self.on_cart(ctx),
            (
                BotState::CategoryView | BotState::FavoritesView | BotState::SearchResults,
                D::Product(id),
            ) => self.on_product(ctx, id),
            (BotState::ProductDetail, D::AddFavorite(id)) => self.on_add_favorite(ctx, id),
            (BotState::ProductDetail, D::RemoveFavorite(id)) => self.on_remove_favorite(ctx, id),
            (BotState::ProductDetail, D::AddToCart { product, quantity }) => {
                self.on_add_to_cart(ctx, product, quantity)
            }
            (BotState::ProductDetail, D::RemoveFromCart(id)) => self.on_remove_from_cart(ctx, id),
            (BotState::ProductDetail, D::CustomQuantity(id)) => self.on_custom_quantity(ctx, id),

            // Cart and checkout
            (BotState::CartView, D::Checkout) => self.on_checkout(ctx),
            (BotState::CartView, D::ClearCart) => self.on_clear_cart(ctx),
            (BotState::CheckoutStart, D::UseSavedData) => self.on_use_saved_data(ctx),
            (BotState::CheckoutStart, D::PhoneInput) => self.on_phone_input(ctx),
            (BotState::PhoneInput, D::PhoneDigit(d)) => self.on_phone_digit(ctx, d),
            (BotState::PhoneInput, D::PhoneDelete) => self.on_phone_delete(ctx),
            (BotState::PhoneInput, D::PhoneSubmit) => self.on_phone_submit(ctx),
            (BotState::CheckoutStart, D::DeliveryTimeMenu) => self.on_delivery_time_menu(ctx),
            (BotState::DeliveryTimeSelect, D::DeliveryTime(slot)) => {
                self.on_delivery_time(ctx, &slot)
            }

            // Admin: categories
            (BotState::AdminMode, D::AddCategory) => self.on_add_category(ctx),
            (BotState::AdminMode, D::EditCategoryMenu) => self.on_edit_category_menu(ctx),
            (BotState::AdminMode, D::DeleteCategoryMenu) => self.on_delete_category_menu(ctx),
            (BotState::CategoryEditSelect, D::EditCategory(id)) => self.on_edit_category(ctx, id),
            (BotState::CategoryDeleteSelect, D::DeleteCategory(id)) => {
                self.on_delete_category(ctx, id)
            }

            // Admin: product wizard
            (BotState::AdminMode, D::AddProduct) => self.on_add_product(ctx),
            (BotState::ProductCategorySelect, D::ProductCategory(id)) => {
                self.on_product_category(ctx, id)
            }
            (BotState::ProductUnitSelect, D::UnitSelect(unit)) => self.on_unit_select(ctx, unit),
            (BotState::ProductImageInput, D::SkipImage) => self.on_skip_image(ctx),

            // Admin: product editing
            (BotState::AdminMode, D::EditProductMenu) => self.on_edit_product_menu(ctx),
            (BotState::ProductEditSelect, D::EditProductCategory(id)) => {
                self.on_edit_product_category(ctx, id)
            }
            (BotState::ProductEditSelect, D::EditProduct(id)) => self.on_edit_product(ctx, id),
            (BotState::ProductEditMenu, D::EditProductName(id)) => {
                self.on_edit_product_name(ctx, id)
            }
            (BotState::ProductEditMenu, D::EditProductPrice(id)) => {
                self.on_edit_product_price(ctx, id)
            }
            (BotState::ProductEditMenu, D::EditProductImage(id)) => {
                self.on_edit_product_image(ctx, id)
            }
            (BotState::ProductEditMenu, D::ToggleAvailable(id)) => {
                self.on_toggle_available(ctx, id)
            }

            // Admin: product deletion
            (BotState::AdminMode, D::DeleteProductMenu) => self.on_delete_product_menu(ctx),
            (BotState::ProductDeleteSelect, D::DeleteProductCategory(id)) => {
                self.on_delete_product_category(ctx, id)
            }
            (BotState::ProductDeleteSelect, D::DeleteProduct(id)) => {
                self.on_delete_product(ctx, id)
            }
            (BotState::ProductDeleteSelect, D::ConfirmDeleteProduct(id)) => {
                self.on_confirm_delete_product(ctx, id)
            }
            (BotState::ProductDeleteSelect, D::CancelDeleteProduct) => {
                self.on_cancel_delete_product(ctx)
            }

            // Admin: data, analytics, orders
            (BotState::AdminMode, D::SaveData) => self.on_save_data(ctx),
            (BotState::AdminMode, D::LoadDataMenu) => self.on_load_data_menu(ctx),
            (BotState::BackupSelect, D::LoadBackup(name)) => self.on_load_backup(ctx, &name),
            (BotState::AdminMode, D::Analytics) => self.on_analytics(ctx),
            (BotState::AdminMode, D::Orders) => self.on_orders(ctx),
            (BotState::OrdersList, D::FilterOrders(filter)) => self.on_order_filter(ctx, filter),
            (BotState::OrdersList, D::SortOrders(key)) => self.on_order_sort(ctx, key),
            (BotState::OrdersList, D::PagePrev) => self.on_page_prev(ctx),
            (BotState::OrdersList, D::PageNext) => self.on_page_next(ctx),
            (BotState::OrdersList, D::PageSize(size)) => self.on_page_size(ctx, size),
            (BotState::OrderDetail, D::CompleteOrder(id)) => self.on_complete_order(ctx, id),
            (BotState::OrderDetail, D::ReopenOrder(id)) => self.on_reopen_order(ctx, id),
            (BotState::OrderDetail, D::BackToOrders) => self.on_orders(ctx),

            (state, data) => {
                // Stale button from an earlier screen; nothing to do.
                debug!(?state, ?data, "payload not valid in current state");
                Ok(())
            }
        }
    }

    // =========================================================================
    // Text / photo / contact dispatch
    // =========================================================================

    fn handle_text(&mut self, ctx: Ctx, text: &str) -> Result<()> {
        match self.sessions.state(ctx.key) {
            BotState::SearchInput => self.on_search_text(ctx, text),
            BotState::CustomQuantityInput => self.on_custom_quantity_text(ctx, text),
            BotState::PhoneInput => self.on_phone_text(ctx, text),
            BotState::AddressInput => self.on_address_text(ctx, text),
            BotState::CategoryNameInput => self.on_category_name_text(ctx, text),
            BotState::CategoryEditNameInput => self.on_category_edit_name_text(ctx, text),
            BotState::ProductNameInput => self.on_product_name_text(ctx, text),
            BotState::ProductPriceInput => self.on_product_price_text(ctx, text),
            BotState::ProductEditNameInput => self.on_edit_name_text(ctx, text),
            BotState::ProductEditPriceInput => self.on_edit_price_text(ctx, text),
            state => {
                debug!(?state, "text ignored in non-input state");
                Ok(())
            }
        }
    }

    fn handle_photo(&mut self, ctx: Ctx, image: &ImageRef) -> Result<()> {
        match self.sessions.state(ctx.key) {
            BotState::ProductImageInput => self.on_product_image(ctx, image.clone()),
            BotState::ProductEditImageInput => self.on_edit_image_photo(ctx, image.clone()),
            state => {
                debug!(?state, "photo ignored in non-input state");
                Ok(())
            }
        }
    }

    fn handle_contact(&mut self, ctx: Ctx, phone_text: &str) -> Result<()> {
        match self.sessions.state(ctx.key) {
            // A shared contact card is just another way to enter the phone.
            BotState::PhoneInput => self.on_phone_text(ctx, phone_text),
            state => {
                debug!(?state, "contact ignored in non-input state");
                Ok(())
            }
        }
    }

    // =========================================================================
    // Back table
    // =========================================================================

    fn on_back(&mut self, ctx: Ctx, state: BotState) -> Result<()> {
        match state {
            // Admin screens one step below the menu
            BotState::CategoryNameInput
            | BotState::CategoryEditSelect
            | BotState::CategoryEditNameInput
            | BotState::CategoryDeleteSelect
            | BotState::ProductCategorySelect
            | BotState::ProductEditSelect
            | BotState::ProductEditMenu
            | BotState::ProductDeleteSelect
            | BotState::BackupSelect
            | BotState::AnalyticsView
            | BotState::OrdersList
            | BotState::AdminMode => self.show_admin_menu(ctx),

            // Product wizard walks backwards step by step
            BotState::ProductNameInput => self.on_add_product(ctx),
            BotState::ProductPriceInput => self.back_to_product_name(ctx),
            BotState::ProductUnitSelect => self.back_to_product_price(ctx),
            BotState::ProductImageInput => self.back_to_unit_select(ctx),

            // Product edit inputs return to the edit menu
            BotState::ProductEditNameInput
            | BotState::ProductEditPriceInput
            | BotState::ProductEditImageInput => self.back_to_edit_menu(ctx),

            // Customer screens
            BotState::CategoryView
            | BotState::FavoritesView
            | BotState::SearchInput
            | BotState::SearchResults
            | BotState::CartView
            | BotState::CustomerMode => self.show_customer_menu(ctx),
            BotState::ProductDetail => self.back_to_category(ctx),
            BotState::CustomQuantityInput => self.back_to_product_detail(ctx),

            // Checkout walks backwards
            BotState::CheckoutStart => self.on_cart(ctx),
            BotState::PhoneInput | BotState::DeliveryTimeSelect => self.on_checkout(ctx),
            BotState::AddressInput => self.on_phone_input(ctx),

            BotState::OrderDetail => self.back_from_order_detail(ctx),
            BotState::Start => self.on_back_to_start(ctx),
        }
    }

    // =========================================================================
    // Shared plumbing
    // =========================================================================

    /// Whether the user may use admin actions.
    pub(crate) fn is_admin(&self, user: UserId) -> bool {
        self.config.is_configured_admin(user)
            || self.store.user(user).is_some_and(|u| u.is_admin)
    }

    /// Force a non-admin back into the customer flow with a notice.
    pub(crate) fn deny_access(&mut self, ctx: Ctx) -> Result<()> {
        self.sessions.reset(ctx.key, BotState::CustomerMode);
        self.send(ctx, "You don't have access to that.", None)?;
        self.show_customer_menu(Ctx { edit: None, ..ctx })
    }

    /// Render a screen: edit in place for button presses, send otherwise.
    ///
    /// An edit that changes nothing is fine (the user pressed a button
    /// that re-renders the same screen); an edit whose message vanished
    /// falls back to a fresh send.
    pub(crate) fn show(&mut self, ctx: Ctx, text: &str, keyboard: Option<&Keyboard>) -> Result<()> {
        let Some(message) = ctx.edit else {
            return self.send(ctx, text, keyboard);
        };
        match self.transport.edit(ctx.chat, message, text, keyboard) {
            Err(TransportError::ContentUnchanged) => {
                debug!("edit skipped, content unchanged");
                Ok(())
            }
            Err(TransportError::MessageNotFound) => {
                warn!("edited message vanished, sending fresh");
                self.send(ctx, text, keyboard)
            }
            other => other.map_err(Into::into),
        }
    }

    /// Send a fresh message regardless of how the event arrived.
    pub(crate) fn send(&mut self, ctx: Ctx, text: &str, keyboard: Option<&Keyboard>) -> Result<()> {
        self.transport.send(ctx.chat, text, keyboard)?;
        Ok(())
    }

    /// Persist the users file, logging instead of failing the screen.
    pub(crate) fn persist_users(&mut self) {
        if let Err(error) = self.store.save_users() {
            tracing::error!(%error, "failed to persist users");
        }
    }

    /// Stash which state an order detail should return to.
    pub(crate) fn remember_order_return(&mut self, ctx: Ctx, from_admin_list: bool) {
        self.sessions
            .put(ctx.key, keys::ORDER_RETURN_STATE, &from_admin_list);
    }
}
