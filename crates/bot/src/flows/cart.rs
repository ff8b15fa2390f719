//! Cart screen and the checkout pipeline.
//!
//! Checkout collects a phone (virtual pad, typed text, or a shared
//! contact card, all normalized the same way), then an address, then
//! creates the order and fires a best-effort admin notification.

use tracing::{error, instrument, warn};

use greengrocer_core::{OrderId, PhoneNumber};

use crate::callback::CallbackData;
use crate::engine::{Bot, Ctx};
use crate::error::Result;
use crate::format;
use crate::keyboards;
use crate::session::{BotState, keys};
use crate::store::StoreError;
use crate::transport::{ChatTransport, Keyboard};

impl<T: ChatTransport> Bot<T> {
    /// Show the cart.
    #[instrument(skip(self))]
    pub(crate) fn on_cart(&mut self, ctx: Ctx) -> Result<()> {
        self.sessions.set_state(ctx.key, BotState::CartView);
        let summary = self
            .store
            .user(ctx.user)
            .map(|user| format::summarize(&self.store, &user.cart));
        match summary {
            Some(summary) if !summary.is_empty() => {
                let text = format!("🛒 Your cart:\n\n{}", summary.to_text());
                self.show(ctx, &text, Some(&keyboards::cart_view()))
            }
            _ => self.show(
                ctx,
                "🛒 Your cart is empty. Pick something tasty first!",
                Some(&keyboards::back_only()),
            ),
        }
    }

    /// Empty the cart and re-render it.
    pub(crate) fn on_clear_cart(&mut self, ctx: Ctx) -> Result<()> {
        self.store.user_mut(ctx.user).clear_cart();
        self.persist_users();
        self.on_cart(ctx)
    }

    /// Begin checkout.
    #[instrument(skip(self))]
    pub(crate) fn on_checkout(&mut self, ctx: Ctx) -> Result<()> {
        let empty = self
            .store
            .user(ctx.user)
            .is_none_or(greengrocer_core::User::cart_is_empty);
        if empty {
            self.send(ctx, "Your cart is empty, nothing to check out yet.", None)?;
            return self.on_cart(ctx);
        }
        let has_saved = self
            .store
            .user(ctx.user)
            .is_some_and(|u| u.phone.is_some() && u.address.is_some());

        self.sessions.set_state(ctx.key, BotState::CheckoutStart);
        let mut text = if has_saved {
            "📦 Checkout\n\nUse your saved contact details, or enter new ones."
        } else {
            "📦 Checkout\n\nFirst we need a phone number for the courier."
        }
        .to_owned();
        if let Some(slot) = self.sessions.get::<String>(ctx.key, keys::DELIVERY_TIME) {
            text.push_str(&format!("\n\nDelivery: {slot}"));
        }
        self.show(ctx, &text, Some(&keyboards::checkout_start(has_saved)))
    }

    /// One-tap checkout with the saved phone and address.
    pub(crate) fn on_use_saved_data(&mut self, ctx: Ctx) -> Result<()> {
        let saved = self
            .store
            .user(ctx.user)
            .and_then(|u| Some((u.phone.clone()?, u.address.clone()?)));
        match saved {
            Some((phone, address)) => self.place_order(ctx, phone, address),
            // The profile changed under the button; fall back to manual entry.
            None => self.on_phone_input(ctx),
        }
    }

    // =========================================================================
    // Phone entry
    // =========================================================================

    /// Open the phone pad.
    pub(crate) fn on_phone_input(&mut self, ctx: Ctx) -> Result<()> {
        self.sessions.set_state(ctx.key, BotState::PhoneInput);
        self.sessions
            .put(ctx.key, keys::PHONE_DIGITS, &String::new());
        self.render_phone_pad(ctx)
    }

    fn render_phone_pad(&mut self, ctx: Ctx) -> Result<()> {
        let digits: String = self
            .sessions
            .get(ctx.key, keys::PHONE_DIGITS)
            .unwrap_or_default();
        let text = format!(
            "📱 Enter your phone number:\n\n+7 {}\n\nUse the pad below, type it, or share your contact card.",
            format::phone_mask(&digits)
        );
        self.show(ctx, &text, Some(&keyboards::phone_pad()))
    }

    /// Pad digit pressed.
    pub(crate) fn on_phone_digit(&mut self, ctx: Ctx, digit: u8) -> Result<()> {
        let mut digits: String = self
            .sessions
            .get(ctx.key, keys::PHONE_DIGITS)
            .unwrap_or_default();
        if digits.len() < PhoneNumber::NATIONAL_DIGITS {
            digits.push((b'0' + digit) as char);
            self.sessions.put(ctx.key, keys::PHONE_DIGITS, &digits);
        }
        // A full buffer leaves the screen as-is; the unchanged-content
        // edit is swallowed downstream.
        self.render_phone_pad(ctx)
    }

    /// Pad delete pressed.
    pub(crate) fn on_phone_delete(&mut self, ctx: Ctx) -> Result<()> {
        let mut digits: String = self
            .sessions
            .get(ctx.key, keys::PHONE_DIGITS)
            .unwrap_or_default();
        digits.pop();
        self.sessions.put(ctx.key, keys::PHONE_DIGITS, &digits);
        self.render_phone_pad(ctx)
    }

    /// Pad submit pressed.
    #[instrument(skip(self))]
    pub(crate) fn on_phone_submit(&mut self, ctx: Ctx) -> Result<()> {
        let digits: String = self
            .sessions
            .get(ctx.key, keys::PHONE_DIGITS)
            .unwrap_or_default();
        match PhoneNumber::parse(&digits) {
            Ok(phone) => self.prompt_address(ctx, &phone),
            Err(_) => self.send(
                ctx,
                &format!(
                    "The number isn't complete yet: {} of {} digits.",
                    digits.len(),
                    PhoneNumber::NATIONAL_DIGITS
                ),
                None,
            ),
        }
    }

    /// Phone typed as text (or arriving from a contact card).
    #[instrument(skip(self, text))]
    pub(crate) fn on_phone_text(&mut self, ctx: Ctx, text: &str) -> Result<()> {
        if let Ok(phone) = PhoneNumber::parse(text) {
            return self.prompt_address(ctx, &phone);
        }
        let digits = PhoneNumber::national_digits(text);
        if digits.len() > PhoneNumber::NATIONAL_DIGITS {
            return self.send(
                ctx,
                "That's too many digits. A number looks like +7 912 345-67-89.",
                None,
            );
        }
        // Partial input: load it into the pad and keep going from there.
        self.sessions.put(ctx.key, keys::PHONE_DIGITS, &digits);
        self.render_phone_pad(Ctx { edit: None, ..ctx })
    }

    // =========================================================================
    // Address and order creation
    // =========================================================================

    fn prompt_address(&mut self, ctx: Ctx, phone: &PhoneNumber) -> Result<()> {
        self.sessions.put(ctx.key, keys::CHECKOUT_PHONE, phone);
        self.sessions.remove(ctx.key, keys::PHONE_DIGITS);
        self.sessions.set_state(ctx.key, BotState::AddressInput);
        self.show(
            ctx,
            &format!("Got it: {phone}\n\n🏠 Now type the delivery address."),
            Some(&keyboards::back_only()),
        )
    }

    /// Address typed; everything is ready to place the order.
    #[instrument(skip(self, text))]
    pub(crate) fn on_address_text(&mut self, ctx: Ctx, text: &str) -> Result<()> {
        let address = text.trim();
        if address.is_empty() {
            return self.send(
                ctx,
                "The address can't be empty. Where should we deliver?",
                Some(&keyboards::back_only()),
            );
        }
        let Some(phone) = self
            .sessions
            .take::<PhoneNumber>(ctx.key, keys::CHECKOUT_PHONE)
        else {
            // Scratch data lost mid-flow; restart checkout from the top.
            warn!("checkout phone missing at address step");
            self.send(ctx, "Something went wrong, let's try again.", None)?;
            return self.on_checkout(Ctx { edit: None, ..ctx });
        };
        self.place_order(ctx, phone, address.to_owned())
    }

    fn place_order(&mut self, ctx: Ctx, phone: PhoneNumber, address: String) -> Result<()> {
        let delivery_time: Option<String> = self.sessions.take(ctx.key, keys::DELIVERY_TIME);

        // Contact details are remembered for one-tap checkout next time.
        {
            let user = self.store.user_mut(ctx.user);
            user.phone = Some(phone.clone());
            user.address = Some(address.clone());
        }

        let order_id =
            match self
                .store
                .create_order(ctx.user, phone, address, delivery_time)
            {
                Ok(id) => id,
                Err(StoreError::EmptyCart) => {
                    self.send(ctx, "Your cart is empty, nothing to check out yet.", None)?;
                    return self.show_customer_menu(Ctx { edit: None, ..ctx });
                }
                Err(other) => return Err(other.into()),
            };

        self.sessions.reset(ctx.key, BotState::CustomerMode);
        self.confirm_order(ctx, order_id)?;
        self.notify_admin(order_id);
        self.show_customer_menu(Ctx { edit: None, ..ctx })
    }

    fn confirm_order(&mut self, ctx: Ctx, order_id: OrderId) -> Result<()> {
        let Some(order) = self.store.order(order_id) else {
            return Ok(());
        };
        let summary = format::summarize(&self.store, &order.items);
        let text = format!(
            "✅ Order #{order_id} placed!\n\n{}\n\nWe'll be in touch shortly.",
            summary.to_text()
        );
        let keyboard = Keyboard::new().row(vec![crate::transport::Button::new(
            "📦 My order",
            CallbackData::ViewOrder(order_id).encode(),
        )]);
        self.send(ctx, &text, Some(&keyboard))
    }

    /// Tell the admin chat about a fresh order. Failures never unwind the
    /// order; they are logged and forgotten.
    fn notify_admin(&mut self, order_id: OrderId) {
        let Some(order) = self.store.order(order_id) else {
            return;
        };
        let summary = format::summarize(&self.store, &order.items);
        let text = format!(
            "🔔 New order!\n\n{}\n\n{}",
            format::order_header(order.id, order.created_at, &order.phone, &order.address),
            summary.to_text()
        );
        let keyboard = Keyboard::new().row(vec![crate::transport::Button::new(
            "Open order",
            CallbackData::ViewOrder(order_id).encode(),
        )]);
        let chat = self.config.admin_chat_id;
        if let Err(err) = self.transport.send(chat, &text, Some(&keyboard)) {
            error!(order = %order_id, %err, "admin notification failed");
        }
    }

    /// Offer the delivery slots.
    pub(crate) fn on_delivery_time_menu(&mut self, ctx: Ctx) -> Result<()> {
        self.sessions
            .set_state(ctx.key, BotState::DeliveryTimeSelect);
        self.show(
            ctx,
            "🕐 When should the courier come?",
            Some(&keyboards::delivery_time_slots()),
        )
    }

    /// Delivery slot chosen; remembered for the order being assembled.
    pub(crate) fn on_delivery_time(&mut self, ctx: Ctx, slot: &str) -> Result<()> {
        self.sessions
            .put(ctx.key, keys::DELIVERY_TIME, &slot.to_owned());
        self.on_checkout(ctx)
    }
}
