//! Entry points: `/start`, mode switching, and the two main menus.

use tracing::instrument;

use crate::engine::{Bot, Ctx};
use crate::error::Result;
use crate::format;
use crate::keyboards;
use crate::session::BotState;
use crate::transport::ChatTransport;

const GREETING: &str =
    "🥕 Welcome to the greengrocer!\nFresh vegetables and fruit, delivered to your door.";

impl<T: ChatTransport> Bot<T> {
    /// `/start`: register the user and land on the right menu.
    #[instrument(skip(self))]
    pub(crate) fn on_start(&mut self, ctx: Ctx, username: Option<String>) -> Result<()> {
        let user = self.store.user_mut(ctx.user);
        if username.is_some() {
            user.username = username;
        }
        self.persist_users();

        if self.is_admin(ctx.user) {
            self.sessions.reset(ctx.key, BotState::Start);
            self.send(
                ctx,
                &format!("{GREETING}\n\nChoose a mode:"),
                Some(&keyboards::start_menu()),
            )
        } else {
            self.show_customer_menu(Ctx { edit: None, ..ctx })
        }
    }

    /// Render the customer main menu and enter `CustomerMode`.
    pub(crate) fn show_customer_menu(&mut self, ctx: Ctx) -> Result<()> {
        self.sessions.set_state(ctx.key, BotState::CustomerMode);
        let cart_total = self.store.user(ctx.user).and_then(|user| {
            let summary = format::summarize(&self.store, &user.cart);
            (!summary.is_empty()).then_some(summary.total)
        });
        let keyboard =
            keyboards::customer_menu(self.store.categories(), cart_total, self.is_admin(ctx.user));
        let text = if self.store.categories().is_empty() {
            format!("{GREETING}\n\nThe catalogue is being stocked, come back soon!")
        } else {
            format!("{GREETING}\n\nPick a category:")
        };
        self.show(ctx, &text, Some(&keyboard))
    }

    /// Render the admin main menu and enter `AdminMode`.
    pub(crate) fn show_admin_menu(&mut self, ctx: Ctx) -> Result<()> {
        self.sessions.set_state(ctx.key, BotState::AdminMode);
        self.show(ctx, "⚙️ Administration", Some(&keyboards::admin_menu()))
    }

    /// Return to the mode-choice landing screen.
    pub(crate) fn on_back_to_start(&mut self, ctx: Ctx) -> Result<()> {
        if !self.is_admin(ctx.user) {
            // Customers have no mode choice; the storefront is their root.
            return self.show_customer_menu(ctx);
        }
        self.sessions.reset(ctx.key, BotState::Start);
        self.show(ctx, "Choose a mode:", Some(&keyboards::start_menu()))
    }
}
