//! Customer browsing: categories, product details, favorites, search,
//! and cart additions.

use rust_decimal::Decimal;
use tracing::instrument;

use greengrocer_core::{CategoryId, ProductId};

use crate::callback::CallbackData;
use crate::engine::{Bot, Ctx};
use crate::error::Result;
use crate::format;
use crate::keyboards;
use crate::session::{BotState, keys};
use crate::transport::ChatTransport;

impl<T: ChatTransport> Bot<T> {
    /// Open one category's product list.
    #[instrument(skip(self))]
    pub(crate) fn on_category(&mut self, ctx: Ctx, id: CategoryId) -> Result<()> {
        let Some(category) = self.store.category(id) else {
            self.send(ctx, "That category is gone.", None)?;
            return self.show_customer_menu(ctx);
        };
        let name = category.name.clone();
        let products: Vec<_> = self
            .store
            .products_in(id)
            .into_iter()
            .filter(|p| p.available)
            .collect();
        let text = if products.is_empty() {
            format!("{name}\n\nNothing in stock here right now.")
        } else {
            format!("{name}\n\nPick a product:")
        };
        let keyboard = keyboards::product_picker(&products, CallbackData::Product);

        self.sessions.set_state(ctx.key, BotState::CategoryView);
        self.sessions.put(ctx.key, keys::CURRENT_CATEGORY_ID, &id);
        self.show(ctx, &text, Some(&keyboard))
    }

    /// Open a product's detail screen.
    #[instrument(skip(self))]
    pub(crate) fn on_product(&mut self, ctx: Ctx, id: ProductId) -> Result<()> {
        if self.store.product(id).is_none() {
            self.send(ctx, "That product is no longer available.", None)?;
            return self.show_customer_menu(ctx);
        }
        self.sessions.set_state(ctx.key, BotState::ProductDetail);
        self.sessions.put(ctx.key, keys::CURRENT_PRODUCT_ID, &id);
        self.render_product_detail(ctx, id)
    }

    /// Render (or re-render) the detail screen for a product.
    ///
    /// Products with a photo always go out as a fresh photo message; a
    /// text message cannot be edited into one.
    pub(crate) fn render_product_detail(&mut self, ctx: Ctx, id: ProductId) -> Result<()> {
        let Some(product) = self.store.product(id) else {
            self.send(ctx, "That product is no longer available.", None)?;
            return self.show_customer_menu(ctx);
        };
        let text = format!(
            "{}\n\nPrice: {} per {}",
            product.name,
            format::money(product.price),
            product.unit.label()
        );
        let (is_favorite, in_cart) = self.store.user(ctx.user).map_or((false, false), |user| {
            (
                user.is_favorite(id),
                user.cart.iter().any(|l| l.product_id == id),
            )
        });
        let keyboard = keyboards::product_detail(product, is_favorite, in_cart);

        if let Some(image) = product.image.clone() {
            self.transport
                .send_photo(ctx.chat, &image, &text, Some(&keyboard))?;
            Ok(())
        } else {
            self.show(ctx, &text, Some(&keyboard))
        }
    }

    /// Add a product to favorites and refresh the screen.
    pub(crate) fn on_add_favorite(&mut self, ctx: Ctx, id: ProductId) -> Result<()> {
        self.store.user_mut(ctx.user).add_favorite(id);
        self.persist_users();
        self.render_product_detail(ctx, id)
    }

    /// Remove a product from favorites and refresh the screen.
    pub(crate) fn on_remove_favorite(&mut self, ctx: Ctx, id: ProductId) -> Result<()> {
        self.store.user_mut(ctx.user).remove_favorite(id);
        self.persist_users();
        self.render_product_detail(ctx, id)
    }

    /// Show the favorites list.
    #[instrument(skip(self))]
    pub(crate) fn on_favorites(&mut self, ctx: Ctx) -> Result<()> {
        let favorites = self
            .store
            .user(ctx.user)
            .map(|u| u.favorites.clone())
            .unwrap_or_default();
        // Favorites can outlive their products; show what still exists.
        let mut products: Vec<_> = favorites
            .iter()
            .filter_map(|&id| self.store.product(id))
            .collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));

        self.sessions.set_state(ctx.key, BotState::FavoritesView);
        if products.is_empty() {
            return self.show(
                ctx,
                "⭐ No favorites yet. Open any product and tap Favorite.",
                Some(&keyboards::back_only()),
            );
        }
        let keyboard = keyboards::product_picker(&products, CallbackData::Product);
        self.show(ctx, "⭐ Your favorites:", Some(&keyboard))
    }

    /// Prompt for a search query.
    pub(crate) fn on_search(&mut self, ctx: Ctx) -> Result<()> {
        self.sessions.set_state(ctx.key, BotState::SearchInput);
        self.show(
            ctx,
            "🔍 What are you looking for? Type a product name.",
            Some(&keyboards::back_only()),
        )
    }

    /// Run a search from typed text.
    #[instrument(skip(self, query))]
    pub(crate) fn on_search_text(&mut self, ctx: Ctx, query: &str) -> Result<()> {
        let query = query.trim();
        if query.is_empty() {
            return self.send(
                ctx,
                "Please type something to search for.",
                Some(&keyboards::back_only()),
            );
        }
        self.sessions
            .put(ctx.key, keys::SEARCH_QUERY, &query.to_owned());
        self.sessions.set_state(ctx.key, BotState::SearchResults);

        let hits = self.store.search_products(query);
        if hits.is_empty() {
            return self.send(
                ctx,
                &format!("Nothing found for \"{query}\". Try another word?"),
                Some(&keyboards::back_only()),
            );
        }
        let keyboard = keyboards::product_picker(&hits, CallbackData::Product);
        self.send(ctx, &format!("Results for \"{query}\":"), Some(&keyboard))
    }

    /// Add a quantity to the cart and refresh the detail screen.
    #[instrument(skip(self))]
    pub(crate) fn on_add_to_cart(
        &mut self,
        ctx: Ctx,
        id: ProductId,
        quantity: Decimal,
    ) -> Result<()> {
        let Some(product) = self.store.product(id) else {
            self.send(ctx, "That product is no longer available.", None)?;
            return self.show_customer_menu(ctx);
        };
        if quantity <= Decimal::ZERO {
            return self.render_product_detail(ctx, id);
        }
        let name = product.name.clone();
        let unit = product.unit;
        self.store.user_mut(ctx.user).add_to_cart(id, quantity);
        self.persist_users();
        self.send(
            ctx,
            &format!("Added {} of {name} to the cart.", format::quantity(quantity, unit)),
            None,
        )?;
        self.render_product_detail(Ctx { edit: None, ..ctx }, id)
    }

    /// Drop the product's cart line and refresh the detail screen.
    pub(crate) fn on_remove_from_cart(&mut self, ctx: Ctx, id: ProductId) -> Result<()> {
        self.store.user_mut(ctx.user).remove_cart_line(id);
        self.persist_users();
        self.render_product_detail(ctx, id)
    }

    /// Ask for a custom weight.
    pub(crate) fn on_custom_quantity(&mut self, ctx: Ctx, id: ProductId) -> Result<()> {
        let Some(product) = self.store.product(id) else {
            self.send(ctx, "That product is no longer available.", None)?;
            return self.show_customer_menu(ctx);
        };
        if !product.unit.allows_fractional() {
            // Stale button; piece products have a fixed quantity.
            return self.render_product_detail(ctx, id);
        }
        self.sessions.put(ctx.key, keys::QUANTITY_PRODUCT_ID, &id);
        self.sessions
            .set_state(ctx.key, BotState::CustomQuantityInput);
        self.show(
            ctx,
            "⚖️ How much would you like, in kilograms? For example: 0.3 or 1,5",
            Some(&keyboards::back_only()),
        )
    }

    /// Parse a typed weight and add it to the cart.
    #[instrument(skip(self, text))]
    pub(crate) fn on_custom_quantity_text(&mut self, ctx: Ctx, text: &str) -> Result<()> {
        let Some(id) = self
            .sessions
            .get::<ProductId>(ctx.key, keys::QUANTITY_PRODUCT_ID)
        else {
            // Scratch data lost mid-flow; start the screen over.
            self.send(ctx, "Let's start over, something went wrong.", None)?;
            return self.show_customer_menu(ctx);
        };
        let Some(quantity) = format::parse_decimal_input(text) else {
            return self.send(
                ctx,
                "That doesn't look like a weight. Try a positive number like 0.5",
                Some(&keyboards::back_only()),
            );
        };
        self.sessions.remove(ctx.key, keys::QUANTITY_PRODUCT_ID);
        self.sessions.set_state(ctx.key, BotState::ProductDetail);
        self.on_add_to_cart(Ctx { edit: None, ..ctx }, id, quantity)
    }

    /// Back from a product detail to its category list.
    pub(crate) fn back_to_category(&mut self, ctx: Ctx) -> Result<()> {
        match self
            .sessions
            .get::<CategoryId>(ctx.key, keys::CURRENT_CATEGORY_ID)
        {
            Some(id) if self.store.category(id).is_some() => self.on_category(ctx, id),
            _ => self.show_customer_menu(ctx),
        }
    }

    /// Back from the custom-quantity prompt to the product.
    pub(crate) fn back_to_product_detail(&mut self, ctx: Ctx) -> Result<()> {
        let id = self
            .sessions
            .get::<ProductId>(ctx.key, keys::QUANTITY_PRODUCT_ID)
            .or_else(|| self.sessions.get(ctx.key, keys::CURRENT_PRODUCT_ID));
        match id {
            Some(id) => self.on_product(ctx, id),
            None => self.show_customer_menu(ctx),
        }
    }
}
