//! Admin flows: category CRUD, the add-product wizard, product editing
//! and deletion, data save/restore, and analytics.
//!
//! Admin identity is re-checked by the router before any handler here
//! runs; these methods can assume the caller is an admin.

use rust_decimal::Decimal;
use tracing::{instrument, warn};

use greengrocer_core::{CategoryId, ImageRef, Product, ProductId, ProductUpdate, Unit};

use crate::analytics;
use crate::callback::CallbackData;
use crate::engine::{Bot, Ctx};
use crate::error::Result;
use crate::format;
use crate::keyboards;
use crate::session::{BotState, keys};
use crate::store::StoreError;
use crate::transport::ChatTransport;

impl<T: ChatTransport> Bot<T> {
    // =========================================================================
    // Categories
    // =========================================================================

    /// Ask for a new category name.
    pub(crate) fn on_add_category(&mut self, ctx: Ctx) -> Result<()> {
        self.sessions.set_state(ctx.key, BotState::CategoryNameInput);
        self.show(
            ctx,
            "➕ Type the new category's name.",
            Some(&keyboards::back_only()),
        )
    }

    /// Category name typed.
    #[instrument(skip(self, text))]
    pub(crate) fn on_category_name_text(&mut self, ctx: Ctx, text: &str) -> Result<()> {
        let name = text.trim();
        if name.is_empty() {
            return self.send(
                ctx,
                "A category needs a name. Try again.",
                Some(&keyboards::back_only()),
            );
        }
        self.store.add_category(name)?;
        self.send(ctx, &format!("Category \"{name}\" added."), None)?;
        self.show_admin_menu(Ctx { edit: None, ..ctx })
    }

    /// Pick a category to rename.
    pub(crate) fn on_edit_category_menu(&mut self, ctx: Ctx) -> Result<()> {
        self.sessions.set_state(ctx.key, BotState::CategoryEditSelect);
        let keyboard = keyboards::category_picker(self.store.categories(), CallbackData::EditCategory);
        self.show(ctx, "✏️ Which category should be renamed?", Some(&keyboard))
    }

    /// Category chosen; ask for the new name.
    pub(crate) fn on_edit_category(&mut self, ctx: Ctx, id: CategoryId) -> Result<()> {
        let Some(category) = self.store.category(id) else {
            self.send(ctx, "That category no longer exists.", None)?;
            return self.show_admin_menu(Ctx { edit: None, ..ctx });
        };
        let prompt = format!("Renaming \"{}\". Type the new name.", category.name);
        self.sessions.put(ctx.key, keys::EDIT_CATEGORY_ID, &id);
        self.sessions
            .set_state(ctx.key, BotState::CategoryEditNameInput);
        self.show(ctx, &prompt, Some(&keyboards::back_only()))
    }

    /// Replacement category name typed.
    #[instrument(skip(self, text))]
    pub(crate) fn on_category_edit_name_text(&mut self, ctx: Ctx, text: &str) -> Result<()> {
        let name = text.trim();
        if name.is_empty() {
            return self.send(
                ctx,
                "A category needs a name. Try again.",
                Some(&keyboards::back_only()),
            );
        }
        let Some(id) = self
            .sessions
            .take::<CategoryId>(ctx.key, keys::EDIT_CATEGORY_ID)
        else {
            warn!("edit target lost mid-rename");
            self.send(ctx, "Something went wrong, let's start over.", None)?;
            return self.show_admin_menu(Ctx { edit: None, ..ctx });
        };
        match self.store.rename_category(id, name) {
            Ok(()) => self.send(ctx, &format!("Renamed to \"{name}\"."), None)?,
            Err(StoreError::CategoryNotFound(_)) => {
                self.send(ctx, "That category no longer exists.", None)?;
            }
            Err(other) => return Err(other.into()),
        }
        self.show_admin_menu(Ctx { edit: None, ..ctx })
    }

    /// Pick a category to delete.
    pub(crate) fn on_delete_category_menu(&mut self, ctx: Ctx) -> Result<()> {
        self.sessions
            .set_state(ctx.key, BotState::CategoryDeleteSelect);
        let keyboard =
            keyboards::category_picker(self.store.categories(), CallbackData::DeleteCategory);
        self.show(
            ctx,
            "🗑 Which category should be deleted? Its products go with it.",
            Some(&keyboard),
        )
    }

    /// Category chosen for deletion; cascade immediately.
    #[instrument(skip(self))]
    pub(crate) fn on_delete_category(&mut self, ctx: Ctx, id: CategoryId) -> Result<()> {
        match self.store.delete_category(id) {
            Ok(()) => self.send(ctx, "Category and its products deleted.", None)?,
            Err(StoreError::CategoryNotFound(_)) => {
                self.send(ctx, "That category no longer exists.", None)?;
            }
            Err(other) => return Err(other.into()),
        }
        self.show_admin_menu(Ctx { edit: None, ..ctx })
    }

    // =========================================================================
    // Add-product wizard
    // =========================================================================

    /// Step 1: pick the category.
    pub(crate) fn on_add_product(&mut self, ctx: Ctx) -> Result<()> {
        if self.store.categories().is_empty() {
            self.send(ctx, "Add a category first, then products.", None)?;
            return self.show_admin_menu(Ctx { edit: None, ..ctx });
        }
        self.sessions
            .set_state(ctx.key, BotState::ProductCategorySelect);
        let keyboard =
            keyboards::category_picker(self.store.categories(), CallbackData::ProductCategory);
        self.show(ctx, "➕ Which category is the product in?", Some(&keyboard))
    }

    /// Step 2: category picked, ask for the name.
    pub(crate) fn on_product_category(&mut self, ctx: Ctx, id: CategoryId) -> Result<()> {
        if self.store.category(id).is_none() {
            self.send(ctx, "That category no longer exists.", None)?;
            return self.on_add_product(Ctx { edit: None, ..ctx });
        }
        self.sessions
            .put(ctx.key, keys::DRAFT_PRODUCT_CATEGORY, &id);
        self.sessions.set_state(ctx.key, BotState::ProductNameInput);
        self.show(
            ctx,
            "Type the product's name.",
            Some(&keyboards::back_only()),
        )
    }

    /// Step 3: name typed, ask for the price.
    #[instrument(skip(self, text))]
    pub(crate) fn on_product_name_text(&mut self, ctx: Ctx, text: &str) -> Result<()> {
        let name = text.trim();
        if name.is_empty() {
            return self.send(
                ctx,
                "The product needs a name. Try again.",
                Some(&keyboards::back_only()),
            );
        }
        self.sessions
            .put(ctx.key, keys::DRAFT_PRODUCT_NAME, &name.to_owned());
        self.sessions.set_state(ctx.key, BotState::ProductPriceInput);
        self.send(
            ctx,
            "Now the price per unit, e.g. 180.50",
            Some(&keyboards::back_only()),
        )
    }

    /// Step 4: price typed, ask for the unit.
    #[instrument(skip(self, text))]
    pub(crate) fn on_product_price_text(&mut self, ctx: Ctx, text: &str) -> Result<()> {
        let Some(price) = format::parse_decimal_input(text) else {
            return self.send(
                ctx,
                "That's not a valid price. A positive number like 99 or 180,50 works.",
                Some(&keyboards::back_only()),
            );
        };
        self.sessions.put(ctx.key, keys::DRAFT_PRODUCT_PRICE, &price);
        self.sessions.set_state(ctx.key, BotState::ProductUnitSelect);
        self.send(
            ctx,
            "Is it sold by weight or by piece?",
            Some(&keyboards::unit_select()),
        )
    }

    /// Step 5: unit picked, ask for a photo.
    pub(crate) fn on_unit_select(&mut self, ctx: Ctx, unit: Unit) -> Result<()> {
        self.sessions.put(ctx.key, keys::DRAFT_PRODUCT_UNIT, &unit);
        self.sessions.set_state(ctx.key, BotState::ProductImageInput);
        self.show(
            ctx,
            "Send a photo of the product, or skip this step.",
            Some(&keyboards::image_input()),
        )
    }

    /// Step 6a: photo received.
    pub(crate) fn on_product_image(&mut self, ctx: Ctx, image: ImageRef) -> Result<()> {
        self.finalize_product(ctx, Some(image))
    }

    /// Step 6b: photo skipped.
    pub(crate) fn on_skip_image(&mut self, ctx: Ctx) -> Result<()> {
        self.finalize_product(ctx, None)
    }

    /// Check every staged field and create the product.
    #[instrument(skip(self, image))]
    fn finalize_product(&mut self, ctx: Ctx, image: Option<ImageRef>) -> Result<()> {
        let category = self
            .sessions
            .take::<CategoryId>(ctx.key, keys::DRAFT_PRODUCT_CATEGORY);
        let name = self
            .sessions
            .take::<String>(ctx.key, keys::DRAFT_PRODUCT_NAME);
        let price = self
            .sessions
            .take::<Decimal>(ctx.key, keys::DRAFT_PRODUCT_PRICE);
        let unit = self.sessions.take::<Unit>(ctx.key, keys::DRAFT_PRODUCT_UNIT);

        let (Some(category), Some(name), Some(price), Some(unit)) = (category, name, price, unit)
        else {
            // A restart or stray event dropped part of the draft.
            warn!("product draft incomplete at the final step");
            self.send(
                ctx,
                "Sorry, part of the draft got lost. Let's add the product again.",
                None,
            )?;
            return self.on_add_product(Ctx { edit: None, ..ctx });
        };

        let result = self.store.add_product(Product {
            id: ProductId::new(0),
            name: name.clone(),
            category_id: category,
            price,
            unit,
            image,
            available: true,
        });
        match result {
            Ok(_) => self.send(ctx, &format!("Product \"{name}\" added."), None)?,
            Err(StoreError::CategoryNotFound(_)) => {
                self.send(ctx, "The category disappeared while we worked.", None)?;
            }
            Err(other) => return Err(other.into()),
        }
        self.show_admin_menu(Ctx { edit: None, ..ctx })
    }

    // Wizard back-steps. Each re-prompts the previous step without losing
    // the rest of the draft.

    pub(crate) fn back_to_product_name(&mut self, ctx: Ctx) -> Result<()> {
        if self
            .sessions
            .get::<CategoryId>(ctx.key, keys::DRAFT_PRODUCT_CATEGORY)
            .is_none()
        {
            return self.on_add_product(ctx);
        }
        self.sessions.set_state(ctx.key, BotState::ProductNameInput);
        self.show(
            ctx,
            "Type the product's name.",
            Some(&keyboards::back_only()),
        )
    }

    pub(crate) fn back_to_product_price(&mut self, ctx: Ctx) -> Result<()> {
        if self
            .sessions
            .get::<String>(ctx.key, keys::DRAFT_PRODUCT_NAME)
            .is_none()
        {
            return self.on_add_product(ctx);
        }
        self.sessions.set_state(ctx.key, BotState::ProductPriceInput);
        self.show(
            ctx,
            "Now the price per unit, e.g. 180.50",
            Some(&keyboards::back_only()),
        )
    }

    pub(crate) fn back_to_unit_select(&mut self, ctx: Ctx) -> Result<()> {
        if self
            .sessions
            .get::<Decimal>(ctx.key, keys::DRAFT_PRODUCT_PRICE)
            .is_none()
        {
            return self.on_add_product(ctx);
        }
        self.sessions.set_state(ctx.key, BotState::ProductUnitSelect);
        self.show(
            ctx,
            "Is it sold by weight or by piece?",
            Some(&keyboards::unit_select()),
        )
    }

    // =========================================================================
    // Product editing
    // =========================================================================

    /// Pick the category whose product will be edited.
    pub(crate) fn on_edit_product_menu(&mut self, ctx: Ctx) -> Result<()> {
        self.sessions.set_state(ctx.key, BotState::ProductEditSelect);
        let keyboard =
            keyboards::category_picker(self.store.categories(), CallbackData::EditProductCategory);
        self.show(ctx, "✏️ Which category?", Some(&keyboard))
    }

    /// Category picked; list its products.
    pub(crate) fn on_edit_product_category(&mut self, ctx: Ctx, id: CategoryId) -> Result<()> {
        if self.store.category(id).is_none() {
            self.send(ctx, "That category no longer exists.", None)?;
            return self.on_edit_product_menu(Ctx { edit: None, ..ctx });
        }
        let products = self.store.products_in(id);
        if products.is_empty() {
            self.send(ctx, "No products in that category yet.", None)?;
            return self.on_edit_product_menu(Ctx { edit: None, ..ctx });
        }
        let keyboard = keyboards::product_picker(&products, CallbackData::EditProduct);
        self.show(ctx, "Which product?", Some(&keyboard))
    }

    /// Product picked; show the edit menu.
    pub(crate) fn on_edit_product(&mut self, ctx: Ctx, id: ProductId) -> Result<()> {
        self.sessions.put(ctx.key, keys::EDIT_PRODUCT_ID, &id);
        self.render_edit_menu(ctx, id)
    }

    fn render_edit_menu(&mut self, ctx: Ctx, id: ProductId) -> Result<()> {
        let Some(product) = self.store.product(id) else {
            self.send(ctx, "That product no longer exists.", None)?;
            return self.show_admin_menu(Ctx { edit: None, ..ctx });
        };
        let text = format!(
            "✏️ {}\nPrice: {} per {}\nVisible: {}\nPhoto: {}",
            product.name,
            format::money(product.price),
            product.unit.label(),
            if product.available { "yes" } else { "no" },
            if product.image.is_some() { "yes" } else { "none" },
        );
        let keyboard = keyboards::product_edit_menu(product);
        self.sessions.set_state(ctx.key, BotState::ProductEditMenu);
        self.show(ctx, &text, Some(&keyboard))
    }

    /// Ask for a replacement name.
    pub(crate) fn on_edit_product_name(&mut self, ctx: Ctx, id: ProductId) -> Result<()> {
        self.sessions.put(ctx.key, keys::EDIT_PRODUCT_ID, &id);
        self.sessions
            .set_state(ctx.key, BotState::ProductEditNameInput);
        self.show(ctx, "Type the new name.", Some(&keyboards::back_only()))
    }

    /// Ask for a replacement price.
    pub(crate) fn on_edit_product_price(&mut self, ctx: Ctx, id: ProductId) -> Result<()> {
        self.sessions.put(ctx.key, keys::EDIT_PRODUCT_ID, &id);
        self.sessions
            .set_state(ctx.key, BotState::ProductEditPriceInput);
        self.show(
            ctx,
            "Type the new price, e.g. 180.50",
            Some(&keyboards::back_only()),
        )
    }

    /// Ask for a replacement photo.
    pub(crate) fn on_edit_product_image(&mut self, ctx: Ctx, id: ProductId) -> Result<()> {
        self.sessions.put(ctx.key, keys::EDIT_PRODUCT_ID, &id);
        self.sessions
            .set_state(ctx.key, BotState::ProductEditImageInput);
        self.show(ctx, "Send the new photo.", Some(&keyboards::back_only()))
    }

    /// Replacement name typed.
    #[instrument(skip(self, text))]
    pub(crate) fn on_edit_name_text(&mut self, ctx: Ctx, text: &str) -> Result<()> {
        let name = text.trim();
        if name.is_empty() {
            return self.send(
                ctx,
                "The product needs a name. Try again.",
                Some(&keyboards::back_only()),
            );
        }
        self.apply_product_edit(
            ctx,
            ProductUpdate {
                name: Some(name.to_owned()),
                ..ProductUpdate::default()
            },
        )
    }

    /// Replacement price typed.
    #[instrument(skip(self, text))]
    pub(crate) fn on_edit_price_text(&mut self, ctx: Ctx, text: &str) -> Result<()> {
        let Some(price) = format::parse_decimal_input(text) else {
            return self.send(
                ctx,
                "That's not a valid price. A positive number like 99 or 180,50 works.",
                Some(&keyboards::back_only()),
            );
        };
        self.apply_product_edit(
            ctx,
            ProductUpdate {
                price: Some(price),
                ..ProductUpdate::default()
            },
        )
    }

    /// Replacement photo received.
    pub(crate) fn on_edit_image_photo(&mut self, ctx: Ctx, image: ImageRef) -> Result<()> {
        self.apply_product_edit(
            ctx,
            ProductUpdate {
                image: Some(Some(image)),
                ..ProductUpdate::default()
            },
        )
    }

    fn apply_product_edit(&mut self, ctx: Ctx, update: ProductUpdate) -> Result<()> {
        let Some(id) = self
            .sessions
            .get::<ProductId>(ctx.key, keys::EDIT_PRODUCT_ID)
        else {
            warn!("edit target lost mid-edit");
            self.send(ctx, "Something went wrong, let's start over.", None)?;
            return self.show_admin_menu(Ctx { edit: None, ..ctx });
        };
        match self.store.update_product(id, update) {
            Ok(()) => self.render_edit_menu(Ctx { edit: None, ..ctx }, id),
            Err(StoreError::ProductNotFound(_)) => {
                self.send(ctx, "That product no longer exists.", None)?;
                self.show_admin_menu(Ctx { edit: None, ..ctx })
            }
            Err(other) => Err(other.into()),
        }
    }

    /// Flip availability and redraw the same menu.
    #[instrument(skip(self))]
    pub(crate) fn on_toggle_available(&mut self, ctx: Ctx, id: ProductId) -> Result<()> {
        let Some(current) = self.store.product(id).map(|p| p.available) else {
            self.send(ctx, "That product no longer exists.", None)?;
            return self.show_admin_menu(Ctx { edit: None, ..ctx });
        };
        self.store.update_product(
            id,
            ProductUpdate {
                available: Some(!current),
                ..ProductUpdate::default()
            },
        )?;
        self.sessions.put(ctx.key, keys::EDIT_PRODUCT_ID, &id);
        self.render_edit_menu(ctx, id)
    }

    pub(crate) fn back_to_edit_menu(&mut self, ctx: Ctx) -> Result<()> {
        match self
            .sessions
            .get::<ProductId>(ctx.key, keys::EDIT_PRODUCT_ID)
        {
            Some(id) => self.render_edit_menu(ctx, id),
            None => self.show_admin_menu(ctx),
        }
    }

    // =========================================================================
    // Product deletion
    // =========================================================================

    /// Pick the category whose product will be deleted.
    pub(crate) fn on_delete_product_menu(&mut self, ctx: Ctx) -> Result<()> {
        self.sessions
            .set_state(ctx.key, BotState::ProductDeleteSelect);
        let keyboard = keyboards::category_picker(
            self.store.categories(),
            CallbackData::DeleteProductCategory,
        );
        self.show(ctx, "🗑 Which category?", Some(&keyboard))
    }

    /// Category picked; list its products.
    pub(crate) fn on_delete_product_category(&mut self, ctx: Ctx, id: CategoryId) -> Result<()> {
        if self.store.category(id).is_none() {
            self.send(ctx, "That category no longer exists.", None)?;
            return self.on_delete_product_menu(Ctx { edit: None, ..ctx });
        }
        let products = self.store.products_in(id);
        if products.is_empty() {
            self.send(ctx, "No products in that category.", None)?;
            return self.on_delete_product_menu(Ctx { edit: None, ..ctx });
        }
        let keyboard = keyboards::product_picker(&products, CallbackData::DeleteProduct);
        self.show(ctx, "Which product should be deleted?", Some(&keyboard))
    }

    /// Product picked; ask for confirmation.
    pub(crate) fn on_delete_product(&mut self, ctx: Ctx, id: ProductId) -> Result<()> {
        let Some(product) = self.store.product(id) else {
            self.send(ctx, "That product no longer exists.", None)?;
            return self.on_delete_product_menu(Ctx { edit: None, ..ctx });
        };
        let text = format!("Delete \"{}\"? This can't be undone.", product.name);
        self.sessions.put(ctx.key, keys::DELETE_PRODUCT_ID, &id);
        self.show(ctx, &text, Some(&keyboards::delete_confirm(id)))
    }

    /// Deletion confirmed.
    #[instrument(skip(self))]
    pub(crate) fn on_confirm_delete_product(&mut self, ctx: Ctx, id: ProductId) -> Result<()> {
        self.sessions.remove(ctx.key, keys::DELETE_PRODUCT_ID);
        match self.store.delete_product(id) {
            Ok(()) => self.send(ctx, "Product deleted.", None)?,
            Err(StoreError::ProductNotFound(_)) => {
                self.send(ctx, "That product was already gone.", None)?;
            }
            Err(other) => return Err(other.into()),
        }
        self.show_admin_menu(Ctx { edit: None, ..ctx })
    }

    /// Deletion abandoned.
    pub(crate) fn on_cancel_delete_product(&mut self, ctx: Ctx) -> Result<()> {
        self.sessions.remove(ctx.key, keys::DELETE_PRODUCT_ID);
        self.show_admin_menu(ctx)
    }

    // =========================================================================
    // Data and analytics
    // =========================================================================

    /// Save everything and write a timestamped backup.
    #[instrument(skip(self))]
    pub(crate) fn on_save_data(&mut self, ctx: Ctx) -> Result<()> {
        self.store.save_all()?;
        let name = self.store.backup()?;
        self.send(ctx, &format!("💾 Data saved. Backup: {name}"), None)?;
        self.show_admin_menu(Ctx { edit: None, ..ctx })
    }

    /// List backups to restore from.
    pub(crate) fn on_load_data_menu(&mut self, ctx: Ctx) -> Result<()> {
        let backups = self.store.list_backups()?;
        self.sessions.set_state(ctx.key, BotState::BackupSelect);
        if backups.is_empty() {
            return self.show(
                ctx,
                "No backups yet. Save data first.",
                Some(&keyboards::back_only()),
            );
        }
        self.show(
            ctx,
            "📥 Which backup should be restored?",
            Some(&keyboards::backup_list(&backups)),
        )
    }

    /// Restore a chosen backup.
    #[instrument(skip(self))]
    pub(crate) fn on_load_backup(&mut self, ctx: Ctx, name: &str) -> Result<()> {
        match self.store.restore(name) {
            Ok(()) => self.send(ctx, &format!("Backup {name} restored."), None)?,
            Err(StoreError::BackupNotFound(_)) => {
                self.send(ctx, "That backup is gone.", None)?;
                return self.on_load_data_menu(Ctx { edit: None, ..ctx });
            }
            Err(other) => return Err(other.into()),
        }
        self.show_admin_menu(Ctx { edit: None, ..ctx })
    }

    /// Show the analytics report.
    pub(crate) fn on_analytics(&mut self, ctx: Ctx) -> Result<()> {
        self.sessions.set_state(ctx.key, BotState::AnalyticsView);
        let report = analytics::report(&self.store);
        self.show(ctx, &report, Some(&keyboards::back_only()))
    }
}
