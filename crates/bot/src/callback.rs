//! Callback payload codec.
//!
//! Every inline button carries a string payload. The keyboards encode
//! payloads through [`CallbackData::encode`] and the router parses them
//! back exactly once with [`CallbackData::parse`]; flow handlers only ever
//! see the typed variants. A payload that fails to parse is logged and
//! dropped by the router, so a stale or corrupted button press degrades to
//! a no-op.

use greengrocer_core::{CategoryId, OrderId, ProductId, Unit};
use rust_decimal::Decimal;

use crate::orders_view::{OrderFilter, OrderSortKey};

/// Typed form of an inline-button payload.
#[derive(Debug, Clone, PartialEq)]
pub enum CallbackData {
    // Navigation
    /// Context-sensitive back step.
    Back,
    /// Jump to the landing screen.
    BackToStart,
    /// Switch to customer mode.
    ModeCustomer,
    /// Switch to admin mode.
    ModeAdmin,

    // Customer browsing
    /// Open one category's product list.
    Category(CategoryId),
    /// Open a product detail screen.
    Product(ProductId),
    /// Add a product to favorites.
    AddFavorite(ProductId),
    /// Remove a product from favorites.
    RemoveFavorite(ProductId),
    /// Open the favorites list.
    Favorites,
    /// Start a catalogue search.
    Search,

    // Cart
    /// Add a quantity of a product to the cart.
    AddToCart {
        /// Product to add.
        product: ProductId,
        /// Quantity in the product's unit.
        quantity: Decimal,
    },
    /// Ask for a custom weight for a product.
    CustomQuantity(ProductId),
    /// Drop a product's cart line.
    RemoveFromCart(ProductId),
    /// Open the cart.
    Cart,
    /// Empty the cart.
    ClearCart,

    // Checkout
    /// Begin checkout.
    Checkout,
    /// Reuse the saved phone and address.
    UseSavedData,
    /// Open the phone entry screen.
    PhoneInput,
    /// Press a digit on the virtual phone pad.
    PhoneDigit(u8),
    /// Erase the last digit on the pad.
    PhoneDelete,
    /// Submit the pad's digit buffer.
    PhoneSubmit,
    /// Open the delivery slot picker.
    DeliveryTimeMenu,
    /// Choose a delivery slot.
    DeliveryTime(String),

    // Admin: catalogue
    /// Start adding a category.
    AddCategory,
    /// Open the rename-category picker.
    EditCategoryMenu,
    /// Rename this category.
    EditCategory(CategoryId),
    /// Open the delete-category picker.
    DeleteCategoryMenu,
    /// Delete this category (cascades its products).
    DeleteCategory(CategoryId),
    /// Start the add-product wizard.
    AddProduct,
    /// Wizard: new product goes in this category.
    ProductCategory(CategoryId),
    /// Wizard: unit choice.
    UnitSelect(Unit),
    /// Wizard: create the product without a photo.
    SkipImage,
    /// Open the edit-product category picker.
    EditProductMenu,
    /// Edit-product: category chosen.
    EditProductCategory(CategoryId),
    /// Edit-product: product chosen.
    EditProduct(ProductId),
    /// Edit this product's name.
    EditProductName(ProductId),
    /// Edit this product's price.
    EditProductPrice(ProductId),
    /// Edit this product's photo.
    EditProductImage(ProductId),
    /// Flip this product's availability.
    ToggleAvailable(ProductId),
    /// Open the delete-product category picker.
    DeleteProductMenu,
    /// Delete-product: category chosen.
    DeleteProductCategory(CategoryId),
    /// Delete-product: product chosen, ask for confirmation.
    DeleteProduct(ProductId),
    /// Confirmed product deletion.
    ConfirmDeleteProduct(ProductId),
    /// Abandon product deletion.
    CancelDeleteProduct,

    // Admin: data and analytics
    /// Save all data and write a backup.
    SaveData,
    /// List backups for restoring.
    LoadDataMenu,
    /// Restore this backup.
    LoadBackup(String),
    /// Show the analytics report.
    Analytics,

    // Orders
    /// Open the admin orders list.
    Orders,
    /// Open one order's detail.
    ViewOrder(OrderId),
    /// Mark an order completed.
    CompleteOrder(OrderId),
    /// Reopen a completed order.
    ReopenOrder(OrderId),
    /// Return from a detail to the orders list.
    BackToOrders,
    /// Switch the list filter.
    FilterOrders(OrderFilter),
    /// Switch (or toggle) the list sort.
    SortOrders(OrderSortKey),
    /// Previous list page.
    PagePrev,
    /// Next list page.
    PageNext,
    /// Switch the list page size.
    PageSize(usize),

    /// Inert button (e.g. the page indicator).
    Noop,
}

impl CallbackData {
    /// Encode into the wire payload placed on a button.
    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            Self::Back => "back".to_owned(),
            Self::BackToStart => "back_to_start".to_owned(),
            Self::ModeCustomer => "mode_customer".to_owned(),
            Self::ModeAdmin => "mode_admin".to_owned(),
            Self::Category(id) => format!("category_{id}"),
            Self::Product(id) => format!("product_{id}"),
            Self::AddFavorite(id) => format!("add_favorite_{id}"),
            Self::RemoveFavorite(id) => format!("remove_favorite_{id}"),
            Self::Favorites => "favorites".to_owned(),
            Self::Search => "search".to_owned(),
            Self::AddToCart { product, quantity } => format!("add_to_cart_{product}_{quantity}"),
            Self::CustomQuantity(id) => format!("custom_quantity_{id}"),
            Self::RemoveFromCart(id) => format!("remove_from_cart_{id}"),
            Self::Cart => "cart".to_owned(),
            Self::ClearCart => "clear_cart".to_owned(),
            Self::Checkout => "checkout".to_owned(),
            Self::UseSavedData => "use_saved_data".to_owned(),
            Self::PhoneInput => "phone_input".to_owned(),
            Self::PhoneDigit(d) => format!("phone_digit_{d}"),
            Self::PhoneDelete => "phone_delete".to_owned(),
            Self::PhoneSubmit => "phone_submit".to_owned(),
            Self::DeliveryTimeMenu => "delivery_slots".to_owned(),
            Self::DeliveryTime(slot) => format!("delivery_time_{slot}"),
            Self::AddCategory => "add_category".to_owned(),
            Self::EditCategoryMenu => "edit_category".to_owned(),
            Self::EditCategory(id) => format!("edit_category_{id}"),
            Self::DeleteCategoryMenu => "delete_category".to_owned(),
            Self::DeleteCategory(id) => format!("delete_category_{id}"),
            Self::AddProduct => "add_product".to_owned(),
            Self::ProductCategory(id) => format!("product_category_{id}"),
            Self::UnitSelect(Unit::Kg) => "unit_kg".to_owned(),
            Self::UnitSelect(Unit::Piece) => "unit_piece".to_owned(),
            Self::SkipImage => "skip_image".to_owned(),
            Self::EditProductMenu => "edit_product".to_owned(),
            Self::EditProductCategory(id) => format!("edit_prod_cat_{id}"),
            Self::EditProduct(id) => format!("edit_prod_{id}"),
            Self::EditProductName(id) => format!("edit_name_{id}"),
            Self::EditProductPrice(id) => format!("edit_price_{id}"),
            Self::EditProductImage(id) => format!("edit_image_{id}"),
            Self::ToggleAvailable(id) => format!("toggle_available_{id}"),
            Self::DeleteProductMenu => "delete_product".to_owned(),
            Self::DeleteProductCategory(id) => format!("delete_prod_cat_{id}"),
            Self::DeleteProduct(id) => format!("delete_prod_{id}"),
            Self::ConfirmDeleteProduct(id) => format!("confirm_delete_product_{id}"),
            Self::CancelDeleteProduct => "cancel_delete_product".to_owned(),
            Self::SaveData => "save_data".to_owned(),
            Self::LoadDataMenu => "load_data".to_owned(),
            Self::LoadBackup(name) => format!("backup_{name}"),
            Self::Analytics => "analytics".to_owned(),
            Self::Orders => "orders".to_owned(),
            Self::ViewOrder(id) => format!("view_order_{id}"),
            Self::CompleteOrder(id) => format!("complete_order_{id}"),
            Self::ReopenOrder(id) => format!("reopen_order_{id}"),
            Self::BackToOrders => "back_to_orders".to_owned(),
            Self::FilterOrders(filter) => format!("filter_orders_{}", filter.tag()),
            Self::SortOrders(key) => format!("sort_orders_{}", key.tag()),
            Self::PagePrev => "page_prev".to_owned(),
            Self::PageNext => "page_next".to_owned(),
            Self::PageSize(size) => format!("page_size_{size}"),
            Self::Noop => "noop".to_owned(),
        }
    }

    /// Parse a wire payload back into its typed form.
    ///
    /// Returns `None` for unknown tags or malformed arguments; the router
    /// logs and ignores those.
    #[must_use]
    pub fn parse(payload: &str) -> Option<Self> {
        // Fixed tags first.
        let fixed = match payload {
            "back" => Some(Self::Back),
            "back_to_start" => Some(Self::BackToStart),
            "mode_customer" => Some(Self::ModeCustomer),
            "mode_admin" => Some(Self::ModeAdmin),
            "favorites" => Some(Self::Favorites),
            "search" => Some(Self::Search),
            "cart" => Some(Self::Cart),
            "clear_cart" => Some(Self::ClearCart),
            "checkout" => Some(Self::Checkout),
            "use_saved_data" => Some(Self::UseSavedData),
            "phone_input" => Some(Self::PhoneInput),
            "phone_delete" => Some(Self::PhoneDelete),
            "phone_submit" => Some(Self::PhoneSubmit),
            "delivery_slots" => Some(Self::DeliveryTimeMenu),
            "add_category" => Some(Self::AddCategory),
            "edit_category" => Some(Self::EditCategoryMenu),
            "delete_category" => Some(Self::DeleteCategoryMenu),
            "add_product" => Some(Self::AddProduct),
            "unit_kg" => Some(Self::UnitSelect(Unit::Kg)),
            "unit_piece" => Some(Self::UnitSelect(Unit::Piece)),
            "skip_image" => Some(Self::SkipImage),
            "edit_product" => Some(Self::EditProductMenu),
            "delete_product" => Some(Self::DeleteProductMenu),
            "cancel_delete_product" => Some(Self::CancelDeleteProduct),
            "save_data" => Some(Self::SaveData),
            "load_data" => Some(Self::LoadDataMenu),
            "analytics" => Some(Self::Analytics),
            "orders" => Some(Self::Orders),
            "back_to_orders" => Some(Self::BackToOrders),
            "filter_orders_all" => Some(Self::FilterOrders(OrderFilter::All)),
            "filter_orders_new" => Some(Self::FilterOrders(OrderFilter::Open)),
            "filter_orders_completed" => Some(Self::FilterOrders(OrderFilter::Completed)),
            "sort_orders_date" => Some(Self::SortOrders(OrderSortKey::Date)),
            "sort_orders_user" => Some(Self::SortOrders(OrderSortKey::User)),
            "page_prev" => Some(Self::PagePrev),
            "page_next" => Some(Self::PageNext),
            "noop" => Some(Self::Noop),
            _ => None,
        };
        if fixed.is_some() {
            return fixed;
        }

        // Prefixed tags, longest prefixes first where one shadows another.
        if let Some(rest) = payload.strip_prefix("add_to_cart_") {
            let (product, quantity) = rest.split_once('_')?;
            return Some(Self::AddToCart {
                product: ProductId::new(product.parse().ok()?),
                quantity: quantity.parse().ok()?,
            });
        }
        if let Some(rest) = payload.strip_prefix("phone_digit_") {
            let digit: u8 = rest.parse().ok()?;
            return (digit <= 9).then_some(Self::PhoneDigit(digit));
        }
        if let Some(rest) = payload.strip_prefix("delivery_time_") {
            return Some(Self::DeliveryTime(rest.to_owned()));
        }
        if let Some(rest) = payload.strip_prefix("backup_") {
            return Some(Self::LoadBackup(rest.to_owned()));
        }
        if let Some(rest) = payload.strip_prefix("page_size_") {
            return Some(Self::PageSize(rest.parse().ok()?));
        }

        if let Some(rest) = payload.strip_prefix("confirm_delete_product_") {
            return Some(Self::ConfirmDeleteProduct(parse_id(rest)?));
        }
        if let Some(rest) = payload.strip_prefix("custom_quantity_") {
            return Some(Self::CustomQuantity(parse_id(rest)?));
        }
        if let Some(rest) = payload.strip_prefix("remove_from_cart_") {
            return Some(Self::RemoveFromCart(parse_id(rest)?));
        }
        if let Some(rest) = payload.strip_prefix("add_favorite_") {
            return Some(Self::AddFavorite(parse_id(rest)?));
        }
        if let Some(rest) = payload.strip_prefix("remove_favorite_") {
            return Some(Self::RemoveFavorite(parse_id(rest)?));
        }
        if let Some(rest) = payload.strip_prefix("product_category_") {
            return Some(Self::ProductCategory(parse_id(rest)?));
        }
        if let Some(rest) = payload.strip_prefix("category_") {
            return Some(Self::Category(parse_id(rest)?));
        }
        if let Some(rest) = payload.strip_prefix("product_") {
            return Some(Self::Product(parse_id(rest)?));
        }
        if let Some(rest) = payload.strip_prefix("edit_category_") {
            return Some(Self::EditCategory(parse_id(rest)?));
        }
        if let Some(rest) = payload.strip_prefix("delete_category_") {
            return Some(Self::DeleteCategory(parse_id(rest)?));
        }
        if let Some(rest) = payload.strip_prefix("edit_prod_cat_") {
            return Some(Self::EditProductCategory(parse_id(rest)?));
        }
        if let Some(rest) = payload.strip_prefix("edit_prod_") {
            return Some(Self::EditProduct(parse_id(rest)?));
        }
        if let Some(rest) = payload.strip_prefix("edit_name_") {
            return Some(Self::EditProductName(parse_id(rest)?));
        }
        if let Some(rest) = payload.strip_prefix("edit_price_") {
            return Some(Self::EditProductPrice(parse_id(rest)?));
        }
        if let Some(rest) = payload.strip_prefix("edit_image_") {
            return Some(Self::EditProductImage(parse_id(rest)?));
        }
        if let Some(rest) = payload.strip_prefix("toggle_available_") {
            return Some(Self::ToggleAvailable(parse_id(rest)?));
        }
        if let Some(rest) = payload.strip_prefix("delete_prod_cat_") {
            return Some(Self::DeleteProductCategory(parse_id(rest)?));
        }
        if let Some(rest) = payload.strip_prefix("delete_prod_") {
            return Some(Self::DeleteProduct(parse_id(rest)?));
        }
        if let Some(rest) = payload.strip_prefix("view_order_") {
            return Some(Self::ViewOrder(parse_id(rest)?));
        }
        if let Some(rest) = payload.strip_prefix("complete_order_") {
            return Some(Self::CompleteOrder(parse_id(rest)?));
        }
        if let Some(rest) = payload.strip_prefix("reopen_order_") {
            return Some(Self::ReopenOrder(parse_id(rest)?));
        }

        None
    }

    /// Whether this action is admin-only and must pass the identity check.
    #[must_use]
    pub const fn requires_admin(&self) -> bool {
        matches!(
            self,
            Self::ModeAdmin
                | Self::AddCategory
                | Self::EditCategoryMenu
                | Self::EditCategory(_)
                | Self::DeleteCategoryMenu
                | Self::DeleteCategory(_)
                | Self::AddProduct
                | Self::ProductCategory(_)
                | Self::UnitSelect(_)
                | Self::SkipImage
                | Self::EditProductMenu
                | Self::EditProductCategory(_)
                | Self::EditProduct(_)
                | Self::EditProductName(_)
                | Self::EditProductPrice(_)
                | Self::EditProductImage(_)
                | Self::ToggleAvailable(_)
                | Self::DeleteProductMenu
                | Self::DeleteProductCategory(_)
                | Self::DeleteProduct(_)
                | Self::ConfirmDeleteProduct(_)
                | Self::CancelDeleteProduct
                | Self::SaveData
                | Self::LoadDataMenu
                | Self::LoadBackup(_)
                | Self::Analytics
                | Self::Orders
                | Self::CompleteOrder(_)
                | Self::ReopenOrder(_)
                | Self::BackToOrders
                | Self::FilterOrders(_)
                | Self::SortOrders(_)
                | Self::PagePrev
                | Self::PageNext
                | Self::PageSize(_)
        )
    }
}

fn parse_id<T: From<i64>>(raw: &str) -> Option<T> {
    raw.parse::<i64>().ok().map(T::from)
}
