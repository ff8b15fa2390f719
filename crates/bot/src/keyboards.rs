//! Inline keyboard builders, one per screen.
//!
//! Builders are pure: they take whatever catalogue or view data the screen
//! needs and return a [`Keyboard`] whose payloads all come from
//! [`CallbackData::encode`], so the router can always parse them back.

use rust_decimal::Decimal;

use greengrocer_core::{Category, Order, OrderStatus, Product, Unit};

use crate::callback::CallbackData;
use crate::format;
use crate::orders_view::{OrderFilter, OrderSortKey, OrdersQuery, PAGE_SIZES};
use crate::transport::{Button, Keyboard};

fn button(label: impl Into<String>, data: &CallbackData) -> Button {
    Button::new(label, data.encode())
}

/// A keyboard with only a Back button.
#[must_use]
pub fn back_only() -> Keyboard {
    Keyboard::new().row(vec![button("⬅️ Back", &CallbackData::Back)])
}

/// Landing screen for admins: choose a mode.
#[must_use]
pub fn start_menu() -> Keyboard {
    Keyboard::new()
        .row(vec![button("🛒 Storefront", &CallbackData::ModeCustomer)])
        .row(vec![button("⚙️ Administration", &CallbackData::ModeAdmin)])
}

/// Customer main menu: categories, favorites, search, cart.
///
/// The cart button shows the running total once the cart has lines. Admins
/// also get a button back to the mode choice.
#[must_use]
pub fn customer_menu(
    categories: &[Category],
    cart_total: Option<Decimal>,
    is_admin: bool,
) -> Keyboard {
    let mut kb = Keyboard::new();
    for category in categories {
        kb = kb.row(vec![button(
            &category.name,
            &CallbackData::Category(category.id),
        )]);
    }
    kb = kb.row(vec![
        button("⭐ Favorites", &CallbackData::Favorites),
        button("🔍 Search", &CallbackData::Search),
    ]);
    let cart_label = cart_total.map_or_else(
        || "🛒 Cart".to_owned(),
        |total| format!("🛒 Cart ({})", format::money_compact(total)),
    );
    kb = kb.row(vec![button(cart_label, &CallbackData::Cart)]);
    if is_admin {
        kb = kb.row(vec![button("↩️ Mode choice", &CallbackData::BackToStart)]);
    }
    kb
}

/// Admin main menu grid.
#[must_use]
pub fn admin_menu() -> Keyboard {
    Keyboard::new()
        .row(vec![
            button("➕ Category", &CallbackData::AddCategory),
            button("✏️ Category", &CallbackData::EditCategoryMenu),
            button("🗑 Category", &CallbackData::DeleteCategoryMenu),
        ])
        .row(vec![
            button("➕ Product", &CallbackData::AddProduct),
            button("✏️ Product", &CallbackData::EditProductMenu),
            button("🗑 Product", &CallbackData::DeleteProductMenu),
        ])
        .row(vec![
            button("💾 Save data", &CallbackData::SaveData),
            button("📥 Restore", &CallbackData::LoadDataMenu),
        ])
        .row(vec![
            button("📦 Orders", &CallbackData::Orders),
            button("📊 Analytics", &CallbackData::Analytics),
        ])
        .row(vec![button("↩️ Mode choice", &CallbackData::BackToStart)])
}

/// Generic category picker: one button per category plus Back.
#[must_use]
pub fn category_picker(
    categories: &[Category],
    action: impl Fn(greengrocer_core::CategoryId) -> CallbackData,
) -> Keyboard {
    let mut kb = Keyboard::new();
    for category in categories {
        kb = kb.row(vec![button(&category.name, &action(category.id))]);
    }
    kb.row(vec![button("⬅️ Back", &CallbackData::Back)])
}

/// Generic product picker: one button per product plus Back.
#[must_use]
pub fn product_picker(
    products: &[&Product],
    action: impl Fn(greengrocer_core::ProductId) -> CallbackData,
) -> Keyboard {
    let mut kb = Keyboard::new();
    for product in products {
        let label = if product.available {
            product.name.clone()
        } else {
            format!("{} (hidden)", product.name)
        };
        kb = kb.row(vec![button(label, &action(product.id))]);
    }
    kb.row(vec![button("⬅️ Back", &CallbackData::Back)])
}

/// Unit choice for the add-product wizard.
#[must_use]
pub fn unit_select() -> Keyboard {
    Keyboard::new()
        .row(vec![
            button("⚖️ By weight (kg)", &CallbackData::UnitSelect(Unit::Kg)),
            button("🔢 By piece", &CallbackData::UnitSelect(Unit::Piece)),
        ])
        .row(vec![button("⬅️ Back", &CallbackData::Back)])
}

/// Photo step of the add-product wizard: allow skipping.
#[must_use]
pub fn image_input() -> Keyboard {
    Keyboard::new()
        .row(vec![button("⏭ No photo", &CallbackData::SkipImage)])
        .row(vec![button("⬅️ Back", &CallbackData::Back)])
}

/// Edit actions for one product.
#[must_use]
pub fn product_edit_menu(product: &Product) -> Keyboard {
    let availability_label = if product.available {
        "🚫 Hide from storefront"
    } else {
        "✅ Show on storefront"
    };
    Keyboard::new()
        .row(vec![
            button("✏️ Name", &CallbackData::EditProductName(product.id)),
            button("💰 Price", &CallbackData::EditProductPrice(product.id)),
        ])
        .row(vec![button(
            "🖼 Photo",
            &CallbackData::EditProductImage(product.id),
        )])
        .row(vec![button(
            availability_label,
            &CallbackData::ToggleAvailable(product.id),
        )])
        .row(vec![button("⬅️ Back", &CallbackData::Back)])
}

/// Yes/no confirmation before deleting a product.
#[must_use]
pub fn delete_confirm(product_id: greengrocer_core::ProductId) -> Keyboard {
    Keyboard::new().row(vec![
        button(
            "✅ Delete",
            &CallbackData::ConfirmDeleteProduct(product_id),
        ),
        button("❌ Cancel", &CallbackData::CancelDeleteProduct),
    ])
}

/// Backup list for restoring.
#[must_use]
pub fn backup_list(names: &[String]) -> Keyboard {
    let mut kb = Keyboard::new();
    for name in names {
        kb = kb.row(vec![button(
            name,
            &CallbackData::LoadBackup(name.clone()),
        )]);
    }
    kb.row(vec![button("⬅️ Back", &CallbackData::Back)])
}

/// Product detail actions: favorites, quantities, cart.
#[must_use]
pub fn product_detail(product: &Product, is_favorite: bool, in_cart: bool) -> Keyboard {
    let favorite_button = if is_favorite {
        button("💔 Unfavorite", &CallbackData::RemoveFavorite(product.id))
    } else {
        button("⭐ Favorite", &CallbackData::AddFavorite(product.id))
    };
    let mut kb = Keyboard::new().row(vec![favorite_button]);

    match product.unit {
        Unit::Piece => {
            kb = kb.row(vec![button(
                "🛒 Add 1 pc",
                &CallbackData::AddToCart {
                    product: product.id,
                    quantity: Decimal::ONE,
                },
            )]);
        }
        Unit::Kg => {
            let weights = [
                ("1 kg", Decimal::ONE),
                ("0.5 kg", Decimal::new(5, 1)),
                ("0.25 kg", Decimal::new(25, 2)),
                ("0.1 kg", Decimal::new(1, 1)),
            ];
            kb = kb.row(
                weights
                    .iter()
                    .map(|(label, qty)| {
                        button(
                            *label,
                            &CallbackData::AddToCart {
                                product: product.id,
                                quantity: *qty,
                            },
                        )
                    })
                    .collect(),
            );
            kb = kb.row(vec![button(
                "⚖️ Custom weight",
                &CallbackData::CustomQuantity(product.id),
            )]);
        }
    }

    if in_cart {
        kb = kb.row(vec![button(
            "🗑 Remove from cart",
            &CallbackData::RemoveFromCart(product.id),
        )]);
    }
    kb.row(vec![button("⬅️ Back", &CallbackData::Back)])
}

/// Cart actions.
#[must_use]
pub fn cart_view() -> Keyboard {
    Keyboard::new()
        .row(vec![button("✅ Checkout", &CallbackData::Checkout)])
        .row(vec![button("🗑 Clear cart", &CallbackData::ClearCart)])
        .row(vec![button("⬅️ Back", &CallbackData::Back)])
}

/// Checkout entry: manual entry, plus one-tap reuse when the profile has
/// both a phone and an address on file.
#[must_use]
pub fn checkout_start(has_saved_contact: bool) -> Keyboard {
    let mut kb = Keyboard::new();
    if has_saved_contact {
        kb = kb.row(vec![button(
            "⚡ Use saved phone & address",
            &CallbackData::UseSavedData,
        )]);
    }
    kb.row(vec![button("📱 Enter phone", &CallbackData::PhoneInput)])
        .row(vec![button(
            "🕐 Delivery time",
            &CallbackData::DeliveryTimeMenu,
        )])
        .row(vec![button("⬅️ Back", &CallbackData::Back)])
}

/// Virtual phone pad.
#[must_use]
pub fn phone_pad() -> Keyboard {
    let digit = |d: u8| button(d.to_string(), &CallbackData::PhoneDigit(d));
    Keyboard::new()
        .row(vec![digit(1), digit(2), digit(3)])
        .row(vec![digit(4), digit(5), digit(6)])
        .row(vec![digit(7), digit(8), digit(9)])
        .row(vec![
            button("⌫", &CallbackData::PhoneDelete),
            digit(0),
            button("✅", &CallbackData::PhoneSubmit),
        ])
        .row(vec![button("⬅️ Back", &CallbackData::Back)])
}

/// Delivery slot choice.
#[must_use]
pub fn delivery_time_slots() -> Keyboard {
    let slot = |label: &str, tag: &str| button(label, &CallbackData::DeliveryTime(tag.to_owned()));
    Keyboard::new()
        .row(vec![slot("🌅 Morning (9-12)", "morning")])
        .row(vec![slot("☀️ Afternoon (12-17)", "afternoon")])
        .row(vec![slot("🌆 Evening (17-21)", "evening")])
        .row(vec![button("⬅️ Back", &CallbackData::Back)])
}

/// Admin orders list: per-order buttons plus filter/sort/pagination rows.
#[must_use]
pub fn orders_list(page_orders: &[&Order], page: usize, total_pages: usize, query: &OrdersQuery) -> Keyboard {
    let mut kb = Keyboard::new();
    for order in page_orders {
        let marker = if order.status.is_open() { "🆕" } else { "✅" };
        kb = kb.row(vec![button(
            format!(
                "{marker} #{} — {} — {}",
                order.id,
                format::date(order.created_at),
                format::money_compact(order.total)
            ),
            &CallbackData::ViewOrder(order.id),
        )]);
    }

    kb = kb.row(vec![
        button("⬅️", &CallbackData::PagePrev),
        button(format!("{page}/{total_pages}"), &CallbackData::Noop),
        button("➡️", &CallbackData::PageNext),
    ]);

    let size_row = PAGE_SIZES
        .iter()
        .map(|&size| {
            let label = if size == query.page_size {
                format!("• {size} •")
            } else {
                size.to_string()
            };
            button(label, &CallbackData::PageSize(size))
        })
        .collect();
    kb = kb.row(size_row);

    let filter = |label: &str, value: OrderFilter| {
        let marked = if query.filter == value {
            format!("• {label}")
        } else {
            label.to_owned()
        };
        button(marked, &CallbackData::FilterOrders(value))
    };
    kb = kb.row(vec![
        filter("All", OrderFilter::All),
        filter("Open", OrderFilter::Open),
        filter("Done", OrderFilter::Completed),
    ]);

    let sort = |label: &str, value: OrderSortKey| {
        let marked = if query.sort_key == value {
            format!("• {label}")
        } else {
            label.to_owned()
        };
        button(marked, &CallbackData::SortOrders(value))
    };
    kb = kb.row(vec![
        sort("By date", OrderSortKey::Date),
        sort("By customer", OrderSortKey::User),
    ]);

    kb.row(vec![button("⬅️ Back", &CallbackData::Back)])
}

/// Admin view of one order: status toggle plus return to the list.
#[must_use]
pub fn order_detail_admin(order: &Order) -> Keyboard {
    let toggle = if order.status == OrderStatus::Completed {
        button("🔄 Reopen", &CallbackData::ReopenOrder(order.id))
    } else {
        button("✅ Complete", &CallbackData::CompleteOrder(order.id))
    };
    Keyboard::new()
        .row(vec![toggle])
        .row(vec![button("⬅️ To orders", &CallbackData::BackToOrders)])
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use greengrocer_core::{CategoryId, ProductId};

    fn product(unit: Unit, available: bool) -> Product {
        Product {
            id: ProductId::new(1),
            name: "Apples".to_owned(),
            category_id: CategoryId::new(1),
            price: Decimal::new(100, 0),
            unit,
            image: None,
            available,
        }
    }

    #[test]
    fn test_every_payload_parses() {
        let p = product(Unit::Kg, true);
        let order_query = OrdersQuery::default();
        let keyboards = [
            start_menu(),
            admin_menu(),
            customer_menu(
                &[Category {
                    id: CategoryId::new(1),
                    name: "Fruit".to_owned(),
                }],
                Some(Decimal::ONE),
                true,
            ),
            unit_select(),
            image_input(),
            product_edit_menu(&p),
            delete_confirm(p.id),
            product_detail(&p, false, true),
            cart_view(),
            checkout_start(true),
            phone_pad(),
            delivery_time_slots(),
            orders_list(&[], 1, 1, &order_query),
            backup_list(&["20260115_103000".to_owned()]),
        ];
        for kb in keyboards {
            for row in &kb.rows {
                for b in row {
                    assert!(
                        CallbackData::parse(&b.payload).is_some(),
                        "unparseable payload {:?} on button {:?}",
                        b.payload,
                        b.label
                    );
                }
            }
        }
    }

    #[test]
    fn test_weight_product_gets_fraction_buttons() {
        let kb = product_detail(&product(Unit::Kg, true), false, false);
        let payloads: Vec<&str> = kb
            .rows
            .iter()
            .flatten()
            .map(|b| b.payload.as_str())
            .collect();
        assert!(payloads.contains(&"add_to_cart_1_0.25"));
        assert!(payloads.contains(&"custom_quantity_1"));
        assert!(!payloads.contains(&"remove_from_cart_1"));
    }

    #[test]
    fn test_piece_product_gets_single_quantity() {
        let kb = product_detail(&product(Unit::Piece, true), true, false);
        let payloads: Vec<&str> = kb
            .rows
            .iter()
            .flatten()
            .map(|b| b.payload.as_str())
            .collect();
        assert!(payloads.contains(&"add_to_cart_1_1"));
        assert!(!payloads.iter().any(|p| p.starts_with("custom_quantity")));
        assert!(payloads.contains(&"remove_favorite_1"));
    }

    #[test]
    fn test_checkout_start_hides_saved_shortcut() {
        let without = checkout_start(false);
        assert!(
            !without
                .rows
                .iter()
                .flatten()
                .any(|b| b.payload == "use_saved_data")
        );
    }

    #[test]
    fn test_order_detail_toggle_follows_status() {
        let order = Order {
            id: greengrocer_core::OrderId::new(4),
            user_id: greengrocer_core::UserId::new(1),
            items: Vec::new(),
            status: OrderStatus::New,
            created_at: chrono::Utc::now(),
            phone: greengrocer_core::PhoneNumber::parse("9123456789").unwrap(),
            address: "a".to_owned(),
            delivery_time: None,
            total: Decimal::ZERO,
        };
        let kb = order_detail_admin(&order);
        assert_eq!(kb.rows[0][0].payload, "complete_order_4");
    }
}
