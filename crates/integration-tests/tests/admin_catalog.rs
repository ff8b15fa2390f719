//! Admin-side conversations: access control, catalogue CRUD, the
//! add-product wizard, backups, and analytics.

#![allow(clippy::unwrap_used)]

use greengrocer_core::{ChatId, OrderStatus, Unit, UserId};
use greengrocer_integration_tests::{ADMIN, CUSTOMER, Harness, seeded};
use rust_decimal::Decimal;

/// Land the admin on the administration menu.
fn open_admin_menu(h: &mut Harness) {
    h.start(ADMIN);
    h.press(ADMIN, "mode_admin");
}

#[test]
fn test_admin_start_offers_mode_choice() {
    let mut h = Harness::with_catalogue();
    h.start(ADMIN);
    assert!(h.last_text().contains("Choose a mode"));
    let payloads = h.last_payloads();
    assert!(payloads.contains(&"mode_customer".to_owned()));
    assert!(payloads.contains(&"mode_admin".to_owned()));
}

#[test]
fn test_admin_can_shop_as_a_customer() {
    let mut h = Harness::with_catalogue();
    h.start(ADMIN);
    h.press(ADMIN, "mode_customer");
    assert!(h.last_text().contains("Pick a category"));
    // And can return to the mode choice.
    assert!(h.last_payloads().contains(&"back_to_start".to_owned()));
}

#[test]
fn test_non_admin_is_denied_and_reset() {
    let mut h = Harness::with_catalogue();
    h.start(CUSTOMER);
    h.press(CUSTOMER, "mode_admin");

    let texts = h.bot.transport().texts_for(ChatId::new(CUSTOMER));
    assert!(texts.iter().any(|t| t.contains("don't have access")));
    assert!(h.last_text().contains("Pick a category"));
}

#[test]
fn test_non_admin_denied_on_forged_deep_action() {
    let mut h = Harness::with_catalogue();
    h.start(CUSTOMER);
    h.press(CUSTOMER, "save_data");
    assert!(h.bot.store().list_backups().unwrap().is_empty());
}

#[test]
fn test_persisted_admin_flag_grants_access() {
    let mut h = Harness::with_catalogue();
    h.make_admin(7);
    h.start(7);
    assert!(h.last_text().contains("Choose a mode"));
    h.press(7, "mode_admin");
    assert!(h.last_text().contains("Administration"));
}

#[test]
fn test_add_category() {
    let mut h = Harness::with_catalogue();
    open_admin_menu(&mut h);
    h.press(ADMIN, "add_category");
    h.text(ADMIN, "Herbs");

    assert!(
        h.bot
            .store()
            .categories()
            .iter()
            .any(|c| c.name == "Herbs")
    );
    assert!(h.last_text().contains("Administration"));
}

#[test]
fn test_category_name_must_not_be_blank() {
    let mut h = Harness::with_catalogue();
    open_admin_menu(&mut h);
    h.press(ADMIN, "add_category");
    h.text(ADMIN, "   ");
    assert!(h.last_text().contains("needs a name"));
    // Still in the input; a proper name works now.
    h.text(ADMIN, "Herbs");
    assert_eq!(h.bot.store().categories().len(), 3);
}

#[test]
fn test_rename_category() {
    let mut h = Harness::with_catalogue();
    open_admin_menu(&mut h);
    h.press(ADMIN, "edit_category");
    h.press(ADMIN, "edit_category_1");
    assert!(h.last_text().contains("Fruit"));
    h.text(ADMIN, "Berries");
    assert_eq!(
        h.bot.store().category(seeded::FRUIT).unwrap().name,
        "Berries"
    );
}

#[test]
fn test_delete_category_cascades_its_products() {
    let mut h = Harness::with_catalogue();
    open_admin_menu(&mut h);
    h.press(ADMIN, "delete_category");
    h.press(ADMIN, "delete_category_1");

    assert!(h.bot.store().category(seeded::FRUIT).is_none());
    assert!(h.bot.store().product(seeded::APPLES).is_none());
    assert!(h.bot.store().product(seeded::BANANAS).is_none());
    assert!(h.bot.store().product(seeded::CARROTS).is_some());
}

#[test]
fn test_add_product_wizard_with_photo() {
    let mut h = Harness::with_catalogue();
    open_admin_menu(&mut h);
    h.press(ADMIN, "add_product");
    h.press(ADMIN, "product_category_2");
    h.text(ADMIN, "Plums");
    h.text(ADMIN, "120,50");
    h.press(ADMIN, "unit_kg");
    h.photo(ADMIN, "photo-99");

    let product = h
        .bot
        .store()
        .products_in(seeded::VEGETABLES)
        .into_iter()
        .find(|p| p.name == "Plums")
        .unwrap();
    assert_eq!(product.price, Decimal::new(12050, 2));
    assert_eq!(product.unit, Unit::Kg);
    assert!(product.image.is_some());
    assert!(product.available);
}

#[test]
fn test_add_product_wizard_skipping_photo() {
    let mut h = Harness::with_catalogue();
    open_admin_menu(&mut h);
    h.press(ADMIN, "add_product");
    h.press(ADMIN, "product_category_1");
    h.text(ADMIN, "Pears");
    h.text(ADMIN, "90");
    h.press(ADMIN, "unit_piece");
    h.press(ADMIN, "skip_image");

    let product = h
        .bot
        .store()
        .products_in(seeded::FRUIT)
        .into_iter()
        .find(|p| p.name == "Pears")
        .unwrap();
    assert_eq!(product.unit, Unit::Piece);
    assert!(product.image.is_none());
}

#[test]
fn test_wizard_rejects_bad_price() {
    let mut h = Harness::with_catalogue();
    open_admin_menu(&mut h);
    h.press(ADMIN, "add_product");
    h.press(ADMIN, "product_category_1");
    h.text(ADMIN, "Pears");
    h.text(ADMIN, "free");
    assert!(h.last_text().contains("not a valid price"));
    h.text(ADMIN, "-5");
    assert!(h.last_text().contains("not a valid price"));
    // Recovers with a valid one.
    h.text(ADMIN, "90");
    assert!(h.last_text().contains("by weight or by piece"));
}

#[test]
fn test_wizard_back_walks_steps_without_losing_draft() {
    let mut h = Harness::with_catalogue();
    open_admin_menu(&mut h);
    h.press(ADMIN, "add_product");
    h.press(ADMIN, "product_category_1");
    h.text(ADMIN, "Pears");
    h.text(ADMIN, "90");
    // Unit step -> price step -> name step
    h.press(ADMIN, "back");
    assert!(h.last_text().contains("price per unit"));
    h.press(ADMIN, "back");
    assert!(h.last_text().contains("product's name"));
    // Forward again, reusing the kept category.
    h.text(ADMIN, "Pears");
    h.text(ADMIN, "95");
    h.press(ADMIN, "unit_piece");
    h.press(ADMIN, "skip_image");
    assert!(
        h.bot
            .store()
            .products_in(seeded::FRUIT)
            .iter()
            .any(|p| p.name == "Pears" && p.price == Decimal::new(95, 0))
    );
}

#[test]
fn test_edit_product_price() {
    let mut h = Harness::with_catalogue();
    open_admin_menu(&mut h);
    h.press(ADMIN, "edit_product");
    h.press(ADMIN, "edit_prod_cat_1");
    h.press(ADMIN, "edit_prod_1");
    assert!(h.last_text().contains("Apples"));

    h.press(ADMIN, "edit_price_1");
    h.text(ADMIN, "110");
    assert_eq!(
        h.bot.store().product(seeded::APPLES).unwrap().price,
        Decimal::new(110, 0)
    );
    // Back on the edit menu with the fresh price.
    assert!(h.last_text().contains("110.00 ₽"));
}

#[test]
fn test_edit_product_name_and_photo() {
    let mut h = Harness::with_catalogue();
    open_admin_menu(&mut h);
    h.press(ADMIN, "edit_product");
    h.press(ADMIN, "edit_prod_cat_1");
    h.press(ADMIN, "edit_prod_1");

    h.press(ADMIN, "edit_name_1");
    h.text(ADMIN, "Red Apples");
    assert_eq!(
        h.bot.store().product(seeded::APPLES).unwrap().name,
        "Red Apples"
    );

    h.press(ADMIN, "edit_image_1");
    h.photo(ADMIN, "photo-7");
    assert!(
        h.bot
            .store()
            .product(seeded::APPLES)
            .unwrap()
            .image
            .is_some()
    );
}

#[test]
fn test_toggled_off_product_disappears_from_storefront() {
    let mut h = Harness::with_catalogue();
    open_admin_menu(&mut h);
    h.press(ADMIN, "edit_product");
    h.press(ADMIN, "edit_prod_cat_1");
    h.press(ADMIN, "edit_prod_1");
    h.press(ADMIN, "toggle_available_1");
    assert!(!h.bot.store().product(seeded::APPLES).unwrap().available);

    h.start(CUSTOMER);
    h.press(CUSTOMER, "category_1");
    let payloads = h.last_payloads();
    assert!(!payloads.contains(&"product_1".to_owned()));
    assert!(payloads.contains(&"product_2".to_owned()));
    // Hidden products also stay out of search.
    assert!(h.bot.store().search_products("apple").is_empty());
}

#[test]
fn test_delete_product_asks_for_confirmation() {
    let mut h = Harness::with_catalogue();
    open_admin_menu(&mut h);
    h.press(ADMIN, "delete_product");
    h.press(ADMIN, "delete_prod_cat_1");
    h.press(ADMIN, "delete_prod_1");
    assert!(h.last_text().contains("Delete \"Apples\"?"));

    h.press(ADMIN, "cancel_delete_product");
    assert!(h.bot.store().product(seeded::APPLES).is_some());

    h.press(ADMIN, "delete_product");
    h.press(ADMIN, "delete_prod_cat_1");
    h.press(ADMIN, "delete_prod_1");
    h.press(ADMIN, "confirm_delete_product_1");
    assert!(h.bot.store().product(seeded::APPLES).is_none());
}

#[test]
fn test_save_writes_a_backup_and_restore_brings_data_back() {
    let mut h = Harness::with_catalogue();
    open_admin_menu(&mut h);
    h.press(ADMIN, "save_data");
    assert!(h.last_text().contains("Administration"));

    let backups = h.bot.store().list_backups().unwrap();
    assert_eq!(backups.len(), 1);
    let name = backups.first().unwrap().clone();

    h.press(ADMIN, "delete_category");
    h.press(ADMIN, "delete_category_1");
    assert!(h.bot.store().category(seeded::FRUIT).is_none());

    h.press(ADMIN, "load_data");
    assert!(h.last_payloads().contains(&format!("backup_{name}")));
    h.press(ADMIN, &format!("backup_{name}"));
    assert!(h.bot.store().category(seeded::FRUIT).is_some());
    assert!(h.bot.store().product(seeded::APPLES).is_some());
}

#[test]
fn test_restore_screen_with_no_backups() {
    let mut h = Harness::with_catalogue();
    open_admin_menu(&mut h);
    h.press(ADMIN, "load_data");
    assert!(h.last_text().contains("No backups yet"));
}

#[test]
fn test_analytics_screen_renders_report() {
    let mut h = Harness::with_catalogue();
    h.seed_order(CUSTOMER, seeded::APPLES, OrderStatus::New);
    open_admin_menu(&mut h);
    h.press(ADMIN, "analytics");

    let text = h.last_text();
    assert!(text.contains("Sales analytics"));
    assert!(text.contains("user #42"));
    assert!(text.contains("Apples"));
}

#[test]
fn test_admin_back_returns_to_admin_menu() {
    let mut h = Harness::with_catalogue();
    open_admin_menu(&mut h);
    h.press(ADMIN, "analytics");
    h.press(ADMIN, "back");
    assert!(h.last_text().contains("Administration"));
}

#[test]
fn test_unknown_command_is_ignored() {
    let mut h = Harness::with_catalogue();
    h.handle(greengrocer_bot::Event::Command {
        user: UserId::new(CUSTOMER),
        chat: ChatId::new(CUSTOMER),
        name: "help".to_owned(),
        username: None,
    });
    assert!(h.bot.transport().outbox.is_empty());
}
