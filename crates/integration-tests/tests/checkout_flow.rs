//! Checkout end to end: phone entry by pad, text, and contact card,
//! the address step, order creation, and the admin notification.

#![allow(clippy::unwrap_used)]

use greengrocer_bot::transport::TransportError;
use greengrocer_core::{ChatId, OrderStatus, UserId};
use greengrocer_integration_tests::{ADMIN, CUSTOMER, Harness, seeded};
use rust_decimal::Decimal;

/// Drive the conversation up to the phone pad with one kilo of apples
/// in the cart.
fn open_phone_pad(h: &mut Harness) {
    h.fill_cart(CUSTOMER, seeded::APPLES, Decimal::ONE);
    h.start(CUSTOMER);
    h.press(CUSTOMER, "cart");
    h.press(CUSTOMER, "checkout");
    h.press(CUSTOMER, "phone_input");
}

#[test]
fn test_full_checkout_via_phone_pad() {
    let mut h = Harness::with_catalogue();
    open_phone_pad(&mut h);
    assert!(h.last_text().contains("___-___-__-__"));

    for digit in [9, 1, 2, 3, 4, 5, 6, 7, 8, 9] {
        h.press(CUSTOMER, &format!("phone_digit_{digit}"));
    }
    h.press(CUSTOMER, "phone_submit");
    assert!(h.last_text().contains("+7-912-345-67-89"));
    assert!(h.last_text().contains("address"));

    h.text(CUSTOMER, "12 Market Lane");

    let order = h.bot.store().orders().first().unwrap();
    assert_eq!(order.status, OrderStatus::New);
    assert_eq!(order.total, Decimal::new(100, 0));
    assert_eq!(order.phone.to_string(), "+7-912-345-67-89");
    assert_eq!(order.address, "12 Market Lane");

    // Cart is gone, contact details are remembered.
    let user = h.bot.store().user(UserId::new(CUSTOMER)).unwrap();
    assert!(user.cart_is_empty());
    assert!(user.phone.is_some());
    assert_eq!(user.address.as_deref(), Some("12 Market Lane"));

    let customer_texts = h.bot.transport().texts_for(ChatId::new(CUSTOMER));
    assert!(customer_texts.iter().any(|t| t.contains("Order #1 placed")));
    // The admin chat heard about it.
    let admin_texts = h.bot.transport().texts_for(ChatId::new(ADMIN));
    assert!(admin_texts.iter().any(|t| t.contains("New order")));
}

#[test]
fn test_pad_shows_progress_and_caps_at_ten() {
    let mut h = Harness::with_catalogue();
    open_phone_pad(&mut h);
    h.press(CUSTOMER, "phone_digit_9");
    h.press(CUSTOMER, "phone_digit_1");
    h.press(CUSTOMER, "phone_digit_2");
    assert!(h.last_text().contains("912-___-__-__"));

    h.press(CUSTOMER, "phone_delete");
    assert!(h.last_text().contains("91_-___-__-__"));
}

#[test]
fn test_pad_submit_requires_ten_digits() {
    let mut h = Harness::with_catalogue();
    open_phone_pad(&mut h);
    h.press(CUSTOMER, "phone_digit_9");
    h.press(CUSTOMER, "phone_digit_1");
    h.press(CUSTOMER, "phone_submit");
    assert!(h.last_text().contains("2 of 10 digits"));
}

#[test]
fn test_typed_phone_with_country_prefix() {
    let mut h = Harness::with_catalogue();
    open_phone_pad(&mut h);
    h.text(CUSTOMER, "8 (912) 345-67-89");
    assert!(h.last_text().contains("+7-912-345-67-89"));
    assert!(h.last_text().contains("address"));
}

#[test]
fn test_typed_phone_too_long_is_rejected() {
    let mut h = Harness::with_catalogue();
    open_phone_pad(&mut h);
    h.text(CUSTOMER, "123456789012345");
    assert!(h.last_text().contains("too many digits"));
}

#[test]
fn test_typed_partial_number_preloads_the_pad() {
    let mut h = Harness::with_catalogue();
    open_phone_pad(&mut h);
    h.text(CUSTOMER, "912 34");
    assert!(h.last_text().contains("912-34_-__-__"));
    // Finish on the pad.
    for digit in [5, 6, 7, 8, 9] {
        h.press(CUSTOMER, &format!("phone_digit_{digit}"));
    }
    h.press(CUSTOMER, "phone_submit");
    assert!(h.last_text().contains("+7-912-345-67-89"));
}

#[test]
fn test_contact_card_enters_the_phone() {
    let mut h = Harness::with_catalogue();
    open_phone_pad(&mut h);
    h.contact(CUSTOMER, "+7 912 345 67 89");
    assert!(h.last_text().contains("+7-912-345-67-89"));
    assert!(h.last_text().contains("address"));
}

#[test]
fn test_second_checkout_offers_saved_details() {
    let mut h = Harness::with_catalogue();
    open_phone_pad(&mut h);
    h.text(CUSTOMER, "9123456789");
    h.text(CUSTOMER, "12 Market Lane");
    assert_eq!(h.bot.store().orders().len(), 1);

    h.fill_cart(CUSTOMER, seeded::BANANAS, Decimal::new(3, 0));
    h.press(CUSTOMER, "cart");
    h.press(CUSTOMER, "checkout");
    assert!(h.last_payloads().contains(&"use_saved_data".to_owned()));

    h.press(CUSTOMER, "use_saved_data");
    let orders = h.bot.store().orders();
    assert_eq!(orders.len(), 2);
    let second = orders.last().unwrap();
    assert_eq!(second.phone.to_string(), "+7-912-345-67-89");
    assert_eq!(second.address, "12 Market Lane");
}

#[test]
fn test_delivery_slot_is_recorded_on_the_order() {
    let mut h = Harness::with_catalogue();
    h.fill_cart(CUSTOMER, seeded::APPLES, Decimal::ONE);
    h.start(CUSTOMER);
    h.press(CUSTOMER, "cart");
    h.press(CUSTOMER, "checkout");
    h.press(CUSTOMER, "delivery_slots");
    h.press(CUSTOMER, "delivery_time_evening");
    // Back on the checkout screen with the slot noted.
    assert!(h.last_text().contains("Delivery: evening"));

    h.press(CUSTOMER, "phone_input");
    h.text(CUSTOMER, "9123456789");
    h.text(CUSTOMER, "12 Market Lane");
    assert_eq!(
        h.bot
            .store()
            .orders()
            .first()
            .unwrap()
            .delivery_time
            .as_deref(),
        Some("evening")
    );
}

#[test]
fn test_first_checkout_hides_saved_shortcut() {
    let mut h = Harness::with_catalogue();
    h.fill_cart(CUSTOMER, seeded::APPLES, Decimal::ONE);
    h.start(CUSTOMER);
    h.press(CUSTOMER, "cart");
    h.press(CUSTOMER, "checkout");
    assert!(!h.last_payloads().contains(&"use_saved_data".to_owned()));
}

#[test]
fn test_empty_cart_checkout_is_refused() {
    let mut h = Harness::with_catalogue();
    h.start(CUSTOMER);
    h.press(CUSTOMER, "cart");
    // Stale checkout press on an empty cart screen.
    h.press(CUSTOMER, "checkout");
    let texts = h.bot.transport().texts_for(ChatId::new(CUSTOMER));
    assert!(texts.iter().any(|t| t.contains("nothing to check out")));
    assert!(h.bot.store().orders().is_empty());
}

#[test]
fn test_admin_notification_failure_keeps_the_order() {
    let mut h = Harness::with_catalogue();
    h.bot.transport_mut().fail_chat(ChatId::new(ADMIN));
    open_phone_pad(&mut h);
    h.text(CUSTOMER, "9123456789");
    h.text(CUSTOMER, "12 Market Lane");

    assert_eq!(h.bot.store().orders().len(), 1);
    let texts = h.bot.transport().texts_for(ChatId::new(CUSTOMER));
    assert!(texts.iter().any(|t| t.contains("Order #1 placed")));
}

#[test]
fn test_back_walks_the_checkout_steps() {
    let mut h = Harness::with_catalogue();
    open_phone_pad(&mut h);
    h.text(CUSTOMER, "9123456789");
    // Address step -> phone pad
    h.press(CUSTOMER, "back");
    assert!(h.last_text().contains("___-___-__-__"));
    // Phone pad -> checkout entry
    h.press(CUSTOMER, "back");
    assert!(h.last_text().contains("Checkout"));
    // Checkout entry -> cart
    h.press(CUSTOMER, "back");
    assert!(h.last_text().contains("Your cart"));
}

#[test]
fn test_unchanged_screen_edit_is_swallowed() {
    let mut h = Harness::with_catalogue();
    open_phone_pad(&mut h);
    h.bot
        .transport_mut()
        .queue_edit_error(TransportError::ContentUnchanged);
    // Re-rendering the identical pad must not error out.
    h.press(CUSTOMER, "phone_delete");
}

#[test]
fn test_vanished_message_edit_falls_back_to_send() {
    let mut h = Harness::with_catalogue();
    open_phone_pad(&mut h);
    let sent_before = h.bot.transport().outbox.len();
    h.bot
        .transport_mut()
        .queue_edit_error(TransportError::MessageNotFound);
    h.press(CUSTOMER, "phone_digit_9");
    // The screen went out as a fresh message instead.
    assert_eq!(h.bot.transport().outbox.len(), sent_before + 1);
    assert!(h.last_text().contains("9__-___-__-__"));
}
