//! Shared harness for the end-to-end conversation tests.
//!
//! [`Harness`] wires a [`Bot`] to a [`RecordingTransport`] and a
//! temporary data directory, and offers event-shaped helpers so tests
//! read like conversations: `start`, `press`, `text`, and so on.

// Test support: panicking on setup failure is the assertion.
#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use rust_decimal::Decimal;
use tempfile::TempDir;

use greengrocer_bot::testing::RecordingTransport;
use greengrocer_bot::{Bot, BotConfig, Event, JsonStore, MessageRef};
use greengrocer_core::{
    CategoryId, ChatId, ImageRef, OrderId, OrderStatus, PhoneNumber, Product, ProductId, Unit,
    UserId,
};

/// The configured admin. Their chat doubles as the notification chat.
pub const ADMIN: i64 = 1;
/// A regular customer.
pub const CUSTOMER: i64 = 42;

/// IDs of the seeded catalogue, in insertion order.
pub mod seeded {
    use greengrocer_core::{CategoryId, ProductId};

    /// "Fruit".
    pub const FRUIT: CategoryId = CategoryId::new(1);
    /// "Vegetables".
    pub const VEGETABLES: CategoryId = CategoryId::new(2);
    /// "Apples", by weight, 100.00.
    pub const APPLES: ProductId = ProductId::new(1);
    /// "Bananas", by piece, 50.00.
    pub const BANANAS: ProductId = ProductId::new(2);
    /// "Carrots", by weight, 45.50.
    pub const CARROTS: ProductId = ProductId::new(3);
}

/// A bot over temp dirs with a recording transport.
pub struct Harness {
    /// The engine under test.
    pub bot: Bot<RecordingTransport>,
    _data: TempDir,
    _backups: TempDir,
}

impl Harness {
    /// An empty shop.
    #[must_use]
    pub fn new() -> Self {
        init_tracing();
        let data = TempDir::new().unwrap();
        let backups = TempDir::new().unwrap();
        let store = JsonStore::open(data.path(), backups.path()).unwrap();
        let config = BotConfig {
            admin_user_id: UserId::new(ADMIN),
            admin_chat_id: ChatId::new(ADMIN),
            data_dir: data.path().to_path_buf(),
            backup_dir: backups.path().to_path_buf(),
        };
        Self {
            bot: Bot::new(RecordingTransport::new(), store, config),
            _data: data,
            _backups: backups,
        }
    }

    /// A shop stocked with the [`seeded`] catalogue.
    #[must_use]
    pub fn with_catalogue() -> Self {
        let mut harness = Self::new();
        let store = harness.bot.store_mut();
        let fruit = store.add_category("Fruit").unwrap();
        let vegetables = store.add_category("Vegetables").unwrap();
        store.add_product(draft(fruit, "Apples", "100", Unit::Kg)).unwrap();
        store
            .add_product(draft(fruit, "Bananas", "50", Unit::Piece))
            .unwrap();
        store
            .add_product(draft(vegetables, "Carrots", "45.50", Unit::Kg))
            .unwrap();
        harness
    }

    // ===== Events =====

    /// Feed one event, asserting the engine accepts it.
    pub fn handle(&mut self, event: Event) {
        self.bot.handle_event(&event).unwrap();
    }

    /// `/start` from a user, in their own chat.
    pub fn start(&mut self, user: i64) {
        self.handle(Event::Command {
            user: UserId::new(user),
            chat: ChatId::new(user),
            name: "start".to_owned(),
            username: Some(format!("user{user}")),
        });
    }

    /// Press an inline button by raw payload.
    pub fn press(&mut self, user: i64, payload: &str) {
        self.handle(Event::Callback {
            user: UserId::new(user),
            chat: ChatId::new(user),
            message: MessageRef(user),
            payload: payload.to_owned(),
            username: None,
        });
    }

    /// Press the button on the latest keyboard whose label contains `label`.
    pub fn press_button(&mut self, user: i64, label: &str) {
        let payload = self
            .bot
            .transport()
            .find_payload(label)
            .unwrap_or_else(|| panic!("no button labelled {label:?} on screen"));
        self.press(user, &payload);
    }

    /// Send a text message.
    pub fn text(&mut self, user: i64, text: &str) {
        self.handle(Event::Text {
            user: UserId::new(user),
            chat: ChatId::new(user),
            text: text.to_owned(),
        });
    }

    /// Send a photo.
    pub fn photo(&mut self, user: i64, file_id: &str) {
        self.handle(Event::Photo {
            user: UserId::new(user),
            chat: ChatId::new(user),
            image: ImageRef::new(file_id),
        });
    }

    /// Share a contact card.
    pub fn contact(&mut self, user: i64, phone_text: &str) {
        self.handle(Event::Contact {
            user: UserId::new(user),
            chat: ChatId::new(user),
            phone_text: phone_text.to_owned(),
        });
    }

    // ===== Shortcuts =====

    /// Text of the newest outbound message.
    #[must_use]
    pub fn last_text(&self) -> &str {
        self.bot.transport().last_text()
    }

    /// Payloads on the newest keyboard-bearing message.
    #[must_use]
    pub fn last_payloads(&self) -> Vec<String> {
        self.bot
            .transport()
            .outbox
            .iter()
            .rev()
            .find_map(|m| m.keyboard.as_ref())
            .map(|kb| {
                kb.rows
                    .iter()
                    .flatten()
                    .map(|b| b.payload.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Put a quantity of a product straight into a user's cart.
    pub fn fill_cart(&mut self, user: i64, product: ProductId, quantity: Decimal) {
        self.bot
            .store_mut()
            .user_mut(UserId::new(user))
            .add_to_cart(product, quantity);
    }

    /// Create an order directly in the store, bypassing the conversation.
    pub fn seed_order(&mut self, user: i64, product: ProductId, status: OrderStatus) -> OrderId {
        let store = self.bot.store_mut();
        store
            .user_mut(UserId::new(user))
            .add_to_cart(product, Decimal::ONE);
        let phone = PhoneNumber::parse("9123456789").unwrap();
        let id = store
            .create_order(UserId::new(user), phone, "12 Market Lane".to_owned(), None)
            .unwrap();
        if status != OrderStatus::New {
            store.update_order_status(id, status).unwrap();
        }
        id
    }

    /// Grant a user the persisted admin flag.
    pub fn make_admin(&mut self, user: i64) {
        self.bot.store_mut().user_mut(UserId::new(user)).is_admin = true;
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

/// Route engine tracing into the test harness output. Later harnesses
/// in the same process are a no-op.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn draft(category: CategoryId, name: &str, price: &str, unit: Unit) -> Product {
    Product {
        id: ProductId::new(0),
        name: name.to_owned(),
        category_id: category,
        price: price.parse().unwrap(),
        unit,
        image: None,
        available: true,
    }
}
