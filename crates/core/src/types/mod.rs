//! Domain types for the Greengrocer bot.

pub mod catalog;
pub mod id;
pub mod order;
pub mod phone;
pub mod user;

pub use catalog::{Category, ImageRef, Product, ProductUpdate, Unit};
pub use id::{CategoryId, ChatId, OrderId, ProductId, UserId};
pub use order::{Order, OrderStatus};
pub use phone::{PhoneError, PhoneNumber};
pub use user::{CartItem, User};
