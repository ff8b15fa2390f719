//! Sales analytics over the order history.
//!
//! Everything here is read-only aggregation. The numbers are tolerant of
//! deleted products and missing user records: unknown references are
//! simply skipped rather than failing the whole report.

use std::collections::HashMap;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;

use greengrocer_core::{ProductId, UserId};

use crate::format;
use crate::store::JsonStore;

/// How many customers each leaderboard shows.
const TOP_CUSTOMERS: usize = 5;
/// How many products each window shows.
const TOP_PRODUCTS: usize = 3;
/// Reporting windows, in days.
const WINDOWS: [i64; 4] = [7, 30, 90, 365];

/// Customers ranked by total spend, descending.
#[must_use]
pub fn top_customers_by_spend(store: &JsonStore, limit: usize) -> Vec<(UserId, Decimal)> {
    let mut totals: HashMap<UserId, Decimal> = HashMap::new();
    for order in store.orders() {
        *totals.entry(order.user_id).or_default() += order.total;
    }
    let mut ranked: Vec<_> = totals.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked.truncate(limit);
    ranked
}

/// Customers ranked by number of orders, descending.
#[must_use]
pub fn top_customers_by_orders(store: &JsonStore, limit: usize) -> Vec<(UserId, usize)> {
    let mut counts: HashMap<UserId, usize> = HashMap::new();
    for order in store.orders() {
        *counts.entry(order.user_id).or_default() += 1;
    }
    let mut ranked: Vec<_> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked.truncate(limit);
    ranked
}

/// Products ranked by quantity sold inside the last `days` days.
#[must_use]
pub fn popular_products(store: &JsonStore, days: i64, limit: usize) -> Vec<(ProductId, Decimal)> {
    let cutoff = Utc::now() - Duration::days(days);
    let mut sold: HashMap<ProductId, Decimal> = HashMap::new();
    for order in store.orders() {
        if order.created_at < cutoff {
            continue;
        }
        for item in &order.items {
            *sold.entry(item.product_id).or_default() += item.quantity;
        }
    }
    let mut ranked: Vec<_> = sold.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked.truncate(limit);
    ranked
}

/// Render the full analytics report shown on the admin screen.
#[must_use]
pub fn report(store: &JsonStore) -> String {
    let mut out = String::from("📊 Sales analytics\n");

    out.push_str("\nTop customers by spend:\n");
    let by_spend = top_customers_by_spend(store, TOP_CUSTOMERS);
    if by_spend.is_empty() {
        out.push_str("  no orders yet\n");
    }
    for (rank, (user, total)) in by_spend.iter().enumerate() {
        out.push_str(&format!(
            "  {}. {} — {}\n",
            rank + 1,
            customer_label(store, *user),
            format::money(*total)
        ));
    }

    out.push_str("\nTop customers by order count:\n");
    for (rank, (user, count)) in top_customers_by_orders(store, TOP_CUSTOMERS).iter().enumerate() {
        out.push_str(&format!(
            "  {}. {} — {count} orders\n",
            rank + 1,
            customer_label(store, *user),
        ));
    }

    for days in WINDOWS {
        out.push_str(&format!("\nPopular products, last {days} days:\n"));
        let ranked = popular_products(store, days, TOP_PRODUCTS);
        if ranked.is_empty() {
            out.push_str("  no sales\n");
        }
        for (rank, (product_id, qty)) in ranked.iter().enumerate() {
            // Deleted products stay in old orders; show them by id.
            let (name, unit_qty) = store.product(*product_id).map_or_else(
                || (format!("product #{product_id}"), qty.normalize().to_string()),
                |p| (p.name.clone(), format::quantity(*qty, p.unit)),
            );
            out.push_str(&format!("  {}. {name} — {unit_qty}\n", rank + 1));
        }
    }

    out
}

fn customer_label(store: &JsonStore, user: UserId) -> String {
    store
        .user(user)
        .and_then(|u| u.username.clone())
        .map_or_else(|| format!("user #{user}"), |name| format!("@{name}"))
}
