//! Orders: the admin list with filter/sort/pagination, and the order
//! detail screen shared by admins and the order's owner.

use tracing::{instrument, warn};

use greengrocer_core::{OrderId, OrderStatus};

use crate::engine::{Bot, Ctx};
use crate::error::Result;
use crate::format;
use crate::keyboards;
use crate::orders_view::{OrderFilter, OrderSortKey, OrdersQuery};
use crate::session::{BotState, keys};
use crate::store::StoreError;
use crate::transport::ChatTransport;

impl<T: ChatTransport> Bot<T> {
    fn orders_query(&self, ctx: Ctx) -> OrdersQuery {
        self.sessions
            .get(ctx.key, keys::ORDERS_VIEW)
            .unwrap_or_default()
    }

    /// Show the admin orders list with this session's view settings.
    #[instrument(skip(self))]
    pub(crate) fn on_orders(&mut self, ctx: Ctx) -> Result<()> {
        let query = self.orders_query(ctx);
        self.render_orders(ctx, query)
    }

    fn render_orders(&mut self, ctx: Ctx, mut query: OrdersQuery) -> Result<()> {
        let (text, keyboard) = {
            let page = query.apply(self.store.orders());
            let text = if page.total_orders == 0 {
                "📦 No orders match this view.".to_owned()
            } else {
                format!("📦 Orders ({} total):", page.total_orders)
            };
            let keyboard =
                keyboards::orders_list(&page.orders, page.page, page.total_pages, &query);
            (text, keyboard)
        };
        // `apply` clamped the page; persist the settled view.
        self.sessions.put(ctx.key, keys::ORDERS_VIEW, &query);
        self.sessions.set_state(ctx.key, BotState::OrdersList);
        self.show(ctx, &text, Some(&keyboard))
    }

    /// Filter button pressed.
    pub(crate) fn on_order_filter(&mut self, ctx: Ctx, filter: OrderFilter) -> Result<()> {
        let mut query = self.orders_query(ctx);
        if !query.set_filter(filter) {
            // Already active; the screen wouldn't change.
            return Ok(());
        }
        self.render_orders(ctx, query)
    }

    /// Sort button pressed.
    pub(crate) fn on_order_sort(&mut self, ctx: Ctx, key: OrderSortKey) -> Result<()> {
        let mut query = self.orders_query(ctx);
        query.select_sort(key);
        self.render_orders(ctx, query)
    }

    /// Previous-page arrow.
    pub(crate) fn on_page_prev(&mut self, ctx: Ctx) -> Result<()> {
        let mut query = self.orders_query(ctx);
        query.prev_page();
        self.render_orders(ctx, query)
    }

    /// Next-page arrow.
    pub(crate) fn on_page_next(&mut self, ctx: Ctx) -> Result<()> {
        let mut query = self.orders_query(ctx);
        let total_pages = query.apply(self.store.orders()).total_pages;
        query.next_page(total_pages);
        self.render_orders(ctx, query)
    }

    /// Page-size button pressed.
    pub(crate) fn on_page_size(&mut self, ctx: Ctx, size: usize) -> Result<()> {
        let mut query = self.orders_query(ctx);
        query.set_page_size(size);
        self.render_orders(ctx, query)
    }

    /// Open one order's detail screen.
    ///
    /// Admins see every order with status controls; customers only their
    /// own, read-only.
    #[instrument(skip(self))]
    pub(crate) fn on_view_order(&mut self, ctx: Ctx, id: OrderId) -> Result<()> {
        let admin = self.is_admin(ctx.user);
        let owner = self
            .store
            .order(id)
            .is_some_and(|order| order.user_id == ctx.user);
        if !admin && !owner {
            warn!(user = %ctx.user, order = %id, "order access denied");
            return self.send(ctx, "That order isn't yours to see.", None);
        }
        self.remember_order_return(ctx, admin && self.sessions.state(ctx.key) == BotState::OrdersList);
        self.render_order_detail(ctx, id, admin)
    }

    fn render_order_detail(&mut self, ctx: Ctx, id: OrderId, admin: bool) -> Result<()> {
        let Some(order) = self.store.order(id) else {
            return self.send(ctx, "That order no longer exists.", None);
        };
        let summary = format::summarize(&self.store, &order.items);
        let mut text = format!(
            "{}\nStatus: {}\n",
            format::order_header(order.id, order.created_at, &order.phone, &order.address),
            order.status.label()
        );
        if let Some(slot) = &order.delivery_time {
            text.push_str(&format!("Delivery: {slot}\n"));
        }
        text.push('\n');
        text.push_str(&summary.to_text());

        let keyboard = if admin {
            keyboards::order_detail_admin(order)
        } else {
            keyboards::back_only()
        };
        self.sessions.set_state(ctx.key, BotState::OrderDetail);
        self.show(ctx, &text, Some(&keyboard))
    }

    /// Mark an order completed and redraw its detail screen.
    #[instrument(skip(self))]
    pub(crate) fn on_complete_order(&mut self, ctx: Ctx, id: OrderId) -> Result<()> {
        self.set_order_status(ctx, id, OrderStatus::Completed)
    }

    /// Put a completed order back into the open pile.
    #[instrument(skip(self))]
    pub(crate) fn on_reopen_order(&mut self, ctx: Ctx, id: OrderId) -> Result<()> {
        self.set_order_status(ctx, id, OrderStatus::New)
    }

    fn set_order_status(&mut self, ctx: Ctx, id: OrderId, status: OrderStatus) -> Result<()> {
        match self.store.update_order_status(id, status) {
            Ok(()) => self.render_order_detail(ctx, id, true),
            Err(StoreError::OrderNotFound(_)) => {
                self.send(ctx, "That order no longer exists.", None)?;
                self.on_orders(Ctx { edit: None, ..ctx })
            }
            Err(other) => Err(other.into()),
        }
    }

    /// Back from an order detail: the admin list if that's where we came
    /// from, the storefront otherwise.
    pub(crate) fn back_from_order_detail(&mut self, ctx: Ctx) -> Result<()> {
        let from_admin_list: bool = self
            .sessions
            .take(ctx.key, keys::ORDER_RETURN_STATE)
            .unwrap_or(false);
        if from_admin_list && self.is_admin(ctx.user) {
            self.on_orders(ctx)
        } else {
            self.show_customer_menu(ctx)
        }
    }
}
