//! JSON-file persistence.
//!
//! All catalogue, user, and order data lives in four JSON files under the
//! data directory. The store keeps everything in memory and rewrites the
//! affected file after each mutation; there is exactly one writer (the
//! event loop), so `max(id) + 1` assignment is safe.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use greengrocer_core::{
    Category, CategoryId, Order, OrderId, OrderStatus, PhoneNumber, Product, ProductId,
    ProductUpdate, User, UserId,
};

const CATEGORIES_FILE: &str = "categories.json";
const PRODUCTS_FILE: &str = "products.json";
const USERS_FILE: &str = "users.json";
const ORDERS_FILE: &str = "orders.json";

const ALL_FILES: [&str; 4] = [CATEGORIES_FILE, PRODUCTS_FILE, USERS_FILE, ORDERS_FILE];

/// Errors from the persistence layer.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// Filesystem failure.
    #[error("store I/O error: {0}")]
    Io(#[from] io::Error),
    /// A data file exists but does not parse.
    #[error("corrupt data file {file}: {source}")]
    Corrupt {
        /// Offending file name.
        file: String,
        /// Parse failure.
        source: serde_json::Error,
    },
    /// Referenced category does not exist.
    #[error("category {0} not found")]
    CategoryNotFound(CategoryId),
    /// Referenced product does not exist.
    #[error("product {0} not found")]
    ProductNotFound(ProductId),
    /// Referenced order does not exist.
    #[error("order {0} not found")]
    OrderNotFound(OrderId),
    /// Checkout attempted with an empty cart.
    #[error("cart is empty")]
    EmptyCart,
    /// Requested backup directory does not exist.
    #[error("backup {0} not found")]
    BackupNotFound(String),
}

/// In-memory data with JSON-file durability.
#[derive(Debug)]
pub struct JsonStore {
    data_dir: PathBuf,
    backup_dir: PathBuf,
    categories: Vec<Category>,
    products: Vec<Product>,
    users: Vec<User>,
    orders: Vec<Order>,
}

impl JsonStore {
    /// Open a store over a data directory, loading whatever files exist.
    ///
    /// Missing files start their collections empty; missing directories
    /// are created.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` on filesystem failures or
    /// `StoreError::Corrupt` when a file exists but does not parse.
    pub fn open(data_dir: &Path, backup_dir: &Path) -> Result<Self, StoreError> {
        fs::create_dir_all(data_dir)?;
        fs::create_dir_all(backup_dir)?;

        let store = Self {
            categories: load_collection(data_dir, CATEGORIES_FILE)?,
            products: load_collection(data_dir, PRODUCTS_FILE)?,
            users: load_collection(data_dir, USERS_FILE)?,
            orders: load_collection(data_dir, ORDERS_FILE)?,
            data_dir: data_dir.to_path_buf(),
            backup_dir: backup_dir.to_path_buf(),
        };
        debug!(
            categories = store.categories.len(),
            products = store.products.len(),
            users = store.users.len(),
            orders = store.orders.len(),
            "store opened"
        );
        Ok(store)
    }

    /// Write all four collections to disk.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` when any file fails to write.
    pub fn save_all(&self) -> Result<(), StoreError> {
        self.save_categories()?;
        self.save_products()?;
        self.save_users()?;
        self.save_orders()?;
        Ok(())
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// All categories.
    #[must_use]
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Look up a category.
    #[must_use]
    pub fn category(&self, id: CategoryId) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    /// Add a category and persist.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` when persisting fails.
    pub fn add_category(&mut self, name: impl Into<String>) -> Result<CategoryId, StoreError> {
        let id = CategoryId::new(next_id(self.categories.iter().map(|c| c.id.as_i64())));
        self.categories.push(Category {
            id,
            name: name.into(),
        });
        self.save_categories()?;
        Ok(id)
    }

    /// Rename a category and persist.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::CategoryNotFound` for unknown IDs.
    pub fn rename_category(
        &mut self,
        id: CategoryId,
        name: impl Into<String>,
    ) -> Result<(), StoreError> {
        let category = self
            .categories
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(StoreError::CategoryNotFound(id))?;
        category.name = name.into();
        self.save_categories()
    }

    /// Delete a category and every product in it, then persist.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::CategoryNotFound` for unknown IDs.
    pub fn delete_category(&mut self, id: CategoryId) -> Result<(), StoreError> {
        if self.category(id).is_none() {
            return Err(StoreError::CategoryNotFound(id));
        }
        let before = self.products.len();
        self.products.retain(|p| p.category_id != id);
        self.categories.retain(|c| c.id != id);
        info!(
            category = %id,
            cascaded = before - self.products.len(),
            "category deleted"
        );
        self.save_categories()?;
        self.save_products()
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Look up a product.
    #[must_use]
    pub fn product(&self, id: ProductId) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    /// Products belonging to a category, alphabetically by name.
    #[must_use]
    pub fn products_in(&self, category: CategoryId) -> Vec<&Product> {
        let mut products: Vec<&Product> = self
            .products
            .iter()
            .filter(|p| p.category_id == category)
            .collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        products
    }

    /// Add a product and persist.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::CategoryNotFound` when the owning category
    /// does not exist.
    pub fn add_product(&mut self, mut product: Product) -> Result<ProductId, StoreError> {
        if self.category(product.category_id).is_none() {
            return Err(StoreError::CategoryNotFound(product.category_id));
        }
        let id = ProductId::new(next_id(self.products.iter().map(|p| p.id.as_i64())));
        product.id = id;
        self.products.push(product);
        self.save_products()?;
        Ok(id)
    }

    /// Apply a patch to a product and persist.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::ProductNotFound` for unknown IDs.
    pub fn update_product(&mut self, id: ProductId, update: ProductUpdate) -> Result<(), StoreError> {
        let product = self
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(StoreError::ProductNotFound(id))?;
        update.apply(product);
        self.save_products()
    }

    /// Delete a product and persist.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::ProductNotFound` for unknown IDs.
    pub fn delete_product(&mut self, id: ProductId) -> Result<(), StoreError> {
        if self.product(id).is_none() {
            return Err(StoreError::ProductNotFound(id));
        }
        self.products.retain(|p| p.id != id);
        self.save_products()
    }

    /// Case-insensitive substring search over available products,
    /// alphabetically by name.
    ///
    /// A blank query matches nothing.
    #[must_use]
    pub fn search_products(&self, query: &str) -> Vec<&Product> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        let mut hits: Vec<&Product> = self
            .products
            .iter()
            .filter(|p| p.available && p.name.to_lowercase().contains(&needle))
            .collect();
        hits.sort_by(|a, b| a.name.cmp(&b.name));
        hits
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Look up a user.
    #[must_use]
    pub fn user(&self, id: UserId) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    /// Get-or-create a user record for mutation.
    ///
    /// New records start with an empty cart and no favorites; callers
    /// must persist through [`Self::save_users`] after mutating.
    pub fn user_mut(&mut self, id: UserId) -> &mut User {
        if let Some(pos) = self.users.iter().position(|u| u.id == id) {
            #[allow(clippy::indexing_slicing)] // position() bounds the index
            &mut self.users[pos]
        } else {
            self.users.push(User::new(id));
            #[allow(clippy::unwrap_used)] // just pushed
            self.users.last_mut().unwrap()
        }
    }

    /// Persist the users collection.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` when the file fails to write.
    pub fn save_users(&self) -> Result<(), StoreError> {
        save_collection(&self.data_dir, USERS_FILE, &self.users)
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// All orders.
    #[must_use]
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// Look up an order.
    #[must_use]
    pub fn order(&self, id: OrderId) -> Option<&Order> {
        self.orders.iter().find(|o| o.id == id)
    }

    /// Orders placed by one user.
    #[must_use]
    pub fn orders_for(&self, user: UserId) -> Vec<&Order> {
        self.orders.iter().filter(|o| o.user_id == user).collect()
    }

    /// Create an order from the user's cart.
    ///
    /// Snapshots the cart lines, computes the total from current prices
    /// (lines whose product has since vanished contribute nothing), clears
    /// the cart, and persists both orders and users.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::EmptyCart` when there is nothing to order.
    pub fn create_order(
        &mut self,
        user_id: UserId,
        phone: PhoneNumber,
        address: String,
        delivery_time: Option<String>,
    ) -> Result<OrderId, StoreError> {
        let items = self.user(user_id).map(|u| u.cart.clone()).unwrap_or_default();
        if items.is_empty() {
            return Err(StoreError::EmptyCart);
        }

        let total: Decimal = items
            .iter()
            .filter_map(|line| self.product(line.product_id).map(|p| p.price * line.quantity))
            .sum();

        let id = OrderId::new(next_id(self.orders.iter().map(|o| o.id.as_i64())));
        self.orders.push(Order {
            id,
            user_id,
            items,
            status: OrderStatus::New,
            created_at: Utc::now(),
            phone,
            address,
            delivery_time,
            total,
        });
        self.user_mut(user_id).clear_cart();

        self.save_orders()?;
        self.save_users()?;
        info!(order = %id, user = %user_id, %total, "order created");
        Ok(id)
    }

    /// Change an order's status and persist.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::OrderNotFound` for unknown IDs.
    pub fn update_order_status(
        &mut self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<(), StoreError> {
        let order = self
            .orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(StoreError::OrderNotFound(id))?;
        order.status = status;
        self.save_orders()
    }

    // =========================================================================
    // Backups
    // =========================================================================

    /// Write the current files into a timestamped backup directory.
    ///
    /// Returns the backup name.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` when copying fails.
    pub fn backup(&self) -> Result<String, StoreError> {
        let name = Utc::now().format("%Y%m%d_%H%M%S").to_string();
        let target = self.backup_dir.join(&name);
        fs::create_dir_all(&target)?;
        for file in ALL_FILES {
            let source = self.data_dir.join(file);
            if source.exists() {
                fs::copy(&source, target.join(file))?;
            }
        }
        info!(backup = %name, "backup written");
        Ok(name)
    }

    /// Names of available backups, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` when the backup directory is unreadable.
    pub fn list_backups(&self) -> Result<Vec<String>, StoreError> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.backup_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Replace all collections with a backup's contents and persist them
    /// as current data.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::BackupNotFound` for unknown names, or
    /// `StoreError::Corrupt` when a backup file does not parse.
    pub fn restore(&mut self, name: &str) -> Result<(), StoreError> {
        let source = self.backup_dir.join(name);
        if !source.is_dir() {
            return Err(StoreError::BackupNotFound(name.to_owned()));
        }
        self.categories = load_collection(&source, CATEGORIES_FILE)?;
        self.products = load_collection(&source, PRODUCTS_FILE)?;
        self.users = load_collection(&source, USERS_FILE)?;
        self.orders = load_collection(&source, ORDERS_FILE)?;
        self.save_all()?;
        info!(backup = %name, "backup restored");
        Ok(())
    }

    // =========================================================================
    // Persistence plumbing
    // =========================================================================

    fn save_categories(&self) -> Result<(), StoreError> {
        save_collection(&self.data_dir, CATEGORIES_FILE, &self.categories)
    }

    fn save_products(&self) -> Result<(), StoreError> {
        save_collection(&self.data_dir, PRODUCTS_FILE, &self.products)
    }

    fn save_orders(&self) -> Result<(), StoreError> {
        save_collection(&self.data_dir, ORDERS_FILE, &self.orders)
    }
}

fn next_id(existing: impl Iterator<Item = i64>) -> i64 {
    existing.max().unwrap_or(0) + 1
}

fn load_collection<T: DeserializeOwned>(dir: &Path, file: &str) -> Result<Vec<T>, StoreError> {
    let path = dir.join(file);
    if !path.exists() {
        return Ok(Vec::new());
    }
    let raw = fs::read_to_string(&path)?;
    serde_json::from_str(&raw).map_err(|source| {
        warn!(%file, "data file failed to parse");
        StoreError::Corrupt {
            file: file.to_owned(),
            source,
        }
    })
}

fn save_collection<T: Serialize>(dir: &Path, file: &str, items: &[T]) -> Result<(), StoreError> {
    let path = dir.join(file);
    let json = serde_json::to_string_pretty(items).map_err(|source| StoreError::Corrupt {
        file: file.to_owned(),
        source,
    })?;
    fs::write(&path, json)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use greengrocer_core::Unit;
    use tempfile::TempDir;

    struct Fixture {
        store: JsonStore,
        _dirs: (TempDir, TempDir),
    }

    fn fixture() -> Fixture {
        let data = TempDir::new().unwrap();
        let backups = TempDir::new().unwrap();
        let store = JsonStore::open(data.path(), backups.path()).unwrap();
        Fixture {
            store,
            _dirs: (data, backups),
        }
    }

    fn draft_product(category: CategoryId, name: &str, price: Decimal) -> Product {
        Product {
            id: ProductId::new(0),
            name: name.to_owned(),
            category_id: category,
            price,
            unit: Unit::Kg,
            image: None,
            available: true,
        }
    }

    #[test]
    fn test_open_empty_directory() {
        let f = fixture();
        assert!(f.store.categories().is_empty());
        assert!(f.store.orders().is_empty());
    }

    #[test]
    fn test_ids_are_max_plus_one() {
        let mut f = fixture();
        let a = f.store.add_category("Vegetables").unwrap();
        let b = f.store.add_category("Fruit").unwrap();
        assert_eq!(a.as_i64(), 1);
        assert_eq!(b.as_i64(), 2);
        f.store.delete_category(a).unwrap();
        let c = f.store.add_category("Herbs").unwrap();
        assert_eq!(c.as_i64(), 3);
    }

    #[test]
    fn test_reload_round_trip() {
        let data = TempDir::new().unwrap();
        let backups = TempDir::new().unwrap();
        {
            let mut store = JsonStore::open(data.path(), backups.path()).unwrap();
            let category = store.add_category("Vegetables").unwrap();
            store
                .add_product(draft_product(category, "Carrots", Decimal::new(4550, 2)))
                .unwrap();
        }
        let store = JsonStore::open(data.path(), backups.path()).unwrap();
        assert_eq!(store.categories().len(), 1);
        let product = store.product(ProductId::new(1)).unwrap();
        assert_eq!(product.price, Decimal::new(4550, 2));
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let data = TempDir::new().unwrap();
        let backups = TempDir::new().unwrap();
        fs::write(data.path().join(CATEGORIES_FILE), "{not json").unwrap();
        let err = JsonStore::open(data.path(), backups.path()).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { file, .. } if file == CATEGORIES_FILE));
    }

    #[test]
    fn test_category_delete_cascades_products() {
        let mut f = fixture();
        let keep = f.store.add_category("Fruit").unwrap();
        let drop = f.store.add_category("Vegetables").unwrap();
        f.store
            .add_product(draft_product(keep, "Apples", Decimal::ONE))
            .unwrap();
        let doomed = f
            .store
            .add_product(draft_product(drop, "Cabbage", Decimal::ONE))
            .unwrap();
        f.store.delete_category(drop).unwrap();
        assert!(f.store.product(doomed).is_none());
        assert_eq!(f.store.products_in(keep).len(), 1);
    }

    #[test]
    fn test_add_product_requires_category() {
        let mut f = fixture();
        let err = f
            .store
            .add_product(draft_product(CategoryId::new(99), "Ghost", Decimal::ONE))
            .unwrap_err();
        assert!(matches!(err, StoreError::CategoryNotFound(_)));
    }

    #[test]
    fn test_product_listings_are_alphabetical() {
        let mut f = fixture();
        let category = f.store.add_category("Fruit").unwrap();
        f.store
            .add_product(draft_product(category, "Bananas", Decimal::ONE))
            .unwrap();
        f.store
            .add_product(draft_product(category, "Apples", Decimal::ONE))
            .unwrap();
        f.store
            .add_product(draft_product(category, "Apricots", Decimal::ONE))
            .unwrap();

        let names: Vec<&str> = f
            .store
            .products_in(category)
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, vec!["Apples", "Apricots", "Bananas"]);

        let hits: Vec<&str> = f
            .store
            .search_products("a")
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(hits, vec!["Apples", "Apricots", "Bananas"]);
    }

    #[test]
    fn test_search_is_case_insensitive_and_skips_unavailable() {
        let mut f = fixture();
        let category = f.store.add_category("Vegetables").unwrap();
        let visible = f
            .store
            .add_product(draft_product(category, "Red Tomatoes", Decimal::ONE))
            .unwrap();
        let hidden = f
            .store
            .add_product(draft_product(category, "Green Tomatoes", Decimal::ONE))
            .unwrap();
        f.store
            .update_product(
                hidden,
                ProductUpdate {
                    available: Some(false),
                    ..ProductUpdate::default()
                },
            )
            .unwrap();

        let hits = f.store.search_products("tomato");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits.first().unwrap().id, visible);
        assert!(f.store.search_products("   ").is_empty());
    }

    #[test]
    fn test_user_mut_creates_once() {
        let mut f = fixture();
        f.store.user_mut(UserId::new(5)).username = Some("alice".to_owned());
        f.store
            .user_mut(UserId::new(5))
            .add_to_cart(ProductId::new(1), Decimal::ONE);
        assert_eq!(f.store.user(UserId::new(5)).unwrap().cart.len(), 1);
        assert_eq!(
            f.store.user(UserId::new(5)).unwrap().username.as_deref(),
            Some("alice")
        );
    }

    #[test]
    fn test_create_order_snapshots_and_clears_cart() {
        let mut f = fixture();
        let category = f.store.add_category("Fruit").unwrap();
        let apples = f
            .store
            .add_product(draft_product(category, "Apples", Decimal::new(10000, 2)))
            .unwrap();
        let user = UserId::new(7);
        f.store.user_mut(user).add_to_cart(apples, Decimal::new(5, 1));

        let phone = PhoneNumber::parse("9123456789").unwrap();
        let id = f
            .store
            .create_order(user, phone, "12 Market Lane".to_owned(), None)
            .unwrap();

        let order = f.store.order(id).unwrap();
        assert_eq!(order.total, Decimal::new(5000, 2));
        assert_eq!(order.status, OrderStatus::New);
        assert!(f.store.user(user).unwrap().cart_is_empty());
    }

    #[test]
    fn test_create_order_rejects_empty_cart() {
        let mut f = fixture();
        let phone = PhoneNumber::parse("9123456789").unwrap();
        let err = f
            .store
            .create_order(UserId::new(1), phone, "addr".to_owned(), None)
            .unwrap_err();
        assert!(matches!(err, StoreError::EmptyCart));
    }

    #[test]
    fn test_order_total_skips_missing_products() {
        let mut f = fixture();
        let category = f.store.add_category("Fruit").unwrap();
        let apples = f
            .store
            .add_product(draft_product(category, "Apples", Decimal::new(100, 0)))
            .unwrap();
        let pears = f
            .store
            .add_product(draft_product(category, "Pears", Decimal::new(50, 0)))
            .unwrap();
        let user = UserId::new(7);
        f.store.user_mut(user).add_to_cart(apples, Decimal::ONE);
        f.store.user_mut(user).add_to_cart(pears, Decimal::ONE);
        f.store.delete_product(pears).unwrap();

        let phone = PhoneNumber::parse("9123456789").unwrap();
        let id = f
            .store
            .create_order(user, phone, "addr".to_owned(), None)
            .unwrap();
        assert_eq!(f.store.order(id).unwrap().total, Decimal::new(100, 0));
        // The vanished line is still part of the snapshot
        assert_eq!(f.store.order(id).unwrap().items.len(), 2);
    }

    #[test]
    fn test_backup_and_restore() {
        let mut f = fixture();
        let category = f.store.add_category("Fruit").unwrap();
        let backup = f.store.backup().unwrap();
        f.store.delete_category(category).unwrap();
        assert!(f.store.categories().is_empty());

        f.store.restore(&backup).unwrap();
        assert_eq!(f.store.categories().len(), 1);

        let listed = f.store.list_backups().unwrap();
        assert_eq!(listed, vec![backup]);
    }

    #[test]
    fn test_restore_unknown_backup() {
        let mut f = fixture();
        let err = f.store.restore("20200101_000000").unwrap_err();
        assert!(matches!(err, StoreError::BackupNotFound(_)));
    }
}
