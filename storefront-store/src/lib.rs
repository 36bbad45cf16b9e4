//! Storefront Storage Layer
//!
//! Persistence for the customer aggregate and the catalog.
//!
//! # Architecture
//!
//! - **Repository traits**: Define the storage interface (ports)
//! - **In-memory store**: Fast implementation for testing and local runs
//! - **PostgreSQL store**: Production implementation (feature `postgres`)
//!
//! Every repository method is one atomic write against one document
//! (customer, merchant or product). Nothing spans documents.
//!
//! # Usage
//!
//! ```rust
//! use storefront_store::{MemoryStore, Store};
//! use storefront_domain::{CartItem, Customer};
//! use uuid::Uuid;
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = MemoryStore::new();
//!
//!     let customer = Customer::new("Budi", "budi@example.com", "0812");
//!     store.customers().save(&customer).await.unwrap();
//!
//!     store
//!         .customers()
//!         .push_product_to_cart(customer.id, CartItem::new(Uuid::now_v7(), 2))
//!         .await
//!         .unwrap();
//!
//!     let found = store.customers().find_by_id(customer.id).await.unwrap().unwrap();
//!     println!("Cart items: {}", found.carts.len());
//! }
//! ```

#![warn(clippy::all)]

// Modules
mod error;
mod memory;
#[cfg(feature = "postgres")]
mod postgres;
mod repository;

// Re-exports
pub use error::StoreError;
pub use memory::MemoryStore;
#[cfg(feature = "postgres")]
pub use postgres::PgStore;
pub use repository::{
    CategoryRepository, CustomerRepository, MerchantRepository, ProductRepository, Store,
};
