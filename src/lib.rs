//! printshop-server — order fulfillment and payment reconciliation
//!
//! Long-running service behind a print-shop storefront:
//! - Server-side session carts with server-computed pricing
//! - Hosted gateway checkout sessions (metadata only, no binary payloads)
//! - All-or-nothing order creation, exactly once per paid session
//! - Webhook-driven payment/order status reconciliation
//! - Binary attachments (print files, merch designs) in a filesystem blob store
//!
//! # Module structure
//!
//! ```text
//! src/
//! ├── config.rs      # Environment configuration
//! ├── state.rs       # Shared application state
//! ├── error.rs       # AppError / AppResult
//! ├── auth.rs        # JWT session tokens, auth middleware
//! ├── models.rs      # Domain types (cart items, statuses, options)
//! ├── pricing.rs     # Pricing engine
//! ├── cart.rs        # Session cart store
//! ├── checkout.rs    # Checkout bridge to the gateway
//! ├── orders.rs      # Order finalization
//! ├── reconcile.rs   # Webhook reconciliation
//! ├── attachments.rs # Order item -> blob resolution
//! ├── gateway/       # Gateway client, events, webhook signatures
//! ├── blob/          # Filesystem blob store
//! ├── db/            # SQLite pool, migrations, queries
//! └── api/           # HTTP routes and handlers
//! ```

pub mod api;
pub mod attachments;
pub mod auth;
pub mod blob;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod db;
pub mod error;
pub mod gateway;
pub mod models;
pub mod orders;
pub mod pricing;
pub mod reconcile;
pub mod state;
pub mod util;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use state::AppState;
