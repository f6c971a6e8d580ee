//! Promotion Ledger
//!
//! Promotion codes for the ecommerce admin backend.
//!
//! ## Features
//! - Promotion catalogue management (create, list, edit, delete)
//! - Percentage and fixed-amount discounts
//! - Validity windows, minimum purchase amounts and usage limits
//! - Redemption counted with a single conditional update, so usage limits
//!   hold under concurrent checkouts
//! - Optional NATS events for promotion changes and redemptions

pub mod config;
pub mod error;
pub mod events;
pub mod http;
pub mod promotions;
pub mod telemetry;

pub use error::{LedgerError, Result};
