//! Core types for Wildenflower.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod price;
pub mod snapshot;

pub use id::*;
pub use price::{CurrencyCode, Price, PriceError};
pub use snapshot::{CartLineSnapshot, FavoriteSnapshot};
