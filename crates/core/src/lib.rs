//! Wildenflower Core - Shared types library.
//!
//! This crate provides common types used across all Wildenflower components:
//! - `storefront` - Storefront API client and cart session engine
//! - `cli` - Command-line driver for the cart session
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype GIDs, durable snapshots, and prices

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
