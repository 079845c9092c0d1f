//! Wildenflower storefront library.
//!
//! Keeps a persistent Shopify cart in sync across process restarts:
//!
//! - [`cart`] - the cart session: hydration, expiry recovery, mutations with
//!   rollback, and derived projections
//! - [`shopify`] - Storefront API client and domain types
//! - [`storage`] - durable key-value store the session persists into
//! - [`checkout`] - hand-off to Shopify's hosted checkout
//! - [`favorites`] - saved products as display snapshots
//! - [`state`] - wires the above together from [`config`]

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod checkout;
pub mod config;
pub mod favorites;
pub mod shopify;
pub mod state;
pub mod storage;
