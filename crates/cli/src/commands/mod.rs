//! Command implementations.
//!
//! Rendering is kept in pure functions so it can be tested without a
//! terminal; [`emit`] is the only place that writes to stdout.

pub mod cart;
pub mod collections;
pub mod favorites;
pub mod products;

#[allow(clippy::print_stdout)]
fn emit(text: &str) {
    println!("{text}");
}
