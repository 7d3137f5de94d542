//! ZaleKart core library
//!
//! Client-side state for the ZaleKart shopping app: the shopper's address
//! book, saved cards, cart pricing and checkout assembly.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod errors;
pub mod events;
pub mod models;
pub mod repositories;
pub mod services;

pub use errors::ServiceError;
pub use services::{
    AddressBook, AddressBookService, Cart, CardWallet, CheckoutService, PricingRules, Wishlist,
};
