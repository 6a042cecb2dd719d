//! Shopfront storefront library.
//!
//! This crate provides the storefront functionality as a library,
//! allowing it to be tested and reused.
//!
//! - [`commerce`] - Shop API gateway, response cache and typed client
//! - [`catalog`] - Filter state and search query construction
//! - [`checkout`] - Checkout step machine and orchestration
//! - [`routes`] - JSON route handlers and the application router

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod checkout;
pub mod commerce;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;
