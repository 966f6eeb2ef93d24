//! Core types and trait definitions for the Coffer record store.
//!
//! This crate is deliberately free of HTTP and database dependencies. It
//! defines the record contract, the rights and scope model, the
//! [`store::DocumentStore`] abstraction that backends implement, and the
//! generic [`engine::Engine`] that runs scoped CRUD on top of it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod engine;
pub mod error;
pub mod filter;
pub mod id;
pub mod record;
pub mod rights;
pub mod scope;
pub mod store;

pub use error::{Error, Result};
