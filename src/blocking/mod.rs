//! Blocking flavour of the storage [`Client`](client::Client).

pub mod client;

pub use client::Client;
