//! SECT: Supplier Engagement Control Tower
//!
//! Tracks supplier engagement for IMDS material-data submissions and PCF
//! carbon-footprint declarations. The library holds the SQLite store, the
//! HTTP API, the supplier portal and the chat assistant; the `sect` binary
//! drives them from the command line.

pub mod chat;
pub mod cli;
pub mod core;
pub mod entities;
pub mod server;
