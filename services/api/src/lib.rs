//! services/api/src/lib.rs
//!
//! The interview dashboard service: storage and voice adapters, the stateful
//! stores built on them, and the Axum web layer.

pub mod adapters;
pub mod config;
pub mod error;
pub mod stores;
pub mod web;
