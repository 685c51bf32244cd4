//! jot-core library.
//!
//! Durable task records with live snapshot subscriptions, plus a one-shot
//! profile fetch modelled as a tri-state view value.
//!
//! # Layout
//!
//! - [`store`]: the SQLite-backed record store and its subscriber set.
//! - [`service`]: add/toggle intents translated into store writes.
//! - [`profile`]: the network collaborator and the tri-state fetcher.
//! - [`view`]: presentation-facing models bound to a cancellable scope.
//! - [`context`]: the application context built once at startup.
//!
//! # Conventions
//!
//! - **Errors**: storage and configuration paths return `anyhow::Result`;
//!   network faults are the typed [`profile::FetchError`].
//! - **Logging**: use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod model;
pub mod profile;
pub mod service;
pub mod store;
pub mod view;
