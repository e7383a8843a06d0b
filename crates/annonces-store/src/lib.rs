//! # annonces-store
//!
//! SQLite-backed persistence for the classifieds catalog.
//!
//! The crate exposes a synchronous [`Database`] handle wrapping a
//! `rusqlite::Connection`.  Typed helpers cover listings (create, update,
//! filtered search), engagement events, the analytics aggregates built on top
//! of them, site settings, user accounts and a demo catalog seeder.  The database is the single
//! writer; counters are only ever bumped with in-place `+ 1` updates.

pub mod accounts;
pub mod analytics;
pub mod database;
pub mod demo;
pub mod events;
pub mod filters;
pub mod listings;
pub mod migrations;
pub mod models;
pub mod settings;

mod codec;
mod error;

pub use database::Database;
pub use demo::DemoSummary;
pub use error::{Result, StoreError};
pub use models::*;
pub use settings::{SettingsCache, SiteSettings};
