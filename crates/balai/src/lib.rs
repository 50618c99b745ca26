//! `balai` - a village hall website
//!
//! This library provides the public news feed, the citizen complaint form, and
//! the password-protected admin panel, persisted as two flat JSON files.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod logging;
pub mod model;
pub mod slug;
pub mod store;
pub mod views;

pub use config::{AdminCredentials, Config};
pub use error::{Error, Result};
pub use http::{build_router, serve, AppState};
pub use logging::init_logging;
pub use model::{Complaint, NewsItem, Timestamp};
pub use slug::make_slug;
pub use store::{CollectionName, Store, StoreStats};
