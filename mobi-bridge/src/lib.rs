//! mobi-bridge library crate.
//!
//! A Telegram bot that converts FB2/TXT books to MOBI with external tools
//! and serves the results over plain HTTP.
//!
//! - [`registry`]: slug → artifact map shared by the pipeline and the HTTP side.
//! - [`pipeline`]: per-document job state machine with failure cleanup.
//! - [`tools`]: downloader/converter process invocations.
//! - [`api`]: `GET /{slug}` retrieval service.
//! - [`telegram`]: Bot API client and update dispatcher.

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod registry;
pub mod telegram;
pub mod tools;
pub mod utils;

pub use error::{Error, Result};
