//! Core domain logic for the ID Finder bot.
//!
//! This crate is intentionally framework-agnostic. Telegram lives behind the
//! `ChatLookup` port and the boundary decoders in the adapter crate.

pub mod classify;
pub mod config;
pub mod domain;
pub mod entity;
pub mod errors;
pub mod formatting;
pub mod logging;
pub mod moderation;
pub mod origin;
pub mod ports;
pub mod resolve;
pub mod security;

pub use errors::{Error, Result};
