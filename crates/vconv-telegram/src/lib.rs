//! Messaging platform client.
//!
//! This crate provides:
//! - The `MessagingClient` trait used to edit status messages and fetch attachments
//! - A Telegram Bot API implementation on top of teloxide

pub mod client;
pub mod error;

pub use client::{MessagingClient, TelegramClient, TelegramConfig};
pub use error::{TelegramError, TelegramResult};
