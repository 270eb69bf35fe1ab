//! Telegram integration.

pub mod client;
pub mod router;
pub mod transport;

pub use client::run_bot;
pub use router::Router;
pub use transport::{NullTransport, Outgoing, TelegramTransport, Transport};
