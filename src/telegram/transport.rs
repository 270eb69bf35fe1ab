//! Outbound messaging seam between the router and Telegram.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{ChatAction, InlineKeyboardButton, InlineKeyboardMarkup, ParseMode};
use tokio::sync::Mutex;

use crate::error::Result;

/// An inline button: label and callback payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub data: String,
}

impl Button {
    pub fn new(label: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            data: data.into(),
        }
    }
}

/// Operations the router needs from a chat backend.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<()>;

    /// Send text formatted with Telegram HTML.
    async fn send_html(&self, chat_id: i64, html: &str) -> Result<()>;

    /// HTML text with one inline button per row.
    async fn send_buttons(&self, chat_id: i64, html: &str, buttons: &[Button]) -> Result<()>;

    async fn send_typing(&self, chat_id: i64) -> Result<()>;

    async fn answer_callback(&self, query_id: &str) -> Result<()>;
}

/// Telegram Bot API transport.
#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<()> {
        self.bot.send_message(ChatId(chat_id), text).await?;
        Ok(())
    }

    async fn send_html(&self, chat_id: i64, html: &str) -> Result<()> {
        self.bot
            .send_message(ChatId(chat_id), html)
            .parse_mode(ParseMode::Html)
            .await?;
        Ok(())
    }

    async fn send_buttons(&self, chat_id: i64, html: &str, buttons: &[Button]) -> Result<()> {
        let rows: Vec<Vec<InlineKeyboardButton>> = buttons
            .iter()
            .map(|b| vec![InlineKeyboardButton::callback(b.label.clone(), b.data.clone())])
            .collect();
        self.bot
            .send_message(ChatId(chat_id), html)
            .parse_mode(ParseMode::Html)
            .reply_markup(InlineKeyboardMarkup::new(rows))
            .await?;
        Ok(())
    }

    async fn send_typing(&self, chat_id: i64) -> Result<()> {
        self.bot
            .send_chat_action(ChatId(chat_id), ChatAction::Typing)
            .await?;
        Ok(())
    }

    async fn answer_callback(&self, query_id: &str) -> Result<()> {
        self.bot.answer_callback_query(query_id).await?;
        Ok(())
    }
}

/// Something a [`NullTransport`] was asked to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outgoing {
    Text { chat_id: i64, text: String },
    Html { chat_id: i64, html: String },
    Buttons { chat_id: i64, html: String, buttons: Vec<Button> },
    Typing { chat_id: i64 },
    CallbackAnswer { query_id: String },
}

impl Outgoing {
    /// The visible text, if this is a message.
    pub fn text(&self) -> Option<&str> {
        match self {
            Outgoing::Text { text, .. } => Some(text),
            Outgoing::Html { html, .. } | Outgoing::Buttons { html, .. } => Some(html),
            Outgoing::Typing { .. } | Outgoing::CallbackAnswer { .. } => None,
        }
    }
}

/// Records everything sent instead of talking to Telegram.
#[derive(Debug, Default)]
pub struct NullTransport {
    outbox: Mutex<Vec<Outgoing>>,
}

impl NullTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<Outgoing> {
        self.outbox.lock().await.clone()
    }

    /// Drain the outbox.
    pub async fn take(&self) -> Vec<Outgoing> {
        std::mem::take(&mut *self.outbox.lock().await)
    }

    /// Text of the most recent message.
    pub async fn last_text(&self) -> Option<String> {
        self.outbox
            .lock()
            .await
            .iter()
            .rev()
            .find_map(|o| o.text().map(str::to_string))
    }

    async fn record(&self, item: Outgoing) -> Result<()> {
        self.outbox.lock().await.push(item);
        Ok(())
    }
}

#[async_trait]
impl Transport for NullTransport {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<()> {
        self.record(Outgoing::Text {
            chat_id,
            text: text.to_string(),
        })
        .await
    }

    async fn send_html(&self, chat_id: i64, html: &str) -> Result<()> {
        self.record(Outgoing::Html {
            chat_id,
            html: html.to_string(),
        })
        .await
    }

    async fn send_buttons(&self, chat_id: i64, html: &str, buttons: &[Button]) -> Result<()> {
        self.record(Outgoing::Buttons {
            chat_id,
            html: html.to_string(),
            buttons: buttons.to_vec(),
        })
        .await
    }

    async fn send_typing(&self, chat_id: i64) -> Result<()> {
        self.record(Outgoing::Typing { chat_id }).await
    }

    async fn answer_callback(&self, query_id: &str) -> Result<()> {
        self.record(Outgoing::CallbackAnswer {
            query_id: query_id.to_string(),
        })
        .await
    }
}
