//! Telegram bot client - long polling dispatcher.

use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;
use teloxide::{
    dispatching::{Dispatcher, UpdateFilterExt},
    dptree,
    error_handlers::{ErrorHandler, LoggingErrorHandler},
    prelude::*,
    types::{AllowedUpdate, BotCommand, Update},
    update_listeners::Polling,
    ApiError, RequestError,
};

use crate::config::{Persona, Settings};
use crate::error::Error;
use crate::session::spawn_sweeper;

use super::router::Router;
use super::transport::TelegramTransport;

/// Logs polling failures. A conflicting `getUpdates` from another instance is only a warning.
struct PollingErrorHandler;

impl ErrorHandler<RequestError> for PollingErrorHandler {
    fn handle_error(self: Arc<Self>, error: RequestError) -> BoxFuture<'static, ()> {
        match &error {
            RequestError::Api(ApiError::TerminatedByOtherGetUpdates) => {
                tracing::warn!("Polling conflict (409): another bot instance is running");
            }
            _ => tracing::error!("Polling error: {}", error),
        }
        Box::pin(async {})
    }
}

fn bot_commands(persona: Persona) -> Vec<BotCommand> {
    let mut commands = vec![
        BotCommand::new("start", "Botu başlat"),
        BotCommand::new("help", "Yardım bilgisi"),
        BotCommand::new("about", "Bot hakkında bilgi"),
    ];
    match persona {
        Persona::Partners => commands.extend([
            BotCommand::new("howitworks", "Nasıl çalışır"),
            BotCommand::new("partners", "Örnek iş ortakları"),
            BotCommand::new("onboard", "Şirket profilini oluştur"),
        ]),
        Persona::Weather => commands.extend([
            BotCommand::new("weather", "Güncel hava durumu"),
            BotCommand::new("forecast", "5 günlük tahmin"),
        ]),
    }
    commands.extend([
        BotCommand::new("gemini", "Gemini AI'ya soru sor"),
        BotCommand::new("clear", "Sohbet geçmişini temizle"),
    ]);
    commands
}

/// Run the bot until ctrl-c.
pub async fn run_bot(settings: &Settings) -> Result<(), Error> {
    tracing::info!("Starting Telegram bot ({} persona)...", settings.persona);

    let token = settings.require_bot_token()?;
    settings.warn_missing_optional();

    let bot = Bot::new(token);
    let me = bot.get_me().await?;
    tracing::info!("Connected to Telegram as @{}", me.username());

    if let Err(e) = bot.set_my_commands(bot_commands(settings.persona)).await {
        tracing::warn!("Failed to set commands: {}", e);
    }

    let transport = Arc::new(TelegramTransport::new(bot.clone()));
    let router = Arc::new(Router::from_settings(settings, transport)?);

    let sweeper = spawn_sweeper(
        router.memory(),
        Duration::from_secs(settings.sessions.sweep_interval_secs),
        Duration::from_secs(settings.sessions.idle_ttl_secs),
    );

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(message_handler))
        .branch(Update::filter_callback_query().endpoint(callback_handler));

    let listener = Polling::builder(bot.clone())
        .timeout(Duration::from_secs(u64::from(settings.telegram.poll_timeout_secs)))
        .allowed_updates(vec![AllowedUpdate::Message, AllowedUpdate::CallbackQuery])
        .delete_webhook()
        .await
        .build();

    tracing::info!("Bot is running. Press Ctrl-C to stop.");

    let mut dispatcher = Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![router])
        .default_handler(|upd| async move {
            tracing::debug!("Unhandled update: {:?}", upd.id);
        })
        .error_handler(LoggingErrorHandler::with_custom_text(
            "Error in update handler",
        ))
        .enable_ctrlc_handler()
        .build();

    dispatcher
        .dispatch_with_listener(listener, Arc::new(PollingErrorHandler))
        .await;

    sweeper.abort();
    tracing::info!("Bot stopped");
    Ok(())
}

async fn message_handler(msg: Message, router: Arc<Router>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        tracing::debug!("Skipping non-text message in chat {}", msg.chat.id);
        return Ok(());
    };

    tracing::info!("Message from chat {}: {:.30}", msg.chat.id, text);
    router.handle_text(msg.chat.id.0, text).await;
    Ok(())
}

async fn callback_handler(query: CallbackQuery, router: Arc<Router>) -> ResponseResult<()> {
    let chat_id = query.message.as_ref().map(|m| m.chat().id.0);
    tracing::info!("Callback query from {}: {:?}", query.from.id, query.data);
    router
        .handle_callback(chat_id, &query.id, query.data.as_deref())
        .await;
    Ok(())
}
