//! CLI commands for Bunder Bot using clap.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::config::{load_settings, Persona, Settings};
use crate::providers;
use crate::responders::{OpenWeatherClient, WeatherResponder};
use crate::telegram::{self, NullTransport, Outgoing, Router};

/// Bunder Bot - Telegram partner-matching and weather assistant.
#[derive(Parser)]
#[command(name = "bunderbot")]
#[command(version)]
#[command(about = "Bunder Bot - Telegram assistant backed by Gemini", long_about = None)]
pub struct Commands {
    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Override the configured persona (partners, weather)
    #[arg(long, global = true)]
    pub persona: Option<Persona>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the Telegram bot (long polling)
    Run,

    /// Talk to the bot in the terminal without Telegram
    Chat {
        /// Chat id used for the local session
        #[arg(long, default_value_t = 1)]
        chat_id: i64,
    },

    /// Look up the weather for a city
    Weather {
        /// City name
        #[arg(required = true, num_args = 1..)]
        city: Vec<String>,

        /// Show the 5-day forecast instead of current conditions
        #[arg(short, long)]
        forecast: bool,
    },

    /// Show the effective configuration (secrets masked)
    Config,
}

impl Commands {
    /// Run the command.
    pub async fn run(&self) -> Result<()> {
        let mut settings = load_settings().context("Failed to load settings")?;
        if let Some(persona) = self.persona {
            settings.persona = persona;
        }

        match &self.command {
            Command::Run => cmd_run(&settings).await,
            Command::Chat { chat_id } => cmd_chat(&settings, *chat_id).await,
            Command::Weather { city, forecast } => {
                cmd_weather(&settings, &city.join(" "), *forecast).await
            }
            Command::Config => cmd_config(&settings),
        }
    }
}

async fn cmd_run(settings: &Settings) -> Result<()> {
    telegram::run_bot(settings).await?;
    Ok(())
}

async fn cmd_chat(settings: &Settings, chat_id: i64) -> Result<()> {
    settings.warn_missing_optional();
    let transport = Arc::new(NullTransport::new());
    let router = Router::from_settings(settings, transport.clone())?;

    println!(
        "Bunder Bot console ({} persona). Type /start to begin, Ctrl-D to quit.",
        settings.persona
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        router.handle_text(chat_id, &line).await;
        for item in transport.take().await {
            print_outgoing(&item);
        }
    }
    Ok(())
}

fn print_outgoing(item: &Outgoing) {
    match item {
        Outgoing::Text { text, .. } => println!("bot> {}\n", text),
        Outgoing::Html { html, .. } => println!("bot> {}\n", html),
        Outgoing::Buttons { html, buttons, .. } => {
            println!("bot> {}", html);
            for button in buttons {
                println!("     [{}]", button.label);
            }
            println!();
        }
        Outgoing::Typing { .. } => println!("bot is typing..."),
        Outgoing::CallbackAnswer { .. } => {}
    }
}

async fn cmd_weather(settings: &Settings, city: &str, forecast: bool) -> Result<()> {
    let Some(key) = &settings.weather.api_key else {
        bail!("Weather API key not configured. Set OPENWEATHER_API_KEY.");
    };

    let client = providers::http_client(settings)?;
    let responder = WeatherResponder::new(Arc::new(OpenWeatherClient::new(
        client,
        settings.weather.base_url.clone(),
        key.clone(),
        settings.language.code(),
    )));

    let text = if forecast {
        responder.try_forecast(city).await?
    } else {
        responder.try_current_weather(city).await?
    };
    println!("{}", text);
    Ok(())
}

fn cmd_config(settings: &Settings) -> Result<()> {
    println!("{}", settings.summary());
    match crate::config::get_settings_path() {
        Ok(path) if path.exists() => println!("settings file: {}", path.display()),
        Ok(path) => println!("settings file: {} (not present)", path.display()),
        Err(e) => println!("settings file: unavailable ({})", e),
    }
    Ok(())
}
