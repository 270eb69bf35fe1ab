//! Per-chat command router and free-text state machine.

use std::sync::Arc;

use crate::config::{Persona, Settings};
use crate::error::Result;
use crate::intent::{classify, Intent};
use crate::providers;
use crate::replies::{self, Company};
use crate::responders::{AiResponder, OpenWeatherClient, WeatherResponder};
use crate::session::{
    user_key, ConversationMemory, OnboardingStep, SessionPatch, SessionState, SessionStore,
    UserState, UserStateStore,
};

use super::transport::{Button, Transport};

/// Free text longer than this always goes to the AI.
const AI_LENGTH_THRESHOLD: usize = 20;

/// Split `/cmd@bot args` into a lowercase command name and trimmed arguments.
pub fn parse_command(text: &str) -> Option<(String, String)> {
    let rest = text.trim_start().strip_prefix('/')?;
    let (head, args) = match rest.split_once(char::is_whitespace) {
        Some((head, args)) => (head, args.trim()),
        None => (rest, ""),
    };
    let name = head.split('@').next().unwrap_or(head).to_lowercase();
    if name.is_empty() {
        return None;
    }
    Some((name, args.to_string()))
}

pub struct Router {
    persona: Persona,
    transport: Arc<dyn Transport>,
    ai: AiResponder,
    weather: Option<WeatherResponder>,
    sessions: SessionStore,
    states: UserStateStore,
    memory: Arc<ConversationMemory>,
}

impl Router {
    pub fn new(
        persona: Persona,
        transport: Arc<dyn Transport>,
        ai: AiResponder,
        memory: Arc<ConversationMemory>,
    ) -> Self {
        Self {
            persona,
            transport,
            ai,
            weather: None,
            sessions: SessionStore::new(),
            states: UserStateStore::new(),
            memory,
        }
    }

    pub fn with_weather(mut self, weather: Option<WeatherResponder>) -> Self {
        self.weather = weather;
        self
    }

    /// Wire providers, responders and stores from settings.
    pub fn from_settings(settings: &Settings, transport: Arc<dyn Transport>) -> Result<Self> {
        let client = providers::http_client(settings)?;
        let memory = Arc::new(ConversationMemory::new(settings.sessions.context_limit));

        let ai = AiResponder::new(
            providers::create_provider(settings, client.clone()),
            settings.persona,
            settings.language,
        )
        .with_agent(providers::create_agent(settings, client.clone()))
        .with_memory(memory.clone());

        let weather = settings.weather.api_key.as_ref().map(|key| {
            WeatherResponder::new(Arc::new(OpenWeatherClient::new(
                client.clone(),
                settings.weather.base_url.clone(),
                key.clone(),
                settings.language.code(),
            )))
        });

        Ok(Self::new(settings.persona, transport, ai, memory).with_weather(weather))
    }

    pub fn memory(&self) -> Arc<ConversationMemory> {
        self.memory.clone()
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn states(&self) -> &UserStateStore {
        &self.states
    }

    /// Entry point for an incoming text message.
    pub async fn handle_text(&self, chat_id: i64, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        self.memory.touch(chat_id, &user_key(chat_id)).await;

        match parse_command(text) {
            Some((command, args)) => self.handle_command(chat_id, &command, &args).await,
            None => self.handle_free_text(chat_id, text).await,
        }
    }

    /// Entry point for an inline button press. The query is always answered.
    pub async fn handle_callback(&self, chat_id: Option<i64>, query_id: &str, data: Option<&str>) {
        if let Err(e) = self.transport.answer_callback(query_id).await {
            tracing::warn!("Failed to answer callback {}: {}", query_id, e);
        }

        let (Some(chat_id), Some(data)) = (chat_id, data) else {
            return;
        };

        match data
            .strip_prefix(replies::COMPANY_CALLBACK_PREFIX)
            .and_then(replies::company_by_name)
        {
            Some(company) => self.show_company(chat_id, company).await,
            None => tracing::debug!("Ignoring callback data {:?}", data),
        }
    }

    async fn handle_command(&self, chat_id: i64, command: &str, args: &str) {
        tracing::info!("/{} from chat {}", command, chat_id);
        match command {
            "start" => self.cmd_start(chat_id).await,
            "help" => self.cmd_info(chat_id, Intent::Help, "help").await,
            "about" => self.cmd_info(chat_id, Intent::About, "about").await,
            "howitworks" => self.cmd_info(chat_id, Intent::HowItWorks, "howItWorks").await,
            "partners" => self.cmd_partners(chat_id).await,
            "gemini" => self.cmd_gemini(chat_id, args).await,
            "weather" | "forecast" => self.cmd_weather(chat_id, command, args).await,
            "clear" => self.cmd_clear(chat_id).await,
            "onboard" => self.cmd_onboard(chat_id).await,
            other => tracing::debug!("Ignoring unknown command /{}", other),
        }
    }

    async fn cmd_start(&self, chat_id: i64) {
        let user_id = user_key(chat_id);
        self.memory.clear(chat_id).await;
        self.states
            .set(chat_id, UserState::after_command("start").with_stage("initial"))
            .await;

        // No identity check: the chat is treated as authenticated and onboarded.
        self.sessions.get_or_create(&user_id, chat_id).await;
        let patch = SessionPatch {
            is_authenticated: Some(true),
            ..SessionPatch::state(SessionState::OnboardingComplete).with_current_field(None)
        };
        if let Err(e) = self.sessions.update(&user_id, patch).await {
            tracing::error!("Failed to update session for {}: {}", user_id, e);
        }

        self.send_text(chat_id, replies::welcome(self.persona)).await;
    }

    async fn cmd_info(&self, chat_id: i64, intent: Intent, command: &str) {
        let text = match self.persona {
            Persona::Partners => replies::canned(intent).to_string(),
            Persona::Weather if !self.ai.is_configured() => {
                replies::weather_info_fallback(intent).to_string()
            }
            Persona::Weather => {
                if let Err(e) = self.transport.send_typing(chat_id).await {
                    tracing::debug!("Typing indicator failed for {}: {}", chat_id, e);
                }
                match self.ai.try_respond(replies::ai_question(intent)).await {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::warn!("AI /{} failed: {}", command, e);
                        replies::weather_info_fallback(intent).to_string()
                    }
                }
            }
        };
        self.send_text(chat_id, &text).await;
        self.states.set(chat_id, UserState::after_command(command)).await;
    }

    async fn cmd_partners(&self, chat_id: i64) {
        let buttons: Vec<Button> = replies::COMPANIES
            .iter()
            .map(|c| {
                Button::new(
                    c.name,
                    format!("{}{}", replies::COMPANY_CALLBACK_PREFIX, c.name),
                )
            })
            .collect();

        if let Err(e) = self
            .transport
            .send_buttons(chat_id, &replies::partners_list(), &buttons)
            .await
        {
            tracing::error!("Failed to send partner list to {}: {}", chat_id, e);
        }
        self.states.set(chat_id, UserState::awaiting_company_name()).await;
    }

    async fn cmd_gemini(&self, chat_id: i64, prompt: &str) {
        if prompt.is_empty() {
            self.send_text(chat_id, replies::GEMINI_MODE).await;
            self.states
                .set(chat_id, UserState::after_command("gemini").with_stage("ai_mode"))
                .await;
            return;
        }

        self.send_text(chat_id, replies::GEMINI_PREPARING).await;
        let reply = self
            .ai
            .respond_in_chat(self.transport.as_ref(), chat_id, prompt)
            .await;
        self.send_text(chat_id, &reply).await;
        self.states.set(chat_id, UserState::after_command("gemini")).await;
    }

    async fn cmd_weather(&self, chat_id: i64, command: &str, city: &str) {
        self.states.set(chat_id, UserState::after_command(command)).await;

        let Some(weather) = &self.weather else {
            self.send_text(chat_id, replies::WEATHER_DISABLED).await;
            return;
        };
        if city.is_empty() {
            self.send_text(chat_id, &replies::weather_usage(command)).await;
            return;
        }

        if let Err(e) = self.transport.send_typing(chat_id).await {
            tracing::debug!("Typing indicator failed for {}: {}", chat_id, e);
        }
        let text = if command == "forecast" {
            weather.forecast(city).await
        } else {
            weather.current_weather(city).await
        };
        self.send_text(chat_id, &text).await;
    }

    async fn cmd_clear(&self, chat_id: i64) {
        self.memory.clear(chat_id).await;
        self.states.clear(chat_id).await;
        self.sessions.clear(&user_key(chat_id)).await;
        self.send_text(chat_id, replies::CLEARED).await;
    }

    async fn cmd_onboard(&self, chat_id: i64) {
        let user_id = user_key(chat_id);
        match self.sessions.start_onboarding(&user_id, chat_id).await {
            Ok(field) => {
                self.states.set(chat_id, UserState::after_command("onboard")).await;
                let text = format!("{}\n\n{}", replies::ONBOARDING_INTRO, field.prompt());
                self.send_text(chat_id, &text).await;
            }
            Err(e) => {
                tracing::error!("Failed to start onboarding for {}: {}", user_id, e);
                self.send_text(chat_id, replies::GENERIC_ERROR).await;
            }
        }
    }

    async fn handle_free_text(&self, chat_id: i64, text: &str) {
        let user_id = user_key(chat_id);

        if let Some(session) = self.sessions.get(&user_id).await {
            if session.is_collecting() {
                self.handle_onboarding_answer(chat_id, &user_id, text).await;
                return;
            }
        }

        let state = self.states.get(chat_id).await;

        if state.expecting_company_name {
            if let Some(company) = replies::find_company(text) {
                self.show_company(chat_id, company).await;
                return;
            }
        }

        if state.expecting_confirmation {
            if let Some(company) = state.selected_company.as_deref() {
                if replies::is_affirmative(text) {
                    self.send_html(chat_id, &replies::contact_requested(company))
                        .await;
                } else {
                    self.send_text(chat_id, replies::contact_declined()).await;
                }
                self.states.set(chat_id, UserState::general(None)).await;
                return;
            }
        }

        let wants_ai = text.chars().count() > AI_LENGTH_THRESHOLD
            || text.contains('?')
            || state.last_command_is("gemini");

        let intent = classify(text);
        let reply = if wants_ai {
            self.ai
                .respond_in_chat(self.transport.as_ref(), chat_id, text)
                .await
        } else {
            tracing::debug!("Classified {:?} as {}", text, intent);
            replies::canned(intent).to_string()
        };
        self.send_text(chat_id, &reply).await;
        self.states.set(chat_id, UserState::general(Some(intent))).await;
    }

    async fn handle_onboarding_answer(&self, chat_id: i64, user_id: &str, text: &str) {
        match self.sessions.submit_answer(user_id, text).await {
            Ok(OnboardingStep::Next(field)) => self.send_text(chat_id, field.prompt()).await,
            Ok(OnboardingStep::Invalid { field, message }) => {
                self.send_text(chat_id, &message).await;
                self.send_text(chat_id, field.prompt()).await;
            }
            Ok(OnboardingStep::Complete(data)) => {
                self.send_text(chat_id, &replies::onboarding_complete(&data))
                    .await;
            }
            Ok(OnboardingStep::NotOnboarding) => {
                tracing::debug!("{} is no longer onboarding", user_id);
            }
            Err(e) => {
                tracing::error!("Onboarding answer for {} failed: {}", user_id, e);
                self.send_text(chat_id, replies::GENERIC_ERROR).await;
            }
        }
    }

    async fn show_company(&self, chat_id: i64, company: &Company) {
        self.send_html(chat_id, &replies::company_detail(company)).await;
        self.states
            .set(chat_id, UserState::awaiting_confirmation(company.name))
            .await;
    }

    async fn send_text(&self, chat_id: i64, text: &str) {
        if let Err(e) = self.transport.send_text(chat_id, text).await {
            tracing::error!("Failed to send message to {}: {}", chat_id, e);
        }
    }

    async fn send_html(&self, chat_id: i64, html: &str) {
        if let Err(e) = self.transport.send_html(chat_id, html).await {
            tracing::error!("Failed to send message to {}: {}", chat_id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Language;
    use crate::onboarding::OnboardingField;
    use crate::providers::{CompletionRequest, DisabledProvider, Provider, ProviderError};
    use crate::responders::weather::{CurrentWeather, Forecast};
    use crate::responders::{ResponderError, WeatherApi};
    use crate::telegram::transport::{NullTransport, Outgoing};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    struct EchoProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Provider for EchoProvider {
        fn name(&self) -> &str {
            "echo"
        }

        fn is_available(&self) -> bool {
            true
        }

        async fn complete(&self, request: &CompletionRequest) -> providers::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("AI: {}", request.user_text))
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl Provider for FailingProvider {
        fn name(&self) -> &str {
            "failing"
        }

        fn is_available(&self) -> bool {
            true
        }

        async fn complete(&self, _request: &CompletionRequest) -> providers::Result<String> {
            Err(ProviderError::other("upstream unavailable"))
        }
    }

    /// Serves fixed readings and records `current:<city>` / `forecast:<city>`.
    #[derive(Default)]
    struct RecordingWeather {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl WeatherApi for RecordingWeather {
        async fn current(&self, city: &str) -> std::result::Result<CurrentWeather, ResponderError> {
            self.calls.lock().await.push(format!("current:{}", city));
            let json = serde_json::json!({
                "name": city,
                "main": {"temp": 18.0, "feels_like": 17.0, "humidity": 60},
                "wind": {"speed": 3.0, "deg": 90},
                "weather": [{"description": "clear sky"}],
                "sys": {"country": "TR"}
            });
            Ok(serde_json::from_value(json).unwrap())
        }

        async fn forecast(&self, city: &str) -> std::result::Result<Forecast, ResponderError> {
            self.calls.lock().await.push(format!("forecast:{}", city));
            let json = serde_json::json!({
                "list": [{
                    "dt": 1_704_067_200,
                    "main": {"temp": 12.0},
                    "weather": [{"description": "clouds"}]
                }],
                "city": {"name": city, "timezone": 10800}
            });
            Ok(serde_json::from_value(json).unwrap())
        }
    }

    fn weather_router(
        provider: Arc<dyn Provider>,
    ) -> (Router, Arc<NullTransport>, Arc<RecordingWeather>) {
        let transport = Arc::new(NullTransport::new());
        let memory = Arc::new(ConversationMemory::new(10));
        let ai = AiResponder::new(provider, Persona::Weather, Language::Tr)
            .with_memory(memory.clone());
        let api = Arc::new(RecordingWeather::default());
        let router = Router::new(Persona::Weather, transport.clone(), ai, memory)
            .with_weather(Some(WeatherResponder::new(api.clone())));
        (router, transport, api)
    }

    fn router_with(provider: Arc<dyn Provider>) -> (Router, Arc<NullTransport>) {
        let transport = Arc::new(NullTransport::new());
        let memory = Arc::new(ConversationMemory::new(10));
        let ai = AiResponder::new(provider, Persona::Partners, Language::Tr)
            .with_memory(memory.clone());
        let router = Router::new(Persona::Partners, transport.clone(), ai, memory);
        (router, transport)
    }

    fn echo_router() -> (Router, Arc<NullTransport>, Arc<EchoProvider>) {
        let provider = Arc::new(EchoProvider {
            calls: AtomicUsize::new(0),
        });
        let (router, transport) = router_with(provider.clone());
        (router, transport, provider)
    }

    #[test]
    fn test_parse_command() {
        assert_eq!(
            parse_command("/weather İstanbul"),
            Some(("weather".to_string(), "İstanbul".to_string()))
        );
        assert_eq!(
            parse_command("/Start@BunderBot"),
            Some(("start".to_string(), String::new()))
        );
        assert_eq!(
            parse_command("/gemini@bunder_bot  Yapay zeka nedir? "),
            Some(("gemini".to_string(), "Yapay zeka nedir?".to_string()))
        );
        assert_eq!(parse_command("merhaba"), None);
        assert_eq!(parse_command("/"), None);
    }

    #[tokio::test]
    async fn test_partners_flow_end_to_end() {
        let (router, transport, _) = echo_router();

        router.handle_text(1, "/start").await;
        assert!(transport
            .last_text()
            .await
            .unwrap()
            .starts_with("Merhaba! Bunder Telegram Bot'una hoş geldiniz!"));
        let session = router.sessions().get("telegram:1").await.unwrap();
        assert_eq!(session.state, SessionState::OnboardingComplete);

        router.handle_text(1, "/partners").await;
        match transport.sent().await.last() {
            Some(Outgoing::Buttons { buttons, .. }) => {
                assert_eq!(buttons.len(), replies::COMPANIES.len());
                assert_eq!(buttons[0].data, "company_TechSoft");
            }
            other => panic!("expected partner buttons, got {:?}", other),
        }
        assert!(router.states().get(1).await.expecting_company_name);

        router.handle_text(1, "TechSoft").await;
        assert!(transport
            .last_text()
            .await
            .unwrap()
            .starts_with("<b>TechSoft</b> hakkında detaylı bilgi"));
        let state = router.states().get(1).await;
        assert!(state.expecting_confirmation);
        assert_eq!(state.selected_company.as_deref(), Some("TechSoft"));

        router.handle_text(1, "evet").await;
        assert!(transport
            .last_text()
            .await
            .unwrap()
            .starts_with("Harika! <b>TechSoft</b>"));
        let state = router.states().get(1).await;
        assert!(state.last_command_is("general"));
        assert!(!state.expecting_confirmation);
        assert!(state.selected_company.is_none());
    }

    #[tokio::test]
    async fn test_declined_confirmation() {
        let (router, transport, _) = echo_router();
        router.handle_text(2, "/partners").await;
        router.handle_text(2, "logitrans").await;
        router.handle_text(2, "hayır").await;

        assert_eq!(
            transport.last_text().await.as_deref(),
            Some(replies::contact_declined())
        );
        assert!(router.states().get(2).await.last_command_is("general"));
    }

    #[tokio::test]
    async fn test_unmatched_company_falls_through() {
        let (router, transport, provider) = echo_router();
        router.handle_text(3, "/partners").await;
        router.handle_text(3, "merhaba").await;

        let reply = transport.last_text().await.unwrap();
        assert!(reply.starts_with("Merhaba") || reply.starts_with("Selam"));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
        let state = router.states().get(3).await;
        assert!(!state.expecting_company_name);
        assert_eq!(state.last_intent, Some(Intent::Greeting));
    }

    #[tokio::test]
    async fn test_long_text_and_questions_go_to_ai() {
        let (router, transport, provider) = echo_router();

        router.handle_text(4, "Ortak bulmak için ne yapmalıyım").await;
        assert_eq!(
            transport.last_text().await.as_deref(),
            Some("AI: Ortak bulmak için ne yapmalıyım")
        );

        router.handle_text(4, "Neden?").await;
        assert_eq!(transport.last_text().await.as_deref(), Some("AI: Neden?"));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
        assert!(transport
            .sent()
            .await
            .iter()
            .any(|o| matches!(o, Outgoing::Typing { chat_id: 4 })));
    }

    #[tokio::test]
    async fn test_gemini_mode() {
        let (router, transport, provider) = echo_router();

        router.handle_text(5, "/gemini").await;
        assert_eq!(transport.last_text().await.as_deref(), Some(replies::GEMINI_MODE));
        let state = router.states().get(5).await;
        assert_eq!(state.conversation_stage.as_deref(), Some("ai_mode"));

        router.handle_text(5, "selam").await;
        assert_eq!(transport.last_text().await.as_deref(), Some("AI: selam"));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

        router.handle_text(5, "/gemini Yapay zeka nedir").await;
        let texts: Vec<String> = transport
            .sent()
            .await
            .iter()
            .filter_map(|o| o.text().map(str::to_string))
            .collect();
        assert_eq!(texts[texts.len() - 2], replies::GEMINI_PREPARING);
        assert_eq!(texts[texts.len() - 1], "AI: Yapay zeka nedir");
    }

    #[tokio::test]
    async fn test_ai_failure_never_escapes() {
        let (router, transport) = router_with(Arc::new(DisabledProvider::new("gemini")));
        router.handle_text(6, "Bana bir iş ortağı önerir misin?").await;
        assert!(transport
            .last_text()
            .await
            .unwrap()
            .contains("API anahtarı eksik"));
    }

    #[tokio::test]
    async fn test_weather_commands_without_service() {
        let (router, transport, _) = echo_router();
        router.handle_text(7, "/weather Ankara").await;
        assert_eq!(
            transport.last_text().await.as_deref(),
            Some(replies::WEATHER_DISABLED)
        );
    }

    #[tokio::test]
    async fn test_unknown_command_is_ignored() {
        let (router, transport, provider) = echo_router();
        router.handle_text(8, "/doesnotexist foo").await;
        assert!(transport.sent().await.is_empty());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_clear_resets_state() {
        let (router, transport, _) = echo_router();
        router.handle_text(9, "/partners").await;
        router.handle_text(9, "/clear").await;
        assert_eq!(transport.last_text().await.as_deref(), Some(replies::CLEARED));
        assert_eq!(router.states().get(9).await, UserState::default());
    }

    #[tokio::test]
    async fn test_onboarding_through_router() {
        let (router, transport, provider) = echo_router();
        router.handle_text(10, "/onboard").await;
        assert!(transport
            .last_text()
            .await
            .unwrap()
            .ends_with(OnboardingField::CompanyName.prompt()));

        router.handle_text(10, "Acme Teknoloji ve Danışmanlık").await;
        assert_eq!(
            transport.last_text().await.as_deref(),
            Some(OnboardingField::LinkedInUrl.prompt())
        );

        router.handle_text(10, "linkedin bizde yok?").await;
        let sent = transport.sent().await;
        let n = sent.len();
        assert!(sent[n - 2].text().unwrap().starts_with("Invalid input:"));
        assert_eq!(sent[n - 1].text(), Some(OnboardingField::LinkedInUrl.prompt()));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_company_callback() {
        let (router, transport, _) = echo_router();
        router
            .handle_callback(Some(11), "q1", Some("company_GreenEnergy"))
            .await;

        let sent = transport.sent().await;
        assert_eq!(
            sent[0],
            Outgoing::CallbackAnswer {
                query_id: "q1".to_string()
            }
        );
        assert!(sent[1].text().unwrap().starts_with("<b>GreenEnergy</b>"));
        assert_eq!(
            router.states().get(11).await.selected_company.as_deref(),
            Some("GreenEnergy")
        );

        router.handle_callback(None, "q2", Some("company_TechSoft")).await;
        router.handle_callback(Some(11), "q3", Some("bogus")).await;
        assert_eq!(transport.sent().await.len(), 4);
    }

    #[tokio::test]
    async fn test_clear_leaves_onboarding() {
        let (router, transport, _) = echo_router();
        router.handle_text(12, "/onboard").await;
        router.handle_text(12, "/clear").await;
        assert!(router.sessions().get("telegram:12").await.is_none());

        router.handle_text(12, "merhaba").await;
        let reply = transport.last_text().await.unwrap();
        assert!(reply.starts_with("Merhaba") || reply.starts_with("Selam"));
        assert!(router.sessions().get("telegram:12").await.is_none());
    }

    #[tokio::test]
    async fn test_weather_and_forecast_commands() {
        let (router, transport, api) = weather_router(Arc::new(DisabledProvider::new("gemini")));

        router.handle_text(20, "/weather İstanbul").await;
        assert!(transport
            .last_text()
            .await
            .unwrap()
            .starts_with("🌤 Weather in İstanbul, TR"));
        assert!(router.states().get(20).await.last_command_is("weather"));

        router.handle_text(20, "/forecast@bunder_bot  New York ").await;
        assert!(transport
            .last_text()
            .await
            .unwrap()
            .starts_with("5-day forecast for New York"));
        assert!(router.states().get(20).await.last_command_is("forecast"));

        assert_eq!(
            *api.calls.lock().await,
            vec!["current:İstanbul".to_string(), "forecast:New York".to_string()]
        );
        let typing = transport
            .sent()
            .await
            .iter()
            .filter(|o| matches!(o, Outgoing::Typing { chat_id: 20 }))
            .count();
        assert_eq!(typing, 2);
    }

    #[tokio::test]
    async fn test_weather_commands_need_a_city() {
        let (router, transport, api) = weather_router(Arc::new(DisabledProvider::new("gemini")));

        router.handle_text(21, "/weather").await;
        assert_eq!(
            transport.last_text().await,
            Some(replies::weather_usage("weather"))
        );
        router.handle_text(21, "/forecast   ").await;
        assert_eq!(
            transport.last_text().await,
            Some(replies::weather_usage("forecast"))
        );
        assert!(api.calls.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_weather_persona_info_commands_use_ai() {
        let provider = Arc::new(EchoProvider {
            calls: AtomicUsize::new(0),
        });
        let (router, transport, _) = weather_router(provider.clone());

        router.handle_text(22, "/about").await;
        assert_eq!(
            transport.last_text().await.as_deref(),
            Some("AI: Bunder bot hakkında bilgi ver")
        );
        assert_eq!(transport.sent().await[0], Outgoing::Typing { chat_id: 22 });
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert!(router.states().get(22).await.last_command_is("about"));
    }

    #[tokio::test]
    async fn test_weather_persona_info_falls_back() {
        let (router, transport, _) = weather_router(Arc::new(FailingProvider));
        router.handle_text(23, "/help").await;
        assert_eq!(
            transport.last_text().await.as_deref(),
            Some(replies::weather_info_fallback(Intent::Help))
        );

        let (router, transport, _) = weather_router(Arc::new(DisabledProvider::new("gemini")));
        router.handle_text(24, "/howitworks").await;
        let sent = transport.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0].text(),
            Some(replies::weather_info_fallback(Intent::HowItWorks))
        );
        assert!(router.states().get(24).await.last_command_is("howItWorks"));
    }
}
