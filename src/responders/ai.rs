//! Generative AI replies: agent endpoint first, then the model with one retry.

use std::sync::Arc;

use super::ResponderError;
use crate::config::{Language, Persona};
use crate::providers::{CompletionRequest, Provider};
use crate::session::{user_key, ConversationMemory, Role};
use crate::telegram::transport::Transport;

/// Messages of context forwarded to the agent endpoint.
const AGENT_CONTEXT_MESSAGES: usize = 5;

pub struct AiResponder {
    provider: Arc<dyn Provider>,
    agent: Option<Arc<dyn Provider>>,
    memory: Option<Arc<ConversationMemory>>,
    persona: Persona,
    language: Language,
}

impl AiResponder {
    pub fn new(provider: Arc<dyn Provider>, persona: Persona, language: Language) -> Self {
        Self {
            provider,
            agent: None,
            memory: None,
            persona,
            language,
        }
    }

    pub fn with_agent(mut self, agent: Option<Arc<dyn Provider>>) -> Self {
        self.agent = agent;
        self
    }

    pub fn with_memory(mut self, memory: Arc<ConversationMemory>) -> Self {
        self.memory = Some(memory);
        self
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_available() || self.agent.is_some()
    }

    /// Render the fixed prompt around the raw user text.
    pub fn prompt(&self, user_text: &str) -> String {
        let role = match self.persona {
            Persona::Partners => {
                "Sen bir iş ortaklığı bulmaya yardımcı olan Bunder Bot adında bir asistansın."
            }
            Persona::Weather => "Sen bir hava durumu bilgisi sunan asistan botusun.",
        };
        format!(
            "Aşağıdaki kullanıcı mesajına {} yanıt ver.\n{}\nCevabın kısa ve net olsun. 150 kelimeyi geçme.\n\nKullanıcı mesajı: \"{}\"",
            self.language.prompt_name(),
            role,
            user_text
        )
    }

    pub async fn try_respond(&self, user_text: &str) -> Result<String, ResponderError> {
        self.complete(CompletionRequest::new(self.prompt(user_text), user_text))
            .await
    }

    /// Reply text, or the apology for whatever went wrong.
    pub async fn respond(&self, user_text: &str) -> String {
        match self.try_respond(user_text).await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!("AI response failed: {}", e);
                e.apology()
            }
        }
    }

    /// Show typing, answer with chat context, and record the exchange.
    /// Returns the text that should be sent.
    pub async fn respond_in_chat(
        &self,
        transport: &dyn Transport,
        chat_id: i64,
        user_text: &str,
    ) -> String {
        if let Err(e) = transport.send_typing(chat_id).await {
            tracing::debug!("Typing indicator failed for {}: {}", chat_id, e);
        }

        let user_id = user_key(chat_id);
        let history = match &self.memory {
            Some(memory) => {
                memory.touch(chat_id, &user_id).await;
                memory.recent(chat_id, AGENT_CONTEXT_MESSAGES).await
            }
            None => Vec::new(),
        };

        let request =
            CompletionRequest::new(self.prompt(user_text), user_text).for_user(user_id, history);

        match self.complete(request).await {
            Ok(text) => {
                if let Some(memory) = &self.memory {
                    memory.push(chat_id, Role::User, user_text).await;
                    memory.push(chat_id, Role::Assistant, &text).await;
                }
                text
            }
            Err(e) => {
                tracing::error!("AI response failed for chat {}: {}", chat_id, e);
                e.apology()
            }
        }
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String, ResponderError> {
        if let Some(agent) = &self.agent {
            match agent.complete(&request).await {
                Ok(text) if !text.trim().is_empty() => return Ok(text),
                Ok(_) => tracing::warn!(
                    "Agent endpoint returned an empty reply, falling back to {}",
                    self.provider.name()
                ),
                Err(e) => tracing::warn!(
                    "Agent endpoint failed ({}), falling back to {}",
                    e,
                    self.provider.name()
                ),
            }
        }

        let first = self.provider.complete(&request).await?;
        if !first.trim().is_empty() {
            return Ok(first);
        }

        tracing::warn!("{} returned an empty response, retrying", self.provider.name());
        let retry = self.provider.complete(&request).await?;
        if !retry.trim().is_empty() {
            return Ok(retry);
        }

        Err(ResponderError::Empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{DisabledProvider, ProviderError};
    use crate::telegram::transport::{NullTransport, Outgoing};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Returns queued answers in order, then empty strings.
    struct ScriptedProvider {
        answers: Mutex<Vec<std::result::Result<String, String>>>,
        calls: AtomicUsize,
    }

    impl ScriptedProvider {
        fn new(answers: Vec<std::result::Result<&str, &str>>) -> Self {
            Self {
                answers: Mutex::new(
                    answers
                        .into_iter()
                        .rev()
                        .map(|a| a.map(str::to_string).map_err(str::to_string))
                        .collect(),
                ),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Provider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        fn is_available(&self) -> bool {
            true
        }

        async fn complete(&self, _request: &CompletionRequest) -> crate::providers::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.answers.lock().unwrap().pop() {
                Some(Ok(text)) => Ok(text),
                Some(Err(e)) => Err(ProviderError::other(e)),
                None => Ok(String::new()),
            }
        }
    }

    #[tokio::test]
    async fn test_empty_twice_falls_back_after_two_calls() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(""), Ok("")]));
        let responder = AiResponder::new(provider.clone(), Persona::Partners, Language::Tr);

        let reply = responder.respond("Bana uygun bir ortak bulur musun?").await;

        assert!(reply.ends_with("(Gemini error)"));
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_retry_recovers() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok("  "), Ok("Tabii!")]));
        let responder = AiResponder::new(provider.clone(), Persona::Partners, Language::Tr);

        assert_eq!(responder.try_respond("selam").await.unwrap(), "Tabii!");
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_error_is_not_retried() {
        let provider = Arc::new(ScriptedProvider::new(vec![Err("boom")]));
        let responder = AiResponder::new(provider.clone(), Persona::Weather, Language::Tr);

        let err = responder.try_respond("hava nasıl?").await.unwrap_err();
        assert!(matches!(err, ResponderError::Provider(_)));
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_missing_key_apology() {
        let responder = AiResponder::new(
            Arc::new(DisabledProvider::new("gemini")),
            Persona::Partners,
            Language::Tr,
        );
        assert!(!responder.is_configured());
        assert!(responder.respond("merhaba").await.contains("API anahtarı eksik"));
    }

    #[tokio::test]
    async fn test_agent_first_then_provider() {
        let agent = Arc::new(ScriptedProvider::new(vec![Err("connection refused")]));
        let provider = Arc::new(ScriptedProvider::new(vec![Ok("Gemini cevabı")]));
        let responder = AiResponder::new(provider.clone(), Persona::Partners, Language::Tr)
            .with_agent(Some(agent.clone() as Arc<dyn Provider>));

        assert_eq!(responder.respond("selam").await, "Gemini cevabı");
        assert_eq!(agent.calls(), 1);
        assert_eq!(provider.calls(), 1);

        let agent = Arc::new(ScriptedProvider::new(vec![Ok("Ajan cevabı")]));
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let responder = AiResponder::new(provider.clone(), Persona::Partners, Language::Tr)
            .with_agent(Some(agent as Arc<dyn Provider>));
        assert_eq!(responder.respond("selam").await, "Ajan cevabı");
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_respond_in_chat_types_and_records() {
        let memory = Arc::new(ConversationMemory::new(10));
        let provider = Arc::new(ScriptedProvider::new(vec![Ok("Cevap")]));
        let responder = AiResponder::new(provider, Persona::Partners, Language::Tr)
            .with_memory(memory.clone());
        let transport = NullTransport::new();

        let reply = responder.respond_in_chat(&transport, 5, "Soru?").await;

        assert_eq!(reply, "Cevap");
        assert_eq!(transport.sent().await, vec![Outgoing::Typing { chat_id: 5 }]);
        let recent = memory.recent(5, 5).await;
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].role, Role::User);
        assert_eq!(recent[1].content, "Cevap");
    }

    #[test]
    fn test_prompt_template() {
        let responder = AiResponder::new(
            Arc::new(DisabledProvider::new("gemini")),
            Persona::Weather,
            Language::Tr,
        );
        let prompt = responder.prompt("Yarın yağmur var mı?");
        assert!(prompt.starts_with("Aşağıdaki kullanıcı mesajına Türkçe yanıt ver."));
        assert!(prompt.contains("hava durumu"));
        assert!(prompt.contains("150 kelimeyi geçme"));
        assert!(prompt.ends_with("Kullanıcı mesajı: \"Yarın yağmur var mı?\""));
    }
}
