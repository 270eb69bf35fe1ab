//! Short rolling conversation context per chat, evicted after inactivity.
//!
//! This is the only store with an eviction policy: a background sweeper drops
//! chats idle for longer than the configured TTL.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Who wrote a context message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One turn of conversation, in the shape the agent endpoint expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextMessage {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone)]
struct ChatContext {
    user_id: String,
    last_interaction: Instant,
    messages: Vec<ContextMessage>,
}

/// Chat id → recent messages and last activity time.
#[derive(Debug)]
pub struct ConversationMemory {
    chats: RwLock<HashMap<i64, ChatContext>>,
    limit: usize,
}

impl ConversationMemory {
    /// `limit` caps the number of messages kept per chat.
    pub fn new(limit: usize) -> Self {
        Self {
            chats: RwLock::new(HashMap::new()),
            limit: limit.max(1),
        }
    }

    /// Record activity for a chat, creating its context if needed.
    pub async fn touch(&self, chat_id: i64, user_id: &str) {
        self.touch_at(chat_id, user_id, Instant::now()).await;
    }

    async fn touch_at(&self, chat_id: i64, user_id: &str, at: Instant) {
        let mut chats = self.chats.write().await;
        let entry = chats.entry(chat_id).or_insert_with(|| ChatContext {
            user_id: user_id.to_string(),
            last_interaction: at,
            messages: Vec::new(),
        });
        entry.last_interaction = at;
    }

    /// Append a message, keeping only the newest `limit` entries.
    pub async fn push(&self, chat_id: i64, role: Role, content: &str) {
        let mut chats = self.chats.write().await;
        let Some(entry) = chats.get_mut(&chat_id) else {
            return;
        };
        entry.messages.push(ContextMessage {
            role,
            content: content.to_string(),
        });
        if entry.messages.len() > self.limit {
            let overflow = entry.messages.len() - self.limit;
            entry.messages.drain(..overflow);
        }
        entry.last_interaction = Instant::now();
    }

    /// The newest `n` messages, oldest first.
    pub async fn recent(&self, chat_id: i64, n: usize) -> Vec<ContextMessage> {
        let chats = self.chats.read().await;
        chats
            .get(&chat_id)
            .map(|c| {
                let start = c.messages.len().saturating_sub(n);
                c.messages[start..].to_vec()
            })
            .unwrap_or_default()
    }

    /// Forget the messages of a chat but keep it active.
    pub async fn clear(&self, chat_id: i64) {
        if let Some(entry) = self.chats.write().await.get_mut(&chat_id) {
            entry.messages.clear();
        }
    }

    pub async fn len(&self) -> usize {
        self.chats.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.chats.read().await.is_empty()
    }

    /// Drop chats idle for longer than `ttl` as of `now`. Returns how many were removed.
    pub async fn evict_idle(&self, now: Instant, ttl: Duration) -> usize {
        let mut chats = self.chats.write().await;
        let before = chats.len();
        chats.retain(|chat_id, ctx| {
            let keep = now.saturating_duration_since(ctx.last_interaction) <= ttl;
            if !keep {
                tracing::info!(
                    "Session {} (chat {}) cleaned up due to inactivity",
                    ctx.user_id,
                    chat_id
                );
            }
            keep
        });
        before - chats.len()
    }
}

/// Periodically evict idle chats until the handle is aborted.
pub fn spawn_sweeper(
    memory: Arc<ConversationMemory>,
    every: Duration,
    ttl: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = memory.evict_idle(Instant::now(), ttl).await;
            if removed > 0 {
                tracing::debug!("Evicted {} idle conversation(s)", removed);
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_push_caps_history() {
        let memory = ConversationMemory::new(3);
        memory.touch(1, "telegram:1").await;
        for i in 0..5 {
            memory.push(1, Role::User, &format!("m{}", i)).await;
        }

        let recent = memory.recent(1, 10).await;
        let contents: Vec<_> = recent.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["m2", "m3", "m4"]);

        let last_two = memory.recent(1, 2).await;
        assert_eq!(last_two[0].content, "m3");
    }

    #[tokio::test]
    async fn test_push_without_touch_is_ignored() {
        let memory = ConversationMemory::new(10);
        memory.push(9, Role::User, "hello").await;
        assert!(memory.recent(9, 5).await.is_empty());
        assert!(memory.is_empty().await);
    }

    #[tokio::test]
    async fn test_clear_keeps_chat() {
        let memory = ConversationMemory::new(10);
        memory.touch(2, "telegram:2").await;
        memory.push(2, Role::Assistant, "hi").await;
        memory.clear(2).await;
        assert!(memory.recent(2, 5).await.is_empty());
        assert_eq!(memory.len().await, 1);
    }

    #[tokio::test]
    async fn test_evict_idle() {
        let memory = ConversationMemory::new(10);
        let start = Instant::now();
        memory.touch_at(1, "telegram:1", start).await;
        memory
            .touch_at(2, "telegram:2", start + Duration::from_secs(3000))
            .await;

        let ttl = Duration::from_secs(3600);
        let now = start + Duration::from_secs(3601);
        assert_eq!(memory.evict_idle(now, ttl).await, 1);
        assert_eq!(memory.len().await, 1);

        memory.push(2, Role::User, "still here").await;
        assert_eq!(memory.recent(2, 1).await[0].content, "still here");
        memory.push(1, Role::User, "gone").await;
        assert!(memory.recent(1, 1).await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_evicts_idle_chats() {
        let memory = Arc::new(ConversationMemory::new(10));
        let sweeper = spawn_sweeper(
            memory.clone(),
            Duration::from_secs(1800),
            Duration::from_secs(3600),
        );

        tokio::time::sleep(Duration::from_secs(60)).await;
        memory.touch(1, "telegram:1").await;
        tokio::time::sleep(Duration::from_secs(2940)).await;
        memory.touch(2, "telegram:2").await;

        // Sweeps at 30 and 60 minutes: nothing has been idle for an hour yet.
        tokio::time::sleep(Duration::from_secs(601)).await;
        assert_eq!(memory.len().await, 2);

        // Sweep at 90 minutes: chat 1 idle for 89 minutes, chat 2 for 40.
        tokio::time::sleep(Duration::from_secs(1800)).await;
        assert_eq!(memory.len().await, 1);
        memory.push(2, Role::User, "hi").await;
        assert_eq!(memory.recent(2, 1).await.len(), 1);

        sweeper.abort();
    }
}
