use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, info};
use uuid::Uuid;

use crate::session::state::ChatSession;

/// 内存中的会话表，重启后不保留
pub struct SessionStore {
    sessions: DashMap<Uuid, Arc<ChatSession>>,
    max_sessions: usize,
}

impl SessionStore {
    pub fn new(max_sessions: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            max_sessions: max_sessions.max(1),
        }
    }

    /// 新建会话；超过上限时淘汰最久未使用的会话，空闲会话优先
    pub fn create(&self) -> Arc<ChatSession> {
        while self.sessions.len() >= self.max_sessions {
            if !self.evict_least_recently_used() {
                break;
            }
        }

        let session = Arc::new(ChatSession::new());
        self.sessions.insert(session.id(), session.clone());
        debug!(session = %session.id(), total = self.sessions.len(), "Session created");
        session
    }

    pub fn get(&self, id: &Uuid) -> Option<Arc<ChatSession>> {
        self.sessions.get(id).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn evict_least_recently_used(&self) -> bool {
        let victim = self
            .sessions
            .iter()
            .min_by_key(|entry| (entry.value().is_busy(), entry.value().last_used()))
            .map(|entry| *entry.key());

        match victim {
            Some(id) => {
                self.sessions.remove(&id);
                info!(session = %id, "Evicted least recently used session");
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{AgentError, AgentReply, Answer, Orchestrator};
    use async_trait::async_trait;
    use tokio::sync::Notify;

    #[test]
    fn test_create_and_get() {
        let store = SessionStore::new(10);
        let session = store.create();

        let found = store.get(&session.id()).unwrap();
        assert!(Arc::ptr_eq(&session, &found));
        assert!(store.get(&Uuid::new_v4()).is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_recently_used_session_survives_eviction() {
        let store = SessionStore::new(2);
        let first = store.create();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = store.create();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let _ = first.select(0);
        std::thread::sleep(std::time::Duration::from_millis(2));
        let third = store.create();

        assert_eq!(store.len(), 2);
        assert!(store.get(&first.id()).is_some());
        assert!(store.get(&second.id()).is_none());
        assert!(store.get(&third.id()).is_some());
    }

    /// 一直等待直到收到通知
    struct BlockedAgent {
        release: Arc<Notify>,
    }

    #[async_trait]
    impl Orchestrator for BlockedAgent {
        async fn answer(&self, _query: &str) -> Result<AgentReply, AgentError> {
            self.release.notified().await;
            Ok(AgentReply {
                answer: Answer::Text("done".into()),
                expression: None,
                steps: 1,
            })
        }
    }

    #[tokio::test]
    async fn test_busy_session_is_not_evicted() {
        let store = SessionStore::new(2);
        let busy = store.create();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let idle = store.create();

        let release = Arc::new(Notify::new());
        let agent = BlockedAgent {
            release: release.clone(),
        };
        let pending = {
            let busy = busy.clone();
            tokio::spawn(async move { busy.submit("who is in Austin", &agent).await })
        };
        while !busy.is_busy() {
            tokio::task::yield_now().await;
        }
        // 让空闲会话成为最近使用的
        std::thread::sleep(std::time::Duration::from_millis(2));
        let _ = idle.select(0);
        std::thread::sleep(std::time::Duration::from_millis(2));

        let third = store.create();
        assert!(store.get(&busy.id()).is_some());
        assert!(store.get(&idle.id()).is_none());
        assert!(store.get(&third.id()).is_some());

        release.notify_one();
        pending.await.unwrap().unwrap();
        assert_eq!(busy.history_len(), 1);
    }
}
