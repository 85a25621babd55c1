//! 单个聊天会话
//!
//! 状态机只有两个状态：空闲和等待回复。同一会话同一时间只处理一个
//! 问题；成功时追加一条历史，失败时不留下任何记录。

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::agent::Orchestrator;
use crate::session::SessionError;
use crate::session::history::{HistoryEntry, HistoryLog};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    AwaitingResponse { query: String, since: DateTime<Utc> },
}

/// 渲染用的会话快照
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub state: SessionState,
    pub history: Vec<HistoryEntry>,
}

#[derive(Debug)]
struct SessionInner {
    state: SessionState,
    history: HistoryLog,
    last_used: DateTime<Utc>,
}

#[derive(Debug)]
pub struct ChatSession {
    id: Uuid,
    created_at: DateTime<Utc>,
    inner: Mutex<SessionInner>,
}

/// 离开作用域时把会话恢复为空闲，请求被中途丢弃时也一样
struct PendingGuard<'a> {
    session: &'a ChatSession,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.session.inner.lock().state = SessionState::Idle;
    }
}

impl ChatSession {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            created_at: now,
            inner: Mutex::new(SessionInner {
                state: SessionState::Idle,
                history: HistoryLog::new(),
                last_used: now,
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn state(&self) -> SessionState {
        self.inner.lock().state.clone()
    }

    /// 最近一次提交或查看历史的时间
    pub fn last_used(&self) -> DateTime<Utc> {
        self.inner.lock().last_used
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.inner.lock().state, SessionState::AwaitingResponse { .. })
    }

    /// 提交问题并等待 agent 回复
    pub async fn submit(
        &self,
        query: &str,
        orchestrator: &dyn Orchestrator,
    ) -> Result<HistoryEntry, SessionError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SessionError::EmptyQuery);
        }

        {
            let mut inner = self.inner.lock();
            if let SessionState::AwaitingResponse { query: pending, .. } = &inner.state {
                return Err(SessionError::Busy {
                    pending: pending.clone(),
                });
            }
            let now = Utc::now();
            inner.state = SessionState::AwaitingResponse {
                query: query.to_string(),
                since: now,
            };
            inner.last_used = now;
        }
        let _guard = PendingGuard { session: self };

        let reply = match orchestrator.answer(query).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(session = %self.id, error = %e, "Query failed, nothing recorded");
                return Err(e.into());
            }
        };

        let entry = self
            .inner
            .lock()
            .history
            .append(query, reply.answer, reply.expression);
        info!(
            session = %self.id,
            index = entry.index,
            steps = reply.steps,
            "Query answered"
        );
        Ok(entry)
    }

    /// 读取历史中的一条问答，不会触发新的查询
    pub fn select(&self, index: usize) -> Result<HistoryEntry, SessionError> {
        let mut inner = self.inner.lock();
        inner.last_used = Utc::now();
        inner
            .history
            .get(index)
            .cloned()
            .ok_or(SessionError::HistoryIndex {
                index,
                len: inner.history.len(),
            })
    }

    pub fn history(&self) -> Vec<HistoryEntry> {
        self.inner.lock().history.entries().to_vec()
    }

    pub fn history_len(&self) -> usize {
        self.inner.lock().history.len()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let inner = self.inner.lock();
        SessionSnapshot {
            id: self.id,
            created_at: self.created_at,
            state: inner.state.clone(),
            history: inner.history.entries().to_vec(),
        }
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{AgentError, AgentReply, Answer};
    use crate::llm::LlmError;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    /// 计数并返回固定答案，`fail` 为真时返回错误
    struct CountingAgent {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl Orchestrator for CountingAgent {
        async fn answer(&self, query: &str) -> Result<AgentReply, AgentError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(AgentError::Llm(LlmError::EmptyResponse));
            }
            Ok(AgentReply {
                answer: Answer::Text(format!("answer to {query}")),
                expression: Some("all".into()),
                steps: 1,
            })
        }
    }

    fn agent(fail: bool) -> CountingAgent {
        CountingAgent {
            calls: AtomicUsize::new(0),
            fail,
        }
    }

    #[tokio::test]
    async fn test_success_appends_exactly_one_entry() {
        let session = ChatSession::new();
        let agent = agent(false);

        let entry = session.submit("  who is in Austin? ", &agent).await.unwrap();
        assert_eq!(entry.question, "who is in Austin?");
        assert_eq!(session.history_len(), 1);
        assert_eq!(session.history()[0], entry);
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn test_failure_appends_nothing() {
        let session = ChatSession::new();
        let agent = agent(true);

        assert!(matches!(
            session.submit("who is in Austin?", &agent).await,
            Err(SessionError::Agent(_))
        ));
        assert_eq!(session.history_len(), 0);
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn test_blank_query_is_rejected_without_calling_agent() {
        let session = ChatSession::new();
        let agent = agent(false);

        assert!(matches!(
            session.submit("   ", &agent).await,
            Err(SessionError::EmptyQuery)
        ));
        assert_eq!(agent.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_select_does_not_requery() {
        let session = ChatSession::new();
        let agent = agent(false);
        let stored = session.submit("q", &agent).await.unwrap();

        let first = session.select(0).unwrap();
        let second = session.select(0).unwrap();
        assert_eq!(first, stored);
        assert_eq!(second, stored);
        assert_eq!(agent.calls.load(Ordering::SeqCst), 1);
        assert!(matches!(
            session.select(5),
            Err(SessionError::HistoryIndex { index: 5, len: 1 })
        ));
    }

    /// 在收到放行信号前一直挂起的 agent
    struct BlockingAgent {
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl Orchestrator for BlockingAgent {
        async fn answer(&self, _query: &str) -> Result<AgentReply, AgentError> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok(AgentReply {
                answer: Answer::Text("done".into()),
                expression: None,
                steps: 1,
            })
        }
    }

    #[tokio::test]
    async fn test_second_submit_while_awaiting_is_busy() {
        let session = Arc::new(ChatSession::new());
        let agent = Arc::new(BlockingAgent {
            entered: Notify::new(),
            release: Notify::new(),
        });

        let task = {
            let session = session.clone();
            let agent = agent.clone();
            tokio::spawn(async move { session.submit("first", agent.as_ref()).await })
        };
        agent.entered.notified().await;

        assert!(matches!(
            session.state(),
            SessionState::AwaitingResponse { ref query, .. } if query == "first"
        ));
        let busy = session.submit("second", agent.as_ref()).await;
        assert!(matches!(busy, Err(SessionError::Busy { ref pending }) if pending == "first"));

        agent.release.notify_one();
        task.await.unwrap().unwrap();
        assert_eq!(session.history_len(), 1);
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn test_dropped_request_returns_to_idle() {
        let session = ChatSession::new();
        let agent = BlockingAgent {
            entered: Notify::new(),
            release: Notify::new(),
        };

        {
            let fut = session.submit("abandoned", &agent);
            tokio::pin!(fut);
            tokio::select! {
                _ = &mut fut => panic!("agent should still be blocked"),
                _ = agent.entered.notified() => {}
            }
        }

        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.history_len(), 0);
    }
}
