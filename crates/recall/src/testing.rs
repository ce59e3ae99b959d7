//! Test utilities for recall - scripted oracle and instrumented sources
//!
//! These doubles let unit and integration tests drive the full pipeline
//! deterministically without network access:
//! - [`ScriptedOracle`] replays queued replies and records every call
//! - [`CountingSource`] serves fixed items and counts lookups
//! - [`FailingSource`] always fails its lookup

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::oracle::{Oracle, OracleError};
use crate::sources::{KnowledgeSource, SourceError, SourceItem};

/// One recorded oracle call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleCall {
    pub system_prompt: String,
    pub user_prompt: String,
}

#[derive(Debug)]
enum Reply {
    Text(String),
    Delayed(Duration, String),
    Fail(OracleError),
}

/// Oracle double that answers from a queue, in order.
///
/// Once the queue is empty every call fails with a transport error, so a test
/// that makes more calls than it scripted fails loudly.
#[derive(Debug, Default)]
pub struct ScriptedOracle {
    replies: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<OracleCall>>,
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply
    pub fn then_reply(self, text: impl Into<String>) -> Self {
        self.push(Reply::Text(text.into()))
    }

    /// Queue a reply that arrives after `delay`
    pub fn then_reply_after(self, delay: Duration, text: impl Into<String>) -> Self {
        self.push(Reply::Delayed(delay, text.into()))
    }

    /// Queue a failure
    pub fn then_fail(self, error: OracleError) -> Self {
        self.push(Reply::Fail(error))
    }

    fn push(self, reply: Reply) -> Self {
        self.replies
            .lock()
            .expect("scripted oracle lock poisoned")
            .push_back(reply);
        self
    }

    /// Every call received so far, in order
    pub fn calls(&self) -> Vec<OracleCall> {
        self.calls
            .lock()
            .expect("scripted oracle lock poisoned")
            .clone()
    }

    /// Replies still queued
    pub fn remaining(&self) -> usize {
        self.replies
            .lock()
            .expect("scripted oracle lock poisoned")
            .len()
    }
}

#[async_trait]
impl Oracle for ScriptedOracle {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, OracleError> {
        self.calls
            .lock()
            .expect("scripted oracle lock poisoned")
            .push(OracleCall {
                system_prompt: system_prompt.to_string(),
                user_prompt: user_prompt.to_string(),
            });

        let reply = self
            .replies
            .lock()
            .expect("scripted oracle lock poisoned")
            .pop_front();

        match reply {
            Some(Reply::Text(text)) => Ok(text),
            Some(Reply::Delayed(delay, text)) => {
                tokio::time::sleep(delay).await;
                Ok(text)
            }
            Some(Reply::Fail(error)) => Err(error),
            None => Err(OracleError::Transport("no scripted reply left".to_string())),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Source serving fixed items, counting lookups, optionally slow
#[derive(Debug)]
pub struct CountingSource {
    name: String,
    items: Vec<SourceItem>,
    delay: Option<Duration>,
    lookups: AtomicUsize,
}

impl CountingSource {
    pub fn new(name: impl Into<String>, contents: &[&str]) -> Self {
        Self {
            name: name.into(),
            items: contents.iter().map(|c| SourceItem::new(*c)).collect(),
            delay: None,
            lookups: AtomicUsize::new(0),
        }
    }

    /// Sleep before answering each lookup
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KnowledgeSource for CountingSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn lookup(&self, _query: &str) -> Result<Vec<SourceItem>, SourceError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.items.clone())
    }
}

/// Source whose lookup always fails
#[derive(Debug)]
pub struct FailingSource {
    name: String,
}

impl FailingSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl KnowledgeSource for FailingSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn lookup(&self, _query: &str) -> Result<Vec<SourceItem>, SourceError> {
        Err(SourceError::lookup(&self.name, "connection refused"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_oracle_replays_in_order() {
        let oracle = ScriptedOracle::new().then_reply("one").then_reply("two");
        assert_eq!(oracle.complete("s", "a").await.unwrap(), "one");
        assert_eq!(oracle.complete("s", "b").await.unwrap(), "two");
        assert_eq!(oracle.remaining(), 0);
        assert_eq!(oracle.calls().len(), 2);
    }

    #[tokio::test]
    async fn scripted_oracle_fails_when_exhausted() {
        let oracle = ScriptedOracle::new();
        assert!(matches!(
            oracle.complete("s", "u").await,
            Err(OracleError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn counting_source_counts() {
        let source = CountingSource::new("db", &["a", "b"]);
        assert_eq!(source.lookup("q").await.unwrap().len(), 2);
        assert_eq!(source.lookups(), 1);
    }
}
