//! Context documents for the chat prompt.

mod document;
mod json_loader;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;

use crate::error::{AiError, Result};

pub use document::{Document, DocumentMetadata, format_documents_as_string};
pub use json_loader::{DATASET_POINTERS, JsonLoader};

/// A read-only source of context documents.
#[async_trait]
pub trait ContextSource: Send + Sync {
    /// Load every document the source holds.
    async fn load(&self) -> Result<Vec<Document>>;

    /// Short label used in logs.
    fn describe(&self) -> String;
}

/// When the context source is read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReloadPolicy {
    /// Read the source on every request.
    #[default]
    PerRequest,
    /// Read the source once, on first use, and keep it for the process lifetime.
    Once,
}

impl FromStr for ReloadPolicy {
    type Err = AiError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "per_request" | "per-request" | "always" => Ok(ReloadPolicy::PerRequest),
            "once" | "startup" => Ok(ReloadPolicy::Once),
            other => Err(AiError::InvalidInput(format!(
                "Unknown context reload policy '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for ReloadPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReloadPolicy::PerRequest => write!(f, "per_request"),
            ReloadPolicy::Once => write!(f, "once"),
        }
    }
}

/// Shared handle that applies a [`ReloadPolicy`] to a [`ContextSource`].
pub struct ContextProvider {
    source: Arc<dyn ContextSource>,
    policy: ReloadPolicy,
    cache: OnceCell<Arc<Vec<Document>>>,
}

impl ContextProvider {
    pub fn new(source: Arc<dyn ContextSource>, policy: ReloadPolicy) -> Self {
        Self {
            source,
            policy,
            cache: OnceCell::new(),
        }
    }

    pub async fn documents(&self) -> Result<Arc<Vec<Document>>> {
        match self.policy {
            ReloadPolicy::PerRequest => Ok(Arc::new(self.source.load().await?)),
            ReloadPolicy::Once => self
                .cache
                .get_or_try_init(|| async {
                    tracing::info!(source = %self.source.describe(), "Caching context documents");
                    self.source.load().await.map(Arc::new)
                })
                .await
                .cloned(),
        }
    }

    /// Documents flattened into the `{context}` text.
    pub async fn context_text(&self) -> Result<String> {
        let documents = self.documents().await?;
        Ok(format_documents_as_string(&documents))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct CountingSource {
        loads: AtomicUsize,
    }

    #[async_trait]
    impl ContextSource for CountingSource {
        async fn load(&self) -> Result<Vec<Document>> {
            let n = self.loads.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(vec![Document::new(format!("load {}", n), "counting", 1)])
        }

        fn describe(&self) -> String {
            "counting".to_string()
        }
    }

    fn counting() -> Arc<CountingSource> {
        Arc::new(CountingSource {
            loads: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn test_per_request_reloads_every_call() {
        let source = counting();
        let provider = ContextProvider::new(source.clone(), ReloadPolicy::PerRequest);

        assert_eq!(provider.context_text().await.unwrap(), "load 1");
        assert_eq!(provider.context_text().await.unwrap(), "load 2");
        assert_eq!(source.loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_once_caches_first_load() {
        let source = counting();
        let provider = ContextProvider::new(source.clone(), ReloadPolicy::Once);

        assert_eq!(provider.context_text().await.unwrap(), "load 1");
        assert_eq!(provider.context_text().await.unwrap(), "load 1");
        assert_eq!(source.loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_reload_policy_parsing() {
        assert_eq!(
            "per_request".parse::<ReloadPolicy>().unwrap(),
            ReloadPolicy::PerRequest
        );
        assert_eq!("Once".parse::<ReloadPolicy>().unwrap(), ReloadPolicy::Once);
        assert!("sometimes".parse::<ReloadPolicy>().is_err());
        assert_eq!(ReloadPolicy::default().to_string(), "per_request");
    }
}
