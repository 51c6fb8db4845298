//! Common types used throughout the courier system

use crate::workflow::{ChatId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Content extracted from a web page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageContent {
    pub title: String,
    pub text: String,
}

impl PageContent {
    /// Flatten into the context string fed to draft generation
    pub fn as_context(&self) -> String {
        format!("{}\n{}", self.title, self.text)
    }
}

/// Immutable per-invocation workflow context
///
/// Created once when the workflow starts and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct WorkflowContext {
    pub source_url: String,
    pub title: String,
    pub text: String,
    pub authorized_user: UserId,
    pub chat: ChatId,
    pub recipients: BTreeSet<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_content_context() {
        let page = PageContent {
            title: "Example".to_string(),
            text: "Hello".to_string(),
        };
        assert_eq!(page.as_context(), "Example\nHello");
    }
}
