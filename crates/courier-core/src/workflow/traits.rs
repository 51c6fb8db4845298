//! Collaborator trait for the draft workflow steps

use super::trigger::CommandTrigger;
use crate::error::Result;
use crate::types::PageContent;
use async_trait::async_trait;
use std::collections::BTreeSet;

/// The external collaborators the workflow depends on, behind one trait.
///
/// Each step has explicit, required parameters - no optional context objects.
/// This enables compile-time safety and easy mocking for tests.
#[async_trait]
pub trait DraftPipeline: Send + Sync {
    /// Fetch a web page and extract its title and readable text
    async fn extract_content(&self, url: &str) -> Result<PageContent>;

    /// Resolve the full recipient set for an invocation (team roster plus
    /// the trigger's explicit addresses, deduplicated)
    async fn resolve_recipients(&self, trigger: &CommandTrigger) -> Result<BTreeSet<String>>;

    /// Generate an email draft from free-text context
    async fn generate_draft(&self, context: &str) -> Result<String>;

    /// Deliver the email to the resolved recipients
    async fn deliver(
        &self,
        recipients: &BTreeSet<String>,
        subject: &str,
        body: &str,
    ) -> Result<()>;
}
