//! Production implementation of the workflow collaborator steps

use crate::clients::{DraftGenerator, MailClient, PageExtractor};
use crate::config::TeamConfig;
use crate::error::Result;
use crate::types::PageContent;
use crate::workflow::{CommandTrigger, DraftPipeline};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Wires the concrete clients into the `DraftPipeline` seam
pub struct DraftProcessor {
    extractor: Arc<PageExtractor>,
    generator: Arc<DraftGenerator>,
    mailer: Arc<MailClient>,
    team: TeamConfig,
}

impl DraftProcessor {
    pub fn new(
        extractor: Arc<PageExtractor>,
        generator: Arc<DraftGenerator>,
        mailer: Arc<MailClient>,
        team: TeamConfig,
    ) -> Self {
        Self {
            extractor,
            generator,
            mailer,
            team,
        }
    }
}

#[async_trait]
impl DraftPipeline for DraftProcessor {
    async fn extract_content(&self, url: &str) -> Result<PageContent> {
        self.extractor.extract(url).await
    }

    async fn resolve_recipients(&self, trigger: &CommandTrigger) -> Result<BTreeSet<String>> {
        // Team roster plus the trigger's explicit addresses; BTreeSet
        // deduplicates and makes the order irrelevant.
        let mut recipients: BTreeSet<String> = self.team.members.iter().cloned().collect();
        recipients.extend(trigger.extra_recipients.iter().cloned());
        Ok(recipients)
    }

    async fn generate_draft(&self, context: &str) -> Result<String> {
        self.generator.generate(context).await
    }

    async fn deliver(
        &self,
        recipients: &BTreeSet<String>,
        subject: &str,
        body: &str,
    ) -> Result<()> {
        self.mailer.deliver(recipients, subject, body).await
    }
}
