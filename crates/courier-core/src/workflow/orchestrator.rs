//! Workflow coordinator for the interactive confirmation loop

use super::collector::{ActionCollector, Collected};
use super::solicitor::EditSolicitor;
use super::traits::DraftPipeline;
use super::trigger::CommandTrigger;
use super::types::{DraftAction, DraftSession, MessageRef, WorkflowState};
use crate::chat::ChatTransport;
use crate::constants::{ACTION_TIMEOUT_SECS, EDIT_REPLY_TIMEOUT_SECS, EMAIL_SUBJECT};
use crate::error::{CourierError, Result};
use crate::types::WorkflowContext;
use std::sync::Arc;
use std::time::Duration;

/// Drives one workflow instance from trigger to exactly one terminal state.
///
/// The loop is strictly sequential: at any time at most one draft message is
/// live and at most one collector is armed, so delivery can only ever use the
/// draft content current at the moment send was clicked.
pub struct WorkflowOrchestrator<P: DraftPipeline, C: ChatTransport> {
    pipeline: P,
    transport: Arc<C>,
    action_window: Duration,
    edit_window: Duration,
}

impl<P: DraftPipeline, C: ChatTransport> WorkflowOrchestrator<P, C> {
    pub fn new(pipeline: P, transport: Arc<C>) -> Self {
        Self {
            pipeline,
            transport,
            action_window: Duration::from_secs(ACTION_TIMEOUT_SECS),
            edit_window: Duration::from_secs(EDIT_REPLY_TIMEOUT_SECS),
        }
    }

    pub fn with_windows(mut self, action_window: Duration, edit_window: Duration) -> Self {
        self.action_window = action_window;
        self.edit_window = edit_window;
        self
    }

    /// Run one workflow instance to completion.
    ///
    /// Collaborator failures before any draft is posted abort the instance;
    /// they are reported to the invoking chat and returned to the caller.
    /// Once a draft is posted the instance always ends in a terminal state.
    pub async fn run(&self, trigger: CommandTrigger) -> Result<WorkflowState> {
        let chat = trigger.chat.clone();
        let workflow_id = trigger.workflow_id.clone();

        match self.drive(trigger).await {
            Ok(state) => {
                log::info!("Workflow {} finished in state {:?}", workflow_id, state);
                Ok(state)
            }
            Err(e) => {
                log::error!("Workflow {} aborted: {}", workflow_id, e);
                if let Err(notify_err) = self
                    .transport
                    .notify(&chat, &format!("Could not prepare the email: {}", e))
                    .await
                {
                    log::error!("Failed to report workflow error: {}", notify_err);
                }
                Err(e)
            }
        }
    }

    async fn drive(&self, trigger: CommandTrigger) -> Result<WorkflowState> {
        log::info!(
            "Workflow {} triggered for {} by user {}",
            trigger.workflow_id,
            trigger.url,
            trigger.user.value()
        );

        let page = self.pipeline.extract_content(&trigger.url).await?;
        log::info!("Extracted page '{}' from {}", page.title, trigger.url);

        let recipients = self.pipeline.resolve_recipients(&trigger).await?;
        if recipients.is_empty() {
            return Err(CourierError::Workflow(
                "No recipients resolved. Add addresses to the command or configure the team roster."
                    .to_string(),
            ));
        }

        let initial = self.pipeline.generate_draft(&page.as_context()).await?;

        let context = WorkflowContext {
            source_url: trigger.url,
            title: page.title,
            text: page.text,
            authorized_user: trigger.user,
            chat: trigger.chat,
            recipients,
        };
        let mut session = DraftSession::new(trigger.workflow_id, initial);

        self.confirm_loop(&context, &mut session).await
    }

    /// The AwaitingAction/Editing loop. Returns the terminal state reached.
    async fn confirm_loop(
        &self,
        context: &WorkflowContext,
        session: &mut DraftSession,
    ) -> Result<WorkflowState> {
        let mut live = self.post_draft(context, session).await?;

        loop {
            session.state = WorkflowState::AwaitingAction;

            let collector = ActionCollector::new(live.clone(), context.authorized_user)
                .with_window(self.action_window);

            match collector.collect(self.transport.as_ref()).await? {
                Collected::Expired => {
                    session.finish(WorkflowState::Expired);
                    self.cleanup(context, &live, "Draft expired with no action taken.")
                        .await;
                    return Ok(WorkflowState::Expired);
                }

                Collected::Action(DraftAction::Cancel) => {
                    session.finish(WorkflowState::Canceled);
                    self.cleanup(context, &live, "Email canceled.").await;
                    return Ok(WorkflowState::Canceled);
                }

                Collected::Action(DraftAction::Send) => {
                    let delivery = self
                        .pipeline
                        .deliver(
                            &context.recipients,
                            EMAIL_SUBJECT,
                            &session.draft().content,
                        )
                        .await;

                    return match delivery {
                        Ok(()) => {
                            log::info!(
                                "Workflow {} delivered draft v{} to {} recipients",
                                session.workflow_id,
                                session.draft().version,
                                context.recipients.len()
                            );
                            session.finish(WorkflowState::Sent);
                            self.cleanup(context, &live, "Email sent!").await;
                            Ok(WorkflowState::Sent)
                        }
                        Err(e) => {
                            log::error!("Workflow {} delivery failed: {}", session.workflow_id, e);
                            session.finish(WorkflowState::Failed);
                            self.cleanup(context, &live, &format!("Email delivery failed: {}", e))
                                .await;
                            Ok(WorkflowState::Failed)
                        }
                    };
                }

                Collected::Action(DraftAction::Edit) => {
                    session.state = WorkflowState::Editing;

                    let solicitor =
                        EditSolicitor::new(context.chat.clone(), context.authorized_user)
                            .with_window(self.edit_window);

                    let instructions = match solicitor.solicit(self.transport.as_ref()).await? {
                        Some(instructions) => instructions,
                        None => {
                            // Edit timed out: the previous draft stays live
                            // and actionable on the same message.
                            self.notify_best_effort(
                                context,
                                "No edit instructions received; the previous draft is still awaiting action.",
                            )
                            .await;
                            continue;
                        }
                    };

                    // Cumulative context: the original page content plus the
                    // new instructions, never the prior draft text.
                    let edit_context =
                        format!("{}\n{}\n\n{}", context.title, context.text, instructions);

                    let regenerated = match self.pipeline.generate_draft(&edit_context).await {
                        Ok(content) => content,
                        Err(e) => {
                            // Keep the prior draft actionable rather than
                            // losing state on a backend failure.
                            log::error!(
                                "Workflow {} regeneration failed: {}",
                                session.workflow_id,
                                e
                            );
                            self.notify_best_effort(
                                context,
                                &format!(
                                    "Draft regeneration failed: {}. The previous draft is still awaiting action.",
                                    e
                                ),
                            )
                            .await;
                            continue;
                        }
                    };

                    session.record_feedback(instructions, context.authorized_user);

                    // Supersede the old message before posting the new one so
                    // a stale click can never race the regenerated draft.
                    self.transport.remove_actions(&live).await?;

                    session.replace_draft(regenerated);
                    session.state = WorkflowState::Drafting;
                    live = self.post_draft(context, session).await?;
                }
            }
        }
    }

    async fn post_draft(
        &self,
        context: &WorkflowContext,
        session: &DraftSession,
    ) -> Result<MessageRef> {
        let text = format!(
            "Are you sure you want to send this email?\n\n{}",
            session.draft().content
        );
        self.transport.post_draft(&context.chat, &text).await
    }

    /// Terminal cleanup: disable whatever controls are still live and post
    /// the outcome notice. Both are best-effort; the terminal state stands.
    async fn cleanup(&self, context: &WorkflowContext, live: &MessageRef, notice: &str) {
        if let Err(e) = self.transport.remove_actions(live).await {
            log::warn!("Failed to remove draft controls: {}", e);
        }
        self.notify_best_effort(context, notice).await;
    }

    async fn notify_best_effort(&self, context: &WorkflowContext, text: &str) {
        if let Err(e) = self.transport.notify(&context.chat, text).await {
            log::warn!("Failed to notify chat {}: {}", context.chat, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PageContent;
    use crate::workflow::{ChatId, UserId};
    use async_trait::async_trait;
    use std::collections::BTreeSet;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    const USER: i64 = 42;

    fn trigger(extra: &[&str]) -> CommandTrigger {
        let text = format!("!email https://example.com {}", extra.join(" "));
        CommandTrigger::parse(text.trim(), UserId::new(USER), ChatId::new("chat-1"))
            .unwrap()
            .unwrap()
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct DeliveryCall {
        recipients: BTreeSet<String>,
        subject: String,
        body: String,
    }

    struct MockPipeline {
        fail_extract: bool,
        fail_deliver: bool,
        fail_generation_after: Option<usize>,
        team: Vec<String>,
        generate_calls: Mutex<Vec<String>>,
        deliveries: Mutex<Vec<DeliveryCall>>,
    }

    impl MockPipeline {
        fn new() -> Self {
            Self {
                fail_extract: false,
                fail_deliver: false,
                fail_generation_after: None,
                team: vec!["team@x.com".to_string()],
                generate_calls: Mutex::new(Vec::new()),
                deliveries: Mutex::new(Vec::new()),
            }
        }

        fn deliveries(&self) -> Vec<DeliveryCall> {
            self.deliveries.lock().unwrap().clone()
        }

        fn generate_calls(&self) -> Vec<String> {
            self.generate_calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DraftPipeline for MockPipeline {
        async fn extract_content(&self, _url: &str) -> Result<PageContent> {
            if self.fail_extract {
                return Err(CourierError::Fetch("navigation failed".to_string()));
            }
            Ok(PageContent {
                title: "Example".to_string(),
                text: "Hello".to_string(),
            })
        }

        async fn resolve_recipients(
            &self,
            trigger: &CommandTrigger,
        ) -> Result<BTreeSet<String>> {
            let mut recipients: BTreeSet<String> = self.team.iter().cloned().collect();
            recipients.extend(trigger.extra_recipients.iter().cloned());
            Ok(recipients)
        }

        async fn generate_draft(&self, context: &str) -> Result<String> {
            let mut calls = self.generate_calls.lock().unwrap();
            if let Some(limit) = self.fail_generation_after {
                if calls.len() >= limit {
                    return Err(CourierError::Generation("backend down".to_string()));
                }
            }
            calls.push(context.to_string());
            Ok(format!("draft v{}", calls.len() - 1))
        }

        async fn deliver(
            &self,
            recipients: &BTreeSet<String>,
            subject: &str,
            body: &str,
        ) -> Result<()> {
            self.deliveries.lock().unwrap().push(DeliveryCall {
                recipients: recipients.clone(),
                subject: subject.to_string(),
                body: body.to_string(),
            });
            if self.fail_deliver {
                return Err(CourierError::Delivery("smtp refused".to_string()));
            }
            Ok(())
        }
    }

    /// Scripted transport: each armed collector pops the next action, each
    /// solicitor pops the next reply. Records everything for assertions.
    struct MockTransport {
        actions: Mutex<VecDeque<Option<DraftAction>>>,
        replies: Mutex<VecDeque<Option<String>>>,
        next_message_id: Mutex<i64>,
        posts: Mutex<Vec<(i64, String)>>,
        awaited: Mutex<Vec<i64>>,
        removed: Mutex<Vec<i64>>,
        notices: Mutex<Vec<String>>,
    }

    impl MockTransport {
        fn scripted(actions: Vec<Option<DraftAction>>, replies: Vec<Option<String>>) -> Arc<Self> {
            Arc::new(Self {
                actions: Mutex::new(actions.into()),
                replies: Mutex::new(replies.into()),
                next_message_id: Mutex::new(0),
                posts: Mutex::new(Vec::new()),
                awaited: Mutex::new(Vec::new()),
                removed: Mutex::new(Vec::new()),
                notices: Mutex::new(Vec::new()),
            })
        }

        fn posts(&self) -> Vec<(i64, String)> {
            self.posts.lock().unwrap().clone()
        }

        fn removed(&self) -> Vec<i64> {
            self.removed.lock().unwrap().clone()
        }

        fn awaited(&self) -> Vec<i64> {
            self.awaited.lock().unwrap().clone()
        }

        fn notices(&self) -> Vec<String> {
            self.notices.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatTransport for MockTransport {
        async fn post_draft(&self, chat: &ChatId, text: &str) -> Result<MessageRef> {
            let mut next = self.next_message_id.lock().unwrap();
            *next += 1;
            let id = *next;
            self.posts.lock().unwrap().push((id, text.to_string()));
            Ok(MessageRef {
                chat: chat.clone(),
                message_id: crate::workflow::MessageId::new(id),
            })
        }

        async fn await_action(
            &self,
            message: &MessageRef,
            user: UserId,
            _window: Duration,
        ) -> Result<Option<DraftAction>> {
            assert_eq!(user, UserId::new(USER));
            self.awaited
                .lock()
                .unwrap()
                .push(message.message_id.value());
            Ok(self
                .actions
                .lock()
                .unwrap()
                .pop_front()
                .expect("collector armed more often than scripted"))
        }

        async fn await_reply(
            &self,
            _chat: &ChatId,
            user: UserId,
            _window: Duration,
        ) -> Result<Option<String>> {
            assert_eq!(user, UserId::new(USER));
            Ok(self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .expect("solicitor armed more often than scripted"))
        }

        async fn remove_actions(&self, message: &MessageRef) -> Result<()> {
            self.removed
                .lock()
                .unwrap()
                .push(message.message_id.value());
            Ok(())
        }

        async fn notify(&self, _chat: &ChatId, text: &str) -> Result<()> {
            self.notices.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    fn orchestrator(
        pipeline: MockPipeline,
        transport: Arc<MockTransport>,
    ) -> WorkflowOrchestrator<MockPipeline, MockTransport> {
        WorkflowOrchestrator::new(pipeline, transport)
    }

    #[tokio::test]
    async fn test_send_delivers_once_with_fixed_subject() {
        let transport = MockTransport::scripted(vec![Some(DraftAction::Send)], vec![]);
        let orch = orchestrator(MockPipeline::new(), transport.clone());

        let state = orch.run(trigger(&["a@x.com"])).await.unwrap();
        assert_eq!(state, WorkflowState::Sent);

        let deliveries = orch.pipeline.deliveries();
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].subject, "Generated Email");
        assert_eq!(deliveries[0].body, "draft v0");
        assert!(deliveries[0].recipients.contains("a@x.com"));
        assert!(deliveries[0].recipients.contains("team@x.com"));

        // The posted draft shows the generated content, and its controls are
        // cleaned up at the terminal state
        assert!(transport.posts()[0].1.contains("draft v0"));
        assert_eq!(transport.removed(), vec![1]);
        assert_eq!(transport.notices(), vec!["Email sent!".to_string()]);
    }

    #[tokio::test]
    async fn test_cancel_makes_no_delivery() {
        let transport = MockTransport::scripted(vec![Some(DraftAction::Cancel)], vec![]);
        let orch = orchestrator(MockPipeline::new(), transport.clone());

        let state = orch.run(trigger(&[])).await.unwrap();
        assert_eq!(state, WorkflowState::Canceled);
        assert!(orch.pipeline.deliveries().is_empty());
        assert_eq!(transport.removed(), vec![1]);
        assert_eq!(transport.notices(), vec!["Email canceled.".to_string()]);
    }

    #[tokio::test]
    async fn test_idle_timeout_expires_without_delivery() {
        let transport = MockTransport::scripted(vec![None], vec![]);
        let orch = orchestrator(MockPipeline::new(), transport.clone());

        let state = orch.run(trigger(&[])).await.unwrap();
        assert_eq!(state, WorkflowState::Expired);
        assert!(orch.pipeline.deliveries().is_empty());
        assert_eq!(transport.removed(), vec![1]);
    }

    #[tokio::test]
    async fn test_delivery_failure_surfaces_and_fails() {
        let transport = MockTransport::scripted(vec![Some(DraftAction::Send)], vec![]);
        let mut pipeline = MockPipeline::new();
        pipeline.fail_deliver = true;
        let orch = orchestrator(pipeline, transport.clone());

        let state = orch.run(trigger(&[])).await.unwrap();
        assert_eq!(state, WorkflowState::Failed);
        assert!(transport
            .notices()
            .iter()
            .any(|n| n.contains("Email delivery failed")));
        assert_eq!(transport.removed(), vec![1]);
    }

    #[tokio::test]
    async fn test_edit_regenerates_and_sends_latest_version() {
        let transport = MockTransport::scripted(
            vec![Some(DraftAction::Edit), Some(DraftAction::Send)],
            vec![Some("make it shorter".to_string())],
        );
        let orch = orchestrator(MockPipeline::new(), transport.clone());

        let state = orch.run(trigger(&[])).await.unwrap();
        assert_eq!(state, WorkflowState::Sent);

        // Regeneration context is the original page content plus the new
        // instructions
        let calls = orch.pipeline.generate_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], "Example\nHello");
        assert_eq!(calls[1], "Example\nHello\n\nmake it shorter");

        // Send delivered the regenerated draft, not the original
        let deliveries = orch.pipeline.deliveries();
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].body, "draft v1");

        // Old message superseded before the new one was posted; the new
        // message got its own collector
        assert_eq!(transport.posts().len(), 2);
        assert_eq!(transport.awaited(), vec![1, 2]);
        assert_eq!(transport.removed(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_edit_timeout_keeps_prior_draft_actionable() {
        let transport = MockTransport::scripted(
            vec![Some(DraftAction::Edit), Some(DraftAction::Send)],
            vec![None],
        );
        let orch = orchestrator(MockPipeline::new(), transport.clone());

        let state = orch.run(trigger(&[])).await.unwrap();
        assert_eq!(state, WorkflowState::Sent);

        // No new draft was generated or posted; the same message was
        // re-armed and the unchanged v0 content got sent
        assert_eq!(orch.pipeline.generate_calls().len(), 1);
        assert_eq!(transport.posts().len(), 1);
        assert_eq!(transport.awaited(), vec![1, 1]);
        assert_eq!(orch.pipeline.deliveries()[0].body, "draft v0");
        assert!(transport
            .notices()
            .iter()
            .any(|n| n.contains("No edit instructions received")));
    }

    #[tokio::test]
    async fn test_regeneration_failure_keeps_prior_draft_live() {
        let transport = MockTransport::scripted(
            vec![Some(DraftAction::Edit), Some(DraftAction::Cancel)],
            vec![Some("expand the intro".to_string())],
        );
        let mut pipeline = MockPipeline::new();
        pipeline.fail_generation_after = Some(1);
        let orch = orchestrator(pipeline, transport.clone());

        let state = orch.run(trigger(&[])).await.unwrap();
        assert_eq!(state, WorkflowState::Canceled);

        // The prior message stayed live: no second post, actions removed
        // only at the terminal state
        assert_eq!(transport.posts().len(), 1);
        assert_eq!(transport.awaited(), vec![1, 1]);
        assert_eq!(transport.removed(), vec![1]);
        assert!(transport
            .notices()
            .iter()
            .any(|n| n.contains("Draft regeneration failed")));
    }

    #[tokio::test]
    async fn test_fetch_failure_reports_and_aborts() {
        let transport = MockTransport::scripted(vec![], vec![]);
        let mut pipeline = MockPipeline::new();
        pipeline.fail_extract = true;
        let orch = orchestrator(pipeline, transport.clone());

        let err = orch.run(trigger(&[])).await.unwrap_err();
        assert!(matches!(err, CourierError::Fetch(_)));

        // Nothing was posted; the failure was surfaced to the chat
        assert!(transport.posts().is_empty());
        assert!(transport
            .notices()
            .iter()
            .any(|n| n.contains("Could not prepare the email")));
    }

    #[tokio::test]
    async fn test_empty_recipient_set_aborts_before_posting() {
        let transport = MockTransport::scripted(vec![], vec![]);
        let mut pipeline = MockPipeline::new();
        pipeline.team.clear();
        let orch = orchestrator(pipeline, transport.clone());

        let err = orch.run(trigger(&[])).await.unwrap_err();
        assert!(matches!(err, CourierError::Workflow(_)));
        assert!(transport.posts().is_empty());
    }
}
