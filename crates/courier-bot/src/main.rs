//! Courier bot executable
//!
//! Long-polls the chat for `!email` commands and runs one workflow instance
//! per command, sharing a single transport connection across all instances.

use clap::{Arg, Command};
use courier_core::{
    clients::telegram::Update, workflow::EMAIL_COMMAND, ChatId, ChatTransport, CommandTrigger,
    CourierConfig, CourierError, DraftGenerator, DraftProcessor, MailClient, PageExtractor,
    TelegramClient, TelegramTransport, UpdateRouter, UserId, WorkflowOrchestrator,
};
use std::sync::Arc;

type BotOrchestrator = WorkflowOrchestrator<DraftProcessor, TelegramTransport>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging with INFO as default if RUST_LOG not set
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = Command::new("courier-bot")
        .version("0.1.0")
        .about("Chat-triggered email drafting with interactive confirmation")
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("credentials.json"),
        )
        .arg(
            Arg::new("poll-timeout")
                .long("poll-timeout")
                .value_name("SECONDS")
                .help("Long-poll timeout for chat updates")
                .default_value("30"),
        )
        .get_matches();

    let config_path = matches.get_one::<String>("config").unwrap();
    let config = CourierConfig::from_file(config_path)?;
    log::info!("Loaded configuration from {}", config_path);

    let poll_timeout: u64 = matches
        .get_one::<String>("poll-timeout")
        .unwrap()
        .parse()
        .map_err(|e| CourierError::Config(format!("Invalid poll timeout: {}", e)))?;

    // Process-wide chat connection, shared by all workflow instances
    let client = Arc::new(TelegramClient::new(config.telegram.clone())?);
    let router = Arc::new(UpdateRouter::new());
    let transport = Arc::new(TelegramTransport::new(client.clone(), router.clone()));

    let extractor = Arc::new(PageExtractor::new()?);
    let generator = Arc::new(DraftGenerator::new(config.openai.clone())?);
    let mailer = Arc::new(MailClient::new(config.smtp.clone())?);
    let processor = DraftProcessor::new(extractor, generator, mailer, config.team.clone());

    let orchestrator: Arc<BotOrchestrator> =
        Arc::new(WorkflowOrchestrator::new(processor, transport.clone()));

    log::info!("Initialized all services, starting update loop");

    run_update_loop(client, router, transport, orchestrator, poll_timeout).await
}

async fn run_update_loop(
    client: Arc<TelegramClient>,
    router: Arc<UpdateRouter>,
    transport: Arc<TelegramTransport>,
    orchestrator: Arc<BotOrchestrator>,
    poll_timeout: u64,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut offset: Option<i64> = None;

    loop {
        let updates = match client.get_updates(offset, poll_timeout).await {
            Ok(updates) => updates,
            Err(e) => {
                log::error!("Failed to fetch updates: {}", e);
                tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                continue;
            }
        };

        for update in updates {
            offset = Some(update.update_id + 1);

            // Scoped subscriptions (armed collectors and solicitors) get
            // first pick; whatever they leave is a fresh command or noise.
            let update = match router.route(update) {
                Some(update) => update,
                None => continue,
            };

            handle_unrouted(&client, &transport, &orchestrator, update).await;
        }
    }
}

async fn handle_unrouted(
    client: &Arc<TelegramClient>,
    transport: &Arc<TelegramTransport>,
    orchestrator: &Arc<BotOrchestrator>,
    update: Update,
) {
    // Clicks on retired drafts still need acknowledging so the client
    // stops its spinner; they change nothing.
    if let Some(callback) = &update.callback_query {
        log::debug!("Ignoring stale or unauthorized callback {}", callback.id);
        if let Err(e) = client.answer_callback(&callback.id).await {
            log::warn!("Failed to acknowledge stale callback: {}", e);
        }
        return;
    }

    let Some(message) = update.message else {
        return;
    };
    let Some(text) = message.text.as_deref() else {
        return;
    };
    let Some(from) = &message.from else {
        return;
    };
    if from.is_bot {
        return;
    }

    let chat = ChatId::new(message.chat.id.to_string());
    let user = UserId::new(from.id);

    match CommandTrigger::parse(text, user, chat.clone()) {
        Ok(Some(trigger)) => {
            log::info!(
                "Starting workflow {} for user {}",
                trigger.workflow_id,
                from.id
            );
            let orchestrator = Arc::clone(orchestrator);
            tokio::spawn(async move {
                // Failures are already reported to the chat by the
                // orchestrator; the log entry is for the operator.
                if let Err(e) = orchestrator.run(trigger).await {
                    log::error!("Workflow failed: {}", e);
                }
            });
        }
        Ok(None) => {
            // Not a command for us
            log::trace!("Ignoring chat message without {} prefix", EMAIL_COMMAND);
        }
        Err(e) => {
            log::warn!("Rejected malformed command from user {}: {}", from.id, e);
            if let Err(notify_err) = transport.notify(&chat, &e.to_string()).await {
                log::error!("Failed to report usage error: {}", notify_err);
            }
        }
    }
}
