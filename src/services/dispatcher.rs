//! Top-level command handling.
//!
//! [`Dispatcher::handle`] takes one inbound command for one channel, runs it
//! to completion and turns every outcome, including every error, into a chat
//! reply. Long-running commands hold the channel's slot for their whole
//! duration and always give it back.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::domain::errors::{CommandError, CommandResult, ValidationError};
use crate::domain::models::{
    ChannelId, Command, CommandKind, CommandsConfig, Config, MessageContent,
};
use crate::domain::ports::{Messenger, MovieCatalog};
use crate::services::channel_scheduler::ChannelScheduler;
use crate::services::command_registry::{CommandRegistry, HELP_TEXT};
use crate::services::fetch_workflow::{FetchOutcome, FetchWorkflow};
use crate::services::poll_workflow::{PollEvent, PollOutcome, PollSettings, PollWorkflow};
use crate::services::query_compiler::QueryCompiler;

const UNRECOGNIZED: &str = "I don't know that one. Say `help` to see what I can do.";
const CANCEL_DELIVERED: &str = "Stopping the current task.";
const NOTHING_TO_CANCEL: &str = "Nothing is running in this channel.";

/// How a call to [`Dispatcher::handle`] ended.
#[derive(Debug)]
pub enum DispatchOutcome {
    Unrecognized,
    Help,
    CancelRequested { delivered: bool },
    Fetched(FetchOutcome),
    Polled(PollOutcome),
    Failed { kind: CommandKind, error: CommandError },
}

impl DispatchOutcome {
    pub const fn error(&self) -> Option<&CommandError> {
        match self {
            Self::Failed { error, .. } => Some(error),
            _ => None,
        }
    }
}

pub struct Dispatcher {
    registry: CommandRegistry,
    compiler: QueryCompiler,
    scheduler: ChannelScheduler,
    messenger: Arc<dyn Messenger>,
    fetch: FetchWorkflow,
    poll: PollWorkflow,
    limits: CommandsConfig,
}

impl Dispatcher {
    pub fn new(
        catalog: Arc<dyn MovieCatalog>,
        messenger: Arc<dyn Messenger>,
        poll: PollSettings,
        limits: CommandsConfig,
    ) -> Self {
        Self {
            registry: CommandRegistry::new(),
            compiler: QueryCompiler::new(),
            scheduler: ChannelScheduler::new(),
            fetch: FetchWorkflow::new(Arc::clone(&catalog), Arc::clone(&messenger)),
            poll: PollWorkflow::new(catalog, Arc::clone(&messenger), poll),
            messenger,
            limits,
        }
    }

    pub fn from_config(
        catalog: Arc<dyn MovieCatalog>,
        messenger: Arc<dyn Messenger>,
        config: &Config,
    ) -> Self {
        Self::new(
            catalog,
            messenger,
            PollSettings::from(&config.poll),
            config.commands.clone(),
        )
    }

    pub const fn scheduler(&self) -> &ChannelScheduler {
        &self.scheduler
    }

    /// Phase changes of every poll started through this dispatcher.
    pub fn subscribe_polls(&self) -> broadcast::Receiver<PollEvent> {
        self.poll.subscribe()
    }

    /// Handle one inbound command addressed to the bot in `channel`.
    pub async fn handle(&self, raw: &str, channel: &ChannelId) -> DispatchOutcome {
        let Some((kind, rest)) = self.registry.recognize(raw) else {
            tracing::debug!(channel = %channel, text = raw, "unrecognized command");
            self.say(channel, UNRECOGNIZED).await;
            return DispatchOutcome::Unrecognized;
        };
        tracing::info!(channel = %channel, command = %kind, "command received");

        match kind {
            CommandKind::Help => {
                self.say(channel, HELP_TEXT).await;
                DispatchOutcome::Help
            }
            CommandKind::Cancel => {
                let delivered = self.scheduler.cancel(channel);
                let reply = if delivered {
                    CANCEL_DELIVERED
                } else {
                    NOTHING_TO_CANCEL
                };
                self.say(channel, reply).await;
                DispatchOutcome::CancelRequested { delivered }
            }
            CommandKind::Fetch | CommandKind::Poll => self.run_exclusive(kind, rest, channel).await,
        }
    }

    async fn run_exclusive(&self, kind: CommandKind, rest: &str, channel: &ChannelId) -> DispatchOutcome {
        let guard = match self.scheduler.try_acquire(channel) {
            Ok(guard) => guard,
            Err(err) => return self.fail(channel, kind, err).await,
        };

        let command = match self.prepare(kind, rest) {
            Ok(command) => command,
            Err(err) => {
                guard.release();
                return self.fail(channel, kind, err).await;
            }
        };

        let token = CancellationToken::new();
        self.scheduler.register_task(&guard, token.clone());
        tracing::info!(
            channel = %channel,
            command = %kind,
            task_id = %guard.task_id(),
            amount = command.amount,
            filter = %command.filter,
            "command started"
        );

        let result = if command.kind == CommandKind::Poll {
            self.poll
                .run(channel, &command.filter, command.amount, &token)
                .await
                .map(DispatchOutcome::Polled)
        } else {
            self.fetch
                .run(channel, &command.filter, command.amount, &token)
                .await
                .map(DispatchOutcome::Fetched)
        };
        guard.release();

        match result {
            Ok(outcome) => outcome,
            Err(err) => self.fail(channel, kind, err).await,
        }
    }

    /// Parse and validate the arguments of a slot-holding command.
    fn prepare(&self, kind: CommandKind, rest: &str) -> CommandResult<Command> {
        let request = self.registry.parse_arguments(kind, rest)?;
        let amount = self.validate_amount(request.amount)?;
        let filter = self.compiler.try_compile(request.expression.as_ref())?;
        Ok(Command {
            kind,
            amount,
            filter,
        })
    }

    fn validate_amount(&self, amount: Option<i64>) -> Result<u32, ValidationError> {
        let Some(amount) = amount else {
            return Ok(self.limits.default_amount);
        };
        let (min, max) = (self.limits.min_amount, self.limits.max_amount);
        u32::try_from(amount)
            .ok()
            .filter(|n| (min..=max).contains(n))
            .ok_or(ValidationError::AmountOutOfRange { amount, min, max })
    }

    async fn fail(&self, channel: &ChannelId, kind: CommandKind, error: CommandError) -> DispatchOutcome {
        match &error {
            CommandError::Collaborator(reason) => {
                tracing::error!(channel = %channel, command = %kind, %reason, "command failed");
            }
            other => {
                tracing::info!(channel = %channel, command = %kind, outcome = %other, "command ended early");
            }
        }
        self.say(channel, &error.user_message()).await;
        DispatchOutcome::Failed { kind, error }
    }

    async fn say(&self, channel: &ChannelId, text: &str) {
        if let Err(err) = self.messenger.send(channel, MessageContent::text(text)).await {
            tracing::warn!(channel = %channel, error = %err, "failed to deliver reply");
        }
    }
}
