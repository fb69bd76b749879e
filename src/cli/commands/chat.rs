//! Implementation of the `djinn chat` command.
//!
//! Every stdin line is one inbound chat message: `[#channel] text`, or
//! `vote <id>` to react to a published message with the vote symbol. Each
//! command runs on its own task so a waiting poll never blocks other
//! channels.

use anyhow::{Context, Result};
use clap::Args;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::{JoinError, JoinSet};

use crate::adapters::messaging::ConsoleMessenger;
use crate::adapters::sqlite::{initialize_database, SqliteMovieCatalog};
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{ChannelId, Config};
use crate::domain::ports::MovieCatalog;
use crate::infrastructure::config::ConfigLoader;
use crate::services::{DispatchOutcome, Dispatcher};

#[derive(Args, Debug)]
pub struct ChatArgs {
    /// Channel for lines without a `#channel` prefix
    #[arg(long, default_value = "general")]
    pub channel: String,

    /// Override the poll wait, in seconds
    #[arg(long)]
    pub wait_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ChatLine {
    Empty,
    Vote(u64),
    Command { channel: ChannelId, text: String },
    Invalid(String),
}

fn parse_line(line: &str, default_channel: &ChannelId) -> ChatLine {
    let line = line.trim();
    if line.is_empty() {
        return ChatLine::Empty;
    }

    let (first, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    if first.eq_ignore_ascii_case("vote") {
        return rest
            .trim()
            .parse()
            .map_or_else(|_| ChatLine::Invalid(format!("not a message id: `{}`", rest.trim())), ChatLine::Vote);
    }

    let tag = first.trim_start_matches('[').trim_end_matches(']');
    match tag.strip_prefix('#') {
        Some("") => ChatLine::Invalid("empty channel name".to_string()),
        Some(name) => ChatLine::Command {
            channel: ChannelId::new(name),
            text: rest.trim().to_string(),
        },
        None => ChatLine::Command {
            channel: default_channel.clone(),
            text: line.to_string(),
        },
    }
}

#[derive(Debug, Default, serde::Serialize)]
pub struct ChatOutput {
    pub commands: usize,
    pub votes: usize,
    pub fetched: usize,
    pub polls: usize,
    pub failed: usize,
    pub cancelled_on_exit: usize,
}

impl ChatOutput {
    fn record(&mut self, joined: Result<DispatchOutcome, JoinError>) {
        match joined {
            Ok(DispatchOutcome::Fetched(_)) => self.fetched += 1,
            Ok(DispatchOutcome::Polled(_)) => self.polls += 1,
            Ok(DispatchOutcome::Failed { .. }) => self.failed += 1,
            Ok(_) => {}
            Err(err) => {
                self.failed += 1;
                tracing::error!(error = %err, "command task aborted");
            }
        }
    }
}

impl CommandOutput for ChatOutput {
    fn to_human(&self) -> String {
        format!(
            "Handled {} command(s): {} fetch(es), {} poll(s), {} failed; {} vote(s) cast, {} task(s) cancelled on exit.",
            self.commands, self.fetched, self.polls, self.failed, self.votes, self.cancelled_on_exit
        )
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Apply command-line overrides and validate the result again.
fn with_overrides(args: &ChatArgs, config: &Config) -> Result<Config> {
    let mut config = config.clone();
    if let Some(wait_secs) = args.wait_secs {
        config.poll.wait_secs = wait_secs;
    }
    ConfigLoader::validate(&config).context("Invalid chat options")?;
    Ok(config)
}

pub async fn execute(args: ChatArgs, config: &Config, json_mode: bool) -> Result<()> {
    let config = with_overrides(&args, config)?;

    let pool = initialize_database(&config.database)
        .await
        .context("Failed to open movie database")?;
    let catalog: Arc<dyn MovieCatalog> = Arc::new(SqliteMovieCatalog::new(pool));
    let messenger = ConsoleMessenger::new(config.poll.vote_symbol.clone());
    let dispatcher = Arc::new(Dispatcher::from_config(
        catalog,
        Arc::new(messenger.clone()),
        &config,
    ));
    let default_channel = ChannelId::new(args.channel);

    if !json_mode {
        println!(
            "{}",
            console::style(format!(
                "Listening on {default_channel}. Type `help`, `#channel <command>`, `vote <id>`; Ctrl-D to quit."
            ))
            .dim()
        );
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut tasks: JoinSet<DispatchOutcome> = JoinSet::new();
    let mut stats = ChatOutput::default();
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else { break };
                match parse_line(&line, &default_channel) {
                    ChatLine::Empty => {}
                    ChatLine::Vote(id) => match messenger.cast_vote(id).await {
                        Ok(count) => {
                            stats.votes += 1;
                            tracing::debug!(message = id, count, "vote cast");
                        }
                        Err(err) => eprintln!("{}", console::style(err).yellow()),
                    },
                    ChatLine::Command { channel, text } => {
                        stats.commands += 1;
                        let dispatcher = Arc::clone(&dispatcher);
                        tasks.spawn(async move { dispatcher.handle(&text, &channel).await });
                    }
                    ChatLine::Invalid(reason) => eprintln!("{}", console::style(reason).yellow()),
                }
            }
            _ = &mut shutdown => break,
            Some(joined) = tasks.join_next(), if !tasks.is_empty() => stats.record(joined),
        }
    }

    stats.cancelled_on_exit = dispatcher.scheduler().cancel_all();
    while let Some(joined) = tasks.join_next().await {
        stats.record(joined);
    }

    output(&stats, json_mode);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn general() -> ChannelId {
        ChannelId::from("general")
    }

    fn chat_args(wait_secs: Option<u64>) -> ChatArgs {
        ChatArgs {
            channel: "general".to_string(),
            wait_secs,
        }
    }

    #[test]
    fn test_wait_override_is_validated() {
        let config = Config::default();

        let overridden = with_overrides(&chat_args(Some(30)), &config).unwrap();
        assert_eq!(overridden.poll.wait_secs, 30);

        let kept = with_overrides(&chat_args(None), &config).unwrap();
        assert_eq!(kept.poll.wait_secs, config.poll.wait_secs);

        assert!(with_overrides(&chat_args(Some(0)), &config).is_err());
    }

    #[test]
    fn test_parse_plain_command() {
        assert_eq!(
            parse_line("fetch 2", &general()),
            ChatLine::Command {
                channel: general(),
                text: "fetch 2".to_string()
            }
        );
    }

    #[test]
    fn test_parse_channel_prefix() {
        let expected = ChatLine::Command {
            channel: ChannelId::from("movies"),
            text: "poll where rating > 8".to_string(),
        };
        assert_eq!(parse_line("#movies poll where rating > 8", &general()), expected);
        assert_eq!(parse_line("[#movies] poll where rating > 8", &general()), expected);
        assert!(matches!(parse_line("# fetch", &general()), ChatLine::Invalid(_)));
    }

    #[test]
    fn test_parse_vote_and_empty() {
        assert_eq!(parse_line("vote 12", &general()), ChatLine::Vote(12));
        assert!(matches!(parse_line("vote x", &general()), ChatLine::Invalid(_)));
        assert_eq!(parse_line("   ", &general()), ChatLine::Empty);
    }

    #[test]
    fn test_summary_counts() {
        let mut stats = ChatOutput::default();
        stats.record(Ok(DispatchOutcome::Help));
        stats.record(Ok(DispatchOutcome::CancelRequested { delivered: false }));
        assert_eq!(stats.failed, 0);
        assert!(stats.to_human().starts_with("Handled 0 command(s)"));
    }
}
