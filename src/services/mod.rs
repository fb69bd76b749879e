//! Core services: parsing, compilation, scheduling and the command workflows.

pub mod channel_scheduler;
pub mod command_registry;
pub mod constraint_parser;
pub mod dispatcher;
pub mod fetch_workflow;
pub mod movie_card;
pub mod poll_workflow;
pub mod query_compiler;

pub use channel_scheduler::{ChannelScheduler, SlotGuard, SlotState};
pub use command_registry::{CommandRegistry, HELP_TEXT};
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use fetch_workflow::{FetchOutcome, FetchWorkflow};
pub use movie_card::{card_for, integer_to_keycap, render_plain, INTRO};
pub use poll_workflow::{
    select_winner, Candidate, PollEvent, PollOutcome, PollPhase, PollSettings, PollWorkflow,
};
pub use query_compiler::{Field, Operator, QueryCompiler};
