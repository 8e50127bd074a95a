//! Chat channel implementations for ThreadSage.
//!
//! Each channel connects to a chat platform and relays messages to/from
//! the pipeline. Channels are trait-based and platform-agnostic.
//!
//! Available channels:
//! - **Slack**: Events API inbound, Web API outbound
//! - **CLI**: Interactive terminal chat (stdin/stdout)

pub mod cli;
pub mod events;
pub mod slack;

pub use cli::CliChannel;
pub use events::{ChallengeResponse, EventEnvelope, SlackEvent, strip_mention};
pub use slack::{SlackChannel, SlackConfig, verify_signature};
