//! Rendering of sessions and lifecycle events.

use anyhow::Result;
use lobby_model::Session;
use lobby_sync::SessionEvent;
use tracing::info;

/// How sessions and events reach the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Output {
    /// Structured log lines through `tracing`.
    #[default]
    Log,
    /// One JSON object per line on stdout.
    Json,
}

impl Output {
    #[must_use]
    pub fn from_json_flag(json: bool) -> Self {
        if json { Self::Json } else { Self::Log }
    }

    pub fn event(self, event: &SessionEvent) -> Result<()> {
        match self {
            Self::Json => println!("{}", serde_json::to_string(event)?),
            Self::Log => match event {
                SessionEvent::Changed { session, is_ready } => {
                    info!(%session, is_ready, "session changed");
                }
                SessionEvent::NotInSession { reason } => {
                    info!(?reason, "no longer in a session");
                }
            },
        }
        Ok(())
    }

    pub fn session(self, session: &Session) -> Result<()> {
        match self {
            Self::Json => println!("{}", serde_json::to_string(session)?),
            Self::Log => info!(%session, "session"),
        }
        Ok(())
    }
}
