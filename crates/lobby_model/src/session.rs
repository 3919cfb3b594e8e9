//! Session and member records.
//!
//! A [`Session`] is always replaced wholesale when the registry returns a new
//! snapshot; nothing in this crate mutates one field by field.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Member attribute holding the display name.
pub const PLAYER_NAME_KEY: &str = "playerName";

/// Member attribute holding the ready flag (`"true"` / `"false"`).
pub const IS_READY_KEY: &str = "isReady";

/// Session attribute holding the host's display name.
pub const HOST_NAME_KEY: &str = "hostName";

/// Session attribute carrying the out-of-band connection token members use
/// to reach the host once the game starts.
pub const CONNECTION_TOKEN_KEY: &str = "connectionToken";

/// Ordered public key/value data attached to sessions and members.
pub type Attributes = BTreeMap<String, String>;

/// Registry-assigned session identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of a participant. Unique within a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(pub String);

impl MemberId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Build the public attribute map published for the local player.
#[must_use]
pub fn member_attributes(name: &str, ready: bool) -> Attributes {
    let mut attributes = Attributes::new();
    attributes.insert(PLAYER_NAME_KEY.to_string(), name.to_string());
    attributes.insert(IS_READY_KEY.to_string(), ready.to_string());
    attributes
}

/// A participant entry within a [`Session`].
///
/// Identity is the [`MemberId`]. Roster diffing only looks at the id and the
/// ready flag; other attributes may change without counting as a change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    /// The member's identity.
    pub id: MemberId,
    /// Public attributes, including at least [`PLAYER_NAME_KEY`] and
    /// [`IS_READY_KEY`] for members created by this client.
    pub attributes: Attributes,
}

impl Member {
    /// Create a member carrying a display name and ready flag.
    #[must_use]
    pub fn new(id: impl Into<String>, name: &str, ready: bool) -> Self {
        Self {
            id: MemberId::new(id),
            attributes: member_attributes(name, ready),
        }
    }

    /// Returns the display name, if the member published one.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.attributes.get(PLAYER_NAME_KEY).map(String::as_str)
    }

    /// Returns the raw ready flag as published.
    #[must_use]
    pub fn ready_flag(&self) -> Option<&str> {
        self.attributes.get(IS_READY_KEY).map(String::as_str)
    }

    /// Returns the ready flag. `"true"` in any letter case reads as ready;
    /// anything else, or no flag, reads as not ready.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready_flag()
            .is_some_and(|flag| flag.trim().eq_ignore_ascii_case("true"))
    }
}

/// A shared registry record representing one multiplayer lobby.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Registry-assigned identifier.
    pub id: SessionId,
    /// Display name shown in session lists.
    pub name: String,
    /// Maximum number of members, host included.
    pub max_members: u32,
    /// Private sessions are hidden from lists and joined by code only.
    pub is_private: bool,
    /// Short human-shareable code for joining.
    pub join_code: Option<String>,
    /// The member that owns the session lifecycle.
    pub host_id: MemberId,
    /// Creation time, milliseconds since the Unix epoch.
    pub created_at_ms: u64,
    /// Public session attributes (host name, connection token, ...).
    pub attributes: Attributes,
    /// The roster, in the order the registry returns it.
    pub members: Vec<Member>,
}

impl Session {
    /// Look up a member by id.
    #[must_use]
    pub fn member(&self, id: &MemberId) -> Option<&Member> {
        self.members.iter().find(|m| &m.id == id)
    }

    #[must_use]
    pub fn contains_member(&self, id: &MemberId) -> bool {
        self.member(id).is_some()
    }

    #[must_use]
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.members.len() >= self.max_members as usize
    }

    #[must_use]
    pub fn host_name(&self) -> Option<&str> {
        self.attributes.get(HOST_NAME_KEY).map(String::as_str)
    }

    #[must_use]
    pub fn connection_token(&self) -> Option<&str> {
        self.attributes.get(CONNECTION_TOKEN_KEY).map(String::as_str)
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "session {:?} members:{}/{} private:{} code:{} id:{} host:{} created:{}",
            self.name,
            self.members.len(),
            self.max_members,
            self.is_private,
            self.join_code.as_deref().unwrap_or("-"),
            self.id,
            self.host_id,
            self.created_at_ms,
        )?;
        if !self.attributes.is_empty() {
            f.write_str(" data:")?;
            for (i, (key, value)) in self.attributes.iter().enumerate() {
                let sep = if i == 0 { "" } else { "," };
                write!(f, "{sep}{key}={value}")?;
            }
        }
        Ok(())
    }
}
