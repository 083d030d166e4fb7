//! Identifier newtypes
//!
//! Users, conversations and sessions are identified by UUIDs assigned by the
//! backend (or, for sessions, by the client at sign-in). Messages carry either
//! a server UUID or a temporary id while they are still optimistic.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Prefix used by the textual form of temporary message ids
pub const TEMP_ID_PREFIX: &str = "temp-";

macro_rules! uuid_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Wrap an existing UUID
            #[inline]
            pub const fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Generate a fresh random id
            #[must_use]
            pub fn new_v4() -> Self {
                Self(Uuid::new_v4())
            }

            /// Get the inner UUID
            #[inline]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl FromStr for $name {
            type Err = IdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self).map_err(|_| IdParseError::InvalidUuid)
            }
        }
    };
}

uuid_newtype!(
    /// Backend user id
    UserId
);
uuid_newtype!(
    /// Conversation (channel or DM) id
    ConversationId
);
uuid_newtype!(
    /// Client-side authenticated session id; owner tag of the conversation cache
    SessionId
);

/// Error when parsing an id from its string form
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IdParseError {
    #[error("invalid uuid")]
    InvalidUuid,

    #[error("invalid temporary message id")]
    InvalidTempId,
}

/// Message identifier
///
/// `Server` ids are assigned by the backend. `Temp` ids are generated locally
/// for optimistic placeholders and render as `temp-<millis>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MessageId {
    Server(Uuid),
    Temp(i64),
}

impl MessageId {
    /// Check if this is a locally generated placeholder id
    #[inline]
    pub const fn is_temp(&self) -> bool {
        matches!(self, Self::Temp(_))
    }

    /// Get the server UUID, if assigned
    #[inline]
    pub const fn server_id(&self) -> Option<Uuid> {
        match self {
            Self::Server(id) => Some(*id),
            Self::Temp(_) => None,
        }
    }

    /// Parse from string representation
    pub fn parse(s: &str) -> Result<Self, IdParseError> {
        if let Some(rest) = s.strip_prefix(TEMP_ID_PREFIX) {
            return rest
                .parse::<i64>()
                .map(Self::Temp)
                .map_err(|_| IdParseError::InvalidTempId);
        }
        Uuid::parse_str(s)
            .map(Self::Server)
            .map_err(|_| IdParseError::InvalidUuid)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Server(id) => write!(f, "{id}"),
            Self::Temp(ts) => write!(f, "{TEMP_ID_PREFIX}{ts}"),
        }
    }
}

impl From<Uuid> for MessageId {
    fn from(id: Uuid) -> Self {
        Self::Server(id)
    }
}

impl FromStr for MessageId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// Serialize using the textual form so temp ids survive a JSON round trip
impl Serialize for MessageId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MessageId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
