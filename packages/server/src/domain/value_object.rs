//! Value objects
//!
//! 外部入力（クエリ、フレーム、HTTP ボディ）から生成される値は
//! ここで検証してから Hub に渡します。

use std::{borrow::Cow, fmt};

use uuid::Uuid;

use super::error::ValueObjectError;

/// Maximum length of a display name (in characters)
pub const DISPLAY_NAME_MAX_LEN: usize = 64;

/// Display name used for clients that joined without a session token
pub const ANONYMOUS_DISPLAY_NAME: &str = "anonymous";

/// Room identifier (externally assigned, positive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoomId(i64);

impl RoomId {
    pub fn new(value: i64) -> Result<Self, ValueObjectError> {
        if value <= 0 {
            return Err(ValueObjectError::InvalidRoomId(value));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for RoomId {
    type Error = ValueObjectError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of one live connection
///
/// Two connections by the same user are two different clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(Uuid);

impl ClientId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for ClientId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// User display name attached to every message a client sends
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DisplayName(String);

impl DisplayName {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValueObjectError::EmptyDisplayName);
        }
        let len = trimmed.chars().count();
        if len > DISPLAY_NAME_MAX_LEN {
            return Err(ValueObjectError::DisplayNameTooLong {
                len,
                max: DISPLAY_NAME_MAX_LEN,
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The marker name carried by anonymous clients
    pub fn anonymous() -> Self {
        Self(ANONYMOUS_DISPLAY_NAME.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for DisplayName {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who is behind a connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// Authenticated user: may send and receive
    Member(DisplayName),
    /// No session token: receive-only
    Anonymous,
}

impl Identity {
    pub fn display_name(&self) -> DisplayName {
        match self {
            Identity::Member(name) => name.clone(),
            Identity::Anonymous => DisplayName::anonymous(),
        }
    }

    pub fn can_send(&self) -> bool {
        matches!(self, Identity::Member(_))
    }
}

/// Opaque message bytes (never empty)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload(Vec<u8>);

impl Payload {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self, ValueObjectError> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(ValueObjectError::EmptyPayload);
        }
        Ok(Self(bytes))
    }

    /// Same as [`Payload::new`] with an upper size bound (in bytes)
    pub fn bounded(bytes: impl Into<Vec<u8>>, max_len: usize) -> Result<Self, ValueObjectError> {
        let payload = Self::new(bytes)?;
        if payload.len() > max_len {
            return Err(ValueObjectError::PayloadTooLarge {
                len: payload.len(),
                max: max_len,
            });
        }
        Ok(payload)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Payload rendered as text, replacing invalid UTF-8 sequences
    pub fn to_text_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }
}

/// Unix timestamp in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

/// Normal member message or privileged ("super") broadcast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Normal,
    Super,
}
