use crate::error::IdParseError;
use chrono::Utc;
use std::fmt;
use std::str::FromStr;

const ID_BYTES: usize = 12;

/// Store-assigned book identifier: 12 bytes, written as 24 hex characters.
///
/// The first four bytes are the big-endian creation time in seconds, the
/// remaining eight are random, so ids sort roughly by creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BookId([u8; ID_BYTES]);

impl BookId {
    /// Generate a fresh id. Only the store calls this, at insert time.
    pub(crate) fn generate() -> Self {
        let mut bytes = [0u8; ID_BYTES];
        let secs = Utc::now().timestamp() as u32;
        bytes[..4].copy_from_slice(&secs.to_be_bytes());
        bytes[4..].copy_from_slice(&uuid::Uuid::new_v4().as_bytes()[..8]);
        BookId(bytes)
    }

    pub fn parse(input: &str) -> Result<Self, IdParseError> {
        let input = input.trim();
        if input.len() != ID_BYTES * 2 {
            return Err(IdParseError::Length(input.len()));
        }

        let mut bytes = [0u8; ID_BYTES];
        for (i, chunk) in input.as_bytes().chunks(2).enumerate() {
            let hi = hex_value(chunk[0]).ok_or(IdParseError::NonHex)?;
            let lo = hex_value(chunk[1]).ok_or(IdParseError::NonHex)?;
            bytes[i] = (hi << 4) | lo;
        }
        Ok(BookId(bytes))
    }
}

fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

impl FromStr for BookId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BookId::parse(s)
    }
}

impl TryFrom<String> for BookId {
    type Error = IdParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        BookId::parse(&value)
    }
}

impl From<BookId> for String {
    fn from(id: BookId) -> Self {
        id.to_string()
    }
}
