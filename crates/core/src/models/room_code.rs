//! Room codes - the short handle players type to join a room

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const ROOM_CODE_LEN: usize = 6;
pub const ROOM_CODE_ALPHABET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// A validated room code (upper-case alphanumeric)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    /// Parse user input. Lower-case letters and surrounding whitespace are accepted.
    pub fn parse(value: &str) -> Result<Self> {
        let normalized = value.trim().to_ascii_uppercase();
        let found = normalized.chars().count();
        if found != ROOM_CODE_LEN {
            return Err(Error::InvalidRoomCode(format!(
                "expected {ROOM_CODE_LEN} characters, got {found}"
            )));
        }
        if let Some((index, ch)) = normalized
            .chars()
            .enumerate()
            .find(|(_, ch)| !ROOM_CODE_ALPHABET.contains(*ch))
        {
            return Err(Error::InvalidRoomCode(format!(
                "invalid character '{ch}' at position {index}"
            )));
        }
        Ok(Self(normalized))
    }

    /// Draw a fresh code uniformly from the alphabet
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let alphabet = ROOM_CODE_ALPHABET.as_bytes();
        let code = (0..ROOM_CODE_LEN)
            .map(|_| alphabet[rng.gen_range(0..alphabet.len())] as char)
            .collect();
        Self(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for RoomCode {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        Self::parse(value)
    }
}
