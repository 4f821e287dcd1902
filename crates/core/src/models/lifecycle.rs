//! Room lifecycle states

use serde::{Deserialize, Deserializer, Serialize};

/// Lifecycle of a room, strictly forward except for the per-round cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Lifecycle {
    /// Lobby is open, players may join
    #[default]
    Waiting,
    /// Host requested the start, pre-roll running
    Starting,
    /// A round is being played
    InProgress,
    /// Round results are shown
    RoundEnd,
    /// Terminal
    Finished,
}

impl Lifecycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Lifecycle::Waiting => "WAITING",
            Lifecycle::Starting => "STARTING",
            Lifecycle::InProgress => "IN_PROGRESS",
            Lifecycle::RoundEnd => "ROUND_END",
            Lifecycle::Finished => "FINISHED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "WAITING" => Some(Lifecycle::Waiting),
            "STARTING" => Some(Lifecycle::Starting),
            "IN_PROGRESS" => Some(Lifecycle::InProgress),
            "ROUND_END" => Some(Lifecycle::RoundEnd),
            "FINISHED" => Some(Lifecycle::Finished),
            _ => None,
        }
    }

    /// Whether `next` is a legal successor of this state
    pub fn can_transition_to(&self, next: Lifecycle) -> bool {
        matches!(
            (self, next),
            (Lifecycle::Waiting, Lifecycle::Starting)
                | (Lifecycle::Starting, Lifecycle::InProgress)
                | (Lifecycle::InProgress, Lifecycle::RoundEnd)
                | (Lifecycle::RoundEnd, Lifecycle::InProgress)
                | (Lifecycle::RoundEnd, Lifecycle::Finished)
        )
    }

    pub fn is_terminal(&self) -> bool {
        *self == Lifecycle::Finished
    }
}

impl std::fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lenient decoding for store records: unknown states read as `Waiting`
pub(crate) fn lifecycle_or_waiting<'de, D>(deserializer: D) -> Result<Lifecycle, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .as_deref()
        .and_then(Lifecycle::parse)
        .unwrap_or_default())
}
