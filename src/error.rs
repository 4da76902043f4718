use std::error::Error as StdError;
use std::fmt;

use crate::parse::ParseError;

/// All the ways a pp calculation can fail.
#[derive(Debug)]
pub enum Error {
    /// Decoding the `.osu` file failed.
    Parse(ParseError),
    /// The assembled action stream violates a structural invariant,
    /// e.g. two actions sharing a timestamp.
    InvalidBeatmap(String),
    /// A hit object the osu!standard core cannot judge, e.g. a mania
    /// hold note outside mania.
    UnsupportedObject { time: i32 },
    /// The scale solve exhausted its iteration budget without finding a
    /// skill vector that reaches the target probability.
    DidNotConverge,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(_) => f.write_str("failed to decode beatmap"),
            Self::InvalidBeatmap(reason) => write!(f, "invalid beatmap: {reason}"),
            Self::UnsupportedObject { time } => {
                write!(f, "unsupported hit object at {time}ms")
            }
            Self::DidNotConverge => f.write_str("skill solve did not converge"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Parse(inner) => Some(inner),
            Self::InvalidBeatmap(_) | Self::UnsupportedObject { .. } | Self::DidNotConverge => None,
        }
    }
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        Self::Parse(err)
    }
}
