//! Common domain types for interview sessions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Interview category carried in grant metadata.
///
/// The agent participant reads this to select its prompt set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewType {
    /// Behavioral interview (default).
    #[default]
    Behavioral,
    /// Technical interview.
    Technical,
    /// System design interview.
    SystemDesign,
}

impl InterviewType {
    /// Wire representation of the category.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            InterviewType::Behavioral => "behavioral",
            InterviewType::Technical => "technical",
            InterviewType::SystemDesign => "system_design",
        }
    }
}

impl fmt::Display for InterviewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown interview category.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unsupported interview type")]
pub struct UnknownInterviewType;

impl FromStr for InterviewType {
    type Err = UnknownInterviewType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "behavioral" => Ok(InterviewType::Behavioral),
            "technical" => Ok(InterviewType::Technical),
            "system_design" => Ok(InterviewType::SystemDesign),
            _ => Err(UnknownInterviewType),
        }
    }
}

/// Role of a participant within an interview room.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantRole {
    /// The human being interviewed.
    #[default]
    Candidate,
    /// The AI interviewer.
    Agent,
}

impl ParticipantRole {
    /// Wire representation of the role.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ParticipantRole::Candidate => "candidate",
            ParticipantRole::Agent => "agent",
        }
    }
}
