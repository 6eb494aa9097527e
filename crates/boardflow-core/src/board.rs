//! Board and card reference shapes.
//!
//! The automation engine does not own boards or cards. These are the
//! snapshots and metadata the host hands over when an event fires.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Card priority, ordered from lowest to highest urgency
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    /// Numeric rank used for greater-than/less-than comparisons
    pub fn rank(&self) -> u8 {
        match self {
            Priority::Low => 1,
            Priority::Medium => 2,
            Priority::High => 3,
            Priority::Urgent => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }

    /// Parse a priority from its lowercase name
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            "urgent" => Some(Priority::Urgent),
            _ => None,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A column on a board
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BoardColumn {
    pub id: String,
    pub label: String,
}

/// A workspace member who can be assigned to cards
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeamMember {
    pub id: String,
    pub name: String,
}

/// Board metadata used by validators and summarizers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BoardContext {
    pub id: String,
    pub workspace_id: String,
    pub name: String,
    pub columns: Vec<BoardColumn>,
    pub members: Vec<TeamMember>,
}

impl BoardContext {
    /// Look up a column label by id
    pub fn column_label(&self, column_id: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|c| c.id == column_id)
            .map(|c| c.label.as_str())
    }

    /// Look up a member name by id
    pub fn member_name(&self, user_id: &str) -> Option<&str> {
        self.members
            .iter()
            .find(|m| m.id == user_id)
            .map(|m| m.name.as_str())
    }
}

/// Snapshot of a card at the moment an event fired.
///
/// Field resolution and variable rendering read from this; the engine
/// never mutates it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CardSnapshot {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub column_id: String,
    pub assignee_id: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_by: Option<String>,
}
