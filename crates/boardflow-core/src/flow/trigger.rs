//! Trigger definitions and handlers.
//!
//! A trigger decides which events make a rule eligible to run. Each
//! trigger type has a handler providing its editor schema, validation,
//! summary text, and the event-matching check.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::board::{BoardContext, Priority};
use crate::error::FieldError;
use crate::event::{EventContext, EventKind};
use crate::flow::schema::{ConfigField, ConfigSchema, FieldType};

/// Identifies a registered trigger handler
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    CardCreated,
    CardMoved,
    CardAssigned,
    PriorityChanged,
    TagAdded,
    DueDateApproaching,
}

impl TriggerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerType::CardCreated => "card_created",
            TriggerType::CardMoved => "card_moved",
            TriggerType::CardAssigned => "card_assigned",
            TriggerType::PriorityChanged => "priority_changed",
            TriggerType::TagAdded => "tag_added",
            TriggerType::DueDateApproaching => "due_date_approaching",
        }
    }
}

impl std::fmt::Display for TriggerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rule's trigger with its typed configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FlowTrigger {
    /// A card was created, optionally only in one column
    CardCreated { column_id: Option<String> },

    /// A card was moved into the configured column
    CardMoved { column_id: String },

    /// A card was assigned, optionally only to one member
    CardAssigned { assignee_id: Option<String> },

    /// A card's priority changed, optionally to one specific level
    PriorityChanged { priority: Option<Priority> },

    /// A tag was added, optionally one specific tag
    TagAdded { tag: Option<String> },

    /// A card's due date is within the configured number of days
    DueDateApproaching { days_before: i64 },
}

impl FlowTrigger {
    pub fn trigger_type(&self) -> TriggerType {
        match self {
            FlowTrigger::CardCreated { .. } => TriggerType::CardCreated,
            FlowTrigger::CardMoved { .. } => TriggerType::CardMoved,
            FlowTrigger::CardAssigned { .. } => TriggerType::CardAssigned,
            FlowTrigger::PriorityChanged { .. } => TriggerType::PriorityChanged,
            FlowTrigger::TagAdded { .. } => TriggerType::TagAdded,
            FlowTrigger::DueDateApproaching { .. } => TriggerType::DueDateApproaching,
        }
    }
}

/// Behavior bundle for one trigger type.
///
/// Handlers are registered once at startup and shared read-only; all
/// methods are side-effect free.
pub trait TriggerHandler: Send + Sync {
    fn trigger_type(&self) -> TriggerType;

    /// Name shown in the trigger picker
    fn label(&self) -> &'static str;

    /// Editor form definition for this trigger's config
    fn config_schema(&self) -> ConfigSchema;

    /// Save-time config validation. The default applies the schema's
    /// required-field check to the serialized trigger.
    fn validate(&self, trigger: &FlowTrigger) -> Result<(), Vec<FieldError>> {
        let config = serde_json::to_value(trigger)
            .map_err(|e| vec![FieldError::invalid("config", e.to_string())])?;
        self.config_schema().check(&config)
    }

    /// Deterministic one-line description for editor previews
    fn summarize(&self, trigger: &FlowTrigger, board: &BoardContext) -> String;

    /// Whether this event satisfies the trigger
    fn matches(&self, trigger: &FlowTrigger, event: &EventContext) -> bool;
}

fn column_label<'a>(board: &'a BoardContext, column_id: &'a str) -> &'a str {
    board.column_label(column_id).unwrap_or(column_id)
}

fn member_name<'a>(board: &'a BoardContext, user_id: &'a str) -> &'a str {
    board.member_name(user_id).unwrap_or(user_id)
}

// ── Built-in handlers ────────────────────────────────────────────────

pub struct CardCreatedTrigger;

impl TriggerHandler for CardCreatedTrigger {
    fn trigger_type(&self) -> TriggerType {
        TriggerType::CardCreated
    }

    fn label(&self) -> &'static str {
        "Card created"
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new().with_field(
            ConfigField::new("column_id", "Column", FieldType::ColumnPicker)
                .with_help_text("Leave empty to match any column"),
        )
    }

    fn summarize(&self, trigger: &FlowTrigger, board: &BoardContext) -> String {
        match trigger {
            FlowTrigger::CardCreated { column_id: Some(column_id) } => {
                format!("When a card is created in {}", column_label(board, column_id))
            }
            _ => "When a card is created".to_string(),
        }
    }

    fn matches(&self, trigger: &FlowTrigger, event: &EventContext) -> bool {
        match (trigger, &event.kind) {
            (FlowTrigger::CardCreated { column_id }, EventKind::CardCreated) => column_id
                .as_ref()
                .is_none_or(|wanted| *wanted == event.card.column_id),
            _ => false,
        }
    }
}

pub struct CardMovedTrigger;

impl TriggerHandler for CardMovedTrigger {
    fn trigger_type(&self) -> TriggerType {
        TriggerType::CardMoved
    }

    fn label(&self) -> &'static str {
        "Card moved to column"
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new().with_field(
            ConfigField::new("column_id", "Destination column", FieldType::ColumnPicker)
                .required(),
        )
    }

    fn summarize(&self, trigger: &FlowTrigger, board: &BoardContext) -> String {
        match trigger {
            FlowTrigger::CardMoved { column_id } => {
                format!("When a card is moved to {}", column_label(board, column_id))
            }
            _ => self.label().to_string(),
        }
    }

    fn matches(&self, trigger: &FlowTrigger, event: &EventContext) -> bool {
        match (trigger, &event.kind) {
            (
                FlowTrigger::CardMoved { column_id },
                EventKind::CardMoved { to_column_id, .. },
            ) => column_id == to_column_id,
            _ => false,
        }
    }
}

pub struct CardAssignedTrigger;

impl TriggerHandler for CardAssignedTrigger {
    fn trigger_type(&self) -> TriggerType {
        TriggerType::CardAssigned
    }

    fn label(&self) -> &'static str {
        "Card assigned"
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new().with_field(
            ConfigField::new("assignee_id", "Member", FieldType::UserPicker)
                .with_help_text("Leave empty to match any member"),
        )
    }

    fn summarize(&self, trigger: &FlowTrigger, board: &BoardContext) -> String {
        match trigger {
            FlowTrigger::CardAssigned { assignee_id: Some(assignee_id) } => {
                format!("When a card is assigned to {}", member_name(board, assignee_id))
            }
            _ => "When a card is assigned".to_string(),
        }
    }

    fn matches(&self, trigger: &FlowTrigger, event: &EventContext) -> bool {
        match (trigger, &event.kind) {
            (
                FlowTrigger::CardAssigned { assignee_id },
                EventKind::CardAssigned { assignee_id: event_assignee },
            ) => assignee_id
                .as_ref()
                .is_none_or(|wanted| wanted == event_assignee),
            _ => false,
        }
    }
}

pub struct PriorityChangedTrigger;

impl TriggerHandler for PriorityChangedTrigger {
    fn trigger_type(&self) -> TriggerType {
        TriggerType::PriorityChanged
    }

    fn label(&self) -> &'static str {
        "Priority changed"
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new().with_field(
            ConfigField::new("priority", "New priority", FieldType::PriorityPicker)
                .with_help_text("Leave empty to match any priority"),
        )
    }

    fn summarize(&self, trigger: &FlowTrigger, _board: &BoardContext) -> String {
        match trigger {
            FlowTrigger::PriorityChanged { priority: Some(priority) } => {
                format!("When a card's priority changes to {priority}")
            }
            _ => "When a card's priority changes".to_string(),
        }
    }

    fn matches(&self, trigger: &FlowTrigger, event: &EventContext) -> bool {
        match (trigger, &event.kind) {
            (
                FlowTrigger::PriorityChanged { priority },
                EventKind::PriorityChanged { current, .. },
            ) => priority.is_none_or(|wanted| wanted == *current),
            _ => false,
        }
    }
}

pub struct TagAddedTrigger;

impl TriggerHandler for TagAddedTrigger {
    fn trigger_type(&self) -> TriggerType {
        TriggerType::TagAdded
    }

    fn label(&self) -> &'static str {
        "Tag added"
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new().with_field(
            ConfigField::new("tag", "Tag", FieldType::Text)
                .with_placeholder("launch")
                .with_help_text("Leave empty to match any tag"),
        )
    }

    fn summarize(&self, trigger: &FlowTrigger, _board: &BoardContext) -> String {
        match trigger {
            FlowTrigger::TagAdded { tag: Some(tag) } => {
                format!("When the '{tag}' tag is added to a card")
            }
            _ => "When a tag is added to a card".to_string(),
        }
    }

    fn matches(&self, trigger: &FlowTrigger, event: &EventContext) -> bool {
        match (trigger, &event.kind) {
            (FlowTrigger::TagAdded { tag }, EventKind::TagAdded { tag: event_tag }) => {
                tag.as_ref().is_none_or(|wanted| wanted == event_tag)
            }
            _ => false,
        }
    }
}

pub struct DueDateApproachingTrigger;

impl TriggerHandler for DueDateApproachingTrigger {
    fn trigger_type(&self) -> TriggerType {
        TriggerType::DueDateApproaching
    }

    fn label(&self) -> &'static str {
        "Due date approaching"
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new().with_field(
            ConfigField::new("days_before", "Days before due", FieldType::Number)
                .required()
                .with_default(serde_json::json!(1)),
        )
    }

    fn validate(&self, trigger: &FlowTrigger) -> Result<(), Vec<FieldError>> {
        let config = serde_json::to_value(trigger)
            .map_err(|e| vec![FieldError::invalid("config", e.to_string())])?;
        self.config_schema().check(&config)?;

        match config.get("days_before").and_then(Value::as_i64) {
            Some(days) if days >= 1 => Ok(()),
            _ => Err(vec![FieldError::invalid(
                "days_before",
                "must be at least 1",
            )]),
        }
    }

    fn summarize(&self, trigger: &FlowTrigger, _board: &BoardContext) -> String {
        match trigger {
            FlowTrigger::DueDateApproaching { days_before: 1 } => {
                "When a card is due within 1 day".to_string()
            }
            FlowTrigger::DueDateApproaching { days_before } => {
                format!("When a card is due within {days_before} days")
            }
            _ => self.label().to_string(),
        }
    }

    fn matches(&self, trigger: &FlowTrigger, event: &EventContext) -> bool {
        match (trigger, &event.kind) {
            // negative days_until means overdue, which is still within
            // the reminder window
            (
                FlowTrigger::DueDateApproaching { days_before },
                EventKind::DueDateApproaching { days_until },
            ) => days_until <= days_before,
            _ => false,
        }
    }
}

/// All built-in trigger handlers in picker order
pub fn builtin_trigger_handlers() -> Vec<std::sync::Arc<dyn TriggerHandler>> {
    vec![
        std::sync::Arc::new(CardCreatedTrigger),
        std::sync::Arc::new(CardMovedTrigger),
        std::sync::Arc::new(CardAssignedTrigger),
        std::sync::Arc::new(PriorityChangedTrigger),
        std::sync::Arc::new(TagAddedTrigger),
        std::sync::Arc::new(DueDateApproachingTrigger),
    ]
}
