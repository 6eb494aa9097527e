//! Action definitions and handlers.
//!
//! Actions are the side-effecting steps a fired rule performs, grouped
//! by category for the picker. Several categories are announced ahead of
//! their backing services; their handlers carry the coming-soon flag and
//! always fail at run time with a clear message.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::board::{BoardContext, Priority};
use crate::error::FieldError;
use crate::flow::schema::{ConfigField, ConfigSchema, FieldType};

/// Identifies a registered action handler
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    MoveCard,
    SetPriority,
    AddTag,
    ArchiveCard,
    CreateSubtask,
    NotifyUser,
    AssignMember,
    GenerateContract,
    CreateInvoiceDraft,
    SummarizeCard,
    PostWebhook,
    RecordMetric,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::MoveCard => "move_card",
            ActionType::SetPriority => "set_priority",
            ActionType::AddTag => "add_tag",
            ActionType::ArchiveCard => "archive_card",
            ActionType::CreateSubtask => "create_subtask",
            ActionType::NotifyUser => "notify_user",
            ActionType::AssignMember => "assign_member",
            ActionType::GenerateContract => "generate_contract",
            ActionType::CreateInvoiceDraft => "create_invoice_draft",
            ActionType::SummarizeCard => "summarize_card",
            ActionType::PostWebhook => "post_webhook",
            ActionType::RecordMetric => "record_metric",
        }
    }
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Picker grouping for actions, in display order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActionCategory {
    Card,
    Subtask,
    Notification,
    Team,
    Contracts,
    Invoices,
    Ai,
    Integration,
    Reporting,
}

impl ActionCategory {
    /// Every category in the order the picker shows them
    pub const ALL: [ActionCategory; 9] = [
        ActionCategory::Card,
        ActionCategory::Subtask,
        ActionCategory::Notification,
        ActionCategory::Team,
        ActionCategory::Contracts,
        ActionCategory::Invoices,
        ActionCategory::Ai,
        ActionCategory::Integration,
        ActionCategory::Reporting,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ActionCategory::Card => "Card",
            ActionCategory::Subtask => "Subtasks",
            ActionCategory::Notification => "Notifications",
            ActionCategory::Team => "Team",
            ActionCategory::Contracts => "Contracts",
            ActionCategory::Invoices => "Invoices",
            ActionCategory::Ai => "AI",
            ActionCategory::Integration => "Integrations",
            ActionCategory::Reporting => "Reporting",
        }
    }
}

/// An action's typed configuration, tagged by action type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionConfig {
    MoveCard {
        column_id: String,
    },
    SetPriority {
        priority: Priority,
    },
    AddTag {
        tag: String,
    },
    ArchiveCard,
    CreateSubtask {
        /// Supports `{{card.*}}` placeholders
        title: String,
        assignee_id: Option<String>,
    },
    NotifyUser {
        user_id: String,
        /// Supports `{{card.*}}` placeholders
        message: String,
    },
    AssignMember {
        user_id: String,
    },
    GenerateContract {
        template_name: String,
    },
    CreateInvoiceDraft {
        client_id: Option<String>,
    },
    SummarizeCard {
        instructions: Option<String>,
    },
    PostWebhook {
        url: String,
    },
    RecordMetric {
        metric: String,
    },
}

impl ActionConfig {
    pub fn action_type(&self) -> ActionType {
        match self {
            ActionConfig::MoveCard { .. } => ActionType::MoveCard,
            ActionConfig::SetPriority { .. } => ActionType::SetPriority,
            ActionConfig::AddTag { .. } => ActionType::AddTag,
            ActionConfig::ArchiveCard => ActionType::ArchiveCard,
            ActionConfig::CreateSubtask { .. } => ActionType::CreateSubtask,
            ActionConfig::NotifyUser { .. } => ActionType::NotifyUser,
            ActionConfig::AssignMember { .. } => ActionType::AssignMember,
            ActionConfig::GenerateContract { .. } => ActionType::GenerateContract,
            ActionConfig::CreateInvoiceDraft { .. } => ActionType::CreateInvoiceDraft,
            ActionConfig::SummarizeCard { .. } => ActionType::SummarizeCard,
            ActionConfig::PostWebhook { .. } => ActionType::PostWebhook,
            ActionConfig::RecordMetric { .. } => ActionType::RecordMetric,
        }
    }
}

/// One step in a rule's action sequence
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlowAction {
    /// Unique within the owning rule
    pub id: String,
    pub config: ActionConfig,
    /// Zero-based execution position, unique within the rule
    pub order: u32,
    /// When false, a failure aborts the remaining sequence
    #[serde(default)]
    pub continue_on_failure: bool,
}

impl FlowAction {
    pub fn new(config: ActionConfig, order: u32) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            config,
            order,
            continue_on_failure: false,
        }
    }

    pub fn continue_on_failure(mut self) -> Self {
        self.continue_on_failure = true;
        self
    }

    pub fn action_type(&self) -> ActionType {
        self.config.action_type()
    }
}

/// Behavior bundle for one action type.
///
/// Handlers describe and validate configuration; the runtime effect
/// itself lives behind the executor's action sink.
pub trait ActionHandler: Send + Sync {
    fn action_type(&self) -> ActionType;

    fn category(&self) -> ActionCategory;

    /// Name shown in the action picker
    fn label(&self) -> &'static str;

    /// Editor form definition for this action's config
    fn config_schema(&self) -> ConfigSchema;

    /// Announced but not executable yet
    fn coming_soon(&self) -> bool {
        self.config_schema().coming_soon
    }

    /// Save-time config validation. The default applies the schema's
    /// required-field check to the serialized config.
    fn validate(&self, config: &ActionConfig) -> Result<(), Vec<FieldError>> {
        let value = serde_json::to_value(config)
            .map_err(|e| vec![FieldError::invalid("config", e.to_string())])?;
        self.config_schema().check(&value)
    }

    /// Deterministic one-line description for editor previews
    fn summarize(&self, config: &ActionConfig, board: &BoardContext) -> String;
}

// ── Card actions ─────────────────────────────────────────────────────

pub struct MoveCardAction;

impl ActionHandler for MoveCardAction {
    fn action_type(&self) -> ActionType {
        ActionType::MoveCard
    }

    fn category(&self) -> ActionCategory {
        ActionCategory::Card
    }

    fn label(&self) -> &'static str {
        "Move card"
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new().with_field(
            ConfigField::new("column_id", "Destination column", FieldType::ColumnPicker)
                .required(),
        )
    }

    fn summarize(&self, config: &ActionConfig, board: &BoardContext) -> String {
        match config {
            ActionConfig::MoveCard { column_id } => {
                let label = board.column_label(column_id).unwrap_or(column_id);
                format!("Move card to {label}")
            }
            _ => self.label().to_string(),
        }
    }
}

pub struct SetPriorityAction;

impl ActionHandler for SetPriorityAction {
    fn action_type(&self) -> ActionType {
        ActionType::SetPriority
    }

    fn category(&self) -> ActionCategory {
        ActionCategory::Card
    }

    fn label(&self) -> &'static str {
        "Set priority"
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new().with_field(
            ConfigField::new("priority", "Priority", FieldType::PriorityPicker).required(),
        )
    }

    fn summarize(&self, config: &ActionConfig, _board: &BoardContext) -> String {
        match config {
            ActionConfig::SetPriority { priority } => format!("Set priority to {priority}"),
            _ => self.label().to_string(),
        }
    }
}

pub struct AddTagAction;

impl ActionHandler for AddTagAction {
    fn action_type(&self) -> ActionType {
        ActionType::AddTag
    }

    fn category(&self) -> ActionCategory {
        ActionCategory::Card
    }

    fn label(&self) -> &'static str {
        "Add tag"
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new()
            .with_field(ConfigField::new("tag", "Tag", FieldType::Text).required())
    }

    fn summarize(&self, config: &ActionConfig, _board: &BoardContext) -> String {
        match config {
            ActionConfig::AddTag { tag } => format!("Add tag '{tag}'"),
            _ => self.label().to_string(),
        }
    }
}

pub struct ArchiveCardAction;

impl ActionHandler for ArchiveCardAction {
    fn action_type(&self) -> ActionType {
        ActionType::ArchiveCard
    }

    fn category(&self) -> ActionCategory {
        ActionCategory::Card
    }

    fn label(&self) -> &'static str {
        "Archive card"
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new()
    }

    fn summarize(&self, _config: &ActionConfig, _board: &BoardContext) -> String {
        "Archive the card".to_string()
    }
}

// ── Subtask / notification / team actions ────────────────────────────

pub struct CreateSubtaskAction;

impl ActionHandler for CreateSubtaskAction {
    fn action_type(&self) -> ActionType {
        ActionType::CreateSubtask
    }

    fn category(&self) -> ActionCategory {
        ActionCategory::Subtask
    }

    fn label(&self) -> &'static str {
        "Create subtask"
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new()
            .with_field(
                ConfigField::new("title", "Subtask title", FieldType::Text)
                    .required()
                    .with_placeholder("Review {{card.title}}")
                    .supports_variables(),
            )
            .with_field(ConfigField::new("assignee_id", "Assignee", FieldType::UserPicker))
    }

    fn summarize(&self, config: &ActionConfig, _board: &BoardContext) -> String {
        match config {
            ActionConfig::CreateSubtask { title, .. } => format!("Create subtask '{title}'"),
            _ => self.label().to_string(),
        }
    }
}

pub struct NotifyUserAction;

impl ActionHandler for NotifyUserAction {
    fn action_type(&self) -> ActionType {
        ActionType::NotifyUser
    }

    fn category(&self) -> ActionCategory {
        ActionCategory::Notification
    }

    fn label(&self) -> &'static str {
        "Notify member"
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new()
            .with_field(ConfigField::new("user_id", "Member", FieldType::UserPicker).required())
            .with_field(
                ConfigField::new("message", "Message", FieldType::Textarea)
                    .required()
                    .with_placeholder("\"{{card.title}}\" moved to {{card.column}}")
                    .supports_variables(),
            )
    }

    fn summarize(&self, config: &ActionConfig, board: &BoardContext) -> String {
        match config {
            ActionConfig::NotifyUser { user_id, message } => {
                let name = board.member_name(user_id).unwrap_or(user_id);
                format!("Notify {name}: \"{message}\"")
            }
            _ => self.label().to_string(),
        }
    }
}

pub struct AssignMemberAction;

impl ActionHandler for AssignMemberAction {
    fn action_type(&self) -> ActionType {
        ActionType::AssignMember
    }

    fn category(&self) -> ActionCategory {
        ActionCategory::Team
    }

    fn label(&self) -> &'static str {
        "Assign member"
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new()
            .with_field(ConfigField::new("user_id", "Member", FieldType::UserPicker).required())
    }

    fn summarize(&self, config: &ActionConfig, board: &BoardContext) -> String {
        match config {
            ActionConfig::AssignMember { user_id } => {
                let name = board.member_name(user_id).unwrap_or(user_id);
                format!("Assign {name}")
            }
            _ => self.label().to_string(),
        }
    }
}

// ── Coming-soon actions ──────────────────────────────────────────────

pub struct GenerateContractAction;

impl ActionHandler for GenerateContractAction {
    fn action_type(&self) -> ActionType {
        ActionType::GenerateContract
    }

    fn category(&self) -> ActionCategory {
        ActionCategory::Contracts
    }

    fn label(&self) -> &'static str {
        "Generate contract"
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new()
            .with_field(
                ConfigField::new("template_name", "Contract template", FieldType::Text).required(),
            )
            .coming_soon()
    }

    fn summarize(&self, config: &ActionConfig, _board: &BoardContext) -> String {
        match config {
            ActionConfig::GenerateContract { template_name } => {
                format!("Generate contract from '{template_name}'")
            }
            _ => self.label().to_string(),
        }
    }
}

pub struct CreateInvoiceDraftAction;

impl ActionHandler for CreateInvoiceDraftAction {
    fn action_type(&self) -> ActionType {
        ActionType::CreateInvoiceDraft
    }

    fn category(&self) -> ActionCategory {
        ActionCategory::Invoices
    }

    fn label(&self) -> &'static str {
        "Create invoice draft"
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new()
            .with_field(ConfigField::new("client_id", "Client", FieldType::Text))
            .coming_soon()
    }

    fn summarize(&self, config: &ActionConfig, _board: &BoardContext) -> String {
        match config {
            ActionConfig::CreateInvoiceDraft { client_id: Some(client_id) } => {
                format!("Create an invoice draft for client {client_id}")
            }
            _ => "Create an invoice draft".to_string(),
        }
    }
}

pub struct SummarizeCardAction;

impl ActionHandler for SummarizeCardAction {
    fn action_type(&self) -> ActionType {
        ActionType::SummarizeCard
    }

    fn category(&self) -> ActionCategory {
        ActionCategory::Ai
    }

    fn label(&self) -> &'static str {
        "Summarize card"
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new()
            .with_field(
                ConfigField::new("instructions", "Instructions", FieldType::Textarea)
                    .with_placeholder("Focus on blockers"),
            )
            .coming_soon()
    }

    fn summarize(&self, _config: &ActionConfig, _board: &BoardContext) -> String {
        "Summarize the card with AI".to_string()
    }
}

pub struct PostWebhookAction;

impl ActionHandler for PostWebhookAction {
    fn action_type(&self) -> ActionType {
        ActionType::PostWebhook
    }

    fn category(&self) -> ActionCategory {
        ActionCategory::Integration
    }

    fn label(&self) -> &'static str {
        "Send webhook"
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new()
            .with_field(
                ConfigField::new("url", "Webhook URL", FieldType::Text)
                    .required()
                    .with_placeholder("https://example.com/hooks/boardflow"),
            )
            .coming_soon()
    }

    fn summarize(&self, config: &ActionConfig, _board: &BoardContext) -> String {
        match config {
            ActionConfig::PostWebhook { url } => format!("Send a webhook to {url}"),
            _ => self.label().to_string(),
        }
    }
}

pub struct RecordMetricAction;

impl ActionHandler for RecordMetricAction {
    fn action_type(&self) -> ActionType {
        ActionType::RecordMetric
    }

    fn category(&self) -> ActionCategory {
        ActionCategory::Reporting
    }

    fn label(&self) -> &'static str {
        "Record metric"
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new()
            .with_field(ConfigField::new("metric", "Metric name", FieldType::Text).required())
            .coming_soon()
    }

    fn summarize(&self, config: &ActionConfig, _board: &BoardContext) -> String {
        match config {
            ActionConfig::RecordMetric { metric } => format!("Record metric '{metric}'"),
            _ => self.label().to_string(),
        }
    }
}

/// All built-in action handlers in picker order
pub fn builtin_action_handlers() -> Vec<Arc<dyn ActionHandler>> {
    vec![
        Arc::new(MoveCardAction),
        Arc::new(SetPriorityAction),
        Arc::new(AddTagAction),
        Arc::new(ArchiveCardAction),
        Arc::new(CreateSubtaskAction),
        Arc::new(NotifyUserAction),
        Arc::new(AssignMemberAction),
        Arc::new(GenerateContractAction),
        Arc::new(CreateInvoiceDraftAction),
        Arc::new(SummarizeCardAction),
        Arc::new(PostWebhookAction),
        Arc::new(RecordMetricAction),
    ]
}
