//! Flow rule model and the save-time validation gate.
//!
//! A rule is one trigger, zero or more AND-ed conditions, and an ordered
//! action sequence. Validation collects every hard error in one pass so
//! the editor can surface all of them; rules with hard errors are never
//! handed to a store.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::board::BoardContext;
use crate::error::{ValidationError, ValidationFailure, ValidationWarning};
use crate::flow::action::FlowAction;
use crate::flow::condition::FlowCondition;
use crate::flow::registry::{ActionRegistry, TriggerRegistry};
use crate::flow::trigger::FlowTrigger;

/// Outcome classification of one rule run
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    Partial,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Success => "success",
            RunStatus::Partial => "partial",
            RunStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted automation rule
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlowRule {
    pub id: String,
    pub board_id: String,
    pub workspace_id: String,
    pub name: String,
    pub description: Option<String>,

    /// Inactive rules are stored but never evaluated
    #[serde(default = "default_active")]
    pub is_active: bool,

    pub trigger: FlowTrigger,
    #[serde(default)]
    pub conditions: Vec<FlowCondition>,
    #[serde(default)]
    pub actions: Vec<FlowAction>,

    pub last_run_at: Option<DateTime<Utc>>,
    pub last_run_status: Option<RunStatus>,
    #[serde(default)]
    pub run_count: u64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

impl FlowRule {
    pub fn new(
        board_id: impl Into<String>,
        workspace_id: impl Into<String>,
        name: impl Into<String>,
        trigger: FlowTrigger,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            board_id: board_id.into(),
            workspace_id: workspace_id.into(),
            name: name.into(),
            description: None,
            is_active: true,
            trigger,
            conditions: Vec::new(),
            actions: Vec::new(),
            last_run_at: None,
            last_run_status: None,
            run_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_conditions(mut self, conditions: Vec<FlowCondition>) -> Self {
        self.conditions = conditions;
        self
    }

    pub fn with_actions(mut self, actions: Vec<FlowAction>) -> Self {
        self.actions = actions;
        self
    }

    /// Actions sorted ascending by `order`, the execution sequence
    pub fn actions_in_order(&self) -> Vec<&FlowAction> {
        let mut sorted: Vec<&FlowAction> = self.actions.iter().collect();
        sorted.sort_by_key(|a| a.order);
        sorted
    }
}

/// An unsaved rule, produced by the graph converter or a template.
///
/// Board and workspace ids are optional here; the editor fills them in
/// before handing the draft to the rule store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RuleDraft {
    pub board_id: Option<String>,
    pub workspace_id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub trigger: FlowTrigger,
    pub conditions: Vec<FlowCondition>,
    pub actions: Vec<FlowAction>,
}

/// Partial update for `RuleStore::update`; None fields are left as-is
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
    pub trigger: Option<FlowTrigger>,
    pub conditions: Option<Vec<FlowCondition>>,
    pub actions: Option<Vec<FlowAction>>,
    pub last_run_at: Option<DateTime<Utc>>,
    pub last_run_status: Option<RunStatus>,
    pub run_count: Option<u64>,
}

impl RulePatch {
    /// Patch recording the outcome of one run
    pub fn run_outcome(at: DateTime<Utc>, status: RunStatus, run_count: u64) -> Self {
        Self {
            last_run_at: Some(at),
            last_run_status: Some(status),
            run_count: Some(run_count),
            ..Self::default()
        }
    }

    /// Apply onto a rule, bumping `updated_at`
    pub fn apply(self, rule: &mut FlowRule) {
        if let Some(name) = self.name {
            rule.name = name;
        }
        if let Some(description) = self.description {
            rule.description = Some(description);
        }
        if let Some(is_active) = self.is_active {
            rule.is_active = is_active;
        }
        if let Some(trigger) = self.trigger {
            rule.trigger = trigger;
        }
        if let Some(conditions) = self.conditions {
            rule.conditions = conditions;
        }
        if let Some(actions) = self.actions {
            rule.actions = actions;
        }
        if let Some(last_run_at) = self.last_run_at {
            rule.last_run_at = Some(last_run_at);
        }
        if let Some(last_run_status) = self.last_run_status {
            rule.last_run_status = Some(last_run_status);
        }
        if let Some(run_count) = self.run_count {
            rule.run_count = run_count;
        }
        rule.updated_at = Utc::now();
    }
}

/// Validate a rule before it is persisted or activated.
///
/// Returns the non-blocking warnings on success; on failure, every hard
/// error found. Callers must reject the save without touching the store
/// when this fails.
pub fn validate_rule(
    rule: &FlowRule,
    triggers: &TriggerRegistry,
    actions: &ActionRegistry,
) -> Result<Vec<ValidationWarning>, ValidationFailure> {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if rule.name.trim().is_empty() {
        errors.push(ValidationError::EmptyName);
    }

    match triggers.get(rule.trigger.trigger_type()) {
        Some(handler) => {
            if let Err(field_errors) = handler.validate(&rule.trigger) {
                errors.extend(field_errors.into_iter().map(ValidationError::TriggerConfig));
            }
        }
        None => errors.push(ValidationError::UnknownTrigger(
            rule.trigger.trigger_type().as_str().to_string(),
        )),
    }

    for (index, condition) in rule.conditions.iter().enumerate() {
        if !condition
            .field
            .allowed_operators()
            .contains(&condition.operator)
        {
            errors.push(ValidationError::OperatorNotAllowed {
                index,
                field: condition.field,
                operator: condition.operator,
            });
        }
        if condition.operator.requires_value() && condition.value.is_none() {
            errors.push(ValidationError::MissingConditionValue {
                index,
                operator: condition.operator,
            });
        }
    }

    if rule.actions.is_empty() {
        errors.push(ValidationError::NoActions);
    }

    let mut seen_orders = HashSet::new();
    for (index, action) in rule.actions.iter().enumerate() {
        if !seen_orders.insert(action.order) {
            errors.push(ValidationError::DuplicateActionOrder(action.order));
        }

        match actions.get(action.action_type()) {
            Some(handler) => {
                if let Err(field_errors) = handler.validate(&action.config) {
                    errors.extend(
                        field_errors
                            .into_iter()
                            .map(|error| ValidationError::ActionConfig { index, error }),
                    );
                }
                if handler.coming_soon() {
                    warnings.push(ValidationWarning::ComingSoonAction {
                        index,
                        kind: action.action_type().as_str().to_string(),
                    });
                }
            }
            None => errors.push(ValidationError::UnknownAction {
                index,
                kind: action.action_type().as_str().to_string(),
            }),
        }
    }

    if errors.is_empty() {
        Ok(warnings)
    } else {
        Err(ValidationFailure { errors })
    }
}

/// One-line description of a rule for list views
pub fn summarize_rule(
    rule: &FlowRule,
    triggers: &TriggerRegistry,
    actions: &ActionRegistry,
    board: &BoardContext,
) -> String {
    let mut summary = triggers
        .get(rule.trigger.trigger_type())
        .map(|h| h.summarize(&rule.trigger, board))
        .unwrap_or_else(|| format!("Unknown trigger '{}'", rule.trigger.trigger_type()));

    match rule.conditions.len() {
        0 => {}
        1 => summary.push_str(", if 1 condition matches"),
        n => summary.push_str(&format!(", if {n} conditions match")),
    }

    let steps: Vec<String> = rule
        .actions_in_order()
        .iter()
        .map(|action| {
            actions
                .get(action.action_type())
                .map(|h| h.summarize(&action.config, board))
                .unwrap_or_else(|| format!("Unknown action '{}'", action.action_type()))
        })
        .collect();

    if !steps.is_empty() {
        summary.push_str(": ");
        summary.push_str(&steps.join(", then "));
    }

    summary
}
