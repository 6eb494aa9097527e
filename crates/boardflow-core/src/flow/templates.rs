//! Pre-built flow recipes offered as starting points in the editor.
//!
//! Templates are read-only blueprints. Instantiating one yields an
//! inactive draft with freshly minted condition/action ids; picker
//! placeholders (member, column) stay empty for the user to fill in.

use serde::{Deserialize, Serialize};

use crate::board::Priority;
use crate::flow::action::{ActionConfig, FlowAction};
use crate::flow::condition::{ConditionField, ConditionOperator, FlowCondition};
use crate::flow::rule::RuleDraft;
use crate::flow::trigger::FlowTrigger;

/// Grouping shown on the recipe picker
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TemplateCategory {
    Workflow,
    Notifications,
    Deadlines,
    Team,
}

impl TemplateCategory {
    pub fn label(&self) -> &'static str {
        match self {
            TemplateCategory::Workflow => "Workflow",
            TemplateCategory::Notifications => "Notifications",
            TemplateCategory::Deadlines => "Deadlines",
            TemplateCategory::Team => "Team",
        }
    }
}

/// A read-only rule blueprint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlowRecipeTemplate {
    /// Stable slug, e.g. `notify-on-done`
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub category: TemplateCategory,
    pub is_featured: bool,
    pub preview_summary: Option<String>,
    pub trigger: FlowTrigger,
    pub conditions: Vec<FlowCondition>,
    pub actions: Vec<FlowAction>,
    pub sort_order: u32,
}

impl FlowRecipeTemplate {
    fn new(
        id: &str,
        name: &str,
        category: TemplateCategory,
        sort_order: u32,
        trigger: FlowTrigger,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            category,
            is_featured: false,
            preview_summary: None,
            trigger,
            conditions: Vec::new(),
            actions: Vec::new(),
            sort_order,
        }
    }

    fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    fn featured(mut self) -> Self {
        self.is_featured = true;
        self
    }

    fn with_preview(mut self, preview: &str) -> Self {
        self.preview_summary = Some(preview.to_string());
        self
    }

    fn with_conditions(mut self, conditions: Vec<FlowCondition>) -> Self {
        self.conditions = conditions;
        self
    }

    fn with_actions(mut self, actions: Vec<FlowAction>) -> Self {
        self.actions = actions;
        self
    }

    /// Copy this template into an inactive draft for one board.
    ///
    /// Conditions and actions are copied by value with new ids, so
    /// editing the draft never touches the catalog entry.
    pub fn instantiate(&self, board_id: &str, workspace_id: &str) -> RuleDraft {
        RuleDraft {
            board_id: Some(board_id.to_string()),
            workspace_id: Some(workspace_id.to_string()),
            name: self.name.clone(),
            description: self.description.clone(),
            is_active: false,
            trigger: self.trigger.clone(),
            conditions: self
                .conditions
                .iter()
                .map(|c| FlowCondition {
                    id: uuid::Uuid::new_v4().to_string(),
                    ..c.clone()
                })
                .collect(),
            actions: self
                .actions
                .iter()
                .map(|a| FlowAction {
                    id: uuid::Uuid::new_v4().to_string(),
                    ..a.clone()
                })
                .collect(),
        }
    }
}

/// The built-in recipe catalog, sorted by `sort_order`
pub fn builtin_templates() -> Vec<FlowRecipeTemplate> {
    vec![
        FlowRecipeTemplate::new(
            "notify-on-done",
            "Notify when work completes",
            TemplateCategory::Notifications,
            0,
            FlowTrigger::CardMoved {
                column_id: String::new(),
            },
        )
        .featured()
        .with_description("Send a message whenever a card lands in your done column")
        .with_preview("When a card is moved to Done: Notify a member")
        .with_actions(vec![FlowAction::new(
            ActionConfig::NotifyUser {
                user_id: String::new(),
                message: "\"{{card.title}}\" was completed".to_string(),
            },
            0,
        )]),
        FlowRecipeTemplate::new(
            "archive-done-cards",
            "Keep boards tidy",
            TemplateCategory::Workflow,
            1,
            FlowTrigger::CardMoved {
                column_id: String::new(),
            },
        )
        .featured()
        .with_description("Archive cards as soon as they reach your done column")
        .with_actions(vec![FlowAction::new(ActionConfig::ArchiveCard, 0)]),
        FlowRecipeTemplate::new(
            "urgent-escalation",
            "Escalate urgent cards",
            TemplateCategory::Team,
            2,
            FlowTrigger::PriorityChanged {
                priority: Some(Priority::Urgent),
            },
        )
        .with_description("Ping a teammate and tag the card when priority jumps to urgent")
        .with_actions(vec![
            FlowAction::new(
                ActionConfig::NotifyUser {
                    user_id: String::new(),
                    message: "Urgent: {{card.title}}".to_string(),
                },
                0,
            ),
            FlowAction::new(
                ActionConfig::AddTag {
                    tag: "escalated".to_string(),
                },
                1,
            )
            .continue_on_failure(),
        ]),
        FlowRecipeTemplate::new(
            "due-soon-reminder",
            "Due date reminders",
            TemplateCategory::Deadlines,
            3,
            FlowTrigger::DueDateApproaching { days_before: 2 },
        )
        .featured()
        .with_description("Remind the assignee two days before a card is due")
        .with_conditions(vec![FlowCondition::new(
            ConditionField::Assignee,
            ConditionOperator::IsSet,
        )])
        .with_actions(vec![FlowAction::new(
            ActionConfig::NotifyUser {
                user_id: String::new(),
                message: "{{card.title}} is due soon".to_string(),
            },
            0,
        )]),
        FlowRecipeTemplate::new(
            "triage-new-cards",
            "Triage new cards",
            TemplateCategory::Workflow,
            4,
            FlowTrigger::CardCreated { column_id: None },
        )
        .with_description("Give every new card a default priority and a triage tag")
        .with_actions(vec![
            FlowAction::new(
                ActionConfig::SetPriority {
                    priority: Priority::Medium,
                },
                0,
            ),
            FlowAction::new(
                ActionConfig::AddTag {
                    tag: "triage".to_string(),
                },
                1,
            ),
        ]),
        FlowRecipeTemplate::new(
            "launch-checklist",
            "Launch checklist",
            TemplateCategory::Workflow,
            5,
            FlowTrigger::TagAdded {
                tag: Some("launch".to_string()),
            },
        )
        .with_description("Spin up the standard launch subtasks when a card is tagged")
        .with_actions(vec![
            FlowAction::new(
                ActionConfig::CreateSubtask {
                    title: "QA pass for {{card.title}}".to_string(),
                    assignee_id: None,
                },
                0,
            ),
            FlowAction::new(
                ActionConfig::CreateSubtask {
                    title: "Announce {{card.title}}".to_string(),
                    assignee_id: None,
                },
                1,
            ),
        ]),
        FlowRecipeTemplate::new(
            "high-priority-watch",
            "Watch high priority pickups",
            TemplateCategory::Notifications,
            6,
            FlowTrigger::CardAssigned { assignee_id: None },
        )
        .with_description("Hear about it when someone takes on high priority work")
        .with_conditions(vec![FlowCondition::new(
            ConditionField::Priority,
            ConditionOperator::GreaterThan,
        )
        .with_value(serde_json::json!("medium"))])
        .with_actions(vec![FlowAction::new(
            ActionConfig::NotifyUser {
                user_id: String::new(),
                message: "{{card.assignee}} picked up {{card.title}}".to_string(),
            },
            0,
        )]),
    ]
}

/// Filter the catalog by category and/or a case-insensitive search term
pub fn filter_templates<'a>(
    templates: &'a [FlowRecipeTemplate],
    category: Option<TemplateCategory>,
    search: Option<&str>,
) -> Vec<&'a FlowRecipeTemplate> {
    let needle = search.map(str::to_lowercase);

    templates
        .iter()
        .filter(|t| category.is_none_or(|c| t.category == c))
        .filter(|t| {
            needle.as_deref().is_none_or(|needle| {
                t.name.to_lowercase().contains(needle)
                    || t.description
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(needle))
            })
        })
        .collect()
}
