//! Typed conditions and the evaluator that gates rule execution.
//!
//! Conditions are field/operator/value triples combined with logical AND.
//! Evaluation short-circuits on the first false condition so later fields
//! are never resolved.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::board::Priority;
use crate::event::EventContext;

/// Card attribute a condition reads
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ConditionField {
    Title,
    Description,
    Priority,
    Column,
    Assignee,
    DueDate,
    Tags,
    Creator,
}

impl ConditionField {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionField::Title => "title",
            ConditionField::Description => "description",
            ConditionField::Priority => "priority",
            ConditionField::Column => "column",
            ConditionField::Assignee => "assignee",
            ConditionField::DueDate => "due_date",
            ConditionField::Tags => "tags",
            ConditionField::Creator => "creator",
        }
    }

    /// Operators the editor may attach to this field.
    ///
    /// Enforced again at save time; the evaluator assumes well-formed
    /// conditions.
    pub fn allowed_operators(&self) -> &'static [ConditionOperator] {
        use ConditionOperator::*;
        match self {
            ConditionField::Title | ConditionField::Description => {
                &[Equals, NotEquals, Contains, NotContains, IsEmpty, IsNotEmpty]
            }
            ConditionField::Priority => &[Equals, NotEquals, IsOneOf, GreaterThan, LessThan],
            ConditionField::Column => &[Equals, NotEquals, IsOneOf],
            ConditionField::Assignee => &[Equals, NotEquals, IsOneOf, IsSet, IsNotSet],
            ConditionField::DueDate => &[IsSet, IsNotSet],
            ConditionField::Tags => &[Contains, NotContains, IsEmpty, IsNotEmpty],
            ConditionField::Creator => &[Equals, NotEquals, IsOneOf],
        }
    }
}

impl std::fmt::Display for ConditionField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison applied between a resolved field and the condition value
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    IsEmpty,
    IsNotEmpty,
    IsSet,
    IsNotSet,
    IsOneOf,
    GreaterThan,
    LessThan,
}

impl ConditionOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionOperator::Equals => "equals",
            ConditionOperator::NotEquals => "not_equals",
            ConditionOperator::Contains => "contains",
            ConditionOperator::NotContains => "not_contains",
            ConditionOperator::IsEmpty => "is_empty",
            ConditionOperator::IsNotEmpty => "is_not_empty",
            ConditionOperator::IsSet => "is_set",
            ConditionOperator::IsNotSet => "is_not_set",
            ConditionOperator::IsOneOf => "is_one_of",
            ConditionOperator::GreaterThan => "greater_than",
            ConditionOperator::LessThan => "less_than",
        }
    }

    /// Whether this operator needs a comparison value
    pub fn requires_value(&self) -> bool {
        !matches!(
            self,
            ConditionOperator::IsEmpty
                | ConditionOperator::IsNotEmpty
                | ConditionOperator::IsSet
                | ConditionOperator::IsNotSet
        )
    }
}

impl std::fmt::Display for ConditionOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One predicate over the event's card snapshot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlowCondition {
    /// Unique within the owning rule
    pub id: String,
    pub field: ConditionField,
    pub operator: ConditionOperator,
    /// Comparison value; None for the no-value operators
    pub value: Option<Value>,
}

impl FlowCondition {
    pub fn new(field: ConditionField, operator: ConditionOperator) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            field,
            operator,
            value: None,
        }
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }
}

/// A card field resolved from the event context
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Priority(Priority),
    Id(String),
    List(Vec<String>),
    Date(DateTime<Utc>),
    Missing,
}

/// Resolve a condition field from the event's card snapshot
pub fn resolve_field(field: ConditionField, ctx: &EventContext) -> FieldValue {
    let card = &ctx.card;
    match field {
        ConditionField::Title => FieldValue::Text(card.title.clone()),
        ConditionField::Description => card
            .description
            .clone()
            .map(FieldValue::Text)
            .unwrap_or(FieldValue::Missing),
        ConditionField::Priority => card
            .priority
            .map(FieldValue::Priority)
            .unwrap_or(FieldValue::Missing),
        ConditionField::Column => FieldValue::Id(card.column_id.clone()),
        ConditionField::Assignee => card
            .assignee_id
            .clone()
            .map(FieldValue::Id)
            .unwrap_or(FieldValue::Missing),
        ConditionField::DueDate => card
            .due_date
            .map(FieldValue::Date)
            .unwrap_or(FieldValue::Missing),
        ConditionField::Tags => FieldValue::List(card.tags.clone()),
        ConditionField::Creator => card
            .created_by
            .clone()
            .map(FieldValue::Id)
            .unwrap_or(FieldValue::Missing),
    }
}

/// Evaluate all conditions against the event.
///
/// Empty input is true (the rule runs unconditionally). Evaluation stops
/// at the first false condition; later fields are not resolved.
pub fn evaluate_all(conditions: &[FlowCondition], ctx: &EventContext) -> bool {
    for condition in conditions {
        if !evaluate_condition(condition, ctx) {
            debug!(
                condition_id = %condition.id,
                field = %condition.field,
                operator = %condition.operator,
                "condition failed, stopping evaluation"
            );
            return false;
        }
    }
    true
}

/// Evaluate a single condition against the event
pub fn evaluate_condition(condition: &FlowCondition, ctx: &EventContext) -> bool {
    let resolved = resolve_field(condition.field, ctx);
    let value = condition.value.as_ref();

    match condition.operator {
        ConditionOperator::Equals => matches_equals(&resolved, value),
        ConditionOperator::NotEquals => !matches_equals(&resolved, value),
        ConditionOperator::Contains => matches_contains(&resolved, value),
        ConditionOperator::NotContains => !matches_contains(&resolved, value),
        ConditionOperator::IsEmpty => is_empty(&resolved),
        ConditionOperator::IsNotEmpty => !is_empty(&resolved),
        ConditionOperator::IsSet => !matches!(resolved, FieldValue::Missing),
        ConditionOperator::IsNotSet => matches!(resolved, FieldValue::Missing),
        ConditionOperator::IsOneOf => matches_one_of(&resolved, value),
        ConditionOperator::GreaterThan => {
            matches_numeric(&resolved, value, std::cmp::Ordering::Greater)
        }
        ConditionOperator::LessThan => {
            matches_numeric(&resolved, value, std::cmp::Ordering::Less)
        }
    }
}

// ── Operator internals ───────────────────────────────────────────────

fn matches_equals(resolved: &FieldValue, value: Option<&Value>) -> bool {
    let Some(value) = value else {
        return false;
    };

    match (resolved, value) {
        (FieldValue::Text(s), Value::String(v)) => s == v,
        (FieldValue::Id(s), Value::String(v)) => s == v,
        (FieldValue::Priority(p), Value::String(v)) => Priority::from_name(v) == Some(*p),
        (FieldValue::Priority(p), Value::Number(v)) => {
            v.as_f64() == Some(f64::from(p.rank()))
        }
        (FieldValue::Number(n), Value::Number(v)) => v.as_f64() == Some(*n),
        (FieldValue::Number(n), Value::String(v)) => v.parse::<f64>().ok() == Some(*n),
        _ => false,
    }
}

fn matches_contains(resolved: &FieldValue, value: Option<&Value>) -> bool {
    let Some(Value::String(needle)) = value else {
        return false;
    };

    match resolved {
        FieldValue::Text(s) => s.contains(needle),
        FieldValue::List(items) => items.iter().any(|item| item == needle),
        _ => false,
    }
}

fn is_empty(resolved: &FieldValue) -> bool {
    match resolved {
        FieldValue::Missing => true,
        FieldValue::Text(s) => s.is_empty(),
        FieldValue::Id(s) => s.is_empty(),
        FieldValue::List(items) => items.is_empty(),
        _ => false,
    }
}

fn matches_one_of(resolved: &FieldValue, value: Option<&Value>) -> bool {
    let Some(Value::Array(options)) = value else {
        return false;
    };

    options.iter().any(|option| match (resolved, option) {
        (FieldValue::Text(s), Value::String(v)) => s == v,
        (FieldValue::Id(s), Value::String(v)) => s == v,
        (FieldValue::Priority(p), Value::String(v)) => Priority::from_name(v) == Some(*p),
        (FieldValue::Number(n), Value::Number(v)) => v.as_f64() == Some(*n),
        _ => false,
    })
}

fn matches_numeric(resolved: &FieldValue, value: Option<&Value>, wanted: std::cmp::Ordering) -> bool {
    let left = match resolved {
        FieldValue::Number(n) => *n,
        FieldValue::Priority(p) => f64::from(p.rank()),
        _ => return false,
    };

    let right = match value {
        Some(Value::Number(v)) => match v.as_f64() {
            Some(n) => n,
            None => return false,
        },
        // Priority comparisons accept the level name as the value
        Some(Value::String(v)) => match Priority::from_name(v) {
            Some(p) => f64::from(p.rank()),
            None => match v.parse::<f64>() {
                Ok(n) => n,
                Err(_) => return false,
            },
        },
        _ => return false,
    };

    left.partial_cmp(&right) == Some(wanted)
}
