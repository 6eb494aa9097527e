//! Board events that drive flow evaluation.
//!
//! Every card change the host observes becomes an [`EventContext`]; the
//! executor fans each one out to the board's active rules.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::board::{BoardContext, CardSnapshot, Priority};

/// What happened on the board.
///
/// `due_date_approaching` is synthetic: a scheduler emits it for cards
/// nearing their due date, it never originates from a user edit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    CardCreated,
    CardMoved {
        from_column_id: Option<String>,
        to_column_id: String,
    },
    CardAssigned {
        assignee_id: String,
    },
    PriorityChanged {
        previous: Option<Priority>,
        current: Priority,
    },
    TagAdded {
        tag: String,
    },
    DueDateApproaching {
        days_until: i64,
    },
}

impl EventKind {
    /// Stable name used in run logs and tracing output
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::CardCreated => "card_created",
            EventKind::CardMoved { .. } => "card_moved",
            EventKind::CardAssigned { .. } => "card_assigned",
            EventKind::PriorityChanged { .. } => "priority_changed",
            EventKind::TagAdded { .. } => "tag_added",
            EventKind::DueDateApproaching { .. } => "due_date_approaching",
        }
    }
}

/// A board event plus the card snapshot it concerns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventContext {
    pub kind: EventKind,
    pub board_id: String,
    pub card: CardSnapshot,
    /// User who caused the event, if any
    pub actor: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl EventContext {
    pub fn new(kind: EventKind, board_id: impl Into<String>, card: CardSnapshot) -> Self {
        Self {
            kind,
            board_id: board_id.into(),
            card,
            actor: None,
            occurred_at: Utc::now(),
        }
    }

    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }
}

/// Substitute `{{card.*}}` and `{{event.actor}}` placeholders in one pass.
///
/// Single pass prevents values that themselves contain placeholders from
/// being substituted again. Unknown placeholders are kept unchanged. Ids
/// render as board labels/names when a [`BoardContext`] is supplied.
pub fn render_variables(
    template: &str,
    ctx: &EventContext,
    board: Option<&BoardContext>,
) -> String {
    let card = &ctx.card;

    let column = board
        .and_then(|b| b.column_label(&card.column_id))
        .unwrap_or(card.column_id.as_str());
    let assignee = card
        .assignee_id
        .as_deref()
        .map(|id| board.and_then(|b| b.member_name(id)).unwrap_or(id))
        .unwrap_or("");
    let actor = ctx
        .actor
        .as_deref()
        .map(|id| board.and_then(|b| b.member_name(id)).unwrap_or(id))
        .unwrap_or("");
    let priority = card.priority.map(|p| p.as_str()).unwrap_or("");
    let due_date = card
        .due_date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default();

    let mut vars: HashMap<&str, &str> = HashMap::new();
    vars.insert("{{card.title}}", card.title.as_str());
    vars.insert("{{card.description}}", card.description.as_deref().unwrap_or(""));
    vars.insert("{{card.priority}}", priority);
    vars.insert("{{card.column}}", column);
    vars.insert("{{card.assignee}}", assignee);
    vars.insert("{{card.due_date}}", due_date.as_str());
    vars.insert("{{event.actor}}", actor);

    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        rendered.push_str(&rest[..start]);
        if let Some(end_offset) = rest[start..].find("}}") {
            let key = &rest[start..start + end_offset + 2];
            if let Some(value) = vars.get(key) {
                rendered.push_str(value);
            } else {
                rendered.push_str(key);
            }
            rest = &rest[start + end_offset + 2..];
        } else {
            rendered.push_str(&rest[start..]);
            rest = "";
        }
    }
    rendered.push_str(rest);
    rendered
}
