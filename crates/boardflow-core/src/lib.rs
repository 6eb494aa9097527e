//! # Boardflow Core Library
//!
//! In-process flow automation engine for board-style project tools:
//! "when X happens on a board, and conditions hold, perform this
//! sequence of actions." The crate is consumed by a UI layer (the rule
//! editor and the node-graph builder) and by a background host that
//! feeds it card/board events; persistence and action side effects stay
//! behind traits the host implements.
//!
//! ## Architecture
//!
//! - **Rule model**: one trigger, AND-ed conditions, an ordered action
//!   sequence, validated as a whole before any save
//! - **Registries**: trigger/action handler catalogs built once at
//!   startup and passed by reference, no global registration
//! - **Executor**: per-event orchestration with per-action
//!   continue-on-failure, per-rule fault isolation, and exactly one run
//!   log per fired rule
//! - **Graph converters**: lossless rule ↔ canvas projection for the
//!   visual builder, with branching and cycles rejected outright
//! - **Recipe templates**: read-only catalog instantiated into drafts
//!
//! ## Key Components
//!
//! - [`FlowRule`]: the persistent declarative unit
//! - [`FlowExecutor`]: event → match → conditions → actions → run log
//! - [`TriggerRegistry`] / [`ActionRegistry`]: handler catalogs
//! - [`FlowGraph`]: the editor's node/edge view of a rule set

pub mod board;
pub mod error;
pub mod event;
pub mod flow;

pub use board::{BoardColumn, BoardContext, CardSnapshot, Priority, TeamMember};
pub use error::{FlowError, GraphError, Result, StoreError, ValidationError, ValidationFailure};
pub use event::{render_variables, EventContext, EventKind};
pub use flow::{
    graph_to_rule, rules_to_graph, validate_rule, ActionConfig, ActionRegistry, ActionSink,
    FlowAction, FlowCondition, FlowExecutor, FlowGraph, FlowRecipeTemplate, FlowRule, FlowRunLog,
    FlowTrigger, RuleDraft, RuleStore, RunLogStore, RunStatus, TriggerRegistry,
};
