//! Flow automation: rules, registries, the executor, and the canvas
//! converters behind the visual builder.

pub mod action;
pub mod condition;
pub mod executor;
pub mod graph;
pub mod log;
pub mod registry;
pub mod rule;
pub mod schema;
pub mod store;
pub mod templates;
pub mod trigger;

pub use action::{ActionCategory, ActionConfig, ActionHandler, ActionType, FlowAction};
pub use condition::{evaluate_all, ConditionField, ConditionOperator, FlowCondition};
pub use executor::{ActionSink, FlowExecutor};
pub use graph::{graph_to_rule, rules_to_graph, FlowEdge, FlowGraph, FlowNode, NodeKind};
pub use log::{ActionOutcome, FlowRunLog};
pub use registry::{ActionRegistry, TriggerRegistry};
pub use rule::{validate_rule, FlowRule, RuleDraft, RulePatch, RunStatus};
pub use schema::{ConfigField, ConfigSchema, FieldType};
pub use store::{BoardContextProvider, RuleStore, RunLogStore, TemplateStore};
pub use templates::{builtin_templates, filter_templates, FlowRecipeTemplate, TemplateCategory};
pub use trigger::{FlowTrigger, TriggerHandler, TriggerType};
