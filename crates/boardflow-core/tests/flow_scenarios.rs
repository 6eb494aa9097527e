//! End-to-end scenarios over the public surface: executor runs, graph
//! round trips, edge validation, and template instantiation.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use boardflow_core::error::GraphError;
use boardflow_core::flow::action::ActionType;
use boardflow_core::flow::condition::{evaluate_all, ConditionField, ConditionOperator};
use boardflow_core::flow::executor::SinkError;
use boardflow_core::flow::store::{MemoryRuleStore, MemoryRunLogStore, RuleStore, RunLogStore};
use boardflow_core::flow::templates::builtin_templates;
use boardflow_core::flow::{graph_to_rule, rules_to_graph};
use boardflow_core::{
    ActionConfig, ActionRegistry, ActionSink, CardSnapshot, EventContext, EventKind, FlowAction,
    FlowCondition, FlowExecutor, FlowRule, FlowTrigger, Priority, RuleDraft, RunStatus,
    TriggerRegistry,
};

/// Sink that records what it performed and fails configured types
struct ScriptedSink {
    performed: Mutex<Vec<ActionType>>,
    fail_types: Vec<ActionType>,
}

impl ScriptedSink {
    fn succeeding() -> Self {
        Self {
            performed: Mutex::new(Vec::new()),
            fail_types: Vec::new(),
        }
    }

    fn failing_on(fail_types: Vec<ActionType>) -> Self {
        Self {
            performed: Mutex::new(Vec::new()),
            fail_types,
        }
    }

    fn performed(&self) -> Vec<ActionType> {
        self.performed.lock().unwrap().clone()
    }
}

#[async_trait]
impl ActionSink for ScriptedSink {
    async fn perform(
        &self,
        config: &ActionConfig,
        _event: &EventContext,
    ) -> Result<Option<String>, SinkError> {
        let action_type = config.action_type();
        self.performed.lock().unwrap().push(action_type);
        if self.fail_types.contains(&action_type) {
            return Err(format!("{action_type} was refused by the host").into());
        }
        Ok(Some(format!("{action_type} done")))
    }
}

fn card() -> CardSnapshot {
    CardSnapshot {
        id: "c1".to_string(),
        title: "Ship the landing page".to_string(),
        description: None,
        priority: Some(Priority::Low),
        column_id: "col-doing".to_string(),
        assignee_id: Some("u1".to_string()),
        due_date: None,
        tags: vec![],
        created_by: None,
    }
}

fn moved_to(column: &str) -> EventContext {
    EventContext::new(
        EventKind::CardMoved {
            from_column_id: Some("col-doing".to_string()),
            to_column_id: column.to_string(),
        },
        "b1",
        card(),
    )
}

fn notify_rule_draft(actions: Vec<FlowAction>) -> RuleDraft {
    RuleDraft {
        board_id: Some("b1".to_string()),
        workspace_id: Some("w1".to_string()),
        name: "Done notifications".to_string(),
        description: None,
        is_active: true,
        trigger: FlowTrigger::CardMoved {
            column_id: "done".to_string(),
        },
        conditions: vec![],
        actions,
    }
}

struct World {
    executor: FlowExecutor,
    sink: Arc<ScriptedSink>,
    rules: Arc<MemoryRuleStore>,
    run_logs: Arc<MemoryRunLogStore>,
}

fn world(sink: ScriptedSink) -> World {
    let sink = Arc::new(sink);
    let rules = Arc::new(MemoryRuleStore::new());
    let run_logs = Arc::new(MemoryRunLogStore::new());
    let executor = FlowExecutor::with_builtins(sink.clone(), rules.clone(), run_logs.clone());
    World {
        executor,
        sink,
        rules,
        run_logs,
    }
}

// ── Condition evaluator properties ───────────────────────────────────

#[test]
fn empty_conditions_always_evaluate_true() {
    let ctx = moved_to("done");
    assert!(evaluate_all(&[], &ctx));
}

#[test]
fn evaluation_is_a_short_circuiting_and() {
    let ctx = moved_to("done");
    let failing = FlowCondition::new(ConditionField::Priority, ConditionOperator::Equals)
        .with_value(json!("urgent"));
    let passing = FlowCondition::new(ConditionField::Column, ConditionOperator::Equals)
        .with_value(json!("col-doing"));

    // one false condition decides the outcome wherever it sits
    assert!(!evaluate_all(&[failing.clone(), passing.clone()], &ctx));
    assert!(!evaluate_all(&[passing.clone(), failing], &ctx));
    assert!(evaluate_all(&[passing], &ctx));
}

// ── Executor scenarios ───────────────────────────────────────────────

#[tokio::test]
async fn scenario_a_trigger_match_runs_single_action_to_success() {
    let w = world(ScriptedSink::succeeding());
    let rule = w
        .rules
        .create(notify_rule_draft(vec![FlowAction::new(
            ActionConfig::NotifyUser {
                user_id: "u1".to_string(),
                message: "done!".to_string(),
            },
            0,
        )]))
        .unwrap();

    let logs = w.executor.process_event(&moved_to("done")).await;

    assert_eq!(logs.len(), 1);
    let log = &logs[0];
    assert_eq!(log.status, RunStatus::Success);
    assert_eq!(log.actions_total, 1);
    assert_eq!(log.actions_succeeded, 1);
    assert_eq!(log.actions_failed, 0);
    assert_eq!(w.sink.performed(), vec![ActionType::NotifyUser]);
    assert_eq!(w.rules.get(&rule.id).unwrap().run_count, 1);
}

#[tokio::test]
async fn scenario_b_non_matching_column_fires_nothing() {
    let w = world(ScriptedSink::succeeding());
    let rule = w
        .rules
        .create(notify_rule_draft(vec![FlowAction::new(
            ActionConfig::NotifyUser {
                user_id: "u1".to_string(),
                message: "done!".to_string(),
            },
            0,
        )]))
        .unwrap();

    let logs = w.executor.process_event(&moved_to("review")).await;

    assert!(logs.is_empty());
    assert!(w.sink.performed().is_empty());
    assert!(w.run_logs.list_by_rule(&rule.id, 10).unwrap().is_empty());
    assert_eq!(w.rules.get(&rule.id).unwrap().run_count, 0);
}

#[tokio::test]
async fn scenario_c_first_false_condition_suppresses_the_run() {
    let w = world(ScriptedSink::succeeding());
    let mut draft = notify_rule_draft(vec![FlowAction::new(ActionConfig::ArchiveCard, 0)]);
    draft.conditions = vec![
        FlowCondition::new(ConditionField::Priority, ConditionOperator::Equals)
            .with_value(json!("high")),
        FlowCondition::new(ConditionField::Column, ConditionOperator::Equals)
            .with_value(json!("done")),
    ];
    let rule = w.rules.create(draft).unwrap();

    // card priority is low, so the first condition already fails
    let logs = w.executor.process_event(&moved_to("done")).await;

    assert!(logs.is_empty());
    assert!(w.sink.performed().is_empty());
    assert_eq!(w.rules.get(&rule.id).unwrap().run_count, 0);
}

#[tokio::test]
async fn abort_semantics_stop_after_first_failed_action() {
    let w = world(ScriptedSink::failing_on(vec![ActionType::AddTag]));
    w.rules
        .create(notify_rule_draft(vec![
            FlowAction::new(
                ActionConfig::AddTag {
                    tag: "done".to_string(),
                },
                0,
            ),
            FlowAction::new(ActionConfig::ArchiveCard, 1),
            FlowAction::new(
                ActionConfig::SetPriority {
                    priority: Priority::Low,
                },
                2,
            ),
        ]))
        .unwrap();

    let logs = w.executor.process_event(&moved_to("done")).await;

    let log = &logs[0];
    assert_eq!(log.status, RunStatus::Failed);
    assert_eq!(log.action_results.len(), 1);
    assert_eq!(log.actions_total, 3);
    assert!(log.abort_detected());
    assert_eq!(w.sink.performed(), vec![ActionType::AddTag]);
}

#[tokio::test]
async fn continue_on_failure_runs_the_rest_and_logs_partial() {
    let w = world(ScriptedSink::failing_on(vec![ActionType::AddTag]));
    w.rules
        .create(notify_rule_draft(vec![
            FlowAction::new(
                ActionConfig::AddTag {
                    tag: "done".to_string(),
                },
                0,
            )
            .continue_on_failure(),
            FlowAction::new(ActionConfig::ArchiveCard, 1),
        ]))
        .unwrap();

    let logs = w.executor.process_event(&moved_to("done")).await;

    let log = &logs[0];
    assert_eq!(log.status, RunStatus::Partial);
    assert_eq!(log.action_results.len(), 2);
    assert_eq!(log.actions_succeeded, 1);
    assert_eq!(log.actions_failed, 1);
    assert_eq!(
        w.sink.performed(),
        vec![ActionType::AddTag, ActionType::ArchiveCard]
    );
}

#[tokio::test]
async fn all_successful_actions_log_success_with_full_counts() {
    let w = world(ScriptedSink::succeeding());
    w.rules
        .create(notify_rule_draft(vec![
            FlowAction::new(
                ActionConfig::AddTag {
                    tag: "done".to_string(),
                },
                0,
            ),
            FlowAction::new(ActionConfig::ArchiveCard, 1),
        ]))
        .unwrap();

    let logs = w.executor.process_event(&moved_to("done")).await;

    let log = &logs[0];
    assert_eq!(log.status, RunStatus::Success);
    assert_eq!(log.actions_succeeded, 2);
    assert_eq!(log.actions_total, 2);
    assert!(!log.abort_detected());
}

#[tokio::test]
async fn inactive_rules_see_no_trigger_work_at_all() {
    // empty trigger registry: any trigger-match attempt would emit an
    // unregistered-trigger failure log, so silence proves the rule was
    // skipped before trigger resolution
    let sink = Arc::new(ScriptedSink::succeeding());
    let rules = Arc::new(MemoryRuleStore::new());
    let run_logs = Arc::new(MemoryRunLogStore::new());
    let executor = FlowExecutor::new(
        TriggerRegistry::new(),
        ActionRegistry::builtin(),
        sink.clone(),
        rules.clone(),
        run_logs.clone(),
    );

    let mut draft = notify_rule_draft(vec![FlowAction::new(ActionConfig::ArchiveCard, 0)]);
    draft.is_active = false;
    let rule = rules.create(draft).unwrap();

    let logs = executor.process_event(&moved_to("done")).await;

    assert!(logs.is_empty());
    assert!(sink.performed().is_empty());
    assert!(run_logs.list_by_rule(&rule.id, 10).unwrap().is_empty());
    assert_eq!(rules.get(&rule.id).unwrap().run_count, 0);
}

// ── Graph round trip and edge validation ─────────────────────────────

#[test]
fn round_trip_preserves_trigger_conditions_and_action_sequence() {
    let rule = FlowRule::new(
        "b1",
        "w1",
        "Escalate urgent work",
        FlowTrigger::PriorityChanged {
            priority: Some(Priority::Urgent),
        },
    )
    .with_conditions(vec![
        FlowCondition::new(ConditionField::Assignee, ConditionOperator::IsSet),
        FlowCondition::new(ConditionField::Tags, ConditionOperator::NotContains)
            .with_value(json!("escalated")),
    ])
    .with_actions(vec![
        FlowAction::new(
            ActionConfig::NotifyUser {
                user_id: "u1".to_string(),
                message: "urgent!".to_string(),
            },
            0,
        ),
        FlowAction::new(
            ActionConfig::AddTag {
                tag: "escalated".to_string(),
            },
            1,
        ),
    ]);

    let graph = rules_to_graph(std::slice::from_ref(&rule));
    let draft = graph_to_rule(&graph, &rule.id, Some(&rule)).unwrap();

    assert_eq!(draft.trigger, rule.trigger);
    assert_eq!(draft.board_id.as_deref(), Some("b1"));
    assert_eq!(draft.workspace_id.as_deref(), Some("w1"));

    let draft_condition_ids: std::collections::HashSet<&str> =
        draft.conditions.iter().map(|c| c.id.as_str()).collect();
    let rule_condition_ids: std::collections::HashSet<&str> =
        rule.conditions.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(draft_condition_ids, rule_condition_ids);

    let rebuilt: Vec<&ActionConfig> = draft.actions.iter().map(|a| &a.config).collect();
    let original: Vec<&ActionConfig> =
        rule.actions_in_order().into_iter().map(|a| &a.config).collect();
    assert_eq!(rebuilt.len(), original.len());
    for (r, o) in rebuilt.iter().zip(&original) {
        assert_eq!(r, o);
    }
}

#[test]
fn rejected_connections_leave_the_edge_set_unchanged() {
    let first = FlowRule::new(
        "b1",
        "w1",
        "First",
        FlowTrigger::CardCreated { column_id: None },
    )
    .with_actions(vec![FlowAction::new(ActionConfig::ArchiveCard, 0)]);
    let second = FlowRule::new(
        "b1",
        "w1",
        "Second",
        FlowTrigger::CardCreated { column_id: None },
    )
    .with_actions(vec![FlowAction::new(ActionConfig::ArchiveCard, 0)]);

    let mut graph = rules_to_graph(&[first.clone(), second.clone()]);
    let before = graph.edges.clone();

    let first_action = format!("action-{}-{}", first.id, first.actions[0].id);
    let first_trigger = format!("trigger-{}", first.id);
    let second_action = format!("action-{}-{}", second.id, second.actions[0].id);

    // reverse direction
    assert!(matches!(
        graph.connect(&first_action, &first_trigger),
        Err(GraphError::EdgeNotAllowed { .. })
    ));
    // endpoints from two different rules
    assert_eq!(
        graph.connect(&first_action, &second_action),
        Err(GraphError::CrossRule)
    );

    assert_eq!(graph.edges, before);
}

// ── Recipe templates ─────────────────────────────────────────────────

#[test]
fn scenario_d_template_instantiation_is_an_inactive_deep_copy() {
    let templates = builtin_templates();
    let template = templates
        .iter()
        .find(|t| !t.conditions.is_empty() && !t.actions.is_empty())
        .expect("catalog has a template with conditions and actions");

    let mut draft = template.instantiate("b1", "w1");

    assert!(!draft.is_active);
    assert_eq!(draft.board_id.as_deref(), Some("b1"));
    for (drafted, original) in draft.conditions.iter().zip(&template.conditions) {
        assert_ne!(drafted.id, original.id);
        assert_eq!(drafted.field, original.field);
        assert_eq!(drafted.operator, original.operator);
    }
    for (drafted, original) in draft.actions.iter().zip(&template.actions) {
        assert_ne!(drafted.id, original.id);
        assert_eq!(drafted.config, original.config);
    }

    // mutating the draft must not reach back into the catalog entry
    let conditions_before = template.conditions.clone();
    draft.conditions.clear();
    draft.actions.clear();
    assert_eq!(template.conditions, conditions_before);
    assert!(!template.actions.is_empty());
}

// ── Property: graph round trip over arbitrary valid rules ────────────

mod round_trip_property {
    use super::*;
    use proptest::prelude::*;
    use proptest::strategy::LazyJust;

    fn arb_trigger() -> impl Strategy<Value = FlowTrigger> {
        prop_oneof![
            Just(FlowTrigger::CardCreated { column_id: None }),
            "[a-z]{3,8}".prop_map(|column_id| FlowTrigger::CardMoved { column_id }),
            Just(FlowTrigger::CardAssigned { assignee_id: None }),
            (1i64..30).prop_map(|days_before| FlowTrigger::DueDateApproaching { days_before }),
        ]
    }

    // every sample must mint its own condition, ids are unique per rule
    fn arb_condition() -> impl Strategy<Value = FlowCondition> {
        prop_oneof![
            "[a-z]{1,6}".prop_map(|needle| {
                FlowCondition::new(ConditionField::Title, ConditionOperator::Contains)
                    .with_value(json!(needle))
            }),
            LazyJust::new(|| FlowCondition::new(
                ConditionField::DueDate,
                ConditionOperator::IsSet
            )),
            LazyJust::new(|| FlowCondition::new(
                ConditionField::Assignee,
                ConditionOperator::IsNotSet
            )),
            LazyJust::new(|| FlowCondition::new(
                ConditionField::Priority,
                ConditionOperator::GreaterThan
            )
            .with_value(json!("medium"))),
        ]
    }

    fn arb_config() -> impl Strategy<Value = ActionConfig> {
        prop_oneof![
            Just(ActionConfig::ArchiveCard),
            "[a-z]{1,8}".prop_map(|tag| ActionConfig::AddTag { tag }),
            "[a-z]{1,8}".prop_map(|column_id| ActionConfig::MoveCard { column_id }),
            Just(ActionConfig::SetPriority {
                priority: Priority::High
            }),
        ]
    }

    fn arb_rule() -> impl Strategy<Value = FlowRule> {
        (
            arb_trigger(),
            prop::collection::vec(arb_condition(), 0..4),
            prop::collection::vec((arb_config(), any::<bool>()), 1..5),
            // gap between consecutive order values, so orders are
            // strictly increasing but not necessarily contiguous
            prop::collection::vec(1u32..4, 5),
        )
            .prop_map(|(trigger, conditions, configs, gaps)| {
                let mut order = 0u32;
                let actions = configs
                    .into_iter()
                    .zip(gaps)
                    .map(|((config, tolerant), gap)| {
                        let mut action = FlowAction::new(config, order);
                        action.continue_on_failure = tolerant;
                        order += gap;
                        action
                    })
                    .collect();
                FlowRule::new("b1", "w1", "Generated rule", trigger)
                    .with_conditions(conditions)
                    .with_actions(actions)
            })
    }

    proptest! {
        #[test]
        fn graph_round_trip_preserves_rule_semantics(rule in arb_rule()) {
            // a duplicate condition id would collapse two node ids into one
            let condition_ids: std::collections::HashSet<&str> =
                rule.conditions.iter().map(|c| c.id.as_str()).collect();
            prop_assert_eq!(condition_ids.len(), rule.conditions.len());

            let graph = rules_to_graph(std::slice::from_ref(&rule));
            let draft = graph_to_rule(&graph, &rule.id, Some(&rule)).unwrap();

            prop_assert_eq!(&draft.trigger, &rule.trigger);
            prop_assert_eq!(draft.conditions.len(), rule.conditions.len());
            for (rebuilt, original) in draft.conditions.iter().zip(&rule.conditions) {
                prop_assert_eq!(rebuilt, original);
            }

            // relative action sequence survives, orders renumbered 0,1,2,…
            let original = rule.actions_in_order();
            prop_assert_eq!(draft.actions.len(), original.len());
            for (index, (rebuilt, source)) in draft.actions.iter().zip(&original).enumerate() {
                prop_assert_eq!(&rebuilt.config, &source.config);
                prop_assert_eq!(rebuilt.continue_on_failure, source.continue_on_failure);
                prop_assert_eq!(rebuilt.order, index as u32);
            }

            // converting twice from the same rule set is stable
            prop_assert_eq!(rules_to_graph(std::slice::from_ref(&rule)), graph);
        }
    }
}
