//! The rule executor: event in, run logs out.
//!
//! For each active rule on the event's board the executor checks the
//! trigger, evaluates conditions, then drives the action sequence
//! strictly in `order` through the host's action sink. Every fired rule
//! emits exactly one run log; no-match and conditions-false emit none.
//! Faults stay local to one (rule, event) pair.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::event::EventContext;
use crate::flow::action::ActionConfig;
use crate::flow::log::{ActionOutcome, FlowRunLog};
use crate::flow::registry::{ActionRegistry, TriggerRegistry};
use crate::flow::rule::{FlowRule, RulePatch, RunStatus};
use crate::flow::store::{RuleStore, RunLogStore};

/// Error produced by an action's runtime effect
pub type SinkError = Box<dyn std::error::Error + Send + Sync>;

/// Where action effects land.
///
/// The sink belongs to the host: card mutation, notification dispatch,
/// integrations. `Ok(details)` and `Err(message)` map straight onto an
/// [`ActionOutcome`]; sink errors never abort sibling rules.
#[async_trait]
pub trait ActionSink: Send + Sync {
    async fn perform(
        &self,
        config: &ActionConfig,
        event: &EventContext,
    ) -> Result<Option<String>, SinkError>;
}

/// Runs a board's rules against incoming events
pub struct FlowExecutor {
    triggers: TriggerRegistry,
    actions: ActionRegistry,
    sink: Arc<dyn ActionSink>,
    rules: Arc<dyn RuleStore>,
    run_logs: Arc<dyn RunLogStore>,
}

impl FlowExecutor {
    pub fn new(
        triggers: TriggerRegistry,
        actions: ActionRegistry,
        sink: Arc<dyn ActionSink>,
        rules: Arc<dyn RuleStore>,
        run_logs: Arc<dyn RunLogStore>,
    ) -> Self {
        Self {
            triggers,
            actions,
            sink,
            rules,
            run_logs,
        }
    }

    /// Executor with the built-in registries
    pub fn with_builtins(
        sink: Arc<dyn ActionSink>,
        rules: Arc<dyn RuleStore>,
        run_logs: Arc<dyn RunLogStore>,
    ) -> Self {
        Self::new(
            TriggerRegistry::builtin(),
            ActionRegistry::builtin(),
            sink,
            rules,
            run_logs,
        )
    }

    /// Evaluate every rule on the event's board against one event.
    ///
    /// Rules run isolated: a store or sink fault in one rule is logged
    /// and the remaining rules still run. Returns the run logs emitted.
    pub async fn process_event(&self, event: &EventContext) -> Vec<FlowRunLog> {
        let rules = match self.rules.list(&event.board_id) {
            Ok(rules) => rules,
            Err(error) => {
                warn!(
                    board_id = %event.board_id,
                    event = event.kind.name(),
                    %error,
                    "failed to load rules, dropping event"
                );
                return Vec::new();
            }
        };

        let mut logs = Vec::new();
        for rule in &rules {
            match self.run_rule(rule, event).await {
                Ok(Some(log)) => logs.push(log),
                Ok(None) => {}
                Err(error) => {
                    warn!(
                        rule_id = %rule.id,
                        event = event.kind.name(),
                        %error,
                        "rule evaluation faulted, continuing with remaining rules"
                    );
                }
            }
        }
        logs
    }

    /// Run one rule against one event.
    ///
    /// Returns `Ok(None)` when the rule did not fire: inactive, trigger
    /// mismatch, conditions false, or nothing to execute. A fired rule
    /// appends exactly one run log and bumps the rule's run counters.
    pub async fn run_rule(
        &self,
        rule: &FlowRule,
        event: &EventContext,
    ) -> crate::error::Result<Option<FlowRunLog>> {
        if !rule.is_active {
            debug!(rule_id = %rule.id, "rule inactive, skipping");
            return Ok(None);
        }

        match self.triggers.get(rule.trigger.trigger_type()) {
            Some(handler) => {
                if !handler.matches(&rule.trigger, event) {
                    debug!(
                        rule_id = %rule.id,
                        event = event.kind.name(),
                        "trigger did not match"
                    );
                    return Ok(None);
                }
            }
            // A deploy removed the handler; permanent failure, not retried.
            None => {
                warn!(
                    rule_id = %rule.id,
                    trigger_type = %rule.trigger.trigger_type(),
                    "trigger type is not registered"
                );
                let log = self
                    .emit(
                        rule,
                        event,
                        Vec::new(),
                        Some(format!(
                            "trigger type '{}' is not registered",
                            rule.trigger.trigger_type()
                        )),
                        0,
                    )
                    .await?;
                return Ok(Some(log));
            }
        }

        if !crate::flow::condition::evaluate_all(&rule.conditions, event) {
            debug!(rule_id = %rule.id, "conditions false, rule did not fire");
            return Ok(None);
        }

        if rule.actions.is_empty() {
            debug!(rule_id = %rule.id, "rule has no actions, nothing to run");
            return Ok(None);
        }

        let started = Instant::now();
        let results = self.execute_actions(rule, event).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        let log = self.emit(rule, event, results, None, duration_ms).await?;
        info!(
            rule_id = %rule.id,
            status = %log.status,
            attempted = log.action_results.len(),
            total = log.actions_total,
            duration_ms,
            "rule fired"
        );
        Ok(Some(log))
    }

    /// Drive the action sequence in ascending `order`, one at a time.
    ///
    /// Later actions may depend on earlier side effects, so there is no
    /// concurrency here. A failure with `continue_on_failure == false`
    /// stops the sequence; unattempted actions are not recorded.
    async fn execute_actions(&self, rule: &FlowRule, event: &EventContext) -> Vec<ActionOutcome> {
        let mut results = Vec::new();

        for action in rule.actions_in_order() {
            let outcome = match self.actions.get(action.action_type()) {
                None => ActionOutcome::failed(format!(
                    "action type '{}' is not registered",
                    action.action_type()
                )),
                Some(handler) if handler.coming_soon() => ActionOutcome::failed(format!(
                    "action '{}' is not available yet",
                    handler.label()
                )),
                Some(_) => match self.sink.perform(&action.config, event).await {
                    Ok(details) => ActionOutcome::succeeded(details),
                    Err(error) => ActionOutcome::failed(error.to_string()),
                },
            };

            let failed = !outcome.success;
            if failed {
                debug!(
                    rule_id = %rule.id,
                    action_id = %action.id,
                    action_type = %action.action_type(),
                    error = outcome.error.as_deref().unwrap_or(""),
                    "action failed"
                );
            }
            results.push(outcome);

            if failed && !action.continue_on_failure {
                debug!(rule_id = %rule.id, action_id = %action.id, "aborting action sequence");
                break;
            }
        }

        results
    }

    /// Append the run log and update the rule's denormalized counters
    async fn emit(
        &self,
        rule: &FlowRule,
        event: &EventContext,
        results: Vec<ActionOutcome>,
        error_message: Option<String>,
        duration_ms: u64,
    ) -> crate::error::Result<FlowRunLog> {
        let actions_total = rule.actions.len();
        let status = if error_message.is_some() {
            RunStatus::Failed
        } else {
            FlowRunLog::compute_status(actions_total, &results)
        };
        let triggered_at = Utc::now();

        let log = FlowRunLog {
            id: uuid::Uuid::new_v4().to_string(),
            rule_id: rule.id.clone(),
            board_id: rule.board_id.clone(),
            card_id: Some(event.card.id.clone()),
            triggered_by: Some(event.kind.name().to_string()),
            triggered_at,
            status,
            actions_total,
            actions_succeeded: results.iter().filter(|r| r.success).count(),
            actions_failed: results.iter().filter(|r| !r.success).count(),
            action_results: results,
            error_message,
            duration_ms,
        };

        self.run_logs.append(log.clone())?;
        self.rules.update(
            &rule.id,
            RulePatch::run_outcome(triggered_at, status, rule.run_count + 1),
        )?;

        Ok(log)
    }
}
