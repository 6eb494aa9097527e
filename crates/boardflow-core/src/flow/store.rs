//! Store traits and reference implementations.
//!
//! Durable persistence belongs to the host; the engine only talks to
//! these traits. The in-memory stores back tests and single-process
//! hosts, and the TOML rule store covers hosts that want a plain file.
//! Rule writes are full-document last-write-wins.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::board::{BoardContext, TeamMember};
use crate::error::StoreError;
use crate::flow::log::FlowRunLog;
use crate::flow::rule::{FlowRule, RuleDraft, RulePatch};
use crate::flow::templates::{builtin_templates, FlowRecipeTemplate};

/// Rule persistence
pub trait RuleStore: Send + Sync {
    fn list(&self, board_id: &str) -> Result<Vec<FlowRule>, StoreError>;
    fn get(&self, id: &str) -> Result<FlowRule, StoreError>;
    fn create(&self, draft: RuleDraft) -> Result<FlowRule, StoreError>;
    fn update(&self, id: &str, patch: RulePatch) -> Result<FlowRule, StoreError>;
    fn delete(&self, id: &str) -> Result<(), StoreError>;
    fn toggle_active(&self, id: &str) -> Result<FlowRule, StoreError>;
}

/// Append-only run history
pub trait RunLogStore: Send + Sync {
    fn append(&self, log: FlowRunLog) -> Result<(), StoreError>;

    /// Most recent runs first
    fn list_by_rule(&self, rule_id: &str, limit: usize) -> Result<Vec<FlowRunLog>, StoreError>;
}

/// Recipe template catalog
pub trait TemplateStore: Send + Sync {
    /// Templates ordered by `sort_order`
    fn list(&self) -> Result<Vec<FlowRecipeTemplate>, StoreError>;
}

/// Board metadata for pickers and summarizers; queried by the editor
pub trait BoardContextProvider: Send + Sync {
    fn board(&self, board_id: &str) -> Result<BoardContext, StoreError>;
    fn team_members(&self, board_id: &str) -> Result<Vec<TeamMember>, StoreError>;
}

fn lock_poisoned<T>(_: std::sync::PoisonError<T>) -> StoreError {
    StoreError::Backend("store lock poisoned".to_string())
}

/// Turn a draft into a persistable rule, assigning id and timestamps
fn materialize(draft: RuleDraft) -> Result<FlowRule, StoreError> {
    let board_id = draft
        .board_id
        .ok_or_else(|| StoreError::Backend("rule draft is missing a board id".to_string()))?;
    let workspace_id = draft
        .workspace_id
        .ok_or_else(|| StoreError::Backend("rule draft is missing a workspace id".to_string()))?;

    let now = Utc::now();
    Ok(FlowRule {
        id: uuid::Uuid::new_v4().to_string(),
        board_id,
        workspace_id,
        name: draft.name,
        description: draft.description,
        is_active: draft.is_active,
        trigger: draft.trigger,
        conditions: draft.conditions,
        actions: draft.actions,
        last_run_at: None,
        last_run_status: None,
        run_count: 0,
        created_at: now,
        updated_at: now,
    })
}

// ── In-memory stores ─────────────────────────────────────────────────

/// Mutex-guarded map of rules, the default store for tests and hosts
/// that persist elsewhere
#[derive(Default)]
pub struct MemoryRuleStore {
    rules: Mutex<HashMap<String, FlowRule>>,
}

impl MemoryRuleStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RuleStore for MemoryRuleStore {
    fn list(&self, board_id: &str) -> Result<Vec<FlowRule>, StoreError> {
        let rules = self.rules.lock().map_err(lock_poisoned)?;
        let mut matching: Vec<FlowRule> = rules
            .values()
            .filter(|r| r.board_id == board_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(matching)
    }

    fn get(&self, id: &str) -> Result<FlowRule, StoreError> {
        let rules = self.rules.lock().map_err(lock_poisoned)?;
        rules
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::RuleNotFound(id.to_string()))
    }

    fn create(&self, draft: RuleDraft) -> Result<FlowRule, StoreError> {
        let rule = materialize(draft)?;
        let mut rules = self.rules.lock().map_err(lock_poisoned)?;
        rules.insert(rule.id.clone(), rule.clone());
        Ok(rule)
    }

    fn update(&self, id: &str, patch: RulePatch) -> Result<FlowRule, StoreError> {
        let mut rules = self.rules.lock().map_err(lock_poisoned)?;
        let rule = rules
            .get_mut(id)
            .ok_or_else(|| StoreError::RuleNotFound(id.to_string()))?;
        patch.apply(rule);
        Ok(rule.clone())
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut rules = self.rules.lock().map_err(lock_poisoned)?;
        rules
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::RuleNotFound(id.to_string()))
    }

    fn toggle_active(&self, id: &str) -> Result<FlowRule, StoreError> {
        let mut rules = self.rules.lock().map_err(lock_poisoned)?;
        let rule = rules
            .get_mut(id)
            .ok_or_else(|| StoreError::RuleNotFound(id.to_string()))?;
        rule.is_active = !rule.is_active;
        rule.updated_at = Utc::now();
        Ok(rule.clone())
    }
}

/// Append-only in-memory run history
#[derive(Default)]
pub struct MemoryRunLogStore {
    logs: Mutex<Vec<FlowRunLog>>,
}

impl MemoryRunLogStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RunLogStore for MemoryRunLogStore {
    fn append(&self, log: FlowRunLog) -> Result<(), StoreError> {
        let mut logs = self.logs.lock().map_err(lock_poisoned)?;
        logs.push(log);
        Ok(())
    }

    fn list_by_rule(&self, rule_id: &str, limit: usize) -> Result<Vec<FlowRunLog>, StoreError> {
        let logs = self.logs.lock().map_err(lock_poisoned)?;
        Ok(logs
            .iter()
            .rev()
            .filter(|l| l.rule_id == rule_id)
            .take(limit)
            .cloned()
            .collect())
    }
}

/// Template store serving the built-in catalog
pub struct StaticTemplates {
    templates: Vec<FlowRecipeTemplate>,
}

impl StaticTemplates {
    pub fn builtin() -> Self {
        Self {
            templates: builtin_templates(),
        }
    }

    pub fn with_templates(templates: Vec<FlowRecipeTemplate>) -> Self {
        Self { templates }
    }
}

impl TemplateStore for StaticTemplates {
    fn list(&self) -> Result<Vec<FlowRecipeTemplate>, StoreError> {
        let mut templates = self.templates.clone();
        templates.sort_by_key(|t| t.sort_order);
        Ok(templates)
    }
}

/// Fixed board metadata, for tests and single-board hosts
#[derive(Default)]
pub struct StaticBoardContext {
    boards: HashMap<String, BoardContext>,
}

impl StaticBoardContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_board(mut self, board: BoardContext) -> Self {
        self.boards.insert(board.id.clone(), board);
        self
    }
}

impl BoardContextProvider for StaticBoardContext {
    fn board(&self, board_id: &str) -> Result<BoardContext, StoreError> {
        self.boards
            .get(board_id)
            .cloned()
            .ok_or_else(|| StoreError::BoardNotFound(board_id.to_string()))
    }

    fn team_members(&self, board_id: &str) -> Result<Vec<TeamMember>, StoreError> {
        Ok(self.board(board_id)?.members)
    }
}

// ── TOML file store ──────────────────────────────────────────────────

/// Rules persisted to a single TOML file.
///
/// Every operation reads and rewrites the whole file; fine for the rule
/// counts a board carries.
pub struct TomlRuleStore {
    path: PathBuf,
}

/// Wrapper for serializing rules to TOML
#[derive(Serialize, Deserialize, Default)]
struct RulesFile {
    #[serde(default)]
    rules: Vec<FlowRule>,
}

impl TomlRuleStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Load all rules; a missing file reads as empty
    fn load(&self) -> Result<Vec<FlowRule>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        let file: RulesFile = toml::from_str(&content)?;
        Ok(file.rules)
    }

    fn save(&self, rules: &[FlowRule]) -> Result<(), StoreError> {
        let file = RulesFile {
            rules: rules.to_vec(),
        };
        let content = toml::to_string_pretty(&file)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

impl RuleStore for TomlRuleStore {
    fn list(&self, board_id: &str) -> Result<Vec<FlowRule>, StoreError> {
        Ok(self
            .load()?
            .into_iter()
            .filter(|r| r.board_id == board_id)
            .collect())
    }

    fn get(&self, id: &str) -> Result<FlowRule, StoreError> {
        self.load()?
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::RuleNotFound(id.to_string()))
    }

    fn create(&self, draft: RuleDraft) -> Result<FlowRule, StoreError> {
        let rule = materialize(draft)?;
        let mut rules = self.load()?;
        rules.push(rule.clone());
        self.save(&rules)?;
        Ok(rule)
    }

    fn update(&self, id: &str, patch: RulePatch) -> Result<FlowRule, StoreError> {
        let mut rules = self.load()?;
        let rule = rules
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::RuleNotFound(id.to_string()))?;
        patch.apply(rule);
        let updated = rule.clone();
        self.save(&rules)?;
        Ok(updated)
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut rules = self.load()?;
        let before = rules.len();
        rules.retain(|r| r.id != id);
        if rules.len() == before {
            return Err(StoreError::RuleNotFound(id.to_string()));
        }
        self.save(&rules)
    }

    fn toggle_active(&self, id: &str) -> Result<FlowRule, StoreError> {
        let mut rules = self.load()?;
        let rule = rules
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::RuleNotFound(id.to_string()))?;
        rule.is_active = !rule.is_active;
        rule.updated_at = Utc::now();
        let updated = rule.clone();
        self.save(&rules)?;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::action::{ActionConfig, FlowAction};
    use crate::flow::condition::{ConditionField, ConditionOperator, FlowCondition};
    use crate::flow::rule::RunStatus;
    use crate::flow::trigger::FlowTrigger;

    fn create_draft(name: &str) -> RuleDraft {
        RuleDraft {
            board_id: Some("b1".to_string()),
            workspace_id: Some("w1".to_string()),
            name: name.to_string(),
            description: None,
            is_active: true,
            trigger: FlowTrigger::CardMoved {
                column_id: "col-done".to_string(),
            },
            conditions: vec![FlowCondition::new(
                ConditionField::Priority,
                ConditionOperator::Equals,
            )
            .with_value(serde_json::json!("high"))],
            actions: vec![FlowAction::new(ActionConfig::ArchiveCard, 0)],
        }
    }

    fn create_log(rule_id: &str) -> FlowRunLog {
        FlowRunLog {
            id: uuid::Uuid::new_v4().to_string(),
            rule_id: rule_id.to_string(),
            board_id: "b1".to_string(),
            card_id: Some("c1".to_string()),
            triggered_by: Some("card_moved".to_string()),
            triggered_at: Utc::now(),
            status: RunStatus::Success,
            actions_total: 1,
            actions_succeeded: 1,
            actions_failed: 0,
            action_results: vec![],
            error_message: None,
            duration_ms: 3,
        }
    }

    #[test]
    fn test_memory_store_crud_cycle() {
        let store = MemoryRuleStore::new();
        let rule = store.create(create_draft("Archive done")).unwrap();

        assert_eq!(store.get(&rule.id).unwrap().name, "Archive done");
        assert_eq!(store.list("b1").unwrap().len(), 1);
        assert!(store.list("other-board").unwrap().is_empty());

        let updated = store
            .update(
                &rule.id,
                RulePatch {
                    name: Some("Archive finished work".to_string()),
                    ..RulePatch::default()
                },
            )
            .unwrap();
        assert_eq!(updated.name, "Archive finished work");

        let toggled = store.toggle_active(&rule.id).unwrap();
        assert!(!toggled.is_active);

        store.delete(&rule.id).unwrap();
        assert!(matches!(
            store.get(&rule.id),
            Err(StoreError::RuleNotFound(_))
        ));
    }

    #[test]
    fn test_create_requires_board_context() {
        let store = MemoryRuleStore::new();
        let mut draft = create_draft("No board");
        draft.board_id = None;

        assert!(matches!(store.create(draft), Err(StoreError::Backend(_))));
    }

    #[test]
    fn test_list_is_ordered_by_creation() {
        let store = MemoryRuleStore::new();
        let first = store.create(create_draft("first")).unwrap();
        let second = store.create(create_draft("second")).unwrap();

        let ids: Vec<String> = store
            .list("b1")
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }

    #[test]
    fn test_run_logs_list_newest_first_with_limit() {
        let store = MemoryRunLogStore::new();
        for _ in 0..5 {
            store.append(create_log("r1")).unwrap();
        }
        store.append(create_log("r2")).unwrap();

        let logs = store.list_by_rule("r1", 3).unwrap();
        assert_eq!(logs.len(), 3);

        let all = store.list_by_rule("r1", 100).unwrap();
        assert_eq!(all.len(), 5);
        // newest (appended last) comes back first
        assert!(all
            .windows(2)
            .all(|w| w[0].triggered_at >= w[1].triggered_at));
    }

    #[test]
    fn test_static_templates_sorted() {
        let store = StaticTemplates::builtin();
        let templates = store.list().unwrap();
        assert!(templates.windows(2).all(|w| w[0].sort_order <= w[1].sort_order));
    }

    #[test]
    fn test_board_provider_lookup() {
        let provider = StaticBoardContext::new().with_board(BoardContext {
            id: "b1".to_string(),
            workspace_id: "w1".to_string(),
            name: "Pipeline".to_string(),
            columns: vec![],
            members: vec![TeamMember {
                id: "u1".to_string(),
                name: "Dana".to_string(),
            }],
        });

        assert_eq!(provider.board("b1").unwrap().name, "Pipeline");
        assert_eq!(provider.team_members("b1").unwrap().len(), 1);
        assert!(matches!(
            provider.board("missing"),
            Err(StoreError::BoardNotFound(_))
        ));
    }

    #[test]
    fn test_toml_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = TomlRuleStore::open(dir.path().join("rules.toml"));

        // missing file reads as empty
        assert!(store.list("b1").unwrap().is_empty());

        let rule = store.create(create_draft("Archive done")).unwrap();
        let loaded = store.get(&rule.id).unwrap();

        assert_eq!(loaded.name, rule.name);
        assert_eq!(loaded.trigger, rule.trigger);
        assert_eq!(loaded.conditions, rule.conditions);
        assert_eq!(loaded.actions, rule.actions);
    }

    #[test]
    fn test_toml_store_update_persists() {
        let dir = tempfile::tempdir().unwrap();
        let store = TomlRuleStore::open(dir.path().join("rules.toml"));
        let rule = store.create(create_draft("Archive done")).unwrap();

        store
            .update(
                &rule.id,
                RulePatch {
                    is_active: Some(false),
                    run_count: Some(3),
                    ..RulePatch::default()
                },
            )
            .unwrap();

        let reopened = TomlRuleStore::open(store.path().clone());
        let loaded = reopened.get(&rule.id).unwrap();
        assert!(!loaded.is_active);
        assert_eq!(loaded.run_count, 3);
    }

    #[test]
    fn test_toml_store_delete_unknown_rule_errors() {
        let dir = tempfile::tempdir().unwrap();
        let store = TomlRuleStore::open(dir.path().join("rules.toml"));
        assert!(matches!(
            store.delete("ghost"),
            Err(StoreError::RuleNotFound(_))
        ));
    }
}
