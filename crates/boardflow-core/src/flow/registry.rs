//! Trigger and action registries.
//!
//! Registries are built once at startup (normally via `builtin()`) and
//! passed by reference into the executor and editor. There is no global
//! registration step; hosts that ship custom handlers register them
//! before wiring anything else, then treat the registry as read-only.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::flow::action::{builtin_action_handlers, ActionCategory, ActionHandler, ActionType};
use crate::flow::trigger::{builtin_trigger_handlers, TriggerHandler, TriggerType};

/// Catalog of trigger handlers keyed by type
pub struct TriggerRegistry {
    handlers: HashMap<TriggerType, Arc<dyn TriggerHandler>>,
    order: Vec<TriggerType>,
}

impl TriggerRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Registry with every built-in trigger handler
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for handler in builtin_trigger_handlers() {
            registry.register(handler);
        }
        registry
    }

    /// Add a handler, replacing any existing one of the same type
    pub fn register(&mut self, handler: Arc<dyn TriggerHandler>) {
        let trigger_type = handler.trigger_type();
        if self.handlers.insert(trigger_type, handler).is_none() {
            self.order.push(trigger_type);
        }
        debug!(trigger_type = %trigger_type, "registered trigger handler");
    }

    pub fn get(&self, trigger_type: TriggerType) -> Option<Arc<dyn TriggerHandler>> {
        self.handlers.get(&trigger_type).cloned()
    }

    /// All handlers in registration order, for the trigger picker
    pub fn all(&self) -> Vec<Arc<dyn TriggerHandler>> {
        self.order
            .iter()
            .filter_map(|t| self.handlers.get(t).cloned())
            .collect()
    }
}

impl Default for TriggerRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Catalog of action handlers keyed by type
pub struct ActionRegistry {
    handlers: HashMap<ActionType, Arc<dyn ActionHandler>>,
    order: Vec<ActionType>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Registry with every built-in action handler
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for handler in builtin_action_handlers() {
            registry.register(handler);
        }
        registry
    }

    /// Add a handler, replacing any existing one of the same type
    pub fn register(&mut self, handler: Arc<dyn ActionHandler>) {
        let action_type = handler.action_type();
        if self.handlers.insert(action_type, handler).is_none() {
            self.order.push(action_type);
        }
        debug!(action_type = %action_type, "registered action handler");
    }

    pub fn get(&self, action_type: ActionType) -> Option<Arc<dyn ActionHandler>> {
        self.handlers.get(&action_type).cloned()
    }

    /// All handlers in registration order, for the action picker
    pub fn all(&self) -> Vec<Arc<dyn ActionHandler>> {
        self.order
            .iter()
            .filter_map(|t| self.handlers.get(t).cloned())
            .collect()
    }

    /// Handlers grouped by category.
    ///
    /// Categories come out in declaration order and handlers keep their
    /// registration order within each group; empty categories are
    /// omitted. Pure function of registered state, shared by the picker
    /// UI and validation.
    pub fn by_category(&self) -> Vec<(ActionCategory, Vec<Arc<dyn ActionHandler>>)> {
        ActionCategory::ALL
            .iter()
            .filter_map(|category| {
                let group: Vec<_> = self
                    .order
                    .iter()
                    .filter_map(|t| self.handlers.get(t))
                    .filter(|h| h.category() == *category)
                    .cloned()
                    .collect();
                if group.is_empty() {
                    None
                } else {
                    Some((*category, group))
                }
            })
            .collect()
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::BoardContext;
    use crate::event::EventContext;
    use crate::flow::schema::ConfigSchema;
    use crate::flow::trigger::FlowTrigger;

    #[test]
    fn test_builtin_registries_are_fully_populated() {
        let triggers = TriggerRegistry::builtin();
        let actions = ActionRegistry::builtin();

        assert_eq!(triggers.all().len(), 6);
        assert_eq!(actions.all().len(), 12);
        assert!(triggers.get(TriggerType::CardMoved).is_some());
        assert!(actions.get(ActionType::NotifyUser).is_some());
    }

    #[test]
    fn test_empty_registry_resolves_nothing() {
        let triggers = TriggerRegistry::new();
        assert!(triggers.get(TriggerType::CardMoved).is_none());
        assert!(triggers.all().is_empty());
    }

    #[test]
    fn test_all_preserves_registration_order() {
        let registry = TriggerRegistry::builtin();
        let order: Vec<TriggerType> = registry.all().iter().map(|h| h.trigger_type()).collect();
        assert_eq!(order[0], TriggerType::CardCreated);
        assert_eq!(order[1], TriggerType::CardMoved);
        assert_eq!(*order.last().unwrap(), TriggerType::DueDateApproaching);
    }

    #[test]
    fn test_by_category_groups_in_declaration_order() {
        let registry = ActionRegistry::builtin();
        let grouped = registry.by_category();

        let categories: Vec<ActionCategory> = grouped.iter().map(|(c, _)| *c).collect();
        assert_eq!(
            categories,
            vec![
                ActionCategory::Card,
                ActionCategory::Subtask,
                ActionCategory::Notification,
                ActionCategory::Team,
                ActionCategory::Contracts,
                ActionCategory::Invoices,
                ActionCategory::Ai,
                ActionCategory::Integration,
                ActionCategory::Reporting,
            ]
        );

        let card_group = &grouped[0].1;
        assert_eq!(card_group.len(), 4);
        assert_eq!(card_group[0].action_type(), ActionType::MoveCard);
        assert_eq!(card_group[3].action_type(), ActionType::ArchiveCard);
    }

    struct LoudCardCreated;

    impl crate::flow::trigger::TriggerHandler for LoudCardCreated {
        fn trigger_type(&self) -> TriggerType {
            TriggerType::CardCreated
        }

        fn label(&self) -> &'static str {
            "CARD CREATED"
        }

        fn config_schema(&self) -> ConfigSchema {
            ConfigSchema::new()
        }

        fn summarize(&self, _trigger: &FlowTrigger, _board: &BoardContext) -> String {
            self.label().to_string()
        }

        fn matches(&self, _trigger: &FlowTrigger, _event: &EventContext) -> bool {
            true
        }
    }

    #[test]
    fn test_reregistering_replaces_without_duplicating() {
        let mut registry = TriggerRegistry::builtin();
        registry.register(Arc::new(LoudCardCreated));

        assert_eq!(registry.all().len(), 6);
        let handler = registry.get(TriggerType::CardCreated).unwrap();
        assert_eq!(handler.label(), "CARD CREATED");
        // replacement keeps the original picker position
        assert_eq!(registry.all()[0].trigger_type(), TriggerType::CardCreated);
    }
}
