//! Core entity and domain action traits.

use std::collections::BTreeSet;
use std::fmt::Debug;

use common::EntityId;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, Result};

/// Trait for domain actions.
///
/// A domain action is a minimal description of one intended mutation to an
/// aggregate, queued on the entity until its repository persists it.
pub trait DomainAction: Debug + Clone + PartialEq + Serialize + Send + Sync {
    /// Returns the action type name, used in logs and metrics.
    fn action_type(&self) -> &'static str;
}

/// Ordered, append-only log of pending actions.
///
/// Only mutators of the owning entity may append, and only the repository
/// may clear it after a successful save.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionLog<A> {
    actions: Vec<A>,
}

impl<A> Default for ActionLog<A> {
    fn default() -> Self {
        Self {
            actions: Vec::new(),
        }
    }
}

impl<A> ActionLog<A> {
    pub fn as_slice(&self) -> &[A] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &A> {
        self.actions.iter()
    }

    pub(crate) fn push(&mut self, action: A) {
        self.actions.push(action);
    }

    pub(crate) fn clear(&mut self) {
        self.actions.clear();
    }
}

/// Trait for aggregates tracked through a log of domain actions.
///
/// An entity holds its current field values plus the actions produced by
/// its own mutators since it was loaded. The fields always reflect every
/// pending action applied in order.
pub trait Entity: Debug + Clone + Send + Sync {
    /// The identifier type of this aggregate.
    type Id: EntityId;

    /// The closed set of mutations this aggregate records.
    type Action: DomainAction;

    /// Returns the entity type name.
    fn entity_type() -> &'static str;

    /// Returns the entity's identifier.
    fn id(&self) -> Self::Id;

    /// Applies an action to the fields.
    ///
    /// Must not fail: actions are validated by the mutator that records them.
    fn apply(&mut self, action: &Self::Action);

    fn actions(&self) -> &ActionLog<Self::Action>;

    fn actions_mut(&mut self) -> &mut ActionLog<Self::Action>;

    /// Returns the pending actions in append order.
    fn pending_actions(&self) -> &[Self::Action] {
        self.actions().as_slice()
    }

    fn has_pending_actions(&self) -> bool {
        !self.actions().is_empty()
    }
}

/// Applies a validated action and appends it to the entity's log.
pub(crate) fn record<E: Entity>(entity: &mut E, action: E::Action) {
    entity.apply(&action);
    entity.actions_mut().push(action);
}

/// A minimal change to a many-to-many relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationDelta<I: Ord> {
    pub added: BTreeSet<I>,
    pub removed: BTreeSet<I>,
}

impl<I: Ord + Copy> RelationDelta<I> {
    pub fn new(added: impl IntoIterator<Item = I>, removed: impl IntoIterator<Item = I>) -> Self {
        Self {
            added: added.into_iter().collect(),
            removed: removed.into_iter().collect(),
        }
    }

    /// Computes the symmetric difference turning `current` into `desired`.
    pub fn between(current: &BTreeSet<I>, desired: &BTreeSet<I>) -> Self {
        Self {
            added: desired.difference(current).copied().collect(),
            removed: current.difference(desired).copied().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    pub(crate) fn apply_to(&self, set: &mut BTreeSet<I>) {
        for id in &self.removed {
            set.remove(id);
        }
        set.extend(self.added.iter().copied());
    }
}

impl<I: Ord + Copy + Debug> RelationDelta<I> {
    /// Rejects deltas that would insert a present id or delete an absent one.
    pub(crate) fn validate_against(&self, current: &BTreeSet<I>, relation: &str) -> Result<()> {
        if self.is_empty() {
            return Err(DomainError::operation_not_valid(format!(
                "{relation} change is empty"
            )));
        }
        if let Some(id) = self.added.intersection(&self.removed).next() {
            return Err(DomainError::operation_not_valid(format!(
                "{relation} {id:?} is both added and removed"
            )));
        }
        if let Some(id) = self.added.iter().find(|id| current.contains(id)) {
            return Err(DomainError::operation_not_valid(format!(
                "{relation} {id:?} is already present"
            )));
        }
        if let Some(id) = self.removed.iter().find(|id| !current.contains(id)) {
            return Err(DomainError::operation_not_valid(format!(
                "{relation} {id:?} is not present"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ids: &[u8]) -> BTreeSet<u8> {
        ids.iter().copied().collect()
    }

    #[test]
    fn between_computes_symmetric_difference() {
        let delta = RelationDelta::between(&set(&[1, 2]), &set(&[1, 3]));
        assert_eq!(delta.added, set(&[3]));
        assert_eq!(delta.removed, set(&[2]));
    }

    #[test]
    fn between_equal_sets_is_empty() {
        assert!(RelationDelta::between(&set(&[1, 2]), &set(&[2, 1])).is_empty());
    }

    #[test]
    fn apply_to_removes_then_adds() {
        let mut current = set(&[1, 2]);
        RelationDelta::new([3], [2]).apply_to(&mut current);
        assert_eq!(current, set(&[1, 3]));
    }

    #[test]
    fn validate_rejects_duplicate_add_and_absent_removal() {
        let current = set(&[1, 2]);

        assert!(RelationDelta::new([3], [2]).validate_against(&current, "genre").is_ok());
        assert!(matches!(
            RelationDelta::new([1], []).validate_against(&current, "genre"),
            Err(DomainError::OperationNotValid { .. })
        ));
        assert!(matches!(
            RelationDelta::new([], [9]).validate_against(&current, "genre"),
            Err(DomainError::OperationNotValid { .. })
        ));
        assert!(matches!(
            RelationDelta::<u8>::new([], []).validate_against(&current, "genre"),
            Err(DomainError::OperationNotValid { .. })
        ));
    }

    #[test]
    fn validate_rejects_id_in_both_sets() {
        let current = set(&[1]);
        assert!(RelationDelta::new([1], [1]).validate_against(&current, "genre").is_err());
    }
}
