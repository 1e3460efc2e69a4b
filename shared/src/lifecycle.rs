//! Status transition tables
//!
//! Each document status enum lists its legal moves as a `(from, action, to)`
//! table. [`transition`] is the single place where a status changes; every
//! pair missing from a table is rejected with `InvalidState`.

use std::fmt;

use uuid::Uuid;

use crate::error::{WorkflowError, WorkflowResult};
use crate::types::EntityKind;

/// A closed set of statuses with an explicit transition table
pub trait Lifecycle: Copy + Eq + fmt::Display + 'static {
    type Action: Copy + Eq + fmt::Display + 'static;

    const ENTITY: EntityKind;
    const TABLE: &'static [(Self, Self::Action, Self)];

    fn next(self, action: Self::Action) -> Option<Self> {
        Self::TABLE
            .iter()
            .find(|(from, a, _)| *from == self && *a == action)
            .map(|(_, _, to)| *to)
    }

    fn allows(self, action: Self::Action) -> bool {
        self.next(action).is_some()
    }
}

/// Apply `action` to an entity currently in `from`
pub fn transition<S: Lifecycle>(id: Uuid, from: S, action: S::Action) -> WorkflowResult<S> {
    from.next(action).ok_or_else(|| WorkflowError::InvalidState {
        entity: S::ENTITY,
        id,
        current: from.to_string(),
        action: action.to_string(),
    })
}
