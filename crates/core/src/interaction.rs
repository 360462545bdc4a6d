//! Interaction guard.
//!
//! A background refresh must never overwrite data the user is editing.
//! [`InteractionState`] collects every flag that means "the user is busy"
//! and [`InteractionState::is_user_interacting`] folds them into one
//! decision.

use crate::types::EntityId;

/// The entity an edit form or delete confirmation refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityRef {
    Task(EntityId),
    Subtask(EntityId),
}

impl EntityRef {
    pub fn id(&self) -> &str {
        match self {
            EntityRef::Task(id) | EntityRef::Subtask(id) => id,
        }
    }
}

/// UI flags consulted by the fetch gate and the realtime handler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InteractionState {
    /// A create form (task or subtask) is open.
    pub create_form_open: bool,
    /// An edit form is open for this entity.
    pub edit_target: Option<EntityRef>,
    /// A delete confirmation is waiting for this entity.
    pub pending_delete: Option<EntityRef>,
    /// A mutation request has been sent and not yet settled.
    pub mutation_in_flight: bool,
}

impl InteractionState {
    /// Pure predicate: true if any form, confirmation, or mutation is open.
    pub fn is_user_interacting(&self) -> bool {
        self.create_form_open
            || self.edit_target.is_some()
            || self.pending_delete.is_some()
            || self.mutation_in_flight
    }

    /// Close every form and confirmation. The in-flight flag is owned by
    /// the mutation and left alone.
    pub fn close_forms(&mut self) {
        self.create_form_open = false;
        self.edit_target = None;
        self.pending_delete = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_state_is_not_interacting() {
        assert!(!InteractionState::default().is_user_interacting());
    }

    #[test]
    fn each_flag_alone_counts_as_interacting() {
        let cases = [
            InteractionState {
                create_form_open: true,
                ..Default::default()
            },
            InteractionState {
                edit_target: Some(EntityRef::Subtask("s1".into())),
                ..Default::default()
            },
            InteractionState {
                pending_delete: Some(EntityRef::Task("t1".into())),
                ..Default::default()
            },
            InteractionState {
                mutation_in_flight: true,
                ..Default::default()
            },
        ];
        for state in cases {
            assert!(state.is_user_interacting(), "{state:?}");
        }
    }

    #[test]
    fn close_forms_keeps_in_flight_flag() {
        let mut state = InteractionState {
            create_form_open: true,
            edit_target: Some(EntityRef::Task("t1".into())),
            pending_delete: Some(EntityRef::Subtask("s1".into())),
            mutation_in_flight: true,
        };
        state.close_forms();
        assert!(state.mutation_in_flight);
        assert!(state.is_user_interacting());
        state.mutation_in_flight = false;
        assert!(!state.is_user_interacting());
    }
}
