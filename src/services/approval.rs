use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;

use crate::db::Store;
use crate::db::repositories::approval::DefinitionWithLevels;
use crate::db::repositories::approval_history::NewEvent;
use crate::entities::approval_histories;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalAction {
    Submit,
    Approve,
    Reject,
    Revise,
}

impl ApprovalAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Submit => "submit",
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Revise => "revise",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "submit" => Some(Self::Submit),
            "approve" => Some(Self::Approve),
            "reject" => Some(Self::Reject),
            "revise" => Some(Self::Revise),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
    Revising,
}

/// State derived from a history stream: `None` status means the stream
/// is empty and the record has never been submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StreamState {
    pub status: Option<ApprovalStatus>,
    pub current_level: i32,
}

impl StreamState {
    const EMPTY: Self = Self {
        status: None,
        current_level: 1,
    };
}

/// Replay a stream from empty. The stream is the source of truth; this
/// fold is the only definition of derived state, never cached in a
/// column.
#[must_use]
pub fn fold<I>(actions: I, max_level: i32) -> StreamState
where
    I: IntoIterator<Item = ApprovalAction>,
{
    actions
        .into_iter()
        .fold(StreamState::EMPTY, |state, action| match action {
            ApprovalAction::Submit => StreamState {
                status: Some(ApprovalStatus::Pending),
                current_level: 1,
            },
            ApprovalAction::Approve => {
                if state.current_level < max_level {
                    StreamState {
                        status: Some(ApprovalStatus::Pending),
                        current_level: state.current_level + 1,
                    }
                } else {
                    StreamState {
                        status: Some(ApprovalStatus::Approved),
                        current_level: state.current_level,
                    }
                }
            }
            ApprovalAction::Reject => StreamState {
                status: Some(ApprovalStatus::Rejected),
                current_level: state.current_level,
            },
            ApprovalAction::Revise => StreamState {
                status: Some(ApprovalStatus::Revising),
                current_level: 1,
            },
        })
}

/// Derive the same state from the last event alone. Each event records
/// the pending level at its own time, which makes the tail sufficient.
#[must_use]
pub fn state_from_last(last: Option<&approval_histories::Model>, max_level: i32) -> StreamState {
    let Some(event) = last else {
        return StreamState::EMPTY;
    };

    match ApprovalAction::parse(&event.action) {
        Some(ApprovalAction::Submit) => StreamState {
            status: Some(ApprovalStatus::Pending),
            current_level: event.level_index,
        },
        Some(ApprovalAction::Approve) => {
            if event.level_index < max_level {
                StreamState {
                    status: Some(ApprovalStatus::Pending),
                    current_level: event.level_index + 1,
                }
            } else {
                StreamState {
                    status: Some(ApprovalStatus::Approved),
                    current_level: event.level_index,
                }
            }
        }
        Some(ApprovalAction::Reject) => StreamState {
            status: Some(ApprovalStatus::Rejected),
            current_level: event.level_index,
        },
        Some(ApprovalAction::Revise) => StreamState {
            status: Some(ApprovalStatus::Revising),
            current_level: 1,
        },
        None => StreamState::EMPTY,
    }
}

#[derive(Debug, Error)]
pub enum ApprovalError {
    #[error("no approval definition is configured for this menu")]
    NotConfigured,
    #[error("approval definition is misconfigured: {0}")]
    Misconfigured(String),
    #[error("invalid approval transition: {0}")]
    InvalidTransition(String),
    #[error("approval state is stale: {0}")]
    Stale(String),
    #[error("user is not an approver for the current level")]
    NotApprover,
    #[error("only the record owner may perform this action")]
    NotOwner,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, Clone)]
pub struct TransitionRequest {
    pub ref_table: String,
    pub ref_id: i32,
    pub menu_id: i32,
    pub actor: i32,
    pub action: ApprovalAction,
    pub note: Option<String>,
}

/// A record's stream together with its derived state.
#[derive(Debug, Serialize)]
pub struct StreamView {
    pub ref_table: String,
    pub ref_id: i32,
    pub state: StreamState,
    pub max_level: i32,
    pub events: Vec<EventView>,
}

#[derive(Debug, Serialize)]
pub struct EventView {
    pub id: i32,
    pub level_index: i32,
    pub user_id: i32,
    pub action: String,
    pub note: Option<String>,
    pub created_at: String,
}

impl From<approval_histories::Model> for EventView {
    fn from(model: approval_histories::Model) -> Self {
        Self {
            id: model.id,
            level_index: model.level_index,
            user_id: model.user_id,
            action: model.action,
            note: model.note,
            created_at: model.created_at,
        }
    }
}

/// One record awaiting the polling user's action.
#[derive(Debug, Serialize)]
pub struct PendingNotification {
    pub ref_table: String,
    pub ref_id: i32,
    pub approval_id: i32,
    pub approval_name: String,
    pub level_index: i32,
    pub since: String,
}

/// Maintains the per-record state machine over approval history events.
/// Streams are append-only; every transition validates its precondition
/// against the replayed state and appends exactly one event.
pub struct ApprovalEngine {
    store: Store,
}

impl ApprovalEngine {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn transition(
        &self,
        req: TransitionRequest,
    ) -> Result<approval_histories::Model, ApprovalError> {
        let def = self
            .store
            .approvals()
            .get_by_menu(req.menu_id)
            .await?
            .ok_or(ApprovalError::NotConfigured)?;

        let max_level = i32::try_from(def.levels.len()).unwrap_or(i32::MAX);
        if max_level == 0 {
            return Err(ApprovalError::Misconfigured(
                "definition has no levels".to_string(),
            ));
        }

        let events = self
            .store
            .approval_history()
            .stream(&req.ref_table, req.ref_id)
            .await?;
        let state = fold(
            events
                .iter()
                .filter_map(|e| ApprovalAction::parse(&e.action)),
            max_level,
        );
        let owner = events
            .iter()
            .find(|e| e.action == ApprovalAction::Submit.as_str())
            .map(|e| e.user_id);

        let level_index = match req.action {
            ApprovalAction::Submit => {
                self.check_submit(&def, state, owner, req.actor)?;
                1
            }
            ApprovalAction::Approve | ApprovalAction::Reject => {
                self.check_review(&def, state, req.actor)?;
                state.current_level
            }
            ApprovalAction::Revise => {
                self.check_revise(state, owner, req.actor)?;
                state.current_level
            }
        };

        let event = self
            .store
            .approval_history()
            .append(NewEvent {
                ref_table: req.ref_table,
                ref_id: req.ref_id,
                approval_id: def.definition.id,
                level_index,
                user_id: req.actor,
                action: req.action.as_str().to_string(),
                note: req.note,
            })
            .await?;

        Ok(event)
    }

    fn check_submit(
        &self,
        def: &DefinitionWithLevels,
        state: StreamState,
        owner: Option<i32>,
        actor: i32,
    ) -> Result<(), ApprovalError> {
        match state.status {
            None | Some(ApprovalStatus::Revising) => {}
            Some(_) => {
                return Err(ApprovalError::InvalidTransition(
                    "record is already under approval".to_string(),
                ));
            }
        }

        if let Some(owner) = owner
            && owner != actor
        {
            return Err(ApprovalError::NotOwner);
        }

        if let Some(level) = def.levels.iter().find(|l| l.user_ids.is_empty()) {
            return Err(ApprovalError::Misconfigured(format!(
                "level {} has no users",
                level.level.level_index
            )));
        }

        Ok(())
    }

    fn check_review(
        &self,
        def: &DefinitionWithLevels,
        state: StreamState,
        actor: i32,
    ) -> Result<(), ApprovalError> {
        match state.status {
            Some(ApprovalStatus::Pending) => {}
            Some(ApprovalStatus::Approved | ApprovalStatus::Rejected) => {
                return Err(ApprovalError::Stale(
                    "record is no longer pending".to_string(),
                ));
            }
            Some(ApprovalStatus::Revising) | None => {
                return Err(ApprovalError::InvalidTransition(
                    "record is not submitted".to_string(),
                ));
            }
        }

        let current = usize::try_from(state.current_level).unwrap_or(usize::MAX);
        let level = def
            .levels
            .get(current - 1)
            .ok_or_else(|| ApprovalError::Misconfigured("current level is missing".to_string()))?;
        if level.user_ids.is_empty() {
            return Err(ApprovalError::Misconfigured(format!(
                "level {} has no users",
                level.level.level_index
            )));
        }

        if !level.user_ids.contains(&actor) {
            // An approver of the level that just advanced lost a race, not
            // a permission; report that distinctly.
            let was_previous_approver = current >= 2
                && def.levels[current - 2].user_ids.contains(&actor);
            if was_previous_approver {
                return Err(ApprovalError::Stale(
                    "level has already advanced".to_string(),
                ));
            }
            return Err(ApprovalError::NotApprover);
        }

        Ok(())
    }

    fn check_revise(
        &self,
        state: StreamState,
        owner: Option<i32>,
        actor: i32,
    ) -> Result<(), ApprovalError> {
        if state.status != Some(ApprovalStatus::Rejected) {
            return Err(ApprovalError::InvalidTransition(
                "only a rejected record can be revised".to_string(),
            ));
        }

        if owner != Some(actor) {
            return Err(ApprovalError::NotOwner);
        }

        Ok(())
    }

    /// The stream plus its derived state. An empty stream is a valid
    /// view: never submitted, level 1.
    pub async fn view(&self, ref_table: &str, ref_id: i32) -> Result<StreamView, ApprovalError> {
        let events = self.store.approval_history().stream(ref_table, ref_id).await?;

        let max_level = match events.first() {
            Some(first) => {
                let def = self
                    .store
                    .approvals()
                    .get_with_levels(first.approval_id)
                    .await?
                    .ok_or(ApprovalError::NotConfigured)?;
                i32::try_from(def.levels.len()).unwrap_or(i32::MAX)
            }
            None => 1,
        };

        let state = fold(
            events
                .iter()
                .filter_map(|e| ApprovalAction::parse(&e.action)),
            max_level,
        );

        Ok(StreamView {
            ref_table: ref_table.to_string(),
            ref_id,
            state,
            max_level,
            events: events.into_iter().map(EventView::from).collect(),
        })
    }

    /// Every record whose derived status is pending and whose current
    /// level's user set contains the polling user. Read-only and
    /// idempotent.
    pub async fn notifications(
        &self,
        user_id: i32,
    ) -> Result<Vec<PendingNotification>, ApprovalError> {
        let latest = self.store.approval_history().latest_events().await?;

        let mut defs: HashMap<i32, DefinitionWithLevels> = HashMap::new();
        let mut out = Vec::new();

        for event in latest {
            let def = match defs.entry(event.approval_id) {
                std::collections::hash_map::Entry::Occupied(e) => e.into_mut(),
                std::collections::hash_map::Entry::Vacant(e) => {
                    let Some(def) = self
                        .store
                        .approvals()
                        .get_with_levels(event.approval_id)
                        .await?
                    else {
                        continue;
                    };
                    e.insert(def)
                }
            };

            let max_level = i32::try_from(def.levels.len()).unwrap_or(i32::MAX);
            let state = state_from_last(Some(&event), max_level);

            if state.status != Some(ApprovalStatus::Pending) {
                continue;
            }

            let current = usize::try_from(state.current_level).unwrap_or(usize::MAX);
            let Some(level) = def.levels.get(current - 1) else {
                continue;
            };
            if !level.user_ids.contains(&user_id) {
                continue;
            }

            out.push(PendingNotification {
                ref_table: event.ref_table,
                ref_id: event.ref_id,
                approval_id: def.definition.id,
                approval_name: def.definition.name.clone(),
                level_index: state.current_level,
                since: event.created_at,
            });
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use ApprovalAction::{Approve, Reject, Revise, Submit};

    fn event(id: i32, action: ApprovalAction, level: i32) -> approval_histories::Model {
        approval_histories::Model {
            id,
            ref_table: "mst_foo".to_string(),
            ref_id: 42,
            approval_id: 1,
            level_index: level,
            user_id: 1,
            action: action.as_str().to_string(),
            note: None,
            created_at: String::new(),
        }
    }

    #[test]
    fn empty_stream_is_unsubmitted_at_level_one() {
        assert_eq!(
            fold([], 2),
            StreamState {
                status: None,
                current_level: 1
            }
        );
    }

    #[test]
    fn happy_path_walks_the_chain() {
        assert_eq!(
            fold([Submit, Approve], 2),
            StreamState {
                status: Some(ApprovalStatus::Pending),
                current_level: 2
            }
        );
        assert_eq!(
            fold([Submit, Approve, Approve], 2),
            StreamState {
                status: Some(ApprovalStatus::Approved),
                current_level: 2
            }
        );
    }

    #[test]
    fn reject_then_revise_resets_the_chain() {
        assert_eq!(
            fold([Submit, Reject], 2),
            StreamState {
                status: Some(ApprovalStatus::Rejected),
                current_level: 1
            }
        );
        assert_eq!(
            fold([Submit, Reject, Revise], 2),
            StreamState {
                status: Some(ApprovalStatus::Revising),
                current_level: 1
            }
        );
        assert_eq!(
            fold([Submit, Reject, Revise, Submit], 2),
            StreamState {
                status: Some(ApprovalStatus::Pending),
                current_level: 1
            }
        );
    }

    #[test]
    fn single_level_definition_approves_immediately() {
        assert_eq!(
            fold([Submit, Approve], 1),
            StreamState {
                status: Some(ApprovalStatus::Approved),
                current_level: 1
            }
        );
    }

    #[test]
    fn replay_equals_last_event_derivation() {
        let sequences: Vec<Vec<(ApprovalAction, i32)>> = vec![
            vec![(Submit, 1)],
            vec![(Submit, 1), (Approve, 1)],
            vec![(Submit, 1), (Approve, 1), (Approve, 2)],
            vec![(Submit, 1), (Reject, 1)],
            vec![(Submit, 1), (Approve, 1), (Reject, 2)],
            vec![(Submit, 1), (Reject, 1), (Revise, 1)],
            vec![(Submit, 1), (Reject, 1), (Revise, 1), (Submit, 1)],
        ];

        for seq in sequences {
            let events: Vec<approval_histories::Model> = seq
                .iter()
                .enumerate()
                .map(|(i, (action, level))| event(i as i32 + 1, *action, *level))
                .collect();

            let replayed = fold(seq.iter().map(|(a, _)| *a), 2);
            let derived = state_from_last(events.last(), 2);
            assert_eq!(replayed, derived, "sequence {seq:?}");
        }
    }
}
