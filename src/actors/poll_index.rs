use std::collections::HashMap;

use crate::game::{PollId, PollKind, SessionId};

/// Maps poll ids handed out to the chat platform back to their session
#[derive(Debug, Default)]
pub struct PollIndex {
    polls: HashMap<PollId, (SessionId, PollKind)>,
    last_id: PollId,
}

impl PollIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh poll id for a session
    pub fn register(&mut self, session: SessionId, kind: PollKind) -> PollId {
        self.last_id += 1;
        self.polls.insert(self.last_id, (session, kind));
        self.last_id
    }

    pub fn resolve(&self, poll: PollId) -> Option<(SessionId, PollKind)> {
        self.polls.get(&poll).copied()
    }

    pub fn remove(&mut self, poll: PollId) -> Option<(SessionId, PollKind)> {
        self.polls.remove(&poll)
    }

    /// Forget every poll of a session, returning how many were dropped
    pub fn remove_session(&mut self, session: SessionId) -> usize {
        let before = self.polls.len();
        self.polls.retain(|_, (owner, _)| *owner != session);
        before - self.polls.len()
    }

    pub fn len(&self) -> usize {
        self.polls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polls.is_empty()
    }
}
