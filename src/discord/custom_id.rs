use crate::game::PollId;

/// What a button press asks for, encoded in the component's custom id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentAction {
    /// `poll:<id>:<option>`
    PollAnswer { poll: PollId, option: usize },
    /// Close the lobby and show the settings menu
    Continue,
    ChooseImpostors(usize),
    /// Final settings choice; starts the game
    ChooseRounds { impostors: usize, rounds: u32 },
    StartVoting,
    EndVoting,
}

impl ComponentAction {
    pub fn custom_id(&self) -> String {
        match self {
            ComponentAction::PollAnswer { poll, option } => format!("poll:{}:{}", poll, option),
            ComponentAction::Continue => "continue".to_string(),
            ComponentAction::ChooseImpostors(count) => format!("impostors:{}", count),
            ComponentAction::ChooseRounds { impostors, rounds } => {
                format!("rounds:{}:{}", impostors, rounds)
            }
            ComponentAction::StartVoting => "start_voting".to_string(),
            ComponentAction::EndVoting => "end_voting".to_string(),
        }
    }

    pub fn parse(custom_id: &str) -> Option<Self> {
        let mut parts = custom_id.split(':');
        let action = match (parts.next()?, parts.next(), parts.next()) {
            ("poll", Some(poll), Some(option)) => ComponentAction::PollAnswer {
                poll: poll.parse().ok()?,
                option: option.parse().ok()?,
            },
            ("continue", None, None) => ComponentAction::Continue,
            ("impostors", Some(count), None) => ComponentAction::ChooseImpostors(count.parse().ok()?),
            ("rounds", Some(impostors), Some(rounds)) => ComponentAction::ChooseRounds {
                impostors: impostors.parse().ok()?,
                rounds: rounds.parse().ok()?,
            },
            ("start_voting", None, None) => ComponentAction::StartVoting,
            ("end_voting", None, None) => ComponentAction::EndVoting,
            _ => return None,
        };

        if parts.next().is_some() {
            return None;
        }
        Some(action)
    }

    /// Everything except answering a poll needs manage-server rights
    pub fn admin_only(&self) -> bool {
        !matches!(self, ComponentAction::PollAnswer { .. })
    }
}
