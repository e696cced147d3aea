//! Chat text and button layouts for intents. Kept free of Discord types so
//! the wording can be tested without a gateway.

use tracing::warn;

use crate::discord::custom_id::ComponentAction;
use crate::game::{
    CancelReason, Clue, GameOverReason, GameSummary, Intent, PlayerRef, PollId, PollKind,
    RolePayload, RoundOutcome, StatusSnapshot, Team, Verdict, VoteResolution, MAX_ROUNDS,
    MIN_PLAYERS, MIN_ROUNDS,
};

/// Discord allows five buttons per row and five rows per message
const BUTTONS_PER_ROW: usize = 5;
const MAX_ROWS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonTone {
    Primary,
    Secondary,
    Success,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub action: ComponentAction,
    pub label: String,
    pub tone: ButtonTone,
}

impl Button {
    fn new(action: ComponentAction, label: impl Into<String>, tone: ButtonTone) -> Self {
        Self {
            action,
            label: label.into(),
            tone,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub content: String,
    pub rows: Vec<Vec<Button>>,
}

impl Rendered {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            rows: Vec::new(),
        }
    }
}

/// Render an intent as a channel message. Intents the dispatcher handles
/// on its own (closing polls, role delivery) give `None`.
pub fn render(intent: &Intent, poll_id: Option<PollId>) -> Option<Rendered> {
    let rendered = match intent {
        Intent::ShowRoster { players } => Rendered::text(roster(players)),
        Intent::OpenPoll {
            kind: PollKind::Join,
            options,
        } => join_poll(options, poll_id),
        Intent::OpenPoll {
            kind: PollKind::Vote,
            options,
        } => vote_poll(options, poll_id),
        Intent::ClosePoll { .. } | Intent::SendRoles { .. } => return None,
        Intent::OpenConfigMenu {
            players,
            impostor_choices,
            round_choices,
        } => config_menu(players.len(), impostor_choices, round_choices),
        Intent::AnnounceGameStart {
            players,
            impostors,
            max_rounds,
        } => Rendered::text(format!(
            "🎮 The game begins! {} players, {} impostor(s), {} rounds.\n\
             Check your direct messages to learn your role.",
            players, impostors, max_rounds
        )),
        Intent::ReportRoleDelivery {
            delivered,
            total,
            failed,
        } => Rendered::text(if failed.is_empty() {
            format!("📬 Roles delivered to all {} players.", total)
        } else {
            format!(
                "📬 Roles delivered to {}/{} players. Could not reach: {}.\n\
                 They need to allow direct messages from server members.",
                delivered,
                total,
                failed.join(", ")
            )
        }),
        Intent::AnnounceRound {
            round,
            max_rounds,
            player,
        } => Rendered::text(format!(
            "🔔 **Round {}/{}**\n{} goes first. Give a clue about the secret word without saying it!",
            round,
            max_rounds,
            mention(player)
        )),
        Intent::AnnounceTurn { player } => {
            Rendered::text(format!("➡️ {}, it's your turn.", mention(player)))
        }
        Intent::RoundSummary { round, clues } => Rendered::text(round_summary(*round, clues)),
        Intent::StartDiscussion { round } => Rendered {
            content: format!(
                "💬 Round {} is over. Discuss who the impostor might be!\n\
                 Voting opens when an admin presses the button or time runs out.",
                round
            ),
            rows: vec![vec![Button::new(
                ComponentAction::StartVoting,
                "Start voting",
                ButtonTone::Primary,
            )]],
        },
        Intent::AnnounceVoteResult(resolution) => Rendered::text(vote_result(resolution)),
        Intent::AnnounceGameOver(summary) => Rendered::text(game_over(summary)),
        Intent::AnnounceCancelled { reason, joined } => Rendered::text(match reason {
            CancelReason::Requested => "🛑 The game was cancelled.".to_string(),
            CancelReason::NotEnoughPlayers => format!(
                "🛑 Only {} player(s) joined, at least {} are needed. The game was cancelled.",
                joined, MIN_PLAYERS
            ),
        }),
    };
    Some(rendered)
}

/// Private message telling a player their role
pub fn role_message(payload: &RolePayload) -> String {
    match payload {
        RolePayload::Citizen { secret_word } => format!(
            "🧑 You are a **citizen**. The secret word is **{}**.\n\
             Give clues that show you know it, but never say it!",
            secret_word
        ),
        RolePayload::Impostor => "🕵️ You are an **impostor**. You don't know the secret word.\n\
             Listen to the clues, blend in and avoid being voted out!"
            .to_string(),
    }
}

/// Second settings step, shown after the impostor count was picked
pub fn round_menu(impostors: usize) -> Rendered {
    let buttons = (MIN_ROUNDS..=MAX_ROUNDS)
        .map(|rounds| {
            Button::new(
                ComponentAction::ChooseRounds { impostors, rounds },
                format!("{} rounds", rounds),
                ButtonTone::Primary,
            )
        })
        .collect();

    Rendered {
        content: format!(
            "{} impostor(s) it is. How many rounds should be played?",
            impostors
        ),
        rows: chunk_rows(buttons, MAX_ROWS),
    }
}

pub fn status(snapshot: &StatusSnapshot) -> String {
    let mut lines = vec![format!("📊 **Game status:** {}", snapshot.phase)];

    match snapshot.max_rounds {
        Some(max_rounds) if snapshot.round > 0 => {
            lines.push(format!("Round: {}/{}", snapshot.round, max_rounds))
        }
        _ => {}
    }
    lines.push(format!(
        "Players ({}): {}",
        snapshot.active_players.len(),
        list_or_none(&snapshot.active_players)
    ));
    if !snapshot.eliminated.is_empty() {
        lines.push(format!("Eliminated: {}", snapshot.eliminated.join(", ")));
    }
    if let Some(current) = &snapshot.current_player {
        lines.push(format!("Current turn: {}", current));
    }
    if !snapshot.clues.is_empty() {
        lines.push("Clues this round:".to_string());
        lines.extend(snapshot.clues.iter().map(clue_line));
    }
    if !snapshot.delivery_failures.is_empty() {
        lines.push(format!(
            "⚠️ Role message not delivered to: {}",
            snapshot.delivery_failures.join(", ")
        ));
    }

    lines.join("\n")
}

fn mention(player: &PlayerRef) -> String {
    format!("<@{}>", player.id)
}

fn list_or_none(names: &[String]) -> String {
    if names.is_empty() {
        "none".to_string()
    } else {
        names.join(", ")
    }
}

fn clue_line(clue: &Clue) -> String {
    format!("• **{}**: {}", clue.display_name, clue.text)
}

fn roster(players: &[String]) -> String {
    if players.is_empty() {
        return "👥 Nobody has joined yet.".to_string();
    }

    let mut lines = vec![format!("👥 **Players ({}):**", players.len())];
    lines.extend(
        players
            .iter()
            .enumerate()
            .map(|(i, name)| format!("{}. {}", i + 1, name)),
    );
    lines.join("\n")
}

fn chunk_rows(buttons: Vec<Button>, max_rows: usize) -> Vec<Vec<Button>> {
    buttons
        .chunks(BUTTONS_PER_ROW)
        .take(max_rows)
        .map(<[Button]>::to_vec)
        .collect()
}

fn poll_buttons(options: &[String], poll: PollId, tone: ButtonTone) -> Vec<Button> {
    options
        .iter()
        .enumerate()
        .map(|(option, label)| {
            Button::new(ComponentAction::PollAnswer { poll, option }, label, tone)
        })
        .collect()
}

fn join_poll(options: &[String], poll_id: Option<PollId>) -> Rendered {
    let content = format!(
        "🕵️ **A new game of Impostor is starting!**\n\
         Do you want to play? An admin can continue once at least {} players joined.",
        MIN_PLAYERS
    );
    let Some(poll) = poll_id else {
        return Rendered::text(content);
    };

    let mut answers = poll_buttons(options, poll, ButtonTone::Secondary);
    if let Some(first) = answers.first_mut() {
        first.tone = ButtonTone::Success;
    }

    let mut rows = chunk_rows(answers, MAX_ROWS - 1);
    rows.push(vec![Button::new(
        ComponentAction::Continue,
        "Continue",
        ButtonTone::Primary,
    )]);
    Rendered { content, rows }
}

fn vote_poll(options: &[String], poll_id: Option<PollId>) -> Rendered {
    let content = "🗳️ **Who is the impostor?** Vote for one player. Only your last vote counts.";
    let Some(poll) = poll_id else {
        return Rendered::text(content);
    };

    let room = (MAX_ROWS - 1) * BUTTONS_PER_ROW;
    if options.len() > room {
        warn!(
            "Vote poll {} has {} candidates, only the first {} get a button",
            poll,
            options.len(),
            room
        );
    }

    let mut rows = chunk_rows(
        poll_buttons(options, poll, ButtonTone::Secondary),
        MAX_ROWS - 1,
    );
    rows.push(vec![Button::new(
        ComponentAction::EndVoting,
        "End voting",
        ButtonTone::Danger,
    )]);
    Rendered {
        content: content.to_string(),
        rows,
    }
}

fn config_menu(players: usize, impostor_choices: &[usize], round_choices: &[u32]) -> Rendered {
    let buttons = impostor_choices
        .iter()
        .map(|&count| {
            Button::new(
                ComponentAction::ChooseImpostors(count),
                format!("{} impostor(s)", count),
                ButtonTone::Primary,
            )
        })
        .collect();

    let rounds = match (round_choices.first(), round_choices.last()) {
        (Some(min), Some(max)) => format!(", then between {} and {} rounds", min, max),
        _ => String::new(),
    };

    Rendered {
        content: format!(
            "⚙️ {} players are in. Admin: choose the number of impostors{}.",
            players, rounds
        ),
        rows: chunk_rows(buttons, MAX_ROWS),
    }
}

fn round_summary(round: u32, clues: &[Clue]) -> String {
    if clues.is_empty() {
        return format!("📝 Round {} ended without any clues.", round);
    }

    let mut lines = vec![format!("📝 **Clues of round {}:**", round)];
    lines.extend(clues.iter().map(clue_line));
    lines.join("\n")
}

fn vote_result(resolution: &VoteResolution) -> String {
    let mut text = match &resolution.verdict {
        Verdict::NoVotes => "🤷 Nobody voted, so nobody is eliminated.".to_string(),
        Verdict::Tie { indices } => {
            let names: Vec<&str> = indices
                .iter()
                .filter_map(|i| resolution.candidates.get(*i))
                .map(String::as_str)
                .collect();
            format!(
                "⚖️ It's a tie between {}. Nobody is eliminated.",
                names.join(" and ")
            )
        }
        Verdict::Elected { index } => {
            let votes = resolution.vote_counts.get(index).copied().unwrap_or(0);
            let name = resolution.eliminated_name.as_deref().unwrap_or("Someone");
            let role = if resolution.was_impostor == Some(true) {
                "an impostor"
            } else {
                "a citizen"
            };
            format!(
                "☠️ **{}** was voted out with {} vote(s). They were {}!",
                name, votes, role
            )
        }
    };

    if resolution.outcome == RoundOutcome::Continue
        && resolution.was_impostor == Some(true)
        && resolution.impostors_left > 0
    {
        text.push_str(&format!(
            "\n{} impostor(s) still hiding.",
            resolution.impostors_left
        ));
    }
    text
}

fn game_over(summary: &GameSummary) -> String {
    let headline = match (summary.outcome.winner, summary.outcome.reason) {
        (Team::Citizens, _) => "🎉 **The citizens win!** Every impostor was caught.".to_string(),
        (Team::Impostors, GameOverReason::SecretWordLeaked { .. }) => format!(
            "😈 **The impostors win!** {} said the secret word.",
            summary.leaker.as_deref().unwrap_or("Someone")
        ),
        (Team::Impostors, GameOverReason::NoActivePlayers) => {
            "😈 **The impostors win!** Nobody is left to give clues.".to_string()
        }
        (Team::Impostors, _) => {
            "😈 **The impostors win!** They survived every round.".to_string()
        }
    };

    let mut lines = vec![
        headline,
        format!("The secret word was **{}**.", summary.secret_word),
        format!("Impostors: {}", list_or_none(&summary.impostors)),
        format!("Citizens: {}", list_or_none(&summary.citizens)),
    ];
    if !summary.eliminated.is_empty() {
        lines.push(format!("Eliminated: {}", summary.eliminated.join(", ")));
    }
    lines.push(format!("Rounds played: {}", summary.rounds_played));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{GameOutcome, Phase};
    use std::collections::BTreeMap;

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn custom_ids(rendered: &Rendered) -> Vec<Vec<String>> {
        rendered
            .rows
            .iter()
            .map(|row| row.iter().map(|b| b.action.custom_id()).collect())
            .collect()
    }

    #[test]
    fn test_join_poll_buttons() {
        let intent = Intent::OpenPoll {
            kind: PollKind::Join,
            options: names(&["Yes, I want to play", "No"]),
        };

        let rendered = render(&intent, Some(4)).unwrap();
        assert_eq!(
            custom_ids(&rendered),
            vec![
                vec!["poll:4:0".to_string(), "poll:4:1".to_string()],
                vec!["continue".to_string()],
            ]
        );
        assert_eq!(rendered.rows[0][0].tone, ButtonTone::Success);
        assert_eq!(rendered.rows[0][0].label, "Yes, I want to play");

        // Without a poll id there is nothing to press
        assert!(render(&intent, None).unwrap().rows.is_empty());
    }

    #[test]
    fn test_vote_poll_rows() {
        let intent = Intent::OpenPoll {
            kind: PollKind::Vote,
            options: names(&["A", "B", "C", "D", "E", "F", "G"]),
        };

        let rendered = render(&intent, Some(9)).unwrap();
        let sizes: Vec<usize> = rendered.rows.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![5, 2, 1]);
        assert_eq!(rendered.rows[1][1].action.custom_id(), "poll:9:6");
        assert_eq!(rendered.rows[2][0].action, ComponentAction::EndVoting);
    }

    #[test]
    fn test_vote_poll_keeps_button_limit() {
        let candidates: Vec<String> = (1..=23).map(|i| format!("P{}", i)).collect();
        let intent = Intent::OpenPoll {
            kind: PollKind::Vote,
            options: candidates,
        };

        let rendered = render(&intent, Some(2)).unwrap();
        assert_eq!(rendered.rows.len(), MAX_ROWS);
        let answers: Vec<&Button> = rendered.rows[..MAX_ROWS - 1].iter().flatten().collect();
        assert_eq!(answers.len(), 20);
        assert_eq!(answers[19].action.custom_id(), "poll:2:19");
        assert_eq!(rendered.rows[MAX_ROWS - 1][0].action, ComponentAction::EndVoting);
    }

    #[test]
    fn test_silent_intents() {
        assert!(render(
            &Intent::ClosePoll {
                kind: PollKind::Vote
            },
            Some(1)
        )
        .is_none());
        assert!(render(&Intent::SendRoles { deliveries: vec![] }, None).is_none());
    }

    #[test]
    fn test_config_and_round_menus() {
        let menu = render(
            &Intent::OpenConfigMenu {
                players: names(&["A", "B", "C", "D", "E", "F"]),
                impostor_choices: vec![1, 2],
                round_choices: vec![2, 3, 4, 5],
            },
            None,
        )
        .unwrap();
        assert!(menu.content.contains("6 players"));
        assert!(menu.content.contains("between 2 and 5 rounds"));
        assert_eq!(
            custom_ids(&menu),
            vec![vec!["impostors:1".to_string(), "impostors:2".to_string()]]
        );

        let rounds = round_menu(2);
        assert_eq!(
            custom_ids(&rounds),
            vec![vec![
                "rounds:2:2".to_string(),
                "rounds:2:3".to_string(),
                "rounds:2:4".to_string(),
                "rounds:2:5".to_string(),
            ]]
        );
    }

    #[test]
    fn test_turn_mentions_player() {
        let rendered = render(
            &Intent::AnnounceTurn {
                player: PlayerRef {
                    id: 1234,
                    name: "Ann".to_string(),
                },
            },
            None,
        )
        .unwrap();
        assert_eq!(rendered.content, "➡️ <@1234>, it's your turn.");
    }

    #[test]
    fn test_vote_results() {
        let mut resolution = VoteResolution {
            round: 1,
            candidates: names(&["Ann", "Bob", "Cid"]),
            vote_counts: BTreeMap::from([(0, 1), (2, 1)]),
            verdict: Verdict::Tie {
                indices: vec![0, 2],
            },
            eliminated_player: None,
            eliminated_name: None,
            was_impostor: None,
            impostors_left: 1,
            outcome: RoundOutcome::Continue,
        };
        assert!(vote_result(&resolution).contains("tie between Ann and Cid"));

        resolution.vote_counts = BTreeMap::from([(1, 2)]);
        resolution.verdict = Verdict::Elected { index: 1 };
        resolution.eliminated_player = Some(2);
        resolution.eliminated_name = Some("Bob".to_string());
        resolution.was_impostor = Some(true);
        let text = vote_result(&resolution);
        assert!(text.contains("**Bob** was voted out with 2 vote(s)"));
        assert!(text.contains("an impostor"));
        assert!(text.contains("1 impostor(s) still hiding"));

        resolution.verdict = Verdict::NoVotes;
        assert!(vote_result(&resolution).contains("Nobody voted"));
    }

    #[test]
    fn test_game_over_reveal() {
        let summary = GameSummary {
            outcome: GameOutcome {
                winner: Team::Impostors,
                reason: GameOverReason::SecretWordLeaked { leaker: 3 },
            },
            secret_word: "pineapple".to_string(),
            impostors: names(&["Ann"]),
            citizens: names(&["Bob", "Cid"]),
            eliminated: vec![],
            leaker: Some("Cid".to_string()),
            rounds_played: 1,
        };

        let text = game_over(&summary);
        assert!(text.contains("Cid said the secret word"));
        assert!(text.contains("**pineapple**"));
        assert!(text.contains("Impostors: Ann"));
        assert!(text.contains("Citizens: Bob, Cid"));
        assert!(!text.contains("Eliminated"));
    }

    #[test]
    fn test_role_messages() {
        let citizen = role_message(&RolePayload::Citizen {
            secret_word: "pineapple".to_string(),
        });
        assert!(citizen.contains("**pineapple**"));

        let impostor = role_message(&RolePayload::Impostor);
        assert!(impostor.contains("impostor"));
        assert!(!impostor.contains("pineapple"));
    }

    #[test]
    fn test_status_text() {
        let snapshot = StatusSnapshot {
            session_id: 1,
            phase: Phase::PlayingRound,
            round: 2,
            max_rounds: Some(3),
            players: 4,
            active_players: names(&["Ann", "Bob", "Cid"]),
            eliminated: names(&["Dan"]),
            current_player: Some("Bob".to_string()),
            clues: vec![Clue {
                player_id: 1,
                display_name: "Ann".to_string(),
                text: "round".to_string(),
            }],
            delivery_failures: names(&["Cid"]),
            outcome: None,
        };

        let text = status(&snapshot);
        assert!(text.contains("playing a round"));
        assert!(text.contains("Round: 2/3"));
        assert!(text.contains("Players (3): Ann, Bob, Cid"));
        assert!(text.contains("Eliminated: Dan"));
        assert!(text.contains("Current turn: Bob"));
        assert!(text.contains("• **Ann**: round"));
        assert!(text.contains("not delivered to: Cid"));
    }

    #[test]
    fn test_cancel_messages() {
        let rendered = render(
            &Intent::AnnounceCancelled {
                reason: CancelReason::NotEnoughPlayers,
                joined: 2,
            },
            None,
        )
        .unwrap();
        assert!(rendered.content.contains("Only 2 player(s) joined"));
    }
}
