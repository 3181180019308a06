use std::collections::HashMap;

use crate::hackernews::{FetchError, Item};

#[derive(Debug, Clone, PartialEq)]
pub enum OptionState {
    Loading,
    Loaded { text: String, score: i64 },
    Failed,
}

impl OptionState {
    pub fn lines(&self) -> Vec<String> {
        match self {
            OptionState::Loading => vec!["Loading option...".to_string()],
            OptionState::Loaded { text, score } => {
                vec![text.clone(), format!("{score} votes")]
            }
            OptionState::Failed => vec!["Option unavailable".to_string()],
        }
    }
}

/// Option placeholders for every poll on screen. Each option resolves on its
/// own, independently of its siblings.
#[derive(Debug, Default)]
pub struct PollBoard {
    polls: HashMap<i64, Vec<i64>>,
    options: HashMap<i64, OptionState>,
}

impl PollBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.polls.clear();
        self.options.clear();
    }

    /// Adds placeholders for the poll's parts and returns the option ids that
    /// still need fetching. Polls without parts get no options block.
    pub fn track(&mut self, poll: &Item) -> Vec<i64> {
        let parts = poll.parts();
        if parts.is_empty() || self.polls.contains_key(&poll.id) {
            return Vec::new();
        }
        self.polls.insert(poll.id, parts.to_vec());
        for &part in parts {
            self.options.insert(part, OptionState::Loading);
        }
        parts.to_vec()
    }

    /// Returns false if the option is not on the board any more.
    pub fn resolve(&mut self, option_id: i64, result: Result<Item, FetchError>) -> bool {
        let Some(slot) = self.options.get_mut(&option_id) else {
            return false;
        };
        *slot = match result {
            Ok(option) => OptionState::Loaded {
                text: crate::text::plain(option.text.as_deref().unwrap_or_default()),
                score: option.score.unwrap_or(0),
            },
            Err(_) => OptionState::Failed,
        };
        true
    }

    /// Options of `poll` in part order, or `None` when it has no block.
    pub fn options(&self, poll: i64) -> Option<Vec<(i64, &OptionState)>> {
        let parts = self.polls.get(&poll)?;
        Some(
            parts
                .iter()
                .filter_map(|id| self.options.get(id).map(|state| (*id, state)))
                .collect(),
        )
    }
}
