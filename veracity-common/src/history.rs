//! Bounded rolling conversation history.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::types::ConversationTurn;

/// Turns retained per chat (five user/assistant exchanges).
pub const MAX_HISTORY_TURNS: usize = 10;

/// Ordered turns, oldest first, never longer than its capacity.
///
/// ```rust
/// use veracity_common::{ConversationHistory, ConversationTurn};
///
/// let mut history = ConversationHistory::with_capacity(2);
/// history.push(ConversationTurn::user("one"));
/// history.push(ConversationTurn::assistant("two"));
/// history.push(ConversationTurn::user("three"));
/// assert_eq!(history.len(), 2);
/// assert_eq!(history.turns()[0].content, "two");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationHistory {
    turns: VecDeque<ConversationTurn>,
    capacity: usize,
}

impl Default for ConversationHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::with_capacity(MAX_HISTORY_TURNS)
    }

    /// Capacity is held within `1..=MAX_HISTORY_TURNS`.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, MAX_HISTORY_TURNS);
        Self {
            turns: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Keep only the newest `capacity` turns from a client-supplied list.
    pub fn from_turns(turns: impl IntoIterator<Item = ConversationTurn>, capacity: usize) -> Self {
        let mut history = Self::with_capacity(capacity);
        for turn in turns {
            history.push(turn);
        }
        history
    }

    pub fn push(&mut self, turn: ConversationTurn) {
        while self.turns.len() >= self.capacity {
            self.turns.pop_front();
        }
        self.turns.push_back(turn);
    }

    /// Append a user message and the assistant reply as one exchange.
    pub fn push_exchange(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        self.push(ConversationTurn::user(user));
        self.push(ConversationTurn::assistant(assistant));
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Contiguous view, oldest first.
    pub fn turns(&mut self) -> &[ConversationTurn] {
        self.turns.make_contiguous()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConversationTurn> {
        self.turns.iter()
    }

    pub fn to_vec(&self) -> Vec<ConversationTurn> {
        self.turns.iter().cloned().collect()
    }
}

/// Newest `max` turns of a slice, oldest first. Never more than
/// [`MAX_HISTORY_TURNS`].
pub fn recent(turns: &[ConversationTurn], max: usize) -> &[ConversationTurn] {
    let max = max.min(MAX_HISTORY_TURNS);
    &turns[turns.len().saturating_sub(max)..]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    #[test]
    fn eleventh_turn_evicts_oldest() {
        let mut history = ConversationHistory::new();
        for i in 0..MAX_HISTORY_TURNS {
            history.push(ConversationTurn::user(format!("m{i}")));
        }
        assert_eq!(history.len(), MAX_HISTORY_TURNS);

        history.push(ConversationTurn::assistant("m10"));
        assert_eq!(history.len(), MAX_HISTORY_TURNS);
        let turns = history.turns();
        assert_eq!(turns[0].content, "m1");
        assert_eq!(turns[MAX_HISTORY_TURNS - 1].content, "m10");
        assert_eq!(turns[MAX_HISTORY_TURNS - 1].role, Role::Assistant);
    }

    #[test]
    fn exchanges_keep_five_pairs() {
        let mut history = ConversationHistory::new();
        for i in 0..8 {
            history.push_exchange(format!("q{i}"), format!("a{i}"));
        }
        let v = history.to_vec();
        assert_eq!(v.len(), 10);
        assert_eq!(v[0].content, "q3");
        assert_eq!(v[9].content, "a7");
    }

    #[test]
    fn from_turns_keeps_newest() {
        let turns = (0..25).map(|i| ConversationTurn::user(i.to_string()));
        let history = ConversationHistory::from_turns(turns, MAX_HISTORY_TURNS);
        let v = history.to_vec();
        assert_eq!(v.len(), 10);
        assert_eq!(v.first().unwrap().content, "15");
        assert_eq!(v.last().unwrap().content, "24");
    }

    #[test]
    fn recent_slices_tail() {
        let turns: Vec<_> = (0..4).map(|i| ConversationTurn::user(i.to_string())).collect();
        assert_eq!(recent(&turns, 2).len(), 2);
        assert_eq!(recent(&turns, 2)[0].content, "2");
        assert_eq!(recent(&turns, 10).len(), 4);
    }

    #[test]
    fn clear_and_zero_capacity() {
        let mut history = ConversationHistory::with_capacity(0);
        assert_eq!(history.capacity(), 1);
        history.push(ConversationTurn::user("a"));
        history.push(ConversationTurn::user("b"));
        assert_eq!(history.len(), 1);
        history.clear();
        assert!(history.is_empty());
    }

    #[test]
    fn capacity_never_exceeds_ten_turns() {
        let mut history = ConversationHistory::with_capacity(20);
        assert_eq!(history.capacity(), MAX_HISTORY_TURNS);
        for i in 0..20 {
            history.push(ConversationTurn::user(format!("m{i}")));
        }
        assert_eq!(history.len(), MAX_HISTORY_TURNS);
        assert_eq!(history.turns()[0].content, "m10");

        let turns: Vec<_> = (0..20)
            .map(|i| ConversationTurn::user(format!("t{i}")))
            .collect();
        let window = recent(&turns, 20);
        assert_eq!(window.len(), MAX_HISTORY_TURNS);
        assert_eq!(window[0].content, "t10");
    }
}
