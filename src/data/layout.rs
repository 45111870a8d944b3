use std::collections::HashMap;

use crate::api::Id;

use super::*;

/// Greedy placement of comment cards so that cards for nearby lines do not
/// overlap. Earlier cards never move to make room for later ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CardLayout {
    pub line_height: u32,
    /// Minimum gap between consecutive cards.
    pub buffer: u32,
    /// Height assumed for a card the browser has not measured yet.
    pub fallback_height: u32,
}

impl Default for CardLayout {
    fn default() -> Self {
        CardLayout {
            line_height: LINE_HEIGHT,
            buffer: 10,
            fallback_height: 60,
        }
    }
}

/// A thread and the top edge of its card, in pixels.
#[derive(Clone, Copy, Debug)]
pub struct PlacedCard<'a> {
    pub thread: &'a Thread,
    pub top: u32,
}

impl CardLayout {
    /// Places one card per thread, ordered by start line (ties keep arrival
    /// order). `heights` holds the last measured height of each card.
    pub fn place<'a>(&self, threads: &'a [Thread], heights: &HashMap<Id, u32>) -> Vec<PlacedCard<'a>> {
        let mut sorted: Vec<&Thread> = threads.iter().collect();
        sorted.sort_by_key(|t| t.comment.anchor.start_line);

        let mut last_bottom = 0u32;
        sorted
            .into_iter()
            .map(|thread| {
                let line = u32::try_from(thread.comment.anchor.start_line).unwrap_or(u32::MAX);
                let natural = line.saturating_mul(self.line_height);
                let top = natural.max(last_bottom.saturating_add(self.buffer));
                let height = heights
                    .get(&thread.id())
                    .copied()
                    .unwrap_or(self.fallback_height);
                last_bottom = top.saturating_add(height);
                PlacedCard { thread, top }
            })
            .collect()
    }
}
