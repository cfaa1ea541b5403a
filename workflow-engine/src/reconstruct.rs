use crate::prompts::classify_text;
use crate::session::Turn;
use crate::state::DialogStep;

/// Derives the dialog step of a transcript that has no stored step.
///
/// Looks at the newest `depth` system turns, newest first, and returns the
/// step of the first one carrying a marker. Falls back to the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionReconstructor {
    depth: usize,
}

impl SessionReconstructor {
    pub fn new(depth: usize) -> Self {
        Self {
            depth: depth.max(1),
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn reconstruct(&self, turns: &[Turn]) -> DialogStep {
        turns
            .iter()
            .rev()
            .filter(|turn| turn.is_system())
            .take(self.depth)
            .find_map(|turn| classify_text(&turn.text))
            .unwrap_or(DialogStep::Menu)
    }
}

impl Default for SessionReconstructor {
    fn default() -> Self {
        Self::new(5)
    }
}
