//! Per-level heading context.

use crate::model::MAX_HEADING_LEVEL;

const SLOTS: usize = MAX_HEADING_LEVEL as usize;

/// The most recent heading text at each level 1-6.
///
/// Setting a level clears every deeper level: a new section ends all of the
/// previous section's subsections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadingStack {
    slots: [Option<String>; SLOTS],
}

impl HeadingStack {
    /// Create an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a heading at `level` and clear all deeper levels.
    ///
    /// Levels outside 1-6 are clamped.
    pub fn set_level(&mut self, level: u8, text: impl Into<String>) {
        let index = usize::from(level.clamp(1, MAX_HEADING_LEVEL)) - 1;
        self.slots[index] = Some(text.into());
        for slot in &mut self.slots[index + 1..] {
            *slot = None;
        }
    }

    /// Heading text at `level`, if set.
    pub fn get(&self, level: u8) -> Option<&str> {
        let index = usize::from(level).checked_sub(1)?;
        self.slots.get(index)?.as_deref()
    }

    /// Deepest level that is set.
    pub fn depth(&self) -> Option<u8> {
        self.slots
            .iter()
            .rposition(Option::is_some)
            .map(|i| i as u8 + 1)
    }

    /// Headings from level 1 down to the deepest set level.
    ///
    /// Unset levels in between stay as `None` so every entry keeps its
    /// level position; trailing unset levels are omitted.
    pub fn path(&self) -> Vec<Option<String>> {
        let depth = self.depth().map_or(0, usize::from);
        self.slots[..depth].to_vec()
    }

    /// Set heading texts from the outermost level down.
    pub fn titles(&self) -> Vec<&str> {
        self.slots.iter().flatten().map(String::as_str).collect()
    }

    /// Check if no level is set.
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Clear every level.
    pub fn clear(&mut self) {
        self.slots = Default::default();
    }
}
