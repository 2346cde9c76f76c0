//! Session history and the synchroniser that keeps it and the view in step.
//!
//! ```text
//!   user transition ──push──▶ SessionHistory ──change──▶ HistorySync::observe
//!                                  ▲                         │
//!   back / forward ────────────────┘                         ▼
//!                                           Restore(params) │ LocalReset │ None
//! ```
//!
//! Our own pushes come back through `observe` like any other change. The
//! synchroniser remembers the last location it pushed and ignores that echo,
//! so a push never turns into a second fetch.

use std::collections::VecDeque;

use tracing::debug;

use cine_proto::nav::{Location, NavigationParams};

/// Whether landing on an entry should reset the results viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollMode {
    Reset,
    Preserve,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub location: Location,
    pub scroll: ScrollMode,
}

/// A location change waiting to be observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryChange {
    pub location: Location,
    pub scroll: ScrollMode,
}

pub trait History {
    fn current(&self) -> &Location;

    /// Record a new entry. Pushing the current location is a no-op and
    /// returns `false`.
    fn push(&mut self, location: Location, scroll: ScrollMode) -> bool;

    fn back(&mut self) -> Option<Location>;

    fn forward(&mut self) -> Option<Location>;

    /// Next unobserved change, oldest first.
    fn take_change(&mut self) -> Option<HistoryChange>;
}

/// In-process stand-in for the browser's history stack.
#[derive(Debug)]
pub struct SessionHistory {
    entries: Vec<HistoryEntry>,
    cursor: usize,
    changes: VecDeque<HistoryChange>,
}

impl SessionHistory {
    pub fn new(initial: Location) -> Self {
        Self {
            entries: vec![HistoryEntry {
                location: initial,
                scroll: ScrollMode::Reset,
            }],
            cursor: 0,
            changes: VecDeque::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn can_go_back(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_go_forward(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    fn land(&mut self, index: usize) -> Location {
        self.cursor = index;
        let entry = &self.entries[index];
        self.changes.push_back(HistoryChange {
            location: entry.location.clone(),
            scroll: entry.scroll,
        });
        entry.location.clone()
    }
}

impl History for SessionHistory {
    fn current(&self) -> &Location {
        &self.entries[self.cursor].location
    }

    fn push(&mut self, location: Location, scroll: ScrollMode) -> bool {
        if *self.current() == location {
            return false;
        }
        self.entries.truncate(self.cursor + 1);
        debug!("history push {}", location);
        self.entries.push(HistoryEntry { location, scroll });
        let last = self.entries.len() - 1;
        self.land(last);
        true
    }

    fn back(&mut self) -> Option<Location> {
        if !self.can_go_back() {
            return None;
        }
        Some(self.land(self.cursor - 1))
    }

    fn forward(&mut self) -> Option<Location> {
        if !self.can_go_forward() {
            return None;
        }
        Some(self.land(self.cursor + 1))
    }

    fn take_change(&mut self) -> Option<HistoryChange> {
        self.changes.pop_front()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncAction {
    Restore(NavigationParams),
    LocalReset,
    None,
}

#[derive(Debug)]
pub struct HistorySync {
    is_initial_mount: bool,
    echo: Option<Location>,
}

impl Default for HistorySync {
    fn default() -> Self {
        Self::new()
    }
}

impl HistorySync {
    pub fn new() -> Self {
        Self {
            is_initial_mount: true,
            echo: None,
        }
    }

    /// Push through the synchroniser so the resulting change is recognised
    /// as our own.
    ///
    /// A push settles the first observation too: the launch location has
    /// already been superseded, so there is no deep link left to restore.
    pub fn push(&mut self, history: &mut impl History, location: Location) -> bool {
        self.is_initial_mount = false;
        let pushed = history.push(location.clone(), ScrollMode::Preserve);
        if pushed {
            self.echo = Some(location);
        }
        pushed
    }

    /// True until the launch location has been observed or superseded.
    pub fn awaiting_first_observation(&self) -> bool {
        self.is_initial_mount
    }

    pub fn observe(&mut self, location: &Location) -> SyncAction {
        if self.is_initial_mount {
            self.is_initial_mount = false;
            return match location.params() {
                Some(params) => {
                    debug!("deep link to {}", location);
                    SyncAction::Restore(params)
                }
                None => SyncAction::None,
            };
        }

        if let Some(echo) = self.echo.take() {
            if echo == *location {
                return SyncAction::None;
            }
        }

        match location.params() {
            Some(params) => SyncAction::Restore(params),
            None => SyncAction::LocalReset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dune() -> Location {
        Location::from(&NavigationParams::movie("Dune"))
    }

    fn drain(history: &mut SessionHistory) -> Vec<Location> {
        std::iter::from_fn(|| history.take_change())
            .map(|c| c.location)
            .collect()
    }

    #[test]
    fn push_truncates_forward_entries() {
        let mut history = SessionHistory::new(Location::home());
        history.push(dune(), ScrollMode::Preserve);
        let heat = Location::from(&NavigationParams::movie("Heat"));
        history.push(heat.clone(), ScrollMode::Preserve);

        assert_eq!(history.back(), Some(dune()));
        assert_eq!(history.back(), Some(Location::home()));
        assert_eq!(history.back(), None);

        let horror = Location::from(&NavigationParams::genre("Horror"));
        history.push(horror.clone(), ScrollMode::Preserve);
        assert_eq!(history.len(), 2);
        assert!(!history.can_go_forward());
        assert_eq!(history.current(), &horror);
    }

    #[test]
    fn identical_push_does_not_grow_history() {
        let mut history = SessionHistory::new(dune());
        assert!(!history.push(dune(), ScrollMode::Preserve));
        assert_eq!(history.len(), 1);
        assert!(drain(&mut history).is_empty());
    }

    #[test]
    fn first_observation_restores_only_deep_links() {
        let mut sync = HistorySync::new();
        assert_eq!(sync.observe(&Location::home()), SyncAction::None);

        let mut sync = HistorySync::new();
        assert_eq!(
            sync.observe(&dune()),
            SyncAction::Restore(NavigationParams::movie("Dune"))
        );
    }

    #[test]
    fn own_pushes_are_ignored_but_navigation_is_not() {
        let mut history = SessionHistory::new(Location::home());
        let mut sync = HistorySync::new();
        sync.observe(&Location::home());

        assert!(sync.push(&mut history, dune()));
        let changes = drain(&mut history);
        assert_eq!(changes, vec![dune()]);
        assert_eq!(sync.observe(&changes[0]), SyncAction::None);

        history.back();
        let changes = drain(&mut history);
        assert_eq!(sync.observe(&changes[0]), SyncAction::LocalReset);

        history.forward();
        let changes = drain(&mut history);
        assert_eq!(
            sync.observe(&changes[0]),
            SyncAction::Restore(NavigationParams::movie("Dune"))
        );
    }

    #[test]
    fn push_before_first_observation_is_still_an_echo() {
        let mut history = SessionHistory::new(Location::home());
        let mut sync = HistorySync::new();

        assert!(sync.push(&mut history, dune()));
        assert!(!sync.awaiting_first_observation());
        let changes = drain(&mut history);
        assert_eq!(sync.observe(&changes[0]), SyncAction::None);
    }

    #[test]
    fn programmatic_pushes_preserve_scroll() {
        let mut history = SessionHistory::new(Location::home());
        let mut sync = HistorySync::new();
        sync.push(&mut history, dune());
        assert_eq!(
            history.take_change().map(|c| c.scroll),
            Some(ScrollMode::Preserve)
        );
        history.back();
        assert_eq!(history.take_change().map(|c| c.scroll), Some(ScrollMode::Reset));
    }
}
