//! Which timeline is shown and how the user moves between them

use crate::api::FetchError;
use crate::models::TimelineIdentity;

/// Navigation state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavState {
    /// Showing a timeline
    Viewing(TimelineIdentity),
    /// Choosing a timeline to jump to; the previous one stays underneath
    JumpPrompt(TimelineIdentity),
    /// A fetch for the active timeline failed
    ErrorModal(TimelineIdentity, FetchError),
}

/// What `close` did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseOutcome {
    /// Returned to the timeline below on the back stack
    Returned {
        /// The closed timeline
        closed: TimelineIdentity,
        /// Now active
        to: TimelineIdentity,
    },
    /// Nothing to go back to
    Quit,
    /// Not allowed in the current state
    Ignored,
}

/// State machine over [`NavState`] with a back stack of opened timelines
#[derive(Debug)]
pub struct Navigator {
    state: NavState,
    back: Vec<TimelineIdentity>,
}

impl Navigator {
    /// Start viewing `start`
    pub const fn new(start: TimelineIdentity) -> Self {
        Self {
            state: NavState::Viewing(start),
            back: Vec::new(),
        }
    }

    /// Current state
    pub const fn state(&self) -> &NavState {
        &self.state
    }

    /// The active timeline, whatever is drawn on top of it
    pub const fn active(&self) -> &TimelineIdentity {
        match &self.state {
            NavState::Viewing(id) | NavState::JumpPrompt(id) | NavState::ErrorModal(id, _) => id,
        }
    }

    /// Whether the active timeline has input focus
    pub const fn is_viewing(&self) -> bool {
        matches!(self.state, NavState::Viewing(_))
    }

    /// Timelines below the active one, oldest first
    pub fn back_stack(&self) -> &[TimelineIdentity] {
        &self.back
    }

    /// Identities the registry must keep live
    pub fn pinned(&self) -> Vec<TimelineIdentity> {
        let mut pinned = self.back.clone();
        pinned.push(self.active().clone());
        pinned
    }

    /// Viewing → `JumpPrompt`
    pub fn begin_jump(&mut self) -> bool {
        match &self.state {
            NavState::Viewing(id) => {
                self.state = NavState::JumpPrompt(id.clone());
                true
            }
            _ => false,
        }
    }

    /// `JumpPrompt` → Viewing the previous timeline
    pub fn cancel_jump(&mut self) -> bool {
        match &self.state {
            NavState::JumpPrompt(id) => {
                self.state = NavState::Viewing(id.clone());
                true
            }
            _ => false,
        }
    }

    /// Switch to `target` from Viewing or `JumpPrompt`, clearing the back stack.
    ///
    /// Returns the timelines that are no longer referenced.
    pub fn jump(&mut self, target: TimelineIdentity) -> Option<Vec<TimelineIdentity>> {
        let previous = match &self.state {
            NavState::Viewing(id) | NavState::JumpPrompt(id) => id.clone(),
            NavState::ErrorModal(..) => return None,
        };

        let mut released: Vec<TimelineIdentity> = self.back.drain(..).collect();
        released.push(previous);
        released.retain(|id| *id != target);
        released.dedup();

        self.state = NavState::Viewing(target);
        Some(released)
    }

    /// Open `target` on top of the active timeline
    pub fn open(&mut self, target: TimelineIdentity) -> bool {
        match &self.state {
            NavState::Viewing(id) if *id != target => {
                self.back.push(id.clone());
                self.state = NavState::Viewing(target);
                true
            }
            _ => false,
        }
    }

    /// Close the active timeline and return to the one below it
    pub fn close(&mut self) -> CloseOutcome {
        let NavState::Viewing(active) = &self.state else {
            return CloseOutcome::Ignored;
        };
        match self.back.pop() {
            Some(to) => {
                let closed = active.clone();
                self.state = NavState::Viewing(to.clone());
                CloseOutcome::Returned { closed, to }
            }
            None => CloseOutcome::Quit,
        }
    }

    /// Show a failure of the active timeline
    pub fn fail(&mut self, error: FetchError) {
        let active = self.active().clone();
        self.state = NavState::ErrorModal(active, error);
    }

    /// `ErrorModal` → Viewing
    pub fn dismiss(&mut self) -> bool {
        match &self.state {
            NavState::ErrorModal(id, _) => {
                self.state = NavState::Viewing(id.clone());
                true
            }
            _ => false,
        }
    }
}
