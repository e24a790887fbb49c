//! Game phase machine
//!
//! ```text
//! Idle --Start--> Countdown --CountdownElapsed--> Playing --TrackEnded--> Finished
//!  ^                                                                          |
//!  +-------------------------------- Restart ---------------------------------+
//! ```
//!
//! Requests that do not match an edge are ignored, so repeated UI events
//! (double clicks, a late countdown tick) are harmless.

pub mod countdown;

pub use countdown::{Countdown, CountdownStatus, DEFAULT_COUNTDOWN_SECS};

use std::fmt;

/// Phase of a game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GamePhase {
    /// Waiting for the player to start
    #[default]
    Idle,
    /// Counting down before the track starts
    Countdown,
    /// Track playing, slots being cued
    Playing,
    /// All rounds done; stays here until restarted
    Finished,
}

impl GamePhase {
    /// Phase reached from `self` by `trigger`, if that edge exists
    pub fn next(self, trigger: PhaseTrigger) -> Option<GamePhase> {
        match (self, trigger) {
            (GamePhase::Idle, PhaseTrigger::Start) => Some(GamePhase::Countdown),
            (GamePhase::Countdown, PhaseTrigger::CountdownElapsed) => Some(GamePhase::Playing),
            (GamePhase::Playing, PhaseTrigger::TrackEnded) => Some(GamePhase::Finished),
            (GamePhase::Finished, PhaseTrigger::Restart) => Some(GamePhase::Idle),
            _ => None,
        }
    }

    /// Lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            GamePhase::Idle => "idle",
            GamePhase::Countdown => "countdown",
            GamePhase::Playing => "playing",
            GamePhase::Finished => "finished",
        }
    }

    #[allow(missing_docs)]
    pub fn is_idle(&self) -> bool {
        *self == GamePhase::Idle
    }

    #[allow(missing_docs)]
    pub fn is_countdown(&self) -> bool {
        *self == GamePhase::Countdown
    }

    #[allow(missing_docs)]
    pub fn is_playing(&self) -> bool {
        *self == GamePhase::Playing
    }

    #[allow(missing_docs)]
    pub fn is_finished(&self) -> bool {
        *self == GamePhase::Finished
    }
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event asking for a phase change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhaseTrigger {
    /// Player pressed start
    Start,
    /// Countdown reached zero
    CountdownElapsed,
    /// Track or last round ended
    TrackEnded,
    /// Player asked to play again
    Restart,
}

/// A phase change that took place
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTransition {
    /// Phase left
    pub from: GamePhase,
    /// Phase entered
    pub to: GamePhase,
}

impl PhaseTransition {
    /// Whether this transition leaves `phase`
    pub fn leaves(&self, phase: GamePhase) -> bool {
        self.from == phase && self.to != phase
    }

    /// Whether this transition enters `phase`
    pub fn enters(&self, phase: GamePhase) -> bool {
        self.to == phase && self.from != phase
    }
}

/// Identifies a subscriber for [`GamePhaseController::unsubscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(PhaseTransition)>;

/// Owner of the current [`GamePhase`]
pub struct GamePhaseController {
    phase: GamePhase,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_id: u64,
}

impl GamePhaseController {
    /// Controller in [`GamePhase::Idle`]
    pub fn new() -> Self {
        GamePhaseController {
            phase: GamePhase::Idle,
            subscribers: Vec::new(),
            next_id: 0,
        }
    }

    /// Current phase
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Apply `trigger`. Returns the transition, or `None` when the trigger
    /// has no edge from the current phase (the request is ignored).
    pub fn request(&mut self, trigger: PhaseTrigger) -> Option<PhaseTransition> {
        let Some(to) = self.phase.next(trigger) else {
            log::debug!("ignoring {:?} in phase {}", trigger, self.phase);
            return None;
        };

        let transition = PhaseTransition {
            from: self.phase,
            to,
        };
        self.phase = to;
        log::info!("phase {} -> {}", transition.from, transition.to);

        for (_, subscriber) in self.subscribers.iter_mut() {
            subscriber(transition);
        }
        Some(transition)
    }

    /// `Idle -> Countdown`
    pub fn start_countdown(&mut self) -> Option<PhaseTransition> {
        self.request(PhaseTrigger::Start)
    }

    /// `Countdown -> Playing`
    pub fn start_playing(&mut self) -> Option<PhaseTransition> {
        self.request(PhaseTrigger::CountdownElapsed)
    }

    /// `Playing -> Finished`
    pub fn finish_game(&mut self) -> Option<PhaseTransition> {
        self.request(PhaseTrigger::TrackEnded)
    }

    /// `Finished -> Idle`
    pub fn reset_game(&mut self) -> Option<PhaseTransition> {
        self.request(PhaseTrigger::Restart)
    }

    /// Be told about every transition
    pub fn subscribe(
        &mut self,
        subscriber: impl FnMut(PhaseTransition) + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, Box::new(subscriber)));
        id
    }

    /// Remove a subscriber; returns whether it was registered
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(existing, _)| *existing != id);
        self.subscribers.len() != before
    }
}

impl Default for GamePhaseController {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for GamePhaseController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GamePhaseController")
            .field("phase", &self.phase)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    const ALL_TRIGGERS: [PhaseTrigger; 4] = [
        PhaseTrigger::Start,
        PhaseTrigger::CountdownElapsed,
        PhaseTrigger::TrackEnded,
        PhaseTrigger::Restart,
    ];

    #[test]
    fn test_full_cycle() {
        let mut controller = GamePhaseController::new();
        assert!(controller.phase().is_idle());

        controller.start_countdown().unwrap();
        assert!(controller.phase().is_countdown());
        controller.start_playing().unwrap();
        assert!(controller.phase().is_playing());
        controller.finish_game().unwrap();
        assert!(controller.phase().is_finished());
        controller.reset_game().unwrap();
        assert!(controller.phase().is_idle());
    }

    #[test]
    fn test_only_one_edge_per_phase() {
        let phases = [
            GamePhase::Idle,
            GamePhase::Countdown,
            GamePhase::Playing,
            GamePhase::Finished,
        ];
        for phase in phases {
            let valid = ALL_TRIGGERS
                .iter()
                .filter(|trigger| phase.next(**trigger).is_some())
                .count();
            assert_eq!(valid, 1, "{phase} should have exactly one outgoing edge");
        }
    }

    #[test]
    fn test_invalid_requests_are_ignored() {
        let mut controller = GamePhaseController::new();
        assert_eq!(controller.finish_game(), None);
        assert_eq!(controller.start_playing(), None);
        assert_eq!(controller.reset_game(), None);
        assert!(controller.phase().is_idle());

        controller.start_countdown();
        assert_eq!(controller.start_countdown(), None);
        assert!(controller.phase().is_countdown());
    }

    #[test]
    fn test_subscribers_see_transitions() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut controller = GamePhaseController::new();
        let id = controller.subscribe(move |t| sink.borrow_mut().push((t.from, t.to)));

        controller.start_countdown();
        controller.finish_game(); // ignored, not reported
        controller.start_playing();
        assert!(controller.unsubscribe(id));
        assert!(!controller.unsubscribe(id));
        controller.finish_game();

        assert_eq!(
            *seen.borrow(),
            vec![
                (GamePhase::Idle, GamePhase::Countdown),
                (GamePhase::Countdown, GamePhase::Playing),
            ]
        );
    }

    #[test]
    fn test_transition_helpers() {
        let t = PhaseTransition {
            from: GamePhase::Playing,
            to: GamePhase::Finished,
        };
        assert!(t.leaves(GamePhase::Playing));
        assert!(t.enters(GamePhase::Finished));
        assert!(!t.enters(GamePhase::Playing));
    }
}
