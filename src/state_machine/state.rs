use std::fmt;

use serde::{Deserialize, Serialize};

/// The three states of the microwave door/cook state machine.
///
/// Closed → Open ⇄ Closed → Cooking → Closed. The door cannot be opened
/// while cooking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DoorState {
    Open,
    #[default]
    Closed,
    Cooking,
}

impl fmt::Display for DoorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DoorState::Open => write!(f, "Open"),
            DoorState::Closed => write!(f, "Closed"),
            DoorState::Cooking => write!(f, "Cooking"),
        }
    }
}

/// A button or door action applied to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trigger {
    Open,
    Close,
    Start,
    Stop,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Open => write!(f, "open"),
            Trigger::Close => write!(f, "close"),
            Trigger::Start => write!(f, "start"),
            Trigger::Stop => write!(f, "stop"),
        }
    }
}

/// How a trigger affected the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    /// The state changed.
    Moved,
    /// Harmless repeat (e.g. closing a closed door); state unchanged.
    Unchanged,
    /// The action is not allowed in this state; state unchanged.
    Forbidden,
}

/// The result of applying a trigger to a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub from: DoorState,
    pub trigger: Trigger,
    pub to: DoorState,
    pub effect: Effect,
    /// Human-readable outcome, for display only.
    pub message: &'static str,
}

impl Transition {
    pub fn is_forbidden(&self) -> bool {
        self.effect == Effect::Forbidden
    }

    /// Whether this transition begins a cook session.
    pub fn starts_cooking(&self) -> bool {
        self.from != DoorState::Cooking && self.to == DoorState::Cooking
    }

    /// Whether this transition ends a running cook session.
    pub fn ends_cooking(&self) -> bool {
        self.from == DoorState::Cooking && self.to != DoorState::Cooking
    }
}

/// Pure transition table for the microwave. Holds no state and performs no
/// side effects; the controller decides what to do with the result.
pub struct StateMachine;

impl StateMachine {
    /// Apply `trigger` to `state`. Total over every pair.
    pub fn apply(state: DoorState, trigger: Trigger) -> Transition {
        use DoorState::{Closed, Cooking, Open};
        use Effect::{Forbidden, Moved, Unchanged};

        let (to, effect, message) = match (state, trigger) {
            (Open, Trigger::Open) => (Open, Unchanged, "The door is already open."),
            (Open, Trigger::Close) => (Closed, Moved, "Door closed."),
            (Open, Trigger::Start) => (Open, Forbidden, "Cannot start while the door is open."),
            (Open, Trigger::Stop) => (Open, Forbidden, "Nothing to stop while the door is open."),

            (Closed, Trigger::Open) => (Open, Moved, "Door opened."),
            (Closed, Trigger::Close) => (Closed, Unchanged, "The door is already closed."),
            (Closed, Trigger::Start) => (Cooking, Moved, "Start cooking..."),
            (Closed, Trigger::Stop) => (Closed, Unchanged, "Not cooking."),

            (Cooking, Trigger::Open) => {
                (Cooking, Forbidden, "The door cannot be opened while cooking!")
            }
            (Cooking, Trigger::Close) => (Cooking, Unchanged, "The door is already closed."),
            (Cooking, Trigger::Start) => (Cooking, Forbidden, "Already cooking."),
            (Cooking, Trigger::Stop) => (Closed, Moved, "Cooking stopped."),
        };

        Transition {
            from: state,
            trigger,
            to,
            effect,
            message,
        }
    }
}
