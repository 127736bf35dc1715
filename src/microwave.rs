use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{Mutex, broadcast};

use crate::cook_time::CookTime;
use crate::countdown::Countdown;
use crate::error::MicrowaveError;
use crate::events::{CookEvent, EventBus};
use crate::food::{Food, FoodKind};
use crate::state_machine::{
    CookOutcome, CookSession, DoorState, Effect, StateMachine, Transition, Trigger,
};

/// Heat rate of a normal start, in Kelvin per second.
pub const DEFAULT_HEAT_RATE: f64 = 0.5;
/// Heat rate of a high power start, in Kelvin per second.
pub const HIGH_POWER_HEAT_RATE: f64 = 1.0;

/// Runtime knobs for the appliance.
#[derive(Debug, Clone, PartialEq)]
pub struct CookSettings {
    /// Length of one countdown tick.
    pub tick: Duration,
    pub heat_rate: f64,
    pub high_power_heat_rate: f64,
    /// Buffered events per subscriber before it starts lagging.
    pub event_capacity: usize,
}

impl Default for CookSettings {
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(1),
            heat_rate: DEFAULT_HEAT_RATE,
            high_power_heat_rate: HIGH_POWER_HEAT_RATE,
            event_capacity: 64,
        }
    }
}

/// State shared between the command path and the countdown task.
#[derive(Debug)]
pub(crate) struct Appliance {
    pub(crate) state: DoorState,
    /// Last time configured by the user.
    pub(crate) preset: CookTime,
    /// Displayed time; counts down while cooking.
    pub(crate) remaining: CookTime,
    pub(crate) food: Option<Food>,
    pub(crate) heat_rate: f64,
    /// Present exactly while `state` is `Cooking`.
    pub(crate) session: Option<CookSession>,
}

impl Appliance {
    fn new(heat_rate: f64) -> Self {
        Self {
            state: DoorState::Closed,
            preset: CookTime::ZERO,
            remaining: CookTime::ZERO,
            food: None,
            heat_rate,
            session: None,
        }
    }

    /// Move the state machine and log the outcome.
    pub(crate) fn fire(&mut self, trigger: Trigger) -> Transition {
        let t = StateMachine::apply(self.state, trigger);
        self.state = t.to;
        match t.effect {
            Effect::Moved => {
                tracing::info!(from = %t.from, to = %t.to, %trigger, "state changed");
            }
            Effect::Unchanged => {
                tracing::debug!(state = %t.from, %trigger, "trigger had no effect");
            }
            Effect::Forbidden => {
                tracing::debug!(state = %t.from, %trigger, reason = t.message, "trigger refused");
            }
        }
        t
    }

    pub(crate) fn food_kind(&self) -> Option<FoodKind> {
        self.food.as_ref().map(Food::kind)
    }
}

/// Snapshot of what the appliance shows on its display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Status {
    pub state: DoorState,
    /// Remaining time while cooking, otherwise the preset.
    pub time: CookTime,
    pub preset: CookTime,
    pub food: Option<FoodKind>,
    pub heat_rate: f64,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Microwave: {}", self.state)?;
        writeln!(f, "Preset Cook Time: {}", self.time)?;
        match self.food {
            Some(kind) => write!(f, "Food: {kind}"),
            None => write!(f, "Empty"),
        }
    }
}

/// Controller for a single microwave.
///
/// Cheap to clone; every clone drives the same appliance. Operations that
/// start cooking spawn a countdown on the current tokio runtime.
#[derive(Debug, Clone)]
pub struct Microwave {
    appliance: Arc<Mutex<Appliance>>,
    events: EventBus,
    settings: CookSettings,
}

impl Default for Microwave {
    fn default() -> Self {
        Self::new(CookSettings::default())
    }
}

impl Microwave {
    pub fn new(settings: CookSettings) -> Self {
        Self {
            appliance: Arc::new(Mutex::new(Appliance::new(settings.heat_rate))),
            events: EventBus::new(settings.event_capacity),
            settings,
        }
    }

    /// Subscribe to countdown progress.
    pub fn subscribe(&self) -> broadcast::Receiver<CookEvent> {
        self.events.subscribe()
    }

    pub async fn status(&self) -> Status {
        let appliance = self.appliance.lock().await;
        Status {
            state: appliance.state,
            time: appliance.remaining,
            preset: appliance.preset,
            food: appliance.food_kind(),
            heat_rate: appliance.heat_rate,
        }
    }

    /// Never fails; opening while cooking comes back as a forbidden transition.
    #[tracing::instrument(skip(self))]
    pub async fn open_door(&self) -> Transition {
        self.appliance.lock().await.fire(Trigger::Open)
    }

    #[tracing::instrument(skip(self))]
    pub async fn close_door(&self) -> Transition {
        self.appliance.lock().await.fire(Trigger::Close)
    }

    /// Place food inside. The door must be open and the microwave empty.
    #[tracing::instrument(skip(self, food), fields(food = %food.kind()))]
    pub async fn put_food(&self, food: Food) -> Result<(), MicrowaveError> {
        let mut appliance = self.appliance.lock().await;
        if appliance.state != DoorState::Open {
            return Err(MicrowaveError::operation(
                "cannot put food: the door is not open",
            ));
        }
        if let Some(inside) = appliance.food_kind() {
            return Err(MicrowaveError::operation(format!(
                "cannot put food: {inside} is already inside"
            )));
        }
        appliance.food = Some(food);
        tracing::info!("food placed");
        Ok(())
    }

    /// Remove the food. The door must be open and something must be inside.
    #[tracing::instrument(skip(self))]
    pub async fn take_out_food(&self) -> Result<Food, MicrowaveError> {
        let mut appliance = self.appliance.lock().await;
        if appliance.state != DoorState::Open {
            return Err(MicrowaveError::operation(
                "cannot take out: the door is not open",
            ));
        }
        let food = appliance
            .food
            .take()
            .ok_or_else(|| MicrowaveError::operation("cannot take out: the microwave is empty"))?;
        tracing::info!(food = %food.kind(), temperature = food.temperature(), "food taken out");
        Ok(food)
    }

    /// Set the cook time from user input (whole seconds, below one hour).
    /// Refused while cooking.
    #[tracing::instrument(skip(self))]
    pub async fn set_preset_time(&self, input: &str) -> Result<CookTime, MicrowaveError> {
        let time: CookTime = input.parse()?;
        let mut appliance = self.appliance.lock().await;
        if appliance.state == DoorState::Cooking {
            return Err(MicrowaveError::operation(
                "cannot set the time while cooking",
            ));
        }
        appliance.preset = time;
        appliance.remaining = time;
        tracing::info!(%time, "preset time set");
        Ok(time)
    }

    /// Add 30 seconds. Allowed in every state; while cooking it extends the
    /// running countdown. There is no upper bound.
    #[tracing::instrument(skip(self))]
    pub async fn add_thirty_seconds(&self) -> CookTime {
        let mut appliance = self.appliance.lock().await;
        appliance.remaining = appliance.remaining.add_secs(30);
        if appliance.state != DoorState::Cooking {
            appliance.preset = appliance.remaining;
        }
        tracing::info!(time = %appliance.remaining, "added 30 seconds");
        appliance.remaining
    }

    /// Press start. From Closed this begins a cook session and spawns its
    /// countdown; from Open or Cooking it is refused and nothing is spawned.
    #[tracing::instrument(skip(self))]
    pub async fn start(&self) -> Result<Transition, MicrowaveError> {
        let mut appliance = self.appliance.lock().await;
        let t = appliance.fire(Trigger::Start);
        if t.is_forbidden() {
            return Err(MicrowaveError::operation(t.message));
        }
        if t.starts_cooking() {
            let session = CookSession::new(appliance.remaining, appliance.heat_rate);
            tracing::info!(
                session_id = %session.id,
                time = %appliance.remaining,
                heat_rate = session.heat_rate,
                "cook session started"
            );
            self.events.publish(CookEvent::Started {
                session_id: session.id,
                remaining: appliance.remaining,
                heat_rate: session.heat_rate,
            });
            Countdown::spawn(
                Arc::clone(&self.appliance),
                self.events.clone(),
                &session,
                self.settings.tick,
            );
            appliance.session = Some(session);
        }
        Ok(t)
    }

    /// Press stop. Ends a running session and resets the remaining time;
    /// the countdown sees the cancellation and exits without touching
    /// anything else.
    #[tracing::instrument(skip(self))]
    pub async fn stop(&self) -> Result<Transition, MicrowaveError> {
        let mut appliance = self.appliance.lock().await;
        let t = appliance.fire(Trigger::Stop);
        if t.is_forbidden() {
            return Err(MicrowaveError::operation(t.message));
        }
        if t.ends_cooking() {
            appliance.remaining = CookTime::ZERO;
            let food = appliance.food_kind();
            if let Some(session) = appliance.session.take() {
                let record = session.finish(CookOutcome::Stopped, food);
                tracing::info!(session_id = %record.session_id, ticks = record.ticks, "cook session stopped");
                self.events.publish(CookEvent::Finished(record));
            }
        }
        Ok(t)
    }

    /// Start with the high heat rate, then put the normal rate back as soon
    /// as `start` returns. The session keeps the rate it started with, so
    /// the boost lasts for this one cook cycle.
    #[tracing::instrument(skip(self))]
    pub async fn high_power_start(&self) -> Result<Transition, MicrowaveError> {
        self.appliance.lock().await.heat_rate = self.settings.high_power_heat_rate;
        let result = self.start().await;
        self.appliance.lock().await.heat_rate = self.settings.heat_rate;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn wait_finished(rx: &mut broadcast::Receiver<CookEvent>) -> crate::state_machine::CookRecord {
        loop {
            if let CookEvent::Finished(record) = rx.recv().await.unwrap() {
                return record;
            }
        }
    }

    async fn loaded(kind: FoodKind) -> Microwave {
        let mw = Microwave::default();
        mw.open_door().await;
        mw.put_food(Food::new(kind)).await.unwrap();
        mw.close_door().await;
        mw
    }

    #[tokio::test]
    async fn starts_closed_and_empty() {
        let status = Microwave::default().status().await;
        assert_eq!(status.state, DoorState::Closed);
        assert_eq!(status.time.to_string(), "0:00");
        assert_eq!(status.food, None);
        assert_eq!(status.heat_rate, DEFAULT_HEAT_RATE);
    }

    #[tokio::test]
    async fn put_and_take_out_uncooked_bread() {
        let mw = Microwave::default();
        let t = mw.open_door().await;
        assert_eq!(t.to, DoorState::Open);

        mw.put_food(Food::new(FoodKind::Bread)).await.unwrap();
        assert_eq!(mw.status().await.food, Some(FoodKind::Bread));

        let food = mw.take_out_food().await.unwrap();
        assert_eq!(food.kind(), FoodKind::Bread);
        assert_eq!(food.temperature(), 300.0);
        assert_eq!(mw.status().await.food, None);
    }

    #[tokio::test]
    async fn put_requires_open_door_and_empty_slot() {
        let mw = Microwave::default();
        let err = mw.put_food(Food::new(FoodKind::Milk)).await.unwrap_err();
        assert!(matches!(err, MicrowaveError::InvalidOperation(_)));
        assert_eq!(mw.status().await.food, None);

        mw.open_door().await;
        mw.put_food(Food::new(FoodKind::Milk)).await.unwrap();
        let err = mw.put_food(Food::new(FoodKind::Meat)).await.unwrap_err();
        assert!(matches!(err, MicrowaveError::InvalidOperation(_)));
        assert_eq!(mw.status().await.food, Some(FoodKind::Milk));
    }

    #[tokio::test]
    async fn take_out_requires_open_door_and_food() {
        let mw = Microwave::default();
        mw.open_door().await;
        let err = mw.take_out_food().await.unwrap_err();
        assert!(matches!(err, MicrowaveError::InvalidOperation(_)));

        mw.put_food(Food::new(FoodKind::Meat)).await.unwrap();
        mw.close_door().await;
        let err = mw.take_out_food().await.unwrap_err();
        assert!(matches!(err, MicrowaveError::InvalidOperation(_)));
        assert_eq!(mw.status().await.food, Some(FoodKind::Meat));
    }

    #[tokio::test(start_paused = true)]
    async fn food_is_locked_in_while_cooking() {
        let mw = loaded(FoodKind::Bread).await;
        mw.set_preset_time("5").await.unwrap();
        mw.start().await.unwrap();

        assert!(mw.open_door().await.is_forbidden());
        assert!(mw.take_out_food().await.is_err());
        assert!(mw.put_food(Food::new(FoodKind::Milk)).await.is_err());
        assert_eq!(mw.status().await.food, Some(FoodKind::Bread));
        mw.stop().await.unwrap();
    }

    #[tokio::test]
    async fn set_preset_time_validates_input() {
        let mw = Microwave::default();
        mw.set_preset_time("90").await.unwrap();

        for input in ["-1", "3600", "abc", ""] {
            let err = mw.set_preset_time(input).await.unwrap_err();
            assert!(matches!(err, MicrowaveError::InvalidInput(_)));
        }

        let status = mw.status().await;
        assert_eq!(status.state, DoorState::Closed);
        assert_eq!(status.time.to_string(), "1:30");
    }

    #[tokio::test]
    async fn add_thirty_seconds_is_unbounded() {
        let mw = Microwave::default();
        mw.set_preset_time("3599").await.unwrap();
        let time = mw.add_thirty_seconds().await;
        assert_eq!(time.as_secs(), 3629);
        assert_eq!(mw.status().await.preset.as_secs(), 3629);
    }

    #[tokio::test]
    async fn start_with_door_open_is_refused() {
        let mw = Microwave::default();
        mw.open_door().await;
        let err = mw.start().await.unwrap_err();
        assert!(matches!(err, MicrowaveError::InvalidOperation(_)));
        assert_eq!(mw.status().await.state, DoorState::Open);
    }

    #[tokio::test]
    async fn stop_when_idle() {
        let mw = Microwave::default();
        let t = mw.stop().await.unwrap();
        assert_eq!(t.effect, Effect::Unchanged);
        assert_eq!(t.to, DoorState::Closed);

        mw.open_door().await;
        assert!(mw.stop().await.is_err());
        assert_eq!(mw.status().await.state, DoorState::Open);
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_runs_to_completion() {
        let mw = Microwave::default();
        mw.set_preset_time("10").await.unwrap();
        mw.start().await.unwrap();
        assert_eq!(mw.status().await.state, DoorState::Cooking);

        tokio::time::sleep(Duration::from_millis(9_500)).await;
        let status = mw.status().await;
        assert_eq!(status.state, DoorState::Cooking);
        assert_eq!(status.time.as_secs(), 1);

        tokio::time::sleep(Duration::from_secs(1)).await;
        let status = mw.status().await;
        assert_eq!(status.state, DoorState::Closed);
        assert_eq!(status.time, CookTime::ZERO);
        assert_eq!(status.preset.as_secs(), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn remaining_time_decreases_every_tick() {
        let mw = Microwave::default();
        let mut rx = mw.subscribe();
        mw.set_preset_time("4").await.unwrap();
        mw.start().await.unwrap();

        let mut seen = Vec::new();
        loop {
            match rx.recv().await.unwrap() {
                CookEvent::Started { remaining, .. } => assert_eq!(remaining.as_secs(), 4),
                CookEvent::Tick { remaining, .. } => seen.push(remaining.as_secs()),
                CookEvent::Finished(record) => {
                    assert_eq!(record.outcome, CookOutcome::Completed);
                    assert_eq!(record.ticks, 4);
                    break;
                }
            }
        }
        assert_eq!(seen, vec![3, 2, 1, 0]);
        assert_eq!(mw.status().await.state, DoorState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_interrupts_countdown() {
        let mw = loaded(FoodKind::Bread).await;
        let mut rx = mw.subscribe();
        mw.set_preset_time("10").await.unwrap();
        mw.start().await.unwrap();

        tokio::time::sleep(Duration::from_millis(5_500)).await;
        assert_eq!(mw.status().await.time.as_secs(), 5);

        let t = mw.stop().await.unwrap();
        assert_eq!(t.to, DoorState::Closed);
        let status = mw.status().await;
        assert_eq!(status.state, DoorState::Closed);
        assert_eq!(status.time, CookTime::ZERO);

        let record = wait_finished(&mut rx).await;
        assert_eq!(record.outcome, CookOutcome::Stopped);
        assert_eq!(record.ticks, 5);

        // The countdown must not touch anything after the stop.
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(mw.status().await.time, CookTime::ZERO);
        mw.open_door().await;
        let food = mw.take_out_food().await.unwrap();
        assert_eq!(food.temperature(), 302.5);
    }

    #[tokio::test(start_paused = true)]
    async fn cooked_meat_is_warmer() {
        let mw = Microwave::default();
        let mut rx = mw.subscribe();
        mw.open_door().await;
        mw.put_food(Food::new(FoodKind::Meat)).await.unwrap();
        mw.close_door().await;
        mw.set_preset_time("3").await.unwrap();
        mw.start().await.unwrap();

        let record = wait_finished(&mut rx).await;
        assert_eq!(record.outcome, CookOutcome::Completed);
        assert_eq!(record.food, Some(FoodKind::Meat));

        assert_eq!(mw.open_door().await.to, DoorState::Open);
        let food = mw.take_out_food().await.unwrap();
        assert_eq!(food.kind(), FoodKind::Meat);
        assert_eq!(food.temperature(), 301.5);
    }

    #[tokio::test(start_paused = true)]
    async fn second_start_does_not_spawn_another_countdown() {
        let mw = loaded(FoodKind::Milk).await;
        let mut rx = mw.subscribe();
        mw.set_preset_time("3").await.unwrap();
        mw.start().await.unwrap();

        let err = mw.start().await.unwrap_err();
        assert!(matches!(err, MicrowaveError::InvalidOperation(_)));

        let mut ticks = 0;
        let mut starts = 0;
        loop {
            match rx.recv().await.unwrap() {
                CookEvent::Started { .. } => starts += 1,
                CookEvent::Tick { .. } => ticks += 1,
                CookEvent::Finished(_) => break,
            }
        }
        assert_eq!(starts, 1);
        assert_eq!(ticks, 3);

        mw.open_door().await;
        assert_eq!(mw.take_out_food().await.unwrap().temperature(), 301.5);
    }

    #[tokio::test(start_paused = true)]
    async fn set_preset_time_refused_while_cooking() {
        let mw = Microwave::default();
        mw.set_preset_time("20").await.unwrap();
        mw.start().await.unwrap();

        let err = mw.set_preset_time("5").await.unwrap_err();
        assert!(matches!(err, MicrowaveError::InvalidOperation(_)));
        assert_eq!(mw.status().await.preset.as_secs(), 20);
        mw.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn add_thirty_seconds_extends_running_countdown() {
        let mw = Microwave::default();
        let mut rx = mw.subscribe();
        mw.set_preset_time("2").await.unwrap();
        mw.start().await.unwrap();
        assert_eq!(mw.add_thirty_seconds().await.as_secs(), 32);

        let record = wait_finished(&mut rx).await;
        assert_eq!(record.outcome, CookOutcome::Completed);
        assert_eq!(record.ticks, 32);
        assert_eq!(mw.status().await.preset.as_secs(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_preset_completes_without_heating() {
        let mw = loaded(FoodKind::Bread).await;
        let mut rx = mw.subscribe();
        mw.start().await.unwrap();

        let record = wait_finished(&mut rx).await;
        assert_eq!(record.outcome, CookOutcome::Completed);
        assert_eq!(record.ticks, 0);
        assert_eq!(mw.status().await.state, DoorState::Closed);

        mw.open_door().await;
        assert_eq!(mw.take_out_food().await.unwrap().temperature(), 300.0);
    }

    #[tokio::test(start_paused = true)]
    async fn high_power_applies_to_one_cycle() {
        let mw = loaded(FoodKind::Milk).await;
        let mut rx = mw.subscribe();

        mw.set_preset_time("2").await.unwrap();
        mw.high_power_start().await.unwrap();
        assert_eq!(mw.status().await.heat_rate, DEFAULT_HEAT_RATE);
        let record = wait_finished(&mut rx).await;
        assert_eq!(record.heat_rate, HIGH_POWER_HEAT_RATE);

        mw.set_preset_time("2").await.unwrap();
        mw.start().await.unwrap();
        let record = wait_finished(&mut rx).await;
        assert_eq!(record.heat_rate, DEFAULT_HEAT_RATE);

        mw.open_door().await;
        assert_eq!(mw.take_out_food().await.unwrap().temperature(), 303.0);
    }

    #[tokio::test]
    async fn high_power_start_refused_still_reverts_rate() {
        let mw = Microwave::default();
        mw.open_door().await;
        assert!(mw.high_power_start().await.is_err());
        assert_eq!(mw.status().await.heat_rate, DEFAULT_HEAT_RATE);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_after_stop_runs_fresh_session() {
        let mw = loaded(FoodKind::Meat).await;
        let mut rx = mw.subscribe();

        mw.set_preset_time("5").await.unwrap();
        mw.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(2_500)).await;
        mw.stop().await.unwrap();
        let first = wait_finished(&mut rx).await;
        assert_eq!(first.ticks, 2);

        mw.set_preset_time("3").await.unwrap();
        mw.start().await.unwrap();
        let second = wait_finished(&mut rx).await;
        assert_ne!(first.session_id, second.session_id);
        assert_eq!(second.ticks, 3);

        mw.open_door().await;
        assert_eq!(mw.take_out_food().await.unwrap().temperature(), 302.5);
    }

    #[test]
    fn status_display() {
        let status = Status {
            state: DoorState::Open,
            time: CookTime::from_secs(75),
            preset: CookTime::from_secs(75),
            food: Some(FoodKind::Bread),
            heat_rate: DEFAULT_HEAT_RATE,
        };
        assert_eq!(
            status.to_string(),
            "Microwave: Open\nPreset Cook Time: 1:15\nFood: BREAD"
        );

        let empty = Status { food: None, ..status };
        assert!(empty.to_string().ends_with("Empty"));
    }
}
