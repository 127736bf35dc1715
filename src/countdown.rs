//! Background countdown for one cook session.
//!
//! Each tick the countdown heats the food and decrements the remaining time.
//! It exits when the remaining time reaches zero (and closes the session
//! itself) or as soon as the session's cancellation token fires.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::cook_time::CookTime;
use crate::events::{CookEvent, EventBus};
use crate::microwave::Appliance;
use crate::state_machine::{CookOutcome, CookSession, DoorState, Trigger};

enum Step {
    Continue,
    Done,
}

pub(crate) struct Countdown {
    appliance: Arc<Mutex<Appliance>>,
    events: EventBus,
    session_id: Uuid,
    cancel: CancellationToken,
    tick: Duration,
}

impl Countdown {
    pub(crate) fn spawn(
        appliance: Arc<Mutex<Appliance>>,
        events: EventBus,
        session: &CookSession,
        tick: Duration,
    ) -> JoinHandle<()> {
        let countdown = Self {
            appliance,
            events,
            session_id: session.id,
            cancel: session.cancel.clone(),
            tick,
        };
        tokio::spawn(countdown.run())
    }

    #[tracing::instrument(name = "countdown", skip(self), fields(session_id = %self.session_id))]
    async fn run(self) {
        loop {
            if let Step::Done = self.complete_if_elapsed().await {
                return;
            }
            tokio::select! {
                () = self.cancel.cancelled() => {
                    tracing::debug!("countdown cancelled");
                    return;
                }
                () = tokio::time::sleep(self.tick) => {}
            }
            if let Step::Done = self.advance().await {
                return;
            }
        }
    }

    /// Whether the appliance is still running this countdown's session.
    fn owns(&self, appliance: &Appliance) -> bool {
        !self.cancel.is_cancelled()
            && appliance
                .session
                .as_ref()
                .is_some_and(|s| s.id == self.session_id)
    }

    /// One elapsed tick: heat the food and take a second off.
    async fn advance(&self) -> Step {
        let mut guard = self.appliance.lock().await;
        let appliance = &mut *guard;
        if !self.owns(appliance) {
            tracing::debug!("session ended before tick");
            return Step::Done;
        }
        if appliance.state != DoorState::Cooking {
            appliance.remaining = CookTime::ZERO;
            return Step::Done;
        }
        let Some(session) = appliance.session.as_mut() else {
            return Step::Done;
        };

        session.ticks += 1;
        let temperature = appliance.food.as_mut().map(|food| {
            food.heat(session.heat_rate);
            food.temperature()
        });
        appliance.remaining = appliance.remaining.decrement();

        tracing::debug!(remaining = %appliance.remaining, ?temperature, "tick");
        self.events.publish(CookEvent::Tick {
            session_id: self.session_id,
            remaining: appliance.remaining,
            temperature,
        });
        Step::Continue
    }

    /// Close the session once the remaining time has run out.
    async fn complete_if_elapsed(&self) -> Step {
        let mut appliance = self.appliance.lock().await;
        if !self.owns(&appliance) {
            return Step::Done;
        }
        if !appliance.remaining.is_zero() {
            return Step::Continue;
        }

        appliance.fire(Trigger::Stop);
        let food = appliance.food_kind();
        if let Some(session) = appliance.session.take() {
            let record = session.finish(CookOutcome::Completed, food);
            tracing::info!(ticks = record.ticks, heat = record.heat_delivered(), "cook completed");
            self.events.publish(CookEvent::Finished(record));
        }
        Step::Done
    }
}
