use crate::communication::channels::RelayInputs;
use crate::communication::messages::PhaseEvent;
use crate::models::intersection::{IntersectionId, LightState};
use crate::monitoring::event_log::SimEvent;
use crate::simulation_engine::context::SimContext;
use log::{debug, info, warn};
use std::sync::Arc;
use tokio::time::sleep;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    pub applied: u64,
    pub discarded: u64,
}

/// Applies phase events from both authorities to the shared intersections
/// and wakes vehicles blocked on a newly green axis.
pub struct Relay {
    ctx: Arc<SimContext>,
    inputs: RelayInputs,
    stats: RelayStats,
}

impl Relay {
    pub fn new(ctx: Arc<SimContext>, inputs: RelayInputs) -> Self {
        Self {
            ctx,
            inputs,
            stats: RelayStats::default(),
        }
    }

    /// Applies one event under the target intersection's lock. Events for an
    /// intersection in emergency mode are dropped so the corridor pattern
    /// stays intact. Returns whether the event was applied.
    pub fn apply(&mut self, source: IntersectionId, event: PhaseEvent) -> bool {
        if event.intersection != source {
            warn!("[RELAY] {event} arrived on the {source} channel, ignoring");
            self.stats.discarded += 1;
            return false;
        }

        let intersection = self.ctx.intersection(source);
        {
            let mut state = intersection.lock();
            if state.is_emergency() {
                debug!("[RELAY] {event} discarded, {source} is in emergency mode");
                self.stats.discarded += 1;
                return false;
            }
            match event.light {
                LightState::Green => state.open_axis(event.axis),
                light => state.set_axis_light(event.axis, light),
            }
        }

        self.stats.applied += 1;
        self.ctx.emit(SimEvent::LightChanged {
            intersection: source,
            axis: event.axis,
            light: event.light,
        });
        if event.light == LightState::Green {
            intersection.wake_axis(event.axis);
        }
        true
    }

    /// Multiplexes both event channels with a bounded wait so the shutdown
    /// flag is seen even when no events arrive. A closed channel is logged
    /// once and then ignored.
    pub async fn run(mut self) -> RelayStats {
        let poll = self.ctx.config().relay_poll();
        let mut f10_open = true;
        let mut f11_open = true;

        while !self.ctx.is_shutting_down() {
            tokio::select! {
                received = self.inputs.f10.recv(), if f10_open => match received {
                    Some(event) => {
                        self.apply(IntersectionId::F10, event);
                    }
                    None => {
                        warn!("[RELAY] F10 event channel closed");
                        f10_open = false;
                    }
                },
                received = self.inputs.f11.recv(), if f11_open => match received {
                    Some(event) => {
                        self.apply(IntersectionId::F11, event);
                    }
                    None => {
                        warn!("[RELAY] F11 event channel closed");
                        f11_open = false;
                    }
                },
                _ = sleep(poll) => {}
            }
        }

        info!(
            "[RELAY] stopping: {} events applied, {} discarded",
            self.stats.applied, self.stats.discarded
        );
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::communication::channels::open_channels;
    use crate::config::SimulationConfig;
    use crate::models::intersection::{Axis, EmergencyRoute, Side};
    use crate::monitoring::event_log::RecordingSink;
    use std::time::Duration;

    fn setup() -> (Arc<SimContext>, Relay) {
        let channels = open_channels(16).unwrap();
        let ctx = Arc::new(SimContext::new(
            SimulationConfig::default(),
            channels.control,
            Arc::new(RecordingSink::new()),
        ));
        let relay = Relay::new(Arc::clone(&ctx), channels.relay);
        (ctx, relay)
    }

    #[test]
    fn green_opens_axis_and_closes_the_other() {
        let (ctx, mut relay) = setup();
        assert!(relay.apply(
            IntersectionId::F10,
            PhaseEvent::new(IntersectionId::F10, Axis::NorthSouth, LightState::Green)
        ));
        let snapshot = ctx.intersection(IntersectionId::F10).snapshot();
        assert_eq!(snapshot.light(Side::North), LightState::Green);
        assert_eq!(snapshot.light(Side::South), LightState::Green);
        assert_eq!(snapshot.light(Side::East), LightState::Red);

        assert!(relay.apply(
            IntersectionId::F10,
            PhaseEvent::new(IntersectionId::F10, Axis::NorthSouth, LightState::Yellow)
        ));
        let state = ctx.intersection(IntersectionId::F10).lock();
        assert_eq!(state.light(Side::North), LightState::Yellow);
        assert!(state.signals_consistent());
    }

    #[test]
    fn events_are_dropped_during_an_emergency() {
        let (ctx, mut relay) = setup();
        ctx.intersection(IntersectionId::F11)
            .lock()
            .apply_corridor(EmergencyRoute {
                entry: Side::West,
                exit: Side::East,
            });
        assert!(!relay.apply(
            IntersectionId::F11,
            PhaseEvent::new(IntersectionId::F11, Axis::NorthSouth, LightState::Green)
        ));
        let snapshot = ctx.intersection(IntersectionId::F11).snapshot();
        assert_eq!(snapshot.light(Side::North), LightState::Red);
        assert_eq!(snapshot.light(Side::West), LightState::Green);
        assert_eq!(relay.stats.discarded, 1);
    }

    #[test]
    fn mismatched_source_is_ignored() {
        let (ctx, mut relay) = setup();
        assert!(!relay.apply(
            IntersectionId::F10,
            PhaseEvent::new(IntersectionId::F11, Axis::EastWest, LightState::Green)
        ));
        assert!(ctx.intersection(IntersectionId::F11).snapshot().all_red());
    }

    #[tokio::test(start_paused = true)]
    async fn run_applies_in_arrival_order_and_stops_on_shutdown() {
        let channels = open_channels(16).unwrap();
        let ctx = Arc::new(SimContext::new(
            SimulationConfig::default(),
            channels.control.clone(),
            Arc::new(RecordingSink::new()),
        ));
        let events = channels.f10_authority.events.clone();
        let handle = tokio::spawn(Relay::new(Arc::clone(&ctx), channels.relay).run());

        for light in [LightState::Green, LightState::Yellow, LightState::Red] {
            events
                .send(PhaseEvent::new(IntersectionId::F10, Axis::EastWest, light))
                .await
                .unwrap();
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(ctx.intersection(IntersectionId::F10).snapshot().all_red());

        ctx.begin_shutdown();
        let stats = handle.await.unwrap();
        assert_eq!(stats.applied, 3);
    }
}
