use crate::communication::messages::{ControlSignal, PhaseEvent};
use crate::error::SimulationError;
use crate::models::intersection::IntersectionId;
use log::warn;
use tokio::sync::mpsc::{self, error::TrySendError, Receiver, Sender};

/// Sending half of both authorities' control channels.
#[derive(Debug, Clone)]
pub struct ControlBus {
    f10: Sender<ControlSignal>,
    f11: Sender<ControlSignal>,
}

impl ControlBus {
    /// Non-blocking send. A full or closed channel is logged and reported as
    /// `false`; the authority behind it is either busy or already gone.
    pub fn send(&self, target: IntersectionId, signal: ControlSignal) -> bool {
        let sender = match target {
            IntersectionId::F10 => &self.f10,
            IntersectionId::F11 => &self.f11,
        };
        match sender.try_send(signal) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!("control channel to {target} is full, dropped {signal}");
                false
            }
            Err(TrySendError::Closed(_)) => {
                warn!("control channel to {target} is closed, dropped {signal}");
                false
            }
        }
    }

    pub fn broadcast(&self, signal: ControlSignal) {
        for target in IntersectionId::ALL {
            self.send(target, signal);
        }
    }
}

/// Everything one phase authority is allowed to touch.
#[derive(Debug)]
pub struct AuthorityLink {
    pub intersection: IntersectionId,
    pub control: Receiver<ControlSignal>,
    pub events: Sender<PhaseEvent>,
}

/// Receiving halves of both phase-event channels, owned by the relay.
#[derive(Debug)]
pub struct RelayInputs {
    pub f10: Receiver<PhaseEvent>,
    pub f11: Receiver<PhaseEvent>,
}

#[derive(Debug)]
pub struct ChannelSet {
    pub control: ControlBus,
    pub f10_authority: AuthorityLink,
    pub f11_authority: AuthorityLink,
    pub relay: RelayInputs,
}

/// Creates the two control channels and two phase-event channels.
pub fn open_channels(capacity: usize) -> Result<ChannelSet, SimulationError> {
    if capacity == 0 {
        return Err(SimulationError::ChannelSetup {
            reason: "channel capacity must be at least 1".to_string(),
        });
    }

    let (f10_control_tx, f10_control_rx) = mpsc::channel(capacity);
    let (f11_control_tx, f11_control_rx) = mpsc::channel(capacity);
    let (f10_events_tx, f10_events_rx) = mpsc::channel(capacity);
    let (f11_events_tx, f11_events_rx) = mpsc::channel(capacity);

    Ok(ChannelSet {
        control: ControlBus {
            f10: f10_control_tx,
            f11: f11_control_tx,
        },
        f10_authority: AuthorityLink {
            intersection: IntersectionId::F10,
            control: f10_control_rx,
            events: f10_events_tx,
        },
        f11_authority: AuthorityLink {
            intersection: IntersectionId::F11,
            control: f11_control_rx,
            events: f11_events_tx,
        },
        relay: RelayInputs {
            f10: f10_events_rx,
            f11: f11_events_rx,
        },
    })
}
