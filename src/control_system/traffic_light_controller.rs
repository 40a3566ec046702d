use crate::communication::channels::AuthorityLink;
use crate::communication::messages::{ControlSignal, PhaseEvent};
use crate::config::SimulationConfig;
use crate::models::intersection::{Axis, CorridorDirection, IntersectionId, LightState};
use log::{debug, info};
use std::time::Duration;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::{Receiver, Sender};
use tokio::time::sleep;

/// One step of the fixed signal cycle. The RED steps are transient: they
/// are emitted and immediately followed by the next axis' GREEN.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    NorthSouthGreen,
    NorthSouthYellow,
    NorthSouthRed,
    EastWestGreen,
    EastWestYellow,
    EastWestRed,
}

impl Phase {
    pub fn axis(self) -> Axis {
        match self {
            Phase::NorthSouthGreen | Phase::NorthSouthYellow | Phase::NorthSouthRed => {
                Axis::NorthSouth
            }
            Phase::EastWestGreen | Phase::EastWestYellow | Phase::EastWestRed => Axis::EastWest,
        }
    }

    pub fn light(self) -> LightState {
        match self {
            Phase::NorthSouthGreen | Phase::EastWestGreen => LightState::Green,
            Phase::NorthSouthYellow | Phase::EastWestYellow => LightState::Yellow,
            Phase::NorthSouthRed | Phase::EastWestRed => LightState::Red,
        }
    }

    pub fn next(self) -> Phase {
        match self {
            Phase::NorthSouthGreen => Phase::NorthSouthYellow,
            Phase::NorthSouthYellow => Phase::NorthSouthRed,
            Phase::NorthSouthRed => Phase::EastWestGreen,
            Phase::EastWestGreen => Phase::EastWestYellow,
            Phase::EastWestYellow => Phase::EastWestRed,
            Phase::EastWestRed => Phase::NorthSouthGreen,
        }
    }

    pub fn duration(self, timing: &PhaseTiming) -> Duration {
        match self.light() {
            LightState::Green => timing.green,
            LightState::Yellow => timing.yellow,
            LightState::Red => Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTiming {
    pub green: Duration,
    pub yellow: Duration,
    /// Poll interval while cycling is suspended by an emergency.
    pub suspended_poll: Duration,
}

impl From<&SimulationConfig> for PhaseTiming {
    fn from(config: &SimulationConfig) -> Self {
        Self {
            green: config.green(),
            yellow: config.yellow(),
            suspended_poll: config.authority_suspended_poll(),
        }
    }
}

/// Why an authority stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorityExit {
    Shutdown,
    ControlClosed,
    RelayClosed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthorityReport {
    pub intersection: IntersectionId,
    pub cycles: u64,
    pub exit: AuthorityExit,
}

/// Drives one intersection's fixed cycle. It owns nothing shared: it only
/// reads its control channel and writes phase events for the relay.
#[derive(Debug)]
pub struct PhaseAuthority {
    intersection: IntersectionId,
    timing: PhaseTiming,
    control: Receiver<ControlSignal>,
    events: Sender<PhaseEvent>,
    phase: Phase,
    suspended: Option<CorridorDirection>,
    cycles: u64,
}

impl PhaseAuthority {
    pub fn new(link: AuthorityLink, timing: PhaseTiming) -> Self {
        Self {
            intersection: link.intersection,
            timing,
            control: link.control,
            events: link.events,
            phase: Phase::NorthSouthGreen,
            suspended: None,
            cycles: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended.is_some()
    }

    /// Drains every pending control token without blocking.
    fn poll_control(&mut self) -> Option<AuthorityExit> {
        loop {
            match self.control.try_recv() {
                Ok(ControlSignal::Shutdown) => return Some(AuthorityExit::Shutdown),
                Ok(ControlSignal::Emergency(direction)) => {
                    info!(
                        "[CONTROLLER] {} received {direction} emergency, suspending cycle",
                        self.intersection
                    );
                    self.suspended = Some(direction);
                }
                Ok(ControlSignal::EmergencyClear) => {
                    if self.suspended.take().is_some() {
                        info!(
                            "[CONTROLLER] {} received emergency clear, restarting cycle",
                            self.intersection
                        );
                        self.phase = Phase::NorthSouthGreen;
                    }
                }
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Disconnected) => return Some(AuthorityExit::ControlClosed),
            }
        }
    }

    /// One loop iteration: check control, then either idle while suspended
    /// or emit the current phase and hold it for its full duration.
    pub async fn step(&mut self) -> Option<AuthorityExit> {
        if let Some(exit) = self.poll_control() {
            return Some(exit);
        }
        if self.suspended.is_some() {
            sleep(self.timing.suspended_poll).await;
            return None;
        }

        let event = PhaseEvent::new(self.intersection, self.phase.axis(), self.phase.light());
        debug!("[LIGHT] {event}");
        if self.events.send(event).await.is_err() {
            return Some(AuthorityExit::RelayClosed);
        }
        if self.phase == Phase::NorthSouthGreen {
            self.cycles += 1;
        }

        let hold = self.phase.duration(&self.timing);
        if !hold.is_zero() {
            sleep(hold).await;
        }
        self.phase = self.phase.next();
        None
    }

    pub async fn run(mut self) -> AuthorityReport {
        info!("[CONTROLLER] {} phase authority started", self.intersection);
        let exit = loop {
            if let Some(exit) = self.step().await {
                break exit;
            }
        };
        info!(
            "[CONTROLLER] {} phase authority stopping ({exit:?}) after {} cycles",
            self.intersection, self.cycles
        );
        AuthorityReport {
            intersection: self.intersection,
            cycles: self.cycles,
            exit,
        }
    }
}
