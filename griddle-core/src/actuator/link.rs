//! Claim / dispatch / release / await over a register bus

use std::thread;
use std::time::{Duration, Instant};

use griddle_protocol::registers::{
    BUSY_CLAIMED, BUSY_FREE, ESTOP_TRIGGER, POSE_REGISTERS, REG_BUSY, REG_COMMAND,
    REG_CURRENT_POSE, REG_ESTOP, REG_TARGET_POSE,
};
use griddle_protocol::{Pose, RobotCommand};
use tracing::{debug, info, trace, warn};

use super::error::ActuatorError;
use crate::config::RobotConfig;
use crate::traits::{BusError, RefreshOutcome, RegisterBus, RobotArm};

/// Protocol tunables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkConfig {
    /// Sleep after every busy-flag read
    pub poll_interval: Duration,
    /// Optional limit on waiting for the robot to clear the command
    pub completion_timeout: Option<Duration>,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(10),
            completion_timeout: None,
        }
    }
}

impl From<&RobotConfig> for LinkConfig {
    fn from(config: &RobotConfig) -> Self {
        Self {
            poll_interval: config.poll_interval,
            completion_timeout: config.completion_timeout,
        }
    }
}

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Connected,
    Disconnected,
}

/// Stage of the current (or last) request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestPhase {
    #[default]
    Idle,
    Claiming,
    Claimed,
    Dispatched,
    AwaitingCompletion,
    Failed,
}

/// The one connection to the robot controller
///
/// Owns the register bus session for the life of the process. All robot
/// motion is serialized through it; calls block the control thread until
/// the robot has finished (or the request failed).
#[derive(Debug)]
pub struct ActuatorLink<B> {
    bus: B,
    config: LinkConfig,
    state: LinkState,
    phase: RequestPhase,
    claimed: bool,
}

impl<B: RegisterBus> ActuatorLink<B> {
    /// Open the session
    pub fn connect(mut bus: B, config: LinkConfig) -> Result<Self, ActuatorError> {
        info!("Connecting to robot controller");
        bus.connect().map_err(ActuatorError::Connection)?;
        debug!(
            "Robot link up (poll {:?}, completion timeout {:?})",
            config.poll_interval, config.completion_timeout
        );

        Ok(Self {
            bus,
            config,
            state: LinkState::Connected,
            phase: RequestPhase::Idle,
            claimed: false,
        })
    }

    /// Session state
    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Stage of the current or last request
    pub fn phase(&self) -> RequestPhase {
        self.phase
    }

    /// Check if this host last set the busy flag and has not cleared it
    pub fn holds_claim(&self) -> bool {
        self.claimed
    }

    /// Protocol tunables
    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Underlying bus
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Close the session
    pub fn close(&mut self) {
        info!("Closing robot connection");
        self.bus.close();
        self.state = LinkState::Disconnected;
    }

    /// Wait for the busy flag to read free, then set it
    ///
    /// Sleeps for the poll interval after every read, including the one
    /// that finds the flag free.
    pub fn claim(&mut self) -> Result<(), ActuatorError> {
        let mut polls = 0u32;
        loop {
            let read = self.bus.read_registers(REG_BUSY, 1);
            thread::sleep(self.config.poll_interval);
            polls += 1;

            let busy = read
                .and_then(|words| single(&words))
                .map_err(ActuatorError::ClaimReadFailed)?;
            if busy == BUSY_FREE {
                break;
            }
        }
        trace!("Busy flag free after {} polls", polls);

        self.bus
            .write_register(REG_BUSY, BUSY_CLAIMED)
            .and_then(|n| expect_written(n, 1))
            .map_err(ActuatorError::ClaimWriteFailed)?;
        self.claimed = true;
        Ok(())
    }

    /// Clear the busy flag
    pub fn release(&mut self) -> Result<(), ActuatorError> {
        self.bus
            .write_register(REG_BUSY, BUSY_FREE)
            .and_then(|n| expect_written(n, 1))
            .map_err(ActuatorError::ReleaseFailed)?;
        self.claimed = false;
        Ok(())
    }

    /// Write the target pose, then the command code
    ///
    /// Must hold the claim. On failure the claim is left held.
    pub fn dispatch(&mut self, command: RobotCommand, pose: Pose) -> Result<(), ActuatorError> {
        self.bus
            .write_registers(REG_TARGET_POSE, &pose.to_registers())
            .and_then(|n| expect_written(n, POSE_REGISTERS))
            .map_err(ActuatorError::WriteFailed)?;

        self.bus
            .write_register(REG_COMMAND, command.to_register())
            .and_then(|n| expect_written(n, 1))
            .map_err(ActuatorError::WriteFailed)
    }

    /// Read the robot's current pose; must hold the claim
    pub fn current_pose(&mut self) -> Result<Pose, ActuatorError> {
        let words = self
            .bus
            .read_registers(REG_CURRENT_POSE, POSE_REGISTERS as u16)
            .map_err(ActuatorError::ReadFailed)?;

        Pose::from_registers(&words).ok_or_else(|| {
            ActuatorError::ReadFailed(BusError::Protocol(format!(
                "expected {} pose registers, got {}",
                POSE_REGISTERS,
                words.len()
            )))
        })
    }

    /// Read the command register; must hold the claim
    pub fn pending_command(&mut self) -> Result<u16, ActuatorError> {
        self.bus
            .read_registers(REG_COMMAND, 1)
            .and_then(|words| single(&words))
            .map_err(ActuatorError::ReadFailed)
    }

    /// Poll the command register until the robot resets it to idle
    ///
    /// Each poll is a full claim / read / release round trip. Without a
    /// configured completion timeout this waits forever.
    pub fn await_completion(&mut self) -> Result<(), ActuatorError> {
        let started = Instant::now();
        let idle = RobotCommand::Wait.to_register();

        loop {
            self.claim()?;
            let command = self.pending_command();
            let released = self.release();
            let command = command?;
            released?;

            if command == idle {
                trace!("Robot finished after {:?}", started.elapsed());
                return Ok(());
            }
            trace!(
                "Robot still running {}",
                RobotCommand::from_register(command).map_or("unknown command", |c| c.name())
            );

            if let Some(limit) = self.config.completion_timeout {
                if started.elapsed() >= limit {
                    return Err(ActuatorError::CompletionTimeout(limit));
                }
            }
        }
    }

    /// Run one command to completion at an explicit pose
    pub fn execute(&mut self, command: RobotCommand, pose: Pose) -> Result<(), ActuatorError> {
        let result = self.run_request(command, pose);
        self.phase = match result {
            Ok(()) => RequestPhase::Idle,
            Err(_) => RequestPhase::Failed,
        };
        result
    }

    /// Run one command to completion at the robot's current pose
    pub fn execute_in_place(&mut self, command: RobotCommand) -> Result<(), ActuatorError> {
        self.phase = RequestPhase::Claiming;
        let pose = self
            .claim()
            .and_then(|()| self.current_pose())
            .and_then(|pose| self.release().map(|()| pose));

        match pose {
            Ok(pose) => self.execute(command, pose),
            Err(e) => {
                self.phase = RequestPhase::Failed;
                Err(e)
            }
        }
    }

    /// Write the emergency-stop register without claiming
    pub fn emergency_stop(&mut self) -> Result<(), ActuatorError> {
        warn!("Triggering robot emergency stop");
        self.bus
            .write_register(REG_ESTOP, ESTOP_TRIGGER)
            .and_then(|n| expect_written(n, 1))
            .map_err(ActuatorError::WriteFailed)
    }

    /// Keep-alive: read the busy flag, reconnecting if the session is gone
    ///
    /// A dropped or closed session is reopened, as is one whose last
    /// reconnect failed. Any other read failure is returned.
    pub fn refresh(&mut self) -> Result<RefreshOutcome, ActuatorError> {
        if self.state == LinkState::Connected {
            match self
                .bus
                .read_registers(REG_BUSY, 1)
                .and_then(|words| single(&words))
            {
                Ok(_) => return Ok(RefreshOutcome::Alive),
                Err(e) if e.is_dropped() || matches!(e, BusError::NotConnected) => {
                    warn!("Robot dropped connection. Reconnecting...");
                }
                Err(e) => return Err(ActuatorError::ReadFailed(e)),
            }
        } else {
            info!("Robot link down. Reconnecting...");
        }

        self.state = LinkState::Disconnected;
        self.bus.reconnect().map_err(ActuatorError::Connection)?;
        self.state = LinkState::Connected;
        info!("Robot connection restored");
        Ok(RefreshOutcome::Reconnected)
    }

    fn run_request(&mut self, command: RobotCommand, pose: Pose) -> Result<(), ActuatorError> {
        self.phase = RequestPhase::Claiming;
        self.claim()?;
        self.phase = RequestPhase::Claimed;
        self.dispatch(command, pose)?;
        self.phase = RequestPhase::Dispatched;
        self.release()?;
        self.phase = RequestPhase::AwaitingCompletion;
        self.await_completion()
    }

    /// Run a command with logging
    ///
    /// Poseless commands ignore `pose` and reuse the robot's current pose.
    fn perform(&mut self, command: RobotCommand, pose: Option<Pose>) -> Result<(), ActuatorError> {
        let target = pose.filter(|_| !command.is_poseless());
        let what = match target {
            Some(pose) => format!("{} at ({}, {}, {})", command.name(), pose.x, pose.y, pose.z),
            None => format!("{} position", command.name()),
        };

        info!("Moving robot to {}...", what);
        let result = match target {
            Some(pose) => self.execute(command, pose),
            None => self.execute_in_place(command),
        };
        match &result {
            Ok(()) => info!("Moving robot to {}: succeeded", what),
            Err(e) => warn!("Moving robot to {}: failed! ({}) {}", what, e.code(), e),
        }
        result
    }
}

impl<B: RegisterBus> RobotArm for ActuatorLink<B> {
    fn home(&mut self) -> Result<(), ActuatorError> {
        self.perform(RobotCommand::Home, None)
    }

    fn photo(&mut self) -> Result<(), ActuatorError> {
        self.perform(RobotCommand::Photo, None)
    }

    fn move_to(&mut self, pose: Pose) -> Result<(), ActuatorError> {
        self.perform(RobotCommand::MoveHere, Some(pose))
    }

    fn measure_temperature_at(&mut self, pose: Pose) -> Result<(), ActuatorError> {
        self.perform(RobotCommand::MeasureTemp, Some(pose))
    }

    fn flip(&mut self, pose: Pose) -> Result<(), ActuatorError> {
        self.perform(RobotCommand::Flip, Some(pose))
    }

    fn deposit(&mut self, pose: Pose) -> Result<(), ActuatorError> {
        self.perform(RobotCommand::Deposit, Some(pose))
    }

    fn emergency_stop(&mut self) -> Result<(), ActuatorError> {
        ActuatorLink::emergency_stop(self)
    }

    fn refresh(&mut self) -> Result<RefreshOutcome, ActuatorError> {
        ActuatorLink::refresh(self)
    }
}

/// Extract the value of a one-register read
fn single(words: &[u16]) -> Result<u16, BusError> {
    match words {
        [value] => Ok(*value),
        _ => Err(BusError::Protocol(format!(
            "expected 1 register, got {}",
            words.len()
        ))),
    }
}

fn expect_written(written: usize, expected: usize) -> Result<(), BusError> {
    if written == expected {
        Ok(())
    } else {
        Err(BusError::Protocol(format!(
            "expected {} registers written, server acknowledged {}",
            expected, written
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Op {
        Read(u16, u16),
        Write(u16, u16),
        WriteMany(u16, Vec<u16>),
        Connect,
        Close,
    }

    /// Register bus that replays scripted values and records every call
    #[derive(Default, Debug)]
    struct ScriptedBus {
        ops: Vec<Op>,
        /// Successive busy-flag values; 0 once exhausted
        busy: VecDeque<u16>,
        /// Successive command register values; 0 once exhausted
        commands: VecDeque<u16>,
        current_pose: [u16; 3],
        fail_write_to: Option<u16>,
        short_read_of: Option<u16>,
        next_read_error: Option<BusError>,
        fail_connect: bool,
    }

    impl RegisterBus for ScriptedBus {
        fn connect(&mut self) -> Result<(), BusError> {
            self.ops.push(Op::Connect);
            if self.fail_connect {
                Err(BusError::NotConnected)
            } else {
                Ok(())
            }
        }

        fn close(&mut self) {
            self.ops.push(Op::Close);
        }

        fn read_registers(&mut self, address: u16, count: u16) -> Result<Vec<u16>, BusError> {
            self.ops.push(Op::Read(address, count));
            if let Some(err) = self.next_read_error.take() {
                return Err(err);
            }
            if self.short_read_of == Some(address) {
                return Ok(Vec::new());
            }
            Ok(match address {
                REG_BUSY => vec![self.busy.pop_front().unwrap_or(0)],
                REG_COMMAND => vec![self.commands.pop_front().unwrap_or(0)],
                REG_CURRENT_POSE => self.current_pose.to_vec(),
                _ => vec![0; count as usize],
            })
        }

        fn write_register(&mut self, address: u16, value: u16) -> Result<usize, BusError> {
            self.ops.push(Op::Write(address, value));
            if self.fail_write_to == Some(address) {
                return Err(BusError::Timeout);
            }
            Ok(1)
        }

        fn write_registers(&mut self, address: u16, values: &[u16]) -> Result<usize, BusError> {
            self.ops.push(Op::WriteMany(address, values.to_vec()));
            if self.fail_write_to == Some(address) {
                return Err(BusError::Timeout);
            }
            Ok(values.len())
        }
    }

    fn fast() -> LinkConfig {
        LinkConfig {
            poll_interval: Duration::ZERO,
            completion_timeout: None,
        }
    }

    fn link_with(bus: ScriptedBus) -> ActuatorLink<ScriptedBus> {
        let mut link = ActuatorLink::connect(bus, fast()).unwrap();
        link.bus.ops.clear();
        link
    }

    #[test]
    fn test_connect_failure_is_connection_error() {
        let bus = ScriptedBus {
            fail_connect: true,
            ..Default::default()
        };
        let err = ActuatorLink::connect(bus, fast()).unwrap_err();
        assert!(matches!(err, ActuatorError::Connection(_)));
        assert_eq!(err.code(), -4);
    }

    #[test]
    fn test_claim_polls_until_free() {
        let mut link = link_with(ScriptedBus {
            busy: VecDeque::from([1, 1, 0]),
            ..Default::default()
        });

        link.claim().unwrap();

        assert_eq!(
            link.bus().ops,
            [
                Op::Read(REG_BUSY, 1),
                Op::Read(REG_BUSY, 1),
                Op::Read(REG_BUSY, 1),
                Op::Write(REG_BUSY, BUSY_CLAIMED),
            ]
        );
        assert!(link.holds_claim());
    }

    #[test]
    fn test_claim_read_error() {
        let mut link = link_with(ScriptedBus {
            next_read_error: Some(BusError::Timeout),
            ..Default::default()
        });
        let err = link.claim().unwrap_err();
        assert!(matches!(err, ActuatorError::ClaimReadFailed(BusError::Timeout)));
        assert_eq!(link.bus().ops, [Op::Read(REG_BUSY, 1)]);
        assert!(!link.holds_claim());
    }

    #[test]
    fn test_claim_short_read_is_fatal() {
        let mut link = link_with(ScriptedBus {
            short_read_of: Some(REG_BUSY),
            ..Default::default()
        });
        assert!(matches!(
            link.claim(),
            Err(ActuatorError::ClaimReadFailed(BusError::Protocol(_)))
        ));
    }

    #[test]
    fn test_claim_write_error() {
        let mut link = link_with(ScriptedBus {
            fail_write_to: Some(REG_BUSY),
            ..Default::default()
        });
        assert!(matches!(
            link.claim(),
            Err(ActuatorError::ClaimWriteFailed(_))
        ));
    }

    #[test]
    fn test_full_request_sequence() {
        let mut link = link_with(ScriptedBus {
            // Robot still executing on the first poll, idle on the second
            commands: VecDeque::from([RobotCommand::Flip.to_register(), 0]),
            ..Default::default()
        });
        let pose = Pose::new(10, -20, 5);

        link.flip(pose).unwrap();

        let round = [
            Op::Read(REG_BUSY, 1),
            Op::Write(REG_BUSY, BUSY_CLAIMED),
            Op::Read(REG_COMMAND, 1),
            Op::Write(REG_BUSY, BUSY_FREE),
        ];
        let mut expected = vec![
            Op::Read(REG_BUSY, 1),
            Op::Write(REG_BUSY, BUSY_CLAIMED),
            Op::WriteMany(REG_TARGET_POSE, vec![10, (-20i16) as u16, 5]),
            Op::Write(REG_COMMAND, RobotCommand::Flip.to_register()),
            Op::Write(REG_BUSY, BUSY_FREE),
        ];
        expected.extend(round.iter().cloned());
        expected.extend(round.iter().cloned());

        assert_eq!(link.bus().ops, expected);
        assert_eq!(link.phase(), RequestPhase::Idle);
        assert!(!link.holds_claim());
    }

    #[test]
    fn test_dispatch_write_failure_leaves_claim() {
        let mut link = link_with(ScriptedBus {
            fail_write_to: Some(REG_TARGET_POSE),
            ..Default::default()
        });

        let err = link.deposit(Pose::planar(1, 2)).unwrap_err();

        assert!(matches!(err, ActuatorError::WriteFailed(_)));
        assert_eq!(err.code(), -2);
        assert!(link.holds_claim());
        assert_eq!(link.phase(), RequestPhase::Failed);
        assert!(!link.bus().ops.contains(&Op::Write(REG_BUSY, BUSY_FREE)));
    }

    #[test]
    fn test_command_write_failure() {
        let mut link = link_with(ScriptedBus {
            fail_write_to: Some(REG_COMMAND),
            ..Default::default()
        });
        assert!(matches!(
            link.move_to(Pose::new(0, 0, 50)),
            Err(ActuatorError::WriteFailed(_))
        ));
        assert!(link.holds_claim());
    }

    #[test]
    fn test_home_reuses_current_pose() {
        let current = Pose::new(-100, 250, 80);
        let mut link = link_with(ScriptedBus {
            current_pose: current.to_registers(),
            ..Default::default()
        });

        link.home().unwrap();

        let ops = &link.bus().ops;
        assert_eq!(
            ops[..4],
            [
                Op::Read(REG_BUSY, 1),
                Op::Write(REG_BUSY, BUSY_CLAIMED),
                Op::Read(REG_CURRENT_POSE, 3),
                Op::Write(REG_BUSY, BUSY_FREE),
            ]
        );
        assert!(ops.contains(&Op::WriteMany(REG_TARGET_POSE, current.to_registers().to_vec())));
        assert!(ops.contains(&Op::Write(REG_COMMAND, RobotCommand::Home.to_register())));
    }

    #[test]
    fn test_poseless_command_ignores_given_pose() {
        let current = Pose::new(5, 6, 7);
        let mut link = link_with(ScriptedBus {
            current_pose: current.to_registers(),
            ..Default::default()
        });

        link.perform(RobotCommand::Photo, Some(Pose::new(100, 100, 100)))
            .unwrap();

        let ops = &link.bus().ops;
        assert_eq!(ops[2], Op::Read(REG_CURRENT_POSE, 3));
        assert!(ops.contains(&Op::WriteMany(REG_TARGET_POSE, current.to_registers().to_vec())));
    }

    #[test]
    fn test_release_failure() {
        let mut link = link_with(ScriptedBus::default());
        link.claim().unwrap();
        link.bus.fail_write_to = Some(REG_BUSY);
        assert!(matches!(link.release(), Err(ActuatorError::ReleaseFailed(_))));
        assert!(link.holds_claim());
    }

    #[test]
    fn test_await_read_error_is_surfaced_after_release() {
        let mut link = link_with(ScriptedBus {
            short_read_of: Some(REG_COMMAND),
            ..Default::default()
        });
        let err = link.await_completion().unwrap_err();
        assert!(matches!(err, ActuatorError::ReadFailed(_)));
        assert_eq!(link.bus().ops.last(), Some(&Op::Write(REG_BUSY, BUSY_FREE)));
    }

    #[test]
    fn test_completion_timeout() {
        let mut link = link_with(ScriptedBus {
            commands: VecDeque::from([5; 16]),
            ..Default::default()
        });
        link.config.completion_timeout = Some(Duration::ZERO);

        let err = link.await_completion().unwrap_err();
        assert!(matches!(err, ActuatorError::CompletionTimeout(_)));
        // One poll round, then give up
        assert_eq!(
            link.bus().ops.iter().filter(|op| **op == Op::Read(REG_COMMAND, 1)).count(),
            1
        );
    }

    #[test]
    fn test_emergency_stop_bypasses_claim() {
        let mut link = link_with(ScriptedBus {
            busy: VecDeque::from([1, 1, 1]),
            ..Default::default()
        });
        RobotArm::emergency_stop(&mut link).unwrap();
        assert_eq!(link.bus().ops, [Op::Write(REG_ESTOP, ESTOP_TRIGGER)]);
    }

    #[test]
    fn test_refresh_alive() {
        let mut link = link_with(ScriptedBus::default());
        assert_eq!(link.refresh().unwrap(), RefreshOutcome::Alive);
        assert_eq!(link.bus().ops, [Op::Read(REG_BUSY, 1)]);
    }

    #[test]
    fn test_refresh_reconnects_on_drop() {
        let mut link = link_with(ScriptedBus {
            next_read_error: Some(BusError::Dropped),
            ..Default::default()
        });
        assert_eq!(link.refresh().unwrap(), RefreshOutcome::Reconnected);
        assert_eq!(
            link.bus().ops,
            [Op::Read(REG_BUSY, 1), Op::Close, Op::Connect]
        );
        assert_eq!(link.state(), LinkState::Connected);
    }

    #[test]
    fn test_refresh_surfaces_other_errors() {
        let mut link = link_with(ScriptedBus {
            next_read_error: Some(BusError::Exception {
                function: 0x03,
                code: 0x02,
            }),
            ..Default::default()
        });
        assert!(matches!(link.refresh(), Err(ActuatorError::ReadFailed(_))));
        assert!(!link.bus().ops.contains(&Op::Close));
    }

    #[test]
    fn test_refresh_reconnect_failure() {
        let mut link = link_with(ScriptedBus {
            next_read_error: Some(BusError::Dropped),
            ..Default::default()
        });
        link.bus.fail_connect = true;
        assert!(matches!(link.refresh(), Err(ActuatorError::Connection(_))));
        assert_eq!(link.state(), LinkState::Disconnected);
    }

    #[test]
    fn test_refresh_retries_after_failed_reconnect() {
        let mut link = link_with(ScriptedBus {
            next_read_error: Some(BusError::Dropped),
            ..Default::default()
        });
        link.bus.fail_connect = true;
        assert!(matches!(link.refresh(), Err(ActuatorError::Connection(_))));
        assert!(matches!(link.refresh(), Err(ActuatorError::Connection(_))));
        assert_eq!(link.state(), LinkState::Disconnected);

        link.bus.fail_connect = false;
        link.bus.ops.clear();
        assert_eq!(link.refresh().unwrap(), RefreshOutcome::Reconnected);
        // No read on a link known to be down
        assert_eq!(link.bus().ops, [Op::Close, Op::Connect]);
        assert_eq!(link.state(), LinkState::Connected);
        assert_eq!(link.refresh().unwrap(), RefreshOutcome::Alive);
    }

    #[test]
    fn test_refresh_reconnects_closed_session() {
        let mut link = link_with(ScriptedBus {
            next_read_error: Some(BusError::NotConnected),
            ..Default::default()
        });
        assert_eq!(link.refresh().unwrap(), RefreshOutcome::Reconnected);
        assert_eq!(
            link.bus().ops,
            [Op::Read(REG_BUSY, 1), Op::Close, Op::Connect]
        );
    }

    #[test]
    fn test_close() {
        let mut link = link_with(ScriptedBus::default());
        link.close();
        assert_eq!(link.state(), LinkState::Disconnected);
        assert_eq!(link.bus().ops, [Op::Close]);
    }
}
