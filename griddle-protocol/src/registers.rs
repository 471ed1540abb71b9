//! Robot register map and value encodings
//!
//! The robot controller's general-purpose registers live at 128-255. The
//! robot program and the host share them as follows:
//!
//! | Address | Use |
//! |---|---|
//! | 128 | busy flag (0 = free, 1 = claimed by the host) |
//! | 130 | command code ([`RobotCommand`]) |
//! | 132-134 | target pose x, y, z |
//! | 135-137 | current pose x, y, z |
//! | 141 | emergency stop |

/// Busy flag register
pub const REG_BUSY: u16 = 128;

/// Command code register
pub const REG_COMMAND: u16 = 130;

/// First of the three target pose registers
pub const REG_TARGET_POSE: u16 = 132;

/// First of the three current pose registers
pub const REG_CURRENT_POSE: u16 = 135;

/// Emergency stop register
pub const REG_ESTOP: u16 = 141;

/// Registers per pose
pub const POSE_REGISTERS: usize = 3;

/// Busy flag value: registers free
pub const BUSY_FREE: u16 = 0;

/// Busy flag value: registers claimed by the host
pub const BUSY_CLAIMED: u16 = 1;

/// Value written to the emergency stop register
pub const ESTOP_TRIGGER: u16 = 1;

/// Command codes understood by the robot program
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RobotCommand {
    /// No command pending; the robot writes this back when finished
    Wait,
    /// Move to the home position
    Home,
    /// Move to the camera position
    Photo,
    /// Move to the target pose
    MoveHere,
    /// Position the IR sensor over the target pose
    MeasureTemp,
    /// Flip the item at the target pose
    Flip,
    /// Pick up the item at the target pose and drop it on the conveyor
    Deposit,
}

// Wire format values
const CMD_WAIT: u16 = 0;
const CMD_HOME: u16 = 1;
const CMD_PHOTO: u16 = 2;
const CMD_HERE: u16 = 3;
const CMD_TEMP: u16 = 4;
const CMD_FLIP: u16 = 5;
const CMD_DEPOSIT: u16 = 6;

impl RobotCommand {
    /// Parse a command from its register value
    pub fn from_register(value: u16) -> Option<Self> {
        match value {
            CMD_WAIT => Some(RobotCommand::Wait),
            CMD_HOME => Some(RobotCommand::Home),
            CMD_PHOTO => Some(RobotCommand::Photo),
            CMD_HERE => Some(RobotCommand::MoveHere),
            CMD_TEMP => Some(RobotCommand::MeasureTemp),
            CMD_FLIP => Some(RobotCommand::Flip),
            CMD_DEPOSIT => Some(RobotCommand::Deposit),
            _ => None,
        }
    }

    /// Convert to register value
    pub fn to_register(self) -> u16 {
        match self {
            RobotCommand::Wait => CMD_WAIT,
            RobotCommand::Home => CMD_HOME,
            RobotCommand::Photo => CMD_PHOTO,
            RobotCommand::MoveHere => CMD_HERE,
            RobotCommand::MeasureTemp => CMD_TEMP,
            RobotCommand::Flip => CMD_FLIP,
            RobotCommand::Deposit => CMD_DEPOSIT,
        }
    }

    /// Returns true if the command needs no explicit target pose
    pub fn is_poseless(&self) -> bool {
        matches!(self, RobotCommand::Home | RobotCommand::Photo)
    }

    /// Short lowercase name for logs
    pub fn name(&self) -> &'static str {
        match self {
            RobotCommand::Wait => "wait",
            RobotCommand::Home => "home",
            RobotCommand::Photo => "photo",
            RobotCommand::MoveHere => "move",
            RobotCommand::MeasureTemp => "measure-temperature",
            RobotCommand::Flip => "flip",
            RobotCommand::Deposit => "deposit",
        }
    }
}

/// Robot pose in millimetres
///
/// The robot stores registers as unsigned words; the robot program
/// reinterprets them as two's complement, so negative coordinates
/// survive the trip unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pose {
    pub x: i16,
    pub y: i16,
    pub z: i16,
}

impl Pose {
    /// Create a pose
    pub const fn new(x: i16, y: i16, z: i16) -> Self {
        Self { x, y, z }
    }

    /// Pose in the hotplate plane (z = 0)
    pub const fn planar(x: i16, y: i16) -> Self {
        Self { x, y, z: 0 }
    }

    /// Encode as three register words (x, y, z)
    pub fn to_registers(self) -> [u16; POSE_REGISTERS] {
        [self.x as u16, self.y as u16, self.z as u16]
    }

    /// Decode from register words; `None` unless exactly three are given
    pub fn from_registers(words: &[u16]) -> Option<Self> {
        match words {
            [x, y, z] => Some(Self {
                x: *x as i16,
                y: *y as i16,
                z: *z as i16,
            }),
            _ => None,
        }
    }
}
