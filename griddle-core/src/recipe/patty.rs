//! The patty recipe
//!
//! Two steps per patty:
//!
//! | Step     | Deadline | Completes when                     | Action                          |
//! |----------|----------|------------------------------------|---------------------------------|
//! | `flip`   | 60 s     | surface temperature above 27.0 °C  | flip, re-photograph, re-locate  |
//! | `remove` | 5 s      | never (deadline only)              | deposit on conveyor, run belt   |
//!
//! Robot and hardware failures inside actions are logged and the action
//! carries on with its remaining moves; there is no failed state for a
//! task.

use std::thread;
use std::time::Duration;

use griddle_protocol::Pose;
use tracing::{debug, info, warn};

use super::step::{never_done, StepDefinition};
use super::task::{Ingredient, ItemId};
use super::template::RecipeTemplate;
use crate::actuator::ActuatorError;
use crate::config::RecipeConfig;
use crate::traits::{ConveyorDirection, Coordinate, Detector, HardwareIo, RobotArm};

/// A patty on the hotplate
#[derive(Debug)]
pub struct Patty {
    id: ItemId,
    /// Last known position
    pub position: Coordinate,
    /// Last surface temperature reading in °C
    pub temperature: Option<f64>,
}

impl Patty {
    /// Create a patty at a detected position
    pub fn new(position: Coordinate) -> Self {
        Self {
            id: ItemId::next(),
            position,
            temperature: None,
        }
    }

    /// Robot pose on the hotplate surface above this patty
    pub fn pose(&self) -> Pose {
        Pose::planar(clamp_mm(self.position.x), clamp_mm(self.position.y))
    }

    /// Move to the candidate closest to the last known position
    ///
    /// Returns false (and keeps the old position) if there are no
    /// candidates. Ties go to the earliest candidate.
    pub fn relocate(&mut self, candidates: &[Coordinate]) -> bool {
        match candidates
            .iter()
            .min_by_key(|c| c.manhattan_distance(&self.position))
        {
            Some(nearest) => {
                self.position = *nearest;
                true
            }
            None => false,
        }
    }
}

impl Ingredient for Patty {
    fn id(&self) -> ItemId {
        self.id
    }
}

/// Build one patty per detected position
pub fn patties_from(detections: impl IntoIterator<Item = Coordinate>) -> Vec<Patty> {
    detections.into_iter().map(Patty::new).collect()
}

fn clamp_mm(value: i32) -> i16 {
    value.clamp(i16::MIN.into(), i16::MAX.into()) as i16
}

/// Everything a patty step acts on
pub struct Station<R, H, D> {
    pub robot: R,
    pub io: H,
    pub detector: D,
}

impl<R, H, D> Station<R, H, D> {
    /// Group the robot, mezzanine hardware and detector
    pub fn new(robot: R, io: H, detector: D) -> Self {
        Self {
            robot,
            io,
            detector,
        }
    }
}

/// The flip-then-remove recipe
pub fn base_recipe<R, H, D>(config: &RecipeConfig) -> RecipeTemplate<Patty, Station<R, H, D>>
where
    R: RobotArm + 'static,
    H: HardwareIo + 'static,
    D: Detector + 'static,
{
    let threshold = config.done_temperature_c;
    let conveyor_run = config.conveyor_run;

    RecipeTemplate::new(
        "patty",
        StepDefinition::new(
            "flip",
            config.flip_after,
            flip::<R, H, D>,
            move |patty: &mut Patty, station: &mut Station<R, H, D>| {
                is_done(patty, station, threshold)
            },
        ),
    )
    .then(StepDefinition::new(
        "remove",
        config.remove_after,
        move |patty: &mut Patty, station: &mut Station<R, H, D>| {
            remove(patty, station, conveyor_run)
        },
        never_done,
    ))
}

/// Measure the patty's surface temperature and compare to the threshold
///
/// Leaves the robot at home. A failed sensor read counts as not done.
pub fn is_done<R: RobotArm, H: HardwareIo, D>(
    patty: &mut Patty,
    station: &mut Station<R, H, D>,
    threshold_c: f64,
) -> bool {
    let pose = patty.pose();
    attempt(patty.id, "home", station.robot.home());
    attempt(
        patty.id,
        "measure temperature",
        station.robot.measure_temperature_at(pose),
    );
    let reading = station.io.read_temperature();
    attempt(patty.id, "home", station.robot.home());

    match reading {
        Ok(celsius) => {
            patty.temperature = Some(celsius);
            debug!("Patty {} at {:.2} °C", patty.id, celsius);
            celsius > threshold_c
        }
        Err(e) => {
            warn!("Patty {}: temperature read failed: {}", patty.id, e);
            false
        }
    }
}

/// Flip the patty, then find where it landed
pub fn flip<R: RobotArm, H, D: Detector>(patty: &mut Patty, station: &mut Station<R, H, D>) {
    let pose = patty.pose();
    attempt(patty.id, "home", station.robot.home());
    attempt(patty.id, "flip", station.robot.flip(pose));
    attempt(patty.id, "home", station.robot.home());
    attempt(patty.id, "photo", station.robot.photo());
    let candidates = station.detector.detect();
    attempt(patty.id, "home", station.robot.home());

    let before = patty.position;
    if patty.relocate(&candidates) {
        info!(
            "Patty {} moved from {} to {} after flip",
            patty.id, before, patty.position
        );
    } else {
        warn!(
            "Patty {} not found after flip; keeping {}",
            patty.id, patty.position
        );
    }
}

/// Deposit the patty on the conveyor and run the belt
pub fn remove<R: RobotArm, H: HardwareIo, D>(
    patty: &mut Patty,
    station: &mut Station<R, H, D>,
    conveyor_run: Duration,
) {
    let pose = patty.pose();
    attempt(patty.id, "home", station.robot.home());
    attempt(patty.id, "deposit", station.robot.deposit(pose));
    attempt(patty.id, "home", station.robot.home());

    if let Err(e) = station.io.set_conveyor(ConveyorDirection::Forward) {
        warn!("Patty {}: conveyor start failed: {}", patty.id, e);
    }
    thread::sleep(conveyor_run);
    if let Err(e) = station.io.set_conveyor(ConveyorDirection::Stopped) {
        warn!("Patty {}: conveyor stop failed: {}", patty.id, e);
    }
    info!("Patty {} removed", patty.id);
}

fn attempt(id: ItemId, what: &str, result: Result<(), ActuatorError>) {
    if let Err(e) = result {
        warn!("Patty {}: {} failed, continuing: {}", id, what, e);
    }
}
