//! Cell controller: service start, control loop and shutdown
//!
//! The controller owns the station (robot, mezzanine, detector), the
//! patty recipe and the task registry. One call to [`CellController::run`]
//! cooks everything the detector saw on the hotplate:
//!
//! 1. Hotplate on, home, photo, detect
//! 2. One cooking task per detected patty
//! 3. Tick, reap, keep the robot session alive, watch the STOP button
//! 4. Return once every task is done (or STOP was pressed)

use std::thread;

use griddle_core::config::{ControlConfig, RecipeConfig};
use griddle_core::recipe::patty::{base_recipe, patties_from, Patty, Station};
use griddle_core::recipe::RecipeTemplate;
use griddle_core::scheduler::TaskRegistry;
use griddle_core::traits::{
    Button, Clock, Detector, HardwareError, HardwareIo, RefreshOutcome, RobotArm,
};
use tracing::{debug, error, info, warn};

/// How a service run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every patty went through the whole recipe
    Completed,
    /// STOP was pressed; the robot was halted
    EmergencyStopped,
}

/// Runs one cooking service on the cell
pub struct CellController<R, H, D> {
    station: Station<R, H, D>,
    template: RecipeTemplate<Patty, Station<R, H, D>>,
    registry: TaskRegistry<Patty, Station<R, H, D>>,
    control: ControlConfig,
}

impl<R, H, D> CellController<R, H, D>
where
    R: RobotArm + 'static,
    H: HardwareIo + 'static,
    D: Detector + 'static,
{
    /// Create a controller with the patty recipe built from `recipe`
    pub fn new(station: Station<R, H, D>, recipe: &RecipeConfig, control: ControlConfig) -> Self {
        Self {
            station,
            template: base_recipe(recipe),
            registry: TaskRegistry::new(),
            control,
        }
    }

    /// Station being driven
    pub fn station(&self) -> &Station<R, H, D> {
        &self.station
    }

    /// Tasks still in flight
    pub fn registry(&self) -> &TaskRegistry<Patty, Station<R, H, D>> {
        &self.registry
    }

    /// Heat the hotplate, look at it and schedule every patty found
    ///
    /// Returns the number of tasks scheduled. The hotplate is the only
    /// fatal failure here; robot moves that fail are logged.
    pub fn start_service(&mut self, clock: &dyn Clock) -> Result<usize, HardwareError> {
        self.station.io.set_hotplate(true)?;

        logged("home", self.station.robot.home());
        logged("photo", self.station.robot.photo());
        let detections = self.station.detector.detect();

        Ok(self
            .registry
            .build_from_detections(&self.template, patties_from(detections), clock))
    }

    /// Cook until every task is done or STOP is pressed
    pub fn run(&mut self, clock: &dyn Clock) -> Result<RunOutcome, HardwareError> {
        if self.start_service(clock)? == 0 {
            warn!("No patties on the hotplate");
        }

        let mut last_refresh = clock.now();
        while !self.registry.is_empty() {
            self.registry.tick_all(&mut self.station, clock);
            self.registry.reap_done();

            if clock.now().saturating_sub(last_refresh) >= self.control.refresh_interval {
                self.refresh_robot();
                last_refresh = clock.now();
            }

            if self.stop_pressed() {
                warn!(
                    "STOP pressed with {} tasks in flight, halting robot",
                    self.registry.len()
                );
                if let Err(e) = self.station.robot.emergency_stop() {
                    error!("Emergency stop failed: {}", e);
                }
                return Ok(RunOutcome::EmergencyStopped);
            }

            thread::sleep(self.control.tick_interval);
        }

        info!("Service complete");
        Ok(RunOutcome::Completed)
    }

    /// Turn the hotplate off and hand the station back
    ///
    /// The robot is only sent home after a completed run; after an
    /// emergency stop it stays where it halted.
    pub fn shutdown(self, outcome: RunOutcome) -> Station<R, H, D> {
        let Self {
            mut station,
            template,
            registry,
            ..
        } = self;

        if !registry.is_empty() {
            warn!("Abandoning {} unfinished tasks", registry.len());
        }
        drop(registry);
        drop(template);

        if let Err(e) = station.io.set_hotplate(false) {
            error!("Hotplate off failed: {}", e);
        }
        if outcome == RunOutcome::Completed {
            logged("home", station.robot.home());
        }
        station
    }

    fn refresh_robot(&mut self) {
        match self.station.robot.refresh() {
            Ok(RefreshOutcome::Alive) => debug!("Robot session alive"),
            Ok(RefreshOutcome::Reconnected) => info!("Robot session reconnected"),
            Err(e) => warn!("Robot keep-alive failed: {}", e),
        }
    }

    fn stop_pressed(&mut self) -> bool {
        match self.station.io.read_button(Button::Stop) {
            Ok(pressed) => pressed,
            Err(e) => {
                warn!("Reading {} button failed: {}", Button::Stop, e);
                false
            }
        }
    }
}

fn logged<E: std::fmt::Display>(what: &str, result: Result<(), E>) {
    if let Err(e) = result {
        warn!("Robot {} failed: {}", what, e);
    }
}
