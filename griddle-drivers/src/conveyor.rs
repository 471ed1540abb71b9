//! Conveyor drive
//!
//! The conveyor motor driver takes one enable line per direction. Both
//! lines high at once shorts the driver, so a direction change always
//! drops the opposite line before raising the active one.

use griddle_core::traits::ConveyorDirection;
use griddle_hal::OutputPin;

/// Two-pin conveyor drive
pub struct Conveyor<P> {
    forward: P,
    reverse: P,
    direction: ConveyorDirection,
}

impl<P: OutputPin> Conveyor<P> {
    /// Create a new conveyor drive, stopped
    pub fn new(forward: P, reverse: P) -> Result<Self, P::Error> {
        let mut conveyor = Self {
            forward,
            reverse,
            direction: ConveyorDirection::Stopped,
        };
        conveyor.set_direction(ConveyorDirection::Stopped)?;
        Ok(conveyor)
    }

    /// Drive the conveyor
    pub fn set_direction(&mut self, direction: ConveyorDirection) -> Result<(), P::Error> {
        match direction {
            ConveyorDirection::Stopped => {
                self.forward.set_low()?;
                self.reverse.set_low()?;
            }
            ConveyorDirection::Forward => {
                self.reverse.set_low()?;
                self.forward.set_high()?;
            }
            ConveyorDirection::Reverse => {
                self.forward.set_low()?;
                self.reverse.set_high()?;
            }
        }
        self.direction = direction;
        Ok(())
    }

    /// Last direction set
    pub fn direction(&self) -> ConveyorDirection {
        self.direction
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hotplate::tests::MockPin;
    use griddle_hal::PinLevel;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Pins sharing one event log so ordering across pins is visible
    fn pins() -> (MockPin, MockPin, Rc<RefCell<Vec<PinLevel>>>, Rc<RefCell<Vec<PinLevel>>>) {
        let fwd = MockPin::default();
        let rev = MockPin::default();
        let fwd_log = Rc::clone(&fwd.history);
        let rev_log = Rc::clone(&rev.history);
        (fwd, rev, fwd_log, rev_log)
    }

    #[test]
    fn test_conveyor_starts_stopped() {
        let (fwd, rev, fwd_log, rev_log) = pins();
        let conveyor = Conveyor::new(fwd, rev).unwrap();
        assert_eq!(conveyor.direction(), ConveyorDirection::Stopped);
        assert_eq!(fwd_log.borrow().last(), Some(&PinLevel::Low));
        assert_eq!(rev_log.borrow().last(), Some(&PinLevel::Low));
    }

    #[test]
    fn test_forward_then_reverse() {
        let (fwd, rev, fwd_log, rev_log) = pins();
        let mut conveyor = Conveyor::new(fwd, rev).unwrap();

        conveyor.set_direction(ConveyorDirection::Forward).unwrap();
        assert_eq!(fwd_log.borrow().last(), Some(&PinLevel::High));
        assert_eq!(rev_log.borrow().last(), Some(&PinLevel::Low));

        conveyor.set_direction(ConveyorDirection::Reverse).unwrap();
        assert_eq!(fwd_log.borrow().last(), Some(&PinLevel::Low));
        assert_eq!(rev_log.borrow().last(), Some(&PinLevel::High));

        conveyor.set_direction(ConveyorDirection::Stopped).unwrap();
        assert_eq!(fwd_log.borrow().last(), Some(&PinLevel::Low));
        assert_eq!(rev_log.borrow().last(), Some(&PinLevel::Low));
        assert_eq!(conveyor.direction(), ConveyorDirection::Stopped);
    }

    /// Output pin that appends its name and level to a shared log
    struct NamedPin {
        name: &'static str,
        log: Rc<RefCell<Vec<(&'static str, PinLevel)>>>,
    }

    impl OutputPin for NamedPin {
        type Error = ();

        fn set_high(&mut self) -> Result<(), ()> {
            self.log.borrow_mut().push((self.name, PinLevel::High));
            Ok(())
        }

        fn set_low(&mut self) -> Result<(), ()> {
            self.log.borrow_mut().push((self.name, PinLevel::Low));
            Ok(())
        }

        fn output_level(&mut self) -> Result<PinLevel, ()> {
            Ok(PinLevel::Low)
        }
    }

    #[test]
    fn test_opposite_pin_dropped_first() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut conveyor = Conveyor::new(
            NamedPin { name: "fwd", log: Rc::clone(&log) },
            NamedPin { name: "rev", log: Rc::clone(&log) },
        )
        .unwrap();
        log.borrow_mut().clear();

        conveyor.set_direction(ConveyorDirection::Forward).unwrap();
        assert_eq!(*log.borrow(), [("rev", PinLevel::Low), ("fwd", PinLevel::High)]);
    }
}
