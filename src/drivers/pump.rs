//! Three on/off pump outputs.
//!
//! Each pump sits behind a MOSFET switched by one GPIO.  The bank is
//! generic over `embedded_hal::digital::OutputPin` so the firmware passes
//! ESP-IDF pin drivers and tests pass recording fakes.
//!
//! This is a dumb actuator: timing comes from the duty scheduler.

use embedded_hal::digital::OutputPin;

pub struct PumpBank<P: OutputPin> {
    pins: [P; 3],
    state: [bool; 3],
}

impl<P: OutputPin> PumpBank<P> {
    /// Takes the pins and drives them all low.
    pub fn new(pins: [P; 3]) -> Result<Self, P::Error> {
        let mut bank = Self {
            pins,
            state: [true; 3],
        };
        bank.set([false; 3])?;
        Ok(bank)
    }

    /// Only pins whose level changes are written.
    pub fn set(&mut self, on: [bool; 3]) -> Result<(), P::Error> {
        for (i, pin) in self.pins.iter_mut().enumerate() {
            if on[i] == self.state[i] {
                continue;
            }
            if on[i] {
                pin.set_high()?;
            } else {
                pin.set_low()?;
            }
            self.state[i] = on[i];
        }
        Ok(())
    }

    pub fn all_off(&mut self) -> Result<(), P::Error> {
        self.set([false; 3])
    }

    pub fn state(&self) -> [bool; 3] {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state.iter().any(|s| *s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_hal::digital::ErrorType;

    #[derive(Default)]
    struct FakePin {
        high: bool,
        writes: u32,
    }

    impl ErrorType for FakePin {
        type Error = Infallible;
    }

    impl OutputPin for FakePin {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.high = false;
            self.writes += 1;
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.high = true;
            self.writes += 1;
            Ok(())
        }
    }

    fn bank() -> PumpBank<FakePin> {
        PumpBank::new([FakePin::default(), FakePin::default(), FakePin::default()]).unwrap()
    }

    #[test]
    fn starts_with_everything_low() {
        let b = bank();
        assert_eq!(b.state(), [false; 3]);
        assert!(b.pins.iter().all(|p| !p.high && p.writes == 1));
    }

    #[test]
    fn unchanged_levels_are_not_rewritten() {
        let mut b = bank();
        b.set([true, false, true]).unwrap();
        b.set([true, false, true]).unwrap();
        assert_eq!(b.pins[0].writes, 2);
        assert_eq!(b.pins[1].writes, 1);
        assert!(b.is_running());
        b.all_off().unwrap();
        assert!(!b.is_running());
        assert!(!b.pins[2].high);
    }
}
