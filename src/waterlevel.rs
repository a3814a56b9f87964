// waterlevel.rs — excited float-switch sampling

use crate::*;

/// Wait for the filter capacitor to charge after excitation.
pub const WATER_SETTLE_MS: u32 = 10;

/// Float switch behind an excitation pin. The sensor loop is powered only
/// for the few milliseconds around a read; excitation is low again before
/// `sample` returns, so the steady-state draw is zero.
pub struct WaterLevelSensor<O, I, C> {
    trigger: O,
    sense: I,
    clock: C,
}

impl<O, I, C> WaterLevelSensor<O, I, C>
where
    O: PinOutput,
    I: PinInput,
    C: Clock,
{
    pub fn new(trigger: O, sense: I, clock: C) -> Self {
        Self {
            trigger,
            sense,
            clock,
        }
    }

    /// True when the switch reads high (tank full).
    pub fn sample(&mut self) -> bool {
        self.trigger.write(Level::High);
        self.clock.delay_ms(WATER_SETTLE_MS);
        let level = self.sense.read();
        self.trigger.write(Level::Low);
        level == Level::High
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::*;

    fn sensor(
        level: Level,
        trace: &Trace,
    ) -> WaterLevelSensor<FakeOutput, FakeInput, FakeClock> {
        WaterLevelSensor::new(
            FakeOutput::new("trigger", trace),
            FakeInput::fixed("sense", level, trace),
            FakeClock::new(trace),
        )
    }

    #[test]
    fn maps_the_sense_pin_to_a_bool() {
        let trace = Trace::default();
        assert!(sensor(Level::High, &trace).sample());
        assert!(!sensor(Level::Low, &trace).sample());
    }

    #[test]
    fn excites_settles_reads_then_powers_down() {
        let trace = Trace::default();
        let mut s = sensor(Level::High, &trace);

        assert_eq!(s.trigger.state(), Level::Low);
        s.sample();
        assert_eq!(s.trigger.state(), Level::Low);

        assert_eq!(
            trace.events(),
            vec![
                Ev::PinWrite("trigger", Level::High),
                Ev::DelayMs(WATER_SETTLE_MS),
                Ev::PinRead("sense"),
                Ev::PinWrite("trigger", Level::Low),
            ]
        );
    }
}
// EOF
