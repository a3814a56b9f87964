// sampler.rs — averaged, calibrated battery voltage sampling

use crate::*;

/// Raw reads averaged per sample.
pub const VIN_SAMPLE_COUNT: u32 = 10;
/// Settling gap between raw reads.
pub const VIN_SAMPLE_GAP_MS: u32 = 10;

pub struct VoltageSampler<A, C> {
    adc: A,
    clock: C,
    cal: Calibration,
}

impl<A, C> VoltageSampler<A, C>
where
    A: AnalogSource,
    C: Clock,
{
    pub fn new(adc: A, clock: C, cal: Calibration) -> Self {
        Self { adc, clock, cal }
    }

    /// Battery voltage in centivolts (volts x 100, truncated toward
    /// zero). The receiving end divides by 100 to recover volts.
    pub fn sample(&mut self) -> i32 {
        let mut sum = 0.0f64;
        for _ in 0..VIN_SAMPLE_COUNT {
            sum += f64::from(self.adc.read_raw());
            self.clock.delay_ms(VIN_SAMPLE_GAP_MS);
        }
        let raw_avg = sum / f64::from(VIN_SAMPLE_COUNT);

        let tap = self.cal.tap_voltage(raw_avg);
        let vin = tap / self.cal.divider_ratio;
        info!("Voltage from divider: {tap:.3} V, voltage to divider: {vin:.3} V");

        (vin * 100.0) as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::*;

    fn sampler_at(raw: u16, trace: &Trace) -> VoltageSampler<FakeAdc, FakeClock> {
        VoltageSampler::new(
            FakeAdc::constant(raw, trace),
            FakeClock::new(trace),
            Calibration::default(),
        )
    }

    #[test]
    fn calibrated_sample_matches_known_points() {
        let trace = Trace::default();
        // avg 1650 -> 1.4562 V at the tap -> 4.8055 V at the battery
        assert_eq!(sampler_at(1650, &trace).sample(), 480);
        // avg 2000 -> 1.7367 V at the tap -> 5.7311 V at the battery
        assert_eq!(sampler_at(2000, &trace).sample(), 573);
    }

    #[test]
    fn truncates_instead_of_rounding() {
        let trace = Trace::default();
        // 480.55 cv: rounding would report 481
        assert_eq!(sampler_at(1650, &trace).sample(), 480);
    }

    #[test]
    fn monotonic_over_the_adc_range() {
        let trace = Trace::default();
        let mut last = i32::MIN;
        for raw in (0..=4095u16).step_by(15) {
            let cv = sampler_at(raw, &trace).sample();
            assert!(cv >= last, "not monotonic at raw={raw}: {cv} < {last}");
            last = cv;
        }
    }

    #[test]
    fn averages_ten_reads_with_settling_gaps() {
        let trace = Trace::default();
        sampler_at(1650, &trace).sample();

        let events = trace.events();
        let reads = events.iter().filter(|e| matches!(e, Ev::AdcRead)).count();
        let gaps = events
            .iter()
            .filter(|e| matches!(e, Ev::DelayMs(VIN_SAMPLE_GAP_MS)))
            .count();
        assert_eq!(reads, VIN_SAMPLE_COUNT as usize);
        assert_eq!(gaps, VIN_SAMPLE_COUNT as usize);
    }
}
// EOF
