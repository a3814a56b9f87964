// boot.rs — the power-cycle state machine

use core::time::Duration;

use crate::*;

/// Window after boot in which a held key selects service mode.
pub const KEY_WAIT_MS: u64 = 1000;
/// Pacing between key polls inside the window.
pub const KEY_POLL_MS: u32 = 10;
/// How long the "Key pressed" acknowledgment stays on screen.
pub const KEY_ACK_MS: u32 = 500;
/// Settle time so a packet has fully left the air before power-down.
pub const SEND_SETTLE_MS: u32 = 4000;
/// Pause between service-mode transmissions.
pub const SERVICE_LOOP_MS: u32 = 5000;
/// Deep-sleep interval between sleep-mode transmissions.
pub const DEEP_SLEEP: Duration = Duration::from_secs(10 * 60);

/// Operating mode, decided exactly once per boot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceMode {
    Sleep,
    Service,
}

/// Terminal outcomes of one boot cycle. On hardware neither is normally
/// observed by the caller: deep sleep powers the chip down, and the
/// service loop runs until external reset or a flashed update reboots.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Terminal {
    Halted,
    SleptUntilReset,
}

/// The two field sensors behind one sampling call. Water first, then
/// battery, matching the frame order.
pub struct TankSensors<A, O, I, C> {
    pub battery: VoltageSampler<A, C>,
    pub water: WaterLevelSensor<O, I, C>,
}

impl<A, O, I, C> SensorSuite for TankSensors<A, O, I, C>
where
    A: AnalogSource,
    O: PinOutput,
    I: PinInput,
    C: Clock,
{
    fn sample(&mut self) -> SensorSample {
        SensorSample {
            water_level: self.water.sample(),
            voltage_cv: self.battery.sample(),
        }
    }
}

pub struct BootController<S, R, D, N, U, P, K, L, C> {
    pub sensors: S,
    pub radio: R,
    pub display: D,
    pub net: N,
    pub updates: U,
    pub power: P,
    pub key: K,
    pub led: L,
    pub clock: C,
    pub band_hz: u64,
    pub sync_word: u8,
}

impl<S, R, D, N, U, P, K, L, C> BootController<S, R, D, N, U, P, K, L, C>
where
    S: SensorSuite,
    R: RadioLink,
    D: StatusDisplay,
    N: NetworkControl,
    U: UpdateService,
    P: PowerControl,
    K: PinInput,
    L: PinOutput,
    C: Clock,
{
    /// One full boot cycle. Returns only from the halt and sleep paths;
    /// the service branch loops until external reset.
    pub fn run(mut self) -> Terminal {
        self.power.bluetooth_off();

        if let Err(e) = self.radio.begin(self.band_hz, self.sync_word) {
            // no radio, no function: stop where the fault is visible
            error!("LoRa init failed: {e}");
            self.display
                .show(&["LoRa failed to start, wrong module type", "Boot stopped"]);
            return Terminal::Halted;
        }
        info!("LoRa up at {} Hz, sync 0x{:02X}", self.band_hz, self.sync_word);

        match self.decide_mode() {
            DeviceMode::Sleep => self.sleep_cycle(),
            DeviceMode::Service => self.service_mode(),
        }
    }

    /// Poll the key against the boot timer for a bounded window. A single
    /// observed assertion (active low) is enough; no debounce. A press
    /// landing exactly at or after the window boundary is missed.
    pub fn decide_mode(&mut self) -> DeviceMode {
        let t0 = self.clock.millis();
        while self.clock.millis() - t0 < KEY_WAIT_MS {
            if self.key.read() == Level::Low {
                info!("Key pressed, staying awake");
                return DeviceMode::Service;
            }
            self.clock.delay_ms(KEY_POLL_MS);
        }
        DeviceMode::Sleep
    }

    fn sleep_cycle(&mut self) -> Terminal {
        self.transmit_current();
        // the packet must clear the air before power-down
        self.clock.delay_ms(SEND_SETTLE_MS);

        self.net.power_off();
        info!("Deep sleep for {}s", DEEP_SLEEP.as_secs());
        self.power.deep_sleep(DEEP_SLEEP);
        Terminal::SleptUntilReset
    }

    fn service_mode(&mut self) -> Terminal {
        self.enter_service();
        loop {
            self.service_iteration();
            self.clock.delay_ms(SERVICE_LOOP_MS);
        }
    }

    /// One-time service-mode entry: acknowledge the key, join the
    /// network best-effort, start the update listener. Split from the
    /// endless loop so it is testable on its own.
    pub fn enter_service(&mut self) {
        self.display.show(&["Key pressed"]);
        self.clock.delay_ms(KEY_ACK_MS);

        if let Err(e) = self.net.join() {
            // out of range is normal; telemetry still goes out over LoRa
            warn!("WiFi join failed: {e}");
        }
        if let Err(e) = self.updates.begin() {
            warn!("Update listener failed to start: {e}");
        }
    }

    /// One pass of the service loop: drain update events, refresh the
    /// panel, transmit. Public so tests can run a bounded number of
    /// passes.
    pub fn service_iteration(&mut self) {
        while let Some(event) = self.updates.poll() {
            self.report_update(&event);
        }

        let sample = self.sensors.sample();
        let water = format!("Water level: {}", sample.water_level as u8);
        let volts = format!(
            "Voltage level: {:.2}",
            f64::from(sample.voltage_cv) / 100.0
        );
        self.display.show(&[&water, &volts]);

        self.led.write(Level::High);
        self.transmit(&sample);
        self.led.write(Level::Low);
    }

    fn transmit_current(&mut self) {
        let sample = self.sensors.sample();
        self.transmit(&sample);
    }

    /// Fire and forget: there is no retry or acknowledgment scheme; lost
    /// telemetry is cheaper than a blocked battery device.
    fn transmit(&mut self, sample: &SensorSample) {
        let frame = Packet::encode(sample);
        info!("TX {}", frame.as_str());
        if let Err(e) = self.radio.transmit(frame.as_bytes()) {
            warn!("LoRa transmit failed: {e}");
        }
    }

    fn report_update(&mut self, event: &UpdateEvent) {
        match event {
            UpdateEvent::Started => {
                info!("Starting OTA");
                self.display.show(&["Starting OTA"]);
            }
            UpdateEvent::Progress(pct) => info!("Progress: {pct}%"),
            UpdateEvent::Error(kind) => {
                error!("OTA error: {kind}");
                self.display.show(&["OTA error"]);
            }
            UpdateEvent::Ended => info!("OTA end"),
        }
    }
}

// EOF
