// packet.rs — outbound telemetry frame

use core::fmt::Write;

/// Fixed marker bytes at the start of every frame, checked by the
/// receiver to recognize valid packets.
pub const PACKET_PREAMBLE: &str = "A1A";

/// Preamble + water digit + "-2147483648" worst case.
pub const PACKET_MAX_LEN: usize = 16;

/// Readings of one transmit cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SensorSample {
    pub water_level: bool,
    pub voltage_cv: i32,
}

/// Positional ASCII frame: preamble, then the water level as a single
/// `0`/`1` digit, then the decimal centivolt value. No delimiters, no
/// checksum, no length; the receiver splits on the known preamble length
/// and divides the voltage field by 100.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Packet(heapless::String<PACKET_MAX_LEN>);

impl Packet {
    pub fn encode(sample: &SensorSample) -> Self {
        let mut frame = heapless::String::new();
        // sized for the worst case above, cannot overflow
        let _ = write!(
            frame,
            "{}{}{}",
            PACKET_PREAMBLE, sample.water_level as u8, sample.voltage_cv
        );
        Packet(frame)
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

// EOF
