// config.rs

use crc::{Crc, CRC_32_ISCSI};

use crate::*;

pub const NVS_BUF_SIZE: usize = 256;

const CONFIG_NAME: &str = "cfg";

/// ADC correction for the battery input. The quartic maps the averaged
/// raw 12-bit reading to the voltage at the divider tap; the ratio backs
/// out the voltage at the top of the divider. Both are board-specific
/// and travel with the config, never assumed by the sampler.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    /// Quartic coefficients, highest power first.
    pub poly: [f64; 5],
    /// R2 / (R1 + R2) of the input divider (230k top, 100k bottom).
    pub divider_ratio: f64,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            poly: [
                -0.000000000000016,
                0.000000000118171,
                -0.000000301211691,
                0.001109019271794,
                0.034143524634089,
            ],
            divider_ratio: 100_000.0 / (230_000.0 + 100_000.0),
        }
    }
}

impl Calibration {
    /// Voltage at the divider tap for an averaged raw ADC reading.
    pub fn tap_voltage(&self, raw_avg: f64) -> f64 {
        let x = raw_avg;
        self.poly[0] * x.powi(4)
            + self.poly[1] * x.powi(3)
            + self.poly[2] * x.powi(2)
            + self.poly[3] * x
            + self.poly[4]
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MyConfig {
    pub wifi_ssid: String,
    pub wifi_pass: String,

    pub v4dhcp: bool,
    pub v4addr: net::Ipv4Addr,
    pub v4mask: u8,
    pub v4gw: net::Ipv4Addr,
    pub dns1: net::Ipv4Addr,
    pub dns2: net::Ipv4Addr,

    pub radio_band_hz: u64,
    pub radio_sync_word: u8,

    pub cal: Calibration,
}

impl Default for MyConfig {
    fn default() -> Self {
        Self {
            wifi_ssid: option_env!("WIFI_SSID").unwrap_or("internet").into(),
            wifi_pass: option_env!("WIFI_PASS").unwrap_or("").into(),

            v4dhcp: false,
            v4addr: net::Ipv4Addr::new(192, 168, 0, 21),
            v4mask: 16,
            v4gw: net::Ipv4Addr::new(192, 168, 0, 1),
            dns1: net::Ipv4Addr::new(192, 168, 0, 1),
            dns2: net::Ipv4Addr::new(8, 8, 4, 4),

            // 915E6 in the US variant, 868E6/433E6 elsewhere
            radio_band_hz: 915_000_000,
            // coarse receiver-side packet filter
            radio_sync_word: 0xA1,

            cal: Calibration::default(),
        }
    }
}

impl MyConfig {
    /// Encode into `buf` with a trailing CRC32, returning the used slice.
    pub fn encode<'a>(&self, buf: &'a mut [u8]) -> AppResult<&'a [u8]> {
        let crc = Crc::<u32>::new(&CRC_32_ISCSI);
        let digest = crc.digest();
        postcard::to_slice_crc32(self, buf, digest)
            .map(|data| &*data)
            .map_err(|e| AppError::Message(format!("Cannot encode config to buffer {e:?}")))
    }

    /// Decode a CRC32-tailed buffer produced by [`encode`](Self::encode).
    pub fn decode(data: &[u8]) -> Option<Self> {
        let crc = Crc::<u32>::new(&CRC_32_ISCSI);
        let digest = crc.digest();
        match postcard::from_bytes_crc32::<MyConfig>(data, digest) {
            Ok(c) => Some(c),
            Err(e) => {
                error!("Cannot parse config: {e:?}");
                None
            }
        }
    }
}

#[cfg(target_os = "espidf")]
impl MyConfig {
    pub fn from_nvs(nvs: &mut nvs::EspNvs<nvs::NvsDefault>) -> Option<Self> {
        let mut nvsbuf = [0u8; NVS_BUF_SIZE];
        info!("Reading up to {sz} bytes from nvs...", sz = NVS_BUF_SIZE);
        let b = match nvs.get_raw(CONFIG_NAME, &mut nvsbuf) {
            Err(e) => {
                error!("Nvs read error {e:?}");
                return None;
            }
            Ok(Some(b)) => b,
            _ => {
                error!("Nvs key not found");
                return None;
            }
        };
        info!("Got {sz} bytes from nvs. Parsing config...", sz = b.len());

        let config = Self::decode(b);
        if config.is_some() {
            info!("Successfully parsed config from nvs.");
        }
        config
    }

    pub fn to_nvs(&self, nvs: &mut nvs::EspNvs<nvs::NvsDefault>) -> AppResult<()> {
        let mut nvsbuf = [0u8; NVS_BUF_SIZE];
        let nvsdata = self.encode(&mut nvsbuf)?;
        info!("Encoded config to {sz} bytes. Saving to nvs...", sz = nvsdata.len());

        nvs.set_raw(CONFIG_NAME, nvsdata)
            .map_err(|e| AppError::Message(format!("Cannot save to nvs: {e:?}")))?;
        info!("Config saved.");
        Ok(())
    }
}

// EOF
