// esp.rs — esp-idf bindings for the hardware capability seams

use core::time::Duration;

use anyhow::anyhow;
use esp_idf_hal::adc::attenuation::DB_11;
use esp_idf_hal::adc::oneshot::config::AdcChannelConfig;
use esp_idf_hal::adc::oneshot::{AdcChannelDriver, AdcDriver};
use esp_idf_hal::adc::ADC1;
use esp_idf_hal::delay::Delay;
use esp_idf_hal::gpio::Gpio36;

use crate::*;

/// Millisecond clock over the esp timer; delays yield to FreeRTOS.
#[derive(Clone, Copy, Default)]
pub struct EspClock;

impl Clock for EspClock {
    fn millis(&self) -> u64 {
        (unsafe { esp_idf_sys::esp_timer_get_time() } / 1000) as u64
    }

    fn delay_ms(&self, ms: u32) {
        FreeRtos::delay_ms(ms);
    }
}

pub struct EspInput<'d>(pub PinDriver<'d, AnyInputPin, Input>);

impl PinInput for EspInput<'_> {
    fn read(&mut self) -> Level {
        if self.0.is_low() {
            Level::Low
        } else {
            Level::High
        }
    }
}

pub struct EspOutput<'d>(pub PinDriver<'d, AnyOutputPin, Output>);

impl PinOutput for EspOutput<'_> {
    fn write(&mut self, level: Level) {
        let res = match level {
            Level::Low => self.0.set_low(),
            Level::High => self.0.set_high(),
        };
        if let Err(e) = res {
            warn!("GPIO write failed: {e}");
        }
    }
}

/// Battery divider input on GPIO36 (VP): oneshot reads, 11 dB
/// attenuation for the full input range. A failed conversion reads as
/// zero; the sampler averages it away or the receiver sees a low outlier.
pub struct BatteryAdc<'d> {
    channel: AdcChannelDriver<'d, Gpio36, AdcDriver<'d, ADC1>>,
}

impl<'d> BatteryAdc<'d> {
    pub fn new(adc: ADC1, pin: Gpio36) -> anyhow::Result<Self> {
        let driver = AdcDriver::new(adc)?;
        let config = AdcChannelConfig {
            attenuation: DB_11,
            ..Default::default()
        };
        let channel = AdcChannelDriver::new(driver, pin, &config)?;
        Ok(Self { channel })
    }
}

impl AnalogSource for BatteryAdc<'_> {
    fn read_raw(&mut self) -> u16 {
        self.channel.read().unwrap_or_else(|e| {
            warn!("ADC read failed: {e}");
            0
        })
    }
}

/// SX1276 on the primary SPI bus behind the [`RadioLink`] seam.
pub struct EspLoraRadio<'d> {
    driver: Sx1276<
        spi::SpiDeviceDriver<'d, spi::SpiDriver<'d>>,
        PinDriver<'d, AnyOutputPin, Output>,
        Delay,
    >,
}

impl<'d> EspLoraRadio<'d> {
    pub fn new(
        spi: spi::SpiDeviceDriver<'d, spi::SpiDriver<'d>>,
        reset: PinDriver<'d, AnyOutputPin, Output>,
    ) -> Self {
        Self {
            driver: Sx1276::new(spi, reset, Delay::new_default()),
        }
    }
}

impl RadioLink for EspLoraRadio<'_> {
    fn begin(&mut self, band_hz: u64, sync_word: u8) -> anyhow::Result<()> {
        self.driver.begin(band_hz).map_err(|e| anyhow!("{e}"))?;
        self.driver.set_sync_word(sync_word).map_err(|e| anyhow!("{e}"))?;
        Ok(())
    }

    fn transmit(&mut self, frame: &[u8]) -> anyhow::Result<()> {
        self.driver.transmit(frame).map_err(|e| anyhow!("{e}"))
    }
}

#[derive(Default)]
pub struct EspPower;

impl PowerControl for EspPower {
    fn bluetooth_off(&mut self) {
        // never used; hand the BT controller memory back to the heap
        #[cfg(esp_idf_bt_enabled)]
        unsafe {
            let _ = esp_idf_sys::esp_bt_controller_mem_release(
                esp_idf_sys::esp_bt_mode_t_ESP_BT_MODE_BTDM,
            );
        }
        info!("Bluetooth controller off");
    }

    fn deep_sleep(&mut self, after: Duration) {
        unsafe {
            esp_idf_sys::esp_sleep_enable_timer_wakeup(after.as_micros() as u64);
            esp_idf_sys::esp_deep_sleep_start();
        }
    }
}
// EOF
