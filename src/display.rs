// display.rs — SSD1306 status panel

use anyhow::anyhow;
use embedded_graphics::mono_font::ascii::FONT_6X10;
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};
use esp_idf_hal::i2c::I2cDriver;
use ssd1306::mode::BufferedGraphicsMode;
use ssd1306::prelude::*;
use ssd1306::{I2CDisplayInterface, Ssd1306};

use crate::*;

const LINE_HEIGHT: i32 = 12;

type Panel<'d> = Ssd1306<
    I2CInterface<I2cDriver<'d>>,
    DisplaySize128x64,
    BufferedGraphicsMode<DisplaySize128x64>,
>;

pub struct Oled<'d> {
    panel: Panel<'d>,
}

impl<'d> Oled<'d> {
    /// Pulse the reset line, then bring the panel up flipped vertically
    /// with a small fixed font.
    pub fn new(
        i2c: I2cDriver<'d>,
        reset: &mut PinDriver<'_, AnyOutputPin, Output>,
    ) -> anyhow::Result<Self> {
        reset.set_low()?;
        FreeRtos::delay_ms(50);
        reset.set_high()?;

        let interface = I2CDisplayInterface::new(i2c);
        let mut panel = Ssd1306::new(interface, DisplaySize128x64, DisplayRotation::Rotate180)
            .into_buffered_graphics_mode();
        panel
            .init()
            .map_err(|e| anyhow!("Display init failed: {e:?}"))?;
        Ok(Self { panel })
    }
}

impl StatusDisplay for Oled<'_> {
    fn show(&mut self, lines: &[&str]) {
        // rendering is best-effort; a dead panel must not stop telemetry
        let style = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);
        let _ = self.panel.clear(BinaryColor::Off);
        for (i, line) in lines.iter().enumerate() {
            let _ = Text::with_baseline(
                line,
                Point::new(0, i as i32 * LINE_HEIGHT),
                style,
                Baseline::Top,
            )
            .draw(&mut self.panel);
        }
        if let Err(e) = self.panel.flush() {
            warn!("Display flush failed: {e:?}");
        }
    }
}
// EOF
