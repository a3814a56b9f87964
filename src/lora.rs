// lora.rs — register-level SX1276 LoRa driver, TX only

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::{Operation, SpiDevice};

use crate::*;

// Register map (SX1276 datasheet, LoRa page)
const REG_FIFO: u8 = 0x00;
const REG_OP_MODE: u8 = 0x01;
const REG_FRF_MSB: u8 = 0x06;
const REG_FRF_MID: u8 = 0x07;
const REG_FRF_LSB: u8 = 0x08;
const REG_PA_CONFIG: u8 = 0x09;
const REG_LNA: u8 = 0x0C;
const REG_FIFO_ADDR_PTR: u8 = 0x0D;
const REG_FIFO_TX_BASE_ADDR: u8 = 0x0E;
const REG_FIFO_RX_BASE_ADDR: u8 = 0x0F;
const REG_IRQ_FLAGS: u8 = 0x12;
const REG_PAYLOAD_LENGTH: u8 = 0x22;
const REG_MODEM_CONFIG_3: u8 = 0x26;
const REG_SYNC_WORD: u8 = 0x39;
const REG_VERSION: u8 = 0x42;

// RegOpMode bits
const MODE_LONG_RANGE: u8 = 0x80;
const MODE_SLEEP: u8 = 0x00;
const MODE_STDBY: u8 = 0x01;
const MODE_TX: u8 = 0x03;

// RegIrqFlags bits
const IRQ_TX_DONE: u8 = 0x08;

// SPI address byte: MSB set selects write access
const WRITE: u8 = 0x80;

/// Silicon revision a live SX1276 reports.
const CHIP_VERSION: u8 = 0x12;

const XTAL_HZ: u64 = 32_000_000;

// TX-done is polled over SPI; a short frame at moderate spreading is on
// the air well under a second
const TX_DONE_POLLS: u32 = 100;
const TX_DONE_POLL_MS: u32 = 10;

#[derive(Debug, thiserror::Error)]
pub enum LoraError<E> {
    #[error("SPI error: {0:?}")]
    Spi(E),
    #[error("reset pin error")]
    Reset,
    #[error("no SX1276 on the bus (version 0x{0:02X})")]
    WrongVersion(u8),
    #[error("TX done flag never rose")]
    TxTimeout,
}

/// Minimal transmitter for the SX1276. The receive paths are
/// intentionally absent; this device only ever talks.
pub struct Sx1276<SPI, RST, D> {
    spi: SPI,
    reset: RST,
    delay: D,
}

impl<SPI, RST, D> Sx1276<SPI, RST, D>
where
    SPI: SpiDevice,
    RST: OutputPin,
    D: DelayNs,
{
    pub fn new(spi: SPI, reset: RST, delay: D) -> Self {
        Self { spi, reset, delay }
    }

    fn write_register(&mut self, reg: u8, value: u8) -> Result<(), LoraError<SPI::Error>> {
        self.spi.write(&[reg | WRITE, value]).map_err(LoraError::Spi)
    }

    fn read_register(&mut self, reg: u8) -> Result<u8, LoraError<SPI::Error>> {
        let mut buf = [reg & !WRITE, 0x00];
        self.spi.transfer_in_place(&mut buf).map_err(LoraError::Spi)?;
        Ok(buf[1])
    }

    fn write_fifo(&mut self, data: &[u8]) -> Result<(), LoraError<SPI::Error>> {
        self.spi
            .transaction(&mut [
                Operation::Write(&[REG_FIFO | WRITE]),
                Operation::Write(data),
            ])
            .map_err(LoraError::Spi)
    }

    /// Hardware reset, chip check, LoRa-mode base configuration. Fails
    /// when the module on the bus is missing or the wrong type.
    pub fn begin(&mut self, frequency_hz: u64) -> Result<(), LoraError<SPI::Error>> {
        self.reset.set_low().map_err(|_| LoraError::Reset)?;
        self.delay.delay_ms(10);
        self.reset.set_high().map_err(|_| LoraError::Reset)?;
        self.delay.delay_ms(10);

        let version = self.read_register(REG_VERSION)?;
        if version != CHIP_VERSION {
            return Err(LoraError::WrongVersion(version));
        }

        // LoRa mode is only selectable from sleep
        self.write_register(REG_OP_MODE, MODE_LONG_RANGE | MODE_SLEEP)?;
        self.set_frequency(frequency_hz)?;

        // whole FIFO for the TX buffer, single-packet use
        self.write_register(REG_FIFO_TX_BASE_ADDR, 0x00)?;
        self.write_register(REG_FIFO_RX_BASE_ADDR, 0x00)?;

        // LNA boost, automatic AGC, PA_BOOST at 17 dBm
        let lna = self.read_register(REG_LNA)?;
        self.write_register(REG_LNA, lna | 0x03)?;
        self.write_register(REG_MODEM_CONFIG_3, 0x04)?;
        self.write_register(REG_PA_CONFIG, 0x8F)?;

        self.write_register(REG_OP_MODE, MODE_LONG_RANGE | MODE_STDBY)?;
        info!("SX1276: version 0x{version:02X}, {frequency_hz} Hz, standby");
        Ok(())
    }

    fn set_frequency(&mut self, frequency_hz: u64) -> Result<(), LoraError<SPI::Error>> {
        // Frf = freq * 2^19 / Fxtal
        let frf = (frequency_hz << 19) / XTAL_HZ;
        self.write_register(REG_FRF_MSB, (frf >> 16) as u8)?;
        self.write_register(REG_FRF_MID, (frf >> 8) as u8)?;
        self.write_register(REG_FRF_LSB, frf as u8)
    }

    /// Sync word, a crude channel filter checked by the receiver.
    pub fn set_sync_word(&mut self, word: u8) -> Result<(), LoraError<SPI::Error>> {
        self.write_register(REG_SYNC_WORD, word)
    }

    /// Single-shot transmit: frame into the FIFO, TX mode, poll the
    /// TX-done flag, clear it. Blocks for the airtime of the frame.
    pub fn transmit(&mut self, frame: &[u8]) -> Result<(), LoraError<SPI::Error>> {
        debug_assert!(frame.len() <= 255);

        self.write_register(REG_OP_MODE, MODE_LONG_RANGE | MODE_STDBY)?;
        self.write_register(REG_FIFO_ADDR_PTR, 0x00)?;
        self.write_fifo(frame)?;
        self.write_register(REG_PAYLOAD_LENGTH, frame.len() as u8)?;
        self.write_register(REG_OP_MODE, MODE_LONG_RANGE | MODE_TX)?;

        for _ in 0..TX_DONE_POLLS {
            let flags = self.read_register(REG_IRQ_FLAGS)?;
            if flags & IRQ_TX_DONE != 0 {
                self.write_register(REG_IRQ_FLAGS, IRQ_TX_DONE)?;
                return Ok(());
            }
            self.delay.delay_ms(TX_DONE_POLL_MS);
        }
        Err(LoraError::TxTimeout)
    }
}

// EOF
