// bin/esp32lorasend.rs

#[cfg(target_os = "espidf")]
fn main() -> anyhow::Result<()> {
    use esp_idf_svc::eventloop::EspSystemEventLoop;

    use esp32lorasend::*;

    esp_idf_sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    info!("Hello.");
    info!("Starting up, fw v{FW_VERSION}");

    let sysloop = EspSystemEventLoop::take()?;
    let nvs_default_partition = nvs::EspDefaultNvsPartition::take()?;

    let ns = env!("CARGO_BIN_NAME");
    let mut nvs = match nvs::EspNvs::new(nvs_default_partition.clone(), ns, true) {
        Ok(nvs) => {
            info!("Got namespace {ns:?} from default partition");
            nvs
        }
        Err(e) => panic!("Could not get namespace {ns}: {e:?}"),
    };

    let config = match MyConfig::from_nvs(&mut nvs) {
        None => {
            error!("Could not read nvs config, using defaults");
            let c = MyConfig::default();
            c.to_nvs(&mut nvs)?;
            info!("Successfully saved default config to nvs.");
            c
        }
        Some(c) => c,
    };
    info!("My config:\n{config:#?}");

    {
        let mut ota = EspOta::new()?;
        let running_slot = ota.get_running_slot()?;
        ota.mark_running_slot_valid()?;
        info!("OTA slot: {} ({:?})", running_slot.label, running_slot.state);
    }

    let peripherals = Peripherals::take()?;
    let pins = peripherals.pins;

    // TTGO LoRa32 pin map.
    // SX1276 SPI: GPIO5=SCK, GPIO27=MOSI, GPIO19=MISO, GPIO18=CS,
    // GPIO14=RESET. GPIO26 is DIO0; unused, TX-done is polled over SPI.
    let driver = spi::SpiDriver::new(
        peripherals.spi2,
        pins.gpio5,
        pins.gpio27,
        Some(pins.gpio19),
        &spi::SpiDriverConfig::new(),
    )?;
    let spi_cfg = spi::config::Config::new().baudrate(8.MHz().into());
    let dev = spi::SpiDeviceDriver::new(driver, Some(pins.gpio18), &spi_cfg)?;
    let lora_reset = PinDriver::output(pins.gpio14.downgrade_output())?;
    let radio = EspLoraRadio::new(dev, lora_reset);

    // OLED: GPIO4=SDA, GPIO15=SCL, reset on GPIO16
    let i2c = i2c::I2cDriver::new(
        peripherals.i2c0,
        pins.gpio4,
        pins.gpio15,
        &i2c::config::Config::new().baudrate(400.kHz().into()),
    )?;
    let mut oled_reset = PinDriver::output(pins.gpio16.downgrade_output())?;
    let display = Oled::new(i2c, &mut oled_reset)?;

    // water sensor loop: excitation on GPIO13, switch on GPIO21
    let trigger = PinDriver::output(pins.gpio13.downgrade_output())?;
    let mut sense = PinDriver::input(pins.gpio21.downgrade_input())?;
    sense.set_pull(Pull::Up)?;

    // battery divider on GPIO36 (VP)
    let battery = BatteryAdc::new(peripherals.adc1, pins.gpio36)?;

    // PRG button doubles as the stay-awake key; on-board LED on GPIO25
    let key = EspInput(PinDriver::input(pins.gpio0.downgrade_input())?);
    let led = EspOutput(PinDriver::output(pins.gpio25.downgrade_output())?);

    let clock = EspClock;
    let sensors = TankSensors {
        battery: VoltageSampler::new(battery, clock, config.cal),
        water: WaterLevelSensor::new(EspOutput(trigger), EspInput(sense), clock),
    };

    let net = WifiLink::new(
        peripherals.modem,
        sysloop,
        Some(nvs_default_partition),
        &config,
    )?;
    let updates = OtaListener::new();

    let controller = BootController {
        sensors,
        radio,
        display,
        net,
        updates,
        power: EspPower,
        key,
        led,
        clock,
        band_hz: config.radio_band_hz,
        sync_word: config.radio_sync_word,
    };

    let term = controller.run();

    // Halted, or an unexpected return from the deep-sleep request: park
    // until someone power-cycles the box.
    error!("Boot controller finished: {term:?}");
    loop {
        FreeRtos::delay_ms(1000);
    }
}

#[cfg(not(target_os = "espidf"))]
fn main() {
    println!("esp32lorasend only runs on the ESP32 target.");
    println!("Use `cargo test` for the host-side suite.");
}
// EOF
