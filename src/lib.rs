// lib.rs

pub use std::net;

pub use anyhow::bail;
pub use log::{error, info, warn};
pub use serde::{Deserialize, Serialize};

#[cfg(target_os = "espidf")]
pub use esp_idf_hal::prelude::*;
#[cfg(target_os = "espidf")]
pub use esp_idf_hal::{
    delay::FreeRtos,
    gpio::{AnyInputPin, AnyOutputPin, Input, InputPin, Output, OutputPin, PinDriver, Pull},
    i2c, spi,
};
#[cfg(target_os = "espidf")]
pub use esp_idf_svc::nvs;
#[cfg(target_os = "espidf")]
pub use esp_idf_svc::ota::EspOta;

pub const FW_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Message(String),
}

pub type AppResult<T> = Result<T, AppError>;

mod config;
pub use config::*;

mod hw;
pub use hw::*;

mod packet;
pub use packet::*;

mod sampler;
pub use sampler::*;

mod waterlevel;
pub use waterlevel::*;

pub mod lora;
pub use lora::Sx1276;

mod boot;
pub use boot::*;

mod ota;
pub use ota::*;

#[cfg(target_os = "espidf")]
mod esp;
#[cfg(target_os = "espidf")]
pub use esp::*;

#[cfg(target_os = "espidf")]
mod display;
#[cfg(target_os = "espidf")]
pub use display::*;

#[cfg(target_os = "espidf")]
mod wifi;
#[cfg(target_os = "espidf")]
pub use wifi::*;

#[cfg(test)]
pub(crate) mod testutil;

// EOF
