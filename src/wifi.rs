// wifi.rs — best-effort station join with optional fixed addressing

use esp_idf_hal::modem::Modem;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::ipv4;
use esp_idf_svc::netif::{EspNetif, NetifConfiguration};
use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration, EspWifi};

use crate::*;

/// Settle time after a join before traffic.
pub const WIFI_SETTLE_MS: u32 = 2000;
/// Bounded wait for the access point; the tank may simply be out of
/// range, and the caller proceeds either way.
const JOIN_WAIT_MS: u32 = 10_000;
const JOIN_POLL_MS: u32 = 300;

pub struct WifiLink<'d> {
    wifi: EspWifi<'d>,
    config: MyConfig,
}

impl<'d> WifiLink<'d> {
    pub fn new(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs_partition: Option<nvs::EspDefaultNvsPartition>,
        config: &MyConfig,
    ) -> anyhow::Result<Self> {
        let mut wifi = EspWifi::new(modem, sysloop, nvs_partition)?;

        if !config.v4dhcp {
            let netif = EspNetif::new_with_conf(&NetifConfiguration {
                ip_configuration: Some(ipv4::Configuration::Client(
                    ipv4::ClientConfiguration::Fixed(ipv4::ClientSettings {
                        ip: config.v4addr,
                        subnet: ipv4::Subnet {
                            gateway: config.v4gw,
                            mask: ipv4::Mask(config.v4mask),
                        },
                        dns: Some(config.dns1),
                        secondary_dns: Some(config.dns2),
                    }),
                )),
                ..NetifConfiguration::wifi_default_client()
            })?;
            wifi.swap_netif_sta(netif)?;
        }

        Ok(Self {
            wifi,
            config: config.clone(),
        })
    }
}

impl NetworkControl for WifiLink<'_> {
    fn join(&mut self) -> anyhow::Result<()> {
        let ssid = self.config.wifi_ssid.clone();
        self.wifi
            .set_configuration(&Configuration::Client(ClientConfiguration {
                ssid: ssid
                    .as_str()
                    .try_into()
                    .map_err(|_| AppError::Message("SSID too long".into()))?,
                password: self
                    .config
                    .wifi_pass
                    .as_str()
                    .try_into()
                    .map_err(|_| AppError::Message("passphrase too long".into()))?,
                auth_method: if self.config.wifi_pass.is_empty() {
                    AuthMethod::None
                } else {
                    AuthMethod::WPA2Personal
                },
                ..Default::default()
            }))?;

        self.wifi.start()?;
        self.wifi.connect()?;

        info!("Connecting to WiFi {ssid}...");
        let mut waited = 0;
        while !self.wifi.is_connected()? {
            if waited >= JOIN_WAIT_MS {
                bail!("no connection to {ssid} after {JOIN_WAIT_MS} ms");
            }
            FreeRtos::delay_ms(JOIN_POLL_MS);
            waited += JOIN_POLL_MS;
        }

        FreeRtos::delay_ms(WIFI_SETTLE_MS);
        if let Ok(ip) = self.wifi.sta_netif().get_ip_info() {
            info!("Connected to {ssid}: {ip:?}");
        }
        Ok(())
    }

    fn power_off(&mut self) {
        let _ = self.wifi.disconnect();
        let _ = self.wifi.stop();
    }
}
// EOF
