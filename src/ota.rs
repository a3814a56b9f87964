// ota.rs — remote firmware update lifecycle

use core::fmt;

/// Lifecycle of one remote update attempt, surfaced to the display and
/// log only. The listener owns the flashing; the controller never steers
/// or retries an update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateEvent {
    Started,
    Progress(u8),
    Error(UpdateErrorKind),
    Ended,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateErrorKind {
    Begin,
    Receive,
    Finalize,
}

impl fmt::Display for UpdateErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateErrorKind::Begin => write!(f, "Begin Failed"),
            UpdateErrorKind::Receive => write!(f, "Receive Failed"),
            UpdateErrorKind::Finalize => write!(f, "End Failed"),
        }
    }
}

#[cfg(target_os = "espidf")]
mod listener {
    use std::sync::mpsc;

    use embedded_svc::http::{Headers, Method};
    use embedded_svc::io::{Read, Write};
    use esp_idf_svc::http::server::{Configuration as HttpConfig, EspHttpServer};

    use crate::*;

    const OTA_CHUNK: usize = 4096;

    /// Push-style update channel: POST the new image to `/update`. The
    /// handler runs on the http server task and reports through an mpsc
    /// channel the service loop drains; a complete flash reboots into the
    /// new slot.
    pub struct OtaListener {
        server: Option<EspHttpServer<'static>>,
        tx: mpsc::Sender<UpdateEvent>,
        rx: mpsc::Receiver<UpdateEvent>,
    }

    impl OtaListener {
        pub fn new() -> Self {
            let (tx, rx) = mpsc::channel();
            Self {
                server: None,
                tx,
                rx,
            }
        }
    }

    impl Default for OtaListener {
        fn default() -> Self {
            Self::new()
        }
    }

    impl UpdateService for OtaListener {
        fn begin(&mut self) -> anyhow::Result<()> {
            let mut server = EspHttpServer::new(&HttpConfig::default())?;
            let events = self.tx.clone();

            server.fn_handler::<anyhow::Error, _>("/update", Method::Post, move |mut req| {
                let total = req
                    .header("Content-Length")
                    .and_then(|v| v.parse::<usize>().ok());
                let _ = events.send(UpdateEvent::Started);

                let mut ota = match EspOta::new() {
                    Ok(ota) => ota,
                    Err(e) => {
                        let _ = events.send(UpdateEvent::Error(UpdateErrorKind::Begin));
                        bail!("OTA begin failed: {e}");
                    }
                };
                let mut update = match ota.initiate_update() {
                    Ok(update) => update,
                    Err(e) => {
                        let _ = events.send(UpdateEvent::Error(UpdateErrorKind::Begin));
                        bail!("OTA initiate failed: {e}");
                    }
                };

                let mut buf = [0u8; OTA_CHUNK];
                let mut written = 0usize;
                let mut last_pct = 0u8;
                loop {
                    let n = match req.read(&mut buf) {
                        Ok(n) => n,
                        Err(e) => {
                            let _ = events.send(UpdateEvent::Error(UpdateErrorKind::Receive));
                            let _ = update.abort();
                            bail!("OTA receive failed: {e:?}");
                        }
                    };
                    if n == 0 {
                        break;
                    }
                    if let Err(e) = update.write_all(&buf[..n]) {
                        let _ = events.send(UpdateEvent::Error(UpdateErrorKind::Receive));
                        let _ = update.abort();
                        bail!("OTA write failed: {e:?}");
                    }
                    written += n;
                    if let Some(total) = total.filter(|t| *t > 0) {
                        let pct = (written * 100 / total).min(100) as u8;
                        if pct != last_pct {
                            let _ = events.send(UpdateEvent::Progress(pct));
                            last_pct = pct;
                        }
                    }
                }

                if let Err(e) = update.complete() {
                    let _ = events.send(UpdateEvent::Error(UpdateErrorKind::Finalize));
                    bail!("OTA finalize failed: {e}");
                }
                let _ = events.send(UpdateEvent::Ended);
                info!("OTA image written ({written} bytes), rebooting");

                req.into_ok_response()?.write_all(b"OK\n")?;
                esp_idf_hal::reset::restart();
            })?;

            self.server = Some(server);
            info!("OTA listener on /update");
            Ok(())
        }

        fn poll(&mut self) -> Option<UpdateEvent> {
            self.rx.try_recv().ok()
        }
    }
}

#[cfg(target_os = "espidf")]
pub use listener::OtaListener;
// EOF
