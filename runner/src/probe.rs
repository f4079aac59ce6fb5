//! Debug probe backend built on probe-rs.
//!
//! A [ProbeDevice] is both the [Flasher] used to replace the firmware
//! and the [Transport] carrying the RTT shell afterwards.
use crate::{flash::Flasher, Error, Result};
use probe_rs::{
    flashing::{self, BinOptions, FlashProgress, Format},
    probe::{list::Lister, WireProtocol},
    rtt::Rtt,
    Permissions, Session,
};
use rtt_shell::Transport;
use std::{path::Path, thread::sleep, time::Duration};

/// Target used when none is given.
pub const DEFAULT_CHIP: &str = "nRF52840_xxAA";

/// Attached debug probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeInfo {
    /// Probe description.
    pub identifier: String,
    /// Serial number if the probe reports one.
    pub serial_number: Option<String>,
}

/// List attached debug probes.
pub fn list_probes() -> Vec<ProbeInfo> {
    Lister::new()
        .list_all()
        .into_iter()
        .map(|info| ProbeInfo {
            identifier: info.identifier.clone(),
            serial_number: info.serial_number.clone(),
        })
        .collect()
}

/// Target connected through a debug probe.
pub struct ProbeDevice {
    serial: String,
    session: Session,
    rtt: Option<Rtt>,
}

impl std::fmt::Debug for ProbeDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProbeDevice")
            .field("serial", &self.serial)
            .field("rtt", &self.rtt.is_some())
            .finish()
    }
}

impl ProbeDevice {
    /// Open the probe with a serial number and attach to the target over SWD.
    pub fn open(serial: &str, chip: &str) -> Result<Self> {
        let info = Lister::new()
            .list_all()
            .into_iter()
            .find(|info| info.serial_number.as_deref() == Some(serial))
            .ok_or_else(|| Error::ProbeNotFound(serial.to_owned()))?;

        tracing::info!(probe = %info.identifier, "connecting to probe");
        let mut probe = info.open().map_err(Error::probe)?;
        probe
            .select_protocol(WireProtocol::Swd)
            .map_err(Error::probe)?;

        tracing::info!(chip = %chip, "connecting to device");
        let session = probe
            .attach(chip, Permissions::default())
            .map_err(Error::probe)?;

        Ok(Self {
            serial: serial.to_owned(),
            session,
            rtt: None,
        })
    }

    /// Serial number of the probe.
    pub fn serial(&self) -> &str {
        &self.serial
    }

    /// Attach to the RTT control block.
    ///
    /// The firmware sets up the control block shortly after reset so
    /// the attach is retried once per millisecond.
    pub fn start_rtt(&mut self, attempts: u32) -> Result<()> {
        let mut core = self.session.core(0).map_err(Error::probe)?;
        let mut waited = 0;
        let mut rtt = loop {
            match Rtt::attach(&mut core) {
                Ok(rtt) => break rtt,
                Err(err) if waited + 1 >= attempts => {
                    return Err(Error::probe(err));
                }
                Err(_) => {
                    waited += 1;
                    sleep(Duration::from_millis(1));
                }
            }
        };

        tracing::info!(
            up = %rtt.up_channels().len(),
            down = %rtt.down_channels().len(),
            waited_ms = %waited,
            "rtt started",
        );
        for channel in rtt.up_channels().iter() {
            tracing::debug!(
                number = %channel.number(),
                name = ?channel.name(),
                size = %channel.buffer_size(),
                "up channel",
            );
        }
        for channel in rtt.down_channels().iter() {
            tracing::debug!(
                number = %channel.number(),
                name = ?channel.name(),
                size = %channel.buffer_size(),
                "down channel",
            );
        }

        self.rtt = Some(rtt);
        Ok(())
    }
}

impl Flasher for ProbeDevice {
    fn erase(&mut self) -> Result<()> {
        flashing::erase_all(&mut self.session, FlashProgress::new(|_| {}))
            .map_err(Error::probe)
    }

    fn program(&mut self, image: &Path, base_address: u64) -> Result<()> {
        let format = match image.extension().and_then(|e| e.to_str()) {
            Some("hex") | Some("ihex") => Format::Hex,
            Some("elf") | Some("axf") | None => Format::Elf,
            Some(_) => Format::Bin(BinOptions {
                base_address: Some(base_address),
                skip: 0,
            }),
        };
        flashing::download_file(&mut self.session, image, format)
            .map_err(Error::probe)
    }

    fn reset(&mut self, delay: Duration, halt: bool) -> Result<()> {
        // Control blocks from the previous firmware are stale.
        self.rtt = None;
        let mut core = self.session.core(0).map_err(Error::probe)?;
        if halt {
            core.reset_and_halt(delay).map_err(Error::probe)?;
        } else {
            core.reset().map_err(Error::probe)?;
            sleep(delay);
        }
        Ok(())
    }
}

impl Transport for ProbeDevice {
    fn read(
        &mut self,
        channel: usize,
        buf: &mut [u8],
    ) -> std::result::Result<usize, rtt_shell::Error> {
        let up = self
            .rtt
            .as_mut()
            .and_then(|rtt| rtt.up_channel(channel))
            .ok_or(rtt_shell::Error::UnknownChannel(channel))?;
        let mut core =
            self.session.core(0).map_err(rtt_shell::Error::transport)?;
        up.read(&mut core, buf).map_err(rtt_shell::Error::transport)
    }

    fn write(
        &mut self,
        channel: usize,
        data: &[u8],
    ) -> std::result::Result<usize, rtt_shell::Error> {
        let down = self
            .rtt
            .as_mut()
            .and_then(|rtt| rtt.down_channel(channel))
            .ok_or(rtt_shell::Error::UnknownChannel(channel))?;
        let mut core =
            self.session.core(0).map_err(rtt_shell::Error::transport)?;
        down.write(&mut core, data)
            .map_err(rtt_shell::Error::transport)
    }
}
