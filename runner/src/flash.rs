//! Erase, program and reset a target before talking to its shell.
use crate::Result;
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

/// Operations a debug probe offers to replace the firmware.
pub trait Flasher {
    /// Erase the whole flash.
    fn erase(&mut self) -> Result<()>;

    /// Program an image, `base_address` applies to raw binaries.
    fn program(&mut self, image: &Path, base_address: u64) -> Result<()>;

    /// Reset the target and wait `delay`, optionally halting the core.
    fn reset(&mut self, delay: Duration, halt: bool) -> Result<()>;
}

impl<F: Flasher + ?Sized> Flasher for &mut F {
    fn erase(&mut self) -> Result<()> {
        (**self).erase()
    }

    fn program(&mut self, image: &Path, base_address: u64) -> Result<()> {
        (**self).program(image, base_address)
    }

    fn reset(&mut self, delay: Duration, halt: bool) -> Result<()> {
        (**self).reset(delay, halt)
    }
}

/// Options for flashing.
#[derive(Debug, Clone)]
pub struct FlashOptions {
    /// Firmware image.
    pub image: PathBuf,
    /// Load address for raw binaries.
    pub base_address: u64,
    /// Erase the whole flash before programming.
    pub erase: bool,
    /// Delay after reset.
    pub reset_delay: Duration,
    /// Keep the core halted after reset.
    pub halt: bool,
}

impl FlashOptions {
    /// Create flash options for an image.
    pub fn new(image: impl Into<PathBuf>) -> Self {
        Self {
            image: image.into(),
            base_address: 0,
            erase: true,
            reset_delay: Duration::from_millis(10),
            halt: false,
        }
    }
}

/// Replace the firmware and restart the target.
pub fn flash(flasher: &mut impl Flasher, options: &FlashOptions) -> Result<()> {
    if options.erase {
        tracing::info!("erasing flash");
        flasher.erase()?;
    }

    tracing::info!(
        image = %options.image.display(),
        base_address = %format_args!("{:#010x}", options.base_address),
        "flashing",
    );
    flasher.program(&options.image, options.base_address)?;

    tracing::info!(halt = %options.halt, "reset device");
    flasher.reset(options.reset_delay, options.halt)?;
    Ok(())
}
