use anyhow::Result;
use rtt_provision_runner::flash::{flash, FlashOptions, Flasher};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

#[derive(Debug, PartialEq, Eq)]
enum Call {
    Erase,
    Program(PathBuf, u64),
    Reset(Duration, bool),
}

#[derive(Default)]
struct MockFlasher {
    calls: Vec<Call>,
}

impl Flasher for MockFlasher {
    fn erase(&mut self) -> rtt_provision_runner::Result<()> {
        self.calls.push(Call::Erase);
        Ok(())
    }

    fn program(
        &mut self,
        image: &Path,
        base_address: u64,
    ) -> rtt_provision_runner::Result<()> {
        self.calls.push(Call::Program(image.to_owned(), base_address));
        Ok(())
    }

    fn reset(
        &mut self,
        delay: Duration,
        halt: bool,
    ) -> rtt_provision_runner::Result<()> {
        self.calls.push(Call::Reset(delay, halt));
        Ok(())
    }
}

#[test]
fn flash_erase_program_reset() -> Result<()> {
    let mut flasher = MockFlasher::default();
    let options = FlashOptions::new("firmware.hex");
    flash(&mut flasher, &options)?;
    assert_eq!(
        vec![
            Call::Erase,
            Call::Program(PathBuf::from("firmware.hex"), 0),
            Call::Reset(Duration::from_millis(10), false),
        ],
        flasher.calls
    );
    Ok(())
}

#[test]
fn flash_without_erase() -> Result<()> {
    let mut flasher = MockFlasher::default();
    let mut options = FlashOptions::new("firmware.bin");
    options.erase = false;
    options.base_address = 0x1000;
    options.halt = true;
    flash(&mut flasher, &options)?;
    assert_eq!(
        vec![
            Call::Program(PathBuf::from("firmware.bin"), 0x1000),
            Call::Reset(Duration::from_millis(10), true),
        ],
        flasher.calls
    );
    Ok(())
}

#[test]
fn flash_stops_on_error() -> Result<()> {
    struct Broken;

    impl Flasher for Broken {
        fn erase(&mut self) -> rtt_provision_runner::Result<()> {
            Err(std::io::Error::other("erase failed").into())
        }

        fn program(
            &mut self,
            _image: &Path,
            _base_address: u64,
        ) -> rtt_provision_runner::Result<()> {
            panic!("program after failed erase");
        }

        fn reset(
            &mut self,
            _delay: Duration,
            _halt: bool,
        ) -> rtt_provision_runner::Result<()> {
            panic!("reset after failed erase");
        }
    }

    let result = flash(&mut Broken, &FlashOptions::new("firmware.hex"));
    assert!(matches!(result, Err(rtt_provision_runner::Error::Io(_))));
    Ok(())
}
