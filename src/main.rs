use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rtt_provision_runner::{
    shell::{
        log::{LogWriter, NoopLogWriter, PrefixLogWriter},
        prompt::DEFAULT_PROMPT,
        transport::{StreamTransport, DEFAULT_PORT},
        RttShell, ShellOptions, Transport, Verdict,
    },
    Report, ScriptFile,
};
use std::{path::PathBuf, time::Duration};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing::Subscriber;
use tracing_subscriber::{
    fmt::MakeWriter, layer::SubscriberExt, registry::LookupSpan,
    util::SubscriberInitExt, EnvFilter, Layer,
};

const LOG_FILE_NAME: &str = "rtt-provision.log";
const STDOUT_FILTER: &str =
    "rtt_provision=info,rtt_provision_runner=info,rtt_shell=info";
// Log files keep the expected responses and raw output of every
// exchange, whatever RUST_LOG says.
const FILE_FILTER: &str =
    "rtt_provision=debug,rtt_provision_runner=debug,rtt_shell=debug";

fn main() -> Result<()> {
    if let Err(e) = start() {
        tracing::error!(error = ?e);
        std::process::exit(1);
    }
    Ok(())
}

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct RttProvision {
    #[clap(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Parse scripts and print the instructions.
    Parse {
        /// Directory to write logs.
        #[clap(short, long)]
        logs: Option<PathBuf>,

        /// Input file paths.
        input: Vec<PathBuf>,
    },
    /// Run scripts against a shell served over TCP.
    ///
    /// The J-Link RTT telnet server listens on port 19021.
    Shell {
        /// Directory to write logs.
        #[clap(short, long)]
        logs: Option<PathBuf>,

        /// Address of the RTT server.
        #[clap(
            short,
            long,
            env = "RTT_ADDR",
            default_value_t = format!("127.0.0.1:{}", DEFAULT_PORT),
        )]
        addr: String,

        #[clap(flatten)]
        shell: ShellArgs,

        /// Input file paths.
        input: Vec<PathBuf>,
    },
    /// List attached debug probes.
    #[cfg(feature = "probe")]
    List,
    /// Flash devices and run scripts against their shells.
    #[cfg(feature = "probe")]
    Run {
        /// Directory to write logs.
        #[clap(short, long)]
        logs: Option<PathBuf>,

        /// Serial number of a probe, repeat for several devices.
        #[clap(short, long = "probe", required = true)]
        probes: Vec<String>,

        /// Target chip.
        #[clap(
            long,
            env = "RTT_CHIP",
            default_value = rtt_provision_runner::probe::DEFAULT_CHIP,
        )]
        chip: String,

        /// Firmware image to flash.
        #[clap(long)]
        image: PathBuf,

        /// Load address for raw binaries.
        #[clap(long, default_value = "0", value_parser = parse_address)]
        base_address: u64,

        /// Program without erasing the whole flash first.
        #[clap(long)]
        no_erase: bool,

        /// Delay after reset in milliseconds.
        #[clap(long, default_value = "10")]
        reset_delay: u64,

        #[clap(flatten)]
        shell: ShellArgs,

        /// Input file paths.
        input: Vec<PathBuf>,
    },
}

/// Options for the shell exchange.
#[derive(Debug, Args)]
pub struct ShellArgs {
    /// Prompt printed by the shell when idle.
    #[clap(long, default_value = DEFAULT_PROMPT)]
    prompt: String,

    /// RTT channel carrying the shell.
    #[clap(short, long, default_value = "0")]
    channel: usize,

    /// Number of polls before a command times out.
    #[clap(long, default_value = "1000")]
    polls: u32,

    /// Delay between polls in milliseconds.
    #[clap(long, default_value = "10")]
    interval: u64,

    /// Maximum bytes taken per read.
    #[clap(long, default_value = "1024")]
    chunk_size: usize,

    /// Print traffic to stdout.
    #[clap(short, long)]
    echo: bool,
}

impl ShellArgs {
    fn options(&self) -> ShellOptions {
        ShellOptions {
            prompt: self.prompt.clone(),
            up_channel: self.channel,
            down_channel: self.channel,
            chunk_size: self.chunk_size,
            max_polls: self.polls,
            poll_interval: Duration::from_millis(self.interval),
        }
    }

    fn logger(&self) -> Box<dyn LogWriter + Send> {
        if self.echo {
            Box::new(PrefixLogWriter::new(std::io::stdout()))
        } else {
            Box::new(NoopLogWriter)
        }
    }
}

#[cfg(feature = "probe")]
fn parse_address(value: &str) -> Result<u64, std::num::ParseIntError> {
    match value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => value.parse(),
    }
}

fn start() -> Result<()> {
    let args = RttProvision::parse();
    match args.cmd {
        Command::Parse { input, logs } => {
            init_subscriber(logs, None)?;
            let scripts = ScriptFile::parse_files(input)?;
            for script in scripts {
                println!("{:#?}", script.instructions());
            }
        }
        Command::Shell {
            logs,
            addr,
            shell,
            input,
        } => {
            init_subscriber(logs, None)?;
            let scripts = ScriptFile::parse_files(input)?;
            tracing::info!(addr = %addr, "connecting to rtt server");
            let stream = StreamTransport::connect(&addr)?.into_inner();
            let transport =
                StreamTransport::with_channel(stream, shell.channel);
            let reports = run_scripts(transport, &shell, &scripts)?;
            if !summarize(&addr, &reports) {
                std::process::exit(1);
            }
        }
        #[cfg(feature = "probe")]
        Command::List => {
            for probe in rtt_provision_runner::probe::list_probes() {
                println!(
                    "{} {}",
                    probe.serial_number.as_deref().unwrap_or("-"),
                    probe.identifier,
                );
            }
        }
        #[cfg(feature = "probe")]
        Command::Run {
            logs,
            probes,
            chip,
            image,
            base_address,
            no_erase,
            reset_delay,
            shell,
            input,
        } => {
            use rayon::prelude::*;
            use rtt_provision_runner::{
                flash::{flash, FlashOptions},
                probe::ProbeDevice,
            };

            init_subscriber(logs, None)?;
            let scripts = ScriptFile::parse_files(input)?;
            let mut options = FlashOptions::new(image);
            options.base_address = base_address;
            options.erase = !no_erase;
            options.reset_delay = Duration::from_millis(reset_delay);

            let results: Vec<(String, Result<Vec<Report>>)> = probes
                .par_iter()
                .map(|serial| {
                    let span = tracing::info_span!("device", serial = %serial);
                    let _enter = span.enter();
                    let result = (|| -> Result<Vec<Report>> {
                        let mut device = ProbeDevice::open(serial, &chip)?;
                        flash(&mut device, &options)?;
                        device.start_rtt(100)?;
                        run_scripts(device, &shell, &scripts)
                    })();
                    (serial.clone(), result)
                })
                .collect();

            let mut passed = true;
            for (serial, result) in results {
                match result {
                    Ok(reports) => passed &= summarize(&serial, &reports),
                    Err(e) => {
                        tracing::error!(serial = %serial, error = ?e);
                        println!("{} {}", serial.bold(), "ERROR".red());
                        passed = false;
                    }
                }
            }
            if !passed {
                std::process::exit(1);
            }
        }
    }
    Ok(())
}

fn run_scripts<T: Transport>(
    transport: T,
    args: &ShellArgs,
    scripts: &[ScriptFile],
) -> Result<Vec<Report>> {
    let mut shell =
        RttShell::with_logger(transport, args.logger(), args.options());
    let mut reports = Vec::new();
    for script in scripts {
        reports.push(script.run(&mut shell)?);
    }
    Ok(reports)
}

/// Print the outcome of every step, returns whether all passed.
fn summarize(device: &str, reports: &[Report]) -> bool {
    let mut passed = true;
    for report in reports {
        println!("{} {}", device.bold(), report.path().display());
        for outcome in report.outcomes() {
            let label =
                format!("{:<8}", outcome.verdict.to_string().to_uppercase());
            let verdict = match outcome.verdict {
                Verdict::Pass => label.green(),
                Verdict::Fail => label.red(),
                Verdict::Timeout => label.yellow(),
            };
            match &outcome.response {
                Some(response) => {
                    println!("  {}{} => {}", verdict, outcome.step, response)
                }
                None => println!("  {}{}", verdict, outcome.step),
            }
        }
        passed &= report.passed();
    }
    passed
}

pub fn init_subscriber(
    logs_dir: Option<PathBuf>,
    default_log_level: Option<String>,
) -> Result<()> {
    let default_log_level =
        default_log_level.unwrap_or_else(|| STDOUT_FILTER.to_owned());
    let stdout_filter =
        EnvFilter::new(std::env::var("RUST_LOG").unwrap_or(default_log_level));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_file(false)
        .with_line_number(false)
        .with_target(false)
        .with_filter(stdout_filter);
    let file_layer = logs_dir.map(|logs_dir| {
        file_layer(RollingFileAppender::new(
            Rotation::DAILY,
            logs_dir,
            LOG_FILE_NAME,
        ))
    });

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(file_layer)
        .try_init()?;

    Ok(())
}

/// JSON layer with its own debug filter.
///
/// Events carry the `device` span, so runs against several probes can
/// share one file.
fn file_layer<S, W>(writer: W) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt::layer()
        .with_file(false)
        .with_line_number(false)
        .with_ansi(false)
        .json()
        .with_writer(writer)
        .with_filter(EnvFilter::new(FILE_FILTER))
}
