//! boot-test - boot a directly-attached target and wait for a marker.
//!
//! The target is either a command run on a fresh pty (an emulator with its
//! serial port on stdio) or a serial device node configured beforehand.

use anyhow::{bail, Result};
use boot_tests::{logging, report, BootTest, BootTestConfig, DirectTransport, ExpectedPrint};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "boot-test")]
#[command(about = "Boot test for a directly-attached target")]
struct Cli {
    /// TOML config file (default: $BOOT_TESTS_CONFIG, else built-in defaults)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seconds to wait for the marker
    #[arg(long)]
    timeout: Option<u64>,

    /// Marker that signals a successful boot
    #[arg(long)]
    expect: Option<String>,

    /// Read from a serial device node instead of spawning a command
    #[arg(long, conflicts_with = "command")]
    device: Option<PathBuf>,

    /// Print target output live
    #[arg(long)]
    echo: bool,

    /// Also write the report as JSON
    #[arg(long)]
    json: Option<PathBuf>,

    /// Target command line
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

fn main() -> Result<()> {
    logging::init();
    let cli = Cli::parse();

    let mut config = BootTestConfig::load(cli.config.as_deref())?;
    if let Some(secs) = cli.timeout {
        config.expect_timeout_secs = secs;
    }
    if let Some(marker) = cli.expect {
        config.expected_print = marker;
    }
    config.echo |= cli.echo;
    config.validate()?;

    let transport = match (cli.device, cli.command.is_empty()) {
        (Some(path), _) => DirectTransport::device(path, config.device_terminator.clone()),
        (None, false) => {
            DirectTransport::command(cli.command.join(" "), config.line_terminator.clone())
        }
        (None, true) => bail!("Either --device or a target command is required"),
    }
    .echo(config.echo);

    report::header(
        "Boot test",
        &format!("Checking for the string: '{}'", config.expected_print),
    );
    let result = BootTest::new("Boot test", transport)
        .subtest(ExpectedPrint::new(
            config.expected_print.clone(),
            config.expect_timeout(),
        ))
        .tail_lines(config.tail_lines)
        .progress(true)
        .run();
    report::print(&result);

    if let Some(path) = &cli.json {
        report::write_json(&result, path)?;
    }

    if result.passed() {
        Ok(())
    } else {
        bail!("Boot test failed")
    }
}
