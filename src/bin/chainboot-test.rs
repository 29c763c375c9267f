//! chainboot-test - boot a payload chainloaded into an emulated target.
//!
//! Usage: `chainboot-test [OPTIONS] <EMULATOR CMD>... <PAYLOAD>`
//!
//! The last positional argument is the payload handed to the forwarder; all
//! preceding ones form the emulator command line. The forwarder is started
//! first; the emulator is launched once it asks for the target to be
//! powered. The test passes when the payload prints its final marker.

use anyhow::{bail, Context, Result};
use boot_tests::{logging, report, BootTest, BootTestConfig, ChainbootTransport, ExpectedPrint};
use clap::Parser;
use std::path::PathBuf;

const TEST_NAME: &str = "Boot test using MiniPush";

#[derive(Parser)]
#[command(name = "chainboot-test")]
#[command(about = "Boot test using a serial forwarder and an emulated target")]
struct Cli {
    /// TOML config file (default: $BOOT_TESTS_CONFIG, else built-in defaults)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seconds to wait for the payload's final marker
    #[arg(long)]
    timeout: Option<u64>,

    /// Marker that signals a successful boot
    #[arg(long)]
    expect: Option<String>,

    /// Print target output live
    #[arg(long)]
    echo: bool,

    /// Also write the report as JSON
    #[arg(long)]
    json: Option<PathBuf>,

    /// Emulator command followed by the payload path
    #[arg(required = true, num_args = 2.., trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

/// Split positionals into (emulator command, payload path).
fn split_invocation(mut args: Vec<String>) -> Result<(String, PathBuf)> {
    let payload = args.pop().context("missing payload path")?;
    if args.is_empty() {
        bail!("missing emulator command before payload path '{}'", payload);
    }
    Ok((args.join(" "), PathBuf::from(payload)))
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

    let (emulator_cmd, payload) = split_invocation(cli.args)?;
    if !payload.exists() {
        bail!("Payload not found at {}", payload.display());
    }

    report::header(
        TEST_NAME,
        &format!("Checking for the string: '{}'", config.expected_print),
    );

    let transport = ChainbootTransport::new(emulator_cmd, payload, &config);
    let result = BootTest::new(TEST_NAME, transport)
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
