//! Real transports: pty-backed commands and the forwarder/emulator bridge.

use boot_tests::markers::DEFAULT_EXPECTED_PRINT;
use boot_tests::pty::PtyPair;
use boot_tests::{
    BootOutcome, BootTest, BootTestConfig, ChainbootTransport, DirectTransport, ExpectedPrint,
};
use std::io::Write;
use std::path::Path;
use std::time::{Duration, Instant};

const STEP: Duration = Duration::from_secs(10);

#[test]
fn direct_command_on_pty_passes_and_is_killed_at_teardown() {
    let transport = DirectTransport::command(
        "printf 'kernel up\\nEchoing input now\\n'; sleep 30",
        "\r\n",
    );
    let started = Instant::now();
    let report = BootTest::new("direct", transport)
        .subtest(ExpectedPrint::new(DEFAULT_EXPECTED_PRINT, STEP))
        .run();

    assert!(report.passed(), "{:?}", report.outcome);
    assert_eq!(report.output, ["kernel up", "Echoing input now"]);
    assert!(started.elapsed() < Duration::from_secs(20));
}

#[test]
fn direct_command_exit_closes_stream() {
    let transport = DirectTransport::command("printf 'only this\\n'", "\r\n");
    let report = BootTest::new("direct", transport)
        .subtest(ExpectedPrint::new(DEFAULT_EXPECTED_PRINT, STEP))
        .run();

    match &report.outcome {
        BootOutcome::Failed { kind, captured, .. } => {
            assert_eq!(kind, "ExpectationError");
            assert_eq!(captured, &["only this"]);
        }
        BootOutcome::Passed => panic!("target exited without the marker"),
    }
}

/// Descriptors of this process currently open on `path`.
fn open_handles(path: &Path) -> usize {
    std::fs::read_dir("/proc/self/fd")
        .unwrap()
        .filter_map(|entry| std::fs::read_link(entry.ok()?.path()).ok())
        .filter(|target| target == path)
        .count()
}

#[test]
#[cfg(target_os = "linux")]
fn device_is_released_when_run_finishes() {
    let mut pty = PtyPair::open().unwrap();
    let device = pty.secondary_path.clone();
    let before = open_handles(&device);

    pty.main.write_all(b"Echoing input now\n").unwrap();
    let report = BootTest::new("device", DirectTransport::device(&device, "\n"))
        .subtest(ExpectedPrint::new(DEFAULT_EXPECTED_PRINT, STEP))
        .run();

    assert!(report.passed(), "{:?}", report.outcome);
    assert_eq!(open_handles(&device), before);
}

#[test]
fn missing_device_fails_setup() {
    let transport = DirectTransport::device("/dev/does-not-exist-ttyUSB9", "\n");
    let report = BootTest::new("device", transport)
        .subtest(ExpectedPrint::new(DEFAULT_EXPECTED_PRINT, STEP))
        .run();

    match &report.outcome {
        BootOutcome::Failed {
            subtest, reason, ..
        } => {
            assert_eq!(subtest, "setup");
            assert!(reason.contains("/dev/does-not-exist-ttyUSB9"));
        }
        BootOutcome::Passed => panic!("device does not exist"),
    }
}

#[test]
fn chainboot_relays_emulator_output_through_forwarder() {
    let dir = tempfile::tempdir().unwrap();
    let payload = dir.path().join("demo_payload.img");
    std::fs::write(&payload, b"\0\0\0\0").unwrap();

    // Stand-in forwarder: announce readiness, then relay the serial line.
    let forwarder = dir.path().join("forwarder.sh");
    std::fs::write(
        &forwarder,
        "echo \"[MP] Please power the target now\"\nexec cat \"$1\"\n",
    )
    .unwrap();

    let mut config = BootTestConfig::default();
    config.forwarder = format!("sh {}", forwarder.display());
    config.handshake_timeout_secs = 10;

    let transport = ChainbootTransport::new(
        "printf 'chainloaded\\nEchoing input now\\n'; sleep 30",
        &payload,
        &config,
    );
    let report = BootTest::new("chainboot", transport)
        .subtest(ExpectedPrint::new(DEFAULT_EXPECTED_PRINT, STEP))
        .run();

    assert!(report.passed(), "{:?}", report.outcome);
    let handshake = report
        .output
        .iter()
        .position(|l| l.contains("Please power the target now"))
        .unwrap();
    let marker = report
        .output
        .iter()
        .position(|l| l.contains(DEFAULT_EXPECTED_PRINT))
        .unwrap();
    assert!(handshake < marker);
    assert!(report.output.iter().any(|l| l == "chainloaded"));
}

#[test]
fn chainboot_without_power_request_fails_in_handshake() {
    let dir = tempfile::tempdir().unwrap();
    let payload = dir.path().join("demo_payload.img");
    std::fs::write(&payload, b"\0").unwrap();

    let mut config = BootTestConfig::default();
    config.forwarder = "sleep 30 #".to_string();
    config.handshake_timeout_secs = 1;

    let transport = ChainbootTransport::new("true", &payload, &config);
    let report = BootTest::new("chainboot", transport)
        .subtest(ExpectedPrint::new(DEFAULT_EXPECTED_PRINT, STEP))
        .run();

    match &report.outcome {
        BootOutcome::Failed {
            subtest, kind, ordinal, ..
        } => {
            assert_eq!(subtest, "Waiting for request to power target");
            assert_eq!(kind, "TimeoutError");
            assert_eq!(*ordinal, 1);
        }
        BootOutcome::Passed => panic!("forwarder never asked for power"),
    }
}
