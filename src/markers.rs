//! Literal markers exchanged with target firmware and the forwarder.
//!
//! These strings are part of the external protocol: the orchestrator only
//! checks that they appear somewhere in a line, but they must match the
//! emitting side byte for byte.

/// Printed by the forwarder once it has opened the serial endpoint and is
/// waiting for the target to come up.
pub const POWER_TARGET_REQUEST: &str = "Please power the target now";

/// Last line printed by the demo payload once it has been chainloaded.
pub const DEFAULT_EXPECTED_PRINT: &str = "Echoing input now";
