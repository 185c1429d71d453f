//! Pintool: recover a fixed-length secret from an instruction-count side channel
//!
//! The target is run under an instrumentation backend once per guess. When
//! the target compares its input character by character, a guess with one
//! more correct character executes measurably more (or fewer) instructions.
//!
//! Flow: CLI → SearchEngine → PositionSolver → N concurrent Oracle probes
//! → Comparator → winning symbol committed into the SecretBuffer.

pub mod core;
pub mod types;

// =============================================================================
// SEARCH DEFAULTS
// =============================================================================

/// Maximum number of probes in flight for one position
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Symbol standing in for an unresolved character
pub const DEFAULT_PLACEHOLDER: char = '-';

/// Comparator expression: any change in instruction count is a hit
pub const DEFAULT_EXPRESSION: &str = "!= 0";

/// Secret length when none is given
pub const DEFAULT_LENGTH: usize = 10;

/// Named charset used when none is given
pub const DEFAULT_CHARSET: &str = "default";

/// Passes over the buffer in best-effort mode.
/// A single pass is enough for secrets checked in order.
pub const DEFAULT_PASSES: usize = 1;

// =============================================================================
// PIN LAYOUT
// =============================================================================

/// Pin installation root
pub const DEFAULT_PIN_ROOT: &str = "/opt/pin";

/// Tracer module relative to the per-architecture object directory
pub const INSCOUNT_TOOL: &str = "inscount0.so";

/// Directory holding the example tools, relative to the Pin root
pub const MANUAL_EXAMPLES_DIR: &str = "source/tools/ManualExamples";

/// Log file Pin leaves in the working directory
pub const PIN_LOG: &str = "pin.log";

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = "0.2.0";
