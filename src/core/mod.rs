//! Core modules for Pintool

pub mod comparator;
pub mod charset;
pub mod oracle;
pub mod pin;
pub mod solver;
pub mod engine;
pub mod length;

pub use comparator::{Comparator, CmpOp};
pub use charset::{CharsetBuilder, build_charset, CHARSET_NAMES};
pub use oracle::{Oracle, FnOracle, CountingOracle};
pub use pin::{PinOracle, PinSettings, parse_inscount};
pub use solver::PositionSolver;
pub use engine::SearchEngine;
pub use length::LengthDetector;
