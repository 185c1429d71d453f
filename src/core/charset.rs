//! Charset builder: the ordered alphabet tried at every position
//!
//! Named sets are concatenated in the order given, then the extra literal
//! characters. Duplicates are kept; they only cost a redundant probe.

use crate::types::ConfigError;

const LOWER: &str = "abcdefghijklmnopqrstuvwxyz";
const UPPER: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &str = "0123456789";
const HEX: &str = "0123456789abcdef";
const PUNCTUATION: &str = r##"!"#$%&'()*+,-./:;<=>?@[\]^_`{|}~"##;
const WHITESPACE: &str = " \t\n\r\x0b\x0c";

/// Names accepted by [`CharsetBuilder::named`]
pub const CHARSET_NAMES: [&str; 8] =
    ["default", "default2", "lower", "upper", "digit", "hex", "punct", "print"];

/// Builds the candidate alphabet
#[derive(Debug, Default, Clone)]
pub struct CharsetBuilder {
    symbols: Vec<char>,
}

impl CharsetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one named set
    pub fn named(mut self, name: &str) -> Result<Self, ConfigError> {
        self.symbols.extend(named_set(name.trim())?.chars());
        Ok(self)
    }

    /// Append literal characters
    pub fn extra(mut self, chars: &str) -> Self {
        self.symbols.extend(chars.chars());
        self
    }

    pub fn build(self) -> Result<Vec<char>, ConfigError> {
        if self.symbols.is_empty() {
            return Err(ConfigError::EmptyAlphabet);
        }
        Ok(self.symbols)
    }
}

/// Alphabet from a comma-separated list of names plus extra characters
pub fn build_charset(names: &str, extra: &str) -> Result<Vec<char>, ConfigError> {
    names
        .split(',')
        .filter(|n| !n.trim().is_empty())
        .try_fold(CharsetBuilder::new(), |builder, name| builder.named(name))?
        .extra(extra)
        .build()
}

/// Contents of a named set
fn named_set(name: &str) -> Result<String, ConfigError> {
    let set = match name {
        // Tuned for flag formats: common symbols first
        "default" => {
            let rest: String = PUNCTUATION.chars().filter(|c| !"_{}".contains(*c)).collect();
            format!("{LOWER}_{DIGITS}{{}}{UPPER}{rest}")
        }
        "default2" => format!("{LOWER}_{DIGITS}{{}}"),
        "lower" => LOWER.to_string(),
        "upper" => UPPER.to_string(),
        "digit" => DIGITS.to_string(),
        "hex" => HEX.to_string(),
        "punct" => PUNCTUATION.to_string(),
        "print" => format!("{DIGITS}{LOWER}{UPPER}{PUNCTUATION}{WHITESPACE}"),
        other => return Err(ConfigError::UnknownCharset(other.to_string())),
    };
    Ok(set)
}

// =============================================================================
// TESTS
// =============================================================================
