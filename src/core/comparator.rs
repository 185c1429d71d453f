//! Comparator: turns an expression like `== -12` into a predicate over deltas
//!
//! Operators: `!=`, `==`, `<=`, `>=` (alias `=>`), `<`, `>`.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::types::ConfigError;

lazy_static! {
    // Operator, then a signed integer. Two-character operators listed first.
    static ref RE_EXPRESSION: Regex = Regex::new(
        r"^\s*(?P<op>[!<>=]{1,2})\s*(?P<threshold>[+-]?\d+)\s*$"
    ).unwrap();
}

/// Comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CmpOp {
    Ne,
    Eq,
    Le,
    Ge,
    Lt,
    Gt,
}

impl CmpOp {
    /// Operator symbol as written by the user
    pub fn symbol(&self) -> &'static str {
        match self {
            CmpOp::Ne => "!=",
            CmpOp::Eq => "==",
            CmpOp::Le => "<=",
            CmpOp::Ge => ">=",
            CmpOp::Lt => "<",
            CmpOp::Gt => ">",
        }
    }
}

impl FromStr for CmpOp {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "!=" => Ok(CmpOp::Ne),
            "==" => Ok(CmpOp::Eq),
            "<=" => Ok(CmpOp::Le),
            ">=" | "=>" => Ok(CmpOp::Ge),
            "<" => Ok(CmpOp::Lt),
            ">" => Ok(CmpOp::Gt),
            other => Err(ConfigError::UnknownOperator(other.to_string())),
        }
    }
}

/// Predicate deciding whether a delta means "this symbol matched"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comparator {
    pub op: CmpOp,
    pub threshold: i64,
}

impl Comparator {
    pub fn new(op: CmpOp, threshold: i64) -> Self {
        Self { op, threshold }
    }

    /// Parse `<operator> <integer>`
    pub fn parse(expression: &str) -> Result<Self, ConfigError> {
        let caps = RE_EXPRESSION
            .captures(expression)
            .ok_or_else(|| ConfigError::InvalidExpression(expression.to_string()))?;

        let op: CmpOp = caps["op"].parse()?;
        let threshold = caps["threshold"]
            .trim_start_matches('+')
            .parse::<i64>()
            .map_err(|_| ConfigError::InvalidExpression(expression.to_string()))?;

        Ok(Self { op, threshold })
    }

    /// Does `delta` satisfy the expression?
    pub fn accept(&self, delta: i64) -> bool {
        let t = self.threshold;
        match self.op {
            CmpOp::Ne => delta != t,
            CmpOp::Eq => delta == t,
            CmpOp::Le => delta <= t,
            CmpOp::Ge => delta >= t,
            CmpOp::Lt => delta < t,
            CmpOp::Gt => delta > t,
        }
    }
}

impl FromStr for Comparator {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for Comparator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.op.symbol(), self.threshold)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_operators() {
        let cases = [
            ("!= 0", CmpOp::Ne, 0),
            ("== -12", CmpOp::Eq, -12),
            ("<= 17", CmpOp::Le, 17),
            (">= 900", CmpOp::Ge, 900),
            ("=> 900", CmpOp::Ge, 900),
            ("< 3", CmpOp::Lt, 3),
            ("> 3", CmpOp::Gt, 3),
        ];
        for (expr, op, threshold) in cases {
            assert_eq!(Comparator::parse(expr), Ok(Comparator::new(op, threshold)), "{}", expr);
        }
    }

    #[test]
    fn test_whitespace_tolerated() {
        assert_eq!(Comparator::parse("  ==1 "), Ok(Comparator::new(CmpOp::Eq, 1)));
        assert_eq!(Comparator::parse(">= +5"), Ok(Comparator::new(CmpOp::Ge, 5)));
    }

    #[test]
    fn test_unknown_operator() {
        assert_eq!(
            Comparator::parse("=< 4"),
            Err(ConfigError::UnknownOperator("=<".to_string()))
        );
        assert_eq!(
            Comparator::parse("! 4"),
            Err(ConfigError::UnknownOperator("!".to_string()))
        );
    }

    #[test]
    fn test_malformed_expression() {
        assert!(matches!(Comparator::parse("=="), Err(ConfigError::InvalidExpression(_))));
        assert!(matches!(Comparator::parse("== abc"), Err(ConfigError::InvalidExpression(_))));
        assert!(matches!(
            Comparator::parse("== 99999999999999999999"),
            Err(ConfigError::InvalidExpression(_))
        ));
    }

    #[test]
    fn test_accept_semantics() {
        let ne = Comparator::new(CmpOp::Ne, 0);
        assert!(ne.accept(5) && ne.accept(-5) && !ne.accept(0));

        let le = Comparator::new(CmpOp::Le, 17);
        assert!(le.accept(17) && le.accept(-100) && !le.accept(18));

        let gt = Comparator::new(CmpOp::Gt, 0);
        assert!(gt.accept(1) && !gt.accept(0));

        let lt = Comparator::new(CmpOp::Lt, -3);
        assert!(lt.accept(-4) && !lt.accept(-3));
    }

    #[test]
    fn test_display_round_trip() {
        let cmp = Comparator::parse("=> 10").unwrap();
        assert_eq!(cmp.to_string(), ">= 10");
    }
}
