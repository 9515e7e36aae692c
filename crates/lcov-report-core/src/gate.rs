//! Minimum coverage gate.

use crate::obs;
use serde::{Deserialize, Serialize};

/// Gate evaluation verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateVerdict {
    /// Whether the gate passed.
    pub passed: bool,

    /// Total line coverage that was evaluated.
    pub total: f64,

    /// Minimum it was compared against.
    pub minimum: i64,

    /// Summary message.
    pub message: String,
}

impl GateVerdict {
    pub fn is_failure(&self) -> bool {
        !self.passed
    }
}

/// Threshold rule: the run fails when total coverage is below the minimum.
pub struct CoverageGate;

impl CoverageGate {
    /// Compare `total` against `minimum`. Equal passes.
    ///
    /// `failure_message` is carried in the verdict when the gate fails.
    pub fn evaluate(total: f64, minimum: i64, failure_message: &str) -> GateVerdict {
        let passed = total >= minimum as f64;
        obs::emit_gate_evaluated(total, minimum, passed);

        let message = if passed {
            format!("Coverage {total}% meets the minimum of {minimum}%")
        } else {
            failure_message.to_string()
        };

        GateVerdict {
            passed,
            total,
            minimum,
            message,
        }
    }
}
