//! Configuration for the idempotence analyses.
//!
//! This module provides the configuration type shared by the boundary pipeline, the parallel
//! driver and the shadow tracker.

use strum::{Display, EnumIter};

/// How re-execution of a region is assumed to proceed.
///
/// The policy decides where a storage location's shadow originates inside a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumIter)]
pub enum ControlFlowPolicy {
    /// Re-execution follows the same control-flow path as the interrupted execution.
    ///
    /// Shadows start at uses of a live-in value that are not preceded by a redefinition
    /// inside the region.
    #[default]
    #[strum(serialize = "invariable")]
    InvariableControlFlow,

    /// Re-execution may take a different path than the interrupted execution.
    ///
    /// Shadows start at the region entry, since any later instruction might need the value.
    #[strum(serialize = "variable")]
    VariableControlFlow,
}

/// Configuration for boundary selection and shadow computation.
///
/// # Examples
///
/// ```rust
/// use idemregions::{AnalysisConfig, ControlFlowPolicy};
///
/// let config = AnalysisConfig::variable_control_flow();
/// assert_eq!(config.policy, ControlFlowPolicy::VariableControlFlow);
/// assert!(!config.verify);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisConfig {
    /// Control-flow assumption used to place shadow stems (default: invariable).
    pub policy: ControlFlowPolicy,

    /// Verify every computed shadow range against redefinitions of the live-in value
    /// (default: false).
    ///
    /// A failing verification aborts the shadow query with
    /// [`Error::ShadowVerification`](crate::Error::ShadowVerification).
    pub verify: bool,

    /// Analyze independent functions on the rayon thread pool (default: true).
    pub parallel: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            policy: ControlFlowPolicy::InvariableControlFlow,
            verify: false,
            parallel: true,
        }
    }
}

impl AnalysisConfig {
    /// Creates a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Default settings with shadow verification enabled.
    #[must_use]
    pub fn verifying() -> Self {
        Self {
            verify: true,
            ..Self::default()
        }
    }

    /// Default settings under the variable control-flow policy.
    #[must_use]
    pub fn variable_control_flow() -> Self {
        Self {
            policy: ControlFlowPolicy::VariableControlFlow,
            ..Self::default()
        }
    }

    /// Default settings with the multi-function driver forced onto the calling thread.
    #[must_use]
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            ..Self::default()
        }
    }

    /// Replaces the control-flow policy.
    #[must_use]
    pub fn with_policy(mut self, policy: ControlFlowPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Enables or disables shadow verification.
    #[must_use]
    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }
}
