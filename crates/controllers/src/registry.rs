use std::{fmt, str::FromStr};

use dip_core::State;
use tracing::warn;

use crate::{
    AdaptiveOptions, AdaptiveSmc, AdaptiveState, ClassicalOptions, ClassicalSmc, ConfigError,
    ControlOutput, History, HybridAdaptiveStaSmc, HybridOptions, HybridState, SharedPhysics,
    SlidingModeController, SuperTwistingOptions, SuperTwistingSmc, SuperTwistingState,
};

const DEFAULT_DT: f64 = 0.01;
const DEFAULT_MAX_FORCE: f64 = 20.0;

/// The available controller variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum ControllerKind {
    #[cfg_attr(feature = "serde", serde(alias = "classical"))]
    ClassicalSmc,
    #[cfg_attr(feature = "serde", serde(alias = "super_twisting"))]
    StaSmc,
    #[cfg_attr(feature = "serde", serde(alias = "adaptive"))]
    AdaptiveSmc,
    #[cfg_attr(feature = "serde", serde(alias = "hybrid"))]
    HybridAdaptiveStaSmc,
}

impl ControllerKind {
    pub const ALL: [Self; 4] = [
        Self::ClassicalSmc,
        Self::StaSmc,
        Self::AdaptiveSmc,
        Self::HybridAdaptiveStaSmc,
    ];

    /// Canonical snake-case name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::ClassicalSmc => "classical_smc",
            Self::StaSmc => "sta_smc",
            Self::AdaptiveSmc => "adaptive_smc",
            Self::HybridAdaptiveStaSmc => "hybrid_adaptive_sta_smc",
        }
    }
}

impl fmt::Display for ControllerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ControllerKind {
    type Err = ConfigError;

    /// Parses a canonical name or a short alias, ignoring case, surrounding
    /// whitespace, and `-` versus `_`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "classical_smc" | "classical" => Ok(Self::ClassicalSmc),
            "sta_smc" | "sta" | "super_twisting" => Ok(Self::StaSmc),
            "adaptive_smc" | "adaptive" => Ok(Self::AdaptiveSmc),
            "hybrid_adaptive_sta_smc" | "hybrid" => Ok(Self::HybridAdaptiveStaSmc),
            _ => Err(ConfigError::UnknownController(s.to_owned())),
        }
    }
}

/// Everything needed to build a controller with default options.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(deny_unknown_fields)
)]
pub struct ControllerSpec {
    pub kind: ControllerKind,
    pub gains: Vec<f64>,
    #[cfg_attr(feature = "serde", serde(default = "default_dt"))]
    pub dt: f64,
    #[cfg_attr(feature = "serde", serde(default = "default_max_force"))]
    pub max_force: f64,
}

#[cfg(feature = "serde")]
fn default_dt() -> f64 {
    DEFAULT_DT
}

#[cfg(feature = "serde")]
fn default_max_force() -> f64 {
    DEFAULT_MAX_FORCE
}

impl ControllerSpec {
    /// A spec with `dt = 0.01` and `max_force = 20`.
    #[must_use]
    pub fn new(kind: ControllerKind, gains: impl Into<Vec<f64>>) -> Self {
        Self {
            kind,
            gains: gains.into(),
            dt: DEFAULT_DT,
            max_force: DEFAULT_MAX_FORCE,
        }
    }

    #[must_use]
    pub fn with_dt(self, dt: f64) -> Self {
        Self { dt, ..self }
    }

    #[must_use]
    pub fn with_max_force(self, max_force: f64) -> Self {
        Self { max_force, ..self }
    }

    /// Builds the controller without equivalent control.
    ///
    /// # Errors
    ///
    /// Returns the variant's [`ConfigError`] if the gains, `dt`, or
    /// `max_force` are invalid.
    pub fn build(&self) -> Result<AnyController, ConfigError> {
        let Self {
            kind,
            ref gains,
            dt,
            max_force,
        } = *self;

        Ok(match kind {
            ControllerKind::ClassicalSmc => {
                AnyController::Classical(ClassicalSmc::new(gains, max_force, ClassicalOptions::default())?)
            }
            ControllerKind::StaSmc => AnyController::SuperTwisting(SuperTwistingSmc::new(
                gains,
                dt,
                max_force,
                SuperTwistingOptions::default(),
            )?),
            ControllerKind::AdaptiveSmc => AnyController::Adaptive(AdaptiveSmc::new(
                gains,
                dt,
                max_force,
                AdaptiveOptions::default(),
            )?),
            ControllerKind::HybridAdaptiveStaSmc => AnyController::Hybrid(HybridAdaptiveStaSmc::new(
                gains,
                dt,
                max_force,
                HybridOptions::default(),
            )?),
        })
    }

    /// Builds the controller with equivalent control computed from `physics`.
    ///
    /// # Errors
    ///
    /// See [`build`](Self::build).
    pub fn build_with_dynamics(&self, physics: SharedPhysics) -> Result<AnyController, ConfigError> {
        Ok(self.build()?.with_dynamics(physics))
    }
}

/// Any controller variant behind one [`SlidingModeController`] impl.
#[derive(Debug, Clone)]
pub enum AnyController {
    Classical(ClassicalSmc),
    SuperTwisting(SuperTwistingSmc),
    Adaptive(AdaptiveSmc),
    Hybrid(HybridAdaptiveStaSmc),
}

/// Internal state of an [`AnyController`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnyState {
    Classical,
    SuperTwisting(SuperTwistingState),
    Adaptive(AdaptiveState),
    Hybrid(HybridState),
}

impl AnyController {
    #[must_use]
    pub fn kind(&self) -> ControllerKind {
        match self {
            Self::Classical(_) => ControllerKind::ClassicalSmc,
            Self::SuperTwisting(_) => ControllerKind::StaSmc,
            Self::Adaptive(_) => ControllerKind::AdaptiveSmc,
            Self::Hybrid(_) => ControllerKind::HybridAdaptiveStaSmc,
        }
    }

    fn warn_mismatch(&self, internal: &AnyState) {
        warn!(controller = %self.kind(), ?internal, "mismatched internal state, reinitializing");
    }

    #[must_use]
    pub fn with_dynamics(self, physics: SharedPhysics) -> Self {
        match self {
            Self::Classical(c) => Self::Classical(c.with_dynamics(physics)),
            Self::SuperTwisting(c) => Self::SuperTwisting(c.with_dynamics(physics)),
            Self::Adaptive(c) => Self::Adaptive(c.with_dynamics(physics)),
            Self::Hybrid(c) => Self::Hybrid(c.with_dynamics(physics)),
        }
    }
}

fn wrap<S>(output: ControlOutput<S>, into: impl FnOnce(S) -> AnyState) -> ControlOutput<AnyState> {
    ControlOutput {
        u: output.u,
        state: into(output.state),
        history: output.history,
        sigma: output.sigma,
    }
}

impl SlidingModeController for AnyController {
    type Internal = AnyState;

    fn max_force(&self) -> f64 {
        match self {
            Self::Classical(c) => c.max_force(),
            Self::SuperTwisting(c) => c.max_force(),
            Self::Adaptive(c) => c.max_force(),
            Self::Hybrid(c) => c.max_force(),
        }
    }

    fn initialize_state(&self) -> AnyState {
        match self {
            Self::Classical(_) => AnyState::Classical,
            Self::SuperTwisting(c) => AnyState::SuperTwisting(c.initialize_state()),
            Self::Adaptive(c) => AnyState::Adaptive(c.initialize_state()),
            Self::Hybrid(c) => AnyState::Hybrid(c.initialize_state()),
        }
    }

    fn initialize_history(&self) -> History {
        match self {
            Self::Classical(c) => c.initialize_history(),
            Self::SuperTwisting(c) => c.initialize_history(),
            Self::Adaptive(c) => c.initialize_history(),
            Self::Hybrid(c) => c.initialize_history(),
        }
    }

    /// Dispatches to the wrapped variant.
    ///
    /// An `internal` value belonging to another variant is replaced by this
    /// controller's initial state.
    fn compute_control(
        &self,
        state: &State,
        internal: &AnyState,
        history: History,
    ) -> ControlOutput<AnyState> {
        match self {
            Self::Classical(c) => {
                if !matches!(internal, AnyState::Classical) {
                    self.warn_mismatch(internal);
                }
                wrap(c.compute_control(state, &(), history), |()| AnyState::Classical)
            }
            Self::SuperTwisting(c) => {
                let internal = match internal {
                    AnyState::SuperTwisting(s) => *s,
                    other => {
                        self.warn_mismatch(other);
                        c.initialize_state()
                    }
                };
                wrap(c.compute_control(state, &internal, history), AnyState::SuperTwisting)
            }
            Self::Adaptive(c) => {
                let internal = match internal {
                    AnyState::Adaptive(s) => *s,
                    other => {
                        self.warn_mismatch(other);
                        c.initialize_state()
                    }
                };
                wrap(c.compute_control(state, &internal, history), AnyState::Adaptive)
            }
            Self::Hybrid(c) => {
                let internal = match internal {
                    AnyState::Hybrid(s) => *s,
                    other => {
                        self.warn_mismatch(other);
                        c.initialize_state()
                    }
                };
                wrap(c.compute_control(state, &internal, history), AnyState::Hybrid)
            }
        }
    }
}
