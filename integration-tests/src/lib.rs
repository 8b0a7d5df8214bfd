//! Shared fixtures for the cross-crate tests.

use dip_controllers::{ControllerKind, ControllerSpec};
use dip_core::{PhysicsConfig, PhysicsParameters, State};

/// Nominal parameters with friction removed and a fixed, negligible
/// regularization, so the integrated motion conserves energy.
#[must_use]
pub fn conservative_params() -> PhysicsParameters {
    PhysicsConfig {
        use_fixed_regularization: true,
        ..PhysicsConfig::default().frictionless()
    }
    .validate()
    .expect("conservative parameters are valid")
}

/// Both links tipped slightly away from upright, at rest.
#[must_use]
pub fn tipped() -> State {
    State::new(0.0, 0.1, -0.05, 0.0, 0.0, 0.0)
}

/// Representative gains for each controller at `dt = 1e-3`.
#[must_use]
pub fn spec_for(kind: ControllerKind) -> ControllerSpec {
    let gains: &[f64] = match kind {
        ControllerKind::ClassicalSmc => &[5.0, 3.0, 5.0, 3.0, 15.0, 2.0],
        ControllerKind::StaSmc => &[8.0, 4.0, 5.0, 3.0, 5.0, 3.0],
        ControllerKind::AdaptiveSmc => &[5.0, 3.0, 5.0, 3.0, 2.0],
        ControllerKind::HybridAdaptiveStaSmc => &[5.0, 5.0, 3.0, 3.0],
    };
    ControllerSpec::new(kind, gains).with_dt(1e-3)
}
