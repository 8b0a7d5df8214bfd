use dip_controllers::{ControllerKind, SlidingModeController};
use dip_core::{NumericalInstability, PhysicsParameters, State};
use dip_dynamics::{
    Dynamics, DynamicsModel,
    integrator::{DormandPrince, IntegrationScheme, Rk4, VelocityVerlet},
};
use dip_integration_tests::spec_for;
use dip_solvers::closed_loop::{self, Error};

fn schemes() -> [IntegrationScheme; 3] {
    [Rk4.into(), DormandPrince::default().into(), VelocityVerlet.into()]
}

#[test]
fn non_finite_state_is_reported_by_every_scheme() {
    let poisoned = State::new(0.0, f64::NAN, 0.0, 0.0, 0.0, 0.0);

    for scheme in schemes() {
        let mut simplified =
            DynamicsModel::simplified(PhysicsParameters::default()).with_scheme(scheme.clone());
        let mut full = DynamicsModel::full(PhysicsParameters::default()).with_scheme(scheme);

        assert!(simplified.step(&poisoned, 0.0, 1e-3).is_err());
        assert!(full.step(&poisoned, 0.0, 1e-3).is_err());
    }
}

#[test]
fn invalid_step_size_is_rejected() {
    let mut model = DynamicsModel::simplified(PhysicsParameters::default());

    assert_eq!(
        model.step(&State::upright(), 0.0, -1e-3),
        Err(NumericalInstability::InvalidStep(-1e-3))
    );
}

#[test]
fn closed_loop_aborts_with_failing_step() {
    let controller = spec_for(ControllerKind::HybridAdaptiveStaSmc).build().unwrap();
    let mut model = DynamicsModel::full(PhysicsParameters::default());
    let poisoned = State::new(0.0, 0.1, f64::INFINITY, 0.0, 0.0, 0.0);

    // The controller tolerates the poisoned state; the dynamics do not.
    let output = controller.compute_control(
        &poisoned,
        &controller.initialize_state(),
        controller.initialize_history(),
    );
    assert!(output.u.is_finite());

    let result = closed_loop::simulate_unobserved(&controller, &mut model, poisoned, 1e-3, 100);
    assert!(matches!(result, Err(Error::Instability { step: 1, .. })));
}
