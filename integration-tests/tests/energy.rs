use dip_core::{Observer, State};
use dip_dynamics::{
    Dynamics, DynamicsModel, EquationsOfMotion,
    integrator::{DormandPrince, DormandPrinceConfig, VelocityVerlet},
};
use dip_integration_tests::{conservative_params, tipped};
use dip_observers::EnergyDriftMonitor;
use dip_solvers::closed_loop::{Action, Event};

const DT: f64 = 1e-3;

/// Integrates with zero input for `steps` steps and returns the largest
/// relative energy drift.
fn max_drift<E: EquationsOfMotion>(model: &mut DynamicsModel<E>, steps: usize) -> f64 {
    let equations = model.equations().clone();
    let mut monitor = EnergyDriftMonitor::new(move |state: &State| equations.total_energy(state));

    let mut state = tipped();
    for step in 0..=steps {
        if step > 0 {
            state = model.step(&state, 0.0, DT).expect("conservative motion stays finite");
        }
        let event = Event {
            step,
            time: step as f64 * DT,
            state,
            u: None,
            sigma: None,
        };
        let _: Option<Action> = monitor.observe(&event);
    }
    monitor.max_drift()
}

#[test]
fn rk4_drift_stays_below_one_percent_over_ten_seconds() {
    let mut model = DynamicsModel::simplified(conservative_params());
    assert!(max_drift(&mut model, 10_000) < 1e-2);
}

#[test]
fn full_model_drift_stays_below_one_percent() {
    let mut model = DynamicsModel::full(conservative_params());
    assert!(max_drift(&mut model, 10_000) < 1e-2);
}

#[test]
fn verlet_drift_stays_bounded() {
    let mut model = DynamicsModel::simplified(conservative_params()).with_scheme(VelocityVerlet);
    assert!(max_drift(&mut model, 10_000) < 5e-2);
}

#[test]
fn dormand_prince_drift_stays_below_one_percent() {
    let config = DormandPrinceConfig::new(1e-8, 1e-8, 1e-7, DT, 20).unwrap();
    let mut model =
        DynamicsModel::simplified(conservative_params()).with_scheme(DormandPrince::new(config));
    assert!(max_drift(&mut model, 10_000) < 1e-2);
}
