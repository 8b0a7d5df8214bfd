use approx::assert_relative_eq;
use dip_controllers::{ControllerKind, ControllerSpec, SwitchMethod};
use dip_core::{ParamsError, PhysicsConfig, PhysicsParameters};

#[test]
fn physics_from_toml_fills_defaults() {
    let config: PhysicsConfig = toml::from_str(
        r#"
        cart_mass = 2.0
        cart_friction = 0.0
        use_fixed_regularization = true
        "#,
    )
    .unwrap();

    let params = PhysicsParameters::try_from(config).unwrap();

    assert_relative_eq!(params.cart_mass(), 2.0);
    assert_relative_eq!(params.cart_friction(), 0.0);
    assert_relative_eq!(params.pendulum1_mass(), 0.2);
    assert!(params.use_fixed_regularization());
}

#[test]
fn physics_rejects_unknown_keys() {
    let result = toml::from_str::<PhysicsConfig>("cart_weight = 2.0");
    assert!(result.is_err());
}

#[test]
fn physics_validation_runs_after_parsing() {
    let config: PhysicsConfig = serde_json::from_str(r#"{ "pendulum2_com": 0.5 }"#).unwrap();

    assert!(matches!(
        config.validate(),
        Err(ParamsError::CenterOfMassBeyondLink { name: "pendulum2_com", .. })
    ));
}

#[test]
fn controller_spec_from_json() {
    let spec: ControllerSpec = serde_json::from_str(
        r#"{ "kind": "sta_smc", "gains": [8.0, 4.0], "max_force": 30.0 }"#,
    )
    .unwrap();

    assert_eq!(spec.kind, ControllerKind::StaSmc);
    assert_relative_eq!(spec.dt, 0.01);
    assert_relative_eq!(spec.max_force, 30.0);
    assert!(spec.build().is_ok());
}

#[test]
fn controller_spec_from_yaml_with_alias() {
    let spec: ControllerSpec = serde_yaml::from_str(
        "kind: hybrid\ngains: [5.0, 5.0, 3.0, 3.0]\ndt: 0.001\n",
    )
    .unwrap();

    assert_eq!(spec.kind, ControllerKind::HybridAdaptiveStaSmc);
    assert_relative_eq!(spec.dt, 0.001);
}

#[test]
fn controller_spec_round_trips_through_toml() {
    let spec = ControllerSpec::new(ControllerKind::AdaptiveSmc, [5.0, 3.0, 5.0, 3.0, 2.0]);

    let text = toml::to_string(&spec).unwrap();

    assert!(text.contains("kind = \"adaptive_smc\""));
    assert_eq!(toml::from_str::<ControllerSpec>(&text).unwrap(), spec);
}

#[test]
fn unknown_controller_kind_is_rejected() {
    let result = serde_json::from_str::<ControllerSpec>(r#"{ "kind": "lqr", "gains": [] }"#);
    assert!(result.is_err());
}

#[test]
fn switch_method_uses_snake_case() {
    assert_eq!(serde_json::to_string(&SwitchMethod::Linear).unwrap(), "\"linear\"");
    assert_eq!(
        serde_json::from_str::<SwitchMethod>("\"tanh\"").unwrap(),
        SwitchMethod::Tanh
    );
}

#[test]
fn state_serializes_as_plain_array() {
    let state = dip_core::State::new(0.0, 0.1, -0.05, 0.0, 0.0, 0.0);

    let json = serde_json::to_string(&state).unwrap();

    assert_eq!(json, "[0.0,0.1,-0.05,0.0,0.0,0.0]");
    assert_eq!(serde_json::from_str::<dip_core::State>(&json).unwrap(), state);
}
