use crate::ParamsError;

/// Raw physical constants and regularization knobs.
///
/// This is the unvalidated form handed over by configuration loaders. Convert
/// it into [`PhysicsParameters`] with [`PhysicsConfig::validate`] (or
/// `TryFrom`) before building any dynamics.
///
/// All quantities are SI: kilograms, meters, kg·m², m/s², and viscous friction
/// coefficients in N·s/m (cart) or N·m·s/rad (joints).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default, deny_unknown_fields)
)]
pub struct PhysicsConfig {
    pub cart_mass: f64,
    pub pendulum1_mass: f64,
    pub pendulum2_mass: f64,
    pub pendulum1_length: f64,
    pub pendulum2_length: f64,
    pub pendulum1_com: f64,
    pub pendulum2_com: f64,
    pub pendulum1_inertia: f64,
    pub pendulum2_inertia: f64,
    pub gravity: f64,
    pub cart_friction: f64,
    pub joint1_friction: f64,
    pub joint2_friction: f64,

    /// Regularization as a fraction of the largest singular value.
    pub regularization_alpha: f64,
    /// Condition number above which regularization is scaled up.
    pub max_condition_number: f64,
    /// Lower bound (and fixed value) of the diagonal regularization.
    pub min_regularization: f64,
    /// Always add `min_regularization` instead of the adaptive amount.
    pub use_fixed_regularization: bool,
    /// Determinant magnitude below which the full model reports a singularity.
    pub det_threshold: f64,
    /// Floor on the smallest singular value, relative to the largest.
    pub condition_tol_factor: f64,
    /// Condition number above which the full model reports a singularity.
    pub singularity_cond_threshold: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            cart_mass: 1.5,
            pendulum1_mass: 0.2,
            pendulum2_mass: 0.15,
            pendulum1_length: 0.4,
            pendulum2_length: 0.3,
            pendulum1_com: 0.2,
            pendulum2_com: 0.15,
            pendulum1_inertia: 0.002_65,
            pendulum2_inertia: 0.001_15,
            gravity: 9.81,
            cart_friction: 0.2,
            joint1_friction: 0.005,
            joint2_friction: 0.004,
            regularization_alpha: 1e-4,
            max_condition_number: 1e14,
            min_regularization: 1e-10,
            use_fixed_regularization: false,
            det_threshold: 1e-12,
            condition_tol_factor: 1e-12,
            singularity_cond_threshold: 1e8,
        }
    }
}

impl PhysicsConfig {
    /// Returns a copy with all friction coefficients set to zero.
    #[must_use]
    pub fn frictionless(self) -> Self {
        Self {
            cart_friction: 0.0,
            joint1_friction: 0.0,
            joint2_friction: 0.0,
            ..self
        }
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a mass, length, inertia, gravity, or regularization
    /// knob is not finite and positive, if a friction coefficient is negative,
    /// or if a center-of-mass distance is not strictly inside its link.
    pub fn validate(self) -> Result<PhysicsParameters, ParamsError> {
        for (name, value) in [
            ("cart_mass", self.cart_mass),
            ("pendulum1_mass", self.pendulum1_mass),
            ("pendulum2_mass", self.pendulum2_mass),
            ("pendulum1_length", self.pendulum1_length),
            ("pendulum2_length", self.pendulum2_length),
            ("pendulum1_com", self.pendulum1_com),
            ("pendulum2_com", self.pendulum2_com),
            ("pendulum1_inertia", self.pendulum1_inertia),
            ("pendulum2_inertia", self.pendulum2_inertia),
            ("gravity", self.gravity),
            ("regularization_alpha", self.regularization_alpha),
            ("max_condition_number", self.max_condition_number),
            ("min_regularization", self.min_regularization),
            ("det_threshold", self.det_threshold),
            ("condition_tol_factor", self.condition_tol_factor),
            ("singularity_cond_threshold", self.singularity_cond_threshold),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ParamsError::NotPositive { name, value });
            }
        }

        for (name, value) in [
            ("cart_friction", self.cart_friction),
            ("joint1_friction", self.joint1_friction),
            ("joint2_friction", self.joint2_friction),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ParamsError::Negative { name, value });
            }
        }

        for (name, com, length) in [
            ("pendulum1_com", self.pendulum1_com, self.pendulum1_length),
            ("pendulum2_com", self.pendulum2_com, self.pendulum2_length),
        ] {
            if com >= length {
                return Err(ParamsError::CenterOfMassBeyondLink { name, com, length });
            }
        }

        Ok(PhysicsParameters(self))
    }
}

impl TryFrom<PhysicsConfig> for PhysicsParameters {
    type Error = ParamsError;

    fn try_from(config: PhysicsConfig) -> Result<Self, Self::Error> {
        config.validate()
    }
}

/// Validated, immutable physical parameters.
///
/// Can only be obtained through [`PhysicsConfig::validate`], so every value
/// seen through the accessors satisfies the physical invariants. Cheap to copy
/// and safe to share between any number of models and controllers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsParameters(PhysicsConfig);

impl Default for PhysicsParameters {
    fn default() -> Self {
        // The nominal configuration satisfies every invariant.
        Self(PhysicsConfig::default())
    }
}

impl PhysicsParameters {
    /// Returns the configuration these parameters were validated from.
    #[must_use]
    pub fn config(&self) -> &PhysicsConfig {
        &self.0
    }

    #[must_use]
    pub fn cart_mass(&self) -> f64 {
        self.0.cart_mass
    }

    #[must_use]
    pub fn pendulum1_mass(&self) -> f64 {
        self.0.pendulum1_mass
    }

    #[must_use]
    pub fn pendulum2_mass(&self) -> f64 {
        self.0.pendulum2_mass
    }

    #[must_use]
    pub fn pendulum1_length(&self) -> f64 {
        self.0.pendulum1_length
    }

    #[must_use]
    pub fn pendulum2_length(&self) -> f64 {
        self.0.pendulum2_length
    }

    #[must_use]
    pub fn pendulum1_com(&self) -> f64 {
        self.0.pendulum1_com
    }

    #[must_use]
    pub fn pendulum2_com(&self) -> f64 {
        self.0.pendulum2_com
    }

    #[must_use]
    pub fn pendulum1_inertia(&self) -> f64 {
        self.0.pendulum1_inertia
    }

    #[must_use]
    pub fn pendulum2_inertia(&self) -> f64 {
        self.0.pendulum2_inertia
    }

    #[must_use]
    pub fn gravity(&self) -> f64 {
        self.0.gravity
    }

    #[must_use]
    pub fn cart_friction(&self) -> f64 {
        self.0.cart_friction
    }

    #[must_use]
    pub fn joint1_friction(&self) -> f64 {
        self.0.joint1_friction
    }

    #[must_use]
    pub fn joint2_friction(&self) -> f64 {
        self.0.joint2_friction
    }

    #[must_use]
    pub fn regularization_alpha(&self) -> f64 {
        self.0.regularization_alpha
    }

    #[must_use]
    pub fn max_condition_number(&self) -> f64 {
        self.0.max_condition_number
    }

    #[must_use]
    pub fn min_regularization(&self) -> f64 {
        self.0.min_regularization
    }

    #[must_use]
    pub fn use_fixed_regularization(&self) -> bool {
        self.0.use_fixed_regularization
    }

    #[must_use]
    pub fn det_threshold(&self) -> f64 {
        self.0.det_threshold
    }

    #[must_use]
    pub fn condition_tol_factor(&self) -> f64 {
        self.0.condition_tol_factor
    }

    #[must_use]
    pub fn singularity_cond_threshold(&self) -> f64 {
        self.0.singularity_cond_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let params = PhysicsConfig::default().validate().expect("nominal values are valid");

        assert_eq!(params, PhysicsParameters::default());
        assert_eq!(params.cart_mass(), 1.5);
        assert!(!params.use_fixed_regularization());
    }

    #[test]
    fn frictionless_zeroes_every_friction_term() {
        let params = PhysicsConfig::default().frictionless().validate().unwrap();

        assert_eq!(params.cart_friction(), 0.0);
        assert_eq!(params.joint1_friction(), 0.0);
        assert_eq!(params.joint2_friction(), 0.0);
    }

    #[test]
    fn rejects_non_positive_mass() {
        let config = PhysicsConfig {
            pendulum2_mass: 0.0,
            ..PhysicsConfig::default()
        };

        assert_eq!(
            config.validate(),
            Err(ParamsError::NotPositive {
                name: "pendulum2_mass",
                value: 0.0
            })
        );
    }

    #[test]
    fn rejects_nan_gravity() {
        let config = PhysicsConfig {
            gravity: f64::NAN,
            ..PhysicsConfig::default()
        };

        assert!(matches!(
            config.validate(),
            Err(ParamsError::NotPositive { name: "gravity", .. })
        ));
    }

    #[test]
    fn rejects_negative_friction() {
        let config = PhysicsConfig {
            joint1_friction: -0.1,
            ..PhysicsConfig::default()
        };

        assert!(matches!(
            config.validate(),
            Err(ParamsError::Negative { name: "joint1_friction", .. })
        ));
    }

    #[test]
    fn rejects_center_of_mass_at_link_end() {
        let config = PhysicsConfig {
            pendulum1_com: 0.4,
            ..PhysicsConfig::default()
        };

        assert!(matches!(
            PhysicsParameters::try_from(config),
            Err(ParamsError::CenterOfMassBeyondLink { name: "pendulum1_com", .. })
        ));
    }
}
