use crate::constants::UNDEFINED_VALUE;
use serde::{Deserialize, Serialize};

/// Law giving the bulk P-wave velocity of a fluid-filled rock
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeismicVelocityModel {
    /// Velocity from bulk density, `ρ[g/cm³] = 0.31·V^0.25`
    #[default]
    Gardner,
    /// Time average of the solid and fluid transit times
    Wyllie,
    /// Frame modulus decaying as `(1 - φ/φ0)^n`, fluid modulus weighted by `φ/φ0`
    PorosityExponent,
}

impl SeismicVelocityModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeismicVelocityModel::Gardner => "Gardner",
            SeismicVelocityModel::Wyllie => "Wyllie",
            SeismicVelocityModel::PorosityExponent => "Porosity exponent",
        }
    }
}

/// Seismic velocity law of a (mixed) lithology
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeismicVelocity {
    model: SeismicVelocityModel,
    solid_velocity_m_s: f64,
    /// `ρ·Vp²` of the solid, Pa
    solid_modulus_pa: f64,
    solid_density_kg_m3: f64,
    surface_porosity: f64,
    velocity_exponent: f64,
}

impl SeismicVelocity {
    pub fn new(
        model: SeismicVelocityModel,
        solid_velocity_m_s: f64,
        solid_modulus_pa: f64,
        solid_density_kg_m3: f64,
        surface_porosity: f64,
        velocity_exponent: f64,
    ) -> Self {
        Self {
            model,
            solid_velocity_m_s,
            solid_modulus_pa,
            solid_density_kg_m3,
            surface_porosity,
            velocity_exponent,
        }
    }

    pub fn model(&self) -> SeismicVelocityModel {
        self.model
    }

    pub fn solid_velocity(&self) -> f64 {
        self.solid_velocity_m_s
    }

    pub fn solid_modulus(&self) -> f64 {
        self.solid_modulus_pa
    }

    pub fn velocity_exponent(&self) -> f64 {
        self.velocity_exponent
    }

    /// Bulk velocity, m/s, of the rock at `porosity` saturated with the given fluid
    ///
    /// Returns [`UNDEFINED_VALUE`] when a velocity or density in a denominator is zero.
    pub fn velocity(&self, porosity: f64, fluid_velocity_m_s: f64, fluid_density_kg_m3: f64) -> f64 {
        let bulk_density = (1.0 - porosity) * self.solid_density_kg_m3 + porosity * fluid_density_kg_m3;

        match self.model {
            SeismicVelocityModel::Gardner => (bulk_density / 1000.0 / 0.31).powi(4),
            SeismicVelocityModel::Wyllie => {
                if fluid_velocity_m_s == 0.0 || self.solid_velocity_m_s == 0.0 {
                    log::warn!(
                        "Wyllie velocity undefined: fluid velocity {fluid_velocity_m_s}, solid velocity {}",
                        self.solid_velocity_m_s
                    );
                    return UNDEFINED_VALUE;
                }
                1.0 / (porosity / fluid_velocity_m_s + (1.0 - porosity) / self.solid_velocity_m_s)
            }
            SeismicVelocityModel::PorosityExponent => {
                if bulk_density == 0.0 {
                    log::warn!("porosity exponent velocity undefined: zero bulk density");
                    return UNDEFINED_VALUE;
                }
                let relative_porosity = if self.surface_porosity > 0.0 {
                    (porosity / self.surface_porosity).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let frame = self.solid_modulus_pa * (1.0 - relative_porosity).powf(self.velocity_exponent);
                let fluid = relative_porosity * fluid_density_kg_m3 * fluid_velocity_m_s.powi(2);
                ((frame + fluid) / bulk_density).sqrt()
            }
        }
    }
}
