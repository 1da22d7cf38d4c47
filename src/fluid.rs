use serde::{Deserialize, Serialize};
use std::fmt;

/// Pore-fluid properties needed by bulk rock properties
///
/// Temperatures in °C, pressures in Pa. Implementations must be shareable across
/// solver threads.
pub trait FluidProperties: Send + Sync + fmt::Debug {
    fn density(&self, temperature_c: f64, pressure_pa: f64) -> f64;

    fn heat_capacity(&self, temperature_c: f64, pressure_pa: f64) -> f64;

    fn thermal_conductivity(&self, temperature_c: f64, pressure_pa: f64) -> f64;

    fn seismic_velocity(&self, temperature_c: f64, pressure_pa: f64) -> f64;

    fn density_x_heat_capacity(&self, temperature_c: f64, pressure_pa: f64) -> f64 {
        self.density(temperature_c, pressure_pa) * self.heat_capacity(temperature_c, pressure_pa)
    }
}

/// A fluid whose properties do not vary with temperature or pressure
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConstantFluid {
    pub density_kg_m3: f64,
    pub heat_capacity_j_kg_k: f64,
    pub thermal_conductivity_w_m_k: f64,
    pub seismic_velocity_m_s: f64,
}

impl ConstantFluid {
    /// Sea-water brine at surface conditions
    pub fn brine() -> Self {
        Self {
            density_kg_m3: 1030.0,
            heat_capacity_j_kg_k: 4000.0,
            thermal_conductivity_w_m_k: 0.6,
            seismic_velocity_m_s: 1500.0,
        }
    }
}

impl Default for ConstantFluid {
    fn default() -> Self {
        Self::brine()
    }
}

impl FluidProperties for ConstantFluid {
    fn density(&self, _temperature_c: f64, _pressure_pa: f64) -> f64 {
        self.density_kg_m3
    }

    fn heat_capacity(&self, _temperature_c: f64, _pressure_pa: f64) -> f64 {
        self.heat_capacity_j_kg_k
    }

    fn thermal_conductivity(&self, _temperature_c: f64, _pressure_pa: f64) -> f64 {
        self.thermal_conductivity_w_m_k
    }

    fn seismic_velocity(&self, _temperature_c: f64, _pressure_pa: f64) -> f64 {
        self.seismic_velocity_m_s
    }
}
