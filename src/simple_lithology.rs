use crate::permeability_model::{PermeabilityLaw, PermeabilityModelType};
use crate::porosity_model::PorosityModel;
use crate::thermal_conductivity::TemperatureTable;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Intrinsic scalar properties of an elementary lithology
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LithologyProperties {
    pub density_kg_m3: f64,
    pub heat_production_uw_m3: f64,
    pub thermal_conductivity_w_m_k: f64,
    pub thermal_conductivity_anisotropy: f64,
    pub permeability_anisotropy: f64,
    pub seismic_velocity_m_s: f64,
    pub seismic_velocity_exponent: f64,
    pub reference_viscosity_pa_s: f64,
    pub activation_energy_j_mol: f64,
    /// fraction of the lithostatic-minus-hydrostatic pressure at which the rock fractures
    pub fracture_gradient: f64,
    pub quartz_fraction: f64,
    pub quartz_grain_size_mm: f64,
    pub clay_coating_factor: f64,
    pub specific_surface_area_m2_m3: f64,
    pub geometric_variance: f64,
    /// capillary entry pressure coefficients
    pub cap_c1: f64,
    pub cap_c2: f64,
    /// Brooks–Corey exponents for capillary pressure and relative permeability
    pub lambda_pc: f64,
    pub lambda_kr: f64,
    pub thermal_expansion_per_k: f64,
    pub igneous_intrusion_temperature_c: Option<f64>,
}

impl Default for LithologyProperties {
    fn default() -> Self {
        Self {
            density_kg_m3: 2650.0,
            heat_production_uw_m3: 1.0,
            thermal_conductivity_w_m_k: 2.5,
            thermal_conductivity_anisotropy: 1.0,
            permeability_anisotropy: 1.0,
            seismic_velocity_m_s: 5000.0,
            seismic_velocity_exponent: 0.0,
            reference_viscosity_pa_s: 1.0e17,
            activation_energy_j_mol: 0.0,
            fracture_gradient: 0.9,
            quartz_fraction: 0.0,
            quartz_grain_size_mm: 0.0,
            clay_coating_factor: 0.0,
            specific_surface_area_m2_m3: 1.0,
            geometric_variance: 1.0,
            cap_c1: 0.0,
            cap_c2: 0.0,
            lambda_pc: 1.0,
            lambda_kr: 1.0,
            thermal_expansion_per_k: 0.0,
            igneous_intrusion_temperature_c: None,
        }
    }
}

/// Property law of one elementary rock type
///
/// This is the seam between the mixing engine and whatever supplies elementary
/// lithologies. Implementations must be immutable once shared.
pub trait SimpleLithology: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn properties(&self) -> &LithologyProperties;

    fn porosity_model(&self) -> &PorosityModel;

    fn permeability_model(&self) -> PermeabilityModelType;

    /// Matrix thermal conductivity against temperature, never empty
    fn thermal_conductivity_table(&self) -> TemperatureTable;

    fn heat_capacity(&self, temperature_c: f64) -> f64;

    /// Permeability in mD at the given porosity
    fn permeability(&self, ves: f64, max_ves: f64, porosity: f64) -> f64;

    /// Permeability in mD and its ves derivative in mD/Pa
    fn permeability_derivative(
        &self,
        ves: f64,
        max_ves: f64,
        porosity: f64,
        porosity_derivative: f64,
    ) -> (f64, f64);

    fn porosity(
        &self,
        ves: f64,
        max_ves: f64,
        include_chemical_compaction: bool,
        chemical_compaction_term: f64,
    ) -> f64 {
        self.porosity_model()
            .calculate(ves, max_ves, include_chemical_compaction, chemical_compaction_term)
    }

    fn depositional_porosity(&self) -> f64 {
        self.porosity_model().surface_porosity()
    }

    fn depositional_permeability(&self) -> f64 {
        self.permeability(0.0, 0.0, self.depositional_porosity())
    }

    fn density(&self) -> f64 {
        self.properties().density_kg_m3
    }

    /// Density at temperature (°C) and pressure (Pa); only thermal expansion is modelled
    fn density_at(&self, temperature_c: f64, _pressure_pa: f64) -> f64 {
        let properties = self.properties();
        properties.density_kg_m3 * (1.0 - properties.thermal_expansion_per_k * temperature_c)
    }

    fn thermal_conductivity(&self, temperature_c: f64, _pressure_pa: f64) -> f64 {
        self.thermal_conductivity_table().value_at(temperature_c)
    }

    fn is_incompressible(&self) -> bool {
        self.porosity_model().is_incompressible()
    }
}

/// Elementary lithology described entirely by data, as read from a catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementaryLithology {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub properties: LithologyProperties,
    pub porosity: PorosityModel,
    pub permeability: PermeabilityLaw,
    #[serde(default)]
    pub thermal_conductivity: TemperatureTable,
    #[serde(default)]
    pub heat_capacity: TemperatureTable,
}

impl ElementaryLithology {
    pub fn new(
        name: &str,
        properties: LithologyProperties,
        porosity: PorosityModel,
        permeability: PermeabilityLaw,
    ) -> Self {
        Self {
            name: name.to_string(),
            description: String::new(),
            properties,
            porosity,
            permeability,
            thermal_conductivity: TemperatureTable::default(),
            heat_capacity: TemperatureTable::default(),
        }
    }

    /// Copy of this lithology under another name
    pub fn renamed(&self, name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..self.clone()
        }
    }

    /// Copy with a multipoint fault permeability law and a new permeability anisotropy
    pub fn fault_variant(
        &self,
        name: &str,
        permeability_anisotropy: f64,
        porosities_percent: [f64; 2],
        log10_permeabilities_md: [f64; 2],
    ) -> Self {
        let mut fault = self.renamed(name);
        fault.properties.permeability_anisotropy = permeability_anisotropy;
        fault.permeability = PermeabilityLaw::multipoint(&[
            (porosities_percent[0], log10_permeabilities_md[0]),
            (porosities_percent[1], log10_permeabilities_md[1]),
        ]);
        fault
    }
}

impl SimpleLithology for ElementaryLithology {
    fn name(&self) -> &str {
        &self.name
    }

    fn properties(&self) -> &LithologyProperties {
        &self.properties
    }

    fn porosity_model(&self) -> &PorosityModel {
        &self.porosity
    }

    fn permeability_model(&self) -> PermeabilityModelType {
        self.permeability.model_type()
    }

    fn thermal_conductivity_table(&self) -> TemperatureTable {
        if self.thermal_conductivity.is_empty() {
            TemperatureTable::constant(self.properties.thermal_conductivity_w_m_k)
        } else {
            self.thermal_conductivity.clone()
        }
    }

    fn heat_capacity(&self, temperature_c: f64) -> f64 {
        if self.heat_capacity.is_empty() {
            // typical matrix value when no table is supplied
            1000.0
        } else {
            self.heat_capacity.value_at(temperature_c)
        }
    }

    fn permeability(&self, ves: f64, max_ves: f64, porosity: f64) -> f64 {
        self.permeability.permeability(ves, max_ves, porosity)
    }

    fn permeability_derivative(
        &self,
        ves: f64,
        max_ves: f64,
        porosity: f64,
        porosity_derivative: f64,
    ) -> (f64, f64) {
        self.permeability
            .permeability_derivative(ves, max_ves, porosity, porosity_derivative)
    }
}
