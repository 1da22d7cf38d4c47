//! Effective-medium mixture of one to three elementary lithologies
//!
//! A [`CompoundLithology`] is built once by [`CompoundLithology::mix`], which either
//! returns a fully mixed value or an error. After that every accessor is a pure
//! function of its arguments, so one instance is shared (through `Arc`) by every
//! cell and solver thread using the same composition.

use crate::compound_property::CompoundProperty;
use crate::constants::{
    ALC_BASALT_LITHOLOGY_NAME, CRUST_LITHOLOGY_NAME,
    FRACTURED_PERMEABILITY_SCALING, FRACTURED_SURFACE_POROSITY_THRESHOLD, MANTLE_LITHOLOGY_NAME,
    MAXIMUM_NUMBER_OF_LITHOLOGIES, MILLIDARCY_TO_M2, MINIMUM_SOIL_MECHANICS_POROSITY, MPA_TO_PA,
    REFERENCE_EFFECTIVE_STRESS_PA, TIGHT_FRACTURED_PERMEABILITY_SCALING, UNDEFINED_VALUE,
    UNLOADING_COMPACTION_RATIO,
};
use crate::error::{LithologyError, LithologyResult};
use crate::fluid::FluidProperties;
use crate::lithology_composition::{percentages_are_valid, CompoundLithologyComposition, MixModelType};
use crate::math_utils::{arithmetic_mean, cubic_mean, geometric_mean};
use crate::mixing_law::{MixingConfig, MixingLaw};
use crate::permeability_mixer::PermeabilityMixer;
use crate::permeability_model::PermeabilityModelType;
use crate::porosity_model::{CompactionCoefficients, PorosityModel, PorosityModelType};
use crate::seismic_velocity::SeismicVelocity;
use crate::simple_lithology::SimpleLithology;
use crate::thermal_conductivity::ThermalConductivityTable;
use std::fmt::Write;
use std::sync::Arc;

/// Share of sand-like components above which the mixture follows sand hysteresis
const SAND_HYSTERESIS_FRACTION: f64 = 0.5;

const MICROWATT_TO_WATT: f64 = 1.0e-6;

/// How permeability responds to unloading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HysteresisBehaviour {
    NoPermeability,
    Sand,
    Shale,
}

impl HysteresisBehaviour {
    pub fn as_str(&self) -> &'static str {
        match self {
            HysteresisBehaviour::NoPermeability => "No permeability",
            HysteresisBehaviour::Sand => "Sand",
            HysteresisBehaviour::Shale => "Shale",
        }
    }
}

#[derive(Debug)]
pub struct CompoundLithology {
    /// Active components (percentage > 0), in composition order
    components: Vec<Arc<dyn SimpleLithology>>,
    percentages: Vec<f64>,
    fractions: Vec<f64>,
    mix_model: MixModelType,
    layering_index: f64,
    is_fault: bool,
    mixing_law: &'static dyn MixingLaw,
    ves_scale_factor: f64,

    // arithmetic means
    density_kg_m3: f64,
    heat_production_uw_m3: f64,
    depositional_permeability_md: f64,
    thermal_conductivity_value: f64,
    reference_viscosity_pa_s: f64,
    activation_energy_j_mol: f64,
    fracture_gradient: f64,
    quartz_fraction: f64,
    clay_coating_factor: f64,
    seismic_velocity_solid_m_s: f64,
    velocity_exponent: f64,

    // geometric means
    thermal_conductivity_anisotropy: f64,
    specific_surface_area_m2_m3: f64,
    geometric_variance: f64,

    quartz_grain_size_mm: f64,

    porosity: PorosityModel,
    /// Porosity below which a component's permeability is no longer evaluated
    minimum_porosities: Vec<f64>,

    cap_c1: f64,
    cap_c2: f64,
    ten_power_cap_c2: f64,
    lambda_pc: f64,
    lambda_kr: f64,

    thermal_conductivity: ThermalConductivityTable,
    seismic_velocity: SeismicVelocity,
    permeability_mixer: PermeabilityMixer,

    is_basement: bool,
    fractured_permeability_scaling: f64,
    hysteresis: HysteresisBehaviour,
    igneous_intrusion_temperature_c: Option<f64>,
}

impl CompoundLithology {
    /// Mix `components` with the given percentages (0..=100)
    ///
    /// Components with a zero percentage are dropped. Fails when the component count
    /// is outside 1..=3, the percentages do not sum to 100, the active components use
    /// different porosity models, or a multi-component mixture has no mixing model.
    pub fn mix(
        components: Vec<Arc<dyn SimpleLithology>>,
        percentages: &[f64],
        mix_model: MixModelType,
        layering_index: f64,
        is_fault: bool,
        config: &MixingConfig,
    ) -> LithologyResult<Self> {
        if components.len() != percentages.len() {
            return Err(LithologyError::ComponentMismatch {
                expected: components.len(),
                actual: percentages.len(),
            });
        }
        if components.is_empty() || components.len() > MAXIMUM_NUMBER_OF_LITHOLOGIES {
            return Err(LithologyError::WrongComponentCount {
                count: components.len(),
            });
        }
        if !percentages_are_valid(percentages) {
            let mut padded = [0.0; MAXIMUM_NUMBER_OF_LITHOLOGIES];
            padded[..percentages.len()].copy_from_slice(percentages);
            let [p1, p2, p3] = padded;
            return Err(LithologyError::InvalidPercentages { p1, p2, p3 });
        }

        let (components, percentages): (Vec<_>, Vec<_>) = components
            .into_iter()
            .zip(percentages.iter().copied())
            .filter(|(_, percentage)| *percentage > 0.0)
            .unzip();

        if components.is_empty() {
            return Err(LithologyError::WrongComponentCount { count: 0 });
        }
        if components.len() > 1 && mix_model == MixModelType::Undefined && !is_fault {
            return Err(LithologyError::UndefinedMixModel {
                model: mix_model.as_str().to_string(),
            });
        }
        if !allowable_mixing(&components) {
            return Err(LithologyError::IncompatiblePorosityModels {
                composition: describe(&components, &percentages),
            });
        }

        let law = config.mixing_law();
        let fractions: Vec<f64> = percentages.iter().map(|p| p / 100.0).collect();
        let properties: Vec<_> = components.iter().map(|c| c.properties()).collect();
        let arithmetic = |values: Vec<f64>| arithmetic_mean(&fractions, &values);
        let geometric = |values: Vec<f64>| geometric_mean(&fractions, &values);

        let density_kg_m3 = arithmetic(values_of(&components, |c| c.density()));
        let seismic_velocity_solid_m_s = arithmetic(values_of(&components, |c| c.properties().seismic_velocity_m_s));

        // the mixture takes the compaction law of its dominant component
        let dominant = dominant_index(&fractions);
        let kind = components[dominant].porosity_model().kind();
        let surface_porosity = mix_surface_porosity(kind, &components, &fractions);
        let coefficients = mix_compaction_coefficients(&components, &fractions);
        let minimum_mechanical_porosity = arithmetic(values_of(&components, |c| c.porosity_model().minimum_mechanical_porosity()));
        let porosity = PorosityModel::new(kind, surface_porosity, minimum_mechanical_porosity, coefficients);
        let minimum_porosities = minimum_porosities(kind, &components, surface_porosity, coefficients.soil_mechanics);

        let (cap_c1, cap_c2) = law.capillary_entry_coefficients(&components, &fractions, mix_model);
        let (lambda_pc, lambda_kr) = law.brooks_corey_exponents(&components, &fractions);

        let thermal_conductivity = mix_thermal_conductivity(law, mix_model, &components, &fractions);

        let moduli: Vec<f64> = properties
            .iter()
            .map(|p| p.density_kg_m3 * p.seismic_velocity_m_s.powi(2))
            .collect();
        let solid_modulus = law.solid_modulus(mix_model, &fractions, &moduli).unwrap_or_else(|| {
            log::warn!(
                "solid modulus of {} undefined, using {UNDEFINED_VALUE}",
                describe(&components, &percentages)
            );
            UNDEFINED_VALUE
        });
        let velocity_exponent = arithmetic(values_of(&components, |c| c.properties().seismic_velocity_exponent));
        let seismic_velocity = SeismicVelocity::new(
            config.seismic_velocity_model,
            seismic_velocity_solid_m_s,
            solid_modulus,
            density_kg_m3,
            surface_porosity,
            velocity_exponent,
        );

        let is_basement = components.len() == 1
            && [CRUST_LITHOLOGY_NAME, MANTLE_LITHOLOGY_NAME, ALC_BASALT_LITHOLOGY_NAME]
                .contains(&components[0].name());

        // a single component has nothing to layer
        let mixer_model = if components.len() == 1 {
            MixModelType::Homogeneous
        } else {
            mix_model
        };
        let anisotropies: Vec<f64> = properties.iter().map(|p| p.permeability_anisotropy).collect();
        let permeability_mixer = PermeabilityMixer::new(
            &percentages,
            &anisotropies,
            law.permeability_layering_index(mixer_model, layering_index),
            mixer_model,
            is_fault,
        )?;

        let fractured_permeability_scaling = if surface_porosity < FRACTURED_SURFACE_POROSITY_THRESHOLD {
            TIGHT_FRACTURED_PERMEABILITY_SCALING
        } else {
            FRACTURED_PERMEABILITY_SCALING
        };

        let igneous_intrusion_temperature_c = if percentages[0] == 100.0 {
            properties[0].igneous_intrusion_temperature_c
        } else {
            None
        };

        let lithology = Self {
            mix_model,
            layering_index,
            is_fault,
            mixing_law: law,
            ves_scale_factor: config.ves_scale_factor,
            density_kg_m3,
            heat_production_uw_m3: arithmetic(values_of(&components, |c| c.properties().heat_production_uw_m3)),
            depositional_permeability_md: arithmetic(values_of(&components, |c| c.depositional_permeability())),
            thermal_conductivity_value: arithmetic(values_of(&components, |c| c.properties().thermal_conductivity_w_m_k)),
            reference_viscosity_pa_s: arithmetic(values_of(&components, |c| c.properties().reference_viscosity_pa_s)),
            activation_energy_j_mol: arithmetic(values_of(&components, |c| c.properties().activation_energy_j_mol)),
            fracture_gradient: arithmetic(values_of(&components, |c| c.properties().fracture_gradient)),
            quartz_fraction: arithmetic(values_of(&components, |c| c.properties().quartz_fraction)),
            clay_coating_factor: arithmetic(values_of(&components, |c| c.properties().clay_coating_factor)),
            seismic_velocity_solid_m_s,
            velocity_exponent,
            thermal_conductivity_anisotropy: geometric(values_of(&components, |c| c.properties().thermal_conductivity_anisotropy)),
            specific_surface_area_m2_m3: geometric(values_of(&components, |c| c.properties().specific_surface_area_m2_m3)),
            geometric_variance: geometric(values_of(&components, |c| c.properties().geometric_variance)),
            quartz_grain_size_mm: cubic_mean(&fractions, &values_of(&components, |c| c.properties().quartz_grain_size_mm)),
            porosity,
            minimum_porosities,
            cap_c1,
            cap_c2,
            ten_power_cap_c2: 10f64.powf(-cap_c2),
            lambda_pc,
            lambda_kr,
            thermal_conductivity,
            seismic_velocity,
            permeability_mixer,
            is_basement,
            fractured_permeability_scaling,
            hysteresis: hysteresis_behaviour(&components, &fractions),
            igneous_intrusion_temperature_c,
            components,
            percentages,
            fractions,
        };

        Ok(lithology)
    }

    /// Mix the components of `composition`, resolved by name through `lookup`
    pub fn from_composition<F>(
        composition: &CompoundLithologyComposition,
        is_fault: bool,
        config: &MixingConfig,
        lookup: F,
    ) -> LithologyResult<Self>
    where
        F: Fn(&str) -> Option<Arc<dyn SimpleLithology>>,
    {
        composition.validate()?;

        let mut components = Vec::with_capacity(MAXIMUM_NUMBER_OF_LITHOLOGIES);
        let mut percentages = Vec::with_capacity(MAXIMUM_NUMBER_OF_LITHOLOGIES);
        for (name, percentage) in composition.active_components() {
            let lithology = lookup(name).ok_or_else(|| LithologyError::UnknownLithology {
                name: name.to_string(),
            })?;
            components.push(lithology);
            percentages.push(percentage);
        }

        Self::mix(
            components,
            &percentages,
            composition.mix_model(),
            composition.layering_index(),
            is_fault,
            config,
        )
    }

    pub fn components(&self) -> &[Arc<dyn SimpleLithology>] {
        &self.components
    }

    pub fn percentages(&self) -> &[f64] {
        &self.percentages
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn mix_model(&self) -> MixModelType {
        self.mix_model
    }

    pub fn layering_index(&self) -> f64 {
        self.layering_index
    }

    pub fn is_fault(&self) -> bool {
        self.is_fault
    }

    pub fn is_legacy(&self) -> bool {
        self.mixing_law.is_legacy()
    }

    pub fn is_basement(&self) -> bool {
        self.is_basement
    }

    pub fn is_incompressible(&self) -> bool {
        self.components.iter().all(|c| c.is_incompressible())
    }

    /// The composition this mixture was built from
    pub fn composition(&self) -> CompoundLithologyComposition {
        let mut names = [""; MAXIMUM_NUMBER_OF_LITHOLOGIES];
        let mut percentages = [0.0; MAXIMUM_NUMBER_OF_LITHOLOGIES];
        for (i, component) in self.components.iter().enumerate() {
            names[i] = component.name();
            percentages[i] = self.percentages[i];
        }
        CompoundLithologyComposition::new(names, percentages, self.mix_model, self.layering_index)
    }

    /// Multi-line description of the components and the main mixed values
    pub fn image(&self) -> String {
        let mut buffer = String::new();
        for (component, percentage) in self.components.iter().zip(&self.percentages) {
            let _ = writeln!(buffer, " Simple litho: {} {percentage}%", component.name());
        }
        let _ = writeln!(
            buffer,
            " Mixing: {} ({}), layering index {}",
            self.mix_model.as_str(),
            self.mixing_law.name(),
            self.layering_index
        );
        let _ = writeln!(
            buffer,
            " Porosity model: {}, surface porosity {}",
            self.porosity.kind().as_str(),
            self.porosity.surface_porosity()
        );
        let _ = writeln!(buffer, " Density: {} kg/m3", self.density_kg_m3);
        let _ = write!(buffer, " Depositional permeability: {} mD", self.depositional_permeability_md);
        buffer
    }

    // Mixed scalars

    pub fn density(&self) -> f64 {
        self.density_kg_m3
    }

    pub fn heat_production(&self) -> f64 {
        self.heat_production_uw_m3
    }

    pub fn depositional_permeability(&self) -> f64 {
        self.depositional_permeability_md
    }

    pub fn thermal_conductivity_value(&self) -> f64 {
        self.thermal_conductivity_value
    }

    pub fn thermal_conductivity_anisotropy(&self) -> f64 {
        self.thermal_conductivity_anisotropy
    }

    pub fn reference_viscosity(&self) -> f64 {
        self.reference_viscosity_pa_s
    }

    pub fn activation_energy(&self) -> f64 {
        self.activation_energy_j_mol
    }

    pub fn fracture_gradient(&self) -> f64 {
        self.fracture_gradient
    }

    pub fn quartz_fraction(&self) -> f64 {
        self.quartz_fraction
    }

    pub fn quartz_grain_size(&self) -> f64 {
        self.quartz_grain_size_mm
    }

    pub fn clay_coating_factor(&self) -> f64 {
        self.clay_coating_factor
    }

    pub fn specific_surface_area(&self) -> f64 {
        self.specific_surface_area_m2_m3
    }

    pub fn geometric_variance(&self) -> f64 {
        self.geometric_variance
    }

    pub fn surface_porosity(&self) -> f64 {
        self.porosity.surface_porosity()
    }

    pub fn porosity_model(&self) -> &PorosityModel {
        &self.porosity
    }

    pub fn minimum_porosities(&self) -> &[f64] {
        &self.minimum_porosities
    }

    pub fn cap_c1(&self) -> f64 {
        self.cap_c1
    }

    pub fn cap_c2(&self) -> f64 {
        self.cap_c2
    }

    pub fn ten_power_cap_c2(&self) -> f64 {
        self.ten_power_cap_c2
    }

    pub fn lambda_pc(&self) -> f64 {
        self.lambda_pc
    }

    pub fn lambda_kr(&self) -> f64 {
        self.lambda_kr
    }

    pub fn permeability_mixer(&self) -> &PermeabilityMixer {
        &self.permeability_mixer
    }

    pub fn seismic_velocity(&self) -> &SeismicVelocity {
        &self.seismic_velocity
    }

    pub fn fractured_permeability_scaling(&self) -> f64 {
        self.fractured_permeability_scaling
    }

    pub fn hysteresis_behaviour(&self) -> HysteresisBehaviour {
        self.hysteresis
    }

    /// Temperature of the intruding melt; only for a single igneous component
    pub fn igneous_intrusion_temperature(&self) -> Option<f64> {
        self.igneous_intrusion_temperature_c
    }

    // Porosity

    pub fn porosity(
        &self,
        ves: f64,
        max_ves: f64,
        include_chemical_compaction: bool,
        chemical_compaction_term: f64,
    ) -> f64 {
        self.porosity
            .calculate(ves, max_ves, include_chemical_compaction, chemical_compaction_term)
    }

    pub fn porosity_derivative_wrt_ves(
        &self,
        ves: f64,
        max_ves: f64,
        include_chemical_compaction: bool,
        chemical_compaction_term: f64,
    ) -> f64 {
        self.porosity
            .calculate_derivative(ves, max_ves, include_chemical_compaction, chemical_compaction_term)
    }

    pub fn void_ratio(
        &self,
        ves: f64,
        max_ves: f64,
        include_chemical_compaction: bool,
        chemical_compaction_term: f64,
    ) -> f64 {
        self.porosity
            .void_ratio(ves, max_ves, include_chemical_compaction, chemical_compaction_term)
    }

    /// Each component's own porosity, with the mixed porosity
    pub fn component_porosities(
        &self,
        ves: f64,
        max_ves: f64,
        include_chemical_compaction: bool,
        chemical_compaction_term: f64,
    ) -> CompoundProperty {
        let components: Vec<f64> = self
            .components
            .iter()
            .map(|c| c.porosity(ves, max_ves, include_chemical_compaction, chemical_compaction_term))
            .collect();
        CompoundProperty::new(
            &components,
            self.porosity(ves, max_ves, include_chemical_compaction, chemical_compaction_term),
        )
    }

    /// Each component's own porosity derivative with respect to ves, with the mixed one
    pub fn component_porosity_derivatives(
        &self,
        ves: f64,
        max_ves: f64,
        include_chemical_compaction: bool,
        chemical_compaction_term: f64,
    ) -> CompoundProperty {
        let components: Vec<f64> = self
            .components
            .iter()
            .map(|c| {
                c.porosity_model()
                    .calculate_derivative(ves, max_ves, include_chemical_compaction, chemical_compaction_term)
            })
            .collect();
        CompoundProperty::new(
            &components,
            self.porosity_derivative_wrt_ves(ves, max_ves, include_chemical_compaction, chemical_compaction_term),
        )
    }

    // Permeability

    /// Component permeabilities (mD) at their floored porosities
    fn component_permeabilities(&self, ves: f64, max_ves: f64, porosity: &CompoundProperty) -> Vec<f64> {
        self.components
            .iter()
            .zip(porosity.components())
            .zip(&self.minimum_porosities)
            .map(|((component, phi), floor)| component.permeability(ves, max_ves, phi.max(*floor)))
            .collect()
    }

    /// Bulk `(normal, plane)` permeability, m², from each component's porosity
    ///
    /// Returns [`UNDEFINED_VALUE`] for both when `porosity` does not match the
    /// components or when a zero component permeability leaves the mean undefined.
    pub fn calc_bulk_permeability_np(&self, ves: f64, max_ves: f64, porosity: &CompoundProperty) -> (f64, f64) {
        let permeabilities = self.component_permeabilities(ves, max_ves, porosity);

        match self.permeability_mixer.mix_permeability(&permeabilities) {
            Ok((normal, plane)) if normal.is_finite() && plane.is_finite() => {
                (normal * MILLIDARCY_TO_M2, plane * MILLIDARCY_TO_M2)
            }
            Ok(_) => {
                log::warn!(
                    "bulk permeability of {} undefined for component permeabilities {permeabilities:?} mD, using {UNDEFINED_VALUE}",
                    self.composition()
                );
                (UNDEFINED_VALUE, UNDEFINED_VALUE)
            }
            Err(err) => {
                log::warn!("bulk permeability undefined: {err}");
                (UNDEFINED_VALUE, UNDEFINED_VALUE)
            }
        }
    }

    /// Derivative of [`CompoundLithology::calc_bulk_permeability_np`] with respect to
    /// ves, m²/Pa
    ///
    /// A component held at its minimum porosity does not change with ves.
    pub fn calc_bulk_permeability_np_derivative_wrt_ves(
        &self,
        ves: f64,
        max_ves: f64,
        porosity: &CompoundProperty,
        porosity_derivative: &CompoundProperty,
    ) -> LithologyResult<(f64, f64)> {
        if porosity.len() != self.len() || porosity_derivative.len() != self.len() {
            return Err(LithologyError::ComponentMismatch {
                expected: self.len(),
                actual: porosity.len().min(porosity_derivative.len()),
            });
        }

        let mut permeabilities = Vec::with_capacity(self.len());
        let mut derivatives = Vec::with_capacity(self.len());
        for (i, component) in self.components.iter().enumerate() {
            let phi = porosity.component(i);
            let floor = self.minimum_porosities[i];
            let (phi, dphi) = if phi < floor {
                (floor, 0.0)
            } else {
                (phi, porosity_derivative.component(i))
            };
            let (k, dk) = component.permeability_derivative(ves, max_ves, phi, dphi);
            permeabilities.push(k);
            derivatives.push(dk);
        }

        let (normal, plane) = self
            .permeability_mixer
            .mix_permeability_derivatives(&permeabilities, &derivatives)?;

        if !normal.is_finite() || !plane.is_finite() {
            return Err(LithologyError::NumericDerivative {
                composition: self.composition().to_string(),
            });
        }

        Ok((normal * MILLIDARCY_TO_M2, plane * MILLIDARCY_TO_M2))
    }

    /// [`CompoundLithology::calc_bulk_permeability_np`] over matching slices
    pub fn calc_bulk_permeability_np_batch(
        &self,
        ves: &[f64],
        max_ves: &[f64],
        porosities: &[CompoundProperty],
    ) -> Vec<(f64, f64)> {
        ves.iter()
            .zip(max_ves)
            .zip(porosities)
            .map(|((ves, max_ves), porosity)| self.calc_bulk_permeability_np(*ves, *max_ves, porosity))
            .collect()
    }

    // Density and heat

    pub fn heat_capacity(&self, temperature_c: f64) -> f64 {
        self.components
            .iter()
            .zip(&self.fractions)
            .map(|(c, w)| w * c.heat_capacity(temperature_c))
            .sum()
    }

    /// Volumetric heat capacity of the matrix, J/(m³·K)
    pub fn density_x_heat_capacity(&self, temperature_c: f64, pressure_pa: f64) -> f64 {
        self.components
            .iter()
            .zip(&self.fractions)
            .map(|(c, w)| w * c.heat_capacity(temperature_c) * c.density_at(temperature_c, pressure_pa))
            .sum()
    }

    /// Matrix density; a basement lithology follows its own temperature dependence
    pub fn compute_density(&self, temperature_c: f64, lithostatic_pressure_pa: f64) -> f64 {
        if self.is_basement {
            self.components[0].density_at(temperature_c, lithostatic_pressure_pa)
        } else {
            self.density_kg_m3
        }
    }

    /// Bulk density of the fluid-filled rock; without a fluid, the matrix density
    pub fn calc_bulk_density(
        &self,
        fluid: Option<&dyn FluidProperties>,
        porosity: f64,
        pore_pressure_pa: f64,
        temperature_c: f64,
        lithostatic_pressure_pa: f64,
    ) -> f64 {
        let matrix = self.compute_density(temperature_c, lithostatic_pressure_pa);
        match fluid {
            Some(fluid) => matrix * (1.0 - porosity) + fluid.density(temperature_c, pore_pressure_pa) * porosity,
            None => matrix,
        }
    }

    pub fn calc_bulk_density_xheat_capacity(
        &self,
        fluid: Option<&dyn FluidProperties>,
        porosity: f64,
        pore_pressure_pa: f64,
        temperature_c: f64,
        lithostatic_pressure_pa: f64,
    ) -> f64 {
        let matrix = self.density_x_heat_capacity(temperature_c, lithostatic_pressure_pa);
        match fluid {
            Some(fluid) => {
                matrix * (1.0 - porosity) + fluid.density_x_heat_capacity(temperature_c, pore_pressure_pa) * porosity
            }
            // crust and mantle carry no fluid and no porosity
            None => matrix,
        }
    }

    /// Radiogenic heat production of the bulk rock, W/m³
    pub fn calc_bulk_heat_prod(&self, porosity: f64) -> f64 {
        (1.0 - porosity) * self.heat_production_uw_m3 * MICROWATT_TO_WATT
    }

    // Thermal conductivity

    pub fn thermal_conductivity_n(&self, temperature_c: f64) -> f64 {
        self.thermal_conductivity.normal(temperature_c)
    }

    pub fn thermal_conductivity_p(&self, temperature_c: f64) -> f64 {
        self.thermal_conductivity.plane(temperature_c)
    }

    pub fn thermal_conductivity_table(&self) -> &ThermalConductivityTable {
        &self.thermal_conductivity
    }

    /// Bulk `(normal, plane)` conductivity, geometric in matrix and fluid
    ///
    /// Without a fluid the pore space conducts with 1 W/(m·K).
    pub fn calc_bulk_therm_cond_np(
        &self,
        fluid: Option<&dyn FluidProperties>,
        porosity: f64,
        temperature_c: f64,
        pore_pressure_pa: f64,
    ) -> (f64, f64) {
        let fluid_conductivity = fluid.map_or(1.0, |f| f.thermal_conductivity(temperature_c, pore_pressure_pa));
        let bulk = |matrix: f64| matrix.powf(1.0 - porosity) * fluid_conductivity.powf(porosity);
        (
            bulk(self.thermal_conductivity_n(temperature_c)),
            bulk(self.thermal_conductivity_p(temperature_c)),
        )
    }

    /// Bulk `(normal, plane)` conductivity of a basement lithology, which holds no fluid
    pub fn calc_bulk_therm_cond_np_basement(
        &self,
        porosity: f64,
        temperature_c: f64,
        lithostatic_pressure_pa: f64,
    ) -> (f64, f64) {
        if self.components.len() != 1 {
            log::warn!("basement conductivity asked of {} lithologies", self.components.len());
        }

        let component = &self.components[0];
        let (normal, plane) = if component.name() == ALC_BASALT_LITHOLOGY_NAME {
            let k = component.thermal_conductivity(temperature_c, lithostatic_pressure_pa);
            (k, k)
        } else {
            (
                self.thermal_conductivity_n(temperature_c),
                self.thermal_conductivity_p(temperature_c),
            )
        };

        (normal.powf(1.0 - porosity), plane.powf(1.0 - porosity))
    }

    // Capillary pressure

    /// Brooks–Corey entry pressure, Pa, for a permeability in m²
    ///
    /// `Pce = C1 · (10^-C2)^log10(k[mD])` MPa. Returns [`UNDEFINED_VALUE`] for a
    /// non-positive permeability.
    pub fn capillary_entry_pressure(&self, permeability_m2: f64) -> f64 {
        let permeability_md = permeability_m2 / MILLIDARCY_TO_M2;
        if permeability_md <= 0.0 || !permeability_md.is_finite() {
            log::warn!("capillary entry pressure undefined for permeability {permeability_m2} m2");
            return UNDEFINED_VALUE;
        }
        self.cap_c1 * self.ten_power_cap_c2.powf(permeability_md.log10()) * MPA_TO_PA
    }

    /// Brooks–Corey capillary pressure, Pa: `Pce · Se^(-1/λ_Pc)`
    ///
    /// `Se` is the wetting saturation normalised by the residual saturation. Returns
    /// [`UNDEFINED_VALUE`] when the effective saturation is not positive.
    pub fn capillary_pressure(
        &self,
        permeability_m2: f64,
        wetting_saturation: f64,
        residual_wetting_saturation: f64,
    ) -> f64 {
        let effective = effective_saturation(wetting_saturation, residual_wetting_saturation);
        if effective <= 0.0 || self.lambda_pc <= 0.0 {
            log::warn!(
                "capillary pressure undefined at saturation {wetting_saturation} (residual {residual_wetting_saturation})"
            );
            return UNDEFINED_VALUE;
        }
        self.capillary_entry_pressure(permeability_m2) * effective.powf(-1.0 / self.lambda_pc)
    }

    /// Brooks–Corey wetting-phase relative permeability `Se^((2 + 3λ_Kr)/λ_Kr)`
    pub fn wetting_relative_permeability(&self, wetting_saturation: f64, residual_wetting_saturation: f64) -> f64 {
        let effective = effective_saturation(wetting_saturation, residual_wetting_saturation).max(0.0);
        if self.lambda_kr <= 0.0 {
            return 0.0;
        }
        effective.powf((2.0 + 3.0 * self.lambda_kr) / self.lambda_kr)
    }

    // Fracturing

    /// Pore pressure at which the rock fractures
    pub fn fracture_pressure(&self, hydrostatic_pressure_pa: f64, lithostatic_pressure_pa: f64) -> f64 {
        self.fracture_gradient * (lithostatic_pressure_pa - hydrostatic_pressure_pa) + hydrostatic_pressure_pa
    }

    pub fn has_hydraulically_fractured(
        &self,
        hydrostatic_pressure_pa: f64,
        pore_pressure_pa: f64,
        lithostatic_pressure_pa: f64,
    ) -> bool {
        pore_pressure_pa > self.fracture_pressure(hydrostatic_pressure_pa, lithostatic_pressure_pa)
    }

    // Compaction geometry

    pub fn exponential_decompaction_function(&self, ves: f64) -> f64 {
        self.porosity.exponential_decompaction_function(ves)
    }

    /// Real thickness of a segment of solid thickness `solid_thickness`
    pub fn compute_segment_thickness(
        &self,
        top_max_ves: f64,
        bottom_max_ves: f64,
        density_difference: f64,
        solid_thickness: f64,
    ) -> f64 {
        self.mixing_law
            .segment_thickness(&self.porosity, top_max_ves, bottom_max_ves, density_difference, solid_thickness)
    }

    /// Solid thickness of a layer compacted under hydrostatic (or, scaled, overpressured)
    /// conditions
    pub fn hydrostat_full_comp_thickness(
        &self,
        max_ves: f64,
        thickness: f64,
        density_difference: f64,
        overpressured_compaction: bool,
    ) -> f64 {
        let max_ves = if overpressured_compaction {
            max_ves * self.ves_scale_factor
        } else {
            max_ves
        };
        self.porosity.full_comp_thickness(
            max_ves,
            thickness,
            density_difference,
            self.ves_scale_factor,
            overpressured_compaction,
        )
    }

    /// Bulk seismic velocity, m/s, of the rock saturated with `fluid`
    pub fn calc_seismic_velocity(
        &self,
        fluid: &dyn FluidProperties,
        porosity: f64,
        temperature_c: f64,
        pore_pressure_pa: f64,
    ) -> f64 {
        self.seismic_velocity.velocity(
            porosity,
            fluid.seismic_velocity(temperature_c, pore_pressure_pa),
            fluid.density(temperature_c, pore_pressure_pa),
        )
    }
}

fn values_of<F>(components: &[Arc<dyn SimpleLithology>], value: F) -> Vec<f64>
where
    F: Fn(&dyn SimpleLithology) -> f64,
{
    components.iter().map(|c| value(c.as_ref())).collect()
}

/// All active components must compact with the same law
fn allowable_mixing(components: &[Arc<dyn SimpleLithology>]) -> bool {
    match components.split_first() {
        Some((first, rest)) => {
            let kind = first.porosity_model().kind();
            rest.iter().all(|c| c.porosity_model().kind() == kind)
        }
        None => true,
    }
}

fn describe(components: &[Arc<dyn SimpleLithology>], percentages: &[f64]) -> String {
    components
        .iter()
        .zip(percentages)
        .map(|(c, p)| format!("{} ({}, {p}%)", c.name(), c.porosity_model().kind().as_str()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Index of the largest fraction, the first one on a tie
fn dominant_index(fractions: &[f64]) -> usize {
    let mut dominant = 0;
    for (i, fraction) in fractions.iter().enumerate() {
        if *fraction > fractions[dominant] {
            dominant = i;
        }
    }
    dominant
}

fn mix_surface_porosity(kind: PorosityModelType, components: &[Arc<dyn SimpleLithology>], fractions: &[f64]) -> f64 {
    let porosities: Vec<f64> = components.iter().map(|c| c.depositional_porosity()).collect();

    if kind.is_exponential_type() {
        return arithmetic_mean(fractions, &porosities);
    }

    // void ratio, not porosity, is additive under the soil mechanics law
    let void_ratios: Vec<f64> = porosities.iter().map(|phi| phi / (1.0 - phi)).collect();
    let void_ratio = arithmetic_mean(fractions, &void_ratios);
    void_ratio / (1.0 + void_ratio)
}

fn mix_compaction_coefficients(components: &[Arc<dyn SimpleLithology>], fractions: &[f64]) -> CompactionCoefficients {
    let mut mixed = CompactionCoefficients::default();
    for (component, w) in components.iter().zip(fractions) {
        let c = component.porosity_model().coefficients();
        mixed.incr += w * c.incr;
        mixed.incr_a += w * c.incr_a;
        mixed.incr_b += w * c.incr_b;
        mixed.ratio += w * c.ratio;
        mixed.soil_mechanics += w * c.soil_mechanics;
    }
    mixed.decr = UNLOADING_COMPACTION_RATIO * mixed.incr;
    mixed.decr_a = UNLOADING_COMPACTION_RATIO * mixed.incr_a;
    mixed.decr_b = UNLOADING_COMPACTION_RATIO * mixed.incr_b;
    mixed
}

/// Porosity floor of each component's permeability evaluation
///
/// Soil-mechanics components stop at their porosity under the stress that takes
/// the mixture to the minimum soil-mechanics porosity.
fn minimum_porosities(
    kind: PorosityModelType,
    components: &[Arc<dyn SimpleLithology>],
    surface_porosity: f64,
    soil_mechanics_coefficient: f64,
) -> Vec<f64> {
    if kind != PorosityModelType::SoilMechanics {
        return vec![0.0; components.len()];
    }

    if soil_mechanics_coefficient > 0.0 {
        let surface_void_ratio = surface_porosity / (1.0 - surface_porosity);
        let minimum_void_ratio = MINIMUM_SOIL_MECHANICS_POROSITY / (1.0 - MINIMUM_SOIL_MECHANICS_POROSITY);
        let max_mixed_ves = REFERENCE_EFFECTIVE_STRESS_PA
            * ((surface_void_ratio - minimum_void_ratio) / soil_mechanics_coefficient).exp();
        components
            .iter()
            .map(|c| c.porosity(max_mixed_ves, max_mixed_ves, false, 0.0))
            .collect()
    } else {
        components.iter().map(|c| c.depositional_porosity()).collect()
    }
}

/// Tabulate the mixed conductivity at the temperatures of the shortest component table
fn mix_thermal_conductivity(
    law: &dyn MixingLaw,
    mix_model: MixModelType,
    components: &[Arc<dyn SimpleLithology>],
    fractions: &[f64],
) -> ThermalConductivityTable {
    let tables: Vec<_> = components.iter().map(|c| c.thermal_conductivity_table()).collect();
    let anisotropies: Vec<f64> = components
        .iter()
        .map(|c| c.properties().thermal_conductivity_anisotropy)
        .collect();

    let mut mixed = ThermalConductivityTable::new();
    let Some(shortest) = tables.iter().min_by_key(|t| t.len()) else {
        return mixed;
    };

    for point in shortest.points() {
        let temperature = point.temperature_c;
        let conductivities: Vec<f64> = tables.iter().map(|t| t.value_at(temperature)).collect();
        let (normal, plane) = law.thermal_conductivity(mix_model, fractions, &conductivities, &anisotropies);
        mixed.add_point(temperature, normal, plane);
    }
    mixed
}

fn hysteresis_behaviour(components: &[Arc<dyn SimpleLithology>], fractions: &[f64]) -> HysteresisBehaviour {
    let mut sand = 0.0;
    let mut impermeable = 0.0;
    for (component, w) in components.iter().zip(fractions) {
        match component.permeability_model() {
            PermeabilityModelType::Sandstone | PermeabilityModelType::Multipoint => sand += w,
            PermeabilityModelType::Impermeable | PermeabilityModelType::None => impermeable += w,
            PermeabilityModelType::Mudstone => {}
        }
    }

    if sand >= SAND_HYSTERESIS_FRACTION {
        HysteresisBehaviour::Sand
    } else if impermeable >= 1.0 - 1.0e-12 {
        HysteresisBehaviour::NoPermeability
    } else {
        HysteresisBehaviour::Shale
    }
}

fn effective_saturation(wetting_saturation: f64, residual_wetting_saturation: f64) -> f64 {
    if residual_wetting_saturation >= 1.0 {
        return 0.0;
    }
    ((wetting_saturation - residual_wetting_saturation) / (1.0 - residual_wetting_saturation)).min(1.0)
}
