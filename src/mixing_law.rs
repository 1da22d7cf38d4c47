//! Mixing strategies that differ between the legacy and the current rock-property rules
//!
//! A compound lithology picks one strategy when it is mixed and keeps it; nothing
//! downstream branches on a legacy flag.

use crate::constants::{ACCELERATION_DUE_TO_GRAVITY, DEFAULT_VES_SCALE_FACTOR, SERIES_LAYERING_INDEX};
use crate::lithology_composition::MixModelType;
use crate::math_utils::{arithmetic_mean, geometric_mean, harmonic_mean};
use crate::porosity_model::{PorosityModel, PorosityModelType};
use crate::seismic_velocity::SeismicVelocityModel;
use crate::simple_lithology::SimpleLithology;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Fractions within this distance of the largest one count as tied for dominance
const DOMINANCE_TOLERANCE: f64 = 1.0e-12;

pub trait MixingLaw: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    fn is_legacy(&self) -> bool;

    /// Capillary entry-pressure coefficients `(C1, C2)`
    fn capillary_entry_coefficients(
        &self,
        components: &[Arc<dyn SimpleLithology>],
        fractions: &[f64],
        mix_model: MixModelType,
    ) -> (f64, f64);

    /// Brooks–Corey exponents `(λ_Pc, λ_Kr)`
    fn brooks_corey_exponents(&self, components: &[Arc<dyn SimpleLithology>], fractions: &[f64]) -> (f64, f64);

    /// Matrix thermal conductivity `(normal, plane)` at one temperature
    fn thermal_conductivity(
        &self,
        mix_model: MixModelType,
        fractions: &[f64],
        conductivities: &[f64],
        anisotropies: &[f64],
    ) -> (f64, f64);

    /// Layering index handed to the permeability mixer
    fn permeability_layering_index(&self, _mix_model: MixModelType, layering_index: f64) -> f64 {
        layering_index
    }

    /// Solid modulus `ρ·Vp²` of the mixture; `None` when a harmonic mean degenerates
    fn solid_modulus(&self, mix_model: MixModelType, fractions: &[f64], moduli: &[f64]) -> Option<f64>;

    /// `G(bottom) - G(top)` of the decompaction integral `dG/dσ = 1/(1-φ)`
    fn decompaction_difference(&self, model: &PorosityModel, top_ves: f64, bottom_ves: f64) -> f64;

    /// Real thickness of a segment from its solid thickness and bounding effective stresses
    ///
    /// Uses the decompaction integral when an exponential layer compacts under a
    /// positive density contrast, the trapezoid rule on `1/(1-φ)` otherwise.
    fn segment_thickness(
        &self,
        model: &PorosityModel,
        top_max_ves: f64,
        bottom_max_ves: f64,
        density_difference: f64,
        solid_thickness: f64,
    ) -> f64 {
        if model.kind() == PorosityModelType::Exponential && !model.is_incompressible() && density_difference > 0.0 {
            let thickness = self.decompaction_difference(model, top_max_ves, bottom_max_ves)
                / (ACCELERATION_DUE_TO_GRAVITY * density_difference);
            if thickness.is_finite() {
                return thickness;
            }
        }

        let top_porosity = model.top_porosity(top_max_ves);
        let bottom_porosity = model.top_porosity(bottom_max_ves);
        0.5 * (1.0 / (1.0 - top_porosity) + 1.0 / (1.0 - bottom_porosity)) * solid_thickness
    }
}

/// Rules of older projects: tightest-layer capillary pressure, dominant-component
/// Brooks–Corey exponents, harmonic/arithmetic layered conductivity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LegacyMixing;

/// Current rules: weighted means whatever the mixing model
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RockPropertyMixing;

pub static LEGACY_MIXING: LegacyMixing = LegacyMixing;
pub static ROCK_PROPERTY_MIXING: RockPropertyMixing = RockPropertyMixing;

/// The strategy for a project
pub fn mixing_law(legacy: bool) -> &'static dyn MixingLaw {
    if legacy {
        &LEGACY_MIXING
    } else {
        &ROCK_PROPERTY_MIXING
    }
}

/// Run-wide mixing settings, fixed before the first compound lithology is built
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MixingConfig {
    /// Mix with the rules of older projects
    pub legacy: bool,
    /// Fraction of the hydrostatic ves assumed lost to overpressure when estimating
    /// solid thicknesses
    pub ves_scale_factor: f64,
    pub seismic_velocity_model: SeismicVelocityModel,
}

impl Default for MixingConfig {
    fn default() -> Self {
        Self {
            legacy: false,
            ves_scale_factor: DEFAULT_VES_SCALE_FACTOR,
            seismic_velocity_model: SeismicVelocityModel::default(),
        }
    }
}

impl MixingConfig {
    pub fn legacy() -> Self {
        Self {
            legacy: true,
            ..Self::default()
        }
    }

    pub fn mixing_law(&self) -> &'static dyn MixingLaw {
        mixing_law(self.legacy)
    }
}

fn arithmetic_capillary(components: &[Arc<dyn SimpleLithology>], fractions: &[f64]) -> (f64, f64) {
    let c1: Vec<f64> = components.iter().map(|c| c.properties().cap_c1).collect();
    let c2: Vec<f64> = components.iter().map(|c| c.properties().cap_c2).collect();
    (arithmetic_mean(fractions, &c1), arithmetic_mean(fractions, &c2))
}

fn geometric_conductivity(fractions: &[f64], conductivities: &[f64], anisotropies: &[f64]) -> (f64, f64) {
    let plane: Vec<f64> = conductivities.iter().zip(anisotropies).map(|(k, a)| k * a).collect();
    (
        geometric_mean(fractions, conductivities),
        geometric_mean(fractions, &plane),
    )
}

/// Exponent of the largest-fraction component, the smaller exponent on a tie
fn dominant_exponent(fractions: &[f64], exponents: &[f64]) -> f64 {
    let largest = fractions.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    fractions
        .iter()
        .zip(exponents)
        .filter(|(fraction, _)| largest - **fraction <= DOMINANCE_TOLERANCE)
        .map(|(_, exponent)| *exponent)
        .fold(f64::INFINITY, f64::min)
}

impl MixingLaw for LegacyMixing {
    fn name(&self) -> &'static str {
        "legacy"
    }

    fn is_legacy(&self) -> bool {
        true
    }

    fn capillary_entry_coefficients(
        &self,
        components: &[Arc<dyn SimpleLithology>],
        fractions: &[f64],
        mix_model: MixModelType,
    ) -> (f64, f64) {
        if mix_model != MixModelType::Layered {
            return arithmetic_capillary(components, fractions);
        }

        // a layered rock is sealed by its tightest layer
        let tightest = components
            .iter()
            .min_by(|a, b| a.depositional_permeability().total_cmp(&b.depositional_permeability()));
        match tightest {
            Some(lithology) => (lithology.properties().cap_c1, lithology.properties().cap_c2),
            None => (0.0, 0.0),
        }
    }

    fn brooks_corey_exponents(&self, components: &[Arc<dyn SimpleLithology>], fractions: &[f64]) -> (f64, f64) {
        let lambda_pc: Vec<f64> = components.iter().map(|c| c.properties().lambda_pc).collect();
        let lambda_kr: Vec<f64> = components.iter().map(|c| c.properties().lambda_kr).collect();
        (
            dominant_exponent(fractions, &lambda_pc),
            dominant_exponent(fractions, &lambda_kr),
        )
    }

    fn thermal_conductivity(
        &self,
        mix_model: MixModelType,
        fractions: &[f64],
        conductivities: &[f64],
        anisotropies: &[f64],
    ) -> (f64, f64) {
        if mix_model != MixModelType::Layered {
            return geometric_conductivity(fractions, conductivities, anisotropies);
        }

        // layers in series across bedding, in parallel along it
        let plane: Vec<f64> = conductivities.iter().zip(anisotropies).map(|(k, a)| k * a).collect();
        let normal = harmonic_mean(fractions, conductivities).unwrap_or(0.0);
        (normal, arithmetic_mean(fractions, &plane))
    }

    // harmonic normal and arithmetic plane permeability whatever the layering index
    fn permeability_layering_index(&self, mix_model: MixModelType, layering_index: f64) -> f64 {
        if mix_model == MixModelType::Layered {
            SERIES_LAYERING_INDEX
        } else {
            layering_index
        }
    }

    fn solid_modulus(&self, mix_model: MixModelType, fractions: &[f64], moduli: &[f64]) -> Option<f64> {
        if mix_model == MixModelType::Layered {
            harmonic_mean(fractions, moduli)
        } else {
            Some(geometric_mean(fractions, moduli))
        }
    }

    fn decompaction_difference(&self, model: &PorosityModel, top_ves: f64, bottom_ves: f64) -> f64 {
        model.exponential_decompaction_function(bottom_ves) - model.exponential_decompaction_function(top_ves)
    }
}

impl MixingLaw for RockPropertyMixing {
    fn name(&self) -> &'static str {
        "rock property"
    }

    fn is_legacy(&self) -> bool {
        false
    }

    fn capillary_entry_coefficients(
        &self,
        components: &[Arc<dyn SimpleLithology>],
        fractions: &[f64],
        _mix_model: MixModelType,
    ) -> (f64, f64) {
        arithmetic_capillary(components, fractions)
    }

    fn brooks_corey_exponents(&self, components: &[Arc<dyn SimpleLithology>], fractions: &[f64]) -> (f64, f64) {
        // weighted log-mean exp(Σ w ln λ)
        let lambda_pc: Vec<f64> = components.iter().map(|c| c.properties().lambda_pc).collect();
        let lambda_kr: Vec<f64> = components.iter().map(|c| c.properties().lambda_kr).collect();
        (
            geometric_mean(fractions, &lambda_pc),
            geometric_mean(fractions, &lambda_kr),
        )
    }

    fn thermal_conductivity(
        &self,
        _mix_model: MixModelType,
        fractions: &[f64],
        conductivities: &[f64],
        anisotropies: &[f64],
    ) -> (f64, f64) {
        geometric_conductivity(fractions, conductivities, anisotropies)
    }

    fn solid_modulus(&self, _mix_model: MixModelType, fractions: &[f64], moduli: &[f64]) -> Option<f64> {
        Some(geometric_mean(fractions, moduli))
    }

    fn decompaction_difference(&self, model: &PorosityModel, top_ves: f64, bottom_ves: f64) -> f64 {
        model.decompaction_function_bottom(bottom_ves, top_ves) - model.decompaction_function_top(top_ves)
    }
}
