use crate::math_utils::interpolate_piecewise;
use serde::{Deserialize, Serialize};
use std::f64::consts::LN_10;

/// Stress reference of the mudstone permeability law, Pa
pub const MUDSTONE_REFERENCE_STRESS_PA: f64 = 1.0e6;
/// Permeability of an impermeable lithology, mD
pub const IMPERMEABLE_PERMEABILITY_MD: f64 = 1.0e-9;

/// Permeability law family of an elementary lithology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermeabilityModelType {
    Sandstone,
    Mudstone,
    Multipoint,
    Impermeable,
    None,
}

/// Elementary permeability law; all permeabilities in millidarcy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum PermeabilityLaw {
    /// log10 k linear in porosity (percent) around the depositional state
    Sandstone {
        depositional_permeability_md: f64,
        depositional_porosity: f64,
        /// decades of permeability per porosity percent
        gradient: f64,
    },
    /// Power law in effective stress, independent of porosity
    Mudstone {
        depositional_permeability_md: f64,
        sensitivity_incr: f64,
        sensitivity_decr: f64,
    },
    /// log10 k interpolated against porosity (percent)
    Multipoint {
        porosity_percent: Vec<f64>,
        log10_permeability_md: Vec<f64>,
    },
    Impermeable,
    None,
}

impl PermeabilityLaw {
    /// Multipoint law from unsorted `(porosity %, log10 mD)` pairs
    pub fn multipoint(points: &[(f64, f64)]) -> Self {
        let mut points = points.to_vec();
        points.sort_by(|a, b| a.0.total_cmp(&b.0));
        PermeabilityLaw::Multipoint {
            porosity_percent: points.iter().map(|p| p.0).collect(),
            log10_permeability_md: points.iter().map(|p| p.1).collect(),
        }
    }

    pub fn model_type(&self) -> PermeabilityModelType {
        match self {
            PermeabilityLaw::Sandstone { .. } => PermeabilityModelType::Sandstone,
            PermeabilityLaw::Mudstone { .. } => PermeabilityModelType::Mudstone,
            PermeabilityLaw::Multipoint { .. } => PermeabilityModelType::Multipoint,
            PermeabilityLaw::Impermeable => PermeabilityModelType::Impermeable,
            PermeabilityLaw::None => PermeabilityModelType::None,
        }
    }

    /// Permeability at the depositional porosity and zero stress
    pub fn depositional_permeability(&self, depositional_porosity: f64) -> f64 {
        self.permeability(0.0, 0.0, depositional_porosity)
    }

    pub fn permeability(&self, ves: f64, max_ves: f64, porosity: f64) -> f64 {
        match self {
            PermeabilityLaw::Sandstone {
                depositional_permeability_md,
                depositional_porosity,
                gradient,
            } => {
                let decades = gradient * 100.0 * (porosity - depositional_porosity);
                depositional_permeability_md * 10f64.powf(decades)
            }
            PermeabilityLaw::Mudstone {
                depositional_permeability_md,
                sensitivity_incr,
                sensitivity_decr,
            } => {
                let reference = MUDSTONE_REFERENCE_STRESS_PA;
                if ves >= max_ves {
                    depositional_permeability_md * ((ves + reference) / reference).powf(-sensitivity_incr)
                } else {
                    depositional_permeability_md
                        * ((max_ves + reference) / reference).powf(-sensitivity_incr)
                        * ((max_ves + reference) / (ves + reference)).powf(*sensitivity_decr)
                }
            }
            PermeabilityLaw::Multipoint {
                porosity_percent,
                log10_permeability_md,
            } => 10f64.powf(interpolate_piecewise(
                porosity_percent,
                log10_permeability_md,
                100.0 * porosity,
            )),
            PermeabilityLaw::Impermeable => IMPERMEABLE_PERMEABILITY_MD,
            PermeabilityLaw::None => 0.0,
        }
    }

    /// Permeability and its derivative with respect to ves, given dφ/dves
    pub fn permeability_derivative(
        &self,
        ves: f64,
        max_ves: f64,
        porosity: f64,
        porosity_derivative: f64,
    ) -> (f64, f64) {
        let permeability = self.permeability(ves, max_ves, porosity);

        let derivative = match self {
            PermeabilityLaw::Sandstone { gradient, .. } => {
                permeability * LN_10 * gradient * 100.0 * porosity_derivative
            }
            PermeabilityLaw::Mudstone {
                sensitivity_incr,
                sensitivity_decr,
                ..
            } => {
                let exponent = if ves >= max_ves {
                    -sensitivity_incr
                } else {
                    -sensitivity_decr
                };
                permeability * exponent / (ves + MUDSTONE_REFERENCE_STRESS_PA)
            }
            PermeabilityLaw::Multipoint {
                porosity_percent,
                log10_permeability_md,
            } => {
                let slope = segment_slope(porosity_percent, log10_permeability_md, 100.0 * porosity);
                permeability * LN_10 * slope * 100.0 * porosity_derivative
            }
            PermeabilityLaw::Impermeable | PermeabilityLaw::None => 0.0,
        };

        (permeability, derivative)
    }
}

/// Slope of the piecewise linear table at `x`, zero outside the table
fn segment_slope(xs: &[f64], ys: &[f64], x: f64) -> f64 {
    let n = xs.len().min(ys.len());
    if n < 2 || x <= xs[0] || x >= xs[n - 1] {
        return 0.0;
    }
    let upper = xs[..n].partition_point(|&xi| xi <= x);
    let lower = upper - 1;
    (ys[upper] - ys[lower]) / (xs[upper] - xs[lower])
}
