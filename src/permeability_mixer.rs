//! Mixed permeability of layered and homogeneous compound lithologies
//!
//! The layered model is a generalized weighted power mean (Jennings, 2014) whose
//! exponents follow from the layering index `L`:
//!
//! ```text
//! p_h = (1 + 2L) / 3        along bedding (plane)
//! p_v = (1 - 4L) / 3        across bedding (normal), p_v = 1 - 2 p_h
//! ```
//!
//! Both means are evaluated relative to the first component so that only ratios
//! are raised to powers:
//!
//! ```text
//! K_p = [1 + Σ (w_j/w_1)(A_j/A_1)^p_h (K_j/K_1)^p_h]^(1/p_h) · w_1^(1/p_h) · A_1 K_1
//! K_n = exp( ln(1 + Σ w_j (r_j^p_v - 1)) / p_v ) · K_1,       r_j = K_j/K_1
//! ```
//!
//! The normal mean is written with `ln_1p`/`exp_m1` because `1/p_v` grows without
//! bound near `L = 0.25`. At `L = 0.25` itself the exponent vanishes and the normal
//! mean is the weighted geometric mean, which is also its limit.
//!
//! All values are in millidarcy and derivatives in millidarcy per pascal; the
//! compound lithology converts to SI.

use crate::constants::GEOMETRIC_LAYERING_INDEX;
use crate::error::{LithologyError, LithologyResult};
use crate::lithology_composition::MixModelType;

/// Precomputed, stress-independent constants of one compound lithology's
/// permeability mixing
#[derive(Debug, Clone, PartialEq)]
pub struct PermeabilityMixer {
    /// fractions (0..=1), not percentages
    weights: Vec<f64>,
    anisotropies: Vec<f64>,
    mix_model: MixModelType,
    layering_index: f64,
    is_fault: bool,
    horizontal_exponent: f64,
    vertical_exponent: f64,
    inverse_horizontal_exponent: f64,
    inverse_vertical_exponent: f64,
    /// `w_j / w_1` for the second and third component
    percent_ratios: Vec<f64>,
    /// `(A_j / A_1)^p_h` for the second and third component
    aniso_ratio_exps: Vec<f64>,
    percent_power_plane: f64,
}

impl PermeabilityMixer {
    /// Build the mixer for components with the given percentages (0..=100) and
    /// permeability anisotropies
    ///
    /// Fault lithologies always mix homogeneously. Otherwise a multi-component
    /// mixture needs a defined mixing model and a layered one a layering index in
    /// `[0, 1]`.
    pub fn new(
        percentages: &[f64],
        anisotropies: &[f64],
        layering_index: f64,
        mix_model: MixModelType,
        is_fault: bool,
    ) -> LithologyResult<Self> {
        if percentages.len() != anisotropies.len() {
            return Err(LithologyError::ComponentMismatch {
                expected: percentages.len(),
                actual: anisotropies.len(),
            });
        }
        if percentages.is_empty() {
            return Err(LithologyError::WrongComponentCount { count: 0 });
        }
        if mix_model == MixModelType::Undefined && !is_fault && percentages.len() > 1 {
            return Err(LithologyError::UndefinedMixModel {
                model: mix_model.as_str().to_string(),
            });
        }

        // fractions normalised to sum to one within rounding
        let total: f64 = percentages.iter().sum();
        let weights: Vec<f64> = percentages.iter().map(|p| p / total).collect();

        let mut mixer = Self {
            weights,
            anisotropies: anisotropies.to_vec(),
            mix_model,
            layering_index,
            is_fault,
            horizontal_exponent: 0.0,
            vertical_exponent: 0.0,
            inverse_horizontal_exponent: 0.0,
            inverse_vertical_exponent: 0.0,
            percent_ratios: Vec::new(),
            aniso_ratio_exps: Vec::new(),
            percent_power_plane: 0.0,
        };

        if mixer.uses_layered_mean() {
            if !(0.0..=1.0).contains(&layering_index) {
                return Err(LithologyError::InvalidLayeringIndex {
                    index: layering_index,
                });
            }

            let horizontal = (1.0 + 2.0 * layering_index) / 3.0;
            let vertical = (1.0 - 4.0 * layering_index) / 3.0;
            mixer.horizontal_exponent = horizontal;
            mixer.vertical_exponent = vertical;
            mixer.inverse_horizontal_exponent = 1.0 / horizontal;
            mixer.inverse_vertical_exponent = if layering_index == GEOMETRIC_LAYERING_INDEX {
                0.0
            } else {
                1.0 / vertical
            };

            let w1 = mixer.weights[0];
            let a1 = mixer.anisotropies[0];
            mixer.percent_ratios = mixer.weights[1..].iter().map(|w| w / w1).collect();
            mixer.aniso_ratio_exps = mixer.anisotropies[1..]
                .iter()
                .map(|a| (a / a1).powf(horizontal))
                .collect();
            mixer.percent_power_plane = w1.powf(mixer.inverse_horizontal_exponent);
        }

        Ok(mixer)
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
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

    pub fn horizontal_exponent(&self) -> f64 {
        self.horizontal_exponent
    }

    pub fn vertical_exponent(&self) -> f64 {
        self.vertical_exponent
    }

    fn uses_layered_mean(&self) -> bool {
        self.mix_model == MixModelType::Layered && !self.is_fault
    }

    fn check_len(&self, values: &[f64]) -> LithologyResult<()> {
        if values.len() == self.weights.len() {
            Ok(())
        } else {
            Err(LithologyError::ComponentMismatch {
                expected: self.weights.len(),
                actual: values.len(),
            })
        }
    }

    /// Mixed `(normal, plane)` permeability, mD, from the component permeabilities
    pub fn mix_permeability(&self, permeabilities: &[f64]) -> LithologyResult<(f64, f64)> {
        self.check_len(permeabilities)?;

        if !self.uses_layered_mean() {
            return Ok(self.geometric_means(permeabilities));
        }

        let k1 = permeabilities[0];
        let a1 = self.anisotropies[0];
        let p_h = self.horizontal_exponent;

        let mut plane = 1.0;
        for ((k, ratio), aniso_exp) in permeabilities[1..]
            .iter()
            .zip(&self.percent_ratios)
            .zip(&self.aniso_ratio_exps)
        {
            plane += ratio * aniso_exp * (k / k1).powf(p_h);
        }
        let plane = plane.powf(self.inverse_horizontal_exponent) * self.percent_power_plane * k1 * a1;

        let normal = if self.layering_index == GEOMETRIC_LAYERING_INDEX {
            self.geometric_means(permeabilities).0
        } else {
            let p_v = self.vertical_exponent;
            let excess: f64 = permeabilities
                .iter()
                .zip(&self.weights)
                .map(|(k, w)| w * (p_v * (k / k1).ln()).exp_m1())
                .sum();
            k1 * (excess.ln_1p() * self.inverse_vertical_exponent).exp()
        };

        Ok((normal, plane))
    }

    /// Derivatives of the mixed `(normal, plane)` permeability with respect to ves,
    /// mD/Pa, from the component permeabilities and their derivatives
    ///
    /// Fault mixtures of more than one component have no defined derivative.
    pub fn mix_permeability_derivatives(
        &self,
        permeabilities: &[f64],
        derivatives: &[f64],
    ) -> LithologyResult<(f64, f64)> {
        self.check_len(permeabilities)?;
        self.check_len(derivatives)?;

        if self.is_fault && self.len() > 1 {
            return Err(LithologyError::FaultDerivative { count: self.len() });
        }

        if !self.uses_layered_mean() {
            return Ok(self.geometric_mean_derivatives(permeabilities, derivatives));
        }

        // d/dves (Σ w K^p)^(1/p) = M · Σ w (K/M)^p · dK/K, with M the mean itself;
        // at p = 0 this is the geometric-mean derivative
        let (normal_mean, plane_mean) = self.mix_permeability(permeabilities)?;
        let p_h = self.horizontal_exponent;
        let p_v = self.vertical_exponent;

        let mut plane = 0.0;
        let mut normal = 0.0;
        for i in 0..self.len() {
            let (w, aniso, k) = (self.weights[i], self.anisotropies[i], permeabilities[i]);
            let relative_change = derivatives[i] / k;
            plane += w * (aniso * k / plane_mean).powf(p_h) * relative_change;
            normal += w * (k / normal_mean).powf(p_v) * relative_change;
        }

        Ok((normal_mean * normal, plane_mean * plane))
    }

    fn geometric_means(&self, permeabilities: &[f64]) -> (f64, f64) {
        let mut normal = 1.0;
        let mut plane = 1.0;
        for ((k, w), aniso) in permeabilities.iter().zip(&self.weights).zip(&self.anisotropies) {
            normal *= k.powf(*w);
            plane *= (k * aniso).powf(*w);
        }
        (normal, plane)
    }

    // d/dves Π k_j^w_j = Σ_i w_i k_i^(w_i-1) dk_i Π_{j≠i} k_j^w_j
    fn geometric_mean_derivatives(&self, permeabilities: &[f64], derivatives: &[f64]) -> (f64, f64) {
        let mut normal = 0.0;
        let mut plane = 0.0;

        for i in 0..self.len() {
            let mut others_normal = 1.0;
            let mut others_plane = 1.0;
            for j in (0..self.len()).filter(|&j| j != i) {
                others_normal *= permeabilities[j].powf(self.weights[j]);
                others_plane *= (self.anisotropies[j] * permeabilities[j]).powf(self.weights[j]);
            }

            let (w, aniso, k) = (self.weights[i], self.anisotropies[i], permeabilities[i]);
            normal += w * k.powf(w - 1.0) * derivatives[i] * others_normal;
            plane += w * aniso * (aniso * k).powf(w - 1.0) * derivatives[i] * others_plane;
        }

        (normal, plane)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::MILLIDARCY_TO_M2;
    use approx::assert_relative_eq;

    const WEIGHTS: [f64; 3] = [33.0, 33.0, 34.0];
    const PERMEABILITIES: [f64; 3] = [1000.0, 50.0, 0.01];
    const ISOTROPIC: [f64; 3] = [1.0, 1.0, 1.0];

    fn layered(layering_index: f64, anisotropies: &[f64]) -> PermeabilityMixer {
        PermeabilityMixer::new(&WEIGHTS, anisotropies, layering_index, MixModelType::Layered, false).unwrap()
    }

    fn assert_mix(mixer: &PermeabilityMixer, permeabilities: &[f64], normal: f64, plane: f64) {
        let (n, p) = mixer.mix_permeability(permeabilities).unwrap();
        assert_relative_eq!(n, normal, max_relative = 1e-12);
        assert_relative_eq!(p, plane, max_relative = 1e-12);
    }

    #[test]
    fn test_layered_reference_values() {
        let expected = [
            (1.0, 0.029405771117828047, 346.50340000000006),
            (0.75, 0.050156865731445413, 290.74014752595969),
            (0.5, 0.20328466537757228, 229.5897917682012),
            (0.25, 7.4243784490519342, 163.91600641858543),
            (0.0, 96.638199108923132, 96.638199108923175),
        ];

        for (layering_index, normal, plane) in expected {
            assert_mix(&layered(layering_index, &ISOTROPIC), &PERMEABILITIES, normal, plane);
        }
    }

    #[test]
    fn test_homogeneous_reference_values() {
        let mixer =
            PermeabilityMixer::new(&WEIGHTS, &ISOTROPIC, -9999.0, MixModelType::Homogeneous, false).unwrap();
        assert_mix(&mixer, &PERMEABILITIES, 7.4243784490519342, 7.4243784490519342);
    }

    #[test]
    fn test_two_components() {
        let mixer =
            PermeabilityMixer::new(&[100.0, 0.0], &[1.0, 1.0], 0.5, MixModelType::Layered, false).unwrap();
        assert_mix(&mixer, &[1000.0, 50.0], 1000.0, 1000.0);

        let mixer =
            PermeabilityMixer::new(&[90.0, 10.0], &[1.0, 1.0], 0.5, MixModelType::Layered, false).unwrap();
        assert_mix(&mixer, &[1000.0, 50.0], 622.06804487938086, 873.20101826208634);

        let mixer = PermeabilityMixer::new(&[70.0, 20.0, 10.0], &ISOTROPIC, 0.5, MixModelType::Layered, false)
            .unwrap();
        assert_mix(&mixer, &PERMEABILITIES, 4.9076933527374793, 620.11520100385258);
    }

    #[test]
    fn test_anisotropy() {
        assert_mix(&layered(1.0, &[0.1, 0.1, 0.1]), &PERMEABILITIES, 0.029405771117828047, 34.650340000000007);
        assert_mix(&layered(0.5, &[1.0, 0.1, 0.5]), &PERMEABILITIES, 0.20328466537757228, 198.03258557588396);

        let mixer =
            PermeabilityMixer::new(&WEIGHTS, &[1.0, 0.1, 0.5], -9999.0, MixModelType::Homogeneous, false)
                .unwrap();
        assert_mix(&mixer, &PERMEABILITIES, 7.4243784490519342, 2.7435311965820768);
    }

    #[test]
    fn test_layered_derivative_reference_values() {
        let expected = [
            (1.0, [-100.0, -1000.0, -10000.0], -2.9015326777039680e-11, -3.7137923779000009e-12),
            (0.75, [1.0, 10.0, 100.0], 4.9315071216575015e-13, 1.9070393490911652e-13),
            (0.5, [10.0, 100.0, 1000.0], 1.8616683073217498e-11, 9.5931574002593401e-12),
            (0.25, [100.0, 1.0e3, 1.0e4], 2.4913279089200164e-9, 4.3021150943305947e-10),
            (0.0, [1.0e3, 1.0e4, 1.0e5], 1.5229101977684013e-8, 1.5229101977684013e-8),
        ];

        for (layering_index, derivatives, normal, plane) in expected {
            let (dn, dp) = layered(layering_index, &ISOTROPIC)
                .mix_permeability_derivatives(&PERMEABILITIES, &derivatives)
                .unwrap();
            assert_relative_eq!(dn * MILLIDARCY_TO_M2, normal, max_relative = 1e-10);
            assert_relative_eq!(dp * MILLIDARCY_TO_M2, plane, max_relative = 1e-10);
        }
    }

    #[test]
    fn test_homogeneous_derivative_reference_values() {
        let mixer =
            PermeabilityMixer::new(&WEIGHTS, &ISOTROPIC, -9999.0, MixModelType::Homogeneous, false).unwrap();
        let (dn, dp) = mixer
            .mix_permeability_derivatives(&PERMEABILITIES, &[1.0, 10.0, 100.0])
            .unwrap();

        assert_relative_eq!(dn * MILLIDARCY_TO_M2, 2.4913279089200166e-11, max_relative = 1e-12);
        assert_relative_eq!(dp * MILLIDARCY_TO_M2, 2.4913279089200166e-11, max_relative = 1e-12);
    }

    #[test]
    fn test_quarter_layering_is_continuous() {
        let at = layered(0.25, &ISOTROPIC).mix_permeability(&PERMEABILITIES).unwrap();
        for offset in [1.0e-12, -1.0e-12] {
            let near = layered(0.25 + offset, &ISOTROPIC)
                .mix_permeability(&PERMEABILITIES)
                .unwrap();
            assert_relative_eq!(near.0, at.0, max_relative = 1e-9);
            assert_relative_eq!(near.1, at.1, max_relative = 1e-9);
        }
    }

    #[test]
    fn test_configuration_errors() {
        assert!(matches!(
            PermeabilityMixer::new(&WEIGHTS, &ISOTROPIC, 0.5, MixModelType::Undefined, false),
            Err(LithologyError::UndefinedMixModel { .. })
        ));
        assert!(matches!(
            PermeabilityMixer::new(&WEIGHTS, &ISOTROPIC, 1.5, MixModelType::Layered, false),
            Err(LithologyError::InvalidLayeringIndex { .. })
        ));
        assert!(matches!(
            PermeabilityMixer::new(&WEIGHTS, &[1.0], 0.5, MixModelType::Layered, false),
            Err(LithologyError::ComponentMismatch { .. })
        ));

        let fault = PermeabilityMixer::new(&WEIGHTS, &ISOTROPIC, 0.5, MixModelType::Layered, true).unwrap();
        assert!(matches!(
            fault.mix_permeability_derivatives(&PERMEABILITIES, &[1.0, 1.0, 1.0]),
            Err(LithologyError::FaultDerivative { count: 3 })
        ));
        // faults mix geometrically whatever the layering
        assert_mix(&fault, &PERMEABILITIES, 7.4243784490519342, 7.4243784490519342);
    }
}
