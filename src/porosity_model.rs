use crate::constants::{
    ACCELERATION_DUE_TO_GRAVITY, MINIMUM_POROSITY_NON_LINEAR, REFERENCE_EFFECTIVE_STRESS_PA,
    UNLOADING_COMPACTION_RATIO,
};
use serde::{Deserialize, Serialize};

/// Compaction law family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PorosityModelType {
    /// Athy-type exponential decay with effective stress
    Exponential,
    /// Void ratio linear in log effective stress
    SoilMechanics,
    /// Sum of two exponentials weighted by a compaction ratio
    DoubleExponential,
}

impl PorosityModelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PorosityModelType::Exponential => "Exponential",
            PorosityModelType::SoilMechanics => "Soil Mechanics",
            PorosityModelType::DoubleExponential => "Double Exponential",
        }
    }

    /// Soil mechanics mixes void ratios; every other law mixes porosities
    pub fn is_exponential_type(&self) -> bool {
        !matches!(self, PorosityModelType::SoilMechanics)
    }
}

/// Compaction coefficients, in 1/Pa except the dimensionless ratio and soil coefficient
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompactionCoefficients {
    pub incr: f64,
    pub incr_a: f64,
    pub incr_b: f64,
    pub decr: f64,
    pub decr_a: f64,
    pub decr_b: f64,
    /// weight of the A term in the double exponential law
    pub ratio: f64,
    /// slope of void ratio against ln(ves)
    pub soil_mechanics: f64,
}

/// Immutable porosity law: porosity as a function of the effective-stress history
///
/// Porosities are fractions. `ves >= max_ves` is the loading branch, anything else
/// unloads elastically with the decreasing coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PorosityModel {
    kind: PorosityModelType,
    surface_porosity: f64,
    #[serde(default)]
    minimum_mechanical_porosity: f64,
    #[serde(default)]
    coefficients: CompactionCoefficients,
}

impl PorosityModel {
    pub fn new(
        kind: PorosityModelType,
        surface_porosity: f64,
        minimum_mechanical_porosity: f64,
        coefficients: CompactionCoefficients,
    ) -> Self {
        Self {
            kind,
            surface_porosity,
            minimum_mechanical_porosity,
            coefficients,
        }
    }

    pub fn exponential(surface_porosity: f64, minimum_porosity: f64, incr: f64, decr: f64) -> Self {
        Self::new(
            PorosityModelType::Exponential,
            surface_porosity,
            minimum_porosity,
            CompactionCoefficients {
                incr,
                decr,
                ..Default::default()
            },
        )
    }

    pub fn soil_mechanics(surface_porosity: f64, minimum_porosity: f64, coefficient: f64) -> Self {
        Self::new(
            PorosityModelType::SoilMechanics,
            surface_porosity,
            minimum_porosity,
            CompactionCoefficients {
                soil_mechanics: coefficient,
                ..Default::default()
            },
        )
    }

    pub fn kind(&self) -> PorosityModelType {
        self.kind
    }

    pub fn surface_porosity(&self) -> f64 {
        self.surface_porosity
    }

    pub fn minimum_mechanical_porosity(&self) -> f64 {
        self.minimum_mechanical_porosity
    }

    pub fn coefficients(&self) -> &CompactionCoefficients {
        &self.coefficients
    }

    /// The coefficient governing compaction under loading
    ///
    /// Exponential: the linear coefficient. Double exponential: the A term.
    /// Soil mechanics: the void-ratio slope.
    pub fn compaction_coefficient(&self) -> f64 {
        match self.kind {
            PorosityModelType::Exponential => self.coefficients.incr,
            PorosityModelType::DoubleExponential => self.coefficients.incr_a,
            PorosityModelType::SoilMechanics => self.coefficients.soil_mechanics,
        }
    }

    pub fn is_incompressible(&self) -> bool {
        match self.kind {
            PorosityModelType::DoubleExponential => {
                self.coefficients.incr_a <= 0.0 && self.coefficients.incr_b <= 0.0
            }
            _ => self.compaction_coefficient() <= 0.0,
        }
    }

    /// Porosity fraction at `ves` for a rock that has seen at most `max_ves`
    ///
    /// Chemical compaction adds `chemical_term` (usually negative) and cannot take
    /// the porosity below the non-linear minimum.
    pub fn calculate(
        &self,
        ves: f64,
        max_ves: f64,
        include_chemical_compaction: bool,
        chemical_compaction_term: f64,
    ) -> f64 {
        let mechanical = self.mechanical_porosity(ves, max_ves);

        if include_chemical_compaction {
            let floor = MINIMUM_POROSITY_NON_LINEAR.min(mechanical);
            (mechanical + chemical_compaction_term).max(floor)
        } else {
            mechanical
        }
    }

    /// d(porosity)/d(ves), consistent with [`PorosityModel::calculate`]
    pub fn calculate_derivative(
        &self,
        ves: f64,
        max_ves: f64,
        include_chemical_compaction: bool,
        chemical_compaction_term: f64,
    ) -> f64 {
        if include_chemical_compaction {
            let mechanical = self.mechanical_porosity(ves, max_ves);
            if mechanical + chemical_compaction_term < MINIMUM_POROSITY_NON_LINEAR.min(mechanical) {
                return 0.0;
            }
        }
        self.mechanical_derivative(ves, max_ves)
    }

    /// Void ratio `φ/(1-φ)`
    pub fn void_ratio(
        &self,
        ves: f64,
        max_ves: f64,
        include_chemical_compaction: bool,
        chemical_compaction_term: f64,
    ) -> f64 {
        let porosity = self.calculate(ves, max_ves, include_chemical_compaction, chemical_compaction_term);
        porosity / (1.0 - porosity)
    }

    /// Porosity on the loading curve at `ves`
    pub fn top_porosity(&self, ves: f64) -> f64 {
        self.mechanical_porosity(ves, ves)
    }

    fn mechanical_porosity(&self, ves: f64, max_ves: f64) -> f64 {
        let loading = ves >= max_ves;
        let phi_min = self.minimum_mechanical_porosity;
        let range = self.surface_porosity - phi_min;
        let c = &self.coefficients;

        match self.kind {
            PorosityModelType::Exponential => {
                if loading {
                    phi_min + range * (-c.incr * ves).exp()
                } else {
                    phi_min + range * (c.decr * (max_ves - ves) - c.incr * max_ves).exp()
                }
            }
            PorosityModelType::DoubleExponential => {
                let (term_a, term_b) = if loading {
                    ((-c.incr_a * ves).exp(), (-c.incr_b * ves).exp())
                } else {
                    (
                        (c.decr_a * (max_ves - ves) - c.incr_a * max_ves).exp(),
                        (c.decr_b * (max_ves - ves) - c.incr_b * max_ves).exp(),
                    )
                };
                phi_min + range * (c.ratio * term_a + (1.0 - c.ratio) * term_b)
            }
            PorosityModelType::SoilMechanics => {
                let void_ratio = self.soil_mechanics_void_ratio(ves, max_ves).max(self.minimum_void_ratio());
                void_ratio / (1.0 + void_ratio)
            }
        }
    }

    fn mechanical_derivative(&self, ves: f64, max_ves: f64) -> f64 {
        let loading = ves >= max_ves;
        let range = self.surface_porosity - self.minimum_mechanical_porosity;
        let c = &self.coefficients;

        match self.kind {
            PorosityModelType::Exponential => {
                if loading {
                    -c.incr * range * (-c.incr * ves).exp()
                } else {
                    -c.decr * range * (c.decr * (max_ves - ves) - c.incr * max_ves).exp()
                }
            }
            PorosityModelType::DoubleExponential => {
                if loading {
                    -range
                        * (c.ratio * c.incr_a * (-c.incr_a * ves).exp()
                            + (1.0 - c.ratio) * c.incr_b * (-c.incr_b * ves).exp())
                } else {
                    -range
                        * (c.ratio * c.decr_a * (c.decr_a * (max_ves - ves) - c.incr_a * max_ves).exp()
                            + (1.0 - c.ratio)
                                * c.decr_b
                                * (c.decr_b * (max_ves - ves) - c.incr_b * max_ves).exp())
                }
            }
            PorosityModelType::SoilMechanics => {
                let void_ratio = self.soil_mechanics_void_ratio(ves, max_ves);
                if void_ratio <= self.minimum_void_ratio() || ves <= REFERENCE_EFFECTIVE_STRESS_PA {
                    return 0.0;
                }
                let slope = if loading {
                    self.coefficients.soil_mechanics
                } else {
                    UNLOADING_COMPACTION_RATIO * self.coefficients.soil_mechanics
                };
                // dφ/de = 1/(1+e)², de/dves = -slope/ves
                -slope / ves / (1.0 + void_ratio).powi(2)
            }
        }
    }

    fn soil_mechanics_void_ratio(&self, ves: f64, max_ves: f64) -> f64 {
        let reference = REFERENCE_EFFECTIVE_STRESS_PA;
        let slope = self.coefficients.soil_mechanics;
        let surface_void_ratio = self.surface_porosity / (1.0 - self.surface_porosity);
        let ves = ves.max(reference);
        let max_ves = max_ves.max(reference);

        if ves >= max_ves {
            surface_void_ratio - slope * (ves / reference).ln()
        } else {
            surface_void_ratio - slope * (max_ves / reference).ln()
                + UNLOADING_COMPACTION_RATIO * slope * (max_ves / ves).ln()
        }
    }

    fn minimum_void_ratio(&self) -> f64 {
        self.minimum_mechanical_porosity / (1.0 - self.minimum_mechanical_porosity)
    }

    /// Solid (fully compacted) thickness of a hydrostatically compacted layer
    ///
    /// `max_ves` is the effective stress at the top of the layer; when `overpressured`
    /// only `1 - ves_scale_factor` of the hydrostatic stress gradient is effective.
    /// An incompressible layer keeps its depositional solid fraction.
    pub fn full_comp_thickness(
        &self,
        max_ves: f64,
        thickness: f64,
        density_difference: f64,
        ves_scale_factor: f64,
        overpressured: bool,
    ) -> f64 {
        let phi0 = self.surface_porosity;
        let c = self.compaction_coefficient();

        if self.is_incompressible() {
            return thickness * (1.0 - phi0);
        }

        let gradient_scale = if overpressured { 1.0 - ves_scale_factor } else { 1.0 };
        let stress_gradient = ACCELERATION_DUE_TO_GRAVITY * density_difference * gradient_scale;

        match self.kind {
            PorosityModelType::Exponential => {
                let c1 = stress_gradient * c;
                if c1 <= 0.0 {
                    return thickness * (1.0 - phi0 * (-c * max_ves).exp());
                }
                let c2 = (1.0 - (-c1 * thickness).exp()) * phi0 * (-c * max_ves).exp();
                (1.0 - c2).ln() / c1 + thickness
            }
            _ => {
                // midpoint rule on a single segment
                let top = self.top_porosity(max_ves);
                let mid_ves = max_ves + 0.5 * stress_gradient.max(0.0) * thickness * (1.0 - top);
                thickness * (1.0 - self.top_porosity(mid_ves))
            }
        }
    }

    /// Legacy decompaction integral `G(σ) = σ + ln(1 - φ0·e^{-cσ})/c`
    ///
    /// `(G(bottom) - G(top)) / (g·Δρ)` is the real thickness of a segment.
    pub fn exponential_decompaction_function(&self, ves: f64) -> f64 {
        let c = self.compaction_coefficient();
        if c <= 0.0 {
            return 0.0;
        }
        let r1 = 1.0 - self.surface_porosity * (-ves * c).exp();
        ves + r1.ln() / c
    }

    /// Decompaction integral at the segment top, honouring the minimum porosity
    pub fn decompaction_function_top(&self, top_ves: f64) -> f64 {
        let c = self.compaction_coefficient();
        if c <= 0.0 {
            return 0.0;
        }
        let solid = 1.0 - self.minimum_mechanical_porosity;
        let excess = self.top_porosity(top_ves) - self.minimum_mechanical_porosity;
        top_ves / solid + (solid - excess).ln() / (c * solid)
    }

    /// Decompaction integral at the segment bottom, measured from `top_ves`
    pub fn decompaction_function_bottom(&self, bottom_ves: f64, top_ves: f64) -> f64 {
        let c = self.compaction_coefficient();
        if c <= 0.0 {
            return 0.0;
        }
        let solid = 1.0 - self.minimum_mechanical_porosity;
        let excess = self.top_porosity(top_ves) - self.minimum_mechanical_porosity;
        top_ves / solid + (solid * (c * (bottom_ves - top_ves)).exp() - excess).ln() / (c * solid)
    }
}
