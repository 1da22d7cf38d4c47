// Unit conversions
pub const MILLIDARCY_TO_M2: f64 = 9.869233e-16;
pub const MPA_TO_PA: f64 = 1.0e6;
pub const ACCELERATION_DUE_TO_GRAVITY: f64 = 9.81; // m/s²

// Sentinels
/// Substituted for a value that cannot be computed (zero denominators and the like)
pub const UNDEFINED_VALUE: f64 = 99999.0;
/// Undefined scalar, also the layering index of a homogeneous mixture
pub const UNDEFINED_SCALAR_VALUE: f64 = -9999.0;
pub const HOMOGENEOUS_LAYERING_INDEX: f64 = UNDEFINED_SCALAR_VALUE;

// Composition
pub const MAXIMUM_NUMBER_OF_LITHOLOGIES: usize = 3;
pub const LITHOLOGY_PERCENT_TOLERANCE: f64 = 1.0e-4;

// Compaction
pub const REFERENCE_EFFECTIVE_STRESS_PA: f64 = 1.0e5;
pub const MINIMUM_SOIL_MECHANICS_POROSITY: f64 = 0.03;
pub const MINIMUM_POROSITY_NON_LINEAR: f64 = 0.03;
/// Unloading compaction coefficients are this fraction of the loading ones
pub const UNLOADING_COMPACTION_RATIO: f64 = 0.1;
pub const DEFAULT_VES_SCALE_FACTOR: f64 = 0.5;

// Permeability
/// Below this surface porosity (0.03 allowing for rounding) fractures open up more
pub const FRACTURED_SURFACE_POROSITY_THRESHOLD: f64 = 0.0299;
pub const TIGHT_FRACTURED_PERMEABILITY_SCALING: f64 = 100.0;
pub const FRACTURED_PERMEABILITY_SCALING: f64 = 10.0;
/// Layering index at which the vertical power-mean exponent is zero
pub const GEOMETRIC_LAYERING_INDEX: f64 = 0.25;
/// Layering index at which the layered means are harmonic across and arithmetic along bedding
pub const SERIES_LAYERING_INDEX: f64 = 1.0;

// Reserved basement lithology names
pub const CRUST_LITHOLOGY_NAME: &str = "Crust";
pub const MANTLE_LITHOLOGY_NAME: &str = "Litho. Mantle";
pub const ALC_BASALT_LITHOLOGY_NAME: &str = "ALC Basalt";

// Fault lithologies
pub const FAULT_DEFAULT_SEALING_LITHOLOGY_NAME: &str = "Default: Sealing litho.";
pub const FAULT_DEFAULT_PASSING_LITHOLOGY_NAME: &str = "Default: Passing litho.";
pub const FAULT_PERMEABILITY_ANISOTROPY: f64 = 1000.0;
pub const FAULT_PASSING_LOG_PERMEABILITIES: [f64; 2] = [-1.0, -3.0]; // log10 mD
pub const FAULT_SEALING_LOG_PERMEABILITIES: [f64; 2] = [-4.0, -6.0]; // log10 mD
pub const FAULT_POROSITIES_PERCENT: [f64; 2] = [70.0, 3.0];
