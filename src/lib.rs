pub mod constants;
pub mod error;
pub mod math_utils;
pub mod lithology_composition;
pub mod porosity_model;
pub mod permeability_model;
pub mod thermal_conductivity;
pub mod simple_lithology;
pub mod lithology_catalog;
pub mod compound_property;
pub mod permeability_mixer;
pub mod seismic_velocity;
pub mod fluid;
pub mod mixing_law;
pub mod compound_lithology;
pub mod lithology_manager;
pub mod formation_lithologies;

pub use compound_lithology::{CompoundLithology, HysteresisBehaviour};
pub use compound_property::CompoundProperty;
pub use error::{LithologyError, LithologyResult};
pub use formation_lithologies::{FaultEvent, FormationLithologies, StratigraphicLithologies};
pub use lithology_catalog::{LithologyCatalog, DEFAULT_CATALOG};
pub use lithology_composition::{CompoundLithologyComposition, MixModelType};
pub use lithology_manager::LithologyManager;
pub use mixing_law::MixingConfig;
pub use porosity_model::{PorosityModel, PorosityModelType};
pub use simple_lithology::{ElementaryLithology, SimpleLithology};
