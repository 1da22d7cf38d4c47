use crate::constants::{
    HOMOGENEOUS_LAYERING_INDEX, LITHOLOGY_PERCENT_TOLERANCE, MAXIMUM_NUMBER_OF_LITHOLOGIES,
};
use crate::error::{LithologyError, LithologyResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// How the components of a compound lithology are arranged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MixModelType {
    /// Components are intimately mixed (weighted geometric means)
    Homogeneous,
    /// Components form layers; permeability follows the layering-index power mean
    Layered,
    Undefined,
}

impl MixModelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MixModelType::Homogeneous => "Homogeneous",
            MixModelType::Layered => "Layered",
            MixModelType::Undefined => "Undefined",
        }
    }

    /// Parse a mixing-model name as written in project data
    pub fn from_name(name: &str) -> LithologyResult<Self> {
        match name {
            "Homogeneous" => Ok(MixModelType::Homogeneous),
            "Layered" => Ok(MixModelType::Layered),
            _ => Err(LithologyError::UndefinedMixModel {
                model: name.to_string(),
            }),
        }
    }
}

/// Check 1 to 3 percentages against the composition rules:
/// each within `[0, 100]` and all summing to 100, within the lithology tolerance
pub fn percentages_are_valid(percentages: &[f64]) -> bool {
    let tolerance = LITHOLOGY_PERCENT_TOLERANCE;
    let minimum = percentages.iter().copied().fold(f64::INFINITY, f64::min);
    let maximum = percentages.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let sum: f64 = percentages.iter().sum();

    minimum >= -tolerance
        && maximum <= 100.0 + tolerance
        && approx::abs_diff_eq!(sum, 100.0, epsilon = tolerance)
}

/// Identifies a mixture of up to three elementary lithologies
///
/// Used as the key of the compound lithology cache, so equality and hashing are
/// exact on the stored percentages and layering index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompoundLithologyComposition {
    names: [String; MAXIMUM_NUMBER_OF_LITHOLOGIES],
    percentages: [f64; MAXIMUM_NUMBER_OF_LITHOLOGIES],
    mix_model: MixModelType,
    layering_index: f64,
}

impl CompoundLithologyComposition {
    pub fn new(
        names: [&str; MAXIMUM_NUMBER_OF_LITHOLOGIES],
        percentages: [f64; MAXIMUM_NUMBER_OF_LITHOLOGIES],
        mix_model: MixModelType,
        layering_index: f64,
    ) -> Self {
        Self {
            names: names.map(str::to_string),
            // normalise -0.0 so it hashes like 0.0
            percentages: percentages.map(|p| p + 0.0),
            mix_model,
            layering_index: layering_index + 0.0,
        }
    }

    /// A single elementary lithology at 100%
    pub fn single(name: &str) -> Self {
        Self::new(
            [name, "", ""],
            [100.0, 0.0, 0.0],
            MixModelType::Homogeneous,
            HOMOGENEOUS_LAYERING_INDEX,
        )
    }

    /// Name of component `index` (0-based); empty when unused
    pub fn lithology_name(&self, index: usize) -> &str {
        &self.names[index]
    }

    /// Percentage of component `index` (0-based)
    pub fn lithology_percentage(&self, index: usize) -> f64 {
        self.percentages[index]
    }

    pub fn names(&self) -> &[String; MAXIMUM_NUMBER_OF_LITHOLOGIES] {
        &self.names
    }

    pub fn percentages(&self) -> [f64; MAXIMUM_NUMBER_OF_LITHOLOGIES] {
        self.percentages
    }

    pub fn mix_model(&self) -> MixModelType {
        self.mix_model
    }

    pub fn layering_index(&self) -> f64 {
        self.layering_index
    }

    /// Components with a strictly positive percentage, in declaration order
    pub fn active_components(&self) -> impl Iterator<Item = (&str, f64)> {
        self.names
            .iter()
            .zip(self.percentages)
            .filter(|(_, percentage)| *percentage > 0.0)
            .map(|(name, percentage)| (name.as_str(), percentage))
    }

    pub fn validate(&self) -> LithologyResult<()> {
        if percentages_are_valid(&self.percentages) {
            Ok(())
        } else {
            let [p1, p2, p3] = self.percentages;
            Err(LithologyError::InvalidPercentages { p1, p2, p3 })
        }
    }

    /// Same percentages and mixing, with every non-empty name passed through `rename`
    pub fn renamed(&self, rename: impl Fn(&str) -> String) -> Self {
        Self {
            names: self.names.clone().map(|name| {
                if name.is_empty() { name } else { rename(&name) }
            }),
            percentages: self.percentages,
            mix_model: self.mix_model,
            layering_index: self.layering_index,
        }
    }
}

impl PartialEq for CompoundLithologyComposition {
    fn eq(&self, other: &Self) -> bool {
        self.names == other.names
            && self.mix_model == other.mix_model
            && self.percentages.map(f64::to_bits) == other.percentages.map(f64::to_bits)
            && self.layering_index.to_bits() == other.layering_index.to_bits()
    }
}

impl Eq for CompoundLithologyComposition {}

impl Hash for CompoundLithologyComposition {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.names.hash(state);
        self.mix_model.hash(state);
        self.percentages.map(f64::to_bits).hash(state);
        self.layering_index.to_bits().hash(state);
    }
}

impl fmt::Display for CompoundLithologyComposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .active_components()
            .map(|(name, percentage)| format!("{name} {percentage}%"))
            .collect();
        write!(f, "[{}] {}", parts.join(" / "), self.mix_model.as_str())?;
        if self.mix_model == MixModelType::Layered {
            write!(f, " {}", self.layering_index)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_mix_model_names() {
        assert_eq!(MixModelType::from_name("Layered").unwrap(), MixModelType::Layered);
        assert_eq!(MixModelType::from_name("Homogeneous").unwrap().as_str(), "Homogeneous");
        assert!(matches!(
            MixModelType::from_name("Blabla"),
            Err(LithologyError::UndefinedMixModel { .. })
        ));
    }

    #[test]
    fn test_percentage_rules() {
        assert!(percentages_are_valid(&[100.0, 0.0, 0.0]));
        assert!(percentages_are_valid(&[33.0, 33.0, 34.0]));
        assert!(percentages_are_valid(&[33.33333, 33.33333, 33.33334]));
        assert!(percentages_are_valid(&[50.00005, 49.99995, 0.0]));
        assert!(!percentages_are_valid(&[50.0, 49.0, 0.0]));
        assert!(!percentages_are_valid(&[110.0, -10.0, 0.0]));
        assert!(!percentages_are_valid(&[100.001, 0.0, 0.0]));
    }

    #[test]
    fn test_single_shortcut() {
        let composition = CompoundLithologyComposition::single("Std. Sandstone");

        assert_eq!(composition.lithology_name(0), "Std. Sandstone");
        assert_eq!(composition.lithology_percentage(0), 100.0);
        assert_eq!(composition.mix_model(), MixModelType::Homogeneous);
        assert_eq!(composition.layering_index(), -9999.0);
        assert_eq!(composition.active_components().count(), 1);
        assert!(composition.validate().is_ok());
    }

    #[test]
    fn test_invalid_composition_reports_percentages() {
        let composition = CompoundLithologyComposition::new(
            ["A", "B", ""],
            [60.0, 60.0, 0.0],
            MixModelType::Layered,
            0.5,
        );
        assert!(matches!(
            composition.validate(),
            Err(LithologyError::InvalidPercentages { p1, .. }) if p1 == 60.0
        ));
    }

    #[test]
    fn test_equal_compositions_share_a_key() {
        let a = CompoundLithologyComposition::new(
            ["A", "B", ""],
            [70.0, 30.0, 0.0],
            MixModelType::Layered,
            0.5,
        );
        let b = CompoundLithologyComposition::new(
            ["A", "B", ""],
            [70.0, 30.0, -0.0],
            MixModelType::Layered,
            0.5,
        );
        let c = CompoundLithologyComposition::new(
            ["A", "B", ""],
            [70.0, 30.0, 0.0],
            MixModelType::Layered,
            0.75,
        );

        let mut set = HashSet::new();
        set.insert(a.clone());
        set.insert(b);
        set.insert(c);
        assert_eq!(set.len(), 2);
        assert!(set.contains(&a));
    }

    #[test]
    fn test_renamed_keeps_empty_slots() {
        let composition = CompoundLithologyComposition::new(
            ["A", "B", ""],
            [70.0, 30.0, 0.0],
            MixModelType::Homogeneous,
            -9999.0,
        );
        let renamed = composition.renamed(|name| format!("{name}_FAULT"));

        assert_eq!(renamed.lithology_name(0), "A_FAULT");
        assert_eq!(renamed.lithology_name(1), "B_FAULT");
        assert_eq!(renamed.lithology_name(2), "");
        assert_eq!(renamed.percentages(), composition.percentages());
    }

    #[test]
    fn test_display() {
        let composition = CompoundLithologyComposition::new(
            ["Sand", "Shale", ""],
            [70.0, 30.0, 0.0],
            MixModelType::Layered,
            0.5,
        );
        assert_eq!(composition.to_string(), "[Sand 70% / Shale 30%] Layered 0.5");
    }
}
