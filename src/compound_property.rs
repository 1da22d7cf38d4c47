use crate::constants::MAXIMUM_NUMBER_OF_LITHOLOGIES;

/// A property evaluated for each component of a compound lithology, plus its mixed value
///
/// Porosity is the usual example: permeability needs every component's own porosity,
/// everything else only the mixed one.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CompoundProperty {
    values: [f64; MAXIMUM_NUMBER_OF_LITHOLOGIES],
    count: usize,
    mixed: f64,
}

impl CompoundProperty {
    /// Bundle per-component values with their mixed value; extra values are ignored
    pub fn new(components: &[f64], mixed: f64) -> Self {
        let count = components.len().min(MAXIMUM_NUMBER_OF_LITHOLOGIES);
        let mut values = [0.0; MAXIMUM_NUMBER_OF_LITHOLOGIES];
        values[..count].copy_from_slice(&components[..count]);
        Self {
            values,
            count,
            mixed,
        }
    }

    /// The same value for `count` components and the mixture
    pub fn uniform(value: f64, count: usize) -> Self {
        let count = count.min(MAXIMUM_NUMBER_OF_LITHOLOGIES);
        let mut values = [0.0; MAXIMUM_NUMBER_OF_LITHOLOGIES];
        values[..count].fill(value);
        Self {
            values,
            count,
            mixed: value,
        }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn component(&self, index: usize) -> f64 {
        self.components()[index]
    }

    pub fn components(&self) -> &[f64] {
        &self.values[..self.count]
    }

    pub fn mixed(&self) -> f64 {
        self.mixed
    }
}
