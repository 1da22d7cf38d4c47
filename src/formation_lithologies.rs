//! Per-cell lithology assignment of one formation over simulated time
//!
//! Every cell of the `nx × ny` grid holds a [`LithologyTimeline`]: entries
//! `(age, lithology)` kept in descending age. The stratigraphic default sits at age 0;
//! fault events and allochthonous morphing steps add further entries. At a simulated
//! age the active entry is the one with the greatest age not above it, so the
//! assignment is a step function of age and never interpolated.

use crate::compound_lithology::CompoundLithology;
use crate::constants::{MAXIMUM_NUMBER_OF_LITHOLOGIES, UNDEFINED_SCALAR_VALUE, UNDEFINED_VALUE};
use crate::error::{LithologyError, LithologyResult};
use crate::lithology_composition::{percentages_are_valid, CompoundLithologyComposition, MixModelType};
use crate::lithology_manager::LithologyManager;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Age of the stratigraphic default entry of every cell
pub const STRATIGRAPHY_ENTRY_AGE: f64 = 0.0;

/// Ordered `(age, lithology)` entries of one cell plus the active one
#[derive(Debug, Clone, Default)]
pub struct LithologyTimeline {
    entries: Vec<(f64, Arc<CompoundLithology>)>,
    current: Option<usize>,
}

impl LithologyTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry, replacing any at the same age
    ///
    /// The first entry of an empty timeline becomes active.
    pub fn add(&mut self, age: f64, lithology: Arc<CompoundLithology>) {
        match self.entries.iter().position(|(entry_age, _)| *entry_age <= age) {
            Some(index) if self.entries[index].0 == age => self.entries[index].1 = lithology,
            Some(index) => {
                self.entries.insert(index, (age, lithology));
                if let Some(current) = self.current.as_mut() {
                    if *current >= index {
                        *current += 1;
                    }
                }
            }
            None => self.entries.push((age, lithology)),
        }

        if self.current.is_none() {
            self.current = self.entries.iter().position(|(entry_age, _)| *entry_age == age);
        }
    }

    pub fn current(&self) -> Option<&Arc<CompoundLithology>> {
        self.current.map(|index| &self.entries[index].1)
    }

    pub fn current_age(&self) -> Option<f64> {
        self.current.map(|index| self.entries[index].0)
    }

    /// Entries in descending age
    pub fn entries(&self) -> &[(f64, Arc<CompoundLithology>)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Activate the entry for `age`; returns whether the active lithology changed
    ///
    /// Ages younger than every entry keep the youngest entry.
    pub fn select(&mut self, age: f64) -> bool {
        if self.entries.is_empty() {
            return false;
        }

        let index = self
            .entries
            .iter()
            .position(|(entry_age, _)| *entry_age <= age)
            .unwrap_or(self.entries.len() - 1);

        let changed = match self.current {
            Some(current) => !Arc::ptr_eq(&self.entries[current].1, &self.entries[index].1),
            None => true,
        };
        self.current = Some(index);
        changed
    }
}

/// Percentage of one stratigraphic component over the grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PercentageMap {
    Constant(f64),
    /// One value per cell, `i` varying fastest
    Grid(Vec<f64>),
}

impl PercentageMap {
    pub fn is_constant(&self) -> bool {
        matches!(self, PercentageMap::Constant(_))
    }

    fn value(&self, index: usize) -> f64 {
        match self {
            PercentageMap::Constant(value) => *value,
            PercentageMap::Grid(values) => values[index],
        }
    }
}

/// Stratigraphic lithology definition of a formation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StratigraphicLithologies {
    pub names: [String; MAXIMUM_NUMBER_OF_LITHOLOGIES],
    /// `None` when the component is not used
    pub percentages: [Option<PercentageMap>; MAXIMUM_NUMBER_OF_LITHOLOGIES],
    pub mix_model: MixModelType,
    pub layering_index: f64,
}

impl StratigraphicLithologies {
    pub fn constant(
        names: [&str; MAXIMUM_NUMBER_OF_LITHOLOGIES],
        percentages: [f64; MAXIMUM_NUMBER_OF_LITHOLOGIES],
        mix_model: MixModelType,
        layering_index: f64,
    ) -> Self {
        Self {
            names: names.map(str::to_string),
            percentages: std::array::from_fn(|k| {
                (!names[k].is_empty()).then_some(PercentageMap::Constant(percentages[k]))
            }),
            mix_model,
            layering_index,
        }
    }

    fn is_constant(&self) -> bool {
        self.percentages.iter().flatten().all(PercentageMap::is_constant)
    }

    /// Percentages at a cell, `None` where any map is undefined
    fn percentages_at(&self, index: usize) -> Option<[f64; MAXIMUM_NUMBER_OF_LITHOLOGIES]> {
        let mut values = [0.0; MAXIMUM_NUMBER_OF_LITHOLOGIES];
        for (value, map) in values.iter_mut().zip(&self.percentages) {
            if let Some(map) = map {
                *value = map.value(index);
                if *value == UNDEFINED_VALUE || *value == UNDEFINED_SCALAR_VALUE {
                    return None;
                }
            }
        }
        Some(values)
    }

    fn composition(&self, percentages: [f64; MAXIMUM_NUMBER_OF_LITHOLOGIES]) -> CompoundLithologyComposition {
        CompoundLithologyComposition::new(
            std::array::from_fn(|k| self.names[k].as_str()),
            percentages,
            self.mix_model,
            self.layering_index,
        )
    }
}

/// A fault overpressure event: from `age` on, the fault lithology fills `elements`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaultEvent {
    pub age: f64,
    pub lithology_name: String,
    /// `(i, j)` cells crossed by the fault line
    pub elements: Vec<(usize, usize)>,
    pub used_in_overpressure: bool,
}

/// Outcome of assigning fault lithologies to a formation
#[derive(Debug, Default)]
pub struct FaultAssignment {
    /// Some event of the formation is used in the overpressure calculation
    pub has_faults: bool,
    /// Elements whose fault lithology could not be built; those keep their lithology
    pub errors: Vec<LithologyError>,
}

impl FaultAssignment {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Source of lithologies for a formation that migrates through time, such as salt
pub trait AllochthonousInterpolator {
    /// Ages at which the interpolated lithologies change
    fn morphing_ages(&self) -> Vec<f64>;

    /// Lithology at a cell for one morphing age, `None` to leave the cell unchanged
    fn lithology(&self, i: usize, j: usize, age: f64) -> Option<Arc<CompoundLithology>>;
}

#[derive(Debug, Clone)]
pub struct FormationLithologies {
    name: String,
    nx: usize,
    ny: usize,
    cells: Vec<LithologyTimeline>,
    contains_fault: bool,
}

impl FormationLithologies {
    pub fn new(name: &str, nx: usize, ny: usize) -> Self {
        Self {
            name: name.to_string(),
            nx,
            ny,
            cells: vec![LithologyTimeline::new(); nx * ny],
            contains_fault: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.nx, self.ny)
    }

    pub fn contains_fault(&self) -> bool {
        self.contains_fault
    }

    pub fn valid_index(&self, i: usize, j: usize) -> bool {
        i < self.nx && j < self.ny
    }

    fn index(&self, i: usize, j: usize) -> usize {
        j * self.nx + i
    }

    /// Build the stratigraphic default entry of every cell
    ///
    /// Constant percentages are mixed once and shared by all cells. With maps each
    /// cell gets its own composition; a cell where any map is undefined is left empty.
    pub fn set_lithologies_from_strat_table(
        &mut self,
        manager: &LithologyManager,
        strat: &StratigraphicLithologies,
    ) -> LithologyResult<()> {
        let cell_count = self.nx * self.ny;
        for map in strat.percentages.iter().flatten() {
            if let PercentageMap::Grid(values) = map {
                if values.len() != cell_count {
                    return Err(LithologyError::ComponentMismatch {
                        expected: cell_count,
                        actual: values.len(),
                    });
                }
            }
        }

        let result = if strat.is_constant() {
            self.fill_constant(manager, strat)
        } else {
            self.fill_from_maps(manager, strat)
        };

        if let Err(err) = &result {
            log::error!("could not create lithologies for layer {}: {err}", self.name);
        }
        result
    }

    fn fill_constant(&mut self, manager: &LithologyManager, strat: &StratigraphicLithologies) -> LithologyResult<()> {
        let Some(percentages) = strat.percentages_at(0) else {
            log::warn!("layer {} has undefined lithology percentages", self.name);
            return Ok(());
        };
        if !percentages_are_valid(&percentages) {
            let [p1, p2, p3] = percentages;
            return Err(LithologyError::InvalidPercentages { p1, p2, p3 });
        }

        let lithology = manager.compound_lithology(&strat.composition(percentages))?;
        for cell in &mut self.cells {
            cell.add(STRATIGRAPHY_ENTRY_AGE, lithology.clone());
        }
        Ok(())
    }

    fn fill_from_maps(&mut self, manager: &LithologyManager, strat: &StratigraphicLithologies) -> LithologyResult<()> {
        for i in 0..self.nx {
            for j in 0..self.ny {
                let index = self.index(i, j);
                let Some(percentages) = strat.percentages_at(index) else {
                    continue;
                };
                if !percentages_are_valid(&percentages) {
                    let [p1, p2, p3] = percentages;
                    return Err(LithologyError::InvalidCellPercentages { i, j, p1, p2, p3 });
                }

                let lithology = manager.compound_lithology(&strat.composition(percentages))?;
                self.cells[index].add(STRATIGRAPHY_ENTRY_AGE, lithology);
            }
        }
        Ok(())
    }

    /// Add fault lithology entries for every event used in overpressure
    ///
    /// The fault lithology of an element is built from the lithology active there.
    /// Elements outside the grid are skipped. Failures are collected and the element
    /// keeps its lithology.
    pub fn set_fault_lithologies(&mut self, manager: &LithologyManager, events: &[FaultEvent]) -> FaultAssignment {
        let mut assignment = FaultAssignment::default();

        for event in events.iter().filter(|event| event.used_in_overpressure) {
            assignment.has_faults = true;

            for &(i, j) in &event.elements {
                if !self.valid_index(i, j) {
                    continue;
                }
                let index = self.index(i, j);

                let fault = match self.cells[index].current() {
                    Some(base) => manager.compound_fault_lithology(&event.lithology_name, &base.composition()),
                    None => Err(LithologyError::MissingCellLithology { i, j }),
                };

                match fault {
                    Ok(fault) => self.cells[index].add(event.age, fault),
                    Err(err) => {
                        log::error!(
                            "unable to find or create fault lithology {} at ({i}, {j}), so for age {} no fault lithology will be set: {err}",
                            event.lithology_name,
                            event.age
                        );
                        assignment.errors.push(err);
                    }
                }
            }
        }

        self.contains_fault = assignment.has_faults;
        assignment
    }

    /// Add the interpolated lithology of every cell at each morphing age
    pub fn set_allochthonous_layer(&mut self, interpolator: &dyn AllochthonousInterpolator) {
        for age in interpolator.morphing_ages() {
            for i in 0..self.nx {
                for j in 0..self.ny {
                    if let Some(lithology) = interpolator.lithology(i, j, age) {
                        let index = self.index(i, j);
                        self.cells[index].add(age, lithology);
                    }
                }
            }
        }
    }

    /// Move every cell to the entry active at `age`; returns whether any cell changed
    pub fn switch_lithologies(&mut self, age: f64) -> bool {
        let mut switched = false;
        for cell in &mut self.cells {
            switched |= cell.select(age);
        }
        if switched {
            log::debug!("layer {} switched lithologies at {age} Ma", self.name);
        }
        switched
    }

    /// Active lithology of a cell, `None` outside the grid or for an empty cell
    pub fn current(&self, i: usize, j: usize) -> Option<&Arc<CompoundLithology>> {
        if !self.valid_index(i, j) {
            return None;
        }
        self.cells[self.index(i, j)].current()
    }

    /// Active lithology of a cell, with the reason when there is none
    pub fn lithology(&self, i: usize, j: usize) -> LithologyResult<&Arc<CompoundLithology>> {
        if !self.valid_index(i, j) {
            return Err(LithologyError::CellOutOfRange {
                i,
                j,
                nx: self.nx,
                ny: self.ny,
            });
        }
        self.cells[self.index(i, j)]
            .current()
            .ok_or(LithologyError::MissingCellLithology { i, j })
    }

    pub fn timeline(&self, i: usize, j: usize) -> Option<&LithologyTimeline> {
        self.valid_index(i, j).then(|| &self.cells[self.index(i, j)])
    }
}
