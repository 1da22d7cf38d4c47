//! Deduplicating store of elementary and compound lithologies
//!
//! Every distinct [`CompoundLithologyComposition`] is mixed at most once, even when
//! many threads ask for it at the same time, and the result is handed out as a shared
//! `Arc`. A failed mixture is reported to the caller and never cached.

use crate::compound_lithology::CompoundLithology;
use crate::constants::{
    FAULT_DEFAULT_PASSING_LITHOLOGY_NAME, FAULT_DEFAULT_SEALING_LITHOLOGY_NAME,
    FAULT_PASSING_LOG_PERMEABILITIES, FAULT_PERMEABILITY_ANISOTROPY, FAULT_POROSITIES_PERCENT,
    FAULT_SEALING_LOG_PERMEABILITIES,
};
use crate::error::{LithologyError, LithologyResult};
use crate::lithology_catalog::LithologyCatalog;
use crate::lithology_composition::CompoundLithologyComposition;
use crate::mixing_law::MixingConfig;
use crate::simple_lithology::{ElementaryLithology, SimpleLithology};
use once_cell::sync::OnceCell;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

const SIMPLE_FAULT_LITHOLOGY_SUFFIX: &str = "_SIMPLE_FAULT_LITHOLOGY";

/// Whether a fault lets fluid through in one direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultStatus {
    Pass,
    Seal,
}

impl FaultStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FaultStatus::Pass => "PASS",
            FaultStatus::Seal => "SEAL",
        }
    }

    fn log10_permeabilities(&self) -> [f64; 2] {
        match self {
            FaultStatus::Pass => FAULT_PASSING_LOG_PERMEABILITIES,
            FaultStatus::Seal => FAULT_SEALING_LOG_PERMEABILITIES,
        }
    }
}

/// Horizontal over vertical permeability of a fault lithology
///
/// Permeability follows the vertical status; the anisotropy restores the lateral one.
pub fn fault_permeability_anisotropy(vertical: FaultStatus, lateral: FaultStatus) -> f64 {
    match (vertical, lateral) {
        (FaultStatus::Pass, FaultStatus::Seal) => 1.0 / FAULT_PERMEABILITY_ANISOTROPY,
        (FaultStatus::Seal, FaultStatus::Pass) => FAULT_PERMEABILITY_ANISOTROPY,
        _ => 1.0,
    }
}

/// Name of the elementary fault variant of `name`, e.g. `Std. Shale_FAULT_SEAL_PASS`
pub fn fault_lithology_name(name: &str, vertical: FaultStatus, lateral: FaultStatus) -> String {
    format!("{name}_FAULT_{}_{}", vertical.as_str(), lateral.as_str())
}

type CompoundSlot = Arc<OnceCell<Arc<CompoundLithology>>>;

pub struct LithologyManager {
    config: MixingConfig,
    simple: RwLock<HashMap<String, Arc<ElementaryLithology>>>,
    compounds: Mutex<HashMap<CompoundLithologyComposition, CompoundSlot>>,
    constructions: AtomicUsize,
}

impl LithologyManager {
    pub fn new(catalog: &LithologyCatalog, config: MixingConfig) -> Self {
        let simple = catalog
            .iter()
            .map(|lithology| (lithology.name.clone(), Arc::new(lithology.clone())))
            .collect();

        Self {
            config,
            simple: RwLock::new(simple),
            compounds: Mutex::new(HashMap::new()),
            constructions: AtomicUsize::new(0),
        }
    }

    pub fn config(&self) -> &MixingConfig {
        &self.config
    }

    /// Register an elementary lithology, replacing any with the same name
    ///
    /// Compound lithologies already built keep the lithology they were mixed with.
    pub fn add_simple_lithology(&self, lithology: ElementaryLithology) {
        self.simple.write().insert(lithology.name.clone(), Arc::new(lithology));
    }

    pub fn simple_lithology(&self, name: &str) -> Option<Arc<ElementaryLithology>> {
        self.simple.read().get(name).cloned()
    }

    /// The shared mixture for `composition`, mixed on first request
    pub fn compound_lithology(
        &self,
        composition: &CompoundLithologyComposition,
    ) -> LithologyResult<Arc<CompoundLithology>> {
        self.get_or_mix(composition, false)
    }

    /// Fault lithology replacing the mixture `base` inside a fault
    ///
    /// The two reserved default names rebuild every component of `base` as a sealing or
    /// passing fault variant. Any other name is taken as an elementary lithology that
    /// fills the whole fault.
    pub fn compound_fault_lithology(
        &self,
        fault_lithology_name: &str,
        base: &CompoundLithologyComposition,
    ) -> LithologyResult<Arc<CompoundLithology>> {
        match fault_lithology_name {
            FAULT_DEFAULT_SEALING_LITHOLOGY_NAME => {
                self.default_fault_lithology(base, FaultStatus::Seal, FaultStatus::Seal)
            }
            FAULT_DEFAULT_PASSING_LITHOLOGY_NAME => {
                self.default_fault_lithology(base, FaultStatus::Pass, FaultStatus::Pass)
            }
            name => {
                let fault_name = format!("{name}{SIMPLE_FAULT_LITHOLOGY_SUFFIX}");
                if self.simple_lithology(&fault_name).is_none() {
                    let lithology = self.lookup_elementary(name)?;
                    self.add_simple_lithology(lithology.renamed(&fault_name));
                }
                self.get_or_mix(&CompoundLithologyComposition::single(&fault_name), true)
            }
        }
    }

    /// Elementary fault variant of `name`, created and registered on first request
    pub fn simple_fault_lithology(
        &self,
        name: &str,
        vertical: FaultStatus,
        lateral: FaultStatus,
    ) -> LithologyResult<Arc<ElementaryLithology>> {
        let fault_name = fault_lithology_name(name, vertical, lateral);
        if let Some(existing) = self.simple_lithology(&fault_name) {
            return Ok(existing);
        }

        let base = self.lookup_elementary(name)?;
        let fault = Arc::new(base.fault_variant(
            &fault_name,
            fault_permeability_anisotropy(vertical, lateral),
            FAULT_POROSITIES_PERCENT,
            vertical.log10_permeabilities(),
        ));

        let mut simple = self.simple.write();
        Ok(simple.entry(fault_name).or_insert(fault).clone())
    }

    /// Number of distinct mixtures successfully cached
    pub fn len(&self) -> usize {
        self.compounds.lock().values().filter(|slot| slot.get().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of successful mixing operations since creation
    pub fn constructions(&self) -> usize {
        self.constructions.load(Ordering::Relaxed)
    }

    fn default_fault_lithology(
        &self,
        base: &CompoundLithologyComposition,
        vertical: FaultStatus,
        lateral: FaultStatus,
    ) -> LithologyResult<Arc<CompoundLithology>> {
        for (name, _) in base.active_components() {
            self.simple_fault_lithology(name, vertical, lateral)?;
        }
        let fault = base.renamed(|name| fault_lithology_name(name, vertical, lateral));
        self.get_or_mix(&fault, true)
    }

    fn lookup_elementary(&self, name: &str) -> LithologyResult<Arc<ElementaryLithology>> {
        self.simple_lithology(name).ok_or_else(|| LithologyError::UnknownLithology {
            name: name.to_string(),
        })
    }

    fn get_or_mix(
        &self,
        composition: &CompoundLithologyComposition,
        is_fault: bool,
    ) -> LithologyResult<Arc<CompoundLithology>> {
        let slot = self.compounds.lock().entry(composition.clone()).or_default().clone();

        if let Some(lithology) = slot.get() {
            log::debug!("compound lithology cache hit: {composition}");
            return Ok(lithology.clone());
        }

        let result = slot.get_or_try_init(|| {
            let lithology = CompoundLithology::from_composition(composition, is_fault, &self.config, |name| {
                self.simple_lithology(name)
                    .map(|lithology| lithology as Arc<dyn SimpleLithology>)
            })?;
            self.constructions.fetch_add(1, Ordering::Relaxed);
            log::debug!("mixed compound lithology {composition}");
            Ok::<_, LithologyError>(Arc::new(lithology))
        });

        match result {
            Ok(lithology) => Ok(lithology.clone()),
            Err(err) => {
                log::error!("could not create compound lithology {composition}: {err}");
                let mut compounds = self.compounds.lock();
                if compounds.get(composition).is_some_and(|cached| cached.get().is_none()) {
                    compounds.remove(composition);
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lithology_catalog::DEFAULT_CATALOG;
    use crate::lithology_composition::MixModelType;
    use crate::permeability_model::PermeabilityModelType;
    use approx::assert_abs_diff_eq;

    fn manager() -> LithologyManager {
        LithologyManager::new(&DEFAULT_CATALOG, MixingConfig::default())
    }

    fn sand_shale() -> CompoundLithologyComposition {
        CompoundLithologyComposition::new(
            ["Std. Sandstone", "Std. Shale", ""],
            [60.0, 40.0, 0.0],
            MixModelType::Homogeneous,
            0.5,
        )
    }

    #[test]
    fn test_same_composition_is_shared() {
        let manager = manager();

        let first = manager.compound_lithology(&sand_shale()).unwrap();
        let second = manager.compound_lithology(&sand_shale()).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(manager.constructions(), 1);
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_failures_are_not_cached() {
        let manager = manager();
        let missing = CompoundLithologyComposition::single("Granite");

        assert!(matches!(
            manager.compound_lithology(&missing),
            Err(LithologyError::UnknownLithology { .. })
        ));
        assert!(manager.is_empty());

        manager.add_simple_lithology(DEFAULT_CATALOG.get("Std. Shale").unwrap().renamed("Granite"));
        let granite = manager.compound_lithology(&missing).unwrap();
        assert_eq!(granite.components()[0].name(), "Granite");
        assert_eq!(manager.constructions(), 1);
    }

    #[test]
    fn test_incompatible_mixture_is_an_error() {
        let manager = manager();
        let composition = CompoundLithologyComposition::new(
            ["Std. Sandstone", "SM.Mudst.40%Clay", ""],
            [50.0, 50.0, 0.0],
            MixModelType::Homogeneous,
            0.5,
        );

        assert!(matches!(
            manager.compound_lithology(&composition),
            Err(LithologyError::IncompatiblePorosityModels { .. })
        ));
        assert!(manager.is_empty());
    }

    #[test]
    fn test_fault_names_and_anisotropy() {
        assert_eq!(
            fault_lithology_name("Std. Shale", FaultStatus::Seal, FaultStatus::Pass),
            "Std. Shale_FAULT_SEAL_PASS"
        );
        assert_eq!(fault_permeability_anisotropy(FaultStatus::Pass, FaultStatus::Pass), 1.0);
        assert_eq!(fault_permeability_anisotropy(FaultStatus::Pass, FaultStatus::Seal), 1.0e-3);
        assert_eq!(fault_permeability_anisotropy(FaultStatus::Seal, FaultStatus::Pass), 1.0e3);
        assert_eq!(fault_permeability_anisotropy(FaultStatus::Seal, FaultStatus::Seal), 1.0);
    }

    #[test]
    fn test_default_sealing_fault_lithology() {
        let manager = manager();

        let fault = manager
            .compound_fault_lithology(FAULT_DEFAULT_SEALING_LITHOLOGY_NAME, &sand_shale())
            .unwrap();

        assert!(fault.is_fault());
        assert_eq!(fault.percentages(), &[60.0, 40.0]);
        assert_eq!(fault.components()[0].name(), "Std. Sandstone_FAULT_SEAL_SEAL");
        assert_eq!(fault.components()[1].name(), "Std. Shale_FAULT_SEAL_SEAL");
        for component in fault.components() {
            assert_eq!(component.permeability_model(), PermeabilityModelType::Multipoint);
            assert_abs_diff_eq!(component.permeability(0.0, 0.0, 0.70), 1.0e-4, epsilon = 1e-15);
        }

        let again = manager
            .compound_fault_lithology(FAULT_DEFAULT_SEALING_LITHOLOGY_NAME, &sand_shale())
            .unwrap();
        assert!(Arc::ptr_eq(&fault, &again));
    }

    #[test]
    fn test_default_passing_fault_lithology() {
        let manager = manager();

        let fault = manager
            .compound_fault_lithology(FAULT_DEFAULT_PASSING_LITHOLOGY_NAME, &sand_shale())
            .unwrap();
        let shale = manager
            .simple_lithology("Std. Shale_FAULT_PASS_PASS")
            .unwrap();

        assert!(fault.is_fault());
        assert_abs_diff_eq!(shale.permeability(0.0, 0.0, 0.03), 1.0e-3, epsilon = 1e-15);
        assert_eq!(shale.properties().permeability_anisotropy, 1.0);
        assert_eq!(shale.density(), DEFAULT_CATALOG.get("Std. Shale").unwrap().density());
    }

    #[test]
    fn test_named_fault_lithology_fills_fault() {
        let manager = manager();

        let fault = manager
            .compound_fault_lithology("Std. Shale", &sand_shale())
            .unwrap();

        assert!(fault.is_fault());
        assert_eq!(fault.len(), 1);
        assert_eq!(fault.components()[0].name(), "Std. Shale_SIMPLE_FAULT_LITHOLOGY");
        assert_eq!(fault.mix_model(), MixModelType::Homogeneous);

        assert!(matches!(
            manager.compound_fault_lithology("Basalt flood", &sand_shale()),
            Err(LithologyError::UnknownLithology { .. })
        ));
    }

    #[test]
    fn test_sealing_vertical_passing_lateral_variant() {
        let manager = manager();

        let variant = manager
            .simple_fault_lithology("Std. Sandstone", FaultStatus::Seal, FaultStatus::Pass)
            .unwrap();

        assert_eq!(variant.properties().permeability_anisotropy, 1000.0);
        assert_abs_diff_eq!(variant.permeability(0.0, 0.0, 0.03), 1.0e-6, epsilon = 1e-18);
        assert!(Arc::ptr_eq(
            &variant,
            &manager
                .simple_fault_lithology("Std. Sandstone", FaultStatus::Seal, FaultStatus::Pass)
                .unwrap()
        ));
    }
}
