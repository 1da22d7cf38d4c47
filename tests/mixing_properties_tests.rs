// Properties every mixture must satisfy, checked on catalog and random compositions

use approx::{assert_abs_diff_eq, assert_relative_eq};
use basin_lithology::assert_deviation;
use basin_lithology::constants::{CRUST_LITHOLOGY_NAME, MILLIDARCY_TO_M2};
use basin_lithology::fluid::{ConstantFluid, FluidProperties};
use basin_lithology::math_utils::power_mean;
use basin_lithology::permeability_mixer::PermeabilityMixer;
use basin_lithology::{
    CompoundLithologyComposition, LithologyCatalog, LithologyError, LithologyManager, MixModelType, MixingConfig,
    PorosityModel, SimpleLithology, DEFAULT_CATALOG,
};
use more_asserts::{assert_ge, assert_gt, assert_le, assert_lt};
use rand::Rng;

const EXPONENTIAL_NAMES: [&str; 4] = ["Std. Sandstone", "Std. Shale", "Std. Siltstone", "Std. Limestone"];

fn manager() -> LithologyManager {
    LithologyManager::new(&DEFAULT_CATALOG, MixingConfig::default())
}

#[test]
fn test_homogeneous_permeability_is_geometric_mean() {
    let manager = manager();
    let lithology = manager
        .compound_lithology(&CompoundLithologyComposition::new(
            ["Std. Sandstone", "Std. Siltstone", ""],
            [25.0, 75.0, 0.0],
            MixModelType::Homogeneous,
            0.5,
        ))
        .unwrap();

    let ves = 1.0e7;
    let porosity = lithology.component_porosities(ves, ves, false, 0.0);
    let (normal, plane) = lithology.calc_bulk_permeability_np(ves, ves, &porosity);

    let components = lithology.components();
    let floors = lithology.minimum_porosities();
    let k: Vec<f64> = (0..2)
        .map(|i| components[i].permeability(ves, ves, porosity.component(i).max(floors[i])))
        .collect();
    let a: Vec<f64> = (0..2)
        .map(|i| components[i].properties().permeability_anisotropy)
        .collect();

    let expected_normal = k[0].powf(0.25) * k[1].powf(0.75);
    let expected_plane = (a[0] * k[0]).powf(0.25) * (a[1] * k[1]).powf(0.75);
    assert_relative_eq!(normal / MILLIDARCY_TO_M2, expected_normal, max_relative = 1.0e-10);
    assert_relative_eq!(plane / MILLIDARCY_TO_M2, expected_plane, max_relative = 1.0e-10);
}

fn three_layers(layering_index: f64, permeabilities: &[f64]) -> (f64, f64) {
    PermeabilityMixer::new(&[33.0, 33.0, 34.0], &[1.0, 1.0, 1.0], layering_index, MixModelType::Layered, false)
        .unwrap()
        .mix_permeability(permeabilities)
        .unwrap()
}

#[test]
fn test_quarter_layering_is_continuous() {
    let permeabilities = [120.0, 0.003, 4.5];
    let at_quarter = three_layers(0.25, &permeabilities);

    for offset in [-1.0e-12, 1.0e-12] {
        let nearby = three_layers(0.25 + offset, &permeabilities);
        assert_relative_eq!(nearby.0, at_quarter.0, max_relative = 1.0e-9);
        assert_relative_eq!(nearby.1, at_quarter.1, max_relative = 1.0e-9);
    }

    // the two-sided limit cancels the slope in L
    for offset in [1.0e-9, 1.0e-7] {
        let above = three_layers(0.25 + offset, &permeabilities);
        let below = three_layers(0.25 - offset, &permeabilities);
        assert_relative_eq!(0.5 * (above.0 + below.0), at_quarter.0, max_relative = 1.0e-9);
        assert_relative_eq!(0.5 * (above.1 + below.1), at_quarter.1, max_relative = 1.0e-9);
    }

    for offset in [-1.0e-6, 1.0e-6] {
        let nearby = three_layers(0.25 + offset, &permeabilities);
        assert_relative_eq!(nearby.0, at_quarter.0, max_relative = 1.0e-4);
        assert_relative_eq!(nearby.1, at_quarter.1, max_relative = 1.0e-4);
    }

    // normal mean at L = 0.25 is the weighted geometric mean
    let geometric = 120f64.powf(0.33) * 0.003f64.powf(0.33) * 4.5f64.powf(0.34);
    assert_relative_eq!(at_quarter.0, geometric, max_relative = 1.0e-10);
}

#[test]
fn test_layered_permeability_is_power_mean() {
    let weights = [0.2, 0.5, 0.3];
    let permeabilities = [250.0, 0.01, 3.0];
    let anisotropies = [1.0, 2.0, 1.5];
    let mixer = PermeabilityMixer::new(&[20.0, 50.0, 30.0], &anisotropies, 0.5, MixModelType::Layered, false).unwrap();

    let (normal, plane) = mixer.mix_permeability(&permeabilities).unwrap();

    let scaled: Vec<f64> = permeabilities.iter().zip(&anisotropies).map(|(k, a)| k * a).collect();
    assert_relative_eq!(normal, power_mean(&weights, &permeabilities, -1.0 / 3.0), max_relative = 1.0e-10);
    assert_relative_eq!(plane, power_mean(&weights, &scaled, 2.0 / 3.0), max_relative = 1.0e-10);
}

#[test]
fn test_soil_mechanics_void_ratio_example() {
    let template = DEFAULT_CATALOG.get("SM.Mudst.40%Clay").unwrap();
    let mut catalog = LithologyCatalog::new();
    for (name, surface_porosity) in [("Loose", 0.40), ("Looser", 0.60)] {
        let mut lithology = template.renamed(name);
        lithology.porosity = PorosityModel::soil_mechanics(surface_porosity, 0.03, 0.2);
        catalog.insert(lithology);
    }
    let manager = LithologyManager::new(&catalog, MixingConfig::default());

    let lithology = manager
        .compound_lithology(&CompoundLithologyComposition::new(
            ["Loose", "Looser", ""],
            [50.0, 50.0, 0.0],
            MixModelType::Homogeneous,
            0.5,
        ))
        .unwrap();

    // void ratios 2/3 and 3/2 average to 1.0833
    assert_deviation!(lithology.surface_porosity(), 0.5201, 0.05);
}

#[test]
fn test_soil_mechanics_mixture_surface_porosity() {
    let manager = manager();
    let lithology = manager
        .compound_lithology(&CompoundLithologyComposition::new(
            ["SM.Mudst.40%Clay", "SM.Mudst.60%Clay", ""],
            [50.0, 50.0, 0.0],
            MixModelType::Homogeneous,
            0.5,
        ))
        .unwrap();

    let components = lithology.components();
    let e1 = components[0].depositional_porosity() / (1.0 - components[0].depositional_porosity());
    let e2 = components[1].depositional_porosity() / (1.0 - components[1].depositional_porosity());
    let mixed_void_ratio = 0.5 * (e1 + e2);

    assert_abs_diff_eq!(
        lithology.surface_porosity(),
        mixed_void_ratio / (1.0 + mixed_void_ratio),
        epsilon = 1.0e-12
    );
    assert_lt!(lithology.porosity(2.0e7, 2.0e7, false, 0.0), lithology.surface_porosity());
}

#[test]
fn test_incompatible_porosity_models_cannot_mix() {
    let manager = manager();

    let result = manager.compound_lithology(&CompoundLithologyComposition::new(
        ["Std. Shale", "SM.Mudst.60%Clay", ""],
        [40.0, 60.0, 0.0],
        MixModelType::Layered,
        0.5,
    ));

    assert!(matches!(result, Err(LithologyError::IncompatiblePorosityModels { .. })));
}

#[test]
fn test_basement_mixture() {
    let manager = manager();
    let crust = manager
        .compound_lithology(&CompoundLithologyComposition::single(CRUST_LITHOLOGY_NAME))
        .unwrap();

    assert!(crust.is_basement());
    assert!(crust.is_incompressible());
    assert_eq!(crust.porosity(5.0e7, 5.0e7, false, 0.0), 0.0);

    let fluid: &dyn FluidProperties = &ConstantFluid::brine();
    let cold = crust.calc_bulk_density(Some(fluid), 0.0, 1.0e7, 20.0, 3.0e8);
    let hot = crust.calc_bulk_density(Some(fluid), 0.0, 1.0e7, 600.0, 3.0e8);
    assert_le!(hot, cold);

    let (normal, plane) = crust.calc_bulk_therm_cond_np_basement(0.0, 200.0, 3.0e8);
    assert_gt!(normal, 0.0);
    assert_ge!(plane, normal * 0.99);
}

#[test]
fn test_random_compositions_stay_physical() {
    let manager = manager();
    let mut rng = rand::rng();
    let fluid: &dyn FluidProperties = &ConstantFluid::brine();

    for _ in 0..50 {
        let first = rng.random_range(1..=98) as f64;
        let second = rng.random_range(1..(100 - first as i32)) as f64;
        let percentages = [first, second, 100.0 - first - second];
        let names = {
            let start = rng.random_range(0..EXPONENTIAL_NAMES.len());
            [0, 1, 2].map(|k| EXPONENTIAL_NAMES[(start + k) % EXPONENTIAL_NAMES.len()])
        };
        let mix_model = if rng.random_bool(0.5) {
            MixModelType::Homogeneous
        } else {
            MixModelType::Layered
        };
        let layering_index = rng.random_range(0.0..=1.0);

        let lithology = manager
            .compound_lithology(&CompoundLithologyComposition::new(names, percentages, mix_model, layering_index))
            .unwrap();

        let densities: Vec<f64> = lithology.components().iter().map(|c| c.density()).collect();
        let lightest = densities.iter().cloned().fold(f64::INFINITY, f64::min);
        let heaviest = densities.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        assert_ge!(lithology.density(), lightest - 1.0e-9);
        assert_le!(lithology.density(), heaviest + 1.0e-9);

        let ves: f64 = rng.random_range(1.0e5..5.0e7);
        let porosity = lithology.porosity(ves, ves, false, 0.0);
        assert_gt!(porosity, 0.0);
        assert_lt!(porosity, 1.0);
        assert_le!(lithology.porosity_derivative_wrt_ves(ves, ves, false, 0.0), 0.0);

        // normal permeability is a power mean of the component permeabilities
        let components = lithology.component_porosities(ves, ves, false, 0.0);
        let (normal, _) = lithology.calc_bulk_permeability_np(ves, ves, &components);
        let floors = lithology.minimum_porosities();
        let k: Vec<f64> = lithology
            .components()
            .iter()
            .enumerate()
            .map(|(i, c)| c.permeability(ves, ves, components.component(i).max(floors[i])))
            .collect();
        let lowest = k.iter().cloned().fold(f64::INFINITY, f64::min);
        let highest = k.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let normal_md = normal / MILLIDARCY_TO_M2;
        assert_ge!(normal_md, lowest * (1.0 - 1.0e-9), "{}", lithology.composition());
        assert_le!(normal_md, highest * (1.0 + 1.0e-9), "{}", lithology.composition());

        let bulk_density = lithology.calc_bulk_density(Some(fluid), porosity, 1.0e7, 80.0, 2.0e7);
        assert_gt!(bulk_density, 0.0);
    }
}

#[test]
fn test_batch_matches_scalar_permeability() {
    let manager = manager();
    let lithology = manager
        .compound_lithology(&CompoundLithologyComposition::new(
            ["Std. Sandstone", "Std. Shale", "Std. Limestone"],
            [40.0, 35.0, 25.0],
            MixModelType::Layered,
            0.7,
        ))
        .unwrap();

    let ves = [1.0e6, 5.0e6, 2.0e7];
    let max_ves = [1.0e6, 8.0e6, 2.0e7];
    let porosities: Vec<_> = ves
        .iter()
        .zip(&max_ves)
        .map(|(v, m)| lithology.component_porosities(*v, *m, false, 0.0))
        .collect();

    let batch = lithology.calc_bulk_permeability_np_batch(&ves, &max_ves, &porosities);

    assert_eq!(batch.len(), 3);
    for (k, expected) in batch.iter().enumerate() {
        assert_eq!(*expected, lithology.calc_bulk_permeability_np(ves[k], max_ves[k], &porosities[k]));
    }
}
