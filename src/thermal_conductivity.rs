use crate::math_utils::interpolate_piecewise;
use serde::{Deserialize, Serialize};

/// One `(temperature, value)` sample of a temperature-dependent property
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperaturePoint {
    pub temperature_c: f64,
    pub value: f64,
}

/// Temperature-dependent property sampled at increasing temperatures
///
/// Evaluated by piecewise linear interpolation, constant beyond either end.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemperatureTable {
    points: Vec<TemperaturePoint>,
}

impl TemperatureTable {
    pub fn new(points: Vec<TemperaturePoint>) -> Self {
        let mut points = points;
        points.sort_by(|a, b| a.temperature_c.total_cmp(&b.temperature_c));
        Self { points }
    }

    /// A table holding a single value at every temperature
    pub fn constant(value: f64) -> Self {
        Self {
            points: vec![TemperaturePoint {
                temperature_c: 0.0,
                value,
            }],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn points(&self) -> &[TemperaturePoint] {
        &self.points
    }

    pub fn value_at(&self, temperature_c: f64) -> f64 {
        let temperatures: Vec<f64> = self.points.iter().map(|p| p.temperature_c).collect();
        let values: Vec<f64> = self.points.iter().map(|p| p.value).collect();
        interpolate_piecewise(&temperatures, &values, temperature_c)
    }
}

/// Mixed thermal conductivity of a compound lithology, W/(m·K)
///
/// Normal (N) is across bedding, plane (P) along bedding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThermalConductivityTable {
    temperatures_c: Vec<f64>,
    normal: Vec<f64>,
    plane: Vec<f64>,
}

impl ThermalConductivityTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_point(&mut self, temperature_c: f64, normal: f64, plane: f64) {
        self.temperatures_c.push(temperature_c);
        self.normal.push(normal);
        self.plane.push(plane);
    }

    pub fn len(&self) -> usize {
        self.temperatures_c.len()
    }

    pub fn is_empty(&self) -> bool {
        self.temperatures_c.is_empty()
    }

    pub fn normal(&self, temperature_c: f64) -> f64 {
        interpolate_piecewise(&self.temperatures_c, &self.normal, temperature_c)
    }

    pub fn plane(&self, temperature_c: f64) -> f64 {
        interpolate_piecewise(&self.temperatures_c, &self.plane, temperature_c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_temperature_table_sorts_and_interpolates() {
        let table = TemperatureTable::new(vec![
            TemperaturePoint { temperature_c: 200.0, value: 2.0 },
            TemperaturePoint { temperature_c: 0.0, value: 4.0 },
            TemperaturePoint { temperature_c: 100.0, value: 3.0 },
        ]);

        assert_eq!(table.len(), 3);
        assert_eq!(table.points()[0].temperature_c, 0.0);
        assert_abs_diff_eq!(table.value_at(50.0), 3.5, epsilon = 1e-12);
        assert_abs_diff_eq!(table.value_at(500.0), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_constant_table() {
        let table = TemperatureTable::constant(2.5);
        assert_eq!(table.value_at(-20.0), 2.5);
        assert_eq!(table.value_at(300.0), 2.5);
    }

    #[test]
    fn test_table_deserializes_from_point_list() {
        let table: TemperatureTable = serde_json::from_str(
            r#"[{"temperature_c": 0.0, "value": 3.0}, {"temperature_c": 100.0, "value": 2.0}]"#,
        )
        .unwrap();
        assert_abs_diff_eq!(table.value_at(25.0), 2.75, epsilon = 1e-12);
    }

    #[test]
    fn test_conductivity_table_directions() {
        let mut table = ThermalConductivityTable::new();
        table.add_point(0.0, 2.0, 3.0);
        table.add_point(100.0, 1.0, 2.0);

        assert_eq!(table.len(), 2);
        assert_abs_diff_eq!(table.normal(50.0), 1.5, epsilon = 1e-12);
        assert_abs_diff_eq!(table.plane(50.0), 2.5, epsilon = 1e-12);
    }
}
