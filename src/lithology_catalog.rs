use crate::error::{LithologyError, LithologyResult};
use crate::simple_lithology::ElementaryLithology;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Named collection of elementary lithologies, as stored in JSON
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LithologyCatalog {
    lithologies: Vec<ElementaryLithology>,
}

/// Standard sedimentary and basement lithologies bundled with the crate
pub static DEFAULT_CATALOG: Lazy<LithologyCatalog> = Lazy::new(|| {
    let json_str = include_str!("lithologies.json");
    LithologyCatalog::from_json_str(json_str).expect("Failed to parse lithologies.json")
});

impl LithologyCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> LithologyResult<Self> {
        let mut catalog: LithologyCatalog = serde_json::from_str(json)?;
        // later entries win, as with insert
        let lithologies = std::mem::take(&mut catalog.lithologies);
        for lithology in lithologies {
            catalog.insert(lithology);
        }
        Ok(catalog)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> LithologyResult<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| LithologyError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn to_json_string(&self) -> LithologyResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Add a lithology, replacing any with the same name
    pub fn insert(&mut self, lithology: ElementaryLithology) {
        match self.lithologies.iter_mut().find(|l| l.name == lithology.name) {
            Some(existing) => *existing = lithology,
            None => self.lithologies.push(lithology),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ElementaryLithology> {
        self.lithologies.iter().find(|l| l.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.lithologies.iter().map(|l| l.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ElementaryLithology> {
        self.lithologies.iter()
    }

    pub fn len(&self) -> usize {
        self.lithologies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lithologies.is_empty()
    }
}
