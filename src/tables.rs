//! Static geographic lookup tables.
//!
//! Both tables are plain JSON objects on disk. Key order is preserved so the
//! listing endpoints return entries in document order:
//!
//! ```json
//! { "Colombo": { "latitude": 6.9271, "longitude": 79.8612 } }
//! ```
//!
//! ```json
//! { "Western": ["Colombo", "Gampaha", "Kalutara"] }
//! ```

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// District name -> centroid coordinates.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct DistrictCoordinates {
    entries: IndexMap<String, Coordinates>,
}

impl DistrictCoordinates {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let txt = fs::read_to_string(path)
            .with_context(|| format!("failed to read district coordinates at {}", path.display()))?;
        serde_json::from_str(&txt)
            .with_context(|| format!("failed to parse district coordinates {}", path.display()))
    }

    pub fn get(&self, district: &str) -> Option<Coordinates> {
        self.entries.get(district).copied()
    }

    pub fn contains(&self, district: &str) -> bool {
        self.entries.contains_key(district)
    }

    pub fn as_map(&self) -> &IndexMap<String, Coordinates> {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, Coordinates)> for DistrictCoordinates {
    fn from_iter<I: IntoIterator<Item = (String, Coordinates)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Province name -> ordered district names.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct ProvinceDistricts {
    entries: IndexMap<String, Vec<String>>,
}

impl ProvinceDistricts {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let txt = fs::read_to_string(path)
            .with_context(|| format!("failed to read province mapping at {}", path.display()))?;
        serde_json::from_str(&txt)
            .with_context(|| format!("failed to parse province mapping {}", path.display()))
    }

    pub fn provinces(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn districts(&self, province: &str) -> Option<&[String]> {
        self.entries.get(province).map(Vec::as_slice)
    }

    /// Every `(province, district)` pair, in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .flat_map(|(p, ds)| ds.iter().map(move |d| (p.as_str(), d.as_str())))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, Vec<String>)> for ProvinceDistricts {
    fn from_iter<I: IntoIterator<Item = (String, Vec<String>)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn province_order_follows_document() {
        let map: ProvinceDistricts = serde_json::from_str(
            r#"{"Western": ["Colombo", "Gampaha"], "Central": ["Kandy"], "Eastern": ["Ampara"]}"#,
        )
        .unwrap();
        let provinces: Vec<&str> = map.provinces().collect();
        assert_eq!(provinces, ["Western", "Central", "Eastern"]);
        assert_eq!(map.districts("Central").unwrap(), ["Kandy"]);
        assert!(map.districts("Uva").is_none());
        assert_eq!(map.iter().count(), 4);
    }

    #[test]
    fn coordinates_lookup() {
        let coords: DistrictCoordinates = serde_json::from_str(
            r#"{"Colombo": {"latitude": 6.9271, "longitude": 79.8612}}"#,
        )
        .unwrap();
        assert!(coords.contains("Colombo"));
        let c = coords.get("Colombo").unwrap();
        assert_eq!(c.latitude, 6.9271);
        assert_eq!(c.longitude, 79.8612);
        assert!(coords.get("Galle").is_none());
    }

    #[test]
    fn coordinates_require_both_fields() {
        let res: serde_json::Result<DistrictCoordinates> =
            serde_json::from_str(r#"{"Colombo": {"latitude": 6.9}}"#);
        assert!(res.is_err());
    }
}
