//! District and upazila reference data used to resolve request locations.

use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum RegionError {
    #[error("failed to read region data: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid region JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct District {
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_coordinate")]
    pub lat: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_coordinate")]
    pub lon: Option<f64>,
}

impl District {
    pub fn geo(&self) -> Option<GeoPoint> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lng)) => Some(GeoPoint { lat, lng }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Upazila {
    pub id: String,
    pub district_id: String,
    pub name: String,
}

// Reference exports carry coordinates as strings; numbers are accepted too.
fn deserialize_coordinate<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Coordinate {
        Number(f64),
        Text(String),
    }

    let raw = Option::<Coordinate>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Coordinate::Number(value)) => Some(value),
        Some(Coordinate::Text(text)) => text.trim().parse::<f64>().ok(),
        None => None,
    })
}

/// In-memory lookup over districts and their upazilas.
#[derive(Debug, Clone, Default)]
pub struct RegionDirectory {
    districts: Vec<District>,
    upazilas: Vec<Upazila>,
}

impl RegionDirectory {
    pub fn new(districts: Vec<District>, upazilas: Vec<Upazila>) -> Self {
        Self {
            districts,
            upazilas,
        }
    }

    pub fn from_readers<D: Read, U: Read>(districts: D, upazilas: U) -> Result<Self, RegionError> {
        let districts: Vec<District> = serde_json::from_reader(districts)?;
        let upazilas: Vec<Upazila> = serde_json::from_reader(upazilas)?;
        Ok(Self::new(districts, upazilas))
    }

    pub fn from_paths<P: AsRef<Path>, Q: AsRef<Path>>(
        districts: P,
        upazilas: Q,
    ) -> Result<Self, RegionError> {
        let districts = std::fs::File::open(districts)?;
        let upazilas = std::fs::File::open(upazilas)?;
        Self::from_readers(districts, upazilas)
    }

    /// Built-in subset covering the divisional headquarters.
    pub fn standard() -> Self {
        let districts = [
            ("1", "Dhaka", 23.8103, 90.4125),
            ("2", "Chattogram", 22.3569, 91.7832),
            ("3", "Sylhet", 24.8949, 91.8687),
            ("4", "Khulna", 22.8088, 89.2467),
            ("5", "Rajshahi", 24.374, 88.6042),
        ]
        .into_iter()
        .map(|(id, name, lat, lon)| District {
            id: id.to_string(),
            name: name.to_string(),
            lat: Some(lat),
            lon: Some(lon),
        })
        .collect();

        let upazilas = [
            ("1", ["Savar", "Dhamrai", "Keraniganj", "Dohar"]),
            ("2", ["Hathazari", "Patiya", "Sitakunda", "Raozan"]),
            ("3", ["Beanibazar", "Companiganj", "Golapganj", "Sylhet Sadar"]),
            ("4", ["Dumuria", "Batiaghata", "Rupsa", "Terokhada"]),
            ("5", ["Paba", "Godagari", "Bagmara", "Tanore"]),
        ]
        .into_iter()
        .flat_map(|(district_id, names)| {
            names.into_iter().enumerate().map(move |(index, name)| Upazila {
                id: format!("{district_id}{:02}", index + 1),
                district_id: district_id.to_string(),
                name: name.to_string(),
            })
        })
        .collect();

        Self::new(districts, upazilas)
    }

    pub fn district(&self, id: &str) -> Option<&District> {
        self.districts.iter().find(|district| district.id == id)
    }

    pub fn district_by_name(&self, name: &str) -> Option<&District> {
        self.districts
            .iter()
            .find(|district| district.name.eq_ignore_ascii_case(name.trim()))
    }

    pub fn resolve_district_name(&self, id: &str) -> Option<&str> {
        self.district(id).map(|district| district.name.as_str())
    }

    pub fn districts_sorted(&self) -> Vec<&District> {
        let mut districts: Vec<&District> = self.districts.iter().collect();
        districts.sort_by(|left, right| left.name.cmp(&right.name));
        districts
    }

    pub fn upazilas_for(&self, district_id: &str) -> Vec<&Upazila> {
        let mut upazilas: Vec<&Upazila> = self
            .upazilas
            .iter()
            .filter(|upazila| upazila.district_id == district_id)
            .collect();
        upazilas.sort_by(|left, right| left.name.cmp(&right.name));
        upazilas
    }

    pub fn has_upazila(&self, district_id: &str, name: &str) -> bool {
        self.upazilas
            .iter()
            .any(|upazila| upazila.district_id == district_id && upazila.name == name)
    }
}
