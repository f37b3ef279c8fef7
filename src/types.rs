use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::tables::Coordinates;

// ---------- Request/Response types ----------

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PredictionRequest {
    pub year: i32,
    /// 1..=12 expected; not validated.
    pub month: i32,
    pub district: String,
    pub temperature: f64,
    pub rainfall: f64,
    pub humidity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub success: bool,
    pub predicted_cases: u64,
    pub district: String,
    pub year: i32,
    pub month: i32,
    pub coordinates: Coordinates,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProvincesResponse {
    pub provinces: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DistrictListResponse {
    pub districts: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DistrictTableResponse {
    pub districts: IndexMap<String, Coordinates>,
}

/// Body of every non-2xx response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}
