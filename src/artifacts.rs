use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{info, warn};

use crate::encoder::DistrictEncoder;
use crate::features::FeatureVector;
use crate::model::{self, Regressor};
use crate::tables::{DistrictCoordinates, ProvinceDistricts};

#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub encoder: PathBuf,
    pub district_coords: PathBuf,
    pub province_mapping: PathBuf,
}

/// Everything the handlers read. Built once before serving, never mutated.
pub struct Artifacts {
    pub model: Box<dyn Regressor>,
    pub encoder: DistrictEncoder,
    pub coordinates: DistrictCoordinates,
    pub provinces: ProvinceDistricts,
}

impl Artifacts {
    pub fn load(paths: &ArtifactPaths) -> Result<Self> {
        Self::load_all(paths).context("Error loading model, encoder, or mappings")
    }

    fn load_all(paths: &ArtifactPaths) -> Result<Self> {
        let model = model::load_model(&paths.model)?;
        let encoder = DistrictEncoder::load(&paths.encoder)?;
        let coordinates = DistrictCoordinates::load(&paths.district_coords)?;
        let provinces = ProvinceDistricts::load(&paths.province_mapping)?;

        // Warmup to make sure the model accepts our input width
        model
            .predict(FeatureVector::zeros().as_slice())
            .with_context(|| format!("warmup prediction failed for {}", paths.model.display()))?;
        info!(model = %model.describe(), "warmup forward ok");

        let artifacts = Self {
            model,
            encoder,
            coordinates,
            provinces,
        };
        artifacts.report_drift();
        info!(
            classes = artifacts.encoder.len(),
            coordinates = artifacts.coordinates.len(),
            provinces = artifacts.provinces.len(),
            "artifacts loaded"
        );
        Ok(artifacts)
    }

    /// The encoder and the tables are separate files; list where they disagree.
    pub fn drift(&self) -> Vec<Drift> {
        let mut out = Vec::new();
        for class in self.encoder.classes() {
            if !self.coordinates.contains(class) {
                out.push(Drift::ClassWithoutCoordinates(class.clone()));
            }
        }
        for (province, district) in self.provinces.iter() {
            if !self.coordinates.contains(district) {
                out.push(Drift::MappedWithoutCoordinates {
                    province: province.to_string(),
                    district: district.to_string(),
                });
            }
            if !self.encoder.contains(district) {
                out.push(Drift::MappedUnknownToEncoder {
                    province: province.to_string(),
                    district: district.to_string(),
                });
            }
        }
        out
    }

    fn report_drift(&self) {
        for d in self.drift() {
            match d {
                Drift::ClassWithoutCoordinates(district) => {
                    warn!(%district, "encoder class has no coordinates")
                }
                Drift::MappedWithoutCoordinates { province, district } => {
                    warn!(%province, %district, "mapped district has no coordinates")
                }
                Drift::MappedUnknownToEncoder { province, district } => {
                    warn!(%province, %district, "mapped district unknown to encoder; /predict will reject it")
                }
            }
        }
    }
}

/// A disagreement between the encoder and the lookup tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Drift {
    ClassWithoutCoordinates(String),
    MappedWithoutCoordinates { province: String, district: String },
    MappedUnknownToEncoder { province: String, district: String },
}
