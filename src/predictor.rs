use thiserror::Error;
use tracing::debug;

use crate::artifacts::Artifacts;
use crate::features::FeatureVector;
use crate::model::ModelError;
use crate::types::{PredictionRequest, PredictionResult};

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("Unknown district")]
    UnknownDistrict,
    #[error("District coordinates not found")]
    MissingCoordinates,
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("model returned a non-finite prediction: {0}")]
    NonFinite(f64),
}

/// Clamp negatives to zero, then round half to even.
pub fn to_case_count(raw: f64) -> Result<u64, PredictError> {
    if !raw.is_finite() {
        return Err(PredictError::NonFinite(raw));
    }
    Ok(raw.max(0.0).round_ties_even() as u64)
}

/// Validates the district, builds the feature vector and runs the model.
pub fn predict(artifacts: &Artifacts, req: &PredictionRequest) -> Result<PredictionResult, PredictError> {
    if !artifacts.encoder.contains(&req.district) {
        return Err(PredictError::UnknownDistrict);
    }
    let coordinates = artifacts
        .coordinates
        .get(&req.district)
        .ok_or(PredictError::MissingCoordinates)?;

    let features = FeatureVector::assemble(req, coordinates);
    if tracing::enabled!(tracing::Level::DEBUG) {
        let (nz, mean, std) = features.summary();
        debug!(
            district = %req.district,
            year = req.year,
            month = req.month,
            nonzero = nz,
            "features mean={:.3} std={:.3} sample=[{}]",
            mean,
            std,
            features.sample(6)
        );
    }

    let raw = artifacts.model.predict(features.as_slice())?;
    let predicted_cases = to_case_count(raw)?;
    debug!(raw, predicted_cases, "prediction");

    Ok(PredictionResult {
        success: true,
        predicted_cases,
        district: req.district.clone(),
        year: req.year,
        month: req.month,
        coordinates,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::DistrictEncoder;
    use crate::features::FEATURE_COUNT;
    use crate::model::{ModelError, Regressor};
    use crate::tables::{Coordinates, DistrictCoordinates, ProvinceDistricts};

    #[derive(Debug)]
    struct Fixed(f64);

    impl Regressor for Fixed {
        fn predict(&self, x: &[f64]) -> Result<f64, ModelError> {
            assert_eq!(x.len(), FEATURE_COUNT);
            Ok(self.0)
        }

        fn describe(&self) -> String {
            "fixed".into()
        }
    }

    #[derive(Debug)]
    struct Broken;

    impl Regressor for Broken {
        fn predict(&self, _: &[f64]) -> Result<f64, ModelError> {
            Err(ModelError::Backend("tensor shape mismatch".into()))
        }

        fn describe(&self) -> String {
            "broken".into()
        }
    }

    fn artifacts(model: Box<dyn Regressor>) -> Artifacts {
        Artifacts {
            model,
            encoder: DistrictEncoder::new(["Colombo", "Kandy"]),
            coordinates: [(
                "Colombo".to_string(),
                Coordinates {
                    latitude: 6.9271,
                    longitude: 79.8612,
                },
            )]
            .into_iter()
            .collect::<DistrictCoordinates>(),
            provinces: ProvinceDistricts::default(),
        }
    }

    fn request(district: &str) -> PredictionRequest {
        PredictionRequest {
            year: 2023,
            month: 7,
            district: district.into(),
            temperature: 29.0,
            rainfall: 210.0,
            humidity: 84.0,
        }
    }

    #[test]
    fn clamp_then_round() {
        assert_eq!(to_case_count(-3.7).unwrap(), 0);
        assert_eq!(to_case_count(-0.4).unwrap(), 0);
        assert_eq!(to_case_count(2.4).unwrap(), 2);
        assert_eq!(to_case_count(2.6).unwrap(), 3);
        assert_eq!(to_case_count(2.5).unwrap(), 2);
        assert_eq!(to_case_count(3.5).unwrap(), 4);
        assert_eq!(to_case_count(0.0).unwrap(), 0);
    }

    #[test]
    fn non_finite_output_is_an_error() {
        assert!(matches!(to_case_count(f64::NAN), Err(PredictError::NonFinite(_))));
        assert!(to_case_count(f64::INFINITY).is_err());
        assert!(to_case_count(f64::NEG_INFINITY).is_err());
    }

    #[test]
    fn echoes_request_and_coordinates() {
        let a = artifacts(Box::new(Fixed(41.6)));
        let out = predict(&a, &request("Colombo")).unwrap();
        assert!(out.success);
        assert_eq!(out.predicted_cases, 42);
        assert_eq!(out.district, "Colombo");
        assert_eq!(out.year, 2023);
        assert_eq!(out.month, 7);
        assert_eq!(out.coordinates.latitude, 6.9271);
    }

    #[test]
    fn unknown_district_checked_before_coordinates() {
        let a = artifacts(Box::new(Fixed(1.0)));
        let err = predict(&a, &request("Atlantis")).unwrap_err();
        assert!(matches!(err, PredictError::UnknownDistrict));
        assert_eq!(err.to_string(), "Unknown district");
    }

    #[test]
    fn encoder_and_table_checked_independently() {
        // Kandy is a known class but has no coordinates.
        let a = artifacts(Box::new(Fixed(1.0)));
        let err = predict(&a, &request("Kandy")).unwrap_err();
        assert!(matches!(err, PredictError::MissingCoordinates));
    }

    #[test]
    fn model_failure_message_passes_through() {
        let a = artifacts(Box::new(Broken));
        let err = predict(&a, &request("Colombo")).unwrap_err();
        assert_eq!(err.to_string(), "tensor shape mismatch");
    }

    #[test]
    fn negative_model_output_clamped() {
        let a = artifacts(Box::new(Fixed(-3.7)));
        assert_eq!(predict(&a, &request("Colombo")).unwrap().predicted_cases, 0);
    }
}
