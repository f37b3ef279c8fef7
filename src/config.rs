use axum::http::HeaderValue;
use std::{collections::HashMap, net::IpAddr, net::SocketAddr, path::PathBuf};
use thiserror::Error;

use crate::artifacts::ArtifactPaths;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} not set")]
    Missing(&'static str),
    #[error("{var} is not a valid {what}: {value:?}")]
    Invalid {
        var: &'static str,
        what: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub cors_origin: HeaderValue,
    pub log_format: LogFormat,
    pub artifacts: ArtifactPaths,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let get = |key: &str| vars.get(key).map(String::as_str).filter(|v| !v.is_empty());
        let path = |key: &str, default: &str| PathBuf::from(get(key).unwrap_or(default));

        // The trained model is deployment-specific; no default ships.
        let model = get("MODEL_PATH")
            .map(PathBuf::from)
            .ok_or(ConfigError::Missing("MODEL_PATH"))?;

        let host: IpAddr = parse(get("BIND_HOST"), "BIND_HOST", "IP address", || {
            IpAddr::from([0, 0, 0, 0])
        })?;
        let port: u16 = parse(get("PORT"), "PORT", "port", || DEFAULT_PORT)?;

        let origin = get("CORS_ORIGIN").unwrap_or(DEFAULT_CORS_ORIGIN);
        let cors_origin = HeaderValue::from_str(origin).map_err(|_| ConfigError::Invalid {
            var: "CORS_ORIGIN",
            what: "origin",
            value: origin.to_string(),
        })?;

        let log_format = match get("LOG_FORMAT").map(str::to_ascii_lowercase).as_deref() {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "LOG_FORMAT",
                    what: "log format (text|json)",
                    value: other.to_string(),
                })
            }
        };

        Ok(Self {
            addr: SocketAddr::new(host, port),
            cors_origin,
            log_format,
            artifacts: ArtifactPaths {
                model,
                encoder: path("ENCODER_PATH", "data/encoder.json"),
                district_coords: path("DISTRICT_COORDS_PATH", "data/district_coords.json"),
                province_mapping: path(
                    "PROVINCE_MAPPING_PATH",
                    "data/province_district_mapping.json",
                ),
            },
        })
    }
}

fn parse<T: std::str::FromStr>(
    raw: Option<&str>,
    var: &'static str,
    what: &'static str,
    default: impl FnOnce() -> T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default()),
        Some(s) => s.trim().parse().map_err(|_| ConfigError::Invalid {
            var,
            what,
            value: s.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        ServerConfig::from_vars(vars.iter().copied())
    }

    #[test]
    fn defaults() {
        let c = cfg(&[("MODEL_PATH", "/srv/model.json")]).unwrap();
        assert_eq!(c.addr, "0.0.0.0:8000".parse().unwrap());
        assert_eq!(c.cors_origin, "http://localhost:5173");
        assert_eq!(c.log_format, LogFormat::Text);
        assert_eq!(c.artifacts.encoder, PathBuf::from("data/encoder.json"));
        assert_eq!(
            c.artifacts.province_mapping,
            PathBuf::from("data/province_district_mapping.json")
        );
    }

    #[test]
    fn overrides() {
        let c = cfg(&[
            ("BIND_HOST", "127.0.0.1"),
            ("PORT", "9090"),
            ("CORS_ORIGIN", "https://dengue.example.lk"),
            ("LOG_FORMAT", "JSON"),
            ("MODEL_PATH", "/srv/model.json"),
            ("ENCODER_PATH", ""),
        ])
        .unwrap();
        assert_eq!(c.addr, "127.0.0.1:9090".parse().unwrap());
        assert_eq!(c.cors_origin, "https://dengue.example.lk");
        assert_eq!(c.log_format, LogFormat::Json);
        assert_eq!(c.artifacts.model, PathBuf::from("/srv/model.json"));
        // empty values fall back to defaults
        assert_eq!(c.artifacts.encoder, PathBuf::from("data/encoder.json"));
    }

    #[test]
    fn model_path_required() {
        let err = cfg(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("MODEL_PATH")));
        assert_eq!(err.to_string(), "MODEL_PATH not set");
        assert!(cfg(&[("MODEL_PATH", "")]).is_err());
    }

    #[test]
    fn invalid_values_rejected() {
        let with = |k: &'static str, v: &'static str| cfg(&[("MODEL_PATH", "m.json"), (k, v)]);
        let err = with("PORT", "eighty").unwrap_err();
        assert_eq!(err.to_string(), "PORT is not a valid port: \"eighty\"");
        assert!(with("PORT", "70000").is_err());
        assert!(with("BIND_HOST", "localhost:80").is_err());
        assert!(with("LOG_FORMAT", "xml").is_err());
        assert!(with("CORS_ORIGIN", "http://bad\norigin").is_err());
    }
}
