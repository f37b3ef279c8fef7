//! HTTP service serving a pre-trained dengue case regression model, plus the
//! province/district lookup tables the client uses to build requests.

pub mod artifacts;
pub mod config;
pub mod encoder;
pub mod error;
pub mod features;
pub mod logging;
pub mod model;
pub mod predictor;
pub mod routes;
pub mod tables;
pub mod types;

pub use artifacts::{ArtifactPaths, Artifacts};
pub use config::ServerConfig;
pub use routes::router;
