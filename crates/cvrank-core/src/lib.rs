pub mod config;
pub mod error;
pub mod extract;
pub mod normalize;
pub mod pipeline;
pub mod profile;
pub mod ranking;
pub mod report;
pub mod scoring;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use pipeline::{Pipeline, RunDiagnostics, RunReport};
pub use traits::Embedder;
