// Library exports for reuse by integration tooling and tests
pub mod cli;
pub mod config_file;
pub mod error;
pub mod image_processing;
pub mod utils;

// Re-export commonly used types
pub use cli::{Args, Strategy};
pub use error::Error;
pub use image_processing::classify::{Classifier, ClassifierSpec, ReferenceColor};
pub use image_processing::{
    Outcome, ProcessingConfig, ProcessingEngine, ProcessingResult, SkippedResult, SourceImage,
};
