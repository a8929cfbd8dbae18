//! Vision Check Core - decide whether an image satisfies a challenge.
//!
//! Given an image URL and a natural-language challenge description, vision-check
//! asks a vision-capable language model for a verdict and returns a confidence
//! in [0, 1] with a textual justification.
//!
//! # Architecture
//!
//! ```text
//! Request → Validate → (Fetch → Provider → Extract)* in priority order → Heuristic fallback → JSON
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use vision_check_core::{AnalysisRequest, Analyzer, Config, ProviderPreference};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> vision_check_core::Result<()> {
//!     let config = Config::load()?;
//!     let analyzer = Analyzer::from_config(&config);
//!
//!     let request = AnalysisRequest::new(
//!         "https://example.com/caps.jpg",
//!         "collect 10 PET bottle caps",
//!         ProviderPreference::Auto,
//!     );
//!     let result = analyzer.analyze(&request).await;
//!     println!("confidence: {:?}", result.confidence);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod analyzer;
pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod llm;
pub mod output;
pub mod simulate;
#[cfg(test)]
mod testing;
pub mod types;

// Re-exports for convenient access
pub use analyzer::Analyzer;
pub use config::Config;
pub use error::{AnalysisError, ConfigError, FetchError, Result, VisionError};
pub use fetch::{FetchedImage, ImageFetcher};
pub use llm::Credentials;
pub use output::write_result;
pub use simulate::HeuristicSimulator;
pub use types::{
    AnalysisRequest, AnalysisResult, ProviderKind, ProviderPreference, StructuredResult,
    SIMULATION_LABEL,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
