pub mod config;
pub mod error;
pub mod models;
pub mod renderer;
pub mod extractor;
pub mod csv_sink;
pub mod sheets;
pub mod pipeline;
pub mod delay_manager;
pub mod logger;

// Exporting types for convenience
pub use config::Config;
pub use models::JobPosting;
pub use renderer::{ChromeRenderer, PageRenderer};
pub use extractor::Extractor;
pub use sheets::{GoogleSheetSink, SheetSink};
pub use pipeline::{Pipeline, RunOutcome};
