// Module declarations for the grid dataset generator

// Configuration
pub mod config {
    pub mod constants;
    pub mod generation_config;
}

// Record types
pub mod models {
    pub mod ids;
    pub mod asset;
    pub mod grid;
    pub mod records;
}

// Reference tables and loaders
pub mod data {
    pub mod reference;
    pub mod reference_loader;
}

// Generation engine
pub mod core {
    pub mod error;
    pub mod asset_graph;
    pub mod customer_assigner;
    pub mod consumption;
    pub mod billing;
    pub mod incidents;
    pub mod sink;
    pub mod pipeline;
}

// Run summaries
pub mod analysis {
    pub mod reporting;
}

// Utility functions
pub mod utils {
    pub mod logging;
    pub mod csv_export;
}

// CLI interface
pub mod cli {
    pub mod cli;
}

// Re-export commonly used items
pub use crate::config::generation_config::GenerationConfig;
pub use crate::core::error::{GenerationError, GenerationResult};
pub use crate::core::pipeline::GridDataGenerator;
pub use crate::core::sink::{MemorySink, RecordBatch, RecordSink};
pub use crate::data::reference::ReferenceData;
pub use crate::utils::csv_export::CsvSink;
