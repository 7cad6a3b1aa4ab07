pub mod heuristics;
pub mod relevance;
pub mod stats;
pub mod store;
pub mod types;
