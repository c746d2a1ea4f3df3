//! Processor implementations.

pub mod centroid;
pub mod random_walk;
pub mod tenengrad;

pub use centroid::CentroidTracker;
pub use random_walk::RandomWalk;
pub use tenengrad::TenengradProcessor;
