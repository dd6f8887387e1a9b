pub mod core;
pub mod observability;
pub mod persistence;
pub mod publisher;

pub use persistence::ArtifactStore;
pub use publisher::{ArtifactPublisher, PublishError};
