pub mod artifact_store;
pub mod csv_loader;

pub use artifact_store::{ArtifactStore, sanitize_file_name, write_atomic};
pub use csv_loader::load_records;
