// polysync-common: shared types for the PolySync workspace

pub mod intent;
pub mod types;
