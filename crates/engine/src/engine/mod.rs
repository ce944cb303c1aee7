// Selection-scoped transformation core: trigger capture, request
// classification, splicing, and the per-document editing session.

pub mod applicator;
pub mod classifier;
pub mod selection;
pub mod session;

pub use session::{ChatOutcome, EditingSession, SessionOptions, TransformOutcome};
