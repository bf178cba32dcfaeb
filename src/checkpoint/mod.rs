pub mod record;
pub mod store;

pub use record::{Checkpoint, CHECKPOINT_FORMAT_VERSION};
pub use store::{load, save};
