//! Domain values shared by the store, the fetcher and the presentation layer.

pub mod profile;
pub mod task;

pub use profile::{Profile, ProfileView, UserPayload};
pub use task::{Snapshot, TaskRecord};
