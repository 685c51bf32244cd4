pub mod add;
pub mod completions;
pub mod list;
pub mod profile;
pub mod toggle;
pub mod watch;
