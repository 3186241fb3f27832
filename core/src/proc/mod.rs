//! Process-adjacent helpers: executable lookup and post-run cleanup.

mod cleanup;
mod paths;

pub use cleanup::cleanup_outputs;
pub use paths::{find_on_path, is_executable_file};
