//! The cab itself: compiled task definitions, command-line compilation and
//! output wrangling.

mod args;
#[allow(clippy::module_inception)]
mod cab;
mod wranglers;

pub use cab::Cab;
pub use wranglers::{
    compile_wranglers, severity, wrangle_line, RuntimeStatus, WranglerAction, WranglerRule,
};
