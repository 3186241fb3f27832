mod namespace;
mod resolve;
mod template;

pub use namespace::{LookupMode, Namespace};
pub use resolve::{resolve, MAX_PASSES};
pub use template::{has_refs, render};
