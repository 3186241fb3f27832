mod dtype;
mod load;
mod types;

pub use dtype::DType;
pub use load::load_def;
pub use types::{CabDef, CabManagement, OneOrMany, Parameter};
