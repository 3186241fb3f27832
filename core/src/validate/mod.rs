//! Parameter validation: typed values, precompiled schema entries and the
//! validation pipeline itself.

mod compiled;
mod value;
#[allow(clippy::module_inception)]
mod validate;

pub use compiled::{coerce_value, CompiledParam};
pub use validate::{validate_parameters, ValidationFlags};
pub use value::ParamValue;
