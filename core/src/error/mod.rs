#[allow(clippy::module_inception)]
pub mod error;

pub use error::{
    CabError, CliError, CommandError, DefinitionError, ErrorCode, FieldError,
    ParameterValidationError, RunnerError, SchemaError, SubstitutionError,
};
