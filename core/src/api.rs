//! Stable re-exports for consumers (`cli` and external crates).
//!
//! Prefer importing from `cabrig_core::api` instead of reaching into internal modules.

pub use crate::cab::{
    compile_wranglers, severity, wrangle_line, Cab, RuntimeStatus, WranglerAction, WranglerRule,
};
pub use crate::error::{
    CabError, CliError, CommandError, DefinitionError, ErrorCode, FieldError,
    ParameterValidationError, RunnerError, SchemaError, SubstitutionError,
};
pub use crate::policy::{merge_policies, EffectivePolicies, ParamPolicies, RepeatPolicy};
pub use crate::proc::{cleanup_outputs, find_on_path, is_executable_file};
pub use crate::runner::{run_cab, LineStream, LineTap, RunOutcome};
pub use crate::schema::{load_def, CabDef, CabManagement, DType, OneOrMany, Parameter};
pub use crate::subst::{has_refs, render, resolve, LookupMode, Namespace, MAX_PASSES};
pub use crate::validate::{
    coerce_value, validate_parameters, CompiledParam, ParamValue, ValidationFlags,
};
