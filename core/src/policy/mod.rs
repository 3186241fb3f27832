mod merge;
mod types;

pub use merge::{merge_policies, EffectivePolicies, DEFAULT_PREFIX};
pub use types::{ParamPolicies, RepeatPolicy};
