use crate::policy::types::{ParamPolicies, RepeatPolicy};

pub const DEFAULT_PREFIX: &str = "--";

/// Fully-resolved rendering rules for one parameter, after cab-level
/// fallback and built-in defaults are applied.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectivePolicies {
    pub positional: bool,
    pub positional_head: bool,
    pub repeat: Option<RepeatPolicy>,
    pub prefix: String,
    pub skip: bool,
    pub skip_implicits: bool,
    pub split: Option<String>,
    pub format: Option<String>,
    pub format_list: Option<Vec<String>>,
}

impl EffectivePolicies {
    pub fn is_positional(&self) -> bool {
        self.positional || self.positional_head
    }
}

fn pick<T: Clone>(param: &Option<T>, cab: &Option<T>) -> Option<T> {
    param.as_ref().or(cab.as_ref()).cloned()
}

/// Resolve one parameter's policies against the cab-level policies. Per
/// field, the first set value wins: parameter, then cab, then default.
/// Two set values are never combined.
pub fn merge_policies(param: &ParamPolicies, cab: &ParamPolicies) -> EffectivePolicies {
    EffectivePolicies {
        positional: pick(&param.positional, &cab.positional).unwrap_or(false),
        positional_head: pick(&param.positional_head, &cab.positional_head).unwrap_or(false),
        repeat: pick(&param.repeat, &cab.repeat),
        prefix: pick(&param.prefix, &cab.prefix).unwrap_or_else(|| DEFAULT_PREFIX.to_string()),
        skip: pick(&param.skip, &cab.skip).unwrap_or(false),
        skip_implicits: pick(&param.skip_implicits, &cab.skip_implicits).unwrap_or(true),
        split: pick(&param.split, &cab.split),
        format: pick(&param.format, &cab.format),
        format_list: pick(&param.format_list, &cab.format_list),
    }
}
