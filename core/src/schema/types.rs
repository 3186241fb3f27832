use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::policy::ParamPolicies;

/// One declared input or output of a cab.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Parameter {
    /// Human-readable description.
    #[serde(default)]
    pub info: String,

    /// Value may be modified by the task (outputs that are also read).
    #[serde(default)]
    pub writeable: bool,

    /// Declared type, e.g. "str", "File", "List[MS]". Parsed when the cab
    /// is compiled.
    #[serde(default = "default_dtype")]
    pub dtype: String,

    /// Value supplied by the definition itself rather than the caller.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implicit: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub required: bool,

    /// Allowed values; empty or absent means unrestricted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<Value>>,

    /// Name to use for the command-line option instead of the map key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    /// Declared default, used when neither the caller nor the cab-level
    /// defaults supply a value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Ensure the parent directory of the final value exists.
    #[serde(default)]
    pub mkdir: bool,

    #[serde(default)]
    pub policies: ParamPolicies,
}

fn default_dtype() -> String {
    "str".to_string()
}

impl Default for Parameter {
    fn default() -> Self {
        Self {
            info: String::new(),
            writeable: false,
            dtype: default_dtype(),
            implicit: None,
            tags: Vec::new(),
            required: false,
            choices: None,
            alias: None,
            default: None,
            mkdir: false,
            policies: ParamPolicies::default(),
        }
    }
}

/// A value that may be written as one string or a list of strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(s) => vec![s],
            Self::Many(v) => v,
        }
    }

    pub fn as_slice(&self) -> &[String] {
        match self {
            Self::One(s) => std::slice::from_ref(s),
            Self::Many(v) => v,
        }
    }
}

/// Runtime management directives: child environment, post-run cleanup
/// globs, and output wrangler rules (pattern, in declaration order, mapped
/// to one or more actions).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct CabManagement {
    pub environment: IndexMap<String, String>,
    pub cleanup: IndexMap<String, OneOrMany>,
    pub wranglers: IndexMap<String, OneOrMany>,
}

/// A cab definition as written in its TOML file, before compilation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CabDef {
    /// Defaults to the basename of the command when left empty.
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub info: String,

    /// Command template. May contain `{}`-substitutions and `~`.
    pub command: String,

    /// Optional container image reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Optional virtual environment path; its bin/ directory is searched
    /// first when resolving the command.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_env: Option<String>,

    #[serde(default)]
    pub inputs: IndexMap<String, Parameter>,

    #[serde(default)]
    pub outputs: IndexMap<String, Parameter>,

    /// Caller-independent default values, keyed by parameter name.
    #[serde(default)]
    pub defaults: IndexMap<String, Value>,

    #[serde(default)]
    pub management: CabManagement,

    /// Cab-level policies, the fallback for every parameter.
    #[serde(default)]
    pub policies: ParamPolicies,
}
