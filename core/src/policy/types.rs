use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// How a list value is rendered into command-line tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepeatPolicy {
    /// Emit the option flag once, then each element as its own token.
    List,
    /// Emit the option flag again before every element.
    Repeat,
    /// Join all elements into a single token with this separator.
    Join(String),
}

impl RepeatPolicy {
    pub fn as_str(&self) -> &str {
        match self {
            Self::List => "list",
            Self::Repeat => "repeat",
            Self::Join(sep) => sep,
        }
    }
}

// In cab definitions the policy is a plain string: the two keywords select a
// mode, anything else is taken as a join separator.
impl Serialize for RepeatPolicy {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RepeatPolicy {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(match raw.as_str() {
            "list" => Self::List,
            "repeat" => Self::Repeat,
            _ => Self::Join(raw),
        })
    }
}

/// Per-parameter or cab-level rendering rules. Every field is optional; an
/// unset parameter-level field falls back to the cab-level value, then to the
/// built-in default (see `merge_policies`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamPolicies {
    /// Render as a positional argument instead of an option.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub positional: Option<bool>,

    /// Positional, and placed before all options.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub positional_head: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeat: Option<RepeatPolicy>,

    /// Option flag prefix, "--" unless overridden.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,

    /// Emit no tokens for this parameter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<bool>,

    /// Emit no tokens for implicitly-set parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_implicits: Option<bool>,

    /// Split a scalar string value into a list on this separator.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub split: Option<String>,

    /// Template applied to each scalar value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// One template per list element; length must match the value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format_list: Option<Vec<String>>,
}
