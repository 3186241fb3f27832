use serde_json::{Map, Value};

use crate::error::SubstitutionError;

/// What a lookup does when a reference is not in the namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupMode {
    /// Unknown references are errors.
    Strict,
    /// Unknown references render as their own path in parentheses, so a
    /// template can be previewed before all values are known.
    Preview,
}

/// Substitution context for `{}`-templates: a tree of named values, plus
/// optional positional arguments for `{0}`-style references.
#[derive(Debug, Clone)]
pub struct Namespace {
    mode: LookupMode,
    root: Map<String, Value>,
    positional: Vec<String>,
}

impl Namespace {
    pub fn new(mode: LookupMode) -> Self {
        Self {
            mode,
            root: Map::new(),
            positional: Vec::new(),
        }
    }

    pub fn strict() -> Self {
        Self::new(LookupMode::Strict)
    }

    pub fn preview() -> Self {
        Self::new(LookupMode::Preview)
    }

    pub fn mode(&self) -> LookupMode {
        self.mode
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.root.insert(key.into(), value);
    }

    pub fn extend(&mut self, entries: impl IntoIterator<Item = (String, Value)>) {
        for (key, value) in entries {
            self.root.insert(key, value);
        }
    }

    pub fn set_positional(&mut self, args: Vec<String>) {
        self.positional = args;
    }

    pub fn contains(&self, key: &str) -> bool {
        self.root.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }

    /// Resolve one `{reference}` to its text. A reference is either an
    /// index into the positional arguments or a dotted path into the tree.
    pub fn lookup(&self, reference: &str) -> Result<String, SubstitutionError> {
        if let Ok(index) = reference.parse::<usize>() {
            return match self.positional.get(index) {
                Some(arg) => Ok(arg.clone()),
                None => self.miss(reference),
            };
        }
        let mut current: Option<&Value> = None;
        for segment in reference.split('.') {
            let next = match current {
                None => self.root.get(segment),
                Some(Value::Object(map)) => map.get(segment),
                Some(_) => None,
            };
            match next {
                Some(value) => current = Some(value),
                None => return self.miss(reference),
            }
        }
        match current {
            Some(value) => Ok(render_value(value)),
            None => self.miss(reference),
        }
    }

    fn miss(&self, reference: &str) -> Result<String, SubstitutionError> {
        match self.mode {
            LookupMode::Strict => Err(SubstitutionError::MissingKey {
                key: reference.to_string(),
            }),
            LookupMode::Preview => Ok(format!("({reference})")),
        }
    }
}

/// Plain-text form of a namespace value. Strings are unquoted; everything
/// else renders as compact JSON.
pub(crate) fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
