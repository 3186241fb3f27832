use std::path::Path;

use indexmap::IndexMap;
use tracing::debug;

use crate::error::{FieldError, ParameterValidationError};
use crate::schema::DType;
use crate::subst::{self, Namespace};
use crate::validate::compiled::{coerce_value, CompiledParam};
use crate::validate::value::ParamValue;

/// Switches for the validation pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationFlags {
    /// Reject parameter names the schema does not declare.
    pub check_unknowns: bool,
    /// Fail when a required parameter has no value and is not unresolved.
    pub check_required: bool,
    /// Require matched paths to exist with the declared kind.
    pub check_exist: bool,
    /// Expand string values of file-ish parameters as glob patterns.
    pub expand_globs: bool,
    /// Create parent directories of resulting paths and honor mkdir flags.
    pub create_dirs: bool,
}

impl Default for ValidationFlags {
    fn default() -> Self {
        Self {
            check_unknowns: true,
            check_required: true,
            check_exist: true,
            expand_globs: true,
            create_dirs: false,
        }
    }
}

/// Validate one parameter set against a compiled schema.
///
/// The result maps names, in schema order, to typed values; `Unresolved`
/// and `Error` markers ride along untouched by the type, existence and
/// choice checks. Values for names the schema does not declare are either
/// rejected (`check_unknowns`) or dropped.
pub fn validate_parameters(
    params: &IndexMap<String, ParamValue>,
    schemas: &IndexMap<String, CompiledParam>,
    defaults: &IndexMap<String, ParamValue>,
    ns: Option<&Namespace>,
    flags: ValidationFlags,
) -> Result<IndexMap<String, ParamValue>, ParameterValidationError> {
    if flags.check_unknowns {
        let names: Vec<String> = params
            .keys()
            .filter(|name| !schemas.contains_key(*name))
            .cloned()
            .collect();
        if !names.is_empty() {
            return Err(ParameterValidationError::UnknownParameters { names });
        }
    }

    // Split off values that are already unresolved.
    let mut inputs: IndexMap<String, ParamValue> = IndexMap::new();
    let mut unresolved: IndexMap<String, ParamValue> = IndexMap::new();
    for (name, value) in params {
        if value.is_unresolved() {
            unresolved.insert(name.clone(), value.clone());
        } else {
            inputs.insert(name.clone(), value.clone());
        }
    }

    // Fill gaps from the defaults map first, then from declared defaults.
    for (name, cp) in schemas {
        if inputs.get(name).map_or(true, ParamValue::is_null) {
            if let Some(value) = defaults.get(name) {
                inputs.insert(name.clone(), value.clone());
            } else if let Some(raw) = &cp.decl.default {
                inputs.insert(name.clone(), ParamValue::from_json(raw));
            }
        }
    }

    // Interpolate; without a namespace this only flags unresolved strings.
    let resolved = subst::resolve(&inputs, ns)?;
    inputs = IndexMap::new();
    for (name, value) in resolved {
        if value.is_unresolved() {
            unresolved.insert(name, value);
        } else {
            inputs.insert(name, value);
        }
    }

    if flags.check_required {
        let names: Vec<String> = schemas
            .iter()
            .filter(|(name, cp)| {
                cp.required()
                    && inputs.get(*name).map_or(true, ParamValue::is_null)
                    && !unresolved.contains_key(*name)
            })
            .map(|(name, _)| name.clone())
            .collect();
        if !names.is_empty() {
            return Err(ParameterValidationError::MissingRequired { names });
        }
    }

    // Match file-ish values to paths.
    for index in 0..inputs.len() {
        let (name, value) = match inputs.get_index(index) {
            Some((name, value)) => (name.clone(), value.clone()),
            None => continue,
        };
        let Some(cp) = schemas.get(&name) else {
            continue;
        };
        if value.is_null() || value.is_error() {
            continue;
        }
        let Some(kind) = cp.dtype.file_element().cloned() else {
            continue;
        };
        let replacement = resolve_paths(&name, &value, cp, &kind, flags)?;
        if let Some((_, slot)) = inputs.get_index_mut(index) {
            *slot = replacement;
        }
    }

    // Typed check against the precompiled dtypes; failures aggregate into
    // one report instead of stopping at the first.
    let mut field_errors: Vec<FieldError> = Vec::new();
    for index in 0..inputs.len() {
        let (name, value) = match inputs.get_index(index) {
            Some((name, value)) => (name.clone(), value.clone()),
            None => continue,
        };
        let Some(cp) = schemas.get(&name) else {
            continue;
        };
        if value.is_null() || value.is_error() {
            continue;
        }
        match coerce_value(&value, &cp.dtype) {
            Ok(coerced) => {
                if let Some((_, slot)) = inputs.get_index_mut(index) {
                    *slot = coerced;
                }
            }
            Err(reason) => field_errors.push(FieldError { name, reason }),
        }
    }
    if !field_errors.is_empty() {
        return Err(ParameterValidationError::TypeCheck {
            errors: field_errors,
        });
    }

    // Assemble in schema order; nulls and undeclared leftovers drop out.
    let mut validated: IndexMap<String, ParamValue> = IndexMap::new();
    for name in schemas.keys() {
        if let Some(value) = inputs.get(name) {
            if !value.is_null() {
                validated.insert(name.clone(), value.clone());
            }
        }
    }

    // Choice check.
    for (name, value) in &validated {
        let Some(cp) = schemas.get(name) else {
            continue;
        };
        if cp.choices.is_empty() || value.is_error() {
            continue;
        }
        if !cp.choices.contains(value) {
            return Err(ParameterValidationError::Parameter {
                name: name.clone(),
                reason: format!("invalid value '{}'", value.render()),
            });
        }
    }

    // mkdir directives.
    if flags.create_dirs {
        for (name, cp) in schemas {
            if !cp.decl.mkdir {
                continue;
            }
            let Some(value) = validated.get(name) else {
                continue;
            };
            match value {
                ParamValue::Str(path) => ensure_parent(name, path)?,
                ParamValue::List(items) => {
                    for item in items {
                        if let ParamValue::Str(path) = item {
                            ensure_parent(name, path)?;
                        }
                    }
                }
                _ => {}
            }
        }
    }

    // Unresolved values go back in, bypassing every check above.
    for (name, value) in unresolved {
        validated.insert(name, value);
    }

    debug!(params = validated.len(), "validated parameter set");
    Ok(validated)
}

/// Turn a file-ish value into its final path(s). Strings may be a
/// substituted literal list, a glob pattern, or a plain path; lists are
/// taken as-is. `kind` is the file-ish element dtype.
fn resolve_paths(
    name: &str,
    value: &ParamValue,
    cp: &CompiledParam,
    kind: &DType,
    flags: ValidationFlags,
) -> Result<ParamValue, ParameterValidationError> {
    let is_list = cp.dtype.is_list();
    let shown = value.render();

    let files: Vec<String> = match value {
        ParamValue::Str(text) => match parse_literal_list(text) {
            Some(items) => items,
            None if flags.expand_globs => expand_glob(text),
            None => vec![text.clone()],
        },
        ParamValue::List(items) => items.iter().map(ParamValue::render).collect(),
        other => {
            return Err(ParameterValidationError::Parameter {
                name: name.to_string(),
                reason: format!("invalid type '{}'", other.type_name()),
            })
        }
    };

    if files.is_empty() {
        if cp.required() && flags.check_exist {
            return Err(ParameterValidationError::Parameter {
                name: name.to_string(),
                reason: format!("no files found for '{shown}'"),
            });
        }
        return Ok(if is_list {
            ParamValue::List(Vec::new())
        } else {
            ParamValue::Str(String::new())
        });
    }

    if is_list {
        if flags.check_exist {
            for path in &files {
                if !kind.kind_matches(Path::new(path)) {
                    let what = if *kind == DType::File {
                        "non-files"
                    } else {
                        "non-directories"
                    };
                    return Err(ParameterValidationError::Parameter {
                        name: name.to_string(),
                        reason: format!("'{shown}' matches {what}"),
                    });
                }
            }
        }
        if flags.create_dirs {
            for path in &files {
                ensure_parent(name, path)?;
            }
        }
        Ok(ParamValue::List(
            files.into_iter().map(ParamValue::Str).collect(),
        ))
    } else {
        if files.len() > 1 {
            return Err(ParameterValidationError::Parameter {
                name: name.to_string(),
                reason: format!("multiple files given ('{shown}')"),
            });
        }
        let path = files.into_iter().next().unwrap_or_default();
        if flags.check_exist && !kind.kind_matches(Path::new(&path)) {
            let what = if *kind == DType::File {
                "a regular file"
            } else {
                "a directory"
            };
            return Err(ParameterValidationError::Parameter {
                name: name.to_string(),
                reason: format!("'{path}' is not {what}"),
            });
        }
        if flags.create_dirs {
            ensure_parent(name, &path)?;
        }
        Ok(ParamValue::Str(path))
    }
}

/// A list that was substituted into a string arrives as its rendered text.
/// Recover it; otherwise report "not a list" so the caller tries globbing.
fn parse_literal_list(text: &str) -> Option<Vec<String>> {
    let trimmed = text.trim();
    if !trimmed.starts_with('[') || !trimmed.ends_with(']') {
        return None;
    }
    if let Ok(serde_json::Value::Array(items)) = serde_json::from_str(trimmed) {
        return Some(
            items
                .iter()
                .map(|item| ParamValue::from_json(item).render())
                .collect(),
        );
    }
    // Tolerate unquoted or single-quoted elements.
    let inner = trimmed[1..trimmed.len() - 1].trim();
    if inner.is_empty() {
        return Some(Vec::new());
    }
    Some(
        inner
            .split(',')
            .map(|piece| {
                piece
                    .trim()
                    .trim_matches(|c| c == '\'' || c == '"')
                    .to_string()
            })
            .collect(),
    )
}

fn expand_glob(pattern: &str) -> Vec<String> {
    let mut matches: Vec<String> = match glob::glob(pattern) {
        Ok(paths) => paths
            .filter_map(Result::ok)
            .map(|path| path.to_string_lossy().into_owned())
            .collect(),
        // An unparseable pattern matches nothing, like a nonexistent path.
        Err(_) => Vec::new(),
    };
    matches.sort();
    matches
}

fn ensure_parent(name: &str, path: &str) -> Result<(), ParameterValidationError> {
    let Some(parent) = Path::new(path).parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|source| ParameterValidationError::CreateDir {
        name: name.to_string(),
        path: parent.display().to_string(),
        source,
    })
}
