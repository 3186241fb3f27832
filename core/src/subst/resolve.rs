use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::trace;

use crate::error::SubstitutionError;
use crate::subst::namespace::Namespace;
use crate::subst::template;
use crate::validate::ParamValue;

/// Iteration cap for the fixed-point loop. Exhausting it means the
/// templates reference each other cyclically.
pub const MAX_PASSES: usize = 10;

/// Resolve `{}`-references among string-valued parameters.
///
/// Without a namespace nothing is interpolated: strings still holding
/// references are wrapped as `Unresolved`, everything else passes through.
///
/// With a namespace, interpolation repeats until a full pass changes no
/// value. Lookups see the caller's entries, the raw parameter values, and a
/// `self` mirror of the in-progress values. The top-level parameter entries
/// are a snapshot of the input and never updated; only the mirror tracks
/// changes. A reference whose lookup fails turns the value into an `Error`
/// marker carrying the missing key; `Error` values take no further part in
/// interpolation. If the loop is still producing changes after
/// `MAX_PASSES` passes, the templates cannot settle and resolution fails
/// with a cyclic-substitution error.
pub fn resolve(
    params: &IndexMap<String, ParamValue>,
    ns: Option<&Namespace>,
) -> Result<IndexMap<String, ParamValue>, SubstitutionError> {
    match ns {
        None => Ok(mark_unresolved(params)),
        Some(ns) => fixed_point(params, ns),
    }
}

fn mark_unresolved(params: &IndexMap<String, ParamValue>) -> IndexMap<String, ParamValue> {
    params
        .iter()
        .map(|(name, value)| {
            let marked = match value {
                ParamValue::Str(s) if template::has_refs(s) => ParamValue::Unresolved(s.clone()),
                other => other.clone(),
            };
            (name.clone(), marked)
        })
        .collect()
}

fn fixed_point(
    params: &IndexMap<String, ParamValue>,
    caller_ns: &Namespace,
) -> Result<IndexMap<String, ParamValue>, SubstitutionError> {
    let mut current = params.clone();

    let mut ns = caller_ns.clone();
    let mut mirror = Map::new();
    for (name, value) in &current {
        mirror.insert(name.clone(), value.to_json());
        // The caller's own entries win a top-level name clash.
        if !ns.contains(name) {
            ns.set(name.clone(), value.to_json());
        }
    }
    ns.set("self", Value::Object(mirror.clone()));

    let mut last_changed: Vec<String> = Vec::new();
    for pass in 0..MAX_PASSES {
        let mut changed: Vec<String> = Vec::new();
        for index in 0..current.len() {
            let (name, value) = match current.get_index(index) {
                Some((name, value)) => (name.clone(), value.clone()),
                None => continue,
            };
            let ParamValue::Str(text) = value else {
                continue;
            };
            let new_value = match template::render(&text, &ns) {
                Ok(rendered) if rendered == text => continue,
                Ok(rendered) => ParamValue::Str(rendered),
                Err(SubstitutionError::MissingKey { key }) => {
                    ParamValue::Error(format!("ERR ({key})"))
                }
                Err(other) => ParamValue::Error(format!("ERR ({other})")),
            };
            mirror.insert(name.clone(), Value::String(new_value.render()));
            ns.set("self", Value::Object(mirror.clone()));
            if let Some((_, slot)) = current.get_index_mut(index) {
                *slot = new_value;
            }
            changed.push(name);
        }
        if changed.is_empty() {
            return Ok(current);
        }
        trace!(pass, changed = changed.len(), "substitution pass");
        last_changed = changed;
    }

    last_changed.sort();
    last_changed.dedup();
    Err(SubstitutionError::Cyclic { keys: last_changed })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(entries: &[(&str, ParamValue)]) -> IndexMap<String, ParamValue> {
        entries
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn no_namespace_marks_templated_strings_unresolved() {
        let input = params(&[
            ("plain", "just text".into()),
            ("templated", "{x}-out".into()),
            ("count", 3.into()),
        ]);
        let out = resolve(&input, None).unwrap();
        assert_eq!(out["plain"], ParamValue::Str("just text".into()));
        assert_eq!(out["templated"], ParamValue::Unresolved("{x}-out".into()));
        assert_eq!(out["count"], ParamValue::Int(3));
    }

    #[test]
    fn no_namespace_without_templates_is_identity() {
        let input = params(&[("a", "x".into()), ("b", 2.into()), ("c", true.into())]);
        let out = resolve(&input, None).unwrap();
        assert_eq!(out, input);
    }

    #[test]
    fn parameters_resolve_against_each_other() {
        let input = params(&[("a", "{b}".into()), ("b", "literal".into())]);
        let out = resolve(&input, Some(&Namespace::strict())).unwrap();
        assert_eq!(out["a"], ParamValue::Str("literal".into()));
        assert_eq!(out["b"], ParamValue::Str("literal".into()));
    }

    #[test]
    fn caller_namespace_fields_resolve_too() {
        let mut ns = Namespace::strict();
        ns.set("run", json!({"dir": "/tmp/out"}));
        let input = params(&[("log", "{run.dir}/task.log".into())]);
        let out = resolve(&input, Some(&ns)).unwrap();
        assert_eq!(out["log"], ParamValue::Str("/tmp/out/task.log".into()));
    }

    #[test]
    fn self_mirror_sees_in_progress_values() {
        let mut ns = Namespace::strict();
        ns.set("base", json!("img"));
        let input = params(&[
            ("stem", "{base}-deep".into()),
            ("fits", "{self.stem}.fits".into()),
        ]);
        let out = resolve(&input, Some(&ns)).unwrap();
        assert_eq!(out["stem"], ParamValue::Str("img-deep".into()));
        assert_eq!(out["fits"], ParamValue::Str("img-deep.fits".into()));
    }

    #[test]
    fn cyclic_references_fail_within_the_cap() {
        let input = params(&[("a", "{b}".into()), ("b", "{a}".into())]);
        let err = resolve(&input, Some(&Namespace::strict())).unwrap_err();
        match err {
            SubstitutionError::Cyclic { keys } => {
                assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
            }
            other => panic!("expected cyclic error, got {other:?}"),
        }
    }

    #[test]
    fn missing_reference_becomes_an_error_marker() {
        let input = params(&[("a", "{nowhere}".into()), ("b", "fine".into())]);
        let out = resolve(&input, Some(&Namespace::strict())).unwrap();
        assert_eq!(out["a"], ParamValue::Error("ERR (nowhere)".into()));
        assert_eq!(out["b"], ParamValue::Str("fine".into()));
    }

    #[test]
    fn error_markers_are_left_alone_on_later_passes() {
        // `a` errors on the first pass; `b` still resolves through `self`.
        let input = params(&[
            ("a", "{gone}".into()),
            ("b", "saw [{self.a}]".into()),
        ]);
        let out = resolve(&input, Some(&Namespace::strict())).unwrap();
        assert_eq!(out["a"], ParamValue::Error("ERR (gone)".into()));
        assert_eq!(out["b"], ParamValue::Str("saw [ERR (gone)]".into()));
    }

    #[test]
    fn non_string_values_pass_through_untouched() {
        let input = params(&[
            ("n", 42.into()),
            ("flag", false.into()),
            ("items", ParamValue::List(vec![1.into(), 2.into()])),
        ]);
        let out = resolve(&input, Some(&Namespace::strict())).unwrap();
        assert_eq!(out, input);
    }
}
