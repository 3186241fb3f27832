use std::sync::OnceLock;

use regex::Regex;

use crate::error::SubstitutionError;
use crate::subst::namespace::Namespace;

/// True if the string contains a `{` followed by anything other than
/// another `{`. Strings like this still need an interpolation pass. A
/// bare `{` at the end of the string does not count.
pub fn has_refs(text: &str) -> bool {
    static PROBE: OnceLock<Regex> = OnceLock::new();
    let probe = PROBE.get_or_init(|| Regex::new(r"\{[^{]").unwrap_or_else(|_| unreachable!()));
    probe.is_match(text)
}

/// Interpolate a `{}`-template against a namespace.
///
/// Supported syntax: `{name}`, `{dotted.path}`, `{0}` (positional), `{}`
/// (next positional), and `{{`/`}}` as literal braces. Unterminated or
/// stray braces are template errors; unknown references behave per the
/// namespace's lookup mode.
pub fn render(template: &str, ns: &Namespace) -> Result<String, SubstitutionError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    let mut auto_index = 0usize;

    while let Some(c) = chars.next() {
        match c {
            '{' => {
                if chars.peek() == Some(&'{') {
                    chars.next();
                    out.push('{');
                    continue;
                }
                let mut reference = String::new();
                let mut closed = false;
                for inner in chars.by_ref() {
                    if inner == '}' {
                        closed = true;
                        break;
                    }
                    reference.push(inner);
                }
                if !closed {
                    return Err(SubstitutionError::BadTemplate(format!(
                        "unterminated reference in '{template}'"
                    )));
                }
                if reference.is_empty() {
                    reference = auto_index.to_string();
                    auto_index += 1;
                }
                out.push_str(&ns.lookup(&reference)?);
            }
            '}' => {
                if chars.peek() == Some(&'}') {
                    chars.next();
                    out.push('}');
                } else {
                    return Err(SubstitutionError::BadTemplate(format!(
                        "stray '}}' in '{template}'"
                    )));
                }
            }
            _ => out.push(c),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ns() -> Namespace {
        let mut ns = Namespace::strict();
        ns.set("name", json!("deep2"));
        ns.set("self", json!({"ms": "obs.ms"}));
        ns.set_positional(vec!["a".into(), "b".into()]);
        ns
    }

    #[test]
    fn renders_named_and_dotted_references() {
        assert_eq!(render("img-{name}.fits", &ns()).unwrap(), "img-deep2.fits");
        assert_eq!(render("{self.ms}/SUBTABLE", &ns()).unwrap(), "obs.ms/SUBTABLE");
    }

    #[test]
    fn renders_positional_and_auto_references() {
        assert_eq!(render("{0}:{1}", &ns()).unwrap(), "a:b");
        assert_eq!(render("{}-{}", &ns()).unwrap(), "a-b");
    }

    #[test]
    fn doubled_braces_are_literals() {
        assert_eq!(render("{{name}}", &ns()).unwrap(), "{name}");
        assert_eq!(render("a{{b}}c", &ns()).unwrap(), "a{b}c");
    }

    #[test]
    fn unbalanced_braces_are_template_errors() {
        assert!(matches!(
            render("oops {name", &ns()),
            Err(SubstitutionError::BadTemplate(_))
        ));
        assert!(matches!(
            render("oops } here", &ns()),
            Err(SubstitutionError::BadTemplate(_))
        ));
    }

    #[test]
    fn missing_reference_is_reported_with_its_path() {
        let err = render("{nope}", &ns()).unwrap_err();
        match err {
            SubstitutionError::MissingKey { key } => assert_eq!(key, "nope"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn ref_probe_matches_loosely() {
        assert!(has_refs("{x}"));
        assert!(has_refs("a {b.c} d"));
        // The second brace of an escape pair still trips the probe.
        assert!(has_refs("{{escaped}}"));
        assert!(!has_refs("no refs"));
        assert!(!has_refs("trailing {"));
        assert!(!has_refs("{{"));
    }
}
