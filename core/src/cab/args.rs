use indexmap::IndexMap;

use crate::error::{CommandError, SchemaError};
use crate::policy::{merge_policies, EffectivePolicies, ParamPolicies, RepeatPolicy};
use crate::schema::DType;
use crate::subst::{render, Namespace};
use crate::validate::{CompiledParam, ParamValue};

/// Convert the current parameter values into an ordered token list:
/// head positionals, then options in schema order, then tail positionals.
pub(crate) fn build_argument_list(
    params: &IndexMap<String, ParamValue>,
    schemas: &IndexMap<String, CompiledParam>,
    cab_policies: &ParamPolicies,
) -> Result<Vec<String>, CommandError> {
    let ns = params_namespace(params);
    let mut remaining = params.clone();
    let mut head: Vec<String> = Vec::new();
    let mut tail: Vec<String> = Vec::new();

    // Positional parameters route to the head or tail list; the option
    // pass below only sees what is left over. Skipped positionals still
    // leave the working set, they just contribute no tokens.
    for (name, cp) in schemas {
        if cp.required() && !remaining.contains_key(name) {
            return Err(CommandError::MissingValue(name.clone()));
        }
        let Some(value) = remaining.get(name).cloned() else {
            continue;
        };
        let policies = merge_policies(&cp.decl.policies, cab_policies);
        if !policies.is_positional() {
            continue;
        }
        if !effective_skip(cp, &policies) {
            let tokens = stringify(name, &value, &policies, None, &ns)?;
            if policies.positional_head {
                head.extend(tokens);
            } else {
                tail.extend(tokens);
            }
        }
        remaining.shift_remove(name);
    }

    let mut options: Vec<String> = Vec::new();
    for (name, value) in &remaining {
        let Some(cp) = schemas.get(name) else {
            return Err(CommandError::UnknownParameter(name.clone()));
        };
        let policies = merge_policies(&cp.decl.policies, cab_policies);
        if effective_skip(cp, &policies) {
            continue;
        }
        let option = format!(
            "{}{}",
            policies.prefix,
            cp.decl.alias.as_deref().unwrap_or(name)
        );
        // A set boolean is just its flag.
        if cp.dtype == DType::Bool && *value == ParamValue::Bool(true) {
            options.push(option);
            continue;
        }
        options.extend(stringify(name, value, &policies, Some(&option), &ns)?);
    }

    head.extend(options);
    head.extend(tail);
    Ok(head)
}

/// Template context for format policies: every current parameter by name,
/// plus per-call positional arguments.
fn params_namespace(params: &IndexMap<String, ParamValue>) -> Namespace {
    let mut ns = Namespace::strict();
    ns.extend(params.iter().map(|(name, value)| (name.clone(), value.to_json())));
    ns
}

fn effective_skip(cp: &CompiledParam, policies: &EffectivePolicies) -> bool {
    policies.skip || (cp.decl.implicit.is_some() && policies.skip_implicits)
}

/// Render one value into zero or more tokens under its effective policies.
/// `option` is the flag text for optional arguments; positionals pass
/// `None` and get bare value tokens.
fn stringify(
    name: &str,
    value: &ParamValue,
    policies: &EffectivePolicies,
    option: Option<&str>,
    ns: &Namespace,
) -> Result<Vec<String>, CommandError> {
    if value.is_null() || *value == ParamValue::Bool(false) {
        return Ok(Vec::new());
    }

    // A split policy turns a scalar string into a list before rendering.
    let elements: Option<Vec<String>> = match value {
        ParamValue::List(items) => Some(items.iter().map(ParamValue::render).collect()),
        ParamValue::Str(text) => policies
            .split
            .as_ref()
            .map(|separator| split_text(text, separator)),
        _ => None,
    };

    let (rendered, is_list) = match elements {
        Some(items) => (format_elements(name, items, policies, ns)?, true),
        None => format_scalar(value.render(), policies, ns)?,
    };

    if !is_list {
        let mut tokens = Vec::with_capacity(2);
        if let Some(flag) = option {
            tokens.push(flag.to_string());
        }
        tokens.extend(rendered);
        return Ok(tokens);
    }

    match &policies.repeat {
        Some(RepeatPolicy::List) => {
            let mut tokens = Vec::with_capacity(rendered.len() + 1);
            if let Some(flag) = option {
                tokens.push(flag.to_string());
            }
            tokens.extend(rendered);
            Ok(tokens)
        }
        Some(RepeatPolicy::Repeat) => {
            let mut tokens = Vec::with_capacity(rendered.len() * 2);
            for item in rendered {
                if let Some(flag) = option {
                    tokens.push(flag.to_string());
                }
                tokens.push(item);
            }
            Ok(tokens)
        }
        Some(RepeatPolicy::Join(separator)) => {
            let mut tokens = Vec::with_capacity(2);
            if let Some(flag) = option {
                tokens.push(flag.to_string());
            }
            tokens.push(rendered.join(separator));
            Ok(tokens)
        }
        None => Err(CommandError::RepeatPolicy(name.to_string())),
    }
}

/// Apply format policies to list elements. With `format_list`, template i
/// renders element i against all elements as positionals; with `format`,
/// the one template renders each element as positional 0.
fn format_elements(
    name: &str,
    items: Vec<String>,
    policies: &EffectivePolicies,
    ns: &Namespace,
) -> Result<Vec<String>, CommandError> {
    if let Some(templates) = &policies.format_list {
        if templates.len() != items.len() {
            return Err(SchemaError::FormatListLength {
                name: name.to_string(),
                templates: templates.len(),
                values: items.len(),
            }
            .into());
        }
        let mut ns = ns.clone();
        ns.set_positional(items);
        let rendered = templates
            .iter()
            .map(|template| render(template, &ns))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(rendered);
    }
    if let Some(template) = &policies.format {
        let rendered = items
            .into_iter()
            .map(|item| {
                let mut ns = ns.clone();
                ns.set_positional(vec![item]);
                render(template, &ns)
            })
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(rendered);
    }
    Ok(items)
}

/// Apply format policies to a scalar. A `format_list` fans the one value
/// out across its templates, making the result a list.
fn format_scalar(
    text: String,
    policies: &EffectivePolicies,
    ns: &Namespace,
) -> Result<(Vec<String>, bool), CommandError> {
    if let Some(templates) = &policies.format_list {
        let mut ns = ns.clone();
        ns.set_positional(vec![text]);
        let rendered = templates
            .iter()
            .map(|template| render(template, &ns))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok((rendered, true));
    }
    if let Some(template) = &policies.format {
        let mut ns = ns.clone();
        ns.set_positional(vec![text]);
        return Ok((vec![render(template, &ns)?], false));
    }
    Ok((vec![text], false))
}

fn split_text(text: &str, separator: &str) -> Vec<String> {
    if separator.is_empty() {
        text.split_whitespace().map(str::to_string).collect()
    } else {
        text.split(separator).map(str::to_string).collect()
    }
}
