//! Subcommand implementations: load a cab, feed it caller input, then
//! inspect, compile or execute it.

use cabrig_core::api as core_api;
use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::commands::cli::{BuildArgs, InspectArgs, RunArgs, ValidateOpts};

#[tracing::instrument(name = "cli.inspect", skip(args))]
pub fn inspect(args: &InspectArgs) -> Result<i32, core_api::CliError> {
    let cab = core_api::Cab::load(&args.cab)?;
    print_summary(&cab);
    Ok(0)
}

#[tracing::instrument(name = "cli.build", skip(args))]
pub fn build(args: &BuildArgs) -> Result<i32, core_api::CliError> {
    let mut cab = core_api::Cab::load(&args.cab)?;
    let ns = validate_input(&mut cab, &args.opts, flags_from(&args.opts))?;
    let (argv, venv) = cab
        .build_invocation(ns.as_ref())
        .map_err(core_api::CabError::from)?;
    if let Some(venv) = &venv {
        tracing::debug!(venv = %venv, "virtual environment selected");
    }
    println!("{}", argv.join(" "));
    Ok(0)
}

#[tracing::instrument(name = "cli.run", skip(args))]
pub async fn run(args: &RunArgs) -> Result<i32, core_api::CliError> {
    let mut cab = core_api::Cab::load(&args.cab)?;
    let mut flags = flags_from(&args.opts);
    // Output parameters name paths the task is about to create.
    flags.create_dirs = true;
    let ns = validate_input(&mut cab, &args.opts, flags)?;
    let outcome = core_api::run_cab(&mut cab, ns.as_ref()).await?;
    tracing::info!(
        cab = %cab.name(),
        exit_code = outcome.exit_code,
        status = ?outcome.status,
        duration_ms = outcome.duration_ms,
        "run finished"
    );
    if outcome.success() {
        Ok(0)
    } else if outcome.exit_code != 0 {
        Ok(outcome.exit_code)
    } else {
        Ok(1)
    }
}

/// Parse `-p`/`-s` input and validate it into the cab's current parameter
/// set. Returns the external namespace so the caller can reuse it for
/// command compilation.
fn validate_input(
    cab: &mut core_api::Cab,
    opts: &ValidateOpts,
    flags: core_api::ValidationFlags,
) -> Result<Option<core_api::Namespace>, core_api::CliError> {
    let params = parse_params(&opts.params)?;
    let ns = build_namespace(&opts.substs)?;
    cab.validate(&params, ns.as_ref(), flags)
        .map_err(core_api::CabError::from)?;
    Ok(ns)
}

fn print_summary(cab: &core_api::Cab) {
    if cab.info().is_empty() {
        println!("cab {}", cab.name());
    } else {
        println!("cab {}: {}", cab.name(), cab.info());
    }
    println!("command: {}", cab.command_template());
    if let Some(image) = cab.image() {
        println!("image: {image}");
    }
    if let Some(venv) = cab.virtual_env() {
        println!("virtual env: {venv}");
    }
    print_parameters("inputs", cab.inputs());
    print_parameters("outputs", cab.outputs());
    let mgmt = cab.management();
    if !mgmt.environment.is_empty() {
        println!("environment: {} overrides", mgmt.environment.len());
    }
    if !mgmt.cleanup.is_empty() {
        println!("cleanup: {} globs", mgmt.cleanup.len());
    }
    if !cab.wranglers().is_empty() {
        println!("wranglers: {} rules", cab.wranglers().len());
    }
}

fn print_parameters(heading: &str, params: &IndexMap<String, core_api::Parameter>) {
    if params.is_empty() {
        return;
    }
    println!("{heading}:");
    for (name, decl) in params {
        let mut line = format!("  {name}  {}", decl.dtype);
        if decl.required {
            line.push_str("  required");
        }
        if let Some(default) = &decl.default {
            line.push_str(&format!("  default={default}"));
        }
        if !decl.info.is_empty() {
            line.push_str(&format!("  {}", decl.info));
        }
        println!("{line}");
    }
}

fn flags_from(opts: &ValidateOpts) -> core_api::ValidationFlags {
    core_api::ValidationFlags {
        check_unknowns: !opts.allow_unknown,
        check_required: !opts.ignore_missing,
        check_exist: !opts.no_exist_check,
        expand_globs: !opts.no_glob,
        create_dirs: opts.create_dirs,
    }
}

fn parse_params(
    entries: &[String],
) -> Result<IndexMap<String, core_api::ParamValue>, core_api::CliError> {
    let mut params = IndexMap::new();
    for raw in entries {
        let (name, value) = parse_entry(raw)?;
        params.insert(name, core_api::ParamValue::from_json(&value));
    }
    Ok(params)
}

fn build_namespace(entries: &[String]) -> Result<Option<core_api::Namespace>, core_api::CliError> {
    if entries.is_empty() {
        return Ok(None);
    }
    let mut ns = core_api::Namespace::strict();
    for raw in entries {
        let (key, value) = parse_entry(raw)?;
        set_dotted(&mut ns, &key, value);
    }
    Ok(Some(ns))
}

/// Split NAME=VALUE, parsing VALUE as JSON with plain-string fallback.
fn parse_entry(raw: &str) -> Result<(String, Value), core_api::CliError> {
    let (name, text) = raw
        .split_once('=')
        .ok_or_else(|| core_api::CliError::Usage(format!("expected NAME=VALUE, got '{raw}'")))?;
    if name.trim().is_empty() {
        return Err(core_api::CliError::Usage(format!(
            "missing name in '{raw}'"
        )));
    }
    let value = serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()));
    Ok((name.to_string(), value))
}

/// Insert a value at a dotted path, building intermediate tables as needed.
fn set_dotted(ns: &mut core_api::Namespace, key: &str, value: Value) {
    match key.split_once('.') {
        None => ns.set(key, value),
        Some((first, rest)) => {
            let mut root = match ns.get(first) {
                Some(Value::Object(map)) => map.clone(),
                _ => Map::new(),
            };
            let segments: Vec<&str> = rest.split('.').collect();
            insert_nested(&mut root, &segments, value);
            ns.set(first, Value::Object(root));
        }
    }
}

fn insert_nested(map: &mut Map<String, Value>, segments: &[&str], value: Value) {
    match segments {
        [] => {}
        [last] => {
            map.insert((*last).to_string(), value);
        }
        [head, rest @ ..] => {
            let entry = map
                .entry((*head).to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            if let Value::Object(child) = entry {
                insert_nested(child, rest, value);
            }
        }
    }
}
