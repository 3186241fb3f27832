use std::path::Path;

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::debug;

use crate::cab::args;
use crate::cab::wranglers::{self, RuntimeStatus, WranglerRule};
use crate::error::{CabError, CommandError, DefinitionError, ParameterValidationError};
use crate::proc;
use crate::schema::{load_def, CabDef, CabManagement, Parameter};
use crate::subst::{render, Namespace};
use crate::validate::{validate_parameters, CompiledParam, ParamValue, ValidationFlags};

/// A compiled cab: one atomic external task, with its parameter schemas
/// precompiled, its wrangler rules compiled, and the current validated
/// parameter values.
///
/// One instance carries the state of one logical task execution. Runs must
/// not share an instance; clone the compiled cab per run instead.
#[derive(Debug, Clone)]
pub struct Cab {
    def: CabDef,
    name: String,
    /// Inputs and outputs merged, in declaration order.
    schemas: IndexMap<String, CompiledParam>,
    defaults: IndexMap<String, ParamValue>,
    wranglers: Vec<WranglerRule>,
    /// Current values. Each validation overwrites the whole map.
    params: IndexMap<String, ParamValue>,
    status: RuntimeStatus,
}

impl Cab {
    /// Compile a definition. The name falls back to the image, then to the
    /// first token of the command.
    pub fn new(def: CabDef) -> Result<Self, CabError> {
        let name = if !def.name.is_empty() {
            def.name.clone()
        } else if let Some(image) = &def.image {
            image.clone()
        } else {
            def.command
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_string()
        };

        for pname in def.inputs.keys() {
            if def.outputs.contains_key(pname) {
                return Err(DefinitionError::DuplicateParameter {
                    cab: name,
                    name: pname.clone(),
                }
                .into());
            }
        }

        let mut schemas = IndexMap::with_capacity(def.inputs.len() + def.outputs.len());
        for (pname, decl) in def.inputs.iter().chain(def.outputs.iter()) {
            schemas.insert(pname.clone(), CompiledParam::compile(pname, decl.clone())?);
        }

        let defaults = def
            .defaults
            .iter()
            .map(|(pname, value)| (pname.clone(), ParamValue::from_json(value)))
            .collect();

        let wranglers = wranglers::compile_wranglers(&name, &def.management.wranglers)?;
        debug!(cab = %name, schemas = schemas.len(), wranglers = wranglers.len(), "compiled cab");

        Ok(Self {
            def,
            name,
            schemas,
            defaults,
            wranglers,
            params: IndexMap::new(),
            status: RuntimeStatus::default(),
        })
    }

    /// Load a definition from a TOML file and compile it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CabError> {
        let def = load_def(path.as_ref())?;
        Self::new(def)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn info(&self) -> &str {
        &self.def.info
    }

    pub fn command_template(&self) -> &str {
        &self.def.command
    }

    pub fn management(&self) -> &CabManagement {
        &self.def.management
    }

    pub fn image(&self) -> Option<&str> {
        self.def.image.as_deref()
    }

    pub fn inputs(&self) -> &IndexMap<String, Parameter> {
        &self.def.inputs
    }

    pub fn outputs(&self) -> &IndexMap<String, Parameter> {
        &self.def.outputs
    }

    pub fn virtual_env(&self) -> Option<&str> {
        self.def.virtual_env.as_deref()
    }

    pub fn wranglers(&self) -> &[WranglerRule] {
        &self.wranglers
    }

    /// Merged input and output schemas, in declaration order.
    pub fn schemas(&self) -> &IndexMap<String, CompiledParam> {
        &self.schemas
    }

    /// Current validated values.
    pub fn params(&self) -> &IndexMap<String, ParamValue> {
        &self.params
    }

    /// Validate raw values against the schema and store the result as the
    /// current parameter set. The previous set is replaced, not merged.
    pub fn validate(
        &mut self,
        params: &IndexMap<String, ParamValue>,
        ns: Option<&Namespace>,
        flags: ValidationFlags,
    ) -> Result<&IndexMap<String, ParamValue>, ParameterValidationError> {
        self.params = validate_parameters(params, &self.schemas, &self.defaults, ns, flags)?;
        Ok(&self.params)
    }

    /// Set one current value directly, bypassing validation. The compile
    /// stage still rejects names the schema does not know.
    pub fn update_parameter(&mut self, name: impl Into<String>, value: ParamValue) {
        self.params.insert(name.into(), value);
    }

    /// Bulk version of [`Cab::update_parameter`].
    pub fn update_params(&mut self, entries: impl IntoIterator<Item = (String, ParamValue)>) {
        for (name, value) in entries {
            self.params.insert(name, value);
        }
    }

    /// Required parameters with no current value.
    pub fn missing_params(&self) -> Vec<String> {
        self.schemas
            .iter()
            .filter(|(name, cp)| cp.required() && !self.params.contains_key(*name))
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Parameters whose current value is an error marker.
    pub fn invalid_params(&self) -> Vec<String> {
        self.params
            .iter()
            .filter(|(_, value)| value.is_error())
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Human-readable listing of the current values, one line per
    /// parameter, with `???` for required parameters that have none.
    pub fn summary(&self) -> Vec<String> {
        let mut lines = vec![format!("cab {}:", self.name)];
        for (name, value) in &self.params {
            lines.push(format!("  {name} = {value}"));
        }
        for name in self.missing_params() {
            lines.push(format!("  {name} = ???"));
        }
        lines
    }

    /// Flat view of the current values as strings, for `{self.*}`
    /// references in the command and virtual_env templates. Required
    /// parameters without a value render as the literal text `MISSING`.
    pub fn substitution_namespace(&self) -> Map<String, Value> {
        let mut map = Map::new();
        for (name, value) in &self.params {
            map.insert(name.clone(), Value::String(value.render()));
        }
        for name in self.missing_params() {
            map.insert(name, Value::String("MISSING".to_string()));
        }
        map
    }

    /// Compile the full invocation: resolve the command to an executable
    /// path and render the current values into an argument vector. Returns
    /// the argv (executable first) and the resolved virtual environment
    /// path, if one is configured.
    pub fn build_invocation(
        &self,
        ns: Option<&Namespace>,
    ) -> Result<(Vec<String>, Option<String>), CommandError> {
        let mut ns = match ns {
            Some(ns) => ns.clone(),
            None => Namespace::strict(),
        };
        ns.set("self", Value::Object(self.substitution_namespace()));

        let venv = match &self.def.virtual_env {
            Some(template) => {
                let path = render(shellexpand::tilde(template).as_ref(), &ns)?;
                if !Path::new(&path).join("bin/activate").is_file() {
                    return Err(CommandError::VirtualEnvMissing(path));
                }
                debug!(venv = %path, "virtual environment");
                Some(path)
            }
            None => None,
        };

        let command = render(shellexpand::tilde(&self.def.command).as_ref(), &ns)?;
        let executable = if command.contains('/') {
            if !proc::is_executable_file(Path::new(&command)) {
                return Err(CommandError::NotExecutable(command));
            }
            command
        } else {
            let extra: Vec<_> = venv
                .iter()
                .map(|venv| Path::new(venv).join("bin"))
                .collect();
            match proc::find_on_path(&command, &extra) {
                Some(path) => path.to_string_lossy().into_owned(),
                None => return Err(CommandError::NotFound(command)),
            }
        };
        debug!(command = %executable, "resolved command");

        let mut argv = vec![executable];
        argv.extend(args::build_argument_list(
            &self.params,
            &self.schemas,
            &self.def.policies,
        )?);
        Ok((argv, venv))
    }

    /// Terminal verdict of the current run, as declared by wrangler rules.
    pub fn runtime_status(&self) -> RuntimeStatus {
        self.status
    }

    /// Clear the verdict before starting another run.
    pub fn reset_runtime_status(&mut self) {
        self.status = RuntimeStatus::Unknown;
    }

    /// Classify one line of task output against the wrangler rules. May
    /// set the run verdict as a side effect; the first verdict sticks.
    pub fn apply_wranglers(&mut self, line: &str, severity: u8) -> (Option<String>, u8) {
        wranglers::wrangle_line(&self.wranglers, &mut self.status, line, severity)
    }
}
