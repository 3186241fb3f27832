use thiserror::Error;

/// Stable numeric codes, used by the CLI to derive process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ErrorCode {
    Success = 0,
    GeneralError = 1,
    Definition = 10,
    Schema = 12,
    Substitution = 14,
    Validation = 16,
    Command = 20,
    Runner = 30,
    Io = 40,
}

impl ErrorCode {
    pub fn as_u16(self) -> u16 {
        self as u16
    }
}

/// Cab definition is internally inconsistent. Fatal at load time, never retried.
#[derive(Error, Debug)]
pub enum DefinitionError {
    #[error("cab '{cab}': parameter '{name}' appears in both inputs and outputs")]
    DuplicateParameter { cab: String, name: String },

    #[error("cab '{cab}': wrangler pattern '{pattern}' is not a valid regex: {source}")]
    BadWranglerRegex {
        cab: String,
        pattern: String,
        source: regex::Error,
    },

    #[error("cab '{cab}': wrangler pattern '{pattern}' has unknown action '{action}'")]
    UnknownWranglerAction {
        cab: String,
        pattern: String,
        action: String,
    },

    #[error("cannot read cab definition {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("cannot parse cab definition {path}: {source}")]
    Parse {
        path: String,
        source: Box<toml::de::Error>,
    },
}

/// A declared schema element is malformed.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("parameter '{name}': unknown dtype '{dtype}'")]
    BadDType { name: String, dtype: String },

    #[error("parameter '{name}': format_list has {templates} templates but value has {values} elements")]
    FormatListLength {
        name: String,
        templates: usize,
        values: usize,
    },
}

/// String interpolation against the substitution namespace failed.
#[derive(Error, Debug)]
pub enum SubstitutionError {
    #[error("unknown substitution reference '{key}'")]
    MissingKey { key: String },

    #[error("malformed substitution template: {0}")]
    BadTemplate(String),

    #[error("cyclic substitution involving: {}", keys.join(", "))]
    Cyclic { keys: Vec<String> },
}

/// One field failure inside an aggregated validation report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub name: String,
    pub reason: String,
}

fn join_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.name, e.reason))
        .collect::<Vec<_>>()
        .join("; ")
}

/// A validation attempt over one parameter set failed. The caller may retry
/// with corrected input; the validator itself never retries.
#[derive(Error, Debug)]
pub enum ParameterValidationError {
    #[error("unknown parameters: {}", names.join(", "))]
    UnknownParameters { names: Vec<String> },

    #[error("missing required parameters: {}", names.join(", "))]
    MissingRequired { names: Vec<String> },

    #[error("parameter '{name}': {reason}")]
    Parameter { name: String, reason: String },

    #[error("invalid parameters: {}", join_fields(.errors))]
    TypeCheck { errors: Vec<FieldError> },

    #[error("parameter '{name}': cannot create directory {path}: {source}")]
    CreateDir {
        name: String,
        path: String,
        source: std::io::Error,
    },

    #[error(transparent)]
    Substitution(#[from] SubstitutionError),
}

/// Command-line compilation failed before any process was spawned.
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("command '{0}' not found on search path")]
    NotFound(String),

    #[error("'{0}' is not an executable file")]
    NotExecutable(String),

    #[error("virtual environment {0} does not exist")]
    VirtualEnvMissing(String),

    #[error("parameter '{0}' is not in the schema")]
    UnknownParameter(String),

    #[error("required parameter '{0}' has no value")]
    MissingValue(String),

    #[error("list-valued parameter '{0}' has no repeat policy")]
    RepeatPolicy(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Substitution(#[from] SubstitutionError),
}

/// Process execution around a compiled invocation failed.
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("spawn failed: {0}")]
    Spawn(String),

    #[error("stream io error: {stream} {source}")]
    StreamIo {
        stream: &'static str,
        source: std::io::Error,
    },

    #[error("wait failed: {0}")]
    Wait(std::io::Error),
}

/// Top-level error for the crate. Every layer converts into this via `?`.
#[derive(Error, Debug)]
pub enum CabError {
    #[error("definition error: {0}")]
    Definition(#[from] DefinitionError),

    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("validation failed: {0}")]
    Validation(#[from] ParameterValidationError),

    #[error("command error: {0}")]
    Command(#[from] CommandError),

    #[error("runner failed: {0}")]
    Runner(#[from] RunnerError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CabError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Definition(_) => ErrorCode::Definition,
            Self::Schema(_) => ErrorCode::Schema,
            Self::Validation(ParameterValidationError::Substitution(_)) => {
                ErrorCode::Substitution
            }
            Self::Validation(_) => ErrorCode::Validation,
            Self::Command(_) => ErrorCode::Command,
            Self::Runner(_) => ErrorCode::Runner,
            Self::Io(_) => ErrorCode::Io,
        }
    }
}

/// Errors surfaced by the command-line front end itself.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),

    #[error("logging setup failed: {0}")]
    Logging(String),

    #[error(transparent)]
    Cab(#[from] CabError),
}
