use std::path::Path;

use tracing::debug;

use super::types::CabDef;
use crate::error::DefinitionError;

/// Read and parse a cab definition file. The result is the raw declared
/// form; compiling it into a runnable `Cab` is the caller's next step.
pub fn load_def(path: &Path) -> Result<CabDef, DefinitionError> {
    debug!(path = %path.display(), "loading cab definition");
    let raw = std::fs::read_to_string(path).map_err(|source| DefinitionError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let def: CabDef = toml::from_str(&raw).map_err(|source| DefinitionError::Parse {
        path: path.display().to_string(),
        source: Box::new(source),
    })?;
    Ok(def)
}
