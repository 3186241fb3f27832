use std::path::Path;

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::schema::OneOrMany;

/// Remove post-run junk. `cleanup` maps a base directory to glob patterns
/// of entries beneath it; files and symlinks are unlinked, directories are
/// removed recursively. Failures are logged and skipped so one stubborn
/// path does not abort the rest of the sweep.
pub fn cleanup_outputs(cleanup: &IndexMap<String, OneOrMany>) {
    for (base, patterns) in cleanup {
        for pattern in patterns.as_slice() {
            let full = Path::new(base).join(pattern);
            let matches = match glob::glob(&full.to_string_lossy()) {
                Ok(paths) => paths,
                Err(err) => {
                    warn!(pattern = %full.display(), %err, "bad cleanup pattern");
                    continue;
                }
            };
            for path in matches.filter_map(Result::ok) {
                debug!(path = %path.display(), "clearing junk");
                let result = if path.is_dir() && !path.is_symlink() {
                    std::fs::remove_dir_all(&path)
                } else {
                    std::fs::remove_file(&path)
                };
                if let Err(err) = result {
                    warn!(path = %path.display(), %err, "cleanup failed");
                }
            }
        }
    }
}
