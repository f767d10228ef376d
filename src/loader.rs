use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::{info, warn};
use walkdir::WalkDir;

use crate::error::TplError;
use crate::registry::{Templates, templates};

/// Register `(name, source)` pairs in the process-wide registry.
pub fn load_assets<I, N, S>(assets: I) -> Result<usize, TplError>
where
    I: IntoIterator<Item = (N, S)>,
    N: AsRef<str>,
    S: AsRef<str>,
{
    load_assets_into(templates(), assets)
}

/// Register `(name, source)` pairs in `registry`, stopping at the first
/// template that fails to parse.
pub fn load_assets_into<I, N, S>(registry: &Templates, assets: I) -> Result<usize, TplError>
where
    I: IntoIterator<Item = (N, S)>,
    N: AsRef<str>,
    S: AsRef<str>,
{
    let mut count = 0;
    for (name, source) in assets {
        registry.insert(name.as_ref(), source.as_ref())?;
        count += 1;
    }
    info!("loaded {} embedded templates", count);
    Ok(count)
}

/// Recursively register every `*.{extension}` file below `dir`.
///
/// A file is named by its path relative to `dir`, without the extension and
/// with `/` separators, so `dir/posts/index.html` becomes `posts/index`.
pub fn load_from_path(
    registry: &Templates,
    dir: &Path,
    extension: &str,
) -> Result<usize, TplError> {
    if !dir.is_dir() {
        return Err(TplError::Io {
            path: dir.display().to_string(),
            source: std::io::Error::new(ErrorKind::NotFound, "template directory not found"),
        });
    }

    let mut count = 0;
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("skipping unreadable entry under {}: {}", dir.display(), e);
                continue;
            }
        };
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().is_none_or(|ext| ext != extension) {
            continue;
        }
        let Some(name) = template_name(dir, path) else {
            warn!("skipping {}: path is not valid UTF-8", path.display());
            continue;
        };

        let source = match fs::read_to_string(path) {
            Ok(source) => source,
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                warn!("skipping {}: content is not valid UTF-8", path.display());
                continue;
            }
            Err(source) => {
                return Err(TplError::Io {
                    path: path.display().to_string(),
                    source,
                });
            }
        };
        registry.insert(&name, &source)?;
        count += 1;
    }
    info!("loaded {} templates from {}", count, dir.display());
    Ok(count)
}

fn template_name(dir: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(dir).ok()?.with_extension("");
    let parts = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()?;
    Some(parts.join("/"))
}
