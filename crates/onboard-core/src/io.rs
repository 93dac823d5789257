use crate::error::{OnboardError, Result};
use std::io::Write;
use std::path::Path;

/// Mode for provisioned files. Provisioned files are not treated as secret.
pub const FILE_MODE: u32 = 0o644;

/// Create or truncate `path` and write `data` to it.
pub fn write_file(path: &Path, data: &[u8]) -> Result<()> {
    let mut options = std::fs::OpenOptions::new();
    options.create(true).truncate(true).write(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(FILE_MODE);
    }
    let wrap = |source| OnboardError::WriteFile {
        path: path.display().to_string(),
        source,
    };
    let mut file = options.open(path).map_err(wrap)?;
    file.write_all(data).map_err(wrap)?;
    Ok(())
}
