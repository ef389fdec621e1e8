use anyhow::{anyhow, Context, Result};
use std::{fs, path::Path};

pub fn validate_extension(path: &Path) -> Result<()> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("xlsx") => Ok(()),
        _ => Err(anyhow!("{} is not an .xlsx workbook", path.display())),
    }
}

/// Workbooks we read from have to exist already
pub fn validate_workbook(path: &Path) -> Result<()> {
    validate_extension(path)?;
    let attr = fs::metadata(path).with_context(|| format!("Cannot open {}", path.display()))?;
    if attr.is_dir() {
        return Err(anyhow!("{} is a directory", path.display()));
    }

    Ok(())
}

pub fn validate_output(path: &Path, force: bool) -> Result<()> {
    validate_extension(path)?;

    let attr = fs::metadata(path);
    match attr {
        Ok(attr) => {
            if attr.is_dir() {
                return Err(anyhow!("{} is a directory", path.display()));
            }
            if !force {
                return Err(anyhow!("Output file already exists"));
            }
        }
        Err(e) => match e.kind() {
            std::io::ErrorKind::NotFound => {}
            _ => return Err(e.into()),
        },
    }

    Ok(())
}
