use anyhow::anyhow;
use directories::ProjectDirs;
use once_cell::sync::OnceCell;
use std::path::Path;

pub fn data_dir() -> anyhow::Result<&'static Path> {
    static DATA_DIR: OnceCell<Box<Path>> = OnceCell::new();
    DATA_DIR
        .get_or_try_init(|| -> anyhow::Result<Box<Path>> {
            let dirs = ProjectDirs::from("none", "comp490", "jobinfo")
                .ok_or(anyhow!("Failed to get project dirs"))?;
            let path = dirs.data_dir();
            std::fs::create_dir_all(path)?;
            Ok(path.into())
        })
        .map(|p| &**p)
}
