use directories::BaseDirs;
use std::io;
use std::path::PathBuf;

pub(crate) fn get_main_dir() -> io::Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, "Could not determine the home directory")
    })?;
    let package_root = base_dirs.data_dir().join("devconsole");
    if !package_root.exists() {
        std::fs::create_dir_all(&package_root)?;
    }
    Ok(package_root)
}

pub(crate) fn get_log_dir() -> io::Result<PathBuf> {
    let log_dir = get_main_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;
    Ok(log_dir)
}
