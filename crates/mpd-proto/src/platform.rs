use std::path::PathBuf;

const APP_DIR: &str = "mpc-display";

/// `~/<parts..>/mpc-display` on unix; XDG-style paths on macOS as well, so
/// config and logs live in the same place on every unix.
#[cfg(unix)]
fn home_subdir(parts: &[&str]) -> PathBuf {
    let mut dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    dir.extend(parts);
    dir.join(APP_DIR)
}

/// Where the log file goes.
pub fn data_dir() -> PathBuf {
    #[cfg(unix)]
    {
        home_subdir(&[".local", "share"])
    }
    #[cfg(windows)]
    {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }
}

/// Where `config.toml` lives.
pub fn config_dir() -> PathBuf {
    #[cfg(unix)]
    {
        home_subdir(&[".config"])
    }
    #[cfg(windows)]
    {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }
}

/// Default location of the diagnostics log. The terminal itself is the
/// display surface, so logs never go to stdout/stderr.
pub fn log_path() -> PathBuf {
    data_dir().join("display.log")
}
