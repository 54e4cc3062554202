use anyhow::{Context, Result};
use log::info;
use std::path::PathBuf;

use crate::runtime::Runtime;

/// Resolve the install root for a tool invocation.
///
/// Order: explicit override, then the SPKG_ROOT environment variable,
/// then [`default_install_root`].
#[tracing::instrument(skip(runtime, install_root))]
pub fn resolve_install_root<R: Runtime>(
    runtime: &R,
    install_root: Option<PathBuf>,
) -> Result<PathBuf> {
    let root = match install_root {
        Some(path) => path,
        None => match runtime.env_var("SPKG_ROOT") {
            Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
            _ => default_install_root(runtime)?,
        },
    };

    info!("Using install root: {}", root.display());

    Ok(root)
}

/// Get the default installation root directory
#[tracing::instrument(skip(runtime))]
pub fn default_install_root<R: Runtime>(runtime: &R) -> Result<PathBuf> {
    if runtime.is_privileged() {
        Ok(system_install_root(runtime))
    } else {
        let home_dir = runtime
            .home_dir()
            .context("Could not find home directory")?;
        Ok(home_dir.join(".spkg"))
    }
}

#[cfg(target_os = "macos")]
#[tracing::instrument(skip(_runtime))]
fn system_install_root<R: Runtime>(_runtime: &R) -> PathBuf {
    PathBuf::from("/opt/spkg")
}

#[cfg(target_os = "windows")]
#[tracing::instrument(skip(_runtime))]
fn system_install_root<R: Runtime>(_runtime: &R) -> PathBuf {
    PathBuf::from(r"C:\ProgramData\spkg")
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
#[tracing::instrument(skip(_runtime))]
fn system_install_root<R: Runtime>(_runtime: &R) -> PathBuf {
    PathBuf::from("/usr/local/spkg")
}
