//! Init command: writes a starter configuration.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use portfolio_dashboard_core::models::settings::Settings;
use tracing::info;

use crate::cli::InitArgs;
use crate::output::print_success;

/// Execute the init command.
pub fn execute(args: InitArgs) -> Result<()> {
    write_default_config(&args.path, args.force)?;
    print_success(&format!("Wrote {}", args.path.display()));
    Ok(())
}

/// Serialize the built-in holdings to `path`. An existing file is only
/// replaced when `force` is set.
pub fn write_default_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }

    let contents = Settings::default().to_toml_string()?;
    fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))?;
    info!("Wrote default configuration to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn written_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("portfolio.toml");

        write_default_config(&path, false).unwrap();
        let loaded = Settings::from_file(&path).unwrap();
        assert_eq!(loaded, Settings::default());
    }

    #[test]
    fn refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("portfolio.toml");
        fs::write(&path, "# mine").unwrap();

        let err = write_default_config(&path, false).unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "# mine");

        write_default_config(&path, true).unwrap();
        assert!(Settings::from_file(&path).is_ok());
    }
}
