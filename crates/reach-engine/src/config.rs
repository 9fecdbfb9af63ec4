/// Load and persist the on-disk YAML config, validating before handing it
/// back to a caller. Mirrors the reference engine's `LoadConfig`, translated
/// from TOML to YAML per the monitor's config format.
use std::path::{Path, PathBuf};

use reach_core::config::Config;

pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;
    let config: Config = serde_yaml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("failed to parse config file {}: {e}", path.display()))?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid config: {e}"))?;
    Ok(config)
}

/// Writes `config` to `path` as YAML. The serialized form is round-trip
/// parsed before anything touches disk; the file's previous content (if
/// any) is saved to `<path>.bak` first, and restored if the real write
/// fails.
pub fn save_config(path: &Path, config: &Config) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let contents = serde_yaml::to_string(config)?;
    let _: Config = serde_yaml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("serialized config does not round-trip: {e}"))?;

    let bak_path = PathBuf::from(format!("{}.bak", path.display()));
    let previous = std::fs::read(path).ok();
    if let Some(previous) = &previous {
        std::fs::write(&bak_path, previous)?;
    }

    if let Err(e) = std::fs::write(path, &contents) {
        if let Some(previous) = previous {
            std::fs::write(path, previous)?;
        }
        anyhow::bail!("failed to write config to {}: {e}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reach_core::host::Host;

    #[test]
    fn round_trips_through_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let mut config = Config::default();
        config.hosts.push(Host::new("10.0.0.1", "core switch"));

        save_config(&path, &config).unwrap();
        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded.hosts.len(), 1);
        assert_eq!(loaded.hosts[0].address, "10.0.0.1");
    }

    #[test]
    fn second_save_backs_up_the_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let mut first = Config::default();
        first.hosts.push(Host::new("10.0.0.1", "core switch"));
        save_config(&path, &first).unwrap();

        let mut second = Config::default();
        second.hosts.push(Host::new("10.0.0.2", "edge router"));
        save_config(&path, &second).unwrap();

        let bak_path = dir.path().join("config.yaml.bak");
        let backed_up = load_config(&bak_path).unwrap();
        assert_eq!(backed_up.hosts[0].address, "10.0.0.1");
        let current = load_config(&path).unwrap();
        assert_eq!(current.hosts[0].address, "10.0.0.2");
    }

    #[test]
    fn rejects_config_with_no_hosts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        save_config(&path, &Config::default()).unwrap();
        assert!(load_config(&path).is_err());
    }
}
