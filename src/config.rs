use anyhow::{Context, Result};
use std::{fs, path::Path};
use tracing::warn;
use voxelgen_world::GenerationConfig;

pub const DEFAULT_CONFIG_PATH: &str = "config/worldgen.toml";

/// Load generation settings from the default path.
pub fn load() -> GenerationConfig {
    load_from_path(Path::new(DEFAULT_CONFIG_PATH))
}

/// Load settings from an explicit path, falling back to defaults on errors.
pub fn load_from_path(path: &Path) -> GenerationConfig {
    match fs::read_to_string(path) {
        Ok(contents) => match toml::from_str::<GenerationConfig>(&contents) {
            Ok(cfg) => cfg,
            Err(err) => {
                warn!("Failed to parse {}: {err}. Using defaults", path.display());
                GenerationConfig::default()
            }
        },
        Err(err) => {
            if path != Path::new(DEFAULT_CONFIG_PATH) || err.kind() != std::io::ErrorKind::NotFound
            {
                warn!("Failed to read {}: {err}. Using defaults", path.display());
            } else {
                warn!(
                    "Generation config not found at {}. Using defaults",
                    path.display()
                );
            }
            GenerationConfig::default()
        }
    }
}

/// Write settings as TOML, creating parent directories.
pub fn save_to_path(config: &GenerationConfig, path: &Path) -> Result<()> {
    let toml = toml::to_string_pretty(config)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    fs::write(path, toml).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!(
            "voxelgen-{name}-{}.toml",
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ))
    }

    #[test]
    fn missing_file_uses_defaults() {
        let cfg = load_from_path(&temp_path("missing"));
        assert_eq!(cfg, GenerationConfig::default());
    }

    #[test]
    fn unknown_keys_fall_back_to_defaults() {
        let path = temp_path("unknown");
        fs::write(&path, "seed = 5\nfog_density = 0.3\n").unwrap();
        assert_eq!(load_from_path(&path), GenerationConfig::default());
        fs::remove_file(&path).ok();
    }

    #[test]
    fn saved_config_loads_back() {
        let path = temp_path("saved");
        let cfg = GenerationConfig {
            seed: Some(12345),
            chunk_size: 8,
            render_distance: 3,
            worker_count: 0,
        };
        save_to_path(&cfg, &path).unwrap();
        assert_eq!(load_from_path(&path), cfg);
        fs::remove_file(&path).ok();
    }
}
