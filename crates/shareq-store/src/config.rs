use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use shareq_core::PurgePolicy;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoreConfig {
    pub db: DbConfig,
    #[serde(default)]
    pub purge: PurgePolicy,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DbConfig {
    pub file: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db: DbConfig {
                file: "shareq.db".to_string(),
            },
            purge: PurgePolicy::default(),
        }
    }
}

impl StoreConfig {
    pub fn load_from(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let cfg: StoreConfig = toml::from_str(&s).with_context(|| "parse shareq.toml")?;
        Ok(cfg)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let s = toml::to_string_pretty(self).with_context(|| "serialize toml")?;
        std::fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }

    pub fn db_path(&self, root: &Path) -> PathBuf {
        root.join(&self.db.file)
    }
}
