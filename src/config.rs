use std::path::{Path, PathBuf};

use crate::error::{MatchError, Result};
use crate::providers::{resolve_provider, Capability, ProviderSettings, ResolvedProvider};

/// Well-known cache key the corpus is stored under
pub const DASHBOARD_STORAGE_KEY: &str = "dashboard-data-for-embeddings";
/// Number of distinct dashboards returned per query unless overridden
pub const DEFAULT_TOP_K: usize = 3;

/// Connection details for the dashboard catalog API
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CatalogConfig {
    pub base_url: String,
    pub client_id: String,
    pub client_secret: String,
}

/// On-disk representation of config.json. Every field is optional.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub storage_key: Option<String>,
    #[serde(default)]
    pub folder_ids: Vec<String>,
    #[serde(default)]
    pub cache_dir: Option<String>,
    #[serde(default)]
    pub top_k: Option<usize>,
    #[serde(default)]
    pub catalog: Option<CatalogConfig>,
    #[serde(default)]
    pub embedder: ProviderSettings,
    #[serde(default)]
    pub generator: ProviderSettings,
}

impl ConfigFile {
    /// Default location: `<config dir>/dashmatch/config.json`, or `$DASHMATCH_CONFIG`
    pub fn path() -> Result<PathBuf> {
        if let Ok(p) = std::env::var("DASHMATCH_CONFIG") {
            return Ok(PathBuf::from(shellexpand::tilde(&p).into_owned()));
        }
        let config_dir = dirs::config_dir()
            .ok_or_else(|| MatchError::Config("Could not determine config directory".into()))?;
        Ok(config_dir.join("dashmatch").join("config.json"))
    }

    /// Load from disk, returning default if the file doesn't exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        let file: ConfigFile = serde_json::from_str(&data)?;
        Ok(file)
    }

    /// Apply environment overrides on top of file values
    pub fn overlay_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(folders) = lookup("DASHMATCH_FOLDERS") {
            self.folder_ids = folders
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Some(dir) = lookup("DASHMATCH_CACHE_DIR") {
            self.cache_dir = Some(dir);
        }
        if let Some(key) = lookup("DASHMATCH_STORAGE_KEY") {
            self.storage_key = Some(key);
        }
        if let Some(top) = lookup("DASHMATCH_TOP_K") {
            let top_k = top
                .parse::<usize>()
                .map_err(|_| MatchError::Config(format!("DASHMATCH_TOP_K is not a number: {}", top)))?;
            self.top_k = Some(top_k);
        }

        let base_url = lookup("LOOKER_BASE_URL");
        let client_id = lookup("LOOKER_CLIENT_ID");
        let client_secret = lookup("LOOKER_CLIENT_SECRET");
        if let (Some(base_url), Some(client_id), Some(client_secret)) =
            (base_url, client_id, client_secret)
        {
            self.catalog = Some(CatalogConfig {
                base_url,
                client_id,
                client_secret,
            });
        }
        Ok(())
    }
}

/// Session configuration. Built once at startup and read-only afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    /// Cache key the corpus is stored under
    pub storage_key: String,
    /// Folders whose dashboards make up the catalog
    pub folder_ids: Vec<String>,
    /// Where the file cache store writes
    pub cache_dir: PathBuf,
    /// Distinct dashboards returned per query
    pub top_k: usize,
    pub catalog: Option<CatalogConfig>,
    /// Embedding backend
    pub embedder: ResolvedProvider,
    /// Text generation backend (summaries)
    pub generator: ResolvedProvider,
}

impl Config {
    pub fn load(provider_override: Option<&str>) -> Result<Self> {
        let mut file = ConfigFile::load(&ConfigFile::path()?)?;
        file.overlay_env(|name| std::env::var(name).ok())?;
        Self::from_file(file, provider_override)
    }

    pub fn from_file(file: ConfigFile, provider_override: Option<&str>) -> Result<Self> {
        let cache_dir = match file.cache_dir {
            Some(dir) => PathBuf::from(shellexpand::tilde(&dir).into_owned()),
            None => dirs::cache_dir()
                .ok_or_else(|| MatchError::Config("Could not determine cache directory".into()))?
                .join("dashmatch"),
        };

        let top_k = file.top_k.unwrap_or(DEFAULT_TOP_K);
        if top_k == 0 {
            return Err(MatchError::Config("top_k must be at least 1".into()));
        }

        let embedder = resolve_provider(Capability::Embed, provider_override, &file.embedder)?;
        let generator =
            resolve_provider(Capability::Generate, provider_override, &file.generator)?;

        Ok(Config {
            storage_key: file
                .storage_key
                .unwrap_or_else(|| DASHBOARD_STORAGE_KEY.to_string()),
            folder_ids: file.folder_ids,
            cache_dir,
            top_k,
            catalog: file.catalog,
            embedder,
            generator,
        })
    }
}
