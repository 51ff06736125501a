//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge built-in defaults + `config.toml` + `config.<env>.toml`
//! + `APP_*` env vars (`__` separates nested keys, e.g. `APP_RETRIEVAL__TOP_K`).
//! Provides helpers to expand `~` and `${VAR}` and to resolve relative paths
//! against a known base directory.
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::Error;

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.settings()?.validate()?;
        Ok(config)
    }

    /// Wrap an already assembled figment, e.g. one built in a test.
    pub fn from_figment(figment: Figment) -> Self {
        Self { figment }
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// The fully typed view of every section.
    pub fn settings(&self) -> anyhow::Result<Settings> {
        self.figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to extract settings: {}", e))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data: DataSettings,
    pub chunking: ChunkingSettings,
    pub retrieval: RetrievalSettings,
    pub generation: GenerationSettings,
    pub organization: OrgProfile,
    pub server: ServerSettings,
    pub crawler: CrawlerSettings,
}

impl Settings {
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(Error::InvalidConfig("chunking.chunk_size must be positive".into()));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(Error::InvalidConfig(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.retrieval.top_k == 0 {
            return Err(Error::InvalidConfig("retrieval.top_k must be positive".into()));
        }
        if self.retrieval.context_passages == 0 {
            return Err(Error::InvalidConfig("retrieval.context_passages must be positive".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub raw_txt_dir: String,
    pub tantivy_index_dir: String,
    pub lancedb_index_dir: String,
    pub table_name: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            raw_txt_dir: "data".to_string(),
            tantivy_index_dir: "indexes/tantivy".to_string(),
            lancedb_index_dir: "indexes/lancedb".to_string(),
            table_name: "passages".to_string(),
        }
    }
}

impl DataSettings {
    pub fn raw_txt_path(&self) -> PathBuf { expand_path(&self.raw_txt_dir) }
    pub fn tantivy_path(&self) -> PathBuf { expand_path(&self.tantivy_index_dir) }
    pub fn lancedb_path(&self) -> PathBuf { expand_path(&self.lancedb_index_dir) }

    /// BM25 index of one generation; see [`crate::manifest`].
    pub fn tantivy_generation_path(&self, generation: &str) -> PathBuf { self.tantivy_path().join(generation) }
    pub fn lancedb_generation_path(&self, generation: &str) -> PathBuf { self.lancedb_path().join(generation) }

    /// The manifest lives next to the two index directories.
    pub fn manifest_path(&self) -> PathBuf {
        let tantivy = self.tantivy_path();
        let base = tantivy.parent().map(Path::to_path_buf).unwrap_or_default();
        resolve_with_base(&base, "manifest.json")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self { Self { chunk_size: 500, chunk_overlap: 150 } }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalMode {
    #[default]
    Hybrid,
    Text,
    Vector,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub top_k: usize,
    pub context_passages: usize,
    pub mode: RetrievalMode,
}

impl Default for RetrievalSettings {
    fn default() -> Self { Self { top_k: 10, context_passages: 5, mode: RetrievalMode::Hybrid } }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    pub api_key: Option<String>,
    pub api_key_env: String,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
            temperature: 0.3,
            max_tokens: 300,
            timeout_secs: 30,
            api_key: None,
            api_key_env: "GROQ_API_KEY".to_string(),
        }
    }
}

impl GenerationSettings {
    /// Resolve the credential: explicit `api_key` first, then `api_key_env`.
    /// Blank values count as absent. Never touches the network.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| env::var(&self.api_key_env).ok().filter(|k| !k.trim().is_empty()))
    }
}

/// Facts about the organization that appear in fixed replies and in the
/// known-address fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrgProfile {
    pub name: String,
    pub short_name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    /// Street-number fragment whose presence implies `address`.
    pub address_marker: String,
    pub website: String,
}

impl Default for OrgProfile {
    fn default() -> Self {
        Self {
            name: "Silver Buckle Youth Equestrian Center".to_string(),
            short_name: "SBYEC".to_string(),
            phone: "(564) 208-1315".to_string(),
            email: "info@silverbuckleranch.org".to_string(),
            address: "11611 NE 152nd Avenue, Brush Prairie, WA 98606".to_string(),
            address_marker: "11611".to_string(),
            website: "sbyec.org".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self { Self { host: "0.0.0.0".to_string(), port: 5000 } }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlerSettings {
    pub base_url: String,
    pub pages: Vec<String>,
    pub events_page: String,
    pub user_agent: String,
    pub delay_ms: u64,
    pub timeout_secs: u64,
}

impl Default for CrawlerSettings {
    fn default() -> Self {
        let pages = [
            "/",
            "/events/",
            "/riding-lessons/",
            "/programs/4h-rein-shine-club/",
            "/programs/books-at-the-buckle/",
            "/programs/camps/",
            "/programs/equine-encounters/",
            "/programs/field-trips/",
            "/programs/volunteer/",
            "/services/facility-rental/",
            "/services/equine-boarding/",
            "/about/our-mission/",
            "/about/meet-our-team/",
            "/about/meet-the-herd/",
            "/about/contact-us/",
        ];
        Self {
            base_url: "https://sbyec.org".to_string(),
            pages: pages.iter().map(|p| p.to_string()).collect(),
            events_page: "/events/".to_string(),
            user_agent: "Mozilla/5.0 (compatible; SBYEC-Bot/1.0; +info@silverbuckleranch.org)".to_string(),
            delay_ms: 1000,
            timeout_secs: 10,
        }
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
