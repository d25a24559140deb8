use anyhow::Context;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub site: SiteConfig,
    pub translator: TranslatorConfig,
    /// Songs resolved without searching: `pattern` is matched against the
    /// normalized query (substring, either direction), first entry wins.
    pub known_songs: Vec<KnownSong>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub base_url: String,
    /// Timeout for content page fetches, seconds.
    pub page_timeout_secs: u64,
    /// Timeout for URL existence probes, seconds.
    pub probe_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslatorConfig {
    pub endpoint: String,
    pub source_lang: String,
    pub target_lang: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnownSong {
    pub pattern: String,
    pub path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            site: SiteConfig::default(),
            translator: TranslatorConfig::default(),
            known_songs: default_known_songs(),
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://genius.com".to_string(),
            page_timeout_secs: 10,
            probe_timeout_secs: 5,
        }
    }
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://libretranslate.de/translate".to_string(),
            source_lang: "en".to_string(),
            target_lang: "ru".to_string(),
        }
    }
}

fn default_known_songs() -> Vec<KnownSong> {
    let entries = [
        ("bohemian rhapsody queen", "/Queen-bohemian-rhapsody-lyrics"),
        ("imagine john lennon", "/John-lennon-imagine-lyrics"),
        ("yesterday beatles", "/The-beatles-yesterday-lyrics"),
        ("hotel california eagles", "/Eagles-hotel-california-lyrics"),
        (
            "smells like teen spirit nirvana",
            "/Nirvana-smells-like-teen-spirit-lyrics",
        ),
    ];
    entries
        .into_iter()
        .map(|(pattern, path)| KnownSong {
            pattern: pattern.to_string(),
            path: path.to_string(),
        })
        .collect()
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    let proj = ProjectDirs::from("dev", "strofa", "strofa").context("ProjectDirs unavailable")?;
    Ok(proj.config_dir().join("config.toml"))
}

pub fn load(override_path: Option<&Path>) -> anyhow::Result<Config> {
    let path = match override_path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };

    if !path.exists() {
        let cfg = Config::default();
        save(&cfg, Some(&path))?;
        return Ok(cfg);
    }

    let raw = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    let cfg = toml::from_str::<Config>(&raw).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}

pub fn save(cfg: &Config, override_path: Option<&Path>) -> anyhow::Result<()> {
    let path = match override_path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create dir {}", parent.display()))?;
    }
    let raw = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&path, raw).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}
