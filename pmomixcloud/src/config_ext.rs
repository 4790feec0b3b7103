//! Extension pour intégrer la configuration Mixcloud dans pmoconfig
//!
//! Ce module fournit le trait `MixcloudConfigExt` qui ajoute à
//! `pmoconfig::Config` l'accès à la section `sources.mixcloud`, ainsi que
//! la structure [`MixcloudSettings`] qui regroupe tous ses paramètres.
//!
//! ```yaml
//! sources:
//!   mixcloud:
//!     enabled: true
//!     explore_songs: 10
//!     translate_mode: resolve
//!     folders: [feed, sets, explore]
//!     cache:
//!       ttl_secs: 3600
//!       max_hits: 8
//!       hit_scope: per_key
//! ```

use crate::api::{DEFAULT_API_BASE, DEFAULT_API_V2_BASE, DEFAULT_CLIENT_ID};
use crate::cache::{CachePolicy, HitScope};
use crate::parse::DEFAULT_THUMB_SIZE;
use crate::playback::TranslateMode;
use anyhow::Result;
use pmoconfig::Config;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::time::Duration;

const SECTION: [&str; 2] = ["sources", "mixcloud"];

/// Paramètres du cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub ttl_secs: u64,
    /// Nombre de hits avant recalcul ; 0 désactive la limite
    pub max_hits: u32,
    pub hit_scope: HitScope,
    pub capacity: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_secs: 3600,
            max_hits: 8,
            hit_scope: HitScope::PerKey,
            capacity: 1000,
        }
    }
}

impl CacheSettings {
    pub fn policy(&self) -> CachePolicy {
        CachePolicy {
            ttl: Duration::from_secs(self.ttl_secs),
            max_hits: (self.max_hits > 0).then_some(self.max_hits),
            scope: self.hit_scope,
            capacity: self.capacity,
        }
    }
}

/// Paramètres de la section `sources.mixcloud`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MixcloudSettings {
    pub enabled: bool,
    pub client_id: String,
    /// Token OAuth statique (aucun flux de connexion n'est géré)
    pub auth_token: Option<String>,
    /// Nombre de résultats pour la recherche et les catégories explore
    pub explore_songs: usize,
    /// Utilisateur dont le flux est affiché
    pub feed_user: String,
    pub api_base: String,
    pub api_v2_base: String,
    pub request_timeout_secs: u64,
    /// Délai maximal par piste dans `resolve_tracks`
    pub track_timeout_secs: u64,
    pub resolve_workers: usize,
    pub thumb_size: String,
    pub translate_mode: TranslateMode,
    pub verify_streams: bool,
    /// Dossiers statiques listés sous la racine
    pub folders: Vec<String>,
    pub cache: CacheSettings,
}

impl Default for MixcloudSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            client_id: DEFAULT_CLIENT_ID.to_string(),
            auth_token: None,
            explore_songs: 10,
            feed_user: "me".to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            api_v2_base: DEFAULT_API_V2_BASE.to_string(),
            request_timeout_secs: 30,
            track_timeout_secs: 15,
            resolve_workers: 16,
            thumb_size: DEFAULT_THUMB_SIZE.to_string(),
            translate_mode: TranslateMode::Resolve,
            verify_streams: false,
            folders: vec!["feed".to_string()],
            cache: CacheSettings::default(),
        }
    }
}

impl MixcloudSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn track_timeout(&self) -> Duration {
        Duration::from_secs(self.track_timeout_secs.max(1))
    }
}

/// Trait d'extension pour gérer la configuration Mixcloud dans pmoconfig
///
/// # Exemple
///
/// ```rust,ignore
/// use pmoconfig::get_config;
/// use pmomixcloud::MixcloudConfigExt;
///
/// let config = get_config();
/// if config.get_mixcloud_enabled()? {
///     let settings = config.get_mixcloud_settings()?;
///     println!("Mixcloud feed of {}", settings.feed_user);
/// }
/// ```
pub trait MixcloudConfigExt {
    /// Indique si la source Mixcloud est activée (vrai par défaut)
    fn get_mixcloud_enabled(&self) -> Result<bool>;

    fn set_mixcloud_enabled(&self, enabled: bool) -> Result<()>;

    /// Récupère le client ID, ou celui par défaut si non configuré
    fn get_mixcloud_client_id(&self) -> Result<String>;

    fn set_mixcloud_client_id(&self, client_id: &str) -> Result<()>;

    /// Récupère le token OAuth, ou None si non configuré
    fn get_mixcloud_auth_token(&self) -> Result<Option<String>>;

    fn set_mixcloud_auth_token(&self, token: &str) -> Result<()>;

    /// Récupère l'ensemble des paramètres Mixcloud
    ///
    /// Les clés absentes prennent leur valeur par défaut.
    fn get_mixcloud_settings(&self) -> Result<MixcloudSettings>;
}

impl MixcloudConfigExt for Config {
    fn get_mixcloud_enabled(&self) -> Result<bool> {
        match self.get_value(&[SECTION[0], SECTION[1], "enabled"]) {
            Ok(Value::Bool(b)) => Ok(b),
            Ok(_) => Ok(true),  // Wrong type
            Err(_) => Ok(true), // Not configured
        }
    }

    fn set_mixcloud_enabled(&self, enabled: bool) -> Result<()> {
        self.set_value(&[SECTION[0], SECTION[1], "enabled"], Value::Bool(enabled))
    }

    fn get_mixcloud_client_id(&self) -> Result<String> {
        match self.get_value(&[SECTION[0], SECTION[1], "client_id"]) {
            Ok(Value::String(s)) if !s.is_empty() => Ok(s),
            _ => Ok(DEFAULT_CLIENT_ID.to_string()),
        }
    }

    fn set_mixcloud_client_id(&self, client_id: &str) -> Result<()> {
        self.set_value(
            &[SECTION[0], SECTION[1], "client_id"],
            Value::String(client_id.to_string()),
        )
    }

    fn get_mixcloud_auth_token(&self) -> Result<Option<String>> {
        match self.get_value(&[SECTION[0], SECTION[1], "auth_token"]) {
            Ok(Value::String(s)) if !s.is_empty() => Ok(Some(s)),
            Ok(_) => Ok(None),
            Err(_) => Ok(None),
        }
    }

    fn set_mixcloud_auth_token(&self, token: &str) -> Result<()> {
        self.set_value(
            &[SECTION[0], SECTION[1], "auth_token"],
            Value::String(token.to_string()),
        )
    }

    fn get_mixcloud_settings(&self) -> Result<MixcloudSettings> {
        let mut settings: MixcloudSettings = self.get_section(&SECTION)?;
        if settings.client_id.is_empty() {
            settings.client_id = DEFAULT_CLIENT_ID.to_string();
        }
        settings.auth_token = settings.auth_token.filter(|token| !token.is_empty());
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config(yaml: Option<&str>) -> (TempDir, Config) {
        let dir = TempDir::new().unwrap();
        if let Some(yaml) = yaml {
            std::fs::write(dir.path().join("config.yaml"), yaml).unwrap();
        }
        let config = Config::load_config(dir.path().to_str().unwrap()).unwrap();
        (dir, config)
    }

    #[test]
    fn test_default_settings() {
        let (_dir, config) = config(None);
        let settings = config.get_mixcloud_settings().unwrap();
        assert_eq!(settings, MixcloudSettings::default());
        assert!(config.get_mixcloud_enabled().unwrap());
        assert_eq!(config.get_mixcloud_client_id().unwrap(), DEFAULT_CLIENT_ID);
        assert_eq!(config.get_mixcloud_auth_token().unwrap(), None);
    }

    #[test]
    fn test_partial_settings_keep_defaults() {
        let (_dir, config) = config(Some(
            "sources:\n  mixcloud:\n    explore_songs: 25\n    translate_mode: direct\n    \
             folders: [feed, sets]\n    cache:\n      hit_scope: shared\n      max_hits: 0\n",
        ));
        let settings = config.get_mixcloud_settings().unwrap();
        assert_eq!(settings.explore_songs, 25);
        assert_eq!(settings.translate_mode, TranslateMode::Direct);
        assert_eq!(settings.folders, vec!["feed", "sets"]);
        assert_eq!(settings.cache.hit_scope, HitScope::Shared);
        assert_eq!(settings.cache.policy().max_hits, None);
        assert_eq!(settings.cache.ttl_secs, 3600);
        assert_eq!(settings.feed_user, "me");
    }

    #[test]
    fn test_setters() {
        let (_dir, config) = config(None);
        config.set_mixcloud_enabled(false).unwrap();
        config.set_mixcloud_auth_token("secret").unwrap();
        config.set_mixcloud_client_id("other").unwrap();

        assert!(!config.get_mixcloud_enabled().unwrap());
        assert_eq!(
            config.get_mixcloud_auth_token().unwrap(),
            Some("secret".to_string())
        );
        let settings = config.get_mixcloud_settings().unwrap();
        assert!(!settings.enabled);
        assert_eq!(settings.client_id, "other");
        assert_eq!(settings.auth_token.as_deref(), Some("secret"));
    }

    #[test]
    fn test_default_policy() {
        assert_eq!(CacheSettings::default().policy(), CachePolicy::default());
    }
}
