//! Backend Mixcloud pour l'hôte

use crate::client::MixcloudClient;
use crate::config_ext::{MixcloudConfigExt, MixcloudSettings};
use crate::library::MixcloudLibraryProvider;
use crate::playback::MixcloudPlaybackProvider;
use crate::uri::{BRAND, URI_SCHEMES};
use pmoconfig::Config;
use pmosource::{Backend, LibraryProvider, MusicSourceError, PlaybackProvider, Result};
use std::sync::Arc;
use tracing::info;

/// Assemble le client, le fournisseur de bibliothèque et le traducteur d'URI
///
/// Le client (et donc son cache) est partagé entre les deux fournisseurs.
#[derive(Debug)]
pub struct MixcloudBackend {
    client: Arc<MixcloudClient>,
    library: MixcloudLibraryProvider,
    playback: MixcloudPlaybackProvider,
}

impl MixcloudBackend {
    /// Construit le backend à partir de paramètres explicites
    ///
    /// Retourne [`MusicSourceError::SourceDisabled`] si la source est
    /// désactivée.
    pub fn new(settings: &MixcloudSettings) -> Result<Self> {
        if !settings.enabled {
            return Err(MusicSourceError::SourceDisabled(BRAND.to_string()));
        }

        let client = MixcloudClient::from_settings(settings)
            .map_err(|e| MusicSourceError::Configuration(e.to_string()))?;
        Ok(Self::with_client(Arc::new(client), settings))
    }

    /// Construit le backend autour d'un client existant
    pub fn with_client(client: Arc<MixcloudClient>, settings: &MixcloudSettings) -> Self {
        let library = MixcloudLibraryProvider::from_folder_names(client.clone(), &settings.folders);
        let playback = MixcloudPlaybackProvider::new(client.clone(), settings.translate_mode)
            .with_verify_streams(settings.verify_streams);

        info!(
            "Mixcloud backend ready ({:?} mode, {} root folders)",
            settings.translate_mode,
            settings.folders.len()
        );

        Self {
            client,
            library,
            playback,
        }
    }

    /// Construit le backend depuis la configuration globale
    pub fn from_config() -> Result<Self> {
        let config = pmoconfig::get_config();
        Self::from_config_obj(config.as_ref())
    }

    pub fn from_config_obj(config: &Config) -> Result<Self> {
        let settings = config
            .get_mixcloud_settings()
            .map_err(|e| MusicSourceError::Configuration(e.to_string()))?;
        Self::new(&settings)
    }

    pub fn client(&self) -> &Arc<MixcloudClient> {
        &self.client
    }
}

impl Backend for MixcloudBackend {
    fn name(&self) -> &str {
        BRAND
    }

    fn uri_schemes(&self) -> &[&'static str] {
        &URI_SCHEMES
    }

    fn library(&self) -> &dyn LibraryProvider {
        &self.library
    }

    fn playback(&self) -> &dyn PlaybackProvider {
        &self.playback
    }
}
