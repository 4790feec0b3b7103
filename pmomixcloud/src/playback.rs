//! Traduction des URI de pistes en URL jouables

use crate::client::MixcloudClient;
use crate::uri::{parse_track_uri, strip_scheme};
use pmosource::{async_trait, PlaybackProvider};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Stratégie de traduction des URI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranslateMode {
    /// `mixcloud:song/<slug>.<id>` → récupération de la piste → URL de stream
    #[default]
    Resolve,
    /// `mixcloud:<url>` → l'URL elle-même, avec `client_id`
    Direct,
}

#[derive(Debug, Clone)]
pub struct MixcloudPlaybackProvider {
    client: Arc<MixcloudClient>,
    mode: TranslateMode,
    verify_streams: bool,
}

impl MixcloudPlaybackProvider {
    pub fn new(client: Arc<MixcloudClient>, mode: TranslateMode) -> Self {
        Self {
            client,
            mode,
            verify_streams: false,
        }
    }

    /// Vérifie par une requête HEAD que l'URL obtenue redirige vers un flux
    pub fn with_verify_streams(mut self, verify: bool) -> Self {
        self.verify_streams = verify;
        self
    }

    pub fn mode(&self) -> TranslateMode {
        self.mode
    }

    fn translate_direct(&self, uri: &str) -> Option<String> {
        let rest = strip_scheme(uri).unwrap_or(uri);
        if rest.starts_with("http://") || rest.starts_with("https://") {
            Some(self.client.streamable_url(rest))
        } else {
            debug!("Not a stream URL: {}", uri);
            None
        }
    }

    async fn translate_resolved(&self, uri: &str) -> Option<String> {
        let Some(track_id) = parse_track_uri(uri) else {
            warn!("Cannot extract a track id from {}", uri);
            return None;
        };

        let track = self.client.get_track(track_id, true).await?;

        if self.verify_streams && !self.client.can_be_streamed(&track.uri).await {
            info!("Track {} cannot be streamed", uri);
            return None;
        }
        Some(track.uri)
    }
}

#[async_trait]
impl PlaybackProvider for MixcloudPlaybackProvider {
    async fn translate_uri(&self, uri: &str) -> Option<String> {
        debug!("Translating {} ({:?})", uri, self.mode);
        match self.mode {
            TranslateMode::Direct => self.translate_direct(uri),
            TranslateMode::Resolve => self.translate_resolved(uri).await,
        }
    }
}
