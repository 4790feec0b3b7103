//! Client principal pour interagir avec l'API Mixcloud
//!
//! Ce module fournit un client haut-niveau avec cache intégré : une
//! opération par catégorie du catalogue (flux, playlists, abonnements,
//! explore, groupes, likes, recherche) et la résolution concurrente de
//! pistes.
//!
//! Les opérations de listing propagent les erreurs HTTP ; c'est au
//! fournisseur de bibliothèque de les convertir en listing vide.
//! [`MixcloudClient::get_track`] et [`MixcloudClient::can_be_streamed`]
//! absorbent au contraire toute erreur.

use crate::api::{MixcloudApi, DEFAULT_API_BASE, DEFAULT_API_V2_BASE, DEFAULT_CLIENT_ID};
use crate::cache::{CachePolicy, MixcloudCache};
use crate::config_ext::{MixcloudConfigExt, MixcloudSettings};
use crate::error::{MixcloudError, Result};
use crate::models::{
    decode_items, list_items, ExploreCategory, FeedEntry, FollowedUser, Group, LikedItem,
    RawGroup, RawLike, RawPlaylist, RawTrack, RawUser, Set, Track,
};
use crate::parse::{parse_cloudcast, parse_track, sanitize, DEFAULT_THUMB_SIZE};
use crate::uri::decode_track_id;
use futures::stream::{self, StreamExt};
use pmoconfig::Config;
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_TRACK_TIMEOUT_SECS: u64 = 15;
const DEFAULT_RESOLVE_WORKERS: usize = 16;
const DEFAULT_EXPLORE_SONGS: usize = 10;
const DEFAULT_FEED_USER: &str = "me";

/// Client Mixcloud haut-niveau avec cache
#[derive(Clone)]
pub struct MixcloudClient {
    /// API bas-niveau
    api: MixcloudApi,
    /// Cache en mémoire
    cache: Arc<MixcloudCache>,
    explore_songs: usize,
    feed_user: String,
    thumb_size: String,
    track_timeout: Duration,
    resolve_workers: usize,
}

impl std::fmt::Debug for MixcloudClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MixcloudClient")
            .field("api_base", &self.api.api_base())
            .field("feed_user", &self.feed_user)
            .field("explore_songs", &self.explore_songs)
            .finish()
    }
}

impl MixcloudClient {
    /// Crée un client avec les paramètres par défaut
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Crée un client à partir des paramètres `sources.mixcloud`
    pub fn from_settings(settings: &MixcloudSettings) -> Result<Self> {
        let mut builder = Self::builder()
            .client_id(settings.client_id.clone())
            .api_base(settings.api_base.clone())
            .api_v2_base(settings.api_v2_base.clone())
            .timeout(settings.request_timeout())
            .track_timeout(settings.track_timeout())
            .resolve_workers(settings.resolve_workers)
            .explore_songs(settings.explore_songs)
            .feed_user(settings.feed_user.clone())
            .thumb_size(settings.thumb_size.clone())
            .cache_policy(settings.cache.policy());
        if let Some(token) = &settings.auth_token {
            builder = builder.auth_token(token.clone());
        }
        builder.build()
    }

    /// Crée un client en utilisant la configuration de pmoconfig
    ///
    /// # Exemple
    ///
    /// ```rust,no_run
    /// use pmomixcloud::MixcloudClient;
    ///
    /// #[tokio::main]
    /// async fn main() -> anyhow::Result<()> {
    ///     let client = MixcloudClient::from_config()?;
    ///     for track in client.search("deep house").await? {
    ///         println!("{} ({}s)", track.name, track.length);
    ///     }
    ///     Ok(())
    /// }
    /// ```
    pub fn from_config() -> Result<Self> {
        let config = pmoconfig::get_config();
        Self::from_config_obj(config.as_ref())
    }

    /// Crée un client depuis un objet Config spécifique
    pub fn from_config_obj(config: &Config) -> Result<Self> {
        let settings = config.get_mixcloud_settings()?;
        Self::from_settings(&settings)
    }

    pub fn api(&self) -> &MixcloudApi {
        &self.api
    }

    /// Retourne une référence au cache
    pub fn cache(&self) -> Arc<MixcloudCache> {
        self.cache.clone()
    }

    pub fn explore_songs(&self) -> usize {
        self.explore_songs
    }

    pub fn feed_user(&self) -> &str {
        &self.feed_user
    }

    fn parse_tracks(&self, values: Vec<Value>) -> Vec<Track> {
        sanitize(
            values
                .into_iter()
                .map(|value| parse_track(RawTrack::from_value(value).as_ref(), false, &self.api)),
        )
    }

    // ============ Flux ============

    /// Récupère le flux de l'utilisateur configuré
    pub async fn get_user_stream(&self) -> Result<Vec<Track>> {
        debug!("Get user stream of {}", self.feed_user);
        let page = self.api.feed(&self.feed_user).await?;

        let cloudcasts = sanitize(decode_items::<FeedEntry>(page))
            .into_iter()
            .flat_map(|entry| entry.cloudcasts.unwrap_or_default());

        Ok(sanitize(cloudcasts.enumerate().map(|(index, value)| {
            RawTrack::from_value(value)
                .and_then(|raw| parse_cloudcast(index as u32 + 1, &raw, &self.thumb_size))
        })))
    }

    // ============ Playlists ============

    /// Récupère les playlists de l'utilisateur
    pub async fn get_sets(&self) -> Result<Vec<Set>> {
        let playlists = decode_items::<RawPlaylist>(self.api.my_playlists().await?);

        Ok(sanitize(playlists.into_iter().map(|playlist| {
            let playlist = playlist?;
            let id = playlist.id.clone()?;
            let name = playlist.display_name().unwrap_or(id.as_str()).to_string();
            let tracks = self.parse_tracks(playlist.tracks.unwrap_or_default());
            debug!("Fetched set {} with id {} ({} tracks)", name, id, tracks.len());
            Some(Set { name, id, tracks })
        })))
    }

    /// Récupère les pistes d'une playlist (avec cache)
    pub async fn get_set(&self, set_id: &str) -> Result<Vec<Track>> {
        self.cache
            .sets
            .get_or_try_compute(set_id.to_string(), || async {
                let playlist = self.api.playlist(set_id).await?;
                Ok::<_, MixcloudError>(self.parse_tracks(playlist.tracks.unwrap_or_default()))
            })
            .await
    }

    // ============ Abonnements ============

    /// Récupère les utilisateurs suivis
    pub async fn get_followings(&self) -> Result<Vec<FollowedUser>> {
        let users = decode_items::<RawUser>(self.api.my_followings().await?);

        Ok(sanitize(users.into_iter().map(|user| {
            let user = user?;
            let id = user.id.clone()?;
            let name = user.display_name().unwrap_or(id.as_str()).to_string();
            debug!("Fetched user {} with id {}", name, id);
            Some(FollowedUser { name, id })
        })))
    }

    /// Récupère les pistes d'un utilisateur suivi
    pub async fn get_following_tracks(&self, user_id: &str) -> Result<Vec<Track>> {
        let tracks = self.api.user_tracks(user_id).await?;
        Ok(self.parse_tracks(list_items(tracks)))
    }

    // ============ Explore ============

    /// Récupère les catégories explore (avec cache)
    pub async fn get_explore(&self) -> Result<Vec<ExploreCategory>> {
        self.cache
            .explore
            .get_or_try_compute((), || async {
                let categories = self.api.explore_categories().await?;
                Ok::<_, MixcloudError>(
                    list_items(categories)
                        .iter()
                        .filter_map(ExploreCategory::from_value)
                        .collect(),
                )
            })
            .await
    }

    /// Récupère les pistes d'une catégorie explore désignée par sa position
    pub async fn get_explore_tracks(&self, category_id: &str) -> Result<Vec<Track>> {
        let index: usize = category_id
            .parse()
            .map_err(|_| MixcloudError::NotFound(format!("explore category {}", category_id)))?;

        let categories = self.get_explore().await?;
        let category = categories
            .get(index)
            .ok_or_else(|| MixcloudError::NotFound(format!("explore category {}", index)))?;

        let page = self.api.explore_page(&category.urn, self.explore_songs).await?;
        Ok(self.resolve_tracks(page.track_ids()).await)
    }

    // ============ Groupes ============

    /// Récupère les groupes de l'utilisateur
    pub async fn get_groups(&self) -> Result<Vec<Group>> {
        let groups = decode_items::<RawGroup>(self.api.my_groups().await?);

        Ok(sanitize(groups.into_iter().map(|group| {
            let group = group?;
            let id = group.id.clone()?;
            let name = group
                .name
                .clone()
                .or_else(|| group.title.clone())
                .unwrap_or_else(|| id.clone());
            Some(Group { name, id })
        })))
    }

    /// Récupère les pistes d'un groupe (entrées de type « track » uniquement)
    pub async fn get_group_tracks(&self, group_id: &str) -> Result<Vec<Track>> {
        let id: u64 = group_id
            .parse()
            .map_err(|_| MixcloudError::NotFound(format!("group {}", group_id)))?;

        let entries = list_items(self.api.group_tracks(id).await?);
        Ok(sanitize(entries.into_iter().map(|value| {
            let raw = RawTrack::from_value(value)?;
            if !raw.kind.as_deref().is_some_and(|kind| kind.contains("track")) {
                return None;
            }
            parse_track(Some(&raw), false, &self.api)
        })))
    }

    // ============ Likes ============

    /// Récupère les pistes et playlists aimées (endpoint non documenté)
    pub async fn get_user_liked(&self) -> Result<Vec<LikedItem>> {
        let likes = decode_items::<RawLike>(self.api.my_likes().await?);

        let mut items = Vec::new();
        for like in sanitize(likes) {
            if let Some(track) = like.track {
                items.push(
                    parse_track(RawTrack::from_value(track).as_ref(), false, &self.api)
                        .map(LikedItem::Track),
                );
            }
            if let Some(playlist) = like.playlist {
                items.push(playlist.id.clone().map(|id| LikedItem::Playlist {
                    title: playlist.display_name().unwrap_or(id.as_str()).to_string(),
                    id,
                }));
            }
        }
        Ok(sanitize(items))
    }

    // ============ Recherche ============

    /// Recherche des pistes jouables, triées par popularité
    pub async fn search(&self, query: &str) -> Result<Vec<Track>> {
        debug!("Searching for {:?}", query);
        let results = self.api.search_tracks(query, self.explore_songs).await?;
        Ok(self.parse_tracks(list_items(results)))
    }

    /// Résout une URL publique Mixcloud en piste
    pub async fn resolve_url(&self, url: &str) -> Result<Option<Track>> {
        let value = self.api.resolve(url).await?;
        let Some(raw) = RawTrack::from_value(value) else {
            return Ok(None);
        };
        Ok(parse_track(Some(&raw), false, &self.api)
            .or_else(|| parse_cloudcast(0, &raw, &self.thumb_size)))
    }

    // ============ Pistes ============

    /// Récupère une piste par son ID (avec cache)
    ///
    /// Avec `streamable`, l'URI de la piste retournée est l'URL de stream
    /// directe. Toute erreur (réseau, 404, JSON invalide) donne `None`.
    pub async fn get_track(&self, track_id: &str, streamable: bool) -> Option<Track> {
        debug!("Getting info for track with id {}", track_id);
        let result = self
            .cache
            .tracks
            .get_or_try_compute((track_id.to_string(), streamable), || {
                self.fetch_track(track_id, streamable)
            })
            .await;

        match result {
            Ok(track) => Some(track),
            Err(e) => {
                warn!("Failed to get track {}: {}", track_id, e);
                None
            }
        }
    }

    async fn fetch_track(&self, track_id: &str, streamable: bool) -> Result<Track> {
        let id = decode_track_id(track_id);

        let track = if id.starts_with('/') {
            // Clé de cloudcast encodée dans l'URI synthétique
            let raw = RawTrack::from_value(self.api.cloudcast(&id).await?);
            raw.and_then(|raw| {
                let mut track = parse_cloudcast(0, &raw, &self.thumb_size)?;
                if streamable {
                    track.uri = self.api.streamable_url(raw.stream_url.as_deref()?);
                }
                Some(track)
            })
        } else {
            let raw = RawTrack::from_value(self.api.track(&id).await?);
            parse_track(raw.as_ref(), streamable, &self.api)
        };

        track.ok_or_else(|| MixcloudError::NotFound(format!("track {}", track_id)))
    }

    /// Ajoute `client_id` à une URL de stream
    pub fn streamable_url(&self, url: &str) -> String {
        self.api.streamable_url(url)
    }

    /// Vérifie qu'une URL de stream redirige vers un flux jouable (avec cache)
    pub async fn can_be_streamed(&self, url: &str) -> bool {
        let result = self
            .cache
            .streams
            .get_or_try_compute(url.to_string(), || async {
                let status = self.api.head_status(&self.api.streamable_url(url)).await?;
                debug!("Stream probe for {} returned {}", url, status);
                Ok::<_, MixcloudError>(status == 302)
            })
            .await;

        result.unwrap_or_else(|e| {
            warn!("Stream probe failed for {}: {}", url, e);
            false
        })
    }

    /// Résout des IDs en pistes, en parallèle
    ///
    /// Les pistes introuvables sont écartées et l'ordre n'est pas garanti.
    pub async fn resolve_tracks<I, S>(&self, track_ids: I) -> Vec<Track>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resolve_tracks_with_cancel(track_ids, &CancellationToken::new())
            .await
    }

    /// Variante annulable de [`resolve_tracks`](Self::resolve_tracks)
    ///
    /// Au plus `resolve_workers` requêtes sont en vol ; chacune est bornée
    /// par `track_timeout`. L'annulation du token abandonne les requêtes en
    /// cours et celles pas encore lancées.
    pub async fn resolve_tracks_with_cancel<I, S>(
        &self,
        track_ids: I,
        cancel: &CancellationToken,
    ) -> Vec<Track>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids: Vec<String> = track_ids.into_iter().map(Into::into).collect();
        let total = ids.len();
        let timeout = self.track_timeout;

        let tracks: Vec<Option<Track>> = stream::iter(ids)
            .map(|id| async move {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!("Resolution of track {} cancelled", id);
                        None
                    }
                    result = tokio::time::timeout(timeout, self.get_track(&id, false)) => {
                        result.unwrap_or_else(|_| {
                            let err = MixcloudError::Timeout(format!(
                                "track {} after {:?}",
                                id, timeout
                            ));
                            warn!("Failed to resolve track: {}", err);
                            None
                        })
                    }
                }
            })
            .buffer_unordered(self.resolve_workers.max(1))
            .collect()
            .await;

        let tracks = sanitize(tracks);
        debug!("Resolved {}/{} tracks", tracks.len(), total);
        tracks
    }
}

/// Builder pour configurer un [`MixcloudClient`]
pub struct ClientBuilder {
    client: Option<Client>,
    api_base: String,
    api_v2_base: String,
    client_id: String,
    auth_token: Option<String>,
    request_timeout: Duration,
    track_timeout: Duration,
    resolve_workers: usize,
    explore_songs: usize,
    feed_user: String,
    thumb_size: String,
    cache_policy: CachePolicy,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            client: None,
            api_base: DEFAULT_API_BASE.to_string(),
            api_v2_base: DEFAULT_API_V2_BASE.to_string(),
            client_id: DEFAULT_CLIENT_ID.to_string(),
            auth_token: None,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            track_timeout: Duration::from_secs(DEFAULT_TRACK_TIMEOUT_SECS),
            resolve_workers: DEFAULT_RESOLVE_WORKERS,
            explore_songs: DEFAULT_EXPLORE_SONGS,
            feed_user: DEFAULT_FEED_USER.to_string(),
            thumb_size: DEFAULT_THUMB_SIZE.to_string(),
            cache_policy: CachePolicy::default(),
        }
    }
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Utilise un client HTTP existant (pool de connexions partagé, proxy...)
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn api_base(mut self, url: impl Into<String>) -> Self {
        self.api_base = url.into();
        self
    }

    pub fn api_v2_base(mut self, url: impl Into<String>) -> Self {
        self.api_v2_base = url.into();
        self
    }

    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }

    pub fn auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Délai maximal d'une requête HTTP
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Délai maximal par piste dans `resolve_tracks`
    pub fn track_timeout(mut self, timeout: Duration) -> Self {
        self.track_timeout = timeout;
        self
    }

    pub fn resolve_workers(mut self, workers: usize) -> Self {
        self.resolve_workers = workers;
        self
    }

    pub fn explore_songs(mut self, limit: usize) -> Self {
        self.explore_songs = limit;
        self
    }

    pub fn feed_user(mut self, user: impl Into<String>) -> Self {
        self.feed_user = user.into();
        self
    }

    pub fn thumb_size(mut self, size: impl Into<String>) -> Self {
        self.thumb_size = size.into();
        self
    }

    pub fn cache_policy(mut self, policy: CachePolicy) -> Self {
        self.cache_policy = policy;
        self
    }

    pub fn build(self) -> Result<MixcloudClient> {
        if self.client_id.is_empty() {
            return Err(MixcloudError::Configuration("empty client_id".into()));
        }

        let client = match self.client {
            Some(client) => client,
            None => Client::builder()
                .timeout(self.request_timeout)
                .user_agent(concat!("pmomixcloud/", env!("CARGO_PKG_VERSION")))
                .build()?,
        };

        let mut api = MixcloudApi::with_client(
            client,
            self.request_timeout,
            self.api_base,
            self.api_v2_base,
            self.client_id,
        )?;
        api.set_auth_token(self.auth_token);

        info!(
            "Creating Mixcloud client (api: {}, feed user: {})",
            api.api_base(),
            self.feed_user
        );

        Ok(MixcloudClient {
            api,
            cache: Arc::new(MixcloudCache::with_policy(self.cache_policy)),
            explore_songs: self.explore_songs,
            feed_user: self.feed_user,
            thumb_size: self.thumb_size,
            track_timeout: self.track_timeout,
            resolve_workers: self.resolve_workers,
        })
    }
}
