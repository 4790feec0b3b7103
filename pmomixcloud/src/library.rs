//! Fournisseur de bibliothèque : VFS, lookup et recherche
//!
//! Le VFS ne stocke que la racine et ses dossiers statiques (configurés
//! par `folders`). Tous les autres dossiers sont calculés à chaque
//! navigation à partir du client.
//!
//! | chemin               | contenu                                    |
//! |----------------------|--------------------------------------------|
//! | `feed`, `stream`     | pistes du flux                             |
//! | `sets`               | dossiers `sets/<id>`                       |
//! | `sets/<id>`          | pistes de la playlist                      |
//! | `following`          | dossiers `following/<id>`                  |
//! | `following/<id>`     | pistes de l'utilisateur                    |
//! | `explore`            | dossiers `explore/<position>`              |
//! | `explore/<position>` | pistes de la catégorie                     |
//! | `groups`             | dossiers `groups/<id>`                     |
//! | `groups/<id>`        | pistes du groupe                           |
//! | `liked`              | pistes et dossiers `sets/<id>` mélangés    |

use crate::client::MixcloudClient;
use crate::error::Result;
use crate::models::{LikedItem, Track};
use crate::uri::{
    encode_cloudcast_key, generate_uri, parse_directory_uri, parse_track_uri, readable_url,
    search_uri, strip_scheme, BRAND, ROOT_URI, URI_SCHEMES,
};
use indexmap::IndexMap;
use pmosource::{async_trait, LibraryProvider, Ref, SearchQuery, SearchResult};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Catégories de premier niveau du VFS
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Feed,
    Sets,
    Following,
    Explore,
    Groups,
    Liked,
    Stream,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Feed => "feed",
            Category::Sets => "sets",
            Category::Following => "following",
            Category::Explore => "explore",
            Category::Groups => "groups",
            Category::Liked => "liked",
            Category::Stream => "stream",
        }
    }

    /// Nom affiché du dossier (`feed` → `Feed`)
    pub fn title(&self) -> String {
        let name = self.as_str();
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "feed" => Ok(Category::Feed),
            "sets" => Ok(Category::Sets),
            "following" => Ok(Category::Following),
            "explore" => Ok(Category::Explore),
            "groups" => Ok(Category::Groups),
            "liked" => Ok(Category::Liked),
            "stream" => Ok(Category::Stream),
            other => Err(format!("unknown category {}", other)),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Référence de dossier pour un chemin du VFS
pub fn new_folder<S: AsRef<str>>(name: &str, path: &[S]) -> Ref {
    Ref::directory(generate_uri(path), readable_url(name))
}

fn track_refs(tracks: Vec<Track>) -> Vec<Ref> {
    tracks.iter().map(Track::to_ref).collect()
}

type Vfs = IndexMap<String, IndexMap<String, Ref>>;

pub struct MixcloudLibraryProvider {
    client: Arc<MixcloudClient>,
    vfs: RwLock<Vfs>,
}

impl fmt::Debug for MixcloudLibraryProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MixcloudLibraryProvider")
            .field("client", &self.client)
            .finish_non_exhaustive()
    }
}

impl MixcloudLibraryProvider {
    /// Crée le fournisseur avec le seul dossier « Feed » sous la racine
    pub fn new(client: Arc<MixcloudClient>) -> Self {
        Self::with_folders(client, &[Category::Feed])
    }

    /// Crée le fournisseur avec les dossiers statiques donnés
    pub fn with_folders(client: Arc<MixcloudClient>, folders: &[Category]) -> Self {
        let mut root = IndexMap::new();
        for category in folders {
            let folder = new_folder(&category.title(), &[category.as_str()]);
            root.insert(folder.uri.clone(), folder);
        }

        let mut vfs = Vfs::new();
        vfs.insert(ROOT_URI.to_string(), root);

        Self {
            client,
            vfs: RwLock::new(vfs),
        }
    }

    /// Crée le fournisseur à partir des noms de dossiers de la configuration
    ///
    /// Les noms inconnus sont ignorés avec un avertissement.
    pub fn from_folder_names<S: AsRef<str>>(client: Arc<MixcloudClient>, names: &[S]) -> Self {
        let folders: Vec<Category> = names
            .iter()
            .filter_map(|name| {
                name.as_ref()
                    .parse()
                    .map_err(|e| warn!("Ignoring folder: {}", e))
                    .ok()
            })
            .collect();
        Self::with_folders(client, &folders)
    }

    pub fn client(&self) -> &Arc<MixcloudClient> {
        &self.client
    }

    /// Ajoute une référence sous la racine
    pub async fn add_to_vfs(&self, model: Ref) {
        let mut vfs = self.vfs.write().await;
        vfs.entry(ROOT_URI.to_string())
            .or_default()
            .insert(model.uri.clone(), model);
    }

    async fn stored_children(&self, uri: &str) -> Option<Vec<Ref>> {
        let vfs = self.vfs.read().await;
        vfs.get(uri)
            .filter(|children| !children.is_empty())
            .map(|children| children.values().cloned().collect())
    }

    async fn list(&self, category: Category, id: Option<&str>) -> Result<Vec<Ref>> {
        let client = &self.client;

        let refs = match (category, id) {
            (Category::Feed | Category::Stream, _) => track_refs(client.get_user_stream().await?),

            (Category::Sets, None) => client
                .get_sets()
                .await?
                .into_iter()
                .map(|set| new_folder(&set.name, &["sets", set.id.as_str()]))
                .collect(),
            (Category::Sets, Some(id)) => track_refs(client.get_set(id).await?),

            (Category::Following, None) => client
                .get_followings()
                .await?
                .into_iter()
                .map(|user| new_folder(&user.name, &["following", user.id.as_str()]))
                .collect(),
            (Category::Following, Some(id)) => track_refs(client.get_following_tracks(id).await?),

            (Category::Explore, None) => client
                .get_explore()
                .await?
                .iter()
                .enumerate()
                .map(|(index, category)| {
                    new_folder(&category.title, &["explore".to_string(), index.to_string()])
                })
                .collect(),
            (Category::Explore, Some(id)) => track_refs(client.get_explore_tracks(id).await?),

            (Category::Groups, None) => client
                .get_groups()
                .await?
                .into_iter()
                .map(|group| new_folder(&group.name, &["groups", group.id.as_str()]))
                .collect(),
            (Category::Groups, Some(id)) => track_refs(client.get_group_tracks(id).await?),

            (Category::Liked, _) => client
                .get_user_liked()
                .await?
                .into_iter()
                .map(|item| match item {
                    LikedItem::Track(track) => track.to_ref(),
                    LikedItem::Playlist { title, id } => new_folder(&title, &["sets", id.as_str()]),
                })
                .collect(),
        };

        Ok(refs)
    }

    async fn lookup_track(&self, uri: &str) -> Result<Vec<Track>> {
        let rest = strip_scheme(uri).unwrap_or(uri);

        if rest.starts_with("http://") || rest.starts_with("https://") {
            return Ok(self.client.resolve_url(rest).await?.into_iter().collect());
        }

        // Clé de cloudcast brute (`mixcloud:/<user>/<slug>/`)
        if rest.starts_with('/') {
            let id = encode_cloudcast_key(rest);
            return Ok(self.client.get_track(&id, false).await.into_iter().collect());
        }

        match parse_track_uri(uri) {
            Some(id) => Ok(self.client.get_track(id, false).await.into_iter().collect()),
            None => {
                warn!("Failed to lookup {}: no track id", uri);
                Ok(Vec::new())
            }
        }
    }

    fn handles_roots(uris: &[String]) -> bool {
        uris.iter().any(|uri| {
            let scheme = uri.split_once(':').map_or(uri.as_str(), |(scheme, _)| scheme);
            URI_SCHEMES.iter().any(|known| *known == scheme)
        })
    }
}

#[async_trait]
impl LibraryProvider for MixcloudLibraryProvider {
    fn root_directory(&self) -> Ref {
        Ref::directory(ROOT_URI, BRAND)
    }

    async fn browse(&self, uri: &str) -> Vec<Ref> {
        debug!("Browse {}", uri);

        if let Some(children) = self.stored_children(uri).await {
            return children;
        }

        let Some(path) = parse_directory_uri(uri) else {
            debug!("Not a directory uri: {}", uri);
            return Vec::new();
        };

        let (category, id) = match path.as_slice() {
            // Racine atteinte par l'alias `mc:`
            [] => return self.stored_children(ROOT_URI).await.unwrap_or_default(),
            [category] => (category, None),
            [category, id] => (category, Some(id.as_str())),
            _ => {
                debug!("Nothing to browse at {}", uri);
                return Vec::new();
            }
        };

        let Ok(category) = category.parse::<Category>() else {
            debug!("Unknown category in {}", uri);
            return Vec::new();
        };

        match self.list(category, id).await {
            Ok(refs) => {
                debug!("Browse {} returned {} entries", uri, refs.len());
                refs
            }
            Err(e) => {
                warn!("Failed to browse {}: {}", uri, e);
                Vec::new()
            }
        }
    }

    async fn lookup(&self, uri: &str) -> Vec<Track> {
        debug!("Lookup {}", uri);
        match self.lookup_track(uri).await {
            Ok(tracks) => tracks,
            Err(e) => {
                warn!("Failed to lookup {}: {}", uri, e);
                Vec::new()
            }
        }
    }

    async fn search(
        &self,
        query: &SearchQuery,
        uris: Option<&[String]>,
        _exact: bool,
    ) -> Option<SearchResult> {
        if let Some(uris) = uris {
            if !Self::handles_roots(uris) {
                debug!("Search restricted to foreign uris {:?}", uris);
                return None;
            }
        }

        if let Some(urls) = query.values_of("uri") {
            let mut tracks = Vec::new();
            for url in &urls {
                let target = strip_scheme(url).unwrap_or(url);
                match self.client.resolve_url(target).await {
                    Ok(Some(track)) => tracks.push(track),
                    Ok(None) => debug!("Nothing found at {}", url),
                    Err(e) => warn!("Failed to resolve {}: {}", url, e),
                }
            }
            return Some(SearchResult {
                uri: search_uri(&urls.join(" ")),
                tracks,
            });
        }

        let text = query.flatten();
        if text.trim().is_empty() {
            return None;
        }

        info!("Searching Mixcloud for {:?}", text);
        match self.client.search(&text).await {
            Ok(tracks) => Some(SearchResult {
                uri: search_uri(&text),
                tracks,
            }),
            Err(e) => {
                warn!("Search for {:?} failed: {}", text, e);
                None
            }
        }
    }
}
