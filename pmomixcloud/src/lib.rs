//! # pmomixcloud - Backend Mixcloud pour PMOMusic
//!
//! Cette crate expose le catalogue Mixcloud (flux, playlists, abonnements,
//! catégories explore, groupes, likes, recherche) au lecteur hôte sous la
//! forme d'un système de fichiers virtuel et d'URI de pistes jouables.
//!
//! ## Architecture
//!
//! - `MixcloudClient` : client haut-niveau, une opération par catégorie,
//!   résolution concurrente des pistes
//! - `api` : couche d'accès à l'API REST (`api` et `api-v2`)
//! - `models` : enregistrements bruts tolérants et types publics
//! - `parse` : conversion des enregistrements en [`Track`]
//! - `cache` : cache mémoïsant borné par TTL et nombre de hits
//! - `uri` : construction et analyse des URI `mixcloud:`
//! - `library` : VFS, lookup et recherche (`LibraryProvider`)
//! - `playback` : traduction des URI en URL de stream (`PlaybackProvider`)
//! - `backend` : assemblage pour l'hôte (`Backend`)
//!
//! ## Structure des modules
//!
//! ```text
//! pmomixcloud/
//! ├── src/
//! │   ├── lib.rs              # Module principal (ce fichier)
//! │   ├── client.rs           # Client Mixcloud principal
//! │   ├── models.rs           # Structures de données
//! │   ├── parse.rs            # Décodage des pistes et cloudcasts
//! │   ├── api/
//! │   │   ├── mod.rs          # API client
//! │   │   └── catalog.rs      # Accès au catalogue
//! │   ├── cache.rs            # Cache en mémoire
//! │   ├── uri.rs              # URI mixcloud:
//! │   ├── library.rs          # Fournisseur de bibliothèque
//! │   ├── playback.rs         # Traduction des URI
//! │   ├── backend.rs          # Backend hôte
//! │   ├── config_ext.rs       # Extension pmoconfig
//! │   └── error.rs            # Gestion des erreurs
//! ```
//!
//! ## Utilisation
//!
//! ### Navigation via le backend
//!
//! ```rust,no_run
//! use pmomixcloud::MixcloudBackend;
//! use pmosource::Backend;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let backend = MixcloudBackend::from_config()?;
//!     let library = backend.library();
//!
//!     for entry in library.browse(&library.root_directory().uri).await {
//!         println!("{} -> {}", entry.name, entry.uri);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ### Client direct
//!
//! ```rust,no_run
//! use pmomixcloud::MixcloudClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = MixcloudClient::builder().explore_songs(20).build()?;
//!
//!     for category in client.get_explore().await? {
//!         println!("{}", category.title);
//!     }
//!
//!     // Les pistes introuvables sont simplement écartées
//!     let tracks = client.resolve_tracks(["123", "456"]).await;
//!     println!("{} pistes résolues", tracks.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Cache
//!
//! Les appels `get_track`, `get_set`, `get_explore` et `can_be_streamed`
//! sont mémoïsés. Une entrée est recalculée quand elle a plus d'une heure
//! ou qu'elle a été servie 8 fois ; les deux bornes se règlent dans
//! `sources.mixcloud.cache`. Les erreurs ne sont jamais mises en cache.
//!
//! ## Gestion des erreurs
//!
//! Les opérations du client retournent [`MixcloudError`]. Les fournisseurs
//! exposés à l'hôte ne propagent jamais d'erreur : elles sont journalisées
//! et converties en listing vide ou en `None`.
//!
//! ```rust,ignore
//! use pmomixcloud::{MixcloudClient, MixcloudError};
//!
//! match client.get_set("unknown").await {
//!     Ok(tracks) => println!("{} pistes", tracks.len()),
//!     Err(MixcloudError::NotFound(what)) => println!("Introuvable : {}", what),
//!     Err(e) => println!("Erreur : {}", e),
//! }
//! ```

pub mod api;
pub mod backend;
pub mod cache;
pub mod client;
pub mod config_ext;
pub mod error;
pub mod library;
pub mod models;
pub mod parse;
pub mod playback;
pub mod uri;

pub use backend::MixcloudBackend;
pub use cache::{CachePolicy, CacheStats, CallCache, HitScope, MixcloudCache};
pub use client::{ClientBuilder, MixcloudClient};
pub use config_ext::{CacheSettings, MixcloudConfigExt, MixcloudSettings};
pub use error::{MixcloudError, Result};
pub use library::{new_folder, Category, MixcloudLibraryProvider};
pub use models::{ExploreCategory, FollowedUser, Group, LikedItem, Set, Track};
pub use parse::{parse_cloudcast, parse_track, sanitize};
pub use playback::{MixcloudPlaybackProvider, TranslateMode};
pub use uri::{generate_uri, parse_track_uri, ROOT_URI, URI_SCHEMES};
