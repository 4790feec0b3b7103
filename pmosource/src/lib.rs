//! # PMOSource
//!
//! Common traits and types for PMOMusic library backends.
//!
//! A backend exposes a remote catalog to the host player through two
//! providers:
//!
//! - a [`LibraryProvider`] that turns URIs into listings (`browse`),
//!   tracks (`lookup`) and search results (`search`);
//! - a [`PlaybackProvider`] that turns a playable URI into a URL the
//!   host can fetch directly (`translate_uri`).
//!
//! Both are reached through the [`Backend`] trait, which also declares the
//! URI schemes the backend answers to.
//!
//! ## Failure model
//!
//! The host never sees an error from a provider call: browse/lookup return
//! empty lists and search/translate return `None` when something went wrong.
//! Backends are expected to log the underlying failure themselves.
//! [`MusicSourceError`] is only used while building or registering a backend.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let backend: Arc<dyn Backend> = Arc::new(MixcloudBackend::from_config()?);
//! let root = backend.library().root_directory();
//! for child in backend.library().browse(&root.uri).await {
//!     println!("{} -> {}", child.name, child.uri);
//! }
//! ```

mod models;

pub use models::{Album, Artist, QueryTerms, Ref, RefKind, SearchQuery, SearchResult, Track};

use std::fmt::Debug;

/// Error types for backend construction and registration
#[derive(Debug, thiserror::Error)]
pub enum MusicSourceError {
    #[error("Source disabled: {0}")]
    SourceDisabled(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("URI scheme not handled: {0}")]
    UnknownScheme(String),
}

/// Result type for music source operations
pub type Result<T> = std::result::Result<T, MusicSourceError>;

/// Browsing, lookup and search over a backend's catalog
#[async_trait::async_trait]
pub trait LibraryProvider: Debug + Send + Sync {
    /// Well-known root directory of the backend
    fn root_directory(&self) -> Ref;

    /// Lists the children of a directory URI
    ///
    /// Unknown URIs and remote failures yield an empty list.
    async fn browse(&self, uri: &str) -> Vec<Ref>;

    /// Resolves a playable URI into zero or more tracks
    async fn lookup(&self, uri: &str) -> Vec<Track>;

    /// Searches the catalog
    ///
    /// `uris` restricts the search to the given URI roots when present.
    /// Returns `None` when the backend has nothing to say for this query.
    async fn search(
        &self,
        query: &SearchQuery,
        uris: Option<&[String]>,
        exact: bool,
    ) -> Option<SearchResult>;
}

/// Translation of playable URIs into directly fetchable stream URLs
#[async_trait::async_trait]
pub trait PlaybackProvider: Debug + Send + Sync {
    /// Returns the stream URL, or `None` when the URI is unplayable
    async fn translate_uri(&self, uri: &str) -> Option<String>;
}

/// A library backend plugged into the host
pub trait Backend: Debug + Send + Sync {
    /// Human-readable backend name
    fn name(&self) -> &str;

    /// URI schemes owned by this backend (without the trailing `:`)
    fn uri_schemes(&self) -> &[&'static str];

    fn library(&self) -> &dyn LibraryProvider;

    fn playback(&self) -> &dyn PlaybackProvider;

    /// Returns true if the URI belongs to one of this backend's schemes
    fn handles(&self, uri: &str) -> bool {
        let scheme = uri.split_once(':').map_or(uri, |(scheme, _)| scheme);
        self.uri_schemes().iter().any(|known| *known == scheme)
    }

    /// Ensures the URI belongs to this backend before dispatching it
    fn check_scheme(&self, uri: &str) -> Result<()> {
        if self.handles(uri) {
            Ok(())
        } else {
            Err(MusicSourceError::UnknownScheme(uri.to_string()))
        }
    }
}

pub use async_trait::async_trait;

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct EchoLibrary;

    #[async_trait]
    impl LibraryProvider for EchoLibrary {
        fn root_directory(&self) -> Ref {
            Ref::directory("echo:directory", "Echo")
        }

        async fn browse(&self, uri: &str) -> Vec<Ref> {
            if uri == "echo:directory" {
                vec![Ref::track("echo:song/1", "One")]
            } else {
                vec![]
            }
        }

        async fn lookup(&self, uri: &str) -> Vec<Track> {
            vec![Track {
                uri: uri.to_string(),
                name: "One".into(),
                ..Default::default()
            }]
        }

        async fn search(
            &self,
            query: &SearchQuery,
            _uris: Option<&[String]>,
            _exact: bool,
        ) -> Option<SearchResult> {
            Some(SearchResult {
                uri: format!("echo:search:{}", query.flatten()),
                tracks: vec![],
            })
        }
    }

    #[derive(Debug)]
    struct EchoPlayback;

    #[async_trait]
    impl PlaybackProvider for EchoPlayback {
        async fn translate_uri(&self, uri: &str) -> Option<String> {
            uri.strip_prefix("echo:").map(str::to_string)
        }
    }

    #[derive(Debug)]
    struct EchoBackend {
        library: EchoLibrary,
        playback: EchoPlayback,
    }

    impl Backend for EchoBackend {
        fn name(&self) -> &str {
            "echo"
        }

        fn uri_schemes(&self) -> &[&'static str] {
            &["echo", "e"]
        }

        fn library(&self) -> &dyn LibraryProvider {
            &self.library
        }

        fn playback(&self) -> &dyn PlaybackProvider {
            &self.playback
        }
    }

    fn backend() -> EchoBackend {
        EchoBackend {
            library: EchoLibrary,
            playback: EchoPlayback,
        }
    }

    #[test]
    fn test_handles_schemes_and_aliases() {
        let backend = backend();
        assert!(backend.handles("echo:song/1"));
        assert!(backend.handles("e:song/1"));
        assert!(backend.handles("echo"));
        assert!(!backend.handles("other:song/1"));
        assert!(matches!(
            backend.check_scheme("file:///x"),
            Err(MusicSourceError::UnknownScheme(_))
        ));
    }

    #[tokio::test]
    async fn test_providers_through_trait_objects() {
        let backend = backend();
        let root = backend.library().root_directory();
        assert!(root.is_directory());

        let children = backend.library().browse(&root.uri).await;
        assert_eq!(children, vec![Ref::track("echo:song/1", "One")]);
        assert!(backend.library().browse("echo:nowhere").await.is_empty());

        let result = backend
            .library()
            .search(&SearchQuery::from("a b"), None, false)
            .await
            .unwrap();
        assert_eq!(result.uri, "echo:search:a b");

        assert_eq!(
            backend.playback().translate_uri("echo:http://x").await,
            Some("http://x".to_string())
        );
    }
}
