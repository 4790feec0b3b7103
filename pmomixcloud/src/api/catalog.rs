//! Module d'accès au catalogue Mixcloud (flux, playlists, abonnements,
//! explore, groupes, likes, recherche, pistes)
//!
//! Ces appels retournent les réponses brutes ; le décodage en pistes est
//! fait par le client haut-niveau.

use super::{path_segment, Endpoint, MixcloudApi};
use crate::error::Result;
use crate::models::{ExplorePage, RawPlaylist};
use serde_json::Value;

impl MixcloudApi {
    /// Flux d'un utilisateur (endpoint non documenté)
    pub async fn feed(&self, user: &str) -> Result<Value> {
        self.get(&format!("{}/feed/", path_segment(user)?), Endpoint::Api, &[]).await
    }

    /// Playlists de l'utilisateur courant
    pub async fn my_playlists(&self) -> Result<Value> {
        self.get("me/playlists.json", Endpoint::Api, &[("limit", "1000")])
            .await
    }

    pub async fn playlist(&self, set_id: &str) -> Result<RawPlaylist> {
        self.get(&format!("playlists/{}.json", path_segment(set_id)?), Endpoint::Api, &[])
            .await
    }

    /// Utilisateurs suivis par l'utilisateur courant
    pub async fn my_followings(&self) -> Result<Value> {
        self.get("me/followings.json", Endpoint::Api, &[("limit", "60")])
            .await
    }

    pub async fn user_tracks(&self, user_id: &str) -> Result<Value> {
        self.get(&format!("users/{}/tracks.json", path_segment(user_id)?), Endpoint::Api, &[])
            .await
    }

    /// Catégories musicales de la page explore (`music`)
    pub async fn explore_categories(&self) -> Result<Value> {
        let mut categories: Value = self
            .get("explore/categories", Endpoint::ApiV2, &[])
            .await?;
        Ok(categories
            .get_mut("music")
            .map(Value::take)
            .unwrap_or(Value::Null))
    }

    /// Première page d'une catégorie explore
    pub async fn explore_page(&self, urn: &str, limit: usize) -> Result<ExplorePage> {
        let limit = limit.to_string();
        self.get(
            &format!("explore/{}", path_segment(urn)?),
            Endpoint::ApiV2,
            &[
                ("limit", limit.as_str()),
                ("offset", "0"),
                ("linked_partitioning", "1"),
            ],
        )
        .await
    }

    pub async fn my_groups(&self) -> Result<Value> {
        self.get("me/groups.json", Endpoint::Api, &[]).await
    }

    pub async fn group_tracks(&self, group_id: u64) -> Result<Value> {
        self.get(&format!("groups/{}/tracks.json", group_id), Endpoint::Api, &[])
            .await
    }

    /// Likes de l'utilisateur courant (endpoint non documenté)
    pub async fn my_likes(&self) -> Result<Value> {
        self.get("e1/me/likes.json", Endpoint::Api, &[("limit", "1000")])
            .await
    }

    /// Recherche textuelle, triée par popularité et limitée aux pistes jouables
    pub async fn search_tracks(&self, query: &str, limit: usize) -> Result<Value> {
        let limit = limit.to_string();
        self.get(
            "tracks.json",
            Endpoint::Api,
            &[
                ("q", query),
                ("filter", "streamable"),
                ("order", "hotness"),
                ("limit", limit.as_str()),
            ],
        )
        .await
    }

    /// Résout une URL publique Mixcloud en ressource API
    pub async fn resolve(&self, url: &str) -> Result<Value> {
        self.get("resolve.json", Endpoint::Api, &[("url", url)]).await
    }

    pub async fn track(&self, track_id: &str) -> Result<Value> {
        self.get(&format!("tracks/{}.json", path_segment(track_id)?), Endpoint::Api, &[])
            .await
    }

    /// Cloudcast désigné par sa clé (`/<user>/<slug>/`)
    pub async fn cloudcast(&self, key: &str) -> Result<Value> {
        let path = key
            .split('/')
            .map(|segment| match segment {
                "" => Ok(String::new()),
                _ => path_segment(segment),
            })
            .collect::<Result<Vec<_>>>()?
            .join("/");
        self.get(&path, Endpoint::Api, &[]).await
    }
}
