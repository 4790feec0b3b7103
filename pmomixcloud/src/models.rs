//! Modèles de données pour l'API Mixcloud
//!
//! Les réponses de l'API sont décodées en deux temps :
//! - des enregistrements `Raw*` dont tous les champs sont optionnels
//!   (un champ absent, nul ou mal typé devient `None`) ;
//! - des types publics (`Set`, `FollowedUser`, `Group`, `LikedItem`...)
//!   construits à partir de ces enregistrements.
//!
//! Les listes sont décodées élément par élément : une entrée invalide est
//! écartée sans faire échouer le listing complet.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

pub use pmosource::Track;

/// Désérialise un ID qui peut être soit un string soit un nombre
fn deserialize_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(id_from_value(&Value::deserialize(deserializer)?))
}

/// Champ texte tolérant : les nombres sont convertis, le reste ignoré
fn deserialize_lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Champ numérique tolérant : entier, flottant ou chaîne numérique
fn deserialize_lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Sous-objet tolérant : une valeur mal formée devient `None`
fn deserialize_lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(serde_json::from_value(Value::deserialize(deserializer)?).ok())
}

/// Extrait un identifiant d'une valeur JSON quelconque
pub(crate) fn id_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => match (n.as_u64(), n.as_i64(), n.as_f64()) {
            (Some(u), _, _) => Some(u.to_string()),
            (_, Some(i), _) => Some(i.to_string()),
            (_, _, Some(f)) if f.fract() == 0.0 => Some(format!("{}", f as i64)),
            _ => None,
        },
        _ => None,
    }
}

/// Extrait les éléments d'un listing
///
/// L'API renvoie selon les endpoints un tableau nu ou un objet paginé
/// (`{"data": [...]}` ou `{"collection": [...]}`).
pub(crate) fn list_items(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Object(mut map) => ["data", "collection"]
            .iter()
            .find_map(|key| match map.remove(*key) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            })
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// Décode chaque élément d'un listing, en écartant ceux qui échouent
pub(crate) fn decode_items<T: DeserializeOwned>(value: Value) -> Vec<Option<T>> {
    list_items(value)
        .into_iter()
        .map(|item| {
            serde_json::from_value(item)
                .map_err(|e| debug!("Skipping malformed entry: {}", e))
                .ok()
        })
        .collect()
}

/// Utilisateur Mixcloud (uploader, abonnement...)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawUser {
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub key: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub avatar_url: Option<String>,
}

impl RawUser {
    /// Nom affichable : `username`, sinon `name`
    pub fn display_name(&self) -> Option<&str> {
        self.username.as_deref().or(self.name.as_deref())
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawTag {
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub name: Option<String>,
}

/// Enregistrement de piste ou de cloudcast tel que renvoyé par l'API
///
/// Les pistes (`tracks/<id>.json`, recherche, likes) et les cloudcasts
/// (flux, clés `/<user>/<slug>/`) partagent ce même enregistrement ;
/// chacun n'utilise qu'une partie des champs.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawTrack {
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub key: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub label_name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_number")]
    pub duration: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_lenient_number")]
    pub audio_length: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub created_time: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub permalink_url: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub stream_url: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub artwork_url: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub user: Option<RawUser>,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub pictures: Option<HashMap<String, Value>>,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub tags: Option<Vec<RawTag>>,
}

impl RawTrack {
    /// Décode une valeur JSON ; `null` et les valeurs non-objets donnent `None`
    pub fn from_value(value: Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        serde_json::from_value(value)
            .map_err(|e| debug!("Malformed track record: {}", e))
            .ok()
    }

    /// URL de l'image au format demandé (`small`, `medium`, ...)
    pub fn picture(&self, size: &str) -> Option<&str> {
        self.pictures
            .as_ref()
            .and_then(|pictures| pictures.get(size))
            .and_then(Value::as_str)
            .filter(|url| !url.is_empty())
    }
}

/// Playlist de l'utilisateur (« set »)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawPlaylist {
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub tracks: Option<Vec<Value>>,
}

impl RawPlaylist {
    pub fn display_name(&self) -> Option<&str> {
        self.title.as_deref().or(self.name.as_deref())
    }
}

/// Groupe dont l'utilisateur est membre
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawGroup {
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub title: Option<String>,
}

/// Entrée du listing (non documenté) des likes
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawLike {
    #[serde(default)]
    pub track: Option<Value>,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub playlist: Option<RawPlaylist>,
}

/// Page du flux (non documenté) : `data[*].cloudcasts[*]`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FeedEntry {
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub cloudcasts: Option<Vec<Value>>,
}

/// Page d'une catégorie explore (`api-v2`) : `tracks[*].id`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ExplorePage {
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub tracks: Option<Vec<Value>>,
}

impl ExplorePage {
    pub fn track_ids(&self) -> Vec<String> {
        self.tracks
            .iter()
            .flatten()
            .filter_map(|track| track.get("id").and_then(id_from_value))
            .collect()
    }
}

/// Catégorie de la page explore
///
/// L'API renvoie soit des URN nues, soit des objets `{urn, title}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExploreCategory {
    pub urn: String,
    pub title: String,
}

impl ExploreCategory {
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(urn) if !urn.is_empty() => Some(Self {
                urn: urn.clone(),
                title: title_from_urn(urn),
            }),
            Value::Object(map) => {
                let urn = map
                    .get("urn")
                    .or_else(|| map.get("slug"))
                    .and_then(Value::as_str)
                    .filter(|urn| !urn.is_empty())?
                    .to_string();
                let title = map
                    .get("title")
                    .or_else(|| map.get("name"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| title_from_urn(&urn));
                Some(Self { urn, title })
            }
            _ => None,
        }
    }
}

/// `urn:category:deep-house` → `Deep House`
fn title_from_urn(urn: &str) -> String {
    urn.rsplit(':')
        .next()
        .unwrap_or(urn)
        .split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Playlist de l'utilisateur avec ses pistes décodées
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Set {
    pub name: String,
    pub id: String,
    pub tracks: Vec<Track>,
}

/// Utilisateur suivi
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowedUser {
    pub name: String,
    pub id: String,
}

/// Groupe de l'utilisateur
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub name: String,
    pub id: String,
}

/// Élément aimé : une piste ou une playlist
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LikedItem {
    Track(Track),
    Playlist { title: String, id: String },
}
