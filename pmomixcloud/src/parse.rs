//! Conversion des enregistrements bruts en pistes pour l'hôte
//!
//! Deux formats coexistent dans l'API :
//!
//! - les pistes (`tracks/<id>.json`, recherche, likes, groupes), décodées
//!   par [`parse_track`] ;
//! - les cloudcasts (flux, clés `/<user>/<slug>/`), décodés par
//!   [`parse_cloudcast`].

use crate::api::MixcloudApi;
use crate::models::{RawTrack, Track};
use crate::uri::{encode_cloudcast_key, song_uri, BRAND};
use chrono::NaiveDate;
use pmosource::{Album, Artist};
use tracing::{debug, warn};

/// Taille d'image utilisée par défaut pour les cloudcasts
pub const DEFAULT_THUMB_SIZE: &str = "small";

/// Écarte les entrées absentes en conservant l'ordre des autres
pub fn sanitize<T, I>(items: I) -> Vec<T>
where
    I: IntoIterator<Item = Option<T>>,
{
    items.into_iter().flatten().collect()
}

/// Ramène une date (`2019-05-04T10:00:00Z`, `2019-05-04`...) à `YYYY-MM-DD`
pub fn normalize_date(raw: &str) -> Option<String> {
    let day = raw.trim().get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .ok()
        .map(|date| date.format("%Y-%m-%d").to_string())
}

fn album(images: Option<&str>) -> Album {
    Album {
        name: BRAND.to_string(),
        images: images.map(str::to_string).into_iter().collect(),
    }
}

fn seconds(value: Option<f64>) -> u32 {
    value
        .filter(|v| v.is_finite() && *v > 0.0)
        .map(|v| v.min(u32::MAX as f64) as u32)
        .unwrap_or(0)
}

fn genre(raw: &RawTrack) -> Option<String> {
    let tags = raw
        .tags
        .iter()
        .flatten()
        .filter_map(|tag| tag.name.as_deref())
        .filter(|name| !name.is_empty())
        .collect::<Vec<_>>();
    (!tags.is_empty()).then(|| tags.join(", "))
}

/// Construit une piste depuis un enregistrement `tracks/<id>.json`
///
/// Avec `streamable`, l'URI de la piste est l'URL de stream directe
/// (avec `client_id`) ; sans URL de stream la piste est écartée. Sinon
/// l'URI est la forme synthétique `mixcloud:song/<slug>.<id>`.
pub fn parse_track(raw: Option<&RawTrack>, streamable: bool, api: &MixcloudApi) -> Option<Track> {
    let raw = raw?;
    let name = raw
        .title
        .clone()
        .or_else(|| raw.name.clone())
        .unwrap_or_default();

    let uri = if streamable {
        match raw.stream_url.as_deref() {
            Some(stream_url) => api.streamable_url(stream_url),
            None => {
                debug!("Track {:?} has no stream url", raw.id);
                return None;
            }
        }
    } else {
        match raw.id.as_deref() {
            Some(id) => song_uri(&name, id),
            None => {
                debug!("Track {:?} has no id", name);
                return None;
            }
        }
    };

    let artist = raw
        .label_name
        .as_deref()
        .or_else(|| raw.user.as_ref().and_then(|user| user.display_name()));

    let image = raw
        .artwork_url
        .as_deref()
        .or_else(|| raw.user.as_ref().and_then(|user| user.avatar_url.as_deref()));

    let date = [&raw.created_at, &raw.date, &raw.created_time]
        .into_iter()
        .flatten()
        .find_map(|value| normalize_date(value));

    Some(Track {
        uri,
        name,
        artists: artist
            .map(|name| Artist {
                name: name.to_string(),
            })
            .into_iter()
            .collect(),
        album: Some(album(image)),
        length: seconds(raw.duration.or(raw.audio_length)),
        date,
        comment: raw
            .permalink_url
            .clone()
            .or_else(|| raw.url.clone())
            .unwrap_or_default(),
        genre: genre(raw),
        track_no: None,
    })
}

/// Construit une piste depuis un cloudcast du flux
///
/// `index` est la position (à partir de 1) dans le listing ; 0 signifie
/// « hors listing ». Un cloudcast sans nom est écarté.
pub fn parse_cloudcast(index: u32, raw: &RawTrack, thumb_size: &str) -> Option<Track> {
    let name = match raw.name.as_deref().or(raw.title.as_deref()) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => {
            warn!("name not found in track {}", index);
            return None;
        }
    };
    debug!("parsing track {}", name);

    let id = match (raw.key.as_deref(), raw.id.as_deref()) {
        (Some(key), _) => encode_cloudcast_key(key),
        (None, Some(id)) => id.to_string(),
        (None, None) => {
            warn!("cloudcast {} has neither key nor id", name);
            return None;
        }
    };

    let artist = raw
        .user
        .as_ref()
        .and_then(|user| user.name.as_deref().or(user.username.as_deref()));

    let comment = raw
        .description
        .as_deref()
        .map(|text| text.chars().filter(char::is_ascii).collect::<String>())
        .filter(|text| !text.trim().is_empty())
        .or_else(|| raw.url.clone())
        .unwrap_or_default();

    Some(Track {
        uri: song_uri(&name, &id),
        name,
        artists: artist
            .map(|name| Artist {
                name: name.to_string(),
            })
            .into_iter()
            .collect(),
        album: Some(album(raw.picture(thumb_size))),
        length: seconds(raw.audio_length.or(raw.duration)),
        date: raw.created_time.as_deref().and_then(normalize_date),
        comment,
        genre: genre(raw),
        track_no: (index > 0).then_some(index),
    })
}
