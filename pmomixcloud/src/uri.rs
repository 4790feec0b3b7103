//! Construction et analyse des URI `mixcloud:`
//!
//! Trois formes d'URI sont produites :
//!
//! - `mixcloud:directory[:<chemin encodé>]` pour les dossiers du VFS ;
//! - `mixcloud:song/<slug>.<id>` pour les pistes (URI synthétique) ;
//! - `mixcloud:search:<requête>` pour les résultats de recherche.
//!
//! L'id d'une URI synthétique ne contient jamais de `.`, ce qui permet à
//! [`parse_track_uri`] de le retrouver en coupant sur le dernier point.
//! Les clés de cloudcast (`/<user>/<slug>/`) sont encodées en pourcentage
//! pour respecter cette contrainte.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use pmosource::Track;
use unicode_normalization::UnicodeNormalization;

/// Schéma principal
pub const SCHEME: &str = "mixcloud";
/// Alias court du schéma
pub const SCHEME_ALIAS: &str = "mc";
/// Schémas gérés par le backend
pub const URI_SCHEMES: [&str; 2] = [SCHEME, SCHEME_ALIAS];

/// Nom de marque, utilisé comme nom d'album et de dossier racine
pub const BRAND: &str = "Mixcloud";

/// Dossier racine du VFS
pub const ROOT_URI: &str = "mixcloud:directory";

const SEARCH_PREFIX: &str = "mixcloud:search:";
const SONG_PREFIX: &str = "mixcloud:song/";

/// Caractères laissés tels quels dans un chemin de dossier
const PATH_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'/');

/// Translittère en ASCII (décomposition NFKD, diacritiques supprimés)
pub fn ascii_fold(text: &str) -> String {
    text.nfkd().filter(char::is_ascii).collect()
}

/// Forme ASCII encodée pour une URL (espaces en `+`)
pub fn safe_url(text: &str) -> String {
    url::form_urlencoded::byte_serialize(ascii_fold(text).as_bytes()).collect()
}

/// Forme ASCII lisible : lettres, chiffres et `-_.() `, espaces compactés
///
/// Les tabulations et retours à la ligne sont supprimés, pas convertis.
pub fn readable_url(text: &str) -> String {
    ascii_fold(text)
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || "-_.() ".contains(*c))
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// URI d'un dossier du VFS à partir de ses segments de chemin
///
/// ```
/// use pmomixcloud::uri::generate_uri;
///
/// assert_eq!(generate_uri(&["sets", "42"]), "mixcloud:directory:sets/42");
/// ```
pub fn generate_uri<S: AsRef<str>>(path: &[S]) -> String {
    let joined = path
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("/");
    format!("{}:{}", ROOT_URI, utf8_percent_encode(&joined, PATH_SET))
}

/// Inverse de [`generate_uri`]
///
/// Retourne les segments du chemin (vide pour la racine), ou `None` si
/// l'URI ne désigne pas un dossier.
pub fn parse_directory_uri(uri: &str) -> Option<Vec<String>> {
    let rest = strip_scheme(uri)?.strip_prefix("directory")?;
    if rest.is_empty() {
        return Some(Vec::new());
    }
    let encoded = rest.strip_prefix(':')?;
    let decoded = percent_decode_str(encoded).decode_utf8().ok()?;
    Some(
        decoded
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect(),
    )
}

/// URI synthétique d'une piste
pub fn song_uri(title: &str, id: &str) -> String {
    format!("{}{}.{}", SONG_PREFIX, readable_url(title), id)
}

/// URI d'un résultat de recherche
pub fn search_uri(query: &str) -> String {
    format!("{}{}", SEARCH_PREFIX, safe_url(query))
}

/// Encode une clé de cloudcast en id sans `.` ni `/`
pub fn encode_cloudcast_key(key: &str) -> String {
    utf8_percent_encode(key, NON_ALPHANUMERIC).to_string()
}

/// Décode un id extrait d'une URI synthétique
///
/// Les ids numériques traversent sans changement ; les clés de cloudcast
/// retrouvent leur forme `/<user>/<slug>/`.
pub fn decode_track_id(id: &str) -> String {
    percent_decode_str(id).decode_utf8_lossy().into_owned()
}

/// Retire le préfixe `mixcloud:` ou `mc:`
pub fn strip_scheme(uri: &str) -> Option<&str> {
    URI_SCHEMES
        .iter()
        .find_map(|scheme| uri.strip_prefix(*scheme)?.strip_prefix(':'))
}

/// Tout ce qui porte une URI de piste
pub trait TrackUri {
    fn track_uri(&self) -> &str;
}

impl TrackUri for str {
    fn track_uri(&self) -> &str {
        self
    }
}

impl TrackUri for String {
    fn track_uri(&self) -> &str {
        self
    }
}

impl TrackUri for Track {
    fn track_uri(&self) -> &str {
        &self.uri
    }
}

/// Extrait l'id placé après le dernier `.` d'une URI de piste
///
/// Retourne `None` si l'URI ne contient pas de `.` ou si l'id est vide.
pub fn parse_track_uri<T: TrackUri + ?Sized>(track: &T) -> Option<&str> {
    match track.track_uri().rsplit_once('.') {
        Some((_, id)) if !id.is_empty() => Some(id),
        _ => None,
    }
}
