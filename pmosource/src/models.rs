//! Records exchanged between a library backend and the host player

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Kind of a [`Ref`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefKind {
    Directory,
    Track,
}

/// A browsable reference: either a directory or a playable track
///
/// The `uri` is the only key the host ever hands back to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ref {
    pub uri: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: RefKind,
}

impl Ref {
    pub fn directory(uri: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            name: name.into(),
            kind: RefKind::Directory,
        }
    }

    pub fn track(uri: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            name: name.into(),
            kind: RefKind::Track,
        }
    }

    pub fn is_directory(&self) -> bool {
        self.kind == RefKind::Directory
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Artist {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Album {
    pub name: String,
    /// Cover image URLs (zero or one in practice)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
}

/// A playable track as handed to the host
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Track {
    pub uri: String,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<Artist>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<Album>,
    /// Duration in seconds
    #[serde(default)]
    pub length: u32,
    /// `YYYY-MM-DD`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default)]
    pub comment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_no: Option<u32>,
}

impl Track {
    /// Builds the host reference pointing at this track
    pub fn to_ref(&self) -> Ref {
        Ref::track(self.uri.clone(), self.name.clone())
    }

    /// First cover image, if any
    pub fn image(&self) -> Option<&str> {
        self.album
            .as_ref()
            .and_then(|album| album.images.first())
            .map(String::as_str)
    }
}

/// Result of a search, tagged with the URI describing the query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub uri: String,
    #[serde(default)]
    pub tracks: Vec<Track>,
}

/// Value(s) attached to one field of a structured query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryTerms {
    One(String),
    Many(Vec<String>),
}

impl QueryTerms {
    pub fn values(&self) -> Vec<&str> {
        match self {
            QueryTerms::One(value) => vec![value.as_str()],
            QueryTerms::Many(values) => values.iter().map(String::as_str).collect(),
        }
    }
}

/// Search query as sent by the host
///
/// The host may send a bare string, a list of terms, or a mapping of
/// field names (`any`, `artist`, `uri`, ...) to one or more values.
///
/// ```
/// use pmosource::SearchQuery;
///
/// let query: SearchQuery = serde_json::from_str(r#"{"any": ["jazz", "mix"]}"#).unwrap();
/// assert_eq!(query.flatten(), "jazz mix");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SearchQuery {
    Text(String),
    Terms(Vec<String>),
    Fields(IndexMap<String, QueryTerms>),
}

impl SearchQuery {
    /// Builds a single-field query
    pub fn field(name: impl Into<String>, value: impl Into<String>) -> Self {
        let mut fields = IndexMap::new();
        fields.insert(name.into(), QueryTerms::One(value.into()));
        SearchQuery::Fields(fields)
    }

    /// Collapses the query into one space separated string
    ///
    /// Field names are dropped; values keep their insertion order.
    pub fn flatten(&self) -> String {
        match self {
            SearchQuery::Text(text) => text.clone(),
            SearchQuery::Terms(terms) => terms.join(" "),
            SearchQuery::Fields(fields) => fields
                .values()
                .flat_map(QueryTerms::values)
                .collect::<Vec<_>>()
                .join(" "),
        }
    }

    /// Values of a named field, if the query is structured and has it
    pub fn values_of(&self, name: &str) -> Option<Vec<&str>> {
        match self {
            SearchQuery::Fields(fields) => fields.get(name).map(QueryTerms::values),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.flatten().trim().is_empty()
    }
}

impl From<&str> for SearchQuery {
    fn from(text: &str) -> Self {
        SearchQuery::Text(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_mapping_of_strings_and_lists() {
        let query: SearchQuery =
            serde_json::from_str(r#"{"artist": "Bonobo", "any": ["live", "set"]}"#).unwrap();
        assert_eq!(query.flatten(), "Bonobo live set");
    }

    #[test]
    fn test_flatten_single_field() {
        let query: SearchQuery = serde_json::from_str(r#"{"any": "jazz mix"}"#).unwrap();
        assert_eq!(query.flatten(), "jazz mix");
    }

    #[test]
    fn test_flatten_list_and_text() {
        let query: SearchQuery = serde_json::from_str(r#"["deep", "house"]"#).unwrap();
        assert_eq!(query.flatten(), "deep house");
        assert_eq!(SearchQuery::from("ambient").flatten(), "ambient");
    }

    #[test]
    fn test_values_of() {
        let query = SearchQuery::field("uri", "https://www.mixcloud.com/a/b/");
        assert_eq!(
            query.values_of("uri"),
            Some(vec!["https://www.mixcloud.com/a/b/"])
        );
        assert_eq!(query.values_of("any"), None);
        assert_eq!(SearchQuery::from("x").values_of("uri"), None);
    }

    #[test]
    fn test_empty_query() {
        assert!(SearchQuery::Terms(vec![]).is_empty());
        assert!(SearchQuery::from("   ").is_empty());
        assert!(!SearchQuery::from("a").is_empty());
    }

    #[test]
    fn test_track_image_and_ref() {
        let track = Track {
            uri: "mixcloud:song/a.1".into(),
            name: "A".into(),
            album: Some(Album {
                name: "Mixcloud".into(),
                images: vec!["http://img/1.jpg".into()],
            }),
            ..Default::default()
        };
        assert_eq!(track.image(), Some("http://img/1.jpg"));
        assert_eq!(track.to_ref(), Ref::track("mixcloud:song/a.1", "A"));
    }
}
