//! Gestion des erreurs pour le client Mixcloud

use thiserror::Error;

/// Type Result personnalisé pour pmomixcloud
pub type Result<T> = std::result::Result<T, MixcloudError>;

/// Erreurs possibles lors de l'utilisation du client Mixcloud
#[derive(Error, Debug)]
pub enum MixcloudError {
    /// Accès refusé (token OAuth absent ou invalide)
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// Ressource non trouvée (cloudcast, playlist, utilisateur...)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Erreur HTTP
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Erreur de parsing JSON
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// URL invalide (base d'API mal configurée, lien externe...)
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Erreur de configuration (anyhow)
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),

    /// Erreur de configuration Mixcloud (client_id, bases d'API...)
    #[error("Mixcloud configuration error: {0}")]
    Configuration(String),

    /// Erreur renvoyée par l'API Mixcloud
    #[error("Mixcloud API error (code {code}): {message}")]
    ApiError { code: u16, message: String },

    /// Quota dépassé (rate limiting)
    #[error("Rate limit exceeded, please try again later")]
    RateLimitExceeded,

    /// Délai dépassé pour une unité de travail
    #[error("Operation timed out: {0}")]
    Timeout(String),
}

impl MixcloudError {
    /// Crée une erreur API depuis un code de statut HTTP et un message
    pub fn from_status_code(code: u16, message: impl Into<String>) -> Self {
        match code {
            401 | 403 => Self::Unauthorized(message.into()),
            404 => Self::NotFound(message.into()),
            429 => Self::RateLimitExceeded,
            _ => Self::ApiError {
                code,
                message: message.into(),
            },
        }
    }

    /// Vérifie si l'erreur est une ressource absente
    pub fn is_not_found(&self) -> bool {
        matches!(self, MixcloudError::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_code() {
        assert!(matches!(
            MixcloudError::from_status_code(401, "no"),
            MixcloudError::Unauthorized(_)
        ));
        assert!(matches!(
            MixcloudError::from_status_code(403, "no"),
            MixcloudError::Unauthorized(_)
        ));
        assert!(MixcloudError::from_status_code(404, "gone").is_not_found());
        assert!(matches!(
            MixcloudError::from_status_code(429, "slow"),
            MixcloudError::RateLimitExceeded
        ));
        assert!(matches!(
            MixcloudError::from_status_code(500, "boom"),
            MixcloudError::ApiError { code: 500, .. }
        ));
    }

    #[test]
    fn test_timeout_message() {
        let err = MixcloudError::Timeout("track 1 after 15s".into());
        assert_eq!(err.to_string(), "Operation timed out: track 1 after 15s");
    }
}
