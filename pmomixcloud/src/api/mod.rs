//! Couche d'accès à l'API REST Mixcloud
//!
//! Ce module fournit une interface bas-niveau pour communiquer avec les
//! deux familles d'endpoints Mixcloud (`api` et `api-v2`). Toutes les
//! requêtes sont des GET et portent le paramètre `client_id`.

pub mod catalog;

use crate::error::{MixcloudError, Result};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::{redirect, Client, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// URL de base de l'API Mixcloud
pub const DEFAULT_API_BASE: &str = "https://api.mixcloud.com";
/// URL de base de l'API Mixcloud v2 (explore)
pub const DEFAULT_API_V2_BASE: &str = "https://api-v2.mixcloud.com";
/// Client ID Mixcloud par défaut
pub const DEFAULT_CLIENT_ID: &str = "Vef7HWkSjCzEFvdhet";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Caractères encodés dans un segment de chemin
const SEGMENT_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'`')
    .add(b'{')
    .add(b'}');
const USER_AGENT: &str = concat!("pmomixcloud/", env!("CARGO_PKG_VERSION"));

/// Famille d'endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Api,
    ApiV2,
}

/// Client API bas-niveau pour communiquer avec Mixcloud
#[derive(Debug, Clone)]
pub struct MixcloudApi {
    /// Client HTTP
    client: Client,
    /// Client HTTP sans suivi des redirections (sondes de streaming)
    probe_client: Client,
    api_base: String,
    api_v2_base: String,
    client_id: String,
    /// Token OAuth statique optionnel
    auth_token: Option<String>,
}

impl MixcloudApi {
    /// Crée une instance avec les URLs et le timeout par défaut
    pub fn new(client_id: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;
        Self::with_client(
            client,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            DEFAULT_API_BASE,
            DEFAULT_API_V2_BASE,
            client_id,
        )
    }

    /// Crée une instance autour d'un client HTTP existant
    pub fn with_client(
        client: Client,
        probe_timeout: Duration,
        api_base: impl Into<String>,
        api_v2_base: impl Into<String>,
        client_id: impl Into<String>,
    ) -> Result<Self> {
        let api_base = normalize_base(api_base.into())?;
        let api_v2_base = normalize_base(api_v2_base.into())?;

        let probe_client = Client::builder()
            .redirect(redirect::Policy::none())
            .timeout(probe_timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            probe_client,
            api_base,
            api_v2_base,
            client_id: client_id.into(),
            auth_token: None,
        })
    }

    /// Définit le token d'authentification
    pub fn set_auth_token(&mut self, token: Option<String>) {
        self.auth_token = token.filter(|t| !t.is_empty());
    }

    pub fn auth_token(&self) -> Option<&str> {
        self.auth_token.as_deref()
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub fn api_v2_base(&self) -> &str {
        &self.api_v2_base
    }

    fn base(&self, endpoint: Endpoint) -> &str {
        match endpoint {
            Endpoint::Api => &self.api_base,
            Endpoint::ApiV2 => &self.api_v2_base,
        }
    }

    /// Construit l'URL complète d'une requête, `client_id` compris
    pub(crate) fn url(&self, path: &str, endpoint: Endpoint, params: &[(&str, &str)]) -> Result<Url> {
        let mut url = Url::parse(&format!(
            "{}/{}",
            self.base(endpoint),
            path.trim_start_matches('/')
        ))?;
        url.query_pairs_mut()
            .extend_pairs(params)
            .append_pair("client_id", &self.client_id);
        Ok(url)
    }

    /// Effectue une requête GET à l'API
    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        endpoint: Endpoint,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let url = self.url(path, endpoint, params)?;
        debug!("GET {}", url);

        let mut request = self.client.get(url);
        if let Some(ref token) = self.auth_token {
            request = request.header("Authorization", format!("OAuth {}", token));
        }

        let response = request.send().await?;
        self.handle_response(response).await
    }

    /// Ajoute `client_id` à une URL de stream (sans le dupliquer)
    pub fn streamable_url(&self, url: &str) -> String {
        match Url::parse(url) {
            Ok(mut parsed) => {
                if !parsed.query_pairs().any(|(key, _)| key == "client_id") {
                    parsed
                        .query_pairs_mut()
                        .append_pair("client_id", &self.client_id);
                }
                parsed.to_string()
            }
            Err(_) => {
                let separator = if url.contains('?') { '&' } else { '?' };
                format!("{}{}client_id={}", url, separator, self.client_id)
            }
        }
    }

    /// Envoie un HEAD sans suivre les redirections et retourne le statut
    pub(crate) async fn head_status(&self, url: &str) -> Result<u16> {
        debug!("HEAD {}", url);
        let response = self.probe_client.head(url).send().await?;
        Ok(response.status().as_u16())
    }

    /// Traite la réponse HTTP
    async fn handle_response<T: DeserializeOwned>(&self, response: Response) -> Result<T> {
        let status = response.status();
        let status_code = status.as_u16();

        debug!("Response status: {}", status);

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!("API error ({}): {}", status_code, error_text);
            let message = error_message(&error_text).unwrap_or(error_text);
            return Err(MixcloudError::from_status_code(status_code, message));
        }

        let text = response.text().await?;

        // Mixcloud signale parfois une erreur dans un corps 200
        if let Ok(json) = serde_json::from_str::<Value>(&text) {
            if json.get("error").is_some_and(Value::is_object) {
                let message = error_message(&text).unwrap_or_else(|| "Unknown error".into());
                warn!("Mixcloud API error: {}", message);
                return Err(MixcloudError::ApiError {
                    code: status_code,
                    message,
                });
            }
        }

        serde_json::from_str(&text).map_err(|e| {
            warn!("Failed to parse response: {}", e);
            MixcloudError::JsonParse(e)
        })
    }
}

/// Encode un identifiant pour l'insérer comme un seul segment de chemin
///
/// `.` et `..` sont refusés : ils seraient normalisés par l'URL, même encodés.
pub(crate) fn path_segment(id: &str) -> Result<String> {
    match id {
        "." | ".." => Err(MixcloudError::NotFound(format!("invalid id {:?}", id))),
        _ => Ok(utf8_percent_encode(id, SEGMENT_SET).to_string()),
    }
}

/// Valide une URL de base et retire le `/` final
fn normalize_base(base: String) -> Result<String> {
    Url::parse(&base)?;
    Ok(base.trim_end_matches('/').to_string())
}

/// Extrait `error.message` d'un corps d'erreur Mixcloud
fn error_message(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;
    let error = json.get("error")?;
    error
        .get("message")
        .or_else(|| error.get("type"))
        .and_then(Value::as_str)
        .map(str::to_string)
}
