use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};
use watch_log_config::{CredentialStore, TmdbConfig};
use watch_log_models::{Candidate, CandidateDetails, MediaKind};
use crate::error::{SourceError, SourceResult};
use crate::tmdb::api::{
    TmdbErrorBody, TmdbGenreList, TmdbListEntry, TmdbMovieDetails, TmdbPage, TmdbTvDetails,
};
use crate::traits::MetadataApi;

/// How requests are authorized against TMDB
#[derive(Clone)]
pub enum TmdbAuth {
    /// v3 API key, sent as the `api_key` query parameter
    ApiKey(String),
    /// v4 read access token, sent as a bearer token
    Bearer(String),
}

impl TmdbAuth {
    /// Prefer the read token when both are stored
    pub fn from_credentials(credentials: &CredentialStore) -> Option<Self> {
        if let Some(token) = credentials.get_tmdb_read_token().filter(|t| !t.is_empty()) {
            return Some(TmdbAuth::Bearer(token.clone()));
        }
        credentials
            .get_tmdb_api_key()
            .filter(|k| !k.is_empty())
            .map(|k| TmdbAuth::ApiKey(k.clone()))
    }
}

#[derive(Clone)]
pub struct TmdbClient {
    client: Arc<Client>,
    base_url: String,
    image_base_url: String,
    auth: TmdbAuth,
    language: String,
    region: Option<String>,
}

impl TmdbClient {
    pub fn new(config: &TmdbConfig, auth: TmdbAuth) -> Self {
        Self {
            client: Arc::new(Client::new()),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            image_base_url: config.image_base_url.trim_end_matches('/').to_string(),
            auth,
            language: config.language.clone(),
            region: config.region.clone(),
        }
    }

    /// Full URL of a poster image
    pub fn image_url(&self, poster_path: &str) -> String {
        format!("{}/{}", self.image_base_url, poster_path.trim_start_matches('/'))
    }

    /// Check that the stored credentials are accepted
    pub async fn verify(&self) -> SourceResult<()> {
        let _: serde_json::Value = self.get_json("configuration", &[]).await?;
        Ok(())
    }

    fn kind_segment(kind: Option<MediaKind>) -> &'static str {
        match kind {
            Some(MediaKind::Movie) => "movie",
            Some(MediaKind::Tv) => "tv",
            None => "all",
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, params: &[(&str, String)]) -> SourceResult<T> {
        self.get_url(format!("{}/{}", self.base_url, path), params).await
    }

    async fn get_url<T: DeserializeOwned>(&self, url: String, params: &[(&str, String)]) -> SourceResult<T> {
        debug!("TMDB GET {}", url);
        let mut request = self
            .client
            .get(&url)
            .query(&[("language", self.language.as_str())])
            .query(params);

        if let Some(ref region) = self.region {
            request = request.query(&[("region", region.as_str())]);
        }

        request = match &self.auth {
            TmdbAuth::ApiKey(key) => request.query(&[("api_key", key.as_str())]),
            TmdbAuth::Bearer(token) => request.bearer_auth(token),
        };

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<TmdbErrorBody>(&body)
                .ok()
                .and_then(|b| b.status_message)
                .unwrap_or(body);
            warn!("TMDB request failed ({}): {}", status, message);
            return Err(match status.as_u16() {
                401 => SourceError::Unauthenticated(message),
                code => SourceError::Api { status: code, message },
            });
        }

        Ok(response.json::<T>().await?)
    }

    fn collect_candidates(page: TmdbPage<TmdbListEntry>, kind: Option<MediaKind>) -> Vec<Candidate> {
        page.results
            .into_iter()
            .filter_map(|entry| entry.into_candidate(kind))
            .collect()
    }
}

#[async_trait]
impl MetadataApi for TmdbClient {
    fn source_name(&self) -> &str {
        "tmdb"
    }

    async fn search(&self, query: &str, kind: Option<MediaKind>) -> SourceResult<Vec<Candidate>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let endpoint = match kind {
            Some(k) => k.as_str(),
            None => "multi",
        };
        let url = format!(
            "{}/search/{}?query={}",
            self.base_url,
            endpoint,
            urlencoding::encode(query)
        );
        let page: TmdbPage<TmdbListEntry> = self.get_url(url, &[("include_adult", "false".to_string())]).await?;
        let candidates = Self::collect_candidates(page, kind);
        debug!("TMDB search \"{}\" returned {} candidates", query, candidates.len());
        Ok(candidates)
    }

    async fn trending(&self, kind: Option<MediaKind>) -> SourceResult<Vec<Candidate>> {
        let path = format!("trending/{}/week", Self::kind_segment(kind));
        let page: TmdbPage<TmdbListEntry> = self.get_json(&path, &[]).await?;
        Ok(Self::collect_candidates(page, kind))
    }

    async fn details(&self, id: u64, kind: MediaKind) -> SourceResult<CandidateDetails> {
        let path = format!("{}/{}", kind.as_str(), id);
        let details: CandidateDetails = match kind {
            MediaKind::Movie => self.get_json::<TmdbMovieDetails>(&path, &[]).await?.into(),
            MediaKind::Tv => self.get_json::<TmdbTvDetails>(&path, &[]).await?.into(),
        };
        Ok(details)
    }

    async fn genres(&self, kind: MediaKind) -> SourceResult<HashMap<u32, String>> {
        let path = format!("genre/{}/list", kind.as_str());
        let list: TmdbGenreList = self.get_json(&path, &[]).await?;
        Ok(list.genres.into_iter().map(|g| (g.id, g.name)).collect())
    }
}
