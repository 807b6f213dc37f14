use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use shared::{
    domain::{
        Identity, NewPiece, NewProfile, Piece, PieceId, PiecePatch, Profile, ProfileId,
        ProfilePatch,
    },
    error::ApiError,
    protocol::{CreatePieceRequest, HandleAvailability, PublicProfile},
};
use tracing::warn;
use url::Url;

use crate::{error::StoreError, remote::RemoteStore};

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server_url: Url,
    pub request_timeout: Duration,
}

impl ClientConfig {
    pub fn new(server_url: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            server_url: Url::parse(server_url)?,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }
}

/// [`RemoteStore`] backed by the MOSAI HTTP service.
pub struct HttpRemoteStore {
    http: Client,
    base: Url,
    identity: Option<Identity>,
}

impl HttpRemoteStore {
    pub fn new(config: &ClientConfig, identity: Option<Identity>) -> Result<Self, StoreError> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(transport)?;
        Ok(Self {
            http,
            base: config.server_url.clone(),
            identity,
        })
    }

    fn user_id(&self) -> Result<ProfileId, StoreError> {
        self.identity
            .as_ref()
            .map(|identity| identity.id)
            .ok_or(StoreError::Unauthorized)
    }

    /// Appends `segments` to the server url, percent-encoding each one.
    fn url(&self, segments: &[&str]) -> Result<Url, StoreError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| StoreError::Remote(format!("{} cannot be a base url", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub async fn handle_availability(&self, handle: &str) -> Result<HandleAvailability, StoreError> {
        let response = self
            .http
            .get(self.url(&["handles", handle])?)
            .send()
            .await
            .map_err(transport)?;
        read_json(response).await
    }

    pub async fn public_profile(&self, handle: &str) -> Result<PublicProfile, StoreError> {
        let response = self
            .http
            .get(self.url(&["u", handle])?)
            .send()
            .await
            .map_err(transport)?;
        read_json(response).await
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn current_identity(&self) -> Result<Option<Identity>, StoreError> {
        Ok(self.identity.clone())
    }

    async fn fetch_profile(&self, id: ProfileId) -> Result<Option<Profile>, StoreError> {
        let response = self
            .http
            .get(self.url(&["profiles", "me"])?)
            .query(&[("user_id", id)])
            .send()
            .await
            .map_err(transport)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        read_json(response).await.map(Some)
    }

    async fn fetch_pieces(&self, owner: ProfileId) -> Result<Vec<Piece>, StoreError> {
        let response = self
            .http
            .get(self.url(&["pieces"])?)
            .query(&[("user_id", owner)])
            .send()
            .await
            .map_err(transport)?;
        read_json(response).await
    }

    async fn insert_profile(&self, profile: NewProfile) -> Result<Profile, StoreError> {
        let response = self
            .http
            .post(self.url(&["profiles"])?)
            .query(&[("user_id", profile.id)])
            .json(&profile)
            .send()
            .await
            .map_err(transport)?;
        read_json(response).await
    }

    async fn update_profile(
        &self,
        id: ProfileId,
        patch: ProfilePatch,
    ) -> Result<Profile, StoreError> {
        let response = self
            .http
            .patch(self.url(&["profiles", "me"])?)
            .query(&[("user_id", id)])
            .json(&patch)
            .send()
            .await
            .map_err(transport)?;
        read_json(response).await
    }

    async fn insert_piece(
        &self,
        owner: ProfileId,
        piece: NewPiece,
        position: u32,
    ) -> Result<Piece, StoreError> {
        let response = self
            .http
            .post(self.url(&["pieces"])?)
            .query(&[("user_id", owner)])
            .json(&CreatePieceRequest { piece, position })
            .send()
            .await
            .map_err(transport)?;
        read_json(response).await
    }

    async fn update_piece(&self, id: PieceId, patch: PiecePatch) -> Result<Piece, StoreError> {
        let user_id = self.user_id()?;
        let id = id.to_string();
        let response = self
            .http
            .patch(self.url(&["pieces", id.as_str()])?)
            .query(&[("user_id", user_id)])
            .json(&patch)
            .send()
            .await
            .map_err(transport)?;
        read_json(response).await
    }

    async fn remove_piece(&self, id: PieceId) -> Result<(), StoreError> {
        let user_id = self.user_id()?;
        let id = id.to_string();
        let response = self
            .http
            .delete(self.url(&["pieces", id.as_str()])?)
            .query(&[("user_id", user_id)])
            .send()
            .await
            .map_err(transport)?;
        check(response).await.map(|_| ())
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, StoreError> {
    check(response).await?.json().await.map_err(transport)
}

async fn check(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = match response.json::<ApiError>().await {
        Ok(body) => body.message,
        Err(_) => status.to_string(),
    };
    warn!(status = status.as_u16(), %message, "remote store request failed");
    Err(match status {
        StatusCode::UNAUTHORIZED => StoreError::Unauthorized,
        StatusCode::NOT_FOUND => StoreError::NotFound,
        StatusCode::CONFLICT => StoreError::Conflict(message),
        _ => StoreError::Remote(message),
    })
}

fn transport(err: reqwest::Error) -> StoreError {
    StoreError::Remote(err.to_string())
}

#[cfg(test)]
#[path = "tests/http_store_tests.rs"]
mod tests;
