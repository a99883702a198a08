/// file: src/api.rs
/// description: membership REST calls; a confirmed join is published on the local bus
use crate::{
    auth::CredentialSource,
    bus::LocalEventBus,
    error::ClubsError,
    types::ClubJoinEvent,
};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

/// Envelope every backend response is wrapped in.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub message: String,
    pub status: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    AlreadyPending,
    /// Anything newer than this client knows about.
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JoinClubResponse {
    pub request_status: Option<RequestStatus>,
    pub message: Option<String>,
}

/// Identity of the logged-in user, as far as local events need it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

pub struct ClubsApi {
    client: Client,
    base_url: Url,
    credentials: Arc<dyn CredentialSource>,
    bus: LocalEventBus,
}

impl ClubsApi {
    pub fn new(
        client: Client,
        base_url: Url,
        credentials: Arc<dyn CredentialSource>,
        bus: LocalEventBus,
    ) -> Self {
        Self {
            client,
            base_url,
            credentials,
            bus,
        }
    }

    /// `POST /clubs/{id}/join`.
    ///
    /// An envelope status of 200 means the user is now a member (201 means a
    /// request is pending); only the former is announced on the bus.
    pub async fn join_club(
        &self,
        club_id: i64,
        user: Option<&CurrentUser>,
    ) -> Result<ApiResponse<JoinClubResponse>, ClubsError> {
        let url = self.endpoint(&format!("clubs/{club_id}/join"))?;
        let response: ApiResponse<JoinClubResponse> =
            self.send(self.request(Method::POST, url)).await?;

        info!(club_id, status = response.status, "Join club: {}", response.message);
        match user {
            Some(user) if response.status == 200 => {
                self.bus
                    .publish_club_join(ClubJoinEvent::new(club_id, user.id, user.name.clone()));
            }
            None if response.status == 200 => {
                warn!("Joined club {} without a known current user; not publishing", club_id);
            }
            _ => {}
        }
        Ok(response)
    }

    /// `DELETE /clubs/{id}/leave`; `user_id` lets an admin remove a member.
    pub async fn leave_club(
        &self,
        club_id: i64,
        user_id: Option<i64>,
    ) -> Result<ApiResponse<serde_json::Value>, ClubsError> {
        let mut url = self.endpoint(&format!("clubs/{club_id}/leave"))?;
        if let Some(user_id) = user_id {
            url.query_pairs_mut()
                .append_pair("user_id", &user_id.to_string());
        }
        self.send(self.request(Method::DELETE, url)).await
    }

    /// `POST /clubs/{id}/accept-request/{request_id}`.
    pub async fn accept_request(
        &self,
        club_id: i64,
        request_id: i64,
    ) -> Result<ApiResponse<serde_json::Value>, ClubsError> {
        let url = self.endpoint(&format!("clubs/{club_id}/accept-request/{request_id}"))?;
        self.send(self.request(Method::POST, url)).await
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClubsError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let request = self.client.request(method, url);
        match self.credentials.bearer_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClubsError> {
        let response = request.send().await?;
        let status = response.status();
        debug!("Clubs API responded with {}", status);

        if status == StatusCode::UNAUTHORIZED {
            return Err(ClubsError::Unauthorized);
        }
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.message)
                .unwrap_or_else(|| format!("request failed with status {status}"));
            return Err(ClubsError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<T>().await?)
    }
}
