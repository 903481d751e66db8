use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::dto::appointment_dto::AppointmentPayload;
use crate::models::appointment::Appointment;
use crate::models::review::Review;
use crate::models::vehicle::{Vehicle, VehicleType};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("server rejected the request ({status})")]
    Rejected {
        status: u16,
        message: Option<String>,
    },

    #[error("unexpected response body: {0}")]
    Data(String),
}

impl ApiError {
    /// Message the server attached to a rejection, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Rejected { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Data(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StorefrontApi: Send + Sync {
    async fn list_vehicle_types(&self) -> ApiResult<Vec<VehicleType>>;

    async fn list_vehicles(&self) -> ApiResult<Vec<Vehicle>>;

    async fn create_appointment(&self, payload: AppointmentPayload) -> ApiResult<Appointment>;

    async fn update_appointment(&self, id: i32, payload: AppointmentPayload) -> ApiResult<Appointment>;

    /// Every review of the vehicle, hidden ones included.
    async fn list_reviews(&self, vehicle_id: i32) -> ApiResult<Vec<Review>>;
}

#[derive(Clone)]
pub struct StorefrontClient {
    client: Client,
    base_url: String,
    bearer: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

impl StorefrontClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bearer: None,
        }
    }

    /// Staff token sent with every request. Reading or editing an existing
    /// appointment requires one.
    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.bearer {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.message.or(body.error));
            tracing::warn!(status = %status, ?message, "storefront request rejected");
            return Err(ApiError::Rejected {
                status: status.as_u16(),
                message,
            });
        }
        if status == StatusCode::NO_CONTENT {
            return Err(ApiError::Data("empty response body".to_string()));
        }
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl StorefrontApi for StorefrontClient {
    async fn list_vehicle_types(&self) -> ApiResult<Vec<VehicleType>> {
        let response = self.authorized(self.client.get(self.url("/api/typecar"))).send().await?;
        Self::decode(response).await
    }

    async fn list_vehicles(&self) -> ApiResult<Vec<Vehicle>> {
        let response = self.authorized(self.client.get(self.url("/api/car"))).send().await?;
        Self::decode(response).await
    }

    async fn create_appointment(&self, payload: AppointmentPayload) -> ApiResult<Appointment> {
        let response = self
            .authorized(self.client.post(self.url("/api/calendartestcar")))
            .json(&payload)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn update_appointment(&self, id: i32, payload: AppointmentPayload) -> ApiResult<Appointment> {
        let response = self
            .authorized(self.client.put(self.url(&format!("/api/calendartestcar/{}", id))))
            .json(&payload)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn list_reviews(&self, vehicle_id: i32) -> ApiResult<Vec<Review>> {
        let response = self
            .authorized(self.client.get(self.url(&format!("/api/review/{}", vehicle_id))))
            .send()
            .await?;
        Self::decode(response).await
    }
}
