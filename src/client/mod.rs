//! Типизированный клиент API для «браузерной» стороны.
//!
//! Все запросы идут через `failsafe` выключатель: после серии сетевых
//! ошибок или 5xx он открывается и сразу отвечает `ClientError::Unavailable`.
//! Ошибки 4xx выключатель не считают, это ответы живого сервера.

pub mod checkout;
pub mod session;
pub mod store;

pub use checkout::{guest_bookings, submit_checkout, CheckoutOutcome, GuestBooking, GUEST_BOOKINGS_KEY};
pub use session::{MovieVotes, Session};
pub use store::{JsonFileStore, LocalStore, LocalStoreExt, MemoryStore, StoreError};

use chrono::NaiveDate;
use failsafe::backoff::{self, Constant};
use failsafe::failure_policy::{self, ConsecutiveFailures};
use failsafe::futures::CircuitBreaker as _;
use failsafe::StateMachine;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::booking::{PriceBreakdown, WizardError};
use crate::catalog::{Facets, SeatMap, TheaterShows};
use crate::controllers::auth::{
    AuthResponse, FlowResponse, PhoneCompleteRequest, PhoneStartRequest, PhoneVerifyRequest, SigninRequest,
    SignupRequest,
};
use crate::controllers::bookings::{CheckoutRequest, CheckoutResponse, QuoteRequest, TicketResponse};
use crate::controllers::movies::MoviesQuery;
use crate::controllers::shows::GroupedQuery;
use crate::models::{BookingDetails, Movie, Theater, User};

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Например `http://localhost:8000/api`
    pub base_url: String,
    pub timeout: Duration,
    pub failure_threshold: u32,
    pub backoff: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api".to_string(),
            timeout: Duration::from_secs(10),
            failure_threshold: 3,
            backoff: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(reqwest::Error),
    #[error("{message}")]
    Api { status: u16, message: String },
    #[error("request timed out")]
    Timeout,
    #[error("service temporarily unavailable")]
    Unavailable,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Wizard(#[from] WizardError),
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ClientError::Timeout
        } else {
            ClientError::Http(e)
        }
    }
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Место уже занято другим покупателем.
    pub fn is_conflict(&self) -> bool {
        self.status() == Some(StatusCode::CONFLICT.as_u16())
    }
}

// Что выключатель считает отказом сервиса
fn counts_as_failure(err: &ClientError) -> bool {
    match err {
        ClientError::Http(_) | ClientError::Timeout => true,
        ClientError::Api { status, .. } => *status >= 500,
        _ => false,
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Фильм и сеансы по кинотеатрам для шага выбора сеанса.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingContext {
    pub movie: Movie,
    pub theaters: Vec<TheaterShows>,
}

type Breaker = StateMachine<ConsecutiveFailures<Constant>, ()>;

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    breaker: Breaker,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        let breaker = failsafe::Config::new()
            .failure_policy(failure_policy::consecutive_failures(
                config.failure_threshold,
                backoff::constant(config.backoff),
            ))
            .build();

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            breaker,
            token: None,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, format!("{}{}", self.base_url, path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn read_error(response: Response) -> ClientError {
        let status = response.status();
        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.message,
            Err(_) => status.canonical_reason().unwrap_or("Request failed").to_string(),
        };
        ClientError::Api {
            status: status.as_u16(),
            message,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        let call = async move {
            let response = builder.send().await?;
            if !response.status().is_success() {
                return Err(Self::read_error(response).await);
            }
            Ok(response.json::<T>().await?)
        };

        match self.breaker.call_with(counts_as_failure, call).await {
            Ok(value) => Ok(value),
            Err(failsafe::Error::Inner(e)) => {
                debug!("api request failed: {}", e);
                Err(e)
            }
            Err(failsafe::Error::Rejected) => {
                warn!("circuit breaker is open, request rejected");
                Err(ClientError::Unavailable)
            }
        }
    }

    /* ---------- каталог ---------- */

    pub async fn list_movies(&self, query: &MoviesQuery) -> Result<Vec<Movie>, ClientError> {
        self.send(self.request(Method::GET, "/movies").query(query)).await
    }

    pub async fn movie_facets(&self) -> Result<Facets, ClientError> {
        self.send(self.request(Method::GET, "/movies/facets")).await
    }

    pub async fn get_movie(&self, id: Uuid) -> Result<Movie, ClientError> {
        self.send(self.request(Method::GET, &format!("/movies/{id}"))).await
    }

    pub async fn list_theaters(&self, city: Option<&str>) -> Result<Vec<Theater>, ClientError> {
        let mut builder = self.request(Method::GET, "/theaters");
        if let Some(city) = city {
            builder = builder.query(&[("city", city)]);
        }
        self.send(builder).await
    }

    pub async fn grouped_shows(&self, movie_id: Uuid, date: Option<NaiveDate>) -> Result<Vec<TheaterShows>, ClientError> {
        let query = GroupedQuery { movie_id, date };
        self.send(self.request(Method::GET, "/shows/grouped").query(&query)).await
    }

    pub async fn seat_map(&self, show_id: Uuid) -> Result<SeatMap, ClientError> {
        self.send(self.request(Method::GET, &format!("/shows/{show_id}/seats"))).await
    }

    /// Фильм и сеансы запрашиваются параллельно.
    pub async fn fetch_booking_context(&self, movie_id: Uuid, date: Option<NaiveDate>) -> Result<BookingContext, ClientError> {
        let (movie, theaters) = futures::try_join!(self.get_movie(movie_id), self.grouped_shows(movie_id, date))?;
        Ok(BookingContext { movie, theaters })
    }

    /* ---------- брони ---------- */

    pub async fn quote(&self, seats: Vec<String>) -> Result<PriceBreakdown, ClientError> {
        let body = QuoteRequest { seats };
        self.send(self.request(Method::POST, "/bookings/quote").json(&body)).await
    }

    pub async fn create_booking(&self, request: &CheckoutRequest) -> Result<CheckoutResponse, ClientError> {
        self.send(self.request(Method::POST, "/bookings").json(request)).await
    }

    pub async fn my_bookings(&self) -> Result<Vec<BookingDetails>, ClientError> {
        self.send(self.request(Method::GET, "/bookings")).await
    }

    pub async fn ticket(&self, booking_id: Uuid) -> Result<TicketResponse, ClientError> {
        self.send(self.request(Method::GET, &format!("/bookings/{booking_id}/ticket"))).await
    }

    /* ---------- вход ---------- */

    pub async fn signup(&self, request: &SignupRequest) -> Result<AuthResponse, ClientError> {
        self.send(self.request(Method::POST, "/auth/signup").json(request)).await
    }

    pub async fn signin(&self, email: &str, password: &str) -> Result<AuthResponse, ClientError> {
        let body = SigninRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.send(self.request(Method::POST, "/auth/signin").json(&body)).await
    }

    pub async fn signout(&self) -> Result<(), ClientError> {
        self.send::<serde_json::Value>(self.request(Method::POST, "/auth/signout"))
            .await
            .map(|_| ())
    }

    pub async fn profile(&self) -> Result<User, ClientError> {
        self.send(self.request(Method::GET, "/auth/profile")).await
    }

    pub async fn phone_start(&self, phone: &str) -> Result<FlowResponse, ClientError> {
        let body = PhoneStartRequest { phone: phone.to_string() };
        self.send(self.request(Method::POST, "/auth/phone/start").json(&body)).await
    }

    pub async fn phone_verify(&self, flow_id: Uuid, code: &str) -> Result<FlowResponse, ClientError> {
        let body = PhoneVerifyRequest {
            flow_id,
            code: code.to_string(),
        };
        self.send(self.request(Method::POST, "/auth/phone/verify").json(&body)).await
    }

    pub async fn phone_complete(&self, request: &PhoneCompleteRequest) -> Result<AuthResponse, ClientError> {
        self.send(self.request(Method::POST, "/auth/phone/complete").json(request)).await
    }
}
