use anyhow::{Context, Result};
use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::credentials::Session;
use crate::error::{ApiError, FALLBACK_MESSAGE};
use crate::models::{
    ErrorBody, JobDetails, JobDetailsResponse, JobSummary, JobsResponse, LoginRequest,
    LoginSuccess, Profile, ProfileResponse,
};
use crate::query::JobQuery;

pub const DEFAULT_API_URL: &str = "https://apis.ccbp.in";

const LOGIN_ENDPOINT: &str = "/login";
const JOBS_ENDPOINT: &str = "/jobs";
const PROFILE_ENDPOINT: &str = "/profile";

/// Unreserved characters stay literal; everything else in an id is escaped.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// The remote jobs service. Everything but `login` needs a session.
#[async_trait]
pub trait JobsApi: Send + Sync {
    /// Exchanges credentials for a token.
    async fn login(&self, request: &LoginRequest) -> Result<String, ApiError>;

    async fn jobs(&self, session: &Session, query: &JobQuery) -> Result<Vec<JobSummary>, ApiError>;

    async fn job_details(&self, session: &Session, id: &str) -> Result<JobDetails, ApiError>;

    async fn profile(&self, session: &Session) -> Result<Profile, ApiError>;
}

#[derive(Debug, Clone)]
pub struct HttpJobsApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpJobsApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        session: &Session,
        params: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        tracing::debug!(%url, ?params, "GET");

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::AUTHORIZATION, session.authorization())
            .query(params)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        tracing::debug!(%url, %status, "response received");

        if !status.is_success() {
            return Err(fetch_failure(status, &body));
        }
        Ok(serde_json::from_str(&body)?)
    }
}

fn detail_path(id: &str) -> String {
    format!("{}/{}", JOBS_ENDPOINT, utf8_percent_encode(id, PATH_SEGMENT))
}

fn auth_failure(status: StatusCode, body: &str) -> ApiError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error_msg)
        .unwrap_or_else(|| FALLBACK_MESSAGE.to_string());
    tracing::warn!(%status, "login rejected");
    ApiError::AuthFailure(message)
}

fn fetch_failure(status: StatusCode, body: &str) -> ApiError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error_msg);
    tracing::warn!(%status, ?message, "request failed");
    ApiError::Fetch {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl JobsApi for HttpJobsApi {
    async fn login(&self, request: &LoginRequest) -> Result<String, ApiError> {
        let url = self.url(LOGIN_ENDPOINT);
        tracing::debug!(%url, username = %request.username, "POST");

        let response = self.client.post(&url).json(request).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            let success: LoginSuccess = serde_json::from_str(&body)?;
            Ok(success.jwt_token)
        } else {
            Err(auth_failure(status, &body))
        }
    }

    async fn jobs(&self, session: &Session, query: &JobQuery) -> Result<Vec<JobSummary>, ApiError> {
        let response: JobsResponse = self
            .get_json(JOBS_ENDPOINT, session, &query.to_params())
            .await?;
        Ok(response.into())
    }

    async fn job_details(&self, session: &Session, id: &str) -> Result<JobDetails, ApiError> {
        let response: JobDetailsResponse = self.get_json(&detail_path(id), session, &[]).await?;
        Ok(response.into())
    }

    async fn profile(&self, session: &Session) -> Result<Profile, ApiError> {
        let response: ProfileResponse = self.get_json(PROFILE_ENDPOINT, session, &[]).await?;
        Ok(response.into())
    }
}

#[cfg(test)]
pub use fake::{Call, FakeApi};

#[cfg(test)]
mod fake {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// A request as the fake saw it.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Call {
        Login { username: String, password: String },
        Jobs { authorization: String, params: Vec<(String, String)> },
        JobDetails { authorization: String, id: String },
        Profile { authorization: String },
    }

    /// Scripted responses, one queue per endpoint. An empty queue answers
    /// with an empty success.
    #[derive(Default)]
    pub struct FakeApi {
        calls: Mutex<Vec<Call>>,
        logins: Mutex<VecDeque<Result<String, ApiError>>>,
        jobs: Mutex<VecDeque<Result<Vec<JobSummary>, ApiError>>>,
        details: Mutex<VecDeque<Result<JobDetails, ApiError>>>,
        profiles: Mutex<VecDeque<Result<Profile, ApiError>>>,
    }

    impl FakeApi {
        pub fn push_login(&self, result: Result<String, ApiError>) {
            self.logins.lock().unwrap().push_back(result);
        }

        pub fn push_jobs(&self, result: Result<Vec<JobSummary>, ApiError>) {
            self.jobs.lock().unwrap().push_back(result);
        }

        pub fn push_details(&self, result: Result<JobDetails, ApiError>) {
            self.details.lock().unwrap().push_back(result);
        }

        pub fn push_profile(&self, result: Result<Profile, ApiError>) {
            self.profiles.lock().unwrap().push_back(result);
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: Call) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl JobsApi for FakeApi {
        async fn login(&self, request: &LoginRequest) -> Result<String, ApiError> {
            self.record(Call::Login {
                username: request.username.clone(),
                password: request.password.clone(),
            });
            self.logins
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok("token".to_string()))
        }

        async fn jobs(&self, session: &Session, query: &JobQuery) -> Result<Vec<JobSummary>, ApiError> {
            self.record(Call::Jobs {
                authorization: session.authorization(),
                params: query
                    .to_params()
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v))
                    .collect(),
            });
            self.jobs.lock().unwrap().pop_front().unwrap_or_else(|| Ok(Vec::new()))
        }

        async fn job_details(&self, session: &Session, id: &str) -> Result<JobDetails, ApiError> {
            self.record(Call::JobDetails {
                authorization: session.authorization(),
                id: id.to_string(),
            });
            self.details.lock().unwrap().pop_front().unwrap_or_else(|| {
                Ok(JobDetailsResponse::default().into())
            })
        }

        async fn profile(&self, session: &Session) -> Result<Profile, ApiError> {
            self.record(Call::Profile {
                authorization: session.authorization(),
            });
            self.profiles
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(ProfileResponse::default().into()))
        }
    }
}
