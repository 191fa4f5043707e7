//! HTTP client for the patient service.
//!
//! Endpoints (JSON bodies):
//!
//! ```text
//! POST   /api/auth/login        {username, password} -> {token}
//! GET    /api/patients/{id}     -> RemotePatient
//! POST   /api/patients          RemotePatient
//! PUT    /api/patients/{id}     RemotePatient
//! DELETE /api/patients/{id}
//! ```
//!
//! Calls are blocking; async callers run them on the blocking pool.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use pagient_core::{BackendConfig, PatientId, RemotePatient};

use crate::error::ApiError;

const LOGIN_PATH: &str = "/api/auth/login";
const PATIENTS_PATH: &str = "/api/patients";

/// Operations the reconciler needs from the patient service.
///
/// Implementations must be safe to call from several threads at once.
pub trait PatientApi: Send + Sync {
    /// Fetch one patient. A missing patient is `ApiError::NotFound`.
    fn get_patient(&self, id: PatientId) -> Result<RemotePatient, ApiError>;

    fn add_patient(&self, patient: &RemotePatient) -> Result<(), ApiError>;

    fn update_patient(&self, patient: &RemotePatient) -> Result<(), ApiError>;

    fn remove_patient(&self, id: PatientId) -> Result<(), ApiError>;
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
}

/// Blocking HTTP client. Without a token it can only log in; the value
/// returned by [`ApiClient::authenticate`] carries the session token.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    agent: ureq::Agent,
    token: Option<String>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.token.is_some())
            .finish()
    }
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(timeout)
            .timeout(timeout)
            .build();
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            agent,
            token: None,
        }
    }

    pub fn from_config(backend: &BackendConfig) -> Self {
        Self::new(backend.url.clone(), backend.timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Log in and return a client bound to the new session.
    pub fn authenticate(&self, user: &str, password: &str) -> Result<ApiClient, ApiError> {
        let response = self
            .agent
            .post(&self.url(LOGIN_PATH))
            .send_json(LoginRequest {
                username: user,
                password,
            })
            .map_err(|err| map_ureq_error(err, "login"))?;

        let login: LoginResponse = response.into_json().map_err(|err| ApiError::Decode {
            resource: "login".to_string(),
            reason: err.to_string(),
        })?;

        tracing::debug!(base_url = %self.base_url, user, "authenticated with patient service");
        Ok(ApiClient {
            base_url: self.base_url.clone(),
            agent: self.agent.clone(),
            token: Some(login.token),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn patient_url(&self, id: PatientId) -> String {
        self.url(&format!("{PATIENTS_PATH}/{id}"))
    }

    fn request(&self, method: &str, url: &str) -> ureq::Request {
        let request = self.agent.request(method, url);
        match &self.token {
            Some(token) => request.set("Authorization", &format!("Bearer {token}")),
            None => request,
        }
    }
}

impl PatientApi for ApiClient {
    fn get_patient(&self, id: PatientId) -> Result<RemotePatient, ApiError> {
        let resource = patient_resource(id);
        let response = self
            .request("GET", &self.patient_url(id))
            .call()
            .map_err(|err| map_ureq_error(err, &resource))?;
        response.into_json().map_err(|err| ApiError::Decode {
            resource,
            reason: err.to_string(),
        })
    }

    fn add_patient(&self, patient: &RemotePatient) -> Result<(), ApiError> {
        self.request("POST", &self.url(PATIENTS_PATH))
            .send_json(patient)
            .map_err(|err| map_ureq_error(err, &patient_resource(patient.id)))?;
        Ok(())
    }

    fn update_patient(&self, patient: &RemotePatient) -> Result<(), ApiError> {
        self.request("PUT", &self.patient_url(patient.id))
            .send_json(patient)
            .map_err(|err| map_ureq_error(err, &patient_resource(patient.id)))?;
        Ok(())
    }

    fn remove_patient(&self, id: PatientId) -> Result<(), ApiError> {
        self.request("DELETE", &self.patient_url(id))
            .call()
            .map_err(|err| map_ureq_error(err, &patient_resource(id)))?;
        Ok(())
    }
}

fn patient_resource(id: PatientId) -> String {
    format!("patient {id}")
}

fn map_ureq_error(err: ureq::Error, resource: &str) -> ApiError {
    match err {
        ureq::Error::Status(code, response) => {
            let message = response.into_string().unwrap_or_default();
            ApiError::from_status(code, message.trim(), resource)
        }
        ureq::Error::Transport(transport) => ApiError::Transport(transport.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = ApiClient::new("http://localhost:8080/", Duration::from_secs(1));
        assert_eq!(client.base_url(), "http://localhost:8080");
        assert_eq!(
            client.patient_url(PatientId(7)),
            "http://localhost:8080/api/patients/7"
        );
    }

    #[test]
    fn new_client_is_not_authenticated() {
        let client = ApiClient::new("http://localhost:8080", Duration::from_secs(1));
        assert!(!client.is_authenticated());
        assert!(format!("{client:?}").contains("authenticated: false"));
    }
}
