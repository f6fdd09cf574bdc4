use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

use crate::models::CandidateProfile;

/// Errors that can occur when interacting with the hosted backend
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Unauthorized: invalid API key")]
    Unauthorized,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Table names in the hosted backend
#[derive(Debug, Clone)]
pub struct BackendTables {
    pub vacancies: String,
    pub postulations: String,
}

impl Default for BackendTables {
    fn default() -> Self {
        Self {
            vacancies: "vacantes".to_string(),
            postulations: "postulaciones".to_string(),
        }
    }
}

/// Session returned by a successful password sign-in
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub access_token: String,
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    user: Option<TokenUser>,
}

#[derive(Debug, Deserialize)]
struct TokenUser {
    id: String,
}

#[derive(Debug, Deserialize)]
struct VacancyRow {
    #[serde(default)]
    requisitos: Option<String>,
}

impl VacancyRow {
    /// Free-text requirements; a null column reads as empty text
    fn requirements_text(self) -> String {
        self.requisitos.unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct PostulationRow {
    id: String,
    #[serde(default)]
    nombre_candidato: Option<String>,
    #[serde(default)]
    habilidades_clave: Option<String>,
    #[serde(default)]
    experiencia_resumen: Option<String>,
}

impl From<PostulationRow> for CandidateProfile {
    fn from(row: PostulationRow) -> Self {
        CandidateProfile {
            postulation_id: row.id,
            candidate_name: row.nombre_candidato.unwrap_or_default(),
            skills: row.habilidades_clave.unwrap_or_default(),
            experience: row.experiencia_resumen.unwrap_or_default(),
        }
    }
}

/// Hosted backend API client
///
/// Handles all communication with the backend-as-a-service:
/// - Password sign-in (the credential check wrapped by the login throttle)
/// - Reading vacancy requirements and postulations
/// - Writing computed scores back onto postulations
pub struct BackendClient {
    base_url: String,
    api_key: String,
    client: Client,
    tables: BackendTables,
}

impl BackendClient {
    /// Create a new backend client
    pub fn new(
        base_url: String,
        api_key: String,
        tables: BackendTables,
        timeout_secs: u64,
    ) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
            tables,
        })
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    /// Check an email/password pair against the backend's auth service
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, BackendError> {
        let url = format!("{}/auth/v1/token?grant_type=password", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.api_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {
                let token: TokenResponse = response.json().await.map_err(|e| {
                    BackendError::InvalidResponse(format!("Failed to parse session: {}", e))
                })?;
                Ok(AuthSession {
                    access_token: token.access_token,
                    user_id: token.user.map(|u| u.id),
                })
            }
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => {
                let body: Value = response.json().await.unwrap_or(Value::Null);
                let message = body
                    .get("error_description")
                    .or_else(|| body.get("msg"))
                    .and_then(Value::as_str)
                    .unwrap_or("Invalid login credentials")
                    .to_string();
                tracing::debug!("Sign-in rejected by backend: {}", message);
                Err(BackendError::InvalidCredentials(message))
            }
            status => Err(BackendError::ApiError(format!("Sign-in failed: {}", status))),
        }
    }

    /// Fetch the requirements text of a vacancy
    pub async fn get_vacancy_requirements(&self, vacancy_id: &str) -> Result<String, BackendError> {
        let url = format!(
            "{}?id=eq.{}&select=requisitos",
            self.rest_url(&self.tables.vacancies),
            urlencoding::encode(vacancy_id)
        );

        tracing::debug!("Fetching vacancy from: {}", url);

        let response = self.authorized(self.client.get(&url)).send().await?;
        let rows: Vec<VacancyRow> = self.parse_rows(response, "vacancy").await?;

        rows.into_iter()
            .next()
            .map(VacancyRow::requirements_text)
            .ok_or_else(|| BackendError::NotFound(format!("Vacancy {} not found", vacancy_id)))
    }

    /// List the postulations submitted to a vacancy
    pub async fn list_postulations(&self, vacancy_id: &str) -> Result<Vec<CandidateProfile>, BackendError> {
        let url = format!(
            "{}?id_vacante=eq.{}&select=id,nombre_candidato,habilidades_clave,experiencia_resumen&order=created_at.asc",
            self.rest_url(&self.tables.postulations),
            urlencoding::encode(vacancy_id)
        );

        let response = self.authorized(self.client.get(&url)).send().await?;
        let rows: Vec<PostulationRow> = self.parse_rows(response, "postulations").await?;

        tracing::debug!("Fetched {} postulations for vacancy {}", rows.len(), vacancy_id);

        Ok(rows.into_iter().map(CandidateProfile::from).collect())
    }

    /// Store a computed score and recruiter comment on a postulation
    pub async fn update_postulation_score(
        &self,
        postulation_id: &str,
        score: u8,
        comment: &str,
    ) -> Result<(), BackendError> {
        let url = format!(
            "{}?id=eq.{}",
            self.rest_url(&self.tables.postulations),
            urlencoding::encode(postulation_id)
        );

        let response = self
            .authorized(self.client.patch(&url))
            .json(&json!({
                "puntuacion_ia": score,
                "comentarios_reclutador": comment,
            }))
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(BackendError::Unauthorized),
            status => Err(BackendError::ApiError(format!(
                "Failed to update postulation {}: {}",
                postulation_id, status
            ))),
        }
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    async fn parse_rows<T>(&self, response: reqwest::Response, what: &str) -> Result<Vec<T>, BackendError>
    where
        T: for<'de> Deserialize<'de>,
    {
        match response.status() {
            status if status.is_success() => response
                .json()
                .await
                .map_err(|e| BackendError::InvalidResponse(format!("Failed to parse {}: {}", what, e))),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(BackendError::Unauthorized),
            status => Err(BackendError::ApiError(format!("Failed to fetch {}: {}", what, status))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Feedback;
    use mockito::Matcher;

    fn client(url: &str) -> BackendClient {
        BackendClient::new(url.to_string(), "anon-key".to_string(), BackendTables::default(), 5).unwrap()
    }

    #[test]
    fn test_backend_client_creation() {
        let client = client("https://backend.test/");
        assert_eq!(client.base_url, "https://backend.test");
        assert_eq!(client.rest_url("vacantes"), "https://backend.test/rest/v1/vacantes");
    }

    #[tokio::test]
    async fn test_sign_in_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/auth/v1/token")
            .match_query(Matcher::UrlEncoded("grant_type".into(), "password".into()))
            .match_header("apikey", "anon-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token":"tok","user":{"id":"u1"}}"#)
            .create_async()
            .await;

        let session = client(&server.url())
            .sign_in_with_password("ana@example.com", "secret")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(session.access_token, "tok");
        assert_eq!(session.user_id.as_deref(), Some("u1"));
    }

    #[tokio::test]
    async fn test_sign_in_invalid_credentials() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/auth/v1/token")
            .match_query(Matcher::Any)
            .with_status(400)
            .with_body(r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#)
            .create_async()
            .await;

        let err = client(&server.url())
            .sign_in_with_password("ana@example.com", "wrong")
            .await
            .unwrap_err();

        assert!(matches!(err, BackendError::InvalidCredentials(ref m) if m == "Invalid login credentials"));
    }

    #[tokio::test]
    async fn test_vacancy_requirements_text() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/rest/v1/vacantes")
            .match_query(Matcher::UrlEncoded("id".into(), "eq.v1".into()))
            .with_status(200)
            .with_body(r#"[{"requisitos":"React, SQL"}]"#)
            .create_async()
            .await;

        let requirements = client(&server.url()).get_vacancy_requirements("v1").await.unwrap();
        assert_eq!(requirements, "React, SQL");
    }

    #[tokio::test]
    async fn test_null_vacancy_requirements_read_as_empty() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/rest/v1/vacantes")
            .match_query(Matcher::UrlEncoded("id".into(), "eq.v2".into()))
            .with_status(200)
            .with_body(r#"[{"requisitos":null,"habilidades_necesarias":["React","SQL"]}]"#)
            .create_async()
            .await;

        let requirements = client(&server.url()).get_vacancy_requirements("v2").await.unwrap();
        assert_eq!(requirements, "");
    }

    #[tokio::test]
    async fn test_vacancy_not_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/rest/v1/vacantes")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let err = client(&server.url()).get_vacancy_requirements("missing").await.unwrap_err();
        assert!(matches!(err, BackendError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_postulations() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/rest/v1/postulaciones")
            .match_query(Matcher::UrlEncoded("id_vacante".into(), "eq.v1".into()))
            .with_status(200)
            .with_body(
                r#"[
                    {"id":"p1","nombre_candidato":"Ana","habilidades_clave":"React","experiencia_resumen":"3 años"},
                    {"id":"p2","nombre_candidato":null,"habilidades_clave":null,"experiencia_resumen":null}
                ]"#,
            )
            .create_async()
            .await;

        let candidates = client(&server.url()).list_postulations("v1").await.unwrap();

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].candidate_name, "Ana");
        assert_eq!(candidates[1].skills, "");
    }

    #[tokio::test]
    async fn test_update_postulation_score() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PATCH", "/rest/v1/postulaciones")
            .match_query(Matcher::UrlEncoded("id".into(), "eq.p1".into()))
            .match_header("authorization", "Bearer anon-key")
            .match_body(Matcher::PartialJson(json!({
                "puntuacion_ia": 67,
                "comentarios_reclutador": "Candidato competente."
            })))
            .with_status(204)
            .create_async()
            .await;

        client(&server.url())
            .update_postulation_score("p1", 67, Feedback::Competent.comment())
            .await
            .unwrap();

        mock.assert_async().await;
    }
}
