use std::sync::Arc;

use async_trait::async_trait;
use learnaid_core::model::{
    AuthResponse, CourseId, CourseListItem, CourseOverview, LoginForm, Note, NoteId, Notes,
    ProgressSnapshot, ProgressUpdate, SignupForm, Step, UserId,
};
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use storage::repository::{SessionKey, SessionRepository};
use url::Url;

use super::{AuthApi, CourseApi, ProgressApi, Reflection};
use crate::config::ApiConfig;
use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Auth {
    /// Attach the stored bearer token and refresh it once on 401.
    Session,
    /// Credential endpoints: no token, and a 401 is just a rejected login.
    Anonymous,
}

/// JSON-over-HTTP client for the LearnAid backend.
///
/// The bearer token is read from session storage on every request. A missing
/// token is not an error; the request simply goes out unauthenticated.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    config: ApiConfig,
    session: Arc<dyn SessionRepository>,
}

impl HttpClient {
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the underlying client cannot be built.
    pub fn new(config: ApiConfig, session: Arc<dyn SessionRepository>) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            config,
            session,
        })
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    async fn bearer(&self) -> Option<String> {
        match self.session.get(SessionKey::AuthToken).await {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(err) => {
                tracing::warn!(error = %err, "auth token unreadable, sending request unauthenticated");
                None
            }
        }
    }

    async fn dispatch(
        &self,
        method: &Method,
        url: &Url,
        body: Option<&Value>,
        auth: Auth,
    ) -> Result<Response, ApiError> {
        let mut request = self.client.request(method.clone(), url.clone());
        if auth == Auth::Session {
            if let Some(token) = self.bearer().await {
                request = request.bearer_auth(token);
            }
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        Ok(request.send().await?)
    }

    async fn execute(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<Value>,
        auth: Auth,
    ) -> Result<Response, ApiError> {
        let url = self.config.endpoint(segments)?;
        tracing::debug!(%method, %url, "api request");

        let response = self.dispatch(&method, &url, body.as_ref(), auth).await?;
        if auth == Auth::Anonymous || response.status() != StatusCode::UNAUTHORIZED {
            return check_status(response);
        }

        if !self.refresh_token().await? {
            self.expire_session().await?;
            return Err(ApiError::Unauthorized);
        }

        let retried = self.dispatch(&method, &url, body.as_ref(), auth).await?;
        if retried.status() == StatusCode::UNAUTHORIZED {
            self.expire_session().await?;
            return Err(ApiError::Unauthorized);
        }
        check_status(retried)
    }

    /// Trades the stored refresh token for a new bearer token.
    ///
    /// Returns `Ok(false)` when there is no refresh token or the backend refuses it.
    async fn refresh_token(&self) -> Result<bool, ApiError> {
        let Some(refresh_token) = self.session.get(SessionKey::RefreshToken).await? else {
            return Ok(false);
        };

        let url = self.config.endpoint(&["auth", "refresh"])?;
        let response = self
            .client
            .post(url)
            .json(&RefreshRequest {
                refresh_token: &refresh_token,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), "token refresh rejected");
            return Ok(false);
        }

        let body: RefreshResponse = response.json().await?;
        self.session.set(SessionKey::AuthToken, &body.token).await?;
        if let Some(next) = body.refresh_token {
            self.session.set(SessionKey::RefreshToken, &next).await?;
        }
        tracing::info!("auth token refreshed");
        Ok(true)
    }

    async fn expire_session(&self) -> Result<(), ApiError> {
        tracing::warn!("session expired, clearing stored credentials");
        self.session.clear_all().await?;
        Ok(())
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ApiError> {
        let response = self
            .execute(Method::GET, segments, None, Auth::Session)
            .await?;
        Ok(response.json().await?)
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        segments: &[&str],
        body: &B,
        auth: Auth,
    ) -> Result<Response, ApiError> {
        let body = serde_json::to_value(body)?;
        self.execute(method, segments, Some(body), auth).await
    }
}

fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ApiError::HttpStatus(status))
    }
}

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    token: String,
    #[serde(default, alias = "refreshToken")]
    refresh_token: Option<String>,
}

#[async_trait]
impl CourseApi for HttpClient {
    async fn list_courses(&self) -> Result<Vec<CourseListItem>, ApiError> {
        self.get_json(&["courses"]).await
    }

    async fn course_overview(&self, course_id: &CourseId) -> Result<CourseOverview, ApiError> {
        self.get_json(&["courses", course_id.as_str(), "overview"])
            .await
    }

    async fn course_steps(&self, course_id: &CourseId) -> Result<Vec<Step>, ApiError> {
        self.get_json(&["courses", course_id.as_str(), "steps"]).await
    }

    async fn enroll(&self, user_id: &UserId, course_id: &CourseId) -> Result<(), ApiError> {
        self.send(
            Method::POST,
            &["users", user_id.as_str(), "courses"],
            &json!({ "course_id": course_id }),
            Auth::Session,
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl ProgressApi for HttpClient {
    async fn fetch_progress(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> Result<ProgressSnapshot, ApiError> {
        self.get_json(&[
            "users",
            user_id.as_str(),
            "courses",
            course_id.as_str(),
            "progress",
        ])
        .await
    }

    async fn save_progress(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
        update: &ProgressUpdate,
    ) -> Result<(), ApiError> {
        self.send(
            Method::POST,
            &[
                "users",
                user_id.as_str(),
                "courses",
                course_id.as_str(),
                "progress",
            ],
            update,
            Auth::Session,
        )
        .await?;
        Ok(())
    }

    async fn add_note(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
        note: &Note,
    ) -> Result<(), ApiError> {
        self.send(
            Method::POST,
            &["users", user_id.as_str(), "notes"],
            &json!({ "id": note.id, "content": note.text, "course_id": course_id }),
            Auth::Session,
        )
        .await?;
        Ok(())
    }

    async fn update_note(&self, user_id: &UserId, note: &Note) -> Result<(), ApiError> {
        let note_id = note.id.to_string();
        self.send(
            Method::PUT,
            &["users", user_id.as_str(), "notes", note_id.as_str()],
            &json!({ "content": note.text }),
            Auth::Session,
        )
        .await?;
        Ok(())
    }

    async fn replace_notes(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
        notes: &Notes,
    ) -> Result<(), ApiError> {
        self.send(
            Method::PUT,
            &["users", user_id.as_str(), "notes"],
            &json!({ "course_id": course_id, "notes": notes }),
            Auth::Session,
        )
        .await?;
        Ok(())
    }

    async fn delete_note(&self, user_id: &UserId, note_id: NoteId) -> Result<(), ApiError> {
        let note_id = note_id.to_string();
        self.execute(
            Method::DELETE,
            &["users", user_id.as_str(), "notes", note_id.as_str()],
            None,
            Auth::Session,
        )
        .await?;
        Ok(())
    }

    async fn save_reflection(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
        reflection: &Reflection,
    ) -> Result<(), ApiError> {
        self.send(
            Method::POST,
            &[
                "users",
                user_id.as_str(),
                "courses",
                course_id.as_str(),
                "modules",
                reflection.module_id.as_str(),
                "reflection",
            ],
            reflection,
            Auth::Session,
        )
        .await?;
        Ok(())
    }

    async fn send_feedback(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
        content: &str,
    ) -> Result<(), ApiError> {
        self.send(
            Method::POST,
            &["users", user_id.as_str(), "feedback"],
            &json!({ "content": content, "course_id": course_id }),
            Auth::Session,
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl AuthApi for HttpClient {
    async fn login(&self, form: &LoginForm) -> Result<AuthResponse, ApiError> {
        let response = self
            .send(Method::POST, &["auth", "login"], form, Auth::Anonymous)
            .await?;
        Ok(response.json().await?)
    }

    async fn signup(&self, form: &SignupForm) -> Result<AuthResponse, ApiError> {
        let response = self
            .send(Method::POST, &["auth", "signup"], form, Auth::Anonymous)
            .await?;
        Ok(response.json().await?)
    }
}
