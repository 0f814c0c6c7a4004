use async_trait::async_trait;
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Mutex;

use immoco::api::AuthApi;
use immoco::error::ApiError;
use immoco::models::{AuthResponse, LoginRequest, RegisterRequest, UserProfile};
use immoco::{Session, SessionStore};

fn session_path(name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "immoco-{}-{}.json",
        name,
        std::process::id()
    ));
    let _ = std::fs::remove_file(&path);
    path
}

fn profile(name: &str) -> UserProfile {
    UserProfile {
        id: "u1".to_string(),
        email: "awa@example.ga".to_string(),
        name: name.to_string(),
        phone: None,
        created_at: Utc::now(),
    }
}

fn auth() -> AuthResponse {
    AuthResponse {
        token: "token-123".to_string(),
        user: profile("Awa"),
    }
}

/// Answers `/auth/me` from a fixed result
struct MockAuth {
    me: Mutex<Option<Result<UserProfile, ApiError>>>,
}

impl MockAuth {
    fn answering(me: Result<UserProfile, ApiError>) -> Self {
        Self {
            me: Mutex::new(Some(me)),
        }
    }
}

#[async_trait]
impl AuthApi for MockAuth {
    async fn register(&self, _request: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        Ok(auth())
    }

    async fn login(&self, _request: &LoginRequest) -> Result<AuthResponse, ApiError> {
        Ok(auth())
    }

    async fn me(&self) -> Result<UserProfile, ApiError> {
        self.me
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Err(ApiError::Unauthorized("no answer".to_string())))
    }
}

#[tokio::test]
async fn sign_in_survives_a_restart() {
    let path = session_path("restart");

    let mut session = Session::new(SessionStore::new(&path));
    session.sign_in(auth()).await.unwrap();
    assert!(path.exists());

    let mut restored = Session::new(SessionStore::new(&path));
    assert!(!restored.is_authenticated());
    restored.rehydrate().await.unwrap();
    assert_eq!(restored.token(), Some("token-123"));
    assert_eq!(restored.user().unwrap().name, "Awa");

    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn logout_removes_the_stored_credential() {
    let path = session_path("logout");
    let mut session = Session::new(SessionStore::new(&path));
    session.sign_in(auth()).await.unwrap();

    session.logout().await.unwrap();

    assert!(!session.is_authenticated());
    assert!(!path.exists());
    session.logout().await.unwrap();
}

#[tokio::test]
async fn rehydrate_reads_the_store_once() {
    let path = session_path("once");
    let mut session = Session::new(SessionStore::new(&path));
    session.rehydrate().await.unwrap();
    assert!(!session.is_authenticated());

    Session::new(SessionStore::new(&path)).sign_in(auth()).await.unwrap();
    session.rehydrate().await.unwrap();
    assert!(!session.is_authenticated());

    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn corrupt_session_file_is_discarded() {
    let path = session_path("corrupt");
    tokio::fs::write(&path, b"{not json").await.unwrap();

    let mut session = Session::new(SessionStore::new(&path));
    session.rehydrate().await.unwrap();

    assert!(!session.is_authenticated());
    assert!(!path.exists());
}

#[tokio::test]
async fn rejected_token_signs_out() {
    let path = session_path("rejected");
    let mut session = Session::new(SessionStore::new(&path));
    session.sign_in(auth()).await.unwrap();

    let api = MockAuth::answering(Err(ApiError::Unauthorized("Invalid token".to_string())));
    assert!(!session.verify(&api).await.unwrap());
    assert!(!session.is_authenticated());
    assert!(!path.exists());
}

#[tokio::test]
async fn accepted_token_refreshes_the_profile() {
    let path = session_path("accepted");
    let mut session = Session::new(SessionStore::new(&path));
    session.sign_in(auth()).await.unwrap();

    let api = MockAuth::answering(Ok(profile("Awa Ndong")));
    assert!(session.verify(&api).await.unwrap());
    assert_eq!(session.user().unwrap().name, "Awa Ndong");

    let mut restored = Session::new(SessionStore::new(&path));
    restored.rehydrate().await.unwrap();
    assert_eq!(restored.user().unwrap().name, "Awa Ndong");

    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn unreachable_backend_keeps_the_session() {
    let path = session_path("offline");
    let mut session = Session::new(SessionStore::new(&path));
    session.sign_in(auth()).await.unwrap();

    let api = MockAuth::answering(Err(ApiError::Status {
        status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
        body: "maintenance".to_string(),
    }));
    assert!(session.verify(&api).await.unwrap());
    assert!(session.is_authenticated());

    let _ = std::fs::remove_file(&path);
}
