use axum::{
    Router,
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, header},
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use cookie::{Cookie, SameSite};
use dioxus::server::ServerFnError;
use jiff::Timestamp;
use oauth2::{
    AuthUrl, ClientId, CsrfToken, EndpointNotSet, EndpointSet, PkceCodeChallenge, PkceCodeVerifier,
    RedirectUrl, Scope, StandardErrorResponse, TokenUrl, basic::BasicClient,
};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::RwLock;
use types::{Result, SESSION_COOKIE_NAME, err};

use crate::{
    CONFIG,
    http::ReqwestExt,
    identity::Identity,
    storage::{Database, Session},
};

type ConfiguredClient = oauth2::Client<
    StandardErrorResponse<oauth2::basic::BasicErrorResponseType>,
    oauth2::StandardTokenResponse<oauth2::EmptyExtraTokenFields, oauth2::basic::BasicTokenType>,
    oauth2::StandardTokenIntrospectionResponse<
        oauth2::EmptyExtraTokenFields,
        oauth2::basic::BasicTokenType,
    >,
    oauth2::StandardRevocableToken,
    StandardErrorResponse<oauth2::RevocationErrorResponseType>,
    EndpointSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointSet,
>;

const PKCE_TTL: Duration = Duration::from_secs(600);

#[derive(Clone)]
pub struct AuthState {
    pub oauth_client: ConfiguredClient,
    pub pkce_verifiers: Arc<RwLock<HashMap<String, (String, Instant)>>>,
}

impl AuthState {
    pub fn new() -> Result<Self> {
        let oauth_client = BasicClient::new(ClientId::new(CONFIG.oauth_client_id.clone()))
            .set_auth_uri(AuthUrl::from_url(CONFIG.oidc_authorize_url.clone()))
            .set_token_uri(TokenUrl::from_url(CONFIG.oidc_token_url.clone()))
            .set_redirect_uri(RedirectUrl::from_url(callback_url()?));

        Ok(Self {
            oauth_client,
            pkce_verifiers: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    async fn cleanup_old_verifiers(&self) {
        let mut verifiers = self.pkce_verifiers.write().await;
        let now = Instant::now();
        verifiers.retain(|_, (_, created)| now.duration_since(*created) < PKCE_TTL);
    }
}

fn callback_url() -> Result<url::Url> {
    Ok(CONFIG.app_url.join("/auth/callback")?)
}

pub fn auth_router(state: AuthState) -> Router {
    Router::new()
        .route("/auth/login", get(login))
        .route("/auth/callback", get(callback))
        .route("/auth/logout", get(logout))
        .with_state(state)
}

async fn login(State(state): State<AuthState>) -> impl IntoResponse {
    state.cleanup_old_verifiers().await;

    let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();
    let csrf_token = CsrfToken::new_random();

    state.pkce_verifiers.write().await.insert(
        csrf_token.secret().clone(),
        (pkce_verifier.secret().clone(), Instant::now()),
    );

    let (auth_url, _csrf) = state
        .oauth_client
        .authorize_url(|| csrf_token)
        .add_scope(Scope::new("openid".to_string()))
        .add_scope(Scope::new("profile".to_string()))
        .add_scope(Scope::new("email".to_string()))
        .set_pkce_challenge(pkce_challenge)
        .url();

    Redirect::to(auth_url.as_str())
}

#[derive(Deserialize)]
struct AuthCallback {
    code: String,
    state: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: SecretString,
}

#[derive(Deserialize)]
struct UserInfoResponse {
    sub: String,
    preferred_username: Option<String>,
    name: Option<String>,
    email: Option<String>,
    email_verified: Option<bool>,
}

impl From<UserInfoResponse> for Identity {
    /// An unverified email is dropped: it is what links the identity to a
    /// user record and its roles.
    fn from(info: UserInfoResponse) -> Self {
        let username = info.preferred_username.unwrap_or_else(|| info.sub.clone());
        let verified = info.email_verified == Some(true);

        Self {
            display_name: info.name.unwrap_or_else(|| username.clone()),
            email: info
                .email
                .filter(|_| verified)
                .map(|e| e.trim().to_lowercase()),
            subject: info.sub,
            username,
        }
    }
}

async fn callback(
    State(state): State<AuthState>,
    Query(params): Query<AuthCallback>,
) -> std::result::Result<impl IntoResponse, ServerFnError> {
    callback_inner(state, params).await.map_err(Into::into)
}

async fn callback_inner(state: AuthState, params: AuthCallback) -> Result<Response> {
    let (verifier_secret, _) = state
        .pkce_verifiers
        .write()
        .await
        .remove(&params.state)
        .ok_or_else(|| err!("missing pkce verifier"))?;

    let pkce_verifier = PkceCodeVerifier::new(verifier_secret);

    let client = reqwest::Client::new();
    let redirect_uri = callback_url()?;

    let token_response: TokenResponse = client
        .post(CONFIG.oidc_token_url.clone())
        .form(&[
            ("grant_type", "authorization_code"),
            ("code", &params.code),
            ("redirect_uri", redirect_uri.as_str()),
            ("client_id", &CONFIG.oauth_client_id),
            ("client_secret", CONFIG.oauth_client_secret.expose_secret()),
            ("code_verifier", pkce_verifier.secret()),
        ])
        .try_send()
        .await?;

    let user_info: UserInfoResponse = client
        .get(CONFIG.oidc_userinfo_url.clone())
        .bearer_auth(token_response.access_token.expose_secret())
        .try_send()
        .await?;

    let identity = Identity::from(user_info);

    let db = Database::shared();
    let user_id = match &identity.email {
        Some(email) => db.find_user_by_email(email).await?.map(|u| u.id),
        None => None,
    };
    db.record_login(user_id, Timestamp::now()).await?;
    tracing::info!(subject = %identity.subject, ?user_id, "signed in");

    let session = Session::create(identity).await?;
    let token = session.as_token()?;

    let cookie = Cookie::build((SESSION_COOKIE_NAME, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(CONFIG.cookie_secure)
        .build();

    let mut response = Redirect::to("/").into_response();
    response
        .headers_mut()
        .insert(header::SET_COOKIE, HeaderValue::from_str(&cookie.to_string())?);

    Ok(response)
}

/// The session token from the request's cookie header, if any.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;

    Cookie::split_parse(cookie_header)
        .filter_map(|c| c.ok())
        .find(|c| c.name() == SESSION_COOKIE_NAME)
        .map(|c| c.value().to_string())
}

async fn logout(headers: HeaderMap) -> impl IntoResponse {
    if let Some(token) = session_token(&headers)
        && let Err(error) = Session::delete_token(&token).await
    {
        tracing::warn!(?error, "failed to delete session");
    }

    let cookie = Cookie::build((SESSION_COOKIE_NAME, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(cookie::time::Duration::ZERO)
        .build();

    let mut response = Redirect::to("/login").into_response();
    if let Ok(value) = HeaderValue::from_str(&cookie.to_string()) {
        response.headers_mut().insert(header::SET_COOKIE, value);
    }

    response
}
