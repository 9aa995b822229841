//! Login, registration and session lifecycle

use serde::Deserialize;
use tracing::{info, instrument};

use crate::client::{ApiRequest, AuthenticatedClient};
use crate::error::{ClientError, Result};
use crate::session::{Session, SessionKey, StoreError, load_user, read_token};
use crate::types::{AuthResponse, LoginForm, RegisterForm, User};

const REGISTER_PATH: &str = "/api/auth/register/";
const LOGIN_PATH: &str = "/api/auth/login/";
const PROFILE_PATH: &str = "/api/auth/profile/";

#[derive(Deserialize)]
struct ProfileResponse {
    user: User,
}

/// Authentication operations on top of an [`AuthenticatedClient`].
///
/// Login and registration store the returned session record in the client's session store;
/// logout removes it.
#[derive(Debug, Clone)]
pub struct AuthService {
    client: AuthenticatedClient,
}

impl AuthService {
    pub fn new(client: AuthenticatedClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &AuthenticatedClient {
        &self.client
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthResponse> {
        let form = LoginForm {
            username: username.to_string(),
            password: password.to_string(),
        };

        let response: AuthResponse = self
            .client
            .send_json(ApiRequest::post(LOGIN_PATH).json(&form)?)
            .await?;

        self.store_session(&response)?;
        info!(user_id = response.user.id, "logged in");
        Ok(response)
    }

    #[instrument(skip(self, form), fields(username = %form.username))]
    pub async fn register(&self, form: &RegisterForm) -> Result<AuthResponse> {
        let response: AuthResponse = self
            .client
            .send_json(ApiRequest::post(REGISTER_PATH).json(form)?)
            .await?;

        self.store_session(&response)?;
        info!(user_id = response.user.id, "registered");
        Ok(response)
    }

    /// Remove the whole session record. Nothing is sent to the server.
    pub fn logout(&self) -> std::result::Result<(), StoreError> {
        self.client.store().clear()?;
        info!("logged out");
        Ok(())
    }

    /// User stored at login, without a round trip.
    pub fn current_user(&self) -> std::result::Result<Option<User>, StoreError> {
        load_user(self.client.store())
    }

    /// A usable access token is stored. It may still be expired; the client refreshes on
    /// demand.
    pub fn is_authenticated(&self) -> std::result::Result<bool, StoreError> {
        Ok(read_token(self.client.store(), SessionKey::AccessToken)?.is_some())
    }

    /// Guard for operations that need a logged-in user.
    pub fn require_authenticated(&self) -> Result<()> {
        if self.is_authenticated()? {
            Ok(())
        } else {
            Err(ClientError::NotAuthenticated {
                login_path: self.client.config().login_path.clone(),
            })
        }
    }

    /// Fetch the current user from the server.
    #[instrument(skip(self))]
    pub async fn profile(&self) -> Result<User> {
        let response: ProfileResponse = self
            .client
            .send_json(ApiRequest::get(PROFILE_PATH))
            .await?;
        Ok(response.user)
    }

    fn store_session(&self, response: &AuthResponse) -> Result<()> {
        Session {
            user: response.user.clone(),
            credentials: response.tokens.clone(),
        }
        .persist(self.client.store())?;
        Ok(())
    }
}
