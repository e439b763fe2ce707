use crate::api::JobsApi;
use crate::credentials::{CredentialStore, CREDENTIAL_TTL_DAYS};
use crate::error::ApiError;
use crate::models::LoginRequest;
use crate::router::{NavMode, Navigator, Route};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Credential stored, navigated home.
    LoggedIn,
    /// Rejected; message shown inline, nothing stored.
    Rejected(String),
}

/// Login screen is public but bounces an already authenticated user home.
pub fn on_mount(credentials: &CredentialStore, nav: &mut Navigator) -> bool {
    if *nav.current() == Route::Login && credentials.is_present() {
        nav.navigate(Route::Home, NavMode::Replace);
        true
    } else {
        false
    }
}

/// Exchange username/password for a token, persist it and go home.
///
/// Transport and decode errors are reported as rejections too, so the caller
/// always gets something to show.
pub async fn submit(
    api: &dyn JobsApi,
    credentials: &mut CredentialStore,
    nav: &mut Navigator,
    username: &str,
    password: &str,
) -> anyhow::Result<LoginOutcome> {
    let request = LoginRequest {
        username: username.to_string(),
        password: password.to_string(),
    };

    match api.login(&request).await {
        Ok(token) => {
            credentials.set(&token, CREDENTIAL_TTL_DAYS)?;
            nav.navigate(Route::Home, NavMode::Replace);
            tracing::info!(%username, "logged in");
            Ok(LoginOutcome::LoggedIn)
        }
        Err(e) => {
            tracing::warn!(%username, "login failed: {e}");
            let message = match e {
                ApiError::AuthFailure(msg) => msg,
                other => other.display_message(),
            };
            Ok(LoginOutcome::Rejected(message))
        }
    }
}

/// Explicit logout: forget the credential and land on the login screen with
/// history replaced.
pub fn logout(credentials: &mut CredentialStore, nav: &mut Navigator) -> anyhow::Result<()> {
    credentials.clear()?;
    nav.navigate(Route::Login, NavMode::Replace);
    Ok(())
}
