//! Canned payloads used by the suite.

use crate::config::ApiConfig;
use crate::model::{Credentials, User};

/// User that exists on the reference server.
pub const VALID_USER_ID: u64 = 2;
/// User that does not.
pub const MISSING_USER_ID: u64 = 999;

/// Login bodies with empty or missing fields.
pub const INVALID_AUTH_BODIES: [&str; 4] = [
    r#"{"email": "eve.holt@reqres.in", "password": ""}"#,
    r#"{"email": "", "password": "cityslicka"}"#,
    r#"{"email": "", "password": ""}"#,
    "{}",
];

pub const MALFORMED_JSON: &str = "{ email: invalid-format, password: missing-quotes }";

pub const INVALID_API_KEY: &str = "invalid-api-key-12345";

pub fn valid_user() -> User {
    User {
        first_name: Some("João".into()),
        last_name: Some("Silva".into()),
        email: Some("joao.silva@email.com".into()),
        job: Some("QA Engineer".into()),
        ..User::default()
    }
}

pub fn user_for_update() -> User {
    User {
        first_name: Some("João Atualizado".into()),
        last_name: Some("Silva Atualizado".into()),
        job: Some("Senior QA Engineer".into()),
        ..User::default()
    }
}

pub fn user_for_partial_update() -> User {
    User {
        job: Some("Automation Specialist".into()),
        ..User::default()
    }
}

pub fn valid_credentials(config: &ApiConfig) -> Credentials {
    Credentials::new(Some(&config.auth.email), Some(&config.auth.password))
}

pub fn invalid_password_credentials(config: &ApiConfig) -> Credentials {
    Credentials::new(Some(&config.auth.email), Some("senhaInvalida"))
}

pub fn credentials_without_password(config: &ApiConfig) -> Credentials {
    Credentials::new(Some(&config.auth.email), None)
}

pub fn credentials_without_email(config: &ApiConfig) -> Credentials {
    Credentials::new(None, Some(&config.auth.password))
}

/// Unknown account.
pub fn invalid_credentials() -> Credentials {
    Credentials::new(Some("invalid@example.com"), Some("invalid"))
}

/// The configured account as a form-urlencoded body.
pub fn form_credentials(config: &ApiConfig) -> String {
    format!(
        "email={}&password={}",
        config.auth.email, config.auth.password
    )
}
