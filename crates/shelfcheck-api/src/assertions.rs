//! Domain checks on decoded users and login responses.

use crate::client::HttpResponse;
use crate::model::{User, UserListResponse};
use crate::{Error, Result};

fn ensure(condition: bool, msg: impl FnOnce() -> String) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(Error::AssertionFailed(msg()))
    }
}

fn ensure_eq(field: &str, expected: &Option<String>, actual: &Option<String>) -> Result<()> {
    ensure(expected == actual, || {
        format!("{}: expected {:?}, got {:?}", field, expected, actual)
    })
}

/// The body carries a non-empty `token`.
pub fn assert_valid_token(response: &HttpResponse) -> Result<()> {
    let token = response.string_field("token");
    ensure(token.is_some_and(|t| !t.is_empty()), || {
        "token is missing or empty".into()
    })
}

/// The body carries an `error` message mentioning `keyword` (case-insensitive).
pub fn assert_auth_error(response: &HttpResponse, keyword: &str) -> Result<()> {
    let Some(message) = response.string_field("error") else {
        return Err(Error::AssertionFailed("error message is missing".into()));
    };
    ensure(
        keyword.is_empty() || message.to_lowercase().contains(&keyword.to_lowercase()),
        || format!("error message '{}' should mention '{}'", message, keyword),
    )
}

pub fn assert_auth_error_status(response: &HttpResponse) -> Result<()> {
    ensure(matches!(response.status, 400 | 401 | 403), || {
        format!("expected status 400, 401 or 403, got {}", response.status)
    })
}

/// id, email, first and last name are all present.
pub fn assert_user_basic_attributes(user: &User) -> Result<()> {
    ensure(user.id.is_some(), || "user id is missing".into())?;
    ensure(user.email.is_some(), || "user email is missing".into())?;
    ensure(user.first_name.is_some(), || "user first name is missing".into())?;
    ensure(user.last_name.is_some(), || "user last name is missing".into())
}

pub fn assert_user_list(list: &UserListResponse, expected_page: u32) -> Result<()> {
    ensure(list.page == expected_page, || {
        format!("page: expected {}, got {}", expected_page, list.page)
    })?;
    ensure(!list.data.is_empty(), || "user list is empty".into())
}

/// The echo of a create request matches what was sent and has an id and
/// creation time.
pub fn assert_user_created(expected: &User, actual: &User) -> Result<()> {
    ensure(actual.id.is_some(), || "created user has no id".into())?;
    ensure_eq("first_name", &expected.first_name, &actual.first_name)?;
    ensure_eq("last_name", &expected.last_name, &actual.last_name)?;
    ensure_eq("email", &expected.email, &actual.email)?;
    ensure_eq("job", &expected.job, &actual.job)?;
    ensure(actual.created_at.is_some(), || "createdAt is missing".into())
}

/// Fields set in `expected` are echoed back, and an update time is present.
pub fn assert_user_updated(expected: &User, actual: &User) -> Result<()> {
    if expected.first_name.is_some() {
        ensure_eq("first_name", &expected.first_name, &actual.first_name)?;
    }
    if expected.last_name.is_some() {
        ensure_eq("last_name", &expected.last_name, &actual.last_name)?;
    }
    if expected.job.is_some() {
        ensure_eq("job", &expected.job, &actual.job)?;
    }
    ensure(actual.updated_at.is_some(), || "updatedAt is missing".into())
}
