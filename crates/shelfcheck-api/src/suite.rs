use crate::assertions::{
    assert_auth_error, assert_user_basic_attributes, assert_user_created, assert_user_list,
    assert_user_updated, assert_valid_token,
};
use crate::client::{HttpClient, HttpResponse, Method, RequestSpec};
use crate::config::ApiConfig;
use crate::fixtures::{self, MISSING_USER_ID, VALID_USER_ID};
use crate::model::{User, UserListResponse};
use crate::service::{ApiService, AuthService, UserService};
use crate::validate::{
    validate_error_format, validate_error_message, validate_error_response,
    validate_field_exists, validate_response, validate_status, ErrorKind,
};
use crate::{Error, Result};
use shelfcheck_support::EvidenceSink;
use std::time::Instant;
use tracing::{info, warn};

const JSON: &str = "application/json";
const FORM: &str = "application/x-www-form-urlencoded";

/// One named check of the suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Case {
    ListUsers,
    GetUser,
    CreateUser,
    UpdateUser,
    PatchUser,
    DeleteUser,
    UserNotFound,
    LoginSuccess,
    LoginInvalidPassword,
    LoginWithoutPassword,
    LoginWithoutEmail,
    MissingApiKey,
    InvalidApiKey,
    InvalidCredentials,
    InvalidAuthFields,
    MalformedJson,
    FormEncodedBody,
    ResourceNotFound,
    MethodNotAllowed,
    UnknownEndpoint,
}

impl Case {
    /// Every case, in run order.
    pub const ALL: [Case; 20] = [
        Case::ListUsers,
        Case::GetUser,
        Case::CreateUser,
        Case::UpdateUser,
        Case::PatchUser,
        Case::DeleteUser,
        Case::UserNotFound,
        Case::LoginSuccess,
        Case::LoginInvalidPassword,
        Case::LoginWithoutPassword,
        Case::LoginWithoutEmail,
        Case::MissingApiKey,
        Case::InvalidApiKey,
        Case::InvalidCredentials,
        Case::InvalidAuthFields,
        Case::MalformedJson,
        Case::FormEncodedBody,
        Case::ResourceNotFound,
        Case::MethodNotAllowed,
        Case::UnknownEndpoint,
    ];

    /// Name used in configs and reports.
    pub fn name(self) -> &'static str {
        match self {
            Case::ListUsers => "list_users",
            Case::GetUser => "get_user",
            Case::CreateUser => "create_user",
            Case::UpdateUser => "update_user",
            Case::PatchUser => "patch_user",
            Case::DeleteUser => "delete_user",
            Case::UserNotFound => "user_not_found",
            Case::LoginSuccess => "login_success",
            Case::LoginInvalidPassword => "login_invalid_password",
            Case::LoginWithoutPassword => "login_without_password",
            Case::LoginWithoutEmail => "login_without_email",
            Case::MissingApiKey => "missing_api_key",
            Case::InvalidApiKey => "invalid_api_key",
            Case::InvalidCredentials => "invalid_credentials",
            Case::InvalidAuthFields => "invalid_auth_fields",
            Case::MalformedJson => "malformed_json",
            Case::FormEncodedBody => "form_encoded_body",
            Case::ResourceNotFound => "resource_not_found",
            Case::MethodNotAllowed => "method_not_allowed",
            Case::UnknownEndpoint => "unknown_endpoint",
        }
    }

    pub fn from_name(name: &str) -> Option<Case> {
        Case::ALL.into_iter().find(|c| c.name() == name)
    }

    /// `users`, `auth` or `errors`.
    pub fn group(self) -> &'static str {
        match self {
            Case::ListUsers
            | Case::GetUser
            | Case::CreateUser
            | Case::UpdateUser
            | Case::PatchUser
            | Case::DeleteUser
            | Case::UserNotFound => "users",
            Case::LoginSuccess
            | Case::LoginInvalidPassword
            | Case::LoginWithoutPassword
            | Case::LoginWithoutEmail => "auth",
            _ => "errors",
        }
    }
}

/// Outcome of one case.
#[derive(Debug, Clone)]
pub struct CaseResult {
    pub case: Case,
    pub passed: bool,
    pub error: Option<String>,
    /// Status of the last response the case received.
    pub status: Option<u16>,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Default)]
pub struct SuiteReport {
    pub results: Vec<CaseResult>,
    pub duration_ms: u64,
}

impl SuiteReport {
    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.passed).count()
    }

    pub fn failed(&self) -> Vec<&CaseResult> {
        self.results.iter().filter(|r| !r.passed).collect()
    }

    pub fn all_passed(&self) -> bool {
        self.results.iter().all(|r| r.passed)
    }
}

/// Runs the selected cases one after another.
///
/// Each case is throttled before and after, and starts from a fresh login:
/// the bearer token is fetched once per case and an authenticated request
/// spec is built from it.
pub struct ApiSuite<'a> {
    client: &'a dyn HttpClient,
    config: &'a ApiConfig,
    evidence: &'a dyn EvidenceSink,
}

impl<'a> ApiSuite<'a> {
    pub fn new(
        client: &'a dyn HttpClient,
        config: &'a ApiConfig,
        evidence: &'a dyn EvidenceSink,
    ) -> Self {
        Self {
            client,
            config,
            evidence,
        }
    }

    pub async fn run(&self) -> SuiteReport {
        let start = Instant::now();
        let mut results = Vec::new();
        for case in self.config.selected_cases() {
            results.push(self.run_case(case).await);
        }
        let report = SuiteReport {
            results,
            duration_ms: start.elapsed().as_millis() as u64,
        };
        info!(
            "{}: {}/{} case(s) passed",
            self.config.name,
            report.passed(),
            report.results.len()
        );
        report
    }

    pub async fn run_case(&self, case: Case) -> CaseResult {
        let start = Instant::now();
        self.evidence
            .begin_test(&format!("{} / {}", case.group(), case.name()));
        self.throttle().await;

        let api = ApiService::new(self.client, self.evidence);
        let token = AuthService::new(&api, self.config).auth_token().await;
        let spec = RequestSpec::authenticated(self.config, token.as_deref());

        let outcome = self.execute(case, &api, &spec).await;
        self.throttle().await;

        let (passed, error, status) = match outcome {
            Ok(status) => {
                info!("✓ {}", case.name());
                (true, None, Some(status))
            }
            Err(e) => {
                warn!("✗ {}: {}", case.name(), e);
                api.attach_error(&e.to_string());
                (false, Some(e.to_string()), None)
            }
        };
        CaseResult {
            case,
            passed,
            error,
            status,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    async fn throttle(&self) {
        let pause = self.config.throttle();
        if !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }
    }

    /// Run one case; returns the status of its last response.
    async fn execute(&self, case: Case, api: &ApiService<'_>, spec: &RequestSpec) -> Result<u16> {
        let config = self.config;
        let users = UserService::new(api, config);
        let auth = AuthService::new(api, config);

        let response = match case {
            Case::ListUsers => {
                let r = users.list_users(spec, 1).await?;
                validate_response(200, &r, |r| {
                    let list: UserListResponse = r.parse()?;
                    assert_user_list(&list, 1)?;
                    match list.data.first() {
                        Some(first) => assert_user_basic_attributes(first),
                        None => Ok(()),
                    }
                })?;
                r
            }
            Case::GetUser => {
                let r = users.get_user(spec, VALID_USER_ID).await?;
                validate_response(200, &r, |r| {
                    let user: User = r.field_as("data")?;
                    assert_user_basic_attributes(&user)?;
                    if user.id != Some(VALID_USER_ID) {
                        return Err(Error::AssertionFailed(format!(
                            "user id: expected {}, got {:?}",
                            VALID_USER_ID, user.id
                        )));
                    }
                    Ok(())
                })?;
                r
            }
            Case::CreateUser => {
                let new_user = fixtures::valid_user();
                let r = users.create_user(spec, &new_user).await?;
                validate_response(201, &r, |r| assert_user_created(&new_user, &r.parse()?))?;
                r
            }
            Case::UpdateUser => {
                let update = fixtures::user_for_update();
                let r = users.update_user(spec, VALID_USER_ID, &update).await?;
                validate_response(200, &r, |r| assert_user_updated(&update, &r.parse()?))?;
                r
            }
            Case::PatchUser => {
                let partial = fixtures::user_for_partial_update();
                let r = users.patch_user(spec, VALID_USER_ID, &partial).await?;
                validate_response(200, &r, |r| assert_user_updated(&partial, &r.parse()?))?;
                r
            }
            Case::DeleteUser => {
                let r = users.delete_user(spec, VALID_USER_ID).await?;
                validate_status(204, &r)?;
                r
            }
            Case::UserNotFound => {
                let r = users.get_user(spec, MISSING_USER_ID).await?;
                validate_status(404, &r)?;
                r
            }
            Case::LoginSuccess => {
                let r = auth.login(spec, &fixtures::valid_credentials(config)).await?;
                validate_response(200, &r, assert_valid_token)?;
                r
            }
            Case::LoginInvalidPassword => {
                // the reference server hands out a token for any password
                let r = auth
                    .login(spec, &fixtures::invalid_password_credentials(config))
                    .await?;
                validate_response(200, &r, assert_valid_token)?;
                r
            }
            Case::LoginWithoutPassword => {
                let r = auth
                    .login(spec, &fixtures::credentials_without_password(config))
                    .await?;
                validate_response(400, &r, |r| assert_auth_error(r, "password"))?;
                r
            }
            Case::LoginWithoutEmail => {
                let r = auth
                    .login(spec, &fixtures::credentials_without_email(config))
                    .await?;
                validate_response(400, &r, |r| assert_auth_error(r, "email"))?;
                r
            }
            Case::MissingApiKey => {
                let r = api
                    .get(&RequestSpec::base(config), &config.users_endpoint)
                    .await?;
                validate_error_response(&r, ErrorKind::Authentication)?;
                validate_error_message(&r, "error", Some("Missing API key"))?;
                validate_field_exists(&r, "how_to_get_one")?;
                r
            }
            Case::InvalidApiKey => {
                let spec = RequestSpec::base(config)
                    .header(&config.api_key_header, fixtures::INVALID_API_KEY);
                let r = api.get(&spec, &config.users_endpoint).await?;
                validate_error_response(&r, ErrorKind::Authentication)?;
                r
            }
            Case::InvalidCredentials => {
                let r = auth.login(spec, &fixtures::invalid_credentials()).await?;
                validate_error_response(&r, ErrorKind::Authentication)?;
                validate_error_message(&r, "error", None)?;
                r
            }
            Case::InvalidAuthFields => {
                let mut last = None;
                for body in fixtures::INVALID_AUTH_BODIES {
                    let r = api
                        .send_raw(spec, Method::Post, &config.login_endpoint, JSON, body)
                        .await?;
                    check_invalid_auth_fields(&r)
                        .map_err(|e| Error::AssertionFailed(format!("body {}: {}", body, e)))?;
                    last = Some(r);
                }
                last.ok_or_else(|| Error::AssertionFailed("no auth bodies to send".into()))?
            }
            Case::MalformedJson => {
                let r = api
                    .send_raw(
                        spec,
                        Method::Post,
                        &config.login_endpoint,
                        JSON,
                        fixtures::MALFORMED_JSON,
                    )
                    .await?;
                // a lenient server may accept it; only a rejection is checked
                if r.status >= 400 {
                    validate_error_format(&r)?;
                }
                r
            }
            Case::FormEncodedBody => {
                let r = api
                    .send_raw(
                        &RequestSpec::with_api_key(config),
                        Method::Post,
                        &config.login_endpoint,
                        FORM,
                        &fixtures::form_credentials(config),
                    )
                    .await?;
                check_form_login(&r)?;
                r
            }
            Case::ResourceNotFound => {
                let r = users.get_user(spec, 9999).await?;
                validate_error_response(&r, ErrorKind::NotFound)?;
                r
            }
            Case::MethodNotAllowed => {
                let r = api.delete(spec, &config.login_endpoint).await?;
                match r.status {
                    405 => validate_error_response(&r, ErrorKind::MethodNotAllowed)?,
                    s if s >= 400 => validate_error_format(&r)?,
                    s => {
                        return Err(Error::AssertionFailed(format!(
                            "DELETE {} should be rejected, got {}",
                            config.login_endpoint, s
                        )))
                    }
                }
                r
            }
            Case::UnknownEndpoint => {
                let r = api.get(spec, "/unknown/23").await?;
                validate_error_response(&r, ErrorKind::NotFound)?;
                r
            }
        };
        Ok(response.status)
    }
}

/// A rejected login body: 400 reads as a validation error, anything else
/// as an authentication error, and some error text must be present.
fn check_invalid_auth_fields(r: &HttpResponse) -> Result<()> {
    let kind = if r.status == 400 {
        ErrorKind::Validation
    } else {
        ErrorKind::Authentication
    };
    validate_error_response(r, kind)?;
    if r.string_field("error").is_some() {
        return Ok(());
    }
    let body = r.body.to_lowercase();
    if body.contains("error") || body.contains("message") {
        Ok(())
    } else {
        Err(Error::AssertionFailed("response carries no error information".into()))
    }
}

/// A form-encoded login is either rejected with a proper error payload or
/// accepted; an accepted response that mentions a token must carry one.
fn check_form_login(r: &HttpResponse) -> Result<()> {
    if r.status >= 400 {
        return validate_error_format(r);
    }
    if r.body.contains("token") {
        if !r.is_json() {
            return Err(Error::AssertionFailed(
                "form login response is not valid JSON".into(),
            ));
        }
        assert_valid_token(r)?;
    }
    Ok(())
}
