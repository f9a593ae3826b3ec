//! Request and response bodies of the users API.

use serde::{Deserialize, Deserializer, Serialize};

/// A user as sent to and returned by the API. Every field is optional so the
/// same type serves full records, partial updates and echo responses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "UserWire")]
pub struct User {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job: Option<String>,
    #[serde(rename = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(rename = "updatedAt", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl User {
    /// First and last name joined, when a first name is known.
    pub fn full_name(&self) -> Option<String> {
        let first = self.first_name.as_deref()?;
        Some(match self.last_name.as_deref() {
            Some(last) => format!("{} {}", first, last),
            None => first.to_string(),
        })
    }
}

/// Incoming shape: `name` fills in for a missing `first_name`, and `id` may
/// arrive as a number or a numeric string.
#[derive(Deserialize)]
struct UserWire {
    #[serde(default, deserialize_with = "lenient_id")]
    id: Option<u64>,
    email: Option<String>,
    first_name: Option<String>,
    name: Option<String>,
    last_name: Option<String>,
    avatar: Option<String>,
    job: Option<String>,
    #[serde(rename = "createdAt")]
    created_at: Option<String>,
    #[serde(rename = "updatedAt")]
    updated_at: Option<String>,
}

impl From<UserWire> for User {
    fn from(w: UserWire) -> Self {
        Self {
            id: w.id,
            email: w.email,
            first_name: w.first_name.or(w.name),
            last_name: w.last_name,
            avatar: w.avatar,
            job: w.job,
            created_at: w.created_at,
            updated_at: w.updated_at,
        }
    }
}

fn lenient_id<'de, D>(d: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Number(u64),
        Text(String),
    }

    Ok(match Option::<Id>::deserialize(d)? {
        Some(Id::Number(n)) => Some(n),
        Some(Id::Text(s)) => s.trim().parse().ok(),
        None => None,
    })
}

/// One page of `GET /users`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserListResponse {
    pub page: u32,
    pub per_page: u32,
    pub total: u32,
    pub total_pages: u32,
    pub data: Vec<User>,
    pub support: Option<Support>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Support {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub text: String,
}

/// Login body. Absent fields are left out of the JSON entirely.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Credentials {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl Credentials {
    pub fn new(email: Option<&str>, password: Option<&str>) -> Self {
        Self {
            email: email.map(str::to_string),
            password: password.map(str::to_string),
        }
    }
}
