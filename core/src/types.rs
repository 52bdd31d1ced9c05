//! Domain DTOs for the contacts API.
//!
//! # Design
//! These types mirror the backend's schema but are defined independently of
//! the mock-server crate; integration tests catch schema drift. Response types
//! are lenient (optional fields default) because the two backend flavors
//! return differently trimmed profiles.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::phone::PhoneNumbers;

/// A single contact record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Contact {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone_numbers: PhoneNumbers,
    pub created_at: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<NaiveDateTime>,
}

impl Contact {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Request payload for creating a contact.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewContact {
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default)]
    pub phone_numbers: Vec<String>,
}

/// Request payload for updating a contact. Only the fields present in the
/// JSON are applied; omitted fields remain unchanged on the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_numbers: Option<Vec<String>>,
}

/// One page of the contact list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContactPage {
    pub contacts: Vec<Contact>,
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
    pub pages: u32,
}

/// Pagination and search parameters for listing contacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub page: u32,
    pub per_page: u32,
    pub search: String,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 10,
            search: String::new(),
        }
    }
}

impl ListQuery {
    pub fn new(page: u32, per_page: u32, search: impl Into<String>) -> Self {
        Self {
            page,
            per_page,
            search: search.into(),
        }
    }
}

/// Gender values accepted at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            other => Err(format!("unknown gender '{other}' (expected Male, Female or Other)")),
        }
    }
}

/// The authenticated user's profile as returned by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default)]
    pub phone_numbers: PhoneNumbers,
    /// Server-side file name of the uploaded picture.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registered_on: Option<NaiveDateTime>,
}

/// An image attached to a registration.
#[derive(Clone, PartialEq, Eq)]
pub struct ProfilePicture {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for ProfilePicture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProfilePicture")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Registration form. Sent as multipart when a picture is attached,
/// JSON otherwise.
#[derive(Clone)]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    pub phone_numbers: Vec<String>,
    pub address: String,
    pub profile_picture: Option<ProfilePicture>,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("confirm_password", &"[REDACTED]")
            .field("date_of_birth", &self.date_of_birth)
            .field("gender", &self.gender)
            .field("phone_numbers", &self.phone_numbers)
            .field("address", &self.address)
            .field("profile_picture", &self.profile_picture)
            .finish()
    }
}

/// Login credentials.
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Successful register/login response.
#[derive(Clone, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
    #[serde(default)]
    pub message: Option<String>,
}

impl fmt::Debug for AuthResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthResponse")
            .field("token", &"[REDACTED]")
            .field("user", &self.user)
            .field("message", &self.message)
            .finish()
    }
}

/// Response of the token check endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenCheck {
    #[serde(default)]
    pub message: Option<String>,
    pub user: UserProfile,
}

/// Acknowledgement of a delete. Empty when the server answered 204.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DeleteAck {
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contact_accepts_encoded_phone_numbers() {
        let contact: Contact = serde_json::from_str(
            r#"{"id":7,"user_id":1,"first_name":"Ann","last_name":"Lee","company":null,
                "address":"1 Main St","phone_numbers":"[\"555-1234\"]",
                "created_at":"2024-03-01T10:15:30.123456","updated_at":"2024-03-01T10:15:30"}"#,
        )
        .unwrap();
        assert_eq!(contact.id, 7);
        assert_eq!(contact.full_name(), "Ann Lee");
        assert!(contact.company.is_none());
        assert_eq!(&*contact.phone_numbers, ["555-1234"]);
    }

    #[test]
    fn contact_requires_names() {
        let result: Result<Contact, _> =
            serde_json::from_str(r#"{"id":1,"last_name":"Lee","created_at":"2024-03-01T10:15:30"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn trimmed_profile_deserializes() {
        let user: UserProfile = serde_json::from_str(
            r#"{"id":3,"first_name":"Ann","last_name":"Lee","email":"ann@example.com"}"#,
        )
        .unwrap();
        assert_eq!(user.id, Some(3));
        assert!(user.phone_numbers.is_empty());
        assert!(user.gender.is_none());
    }

    #[test]
    fn update_omits_absent_fields() {
        let update = ContactUpdate {
            company: Some("Acme".to_string()),
            ..ContactUpdate::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({"company": "Acme"}));
    }

    #[test]
    fn gender_parses_case_insensitively() {
        assert_eq!("female".parse::<Gender>(), Ok(Gender::Female));
        assert_eq!("OTHER".parse::<Gender>(), Ok(Gender::Other));
        assert!("x".parse::<Gender>().is_err());
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let credentials = Credentials::new("ann@example.com", "hunter22");
        let rendered = format!("{credentials:?}");
        assert!(rendered.contains("ann@example.com"));
        assert!(!rendered.contains("hunter22"));
    }
}
