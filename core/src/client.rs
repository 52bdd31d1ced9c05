//! Stateless HTTP request builder and response parser for the contacts API.
//!
//! # Design
//! `ContactsClient` holds only a `base_url` and the endpoint prefixes. Each
//! operation is split into a `build_*` method that produces an `HttpRequest`
//! and a `parse_*` method that consumes an `HttpResponse`. Building performs
//! the shape validation (password confirmation, phone list cleanup); parsing
//! classifies the status before decoding.
//!
//! Requests leave here without credentials. `Dispatcher::authorize` adds the
//! bearer header.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::dispatch::classify;
use crate::endpoints::Endpoints;
use crate::error::{ApiError, ValidationError};
use crate::http::{FormPart, HttpMethod, HttpRequest, HttpResponse, RequestBody, RequestScope};
use crate::phone::{self, PhoneNumbers};
use crate::types::{
    AuthResponse, Contact, ContactPage, ContactUpdate, Credentials, DeleteAck, ListQuery,
    NewContact, Registration, TokenCheck,
};

const JSON_CONTENT_TYPE: (&str, &str) = ("content-type", "application/json");

/// Synchronous, stateless request builder and response parser.
#[derive(Debug, Clone)]
pub struct ContactsClient {
    base_url: String,
    endpoints: Endpoints,
}

impl ContactsClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_endpoints(base_url, Endpoints::standard())
    }

    pub fn with_endpoints(base_url: &str, endpoints: Endpoints) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            endpoints,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    // -- auth ---------------------------------------------------------------

    /// Build the registration request. Rejects mismatched passwords locally.
    ///
    /// A registration carrying a profile picture is sent as multipart with
    /// `phone_numbers` JSON-encoded in a single text part; otherwise as JSON.
    pub fn build_register(&self, form: &Registration) -> Result<HttpRequest, ApiError> {
        if form.password != form.confirm_password {
            return Err(ValidationError::PasswordMismatch.into());
        }
        let phones = phone::clean(&form.phone_numbers);
        let body = match &form.profile_picture {
            Some(picture) => {
                let date_of_birth = form.date_of_birth.format("%Y-%m-%d").to_string();
                RequestBody::Multipart(vec![
                    FormPart::text("first_name", form.first_name.as_str()),
                    FormPart::text("last_name", form.last_name.as_str()),
                    FormPart::text("email", form.email.as_str()),
                    FormPart::text("password", form.password.as_str()),
                    FormPart::text("confirm_password", form.confirm_password.as_str()),
                    FormPart::text("date_of_birth", date_of_birth),
                    FormPart::text("gender", form.gender.as_str()),
                    FormPart::text("address", form.address.as_str()),
                    FormPart::text("phone_numbers", PhoneNumbers::new(phones).to_encoded()),
                    FormPart::File {
                        name: "profile_picture".to_string(),
                        file_name: picture.file_name.clone(),
                        content_type: picture.content_type.clone(),
                        bytes: picture.bytes.clone(),
                    },
                ])
            }
            None => RequestBody::Json(to_json(&serde_json::json!({
                "first_name": form.first_name,
                "last_name": form.last_name,
                "email": form.email,
                "password": form.password,
                "confirm_password": form.confirm_password,
                "date_of_birth": form.date_of_birth,
                "gender": form.gender,
                "address": form.address,
                "phone_numbers": phones,
            }))?),
        };
        let headers = match body {
            RequestBody::Json(_) => json_headers(),
            RequestBody::Multipart(_) => Vec::new(),
        };
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: self.url(&self.endpoints.register()),
            headers,
            body: Some(body),
            scope: RequestScope::Auth,
        })
    }

    pub fn build_login(&self, credentials: &Credentials) -> Result<HttpRequest, ApiError> {
        if credentials.email.trim().is_empty() {
            return Err(ValidationError::MissingField("email").into());
        }
        if credentials.password.is_empty() {
            return Err(ValidationError::MissingField("password").into());
        }
        self.json_request(
            HttpMethod::Post,
            &self.endpoints.login(),
            credentials,
            RequestScope::Auth,
        )
    }

    /// The token check goes through the session path: a 401 here means the
    /// stored token is no longer accepted.
    pub fn build_verify_token(&self) -> HttpRequest {
        self.bare_request(HttpMethod::Get, self.url(&self.endpoints.test_token()))
    }

    pub fn parse_register(&self, response: HttpResponse) -> Result<AuthResponse, ApiError> {
        decode(classify(RequestScope::Auth, response)?)
    }

    pub fn parse_login(&self, response: HttpResponse) -> Result<AuthResponse, ApiError> {
        decode(classify(RequestScope::Auth, response)?)
    }

    pub fn parse_verify_token(&self, response: HttpResponse) -> Result<TokenCheck, ApiError> {
        decode(classify(RequestScope::Resource, response)?)
    }

    // -- contacts -----------------------------------------------------------

    /// Query parameters are always emitted as `page`, `per_page`, `search`.
    pub fn build_list_contacts(&self, query: &ListQuery) -> HttpRequest {
        let encoded = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("page", &query.page.to_string())
            .append_pair("per_page", &query.per_page.to_string())
            .append_pair("search", &query.search)
            .finish();
        let path = format!("{}?{encoded}", self.url(&self.endpoints.contacts()));
        self.bare_request(HttpMethod::Get, path)
    }

    pub fn build_get_contact(&self, id: i64) -> HttpRequest {
        self.bare_request(HttpMethod::Get, self.url(&self.endpoints.contact(id)))
    }

    pub fn build_create_contact(&self, input: &NewContact) -> Result<HttpRequest, ApiError> {
        if input.first_name.trim().is_empty() {
            return Err(ValidationError::MissingField("first_name").into());
        }
        if input.last_name.trim().is_empty() {
            return Err(ValidationError::MissingField("last_name").into());
        }
        let body = NewContact {
            phone_numbers: phone::clean(&input.phone_numbers),
            ..input.clone()
        };
        self.json_request(
            HttpMethod::Post,
            &self.endpoints.contacts(),
            &body,
            RequestScope::Resource,
        )
    }

    pub fn build_update_contact(
        &self,
        id: i64,
        input: &ContactUpdate,
    ) -> Result<HttpRequest, ApiError> {
        let body = ContactUpdate {
            phone_numbers: input.phone_numbers.as_deref().map(phone::clean),
            ..input.clone()
        };
        self.json_request(
            HttpMethod::Put,
            &self.endpoints.contact(id),
            &body,
            RequestScope::Resource,
        )
    }

    pub fn build_delete_contact(&self, id: i64) -> HttpRequest {
        self.bare_request(HttpMethod::Delete, self.url(&self.endpoints.contact(id)))
    }

    pub fn parse_list_contacts(&self, response: HttpResponse) -> Result<ContactPage, ApiError> {
        decode(classify(RequestScope::Resource, response)?)
    }

    pub fn parse_get_contact(&self, response: HttpResponse) -> Result<Contact, ApiError> {
        decode(classify(RequestScope::Resource, response)?)
    }

    pub fn parse_create_contact(&self, response: HttpResponse) -> Result<Contact, ApiError> {
        decode(classify(RequestScope::Resource, response)?)
    }

    pub fn parse_update_contact(&self, response: HttpResponse) -> Result<Contact, ApiError> {
        decode(classify(RequestScope::Resource, response)?)
    }

    /// Accepts both `200 {"message": ...}` and an empty `204`.
    pub fn parse_delete_contact(&self, response: HttpResponse) -> Result<DeleteAck, ApiError> {
        let response = classify(RequestScope::Resource, response)?;
        if response.body.trim().is_empty() {
            return Ok(DeleteAck::default());
        }
        decode(response)
    }

    // -- helpers ------------------------------------------------------------

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn bare_request(&self, method: HttpMethod, path: String) -> HttpRequest {
        HttpRequest {
            method,
            path,
            headers: Vec::new(),
            body: None,
            scope: RequestScope::Resource,
        }
    }

    fn json_request<T: Serialize>(
        &self,
        method: HttpMethod,
        path: &str,
        payload: &T,
        scope: RequestScope,
    ) -> Result<HttpRequest, ApiError> {
        Ok(HttpRequest {
            method,
            path: self.url(path),
            headers: json_headers(),
            body: Some(RequestBody::Json(to_json(payload)?)),
            scope,
        })
    }
}

fn json_headers() -> Vec<(String, String)> {
    vec![(
        JSON_CONTENT_TYPE.0.to_string(),
        JSON_CONTENT_TYPE.1.to_string(),
    )]
}

fn to_json<T: Serialize>(payload: &T) -> Result<String, ApiError> {
    serde_json::to_string(payload).map_err(|e| ApiError::Serialization(e.to_string()))
}

fn decode<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::types::{Gender, ProfilePicture};

    fn client() -> ContactsClient {
        ContactsClient::new("http://localhost:5000/api")
    }

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    fn registration() -> Registration {
        Registration {
            first_name: "Ann".to_string(),
            last_name: "Lee".to_string(),
            email: "ann@example.com".to_string(),
            password: "secret1".to_string(),
            confirm_password: "secret1".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 5, 17).unwrap(),
            gender: Gender::Female,
            phone_numbers: vec!["555-1234".to_string(), " ".to_string()],
            address: "1 Main St".to_string(),
            profile_picture: None,
        }
    }

    const CONTACT_JSON: &str = r#"{"id":1,"first_name":"Ann","last_name":"Lee","company":"Acme","address":null,"phone_numbers":"[\"555-1234\"]","created_at":"2024-03-01T10:15:30"}"#;

    #[test]
    fn list_query_parameters_are_exact() {
        let req = client().build_list_contacts(&ListQuery::new(2, 10, "ann"));
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(
            req.path,
            "http://localhost:5000/api/contacts/?page=2&per_page=10&search=ann"
        );
        assert!(req.body.is_none());
        assert!(req.headers.is_empty());
        assert_eq!(req.scope, RequestScope::Resource);
    }

    #[test]
    fn list_query_encodes_search() {
        let req = client().build_list_contacts(&ListQuery::new(1, 10, "ann & co"));
        assert!(req.path.ends_with("?page=1&per_page=10&search=ann+%26+co"));
    }

    #[test]
    fn default_list_query_sends_empty_search() {
        let req = client().build_list_contacts(&ListQuery::default());
        assert!(req.path.ends_with("/contacts/?page=1&per_page=10&search="));
    }

    #[test]
    fn register_rejects_mismatched_passwords() {
        let form = Registration {
            confirm_password: "different".to_string(),
            ..registration()
        };
        let err = client().build_register(&form).unwrap_err();
        assert!(matches!(
            err,
            ApiError::Invalid(ValidationError::PasswordMismatch)
        ));
    }

    #[test]
    fn register_without_picture_is_json() {
        let req = client().build_register(&registration()).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.path, "http://localhost:5000/api/auth/register");
        assert_eq!(req.scope, RequestScope::Auth);
        assert_eq!(req.header("content-type"), Some("application/json"));
        let body: serde_json::Value =
            serde_json::from_str(req.body.as_ref().unwrap().as_json().unwrap()).unwrap();
        assert_eq!(body["date_of_birth"], "1990-05-17");
        assert_eq!(body["gender"], "Female");
        assert_eq!(body["phone_numbers"], serde_json::json!(["555-1234"]));
    }

    #[test]
    fn register_with_picture_is_multipart() {
        let form = Registration {
            profile_picture: Some(ProfilePicture {
                file_name: "me.png".to_string(),
                content_type: "image/png".to_string(),
                bytes: vec![0x89, 0x50, 0x4e, 0x47],
            }),
            ..registration()
        };
        let req = client().build_register(&form).unwrap();
        assert!(req.header("content-type").is_none());
        let parts = req.body.as_ref().unwrap().as_multipart().unwrap();
        let phones = parts.iter().find(|p| p.name() == "phone_numbers").unwrap();
        assert_eq!(
            phones,
            &FormPart::text("phone_numbers", r#"["555-1234"]"#)
        );
        assert!(parts.iter().any(|p| matches!(
            p,
            FormPart::File { name, file_name, .. } if name == "profile_picture" && file_name == "me.png"
        )));
    }

    #[test]
    fn login_is_auth_scoped_json() {
        let req = client()
            .build_login(&Credentials::new("ann@example.com", "secret1"))
            .unwrap();
        assert_eq!(req.path, "http://localhost:5000/api/auth/login");
        assert_eq!(req.scope, RequestScope::Auth);
        let body: serde_json::Value =
            serde_json::from_str(req.body.unwrap().as_json().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({"email": "ann@example.com", "password": "secret1"}));
    }

    #[test]
    fn login_requires_both_fields() {
        let err = client().build_login(&Credentials::new("", "x")).unwrap_err();
        assert!(matches!(err, ApiError::Invalid(ValidationError::MissingField("email"))));
    }

    #[test]
    fn create_contact_cleans_phone_numbers() {
        let input = NewContact {
            first_name: "Bob".to_string(),
            last_name: "Ray".to_string(),
            phone_numbers: vec!["".to_string(), "555-0000".to_string()],
            ..NewContact::default()
        };
        let req = client().build_create_contact(&input).unwrap();
        assert_eq!(req.path, "http://localhost:5000/api/contacts/");
        let body: serde_json::Value =
            serde_json::from_str(req.body.unwrap().as_json().unwrap()).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"first_name": "Bob", "last_name": "Ray", "phone_numbers": ["555-0000"]})
        );
    }

    #[test]
    fn create_contact_requires_names() {
        let err = client()
            .build_create_contact(&NewContact::default())
            .unwrap_err();
        assert!(matches!(
            err,
            ApiError::Invalid(ValidationError::MissingField("first_name"))
        ));
    }

    #[test]
    fn update_and_delete_paths() {
        let c = client();
        let req = c.build_update_contact(9, &ContactUpdate::default()).unwrap();
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(req.path, "http://localhost:5000/api/contacts/9");
        assert_eq!(req.body.unwrap().as_json(), Some("{}"));

        let req = c.build_delete_contact(9);
        assert_eq!(req.method, HttpMethod::Delete);
        assert!(req.body.is_none());
    }

    #[test]
    fn simple_flavor_paths() {
        let c = ContactsClient::with_endpoints("http://host/api/", Endpoints::simple());
        assert_eq!(c.build_get_contact(3).path, "http://host/api/simple_contacts/3");
        assert_eq!(
            c.build_verify_token().path,
            "http://host/api/simple_auth/test-token"
        );
    }

    #[test]
    fn parse_get_contact_normalizes_phones() {
        let contact = client().parse_get_contact(response(200, CONTACT_JSON)).unwrap();
        assert_eq!(contact.company.as_deref(), Some("Acme"));
        assert_eq!(&*contact.phone_numbers, ["555-1234"]);
    }

    #[test]
    fn parse_get_contact_not_found() {
        let err = client()
            .parse_get_contact(response(404, r#"{"error":"Contact not found"}"#))
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
    }

    #[test]
    fn parse_login_unauthorized_is_client_error() {
        let err = client()
            .parse_login(response(401, r#"{"error":"Invalid email or password"}"#))
            .unwrap_err();
        assert!(matches!(err, ApiError::Client { status: 401, .. }));
        assert!(!err.requires_login());
    }

    #[test]
    fn parse_list_unauthorized_is_auth_error() {
        let err = client()
            .parse_list_contacts(response(401, r#"{"error":"Token is missing"}"#))
            .unwrap_err();
        assert!(matches!(err, ApiError::Auth { status: 401, .. }));
    }

    #[test]
    fn parse_delete_accepts_ack_and_empty() {
        let ack = client()
            .parse_delete_contact(response(200, r#"{"message":"Contact deleted successfully"}"#))
            .unwrap();
        assert_eq!(ack.message.as_deref(), Some("Contact deleted successfully"));
        let ack = client().parse_delete_contact(response(204, "")).unwrap();
        assert_eq!(ack, DeleteAck::default());
    }

    #[test]
    fn parse_list_bad_json() {
        let err = client()
            .parse_list_contacts(response(200, "not json"))
            .unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(_)));
    }
}
