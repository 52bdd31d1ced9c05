use std::{collections::BTreeMap, collections::HashMap, sync::Arc};

use axum::{
    extract::{FromRequest, Multipart, Path, Query, Request, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

const MAX_PER_PAGE: u32 = 50;
const MIN_PASSWORD_LEN: usize = 6;
const GENDERS: [&str; 3] = ["Male", "Female", "Other"];

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip)]
    pub password: String,
    pub date_of_birth: NaiveDate,
    pub gender: String,
    pub address: String,
    pub phone_numbers: Vec<String>,
    pub profile_picture: Option<String>,
    pub registered_on: NaiveDateTime,
}

/// Contact as the backend dumps it: phone numbers stay JSON-encoded.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Contact {
    pub id: i64,
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub company: Option<String>,
    pub address: Option<String>,
    pub phone_numbers: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Default, Deserialize)]
pub struct RegisterForm {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub confirm_password: Option<String>,
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub phone_numbers: Option<Vec<String>>,
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize)]
pub struct ContactForm {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company: Option<String>,
    pub address: Option<String>,
    pub phone_numbers: Option<Vec<String>>,
}

#[derive(Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub search: Option<String>,
}

#[derive(Default)]
pub struct Store {
    users: HashMap<i64, User>,
    tokens: HashMap<String, i64>,
    contacts: HashMap<i64, Contact>,
    next_user_id: i64,
    next_contact_id: i64,
}

pub type Db = Arc<RwLock<Store>>;

/// Both route families the real backend serves, under `/api`.
pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    let mut router = Router::new();
    for prefix in ["/api/auth", "/api/simple_auth"] {
        router = router
            .route(&format!("{prefix}/register"), post(register))
            .route(&format!("{prefix}/login"), post(login))
            .route(&format!("{prefix}/test-token"), get(test_token));
    }
    for prefix in ["/api/contacts", "/api/simple_contacts"] {
        router = router
            .route(&format!("{prefix}/"), get(list_contacts).post(create_contact))
            .route(
                &format!("{prefix}/{{id}}"),
                get(get_contact).put(update_contact).delete(delete_contact),
            );
    }
    router.with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn error(status: StatusCode, detail: impl Into<Value>) -> Response {
    (status, Json(json!({ "error": detail.into() }))).into_response()
}

fn field_errors(errors: &BTreeMap<&'static str, Vec<String>>) -> Response {
    error(StatusCode::BAD_REQUEST, json!(errors))
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Resolve the bearer token to a user id. A bare token without the
/// `Bearer ` prefix is accepted as well.
fn authenticate(store: &Store, headers: &HeaderMap) -> Result<i64, Response> {
    let Some(raw) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    else {
        return Err(error(StatusCode::UNAUTHORIZED, "Token is missing"));
    };
    let token = raw.strip_prefix("Bearer ").unwrap_or(raw).trim();
    store
        .tokens
        .get(token)
        .copied()
        .filter(|id| store.users.contains_key(id))
        .ok_or_else(|| error(StatusCode::UNAUTHORIZED, "Invalid token. Please log in again."))
}

fn issue_token(store: &mut Store, user_id: i64) -> String {
    let token = Uuid::new_v4().simple().to_string();
    store.tokens.insert(token.clone(), user_id);
    token
}

// --- auth ---

async fn register(State(db): State<Db>, request: Request) -> Response {
    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("multipart/form-data"));

    let (form, picture) = if is_multipart {
        let multipart = match Multipart::from_request(request, &()).await {
            Ok(multipart) => multipart,
            Err(rejection) => return rejection.into_response(),
        };
        match read_multipart(multipart).await {
            Ok(parsed) => parsed,
            Err(response) => return response,
        }
    } else {
        match Json::<RegisterForm>::from_request(request, &()).await {
            Ok(Json(form)) => (form, None),
            Err(rejection) => return rejection.into_response(),
        }
    };

    let date_of_birth = match non_empty(&form.date_of_birth) {
        Some(raw) => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(_) => {
                return error(
                    StatusCode::BAD_REQUEST,
                    "Invalid date format for date_of_birth",
                )
            }
        },
        None => None,
    };

    let mut store = db.write().await;
    let mut errors: BTreeMap<&'static str, Vec<String>> = BTreeMap::new();
    let required = [
        ("first_name", &form.first_name),
        ("last_name", &form.last_name),
        ("email", &form.email),
        ("password", &form.password),
        ("confirm_password", &form.confirm_password),
        ("gender", &form.gender),
        ("address", &form.address),
    ];
    for (field, value) in required {
        if non_empty(value).is_none() {
            errors
                .entry(field)
                .or_default()
                .push("Missing data for required field.".to_string());
        }
    }
    if date_of_birth.is_none() {
        errors
            .entry("date_of_birth")
            .or_default()
            .push("Missing data for required field.".to_string());
    }
    if form.phone_numbers.is_none() {
        errors
            .entry("phone_numbers")
            .or_default()
            .push("Missing data for required field.".to_string());
    }
    if let Some(email) = non_empty(&form.email) {
        if !email.contains('@') {
            errors
                .entry("email")
                .or_default()
                .push("Invalid email address.".to_string());
        } else if store.users.values().any(|u| u.email.eq_ignore_ascii_case(email)) {
            errors
                .entry("email")
                .or_default()
                .push("Email address already registered.".to_string());
        }
    }
    if let Some(password) = form.password.as_deref() {
        if !password.is_empty() && password.len() < MIN_PASSWORD_LEN {
            errors
                .entry("password")
                .or_default()
                .push(format!("Shorter than minimum length {MIN_PASSWORD_LEN}."));
        }
        if form.confirm_password.as_deref().is_some_and(|c| c != password) {
            errors
                .entry("confirm_password")
                .or_default()
                .push("Passwords must match.".to_string());
        }
    }
    if let Some(gender) = non_empty(&form.gender) {
        if !GENDERS.contains(&gender) {
            errors
                .entry("gender")
                .or_default()
                .push("Must be one of: Male, Female, Other.".to_string());
        }
    }
    let (Some(date_of_birth), true) = (date_of_birth, errors.is_empty()) else {
        debug!(?errors, "registration rejected");
        return field_errors(&errors);
    };

    store.next_user_id += 1;
    let user = User {
        id: store.next_user_id,
        first_name: form.first_name.unwrap_or_default(),
        last_name: form.last_name.unwrap_or_default(),
        email: form.email.unwrap_or_default(),
        password: form.password.unwrap_or_default(),
        date_of_birth,
        gender: form.gender.unwrap_or_default(),
        address: form.address.unwrap_or_default(),
        phone_numbers: form.phone_numbers.unwrap_or_default(),
        profile_picture: picture,
        registered_on: Utc::now().naive_utc(),
    };
    store.users.insert(user.id, user.clone());
    let token = issue_token(&mut store, user.id);
    info!(user_id = user.id, "user registered");

    (
        StatusCode::CREATED,
        Json(json!({
            "message": "User registered successfully",
            "user": user,
            "token": token,
        })),
    )
        .into_response()
}

async fn read_multipart(
    mut multipart: Multipart,
) -> Result<(RegisterForm, Option<String>), Response> {
    let mut form = RegisterForm::default();
    let mut picture = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(IntoResponse::into_response)?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        if name == "profile_picture" {
            let file_name = field.file_name().unwrap_or("upload").to_string();
            let bytes = field.bytes().await.map_err(IntoResponse::into_response)?;
            if !bytes.is_empty() {
                picture = Some(format!("{}_{file_name}", Uuid::new_v4().simple()));
            }
            continue;
        }
        let value = field.text().await.map_err(IntoResponse::into_response)?;
        match name.as_str() {
            "first_name" => form.first_name = Some(value),
            "last_name" => form.last_name = Some(value),
            "email" => form.email = Some(value),
            "password" => form.password = Some(value),
            "confirm_password" => form.confirm_password = Some(value),
            "date_of_birth" => form.date_of_birth = Some(value),
            "gender" => form.gender = Some(value),
            "address" => form.address = Some(value),
            "phone_numbers" => {
                let phones = serde_json::from_str(&value).map_err(|_| {
                    error(
                        StatusCode::BAD_REQUEST,
                        "phone_numbers must be a JSON-encoded list",
                    )
                })?;
                form.phone_numbers = Some(phones);
            }
            _ => {}
        }
    }
    Ok((form, picture))
}

async fn login(State(db): State<Db>, Json(input): Json<LoginForm>) -> Response {
    let (Some(email), Some(password)) = (non_empty(&input.email), input.password.as_deref())
    else {
        return error(StatusCode::BAD_REQUEST, "Email and password are required");
    };
    let mut store = db.write().await;
    let Some(user) = store
        .users
        .values()
        .find(|u| u.email.eq_ignore_ascii_case(email) && u.password == password)
        .cloned()
    else {
        return error(StatusCode::UNAUTHORIZED, "Invalid email or password");
    };
    let token = issue_token(&mut store, user.id);
    Json(json!({
        "message": "Successfully logged in",
        "user": user,
        "token": token,
    }))
    .into_response()
}

async fn test_token(State(db): State<Db>, headers: HeaderMap) -> Response {
    let store = db.read().await;
    let user_id = match authenticate(&store, &headers) {
        Ok(id) => id,
        Err(response) => return response,
    };
    Json(json!({
        "message": "Token is valid",
        "user": store.users.get(&user_id),
    }))
    .into_response()
}

// --- contacts ---

async fn list_contacts(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Response {
    let store = db.read().await;
    let user_id = match authenticate(&store, &headers) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let page = params.page.unwrap_or(1).max(1);
    let per_page = params.per_page.unwrap_or(10).clamp(1, MAX_PER_PAGE);
    let search = params.search.unwrap_or_default().to_lowercase();

    let mut matching: Vec<&Contact> = store
        .contacts
        .values()
        .filter(|c| c.user_id == user_id)
        .filter(|c| search.is_empty() || matches_search(c, &search))
        .collect();
    matching.sort_by(|a, b| {
        (&a.first_name, &a.last_name, a.id).cmp(&(&b.first_name, &b.last_name, b.id))
    });

    let total = matching.len();
    let pages = total.div_ceil(per_page as usize);
    let contacts: Vec<&Contact> = matching
        .into_iter()
        .skip((page as usize - 1) * per_page as usize)
        .take(per_page as usize)
        .collect();

    Json(json!({
        "contacts": contacts,
        "total": total,
        "pages": pages,
        "page": page,
        "per_page": per_page,
    }))
    .into_response()
}

fn matches_search(contact: &Contact, needle: &str) -> bool {
    [
        Some(&contact.first_name),
        Some(&contact.last_name),
        contact.company.as_ref(),
        contact.address.as_ref(),
    ]
    .into_iter()
    .flatten()
    .any(|field| field.to_lowercase().contains(needle))
}

async fn create_contact(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<ContactForm>,
) -> Response {
    let mut store = db.write().await;
    let user_id = match authenticate(&store, &headers) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let mut errors: BTreeMap<&'static str, Vec<String>> = BTreeMap::new();
    for (field, value) in [("first_name", &input.first_name), ("last_name", &input.last_name)] {
        if non_empty(value).is_none() {
            errors
                .entry(field)
                .or_default()
                .push("Missing data for required field.".to_string());
        }
    }
    if !errors.is_empty() {
        return field_errors(&errors);
    }

    let now = Utc::now().naive_utc();
    store.next_contact_id += 1;
    let contact = Contact {
        id: store.next_contact_id,
        user_id,
        first_name: input.first_name.unwrap_or_default(),
        last_name: input.last_name.unwrap_or_default(),
        company: input.company,
        address: input.address,
        phone_numbers: json!(input.phone_numbers.unwrap_or_default()).to_string(),
        created_at: now,
        updated_at: now,
    };
    store.contacts.insert(contact.id, contact.clone());
    (StatusCode::CREATED, Json(contact)).into_response()
}

async fn get_contact(State(db): State<Db>, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    let store = db.read().await;
    let user_id = match authenticate(&store, &headers) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match store.contacts.get(&id).filter(|c| c.user_id == user_id) {
        Some(contact) => Json(contact).into_response(),
        None => error(StatusCode::NOT_FOUND, "Contact not found"),
    }
}

async fn update_contact(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(input): Json<ContactForm>,
) -> Response {
    let mut store = db.write().await;
    let user_id = match authenticate(&store, &headers) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let Some(contact) = store
        .contacts
        .get_mut(&id)
        .filter(|c| c.user_id == user_id)
    else {
        return error(StatusCode::NOT_FOUND, "Contact not found");
    };

    let mut errors: BTreeMap<&'static str, Vec<String>> = BTreeMap::new();
    for (field, value) in [("first_name", &input.first_name), ("last_name", &input.last_name)] {
        if value.is_some() && non_empty(value).is_none() {
            errors
                .entry(field)
                .or_default()
                .push("Shorter than minimum length 1.".to_string());
        }
    }
    if !errors.is_empty() {
        return field_errors(&errors);
    }

    if let Some(first_name) = input.first_name {
        contact.first_name = first_name;
    }
    if let Some(last_name) = input.last_name {
        contact.last_name = last_name;
    }
    if let Some(company) = input.company {
        contact.company = Some(company);
    }
    if let Some(address) = input.address {
        contact.address = Some(address);
    }
    if let Some(phones) = input.phone_numbers {
        contact.phone_numbers = json!(phones).to_string();
    }
    contact.updated_at = Utc::now().naive_utc();
    Json(contact.clone()).into_response()
}

async fn delete_contact(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let mut store = db.write().await;
    let user_id = match authenticate(&store, &headers) {
        Ok(id) => id,
        Err(response) => return response,
    };
    if !store.contacts.get(&id).is_some_and(|c| c.user_id == user_id) {
        return error(StatusCode::NOT_FOUND, "Contact not found");
    }
    store.contacts.remove(&id);
    Json(json!({ "message": "Contact deleted successfully" })).into_response()
}
