//! Account and session commands.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use contacts_core::{Credentials, Gender, ProfilePicture, Registration, UserProfile};

use super::App;
use crate::error::CliError;

/// Parsed `register` arguments.
pub struct RegisterArgs {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    pub address: String,
    pub phones: Vec<String>,
    pub picture: Option<PathBuf>,
}

pub async fn register(app: &App, args: RegisterArgs) -> Result<(), CliError> {
    let profile_picture = args.picture.as_deref().map(read_picture).transpose()?;
    let form = Registration {
        first_name: args.first_name,
        last_name: args.last_name,
        email: args.email,
        password: args.password,
        confirm_password: args.confirm_password,
        date_of_birth: args.date_of_birth,
        gender: args.gender,
        phone_numbers: args.phones,
        address: args.address,
        profile_picture,
    };

    let response = app.auth.register(&form).await?;
    app.session.save(&response.token, &response.user)?;
    tracing::info!(email = %response.user.email, "registered");
    println!("Registered and logged in as {}", describe_user(&response.user));
    Ok(())
}

pub async fn login(app: &App, email: &str, password: &str) -> Result<(), CliError> {
    let response = app.auth.login(&Credentials::new(email, password)).await?;
    app.session.save(&response.token, &response.user)?;
    tracing::info!(email = %response.user.email, "logged in");
    println!("Logged in as {}", describe_user(&response.user));
    Ok(())
}

pub fn logout(app: &App) -> Result<(), CliError> {
    app.session.clear()?;
    println!("Logged out");
    Ok(())
}

/// Reads the saved profile only; no request is made.
pub fn whoami(app: &App) -> Result<(), CliError> {
    let session = app.session.load().ok_or(CliError::NotLoggedIn)?;
    match session.user {
        Some(user) => println!("{}", describe_user(&user)),
        None => println!("Logged in (profile unavailable)"),
    }
    Ok(())
}

/// A rejected token is discarded so the next command starts clean.
pub async fn verify(app: &App) -> Result<(), CliError> {
    app.require_session()?;
    match app.auth.verify_token().await {
        Ok(check) => {
            println!("Token valid for {}", describe_user(&check.user));
            Ok(())
        }
        Err(e) if e.requires_login() => {
            app.session.clear()?;
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}

fn describe_user(user: &UserProfile) -> String {
    format!("{} {} <{}>", user.first_name, user.last_name, user.email)
}

fn read_picture(path: &Path) -> Result<ProfilePicture, CliError> {
    let bytes = std::fs::read(path).map_err(|source| CliError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "picture".to_string());
    Ok(ProfilePicture {
        content_type: content_type_for(path).to_string(),
        file_name,
        bytes,
    })
}

fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}
