//! Contacts CLI - manage an address book against the contacts API.
//!
//! # Usage
//!
//! ```bash
//! # Create an account (the session is saved on success)
//! contacts register --first-name Ann --last-name Lee --email ann@example.com \
//!     --password secret1 --confirm-password secret1 --date-of-birth 1990-05-17 \
//!     --gender female --address "1 Main St" --phone 555-1234
//!
//! # Log in and out
//! contacts login -e ann@example.com -p secret1
//! contacts logout
//!
//! # Browse and edit
//! contacts list --page 2 --search ann
//! contacts add --first-name Bob --last-name Ray --phone 555-0001
//! contacts edit 3 --company Globex
//! contacts delete 3
//! ```
//!
//! # Environment Variables
//!
//! Read from the process environment or a `.env` file; see
//! `contacts_core::ClientConfig`. `RUST_LOG` controls log output (stderr).

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use contacts_core::Gender;
use tracing_subscriber::EnvFilter;

mod commands;
mod error;

use commands::App;
use error::CliError;

#[derive(Parser)]
#[command(name = "contacts")]
#[command(author, version, about = "Contacts API command-line client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account and start a session
    Register {
        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,

        #[arg(long)]
        confirm_password: String,

        /// Date of birth (YYYY-MM-DD)
        #[arg(long)]
        date_of_birth: NaiveDate,

        /// `male`, `female` or `other`
        #[arg(long)]
        gender: Gender,

        #[arg(long)]
        address: String,

        /// Phone number; repeat for several
        #[arg(long = "phone")]
        phones: Vec<String>,

        /// Profile picture to upload (png, jpg, jpeg, gif)
        #[arg(long)]
        picture: Option<PathBuf>,
    },
    /// Log in and save the session
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,
    },
    /// Discard the saved session
    Logout,
    /// Show the user of the saved session
    Whoami,
    /// Ask the server whether the saved token is still valid
    Verify,
    /// List contacts one page at a time
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,

        #[arg(long, default_value_t = 10)]
        per_page: u32,

        /// Match against first or last name
        #[arg(short, long, default_value = "")]
        search: String,
    },
    /// Show one contact
    Show { id: i64 },
    /// Create a contact
    Add {
        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,

        #[arg(long)]
        company: Option<String>,

        #[arg(long)]
        address: Option<String>,

        /// Phone number; repeat for several
        #[arg(long = "phone")]
        phones: Vec<String>,
    },
    /// Change fields of a contact; omitted fields are left as they are
    Edit {
        id: i64,

        #[arg(long)]
        first_name: Option<String>,

        #[arg(long)]
        last_name: Option<String>,

        #[arg(long)]
        company: Option<String>,

        #[arg(long)]
        address: Option<String>,

        /// Replace the phone list; repeat for several
        #[arg(long = "phone")]
        phones: Option<Vec<String>>,
    },
    /// Delete a contact
    Delete { id: i64 },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::debug!("command failed: {e:?}");
        eprintln!("error: {}", e.user_message());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let app = App::from_env()?;

    match cli.command {
        Commands::Register {
            first_name,
            last_name,
            email,
            password,
            confirm_password,
            date_of_birth,
            gender,
            address,
            phones,
            picture,
        } => {
            let form = commands::auth::RegisterArgs {
                first_name,
                last_name,
                email,
                password,
                confirm_password,
                date_of_birth,
                gender,
                address,
                phones,
                picture,
            };
            commands::auth::register(&app, form).await?;
        }
        Commands::Login { email, password } => {
            commands::auth::login(&app, &email, &password).await?;
        }
        Commands::Logout => commands::auth::logout(&app)?,
        Commands::Whoami => commands::auth::whoami(&app)?,
        Commands::Verify => commands::auth::verify(&app).await?,
        Commands::List {
            page,
            per_page,
            search,
        } => commands::contacts::list(&app, page, per_page, search).await?,
        Commands::Show { id } => commands::contacts::show(&app, id).await?,
        Commands::Add {
            first_name,
            last_name,
            company,
            address,
            phones,
        } => {
            let input = contacts_core::NewContact {
                first_name,
                last_name,
                company,
                address,
                phone_numbers: phones,
            };
            commands::contacts::add(&app, &input).await?;
        }
        Commands::Edit {
            id,
            first_name,
            last_name,
            company,
            address,
            phones,
        } => {
            let input = contacts_core::ContactUpdate {
                first_name,
                last_name,
                company,
                address,
                phone_numbers: phones,
            };
            commands::contacts::edit(&app, id, &input).await?;
        }
        Commands::Delete { id } => commands::contacts::delete(&app, id).await?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_list_defaults() {
        let cli = Cli::try_parse_from(["contacts", "list"]).unwrap();
        match cli.command {
            Commands::List {
                page,
                per_page,
                search,
            } => assert_eq!((page, per_page, search.as_str()), (1, 10, "")),
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn parses_register_fields() {
        let cli = Cli::try_parse_from([
            "contacts",
            "register",
            "--first-name",
            "Ann",
            "--last-name",
            "Lee",
            "-e",
            "ann@example.com",
            "-p",
            "secret1",
            "--confirm-password",
            "secret1",
            "--date-of-birth",
            "1990-05-17",
            "--gender",
            "female",
            "--address",
            "1 Main St",
            "--phone",
            "555-1234",
            "--phone",
            "555-5678",
        ])
        .unwrap();
        match cli.command {
            Commands::Register {
                date_of_birth,
                gender,
                phones,
                picture,
                ..
            } => {
                assert_eq!(date_of_birth, NaiveDate::from_ymd_opt(1990, 5, 17).unwrap());
                assert_eq!(gender, Gender::Female);
                assert_eq!(phones, ["555-1234", "555-5678"]);
                assert!(picture.is_none());
            }
            _ => panic!("expected register"),
        }
    }

    #[test]
    fn edit_without_phone_flag_leaves_phones_untouched() {
        let cli = Cli::try_parse_from(["contacts", "edit", "3", "--company", "Globex"]).unwrap();
        match cli.command {
            Commands::Edit { id, company, phones, .. } => {
                assert_eq!(id, 3);
                assert_eq!(company.as_deref(), Some("Globex"));
                assert!(phones.is_none());
            }
            _ => panic!("expected edit"),
        }
    }

    #[test]
    fn rejects_bad_date() {
        assert!(Cli::try_parse_from([
            "contacts",
            "register",
            "--first-name",
            "Ann",
            "--last-name",
            "Lee",
            "-e",
            "a@b.c",
            "-p",
            "x",
            "--confirm-password",
            "x",
            "--date-of-birth",
            "17/05/1990",
            "--gender",
            "female",
            "--address",
            "here",
        ])
        .is_err());
    }
}
