//! Contact list commands.

use std::fmt::Write as _;

use contacts_core::{Contact, ContactPage, ContactUpdate, ListQuery, NewContact};

use super::App;
use crate::error::CliError;

pub async fn list(app: &App, page: u32, per_page: u32, search: String) -> Result<(), CliError> {
    app.require_session()?;
    let page = app
        .contacts
        .list(&ListQuery::new(page, per_page, search))
        .await?;
    print!("{}", format_page(&page));
    Ok(())
}

pub async fn show(app: &App, id: i64) -> Result<(), CliError> {
    app.require_session()?;
    let contact = app.contacts.get(id).await?;
    print!("{}", format_contact(&contact));
    Ok(())
}

pub async fn add(app: &App, input: &NewContact) -> Result<(), CliError> {
    app.require_session()?;
    let contact = app.contacts.create(input).await?;
    println!("Created contact {}", contact.id);
    print!("{}", format_contact(&contact));
    Ok(())
}

pub async fn edit(app: &App, id: i64, input: &ContactUpdate) -> Result<(), CliError> {
    app.require_session()?;
    let contact = app.contacts.update(id, input).await?;
    println!("Updated contact {id}");
    print!("{}", format_contact(&contact));
    Ok(())
}

pub async fn delete(app: &App, id: i64) -> Result<(), CliError> {
    app.require_session()?;
    let ack = app.contacts.delete(id).await?;
    println!("{}", ack.message.as_deref().unwrap_or("Contact deleted"));
    Ok(())
}

/// One line per contact followed by a page footer.
fn format_page(page: &ContactPage) -> String {
    let mut out = String::new();
    if page.contacts.is_empty() {
        out.push_str("No contacts found\n");
    }
    for contact in &page.contacts {
        let _ = write!(out, "{:>5}  {}", contact.id, contact.full_name());
        if let Some(company) = contact.company.as_deref().filter(|c| !c.is_empty()) {
            let _ = write!(out, " ({company})");
        }
        if !contact.phone_numbers.is_empty() {
            let _ = write!(out, "  {}", contact.phone_numbers.join(", "));
        }
        out.push('\n');
    }
    let _ = writeln!(
        out,
        "page {} of {} ({} total)",
        page.page,
        page.pages.max(1),
        page.total
    );
    out
}

fn format_contact(contact: &Contact) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} (#{})", contact.full_name(), contact.id);
    if let Some(company) = &contact.company {
        let _ = writeln!(out, "  company: {company}");
    }
    if let Some(address) = &contact.address {
        let _ = writeln!(out, "  address: {address}");
    }
    for phone in contact.phone_numbers.iter() {
        let _ = writeln!(out, "  phone:   {phone}");
    }
    let _ = writeln!(out, "  created: {}", contact.created_at.format("%Y-%m-%d %H:%M"));
    if let Some(updated) = contact.updated_at {
        let _ = writeln!(out, "  updated: {}", updated.format("%Y-%m-%d %H:%M"));
    }
    out
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::NaiveDate;
    use contacts_core::{ApiFlavor, ClientConfig, Gender, Registration};

    use super::*;

    fn contact(id: i64, first: &str, phones: &[&str]) -> Contact {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "first_name": first,
            "last_name": "Ray",
            "company": "Acme",
            "phone_numbers": phones,
            "created_at": "2024-03-01T10:15:30",
        }))
        .unwrap()
    }

    #[test]
    fn formats_page_rows_and_footer() {
        let page = ContactPage {
            contacts: vec![contact(3, "Bob", &["555-0001", "555-0002"])],
            page: 1,
            per_page: 10,
            total: 1,
            pages: 1,
        };
        assert_eq!(
            format_page(&page),
            "    3  Bob Ray (Acme)  555-0001, 555-0002\npage 1 of 1 (1 total)\n"
        );
    }

    #[test]
    fn empty_page_says_so() {
        let page = ContactPage {
            contacts: Vec::new(),
            page: 1,
            per_page: 10,
            total: 0,
            pages: 0,
        };
        assert_eq!(format_page(&page), "No contacts found\npage 1 of 1 (0 total)\n");
    }

    #[test]
    fn formats_single_contact() {
        let text = format_contact(&contact(7, "Bob", &["555-0001"]));
        assert_eq!(
            text,
            "Bob Ray (#7)\n  company: Acme\n  phone:   555-0001\n  created: 2024-03-01 10:15\n"
        );
    }

    #[tokio::test]
    async fn commands_run_against_server() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { mock_server::run(listener).await });

        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig {
            base_url: format!("http://{addr}/api"),
            flavor: ApiFlavor::Standard,
            session_file: dir.path().join("session.json"),
            timeout: Duration::from_secs(5),
        };
        let app = App::from_config(&config).unwrap();

        // Without a session every contact command stops before sending.
        let err = list(&app, 1, 10, String::new()).await.unwrap_err();
        assert!(matches!(err, CliError::NotLoggedIn));

        let registered = app
            .auth
            .register(&Registration {
                first_name: "Ann".to_string(),
                last_name: "Lee".to_string(),
                email: "ann@example.com".to_string(),
                password: "secret1".to_string(),
                confirm_password: "secret1".to_string(),
                date_of_birth: NaiveDate::from_ymd_opt(1990, 5, 17).unwrap(),
                gender: Gender::Female,
                phone_numbers: Vec::new(),
                address: "1 Main St".to_string(),
                profile_picture: None,
            })
            .await
            .unwrap();
        app.session.save(&registered.token, &registered.user).unwrap();

        // A second process sees the persisted session.
        let reopened = App::from_config(&config).unwrap();
        assert!(reopened.session.is_authenticated());

        add(
            &reopened,
            &NewContact {
                first_name: "Bob".to_string(),
                last_name: "Ray".to_string(),
                ..NewContact::default()
            },
        )
        .await
        .unwrap();
        list(&reopened, 1, 10, String::new()).await.unwrap();

        let err = show(&reopened, 999).await.unwrap_err();
        assert_eq!(err.user_message(), "contact not found");
    }
}
