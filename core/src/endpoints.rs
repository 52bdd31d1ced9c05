//! Resource path prefixes.
//!
//! The backend exposes the same contract under two prefix pairs. The client
//! targets one of them; every path it builds goes through `Endpoints`.

use std::fmt;
use std::str::FromStr;

/// Which pair of prefixes the backend serves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ApiFlavor {
    /// `/auth` and `/contacts`.
    #[default]
    Standard,
    /// `/simple_auth` and `/simple_contacts`.
    Simple,
}

impl FromStr for ApiFlavor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(ApiFlavor::Standard),
            "simple" => Ok(ApiFlavor::Simple),
            other => Err(format!("unknown API flavor '{other}' (expected standard or simple)")),
        }
    }
}

impl fmt::Display for ApiFlavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiFlavor::Standard => f.write_str("standard"),
            ApiFlavor::Simple => f.write_str("simple"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    auth: &'static str,
    contacts: &'static str,
}

impl Endpoints {
    pub fn standard() -> Self {
        Self {
            auth: "/auth",
            contacts: "/contacts",
        }
    }

    pub fn simple() -> Self {
        Self {
            auth: "/simple_auth",
            contacts: "/simple_contacts",
        }
    }

    pub fn for_flavor(flavor: ApiFlavor) -> Self {
        match flavor {
            ApiFlavor::Standard => Self::standard(),
            ApiFlavor::Simple => Self::simple(),
        }
    }

    pub fn register(&self) -> String {
        format!("{}/register", self.auth)
    }

    pub fn login(&self) -> String {
        format!("{}/login", self.auth)
    }

    pub fn test_token(&self) -> String {
        format!("{}/test-token", self.auth)
    }

    /// The collection path keeps its trailing slash; the backend routes
    /// `/contacts/` and `/contacts` differently.
    pub fn contacts(&self) -> String {
        format!("{}/", self.contacts)
    }

    pub fn contact(&self, id: i64) -> String {
        format!("{}/{id}", self.contacts)
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_paths() {
        let e = Endpoints::standard();
        assert_eq!(e.login(), "/auth/login");
        assert_eq!(e.contacts(), "/contacts/");
        assert_eq!(e.contact(42), "/contacts/42");
    }

    #[test]
    fn simple_paths() {
        let e = Endpoints::for_flavor(ApiFlavor::Simple);
        assert_eq!(e.register(), "/simple_auth/register");
        assert_eq!(e.test_token(), "/simple_auth/test-token");
        assert_eq!(e.contacts(), "/simple_contacts/");
    }

    #[test]
    fn flavor_parses() {
        assert_eq!(" Simple ".parse::<ApiFlavor>(), Ok(ApiFlavor::Simple));
        assert_eq!("standard".parse::<ApiFlavor>(), Ok(ApiFlavor::Standard));
        assert!("legacy".parse::<ApiFlavor>().is_err());
    }
}
