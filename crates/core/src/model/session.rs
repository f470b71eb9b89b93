use serde::{Deserialize, Serialize};

/// Identity of the signed-in physician.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub license: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

impl User {
    /// Name as printed on a prescription, e.g. `Dr. Smith`.
    pub fn prescriber_name(&self) -> String {
        if self.name.starts_with("Dr. ") {
            self.name.clone()
        } else {
            format!("Dr. {}", self.name)
        }
    }
}

/// How the physician identifies themselves at login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginIdentifier {
    Username(String),
    Email(String),
}

impl LoginIdentifier {
    /// Anything containing `@` is treated as an e-mail address.
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        if input.contains('@') {
            LoginIdentifier::Email(input.to_string())
        } else {
            LoginIdentifier::Username(input.to_string())
        }
    }

    pub fn value(&self) -> &str {
        match self {
            LoginIdentifier::Username(v) | LoginIdentifier::Email(v) => v,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub identifier: LoginIdentifier,
    pub password: String,
}

impl Credentials {
    pub fn new(identifier: &str, password: impl Into<String>) -> Self {
        Self {
            identifier: LoginIdentifier::parse(identifier),
            password: password.into(),
        }
    }
}

/// What survives between runs under the session storage key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescriptor {
    pub user: User,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}
