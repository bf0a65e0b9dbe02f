//! Customer write models and their validation.

use serde::Deserialize;

/// Longest accepted customer name, in characters.
pub const MAX_NAME_LEN: usize = 100;

/// Body of `POST /customers`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewCustomer {
    pub name: String,
    pub email: String,
}

impl NewCustomer {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        validate_name(&self.name)?;
        validate_email(&self.email)
    }
}

/// Body of `PUT /customers/{id}`; absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CustomerUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl CustomerUpdate {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(ref name) = self.name {
            validate_name(name)?;
        }
        if let Some(ref email) = self.email {
            validate_email(email)?;
        }
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<(), String> {
    let len = name.chars().count();
    if len == 0 || len > MAX_NAME_LEN {
        return Err(format!(
            "name must be between 1 and {MAX_NAME_LEN} characters"
        ));
    }
    Ok(())
}

/// Structural check: `local@domain.tld`, no whitespace.
fn validate_email(email: &str) -> Result<(), String> {
    let invalid = || Err(format!("'{email}' is not a valid email address"));

    if email.chars().any(char::is_whitespace) {
        return invalid();
    }
    let Some((local, domain)) = email.split_once('@') else {
        return invalid();
    };
    if local.is_empty() || domain.contains('@') {
        return invalid();
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) if !host.is_empty() && tld.len() >= 2 => Ok(()),
        _ => invalid(),
    }
}
