use core::str::FromStr;

use serde::{Deserialize, Serialize};

use pricewise_core::{CustomerId, DomainError, DomainResult, Entity};

/// Account role carried on the customer record. Access control is handled elsewhere.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerRole {
    #[default]
    Customer,
    Admin,
}

impl CustomerRole {
    pub fn as_str(self) -> &'static str {
        match self {
            CustomerRole::Customer => "customer",
            CustomerRole::Admin => "admin",
        }
    }
}

impl core::fmt::Display for CustomerRole {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CustomerRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "admin" => Ok(Self::Admin),
            other => Err(DomainError::invalid_input(format!("unknown customer role: {other}"))),
        }
    }
}

/// A customer who can place orders. Credentials are handled elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub full_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub role: CustomerRole,
}

impl Customer {
    pub fn new(full_name: impl Into<String>, email: impl Into<String>) -> DomainResult<Self> {
        Ok(Self {
            id: CustomerId::new(),
            full_name: normalize_name(&full_name.into())?,
            email: normalize_email(&email.into())?,
            phone_number: None,
            role: CustomerRole::default(),
        })
    }

    pub fn with_phone_number(mut self, phone_number: impl Into<String>) -> DomainResult<Self> {
        self.phone_number = Some(normalize_phone(&phone_number.into())?);
        Ok(self)
    }

    pub fn with_role(mut self, role: CustomerRole) -> Self {
        self.role = role;
        self
    }
}

impl Entity for Customer {
    type Id = CustomerId;

    fn id(&self) -> CustomerId {
        self.id
    }
}

/// Partial customer update. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerPatch {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub role: Option<CustomerRole>,
}

impl CustomerPatch {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none() && self.email.is_none() && self.phone_number.is_none() && self.role.is_none()
    }

    /// Validates every given field before touching `customer`.
    pub fn apply(&self, customer: &mut Customer) -> DomainResult<()> {
        let full_name = self.full_name.as_deref().map(normalize_name).transpose()?;
        let email = self.email.as_deref().map(normalize_email).transpose()?;
        let phone_number = self.phone_number.as_deref().map(normalize_phone).transpose()?;

        if let Some(full_name) = full_name {
            customer.full_name = full_name;
        }
        if let Some(email) = email {
            customer.email = email;
        }
        if let Some(phone_number) = phone_number {
            customer.phone_number = Some(phone_number);
        }
        if let Some(role) = self.role {
            customer.role = role;
        }
        Ok(())
    }
}

fn normalize_name(full_name: &str) -> DomainResult<String> {
    let full_name = full_name.trim();
    if full_name.is_empty() {
        return Err(DomainError::invalid_input("full name cannot be empty"));
    }
    Ok(full_name.to_string())
}

fn normalize_email(email: &str) -> DomainResult<String> {
    let email = email.trim().to_lowercase();
    if !email.contains('@') {
        return Err(DomainError::invalid_input(format!("malformed email address: {email}")));
    }
    Ok(email)
}

fn normalize_phone(phone_number: &str) -> DomainResult<String> {
    let phone_number = phone_number.trim();
    let digits = phone_number.chars().filter(char::is_ascii_digit).count();
    let allowed = phone_number
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-' | '(' | ')'));
    if digits == 0 || !allowed {
        return Err(DomainError::invalid_input(format!("malformed phone number: {phone_number}")));
    }
    Ok(phone_number.to_string())
}
