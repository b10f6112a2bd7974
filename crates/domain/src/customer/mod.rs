//! Customers: get-or-create resolution for order placement and strict CRUD.

mod resolver;
mod service;

use chrono::NaiveDate;
use common::CustomerId;
use serde::{Deserialize, Serialize};
use store::Customer;
use thiserror::Error;

pub use resolver::CustomerResolver;
pub use service::CustomerService;

/// Errors that can occur during customer operations.
#[derive(Debug, Error)]
pub enum CustomerError {
    /// The customer does not exist.
    #[error("Customer not found: {0}")]
    NotFound(CustomerId),

    /// Another customer already uses this email.
    #[error("Email already exists: {0}")]
    EmailAlreadyExists(String),

    /// Another customer already uses this phone number.
    #[error("Phone number already exists: {0}")]
    PhoneAlreadyExists(String),

    /// The customer still owns orders.
    #[error("Customer {0} has orders and cannot be deleted")]
    HasOrders(CustomerId),

    /// A field failed validation.
    #[error("Invalid customer input: {0}")]
    InvalidInput(String),
}

/// Contact details supplied when creating, updating or resolving a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
    pub date_of_birth: NaiveDate,
}

impl CustomerDetails {
    /// Checks the fields required by the explicit create and update paths.
    pub fn validate(&self) -> Result<(), CustomerError> {
        if self.full_name.trim().is_empty() {
            return Err(CustomerError::InvalidInput(
                "full name must not be empty".to_string(),
            ));
        }
        if !self.email.contains('@') {
            return Err(CustomerError::InvalidInput(format!(
                "email is not valid: {:?}",
                self.email
            )));
        }
        if self.phone_number.trim().is_empty() {
            return Err(CustomerError::InvalidInput(
                "phone number must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Builds a new customer record with a fresh id.
    pub fn into_customer(self) -> Customer {
        Customer::new(
            self.full_name,
            self.email,
            self.phone_number,
            self.date_of_birth,
        )
    }

    fn apply_to(self, id: CustomerId) -> Customer {
        Customer {
            id,
            full_name: self.full_name,
            email: self.email,
            phone_number: self.phone_number,
            date_of_birth: self.date_of_birth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details() -> CustomerDetails {
        CustomerDetails {
            full_name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            phone_number: "555-0100".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1815, 12, 10).unwrap(),
        }
    }

    #[test]
    fn valid_details_pass() {
        assert!(details().validate().is_ok());
    }

    #[test]
    fn rejects_blank_name_and_bad_email() {
        let mut d = details();
        d.full_name = "  ".to_string();
        assert!(matches!(d.validate(), Err(CustomerError::InvalidInput(_))));

        let mut d = details();
        d.email = "not-an-email".to_string();
        assert!(matches!(d.validate(), Err(CustomerError::InvalidInput(_))));

        let mut d = details();
        d.phone_number = String::new();
        assert!(matches!(d.validate(), Err(CustomerError::InvalidInput(_))));
    }
}
