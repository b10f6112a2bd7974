use store::{Customer, CustomerStore};

use super::CustomerDetails;
use crate::error::DomainError;

/// Finds the customer behind a set of contact details, creating one on first
/// contact.
///
/// A customer matching either the email or the phone number is reused as
/// stored; differing name or date of birth are not reconciled.
#[derive(Clone)]
pub struct CustomerResolver<C: CustomerStore> {
    customers: C,
}

impl<C: CustomerStore> CustomerResolver<C> {
    /// Creates a resolver over the given customer store.
    pub fn new(customers: C) -> Self {
        Self { customers }
    }

    /// Returns the matching customer, or the newly created one.
    #[tracing::instrument(skip(self, details), fields(email = %details.email))]
    pub async fn resolve_or_create(
        &self,
        details: CustomerDetails,
    ) -> Result<Customer, DomainError> {
        let (customer, created) = self
            .customers
            .find_or_insert_customer(details.into_customer())
            .await?;

        if created {
            metrics::counter!("customers_created_total").increment(1);
            tracing::info!(customer_id = %customer.id, "created customer on first order");
        } else {
            tracing::debug!(customer_id = %customer.id, "reusing existing customer");
        }

        Ok(customer)
    }
}
