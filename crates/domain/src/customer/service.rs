use common::{CustomerId, Page};
use store::{Customer, CustomerQuery, CustomerStore, StoreError, UniqueField};

use super::{CustomerDetails, CustomerError};
use crate::error::DomainError;

/// Explicit customer management.
///
/// Unlike [`super::CustomerResolver`], creation here refuses contact details
/// already held by another customer.
#[derive(Clone)]
pub struct CustomerService<C: CustomerStore> {
    customers: C,
}

impl<C: CustomerStore> CustomerService<C> {
    /// Creates a new customer service with the given store.
    pub fn new(customers: C) -> Self {
        Self { customers }
    }

    /// Retrieves a customer by id.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, id: CustomerId) -> Result<Customer, DomainError> {
        self.customers
            .find_customer(id)
            .await?
            .ok_or_else(|| CustomerError::NotFound(id).into())
    }

    /// Creates a customer, failing if the email or phone number is taken.
    ///
    /// The email is checked before the phone number.
    #[tracing::instrument(skip(self, details), fields(email = %details.email))]
    pub async fn create(&self, details: CustomerDetails) -> Result<Customer, DomainError> {
        details.validate()?;

        if self
            .customers
            .find_customer_by_email(&details.email)
            .await?
            .is_some()
        {
            return Err(CustomerError::EmailAlreadyExists(details.email).into());
        }
        if self
            .customers
            .find_customer_by_phone(&details.phone_number)
            .await?
            .is_some()
        {
            return Err(CustomerError::PhoneAlreadyExists(details.phone_number).into());
        }

        let customer = details.into_customer();
        self.customers
            .insert_customer(&customer)
            .await
            .map_err(|e| unique_conflict(e, &customer))?;

        metrics::counter!("customers_created_total").increment(1);
        tracing::info!(customer_id = %customer.id, "customer created");
        Ok(customer)
    }

    /// Replaces a customer's details.
    #[tracing::instrument(skip(self, details))]
    pub async fn update(
        &self,
        id: CustomerId,
        details: CustomerDetails,
    ) -> Result<Customer, DomainError> {
        details.validate()?;
        self.get(id).await?;

        if let Some(holder) = self
            .customers
            .find_customer_by_email(&details.email)
            .await?
            && holder.id != id
        {
            return Err(CustomerError::EmailAlreadyExists(details.email).into());
        }
        if let Some(holder) = self
            .customers
            .find_customer_by_phone(&details.phone_number)
            .await?
            && holder.id != id
        {
            return Err(CustomerError::PhoneAlreadyExists(details.phone_number).into());
        }

        let customer = details.apply_to(id);
        self.customers
            .update_customer(&customer)
            .await
            .map_err(|e| match e {
                StoreError::CustomerNotFound(id) => CustomerError::NotFound(id).into(),
                other => unique_conflict(other, &customer),
            })?;

        Ok(customer)
    }

    /// Deletes a customer that owns no orders.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: CustomerId) -> Result<(), DomainError> {
        let deleted = self
            .customers
            .delete_customer(id)
            .await
            .map_err(|e| match e {
                StoreError::CustomerHasOrders(id) => DomainError::from(CustomerError::HasOrders(id)),
                other => other.into(),
            })?;

        if !deleted {
            return Err(CustomerError::NotFound(id).into());
        }
        tracing::info!(customer_id = %id, "customer deleted");
        Ok(())
    }

    /// Lists one page of customers.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self, query: &CustomerQuery) -> Result<Page<Customer>, DomainError> {
        Ok(self.customers.list_customers(query).await?)
    }
}

/// Maps a unique violation raced in after the pre-checks to the matching
/// customer error.
fn unique_conflict(e: StoreError, customer: &Customer) -> DomainError {
    match e {
        StoreError::UniqueViolation(UniqueField::CustomerEmail) => {
            CustomerError::EmailAlreadyExists(customer.email.clone()).into()
        }
        StoreError::UniqueViolation(UniqueField::CustomerPhoneNumber) => {
            CustomerError::PhoneAlreadyExists(customer.phone_number.clone()).into()
        }
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};
    use common::Money;
    use store::{InMemoryStore, Order, OrderItem, OrderStore, Product, ProductStore};

    use super::*;

    fn details(name: &str, email: &str, phone: &str) -> CustomerDetails {
        CustomerDetails {
            full_name: name.to_string(),
            email: email.to_string(),
            phone_number: phone.to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1980, 5, 20).unwrap(),
        }
    }

    #[tokio::test]
    async fn create_rejects_taken_email_before_phone() {
        let service = CustomerService::new(InMemoryStore::new());
        service
            .create(details("A", "a@x.com", "111"))
            .await
            .unwrap();

        let err = service
            .create(details("B", "a@x.com", "111"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::Customer(CustomerError::EmailAlreadyExists(_))
        ));

        let err = service
            .create(details("B", "b@x.com", "111"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::Customer(CustomerError::PhoneAlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn create_validates_input() {
        let service = CustomerService::new(InMemoryStore::new());
        let err = service
            .create(details("", "a@x.com", "111"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::Customer(CustomerError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn update_allows_keeping_own_contacts() {
        let service = CustomerService::new(InMemoryStore::new());
        let created = service
            .create(details("A", "a@x.com", "111"))
            .await
            .unwrap();

        let updated = service
            .update(created.id, details("A. Renamed", "a@x.com", "111"))
            .await
            .unwrap();
        assert_eq!(updated.full_name, "A. Renamed");
        assert_eq!(service.get(created.id).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn update_rejects_other_customers_phone() {
        let service = CustomerService::new(InMemoryStore::new());
        let a = service
            .create(details("A", "a@x.com", "111"))
            .await
            .unwrap();
        service
            .create(details("B", "b@x.com", "222"))
            .await
            .unwrap();

        let err = service
            .update(a.id, details("A", "a@x.com", "222"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::Customer(CustomerError::PhoneAlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn update_missing_customer_is_not_found() {
        let service = CustomerService::new(InMemoryStore::new());
        let err = service
            .update(CustomerId::new(), details("A", "a@x.com", "111"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Customer(CustomerError::NotFound(_))));
    }

    #[tokio::test]
    async fn delete_refuses_customer_with_orders() {
        let store = InMemoryStore::new();
        let service = CustomerService::new(store.clone());
        let customer = service
            .create(details("A", "a@x.com", "111"))
            .await
            .unwrap();

        let product = Product::new("Widget", Money::from_cents(100), 1);
        store.insert_product(&product).await.unwrap();
        let mut order = Order::new(customer.id, Utc::now());
        order
            .add_item(OrderItem::new(product.id, "Widget", 1, product.price))
            .unwrap();
        store.insert_order(&order, &[]).await.unwrap();

        let err = service.delete(customer.id).await.unwrap_err();
        assert!(matches!(err, DomainError::Customer(CustomerError::HasOrders(_))));

        store.delete_order(order.id, &[]).await.unwrap();
        service.delete(customer.id).await.unwrap();
        let err = service.delete(customer.id).await.unwrap_err();
        assert!(matches!(err, DomainError::Customer(CustomerError::NotFound(_))));
    }
}
