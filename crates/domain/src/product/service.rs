use common::{Page, ProductId};
use store::{Product, ProductChanges, ProductQuery, ProductStore, StoreError, UniqueField};

use super::{NewProduct, ProductError, ProductUpdate, validate};
use crate::error::DomainError;

/// Service for managing the product catalog.
///
/// Stock is set once at creation; afterwards only order placement and
/// cancellation move it.
#[derive(Clone)]
pub struct ProductService<P: ProductStore> {
    products: P,
}

impl<P: ProductStore> ProductService<P> {
    /// Creates a new product service with the given store.
    pub fn new(products: P) -> Self {
        Self { products }
    }

    /// Retrieves a product by id.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, id: ProductId) -> Result<Product, DomainError> {
        self.products
            .find_product(id)
            .await?
            .ok_or_else(|| ProductError::NotFound(id).into())
    }

    /// Adds a product to the catalog.
    #[tracing::instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: NewProduct) -> Result<Product, DomainError> {
        validate(&input.name, input.price)?;

        if self
            .products
            .find_product_by_name(&input.name)
            .await?
            .is_some()
        {
            return Err(ProductError::AlreadyExists(input.name).into());
        }

        let product = Product::new(input.name, input.price.rescaled(), input.stock_quantity);
        self.products
            .insert_product(&product)
            .await
            .map_err(|e| name_conflict(e, &product.name))?;

        tracing::info!(product_id = %product.id, stock = product.stock_quantity, "product created");
        Ok(product)
    }

    /// Changes a product's name and price.
    #[tracing::instrument(skip(self, input))]
    pub async fn update(&self, id: ProductId, input: ProductUpdate) -> Result<Product, DomainError> {
        validate(&input.name, input.price)?;

        if let Some(holder) = self.products.find_product_by_name(&input.name).await?
            && holder.id != id
        {
            return Err(ProductError::AlreadyExists(input.name).into());
        }

        let changes = ProductChanges {
            name: input.name,
            price: input.price.rescaled(),
        };
        self.products
            .update_product(id, &changes)
            .await
            .map_err(|e| match e {
                StoreError::ProductNotFound(id) => ProductError::NotFound(id).into(),
                other => name_conflict(other, &changes.name),
            })
    }

    /// Removes a product. Orders that reference it keep their line items.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: ProductId) -> Result<(), DomainError> {
        if !self.products.delete_product(id).await? {
            return Err(ProductError::NotFound(id).into());
        }
        tracing::info!(product_id = %id, "product deleted");
        Ok(())
    }

    /// Lists one page of products.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self, query: &ProductQuery) -> Result<Page<Product>, DomainError> {
        Ok(self.products.list_products(query).await?)
    }
}

fn name_conflict(e: StoreError, name: &str) -> DomainError {
    match e {
        StoreError::UniqueViolation(UniqueField::ProductName) => {
            ProductError::AlreadyExists(name.to_string()).into()
        }
        other => other.into(),
    }
}
