//! View state owner: product snapshot, draft form and the refresh-after-write
//! rule.

use std::future::Future;

use shared::{
    domain::{MovementKind, Product, ProductId},
    protocol::{MovementReceipt, NewMovement, NewProduct},
};
use tracing::{debug, info, warn};

use crate::{
    error::{ClientError, ControllerError},
    InventoryApi,
};

/// The client's whole view of inventory. Replaced wholesale on refresh.
///
/// `fresh` holds only between a completed refresh and the next mutation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductSnapshot {
    products: Vec<Product>,
    fresh: bool,
}

impl ProductSnapshot {
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn is_fresh(&self) -> bool {
        self.fresh
    }

    pub fn find(&self, id: ProductId) -> Option<&Product> {
        self.products.iter().find(|product| product.id == id)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    fn invalidate(&mut self) {
        self.fresh = false;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftProduct {
    pub sku: String,
    pub name: String,
}

impl DraftProduct {
    pub fn is_empty(&self) -> bool {
        self.sku.is_empty() && self.name.is_empty()
    }

    pub fn clear(&mut self) {
        self.sku.clear();
        self.name.clear();
    }
}

pub struct InventoryController<A: InventoryApi> {
    api: A,
    snapshot: ProductSnapshot,
    draft: DraftProduct,
}

impl<A: InventoryApi> InventoryController<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            snapshot: ProductSnapshot::default(),
            draft: DraftProduct::default(),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn snapshot(&self) -> &ProductSnapshot {
        &self.snapshot
    }

    pub fn draft(&self) -> &DraftProduct {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut DraftProduct {
        &mut self.draft
    }

    pub async fn initialize(&mut self) -> Result<(), ClientError> {
        self.refresh().await
    }

    /// Refetches the product list. On failure the previous products stay
    /// displayed but the snapshot is marked stale.
    pub async fn refresh(&mut self) -> Result<(), ClientError> {
        refresh_snapshot(&self.api, &mut self.snapshot).await
    }

    pub async fn submit_new_product(
        &mut self,
        sku: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<Product, ControllerError> {
        self.draft.sku = sku.into();
        self.draft.name = name.into();
        self.submit_draft().await
    }

    /// Submits the current draft. The draft is cleared only on success.
    pub async fn submit_draft(&mut self) -> Result<Product, ControllerError> {
        self.submit_product(NewProduct::new(
            self.draft.sku.clone(),
            self.draft.name.clone(),
        ))
        .await
    }

    /// Same as [`submit_draft`](Self::submit_draft) but with catalogue
    /// attributes filled in by the caller. `sku`/`name` replace the draft.
    pub async fn submit_product(&mut self, product: NewProduct) -> Result<Product, ControllerError> {
        self.draft.sku = product.sku.clone();
        self.draft.name = product.name.clone();
        if product.sku.is_empty() {
            return Err(ControllerError::MissingSku);
        }

        let created = after_mutation(
            &self.api,
            &mut self.snapshot,
            self.api.create_product(&product),
        )
        .await?;

        info!(product_id = created.id.0, sku = %created.sku, "product created");
        self.draft.clear();
        Ok(created)
    }

    /// Records a single-unit OUT movement.
    pub async fn record_quick_sale(
        &mut self,
        product_id: ProductId,
    ) -> Result<MovementReceipt, ClientError> {
        self.submit_movement(NewMovement::quick_sale(product_id))
            .await
    }

    pub async fn record_movement(
        &mut self,
        product_id: ProductId,
        kind: MovementKind,
        quantity: i64,
    ) -> Result<MovementReceipt, ClientError> {
        self.submit_movement(NewMovement {
            product_id,
            kind,
            quantity,
        })
        .await
    }

    async fn submit_movement(
        &mut self,
        movement: NewMovement,
    ) -> Result<MovementReceipt, ClientError> {
        let receipt = after_mutation(
            &self.api,
            &mut self.snapshot,
            self.api.create_movement(movement),
        )
        .await?;

        info!(
            movement_id = receipt.id.0,
            product_id = movement.product_id.0,
            kind = %movement.kind,
            quantity = movement.quantity,
            "movement recorded"
        );
        Ok(receipt)
    }
}

async fn refresh_snapshot<A: InventoryApi>(
    api: &A,
    snapshot: &mut ProductSnapshot,
) -> Result<(), ClientError> {
    let products = match api.list_products().await {
        Ok(products) => products,
        Err(err) => {
            snapshot.invalidate();
            return Err(err);
        }
    };
    debug!(count = products.len(), "product snapshot replaced");
    *snapshot = ProductSnapshot {
        products,
        fresh: true,
    };
    Ok(())
}

/// Runs a mutating call and then refetches the product list, whatever the
/// call's outcome. A failed refetch is logged and leaves the snapshot stale;
/// the mutation's own result is returned untouched.
async fn after_mutation<A, T, F>(
    api: &A,
    snapshot: &mut ProductSnapshot,
    mutation: F,
) -> Result<T, ClientError>
where
    A: InventoryApi,
    F: Future<Output = Result<T, ClientError>>,
{
    snapshot.invalidate();
    let outcome = mutation.await;

    if let Err(err) = &outcome {
        warn!(error = %err, "mutation failed; refreshing anyway");
    }
    if let Err(err) = refresh_snapshot(api, snapshot).await {
        warn!(error = %err, "refresh after mutation failed; snapshot is stale");
    }

    outcome
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
