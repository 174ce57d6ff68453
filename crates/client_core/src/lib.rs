use async_trait::async_trait;
use shared::{
    domain::{Product, ProductId},
    protocol::{Forecast, ForecastQuery, HealthStatus, MovementReceipt, NewMovement, NewProduct},
};

pub mod controller;
pub mod error;
pub mod http;

pub use controller::{DraftProduct, InventoryController, ProductSnapshot};
pub use error::{ClientError, ControllerError};
pub use http::{HttpInventoryClient, DEFAULT_API_BASE};

/// Remote operations of the inventory backend.
///
/// Errors are returned as the transport or backend produced them; nothing
/// here retries or reclassifies.
#[async_trait]
pub trait InventoryApi: Send + Sync {
    async fn list_products(&self) -> Result<Vec<Product>, ClientError>;
    async fn create_product(&self, product: &NewProduct) -> Result<Product, ClientError>;
    async fn create_movement(&self, movement: NewMovement) -> Result<MovementReceipt, ClientError>;
    async fn get_product(&self, id: ProductId) -> Result<Product, ClientError>;
    async fn forecast(&self, query: ForecastQuery) -> Result<Forecast, ClientError>;
    async fn health(&self) -> Result<HealthStatus, ClientError>;
}
