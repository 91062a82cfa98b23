//! Product and warehouse registration.

use std::sync::Arc;

use stockledger_auth::{Actor, Operation, TenantAccessGuard};
use stockledger_core::{DomainError, DomainResult, Entity, TenantId, TenantOwned};
use stockledger_inventory::{Product, ProductId, Warehouse};

use crate::ledger::{ProductRepository, StockLedger, WarehouseRepository};
use crate::store::StoreError;

pub struct InventoryCatalog {
    ledger: Arc<StockLedger>,
    products: ProductRepository,
    warehouses: WarehouseRepository,
    guard: TenantAccessGuard,
}

impl InventoryCatalog {
    pub fn new(
        ledger: Arc<StockLedger>,
        products: ProductRepository,
        warehouses: WarehouseRepository,
        guard: TenantAccessGuard,
    ) -> Self {
        Self {
            ledger,
            products,
            warehouses,
            guard,
        }
    }

    /// Create or replace a product.
    ///
    /// The stored stock projection is carried forward: only the ledger writes it.
    /// BOM materials must belong to the product's tenant.
    pub async fn save_product(&self, actor: &Actor, mut product: Product) -> DomainResult<Product> {
        let tenant_id = product.tenant_id();
        self.guard
            .resolve(actor, Operation::WriteCatalog)
            .authorize_tenant(tenant_id)?;

        product.validate()?;
        for line in product.bom() {
            self.ledger.product(tenant_id, line.material).await?;
        }

        let _key = self.ledger.lock_product(tenant_id, product.id()).await;
        match self.products.get(tenant_id, &product.id()).await? {
            Some(stored) => {
                product.replace_stock(stored.stock().clone());
                self.products.update(tenant_id, product.id(), product.clone()).await?;
            }
            None => {
                product.replace_stock(Default::default());
                self.products.insert(tenant_id, product.id(), product.clone()).await?;
            }
        }

        tracing::info!(tenant_id = %tenant_id, product_id = %product.id(), kind = ?product.kind(), "product saved");
        Ok(product)
    }

    /// Create or replace a warehouse.
    pub async fn save_warehouse(&self, actor: &Actor, warehouse: Warehouse) -> DomainResult<Warehouse> {
        let tenant_id = warehouse.tenant_id();
        self.guard
            .resolve(actor, Operation::WriteCatalog)
            .authorize_tenant(tenant_id)?;
        warehouse.validate()?;

        match self.warehouses.insert(tenant_id, warehouse.id(), warehouse.clone()).await {
            Ok(()) => {}
            Err(StoreError::AlreadyExists) => {
                self.warehouses.update(tenant_id, warehouse.id(), warehouse.clone()).await?;
            }
            Err(err) => return Err(err.into()),
        }

        tracing::info!(
            tenant_id = %tenant_id,
            warehouse_id = %warehouse.id(),
            is_default = warehouse.is_default(),
            "warehouse saved"
        );
        Ok(warehouse)
    }

    pub async fn product(&self, actor: &Actor, tenant_id: TenantId, product_id: ProductId) -> DomainResult<Product> {
        self.guard
            .resolve(actor, Operation::ReadLedger)
            .authorize_tenant(tenant_id)?;
        self.products
            .get(tenant_id, &product_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("product {product_id}")))
    }
}
