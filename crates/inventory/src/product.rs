use serde::{Deserialize, Serialize};

use stockledger_core::{DomainError, DomainResult, Entity, TenantId, TenantOwned, record_id};

use crate::StockProjection;

record_id!(
    /// Product identifier (tenant-scoped via the product's `tenant_id`).
    ProductId
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    FinishedGood,
    RawMaterial,
    Service,
}

/// One bill-of-materials line: `quantity` units of `material` per unit produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BomLine {
    pub material: ProductId,
    pub quantity: i64,
}

/// Product record.
///
/// `stock` is derived from the ledger and owned by it: catalog writes carry the
/// stored projection forward, and only the ledger's recompute replaces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    tenant_id: TenantId,
    name: String,
    #[serde(rename = "type")]
    kind: ProductType,
    /// Price in smallest currency unit (e.g., cents).
    price: i64,
    /// Cost in smallest currency unit (e.g., cents).
    cost: i64,
    bom: Vec<BomLine>,
    #[serde(default)]
    stock: StockProjection,
}

impl Product {
    pub fn new(tenant_id: TenantId, name: impl Into<String>, kind: ProductType) -> Self {
        Self {
            id: ProductId::new(),
            tenant_id,
            name: name.into(),
            kind,
            price: 0,
            cost: 0,
            bom: Vec::new(),
            stock: StockProjection::default(),
        }
    }

    pub fn with_id(mut self, id: ProductId) -> Self {
        self.id = id;
        self
    }

    pub fn with_pricing(mut self, price: i64, cost: i64) -> Self {
        self.price = price;
        self.cost = cost;
        self
    }

    pub fn with_bom(mut self, bom: Vec<BomLine>) -> Self {
        self.bom = bom;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ProductType {
        self.kind
    }

    pub fn price(&self) -> i64 {
        self.price
    }

    pub fn cost(&self) -> i64 {
        self.cost
    }

    pub fn bom(&self) -> &[BomLine] {
        &self.bom
    }

    /// The BOM used for production. Only finished goods are produced from materials.
    pub fn production_bom(&self) -> &[BomLine] {
        match self.kind {
            ProductType::FinishedGood => &self.bom,
            ProductType::RawMaterial | ProductType::Service => &[],
        }
    }

    pub fn stock(&self) -> &StockProjection {
        &self.stock
    }

    /// Total on-hand quantity across warehouses.
    pub fn on_hand(&self) -> i64 {
        self.stock.total()
    }

    /// Overwrite the derived stock fields wholesale.
    pub fn replace_stock(&mut self, projection: StockProjection) {
        self.stock = projection;
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.tenant_id.is_nil() {
            return Err(DomainError::validation("product tenant is required"));
        }
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("product name cannot be empty"));
        }
        if self.price < 0 || self.cost < 0 {
            return Err(DomainError::validation("price and cost cannot be negative"));
        }
        for line in &self.bom {
            if line.material.is_nil() {
                return Err(DomainError::validation("bom material is required"));
            }
            if line.material == self.id {
                return Err(DomainError::validation("a product cannot consume itself"));
            }
            if line.quantity <= 0 {
                return Err(DomainError::validation(format!(
                    "bom quantity for material {} must be positive",
                    line.material
                )));
            }
        }
        Ok(())
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> ProductId {
        self.id
    }
}

impl TenantOwned for Product {
    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chair(tenant_id: TenantId, bom: Vec<BomLine>) -> Product {
        Product::new(tenant_id, "Chair", ProductType::FinishedGood)
            .with_pricing(12_000, 4_500)
            .with_bom(bom)
    }

    #[test]
    fn valid_finished_good_passes() {
        let plank = ProductId::new();
        let product = chair(TenantId::new(), vec![BomLine { material: plank, quantity: 2 }]);
        assert!(product.validate().is_ok());
        assert_eq!(product.production_bom().len(), 1);
    }

    #[test]
    fn non_positive_bom_quantity_is_rejected() {
        let product = chair(TenantId::new(), vec![BomLine { material: ProductId::new(), quantity: 0 }]);
        assert!(matches!(product.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn self_referencing_bom_is_rejected() {
        let id = ProductId::new();
        let product = chair(TenantId::new(), vec![BomLine { material: id, quantity: 1 }]).with_id(id);
        assert!(product.validate().is_err());
    }

    #[test]
    fn raw_material_has_no_production_bom() {
        let product = Product::new(TenantId::new(), "Plank", ProductType::RawMaterial)
            .with_bom(vec![BomLine { material: ProductId::new(), quantity: 1 }]);
        assert!(product.production_bom().is_empty());
    }

    #[test]
    fn new_product_has_empty_stock() {
        let product = Product::new(TenantId::new(), "Glue", ProductType::RawMaterial);
        assert_eq!(product.on_hand(), 0);
        assert!(product.stock().warehouse_stock().is_empty());
    }
}
