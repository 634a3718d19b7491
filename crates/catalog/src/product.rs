use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use shelfkit_core::{AvailabilityId, DomainError, DomainResult, Entity, ProductId, ProductTypeId, SkuId};

use crate::product_type::ProductType;
use crate::sku::{Sku, SkuConfiguration};

/// A product. May hold many SKUs (configurable) or exactly one (not
/// configurable), in which case that SKU is also the default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    product_type_id: ProductTypeId,
    name: String,
    configurable: bool,
    skus: Vec<Sku>,
    default_sku: Option<SkuId>,
}

impl Product {
    pub fn new(id: ProductId, product_type: &ProductType, name: impl Into<String>) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("product name cannot be empty"));
        }
        Ok(Self {
            id,
            product_type_id: product_type.id_typed(),
            name,
            configurable: product_type.configurable(),
            skus: Vec::new(),
            default_sku: None,
        })
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn product_type_id(&self) -> ProductTypeId {
        self.product_type_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn configurable(&self) -> bool {
        self.configurable
    }

    pub fn skus(&self) -> &[Sku] {
        &self.skus
    }

    pub fn sku(&self, sku_id: SkuId) -> Option<&Sku> {
        self.skus.iter().find(|s| s.id_typed() == sku_id)
    }

    pub fn default_sku(&self) -> Option<&Sku> {
        self.default_sku.and_then(|id| self.sku(id))
    }

    /// Add a SKU bound to `availability_id` with the given option selections.
    ///
    /// - the product type must be this product's type
    /// - each option may be selected once, with a value of that option
    /// - no two SKUs may share a full configuration or an availability record
    /// - a non-configurable product holds exactly one SKU, which becomes its default
    pub fn add_sku(
        &mut self,
        product_type: &ProductType,
        availability_id: AvailabilityId,
        configurations: Vec<SkuConfiguration>,
    ) -> DomainResult<SkuId> {
        if product_type.id_typed() != self.product_type_id {
            return Err(DomainError::invariant("product_type_id mismatch"));
        }
        if !self.configurable && !self.skus.is_empty() {
            return Err(DomainError::conflict(format!(
                "product '{}' is not configurable and already has a SKU",
                self.name
            )));
        }

        let mut seen_options = HashSet::new();
        for configuration in &configurations {
            if !seen_options.insert(configuration.option_id) {
                return Err(DomainError::conflict(format!(
                    "option {} selected more than once",
                    configuration.option_id
                )));
            }
            product_type.validate_configuration(configuration)?;
        }

        if self.skus.iter().any(|s| s.availability_id() == availability_id) {
            return Err(DomainError::conflict(format!(
                "availability {availability_id} is already bound to a SKU"
            )));
        }

        let sku = Sku::new(SkuId::new(), self.id, availability_id, configurations);
        if self.skus.iter().any(|s| s.configurations() == sku.configurations()) {
            return Err(DomainError::conflict("a SKU with this configuration already exists"));
        }

        let sku_id = sku.id_typed();
        self.skus.push(sku);
        if !self.configurable {
            self.default_sku = Some(sku_id);
        }
        Ok(sku_id)
    }

    /// Choose which SKU stands for the product when none is selected.
    pub fn set_default_sku(&mut self, sku_id: SkuId) -> DomainResult<()> {
        if self.sku(sku_id).is_none() {
            return Err(DomainError::not_found(format!("sku {sku_id}")));
        }
        self.default_sku = Some(sku_id);
        Ok(())
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
