use serde::{Deserialize, Serialize};

use shelfkit_core::{
    AvailabilityId, Entity, ProductId, ProductOptionId, ProductOptionValueId, SkuId, ValueObject,
};

/// A selected value for one option of a SKU.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SkuConfiguration {
    pub option_id: ProductOptionId,
    pub value_id: ProductOptionValueId,
}

impl SkuConfiguration {
    pub fn new(option_id: ProductOptionId, value_id: ProductOptionValueId) -> Self {
        Self {
            option_id,
            value_id,
        }
    }
}

impl ValueObject for SkuConfiguration {}

/// A specific purchasable configuration of a product.
///
/// Created through [`crate::Product::add_sku`], which validates the
/// configuration against the product type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sku {
    id: SkuId,
    product_id: ProductId,
    availability_id: AvailabilityId,
    configurations: Vec<SkuConfiguration>,
}

impl Sku {
    pub(crate) fn new(
        id: SkuId,
        product_id: ProductId,
        availability_id: AvailabilityId,
        mut configurations: Vec<SkuConfiguration>,
    ) -> Self {
        configurations.sort();
        Self {
            id,
            product_id,
            availability_id,
            configurations,
        }
    }

    pub fn id_typed(&self) -> SkuId {
        self.id
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    /// The availability record governing whether this SKU can be bought.
    pub fn availability_id(&self) -> AvailabilityId {
        self.availability_id
    }

    /// Selections ordered by option id.
    pub fn configurations(&self) -> &[SkuConfiguration] {
        &self.configurations
    }

    /// The value selected for `option_id`, if any.
    pub fn value_for(&self, option_id: ProductOptionId) -> Option<ProductOptionValueId> {
        self.configurations
            .iter()
            .find(|c| c.option_id == option_id)
            .map(|c| c.value_id)
    }
}

impl Entity for Sku {
    type Id = SkuId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
