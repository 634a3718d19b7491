use serde::{Deserialize, Serialize};

use shelfkit_core::{
    DomainError, DomainResult, Entity, ProductOptionId, ProductOptionValueId, ProductTypeId,
};

use crate::sku::SkuConfiguration;

/// A kind of product, declaring which options its SKUs choose between.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductType {
    id: ProductTypeId,
    name: String,
    configurable: bool,
    options: Vec<ProductOption>,
}

/// An option declared by a product type (e.g. "size").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductOption {
    id: ProductOptionId,
    product_type_id: ProductTypeId,
    name: String,
    values: Vec<ProductOptionValue>,
}

/// One allowed value of an option (e.g. "XL").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductOptionValue {
    id: ProductOptionValueId,
    option_id: ProductOptionId,
    value: String,
}

impl ProductType {
    pub fn new(id: ProductTypeId, name: impl Into<String>, configurable: bool) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("product type name cannot be empty"));
        }
        Ok(Self {
            id,
            name,
            configurable,
            options: Vec::new(),
        })
    }

    pub fn id_typed(&self) -> ProductTypeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn configurable(&self) -> bool {
        self.configurable
    }

    pub fn options(&self) -> &[ProductOption] {
        &self.options
    }

    pub fn option(&self, option_id: ProductOptionId) -> Option<&ProductOption> {
        self.options.iter().find(|o| o.id == option_id)
    }

    pub fn option_by_name(&self, name: &str) -> Option<&ProductOption> {
        self.options.iter().find(|o| o.name == name)
    }

    /// Declare a new option. Option names are unique per product type.
    pub fn add_option(&mut self, name: impl Into<String>) -> DomainResult<ProductOptionId> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("option name cannot be empty"));
        }
        if self.option_by_name(&name).is_some() {
            return Err(DomainError::conflict(format!(
                "product type '{}' already has an option named '{name}'",
                self.name
            )));
        }

        let id = ProductOptionId::new();
        self.options.push(ProductOption {
            id,
            product_type_id: self.id,
            name,
            values: Vec::new(),
        });
        Ok(id)
    }

    /// Add an allowed value to one of this type's options.
    pub fn add_value(
        &mut self,
        option_id: ProductOptionId,
        value: impl Into<String>,
    ) -> DomainResult<ProductOptionValueId> {
        let option = self
            .options
            .iter_mut()
            .find(|o| o.id == option_id)
            .ok_or_else(|| DomainError::not_found(format!("option {option_id}")))?;
        option.add_value(value)
    }

    /// Check that `configuration` names one of this type's options and a value
    /// of that option.
    pub fn validate_configuration(&self, configuration: &SkuConfiguration) -> DomainResult<()> {
        let option = self.option(configuration.option_id).ok_or_else(|| {
            DomainError::validation(format!(
                "option {} does not belong to product type '{}'",
                configuration.option_id, self.name
            ))
        })?;
        if option.value(configuration.value_id).is_none() {
            return Err(DomainError::validation(format!(
                "value {} does not belong to option '{}'",
                configuration.value_id, option.name
            )));
        }
        Ok(())
    }

    /// Render a configuration as `option : value`.
    pub fn describe(&self, configuration: &SkuConfiguration) -> Option<String> {
        let option = self.option(configuration.option_id)?;
        let value = option.value(configuration.value_id)?;
        Some(format!("{} : {}", option.name, value.value))
    }
}

impl Entity for ProductType {
    type Id = ProductTypeId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl ProductOption {
    pub fn id_typed(&self) -> ProductOptionId {
        self.id
    }

    pub fn product_type_id(&self) -> ProductTypeId {
        self.product_type_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[ProductOptionValue] {
        &self.values
    }

    pub fn value(&self, value_id: ProductOptionValueId) -> Option<&ProductOptionValue> {
        self.values.iter().find(|v| v.id == value_id)
    }

    pub fn value_by_name(&self, value: &str) -> Option<&ProductOptionValue> {
        self.values.iter().find(|v| v.value == value)
    }

    fn add_value(&mut self, value: impl Into<String>) -> DomainResult<ProductOptionValueId> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(DomainError::validation("option value cannot be empty"));
        }
        if self.value_by_name(&value).is_some() {
            return Err(DomainError::conflict(format!(
                "option '{}' already has a value '{value}'",
                self.name
            )));
        }

        let id = ProductOptionValueId::new();
        self.values.push(ProductOptionValue {
            id,
            option_id: self.id,
            value,
        });
        Ok(id)
    }
}

impl Entity for ProductOption {
    type Id = ProductOptionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl core::fmt::Display for ProductOption {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.name)
    }
}

impl ProductOptionValue {
    pub fn id_typed(&self) -> ProductOptionValueId {
        self.id
    }

    pub fn option_id(&self) -> ProductOptionId {
        self.option_id
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl Entity for ProductOptionValue {
    type Id = ProductOptionValueId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl core::fmt::Display for ProductOptionValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.value)
    }
}
