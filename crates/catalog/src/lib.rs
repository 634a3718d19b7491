//! Catalog domain module.
//!
//! Product types declare options and their allowed values; products own SKUs;
//! each SKU is one option/value configuration bound to exactly one
//! availability record. Pure domain logic: no IO, no storage.

pub mod product;
pub mod product_type;
pub mod sku;

pub use product::Product;
pub use product_type::{ProductOption, ProductOptionValue, ProductType};
pub use sku::{Sku, SkuConfiguration};
