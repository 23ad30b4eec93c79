//! Catalog domain module: products, categories and suppliers.
//!
//! Validation and value types only. Persistence goes through the store traits
//! in `pricewise-infra`.

pub mod filter;
pub mod party;
pub mod product;

pub use filter::ProductFilter;
pub use party::{Category, CategorySummary, Supplier, SupplierPatch, SupplierSummary};
pub use product::{NewProduct, Product, ProductListing, ProductPatch, ProductRemoval};
