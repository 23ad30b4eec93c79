//! Reference entities products point at: categories and suppliers.

use serde::{Deserialize, Serialize};

use pricewise_core::{CategoryId, DomainError, DomainResult, Entity, SupplierId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
}

impl Category {
    pub fn new(name: impl Into<String>, description: Option<String>) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::invalid_input("category name cannot be empty"));
        }
        Ok(Self {
            id: CategoryId::new(),
            name: name.trim().to_string(),
            description,
        })
    }
}

impl Entity for Category {
    type Id = CategoryId;

    fn id(&self) -> CategoryId {
        self.id
    }
}

/// Category with the number of products filed under it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub category: Category,
    pub product_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supplier {
    pub id: SupplierId,
    pub company_name: String,
    pub contact_email: Option<String>,
    pub tax_number: Option<String>,
    pub address: Option<String>,
}

impl Supplier {
    pub fn new(company_name: impl Into<String>) -> DomainResult<Self> {
        let company_name = company_name.into();
        if company_name.trim().is_empty() {
            return Err(DomainError::invalid_input("company name cannot be empty"));
        }
        Ok(Self {
            id: SupplierId::new(),
            company_name: company_name.trim().to_string(),
            contact_email: None,
            tax_number: None,
            address: None,
        })
    }
}

impl Entity for Supplier {
    type Id = SupplierId;

    fn id(&self) -> SupplierId {
        self.id
    }
}

/// Partial supplier update. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierPatch {
    pub company_name: Option<String>,
    pub contact_email: Option<String>,
    pub tax_number: Option<String>,
    pub address: Option<String>,
}

impl SupplierPatch {
    pub fn apply(&self, supplier: &mut Supplier) -> DomainResult<()> {
        if let Some(name) = &self.company_name {
            if name.trim().is_empty() {
                return Err(DomainError::invalid_input("company name cannot be empty"));
            }
            supplier.company_name = name.trim().to_string();
        }
        if let Some(email) = &self.contact_email {
            supplier.contact_email = Some(email.clone());
        }
        if let Some(tax_number) = &self.tax_number {
            supplier.tax_number = Some(tax_number.clone());
        }
        if let Some(address) = &self.address {
            supplier.address = Some(address.clone());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierSummary {
    pub supplier: Supplier,
    pub product_count: i64,
}
