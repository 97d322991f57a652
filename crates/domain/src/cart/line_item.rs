use common::{Money, ProductId};
use serde::{Deserialize, Serialize};

use super::CartError;

/// A product as supplied by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Catalog identifier.
    pub id: ProductId,

    /// Display name.
    pub name: String,

    /// Current unit price.
    pub unit_price: Money,

    /// Units available right now.
    pub stock: u32,
}

impl Product {
    /// Creates a product, rejecting a negative price.
    pub fn new(
        id: impl Into<ProductId>,
        name: impl Into<String>,
        unit_price: Money,
        stock: u32,
    ) -> Result<Self, CartError> {
        let product = Self {
            id: id.into(),
            name: name.into(),
            unit_price,
            stock,
        };
        product.validate()?;
        Ok(product)
    }

    /// Checks the record invariants.
    pub fn validate(&self) -> Result<(), CartError> {
        if self.unit_price.is_negative() {
            return Err(CartError::InvalidPrice {
                product_id: self.id.clone(),
                price: self.unit_price,
            });
        }
        Ok(())
    }

    /// Returns true if at least one unit can be bought.
    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// One product entry in the cart.
///
/// Serialized with the field names of the persisted cart layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineItem {
    /// The product identifier, unique within the cart.
    #[serde(rename = "id")]
    pub product_id: ProductId,

    /// Human-readable product name.
    #[serde(rename = "nome", default)]
    pub name: String,

    /// Price per unit at the time the item was added.
    #[serde(rename = "preco")]
    pub unit_price: Money,

    /// Units in the cart, at least one.
    #[serde(rename = "quantidade")]
    pub quantity: u32,

    /// Units available when the item was added or last refreshed.
    #[serde(rename = "quantidadeEstoque")]
    pub stock_ceiling: u32,
}

impl CartLineItem {
    /// Creates a single-unit line for a product.
    pub fn for_product(product: &Product) -> Self {
        Self {
            product_id: product.id.clone(),
            name: product.name.clone(),
            unit_price: product.unit_price,
            quantity: 1,
            stock_ceiling: product.stock,
        }
    }

    /// Returns the line total (quantity * unit_price).
    pub fn total_price(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }

    /// Returns true if one more unit fits under the stock ceiling.
    pub fn can_increment(&self) -> bool {
        self.quantity < self.stock_ceiling
    }

    /// Returns true if the catalog reported no stock at the last refresh.
    ///
    /// Such a line stays in the cart until the shopper removes it.
    pub fn is_out_of_stock(&self) -> bool {
        self.stock_ceiling == 0
    }
}
