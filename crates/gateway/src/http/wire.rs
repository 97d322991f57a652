use common::{Money, ProductId};
use domain::Product;
use serde::Deserialize;

use crate::error::{GatewayError, Result};

/// Product as returned by `GET /produtos/{id}`.
///
/// Fields the cart does not use (images, rating, descriptions) are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductPayload {
    pub id: ProductId,

    #[serde(rename = "nome")]
    pub name: String,

    #[serde(rename = "preco")]
    pub price: Money,

    #[serde(rename = "quantidadeEstoque")]
    pub stock: i64,
}

impl ProductPayload {
    /// Converts the payload, rejecting negative prices or stock.
    pub fn into_product(self) -> Result<Product> {
        let stock = u32::try_from(self.stock).map_err(|_| GatewayError::MalformedResponse {
            operation: "product lookup",
            reason: format!("stock {} for product {}", self.stock, self.id),
        })?;

        Product::new(self.id, self.name, self.price, stock).map_err(|e| {
            GatewayError::MalformedResponse {
                operation: "product lookup",
                reason: e.to_string(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_catalog_payload() {
        let raw = r#"{"id":9,"nome":"Caneca","preco":39.9,"quantidadeEstoque":12,"imagens":[],"avaliacao":4.5}"#;
        let payload: ProductPayload = serde_json::from_str(raw).unwrap();
        let product = payload.into_product().unwrap();

        assert_eq!(product.id.as_str(), "9");
        assert_eq!(product.unit_price, Money::from_cents(3990));
        assert_eq!(product.stock, 12);
    }

    #[test]
    fn rejects_negative_stock_and_price() {
        let negative_stock: ProductPayload =
            serde_json::from_str(r#"{"id":1,"nome":"A","preco":1,"quantidadeEstoque":-2}"#).unwrap();
        assert!(matches!(
            negative_stock.into_product(),
            Err(GatewayError::MalformedResponse { .. })
        ));

        let negative_price: ProductPayload =
            serde_json::from_str(r#"{"id":1,"nome":"A","preco":-1,"quantidadeEstoque":2}"#).unwrap();
        assert!(negative_price.into_product().is_err());
    }
}
