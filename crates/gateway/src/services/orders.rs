//! Order service trait, order payloads and in-memory implementation.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use common::types::lenient;
use common::{AddressId, Money, OrderNumber, ProductId};
use domain::{AuthSession, Cart, ConfirmedSelections, PaymentMethod};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, Result};

/// One cart line as sent to the order endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    #[serde(rename = "produtoId")]
    pub product_id: ProductId,

    #[serde(rename = "quantidade")]
    pub quantity: u32,

    #[serde(rename = "precoUnitario", with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
}

/// Body of `POST /pedidos`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    #[serde(rename = "enderecoEntregaId")]
    pub address_id: AddressId,

    #[serde(rename = "formaPagamento")]
    pub payment_method: PaymentMethod,

    #[serde(rename = "frete", with = "rust_decimal::serde::float")]
    pub freight: Decimal,

    #[serde(rename = "produtos")]
    pub items: Vec<OrderLine>,
}

impl OrderRequest {
    /// Builds the request from the confirmed selections and the cart lines.
    pub fn new(selections: &ConfirmedSelections, cart: &Cart) -> Self {
        Self {
            address_id: selections.address.id.clone(),
            payment_method: selections.payment,
            freight: selections.freight.amount.amount(),
            items: cart
                .items()
                .iter()
                .map(|item| OrderLine {
                    product_id: item.product_id.clone(),
                    quantity: item.quantity,
                    unit_price: item.unit_price.amount(),
                })
                .collect(),
        }
    }

    /// Returns the total the backend is expected to confirm.
    pub fn expected_total(&self) -> Money {
        let lines: Money = self
            .items
            .iter()
            .map(|line| Money::new(line.unit_price).multiply(line.quantity))
            .sum();
        lines + Money::new(self.freight)
    }
}

/// Response of `POST /pedidos`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderConfirmation {
    #[serde(rename = "numeroPedido")]
    pub order_number: OrderNumber,

    #[serde(rename = "valorTotal")]
    pub total: Money,
}

/// An entry of the customer's order history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    #[serde(rename = "numeroPedido")]
    pub order_number: OrderNumber,

    #[serde(rename = "dataCriacao")]
    pub created_at: NaiveDateTime,

    #[serde(rename = "valorTotal")]
    pub total: Money,

    pub status: String,
}

/// A product line of a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDetailItem {
    #[serde(rename = "nomeProduto")]
    pub product_name: String,

    #[serde(rename = "quantidade")]
    pub quantity: u32,

    #[serde(rename = "precoUnitario")]
    pub unit_price: Money,
}

/// Delivery address as echoed back by the order detail.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    #[serde(rename = "logradouro", default)]
    pub street: String,

    #[serde(rename = "numero", default, deserialize_with = "lenient::string_or_number")]
    pub number: String,

    #[serde(rename = "bairro", default)]
    pub district: String,

    #[serde(rename = "cidade", default)]
    pub city: String,

    #[serde(rename = "uf", default)]
    pub region: String,

    #[serde(rename = "cep", default, deserialize_with = "lenient::string_or_number")]
    pub postal_code: String,
}

/// Response of `GET /pedidos/{numero}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDetail {
    #[serde(rename = "numeroPedido")]
    pub order_number: OrderNumber,

    #[serde(rename = "dataCriacao")]
    pub created_at: NaiveDateTime,

    pub status: String,

    #[serde(rename = "valorTotal")]
    pub total: Money,

    #[serde(rename = "valorFrete", default)]
    pub freight: Money,

    #[serde(rename = "formaPagamento", default)]
    pub payment_method: Option<String>,

    #[serde(rename = "enderecoEntrega", default)]
    pub delivery_address: Option<ShippingAddress>,

    #[serde(rename = "itens", default)]
    pub items: Vec<OrderDetailItem>,
}

/// Trait for order creation and history.
#[async_trait]
pub trait OrderService: Send + Sync {
    /// Creates an order for the signed-in customer.
    async fn create_order(
        &self,
        auth: &AuthSession,
        request: &OrderRequest,
    ) -> Result<OrderConfirmation>;

    /// Lists the signed-in customer's orders.
    async fn my_orders(&self, auth: &AuthSession) -> Result<Vec<OrderSummary>>;

    /// Fetches one of the signed-in customer's orders.
    async fn order_detail(&self, auth: &AuthSession, number: &OrderNumber) -> Result<OrderDetail>;
}

#[derive(Debug)]
struct PlacedOrder {
    token: String,
    detail: OrderDetail,
}

#[derive(Debug, Default)]
struct InMemoryOrderState {
    orders: Vec<PlacedOrder>,
    requests: Vec<OrderRequest>,
    next_number: u32,
    fail_on_create: bool,
    reject_token: bool,
    delay: Option<Duration>,
}

/// In-memory order service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderService {
    state: Arc<RwLock<InMemoryOrderState>>,
}

impl InMemoryOrderService {
    /// Creates a new in-memory order service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures order creation to fail.
    pub fn set_fail_on_create(&self, fail: bool) {
        self.write().fail_on_create = fail;
    }

    /// Configures every call to reject the bearer token.
    pub fn set_reject_token(&self, reject: bool) {
        self.write().reject_token = reject;
    }

    /// Delays every order creation.
    pub fn set_delay(&self, delay: Option<Duration>) {
        self.write().delay = delay;
    }

    /// Returns the number of creation requests received.
    pub fn create_count(&self) -> usize {
        self.read().requests.len()
    }

    /// Returns the last creation request received.
    pub fn last_request(&self) -> Option<OrderRequest> {
        self.read().requests.last().cloned()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, InMemoryOrderState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, InMemoryOrderState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_token(&self) -> Result<()> {
        if self.read().reject_token {
            return Err(GatewayError::SessionExpired);
        }
        Ok(())
    }
}

#[async_trait]
impl OrderService for InMemoryOrderService {
    async fn create_order(
        &self,
        auth: &AuthSession,
        request: &OrderRequest,
    ) -> Result<OrderConfirmation> {
        let delay = {
            let mut state = self.write();
            state.requests.push(request.clone());
            state.delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.check_token()?;
        let mut state = self.write();
        if state.fail_on_create {
            return Err(GatewayError::Service {
                operation: "order creation",
                status: Some(500),
                message: "Order rejected".to_string(),
            });
        }

        state.next_number += 1;
        let order_number = OrderNumber::from(u64::from(1000 + state.next_number));
        let total = request.expected_total();

        state.orders.push(PlacedOrder {
            token: auth.token.clone(),
            detail: OrderDetail {
                order_number: order_number.clone(),
                created_at: chrono::Utc::now().naive_utc(),
                status: "AGUARDANDO_PAGAMENTO".to_string(),
                total,
                freight: Money::new(request.freight),
                payment_method: Some(request.payment_method.as_str().to_string()),
                delivery_address: None,
                items: request
                    .items
                    .iter()
                    .map(|line| OrderDetailItem {
                        product_name: line.product_id.to_string(),
                        quantity: line.quantity,
                        unit_price: Money::new(line.unit_price),
                    })
                    .collect(),
            },
        });

        Ok(OrderConfirmation {
            order_number,
            total,
        })
    }

    async fn my_orders(&self, auth: &AuthSession) -> Result<Vec<OrderSummary>> {
        self.check_token()?;
        Ok(self
            .read()
            .orders
            .iter()
            .filter(|order| order.token == auth.token)
            .map(|order| OrderSummary {
                order_number: order.detail.order_number.clone(),
                created_at: order.detail.created_at,
                total: order.detail.total,
                status: order.detail.status.clone(),
            })
            .collect())
    }

    async fn order_detail(&self, auth: &AuthSession, number: &OrderNumber) -> Result<OrderDetail> {
        self.check_token()?;
        self.read()
            .orders
            .iter()
            .find(|order| order.token == auth.token && &order.detail.order_number == number)
            .map(|order| order.detail.clone())
            .ok_or_else(|| GatewayError::Service {
                operation: "order detail",
                status: Some(404),
                message: format!("Order {number} not found"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> OrderRequest {
        OrderRequest {
            address_id: "42".into(),
            payment_method: PaymentMethod::Invoice,
            freight: Decimal::new(1000, 2),
            items: vec![OrderLine {
                product_id: "7".into(),
                quantity: 3,
                unit_price: Decimal::new(5000, 2),
            }],
        }
    }

    fn auth(token: &str) -> AuthSession {
        AuthSession {
            token: token.to_string(),
            name: None,
            role: None,
        }
    }

    #[test]
    fn test_request_wire_shape() {
        let json = serde_json::to_value(request()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "enderecoEntregaId": "42",
                "formaPagamento": "boleto",
                "frete": 10.0,
                "produtos": [{ "produtoId": "7", "quantidade": 3, "precoUnitario": 50.0 }]
            })
        );
    }

    #[test]
    fn test_confirmation_reads_numeric_fields() {
        let raw = r#"{"numeroPedido": 20240001, "valorTotal": 160.0}"#;
        let confirmation: OrderConfirmation = serde_json::from_str(raw).unwrap();
        assert_eq!(confirmation.order_number.as_str(), "20240001");
        assert_eq!(confirmation.total, Money::from_cents(16000));
    }

    #[test]
    fn test_detail_reads_backend_layout() {
        let raw = r#"{
            "numeroPedido": 5,
            "dataCriacao": "2024-05-01T10:20:30.123",
            "status": "ENTREGUE",
            "valorTotal": 60.0,
            "valorFrete": 10.0,
            "formaPagamento": "cartao",
            "enderecoEntrega": {"logradouro": "Rua A", "numero": 10, "bairro": "Centro", "cidade": "Campinas", "uf": "SP", "cep": "13010000"},
            "itens": [{"nomeProduto": "Mug", "quantidade": 1, "precoUnitario": 50.0}]
        }"#;
        let detail: OrderDetail = serde_json::from_str(raw).unwrap();
        assert_eq!(detail.items.len(), 1);
        assert_eq!(detail.delivery_address.unwrap().number, "10");
        assert_eq!(detail.freight, Money::from_cents(1000));
    }

    #[test]
    fn test_expected_total() {
        assert_eq!(request().expected_total(), Money::from_cents(16000));
    }

    #[tokio::test]
    async fn test_create_then_list_and_detail() {
        let service = InMemoryOrderService::new();
        let confirmation = service.create_order(&auth("ana"), &request()).await.unwrap();
        assert_eq!(confirmation.total, Money::from_cents(16000));

        let mine = service.my_orders(&auth("ana")).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert!(service.my_orders(&auth("bia")).await.unwrap().is_empty());

        let detail = service
            .order_detail(&auth("ana"), &confirmation.order_number)
            .await
            .unwrap();
        assert_eq!(detail.items[0].quantity, 3);
        assert!(
            service
                .order_detail(&auth("bia"), &confirmation.order_number)
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_rejected_token() {
        let service = InMemoryOrderService::new();
        service.set_reject_token(true);
        let err = service.create_order(&auth("ana"), &request()).await.unwrap_err();
        assert!(matches!(err, GatewayError::SessionExpired));
        assert_eq!(service.create_count(), 1);
    }
}
