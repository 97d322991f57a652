//! Well-known keys of the persisted layout.
//!
//! The names match the layout already written by the storefront, so a
//! session persisted before an upgrade can still be read back.

/// Cart line items, a JSON array.
pub const CART: &str = "carrinho";

/// Freight selection, `{ "tipo": ..., "valor": ... }`.
pub const FREIGHT: &str = "freteSelecionado";

/// Confirmed delivery address snapshot.
pub const DELIVERY_ADDRESS: &str = "enderecoEntrega";

/// Payment method tag, stored as a bare string.
pub const PAYMENT_METHOD: &str = "formaPagamento";

/// Bearer token written by the authentication collaborator.
pub const AUTH_TOKEN: &str = "token";

/// Display name of the authenticated user.
pub const AUTH_NAME: &str = "nome";

/// Role of the authenticated user.
pub const AUTH_ROLE: &str = "grupo";

/// Keys cleared when a checkout session ends.
pub const CHECKOUT_SESSION: [&str; 3] = [FREIGHT, DELIVERY_ADDRESS, PAYMENT_METHOD];
