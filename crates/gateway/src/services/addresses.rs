//! Saved delivery addresses and postal code lookup.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use common::types::lenient;
use domain::{AuthSession, DeliveryAddress};
use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, Result};

/// Street data returned for a postal code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostalCodeLookup {
    #[serde(rename = "cep", default, deserialize_with = "lenient::string_or_number")]
    pub postal_code: String,

    #[serde(rename = "logradouro", default)]
    pub street: String,

    #[serde(rename = "bairro", default)]
    pub district: String,

    #[serde(rename = "cidade", alias = "localidade", default)]
    pub city: String,

    #[serde(rename = "uf", default)]
    pub region: String,
}

/// Trait for the customer's address book.
#[async_trait]
pub trait AddressBook: Send + Sync {
    /// Lists the signed-in customer's saved delivery addresses.
    async fn saved_addresses(&self, auth: &AuthSession) -> Result<Vec<DeliveryAddress>>;

    /// Looks up street data for a postal code.
    async fn lookup_postal_code(&self, postal_code: &str) -> Result<PostalCodeLookup>;
}

#[derive(Debug, Default)]
struct InMemoryAddressBookState {
    addresses: HashMap<String, Vec<DeliveryAddress>>,
    postal_codes: HashMap<String, PostalCodeLookup>,
    fail_on_list: bool,
    list_calls: usize,
}

/// In-memory address book for testing, keyed by bearer token.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAddressBook {
    state: Arc<RwLock<InMemoryAddressBookState>>,
}

impl InMemoryAddressBook {
    /// Creates an empty address book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Saves an address for the customer holding `token`.
    pub fn add_address(&self, token: &str, address: DeliveryAddress) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .addresses
            .entry(token.to_string())
            .or_default()
            .push(address);
    }

    /// Registers a postal code lookup result.
    pub fn add_postal_code(&self, lookup: PostalCodeLookup) {
        let key = normalize_postal_code(&lookup.postal_code);
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .postal_codes
            .insert(key, lookup);
    }

    /// Configures listing to fail.
    pub fn set_fail_on_list(&self, fail: bool) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .fail_on_list = fail;
    }

    /// Returns the number of listing calls made.
    pub fn list_count(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .list_calls
    }
}

#[async_trait]
impl AddressBook for InMemoryAddressBook {
    async fn saved_addresses(&self, auth: &AuthSession) -> Result<Vec<DeliveryAddress>> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.list_calls += 1;

        if state.fail_on_list {
            return Err(GatewayError::Service {
                operation: "address listing",
                status: Some(500),
                message: "Address book unavailable".to_string(),
            });
        }

        Ok(state.addresses.get(&auth.token).cloned().unwrap_or_default())
    }

    async fn lookup_postal_code(&self, postal_code: &str) -> Result<PostalCodeLookup> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state
            .postal_codes
            .get(&normalize_postal_code(postal_code))
            .cloned()
            .ok_or_else(|| GatewayError::Service {
                operation: "postal code lookup",
                status: Some(404),
                message: format!("Postal code {postal_code} not found"),
            })
    }
}

/// Strips everything but digits from a postal code.
pub fn normalize_postal_code(postal_code: &str) -> String {
    domain::checkout::digits_only(postal_code)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth(token: &str) -> AuthSession {
        AuthSession {
            token: token.to_string(),
            name: None,
            role: None,
        }
    }

    #[tokio::test]
    async fn test_addresses_are_per_customer() {
        let book = InMemoryAddressBook::new();
        book.add_address(
            "ana",
            DeliveryAddress {
                id: "1".into(),
                street: "Rua A".to_string(),
                number: "1".to_string(),
                district: "Centro".to_string(),
                city: "Campinas".to_string(),
                region: "SP".to_string(),
                postal_code: "13010000".to_string(),
                complement: None,
            },
        );

        assert_eq!(book.saved_addresses(&auth("ana")).await.unwrap().len(), 1);
        assert!(book.saved_addresses(&auth("bia")).await.unwrap().is_empty());
        assert_eq!(book.list_count(), 2);
    }

    #[tokio::test]
    async fn test_lookup_ignores_punctuation() {
        let book = InMemoryAddressBook::new();
        book.add_postal_code(PostalCodeLookup {
            postal_code: "01001-000".to_string(),
            street: "Praça da Sé".to_string(),
            district: "Sé".to_string(),
            city: "São Paulo".to_string(),
            region: "SP".to_string(),
        });

        let found = book.lookup_postal_code("01001000").await.unwrap();
        assert_eq!(found.city, "São Paulo");
    }

    #[test]
    fn test_lookup_reads_viacep_names() {
        let raw = r#"{"cep":"01001-000","logradouro":"Praça da Sé","bairro":"Sé","localidade":"São Paulo","uf":"SP","ibge":"3550308"}"#;
        let lookup: PostalCodeLookup = serde_json::from_str(raw).unwrap();
        assert_eq!(lookup.city, "São Paulo");
    }
}
