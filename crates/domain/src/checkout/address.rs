use common::AddressId;
use common::types::lenient;
use serde::{Deserialize, Serialize};

/// Snapshot of a saved delivery address.
///
/// The address itself belongs to the customer profile; checkout keeps a
/// copy for display and refers to it by id when the order is placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryAddress {
    pub id: AddressId,

    #[serde(rename = "logradouro")]
    pub street: String,

    #[serde(rename = "numero", default, deserialize_with = "lenient::string_or_number")]
    pub number: String,

    #[serde(rename = "bairro")]
    pub district: String,

    #[serde(rename = "cidade")]
    pub city: String,

    #[serde(rename = "uf")]
    pub region: String,

    #[serde(rename = "cep", deserialize_with = "lenient::string_or_number")]
    pub postal_code: String,

    #[serde(rename = "complemento", default, skip_serializing_if = "Option::is_none")]
    pub complement: Option<String>,
}

impl std::fmt::Display for DeliveryAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}, {} - {}, {}/{}",
            self.street, self.number, self.district, self.city, self.region
        )
    }
}
