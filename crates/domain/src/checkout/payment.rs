//! Payment method selection and card form validation.
//!
//! Card details are checked at the payment step and then dropped: only the
//! method tag travels further through checkout.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::CheckoutError;

/// How the shopper pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "cartao", alias = "card")]
    Card,

    #[serde(rename = "boleto", alias = "invoice")]
    Invoice,
}

impl PaymentMethod {
    /// Returns the persisted tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "cartao",
            PaymentMethod::Invoice => "boleto",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = CheckoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cartao" | "card" => Ok(PaymentMethod::Card),
            "boleto" | "invoice" => Ok(PaymentMethod::Invoice),
            other => Err(CheckoutError::UnknownPaymentMethod(other.to_string())),
        }
    }
}

/// A field of the card form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CardField {
    Number,
    HolderName,
    Expiry,
    Cvv,
    TaxId,
    BirthDate,
}

impl CardField {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardField::Number => "card number",
            CardField::HolderName => "cardholder name",
            CardField::Expiry => "expiry",
            CardField::Cvv => "CVV",
            CardField::TaxId => "tax id",
            CardField::BirthDate => "birth date",
        }
    }
}

impl std::fmt::Display for CardField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a card field was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardFieldProblem {
    /// The field is empty.
    Missing,
    /// The field has the wrong number of digits.
    Length { expected: &'static str, actual: usize },
    /// The field does not match the expected shape.
    Format { expected: &'static str },
}

impl std::fmt::Display for CardFieldProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CardFieldProblem::Missing => write!(f, "is required"),
            CardFieldProblem::Length { expected, actual } => {
                write!(f, "must have {expected} digits, got {actual}")
            }
            CardFieldProblem::Format { expected } => write!(f, "must match {expected}"),
        }
    }
}

/// Credit card data as entered in the payment form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardDetails {
    pub number: String,
    pub holder_name: String,
    /// `MM/YY`
    pub expiry: String,
    pub cvv: String,
    /// Individual (11 digits) or company (14 digits) tax id.
    pub tax_id: String,
    pub birth_date: String,
    pub nickname: Option<String>,
}

impl CardDetails {
    /// Checks the form, reporting the first offending field.
    ///
    /// Required fields are checked first, then the number, CVV, expiry and
    /// tax id, in that order.
    pub fn validate(&self) -> Result<(), CheckoutError> {
        let required = [
            (CardField::Number, &self.number),
            (CardField::HolderName, &self.holder_name),
            (CardField::Expiry, &self.expiry),
            (CardField::Cvv, &self.cvv),
            (CardField::TaxId, &self.tax_id),
            (CardField::BirthDate, &self.birth_date),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(invalid(field, CardFieldProblem::Missing));
            }
        }

        let number = digits_only(&self.number);
        if number.len() != 16 {
            return Err(invalid(
                CardField::Number,
                CardFieldProblem::Length {
                    expected: "16",
                    actual: number.len(),
                },
            ));
        }

        let cvv = digits_only(&self.cvv);
        if cvv.len() != 3 {
            return Err(invalid(
                CardField::Cvv,
                CardFieldProblem::Length {
                    expected: "3",
                    actual: cvv.len(),
                },
            ));
        }

        if !is_expiry(self.expiry.trim()) {
            return Err(invalid(
                CardField::Expiry,
                CardFieldProblem::Format { expected: "MM/YY" },
            ));
        }

        let tax_id = digits_only(&self.tax_id);
        if !(11..=14).contains(&tax_id.len()) {
            return Err(invalid(
                CardField::TaxId,
                CardFieldProblem::Length {
                    expected: "11 to 14",
                    actual: tax_id.len(),
                },
            ));
        }

        Ok(())
    }

    /// Returns the number with all but the last four digits hidden.
    pub fn masked_number(&self) -> String {
        let digits = digits_only(&self.number);
        let visible = digits.len().saturating_sub(4);
        let tail = &digits[visible..];
        format!("{}{}", "*".repeat(visible), tail)
    }
}

/// The payment step's input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentInput {
    Invoice,
    Card(CardDetails),
}

impl PaymentInput {
    /// Validates the input and returns the method to record.
    pub fn validate(&self) -> Result<PaymentMethod, CheckoutError> {
        match self {
            PaymentInput::Invoice => Ok(PaymentMethod::Invoice),
            PaymentInput::Card(details) => {
                details.validate()?;
                Ok(PaymentMethod::Card)
            }
        }
    }

    pub fn method(&self) -> PaymentMethod {
        match self {
            PaymentInput::Invoice => PaymentMethod::Invoice,
            PaymentInput::Card(_) => PaymentMethod::Card,
        }
    }
}

/// Keeps only ASCII digits.
pub fn digits_only(input: &str) -> String {
    input.chars().filter(char::is_ascii_digit).collect()
}

/// Keeps only ASCII letters and whitespace.
pub fn letters_only(input: &str) -> String {
    input
        .chars()
        .filter(|c| c.is_ascii_alphabetic() || c.is_whitespace())
        .collect()
}

/// Shapes raw expiry keystrokes into `MM/YY`.
///
/// Non-digits are dropped and at most four digits are kept; the slash is
/// inserted once a third digit is typed.
pub fn format_expiry_input(input: &str) -> String {
    let digits: String = digits_only(input).chars().take(4).collect();
    if digits.len() >= 3 {
        format!("{}/{}", &digits[..2], &digits[2..])
    } else {
        digits
    }
}

fn is_expiry(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 5
        && bytes[2] == b'/'
        && bytes[..2].iter().all(u8::is_ascii_digit)
        && bytes[3..].iter().all(u8::is_ascii_digit)
}

fn invalid(field: CardField, problem: CardFieldProblem) -> CheckoutError {
    CheckoutError::InvalidCardField { field, problem }
}
