//! Form validation: field rules, collected errors and Brazilian tax-ID
//! checksums.
//!
//! Rules follow the same shape for every form: a value goes through a
//! [`ValidationRule`], failures are pushed onto [`FormErrors`] under the
//! backend's field name, and the form refuses to submit while any error is
//! present.

use std::fmt;

use chrono::NaiveDate;

use crate::format::only_digits;

pub const MSG_REQUIRED: &str = "Este campo é obrigatório";
pub const MSG_POSITIVE: &str = "Digite um valor válido maior que zero";
pub const MSG_CNPJ_LENGTH: &str = "CNPJ deve ter 14 dígitos";
pub const MSG_CNPJ_INVALID: &str = "CNPJ inválido";
pub const MSG_EMAIL_INVALID: &str = "E-mail inválido";
pub const MSG_PHONE_INVALID: &str = "Telefone deve ter 10 ou 11 dígitos";
pub const MSG_FUTURE_DATE: &str = "A data não pode ser futura";
pub const MSG_SALE_BELOW_COST: &str = "O valor de venda deve ser maior que o valor de compra";

// ---- checksums ----

fn all_same(digits: &[u32]) -> bool {
    digits.windows(2).all(|w| w[0] == w[1])
}

fn to_digit_vec(text: &str) -> Vec<u32> {
    only_digits(text)
        .chars()
        .filter_map(|c| c.to_digit(10))
        .collect()
}

fn cpf_digit(digits: &[u32]) -> u32 {
    let top = digits.len() as u32 + 1;
    let sum: u32 = digits
        .iter()
        .enumerate()
        .map(|(i, d)| d * (top - i as u32))
        .sum();
    match (sum * 10) % 11 {
        10 => 0,
        r => r,
    }
}

pub fn is_valid_cpf(text: &str) -> bool {
    let digits = to_digit_vec(text);
    if digits.len() != 11 || all_same(&digits) {
        return false;
    }
    cpf_digit(&digits[..9]) == digits[9] && cpf_digit(&digits[..10]) == digits[10]
}

fn cnpj_digit(digits: &[u32]) -> u32 {
    // Weights run 2..=9 from the rightmost digit, wrapping back to 2.
    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, d)| d * (2 + (i as u32 % 8)))
        .sum();
    match sum % 11 {
        r if r < 2 => 0,
        r => 11 - r,
    }
}

pub fn is_valid_cnpj(text: &str) -> bool {
    let digits = to_digit_vec(text);
    if digits.len() != 14 || all_same(&digits) {
        return false;
    }
    cnpj_digit(&digits[..12]) == digits[12] && cnpj_digit(&digits[..13]) == digits[13]
}

pub fn is_valid_email(text: &str) -> bool {
    if text.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = text.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

// ---- rules ----

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationResult {
    Valid,
    Invalid(String),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            ValidationResult::Valid => None,
            ValidationResult::Invalid(msg) => Some(msg),
        }
    }
}

pub trait ValidationRule<T: ?Sized>: Send + Sync {
    fn validate(&self, value: &T) -> ValidationResult;
    fn description(&self) -> &str;
}

pub struct Required {
    message: String,
}

impl Required {
    pub fn new() -> Self {
        Self {
            message: MSG_REQUIRED.to_string(),
        }
    }

    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Default for Required {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationRule<str> for Required {
    fn validate(&self, value: &str) -> ValidationResult {
        if value.trim().is_empty() {
            ValidationResult::Invalid(self.message.clone())
        } else {
            ValidationResult::Valid
        }
    }

    fn description(&self) -> &str {
        "Required field"
    }
}

/// Numeric value strictly greater than zero.
pub struct Positive;

impl ValidationRule<f64> for Positive {
    fn validate(&self, value: &f64) -> ValidationResult {
        if value.is_finite() && *value > 0.0 {
            ValidationResult::Valid
        } else {
            ValidationResult::Invalid(MSG_POSITIVE.to_string())
        }
    }

    fn description(&self) -> &str {
        "Positive number"
    }
}

/// Empty input passes; pair with [`Required`] when the CNPJ is mandatory.
pub struct ValidCnpj;

impl ValidationRule<str> for ValidCnpj {
    fn validate(&self, value: &str) -> ValidationResult {
        let digits = only_digits(value);
        if digits.is_empty() {
            ValidationResult::Valid
        } else if digits.len() != 14 {
            ValidationResult::Invalid(MSG_CNPJ_LENGTH.to_string())
        } else if !is_valid_cnpj(&digits) {
            ValidationResult::Invalid(MSG_CNPJ_INVALID.to_string())
        } else {
            ValidationResult::Valid
        }
    }

    fn description(&self) -> &str {
        "CNPJ checksum"
    }
}

pub struct ValidEmail;

impl ValidationRule<str> for ValidEmail {
    fn validate(&self, value: &str) -> ValidationResult {
        if value.is_empty() || is_valid_email(value) {
            ValidationResult::Valid
        } else {
            ValidationResult::Invalid(MSG_EMAIL_INVALID.to_string())
        }
    }

    fn description(&self) -> &str {
        "E-mail address"
    }
}

pub struct ValidPhone;

impl ValidationRule<str> for ValidPhone {
    fn validate(&self, value: &str) -> ValidationResult {
        match only_digits(value).len() {
            0 | 10 | 11 => ValidationResult::Valid,
            _ => ValidationResult::Invalid(MSG_PHONE_INVALID.to_string()),
        }
    }

    fn description(&self) -> &str {
        "Phone number"
    }
}

/// Rejects dates after `today`.
pub struct NotFuture {
    pub today: NaiveDate,
}

impl ValidationRule<NaiveDate> for NotFuture {
    fn validate(&self, value: &NaiveDate) -> ValidationResult {
        if *value > self.today {
            ValidationResult::Invalid(MSG_FUTURE_DATE.to_string())
        } else {
            ValidationResult::Valid
        }
    }

    fn description(&self) -> &str {
        "Date not in the future"
    }
}

// ---- collected errors ----

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Errors for one form submission, in the order the fields were checked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    errors: Vec<FieldError>,
}

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Run `rule` on `value` and record the failure, if any, under `field`.
    pub fn check<T, R>(&mut self, field: &str, rule: &R, value: &T) -> bool
    where
        T: ?Sized,
        R: ValidationRule<T> + ?Sized,
    {
        match rule.validate(value) {
            ValidationResult::Valid => true,
            ValidationResult::Invalid(message) => {
                self.push(field, message);
                false
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    pub fn message_for(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn into_result(self) -> Result<(), FormErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", err.field, err.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for FormErrors {}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // ---- checksums ----

    #[test]
    fn known_cpfs() {
        assert!(is_valid_cpf("529.982.247-25"));
        assert!(is_valid_cpf("52998224725"));
        assert!(!is_valid_cpf("529.982.247-24"));
        assert!(!is_valid_cpf("111.111.111-11"));
        assert!(!is_valid_cpf("5299822472"));
    }

    #[test]
    fn known_cnpjs() {
        assert!(is_valid_cnpj("11.222.333/0001-81"));
        assert!(is_valid_cnpj("11444777000161"));
        assert!(!is_valid_cnpj("11.222.333/0001-82"));
        assert!(!is_valid_cnpj("00000000000000"));
        assert!(!is_valid_cnpj("1122233300018"));
    }

    fn digits_string(digits: &[u32]) -> String {
        digits.iter().map(|d| char::from_digit(*d, 10).unwrap()).collect()
    }

    proptest! {
        #[test]
        fn generated_cnpj_passes_and_altered_check_digit_fails(
            base in proptest::collection::vec(0u32..10, 12),
            bump in 1u32..10,
        ) {
            prop_assume!(!all_same(&base));
            let mut digits = base.clone();
            digits.push(cnpj_digit(&digits));
            digits.push(cnpj_digit(&digits));
            prop_assert!(is_valid_cnpj(&digits_string(&digits)));

            digits[13] = (digits[13] + bump) % 10;
            prop_assert!(!is_valid_cnpj(&digits_string(&digits)));
        }

        #[test]
        fn generated_cpf_passes_and_altered_check_digit_fails(
            base in proptest::collection::vec(0u32..10, 9),
            bump in 1u32..10,
        ) {
            prop_assume!(!all_same(&base));
            let mut digits = base.clone();
            digits.push(cpf_digit(&digits));
            digits.push(cpf_digit(&digits));
            prop_assert!(is_valid_cpf(&digits_string(&digits)));

            digits[10] = (digits[10] + bump) % 10;
            prop_assert!(!is_valid_cpf(&digits_string(&digits)));
        }
    }

    #[test]
    fn email_shape() {
        assert!(is_valid_email("contato@padaria.com.br"));
        assert!(!is_valid_email("contato@padaria"));
        assert!(!is_valid_email("conta to@padaria.com"));
        assert!(!is_valid_email("@padaria.com"));
        assert!(!is_valid_email("a@b@c.com"));
    }

    // ---- rules ----

    #[test]
    fn required_trims_whitespace() {
        assert!(!Required::new().validate("   ").is_valid());
        assert_eq!(
            Required::with_message("Informe o nome").validate("").error_message(),
            Some("Informe o nome")
        );
        assert!(Required::default().validate("x").is_valid());
    }

    #[test]
    fn cnpj_rule_distinguishes_length_from_checksum() {
        assert!(ValidCnpj.validate("").is_valid());
        assert_eq!(ValidCnpj.validate("1122").error_message(), Some(MSG_CNPJ_LENGTH));
        assert_eq!(
            ValidCnpj.validate("11.222.333/0001-80").error_message(),
            Some(MSG_CNPJ_INVALID)
        );
        assert!(ValidCnpj.validate("11.222.333/0001-81").is_valid());
    }

    #[test]
    fn positive_rejects_zero_and_nan() {
        assert!(!Positive.validate(&0.0).is_valid());
        assert!(!Positive.validate(&f64::NAN).is_valid());
        assert!(Positive.validate(&0.01).is_valid());
    }

    #[test]
    fn phone_rule_accepts_landline_and_mobile() {
        assert!(ValidPhone.validate("(11) 3333-4444").is_valid());
        assert!(ValidPhone.validate("(11) 98765-4321").is_valid());
        assert!(!ValidPhone.validate("3333-4444").is_valid());
    }

    #[test]
    fn not_future_allows_today() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let rule = NotFuture { today };
        assert!(rule.validate(&today).is_valid());
        assert!(!rule.validate(&today.succ_opt().unwrap()).is_valid());
    }

    // ---- collected errors ----

    #[test]
    fn form_errors_keep_order_and_render() {
        let mut errors = FormErrors::new();
        assert!(!errors.check("nome", &Required::new(), ""));
        assert!(!errors.check("valor", &Positive, &-1.0));
        errors.push("cnpj", MSG_CNPJ_INVALID);

        assert_eq!(errors.len(), 3);
        assert_eq!(errors.message_for("valor"), Some(MSG_POSITIVE));
        assert_eq!(
            errors.to_string(),
            format!("nome: {}; valor: {}; cnpj: {}", MSG_REQUIRED, MSG_POSITIVE, MSG_CNPJ_INVALID)
        );
        assert!(errors.into_result().is_err());
        assert!(FormErrors::new().into_result().is_ok());
    }
}
