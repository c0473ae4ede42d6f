//! pt-BR formatting helpers and input masks shared by every page.

pub mod currency;
pub mod date;
pub mod document;
pub mod text;

pub use currency::{format_brl, format_brl_plain, format_number, parse_brl};
pub use date::{format_date, parse_date, DateStyle};
pub use document::{format_cep, format_phone, mask_cnpj, mask_cpf, only_digits};
