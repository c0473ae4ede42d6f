//! Masks for CNPJ, CPF, phone numbers and CEP.
//!
//! All masks are progressive: they format however many digits are present,
//! so they work on partially typed input as well as complete values.

pub const CNPJ_DIGITS: usize = 14;
pub const CPF_DIGITS: usize = 11;
pub const CEP_DIGITS: usize = 8;

pub fn only_digits(text: &str) -> String {
    text.chars().filter(char::is_ascii_digit).collect()
}

/// Apply a pattern where `9` consumes one digit and every other character is
/// copied literally while digits remain. Non-digits in `value` are dropped.
pub fn apply_mask(value: &str, pattern: &str) -> String {
    let mut digits = only_digits(value).into_bytes().into_iter().peekable();
    let mut out = String::with_capacity(pattern.len());

    for slot in pattern.chars() {
        if digits.peek().is_none() {
            break;
        }
        if slot == '9' {
            if let Some(d) = digits.next() {
                out.push(d as char);
            }
        } else {
            out.push(slot);
        }
    }
    out
}

/// `XX.XXX.XXX/XXXX-XX`, truncated to 14 digits.
pub fn mask_cnpj(text: &str) -> String {
    apply_mask(text, "99.999.999/9999-99")
}

/// `XXX.XXX.XXX-XX`, truncated to 11 digits.
pub fn mask_cpf(text: &str) -> String {
    apply_mask(text, "999.999.999-99")
}

/// Format a complete phone number. Ten digits are a landline, eleven a mobile;
/// anything else comes back as bare digits.
pub fn format_phone(text: &str) -> String {
    let digits = only_digits(text);
    match digits.len() {
        10 => apply_mask(&digits, "(99) 9999-9999"),
        11 => apply_mask(&digits, "(99) 99999-9999"),
        _ => digits,
    }
}

/// Progressive phone mask for input as it is typed.
pub fn mask_phone_input(text: &str) -> String {
    let digits: String = only_digits(text).chars().take(11).collect();
    match digits.len() {
        0 => String::new(),
        1..=2 => format!("({}", digits),
        3..=6 => format!("({}) {}", &digits[..2], &digits[2..]),
        7..=10 => format!("({}) {}-{}", &digits[..2], &digits[2..6], &digits[6..]),
        _ => format!("({}) {}-{}", &digits[..2], &digits[2..7], &digits[7..]),
    }
}

/// `XXXXX-XXX` for eight digits, bare digits otherwise.
pub fn format_cep(text: &str) -> String {
    let digits = only_digits(text);
    if digits.len() == CEP_DIGITS {
        apply_mask(&digits, "99999-999")
    } else {
        digits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_copies_literals_only_while_digits_remain() {
        assert_eq!(apply_mask("1234", "99-99"), "12-34");
        assert_eq!(apply_mask("12", "99-99"), "12");
        assert_eq!(apply_mask("123", "99-99"), "12-3");
        assert_eq!(apply_mask("", "99-99"), "");
    }

    #[test]
    fn cnpj_mask_is_progressive_and_truncates() {
        assert_eq!(mask_cnpj("11222333000181"), "11.222.333/0001-81");
        assert_eq!(mask_cnpj("11.222.333/0001-81"), "11.222.333/0001-81");
        assert_eq!(mask_cnpj("112223"), "11.222.3");
        assert_eq!(mask_cnpj("1122233300018199"), "11.222.333/0001-81");
    }

    #[test]
    fn cpf_mask() {
        assert_eq!(mask_cpf("52998224725"), "529.982.247-25");
        assert_eq!(mask_cpf("5299"), "529.9");
    }

    #[test]
    fn phone_format_by_length() {
        assert_eq!(format_phone("1133334444"), "(11) 3333-4444");
        assert_eq!(format_phone("11 98765-4321"), "(11) 98765-4321");
        assert_eq!(format_phone("12345"), "12345");
    }

    #[test]
    fn phone_input_mask_grows_with_input() {
        assert_eq!(mask_phone_input("1"), "(1");
        assert_eq!(mask_phone_input("1198"), "(11) 98");
        assert_eq!(mask_phone_input("1133334444"), "(11) 3333-4444");
        assert_eq!(mask_phone_input("119876543210"), "(11) 98765-4321");
    }

    #[test]
    fn cep_format() {
        assert_eq!(format_cep("01310100"), "01310-100");
        assert_eq!(format_cep("0131"), "0131");
    }
}
