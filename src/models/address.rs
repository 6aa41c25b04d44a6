use std::fmt::Display;

use serde::Serialize;

use super::ValidationError;

/// Street address of a bar. One per bar.
#[derive(Clone, Debug, Serialize)]
pub struct Address {
    pub id: Option<i64>,
    pub address_line_1: String,
    pub address_line_2: Option<String>,
    pub zip_code: u16,
    pub city: String,
}

impl Address {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_zip_code(self.zip_code)
    }

    pub fn full_address(&self) -> String {
        match &self.address_line_2 {
            Some(line_2) => format!("{}\n{}", self.address_line_1, line_2),
            None => self.address_line_1.clone(),
        }
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}\n{} {}", self.full_address(), self.zip_code, self.city)
    }
}

/// Belgian zip codes are four digits, 1000 through 9999.
pub fn validate_zip_code(zip_code: u16) -> Result<(), ValidationError> {
    if !(1000..10000).contains(&zip_code) {
        return Err(ValidationError::InvalidZipCode);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> Address {
        Address {
            id: None,
            address_line_1: "Rue du Marché au Charbon 17".to_string(),
            address_line_2: None,
            zip_code: 1000,
            city: "Bruxelles".to_string(),
        }
    }

    #[test]
    fn zip_codes_are_four_digits() {
        assert_eq!(validate_zip_code(1000), Ok(()));
        assert_eq!(validate_zip_code(9999), Ok(()));
        assert_eq!(validate_zip_code(999), Err(ValidationError::InvalidZipCode));
        assert_eq!(
            validate_zip_code(10000),
            Err(ValidationError::InvalidZipCode)
        );
    }

    #[test]
    fn full_address_only_includes_the_second_line_when_set() {
        let mut address = address();
        assert_eq!(address.full_address(), "Rue du Marché au Charbon 17");

        address.address_line_2 = Some("Boîte 3".to_string());
        assert_eq!(
            address.full_address(),
            "Rue du Marché au Charbon 17\nBoîte 3"
        );
    }

    #[test]
    fn displays_as_a_postal_block() {
        assert_eq!(
            address().to_string(),
            "Rue du Marché au Charbon 17\n1000 Bruxelles"
        );
    }
}
