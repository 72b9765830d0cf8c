// Client-side field checks run before anything goes over the wire

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("{field} must be between {min} and {max} (got {value})")]
    OutOfRange {
        field: &'static str,
        min: u32,
        max: u32,
        value: u32,
    },

    #[error("{0} is not a valid email address")]
    InvalidEmail(String),

    #[error("{field} is too long ({len} > {max} characters)")]
    TooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("Invalid pricing tier: {0}")]
    InvalidTier(String),

    #[error("Invalid tour: {0}")]
    InvalidTour(String),
}

pub fn required(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::MissingField(field))
    } else {
        Ok(())
    }
}

pub fn in_range(field: &'static str, value: u32, min: u32, max: u32) -> Result<(), ValidationError> {
    if value < min || value > max {
        Err(ValidationError::OutOfRange {
            field,
            min,
            max,
            value,
        })
    } else {
        Ok(())
    }
}

pub fn max_len(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len > max {
        Err(ValidationError::TooLong { field, len, max })
    } else {
        Ok(())
    }
}

// Same shape the booking form accepts: something@domain.tld, no spaces
pub fn email(value: &str) -> Result<(), ValidationError> {
    required("email", value)?;
    let value = value.trim();
    let valid = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.contains(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail(value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("amina@example.com", true)]
    #[test_case(" youssef@riad.ma ", true ; "surrounding whitespace")]
    #[test_case("no-at-sign.com", false)]
    #[test_case("@example.com", false ; "empty local part")]
    #[test_case("a@b", false ; "no tld")]
    #[test_case("a@@b.com", false ; "double at")]
    #[test_case("a b@c.com", false ; "inner space")]
    #[test_case("", false ; "empty")]
    fn test_email(value: &str, ok: bool) {
        assert_eq!(email(value).is_ok(), ok);
    }

    #[test]
    fn test_range_and_required() {
        assert!(in_range("participants", 1, 1, 12).is_ok());
        assert_eq!(
            in_range("participants", 13, 1, 12),
            Err(ValidationError::OutOfRange {
                field: "participants",
                min: 1,
                max: 12,
                value: 13
            })
        );
        assert_eq!(
            required("customer_name", "   "),
            Err(ValidationError::MissingField("customer_name"))
        );
        assert!(max_len("review_text", "ok", 1000).is_ok());
    }
}
