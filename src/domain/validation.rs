use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Empty { field: &'static str },
    InvalidPhoneNumber { input: String },
    InvalidActivationCode { input: String },
    InvalidDate { field: &'static str, input: String },
    InvalidEmail { input: String },
    InvalidUrl { field: &'static str, input: String },
    InvalidFacebookId { input: String },
    InvalidCoordinates { input: String },
    UnsupportedSocialLink { network: &'static str },
    NothingToUpdate { what: &'static str },
    MissingTokens,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { field } => write!(f, "{field} must not be empty"),
            Self::InvalidPhoneNumber { input } => write!(f, "invalid phone number: {input}"),
            Self::InvalidActivationCode { input } => {
                write!(f, "invalid activation code (expected 6 digits): {input}")
            }
            Self::InvalidDate { field, input } => {
                write!(f, "{field} must be in YYYY-MM-DD format: {input}")
            }
            Self::InvalidEmail { input } => write!(f, "invalid email address: {input}"),
            Self::InvalidUrl { field, input } => write!(f, "invalid {field} url: {input}"),
            Self::InvalidFacebookId { input } => {
                write!(f, "facebook id must contain only digits: {input}")
            }
            Self::InvalidCoordinates { input } => write!(f, "invalid coordinates: {input}"),
            Self::UnsupportedSocialLink { network } => {
                write!(f, "{network} does not support this kind of link")
            }
            Self::NothingToUpdate { what } => write!(f, "at least one {what} must be provided"),
            Self::MissingTokens => {
                write!(f, "credential must carry an access token or a refresh token")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

#[cfg(test)]
mod tests {
    use super::ValidationError;

    #[test]
    fn display_messages_are_human_readable() {
        let err = ValidationError::Empty { field: "name" };
        assert_eq!(err.to_string(), "name must not be empty");

        let err = ValidationError::InvalidPhoneNumber {
            input: "bad".to_owned(),
        };
        assert_eq!(err.to_string(), "invalid phone number: bad");

        let err = ValidationError::InvalidDate {
            field: "date_of_birth",
            input: "1990/01/01".to_owned(),
        };
        assert_eq!(
            err.to_string(),
            "date_of_birth must be in YYYY-MM-DD format: 1990/01/01"
        );

        let err = ValidationError::NothingToUpdate { what: "setting" };
        assert_eq!(err.to_string(), "at least one setting must be provided");
    }
}
