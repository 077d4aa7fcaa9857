//! Profile field types shared by user accounts and stores.
//!
//! Every rule here is applied by the server before any storage call, and the
//! same limits are mirrored as `CHECK` constraints in the schema.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::email::{Email, EmailError};
use super::role::Role;

/// Characters that satisfy the password "special character" rule.
pub const PASSWORD_SPECIAL_CHARS: &str = "!@#$%^&*()";

/// Errors produced when user-supplied input breaks a field rule.
///
/// The `Display` output is shown to API clients verbatim.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Name outside the allowed length.
    #[error("name must be between {min} and {max} characters (got {actual})")]
    NameLength {
        /// Minimum length.
        min: usize,
        /// Maximum length.
        max: usize,
        /// Length that was supplied.
        actual: usize,
    },

    /// Address outside the allowed length.
    #[error("address must be between {min} and {max} characters (got {actual})")]
    AddressLength {
        /// Minimum length.
        min: usize,
        /// Maximum length.
        max: usize,
        /// Length that was supplied.
        actual: usize,
    },

    /// Password outside the allowed length.
    #[error("password must be between {min} and {max} characters")]
    PasswordLength {
        /// Minimum length.
        min: usize,
        /// Maximum length.
        max: usize,
    },

    /// Password without an uppercase letter.
    #[error("password must contain at least one uppercase letter")]
    PasswordMissingUppercase,

    /// Password without a special character.
    #[error("password must contain at least one special character from {}", PASSWORD_SPECIAL_CHARS)]
    PasswordMissingSpecial,

    /// Malformed email address.
    #[error("invalid email: {0}")]
    Email(#[from] EmailError),

    /// Rating outside 1-5.
    #[error("rating must be an integer between {min} and {max} (got {actual})")]
    RatingOutOfRange {
        /// Lowest allowed rating.
        min: i16,
        /// Highest allowed rating.
        max: i16,
        /// Value that was supplied.
        actual: i64,
    },

    /// Role that cannot be assigned through the requested path.
    #[error("role {0} cannot be assigned here")]
    RoleNotAssignable(Role),
}

/// Display name of a user or store.
///
/// Surrounding whitespace is trimmed; the remainder must be 20-60 characters.
///
/// ```
/// use store_ratings_core::DisplayName;
///
/// assert!(DisplayName::parse("Corner Bakery and Coffee House").is_ok());
/// assert!(DisplayName::parse("Too short").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DisplayName(String);

impl DisplayName {
    /// Minimum length in characters.
    pub const MIN_LENGTH: usize = 20;
    /// Maximum length in characters.
    pub const MAX_LENGTH: usize = 60;

    /// Parse a display name.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::NameLength` if the trimmed input is not
    /// 20-60 characters long.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let trimmed = s.trim();
        let actual = trimmed.chars().count();
        if !(Self::MIN_LENGTH..=Self::MAX_LENGTH).contains(&actual) {
            return Err(ValidationError::NameLength {
                min: Self::MIN_LENGTH,
                max: Self::MAX_LENGTH,
                actual,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Postal address of a user or store (1-400 characters after trimming).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostalAddress(String);

impl PostalAddress {
    /// Minimum length in characters.
    pub const MIN_LENGTH: usize = 1;
    /// Maximum length in characters.
    pub const MAX_LENGTH: usize = 400;

    /// Parse an address.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::AddressLength` if the trimmed input is empty
    /// or longer than 400 characters.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let trimmed = s.trim();
        let actual = trimmed.chars().count();
        if !(Self::MIN_LENGTH..=Self::MAX_LENGTH).contains(&actual) {
            return Err(ValidationError::AddressLength {
                min: Self::MIN_LENGTH,
                max: Self::MAX_LENGTH,
                actual,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PostalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validated name, email and address shared by accounts and stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    /// Display name.
    pub name: DisplayName,
    /// Contact email, unique per table.
    pub email: Email,
    /// Postal address.
    pub address: PostalAddress,
}

impl Profile {
    /// Validate raw name, email and address input.
    ///
    /// # Errors
    ///
    /// Returns the first field rule that is broken, checked in the order
    /// name, email, address.
    pub fn parse(name: &str, email: &str, address: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            name: DisplayName::parse(name)?,
            email: Email::parse(email.trim())?,
            address: PostalAddress::parse(address)?,
        })
    }
}

/// Minimum password length in characters.
pub const MIN_PASSWORD_LENGTH: usize = 8;
/// Maximum password length in characters.
pub const MAX_PASSWORD_LENGTH: usize = 16;

/// Check a raw password against the account password policy.
///
/// Passwords are never stored, so there is no owning newtype: callers check
/// and then hash.
///
/// # Errors
///
/// Returns the first rule the password breaks: length (8-16), missing
/// uppercase letter, or missing special character from `!@#$%^&*()`.
pub fn check_password_policy(password: &str) -> Result<(), ValidationError> {
    let length = password.chars().count();
    if !(MIN_PASSWORD_LENGTH..=MAX_PASSWORD_LENGTH).contains(&length) {
        return Err(ValidationError::PasswordLength {
            min: MIN_PASSWORD_LENGTH,
            max: MAX_PASSWORD_LENGTH,
        });
    }

    if !password.chars().any(char::is_uppercase) {
        return Err(ValidationError::PasswordMissingUppercase);
    }

    if !password.chars().any(|c| PASSWORD_SPECIAL_CHARS.contains(c)) {
        return Err(ValidationError::PasswordMissingSpecial);
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_name_boundaries() {
        assert!(matches!(
            DisplayName::parse(&"a".repeat(19)),
            Err(ValidationError::NameLength { actual: 19, .. })
        ));
        assert!(DisplayName::parse(&"a".repeat(20)).is_ok());
        assert!(DisplayName::parse(&"a".repeat(60)).is_ok());
        assert!(matches!(
            DisplayName::parse(&"a".repeat(61)),
            Err(ValidationError::NameLength { actual: 61, .. })
        ));
    }

    #[test]
    fn test_name_is_trimmed_before_counting() {
        let padded = format!("   {}   ", "b".repeat(19));
        assert!(DisplayName::parse(&padded).is_err());

        let name = DisplayName::parse(&format!("  {}  ", "b".repeat(20))).unwrap();
        assert_eq!(name.as_str(), "b".repeat(20));
    }

    #[test]
    fn test_name_counts_characters_not_bytes() {
        // 20 two-byte characters
        assert!(DisplayName::parse(&"é".repeat(20)).is_ok());
    }

    #[test]
    fn test_name_error_message_cites_length() {
        let err = DisplayName::parse("Nineteen characters").unwrap_err();
        assert_eq!(
            err.to_string(),
            "name must be between 20 and 60 characters (got 19)"
        );
    }

    #[test]
    fn test_address_boundaries() {
        assert!(PostalAddress::parse("").is_err());
        assert!(PostalAddress::parse("   ").is_err());
        assert!(PostalAddress::parse("1").is_ok());
        assert!(PostalAddress::parse(&"x".repeat(400)).is_ok());
        assert!(matches!(
            PostalAddress::parse(&"x".repeat(401)),
            Err(ValidationError::AddressLength { actual: 401, .. })
        ));
    }

    #[test]
    fn test_profile_reports_first_broken_rule() {
        let err = Profile::parse("short", "not-an-email", "").unwrap_err();
        assert!(matches!(err, ValidationError::NameLength { .. }));

        let err = Profile::parse(&"n".repeat(25), "not-an-email", "").unwrap_err();
        assert!(matches!(err, ValidationError::Email(_)));

        let err = Profile::parse(&"n".repeat(25), "a@b.io", "").unwrap_err();
        assert!(matches!(err, ValidationError::AddressLength { .. }));
    }

    #[test]
    fn test_profile_trims_email() {
        let profile = Profile::parse(&"n".repeat(25), "  a@b.io ", "1 Main St").unwrap();
        assert_eq!(profile.email.as_str(), "a@b.io");
    }

    #[test]
    fn test_password_policy() {
        assert_eq!(
            check_password_policy("short1!"),
            Err(ValidationError::PasswordLength { min: 8, max: 16 })
        );
        assert_eq!(
            check_password_policy("alllowercase1!"),
            Err(ValidationError::PasswordMissingUppercase)
        );
        assert_eq!(
            check_password_policy("NoSpecials123"),
            Err(ValidationError::PasswordMissingSpecial)
        );
        assert!(check_password_policy("Valid@123").is_ok());
    }

    #[test]
    fn test_password_upper_bound() {
        assert!(check_password_policy("Abcdefghijklmn!p").is_ok());
        assert!(check_password_policy("Abcdefghijklmno!q").is_err());
    }

    #[test]
    fn test_every_listed_special_char_counts() {
        for c in PASSWORD_SPECIAL_CHARS.chars() {
            let password = format!("Password{c}");
            assert!(check_password_policy(&password).is_ok(), "{password}");
        }
        assert!(check_password_policy("Password-").is_err());
    }
}
