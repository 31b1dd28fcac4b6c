//! File name validation.
//!
//! Storage locations are flat directories: every file lives directly under
//! the location root. This module makes sure a name can never address
//! anything else.

use crate::error::{ErrorKind, Result};

/// Validates a file name for use in a flat storage location.
///
/// > **Note:** Names are not normalized. Surrounding whitespace, case and
/// >           Unicode forms are kept exactly as given since the naming
/// >           convention is part of the on-disk contract.
///
/// # Returns
/// Returns the name unchanged if valid, or
/// [`InvalidName`](crate::error::ErrorKind::InvalidName) if invalid.
///
/// # Examples
///
/// ```
/// use shutter_storage::validate_name;
/// // Valid names
/// assert!(validate_name("IMG_20240101_120000.jpg").is_ok());
/// assert!(validate_name("IMG_20240101_120000 (1).jpg").is_ok());
/// assert!(validate_name("thumb-VID_20240101_120000.jpg").is_ok());
/// // Invalid names
/// assert!(validate_name("../IMG_20240101_120000.jpg").is_err());
/// assert!(validate_name("sub/IMG.jpg").is_err());
/// assert!(validate_name("a\0b").is_err());
/// assert!(validate_name("").is_err());
/// ```
pub fn validate(name: &str) -> Result<&str> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if invalid {
        exn::bail!(ErrorKind::InvalidName(name.to_string()));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("IMG_20240101_120000.jpg")]
    #[case("VID_20240101_120000.mkv")]
    #[case("IMG_20240101_120000 (12).jpg")]
    #[case("thumb-IMG_20240101_120000.jpg")]
    #[case("1439889263451.0.jpg")]
    #[case(".hidden")]
    fn test_valid_names(#[case] name: &str) {
        assert_eq!(validate(name).unwrap(), name);
    }

    #[rstest]
    #[case("")]
    #[case(".")]
    #[case("..")]
    #[case("../escape.jpg")]
    #[case("dir/file.jpg")]
    #[case("dir\\file.jpg")]
    #[case("/absolute.jpg")]
    #[case("a\0b")]
    fn test_invalid_names(#[case] name: &str) {
        let err = validate(name).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidName(_)));
    }
}
