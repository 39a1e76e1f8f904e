//! # Name Validation
//!
//! Bucket names are DNS labels: 3–63 chars of lowercase alphanumerics,
//! `-` and `.`, starting and ending alphanumeric. Object names only need
//! to be non-empty, printable and bounded.

use super::errors::StorageError;

const MAX_OBJECT_NAME_LEN: usize = 1024;
const MAX_GROUP_NAME_LEN: usize = 63;

/// Validate a bucket name.
pub fn validate_bucket_name(name: &str) -> Result<(), StorageError> {
    let bytes = name.as_bytes();
    let ok_len = (3..=63).contains(&bytes.len());
    let ok_chars = bytes
        .iter()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-' || *b == b'.');
    let ok_edges = bytes.first().map(|b| b.is_ascii_alphanumeric()).unwrap_or(false)
        && bytes.last().map(|b| b.is_ascii_alphanumeric()).unwrap_or(false);
    if ok_len && ok_chars && ok_edges {
        Ok(())
    } else {
        Err(StorageError::InvalidBucketName { name: name.to_string() })
    }
}

/// Validate an object name.
pub fn validate_object_name(name: &str) -> Result<(), StorageError> {
    if name.is_empty()
        || name.len() > MAX_OBJECT_NAME_LEN
        || name.chars().any(|c| c.is_control())
    {
        return Err(StorageError::InvalidObjectName);
    }
    Ok(())
}

/// Validate a group name.
pub fn validate_group_name(name: &str) -> Result<(), StorageError> {
    if name.is_empty() || name.len() > MAX_GROUP_NAME_LEN {
        return Err(StorageError::InvalidGroupName);
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_names() {
        assert!(validate_bucket_name("my-bucket.01").is_ok());
        assert!(validate_bucket_name("abc").is_ok());
        assert!(validate_bucket_name("ab").is_err()); // too short
        assert!(validate_bucket_name("-abc").is_err()); // bad edge
        assert!(validate_bucket_name("abc-").is_err());
        assert!(validate_bucket_name("ABC").is_err()); // uppercase
        assert!(validate_bucket_name(&"a".repeat(64)).is_err());
    }

    #[test]
    fn test_object_names() {
        assert!(validate_object_name("path/to/file.bin").is_ok());
        assert!(validate_object_name("").is_err());
        assert!(validate_object_name("a\u{0}b").is_err());
        assert!(validate_object_name(&"x".repeat(1025)).is_err());
    }
}
