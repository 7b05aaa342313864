//! String wrapper for passwords and auth tickets
//!
//! The contents are zeroed on drop and never shown by `Debug` or `Display`.

use std::fmt;
use zeroize::Zeroize;

#[derive(Clone, Default)]
pub struct SecureString {
    inner: String,
}

impl SecureString {
    pub fn new(s: impl Into<String>) -> Self {
        Self { inner: s.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.inner
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.inner.as_bytes()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Copy the secret into a plain `String` that will not be zeroed
    pub fn expose_secret(&self) -> String {
        self.inner.clone()
    }

    /// Compare without short-circuiting on the first differing byte
    pub fn constant_time_eq(&self, other: &Self) -> bool {
        let (a, b) = (self.as_bytes(), other.as_bytes());
        if a.len() != b.len() {
            return false;
        }
        a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
    }
}

impl Drop for SecureString {
    fn drop(&mut self) {
        self.inner.zeroize();
    }
}

impl fmt::Debug for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecureString(***)")
    }
}

impl fmt::Display for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "***")
    }
}

impl PartialEq for SecureString {
    fn eq(&self, other: &Self) -> bool {
        self.constant_time_eq(other)
    }
}

impl Eq for SecureString {}

impl From<String> for SecureString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecureString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_and_display_hide_contents() {
        let secure = SecureString::new("Password123");
        assert_eq!(format!("{secure:?}"), "SecureString(***)");
        assert_eq!(format!("{secure}"), "***");
    }

    #[test]
    fn test_constant_time_comparison() {
        let a = SecureString::new("ticket-abc");
        let b = SecureString::new("ticket-abc");
        let c = SecureString::new("ticket-abd");
        let d = SecureString::new("ticket");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn test_empty_and_expose() {
        assert!(SecureString::default().is_empty());
        let secure = SecureString::from("sensitive");
        assert_eq!(secure.expose_secret(), "sensitive");
    }
}
