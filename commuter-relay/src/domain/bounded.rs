//! Size-bounded display strings.

use std::fmt;
use std::ops::Deref;

use serde::Serialize;

/// A string holding at most `N` characters.
///
/// The device reserves fixed-size buffers for every text field, so longer
/// input is truncated on construction. Truncation never fails: a value that
/// is too long simply loses its tail.
///
/// # Examples
///
/// ```
/// use commuter_relay::domain::Bounded;
///
/// let platform = Bounded::<3>::new("12AB");
/// assert_eq!(platform.as_str(), "12A");
///
/// let short = Bounded::<3>::new("7");
/// assert_eq!(short.as_str(), "7");
/// ```
#[derive(Clone, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct Bounded<const N: usize>(String);

impl<const N: usize> Bounded<N> {
    /// Build a bounded string, keeping the first `N` characters of `s`.
    pub fn new(s: &str) -> Self {
        match s.char_indices().nth(N) {
            Some((cut, _)) => Self(s[..cut].to_string()),
            None => Self(s.to_string()),
        }
    }

    /// Returns the contents as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper, returning the inner string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl<const N: usize> From<&str> for Bounded<N> {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl<const N: usize> From<String> for Bounded<N> {
    fn from(s: String) -> Self {
        if s.chars().count() <= N {
            Self(s)
        } else {
            Self::new(&s)
        }
    }
}

impl<const N: usize> Deref for Bounded<N> {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl<const N: usize> PartialEq<&str> for Bounded<N> {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl<const N: usize> fmt::Debug for Bounded<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bounded<{N}>({:?})", self.0)
    }
}

impl<const N: usize> fmt::Display for Bounded<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
