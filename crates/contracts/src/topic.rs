//! TopicName - Cheap-to-clone, case-normalized topic identifier
//!
//! Uses Arc<str> internally for O(1) clone operations.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

/// Changefeed topic (or table) name, always lower case.
///
/// The changefeed does not guarantee stable casing across files, so every
/// constructor folds to lower case. Lookups keyed by `TopicName` can be made
/// with any `&str` that is already lower case.
///
/// # Examples
/// ```
/// use contracts::TopicName;
///
/// let topic: TopicName = "Orders".into();
/// let again = topic.clone();  // O(1) - just increments ref count
/// assert_eq!(topic, again);
/// assert_eq!(topic.as_str(), "orders");
/// ```
#[derive(Clone, Default)]
pub struct TopicName(Arc<str>);

impl TopicName {
    /// Create a new TopicName, folding to lower case.
    #[inline]
    pub fn new(s: &str) -> Self {
        Self(Arc::from(s.to_lowercase()))
    }

    /// Get the underlying string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for TopicName {
    type Target = str;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for TopicName {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for TopicName {
    #[inline]
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TopicName {
    #[inline]
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for TopicName {
    #[inline]
    fn from(s: String) -> Self {
        Self::new(&s)
    }
}

impl fmt::Display for TopicName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for TopicName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TopicName({:?})", self.0)
    }
}

impl PartialEq for TopicName {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl Eq for TopicName {}

impl PartialEq<str> for TopicName {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        self.0.as_ref() == other
    }
}

impl PartialEq<&str> for TopicName {
    #[inline]
    fn eq(&self, other: &&str) -> bool {
        self.0.as_ref() == *other
    }
}

// Must agree with str's hash for Borrow<str> lookups
impl Hash for TopicName {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state)
    }
}

impl Serialize for TopicName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for TopicName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_folds_to_lower_case() {
        let topic = TopicName::new("_Test_Table_4064");
        assert_eq!(topic, "_test_table_4064");
        assert_eq!(topic, TopicName::from(String::from("_TEST_TABLE_4064")));
    }

    #[test]
    fn test_clone_is_cheap() {
        let a: TopicName = "orders".into();
        let b = a.clone();
        assert_eq!(a.as_str().as_ptr(), b.as_str().as_ptr());
    }

    #[test]
    fn test_hashmap_key() {
        let mut map: HashMap<TopicName, i32> = HashMap::new();
        map.insert("Orders".into(), 1);
        assert_eq!(map.get("orders"), Some(&1));
        assert_eq!(map.get("Orders"), None);
    }

    #[test]
    fn test_serde() {
        let parsed: TopicName = serde_json::from_str("\"Customers\"").unwrap();
        assert_eq!(parsed, "customers");
        assert_eq!(serde_json::to_string(&parsed).unwrap(), "\"customers\"");
    }
}
