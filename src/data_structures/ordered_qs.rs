//! Ordered query strings

use crate::utils::{Also, Apply};

use smallvec::SmallVec;

/// Immutable, multi-valued query string container
///
/// Pairs are url-decoded and sorted by name. Repeated names keep their
/// original relative order.
#[derive(Debug, Default)]
pub struct OrderedQs {
    /// query strings, ascending by name
    qs: SmallVec<[(String, String); 16]>,
}

impl OrderedQs {
    /// Constructs `OrderedQs` from url-decoded pairs
    #[must_use]
    pub fn from_vec(v: Vec<(String, String)>) -> Self {
        v.also(|v| v.sort_by(|lhs, rhs| lhs.0.cmp(&rhs.0)))
            .apply(|qs| Self { qs: qs.into() })
    }

    /// Parses `OrderedQs` from a raw query
    ///
    /// # Errors
    /// Returns an error if the query is not valid `application/x-www-form-urlencoded`
    pub fn from_query(query: &str) -> Result<Self, serde_urlencoded::de::Error> {
        serde_urlencoded::from_str::<Vec<(String, String)>>(query)?
            .apply(Self::from_vec)
            .apply(Ok)
    }

    /// all pairs named `name`
    fn range(&self, name: &str) -> &[(String, String)] {
        let qs = self.qs.as_slice();
        let start = qs.partition_point(|(n, _)| n.as_str() < name);
        let len = qs
            .get(start..)
            .map_or(0, |tail| tail.partition_point(|(n, _)| n == name));
        qs.get(start..start.saturating_add(len)).unwrap_or_default()
    }

    /// Gets the first value of `name`. Time `O(logn)`
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.range(name).first().map(|(_, v)| v.as_str())
    }

    /// Gets every value of `name` in arrival order
    pub fn get_all<'s>(&'s self, name: &str) -> impl Iterator<Item = &'s str> + 's {
        self.range(name).iter().map(|(_, v)| v.as_str())
    }

    /// Returns true if `name` is present at least once
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        !self.range(name).is_empty()
    }

    /// Returns true if there are no query strings
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.qs.is_empty()
    }
}

impl AsRef<[(String, String)]> for OrderedQs {
    fn as_ref(&self) -> &[(String, String)] {
        self.qs.as_ref()
    }
}
