use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::value::ScopeValue;

/// An instance as seen by the authorization core: property name to value.
///
/// A property that is absent from the map is treated as `null`.
pub type Record = BTreeMap<String, ScopeValue>;

/// Well-known property names shared by the filter builder and the stores.
pub mod properties {
    /// Resource identity property. Maps to the primary key.
    pub const ID: &str = "id";

    /// Membership subject property on the group access collection.
    pub const USER_ID: &str = "userId";

    /// Membership role property on the group access collection.
    pub const ROLE: &str = "role";
}

/// A single property predicate.
///
/// - [`ScopeFilter::Eq`]: equality (`property = value`)
/// - [`ScopeFilter::In`]: set membership (`property IN (values)`)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeFilter {
    /// Equality: `property = value`.
    Eq(EqScopeFilter),
    /// Set membership: `property IN (values)`.
    In(InScopeFilter),
}

/// Equality scope filter: `property = value`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EqScopeFilter {
    property: String,
    value: ScopeValue,
}

/// Set membership scope filter: `property IN (values)`.
///
/// An empty value set matches nothing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InScopeFilter {
    property: String,
    values: Vec<ScopeValue>,
}

impl EqScopeFilter {
    /// Create an equality scope filter.
    #[must_use]
    pub fn new(property: impl Into<String>, value: impl Into<ScopeValue>) -> Self {
        Self {
            property: property.into(),
            value: value.into(),
        }
    }

    /// The property name.
    #[inline]
    #[must_use]
    pub fn property(&self) -> &str {
        &self.property
    }

    /// The filter value.
    #[inline]
    #[must_use]
    pub fn value(&self) -> &ScopeValue {
        &self.value
    }
}

impl InScopeFilter {
    /// Create from an iterator of convertible values.
    #[must_use]
    pub fn from_values<V: Into<ScopeValue>>(
        property: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self {
            property: property.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// The property name.
    #[inline]
    #[must_use]
    pub fn property(&self) -> &str {
        &self.property
    }

    /// The filter values.
    #[inline]
    #[must_use]
    pub fn values(&self) -> &[ScopeValue] {
        &self.values
    }
}

impl ScopeFilter {
    /// The property name.
    #[must_use]
    pub fn property(&self) -> &str {
        match self {
            Self::Eq(f) => f.property(),
            Self::In(f) => f.property(),
        }
    }

    /// Collect all values as a slice-like view for iteration.
    ///
    /// For `Eq`, returns a single-element view; for `In`, the values slice.
    #[must_use]
    pub fn values(&self) -> ScopeFilterValues<'_> {
        match self {
            Self::Eq(f) => ScopeFilterValues::Single(&f.value),
            Self::In(f) => ScopeFilterValues::Multiple(&f.values),
        }
    }

    /// Evaluate the predicate against a record. A missing property never matches.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        record
            .get(self.property())
            .is_some_and(|v| self.values().contains(v))
    }
}

/// Uniform view over the values of a [`ScopeFilter`].
#[derive(Clone, Debug)]
pub enum ScopeFilterValues<'a> {
    /// Single value from an `Eq` filter.
    Single(&'a ScopeValue),
    /// Multiple values from an `In` filter.
    Multiple(&'a [ScopeValue]),
}

impl<'a> ScopeFilterValues<'a> {
    /// Returns an iterator over the values.
    #[must_use]
    pub fn iter(&self) -> ScopeFilterValuesIter<'a> {
        match self {
            Self::Single(v) => ScopeFilterValuesIter::Single(Some(v)),
            Self::Multiple(vs) => ScopeFilterValuesIter::Multiple(vs.iter()),
        }
    }

    /// Returns `true` if any value equals `value`.
    #[must_use]
    pub fn contains(&self, value: &ScopeValue) -> bool {
        self.iter().any(|v| v == value)
    }
}

impl<'a> IntoIterator for ScopeFilterValues<'a> {
    type Item = &'a ScopeValue;
    type IntoIter = ScopeFilterValuesIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over [`ScopeFilterValues`].
pub enum ScopeFilterValuesIter<'a> {
    /// Yields a single value.
    Single(Option<&'a ScopeValue>),
    /// Yields from a slice.
    Multiple(std::slice::Iter<'a, ScopeValue>),
}

impl<'a> Iterator for ScopeFilterValuesIter<'a> {
    type Item = &'a ScopeValue;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Self::Single(v) => v.take(),
            Self::Multiple(iter) => iter.next(),
        }
    }
}

/// A "where" predicate tree.
///
/// The authorization core composes caller-supplied filters with its own
/// group predicate via [`Filter::and`]; it never rewrites or drops the
/// caller's predicates.
///
/// # Examples
///
/// ```
/// use access_security::{Filter, Record, ScopeValue};
///
/// let caller = Filter::eq("invoiceNumber", 1_i64);
/// let scoped = caller.and(Filter::r#in("storeId", ["A"]));
///
/// let mut row = Record::new();
/// row.insert("invoiceNumber".to_owned(), ScopeValue::Int(1));
/// row.insert("storeId".to_owned(), ScopeValue::from("A"));
/// assert!(scoped.matches(&row));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Filter {
    /// A single property predicate.
    Match(ScopeFilter),
    /// Conjunction. An empty conjunction matches everything.
    And(Vec<Filter>),
    /// Disjunction. An empty disjunction matches nothing.
    Or(Vec<Filter>),
}

impl Filter {
    /// `property = value`.
    #[must_use]
    pub fn eq(property: impl Into<String>, value: impl Into<ScopeValue>) -> Self {
        Self::Match(ScopeFilter::Eq(EqScopeFilter::new(property, value)))
    }

    /// `property IN (values)`.
    #[must_use]
    pub fn r#in<V: Into<ScopeValue>>(
        property: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self::Match(ScopeFilter::In(InScopeFilter::from_values(property, values)))
    }

    /// Conjunction of `filters`.
    #[must_use]
    pub fn all(filters: impl IntoIterator<Item = Filter>) -> Self {
        Self::And(filters.into_iter().collect())
    }

    /// AND-compose `self` with `other`.
    ///
    /// Nested conjunctions are flattened; an identical clause already present
    /// in the conjunction is not added twice.
    #[must_use]
    pub fn and(self, other: Filter) -> Self {
        let mut clauses = match self {
            Self::And(clauses) => clauses,
            single => vec![single],
        };
        let extra = match other {
            Self::And(more) => more,
            single => vec![single],
        };
        for clause in extra {
            if !clauses.contains(&clause) {
                clauses.push(clause);
            }
        }
        if clauses.len() == 1 {
            return clauses.remove(0);
        }
        Self::And(clauses)
    }

    /// Returns `true` if `clause` is this filter or one of its top-level conjuncts.
    #[must_use]
    pub fn contains_clause(&self, clause: &Filter) -> bool {
        match self {
            Self::And(clauses) => clauses.contains(clause),
            other => other == clause,
        }
    }

    /// Evaluate the tree against a record.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Self::Match(f) => f.matches(record),
            Self::And(clauses) => clauses.iter().all(|c| c.matches(record)),
            Self::Or(clauses) => clauses.iter().any(|c| c.matches(record)),
        }
    }

    /// Read a candidate value for `property` from an equality clause.
    ///
    /// Looks at the filter itself and its top-level conjuncts only, since a
    /// value under a disjunction is not guaranteed to hold.
    #[must_use]
    pub fn eq_value_for(&self, property: &str) -> Option<&ScopeValue> {
        match self {
            Self::Match(ScopeFilter::Eq(eq)) if eq.property() == property => Some(eq.value()),
            Self::And(clauses) => clauses.iter().find_map(|c| c.eq_value_for(property)),
            Self::Match(_) | Self::Or(_) => None,
        }
    }
}
