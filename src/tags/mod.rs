//! Dimension keys and values scoping stats recording.
//!
//! A [`TagContext`] is the set of key/value dimensions attached to a logical
//! operation. Recording a measurement against a [`View`] restricts the
//! attached context to the view's tag keys; that restriction is the
//! aggregation bucket key.
//!
//! [`View`]: crate::stats::View

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

/// The name of a dimension, e.g. `"method"` or `"status"`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TagKey(Cow<'static, str>);

impl TagKey {
    /// Create a tag key.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        TagKey(name.into())
    }

    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TagKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The value of a dimension for one operation.
///
/// An aggregation bucket key is a tuple of tag values; operations that did
/// not set a given key contribute the empty value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TagValue(Cow<'static, str>);

impl TagValue {
    /// Create a tag value.
    pub fn new(value: impl Into<Cow<'static, str>>) -> Self {
        TagValue(value.into())
    }

    /// The empty value, used when an operation did not set a key.
    pub fn empty() -> Self {
        TagValue::default()
    }

    /// The value as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An immutable mapping from [`TagKey`] to [`TagValue`].
///
/// Attach one to a logical operation and pass it to
/// [`StatsRecorder::record`] to scope the recorded measurements to that
/// dimension combination.
///
/// [`StatsRecorder::record`]: crate::stats::StatsRecorder::record
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TagContext {
    tags: HashMap<TagKey, TagValue>,
}

impl TagContext {
    /// A context carrying no tags.
    pub fn empty() -> Self {
        TagContext::default()
    }

    /// Start building a tag context.
    pub fn builder() -> TagContextBuilder {
        TagContextBuilder::default()
    }

    /// Derive a builder seeded with this context's tags.
    pub fn to_builder(&self) -> TagContextBuilder {
        TagContextBuilder {
            tags: self.tags.clone(),
        }
    }

    /// The value for `key`, if set.
    pub fn get(&self, key: &TagKey) -> Option<&TagValue> {
        self.tags.get(key)
    }

    /// The number of tags in this context.
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Whether this context carries no tags.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Iterate over the tags in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&TagKey, &TagValue)> {
        self.tags.iter()
    }
}

/// Builds a [`TagContext`].
#[derive(Clone, Debug, Default)]
pub struct TagContextBuilder {
    tags: HashMap<TagKey, TagValue>,
}

impl TagContextBuilder {
    /// Set `key` to `value`, replacing any existing value.
    pub fn insert(mut self, key: TagKey, value: impl Into<Cow<'static, str>>) -> Self {
        self.tags.insert(key, TagValue::new(value));
        self
    }

    /// Remove `key` if present.
    pub fn remove(mut self, key: &TagKey) -> Self {
        self.tags.remove(key);
        self
    }

    /// Finish building.
    pub fn build(self) -> TagContext {
        TagContext { tags: self.tags }
    }
}
