//! Preference domain model: topics, channels, and the opt-in matrix.

use std::collections::BTreeMap;
use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

/// Opaque topic identifier assigned by the preference authority.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopicId(String);

impl TopicId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TopicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TopicId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for TopicId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Opaque delivery-channel identifier (e.g. "email", "in-app").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(String);

impl ChannelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChannelId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ChannelId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Subscription group identifier in the engagement platform's vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(String);

impl GroupId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GroupId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for GroupId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A notification category. Topics are a fixed, externally configured
/// set; the portal never creates or deletes them at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub id: TopicId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// When false the topic is mandatory and always considered opted-in.
    pub can_opt_out: bool,
}

/// A delivery mechanism. Also a fixed external set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub id: ChannelId,
    pub name: String,
}

/// Raw catalog shape as loaded from static configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogConfig {
    pub topics: Vec<Topic>,
    pub channels: Vec<Channel>,
}

/// The fixed topic and channel sets for the portal.
///
/// Declaration order is the canonical iteration order: everywhere the
/// system needs determinism (payload ordering, duplicate-group
/// tie-breaking) it walks topics in declaration order with channels
/// nested in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceCatalog {
    topics: Vec<Topic>,
    channels: Vec<Channel>,
}

impl PreferenceCatalog {
    pub fn new(topics: Vec<Topic>, channels: Vec<Channel>) -> Result<Self> {
        let mut seen_topics = std::collections::HashSet::new();
        for topic in &topics {
            if !seen_topics.insert(topic.id.clone()) {
                return Err(Error::configuration(format!(
                    "Duplicate topic id '{}' in catalog",
                    topic.id
                )));
            }
        }
        let mut seen_channels = std::collections::HashSet::new();
        for channel in &channels {
            if !seen_channels.insert(channel.id.clone()) {
                return Err(Error::configuration(format!(
                    "Duplicate channel id '{}' in catalog",
                    channel.id
                )));
            }
        }
        Ok(Self { topics, channels })
    }

    pub fn from_config(config: CatalogConfig) -> Result<Self> {
        Self::new(config.topics, config.channels)
    }

    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn topic(&self, id: &TopicId) -> Option<&Topic> {
        self.topics.iter().find(|topic| &topic.id == id)
    }

    /// All keys in canonical order.
    pub fn keys(&self) -> impl Iterator<Item = PreferenceKey> + '_ {
        self.topics.iter().flat_map(move |topic| {
            self.channels
                .iter()
                .map(move |channel| PreferenceKey::new(topic.id.clone(), channel.id.clone()))
        })
    }

    pub fn contains(&self, key: &PreferenceKey) -> bool {
        self.topics.iter().any(|topic| topic.id == key.topic_id)
            && self.channels.iter().any(|channel| channel.id == key.channel_id)
    }

    pub fn cell_count(&self) -> usize {
        self.topics.len() * self.channels.len()
    }
}

/// Composite key identifying one togglable preference cell.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceKey {
    pub topic_id: TopicId,
    pub channel_id: ChannelId,
}

impl PreferenceKey {
    pub fn new(topic_id: TopicId, channel_id: ChannelId) -> Self {
        Self {
            topic_id,
            channel_id,
        }
    }
}

impl fmt::Display for PreferenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.topic_id, self.channel_id)
    }
}

/// Total opt-in map over topics x channels.
///
/// Two instances exist during a save cycle: the snapshot (last confirmed
/// state) and the desired matrix (the user's in-progress edits). Cells
/// for non-opt-outable topics are always true; constructors and `set`
/// normalize writes that would violate that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreferenceMatrix {
    cells: BTreeMap<PreferenceKey, bool>,
}

impl PreferenceMatrix {
    /// Matrix with every cell opted in.
    pub fn opted_in(catalog: &PreferenceCatalog) -> Self {
        Self {
            cells: catalog.keys().map(|key| (key, true)).collect(),
        }
    }

    /// Build a matrix from the authority's opted-out cell list; absence
    /// means opted-in. Opt-outs for unknown cells or mandatory topics are
    /// discarded.
    pub fn from_opt_outs(catalog: &PreferenceCatalog, opt_outs: &[PreferenceKey]) -> Self {
        let mut matrix = Self::opted_in(catalog);
        for key in opt_outs {
            let Some(topic) = catalog.topic(&key.topic_id) else {
                debug!("Ignoring opt-out for unknown cell {}", key);
                continue;
            };
            if !topic.can_opt_out {
                debug!("Ignoring opt-out for mandatory topic cell {}", key);
                continue;
            }
            if let Some(cell) = matrix.cells.get_mut(key) {
                *cell = false;
            } else {
                debug!("Ignoring opt-out for unknown cell {}", key);
            }
        }
        matrix
    }

    pub fn get(&self, key: &PreferenceKey) -> Option<bool> {
        self.cells.get(key).copied()
    }

    /// Cell state, failing on keys outside the matrix.
    pub fn state(&self, key: &PreferenceKey) -> Result<bool> {
        self.get(key)
            .ok_or_else(|| Error::UnknownPreference(key.clone()))
    }

    /// Set one cell. Writes of `false` on a mandatory topic are
    /// normalized back to `true`; unknown keys are rejected.
    pub fn set(
        &mut self,
        catalog: &PreferenceCatalog,
        key: &PreferenceKey,
        opted_in: bool,
    ) -> Result<()> {
        let topic = catalog
            .topic(&key.topic_id)
            .ok_or_else(|| Error::UnknownPreference(key.clone()))?;
        let cell = self
            .cells
            .get_mut(key)
            .ok_or_else(|| Error::UnknownPreference(key.clone()))?;
        *cell = opted_in || !topic.can_opt_out;
        Ok(())
    }

    /// True when every catalog cell is present, and nothing else.
    pub fn is_total_over(&self, catalog: &PreferenceCatalog) -> bool {
        self.cells.len() == catalog.cell_count()
            && catalog.keys().all(|key| self.cells.contains_key(&key))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PreferenceKey, bool)> {
        self.cells.iter().map(|(key, value)| (key, *value))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Derived record of one cell flipping state. Never persisted; used only
/// for audit-event construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRecord {
    pub topic_id: TopicId,
    pub channel_id: ChannelId,
    pub old_state: bool,
    pub new_state: bool,
}

/// Subscription group membership state on the engagement platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionState {
    Subscribed,
    Unsubscribed,
}

impl SubscriptionState {
    pub fn from_opted_in(opted_in: bool) -> Self {
        if opted_in {
            Self::Subscribed
        } else {
            Self::Unsubscribed
        }
    }
}
