//! Static mapping between preference cells and engagement subscription
//! groups.

use std::collections::{HashMap, HashSet};

use serde::Deserialize;

use crate::errors::{Error, Result};
use crate::preferences::model::{ChannelId, GroupId, TopicId};

/// One `(topic, channel) -> group` translation row.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingEntry {
    pub topic_id: TopicId,
    pub channel_id: ChannelId,
    pub group_id: GroupId,
}

/// Raw mapping shape as loaded from static configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingConfig {
    /// Topics eligible for engagement-platform synchronization at all. A
    /// preference change on any other topic affects only the authority.
    #[serde(default)]
    pub relevant_topics: Vec<TopicId>,
    #[serde(default)]
    pub entries: Vec<MappingEntry>,
}

/// Read-only translation table, loaded once at process start.
///
/// A lookup miss is not an error: it means "do not touch the engagement
/// platform for this cell". A malformed table fails fast here, long
/// before it can corrupt a user's save.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionGroupMapping {
    groups: HashMap<(TopicId, ChannelId), GroupId>,
    relevant_topics: HashSet<TopicId>,
}

impl SubscriptionGroupMapping {
    pub fn from_config(config: MappingConfig) -> Result<Self> {
        let relevant_topics: HashSet<TopicId> = config.relevant_topics.into_iter().collect();
        let mut groups: HashMap<(TopicId, ChannelId), GroupId> = HashMap::new();

        for entry in config.entries {
            if !relevant_topics.contains(&entry.topic_id) {
                return Err(Error::configuration(format!(
                    "Mapping entry {}/{} names topic outside relevantTopics",
                    entry.topic_id, entry.channel_id
                )));
            }
            let cell = (entry.topic_id, entry.channel_id);
            match groups.get(&cell) {
                Some(existing) if *existing != entry.group_id => {
                    return Err(Error::configuration(format!(
                        "Conflicting group mappings for {}/{}: '{}' vs '{}'",
                        cell.0, cell.1, existing, entry.group_id
                    )));
                }
                // Identical duplicate rows are collapsed.
                Some(_) => {}
                None => {
                    groups.insert(cell, entry.group_id);
                }
            }
        }

        Ok(Self {
            groups,
            relevant_topics,
        })
    }

    /// Group for one cell, when the engagement platform mirrors it.
    pub fn lookup(&self, topic_id: &TopicId, channel_id: &ChannelId) -> Option<&GroupId> {
        self.groups
            .get(&(topic_id.clone(), channel_id.clone()))
    }

    /// Whether the topic participates in engagement synchronization.
    pub fn is_relevant(&self, topic_id: &TopicId) -> bool {
        self.relevant_topics.contains(topic_id)
    }

    pub fn entry_count(&self) -> usize {
        self.groups.len()
    }
}
