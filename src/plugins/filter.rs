//! Administrative plugin filtering

use crate::config::DisabledExtensions;

use super::record::{ModuleExports, PluginRecord};

/// Ids of plugins skipped because they are disabled
///
/// Append-only; kept for auditing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisabledSet {
    ids: Vec<String>,
}

impl DisabledSet {
    /// Create an empty set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a disabled plugin id
    pub fn push(&mut self, id: impl Into<String>) {
        self.ids.push(id.into());
    }

    /// Whether `id` was recorded
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|recorded| recorded == id)
    }

    /// Recorded ids in discovery order
    #[must_use]
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Number of recorded ids
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether nothing was recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Lazily yield the plugins of `exports` that are not disabled
///
/// Disabled plugins are appended to `audit` as the iterator reaches them.
/// `disabled` is consulted once per plugin.
pub fn active_plugins<'a>(
    exports: ModuleExports,
    disabled: &'a DisabledExtensions,
    audit: &'a mut DisabledSet,
) -> impl Iterator<Item = PluginRecord> + 'a {
    exports.into_plugins().into_iter().filter(move |plugin| {
        if disabled.is_disabled(&plugin.id) {
            tracing::info!(plugin_id = %plugin.id, "plugin disabled, skipping");
            audit.push(plugin.id.clone());
            false
        } else {
            true
        }
    })
}
