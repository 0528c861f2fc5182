//! Rationale text shown before prompting

use std::collections::HashMap;

use crate::permission::Permission;
use crate::platform::Platform;

/// Supplies rationale text for the rights about to be requested
///
/// Implementations are side-effect free accessors; returning `None` shows
/// nothing.
pub trait PermissionDescription: Send + Sync {
    fn describe(&self, platform: &dyn Platform, permissions: &[Permission]) -> Option<String>;
}

/// Shows no rationale
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultDescription;

impl PermissionDescription for DefaultDescription {
    fn describe(&self, _platform: &dyn Platform, _permissions: &[Permission]) -> Option<String> {
        None
    }
}

/// Static text per right name or per group
///
/// A right's own text wins over its group's text. Each distinct text appears
/// once, in the order the rights are requested.
#[derive(Debug, Clone)]
pub struct StaticDescription {
    by_name: HashMap<String, String>,
    by_group: HashMap<String, String>,
    separator: String,
}

impl StaticDescription {
    pub fn new() -> Self {
        Self {
            by_name: HashMap::new(),
            by_group: HashMap::new(),
            separator: "\n".to_string(),
        }
    }

    pub fn permission(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.by_name.insert(name.into(), text.into());
        self
    }

    pub fn group(mut self, group: impl Into<String>, text: impl Into<String>) -> Self {
        self.by_group.insert(group.into(), text.into());
        self
    }

    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    fn text_for(&self, permission: &Permission) -> Option<&str> {
        self.by_name
            .get(permission.name())
            .or_else(|| permission.group().and_then(|g| self.by_group.get(g)))
            .map(String::as_str)
    }
}

impl Default for StaticDescription {
    fn default() -> Self {
        Self::new()
    }
}

impl PermissionDescription for StaticDescription {
    fn describe(&self, _platform: &dyn Platform, permissions: &[Permission]) -> Option<String> {
        let mut texts: Vec<&str> = Vec::new();
        for text in permissions.iter().filter_map(|p| self.text_for(p)) {
            if !texts.contains(&text) {
                texts.push(text);
            }
        }
        if texts.is_empty() {
            return None;
        }
        Some(texts.join(&self.separator))
    }
}
