//! Engine config forms to host-editable menus and back
//!
//! The engine describes each form as a flat array of dynamically typed
//! items. Decoding keeps every item's array index, and encoding writes
//! values back by that index alone: items hidden from the host never shift
//! the correlation.

use serde::{Deserialize, Serialize};

use super::{ConfigKind, RawConfig, RawConfigItem, RawConfigValue};
use crate::error::{BridgeError, BridgeResult};

/// Preference titles hidden from the host UI by default. They configure
/// hardware keyboards, which the touch host handles itself.
pub const DEFAULT_EXCLUSIONS: [&str; 2] = ["Keyboard shortcuts without Ctrl", "Numpad inputs"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub ordinal: i32,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigValue {
    String(String),
    /// A string slot holding a number; edited as an integer.
    Integer(i64),
    Boolean(bool),
    Choice {
        options: Vec<ChoiceOption>,
        selected: i32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigItem {
    /// Position in the engine's original array.
    pub index: usize,
    pub title: String,
    pub value: ConfigValue,
}

impl ConfigItem {
    /// Label of the selected option for choice items.
    pub fn selected_label(&self) -> Option<&str> {
        match &self.value {
            ConfigValue::Choice { options, selected } => options
                .iter()
                .find(|o| o.ordinal == *selected)
                .map(|o| o.label.as_str()),
            _ => None,
        }
    }
}

/// One decoded form. Built per query and discarded after write-back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigMenu {
    pub kind: ConfigKind,
    pub title: String,
    pub items: Vec<ConfigItem>,
}

impl ConfigMenu {
    pub fn empty(kind: ConfigKind) -> Self {
        Self {
            kind,
            title: String::new(),
            items: Vec::new(),
        }
    }

    pub fn item(&self, title: &str) -> Option<&ConfigItem> {
        self.items.iter().find(|i| i.title == title)
    }

    pub fn item_mut(&mut self, title: &str) -> Option<&mut ConfigItem> {
        self.items.iter_mut().find(|i| i.title == title)
    }
}

/// Split a delimiter-prefixed option string: the first character is the
/// separator, so `":Foo:Bar"` gives `Foo`, `Bar`.
pub fn parse_choices(names: &str) -> Option<Vec<ChoiceOption>> {
    let mut chars = names.chars();
    let delimiter = chars.next()?;
    let options: Vec<ChoiceOption> = chars
        .as_str()
        .split(delimiter)
        .enumerate()
        .map(|(i, label)| ChoiceOption {
            ordinal: i as i32,
            label: label.to_string(),
        })
        .collect();
    if options.iter().all(|o| o.label.is_empty()) {
        return None;
    }
    Some(options)
}

/// Integer view of a string slot, only when it prints back identically.
fn as_integer(s: &str) -> Option<i64> {
    let n: i64 = s.parse().ok()?;
    (n.to_string() == s).then_some(n)
}

#[derive(Debug, Clone)]
pub struct ConfigMenuCodec {
    exclusions: Vec<String>,
}

impl Default for ConfigMenuCodec {
    fn default() -> Self {
        Self::new(DEFAULT_EXCLUSIONS.iter().map(|s| s.to_string()).collect())
    }
}

impl ConfigMenuCodec {
    pub fn new(exclusions: Vec<String>) -> Self {
        Self { exclusions }
    }

    fn excluded(&self, title: &str) -> bool {
        self.exclusions.iter().any(|e| e == title)
    }

    /// Decode an engine form, stopping at the terminator item.
    pub fn decode(&self, kind: ConfigKind, raw: &RawConfig) -> BridgeResult<ConfigMenu> {
        let mut items = Vec::new();
        for (index, item) in raw.items.iter().enumerate() {
            if self.excluded(&item.title) {
                continue;
            }
            let value = match &item.value {
                RawConfigValue::End => break,
                RawConfigValue::String(s) => match as_integer(s) {
                    Some(n) => ConfigValue::Integer(n),
                    None => ConfigValue::String(s.clone()),
                },
                RawConfigValue::Boolean(b) => ConfigValue::Boolean(*b),
                RawConfigValue::Choices { names, selected } => {
                    let options =
                        parse_choices(names).ok_or_else(|| BridgeError::MalformedChoices {
                            title: item.title.clone(),
                            names: names.clone(),
                        })?;
                    ConfigValue::Choice {
                        options,
                        selected: *selected,
                    }
                }
            };
            items.push(ConfigItem {
                index,
                title: item.title.clone(),
                value,
            });
        }
        Ok(ConfigMenu {
            kind,
            title: raw.title.clone(),
            items,
        })
    }

    /// Write menu values into a freshly fetched engine array by stored index.
    ///
    /// Items whose index is out of range or whose slot kind no longer
    /// matches are skipped with a warning.
    pub fn encode(&self, menu: &ConfigMenu, raw: &mut [RawConfigItem]) {
        for item in &menu.items {
            let Some(slot) = raw.get_mut(item.index) else {
                log::warn!("config item {} '{}' has no slot", item.index, item.title);
                continue;
            };
            match (&item.value, &mut slot.value) {
                (ConfigValue::Boolean(b), RawConfigValue::Boolean(dst)) => *dst = *b,
                (ConfigValue::Integer(n), RawConfigValue::String(dst)) => *dst = n.to_string(),
                (ConfigValue::String(s), RawConfigValue::String(dst)) => dst.clone_from(s),
                (ConfigValue::Choice { selected, .. }, RawConfigValue::Choices { selected: dst, .. }) => {
                    *dst = *selected
                }
                _ => log::warn!(
                    "config item {} '{}' changed kind, not written",
                    item.index,
                    item.title
                ),
            }
        }
    }
}
