//! Preset menus
//!
//! Engines offer presets as a tree (submenus for families of sizes). The
//! host shows a flat list, split into a short primary section and an
//! overflow section when there are many.

/// More presets than this and the list is split.
const SPLIT_THRESHOLD: usize = 10;
/// Size of the primary section once split.
const PRIMARY_COUNT: usize = 8;

/// One entry in the engine's preset tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresetMenuEntry {
    Preset { id: i32, title: String },
    Submenu { title: String, entries: Vec<PresetMenuEntry> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preset {
    pub id: i32,
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresetList {
    presets: Vec<Preset>,
}

impl PresetList {
    /// Flatten a preset tree depth-first.
    pub fn flatten(entries: &[PresetMenuEntry]) -> Self {
        fn walk(entries: &[PresetMenuEntry], out: &mut Vec<Preset>) {
            for entry in entries {
                match entry {
                    PresetMenuEntry::Preset { id, title } => out.push(Preset {
                        id: *id,
                        title: title.clone(),
                    }),
                    PresetMenuEntry::Submenu { entries, .. } => walk(entries, out),
                }
            }
        }
        let mut presets = Vec::new();
        walk(entries, &mut presets);
        Self { presets }
    }

    pub fn all(&self) -> &[Preset] {
        &self.presets
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    pub fn find(&self, id: i32) -> Option<&Preset> {
        self.presets.iter().find(|p| p.id == id)
    }

    fn is_split(&self) -> bool {
        self.presets.len() > SPLIT_THRESHOLD
    }

    pub fn primary(&self) -> &[Preset] {
        if self.is_split() {
            &self.presets[..PRIMARY_COUNT]
        } else {
            &self.presets
        }
    }

    pub fn overflow(&self) -> &[Preset] {
        if self.is_split() {
            &self.presets[PRIMARY_COUNT..]
        } else {
            &[]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preset(id: i32) -> PresetMenuEntry {
        PresetMenuEntry::Preset {
            id,
            title: format!("{id}x{id}"),
        }
    }

    #[test]
    fn test_flatten_depth_first() {
        let tree = vec![
            preset(3),
            PresetMenuEntry::Submenu {
                title: "Large".into(),
                entries: vec![preset(7), preset(9)],
            },
            preset(5),
        ];
        let list = PresetList::flatten(&tree);
        let ids: Vec<_> = list.all().iter().map(|p| p.id).collect();
        assert_eq!(ids, [3, 7, 9, 5]);
        assert_eq!(list.find(9).unwrap().title, "9x9");
        assert!(list.find(4).is_none());
    }

    #[test]
    fn test_small_list_not_split() {
        let list = PresetList::flatten(&(0..10).map(preset).collect::<Vec<_>>());
        assert_eq!(list.primary().len(), 10);
        assert!(list.overflow().is_empty());
    }

    #[test]
    fn test_large_list_split() {
        let list = PresetList::flatten(&(0..13).map(preset).collect::<Vec<_>>());
        assert_eq!(list.primary().len(), 8);
        assert_eq!(list.overflow().len(), 5);
        assert_eq!(list.overflow()[0].id, 8);
    }
}
