//! Slot persistence
//!
//! A slot is a named snapshot of the settings, the button bindings and
//! the keystring arena. The arena is stored verbatim (base64) so a load
//! reproduces it byte for byte.

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::bindings::{BindingEntry, ButtonTable};
use crate::error::CoreError;
use crate::state::SlotSettings;

/// Persisted snapshot of one configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub name: String,
    #[serde(default)]
    pub settings: SlotSettings,
    #[serde(default)]
    pub bindings: Vec<BindingEntry>,
    /// Keystring arena, base64
    #[serde(default)]
    pub keystrings: String,
}

impl Slot {
    /// Snapshot the live configuration under the settings' slot name
    pub fn capture(settings: &SlotSettings, table: &ButtonTable) -> Self {
        Self {
            name: settings.slot_name.clone(),
            settings: settings.clone(),
            bindings: table.entries().to_vec(),
            keystrings: STANDARD.encode(table.keystrings().as_bytes()),
        }
    }

    /// Write the bindings into `table` and return the slot's settings.
    /// The table is untouched when the slot content is invalid.
    pub fn apply(&self, table: &mut ButtonTable) -> Result<SlotSettings, CoreError> {
        let arena = STANDARD
            .decode(&self.keystrings)
            .map_err(|e| CoreError::Storage(format!("slot {}: {}", self.name, e)))?;
        table.restore(&self.bindings, &arena)?;

        let mut settings = self.settings.clone();
        settings.slot_name = self.name.clone();
        Ok(settings)
    }

    /// Human readable dump, as printed by `AT LA`
    pub fn describe(&self) -> Vec<String> {
        let mut lines = vec![format!("Slot:{}", self.name), self.settings.summary()];

        let mut table = ButtonTable::new();
        match self.apply(&mut table) {
            Ok(_) => lines.extend(table.describe()),
            Err(e) => lines.push(format!("invalid slot content: {}", e)),
        }
        lines
    }
}

/// Slot persistence collaborator
pub trait SlotStorage {
    /// Store a slot, replacing one with the same name
    fn save(&mut self, slot: Slot) -> Result<(), CoreError>;

    /// Load a slot by name; "" loads the slot after the current one,
    /// wrapping around
    fn load(&mut self, name: &str) -> Result<Slot, CoreError>;

    /// Names of all stored slots, in storage order
    fn list(&self) -> Vec<String>;

    /// All stored slots
    fn slots(&self) -> &[Slot];

    /// Delete a slot by name; "" deletes all
    fn delete(&mut self, name: &str) -> Result<(), CoreError>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SlotFile {
    #[serde(default)]
    slots: Vec<Slot>,
}

/// Slots kept in memory and mirrored to a JSON file
#[derive(Debug)]
pub struct FileSlotStore {
    path: Option<PathBuf>,
    max_slots: usize,
    slots: Vec<Slot>,
    current: Option<usize>,
}

impl FileSlotStore {
    /// Open the slot file, starting empty when it does not exist yet
    pub fn open(path: impl Into<PathBuf>, max_slots: usize) -> Result<Self> {
        let path = path.into();
        let slots = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read slot file {}", path.display()))?;
            let file: SlotFile = serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse slot file {}", path.display()))?;
            file.slots
        } else {
            Vec::new()
        };
        info!("Loaded {} slots from {}", slots.len(), path.display());

        Ok(Self {
            path: Some(path),
            max_slots,
            slots,
            current: None,
        })
    }

    /// Store that never touches the filesystem
    pub fn in_memory(max_slots: usize) -> Self {
        Self {
            path: None,
            max_slots,
            slots: Vec::new(),
            current: None,
        }
    }

    /// Write `slots` to the file; the caller commits them to memory only
    /// after this succeeded
    fn persist(&self, slots: &[Slot]) -> Result<(), CoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        write_slot_file(path, slots).map_err(|e| {
            warn!("Failed to write slot file: {:#}", e);
            CoreError::Storage(e.to_string())
        })
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.slots.iter().position(|s| s.name == name)
    }
}

fn write_slot_file(path: &Path, slots: &[Slot]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = SlotFile {
        slots: slots.to_vec(),
    };
    let contents = serde_json::to_string_pretty(&file)?;
    std::fs::write(path, contents)?;
    Ok(())
}

impl SlotStorage for FileSlotStore {
    fn save(&mut self, slot: Slot) -> Result<(), CoreError> {
        let mut slots = self.slots.clone();
        let index = match self.position(&slot.name) {
            Some(index) => {
                slots[index] = slot;
                index
            }
            None => {
                if slots.len() >= self.max_slots {
                    return Err(CoreError::StorageFull);
                }
                slots.push(slot);
                slots.len() - 1
            }
        };
        self.persist(&slots)?;
        self.slots = slots;
        self.current = Some(index);
        info!("Saved slot {}: {}", index + 1, self.slots[index].name);
        Ok(())
    }

    fn load(&mut self, name: &str) -> Result<Slot, CoreError> {
        if self.slots.is_empty() {
            return Err(CoreError::NotFound(name.to_string()));
        }

        let index = if name.is_empty() {
            self.current.map_or(0, |current| (current + 1) % self.slots.len())
        } else {
            self.position(name)
                .ok_or_else(|| CoreError::NotFound(name.to_string()))?
        };

        self.current = Some(index);
        debug!("Loading slot {}: {}", index + 1, self.slots[index].name);
        Ok(self.slots[index].clone())
    }

    fn list(&self) -> Vec<String> {
        self.slots.iter().map(|s| s.name.clone()).collect()
    }

    fn slots(&self) -> &[Slot] {
        &self.slots
    }

    fn delete(&mut self, name: &str) -> Result<(), CoreError> {
        if name.is_empty() {
            self.persist(&[])?;
            info!("Deleted all {} slots", self.slots.len());
            self.slots.clear();
            self.current = None;
        } else {
            let index = self
                .position(name)
                .ok_or_else(|| CoreError::NotFound(name.to_string()))?;
            let mut slots = self.slots.clone();
            slots.remove(index);
            self.persist(&slots)?;
            self.slots = slots;
            self.current = match self.current {
                Some(current) if current > index => Some(current - 1),
                Some(current) if current == index => None,
                other => other,
            };
            info!("Deleted slot {}", name);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::ActionCode;

    fn slot(name: &str) -> Slot {
        let settings = SlotSettings {
            slot_name: name.to_string(),
            ..SlotSettings::default()
        };
        Slot::capture(&settings, &ButtonTable::with_defaults())
    }

    #[test]
    fn test_capture_apply_round_trip() {
        let mut table = ButtonTable::with_defaults();
        table.bind(5, ActionCode::KeyWrite, 0, "hello").unwrap();
        let settings = SlotSettings {
            slot_name: "typing".to_string(),
            ws: 7,
            ..SlotSettings::default()
        };

        let saved = Slot::capture(&settings, &table);
        let mut restored = ButtonTable::new();
        let loaded = saved.apply(&mut restored).unwrap();

        assert_eq!(restored, table);
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_apply_rejects_bad_base64() {
        let mut bad = slot("bad");
        bad.keystrings = "not base64!".to_string();
        let mut table = ButtonTable::with_defaults();
        let before = table.clone();
        assert!(matches!(bad.apply(&mut table), Err(CoreError::Storage(_))));
        assert_eq!(table, before);
    }

    #[test]
    fn test_save_replaces_same_name() {
        let mut store = FileSlotStore::in_memory(4);
        store.save(slot("a")).unwrap();
        store.save(slot("b")).unwrap();
        store.save(slot("a")).unwrap();
        assert_eq!(store.list(), ["a", "b"]);
    }

    #[test]
    fn test_storage_full() {
        let mut store = FileSlotStore::in_memory(1);
        store.save(slot("a")).unwrap();
        assert_eq!(store.save(slot("b")), Err(CoreError::StorageFull));
        // replacing still works when full
        assert!(store.save(slot("a")).is_ok());
    }

    #[test]
    fn test_load_next_wraps() {
        let mut store = FileSlotStore::in_memory(4);
        for name in ["a", "b", "c"] {
            store.save(slot(name)).unwrap();
        }
        assert_eq!(store.load("a").unwrap().name, "a");
        assert_eq!(store.load("").unwrap().name, "b");
        assert_eq!(store.load("").unwrap().name, "c");
        assert_eq!(store.load("").unwrap().name, "a");
    }

    #[test]
    fn test_load_missing() {
        let mut store = FileSlotStore::in_memory(4);
        assert!(matches!(store.load(""), Err(CoreError::NotFound(_))));
        store.save(slot("a")).unwrap();
        assert_eq!(
            store.load("zzz"),
            Err(CoreError::NotFound("zzz".to_string()))
        );
    }

    #[test]
    fn test_delete() {
        let mut store = FileSlotStore::in_memory(4);
        store.save(slot("a")).unwrap();
        store.save(slot("b")).unwrap();

        assert!(matches!(store.delete("x"), Err(CoreError::NotFound(_))));
        store.delete("a").unwrap();
        assert_eq!(store.list(), ["b"]);
        store.delete("").unwrap();
        assert!(store.list().is_empty());
    }

    #[test]
    fn test_file_persistence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/slots.json");

        let mut store = FileSlotStore::open(&path, 4).unwrap();
        store.save(slot("mouse")).unwrap();
        assert!(path.exists());

        let mut reopened = FileSlotStore::open(&path, 4).unwrap();
        assert_eq!(reopened.list(), ["mouse"]);
        let loaded = reopened.load("mouse").unwrap();
        assert_eq!(loaded, slot("mouse"));

        let mut table = ButtonTable::new();
        loaded.apply(&mut table).unwrap();
        assert_eq!(table, ButtonTable::with_defaults());
    }

    #[test]
    fn test_entries_without_keystring_index_load() {
        let saved = slot("old");
        let mut json = serde_json::to_value(&saved).unwrap();
        for entry in json["bindings"].as_array_mut().unwrap() {
            entry.as_object_mut().unwrap().remove("keystring");
        }
        let old: Slot = serde_json::from_value(json).unwrap();

        let mut table = ButtonTable::new();
        old.apply(&mut table).unwrap();
        assert_eq!(table, ButtonTable::with_defaults());
    }

    #[test]
    fn test_failed_write_keeps_memory_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slots.json");

        let mut store = FileSlotStore::open(&path, 4).unwrap();
        store.save(slot("a")).unwrap();

        // a directory in place of the file makes every write fail
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();

        assert!(matches!(store.save(slot("b")), Err(CoreError::Storage(_))));
        assert!(matches!(store.delete("a"), Err(CoreError::Storage(_))));
        assert!(matches!(store.delete(""), Err(CoreError::Storage(_))));
        assert_eq!(store.list(), ["a"]);
        assert_eq!(store.load("").unwrap().name, "a");
    }

    #[test]
    fn test_describe() {
        let lines = slot("keys").describe();
        assert_eq!(lines[0], "Slot:keys");
        assert!(lines[1].starts_with("WS 3 LP 1000"));
        assert_eq!(lines[2], "Button 1: KP KEY_SPACE ");
    }
}
