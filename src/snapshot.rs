//! Durable cart snapshots
//!
//! Only the items, promo code and shipping selection are stored. Discounts and
//! totals are rebuilt from the pricing table when the cart is loaded.

use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing::warn;

use crate::domain::aggregates::CartLineItem;
use crate::domain::value_objects::ShippingOptionId;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSnapshot {
    #[serde(default, deserialize_with = "deserialize_items")]
    pub items: Vec<CartLineItem>,
    #[serde(default)]
    pub promo_code: String,
    #[serde(default)]
    pub shipping_option: ShippingOptionId,
}

/// Reads stored lines one at a time so a single damaged line does not cost the whole cart.
/// Quantities are pulled into `1..=u32::MAX`; lines that still fail to parse are skipped.
fn deserialize_items<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<CartLineItem>, D::Error> {
    let raw = Vec::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.into_iter().enumerate().filter_map(|(index, mut value)| {
        if let Some(fields) = value.as_object_mut() {
            let stored = fields.get("quantity").and_then(serde_json::Value::as_i64);
            let repaired = stored.map_or(1, |q| q.clamp(1, i64::from(u32::MAX)));
            if stored != Some(repaired) {
                warn!(index, ?stored, repaired, "repairing stored line item quantity");
                fields.insert("quantity".to_string(), serde_json::Value::from(repaired));
            }
        }
        serde_json::from_value::<CartLineItem>(value)
            .map_err(|e| warn!(index, error = %e, "skipping unreadable stored line item"))
            .ok()
    }).collect())
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot is not valid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("snapshot store lock poisoned")]
    Poisoned,
}

/// Key-value style storage holding at most one cart snapshot.
pub trait SnapshotStore: Send + Sync {
    fn load(&self) -> Result<Option<CartSnapshot>, SnapshotError>;
    fn save(&self, snapshot: &CartSnapshot) -> Result<(), SnapshotError>;

    /// Moves an unreadable snapshot out of the way so the next save does not destroy it.
    fn set_aside(&self) -> Result<(), SnapshotError> { Ok(()) }
}

#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    snapshot: Mutex<Option<CartSnapshot>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self { Self::default() }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self) -> Result<Option<CartSnapshot>, SnapshotError> {
        let guard = self.snapshot.lock().map_err(|_| SnapshotError::Poisoned)?;
        Ok(guard.clone())
    }

    fn save(&self, snapshot: &CartSnapshot) -> Result<(), SnapshotError> {
        let mut guard = self.snapshot.lock().map_err(|_| SnapshotError::Poisoned)?;
        *guard = Some(snapshot.clone());
        Ok(())
    }
}

/// Stores the snapshot as a JSON document, replacing it atomically on save.
#[derive(Debug, Clone)]
pub struct JsonFileSnapshotStore {
    path: PathBuf,
}

impl JsonFileSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into() } }
    pub fn path(&self) -> &Path { &self.path }

    pub fn set_aside_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".corrupt");
        PathBuf::from(name)
    }
}

impl SnapshotStore for JsonFileSnapshotStore {
    fn load(&self) -> Result<Option<CartSnapshot>, SnapshotError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn save(&self, snapshot: &CartSnapshot) -> Result<(), SnapshotError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(snapshot)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn set_aside(&self) -> Result<(), SnapshotError> {
        match std::fs::rename(&self.path, self.set_aside_path()) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}
