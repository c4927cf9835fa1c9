//! Named asset storage filled by the loader before the game loop starts.

use std::any::Any;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AssetError {
    #[error("asset not found: {0}")]
    Missing(String),
    #[error("asset {id} is not a {expected}")]
    TypeMismatch { id: String, expected: &'static str },
}

/// Typed blobs keyed by string id.
#[derive(Default)]
pub struct AssetStore {
    assets: HashMap<String, Box<dyn Any>>,
}

impl AssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an asset, replacing anything under the same id.
    pub fn insert<T: Any>(&mut self, id: impl Into<String>, asset: T) {
        let id = id.into();
        if self.assets.insert(id.clone(), Box::new(asset)).is_some() {
            log::debug!("Replaced asset '{}'", id);
        }
    }

    pub fn get<T: Any>(&self, id: &str) -> Result<&T, AssetError> {
        let asset = self
            .assets
            .get(id)
            .ok_or_else(|| AssetError::Missing(id.to_string()))?;
        asset.downcast_ref::<T>().ok_or_else(|| AssetError::TypeMismatch {
            id: id.to_string(),
            expected: std::any::type_name::<T>(),
        })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.assets.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

impl std::fmt::Debug for AssetStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ids: Vec<_> = self.assets.keys().collect();
        ids.sort();
        f.debug_struct("AssetStore").field("ids", &ids).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct MeshData {
        vertices: usize,
    }

    #[test]
    fn typed_lookup() {
        let mut store = AssetStore::new();
        store.insert("earth", MeshData { vertices: 960 });

        assert!(store.contains("earth"));
        assert_eq!(store.get::<MeshData>("earth"), Ok(&MeshData { vertices: 960 }));
        assert_eq!(
            store.get::<MeshData>("moon"),
            Err(AssetError::Missing("moon".to_string()))
        );
        assert!(matches!(
            store.get::<String>("earth"),
            Err(AssetError::TypeMismatch { .. })
        ));
    }
}
