//! The shared line material.
//!
//! Every [`PolygonDebugRenderer`](crate::renderer::PolygonDebugRenderer)
//! draws its GPU pipeline through one line material. The material is
//! allocated on first use and reused by every renderer sharing the holder.
//!
//! [`SharedLineMaterial::global`] is the process-wide holder. Hosts that
//! need isolation (tests, multiple GPU devices) create their own holder and
//! inject it with
//! [`with_line_material`](crate::renderer::PolygonDebugRenderer::with_line_material).
//!
//! A cached [`MaterialId`] is only meaningful to the
//! [`GpuLines`](crate::draw::GpuLines) backend that created it. The holder
//! does not know which backend that was. A host that replaces its backend
//! (new window, new device) must call [`SharedLineMaterial::shutdown`]
//! first, or the next draw binds an id the new backend never created.

use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::Mutex;

use crate::draw::MaterialId;
use crate::RenderError;

static GLOBAL: Lazy<Arc<SharedLineMaterial>> = Lazy::new(|| Arc::new(SharedLineMaterial::new()));

#[derive(Debug, Default)]
struct State {
    material: Option<MaterialId>,
    creations: u64,
}

/// Guarded one-time construction of a line material.
#[derive(Debug, Default)]
pub struct SharedLineMaterial {
    state: Mutex<State>,
}

impl SharedLineMaterial {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide holder.
    ///
    /// Holds at most one material for one backend at a time. Call
    /// [`shutdown`](Self::shutdown) before drawing through a different
    /// backend.
    pub fn global() -> Arc<SharedLineMaterial> {
        Arc::clone(&GLOBAL)
    }

    /// Return the cached material, or run `create` and cache its result.
    ///
    /// A cached id is returned as-is whatever backend the caller is about
    /// to draw with.
    ///
    /// The lock is held across `create`, so concurrent callers never
    /// allocate twice.
    ///
    /// # Errors
    ///
    /// Propagates the error from `create`. Nothing is cached on failure and
    /// the next call tries again.
    pub fn get_or_create<F>(&self, create: F) -> Result<MaterialId, RenderError>
    where
        F: FnOnce() -> Result<MaterialId, RenderError>,
    {
        let mut state = self.state.lock();
        if let Some(material) = state.material {
            return Ok(material);
        }
        let material = create()?;
        state.material = Some(material);
        state.creations += 1;
        tracing::debug!(
            material = material.0,
            creations = state.creations,
            "created shared line material"
        );
        Ok(material)
    }

    pub fn get(&self) -> Option<MaterialId> {
        self.state.lock().material
    }

    pub fn is_created(&self) -> bool {
        self.get().is_some()
    }

    /// Successful allocations over the holder's lifetime.
    pub fn creations(&self) -> u64 {
        self.state.lock().creations
    }

    /// Forget the cached material. The next draw allocates a new one on
    /// whichever backend it runs against. Returns the material that was
    /// cached, if any.
    pub fn shutdown(&self) -> Option<MaterialId> {
        let released = self.state.lock().material.take();
        if let Some(material) = released {
            tracing::debug!(material = material.0, "released shared line material");
        }
        released
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_once_and_caches() {
        let holder = SharedLineMaterial::new();
        let mut calls = 0;
        for _ in 0..3 {
            let id = holder
                .get_or_create(|| {
                    calls += 1;
                    Ok(MaterialId(7))
                })
                .unwrap();
            assert_eq!(id, MaterialId(7));
        }
        assert_eq!(calls, 1);
        assert_eq!(holder.creations(), 1);
        assert!(holder.is_created());
    }

    #[test]
    fn failure_caches_nothing() {
        let holder = SharedLineMaterial::new();
        let err = holder
            .get_or_create(|| {
                Err(RenderError::MaterialCreation {
                    label: "lines".to_owned(),
                    details: "no device".to_owned(),
                })
            })
            .unwrap_err();
        assert!(matches!(err, RenderError::MaterialCreation { .. }));
        assert!(!holder.is_created());
        assert_eq!(holder.creations(), 0);

        assert_eq!(holder.get_or_create(|| Ok(MaterialId(1))).unwrap(), MaterialId(1));
    }

    #[test]
    fn shutdown_allows_recreation() {
        let holder = SharedLineMaterial::new();
        holder.get_or_create(|| Ok(MaterialId(1))).unwrap();
        assert_eq!(holder.shutdown(), Some(MaterialId(1)));
        assert_eq!(holder.get(), None);
        assert_eq!(holder.shutdown(), None);

        holder.get_or_create(|| Ok(MaterialId(2))).unwrap();
        assert_eq!(holder.creations(), 2);
    }

    #[test]
    fn global_is_one_instance() {
        assert!(Arc::ptr_eq(&SharedLineMaterial::global(), &SharedLineMaterial::global()));
    }
}
