use std::ops::{Deref, DerefMut};

use log::warn;

use crate::api::CanvasState;
use crate::error::Result;

/// Saves the canvas state on creation and restores it on drop, so every exit
/// path (including `?`) leaves the save stack at its previous depth.
pub struct StateGuard<'c, C: CanvasState + ?Sized> {
    ctx: &'c mut C,
}

impl<'c, C: CanvasState + ?Sized> StateGuard<'c, C> {
    pub fn new(ctx: &'c mut C) -> Result<Self> {
        ctx.save()?;
        Ok(Self { ctx })
    }
}

impl<C: CanvasState + ?Sized> Deref for StateGuard<'_, C> {
    type Target = C;

    fn deref(&self) -> &C {
        self.ctx
    }
}

impl<C: CanvasState + ?Sized> DerefMut for StateGuard<'_, C> {
    fn deref_mut(&mut self) -> &mut C {
        self.ctx
    }
}

impl<C: CanvasState + ?Sized> Drop for StateGuard<'_, C> {
    fn drop(&mut self) {
        if let Err(err) = self.ctx.restore() {
            warn!("failed to restore canvas state: {err}");
        }
    }
}
