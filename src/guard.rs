use std::{cell::Cell, rc::Rc};

/// Makes overlay activation idempotent: at most one [`Activation`] exists at a time.
#[derive(Debug, Clone, Default)]
pub struct InjectionGuard {
    active: Rc<Cell<bool>>,
}

impl InjectionGuard {
    #[cfg(test)]
    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    /// Returns `None` if an overlay is already active.
    pub fn try_activate(&self) -> Option<Activation> {
        if self.active.replace(true) {
            return None;
        }
        Some(Activation {
            active: self.active.clone(),
        })
    }
}

/// Proof that this overlay is the active one. Releasing or dropping it allows re-activation.
#[derive(Debug)]
pub struct Activation {
    active: Rc<Cell<bool>>,
}

impl Activation {
    pub fn release(self) {}
}

impl Drop for Activation {
    fn drop(&mut self) {
        self.active.set(false);
    }
}
