// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Fixed-capacity operator registry.
//!
//! Binds each [`OpKind`] to at most one [`OpKernel`]. Capacity is fixed at
//! construction and lookup is a direct index into a slot table. Once the
//! registry is moved into a runner only shared references are handed out.

use crate::kernels::{ActivationKernel, OpKernel, ReshapeKernel, SoftmaxKernel};
use crate::RegistryError;
use model_ir::OpKind;

/// Maps operator kinds to kernels.
///
/// # Example
/// ```
/// use runtime::OpRegistry;
/// use model_ir::OpKind;
///
/// let mut registry = OpRegistry::new(2);
/// registry.add_tanh().unwrap();
/// registry.add_logistic().unwrap();
/// assert!(registry.add_softmax().is_err()); // full
/// assert!(registry.get(OpKind::Tanh).is_some());
/// ```
pub struct OpRegistry {
    capacity: usize,
    len: usize,
    slots: [Option<Box<dyn OpKernel>>; OpKind::COUNT],
}

impl OpRegistry {
    /// Creates an empty registry that accepts at most `capacity` kernels.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            len: 0,
            slots: std::array::from_fn(|_| None),
        }
    }

    /// A registry holding every built-in kernel.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new(4);
        registry.slots[OpKind::Tanh.index()] = Some(Box::new(ActivationKernel::tanh()));
        registry.slots[OpKind::Logistic.index()] = Some(Box::new(ActivationKernel::logistic()));
        registry.slots[OpKind::Softmax.index()] = Some(Box::new(SoftmaxKernel::new()));
        registry.slots[OpKind::Reshape.index()] = Some(Box::new(ReshapeKernel::new()));
        registry.len = 4;
        registry
    }

    /// Registers `kernel` under its own [`OpKernel::kind`].
    ///
    /// # Errors
    /// - [`RegistryError::Duplicate`] if the kind already has a kernel.
    /// - [`RegistryError::Full`] if every slot is taken.
    pub fn register<K: OpKernel + 'static>(&mut self, kernel: K) -> Result<(), RegistryError> {
        let kind = kernel.kind();
        let slot = &mut self.slots[kind.index()];
        if slot.is_some() {
            return Err(RegistryError::Duplicate { kind });
        }
        if self.len >= self.capacity {
            return Err(RegistryError::Full {
                capacity: self.capacity,
            });
        }
        *slot = Some(Box::new(kernel));
        self.len += 1;
        tracing::debug!("registered {kind} ({}/{})", self.len, self.capacity);
        Ok(())
    }

    pub fn add_tanh(&mut self) -> Result<(), RegistryError> {
        self.register(ActivationKernel::tanh())
    }

    pub fn add_logistic(&mut self) -> Result<(), RegistryError> {
        self.register(ActivationKernel::logistic())
    }

    pub fn add_softmax(&mut self) -> Result<(), RegistryError> {
        self.register(SoftmaxKernel::new())
    }

    pub fn add_reshape(&mut self) -> Result<(), RegistryError> {
        self.register(ReshapeKernel::new())
    }

    /// The kernel registered for `kind`, if any.
    pub fn get(&self, kind: OpKind) -> Option<&dyn OpKernel> {
        self.slots[kind.index()].as_deref()
    }

    pub fn contains(&self, kind: OpKind) -> bool {
        self.slots[kind.index()].is_some()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Registered kinds in slot order.
    pub fn kinds(&self) -> impl Iterator<Item = OpKind> + '_ {
        OpKind::ALL
            .into_iter()
            .filter(move |kind| self.contains(*kind))
    }
}

impl std::fmt::Debug for OpRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpRegistry")
            .field("capacity", &self.capacity)
            .field("kinds", &self.kinds().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let mut r = OpRegistry::new(4);
        assert!(r.is_empty());
        r.add_tanh().unwrap();
        r.add_softmax().unwrap();
        assert_eq!(r.len(), 2);
        assert_eq!(r.get(OpKind::Tanh).unwrap().kind(), OpKind::Tanh);
        assert_eq!(r.get(OpKind::Softmax).unwrap().kind(), OpKind::Softmax);
        assert!(r.get(OpKind::Logistic).is_none());
        assert!(r.get(OpKind::FullyConnected).is_none());
    }

    #[test]
    fn test_full() {
        let mut r = OpRegistry::new(2);
        r.add_tanh().unwrap();
        r.add_logistic().unwrap();
        assert_eq!(r.add_reshape(), Err(RegistryError::Full { capacity: 2 }));
        assert_eq!(r.len(), 2);
    }

    #[test]
    fn test_zero_capacity() {
        let mut r = OpRegistry::new(0);
        assert_eq!(r.add_tanh(), Err(RegistryError::Full { capacity: 0 }));
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut r = OpRegistry::new(4);
        r.add_logistic().unwrap();
        assert_eq!(
            r.add_logistic(),
            Err(RegistryError::Duplicate {
                kind: OpKind::Logistic
            })
        );
        assert_eq!(r.len(), 1);
    }

    #[test]
    fn test_builtins() {
        let r = OpRegistry::with_builtins();
        let kinds: Vec<_> = r.kinds().collect();
        assert_eq!(
            kinds,
            vec![OpKind::Tanh, OpKind::Logistic, OpKind::Softmax, OpKind::Reshape]
        );
        assert_eq!(r.len(), r.capacity());
    }

    #[test]
    fn test_debug_lists_kinds() {
        let mut r = OpRegistry::new(1);
        r.add_reshape().unwrap();
        let s = format!("{r:?}");
        assert!(s.contains("Reshape"));
    }
}
