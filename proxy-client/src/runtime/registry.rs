/********************************************************************************
 * Copyright (c) 2024 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! Generation-checked arena backing client handles.

use std::fmt::{Display, Formatter};

/// Opaque token naming one live client.
///
/// A handle stays distinct from every handle issued after it: freeing a slot bumps
/// its generation, so a stale handle never resolves to the slot's next occupant.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct ClientHandle {
    index: u32,
    generation: u32,
}

impl ClientHandle {
    /// Packs the handle into a `u64` for callers that can only carry integers.
    /// Zero is never a valid raw handle.
    pub fn to_raw(self) -> u64 {
        (u64::from(self.generation) << 32) | u64::from(self.index)
    }

    pub fn from_raw(raw: u64) -> Option<Self> {
        let generation = (raw >> 32) as u32;
        if generation == 0 {
            return None;
        }
        Some(Self {
            index: raw as u32,
            generation,
        })
    }
}

impl Display for ClientHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

pub(crate) struct HandleRegistry<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    live: usize,
}

impl<T> Default for HandleRegistry<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
        }
    }
}

impl<T> HandleRegistry<T> {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, value: T) -> ClientHandle {
        self.live += 1;

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            return ClientHandle {
                index,
                generation: slot.generation,
            };
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 1,
            value: Some(value),
        });
        ClientHandle {
            index,
            generation: 1,
        }
    }

    pub(crate) fn get(&self, handle: ClientHandle) -> Option<&T> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.value.as_ref())
    }

    /// Frees the slot behind `handle`. Removing a stale handle is a no-op.
    pub(crate) fn remove(&mut self, handle: ClientHandle) -> Option<T> {
        let slot = self
            .slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)?;
        let value = slot.value.take()?;

        // A slot whose generation would wrap is retired instead of reused.
        match slot.generation.checked_add(1) {
            Some(next) => {
                slot.generation = next;
                self.free.push(handle.index);
            }
            None => slot.generation = 0,
        }
        self.live -= 1;
        Some(value)
    }

    pub(crate) fn len(&self) -> usize {
        self.live
    }

    pub(crate) fn drain(&mut self) -> Vec<(ClientHandle, T)> {
        let handles: Vec<ClientHandle> = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.value.is_some())
            .map(|(index, slot)| ClientHandle {
                index: index as u32,
                generation: slot.generation,
            })
            .collect();

        handles
            .into_iter()
            .filter_map(|handle| self.remove(handle).map(|value| (handle, value)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{ClientHandle, HandleRegistry};

    #[test]
    fn stale_handle_does_not_resolve_to_reused_slot() {
        let mut registry = HandleRegistry::new();
        let first = registry.insert("first");
        assert_eq!(registry.remove(first), Some("first"));

        let second = registry.insert("second");

        assert_ne!(first, second);
        assert_eq!(registry.get(first), None);
        assert_eq!(registry.remove(first), None);
        assert_eq!(registry.get(second), Some(&"second"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn raw_round_trip_and_zero_is_invalid() {
        let mut registry = HandleRegistry::new();
        registry.insert(());
        let handle = registry.insert(());

        assert_eq!(ClientHandle::from_raw(handle.to_raw()), Some(handle));
        assert_eq!(ClientHandle::from_raw(0), None);
        assert_ne!(handle.to_raw(), 0);
    }

    #[test]
    fn drain_removes_every_live_value() {
        let mut registry = HandleRegistry::new();
        let a = registry.insert('a');
        let b = registry.insert('b');
        registry.insert('c');
        registry.remove(b);

        let drained = registry.drain();

        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0], (a, 'a'));
        assert_eq!(registry.len(), 0);
        assert_eq!(registry.get(a), None);
    }
}
