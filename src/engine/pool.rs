//! Fixed pool of reusable signal-processing units.
//!
//! Every unit is built up front for the highest quality tier, so leasing never
//! allocates. The current quality level only moves the *logical* capacity:
//! how many slots may be leased at once.
//!
//! Handles carry a generation counter. Releasing bumps the generation, which
//! turns any copy of the old handle into a stale one: a second release, or a
//! release after the slot has been leased again, is detected and ignored.

use tracing::warn;

use crate::{config::PoolConfig, error::PoolExhausted, quality::QualityLevel};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Free,
    Leased,
}

/// Lease handle for one pool slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolSlot {
    index: u32,
    generation: u32,
}

impl PoolSlot {
    pub fn index(&self) -> usize {
        self.index as usize
    }
}

struct Slot<T> {
    state: SlotState,
    generation: u32,
    unit: T,
}

pub struct SignalNodePool<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    config: PoolConfig,
    capacity: usize,
}

impl<T> SignalNodePool<T> {
    pub fn new(config: &PoolConfig, quality: QualityLevel, mut make: impl FnMut() -> T) -> Self {
        let physical = config.high_capacity;
        let slots = (0..physical)
            .map(|_| Slot {
                state: SlotState::Free,
                generation: 0,
                unit: make(),
            })
            .collect();
        // Reversed so the lowest index is leased first.
        let free = (0..physical as u32).rev().collect();

        Self {
            slots,
            free,
            capacity: crate::quality::capacity_for(quality, config),
            config: config.clone(),
        }
    }

    pub fn lease(&mut self) -> Result<PoolSlot, PoolExhausted> {
        if self.leased() >= self.capacity {
            return Err(PoolExhausted {
                capacity: self.capacity,
            });
        }
        let index = self.free.pop().ok_or(PoolExhausted {
            capacity: self.capacity,
        })?;

        let slot = &mut self.slots[index as usize];
        debug_assert_eq!(slot.state, SlotState::Free);
        slot.state = SlotState::Leased;

        Ok(PoolSlot {
            index,
            generation: slot.generation,
        })
    }

    /// Return a slot. Releasing a stale or already-free handle is a logged
    /// no-op. Returns whether the slot was actually freed.
    pub fn release(&mut self, handle: PoolSlot) -> bool {
        let Some(slot) = self.slots.get_mut(handle.index()) else {
            warn!(index = handle.index, "release of unknown pool slot ignored");
            return false;
        };
        if slot.state == SlotState::Free || slot.generation != handle.generation {
            warn!(
                index = handle.index,
                generation = handle.generation,
                "double release of pool slot ignored"
            );
            return false;
        }

        slot.state = SlotState::Free;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        true
    }

    /// Exclusive access to the unit behind a live lease.
    pub fn get_mut(&mut self, handle: PoolSlot) -> Option<&mut T> {
        self.slots
            .get_mut(handle.index())
            .filter(|slot| slot.state == SlotState::Leased && slot.generation == handle.generation)
            .map(|slot| &mut slot.unit)
    }

    pub fn get(&self, handle: PoolSlot) -> Option<&T> {
        self.slots
            .get(handle.index())
            .filter(|slot| slot.state == SlotState::Leased && slot.generation == handle.generation)
            .map(|slot| &slot.unit)
    }

    pub fn is_leased(&self, handle: PoolSlot) -> bool {
        self.get(handle).is_some()
    }

    /// Adopt the capacity of a new quality level. Returns how many leases are
    /// now over capacity; the caller must retire that many voices.
    pub fn set_quality(&mut self, quality: QualityLevel) -> usize {
        self.capacity = crate::quality::capacity_for(quality, &self.config);
        self.leased().saturating_sub(self.capacity)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn leased(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn available(&self) -> usize {
        self.capacity.saturating_sub(self.leased())
    }

    pub fn state(&self, index: usize) -> Option<SlotState> {
        self.slots.get(index).map(|slot| slot.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(quality: QualityLevel) -> SignalNodePool<u32> {
        let mut n = 0;
        SignalNodePool::new(&PoolConfig::default(), quality, || {
            n += 1;
            n
        })
    }

    #[test]
    fn lease_stops_at_capacity() {
        let mut pool = pool(QualityLevel::Low);
        for _ in 0..8 {
            pool.lease().unwrap();
        }
        assert_eq!(pool.lease(), Err(PoolExhausted { capacity: 8 }));
        assert_eq!(pool.leased(), 8);
        assert_eq!(pool.available(), 0);
    }

    #[test]
    fn double_release_is_a_no_op() {
        let mut pool = pool(QualityLevel::Low);
        let slot = pool.lease().unwrap();

        assert!(pool.release(slot));
        assert!(!pool.release(slot));
        assert_eq!(pool.leased(), 0);
        assert_eq!(pool.available(), 8);
    }

    #[test]
    fn stale_handle_cannot_free_a_new_lease() {
        let mut pool = pool(QualityLevel::Low);
        let first = pool.lease().unwrap();
        pool.release(first);

        let second = pool.lease().unwrap();
        assert_eq!(first.index(), second.index());
        assert!(!pool.release(first));
        assert!(pool.is_leased(second));
        assert!(pool.get_mut(first).is_none());
    }

    #[test]
    fn downgrade_reports_excess_leases() {
        let mut pool = pool(QualityLevel::High);
        let slots: Vec<_> = (0..20).map(|_| pool.lease().unwrap()).collect();

        assert_eq!(pool.set_quality(QualityLevel::Medium), 4);
        assert!(pool.lease().is_err());

        for slot in &slots[..4] {
            pool.release(*slot);
        }
        assert_eq!(pool.set_quality(QualityLevel::Medium), 0);
        assert_eq!(pool.available(), 0);
    }

    #[test]
    fn units_are_built_once_and_reused() {
        let mut pool = pool(QualityLevel::High);
        let slot = pool.lease().unwrap();
        let id = *pool.get(slot).unwrap();
        pool.release(slot);
        let again = pool.lease().unwrap();
        assert_eq!(*pool.get(again).unwrap(), id);
    }
}
