//! Allocator capability consumed by the engine.
//!
//! The engine asks for every byte buffer it creates through an
//! [`Allocator`] and hands back every buffer it discards. Node and
//! child-list storage is ordinary Rust ownership and does not pass through
//! here.
//!
//! Two implementations ship with the crate:
//!
//! - [`SystemAllocator`] - the global heap, with fallible reservation
//! - [`BudgetAllocator`] - a fixed byte budget with live accounting, used to
//!   exercise allocation failure paths

use std::cell::Cell;

use crate::error::{ErrorCode, JsonResult};

/// Byte-buffer allocation capability.
pub trait Allocator {
    /// Obtain an empty buffer able to hold at least `size` bytes.
    fn allocate(&self, size: usize) -> JsonResult<Vec<u8>>;

    /// Return a buffer previously obtained from [`Allocator::allocate`].
    fn release(&self, buffer: Vec<u8>);
}

impl<A: Allocator + ?Sized> Allocator for &A {
    fn allocate(&self, size: usize) -> JsonResult<Vec<u8>> {
        (**self).allocate(size)
    }

    fn release(&self, buffer: Vec<u8>) {
        (**self).release(buffer)
    }
}

/// The global heap.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemAllocator;

impl Allocator for SystemAllocator {
    fn allocate(&self, size: usize) -> JsonResult<Vec<u8>> {
        let mut buffer = Vec::new();
        buffer.try_reserve_exact(size).map_err(|_| {
            log::warn!("system allocation of {size} bytes failed");
            ErrorCode::E300_AllocationFailed(size)
        })?;
        Ok(buffer)
    }

    fn release(&self, buffer: Vec<u8>) {
        drop(buffer);
    }
}

/// Allocator with a fixed byte budget.
///
/// Each buffer is charged at its capacity and refunded on release, so
/// `outstanding()` returns to zero once everything the engine allocated has
/// been given back.
#[derive(Debug)]
pub struct BudgetAllocator {
    capacity: usize,
    in_use: Cell<usize>,
    live: Cell<usize>,
    allocations: Cell<usize>,
    releases: Cell<usize>,
}

impl BudgetAllocator {
    /// Create an allocator that serves at most `capacity` bytes at once.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            in_use: Cell::new(0),
            live: Cell::new(0),
            allocations: Cell::new(0),
            releases: Cell::new(0),
        }
    }

    /// Bytes currently handed out.
    pub fn outstanding(&self) -> usize {
        self.in_use.get()
    }

    /// Buffers currently handed out.
    pub fn live_buffers(&self) -> usize {
        self.live.get()
    }

    /// Total successful allocations.
    pub fn allocations(&self) -> usize {
        self.allocations.get()
    }

    /// Total releases.
    pub fn releases(&self) -> usize {
        self.releases.get()
    }

    /// Bytes still available.
    pub fn remaining(&self) -> usize {
        self.capacity.saturating_sub(self.in_use.get())
    }
}

impl Allocator for BudgetAllocator {
    fn allocate(&self, size: usize) -> JsonResult<Vec<u8>> {
        if size > self.remaining() {
            log::warn!(
                "budget allocation of {size} bytes refused ({} of {} in use)",
                self.in_use.get(),
                self.capacity
            );
            return Err(ErrorCode::E300_AllocationFailed(size));
        }
        let buffer = SystemAllocator.allocate(size)?;
        // Charged by capacity so the refund in `release` matches exactly.
        self.in_use.set(self.in_use.get() + buffer.capacity());
        self.live.set(self.live.get() + 1);
        self.allocations.set(self.allocations.get() + 1);
        Ok(buffer)
    }

    fn release(&self, buffer: Vec<u8>) {
        self.in_use
            .set(self.in_use.get().saturating_sub(buffer.capacity()));
        self.live.set(self.live.get().saturating_sub(1));
        self.releases.set(self.releases.get() + 1);
    }
}
