/*
 * SPDX-FileCopyrightText: 2025 Inria
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! A concurrent fixed-size block allocator.
//!
//! [`BlockAllocator`] hands out blocks of a fixed size chosen at
//! construction. Each worker owns a cache-line-padded free list indexed by
//! [`worker_id`](crate::utils::worker_id); a global stack holds chained
//! lists of [`LIST_LENGTH`](BlockAllocator::DEFAULT_LIST_LENGTH) blocks.
//! Allocation pops the local list, refilling it from the global stack or,
//! failing that, by carving a fresh slab; freeing pushes locally and, once
//! the local list doubles, returns its upper half to the global stack, so
//! both operations are amortized constant time and almost always touch
//! worker-private state.
//!
//! The number of blocks ever carved is monotone and capped (by default at
//! three quarters of physical memory); exceeding the cap is a fatal error.
//! Dropping the allocator returns every slab to the process allocator.

use crate::utils::{total_memory, worker_id};
use rayon::prelude::*;
use std::alloc::{alloc, dealloc, handle_alloc_error, Layout};
use std::marker::PhantomData;
use std::mem::MaybeUninit;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Slab alignment and padding, in bytes.
const PAD: usize = 256;

struct Block {
    next: *mut Block,
}

struct LocalList {
    size: usize,
    head: *mut Block,
    /// The midpoint marked when the list outgrows one list length; the
    /// chain past it is severed once the list doubles.
    mid: *mut Block,
}

/// One free list per worker, padded to avoid false sharing. The mutex is
/// uncontended under the worker-id discipline; it also keeps stray threads
/// (or oversized pools) safe at the cost of contention instead of races.
#[repr(align(128))]
struct PaddedList(Mutex<LocalList>);

pub struct BlockAllocator {
    block_size: usize,
    list_length: usize,
    max_blocks: usize,
    blocks_allocated: AtomicUsize,
    /// Heads of free lists of exactly `list_length` chained blocks.
    global_stack: Mutex<Vec<*mut Block>>,
    /// Slabs to return to the process allocator on drop.
    pool_roots: Mutex<Vec<(*mut u8, Layout)>>,
    local_lists: Box<[PaddedList]>,
}

// SAFETY: the raw pointers are either private chain links into slabs owned
// by the allocator or slab roots; all shared state is behind mutexes or
// atomics.
unsafe impl Send for BlockAllocator {}
unsafe impl Sync for BlockAllocator {}

impl BlockAllocator {
    /// The default length of the chained lists exchanged with the global
    /// stack.
    pub const DEFAULT_LIST_LENGTH: usize = 1 << 16;

    /// Creates an allocator for blocks of `block_size` bytes with the
    /// default list length and memory cap.
    ///
    /// `block_size` must be a nonzero multiple of the pointer size (blocks
    /// double as free-list links).
    pub fn new(block_size: usize) -> Self {
        Self::with_config(block_size, Self::DEFAULT_LIST_LENGTH, None)
    }

    /// Creates an allocator with an explicit list length and block cap;
    /// with `max_blocks == None` the cap defaults to three quarters of
    /// physical memory divided by the block size.
    pub fn with_config(block_size: usize, list_length: usize, max_blocks: Option<usize>) -> Self {
        let ptr_size = std::mem::size_of::<*mut u8>();
        assert!(
            block_size >= ptr_size && block_size % ptr_size == 0,
            "block size must be a nonzero multiple of {ptr_size}"
        );
        assert!(list_length >= 2);
        let workers = std::thread::available_parallelism()
            .map(usize::from)
            .unwrap_or(1)
            .max(rayon::current_num_threads())
            + 1;
        let max_blocks = max_blocks.unwrap_or_else(|| total_memory() / block_size / 4 * 3);
        BlockAllocator {
            block_size,
            list_length,
            max_blocks,
            blocks_allocated: AtomicUsize::new(0),
            global_stack: Mutex::new(Vec::new()),
            pool_roots: Mutex::new(Vec::new()),
            local_lists: (0..workers)
                .map(|_| {
                    PaddedList(Mutex::new(LocalList {
                        size: 0,
                        head: std::ptr::null_mut(),
                        mid: std::ptr::null_mut(),
                    }))
                })
                .collect(),
        }
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// The number of blocks ever carved from the process allocator
    /// (monotone).
    pub fn num_allocated_blocks(&self) -> usize {
        self.blocks_allocated.load(Ordering::Relaxed)
    }

    /// The number of blocks currently handed out.
    pub fn num_used_blocks(&self) -> usize {
        let free_global = self.global_stack.lock().unwrap().len() * self.list_length;
        let free_local: usize = self
            .local_lists
            .iter()
            .map(|l| l.0.lock().unwrap().size)
            .sum();
        self.num_allocated_blocks() - free_global - free_local
    }

    #[inline]
    fn local(&self) -> &PaddedList {
        &self.local_lists[worker_id().min(self.local_lists.len() - 1)]
    }

    /// Pops a block, refilling the worker's list from the global stack or
    /// a fresh slab if needed.
    ///
    /// # Panics
    ///
    /// Panics when the block cap would be exceeded.
    pub fn alloc(&self) -> NonNull<u8> {
        let mut list = self.local().0.lock().unwrap();
        if list.size == 0 {
            list.head = self.get_list();
            list.size = self.list_length;
        }
        list.size -= 1;
        let block = list.head;
        // SAFETY: blocks on free lists always carry a valid chain link.
        list.head = unsafe { (*block).next };
        unsafe { NonNull::new_unchecked(block.cast()) }
    }

    /// Pushes a block back onto the worker's list; once the list holds two
    /// list lengths, its upper half moves to the global stack.
    ///
    /// The pointer must come from [`alloc`](Self::alloc) on this allocator
    /// and not have been freed since.
    pub fn free(&self, ptr: NonNull<u8>) {
        let block: *mut Block = ptr.as_ptr().cast();
        let mut list = self.local().0.lock().unwrap();
        if list.size == self.list_length + 1 {
            list.mid = list.head;
        } else if list.size == 2 * self.list_length {
            // SAFETY: `mid` was set when the list outgrew one list length
            // and the chain below it has not been popped since (sizes only
            // returned to `list_length` through this branch).
            unsafe {
                self.global_stack.lock().unwrap().push((*list.mid).next);
                (*list.mid).next = std::ptr::null_mut();
            }
            list.size = self.list_length;
        }
        // SAFETY: the block is exclusively ours again.
        unsafe {
            (*block).next = list.head;
        }
        list.head = block;
        list.size += 1;
    }

    /// Pre-allocates enough lists for `n` blocks (plus one list per
    /// worker), chaining them in parallel.
    pub fn reserve(&self, n: usize) {
        let num_lists = n.div_ceil(self.list_length) + self.local_lists.len();
        let start = self.allocate_blocks(num_lists * self.list_length) as usize;
        (0..num_lists).into_par_iter().for_each(|i| {
            let offset = (start + i * self.list_length * self.block_size) as *mut u8;
            // SAFETY: each task chains a disjoint range of the fresh slab.
            let head = unsafe { self.initialize_list(offset) };
            self.global_stack.lock().unwrap().push(head);
        });
    }

    /// Lends one block as typed scratch space, returned on drop.
    ///
    /// The block size must be a multiple of the alignment of `T`.
    pub fn scratch<T>(&self) -> Scratch<'_, T> {
        assert!(self.block_size % std::mem::align_of::<T>() == 0);
        Scratch {
            allocator: self,
            ptr: self.alloc(),
            capacity: self.block_size / std::mem::size_of::<T>(),
            _marker: PhantomData,
        }
    }

    fn get_list(&self) -> *mut Block {
        if let Some(head) = self.global_stack.lock().unwrap().pop() {
            return head;
        }
        let start = self.allocate_blocks(self.list_length);
        // SAFETY: the slab is fresh and sized for a full list.
        unsafe { self.initialize_list(start) }
    }

    /// Chains `list_length` consecutive blocks starting at `start`.
    unsafe fn initialize_list(&self, start: *mut u8) -> *mut Block {
        let mut block: *mut Block = start.cast();
        for _ in 0..self.list_length - 1 {
            let next: *mut Block = block.cast::<u8>().add(self.block_size).cast();
            (*block).next = next;
            block = next;
        }
        (*block).next = std::ptr::null_mut();
        start.cast()
    }

    fn allocate_blocks(&self, num_blocks: usize) -> *mut u8 {
        let layout =
            Layout::from_size_align(num_blocks * self.block_size + PAD, PAD).unwrap();
        // SAFETY: the layout has nonzero size.
        let start = unsafe { alloc(layout) };
        if start.is_null() {
            handle_alloc_error(layout);
        }
        let allocated = self.blocks_allocated.fetch_add(num_blocks, Ordering::Relaxed) + num_blocks;
        assert!(
            allocated <= self.max_blocks,
            "too many blocks in BlockAllocator ({allocated} > {})",
            self.max_blocks
        );
        log::debug!(
            "carved a slab of {num_blocks} blocks of {} bytes ({allocated} total)",
            self.block_size
        );
        self.pool_roots.lock().unwrap().push((start, layout));
        start
    }
}

impl Drop for BlockAllocator {
    fn drop(&mut self) {
        for (ptr, layout) in self.pool_roots.lock().unwrap().drain(..) {
            // SAFETY: each root was allocated with exactly this layout and
            // is freed once.
            unsafe { dealloc(ptr, layout) };
        }
    }
}

/// A block lent by [`BlockAllocator::scratch`], usable as uninitialized
/// typed storage; returns the block on drop.
pub struct Scratch<'a, T> {
    allocator: &'a BlockAllocator,
    ptr: NonNull<u8>,
    capacity: usize,
    _marker: PhantomData<T>,
}

impl<T> Scratch<'_, T> {
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn as_uninit_mut(&mut self) -> &mut [MaybeUninit<T>] {
        // SAFETY: the block is exclusively lent to this guard, properly
        // aligned (checked at creation) and large enough for `capacity`
        // elements.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr().cast(), self.capacity) }
    }
}

impl<T> Drop for Scratch<'_, T> {
    fn drop(&mut self) {
        self.allocator.free(self.ptr);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conservation() {
        let allocator = BlockAllocator::with_config(64, 8, None);
        let blocks: Vec<_> = (0..20).map(|_| allocator.alloc()).collect();
        assert_eq!(allocator.num_used_blocks(), 20);
        let allocated = allocator.num_allocated_blocks();
        for block in blocks {
            allocator.free(block);
        }
        assert_eq!(allocator.num_used_blocks(), 0);
        // allocation count is monotone
        assert_eq!(allocator.num_allocated_blocks(), allocated);
    }

    #[test]
    fn test_local_list_split() {
        let allocator = BlockAllocator::with_config(64, 4, None);
        // grow the local list to twice the list length to force a split
        let blocks: Vec<_> = (0..32).map(|_| allocator.alloc()).collect();
        for block in blocks {
            allocator.free(block);
        }
        assert_eq!(allocator.num_used_blocks(), 0);
        // and everything is still allocatable afterwards
        let blocks: Vec<_> = (0..32).map(|_| allocator.alloc()).collect();
        assert_eq!(allocator.num_used_blocks(), 32);
        for block in blocks {
            allocator.free(block);
        }
    }

    #[test]
    fn test_reserve() {
        let allocator = BlockAllocator::with_config(64, 8, None);
        allocator.reserve(100);
        let reserved = allocator.num_allocated_blocks();
        assert!(reserved >= 100);
        let blocks: Vec<_> = (0..100).map(|_| allocator.alloc()).collect();
        // reserve covered all of these
        assert_eq!(allocator.num_allocated_blocks(), reserved);
        for block in blocks {
            allocator.free(block);
        }
    }

    #[test]
    fn test_parallel_alloc_free() {
        let allocator = BlockAllocator::with_config(64, 16, None);
        let pool = crate::thread_pool![4];
        pool.install(|| {
            (0..1000).into_par_iter().for_each(|_| {
                let a = allocator.alloc();
                let b = allocator.alloc();
                allocator.free(a);
                allocator.free(b);
            });
        });
        assert_eq!(allocator.num_used_blocks(), 0);
    }

    #[test]
    fn test_scratch() {
        let allocator = BlockAllocator::with_config(1024, 8, None);
        {
            let mut scratch = allocator.scratch::<(u32, u32)>();
            assert_eq!(scratch.capacity(), 128);
            let buf = scratch.as_uninit_mut();
            buf[0].write((1, 2));
            assert_eq!(allocator.num_used_blocks(), 1);
        }
        assert_eq!(allocator.num_used_blocks(), 0);
    }

    #[test]
    #[should_panic(expected = "too many blocks")]
    fn test_cap() {
        let allocator = BlockAllocator::with_config(64, 8, Some(4));
        let _ = allocator.alloc();
    }
}
