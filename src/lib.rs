//! # ballocator - A Binary Buddy Memory Allocator Library
//!
//! This crate provides a **binary buddy allocator**: a sub-allocator that
//! manages a single caller-provided region of raw memory, serving
//! variable-size requests out of power-of-two-sized blocks.
//!
//! ## Overview
//!
//! The buddy technique keeps fragmentation predictable by only ever
//! dealing in power-of-two block sizes:
//!
//! ```text
//!   Buddy Allocator Concept (one 64 KiB region):
//!
//!   ┌───────────────────────────────────────────────────────────────┐
//!   │                     BACKING REGION (2^16)                     │
//!   │                                                               │
//!   │   ┌───────────────────────────────┬───────────────────────┐   │
//!   │   │            2^15               │         2^15          │   │
//!   │   ├───────────────┬───────────────┤                       │   │
//!   │   │     2^14      │     2^14      │         free          │   │
//!   │   ├───────┬───────┤               │                       │   │
//!   │   │ 2^13  │ 2^13  │     free      │                       │   │
//!   │   │ busy  │ free  │               │                       │   │
//!   │   └───────┴───────┴───────────────┴───────────────────────┘   │
//!   │                                                               │
//!   └───────────────────────────────────────────────────────────────┘
//!
//!   Splitting halves a free block on demand; releasing re-merges a
//!   block with its "buddy" (the other half of the same split) as far
//!   up as it will go.
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   ballocator
//!   ├── rank       - rank! macro: ceil-log2 size classes
//!   ├── dlist      - intrusive doubly linked list (free-list primitive)
//!   ├── block      - per-block header and buddy address arithmetic
//!   └── buddy      - BuddyAllocator: bucketed split/coalesce engine
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ballocator::BuddyAllocator;
//!
//! fn main() {
//!     // Any power-of-two region between 2^12 and 2^32 bytes works;
//!     // here it comes from the C heap.
//!     let size = 1usize << 16;
//!     let region = unsafe { libc::malloc(size) }.cast::<u8>();
//!
//!     let mut allocator = unsafe { BuddyAllocator::new(region, size) }.unwrap();
//!
//!     unsafe {
//!         let ptr = allocator.allocate(100);
//!         assert!(!ptr.is_null());
//!
//!         // Use the memory...
//!         ptr.write(42);
//!
//!         allocator.deallocate(ptr);
//!     }
//!
//!     drop(allocator);
//!     unsafe { libc::free(region.cast()) };
//! }
//! ```
//!
//! ## How It Works
//!
//! Every block starts with a small header recording its size class
//! (**rank**: a rank `R` block spans `2^R` bytes, header included) and
//! whether it is busy. Free blocks of one rank are chained into an
//! intrusive list, so the bookkeeping lives entirely inside the free
//! memory itself:
//!
//! ```text
//!   Free block of rank R:                Busy block of rank R:
//!   ┌────────┬────────────────┐          ┌────────┬────────────────┐
//!   │ header │  (unused)      │          │ header │  user payload  │
//!   │ + link │                │          │ links  │                │
//!   │ fields │                │          │ parked │                │
//!   └────────┴────────────────┘          └────────┴────────────────┘
//!      ▲  ▲                                       ▲
//!      │  └── threaded into the rank-R            └── pointer the
//!      │      free list                               caller holds
//!      └───── rank + busy flag stay valid either way
//! ```
//!
//! Allocation finds the smallest rank fitting `size + header`, splitting
//! a larger free block when that rank's list is empty. Release walks the
//! other way, fusing freed blocks with their buddies back into larger
//! ones. Buddy addresses fall out of XOR arithmetic on the block's
//! offset, so neither direction ever searches.
//!
//! ## Features
//!
//! - **No hidden allocation**: all metadata lives in the managed region;
//!   the allocator itself is a plain value the embedder owns.
//! - **Bounded operations**: splitting and merging touch at most one
//!   block per size class.
//! - **Predictable fragmentation**: rounding to powers of two bounds the
//!   waste per block at half the block plus the header.
//!
//! ## Limitations
//!
//! - **Single-threaded only**: no internal synchronization; wrap the
//!   whole allocator in a lock to share it.
//! - **No arbitrary alignment**: payloads are aligned past the header
//!   and no further; layouts demanding more are not honored.
//! - **Power-of-two regions only**: the backing region's size must be an
//!   exact power of two between `2^RANK_MIN` and `2^RANK_MAX` bytes.
//! - **No in-place resize**: a block is released whole or not at all.
//!
//! ## Safety
//!
//! This crate is inherently unsafe as it deals with raw memory
//! management. The allocator trusts the caller on two fronts: the
//! backing region must outlive the allocator, and released pointers
//! must have come from [`BuddyAllocator::allocate`] and never be used
//! again afterwards.

pub mod rank;

mod block;
mod buddy;
mod dlist;

pub use block::{HEADER_SIZE, Header};
pub use buddy::{BuddyAllocator, CAPACITY_MAX, RANK_MAX, RANK_MIN, RANK_RANGE};
pub use dlist::{DList, DNode};
