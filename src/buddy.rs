//! # Binary Buddy Allocator
//!
//! A sub-allocator that carves one caller-provided, contiguous,
//! power-of-two-sized region of raw memory into power-of-two-sized
//! blocks, and merges freed blocks back with their "buddies" to
//! reconstitute larger blocks.
//!
//! ## How It Works
//!
//! Every block size is a power of two. The exponent is called the
//! block's **rank**: a block of rank `R` spans `2^R` bytes, its
//! metadata header included. Free blocks of equal rank are threaded
//! into one intrusive list per rank, the rank's **bucket**:
//!
//! ```text
//!   BuddyAllocator
//!   ┌──────────────────────────┐
//!   │ base, region_rank        │
//!   │ buckets:                 │
//!   │   rank 12 ──► [blk]──►[blk]──►[blk]     (4 KiB frees)
//!   │   rank 13 ──► (empty)                   (8 KiB frees)
//!   │   rank 14 ──► [blk]                     (16 KiB frees)
//!   │   ...                    │
//!   │   rank 31 ──► (empty)    │
//!   └──────────────────────────┘
//! ```
//!
//! ### Allocation (split on demand)
//!
//! A request for `n` bytes needs a block of rank `r = rank!(n + header)`.
//! If the rank-`r` bucket is empty, a block is requested one rank up and
//! cut in half; the lower half is returned, the upper half (its buddy)
//! becomes a fresh free block of rank `r`:
//!
//! ```text
//!   request rank 12, bucket 12 empty, bucket 14 has a block:
//!
//!   rank 14:  ┌───────────────────────────────┐
//!             │                               │
//!             └───────────────────────────────┘
//!   rank 13:  ┌───────────────┬───────────────┐
//!             │    taken      │  freed buddy  │──► bucket 13
//!             └───────────────┴───────────────┘
//!   rank 12:  ┌───────┬───────┐
//!             │ taken │ buddy │──► bucket 12
//!             └───────┴───────┘
//!                 ▲
//!                 └── handed to the caller
//! ```
//!
//! ### Release (coalesce on the way up)
//!
//! Releasing a block looks up its buddy by address arithmetic. When the
//! buddy is free and still of the same rank, the pair fuses into the
//! lower-addressed half, one rank up, and the test repeats there. The
//! merge chain stops at the first busy or differently-sized buddy, or
//! when the block grows back into the whole region.
//!
//! ### Finding the buddy
//!
//! Both halves of a rank `R+1` parent lie at offsets that differ only
//! in the bit `2^R`, so the buddy of a block is found by XOR-ing its
//! offset from the region base with `1 << R`. No search, no extra
//! tables.
//!
//! ## Trade-offs
//!
//! - **Bounded fragmentation**: a request never wastes more than half
//!   of the block serving it (plus the header).
//! - **Fast coalescing**: merging is pointer arithmetic plus a list
//!   unlink per rank, at most one per size class.
//! - **Internal fragmentation**: every size is rounded up to a power of
//!   two, and nothing smaller than `2^RANK_MIN` is ever handed out.
//!
//! ## Safety
//!
//! The allocator trusts the caller for the backing region and for the
//! pointers passed back to [`BuddyAllocator::deallocate`]. It never
//! reads the link fields of a busy block; while a block is handed out,
//! only its rank and busy flag stay authoritative.

use std::cmp;
use std::ptr;

use crate::block::{self, HEADER_SIZE, Header};
use crate::dlist::DList;

/// Smallest block class the allocator will manage: `2^RANK_MIN` bytes.
pub const RANK_MIN: u32 = 12;

/// Number of size classes above [`RANK_MIN`].
pub const RANK_RANGE: u32 = 20;

/// Largest admissible backing-region rank.
pub const RANK_MAX: u32 = RANK_MIN + RANK_RANGE;

/// Upper bound on a single request; anything at or above this cannot
/// gain a header without wrapping around `usize`.
pub const CAPACITY_MAX: usize = usize::MAX - HEADER_SIZE;

/// One bucket per rank in `RANK_MIN..=RANK_MAX`.
const BUCKET_COUNT: usize = RANK_RANGE as usize + 1;

// The smallest block must be able to carry a header.
const _: () = assert!(HEADER_SIZE <= 1 << RANK_MIN);

/// Bucket index of a rank.
fn bucket(rank: u32) -> usize {
  (rank - RANK_MIN) as usize
}

/// A binary buddy allocator over a borrowed backing region.
///
/// The allocator owns its bookkeeping only. The backing region is
/// borrowed for the allocator's lifetime and is simply abandoned when
/// the allocator is dropped; the caller reclaims it afterwards.
///
/// # Thread Safety
///
/// This allocator is **NOT** thread-safe. For multi-threaded usage,
/// external synchronization (e.g., a `Mutex` around the whole
/// allocator) is required.
pub struct BuddyAllocator {
  /// Base address of the backing region. Buddy address arithmetic is
  /// relative to this pointer.
  base: *mut u8,

  /// Rank of the backing region; the region spans `2^region_rank`
  /// bytes.
  region_rank: u32,

  /// Free lists, one per rank. `buckets[rank - RANK_MIN]` holds
  /// exactly the free blocks of that rank.
  buckets: [DList<Header>; BUCKET_COUNT],
}

impl BuddyAllocator {
  /// Creates an allocator over the region `base..base + size`.
  ///
  /// The region immediately becomes one single free block spanning all
  /// of it.
  ///
  /// # Returns
  ///
  /// `None` when any of the following holds:
  /// - `base` is null or not aligned for the block header,
  /// - `size` is not a power of two,
  /// - the rank of `size` falls outside `RANK_MIN..=RANK_MAX`.
  ///
  /// # Safety
  ///
  /// `base` must be valid for reads and writes of `size` bytes for the
  /// whole lifetime of the allocator, and nothing else may touch that
  /// memory while the allocator is alive.
  pub unsafe fn new(
    base: *mut u8,
    size: usize,
  ) -> Option<Self> {
    if base.is_null() {
      return None;
    }
    if (base as usize) % align_of::<Header>() != 0 {
      return None;
    }
    if !size.is_power_of_two() {
      return None;
    }

    let region_rank = crate::rank!(size);
    if !(RANK_MIN..=RANK_MAX).contains(&region_rank) {
      return None;
    }

    let mut allocator = Self {
      base,
      region_rank,
      buckets: [const { DList::new() }; BUCKET_COUNT],
    };

    // Seed the buckets through the regular release path so the initial
    // state is indistinguishable from a fully drained allocator.
    unsafe {
      let whole = Header::emplace(base, region_rank);
      allocator.push_chunk(whole);
    }

    Some(allocator)
  }

  /// The largest payload this allocator can ever serve: the whole
  /// region minus one header. Constant for the allocator's lifetime.
  pub fn capacity_max(&self) -> usize {
    (1usize << self.region_rank) - HEADER_SIZE
  }

  /// Allocates `size` usable bytes.
  ///
  /// Requests smaller than the minimum class (including `size == 0`)
  /// are served from the minimum class; the caller pays the rounding.
  ///
  /// # Returns
  ///
  /// A pointer to `size` usable bytes just past the block's header, or
  /// null when no free block of a sufficient rank exists or the request
  /// can never fit the region.
  ///
  /// # Safety
  ///
  /// The backing region handed to [`BuddyAllocator::new`] must still be
  /// valid.
  pub unsafe fn allocate(
    &mut self,
    size: usize,
  ) -> *mut u8 {
    if size >= CAPACITY_MAX {
      return ptr::null_mut();
    }

    let mut want = crate::rank!(size + HEADER_SIZE);
    if want > self.region_rank {
      return ptr::null_mut();
    }
    if want < RANK_MIN {
      want = RANK_MIN;
    }

    unsafe {
      let chunk = self.pop_chunk(want);

      block::user_part(chunk)
    }
  }

  /// Releases a pointer previously returned by
  /// [`BuddyAllocator::allocate`], merging the freed block with its
  /// buddy as far up as possible.
  ///
  /// Null is ignored, matching `free(NULL)`. A pointer whose header is
  /// not marked busy is also ignored, which silently swallows double
  /// releases.
  ///
  /// # Safety
  ///
  /// `address` must be null or a pointer obtained from this allocator
  /// that the caller will not touch again.
  pub unsafe fn deallocate(
    &mut self,
    address: *mut u8,
  ) {
    if address.is_null() {
      return;
    }

    unsafe {
      let chunk = block::header_part(address);
      if !(*chunk).is_busy() {
        return;
      }

      self.push_chunk(chunk);
    }
  }

  /// Prints the allocator geometry and the population of every
  /// non-empty bucket.
  ///
  /// # Safety
  ///
  /// The backing region must still be valid; the bucket walk reads the
  /// free blocks' link fields.
  pub unsafe fn dump(&self) {
    println!(
      "<BuddyAllocator> base = {:?}, region rank = {}, capacity = {} bytes",
      self.base,
      self.region_rank,
      self.capacity_max(),
    );

    for rank in RANK_MIN..=self.region_rank {
      let free = unsafe { self.buckets[bucket(rank)].len() };
      if free > 0 {
        println!(" rank {:2} ({:>10} bytes) : {} free", rank, 1usize << rank, free);
      }
    }
  }

  /// Produces a free block of exactly `rank`, splitting larger blocks
  /// on the way down as needed. The returned block is already marked
  /// busy; null means no block of this or any higher rank is free.
  ///
  /// Splitting keeps the lower-addressed half and donates the upper
  /// half (the buddy) to the bucket one rank below the parent:
  ///
  /// ```text
  ///   pop(R) with empty bucket R:
  ///     parent = pop(R + 1)            (recursion, at most RANK_RANGE deep)
  ///     parent.rank = R                (parent shrinks to its lower half)
  ///     buddy  = parent offset ^ 2^R   (upper half, fresh header)
  ///     bucket[R].push_front(buddy)
  ///     return parent
  /// ```
  unsafe fn pop_chunk(
    &mut self,
    rank: u32,
  ) -> *mut Header {
    if rank < RANK_MIN || rank > self.region_rank {
      return ptr::null_mut();
    }

    unsafe {
      let chunk = self.buckets[bucket(rank)].pop_front();
      if !chunk.is_null() {
        (*chunk).set_busy(true);
        return chunk;
      }

      let chunk = self.pop_chunk(rank + 1);
      if chunk.is_null() {
        return chunk;
      }

      (*chunk).set_rank(rank);

      let buddy = block::buddy_of(self.base, self.region_rank, chunk);
      let buddy = Header::emplace(buddy.cast::<u8>(), rank);
      self.buckets[bucket(rank)].push_front(buddy);

      chunk
    }
  }

  /// Returns `chunk` to the free lists, coalescing with its buddy as
  /// long as the buddy is free and of the same rank.
  ///
  /// A buddy of a different rank is itself split into smaller pieces,
  /// or already absorbed into a larger span rooted at a lower address;
  /// either way it cannot merge at this rank. The fused pair is rooted
  /// at the lower-addressed half and re-released one rank up, at most
  /// `RANK_RANGE` times.
  unsafe fn push_chunk(
    &mut self,
    chunk: *mut Header,
  ) {
    unsafe {
      let rank = (*chunk).rank();
      let buddy = block::buddy_of(self.base, self.region_rank, chunk);

      if !buddy.is_null() && !(*buddy).is_busy() && (*buddy).rank() == rank {
        self.buckets[bucket(rank)].remove(buddy);

        let merged = cmp::min(chunk, buddy);
        (*merged).set_rank(rank + 1);

        self.push_chunk(merged);
      } else {
        (*chunk).set_busy(false);
        self.buckets[bucket(rank)].push_front(chunk);
      }
    }
  }
}
