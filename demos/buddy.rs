use std::io::Read;

use ballocator::{BuddyAllocator, HEADER_SIZE, RANK_MIN, rank};

/// Waits until the user presses ENTER.
/// Useful when you want to inspect memory state with tools like `pmap`,
/// `htop`, `gdb`, or just follow the free lists reshaping step by step.
fn block_until_enter_pressed() {
  println!("\n>>> Press ENTER to continue...");
  let _ = std::io::stdin().bytes().next();
}

/// Prints the rank a request of `size` bytes would occupy, header
/// included.
fn print_rank_probe(size: usize) {
  println!(
    "rank!({size}) = {:2}, with header: rank!({size} + {HEADER_SIZE}) = {:2}",
    rank!(size),
    rank!(size + HEADER_SIZE),
  );
}

fn main() {
  // A 64 KiB backing region from the C heap. The allocator never
  // acquires memory on its own; whoever creates it brings the region.
  let size = 1usize << 16;
  let region = unsafe { libc::malloc(size) }.cast::<u8>();
  assert!(!region.is_null());

  let mut allocator =
    unsafe { BuddyAllocator::new(region, size) }.expect("64 KiB is an admissible region");

  // --------------------------------------------------------------------
  // 1) How request sizes map to size classes.
  // --------------------------------------------------------------------
  println!("[1] Size class samples (RANK_MIN = {RANK_MIN}, nothing smaller is served):\n");
  for sample in [0, 1, 100, 4096 - HEADER_SIZE, 4096, 60000] {
    print_rank_probe(sample);
  }

  unsafe {
    println!("\n[1] Freshly created allocator, one block spanning the region:");
    allocator.dump();
    block_until_enter_pressed();

    // ------------------------------------------------------------------
    // 2) A small allocation splits the region all the way down.
    // ------------------------------------------------------------------
    let first = allocator.allocate(100);
    println!("\n[2] allocate(100) = {first:?}");
    first.write(0xAB);
    println!("[2] One byte written and read back: 0x{:X}", first.read());
    println!("[2] One buddy parked at every rank on the way down:");
    allocator.dump();
    block_until_enter_pressed();

    // ------------------------------------------------------------------
    // 3) A second allocation of the same class reuses a parked buddy.
    // ------------------------------------------------------------------
    let second = allocator.allocate(100);
    println!("\n[3] allocate(100) = {second:?}");
    println!(
      "[3] Distance from the first block: {} bytes (one minimum-class block)",
      (second as usize) - (first as usize),
    );
    allocator.dump();
    block_until_enter_pressed();

    // ------------------------------------------------------------------
    // 4) Releasing both merges everything back into one block.
    // ------------------------------------------------------------------
    allocator.deallocate(first);
    println!("\n[4] After releasing the first block:");
    allocator.dump();

    allocator.deallocate(second);
    println!("\n[4] After releasing the second one as well:");
    allocator.dump();
    block_until_enter_pressed();

    // ------------------------------------------------------------------
    // 5) The whole capacity in a single request.
    // ------------------------------------------------------------------
    let capacity = allocator.capacity_max();
    let everything = allocator.allocate(capacity);
    println!("\n[5] allocate(capacity_max() = {capacity}) = {everything:?}");
    allocator.dump();

    allocator.deallocate(everything);
    println!("\n[5] And back to a single free block:");
    allocator.dump();
  }

  // The allocator only abandons its bookkeeping; the region is ours to
  // return.
  drop(allocator);
  unsafe { libc::free(region.cast()) };

  println!("\n[6] End of demo. Region returned to the C heap.");
}
