//! Allocation Tracking
//!
//! A global allocator wrapper that keeps per-thread allocation counters.
//! Counters are thread-local so a run measured on one worker thread is not
//! disturbed by allocations made concurrently on sibling workers.
//!
//! Install it in the benchmark binary:
//!
//! ```ignore
//! #[global_allocator]
//! static GLOBAL: pixbench_core::TrackingAllocator = pixbench_core::TrackingAllocator;
//! ```

use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::Cell;
use std::sync::atomic::{AtomicBool, Ordering};

static INSTALLED: AtomicBool = AtomicBool::new(false);

thread_local! {
    static NET_BYTES: Cell<i64> = const { Cell::new(0) };
    static ALLOC_COUNT: Cell<u64> = const { Cell::new(0) };
}

/// Global allocator that records net bytes and allocation count per thread
pub struct TrackingAllocator;

#[inline]
fn record(bytes: i64, allocations: u64) {
    if !INSTALLED.load(Ordering::Relaxed) {
        INSTALLED.store(true, Ordering::Relaxed);
    }
    // try_with: the allocator can run while thread-locals are being torn down
    let _ = NET_BYTES.try_with(|net| net.set(net.get().wrapping_add(bytes)));
    if allocations > 0 {
        let _ = ALLOC_COUNT.try_with(|count| count.set(count.get() + allocations));
    }
}

unsafe impl GlobalAlloc for TrackingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc(layout) };
        if !ptr.is_null() {
            record(layout.size() as i64, 1);
        }
        ptr
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc_zeroed(layout) };
        if !ptr.is_null() {
            record(layout.size() as i64, 1);
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) };
        record(-(layout.size() as i64), 0);
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = unsafe { System.realloc(ptr, layout, new_size) };
        if !new_ptr.is_null() {
            record(new_size as i64 - layout.size() as i64, 1);
        }
        new_ptr
    }
}

/// Whether [`TrackingAllocator`] is serving allocations in this process
pub fn is_tracking() -> bool {
    INSTALLED.load(Ordering::Relaxed)
}

/// Reset the current thread's counters
pub fn reset_allocation_counter() {
    let _ = NET_BYTES.try_with(|net| net.set(0));
    let _ = ALLOC_COUNT.try_with(|count| count.set(0));
}

/// Net bytes allocated and allocation count on the current thread since the last reset
///
/// Net bytes go negative when the thread frees more than it allocated.
pub fn current_allocation() -> (i64, u64) {
    let net = NET_BYTES.try_with(Cell::get).unwrap_or(0);
    let count = ALLOC_COUNT.try_with(Cell::get).unwrap_or(0);
    (net, count)
}
