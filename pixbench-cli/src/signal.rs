//! Interrupt Handling
//!
//! SIGINT and SIGTERM set a process-wide flag that [`CancellationFlag`]s
//! created with signal watching observe. The handler resets itself, so a
//! second Ctrl-C terminates the process as usual.
//!
//! [`CancellationFlag`]: crate::CancellationFlag

use std::sync::atomic::{AtomicBool, Ordering};

/// Global flag set by the signal handler
static INTERRUPT_REQUESTED: AtomicBool = AtomicBool::new(false);

/// Check if an interrupt has been received
pub fn interrupt_requested() -> bool {
    INTERRUPT_REQUESTED.load(Ordering::Relaxed)
}

/// Install SIGINT/SIGTERM handlers that set the interrupt flag.
/// The handler is async-signal-safe (only sets an atomic).
#[cfg(unix)]
pub fn install_interrupt_handler() {
    unsafe {
        let mut sa: libc::sigaction = std::mem::zeroed();
        sa.sa_sigaction = interrupt_handler as *const () as usize;
        sa.sa_flags = libc::SA_RESTART | libc::SA_RESETHAND;
        libc::sigemptyset(&mut sa.sa_mask);
        libc::sigaction(libc::SIGINT, &sa, std::ptr::null_mut());
        libc::sigaction(libc::SIGTERM, &sa, std::ptr::null_mut());
    }
}

#[cfg(unix)]
extern "C" fn interrupt_handler(_sig: libc::c_int) {
    INTERRUPT_REQUESTED.store(true, Ordering::Relaxed);
}

/// No-op on non-Unix.
#[cfg(not(unix))]
pub fn install_interrupt_handler() {}
