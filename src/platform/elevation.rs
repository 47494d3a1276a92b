/// Whether the current process can perform privileged hardware access.
#[cfg(unix)]
pub fn is_elevated() -> bool {
    // On Unix, check if running as root
    unsafe { libc::geteuid() == 0 }
}

#[cfg(not(unix))]
pub fn is_elevated() -> bool {
    false
}

/// Hint shown when an operation fails for lack of privilege.
pub fn elevation_hint() -> &'static str {
    if cfg!(unix) {
        "Try running this program as root (e.g. with sudo)."
    } else {
        "Try running this program as Administrator."
    }
}
