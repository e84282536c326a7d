// src/exec/signal.rs

use std::io;

use crate::types::ShutdownSignal;

/// Deliver `signal` to `pid`.
#[cfg(unix)]
pub fn send_signal(pid: u32, signal: ShutdownSignal) -> io::Result<()> {
    let pid = libc::pid_t::try_from(pid)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, format!("pid {pid} out of range")))?;

    // SAFETY: kill(2) takes plain integers and touches no memory of ours.
    let rc = unsafe { libc::kill(pid, signal.as_raw()) };
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

/// Deliver `signal` to `pid`. Only forced termination exists off unix, and
/// that goes through the child handle instead.
#[cfg(not(unix))]
pub fn send_signal(pid: u32, _signal: ShutdownSignal) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        format!("cannot signal pid {pid} on this platform"),
    ))
}

/// Raise the open-file limit so one poll task per directory does not run
/// out of descriptors on large trees. Errors are for the caller to log.
#[cfg(unix)]
pub fn raise_open_file_limit(limit: u64) -> io::Result<()> {
    let limit = limit as libc::rlim_t;
    let rlimit = libc::rlimit {
        rlim_cur: limit,
        rlim_max: limit,
    };
    // SAFETY: `rlimit` is a valid, fully initialised struct on our stack.
    let rc = unsafe { libc::setrlimit(libc::RLIMIT_NOFILE, &rlimit) };
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
pub fn raise_open_file_limit(_limit: u64) -> io::Result<()> {
    Ok(())
}
