//! Pseudo-terminal pairs.
//!
//! The "main" side is held by the control or bridge process; whoever holds
//! the "secondary" side sees an ordinary serial terminal.

use nix::fcntl::{fcntl, FcntlArg, FdFlag};
use nix::pty::openpty;
use nix::sys::termios::{tcgetattr, tcsetattr, LocalFlags, SetArg};
use nix::unistd::ttyname;
use std::fs::File;
use std::io;
use std::os::fd::{AsRawFd, OwnedFd};
use std::path::PathBuf;

/// A linked main/secondary pty pair.
#[derive(Debug)]
pub struct PtyPair {
    pub main: File,
    pub secondary: File,
    /// Device node of the secondary side, e.g. `/dev/pts/7`.
    pub secondary_path: PathBuf,
}

impl PtyPair {
    pub fn open() -> io::Result<Self> {
        let pty = openpty(None, None)?;
        let secondary_path = ttyname(&pty.slave)?;

        set_cloexec(&pty.master)?;
        set_cloexec(&pty.slave)?;
        set_raw(&pty.slave)?;

        Ok(Self {
            main: File::from(pty.master),
            secondary: File::from(pty.slave),
            secondary_path,
        })
    }
}

fn set_cloexec(fd: &OwnedFd) -> io::Result<()> {
    fcntl(fd.as_raw_fd(), FcntlArg::F_SETFD(FdFlag::FD_CLOEXEC))?;
    Ok(())
}

/// Disable echo on the secondary so bytes written to main are not reflected
/// back into the stream under test. Output post-processing (`\n` -> `\r\n`)
/// stays on, which is why pty-backed streams use a CRLF terminator.
fn set_raw(fd: &OwnedFd) -> io::Result<()> {
    let mut tio = tcgetattr(fd)?;
    tio.local_flags
        .remove(LocalFlags::ECHO | LocalFlags::ECHONL | LocalFlags::ICANON);
    tcsetattr(fd, SetArg::TCSANOW, &tio)?;
    Ok(())
}
