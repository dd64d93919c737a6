//! Single-instance supervision through a PID file in the runtime directory.
//!
//! Starting a surface while another copy runs closes the old one, so a
//! single key binding toggles the launcher. A running grid daemon is told to
//! rebuild its index with SIGUSR1.

use crate::error::{Error, Result};
use log::{info, warn};
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Removes the PID file when dropped, unless a newer instance has taken it over.
#[derive(Debug)]
pub struct InstanceGuard {
    path: PathBuf,
}

impl InstanceGuard {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InstanceGuard {
    fn drop(&mut self) {
        match read_pid(&self.path) {
            Ok(Some(pid)) if pid == Pid::this() => {
                let _ = fs::remove_file(&self.path);
            }
            _ => info!("Leaving {:?} to its current owner", self.path),
        }
    }
}

fn read_pid(path: &Path) -> Result<Option<Pid>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(Error::io(path, e)),
    };
    match content.trim().parse::<i32>() {
        Ok(pid) if pid > 0 => Ok(Some(Pid::from_raw(pid))),
        _ => Err(Error::InvalidPid(path.to_path_buf())),
    }
}

pub fn is_alive(pid: Pid) -> bool {
    kill(pid, None).is_ok()
}

/// Terminates a previous instance named in `path`, then records this process.
pub fn register(path: &Path) -> Result<InstanceGuard> {
    let own = Pid::this();
    match read_pid(path) {
        Ok(Some(pid)) if pid != own && is_alive(pid) => {
            info!("Closing running instance {}", pid);
            kill(pid, Signal::SIGTERM)?;
        }
        Ok(_) => {}
        Err(e) => warn!("Overwriting stale pid file: {}", e),
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    fs::write(path, own.to_string()).map_err(|e| Error::io(path, e))?;
    Ok(InstanceGuard { path: path.to_path_buf() })
}

/// Asks the daemon named in `path` to rebuild its index.
pub fn send_refresh(path: &Path) -> Result<()> {
    let pid = read_pid(path)?.ok_or_else(|| Error::NotRunning(path.to_path_buf()))?;
    if !is_alive(pid) {
        return Err(Error::NotRunning(path.to_path_buf()));
    }
    kill(pid, Signal::SIGUSR1)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::process::ExitStatusExt;
    use std::process::{Child, Command};

    fn sleeper() -> Child {
        Command::new("sleep").arg("30").spawn().unwrap()
    }

    #[test]
    fn register_writes_pid_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run").join("grid.pid");
        {
            let guard = register(&path).unwrap();
            assert_eq!(guard.path(), path);
            assert_eq!(fs::read_to_string(&path).unwrap(), std::process::id().to_string());
        }
        assert!(!path.exists());
    }

    #[test]
    fn guard_keeps_pid_file_of_successor() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.pid");
        let guard = register(&path).unwrap();
        fs::write(&path, "999999").unwrap();

        drop(guard);
        assert_eq!(fs::read_to_string(&path).unwrap(), "999999");
    }

    #[test]
    fn register_terminates_previous_instance() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.pid");
        let mut other = sleeper();
        fs::write(&path, other.id().to_string()).unwrap();

        let _guard = register(&path).unwrap();
        let status = other.wait().unwrap();
        assert_eq!(status.signal(), Some(Signal::SIGTERM as i32));
    }

    #[test]
    fn register_overwrites_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.pid");
        fs::write(&path, "not a pid").unwrap();
        let _guard = register(&path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), std::process::id().to_string());
    }

    #[test]
    fn refresh_delivers_sigusr1() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.pid");
        let mut daemon = sleeper();
        fs::write(&path, daemon.id().to_string()).unwrap();

        send_refresh(&path).unwrap();
        let status = daemon.wait().unwrap();
        assert_eq!(status.signal(), Some(Signal::SIGUSR1 as i32));
    }

    #[test]
    fn refresh_without_daemon_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.pid");
        assert!(matches!(send_refresh(&path), Err(Error::NotRunning(_))));

        fs::write(&path, "-4").unwrap();
        assert!(matches!(send_refresh(&path), Err(Error::InvalidPid(_))));
    }
}
