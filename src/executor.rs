use crate::error::{Error, Result};
use crate::store::usage::UsageCache;
use log::{debug, warn};
use std::path::Path;
use std::process::{Command, Stdio};

/// Hands a shell command to the system without waiting for it.
pub trait Spawn {
    fn spawn(&self, command: &str) -> Result<()>;
}

/// Runs commands through `sh`, backgrounded so the launcher never waits on them.
pub struct ShellSpawner;

impl Spawn for ShellSpawner {
    fn spawn(&self, command: &str) -> Result<()> {
        if command.trim().is_empty() {
            return Ok(());
        }
        // The intermediate shell exits right away; reaping it keeps a
        // long-lived daemon free of zombies.
        let mut child = Command::new("sh")
            .arg("-c")
            .arg(format!("{command} &"))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| Error::io("sh", e))?;
        child.wait().map_err(|e| Error::io("sh", e))?;
        Ok(())
    }
}

/// Counts the launch, persists the cache and spawns `exec`. A failed save is
/// only logged; the launch goes ahead.
pub fn launch(exec: &str, cache: &mut UsageCache, cache_path: &Path, spawner: &dyn Spawn) -> Result<()> {
    let clicks = cache.increment(exec);
    debug!("Launching {:?} (clicks: {})", exec, clicks);
    if let Err(e) = cache.save(cache_path) {
        warn!("Failed to save usage cache: {}", e);
    }
    spawner.spawn(exec)
}
