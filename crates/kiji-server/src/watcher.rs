//! Content directory watching for live reload.

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc as async_mpsc;

/// Events emitted by the file watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// A post file was created or modified
    PostChanged(PathBuf),

    /// A post file was removed
    PostRemoved(PathBuf),

    /// Any other file under the watched paths changed
    Other(PathBuf),
}

impl WatchEvent {
    pub fn path(&self) -> &Path {
        match self {
            Self::PostChanged(path) | Self::PostRemoved(path) | Self::Other(path) => path,
        }
    }
}

/// Watches directories and forwards changes to an async channel.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
}

impl FileWatcher {
    /// Create a new file watcher for the given paths.
    ///
    /// Paths that do not exist are skipped. Returns the watcher and a channel
    /// to receive events; events stop when the watcher is dropped.
    pub fn new(
        paths: &[PathBuf],
    ) -> Result<(Self, async_mpsc::Receiver<WatchEvent>), notify::Error> {
        let (sync_tx, sync_rx) = mpsc::channel();
        let (async_tx, async_rx) = async_mpsc::channel(100);

        let mut watcher = notify::recommended_watcher(move |res: Result<notify::Event, _>| {
            if let Ok(event) = res {
                let _ = sync_tx.send(event);
            }
        })?;

        for path in paths {
            if path.exists() {
                watcher.watch(path, RecursiveMode::Recursive)?;
            } else {
                tracing::warn!("Not watching {}: path does not exist", path.display());
            }
        }

        std::thread::spawn(move || {
            let debounce = Duration::from_millis(100);
            let mut last_sent: Option<Instant> = None;

            while let Ok(event) = sync_rx.recv() {
                // Editors emit bursts of events per save
                let now = Instant::now();
                if last_sent.is_some_and(|last| now.duration_since(last) < debounce) {
                    continue;
                }

                for path in event.paths {
                    if let Some(e) = classify_event(&path, &event.kind) {
                        last_sent = Some(now);
                        if async_tx.blocking_send(e).is_err() {
                            return;
                        }
                    }
                }
            }
        });

        Ok((Self { _watcher: watcher }, async_rx))
    }
}

fn is_post_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("mdx") | Some("md")
    )
}

/// Classify a notify event into a WatchEvent.
fn classify_event(path: &Path, kind: &notify::EventKind) -> Option<WatchEvent> {
    use notify::EventKind;

    let path = path.to_path_buf();

    match kind {
        EventKind::Create(_) | EventKind::Modify(_) if is_post_file(&path) => {
            Some(WatchEvent::PostChanged(path))
        }
        EventKind::Remove(_) if is_post_file(&path) => Some(WatchEvent::PostRemoved(path)),
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => {
            Some(WatchEvent::Other(path))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, ModifyKind, RemoveKind};
    use notify::EventKind;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn classifies_post_files() {
        let post = Path::new("content/2024/05/10_hello.mdx");

        assert_eq!(
            classify_event(post, &EventKind::Modify(ModifyKind::Any)),
            Some(WatchEvent::PostChanged(post.to_path_buf()))
        );
        assert_eq!(
            classify_event(post, &EventKind::Create(CreateKind::File)),
            Some(WatchEvent::PostChanged(post.to_path_buf()))
        );
        assert_eq!(
            classify_event(post, &EventKind::Remove(RemoveKind::File)),
            Some(WatchEvent::PostRemoved(post.to_path_buf()))
        );
    }

    #[test]
    fn classifies_other_files() {
        let image = Path::new("content/2024/05/diagram.png");

        assert_eq!(
            classify_event(image, &EventKind::Modify(ModifyKind::Any)),
            Some(WatchEvent::Other(image.to_path_buf()))
        );
        assert_eq!(classify_event(image, &EventKind::Access(AccessKind::Any)), None);
    }

    #[tokio::test]
    async fn watches_file_changes() {
        let temp = tempdir().unwrap();
        let test_file = temp.path().join("hello.mdx");

        let (watcher, mut rx) = FileWatcher::new(&[temp.path().to_path_buf()]).unwrap();

        // Give inotify time to set up
        tokio::time::sleep(Duration::from_millis(100)).await;

        fs::write(&test_file, "# Created").unwrap();

        let event = tokio::time::timeout(Duration::from_secs(3), rx.recv()).await;

        drop(watcher);

        assert!(event.is_ok(), "timeout waiting for file watch event");
        assert!(event.unwrap().is_some(), "channel should not be closed");
    }
}
