use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use super::{parse_model, ModelData};
use crate::error::AssetError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoadId(u64);

#[derive(Debug)]
pub enum LoadEvent {
    Progress { loaded: u64, total: Option<u64> },
    Loaded(Arc<ModelData>),
    Failed(AssetError),
}

impl LoadEvent {
    pub fn is_final(&self) -> bool {
        !matches!(self, Self::Progress { .. })
    }
}

#[derive(Debug)]
pub struct LoadMessage {
    pub id: LoadId,
    pub event: LoadEvent,
}

/// Sending half handed to whatever performs one load. Dropping it without
/// calling [`LoadReporter::finish`] reports the load as abandoned, so the
/// startup barrier can never wait on a loader that died.
pub struct LoadReporter {
    id: LoadId,
    path: PathBuf,
    sender: Sender<LoadMessage>,
    finished: bool,
}

impl LoadReporter {
    pub fn id(&self) -> LoadId {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn progress(&self, loaded: u64, total: Option<u64>) {
        self.send(LoadEvent::Progress { loaded, total });
    }

    pub fn finish(mut self, result: Result<ModelData, AssetError>) {
        self.finished = true;
        self.send(match result {
            Ok(model) => LoadEvent::Loaded(Arc::new(model)),
            Err(err) => LoadEvent::Failed(err),
        });
    }

    fn send(&self, event: LoadEvent) {
        // The loader side may already be gone; nobody is left to tell.
        let _ = self.sender.send(LoadMessage { id: self.id, event });
    }
}

impl Drop for LoadReporter {
    fn drop(&mut self) {
        if !self.finished {
            self.send(LoadEvent::Failed(AssetError::Abandoned(self.path.clone())));
        }
    }
}

/// Hands out load requests and collects their events on the frame thread.
pub struct AssetLoader {
    sender: Sender<LoadMessage>,
    receiver: Receiver<LoadMessage>,
    next_id: u64,
}

impl Default for AssetLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetLoader {
    const CHUNK_SIZE: usize = 64 * 1024;

    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            sender,
            receiver,
            next_id: 0,
        }
    }

    /// Starts a load driven by the caller (e.g. a browser fetch).
    pub fn reporter(&mut self, path: impl Into<PathBuf>) -> LoadReporter {
        let id = LoadId(self.next_id);
        self.next_id += 1;
        LoadReporter {
            id,
            path: path.into(),
            sender: self.sender.clone(),
            finished: false,
        }
    }

    /// Decodes bytes that are already in memory.
    pub fn load_bytes(&mut self, path: impl Into<PathBuf>, bytes: &[u8]) -> LoadId {
        let reporter = self.reporter(path);
        let id = reporter.id();
        let total = bytes.len() as u64;
        reporter.progress(total, Some(total));
        let result = parse_model(reporter.path(), bytes);
        reporter.finish(result);
        id
    }

    /// Reads and decodes a file on a worker thread, reporting progress per chunk.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_file(&mut self, path: impl Into<PathBuf>) -> LoadId {
        let reporter = self.reporter(path);
        let id = reporter.id();
        let name = format!("load {}", reporter.path().display());

        let spawned = std::thread::Builder::new().name(name).spawn(move || {
            let result = read_with_progress(&reporter).and_then(|bytes| parse_model(reporter.path(), &bytes));
            reporter.finish(result);
        });

        if let Err(err) = spawned {
            // The closure (and its reporter) is dropped, which reports the
            // load as abandoned.
            log::error!("could not start loader thread: {err}");
        }
        id
    }

    /// Drains every event received so far without blocking.
    pub fn poll(&self) -> Vec<LoadMessage> {
        self.receiver.try_iter().collect()
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn read_with_progress(reporter: &LoadReporter) -> Result<Vec<u8>, AssetError> {
    use std::io::Read;

    let path = reporter.path();
    let io_err = |source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut file = std::fs::File::open(path).map_err(io_err)?;
    let total = file.metadata().ok().map(|m| m.len());
    let mut bytes = Vec::with_capacity(total.unwrap_or(0) as usize);
    let mut chunk = vec![0u8; AssetLoader::CHUNK_SIZE];

    loop {
        let n = file.read(&mut chunk).map_err(io_err)?;
        if n == 0 {
            break;
        }
        bytes.extend_from_slice(&chunk[..n]);
        reporter.progress(bytes.len() as u64, total);
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::tests::triangle_gltf;
    use std::time::{Duration, Instant};

    fn wait_for_final(loader: &AssetLoader, id: LoadId) -> Vec<LoadMessage> {
        let deadline = Instant::now() + Duration::from_secs(10);
        let mut seen = Vec::new();
        while Instant::now() < deadline {
            seen.extend(loader.poll());
            if seen.iter().any(|m| m.id == id && m.event.is_final()) {
                return seen;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        panic!("load {id:?} never finished");
    }

    #[test]
    fn load_bytes_reports_progress_then_model() {
        let mut loader = AssetLoader::new();
        let id = loader.load_bytes("triangle.gltf", &triangle_gltf());

        let messages = loader.poll();
        assert_eq!(messages.len(), 2);
        assert!(messages.iter().all(|m| m.id == id));
        assert!(matches!(messages[0].event, LoadEvent::Progress { .. }));
        assert!(matches!(messages[1].event, LoadEvent::Loaded(_)));
    }

    #[test]
    fn dropped_reporter_reports_abandoned() {
        let mut loader = AssetLoader::new();
        let reporter = loader.reporter("egg.glb");
        let id = reporter.id();
        drop(reporter);

        let messages = loader.poll();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].id, id);
        assert!(matches!(messages[0].event, LoadEvent::Failed(AssetError::Abandoned(_))));
    }

    #[test]
    fn file_load_runs_in_background() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("triangle.gltf");
        std::fs::write(&path, triangle_gltf()).unwrap();

        let mut loader = AssetLoader::new();
        let id = loader.load_file(&path);
        let messages = wait_for_final(&loader, id);

        assert!(messages.iter().any(|m| matches!(m.event, LoadEvent::Progress { total: Some(_), .. })));
        assert!(matches!(messages.last().unwrap().event, LoadEvent::Loaded(_)));
    }

    #[test]
    fn missing_file_fails_with_io_error() {
        let mut loader = AssetLoader::new();
        let id = loader.load_file("/no/such/redroom.glb");
        let messages = wait_for_final(&loader, id);
        assert!(matches!(messages.last().unwrap().event, LoadEvent::Failed(AssetError::Io { .. })));
    }
}
