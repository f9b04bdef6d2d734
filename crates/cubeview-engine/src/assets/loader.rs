use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use crate::scene::{Node, SceneGraph, Texture};

use super::{load_gltf, load_image, resolve_url, AssetError};

/// What a URL is expected to contain.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ResourceKind {
    Image,
    Model,
}

/// A loaded resource.
#[derive(Debug, Clone)]
pub enum Resource {
    Image(Texture),
    Model(Node),
}

/// Identifies one request.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Ticket(u64);

impl Ticket {
    /// For loaders outside this crate that number their own requests.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One-shot scene mutation run when a load completes.
pub type Completion = Box<dyn FnOnce(&mut SceneGraph, Resource)>;

/// Asynchronous loader: "give me a resource by URL, eventually".
///
/// `request` never blocks. Completions are applied only from `pump`, which the
/// frame loop calls at a tick boundary. A failed load is logged and its
/// completion dropped; there is no timeout and no cancellation.
pub trait ResourceLoader {
    fn request(&mut self, url: &str, kind: ResourceKind, on_done: Completion) -> Ticket;

    /// Applies every completion that arrived since the last call; returns how many ran.
    fn pump(&mut self, scene: &mut SceneGraph) -> usize;

    /// Requests whose completion has not run yet.
    fn pending(&self) -> usize;
}

type Delivery = (Ticket, Result<Resource, AssetError>);

/// Loads each request on its own worker thread.
pub struct ThreadedLoader {
    root: PathBuf,
    next_ticket: u64,
    waiting: HashMap<Ticket, (String, Completion)>,
    tx: Sender<Delivery>,
    rx: Receiver<Delivery>,
}

impl ThreadedLoader {
    /// URLs resolve below `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            root: root.into(),
            next_ticket: 0,
            waiting: HashMap::new(),
            tx,
            rx,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn spawn(&self, ticket: Ticket, path: PathBuf, kind: ResourceKind) -> Result<(), AssetError> {
        let tx = self.tx.clone();
        thread::Builder::new()
            .name(format!("asset-loader-{}", ticket.0))
            .spawn(move || {
                let result = load(&path, kind);
                // Receiver gone means the loader was dropped; nothing to report to.
                let _ = tx.send((ticket, result));
            })
            .map(|_| ())
            .map_err(AssetError::Spawn)
    }
}

fn load(path: &Path, kind: ResourceKind) -> Result<Resource, AssetError> {
    match kind {
        ResourceKind::Image => load_image(path).map(Resource::Image),
        ResourceKind::Model => load_gltf(path).map(Resource::Model),
    }
}

impl ResourceLoader for ThreadedLoader {
    fn request(&mut self, url: &str, kind: ResourceKind, on_done: Completion) -> Ticket {
        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;

        let path = resolve_url(&self.root, url);
        log::debug!("load {ticket} {kind:?} {url} -> {}", path.display());

        match self.spawn(ticket, path, kind) {
            Ok(()) => {
                self.waiting.insert(ticket, (url.to_owned(), on_done));
            }
            Err(err) => log::warn!("load {ticket} {url} failed: {err}"),
        }
        ticket
    }

    fn pump(&mut self, scene: &mut SceneGraph) -> usize {
        let mut applied = 0;
        while let Ok((ticket, result)) = self.rx.try_recv() {
            let Some((url, on_done)) = self.waiting.remove(&ticket) else {
                continue;
            };
            match result {
                Ok(resource) => {
                    log::info!("loaded {url}");
                    on_done(scene, resource);
                    applied += 1;
                }
                Err(err) => log::warn!("failed to load {url}: {err}"),
            }
        }
        applied
    }

    fn pending(&self) -> usize {
        self.waiting.len()
    }
}
