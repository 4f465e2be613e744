/// Driver event log - records every call the engine makes into the headless driver
///
/// The log is shared between the driver and the content objects it creates,
/// so uploads and destructions are recorded even after the driver is gone.
/// It also keeps the set of live content ids, which lets tests check that
/// the engine releases what it creates.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use glam::Mat4;
use orbit_engine::orbit::device::ContentId;
use orbit_engine::orbit::render::Primitive;
use orbit_engine::orbit::Rect;
use rustc_hash::FxHashMap;
use winit::dpi::PhysicalSize;

/// Kind of backend content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    VertexBuffer,
    IndexBuffer,
    Shader,
    Texture,
    ConstantBuffer,
    RenderBuffer,
}

/// State captured for one draw call
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRecord {
    pub primitive: Primitive,
    pub shader: ContentId,
    pub vertices: ContentId,
    pub vertex_count: usize,
    /// Index buffer and index count
    pub indices: Option<(ContentId, usize)>,
    /// Texture bound to each unit at draw time
    pub textures: Vec<Option<ContentId>>,
    /// Render buffer drawn into, None for the screen
    pub render_target: Option<ContentId>,
    pub projection: Mat4,
    pub modelview: Mat4,
}

/// One recorded driver call
#[derive(Debug, Clone, PartialEq)]
pub enum DriverEvent {
    Init { resolution: PhysicalSize<u32> },
    Resize(PhysicalSize<u32>),
    BeginFrame(u64),
    EndFrame(u64),
    Created { kind: ContentKind, id: ContentId },
    Uploaded { kind: ContentKind, id: ContentId, bytes: usize },
    Destroyed { kind: ContentKind, id: ContentId },
    SetProjection(Mat4),
    SetModelview(Mat4),
    BindShader(Option<ContentId>),
    BindConstantBuffer { shader: ContentId, slot: usize, buffer: ContentId },
    BindTexture { unit: usize, texture: Option<ContentId> },
    DisableTextureUnits(usize),
    BindRenderTarget { target: Option<ContentId>, viewport: Rect },
    Draw(DrawRecord),
}

#[derive(Debug, Default)]
struct LogState {
    events: Vec<DriverEvent>,
    live: FxHashMap<ContentId, ContentKind>,
}

/// Shared, cloneable handle on a driver event log
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    state: Arc<Mutex<LogState>>,
    recorded: Arc<AtomicU64>,
    next_id: Arc<AtomicU64>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, LogState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Allocate a content id, unique across every driver sharing this log
    pub(crate) fn next_id(&self) -> ContentId {
        ContentId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1)
    }

    pub(crate) fn record(&self, event: DriverEvent) {
        #[cfg(feature = "trace-events")]
        orbit_engine::engine_trace!("orbit::headless", "{:?}", event);

        let mut state = self.state();
        match &event {
            DriverEvent::Created { kind, id } => {
                state.live.insert(*id, *kind);
            }
            DriverEvent::Destroyed { id, .. } => {
                state.live.remove(id);
            }
            _ => {}
        }
        state.events.push(event);
        self.recorded.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy of every event recorded since the last `clear`
    pub fn events(&self) -> Vec<DriverEvent> {
        self.state().events.clone()
    }

    /// Number of recorded events matching `predicate`
    pub fn count(&self, predicate: impl Fn(&DriverEvent) -> bool) -> usize {
        self.state().events.iter().filter(|event| predicate(event)).count()
    }

    pub fn draws(&self) -> Vec<DrawRecord> {
        self.state()
            .events
            .iter()
            .filter_map(|event| match event {
                DriverEvent::Draw(record) => Some(record.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of `kind` contents created and not yet destroyed
    pub fn live_count(&self, kind: ContentKind) -> usize {
        self.state().live.values().filter(|live| **live == kind).count()
    }

    pub fn live_total(&self) -> usize {
        self.state().live.len()
    }

    /// Number of uploads of `kind` content
    pub fn uploads(&self, kind: ContentKind) -> usize {
        self.count(|event| matches!(event, DriverEvent::Uploaded { kind: k, .. } if *k == kind))
    }

    /// Total events recorded over the log's lifetime, `clear` included
    pub fn total_recorded(&self) -> u64 {
        self.recorded.load(Ordering::Relaxed)
    }

    /// Forget recorded events; live contents are kept
    pub fn clear(&self) {
        self.state().events.clear();
    }
}
