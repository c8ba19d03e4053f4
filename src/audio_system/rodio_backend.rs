//! Rodio channel backend
//!
//! Each channel owns at most one `Sink` on a shared output stream. Clip bytes
//! are read once and cached by clip name, then decoded fresh on every play.
use std::collections::HashMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};

use super::catalog::ClipRef;
use super::channel::{Channel, ChannelId, ChannelPool, SpatialParams};
use super::fade::unit_volume;
use crate::error::PoolError;

type ClipCache = Arc<Mutex<HashMap<String, Arc<Vec<u8>>>>>;

/// Channel backed by a rodio sink
pub struct RodioChannel {
    id: ChannelId,
    group: String,
    handle: OutputStreamHandle,
    cache: ClipCache,
    clip_root: PathBuf,
    sink: Option<Sink>,
    data: Option<Arc<Vec<u8>>>,
    looping: bool,
    volume: f32,
    pitch: f32,
    priority: u16,
    start_offset: Duration,
    spatial_blend: f32,
    spatial: SpatialParams,
}

impl RodioChannel {
    fn load(&self, clip: &ClipRef) -> Option<Arc<Vec<u8>>> {
        if let Some(data) = self.cache.lock().get(&clip.name) {
            return Some(Arc::clone(data));
        }

        let path = clip
            .path
            .clone()
            .unwrap_or_else(|| self.clip_root.join(&clip.name));
        match std::fs::read(&path) {
            Ok(bytes) => {
                let data = Arc::new(bytes);
                self.cache
                    .lock()
                    .insert(clip.name.clone(), Arc::clone(&data));
                tracing::debug!("Loaded clip {} from {}", clip.name, path.display());
                Some(data)
            }
            Err(e) => {
                tracing::warn!("Failed to read clip {} ({}): {}", clip.name, path.display(), e);
                None
            }
        }
    }

    fn build_source(&self, data: &Arc<Vec<u8>>) -> Option<Box<dyn Source<Item = i16> + Send>> {
        let cursor = Cursor::new((**data).clone());
        let decoder = match Decoder::new(cursor) {
            Ok(decoder) => decoder,
            Err(e) => {
                tracing::warn!("Failed to decode clip on {}: {}", self.id, e);
                return None;
            }
        };

        let source = decoder.skip_duration(self.start_offset);
        let source: Box<dyn Source<Item = i16> + Send> = if self.looping {
            Box::new(source.buffered().repeat_infinite())
        } else {
            Box::new(source)
        };
        Some(source)
    }
}

impl Channel for RodioChannel {
    fn id(&self) -> ChannelId {
        self.id
    }

    fn set_clip(&mut self, clip: &ClipRef) {
        self.data = self.load(clip);
    }

    fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = unit_volume(volume);
        if let Some(sink) = &self.sink {
            sink.set_volume(self.volume);
        }
    }

    fn set_pitch(&mut self, pitch: f32) {
        self.pitch = pitch;
        if let Some(sink) = &self.sink {
            sink.set_speed(pitch);
        }
    }

    fn set_priority(&mut self, priority: u16) {
        self.priority = priority;
    }

    fn set_start_offset(&mut self, offset: Duration) {
        self.start_offset = offset;
    }

    fn set_spatial_blend(&mut self, blend: f32) {
        self.spatial_blend = blend.clamp(0.0, 1.0);
    }

    fn set_position(&mut self, position: [f32; 3]) {
        self.spatial.position = position;
    }

    fn set_distances(&mut self, min_distance: f32, max_distance: f32) {
        self.spatial =
            SpatialParams::at(self.spatial.position).with_distances(min_distance, max_distance);
    }

    fn play(&mut self) {
        self.stop();

        let Some(data) = self.data.clone() else {
            tracing::warn!("No clip loaded on {}", self.id);
            return;
        };
        let Some(source) = self.build_source(&data) else {
            return;
        };

        let sink = match Sink::try_new(&self.handle) {
            Ok(sink) => sink,
            Err(e) => {
                tracing::error!("Failed to create sink for {}: {}", self.id, e);
                return;
            }
        };
        sink.set_volume(self.volume);
        sink.set_speed(self.pitch);
        sink.append(source);
        sink.play();

        tracing::debug!(
            "{} playing (priority={}, blend={:.1}, looping={})",
            self.id,
            self.priority,
            self.spatial_blend,
            self.looping
        );
        self.sink = Some(sink);
    }

    fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }

    fn pause(&mut self) {
        if let Some(sink) = &self.sink {
            sink.pause();
        }
    }

    fn resume(&mut self) {
        if let Some(sink) = &self.sink {
            sink.play();
        }
    }

    fn is_playing(&self) -> bool {
        self.sink
            .as_ref()
            .map(|sink| !sink.empty() && !sink.is_paused())
            .unwrap_or(false)
    }
}

/// Pool of rodio channels on the default output device
///
/// Not `Send`: the output stream must stay on the thread that opened it.
pub struct RodioPool {
    _stream: OutputStream,
    handle: OutputStreamHandle,
    cache: ClipCache,
    clip_root: PathBuf,
    idle: HashMap<String, Vec<ChannelId>>,
    next_id: u64,
}

impl RodioPool {
    /// Open the default output device; clips without a path resolve under
    /// `clip_root`
    pub fn new(clip_root: impl AsRef<Path>) -> Result<Self, PoolError> {
        let (stream, handle) =
            OutputStream::try_default().map_err(|e| PoolError::StreamInitFailed(Box::new(e)))?;
        tracing::info!("Opened default audio output");

        Ok(Self {
            _stream: stream,
            handle,
            cache: Arc::new(Mutex::new(HashMap::new())),
            clip_root: clip_root.as_ref().to_path_buf(),
            idle: HashMap::new(),
            next_id: 0,
        })
    }

    /// Number of cached clips
    pub fn cached_clips(&self) -> usize {
        self.cache.lock().len()
    }
}

impl ChannelPool for RodioPool {
    type Channel = RodioChannel;

    fn acquire(&mut self, group: &str, parent: Option<&str>) -> Result<RodioChannel, PoolError> {
        let id = match self.idle.get_mut(group).and_then(|ids| ids.pop()) {
            Some(id) => id,
            None => {
                let id = ChannelId(self.next_id);
                self.next_id += 1;
                id
            }
        };
        tracing::trace!("Acquired {} from {} (parent={:?})", id, group, parent);

        Ok(RodioChannel {
            id,
            group: group.to_string(),
            handle: self.handle.clone(),
            cache: Arc::clone(&self.cache),
            clip_root: self.clip_root.clone(),
            sink: None,
            data: None,
            looping: false,
            volume: 1.0,
            pitch: 1.0,
            priority: 128,
            start_offset: Duration::ZERO,
            spatial_blend: 0.0,
            spatial: SpatialParams::default(),
        })
    }

    fn release(&mut self, mut channel: RodioChannel) {
        channel.stop();
        let RodioChannel { id, group, .. } = channel;
        self.idle.entry(group).or_default().push(id);
    }

    fn release_all_in_group(&mut self, group: &str) {
        if let Some(ids) = self.idle.remove(group) {
            tracing::debug!("Destroyed {} idle channels in {}", ids.len(), group);
        }
        self.cache.lock().clear();
    }
}
