//! Bounce simulator
//!
//! Owns every bubble in one arena and drives their motion states. Each tick
//! snapshots the committed positions into the peer index first, so a bubble
//! never sees another bubble's half-finished update.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::arena::Arena;
use super::motion::{Bounce, MotionTuning, Surroundings};
use super::spatial::{PeerCircle, PeerIndex};
use super::state::{Bubble, BubbleId, BubbleSnapshot, RngState};
use super::transform::Transform2;
use crate::consts::*;
use crate::error::SimError;
use crate::settings::SimConfig;

/// What happened during one `step` or `advance`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    /// Progress of the last tick run
    pub progress: f32,
    /// Iteration the last tick belonged to (1-based, 0 = not started)
    pub iteration: u64,
    pub bounces: Vec<(BubbleId, Bounce)>,
}

impl TickReport {
    fn merge(&mut self, other: TickReport) {
        self.progress = other.progress;
        self.iteration = other.iteration;
        self.bounces.extend(other.bounces);
    }
}

/// N bubbles sharing one arena
#[derive(Debug, Clone)]
pub struct BounceSimulator {
    config: SimConfig,
    tuning: MotionTuning,
    arena: Arena,
    /// Sorted by id for deterministic iteration
    bubbles: Vec<Bubble>,
    peers: PeerIndex,
    rng_state: RngState,
    rng: Pcg32,
    /// Seconds into the current iteration
    elapsed: f32,
    /// Progress of the last tick
    progress: f32,
    iteration: u64,
    next_id: u32,
}

impl BounceSimulator {
    pub fn new(config: SimConfig) -> Result<Self, SimError> {
        config.validate()?;
        let arena = Arena::new(config.arena_width, config.arena_height)?;
        Self::with_arena(config, arena)
    }

    /// Use an explicit arena (e.g. with a non-identity world frame)
    pub fn with_arena(config: SimConfig, arena: Arena) -> Result<Self, SimError> {
        config.validate()?;
        for w in config.warnings() {
            log::warn!("config: {w}");
        }

        let rng_state = RngState::new(config.seed);
        let peers = PeerIndex::build(config.spatial, [])?;
        log::info!(
            "Simulator ready: arena {}x{}, iteration {:.2}s, peers via {}, seed {}",
            arena.width(),
            arena.height(),
            config.iteration_duration(),
            config.spatial.as_str(),
            config.seed
        );

        Ok(Self {
            tuning: config.tuning(),
            arena,
            bubbles: Vec::new(),
            peers,
            rng: rng_state.to_rng(),
            rng_state,
            elapsed: 0.0,
            progress: 0.0,
            iteration: 0,
            next_id: 1,
            config,
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Move/rotate/scale the arena in world space
    pub fn set_arena_frame(&mut self, frame: Transform2) {
        self.arena.frame = frame;
    }

    pub fn seed(&self) -> u64 {
        self.rng_state.seed
    }

    pub fn bubbles(&self) -> &[Bubble] {
        &self.bubbles
    }

    pub fn bubble(&self, id: BubbleId) -> Option<&Bubble> {
        self.index_of(id).map(|i| &self.bubbles[i])
    }

    pub fn bubble_mut(&mut self, id: BubbleId) -> Option<&mut Bubble> {
        let i = self.index_of(id)?;
        Some(&mut self.bubbles[i])
    }

    /// Iterations begun so far
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    /// Progress of the last tick
    pub fn progress(&self) -> f32 {
        self.progress
    }

    /// Seconds per iteration (`distance_to_move / velocity`)
    pub fn iteration_duration(&self) -> f32 {
        self.config.iteration_duration()
    }

    fn index_of(&self, id: BubbleId) -> Option<usize> {
        self.bubbles.binary_search_by_key(&id, |b| b.id).ok()
    }

    fn next_bubble_id(&mut self) -> BubbleId {
        let id = BubbleId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Add a bubble at a local-space position
    ///
    /// A bubble added mid-iteration joins the running iteration instead of
    /// waiting for the next `progress == 0`.
    pub fn add_bubble(&mut self, position: Vec2, radius: f32) -> Result<BubbleId, SimError> {
        SimError::check_radius(radius)?;
        let id = self.next_bubble_id();
        let mut bubble = Bubble::new(
            id,
            position,
            radius,
            self.config.distance_to_move,
            DEFAULT_LAYER,
        )?;
        if self.iteration > 0 {
            bubble
                .motion
                .join_at(&bubble.pose, &self.tuning, &mut self.rng, self.progress);
        }
        log::debug!("added bubble {:?} at ({:.1}, {:.1}) r={radius}", id, position.x, position.y);
        // Ids only grow, so pushing keeps the order
        self.bubbles.push(bubble);
        Ok(id)
    }

    /// Add a bubble with the configured default radius
    pub fn add_default_bubble(&mut self, position: Vec2) -> Result<BubbleId, SimError> {
        self.add_bubble(position, self.config.default_radius)
    }

    pub fn remove_bubble(&mut self, id: BubbleId) -> Option<Bubble> {
        let index = self.index_of(id)?;
        log::debug!("removed bubble {:?}", id);
        Some(self.bubbles.remove(index))
    }

    /// Place up to `count` non-overlapping bubbles at random positions with
    /// random radii from the configured range. Stops early when the arena is full.
    pub fn spawn_random(&mut self, count: usize) -> Vec<BubbleId> {
        let mut spawned = Vec::with_capacity(count);
        let fit = self.arena.max_radius() - self.tuning.bounce_epsilon.max(0.0);

        'outer: for _ in 0..count {
            for _ in 0..SPAWN_ATTEMPTS {
                let radius = self.random_radius().min(fit);
                if radius <= 0.0 {
                    break;
                }
                let room = self.arena.half_extents - Vec2::splat(radius);
                let position = Vec2::new(
                    self.rng.random_range(-room.x..=room.x),
                    self.rng.random_range(-room.y..=room.y),
                );
                let clear = self.bubbles.iter().all(|b| {
                    b.pose.position.distance(position) > b.radius + radius + self.tuning.bounce_epsilon
                });
                if clear {
                    if let Ok(id) = self.add_bubble(position, radius) {
                        spawned.push(id);
                        continue 'outer;
                    }
                }
            }
            log::warn!(
                "arena full: placed {} of {} bubbles",
                spawned.len(),
                count
            );
            break;
        }

        spawned
    }

    fn random_radius(&mut self) -> f32 {
        let (min, max) = (self.config.min_radius, self.config.max_radius);
        if max > min {
            self.rng.random_range(min..=max)
        } else {
            min
        }
    }

    /// Run one tick at `progress` for every bubble.
    ///
    /// `progress == 0` begins a new iteration. Values outside [0, 1] are
    /// clamped; a non-finite progress is ignored.
    pub fn step(&mut self, progress: f32) -> TickReport {
        if !progress.is_finite() {
            log::warn!("ignoring non-finite progress {progress}");
            return TickReport {
                progress: self.progress,
                iteration: self.iteration,
                bounces: Vec::new(),
            };
        }
        let progress = progress.clamp(0.0, 1.0);
        if progress == 0.0 {
            self.iteration += 1;
            log::debug!("iteration {} begins", self.iteration);
        }
        self.progress = progress;

        let arena = &self.arena;
        self.peers.rebuild(self.bubbles.iter().map(|b| PeerCircle {
            id: b.id,
            center: arena.to_world(b.pose.position),
            radius: arena.frame.length_to_world(b.radius),
            layer: b.layer,
        }));

        let env = Surroundings {
            arena: &self.arena,
            peers: &self.peers,
            layer_mask: self.config.layer_mask,
            tuning: self.tuning,
        };

        let mut bounces = Vec::new();
        for bubble in &mut self.bubbles {
            if let Some(bounce) = bubble.update(progress, &env, &mut self.rng) {
                bounces.push((bubble.id, bounce));
            }
        }

        TickReport {
            progress,
            iteration: self.iteration,
            bounces,
        }
    }

    /// Advance by `dt` seconds of wall time.
    ///
    /// The first call starts iteration 1. When an iteration runs out it is
    /// finished with `progress = 1` and the next one started with
    /// `progress = 0` before the leftover time is applied.
    pub fn advance(&mut self, dt: f32) -> TickReport {
        let dt = if dt.is_finite() {
            dt.clamp(0.0, MAX_FRAME_DT)
        } else {
            0.0
        };
        let duration = self.iteration_duration();
        let mut report = TickReport {
            progress: self.progress,
            iteration: self.iteration,
            bounces: Vec::new(),
        };

        if self.iteration == 0 {
            report.merge(self.step(0.0));
        }

        self.elapsed += dt;
        let mut wraps = 0;
        while self.elapsed >= duration {
            if wraps == MAX_WRAPS_PER_FRAME {
                self.elapsed %= duration;
                break;
            }
            report.merge(self.step(1.0));
            let finished = self.iteration;
            self.elapsed -= duration;
            report.merge(self.step(0.0));
            log::info!(
                "iteration {} done ({} bubbles)",
                finished,
                self.bubbles.len()
            );
            wraps += 1;
        }

        if self.elapsed > 0.0 {
            report.merge(self.step(self.elapsed / duration));
        }
        report
    }

    /// Topmost bubble under a world-space point (latest added wins)
    pub fn pick(&self, world_point: Vec2) -> Option<BubbleId> {
        let local = self.arena.to_local(world_point);
        self.bubbles
            .iter()
            .rev()
            .find(|b| b.contains(local))
            .map(|b| b.id)
    }

    /// Give a bubble a new random radius from the configured range
    pub fn resize_bubble(&mut self, id: BubbleId) -> Option<f32> {
        let radius = self.random_radius();
        let bubble = self.bubble_mut(id)?;
        bubble.radius = radius;
        log::debug!("resized bubble {:?} to r={radius:.1}", id);
        Some(radius)
    }

    /// Resize whatever bubble sits under a world-space point
    pub fn pick_and_resize(&mut self, world_point: Vec2) -> Option<(BubbleId, f32)> {
        let id = self.pick(world_point)?;
        self.resize_bubble(id).map(|r| (id, r))
    }

    pub fn snapshot(&self) -> Vec<BubbleSnapshot> {
        self.bubbles.iter().map(Bubble::snapshot).collect()
    }
}
