//! Engine: data ownership and the public API; runs the phased step.
//!
//! Phase order per step, each phase a barrier before the next:
//! apply inputs → advance timers (parents before children) → classify edges
//! and apply snapshot/reset writes → scatter contributions → reduce into the
//! accumulator → resolve write-back into the property store.

use rayon::prelude::*;

use crate::accumulate::{Accumulator, Contribution};
use crate::binding::{TargetHandle, TargetResolver};
use crate::config::Config;
use crate::data::{ClipPayload, TimelineData, TrackData};
use crate::graph::{ParentLink, TimerArena};
use crate::ids::{IdAllocator, InstanceId, TimelineId, TimerId};
use crate::inputs::{DriveCommand, Inputs};
use crate::outputs::{Change, CoreEvent, Outputs};
use crate::persist::{SavedSnapshot, SavedState, SavedTimer};
use crate::store::PropertyStore;
use crate::timer::Edge;
use sequent_api_core::{ComposeError, MixerRegistry, Value};

/// Per-track live state inside one instance part.
#[derive(Clone, Debug)]
struct TrackRuntime {
    track_idx: u32,
    /// Resolved target handle; None leaves the track unbound (skipped).
    target: Option<TargetHandle>,
    reset_on_exit: bool,
    /// Captured on activation-enter, applied on exit. None means invalid.
    snapshot: Option<Value>,
}

/// One timeline participating in an instance: the root timeline or any
/// nested sub-timeline, each with its own timer.
#[derive(Clone, Debug)]
struct InstancePart {
    timeline: TimelineId,
    timer: TimerId,
    tracks: Vec<TrackRuntime>,
}

/// A live timeline instance: the root timer plus one part per timeline in
/// its composite graph.
#[derive(Clone, Debug)]
struct Instance {
    id: InstanceId,
    root: TimerId,
    parts: Vec<InstancePart>,
}

/// Minimal timeline library storage.
#[derive(Default, Debug)]
struct TimelineLib {
    items: Vec<(TimelineId, TimelineData)>,
}

impl TimelineLib {
    fn insert(&mut self, id: TimelineId, data: TimelineData) {
        self.items.push((id, data));
    }
    fn get(&self, id: TimelineId) -> Option<&TimelineData> {
        self.items
            .iter()
            .find_map(|(t, d)| if *t == id { Some(d) } else { None })
    }
}

/// One unit of scatter work: a bound track at its timer's playhead.
struct ScatterJob<'a> {
    time: f32,
    target: &'a str,
    track: &'a TrackData,
}

fn eval_job(job: &ScatterJob<'_>, mixers: &MixerRegistry) -> Vec<Contribution> {
    let mut out = Vec::new();
    for clip in &job.track.clips {
        let Some(weight) = clip.weight_at(job.time) else {
            continue;
        };
        let Some(value) = clip.sample_at(job.time, mixers) else {
            continue; // sub-timeline clips gate their child timer instead
        };
        out.push(Contribution {
            target: job.target.to_string(),
            value,
            weight,
        });
    }
    out
}

/// Recursively build instance parts for a timeline and its sub-timelines,
/// allocating child timers and rejecting reference cycles.
fn build_parts(
    lib: &TimelineLib,
    mixers: &MixerRegistry,
    arena: &mut TimerArena,
    resolver: &mut dyn TargetResolver,
    timeline: TimelineId,
    parent: Option<ParentLink>,
    stack: &mut Vec<TimelineId>,
    parts: &mut Vec<InstancePart>,
) -> Result<TimerId, ComposeError> {
    if stack.contains(&timeline) {
        return Err(ComposeError::CompositeCycle {
            timeline: timeline.0,
        });
    }
    let data = lib
        .get(timeline)
        .ok_or(ComposeError::TimelineNotFound { id: timeline.0 })?;
    stack.push(timeline);

    let timer = arena.alloc(parent);
    let mut tracks = Vec::with_capacity(data.tracks.len());
    for (idx, track) in data.tracks.iter().enumerate() {
        tracks.push(TrackRuntime {
            track_idx: idx as u32,
            target: resolver.resolve(&track.target_path),
            reset_on_exit: track.reset_on_exit,
            snapshot: None,
        });
        for clip in &track.clips {
            match &clip.payload {
                ClipPayload::Constant(v) => {
                    mixers.require(v.kind())?;
                }
                ClipPayload::Ramp { from, to } => {
                    mixers.require(from.kind())?;
                    mixers.require(to.kind())?;
                }
                ClipPayload::SubTimeline {
                    timeline: child,
                    time_scale,
                } => {
                    let link = ParentLink {
                        parent: timer,
                        window_start: clip.start,
                        window_end: clip.end,
                        scale: clip.time_scale * time_scale,
                    };
                    build_parts(
                        lib,
                        mixers,
                        arena,
                        resolver,
                        *child,
                        Some(link),
                        stack,
                        parts,
                    )?;
                }
            }
        }
    }
    parts.push(InstancePart {
        timeline,
        timer,
        tracks,
    });

    stack.pop();
    Ok(timer)
}

/// Engine (core) with target handles fixed to small string keys.
#[derive(Debug)]
pub struct Engine {
    cfg: Config,
    ids: IdAllocator,
    timelines: TimelineLib,
    arena: TimerArena,
    instances: Vec<Instance>,

    mixers: MixerRegistry,
    store: PropertyStore,

    // Per-step outputs
    outputs: Outputs,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Engine {
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            ids: IdAllocator::new(),
            timelines: TimelineLib::default(),
            arena: TimerArena::new(),
            instances: Vec::new(),
            mixers: MixerRegistry::new(),
            store: PropertyStore::new(),
            outputs: Outputs::default(),
        }
    }

    /// Load a timeline definition, validating its invariants.
    pub fn load_timeline(&mut self, mut data: TimelineData) -> Result<TimelineId, ComposeError> {
        data.validate_basic()
            .map_err(|reason| ComposeError::InvalidTimeline {
                name: data.name.clone(),
                reason,
            })?;
        let id = self.ids.alloc_timeline();
        data.id = Some(id);
        log::debug!("loaded timeline '{}' as {:?}", data.name, id);
        self.timelines.insert(id, data);
        Ok(id)
    }

    /// Instantiate a timeline: bind track targets through the resolver and
    /// build the composite timer graph. All structural errors (unknown
    /// timeline, reference cycle, missing mixer) surface here, before any
    /// step runs.
    pub fn instantiate(
        &mut self,
        timeline: TimelineId,
        resolver: &mut dyn TargetResolver,
    ) -> Result<InstanceId, ComposeError> {
        let mut parts = Vec::new();
        let mut stack = Vec::new();
        let root = build_parts(
            &self.timelines,
            &self.mixers,
            &mut self.arena,
            resolver,
            timeline,
            None,
            &mut stack,
            &mut parts,
        )?;
        let id = self.ids.alloc_instance();
        log::debug!(
            "instantiated timeline {:?} as {:?} ({} part(s))",
            timeline,
            id,
            parts.len()
        );
        self.instances.push(Instance { id, root, parts });
        Ok(id)
    }

    /// Tear down an instance and every nested timer it owns. Its
    /// contributions stop from the next step on.
    pub fn destroy(&mut self, instance: InstanceId) -> Result<(), ComposeError> {
        let idx = self
            .instances
            .iter()
            .position(|i| i.id == instance)
            .ok_or(ComposeError::InstanceNotFound { id: instance.0 })?;
        let inst = self.instances.remove(idx);
        self.arena.free_recursive(inst.root);
        log::debug!("destroyed {:?}", instance);
        Ok(())
    }

    /// The mixer registry; register additional property kinds before
    /// instantiating timelines that use them.
    pub fn mixers_mut(&mut self) -> &mut MixerRegistry {
        &mut self.mixers
    }

    pub fn mixers(&self) -> &MixerRegistry {
        &self.mixers
    }

    /// Seed or overwrite a target's live property value.
    pub fn set_property(&mut self, target: impl Into<TargetHandle>, value: Value) {
        self.store.set(target, value);
    }

    pub fn property(&self, target: &str) -> Option<&Value> {
        self.store.get(target)
    }

    /// Remove a target; tracks bound to it skip their contributions until
    /// the host re-creates it.
    pub fn remove_property(&mut self, target: &str) -> Option<Value> {
        self.store.remove(target)
    }

    /// Root playhead of an instance, in seconds.
    pub fn instance_time(&self, instance: InstanceId) -> Option<f32> {
        let inst = self.instances.iter().find(|i| i.id == instance)?;
        self.arena.get(inst.root).map(|n| n.timer.time)
    }

    pub fn instance_active(&self, instance: InstanceId) -> Option<bool> {
        let inst = self.instances.iter().find(|i| i.id == instance)?;
        self.arena.get(inst.root).map(|n| n.timer.active)
    }

    /// All timers of an instance (root first, nested after), for tooling
    /// and tests. Timer ids recycle freed slots, so id order says nothing
    /// about the tree shape.
    pub fn instance_timers(&self, instance: InstanceId) -> Option<Vec<TimerId>> {
        let inst = self.instances.iter().find(|i| i.id == instance)?;
        let mut ids = vec![inst.root];
        ids.extend(
            inst.parts
                .iter()
                .map(|p| p.timer)
                .filter(|t| *t != inst.root),
        );
        Some(ids)
    }

    pub fn timer_time(&self, timer: TimerId) -> Option<f32> {
        self.arena.get(timer).map(|n| n.timer.time)
    }

    pub fn timer_active(&self, timer: TimerId) -> Option<bool> {
        self.arena.get(timer).map(|n| n.timer.active)
    }

    fn apply_inputs(&mut self, inputs: Inputs) {
        for cmd in inputs.commands {
            match cmd {
                DriveCommand::SetActive { instance, active } => {
                    if let Some(inst) = self.instances.iter().find(|i| i.id == instance) {
                        if let Some(node) = self.arena.get_mut(inst.root) {
                            node.timer.active = active;
                        }
                    }
                }
                DriveCommand::Seek { instance, time } => {
                    if let Some(inst) = self.instances.iter().find(|i| i.id == instance) {
                        if let Some(node) = self.arena.get_mut(inst.root) {
                            node.timer.time = time;
                        }
                    }
                }
                DriveCommand::SetTimeScale {
                    instance,
                    time_scale,
                } => {
                    if let Some(inst) = self.instances.iter().find(|i| i.id == instance) {
                        if let Some(node) = self.arena.get_mut(inst.root) {
                            node.timer.time_scale = time_scale;
                        }
                    }
                }
            }
        }
    }

    /// Classify edges per part and apply snapshot captures and reset writes.
    /// Reset writes bypass the accumulator: one direct, unblended write on
    /// the exit edge. A missing target makes either side a silent no-op.
    fn apply_edges(&mut self) {
        let arena = &self.arena;
        let store = &mut self.store;
        let outputs = &mut self.outputs;
        for inst in self.instances.iter_mut() {
            if let Some(root) = arena.get(inst.root) {
                match root.edge {
                    Edge::Enter => outputs.push_event(CoreEvent::Activated { instance: inst.id }),
                    Edge::Exit => outputs.push_event(CoreEvent::Deactivated { instance: inst.id }),
                    _ => {}
                }
            }
            for part in inst.parts.iter_mut() {
                let Some(node) = arena.get(part.timer) else {
                    continue;
                };
                match node.edge {
                    Edge::Enter => {
                        for track in part.tracks.iter_mut().filter(|t| t.reset_on_exit) {
                            let Some(target) = track.target.as_deref() else {
                                continue;
                            };
                            track.snapshot = store.get(target).cloned();
                            if track.snapshot.is_some() {
                                outputs.push_event(CoreEvent::SnapshotCaptured {
                                    instance: inst.id,
                                    target: target.to_string(),
                                });
                            }
                        }
                    }
                    Edge::Exit => {
                        for track in part.tracks.iter().filter(|t| t.reset_on_exit) {
                            let Some(target) = track.target.as_deref() else {
                                continue;
                            };
                            let Some(value) = track.snapshot.as_ref() else {
                                continue;
                            };
                            if store.write_existing(target, value.clone()) {
                                outputs.push_event(CoreEvent::SnapshotRestored {
                                    instance: inst.id,
                                    target: target.to_string(),
                                });
                            }
                        }
                    }
                    _ => {}
                }
            }
        }
    }

    /// Step the simulation by `dt` with the given inputs.
    pub fn step(&mut self, dt: f32, inputs: Inputs) -> &Outputs {
        self.outputs.clear();

        // 1) Drive commands at the step boundary.
        self.apply_inputs(inputs);

        // 2) Advance every timer, parents before children.
        self.arena.step(dt);

        // 3) Activation edges, snapshot captures, reset writes.
        self.apply_edges();

        // 4) Scatter: one job per bound track of every active part. Tracks
        //    whose target disappeared are skipped for the step.
        let mut jobs: Vec<ScatterJob<'_>> = Vec::with_capacity(self.cfg.scratch_contributions);
        for inst in &self.instances {
            for part in &inst.parts {
                let Some(node) = self.arena.get(part.timer) else {
                    continue;
                };
                if !node.timer.active {
                    continue;
                }
                let Some(data) = self.timelines.get(part.timeline) else {
                    continue;
                };
                for runtime in &part.tracks {
                    let Some(target) = runtime.target.as_deref() else {
                        continue;
                    };
                    if !self.store.contains(target) {
                        continue;
                    }
                    jobs.push(ScatterJob {
                        time: node.timer.time,
                        target,
                        track: &data.tracks[runtime.track_idx as usize],
                    });
                }
            }
        }

        let mixers = &self.mixers;
        let job_count = jobs.len();
        let contributions: Vec<Contribution> =
            if jobs.len() >= self.cfg.parallel_scatter_threshold {
                jobs.par_iter()
                    .flat_map_iter(|job| eval_job(job, mixers))
                    .collect()
            } else {
                jobs.iter().flat_map(|job| eval_job(job, mixers)).collect()
            };
        drop(jobs);
        log::trace!(
            "step dt={dt}: {job_count} job(s), {} contribution(s)",
            contributions.len()
        );

        // 5) Reduce into the per-step accumulator.
        let mut acc = Accumulator::with_capacity(&self.mixers, self.cfg.scratch_targets);
        acc.reduce(contributions);
        let blended = acc.finalize();

        // 6) Resolve: one write per target that received weight.
        for (target, mix) in blended {
            if mix.weight <= 0.0 {
                continue;
            }
            if self.store.write_existing(&target, mix.value.clone()) {
                self.outputs.push_change(Change {
                    target,
                    value: mix.value,
                });
            }
        }

        &self.outputs
    }

    /// Persistable state: all live timers plus reset snapshots.
    pub fn save_state(&self) -> SavedState {
        let mut state = SavedState::default();
        for (id, node) in self.arena.iter_live() {
            state.timers.push(SavedTimer {
                timer: id,
                time: node.timer.time,
                time_scale: node.timer.time_scale,
                active: node.timer.active,
            });
        }
        for inst in &self.instances {
            for part in &inst.parts {
                for track in part.tracks.iter().filter(|t| t.reset_on_exit) {
                    state.snapshots.push(SavedSnapshot {
                        instance: inst.id,
                        timer: part.timer,
                        track_idx: track.track_idx,
                        value: track.snapshot.clone(),
                    });
                }
            }
        }
        state
    }

    /// Restore previously saved timer and snapshot state onto the current
    /// instance graph. Entries for timers or tracks that no longer exist are
    /// ignored. Activation history is synced to the restored flag so a
    /// resumed-active timer does not fire a spurious enter edge (which would
    /// recapture its reset snapshots from mid-timeline values).
    pub fn restore_state(&mut self, state: &SavedState) {
        for saved in &state.timers {
            if let Some(node) = self.arena.get_mut(saved.timer) {
                node.timer.time = saved.time;
                node.timer.time_scale = saved.time_scale;
                node.timer.active = saved.active;
                node.activation.reset_to(saved.active);
                node.edge = node.activation.edge();
            }
        }
        for saved in &state.snapshots {
            if let Some(inst) = self.instances.iter_mut().find(|i| i.id == saved.instance) {
                if let Some(part) = inst.parts.iter_mut().find(|p| p.timer == saved.timer) {
                    if let Some(track) = part
                        .tracks
                        .iter_mut()
                        .find(|t| t.track_idx == saved.track_idx)
                    {
                        track.snapshot = saved.value.clone();
                    }
                }
            }
        }
    }
}
