//! Composite timer graph: an arena of timer nodes indexed by integer handle.
//!
//! Nested timelines link their timer to the parent through a `ParentLink`
//! carrying the gating clip's window and time-scale. A child is always
//! allocated after its parent, so the live-id order list stays parents-first
//! and a single pass over it propagates activation and scale down the tree.
//! Freed slots are recycled through a free list.

use serde::{Deserialize, Serialize};

use crate::ids::TimerId;
use crate::timer::{ActivationState, Edge, Timer};

/// Directed edge from a parent timer to the child it gates.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ParentLink {
    pub parent: TimerId,
    /// The gating clip's window in the parent's clock: the child is active
    /// only while the parent is active and its time lies inside the window.
    pub window_start: f32,
    pub window_end: f32,
    /// Product of the gating clip's time-scale and the sub-timeline's
    /// authored scale; composes with the parent's effective scale.
    pub scale: f32,
}

#[derive(Clone, Debug)]
pub struct TimerNode {
    pub timer: Timer,
    pub activation: ActivationState,
    pub parent: Option<ParentLink>,
    pub children: Vec<TimerId>,
    /// Transition classified by the most recent step.
    pub edge: Edge,
    pub alive: bool,
}

impl TimerNode {
    fn new(parent: Option<ParentLink>) -> Self {
        Self {
            timer: Timer::new(),
            activation: ActivationState::default(),
            parent,
            children: Vec::new(),
            edge: Edge::SteadyInactive,
            alive: true,
        }
    }
}

/// Arena of timer nodes. Freed slots go on a free list and are reused by
/// later allocations, so instance churn never grows the arena without bound.
/// `order` keeps live ids parents-first (a child is always allocated after
/// its parent, and appending preserves that), so one pass over it propagates
/// activation and scale down the tree.
#[derive(Debug, Default)]
pub struct TimerArena {
    nodes: Vec<TimerNode>,
    /// Dead slots available for reuse.
    free: Vec<u32>,
    /// Live ids in parents-first step order.
    order: Vec<u32>,
    /// Per-step effective scale scratch, index-aligned with `nodes`.
    eff: Vec<f32>,
}

impl TimerArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a timer, reusing a freed slot when one is available, and
    /// append it to the parent's child list when linked.
    pub fn alloc(&mut self, parent: Option<ParentLink>) -> TimerId {
        let id = match self.free.pop() {
            Some(slot) => {
                self.nodes[slot as usize] = TimerNode::new(parent);
                TimerId(slot)
            }
            None => {
                let id = TimerId(self.nodes.len() as u32);
                self.nodes.push(TimerNode::new(parent));
                id
            }
        };
        if let Some(link) = self.nodes[id.0 as usize].parent {
            debug_assert!(
                self.get(link.parent).is_some(),
                "parent must be allocated first"
            );
            self.nodes[link.parent.0 as usize].children.push(id);
        }
        self.order.push(id.0);
        id
    }

    pub fn get(&self, id: TimerId) -> Option<&TimerNode> {
        self.nodes.get(id.0 as usize).filter(|n| n.alive)
    }

    pub fn get_mut(&mut self, id: TimerId) -> Option<&mut TimerNode> {
        self.nodes.get_mut(id.0 as usize).filter(|n| n.alive)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// One step for every live timer: propagate activation and scale from
    /// parents, advance playheads, classify edges. `order` visits parents
    /// before their children.
    pub fn step(&mut self, dt: f32) {
        self.eff.resize(self.nodes.len(), 1.0);
        for k in 0..self.order.len() {
            let i = self.order[k] as usize;
            let (gated_active, parent_eff) = match &self.nodes[i].parent {
                Some(link) => {
                    let p = link.parent.0 as usize;
                    let parent = &self.nodes[p];
                    let inside = parent.timer.time >= link.window_start
                        && parent.timer.time <= link.window_end;
                    (
                        parent.alive && parent.timer.active && inside,
                        self.eff[p] * link.scale,
                    )
                }
                None => (self.nodes[i].timer.active, 1.0),
            };

            let node = &mut self.nodes[i];
            node.timer.active = gated_active;
            self.eff[i] = parent_eff * node.timer.time_scale;
            node.timer.advance(dt, self.eff[i]);
            node.edge = node.activation.observe(node.timer.active);
        }
    }

    /// Tear down a timer and every linked descendant, detaching the root of
    /// the freed subtree from a surviving parent. Freed slots are recycled by
    /// later `alloc` calls.
    pub fn free_recursive(&mut self, id: TimerId) {
        let idx = id.0 as usize;
        if idx >= self.nodes.len() || !self.nodes[idx].alive {
            return;
        }
        if let Some(link) = self.nodes[idx].parent {
            if let Some(parent) = self.get_mut(link.parent) {
                parent.children.retain(|c| *c != id);
            }
        }
        self.release(id);
    }

    fn release(&mut self, id: TimerId) {
        let idx = id.0 as usize;
        if !self.nodes[idx].alive {
            return;
        }
        let children = std::mem::take(&mut self.nodes[idx].children);
        self.nodes[idx].alive = false;
        self.nodes[idx].timer.active = false;
        self.order.retain(|i| *i != id.0);
        self.free.push(id.0);
        for child in children {
            self.release(child);
        }
    }

    /// Iterate live nodes with their ids.
    pub fn iter_live(&self) -> impl Iterator<Item = (TimerId, &TimerNode)> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.alive)
            .map(|(i, n)| (TimerId(i as u32), n))
    }
}
