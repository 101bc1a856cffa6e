use std::collections::HashMap;

use glam::Vec3;
use tracing::{debug, info};

use crate::utils::Aabb;

/// Stable handle of a collidable node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

/// Stable handle of a breakable object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BreakableId(pub u32);

/// Bit set of node tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NodeTags(u32);

impl NodeTags {
    pub const NONE: NodeTags = NodeTags(0);
    /// The player's ray can interact with this node
    pub const ACTIVABLE: NodeTags = NodeTags(1 << 0);
    pub const GOAL: NodeTags = NodeTags(1 << 1);

    pub fn contains(self, other: NodeTags) -> bool {
        self.0 & other.0 == other.0
    }
}

#[derive(Debug, Clone)]
pub struct SceneNode {
    pub id: NodeId,
    pub name: String,
    pub bounds: Aabb,
    pub tags: NodeTags,
    /// Drawn as wireframe; destroyed breakables end up here
    pub wireframe: bool,
    /// Blocks the player's collision volume
    pub solid: bool,
    pub color: [f32; 4],
}

#[derive(Debug, Clone)]
pub struct Breakable {
    pub id: BreakableId,
    pub node: NodeId,
    destroyed: bool,
}

impl Breakable {
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Turn the node into a passable wireframe ghost. Returns false if already destroyed.
    fn destroy(&mut self, node: &mut SceneNode) -> bool {
        if self.destroyed {
            return false;
        }
        self.destroyed = true;
        node.wireframe = true;
        node.solid = false;
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub node: NodeId,
    pub point: Vec3,
    pub normal: Vec3,
    pub distance: f32,
}

const STONE: [f32; 4] = [0.55, 0.55, 0.6, 1.0];
const CEILING: [f32; 4] = [0.45, 0.5, 0.65, 1.0];
const CRATE: [f32; 4] = [0.8, 0.45, 0.2, 1.0];
const GOAL_PAD: [f32; 4] = [0.3, 0.85, 0.4, 1.0];

/// Collidable geometry of one round plus its breakable objects
#[derive(Default)]
pub struct Scene {
    nodes: Vec<SceneNode>,
    node_index: HashMap<NodeId, usize>,
    breakables: Vec<Breakable>,
    breakable_by_node: HashMap<NodeId, usize>,
    next_node_id: u32,
    /// Bumped whenever geometry changes so renderers can rebuild meshes
    revision: u64,
    elapsed: f32,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the fixed level around `goal`
    pub fn setup(&mut self, goal: Vec3) {
        self.close();

        // Spawn room floor; the camera rests at y = 0
        self.add_static("spawn_floor", Aabb::new(Vec3::new(-400.0, -160.0, -400.0), Vec3::new(400.0, -60.0, 400.0)), STONE);
        self.add_static("spawn_back_wall", Aabb::new(Vec3::new(-400.0, -60.0, -440.0), Vec3::new(400.0, 700.0, -400.0)), STONE);

        // Ceiling walkway, reachable only with reversed gravity
        self.add_static("ceiling_run", Aabb::new(Vec3::new(-400.0, 600.0, -400.0), Vec3::new(400.0, 700.0, 1600.0)), CEILING);
        self.add_breakable("crate_wall", Aabb::new(Vec3::new(-400.0, 300.0, 1150.0), Vec3::new(400.0, 600.0, 1200.0)));
        self.add_static("ceiling_bridge", Aabb::new(Vec3::new(-400.0, 600.0, 1600.0), Vec3::new(1700.0, 700.0, 2400.0)), CEILING);

        // Landing platform under the goal
        let pad_top = goal.y - 60.0;
        self.add_static("landing", Aabb::new(Vec3::new(1500.0, pad_top - 100.0, 2200.0), Vec3::new(2500.0, pad_top, 3200.0)), STONE);
        self.add_breakable("goal_gate", Aabb::new(Vec3::new(1800.0, pad_top, 2450.0), Vec3::new(2250.0, pad_top + 200.0, 2500.0)));
        let pad = self.add_static("goal_pad", Aabb::new(goal - Vec3::new(100.0, 61.0, 100.0), goal + Vec3::new(100.0, -59.0, 100.0)), GOAL_PAD);
        if let Some(node) = self.node_mut(pad) {
            node.tags = NodeTags::GOAL;
            node.solid = false;
        }

        info!("scene set up: {} nodes, {} breakables", self.nodes.len(), self.breakables.len());
    }

    /// Drop all geometry of the current round
    pub fn close(&mut self) {
        if !self.nodes.is_empty() {
            debug!("closing scene with {} nodes", self.nodes.len());
        }
        self.nodes.clear();
        self.node_index.clear();
        self.breakables.clear();
        self.breakable_by_node.clear();
        self.elapsed = 0.0;
        self.revision += 1;
    }

    pub fn update(&mut self, dt: f32) {
        self.elapsed += dt;
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn add_static(&mut self, name: &str, bounds: Aabb, color: [f32; 4]) -> NodeId {
        let id = NodeId(self.next_node_id);
        self.next_node_id += 1;
        self.node_index.insert(id, self.nodes.len());
        self.nodes.push(SceneNode {
            id,
            name: name.to_string(),
            bounds,
            tags: NodeTags::NONE,
            wireframe: false,
            solid: true,
            color,
        });
        self.revision += 1;
        id
    }

    pub fn add_breakable(&mut self, name: &str, bounds: Aabb) -> BreakableId {
        let node = self.add_static(name, bounds, CRATE);
        if let Some(n) = self.node_mut(node) {
            n.tags = NodeTags::ACTIVABLE;
        }
        let id = BreakableId(self.breakables.len() as u32);
        self.breakable_by_node.insert(node, self.breakables.len());
        self.breakables.push(Breakable { id, node, destroyed: false });
        id
    }

    pub fn nodes(&self) -> &[SceneNode] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.node_index.get(&id).map(|&i| &self.nodes[i])
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.node_index.get(&id).map(|&i| &mut self.nodes[i])
    }

    pub fn breakables(&self) -> &[Breakable] {
        &self.breakables
    }

    pub fn breakable(&self, id: BreakableId) -> Option<&Breakable> {
        self.breakables.get(id.0 as usize)
    }

    pub fn breakable_for_node(&self, node: NodeId) -> Option<BreakableId> {
        self.breakable_by_node.get(&node).map(|&i| self.breakables[i].id)
    }

    /// Destroy a breakable. Returns false if it was already gone.
    pub fn destroy_breakable(&mut self, id: BreakableId) -> bool {
        let Some(breakable) = self.breakables.get_mut(id.0 as usize) else {
            return false;
        };
        let Some(&node_idx) = self.node_index.get(&breakable.node) else {
            return false;
        };
        let node = &mut self.nodes[node_idx];
        if !breakable.destroy(node) {
            return false;
        }
        info!("destroyed breakable {:?} ({})", id, node.name);
        self.revision += 1;
        true
    }

    /// First solid node overlapping `volume`
    pub fn first_overlap(&self, volume: &Aabb) -> Option<&SceneNode> {
        self.nodes.iter().find(|n| n.solid && n.bounds.intersects(volume))
    }

    /// Nearest node hit by the ray within `max_distance`, solid or not
    pub fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit> {
        let dir = direction.normalize_or_zero();
        if dir == Vec3::ZERO {
            return None;
        }

        self.nodes
            .iter()
            .filter_map(|n| {
                n.bounds.ray_intersect(origin, dir, max_distance).map(|(t, normal)| RayHit {
                    node: n.id,
                    point: origin + dir * t,
                    normal,
                    distance: t,
                })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goal() -> Vec3 {
        Vec3::new(2017.0, -400.0, 2700.0)
    }

    #[test]
    fn setup_builds_level_and_close_clears_it() {
        let mut scene = Scene::new();
        scene.setup(goal());
        assert!(!scene.nodes().is_empty());
        assert_eq!(scene.breakables().len(), 2);

        let rev = scene.revision();
        scene.close();
        assert!(scene.nodes().is_empty());
        assert!(scene.breakables().is_empty());
        assert!(scene.revision() > rev);
    }

    #[test]
    fn spawn_point_rests_on_floor() {
        let mut scene = Scene::new();
        scene.setup(goal());
        let body = Aabb::from_center(Vec3::ZERO, Vec3::new(30.0, 60.0, 30.0));
        assert!(scene.first_overlap(&body).is_none());
        let sunk = Aabb::from_center(Vec3::new(0.0, -1.0, 0.0), Vec3::new(30.0, 60.0, 30.0));
        assert_eq!(scene.first_overlap(&sunk).map(|n| n.name.as_str()), Some("spawn_floor"));
    }

    #[test]
    fn raycast_returns_nearest_node() {
        let mut scene = Scene::new();
        let far = scene.add_static("far", Aabb::new(Vec3::new(-10.0, -10.0, 200.0), Vec3::new(10.0, 10.0, 210.0)), STONE);
        let near = scene.add_breakable("near", Aabb::new(Vec3::new(-10.0, -10.0, 100.0), Vec3::new(10.0, 10.0, 110.0)));
        let hit = scene.raycast(Vec3::ZERO, Vec3::Z * 3.0, 1000.0).unwrap();
        let near_node = scene.breakable(near).unwrap().node;
        assert_eq!(hit.node, near_node);
        assert!((hit.distance - 100.0).abs() < 1e-3);
        assert_eq!(hit.normal, Vec3::NEG_Z);
        assert_ne!(hit.node, far);
        assert!(scene.raycast(Vec3::ZERO, Vec3::Z, 50.0).is_none());
    }

    #[test]
    fn destroying_a_breakable_is_idempotent() {
        let mut scene = Scene::new();
        let id = scene.add_breakable("crate", Aabb::new(Vec3::ZERO, Vec3::splat(10.0)));
        let node = scene.breakable(id).unwrap().node;
        assert_eq!(scene.breakable_for_node(node), Some(id));
        assert!(scene.node(node).unwrap().tags.contains(NodeTags::ACTIVABLE));

        assert!(scene.destroy_breakable(id));
        let rev = scene.revision();
        assert!(!scene.destroy_breakable(id));
        assert_eq!(scene.revision(), rev);

        let n = scene.node(node).unwrap();
        assert!(n.wireframe);
        assert!(!n.solid);
        assert!(scene.breakable(id).unwrap().is_destroyed());
        assert!(scene.first_overlap(&Aabb::new(Vec3::splat(1.0), Vec3::splat(2.0))).is_none());
    }

    #[test]
    fn static_nodes_have_no_breakable() {
        let mut scene = Scene::new();
        let node = scene.add_static("wall", Aabb::new(Vec3::ZERO, Vec3::ONE), STONE);
        assert_eq!(scene.breakable_for_node(node), None);
        assert!(!scene.node(node).unwrap().tags.contains(NodeTags::ACTIVABLE));
    }
}
