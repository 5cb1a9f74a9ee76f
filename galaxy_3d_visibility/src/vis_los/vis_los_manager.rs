/// VisLosManager — ray queries against the registered scene.
///
/// A query walks three levels of space trees: scene nodes in the page tree
/// manager, drawables in each scene node, spans in each drawable. At every
/// level the leaves whose bounds the ray crosses are collected with their
/// entry distance and visited nearest first. Each span that yields a hit
/// pulls the ray's target in to that hit, so candidates whose entry
/// distance lies beyond it are never opened.
///
/// Hit buffers are owned by the manager and reused across queries.

use std::sync::{Arc, RwLock};
use glam::Vec3;
use crate::camera::Camera;
use crate::scene::{Drawable, PageTreeManager, SceneNode, Span, SpaceTree};
use super::bound_ray::{check_bound, check_triangle, LosRay};

/// Length of the ray cast under the cursor
pub const CURSOR_RAY_DIST: f32 = 100_000.0;

/// A space tree leaf crossed by the ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpaceHit {
    /// Leaf index in its tree
    pub index: u16,
    /// Distance along the ray to the leaf's bounds
    pub closest: f32,
}

/// Result of a successful query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisHit {
    /// World-space hit position
    pub pos: Vec3,
}

#[derive(Debug, Default)]
pub struct VisLosManager {
    page_tree_mgr: Option<Arc<RwLock<PageTreeManager>>>,
    /// Current ray; `target` and `max_dist` shrink as hits are found
    ray: Option<LosRay>,
    node_hits: Vec<SpaceHit>,
    drawable_hits: Vec<SpaceHit>,
    span_hits: Vec<SpaceHit>,
}

impl VisLosManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the scene to query, or `None` to detach it
    pub fn set_page_tree_manager(&mut self, mgr: Option<Arc<RwLock<PageTreeManager>>>) {
        self.page_tree_mgr = mgr;
    }

    pub fn page_tree_manager(&self) -> Option<&Arc<RwLock<PageTreeManager>>> {
        self.page_tree_mgr.as_ref()
    }

    /// Closest hit on the segment `start -> end`.
    ///
    /// Returns `None` when no scene is registered, when the segment has no
    /// length, or when nothing is hit.
    pub fn check(&mut self, start: Vec3, end: Vec3) -> Option<VisHit> {
        let Some(mgr) = self.page_tree_mgr.clone() else {
            crate::engine_debug!("galaxy3d::VisLos", "LOS check with no page tree manager registered");
            return None;
        };

        let ray = LosRay::new(start, end)?;

        Self::refresh_scene(&mgr)?;
        let guard = match mgr.read() {
            Ok(guard) => guard,
            Err(_) => {
                crate::engine_error!("galaxy3d::VisLos", "PageTreeManager lock poisoned");
                return None;
            }
        };

        self.ray = Some(ray);
        let mut hit = None;

        let mut node_hits = std::mem::take(&mut self.node_hits);
        self.harvest(guard.space_tree(), &mut node_hits);

        for node_hit in &node_hits {
            if node_hit.closest > self.max_dist() {
                break;
            }
            if let Some(node) = guard.node_for_leaf(node_hit.index) {
                if let Some(pos) = self.check_scene_node(node) {
                    hit = Some(pos);
                }
            }
        }
        self.node_hits = node_hits;
        self.ray = None;

        crate::engine_trace!(
            "galaxy3d::VisLos",
            "LOS {} -> {}: {}",
            start,
            end,
            match hit {
                Some(pos) => format!("hit at {}", pos),
                None => "clear".to_string(),
            }
        );

        hit.map(|pos| VisHit { pos })
    }

    /// Pick under the camera's cursor, out to `CURSOR_RAY_DIST`
    pub fn cursor_check(&mut self, camera: &Camera) -> Option<VisHit> {
        let (start, end) = camera.cursor_ray(CURSOR_RAY_DIST);
        self.check(start, end)
    }

    /// Same result as `check` by testing every triangle of every enabled
    /// scene node. Used to validate the pruned traversal.
    pub fn check_brute_force(&self, start: Vec3, end: Vec3) -> Option<VisHit> {
        let mgr = self.page_tree_mgr.as_ref()?;
        let ray = LosRay::new(start, end)?;
        Self::refresh_scene(mgr)?;
        let guard = mgr.read().ok()?;

        let tree = guard.space_tree();
        let mut best: Option<(f32, Vec3)> = None;

        for leaf in 0..tree.num_leaves() as u16 {
            if tree.node(leaf).is_disabled() {
                continue;
            }
            let Some(node) = guard.node_for_leaf(leaf) else { continue };
            for (d_idx, drawable) in node.drawables().iter().enumerate() {
                if node.space_tree().node(d_idx as u16).is_disabled() {
                    continue;
                }
                for (s_idx, span) in drawable.spans().iter().enumerate() {
                    if drawable.space_tree().node(s_idx as u16).is_disabled()
                        || !drawable.accepts_los_span(s_idx)
                    {
                        continue;
                    }
                    let two_sided = Self::is_two_sided(drawable, span);
                    let local = Self::local_ray(span, &ray);
                    let Some(local) = local else { continue };
                    for tri in 0..span.num_triangles() {
                        if let Some(d) = check_triangle(&local, &span.triangle(tri), two_sided) {
                            let pos = span.local_to_world().transform_point3(local.point_at(d));
                            let dist = (pos - start).length();
                            if best.map_or(true, |(b, _)| dist < b) {
                                best = Some((dist, pos));
                            }
                        }
                    }
                }
            }
        }

        best.map(|(_, pos)| VisHit { pos })
    }

    // ===== TRAVERSAL =====

    fn refresh_scene(mgr: &Arc<RwLock<PageTreeManager>>) -> Option<()> {
        let dirty = match mgr.read() {
            Ok(guard) => guard.is_dirty(),
            Err(_) => {
                crate::engine_error!("galaxy3d::VisLos", "PageTreeManager lock poisoned");
                return None;
            }
        };
        if dirty {
            let mut guard = match mgr.write() {
                Ok(guard) => guard,
                Err(_) => {
                    crate::engine_error!("galaxy3d::VisLos", "PageTreeManager lock poisoned");
                    return None;
                }
            };
            if let Err(e) = guard.refresh() {
                crate::engine_warn!("galaxy3d::VisLos", "Cannot rebuild the page tree: {}", e);
                return None;
            }
        }
        Some(())
    }

    fn max_dist(&self) -> f32 {
        self.ray.map_or(0.0, |r| r.max_dist)
    }

    /// Collect the enabled leaves of `tree` crossed by the current ray,
    /// nearest first. `out` is cleared first.
    fn harvest(&self, tree: &SpaceTree, out: &mut Vec<SpaceHit>) {
        out.clear();
        let (Some(ray), Some(root)) = (self.ray.as_ref(), tree.root()) else { return };
        Self::harvest_recursive(tree, root, ray, out);
        out.sort_by(|a, b| a.closest.total_cmp(&b.closest));
    }

    fn harvest_recursive(tree: &SpaceTree, idx: u16, ray: &LosRay, out: &mut Vec<SpaceHit>) {
        let node = tree.node(idx);
        if node.is_disabled() {
            return;
        }
        let Some(closest) = check_bound(node.world_bounds(), ray) else { return };
        match node.children() {
            None => out.push(SpaceHit { index: idx, closest }),
            Some([l, r]) => {
                Self::harvest_recursive(tree, l, ray, out);
                Self::harvest_recursive(tree, r, ray, out);
            }
        }
    }

    fn check_scene_node(&mut self, node: &SceneNode) -> Option<Vec3> {
        let mut hit = None;
        let mut drawable_hits = std::mem::take(&mut self.drawable_hits);
        self.harvest(node.space_tree(), &mut drawable_hits);

        for d_hit in &drawable_hits {
            if d_hit.closest > self.max_dist() {
                break;
            }
            if let Some(drawable) = node.drawable(d_hit.index as usize) {
                if let Some(pos) = self.check_drawable(drawable) {
                    hit = Some(pos);
                }
            }
        }
        self.drawable_hits = drawable_hits;
        hit
    }

    fn check_drawable(&mut self, drawable: &Drawable) -> Option<Vec3> {
        let mut hit = None;
        let mut span_hits = std::mem::take(&mut self.span_hits);
        self.harvest(drawable.space_tree(), &mut span_hits);

        for s_hit in &span_hits {
            if s_hit.closest > self.max_dist() {
                break;
            }
            let idx = s_hit.index as usize;
            if !drawable.accepts_los_span(idx) {
                continue;
            }
            let Some(span) = drawable.span(idx) else { continue };
            if let Some(pos) = self.check_span(span, Self::is_two_sided(drawable, span)) {
                hit = Some(pos);
            }
        }
        self.span_hits = span_hits;
        hit
    }

    /// Test every triangle of a span in its local space. A hit moves the
    /// manager's ray target in to the hit.
    fn check_span(&mut self, span: &Span, two_sided: bool) -> Option<Vec3> {
        let world_ray = self.ray?;
        let mut local = Self::local_ray(span, &world_ray)?;

        let mut found = None;
        for tri in 0..span.num_triangles() {
            if let Some(d) = check_triangle(&local, &span.triangle(tri), two_sided) {
                local.max_dist = d;
                found = Some(local.point_at(d));
            }
        }

        let world_pos = span.local_to_world().transform_point3(found?);
        if let Some(ray) = self.ray.as_mut() {
            ray.target = world_pos;
            ray.max_dist = (world_pos - ray.from).length();
        }
        Some(world_pos)
    }

    fn local_ray(span: &Span, ray: &LosRay) -> Option<LosRay> {
        let w2l = span.world_to_local();
        LosRay::new(w2l.transform_point3(ray.from), w2l.transform_point3(ray.target))
    }

    fn is_two_sided(drawable: &Drawable, span: &Span) -> bool {
        drawable
            .material(span.material_index())
            .is_some_and(|m| m.is_two_sided())
    }
}

#[cfg(test)]
#[path = "vis_los_manager_tests.rs"]
mod tests;
