//! Read-only queries over a built hierarchy.
//!
//! Viewports are given in longitude/latitude and may cross the antimeridian;
//! results are [`ClusterRecord`]s with geographic coordinates, detached from
//! the hierarchy.

use crate::compute::projection::{clamp_lat, lat_y, lng_x, normalize_lng};
use crate::hierarchy::Hierarchy;
use crate::model::ClusterKey;
use geo::Coord;
use geocluster_types::{ClusterRecord, Viewport};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

/// A viewport normalized to at most two non-wrapping longitude spans.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Span {
    west: f64,
    south: f64,
    east: f64,
    north: f64,
}

impl Span {
    /// Projected lower-left and upper-right corners. Latitude grows towards
    /// smaller `y`, so the north edge gives the lower corner.
    fn corners(&self) -> (Coord, Coord) {
        (
            Coord {
                x: lng_x(self.west),
                y: lat_y(self.north),
            },
            Coord {
                x: lng_x(self.east),
                y: lat_y(self.south),
            },
        )
    }
}

fn split_viewport(viewport: &Viewport) -> Vec<Span> {
    let south = clamp_lat(viewport.south);
    let north = clamp_lat(viewport.north);
    if viewport.spans_all_longitudes() {
        return vec![Span {
            west: -180.0,
            south,
            east: 180.0,
            north,
        }];
    }

    let west = normalize_lng(viewport.west);
    let east = if viewport.east == 180.0 {
        180.0
    } else {
        normalize_lng(viewport.east)
    };
    if west > east {
        vec![
            Span {
                west,
                south,
                east: 180.0,
                north,
            },
            Span {
                west: -180.0,
                south,
                east,
                north,
            },
        ]
    } else {
        vec![Span {
            west,
            south,
            east,
            north,
        }]
    }
}

/// Clamp a requested zoom to the stored levels.
pub fn clamp_zoom(hierarchy: &Hierarchy, zoom: u8) -> u8 {
    zoom.clamp(hierarchy.min_zoom(), hierarchy.top_zoom())
}

/// Nodes visible in `viewport` at `zoom`, each once.
pub fn viewport_keys(hierarchy: &Hierarchy, viewport: &Viewport, zoom: u8) -> Vec<ClusterKey> {
    let level = hierarchy.level(clamp_zoom(hierarchy, zoom));
    let mut seen = FxHashSet::default();
    let mut keys = Vec::new();
    for span in split_viewport(viewport) {
        let (lower_left, upper_right) = span.corners();
        for adv in level.advocators.range(lower_left, upper_right) {
            if seen.insert(adv.cluster) {
                keys.push(adv.cluster);
            }
        }
    }
    keys
}

/// Cluster records visible in `viewport` at `zoom`.
pub fn clusters(hierarchy: &Hierarchy, viewport: &Viewport, zoom: u8) -> Vec<ClusterRecord> {
    viewport_keys(hierarchy, viewport, zoom)
        .into_iter()
        .map(|key| hierarchy.record(key))
        .collect()
}

/// Every node of a level, or `None` for a zoom outside the hierarchy.
pub fn clusters_at(hierarchy: &Hierarchy, zoom: u8) -> Option<Vec<ClusterRecord>> {
    let level = hierarchy.try_level(zoom)?;
    Some(level.members.iter().map(|key| hierarchy.record(key)).collect())
}

/// The node of level `zoom` with external id `id`.
pub fn find(hierarchy: &Hierarchy, zoom: u8, id: i64) -> Option<ClusterKey> {
    let level = hierarchy.try_level(zoom)?;
    level.members.iter().find(|&key| hierarchy.arena()[key].id() == id)
}

/// Projected distance between two nodes of level `zoom`.
pub fn cluster_distance(hierarchy: &Hierarchy, zoom: u8, a: i64, b: i64) -> Option<f64> {
    let level = hierarchy.try_level(zoom)?;
    let arena = hierarchy.arena();
    let (mut first, mut second) = (None, None);
    for key in level.members.iter() {
        let node = &arena[key];
        let id = node.id();
        if id == a {
            first = Some(node);
        }
        if id == b {
            second = Some(node);
        }
        if first.is_some() && second.is_some() {
            break;
        }
    }
    let (first, second) = (first?, second?);
    Some(first.distance_to(second.x, second.y))
}

/// For every loaded point in load order, the id of the node holding it at `zoom`.
pub fn labels(hierarchy: &Hierarchy, zoom: u8) -> Option<Vec<i64>> {
    if !hierarchy.contains_zoom(zoom) {
        return None;
    }
    let arena = hierarchy.arena();
    (0..hierarchy.owners.len())
        .map(|point| hierarchy.node_at(point, zoom).map(|key| arena[key].id()))
        .collect()
}

/// How the spread of a node's children is summarized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMeasure {
    #[default]
    Avg,
    Min,
    Max,
}

impl fmt::Display for DistanceMeasure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DistanceMeasure::Avg => "avg",
            DistanceMeasure::Min => "min",
            DistanceMeasure::Max => "max",
        })
    }
}

impl FromStr for DistanceMeasure {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "avg" | "average" => Ok(DistanceMeasure::Avg),
            "min" => Ok(DistanceMeasure::Min),
            "max" => Ok(DistanceMeasure::Max),
            other => Err(format!("unknown distance measure: {}", other)),
        }
    }
}

/// Parameters of a tree-cut query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeCut {
    pub measure: DistanceMeasure,
    /// On-screen separation, in pixels, at which children count as distinct
    pub pixels: f64,
    /// Keep the heaviest half of the mass as-is before expanding the rest
    pub bipartite: bool,
}

impl Default for TreeCut {
    fn default() -> Self {
        Self {
            measure: DistanceMeasure::Avg,
            pixels: 4.0,
            bipartite: false,
        }
    }
}

impl TreeCut {
    /// Projected distance that `pixels` covers at `zoom`, a level radius
    /// being drawn 20 pixels wide.
    pub fn differentiable_distance(&self, hierarchy: &Hierarchy, zoom: u8) -> f64 {
        hierarchy.radius(zoom) / 20.0 * self.pixels
    }
}

/// Whether the children of `key` would be told apart on screen.
fn differentiable(hierarchy: &Hierarchy, key: ClusterKey, measure: DistanceMeasure, distance: f64) -> bool {
    let arena = hierarchy.arena();
    let children = &arena[key].children;
    match children.len() {
        0 => return false,
        1 => return true,
        _ => {}
    }

    let (mut sum, mut min, mut max) = (0.0, f64::MAX, 0.0f64);
    let mut pairs = 0usize;
    for (i, &a) in children.iter().enumerate() {
        for &b in &children[i + 1..] {
            let d = arena[a].distance_to(arena[b].x, arena[b].y);
            sum += d;
            min = min.min(d);
            max = max.max(d);
            pairs += 1;
        }
    }
    let metric = match measure {
        DistanceMeasure::Avg => sum / pairs as f64,
        DistanceMeasure::Min => min,
        DistanceMeasure::Max => max,
    };
    metric >= distance
}

/// Viewport query followed by a tree cut: clusters whose children are far
/// enough apart to be told apart at `zoom` are replaced by those children,
/// breadth first, until every remaining node is indivisible on screen.
pub fn tree_cut(hierarchy: &Hierarchy, viewport: &Viewport, zoom: u8, cut: &TreeCut) -> Vec<ClusterRecord> {
    let view_zoom = clamp_zoom(hierarchy, zoom);
    let distance = cut.differentiable_distance(hierarchy, view_zoom);
    let arena = hierarchy.arena();
    let mut frontier = viewport_keys(hierarchy, viewport, zoom);
    let mut kept = Vec::new();

    if cut.bipartite {
        while frontier.len() > 3 {
            frontier.sort_by_key(|&key| {
                let node = &arena[key];
                Reverse(if node.count.is_raw() { 0 } else { node.weight() })
            });
            if arena[frontier[0]].count.is_raw() {
                break;
            }

            let total: u64 = frontier.iter().map(|&key| u64::from(arena[key].weight())).sum();
            let mut left = 0u64;
            let mut split = 0;
            for (i, &key) in frontier[..frontier.len() - 1].iter().enumerate() {
                left += u64::from(arena[key].weight());
                if left >= total - left {
                    split = i;
                    break;
                }
            }
            log::debug!("tree cut keeps {} of {} frontier nodes", split + 1, frontier.len());

            let rest = frontier.split_off(split + 1);
            kept.append(&mut frontier);
            for key in rest {
                if differentiable(hierarchy, key, cut.measure, distance) {
                    frontier.extend_from_slice(&arena[key].children);
                } else {
                    kept.push(key);
                }
            }
        }
    }

    let mut queue: VecDeque<ClusterKey> = frontier.into();
    while let Some(key) = queue.pop_front() {
        if differentiable(hierarchy, key, cut.measure, distance) {
            queue.extend(arena[key].children.iter().copied());
        } else {
            kept.push(key);
        }
    }

    kept.into_iter().map(|key| hierarchy.record(key)).collect()
}

/// Zoom at which the node `id` of level `zoom` first splits into several
/// children, when the hierarchy recorded one.
pub fn expansion_zoom(hierarchy: &Hierarchy, zoom: u8, id: i64) -> Option<u8> {
    let key = find(hierarchy, zoom, id)?;
    hierarchy.arena()[key].expansion_zoom
}
