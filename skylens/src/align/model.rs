//! Alignment model: references, observations, and the energy function.

use std::collections::HashMap;

use nalgebra::{Rotation3, Vector3};
use tracing::debug;

/// Energy reported when there are no usable observations.
///
/// Only meaningful relative to other energies during comparison; never
/// interpret it as a calibrated distance.
pub const EMPTY_ENERGY: f64 = 1.0e9;

/// A recorded sightline in the working frame.
///
/// Immutable once recorded: `origin` is where the observer stood,
/// `direction` points along the line of sight toward a landmark.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub origin: Vector3<f64>,
    pub direction: Vector3<f64>,
}

/// Result of an alignment solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Solution {
    /// Planar translation; the Y component is always zero.
    pub translation: Vector3<f64>,
    /// Yaw about +Y, degrees in [0, 360).
    pub rotation_deg: f64,
    /// Root-mean-square sightline miss distance at the solution.
    pub energy: f64,
}

/// Reference positions and recorded sightlines per landmark.
///
/// Mutated only through this API; `solve` is a pure read.
#[derive(Debug, Default)]
pub struct AlignmentSolver {
    references: HashMap<String, Vector3<f64>>,
    observations: HashMap<String, Vec<Observation>>,
}

impl AlignmentSolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets (or replaces) a landmark's reference position.
    pub fn set_reference(&mut self, id: impl Into<String>, position: Vector3<f64>) {
        let id = id.into();
        debug!(landmark = %id, "alignment reference set");
        self.references.insert(id, position);
    }

    /// Records a sightline toward a landmark.
    pub fn add_observation(
        &mut self,
        id: impl Into<String>,
        origin: Vector3<f64>,
        direction: Vector3<f64>,
    ) {
        self.observations
            .entry(id.into())
            .or_default()
            .push(Observation { origin, direction });
    }

    /// Drops all observations for one landmark, keeping the others.
    pub fn remove_observations(&mut self, id: &str) {
        self.observations.remove(id);
    }

    /// Number of observations recorded for a landmark; 0 when unknown.
    pub fn observation_count(&self, id: &str) -> usize {
        self.observations.get(id).map_or(0, Vec::len)
    }

    /// Total observations across all landmarks.
    pub fn total_observations(&self) -> usize {
        self.observations.values().map(Vec::len).sum()
    }

    /// Number of landmark reference positions currently set.
    pub fn reference_count(&self) -> usize {
        self.references.len()
    }

    pub fn clear_references(&mut self) {
        self.references.clear();
    }

    pub fn clear_observations(&mut self) {
        self.observations.clear();
    }

    /// Resets both maps.
    pub fn clear(&mut self) {
        self.clear_references();
        self.clear_observations();
    }

    /// Solves for the best transform with an entropy-seeded search.
    pub fn solve(&self) -> Solution {
        super::anneal::search(self, rand::random())
    }

    /// Solves with a fixed PRNG seed; same seed, same result.
    pub fn solve_seeded(&self, seed: u64) -> Solution {
        super::anneal::search(self, seed)
    }

    /// RMS sightline miss distance for a candidate transform.
    ///
    /// Each observation's origin and a second point along its direction
    /// are rotated by `rotation_deg` about +Y and translated by
    /// `(tx, 0, tz)`; the miss is the perpendicular distance, in the
    /// horizontal plane only, from the landmark reference to the
    /// infinite line through the transformed points. Observations for
    /// landmarks without a reference do not contribute.
    pub(super) fn energy(&self, tx: f64, tz: f64, rotation_deg: f64) -> f64 {
        let rotation =
            Rotation3::from_axis_angle(&Vector3::y_axis(), rotation_deg.to_radians());
        let translation = Vector3::new(tx, 0.0, tz);

        let mut sum_sq = 0.0;
        let mut count = 0usize;

        for (id, observations) in &self.observations {
            let Some(reference) = self.references.get(id) else {
                continue;
            };

            for observation in observations {
                let p = rotation * observation.origin + translation;
                let q = rotation * (observation.origin + observation.direction) + translation;
                let miss = line_point_distance_xz(&p, &q, reference);
                sum_sq += miss * miss;
                count += 1;
            }
        }

        if count == 0 {
            return EMPTY_ENERGY;
        }
        (sum_sq / count as f64).sqrt()
    }
}

/// Distance from point `t` to the infinite line through `p` and `q`,
/// measured in the XZ plane.
///
/// A sightline with no horizontal component carries no horizontal
/// information; it degrades to the XZ distance between its origin and
/// the target.
fn line_point_distance_xz(p: &Vector3<f64>, q: &Vector3<f64>, t: &Vector3<f64>) -> f64 {
    let dx = q.x - p.x;
    let dz = q.z - p.z;
    let den = (dx * dx + dz * dz).sqrt();
    if den < 1.0e-12 {
        let ox = t.x - p.x;
        let oz = t.z - p.z;
        return (ox * ox + oz * oz).sqrt();
    }
    let num = (dx * (p.z - t.z) - (p.x - t.x) * dz).abs();
    num / den
}
