//! Simulated-annealing search over (tx, tz, θ).

use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use super::model::{AlignmentSolver, Solution};

/// Fixed iteration count; the temperature schedule is linear over it.
const ITERATIONS: usize = 20_000;

/// Mutation scale for tx/tz, in sky-frame distance units.
const TRANSLATION_SCALE: f64 = 200.0;

/// Mutation scale for the rotation, degrees.
const ROTATION_SCALE: f64 = 360.0;

/// Consecutive non-improving steps before the working state restarts
/// at the best known solution.
const RESTART_AFTER_STALLS: u32 = 200;

/// Runs the annealing search and returns the best state visited.
///
/// The working state may wander; the returned solution is always the
/// best-energy state seen, never the final wandering position.
pub(super) fn search(solver: &AlignmentSolver, seed: u64) -> Solution {
    let mut rng = StdRng::seed_from_u64(seed);

    let (mut tx, mut tz, mut rot) = (0.0_f64, 0.0_f64, 0.0_f64);
    let mut best = (tx, tz, rot);
    let mut best_energy = solver.energy(tx, tz, rot);
    let mut stalls = 0u32;

    for k in 0..ITERATIONS {
        let temperature = 1.0 - (k + 1) as f64 / ITERATIONS as f64;

        let (mut cand_tx, mut cand_tz, mut cand_rot) = (tx, tz, rot);
        match rng.random_range(0..3) {
            0 => cand_tx = tx + centered_unit(&mut rng) * TRANSLATION_SCALE * temperature,
            1 => cand_tz = tz + centered_unit(&mut rng) * TRANSLATION_SCALE * temperature,
            _ => {
                cand_rot = (rot + centered_unit(&mut rng) * ROTATION_SCALE * temperature)
                    .rem_euclid(360.0)
            }
        }

        let energy = solver.energy(cand_tx, cand_tz, cand_rot);

        if energy < best_energy {
            best = (cand_tx, cand_tz, cand_rot);
            best_energy = energy;
            (tx, tz, rot) = (cand_tx, cand_tz, cand_rot);
            stalls = 0;
        } else if temperature > 0.0 {
            stalls += 1;
            if stalls >= RESTART_AFTER_STALLS {
                // Escape the local neighborhood by resuming from the
                // best known state.
                (tx, tz, rot) = best;
                stalls = 0;
                continue;
            }

            // Metropolis criterion: worse states are reachable early,
            // increasingly unlikely as the temperature drops.
            let accept = (-(energy - best_energy) / temperature).exp();
            if rng.random::<f64>() <= accept {
                (tx, tz, rot) = (cand_tx, cand_tz, cand_rot);
            }
        }
    }

    debug!(
        tx = best.0,
        tz = best.1,
        rotation_deg = best.2,
        energy = best_energy,
        "alignment search finished"
    );

    Solution {
        translation: Vector3::new(best.0, 0.0, best.1),
        rotation_deg: best.2,
        energy: best_energy,
    }
}

/// Uniform sample in (-0.5, 0.5).
fn centered_unit(rng: &mut StdRng) -> f64 {
    rng.random::<f64>() - 0.5
}
