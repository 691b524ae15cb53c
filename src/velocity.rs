/// Finite-difference drift velocity estimation
///
/// Velocities are eastward (u) and northward (v) components in m/s, built
/// from Haversine displacement between consecutive fixes. The
/// forward-backward method computes both one-sided estimates and keeps
/// whichever has the smaller speed, so a single displaced fix contaminates
/// only its own sample instead of smearing across two differences.

use geo::{point, HaversineBearing, HaversineDistance};

use crate::track::{Observation, Track};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DifferenceMethod {
    Forward,
    Backward,
    /// Per point, the one-sided estimate with the smaller magnitude.
    ForwardBackward,
}

#[derive(Debug, Clone, Copy)]
pub struct VelocitySample {
    pub u: f64,
    pub v: f64,
    pub speed: f64,
}

impl VelocitySample {
    fn undefined() -> Self {
        VelocitySample {
            u: f64::NAN,
            v: f64::NAN,
            speed: f64::NAN,
        }
    }

    pub fn is_defined(&self) -> bool {
        self.u.is_finite() && self.v.is_finite()
    }
}

/// Velocity of the displacement from `a` to `b`. Undefined for a
/// non-positive time step (clock reversals should be gone by this stage,
/// but a zero step can survive sub-minute rounding).
fn step_velocity(a: &Observation, b: &Observation) -> VelocitySample {
    let dt = (b.datetime - a.datetime).num_seconds() as f64;
    if dt <= 0.0 {
        return VelocitySample::undefined();
    }

    let from = point!(x: a.longitude, y: a.latitude);
    let to = point!(x: b.longitude, y: b.latitude);

    let distance = from.haversine_distance(&to);
    let bearing = from.haversine_bearing(to).to_radians();

    let u = distance * bearing.sin() / dt;
    let v = distance * bearing.cos() / dt;

    VelocitySample {
        u,
        v,
        speed: (u * u + v * v).sqrt(),
    }
}

pub fn compute_velocity(track: &Track, method: DifferenceMethod) -> Vec<VelocitySample> {
    let n = track.len();
    let mut samples = Vec::with_capacity(n);

    for i in 0..n {
        let forward = if i + 1 < n {
            Some(step_velocity(&track.obs[i], &track.obs[i + 1]))
        } else {
            None
        };
        let backward = if i > 0 {
            Some(step_velocity(&track.obs[i - 1], &track.obs[i]))
        } else {
            None
        };

        let sample = match method {
            DifferenceMethod::Forward => forward.unwrap_or_else(VelocitySample::undefined),
            DifferenceMethod::Backward => backward.unwrap_or_else(VelocitySample::undefined),
            DifferenceMethod::ForwardBackward => match (forward, backward) {
                (Some(f), Some(b)) => {
                    if !f.is_defined() {
                        b
                    } else if !b.is_defined() {
                        f
                    } else if f.speed <= b.speed {
                        f
                    } else {
                        b
                    }
                }
                (Some(f), None) => f,
                (None, Some(b)) => b,
                (None, None) => VelocitySample::undefined(),
            },
        };

        samples.push(sample);
    }

    samples
}
