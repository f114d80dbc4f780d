use super::dynamics::Kinematics;
use super::Control;
use crate::error::{non_negative, positive, Error, Result};
use crate::fundamental::FundamentalDiagram;
use crate::util::Interval;
use rand::Rng;
use rand_distr::{Distribution, Normal};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The default gain of each Tampere term.
const TAMPERE_GAIN: f64 = 0.5;

/// The default standard deviation of the Tampere acceleration noise, in m/s<sup>2</sup>.
const NOISE_STDDEV: f64 = 0.05; // m/s^2

/// The default acceleration band of the Tampere model, in m/s<sup>2</sup>.
const ACC_RANGE: Interval<f64> = Interval::new(-3.0, 3.0); // m/s^2

/// Divides the free flow term of a vehicle at the head of a platoon,
/// so it follows its boundary signal with some lag.
const BOUNDARY_DAMPING: f64 = 4.0;

/// The default maximum acceleration of the IDM, in m/s<sup>2</sup>.
const IDM_MAX_ACC: f64 = 3.0; // m/s^2

/// The default comfortable deceleration of the IDM, in m/s<sup>2</sup>.
const IDM_COMF_DEC: f64 = 1.67; // m/s^2

/// The default acceleration exponent of the IDM.
const IDM_EXPONENT: f64 = 4.0;

/// The default minimum gap of the IDM, in m.
const IDM_MIN_GAP: f64 = 2.0; // m

/// The parameters of the Tampere car following model.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TampereParams {
    /// The speed difference gain, in s<sup>-1</sup>.
    pub c1: f64,
    /// The spacing error gain, in s<sup>-2</sup>.
    pub c2: f64,
    /// The free flow gain, in s<sup>-1</sup>.
    pub c3: f64,
    /// The standard deviation of the noise added to each acceleration, in m/s<sup>2</sup>.
    pub noise: f64,
    /// The band accelerations are clamped to, in m/s<sup>2</sup>.
    pub acc_range: Interval<f64>,
}

impl Default for TampereParams {
    fn default() -> Self {
        Self {
            c1: TAMPERE_GAIN,
            c2: TAMPERE_GAIN,
            c3: TAMPERE_GAIN,
            noise: NOISE_STDDEV,
            acc_range: ACC_RANGE,
        }
    }
}

/// The parameters of the intelligent driver model.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IdmParams {
    /// The maximum acceleration in m/s<sup>2</sup>.
    pub max_acc: f64,
    /// The comfortable deceleration in m/s<sup>2</sup>, a positive number.
    pub comf_dec: f64,
    /// The acceleration exponent.
    pub exponent: f64,
    /// The minimum bumper to bumper gap in m.
    pub min_gap: f64,
}

impl Default for IdmParams {
    fn default() -> Self {
        Self {
            max_acc: IDM_MAX_ACC,
            comf_dec: IDM_COMF_DEC,
            exponent: IDM_EXPONENT,
            min_gap: IDM_MIN_GAP,
        }
    }
}

/// A car following law, selected per vehicle.
#[derive(Clone, Debug)]
pub enum CarFollowingLaw {
    Tampere(Tampere),
    Idm(Idm),
}

impl CarFollowingLaw {
    /// Computes the acceleration of a vehicle for the coming step.
    ///
    /// # Parameters
    /// * `ego` - The vehicle's own state
    /// * `leader` - The leader's state, or `None` at the head of a platoon
    /// * `desired_speed` - The speed the vehicle wants to travel at, in m/s
    /// * `control` - The external control signal, only used without a leader
    /// * `fd` - The fundamental diagram of the road
    /// * `rng` - The source of randomness for stochastic laws
    pub fn compute_acceleration<R: Rng + ?Sized>(
        &self,
        ego: &Kinematics,
        leader: Option<&Kinematics>,
        desired_speed: f64,
        control: Control,
        fd: &FundamentalDiagram,
        rng: &mut R,
    ) -> f64 {
        match self {
            Self::Tampere(law) => {
                law.compute_acceleration(ego, leader, desired_speed, control, fd, rng)
            }
            Self::Idm(law) => law.compute_acceleration(ego, leader, desired_speed, control, fd),
        }
    }
}

impl Default for CarFollowingLaw {
    fn default() -> Self {
        Self::Tampere(Tampere::default())
    }
}

impl From<Tampere> for CarFollowingLaw {
    fn from(law: Tampere) -> Self {
        Self::Tampere(law)
    }
}

impl From<Idm> for CarFollowingLaw {
    fn from(law: Idm) -> Self {
        Self::Idm(law)
    }
}

/// The Tampere car following model: the minimum of a congested term,
/// which tracks the leader's speed and the equilibrium spacing,
/// and a free flow term, which tracks the desired speed.
#[derive(Clone, Debug)]
pub struct Tampere {
    params: TampereParams,
    noise: Option<Normal<f64>>,
}

impl Tampere {
    /// Creates a new Tampere model.
    pub fn new(params: &TampereParams) -> Result<Self> {
        non_negative("c1", params.c1)?;
        non_negative("c2", params.c2)?;
        non_negative("c3", params.c3)?;
        non_negative("noise", params.noise)?;
        let range = params.acc_range;
        if !(range.min.is_finite() && range.max.is_finite() && range.min <= range.max) {
            return Err(Error::InvalidParameter {
                name: "acc_range",
                value: range.length(),
            });
        }
        let noise = if params.noise > 0.0 {
            let distr = Normal::new(0.0, params.noise).map_err(|_| Error::InvalidParameter {
                name: "noise",
                value: params.noise,
            })?;
            Some(distr)
        } else {
            None
        };
        Ok(Self {
            params: *params,
            noise,
        })
    }

    /// The model's parameters.
    pub fn params(&self) -> &TampereParams {
        &self.params
    }

    /// The congested regime acceleration, `c1 * dv + c2 * (gap - s_d)`.
    pub fn congested_acc(
        &self,
        ego: &Kinematics,
        leader: &Kinematics,
        fd: &FundamentalDiagram,
    ) -> f64 {
        let dv = leader.vel - ego.vel;
        let gap = leader.pos - ego.pos;
        self.params.c1 * dv + self.params.c2 * (gap - fd.equilibrium_spacing(ego.vel))
    }

    /// The free flow acceleration, `c3 * (v_d - v)`.
    pub fn free_acc(&self, ego: &Kinematics, desired_speed: f64) -> f64 {
        self.params.c3 * (desired_speed - ego.vel)
    }

    /// Computes an acceleration. See [CarFollowingLaw::compute_acceleration].
    pub fn compute_acceleration<R: Rng + ?Sized>(
        &self,
        ego: &Kinematics,
        leader: Option<&Kinematics>,
        desired_speed: f64,
        control: Control,
        fd: &FundamentalDiagram,
        rng: &mut R,
    ) -> f64 {
        let range = self.params.acc_range;
        let Some(leader) = leader else {
            // The vehicle is a flow boundary
            return match control {
                Control::Acceleration(acc) => range.clamp(acc),
                Control::Speed(speed) => range.clamp(self.free_acc(ego, speed) / BOUNDARY_DAMPING),
                Control::None => range.clamp(self.free_acc(ego, desired_speed) / BOUNDARY_DAMPING),
            };
        };
        let acc = f64::min(self.congested_acc(ego, leader, fd), self.free_acc(ego, desired_speed));
        let noise = self.noise.map(|distr| distr.sample(rng)).unwrap_or(0.0);
        range.clamp(acc + noise)
    }
}

impl Default for Tampere {
    fn default() -> Self {
        Self {
            params: TampereParams::default(),
            noise: Normal::new(0.0, NOISE_STDDEV).ok(),
        }
    }
}

/// The intelligent driver model.
#[derive(Clone, Debug)]
pub struct Idm {
    params: IdmParams,
    /// `2 * sqrt(max_acc * comf_dec)`
    braking_scale: f64,
}

impl Idm {
    /// Creates a new intelligent driver model.
    pub fn new(params: &IdmParams) -> Result<Self> {
        positive("max_acc", params.max_acc)?;
        positive("comf_dec", params.comf_dec)?;
        let product = positive("max_acc * comf_dec", params.max_acc * params.comf_dec)?;
        positive("exponent", params.exponent)?;
        non_negative("min_gap", params.min_gap)?;
        Ok(Self {
            params: *params,
            braking_scale: 2.0 * product.sqrt(),
        })
    }

    /// The model's parameters.
    pub fn params(&self) -> &IdmParams {
        &self.params
    }

    /// The interaction term, `v * dv / (2 * sqrt(a * b))`, where `dv` is the
    /// leader's speed minus own speed.
    pub fn braking_term(&self, ego: &Kinematics, leader: &Kinematics) -> f64 {
        ego.vel * (leader.vel - ego.vel) / self.braking_scale
    }

    /// The desired dynamic gap in m. The reaction time is the integration step.
    pub fn desired_gap(
        &self,
        ego: &Kinematics,
        leader: &Kinematics,
        fd: &FundamentalDiagram,
    ) -> f64 {
        let dynamic = ego.vel * fd.dt() + self.braking_term(ego, leader);
        self.params.min_gap + f64::max(0.0, dynamic)
    }

    /// The acceleration on an empty road.
    fn free_road_acc(&self, vel: f64, desired_speed: f64) -> f64 {
        self.params.max_acc * (1.0 - (vel / desired_speed).powf(self.params.exponent))
    }

    /// Computes an acceleration. See [CarFollowingLaw::compute_acceleration].
    pub fn compute_acceleration(
        &self,
        ego: &Kinematics,
        leader: Option<&Kinematics>,
        desired_speed: f64,
        control: Control,
        fd: &FundamentalDiagram,
    ) -> f64 {
        let Some(leader) = leader else {
            return match control {
                Control::Acceleration(acc) => acc,
                Control::Speed(speed) => self.free_road_acc(ego.vel, speed),
                Control::None => 0.0,
            };
        };
        let gap = leader.pos - ego.pos;
        let interaction = (self.desired_gap(ego, leader, fd) / gap).powi(2);
        self.free_road_acc(ego.vel, desired_speed) - self.params.max_acc * interaction
    }
}

impl Default for Idm {
    fn default() -> Self {
        let params = IdmParams::default();
        Self {
            braking_scale: 2.0 * (params.max_acc * params.comf_dec).sqrt(),
            params,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn noiseless() -> Tampere {
        Tampere::new(&TampereParams {
            noise: 0.0,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn tampere_equilibrium() {
        let fd = FundamentalDiagram::default();
        let law = noiseless();
        let mut rng = StdRng::seed_from_u64(0);
        for vel in [5.0, 12.0, 25.0] {
            let ego = Kinematics::new(0.0, vel);
            let leader = Kinematics::new(fd.equilibrium_spacing(vel), vel);
            assert_approx_eq!(law.congested_acc(&ego, &leader, &fd), 0.0);
        }

        let ego = Kinematics::new(0.0, 25.0);
        let leader = Kinematics::new(fd.equilibrium_spacing(25.0), 25.0);
        let acc = law.compute_acceleration(&ego, Some(&leader), 25.0, Control::None, &fd, &mut rng);
        assert_approx_eq!(acc, 0.0);
    }

    #[test]
    fn tampere_acceleration_is_clamped() {
        let fd = FundamentalDiagram::default();
        let law = Tampere::default();
        let range = law.params().acc_range;
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10_000 {
            let vel = rng.gen_range(0.0..35.0);
            let dv = rng.gen_range(-15.0..15.0);
            let gap = rng.gen_range(0.5..300.0);
            let ego = Kinematics::new(0.0, vel);
            let leader = Kinematics::new(gap, vel + dv);
            let acc =
                law.compute_acceleration(&ego, Some(&leader), 25.0, Control::None, &fd, &mut rng);
            assert!(range.contains(acc), "{acc} outside {range:?}");
        }
    }

    #[test]
    fn tampere_boundary_is_damped() {
        let fd = FundamentalDiagram::default();
        let law = noiseless();
        let mut rng = StdRng::seed_from_u64(0);
        let ego = Kinematics::new(0.0, 21.0);

        let acc = law.compute_acceleration(&ego, None, 25.0, Control::None, &fd, &mut rng);
        assert_approx_eq!(acc, law.free_acc(&ego, 25.0) / 4.0);
        assert_approx_eq!(acc, 0.5);

        let acc = law.compute_acceleration(&ego, None, 25.0, Control::Speed(15.0), &fd, &mut rng);
        assert_approx_eq!(acc, law.free_acc(&ego, 15.0) / 4.0);

        // Clamped to the band
        let acc = law.compute_acceleration(&ego, None, 25.0, Control::Speed(-100.0), &fd, &mut rng);
        assert_approx_eq!(acc, -3.0);
        let control = Control::Acceleration(-7.0);
        let acc = law.compute_acceleration(&ego, None, 25.0, control, &fd, &mut rng);
        assert_approx_eq!(acc, -3.0);
        let control = Control::Acceleration(-1.0);
        let acc = law.compute_acceleration(&ego, None, 25.0, control, &fd, &mut rng);
        assert_approx_eq!(acc, -1.0);
    }

    #[test]
    fn tampere_noise_is_reproducible() {
        let fd = FundamentalDiagram::default();
        let law = Tampere::default();
        let ego = Kinematics::new(0.0, 20.0);
        let leader = Kinematics::new(40.0, 20.0);
        let sample = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut next = || {
                law.compute_acceleration(&ego, Some(&leader), 25.0, Control::None, &fd, &mut rng)
            };
            (0..10).map(|_| next()).collect::<Vec<_>>()
        };
        assert_eq!(sample(3), sample(3));
        assert_ne!(sample(3), sample(4));
    }

    #[test]
    fn tampere_rejects_invalid_params() {
        let result = Tampere::new(&TampereParams {
            noise: -0.1,
            ..Default::default()
        });
        assert!(matches!(result, Err(Error::InvalidParameter { name: "noise", .. })));

        let result = Tampere::new(&TampereParams {
            acc_range: Interval::new(1.0, -1.0),
            ..Default::default()
        });
        assert!(matches!(result, Err(Error::InvalidParameter { name: "acc_range", .. })));
    }

    #[test]
    fn idm_equilibrium_gap() {
        let fd = FundamentalDiagram::default();
        let law = Idm::default();
        let (vel, desired) = (20.0, 25.0);
        let ego = Kinematics::new(0.0, vel);
        let probe = Kinematics::new(0.0, vel);
        let s_d = law.desired_gap(&ego, &probe, &fd);
        let gap = s_d / (1.0 - f64::powf(vel / desired, 4.0)).sqrt();
        let leader = Kinematics::new(gap, vel);
        let acc = law.compute_acceleration(&ego, Some(&leader), desired, Control::None, &fd);
        assert_approx_eq!(acc, 0.0, 1e-9);
    }

    #[test]
    fn idm_free_road_at_desired_speed() {
        let fd = FundamentalDiagram::default();
        let law = Idm::default();
        let ego = Kinematics::new(0.0, 25.0);
        let leader = Kinematics::new(1e9, 25.0);
        let acc = law.compute_acceleration(&ego, Some(&leader), 25.0, Control::None, &fd);
        assert_approx_eq!(acc, 0.0, 1e-6);
    }

    #[test]
    fn idm_desired_gap() {
        let fd = FundamentalDiagram::default();
        let law = Idm::default();
        let ego = Kinematics::new(0.0, 10.0);
        let leader = Kinematics::new(50.0, 12.0);
        let braking = 10.0 * 2.0 / (2.0 * (3.0f64 * 1.67).sqrt());
        assert_approx_eq!(law.braking_term(&ego, &leader), braking);
        assert_approx_eq!(law.desired_gap(&ego, &leader, &fd), 2.0 + 10.0 * fd.dt() + braking);

        // The dynamic part never goes negative
        let stopped = Kinematics::new(0.0, 0.0);
        assert_approx_eq!(law.desired_gap(&stopped, &leader, &fd), 2.0);
    }

    #[test]
    fn idm_boundary_passes_control_through() {
        let fd = FundamentalDiagram::default();
        let law = Idm::default();
        let ego = Kinematics::new(0.0, 20.0);
        let control = Control::Acceleration(-1.25);
        assert_eq!(law.compute_acceleration(&ego, None, 25.0, control, &fd), -1.25);
        assert_eq!(law.compute_acceleration(&ego, None, 25.0, Control::None, &fd), 0.0);
        assert_approx_eq!(
            law.compute_acceleration(&ego, None, 25.0, Control::Speed(20.0), &fd),
            0.0
        );
    }

    #[test]
    fn idm_rejects_invalid_params() {
        let result = Idm::new(&IdmParams {
            comf_dec: -1.67,
            ..Default::default()
        });
        assert!(matches!(result, Err(Error::InvalidParameter { name: "comf_dec", .. })));

        let result = Idm::new(&IdmParams {
            max_acc: 1e-200,
            comf_dec: 1e-200,
            ..Default::default()
        });
        assert!(matches!(
            result,
            Err(Error::InvalidParameter { name: "max_acc * comf_dec", .. })
        ));
    }

    #[test]
    fn idm_gap_is_finite() {
        let fd = FundamentalDiagram::default();
        let law: CarFollowingLaw = Idm::default().into();
        let mut rng = StdRng::seed_from_u64(1);
        for gap in [0.01, 0.5, 3.0, 1000.0] {
            let ego = Kinematics::new(0.0, 15.0);
            let leader = Kinematics::new(gap, 10.0);
            let acc =
                law.compute_acceleration(&ego, Some(&leader), 25.0, Control::None, &fd, &mut rng);
            assert!(acc.is_finite());
        }
    }
}
