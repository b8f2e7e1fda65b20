//! Inertial sensor: body-frame specific force and angular velocity.
//!
//! Runs two rates: a native high-rate update (noise integration fidelity)
//! and a lower publish rate gating what reaches the assembler. A 100 Hz
//! native / 20 Hz publish configuration folds five internal updates into
//! each surfaced sample.

use contracts::{InertialData, SensorPayload, SensorSample, SensorSpec, Vector3};
use nalgebra as na;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sim_core::convert::{unit_quat, vec3};
use sim_core::GRAVITY;

use crate::noise::NoiseChannel;
use crate::sensors::{sensor_seed, Sensor, WorldView, DUE_TOLERANCE};

/// Inertial sensor instance
pub struct InertialSensor {
    spec: SensorSpec,
    sample: SensorSample,
    rng: ChaCha8Rng,
    accel_noise: [NoiseChannel; 3],
    gyro_noise: [NoiseChannel; 3],
    /// Simulation time of the last native-rate update
    last_integration: f64,
    /// Native-rate updates since the last surfaced sample
    pending_steps: u32,
    /// Latest integrated body-frame readings
    latest_accel: na::Vector3<f64>,
    latest_gyro: na::Vector3<f64>,
}

impl InertialSensor {
    pub fn new(spec: SensorSpec) -> Self {
        let noise = spec.noise;
        let make = || {
            [
                NoiseChannel::new(noise),
                NoiseChannel::new(noise),
                NoiseChannel::new(noise),
            ]
        };
        Self {
            sample: SensorSample::initial(SensorPayload::Inertial(InertialData {
                lin_accel: Vector3::ZERO,
                ang_vel: Vector3::ZERO,
                integration_steps: 0,
            })),
            rng: ChaCha8Rng::seed_from_u64(sensor_seed(0, &spec.name)),
            accel_noise: make(),
            gyro_noise: make(),
            last_integration: 0.0,
            pending_steps: 0,
            latest_accel: na::Vector3::zeros(),
            latest_gyro: na::Vector3::zeros(),
            spec,
        }
    }

    /// Body-frame specific force and angular rate from world-frame truth.
    fn body_readings(view: &WorldView<'_>) -> (na::Vector3<f64>, na::Vector3<f64>) {
        let rotation = unit_quat(&view.truth.pose.rotation);
        // Accelerometers measure specific force: a_world - g, with g = -GRAVITY ez
        let specific_force =
            vec3(&view.truth.lin_accel) + na::Vector3::new(0.0, 0.0, GRAVITY);
        let accel = rotation.inverse_transform_vector(&specific_force);
        let gyro = rotation.inverse_transform_vector(&vec3(&view.truth.ang_vel));
        (accel, gyro)
    }
}

impl Sensor for InertialSensor {
    fn spec(&self) -> &SensorSpec {
        &self.spec
    }

    fn integrate(&mut self, now: f64, view: &WorldView<'_>) {
        if now - self.last_integration < self.spec.native_period() - DUE_TOLERANCE {
            return;
        }
        self.last_integration = now;
        self.pending_steps += 1;

        for channel in self.accel_noise.iter_mut().chain(self.gyro_noise.iter_mut()) {
            channel.step(&mut self.rng);
        }

        let (accel, gyro) = Self::body_readings(view);
        self.latest_accel = accel;
        self.latest_gyro = gyro;
    }

    fn refresh(&mut self, now: f64, _view: &WorldView<'_>) {
        let mut accel = [0.0f64; 3];
        let mut gyro = [0.0f64; 3];
        for axis in 0..3 {
            accel[axis] = self.accel_noise[axis].apply(self.latest_accel[axis], &mut self.rng);
            gyro[axis] = self.gyro_noise[axis].apply(self.latest_gyro[axis], &mut self.rng);
        }

        let lin_accel = Vector3::new(accel[0], accel[1], accel[2]);
        let ang_vel = Vector3::new(gyro[0], gyro[1], gyro[2]);

        // Out-of-range readings are surfaced invalid, never clipped
        let in_range = self.spec.limits.contains(lin_accel.norm())
            && self.pending_steps > 0;

        self.sample = SensorSample {
            timestamp: now,
            valid: in_range,
            payload: SensorPayload::Inertial(InertialData {
                lin_accel,
                ang_vel,
                integration_steps: self.pending_steps,
            }),
        };
        self.pending_steps = 0;
    }

    fn sample(&self) -> &SensorSample {
        &self.sample
    }

    fn reset(&mut self, episode_seed: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(sensor_seed(episode_seed, &self.spec.name));
        let model = self.spec.noise;
        for channel in self.accel_noise.iter_mut().chain(self.gyro_noise.iter_mut()) {
            *channel = NoiseChannel::new(model);
        }
        self.last_integration = 0.0;
        self.pending_steps = 0;
        self.latest_accel = na::Vector3::zeros();
        self.latest_gyro = na::Vector3::zeros();
        self.sample = SensorSample::initial(SensorPayload::Inertial(InertialData {
            lin_accel: Vector3::ZERO,
            ang_vel: Vector3::ZERO,
            integration_steps: 0,
        }));
    }
}
