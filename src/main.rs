use std::f64::consts::PI;
use std::time::Instant;

use platoon_sim::{
    platoon, AdvisoryDomain, Control, Error, FundamentalDiagram, ScenarioBuilder, SpeedAdvisory,
};

const NUM_VEHICLES: usize = 100;
const NUM_FRAMES: usize = 360;
/// Vehicles which follow a time varying speed advisory.
const ADVISED: [usize; 3] = [10, 30, 50];

/// The acceleration command given to the platoon leader.
fn leader_acc(frame: usize) -> f64 {
    match frame {
        90..=149 => (2.0 * PI * frame as f64 / 60.0).sin(),
        _ => 0.0,
    }
}

/// A smooth drop from 22.5 to 17.5 m/s around t = 200 s.
fn advised_speed(time: f64) -> f64 {
    let step = 1.0 - 1.0 / (1.0 + (-(time - 200.0) / 10.0).exp());
    20.0 + 5.0 * (step - 0.5)
}

fn main() -> Result<(), Error> {
    env_logger::init();

    let fd = FundamentalDiagram::default();
    let mut sim = ScenarioBuilder::new(fd)
        .seed(1)
        .link(20000.0, 1)
        .lane_vehicles(0, 0, platoon(&fd, NUM_VEHICLES, fd.free_flow_speed()))
        .build()?;

    let advised = sim
        .iter_vehicles()
        .filter(|veh| ADVISED.contains(&veh.number()))
        .map(|veh| veh.id())
        .collect::<Vec<_>>();
    for vehicle_id in advised {
        let advisory = SpeedAdvisory::new(AdvisoryDomain::Time, advised_speed);
        sim.register_control_speed(vehicle_id, advisory);
    }

    println!("Simulating...");
    let start = Instant::now();
    for frame in 0..NUM_FRAMES {
        sim.set_boundary_control(Control::Acceleration(leader_acc(frame)));
        sim.step();
    }
    let frame = start.elapsed() / NUM_FRAMES as u32;

    let trajectory = sim.trajectory();
    let min_speed = trajectory
        .speeds()
        .iter()
        .flatten()
        .copied()
        .fold(f64::INFINITY, f64::min);
    println!(
        "Avg. frame: {:?} ({} vehs, {} frames, min speed {:.2} m/s)",
        frame,
        trajectory.num_vehicles(),
        trajectory.num_frames(),
        min_speed,
    );
    Ok(())
}
