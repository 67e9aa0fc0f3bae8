use std::time::Instant;

use pbd::entity::EntityFlags;
use pbd::pworld::PWorld;
use pbd::time_manager::{TimeManager, TimeModel};
use pbd::{V3, V3d};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn main() {
	env_logger::init();
	let mut pworld = PWorld::default();
	if let Err(e) = pworld.init_demo() {
		log::error!("demo scene: {}", e);
		return;
	}
	let mut rng = StdRng::seed_from_u64(1);
	let cloud: Vec<V3d> = (0..64)
		.map(|_| {
			V3d::new(
				rng.gen_range(-3.0..3.0),
				rng.gen_range(20.0..26.0),
				rng.gen_range(10.0..16.0),
			)
		})
		.collect();
	if let Err(e) = pworld.add_pbd_mesh(
		&cloud,
		0.0006,
		1.0 / 10.0,
		V3::new(0.7, 0.2, 0.),
		EntityFlags::MOVABLE | EntityFlags::COLLIDES,
	) {
		log::error!("mesh body: {}", e);
		return;
	}

	let rframes = 600;
	let mut tm = TimeManager::new(pworld.config().frame_dt, TimeModel::Fixed);
	let start = Instant::now();
	let mut simulated = 0.0;
	for _ in 0..rframes {
		let dt = tm.take_time();
		pworld.update_frame(dt);
		simulated += dt;
	}
	let duration = start.elapsed().as_secs_f32();
	let model = pworld.pr_model();
	eprintln!(
		"{} particles, {} cells: {:.3}% of real time",
		model.particle_len(),
		model.cell_len(),
		duration / simulated * 100.0,
	);
}
