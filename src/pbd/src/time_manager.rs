use std::time::{Duration, Instant};

pub enum TimeModel {
	// every frame is exactly `pft`, no waiting
	Fixed,
	// sleep so frames are at least `pft` apart
	RtFrameLock,
}

/// Frame driver: hands the world one `dt` per frame.
pub struct TimeManager {
	pft: f32,
	model: TimeModel,
	pause_start: Option<Instant>,
	start_time: Instant,
	total_pause: Duration,
}

impl TimeManager {
	pub fn new(pft: f32, model: TimeModel) -> Self {
		Self {
			pft,
			model,
			pause_start: None,
			start_time: Instant::now(),
			total_pause: Duration::ZERO,
		}
	}

	pub fn is_paused(&self) -> bool {
		self.pause_start.is_some()
	}

	pub fn set(&mut self, on: bool) {
		if on != self.is_paused() {
			return;
		}
		match self.pause_start.take() {
			Some(start) if on => self.total_pause += start.elapsed(),
			_ => self.pause_start = Some(Instant::now()),
		}
	}

	/// Time to simulate for the next frame; 0 while paused.
	pub fn take_time(&mut self) -> f32 {
		if self.is_paused() {
			return 0.0;
		}
		let now = Instant::now();
		let passed = now.duration_since(self.start_time);
		self.start_time = now;
		let busy = passed.saturating_sub(std::mem::take(&mut self.total_pause));
		match self.model {
			TimeModel::Fixed => self.pft,
			TimeModel::RtFrameLock => {
				let frame = Duration::from_secs_f32(self.pft);
				if busy < frame {
					std::thread::sleep(frame - busy);
				}
				self.pft
			}
		}
	}
}
