//! The symbol-generator boundary.
//!
//! Rolling is async: a real dice tray settles over time, and the
//! caller awaits the settled faces. The engine only depends on the
//! contract (uniform i.i.d. draw over the six faces), so tests can
//! substitute a scripted roller.

use std::future::Future;

use rand::Rng;

use runecast_protocol::{DieFace, FaceName};

/// Produces `n` independent uniform draws over the six die faces.
///
/// The returned future is `Send` so a session task holding a roller
/// can move across worker threads.
pub trait Roller {
    fn roll(&mut self, n: usize) -> impl Future<Output = Vec<DieFace>> + Send;
}

/// The standard roller over the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomRoller;

impl Roller for RandomRoller {
    async fn roll(&mut self, n: usize) -> Vec<DieFace> {
        let mut rng = rand::rng();
        (0..n)
            .map(|_| {
                let face = FaceName::ALL[rng.random_range(0..FaceName::ALL.len())];
                DieFace::new(face)
            })
            .collect()
    }
}
