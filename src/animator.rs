//! Per-tick motion shared by the decorative layer and the game entities.
//!
//! All positions are percentages of the play area (0..100 on both axes).

use crate::rng::GameRng;
use crate::scheduler::{Subscription, TickSource};

pub trait Animated {
    /// Apply one tick of motion.
    fn step(&mut self, rng: &mut GameRng);

    /// Checked after every step; expired entities are dropped.
    fn expired(&self) -> bool {
        false
    }
}

/// Move every entity, then drop the ones that are gone.
pub fn animate<T: Animated>(entities: &mut Vec<T>, rng: &mut GameRng) {
    for e in entities.iter_mut() {
        e.step(rng);
    }
    entities.retain(|e| !e.expired());
}

const HEART_COUNT: usize = 15;
const WANDERER_COUNT: usize = 6;
const BURST_SIZE: usize = 20;
const MAX_PARTICLES: usize = 400;
const GRAVITY: f32 = 0.015;
const PARTICLE_LIFE: u32 = 100;

/// Rises slowly and wraps back below the bottom edge.
#[derive(Clone, Debug)]
pub struct FloatingHeart {
    pub x: f32,
    pub y: f32,
    pub speed: f32,
    pub glyph: usize,
    pub opacity: f32,
}

impl FloatingHeart {
    fn spawn(rng: &mut GameRng) -> Self {
        Self {
            x: rng.range_f32(0.0, 100.0),
            y: rng.range_f32(110.0, 130.0),
            speed: rng.range_f32(0.3, 1.0),
            glyph: rng.index(HEART_GLYPHS.len()),
            opacity: rng.range_f32(0.3, 0.7),
        }
    }
}

impl Animated for FloatingHeart {
    fn step(&mut self, rng: &mut GameRng) {
        self.y -= self.speed;
        if self.y < -10.0 {
            self.y = rng.range_f32(110.0, 130.0);
        }
    }
}

pub const HEART_GLYPHS: [&str; 4] = ["♥", "♡", "❤", "❣"];

/// A firework spark: ballistic motion with gravity and a fading life.
#[derive(Clone, Debug)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub life: u32,
    pub max_life: u32,
    pub hue: usize,
}

impl Particle {
    pub fn opacity(&self) -> f32 {
        self.life as f32 / self.max_life as f32
    }
}

impl Animated for Particle {
    fn step(&mut self, _rng: &mut GameRng) {
        self.x += self.vx;
        self.y += self.vy;
        self.vy += GRAVITY;
        self.life = self.life.saturating_sub(1);
    }

    fn expired(&self) -> bool {
        self.life == 0
    }
}

/// Heart-shaped burst of sparks around (x, y).
pub fn heart_burst(x: f32, y: f32, rng: &mut GameRng) -> Vec<Particle> {
    (0..BURST_SIZE)
        .map(|i| {
            let angle = i as f32 / BURST_SIZE as f32 * std::f32::consts::TAU;
            let speed = rng.range_f32(0.25, 0.75);
            let hx = 16.0 * angle.sin().powi(3);
            let hy = -(13.0 * angle.cos()
                - 5.0 * (2.0 * angle).cos()
                - 2.0 * (3.0 * angle).cos()
                - (4.0 * angle).cos());
            Particle {
                x,
                y,
                vx: hx / 16.0 * speed,
                vy: hy / 16.0 * speed,
                life: PARTICLE_LIFE,
                max_life: PARTICLE_LIFE,
                hue: rng.index(6),
            }
        })
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Facing {
    Left,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Critter {
    Kitty,
    Puppy,
}

/// Walks horizontally, bouncing between 0% and 95%, with occasional jitter.
#[derive(Clone, Debug)]
pub struct Wanderer {
    pub kind: Critter,
    pub x: f32,
    pub y: f32,
    pub facing: Facing,
    pub speed: f32,
}

impl Wanderer {
    fn spawn(kind: Critter, rng: &mut GameRng) -> Self {
        Self {
            kind,
            x: rng.range_f32(10.0, 90.0),
            y: rng.range_f32(10.0, 90.0),
            facing: if rng.chance(0.5) { Facing::Left } else { Facing::Right },
            speed: rng.range_f32(0.5, 2.0),
        }
    }
}

impl Animated for Wanderer {
    fn step(&mut self, rng: &mut GameRng) {
        match self.facing {
            Facing::Right => {
                self.x += self.speed;
                if self.x > 95.0 {
                    self.x = 95.0;
                    self.facing = Facing::Left;
                    return;
                }
            }
            Facing::Left => {
                self.x -= self.speed;
                if self.x < 0.0 {
                    self.x = 0.0;
                    self.facing = Facing::Right;
                    return;
                }
            }
        }
        if rng.chance(0.01) {
            self.facing = match self.facing {
                Facing::Left => Facing::Right,
                Facing::Right => Facing::Left,
            };
        } else if rng.chance(0.02) {
            self.y = (self.y + rng.range_f32(-5.0, 5.0)).clamp(0.0, 90.0);
        }
    }
}

/// The decorative layer behind every stage.
pub struct Ambience {
    pub hearts: Vec<FloatingHeart>,
    pub particles: Vec<Particle>,
    pub wanderers: Vec<Wanderer>,
    clock: TickSource,
    drift: Subscription,
    sparks: Subscription,
    walk: Subscription,
    bursts: Option<Subscription>,
    rng: GameRng,
}

impl Ambience {
    pub fn new(mut rng: GameRng) -> Self {
        let hearts = (0..HEART_COUNT).map(|_| FloatingHeart::spawn(&mut rng)).collect();
        let wanderers = (0..WANDERER_COUNT)
            .map(|i| {
                let kind = if i < WANDERER_COUNT / 2 { Critter::Kitty } else { Critter::Puppy };
                Wanderer::spawn(kind, &mut rng)
            })
            .collect();
        let mut clock = TickSource::new();
        let drift = clock.every(50);
        let sparks = clock.every(16);
        let walk = clock.every(50);
        Self {
            hearts,
            particles: Vec::new(),
            wanderers,
            clock,
            drift,
            sparks,
            walk,
            bursts: None,
            rng,
        }
    }

    #[cfg(test)]
    pub fn fireworks_on(&self) -> bool {
        self.bursts.is_some()
    }

    pub fn set_fireworks(&mut self, on: bool) {
        match (on, self.bursts) {
            (true, None) => {
                self.burst();
                self.bursts = Some(self.clock.every(1500));
            }
            (false, Some(sub)) => {
                self.clock.dispose(sub);
                self.bursts = None;
                self.particles.clear();
            }
            _ => {}
        }
    }

    fn burst(&mut self) {
        let x = self.rng.range_f32(0.0, 100.0);
        let y = self.rng.range_f32(10.0, 80.0);
        let mut sparks = heart_burst(x, y, &mut self.rng);
        self.particles.append(&mut sparks);
        if self.particles.len() > MAX_PARTICLES {
            let excess = self.particles.len() - MAX_PARTICLES;
            self.particles.drain(..excess);
        }
    }

    pub fn tick(&mut self, dt_ms: u64) {
        for sub in self.clock.advance(dt_ms) {
            if sub == self.drift {
                animate(&mut self.hearts, &mut self.rng);
            } else if sub == self.sparks {
                animate(&mut self.particles, &mut self.rng);
            } else if sub == self.walk {
                animate(&mut self.wanderers, &mut self.rng);
            } else if Some(sub) == self.bursts {
                self.burst();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floating_heart_wraps_below_viewport() {
        let mut rng = GameRng::seeded(3);
        let mut h = FloatingHeart { x: 50.0, y: -9.5, speed: 1.0, glyph: 0, opacity: 0.5 };
        h.step(&mut rng);
        assert!(h.y >= 110.0 && h.y < 130.0);
    }

    #[test]
    fn particle_gravity_and_fade() {
        let mut rng = GameRng::seeded(3);
        let mut p = Particle { x: 0.0, y: 0.0, vx: 1.0, vy: -1.0, life: 2, max_life: 4, hue: 0 };
        p.step(&mut rng);
        assert_eq!(p.x, 1.0);
        assert_eq!(p.y, -1.0);
        assert!((p.vy - (-1.0 + GRAVITY)).abs() < f32::EPSILON);
        assert_eq!(p.opacity(), 0.25);
        let mut ps = vec![p];
        animate(&mut ps, &mut rng);
        assert!(ps.is_empty());
    }

    #[test]
    fn wanderer_bounces_at_edges() {
        let mut rng = GameRng::seeded(3);
        let mut w = Wanderer { kind: Critter::Kitty, x: 94.5, y: 50.0, facing: Facing::Right, speed: 1.0 };
        w.step(&mut rng);
        assert_eq!(w.x, 95.0);
        assert_eq!(w.facing, Facing::Left);

        let mut w = Wanderer { kind: Critter::Puppy, x: 0.5, y: 50.0, facing: Facing::Left, speed: 1.0 };
        w.step(&mut rng);
        assert_eq!(w.x, 0.0);
        assert_eq!(w.facing, Facing::Right);
    }

    #[test]
    fn wanderers_stay_in_bounds() {
        let mut rng = GameRng::seeded(11);
        let mut ws: Vec<Wanderer> = (0..6).map(|_| Wanderer::spawn(Critter::Kitty, &mut rng)).collect();
        for _ in 0..5000 {
            animate(&mut ws, &mut rng);
        }
        for w in &ws {
            assert!((0.0..=95.0).contains(&w.x));
            assert!((0.0..=90.0).contains(&w.y));
        }
    }

    #[test]
    fn fireworks_stay_bounded() {
        let mut amb = Ambience::new(GameRng::seeded(5));
        amb.set_fireworks(true);
        for _ in 0..2000 {
            amb.tick(16);
            assert!(amb.particles.len() <= MAX_PARTICLES);
        }
        amb.set_fireworks(false);
        assert!(amb.particles.is_empty());
        assert!(!amb.fireworks_on());
    }
}
