//! Ambient animation ticker.
//!
//! An ordered list of per-frame effects. Each effect is a closure that owns
//! whatever state it animates and is handed `&mut World` plus the frame
//! time. Effects are either session-long or timed; timed effects expire once
//! their age reaches the duration and run their completion exactly once.

pub mod effects;

use bevy::prelude::*;

use crate::shared::*;

pub type AmbientFn = Box<dyn FnMut(&mut World, FrameTime) + Send + Sync>;
pub type CompletionFn = Box<dyn FnOnce(&mut World) + Send + Sync>;

/// Opaque handle returned by `spawn`. Never reused within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnimationHandle(u64);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lifetime {
    /// Runs until cancelled.
    Session,
    Timed { duration: f32 },
}

/// Time information passed to every effect.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameTime {
    /// Wall-clock seconds since app start.
    pub now: f32,
    /// Capped frame delta.
    pub delta: f32,
    /// Seconds since this effect was spawned.
    pub age: f32,
}

struct TickerEntry {
    handle: AnimationHandle,
    started_at: f32,
    lifetime: Lifetime,
    effect: AmbientFn,
    on_complete: Option<CompletionFn>,
}

#[derive(Resource, Default)]
pub struct AnimationTicker {
    entries: Vec<TickerEntry>,
    next_handle: u64,
    /// Wall clock of the most recent tick. New entries start here.
    now: f32,
}

impl AnimationTicker {
    /// Register a session-long effect.
    pub fn spawn(
        &mut self,
        effect: impl FnMut(&mut World, FrameTime) + Send + Sync + 'static,
    ) -> AnimationHandle {
        self.push(Lifetime::Session, Box::new(effect), None)
    }

    /// Register an effect that expires after `duration` seconds.
    pub fn spawn_timed(
        &mut self,
        duration: f32,
        effect: impl FnMut(&mut World, FrameTime) + Send + Sync + 'static,
        on_complete: impl FnOnce(&mut World) + Send + Sync + 'static,
    ) -> AnimationHandle {
        self.push(
            Lifetime::Timed {
                duration: duration.max(0.0),
            },
            Box::new(effect),
            Some(Box::new(on_complete)),
        )
    }

    fn push(
        &mut self,
        lifetime: Lifetime,
        effect: AmbientFn,
        on_complete: Option<CompletionFn>,
    ) -> AnimationHandle {
        let handle = AnimationHandle(self.next_handle);
        self.next_handle += 1;
        self.entries.push(TickerEntry {
            handle,
            started_at: self.now,
            lifetime,
            effect,
            on_complete,
        });
        handle
    }

    /// Remove an effect without running its completion. Returns false if the
    /// handle was already gone.
    pub fn cancel(&mut self, handle: AnimationHandle) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.handle != handle);
        self.entries.len() != before
    }

    pub fn is_active(&self, handle: AnimationHandle) -> bool {
        self.entries.iter().any(|e| e.handle == handle)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop everything, completions included.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Run every live effect once, in spawn order.
    pub fn tick(&mut self, world: &mut World, now: f32, delta: f32) {
        self.now = now;
        let mut finished = Vec::new();

        self.entries.retain_mut(|entry| {
            let age = (now - entry.started_at).max(0.0);
            if let Lifetime::Timed { duration } = entry.lifetime {
                if age >= duration {
                    if let Some(done) = entry.on_complete.take() {
                        finished.push(done);
                    }
                    return false;
                }
            }
            (entry.effect)(world, FrameTime { now, delta, age });
            true
        });

        for done in finished {
            done(world);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// PLUGIN
// ═══════════════════════════════════════════════════════════════════════

pub struct AmbientPlugin;

impl Plugin for AmbientPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<AnimationTicker>();
        // Ambient effects keep running behind menus and modals.
        app.add_systems(
            Update,
            run_ambient_ticker
                .in_set(FrameSet::Ambient)
                .run_if(not(in_state(GameState::Loading))),
        );
    }
}

pub fn run_ambient_ticker(world: &mut World) {
    let clock = *world.resource::<FrameClock>();
    world.resource_scope(|world, mut ticker: Mut<AnimationTicker>| {
        ticker.tick(world, clock.now, clock.delta);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Resource, Default)]
    struct Counter {
        runs: u32,
        completions: u32,
        order: Vec<u8>,
    }

    fn world_with_counter() -> World {
        let mut world = World::new();
        world.init_resource::<Counter>();
        world
    }

    #[test]
    fn test_effects_run_in_spawn_order() {
        let mut world = world_with_counter();
        let mut ticker = AnimationTicker::default();
        ticker.spawn(|w, _| w.resource_mut::<Counter>().order.push(1));
        ticker.spawn(|w, _| w.resource_mut::<Counter>().order.push(2));
        ticker.tick(&mut world, 0.0, 0.016);
        ticker.tick(&mut world, 0.016, 0.016);
        assert_eq!(world.resource::<Counter>().order, vec![1, 2, 1, 2]);
    }

    #[test]
    fn test_timed_effect_completes_once() {
        let mut world = world_with_counter();
        let mut ticker = AnimationTicker::default();
        let handle = ticker.spawn_timed(
            1.0,
            |w, _| w.resource_mut::<Counter>().runs += 1,
            |w| w.resource_mut::<Counter>().completions += 1,
        );
        ticker.tick(&mut world, 0.5, 0.5);
        assert!(ticker.is_active(handle));
        ticker.tick(&mut world, 1.0, 0.5);
        assert!(!ticker.is_active(handle));
        ticker.tick(&mut world, 1.5, 0.5);

        let counter = world.resource::<Counter>();
        assert_eq!(counter.runs, 1);
        assert_eq!(counter.completions, 1);
    }

    #[test]
    fn test_cancel_skips_completion() {
        let mut world = world_with_counter();
        let mut ticker = AnimationTicker::default();
        let handle = ticker.spawn_timed(
            1.0,
            |_, _| {},
            |w| w.resource_mut::<Counter>().completions += 1,
        );
        assert!(ticker.cancel(handle));
        assert!(!ticker.cancel(handle));
        ticker.tick(&mut world, 5.0, 0.1);
        assert_eq!(world.resource::<Counter>().completions, 0);
        assert!(ticker.is_empty());
    }

    #[test]
    fn test_age_measured_from_spawn() {
        let mut world = World::new();
        let mut ticker = AnimationTicker::default();
        ticker.tick(&mut world, 10.0, 0.1);
        let seen = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = seen.clone();
        ticker.spawn(move |_, t| {
            if let Ok(mut ages) = sink.lock() {
                ages.push(t.age);
            }
        });
        ticker.tick(&mut world, 10.5, 0.5);
        assert_eq!(*seen.lock().unwrap(), vec![0.5]);
    }
}
