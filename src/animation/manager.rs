//! Running animations, their timing and the blocking counter.
//!
//! The manager lives inside its host (the element tree) and is driven through
//! the provided methods of [`AnimationHost`], so animation callbacks get the
//! whole host mutably. While a callback runs its animation is taken out of
//! the manager; aborting it from inside the callback is recorded and applied
//! once the callback returns.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use slotmap::{new_key_type, SlotMap};
use tracing::trace;

use super::curve::AnimationCurve;

new_key_type! {
    /// Handle to a running animation.
    pub struct AnimationId;
}

/// When the clock of a new animation starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AnimationTime {
    /// At the moment of starting.
    Immediately,
    /// At its first update, so a slow frame doesn't eat the start.
    #[default]
    FirstUpdate,
}

/// An animated object.
pub trait Animation<H: AnimationHost> {
    fn on_start(&mut self, host: &mut H) {
        let _ = host;
    }

    /// `progress` is eased, in `0.0..=1.0`.
    fn on_update(&mut self, host: &mut H, progress: f32);

    /// Called once when the animation ends. `aborted` is false when it ran
    /// to completion.
    fn on_stop(&mut self, host: &mut H, aborted: bool) {
        let _ = (host, aborted);
    }

    /// What the animation belongs to, for bulk aborts.
    fn owner(&self) -> Option<H::Owner> {
        None
    }
}

struct Entry<H: AnimationHost> {
    animation: Option<Box<dyn Animation<H>>>,
    owner: Option<H::Owner>,
    curve: AnimationCurve,
    duration_ms: u64,
    start_ms: u64,
    adjust_start: bool,
    /// Aborted while its animation was out for a callback.
    aborted: bool,
}

/// Ordered list of running animations.
pub struct AnimationManager<H: AnimationHost> {
    entries: SlotMap<AnimationId, Entry<H>>,
    order: Vec<AnimationId>,
    blocked: Rc<Cell<u32>>,
    default_duration_ms: u64,
    default_curve: AnimationCurve,
}

impl<H: AnimationHost> AnimationManager<H> {
    pub fn new(default_duration_ms: u64, default_curve: AnimationCurve) -> Self {
        Self {
            entries: SlotMap::with_key(),
            order: Vec::new(),
            blocked: Rc::new(Cell::new(0)),
            default_duration_ms,
            default_curve,
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn is_running(&self, id: AnimationId) -> bool {
        self.entries.contains_key(id)
    }

    /// Whether new animations complete at once instead of running.
    pub fn is_blocked(&self) -> bool {
        self.blocked.get() > 0
    }

    /// Block new animations until the returned guard is dropped.
    pub fn blocker(&self) -> AnimationBlocker {
        AnimationBlocker::new(self.blocked.clone())
    }

    pub fn default_duration_ms(&self) -> u64 {
        self.default_duration_ms
    }

    pub fn default_curve(&self) -> AnimationCurve {
        self.default_curve
    }

    fn remove(&mut self, id: AnimationId) {
        self.entries.remove(id);
        self.order.retain(|&o| o != id);
    }
}

impl<H: AnimationHost> fmt::Debug for AnimationManager<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationManager")
            .field("running", &self.order.len())
            .field("blocked", &self.blocked.get())
            .finish()
    }
}

/// Blocks new animations for its lifetime. Blockers nest.
#[must_use = "animations are only blocked while the blocker is alive"]
pub struct AnimationBlocker {
    counter: Rc<Cell<u32>>,
}

impl AnimationBlocker {
    fn new(counter: Rc<Cell<u32>>) -> Self {
        counter.set(counter.get() + 1);
        Self { counter }
    }
}

impl Drop for AnimationBlocker {
    fn drop(&mut self) {
        self.counter.set(self.counter.get().saturating_sub(1));
    }
}

/// Something that owns an [`AnimationManager`] and a clock.
///
/// The provided methods run the animations with the host passed to their
/// callbacks.
pub trait AnimationHost: Sized + 'static {
    type Owner: Copy + PartialEq + fmt::Debug;

    fn animation_manager(&self) -> &AnimationManager<Self>;

    fn animation_manager_mut(&mut self) -> &mut AnimationManager<Self>;

    /// Current time in milliseconds.
    fn clock_ms(&self) -> u64;

    /// Start with the default curve and duration.
    fn start_animation(&mut self, animation: impl Animation<Self> + 'static) -> Option<AnimationId> {
        let manager = self.animation_manager();
        let (curve, duration) = (manager.default_curve(), manager.default_duration_ms());
        self.start_animation_with(Box::new(animation), curve, duration, AnimationTime::FirstUpdate)
    }

    /// Start an animation.
    ///
    /// While animations are blocked it is completed on the spot, as if it
    /// ran to the end, and `None` is returned.
    fn start_animation_with(
        &mut self,
        mut animation: Box<dyn Animation<Self>>,
        curve: AnimationCurve,
        duration_ms: u64,
        time: AnimationTime,
    ) -> Option<AnimationId> {
        if self.animation_manager().is_blocked() {
            trace!("animation blocked; completed at once");
            animation.on_start(self);
            animation.on_update(self, 1.0);
            animation.on_stop(self, false);
            return None;
        }
        let now = self.clock_ms();
        let owner = animation.owner();
        let manager = self.animation_manager_mut();
        let id = manager.entries.insert(Entry {
            animation: None,
            owner,
            curve,
            duration_ms,
            start_ms: now,
            adjust_start: time == AnimationTime::FirstUpdate,
            aborted: false,
        });
        manager.order.push(id);

        animation.on_start(self);
        let manager = self.animation_manager_mut();
        match manager.entries.get_mut(id) {
            Some(entry) if entry.aborted => {
                manager.remove(id);
                animation.on_stop(self, true);
                None
            }
            Some(entry) => {
                entry.animation = Some(animation);
                Some(id)
            }
            None => None,
        }
    }

    /// Advance every running animation to the current time. Finished ones
    /// are removed after their stop callback.
    fn update_animations(&mut self) {
        let now = self.clock_ms();
        let order = self.animation_manager().order.clone();
        for id in order {
            let Some(entry) = self.animation_manager_mut().entries.get_mut(id) else {
                continue;
            };
            if entry.adjust_start {
                entry.start_ms = now;
                entry.adjust_start = false;
            }
            let raw = if entry.duration_ms == 0 {
                1.0
            } else {
                (now.saturating_sub(entry.start_ms) as f32 / entry.duration_ms as f32).min(1.0)
            };
            let progress = entry.curve.apply(raw);
            let Some(mut animation) = entry.animation.take() else {
                continue;
            };

            animation.on_update(self, progress);

            let manager = self.animation_manager_mut();
            match manager.entries.get_mut(id) {
                Some(entry) if entry.aborted => {
                    manager.remove(id);
                    animation.on_stop(self, true);
                }
                Some(_) if raw >= 1.0 => {
                    manager.remove(id);
                    animation.on_stop(self, false);
                }
                Some(entry) => entry.animation = Some(animation),
                None => {}
            }
        }
    }

    /// Stop an animation early. Its stop callback gets `aborted = true`.
    ///
    /// Returns the animation unless `delete` is set, so it can be started
    /// again. Aborting an animation from its own callback always deletes it.
    fn abort_animation(&mut self, id: AnimationId, delete: bool) -> Option<Box<dyn Animation<Self>>> {
        let manager = self.animation_manager_mut();
        let entry = manager.entries.get_mut(id)?;
        let Some(mut animation) = entry.animation.take() else {
            entry.aborted = true;
            return None;
        };
        manager.remove(id);
        animation.on_stop(self, true);
        (!delete).then_some(animation)
    }

    fn abort_all_animations(&mut self) {
        for id in self.animation_manager().order.clone() {
            self.abort_animation(id, true);
        }
    }

    /// Abort every animation belonging to `owner`.
    fn abort_animations_of(&mut self, owner: Self::Owner) {
        let ids: Vec<AnimationId> = {
            let manager = self.animation_manager();
            manager
                .order
                .iter()
                .copied()
                .filter(|&id| manager.entries.get(id).is_some_and(|e| e.owner == Some(owner)))
                .collect()
        };
        for id in ids {
            self.abort_animation(id, true);
        }
    }

    fn has_running_animations(&self) -> bool {
        !self.animation_manager().is_empty()
    }

    /// Block new animations until the returned guard is dropped.
    fn block_animations(&self) -> AnimationBlocker {
        self.animation_manager().blocker()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use pretty_assertions::assert_eq;

    /// Minimal host: a clock and a log of callbacks.
    struct Stage {
        manager: AnimationManager<Stage>,
        now: u64,
        log: Vec<String>,
        abort_on_update: Option<AnimationId>,
    }

    impl Stage {
        fn new() -> Self {
            Self {
                manager: AnimationManager::new(100, AnimationCurve::Linear),
                now: 0,
                log: Vec::new(),
                abort_on_update: None,
            }
        }

        fn tick(&mut self, ms: u64) {
            self.now += ms;
            self.update_animations();
        }
    }

    impl AnimationHost for Stage {
        type Owner = u32;

        fn animation_manager(&self) -> &AnimationManager<Self> {
            &self.manager
        }

        fn animation_manager_mut(&mut self) -> &mut AnimationManager<Self> {
            &mut self.manager
        }

        fn clock_ms(&self) -> u64 {
            self.now
        }
    }

    struct Recorder {
        name: &'static str,
        owner: u32,
    }

    impl Animation<Stage> for Recorder {
        fn on_start(&mut self, host: &mut Stage) {
            host.log.push(format!("{}:start", self.name));
        }

        fn on_update(&mut self, host: &mut Stage, progress: f32) {
            host.log.push(format!("{}:{progress}", self.name));
            if let Some(id) = host.abort_on_update.take() {
                host.abort_animation(id, true);
            }
        }

        fn on_stop(&mut self, host: &mut Stage, aborted: bool) {
            host.log.push(format!("{}:stop({aborted})", self.name));
        }

        fn owner(&self) -> Option<u32> {
            Some(self.owner)
        }
    }

    fn recorder(name: &'static str) -> Recorder {
        Recorder { name, owner: 0 }
    }

    #[test]
    fn test_runs_to_completion() {
        let mut stage = Stage::new();
        let id = stage.start_animation(recorder("a"));
        assert!(id.is_some());
        stage.tick(10);
        stage.tick(50);
        stage.tick(50);
        stage.tick(50);
        assert_eq!(stage.log, vec!["a:start", "a:0", "a:0.5", "a:1", "a:stop(false)"]);
        assert!(!stage.has_running_animations());
    }

    #[test]
    fn test_immediate_start_counts_from_start() {
        let mut stage = Stage::new();
        stage.start_animation_with(Box::new(recorder("a")), AnimationCurve::Linear, 100, AnimationTime::Immediately);
        stage.tick(25);
        assert_eq!(stage.log.last().map(String::as_str), Some("a:0.25"));
    }

    #[test]
    fn test_zero_duration_completes_on_first_update() {
        let mut stage = Stage::new();
        stage.start_animation_with(Box::new(recorder("a")), AnimationCurve::SlowDown, 0, AnimationTime::FirstUpdate);
        stage.tick(0);
        assert_eq!(stage.log, vec!["a:start", "a:1", "a:stop(false)"]);
    }

    #[test]
    fn test_blocked_start_completes_at_once() {
        let mut stage = Stage::new();
        {
            let _blocker = stage.block_animations();
            let _nested = stage.block_animations();
            assert!(stage.start_animation(recorder("a")).is_none());
        }
        assert_eq!(stage.log, vec!["a:start", "a:1", "a:stop(false)"]);
        assert!(!stage.animation_manager().is_blocked());
        assert!(stage.start_animation(recorder("b")).is_some());
    }

    #[test]
    fn test_abort_returns_animation_for_restart() {
        let mut stage = Stage::new();
        let id = stage.start_animation(recorder("a")).unwrap();
        let kept = stage.abort_animation(id, false);
        assert!(kept.is_some());
        assert_eq!(stage.log, vec!["a:start", "a:stop(true)"]);
        assert!(!stage.animation_manager().is_running(id));

        let restarted = stage.start_animation_with(kept.unwrap(), AnimationCurve::Linear, 100, AnimationTime::FirstUpdate);
        assert!(restarted.is_some());
        assert!(stage.abort_animation(restarted.unwrap(), true).is_none());
    }

    #[test]
    fn test_abort_during_own_update() {
        let mut stage = Stage::new();
        let id = stage.start_animation(recorder("a")).unwrap();
        stage.abort_on_update = Some(id);
        stage.tick(10);
        assert_eq!(stage.log, vec!["a:start", "a:0", "a:stop(true)"]);
        assert!(!stage.has_running_animations());
    }

    #[test]
    fn test_abort_by_owner_and_all() {
        let mut stage = Stage::new();
        stage.start_animation(Recorder { name: "a", owner: 1 });
        stage.start_animation(Recorder { name: "b", owner: 2 });
        stage.start_animation(Recorder { name: "c", owner: 1 });
        stage.abort_animations_of(1);
        assert_eq!(stage.animation_manager().len(), 1);
        stage.abort_all_animations();
        assert!(stage.animation_manager().is_empty());
        let stops: Vec<&String> = stage.log.iter().filter(|l| l.contains("stop")).collect();
        assert_eq!(stops, vec!["a:stop(true)", "c:stop(true)", "b:stop(true)"]);
    }

    #[test]
    fn test_animations_keep_start_order() {
        let order = Rc::new(RefCell::new(Vec::new()));
        struct Ordered(&'static str, Rc<RefCell<Vec<&'static str>>>);
        impl Animation<Stage> for Ordered {
            fn on_update(&mut self, _host: &mut Stage, _progress: f32) {
                self.1.borrow_mut().push(self.0);
            }
        }
        let mut stage = Stage::new();
        stage.start_animation(Ordered("first", order.clone()));
        stage.start_animation(Ordered("second", order.clone()));
        stage.tick(1);
        assert_eq!(*order.borrow(), vec!["first", "second"]);
    }
}
