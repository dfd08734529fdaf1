//! Map semantic tablet events to configured actions and drive the key
//! press/hold/release state machine.

use evdevil::event::Key;
use serde::Deserialize;

use crate::keys::resolve_key_name;
use crate::report::PenKind;
use crate::vpen::{EventSink, PressState};

/// Separator between the keys of a combo action.
pub const ACTION_SPLIT_CHAR: char = '+';

/// What to do when an action string names a key that does not resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnknownKeyPolicy {
    /// Keep the keys that do resolve and warn about the rest. The previous
    /// action is still released, so nothing can stay stuck.
    #[default]
    BestEffort,
    /// Suppress the whole action if any of its keys fails to resolve.
    AbortAction,
}

/// User-configured action per semantic tablet event. An action is one key
/// name or several joined with `+`, pressed and released as one unit; the
/// empty string binds nothing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ActionBindings {
    pub pen_touch: String,
    pub pen_button_1: String,
    pub pen_button_1_touch: String,
    pub pen_button_2: String,
    pub pen_button_2_touch: String,
    /// Indexed by tablet button bit index.
    pub tablet_buttons: Vec<String>,
    /// Indexed by scrollbar position minus one.
    pub tablet_scrollbar: Vec<String>,
    pub tablet_scrollbar_increase: String,
    pub tablet_scrollbar_decrease: String,
}

impl ActionBindings {
    pub fn for_pen(&self, kind: PenKind) -> &str {
        match kind {
            PenKind::Idle => "",
            PenKind::Touch => &self.pen_touch,
            PenKind::Button1 => &self.pen_button_1,
            PenKind::Button1Touch => &self.pen_button_1_touch,
            PenKind::Button2 => &self.pen_button_2,
            PenKind::Button2Touch => &self.pen_button_2_touch,
        }
    }

    /// Every key name referenced anywhere in the bindings, combos split,
    /// deduplicated.
    pub fn key_names(&self) -> Vec<&str> {
        let singles = [
            &self.pen_touch,
            &self.pen_button_1,
            &self.pen_button_1_touch,
            &self.pen_button_2,
            &self.pen_button_2_touch,
            &self.tablet_scrollbar_increase,
            &self.tablet_scrollbar_decrease,
        ];
        let mut names: Vec<&str> = singles
            .into_iter()
            .chain(self.tablet_buttons.iter())
            .chain(self.tablet_scrollbar.iter())
            .flat_map(|action| action.split(ACTION_SPLIT_CHAR))
            .filter(|name| !name.is_empty())
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}

/// Edge-detection state for one streaming session, plus the resolution
/// logic from semantic event to key transitions.
///
/// Built fresh every time a session starts so the first event after a
/// reconnect is always a clean press, never a hold of stale state.
pub struct ActionResolver {
    policy: UnknownKeyPolicy,
    previous_action: String,
    previous_button_mask: u8,
    previous_scrollbar: u8,
}

impl ActionResolver {
    pub fn new(policy: UnknownKeyPolicy) -> Self {
        Self {
            policy,
            previous_action: String::new(),
            previous_button_mask: 0,
            previous_scrollbar: 0,
        }
    }

    /// Resolve a pen report's kind through its binding.
    pub fn pen(&mut self, kind: PenKind, bindings: &ActionBindings, sink: &mut impl EventSink) {
        self.apply(bindings.for_pen(kind), sink);
    }

    /// The three transition shapes: re-assert a held action, switch actions
    /// (release old, press new), or press from neutral.
    pub fn apply(&mut self, new_action: &str, sink: &mut impl EventSink) {
        if new_action == self.previous_action {
            for key in self.keys_for(&self.previous_action) {
                sink.write_key(key, PressState::Hold);
            }
            return;
        }

        for key in self.keys_for(&self.previous_action) {
            sink.write_key(key, PressState::Up);
        }
        if !new_action.is_empty() {
            for key in self.keys_for(new_action) {
                sink.write_key(key, PressState::Down);
            }
        }
        self.previous_action = new_action.to_string();
    }

    /// A nonzero mask selects the binding for its highest set bit; the
    /// binding fires only when the mask changes. Mask zero releases
    /// everything and resets the edge state.
    pub fn tablet_button(&mut self, mask: u8, bindings: &ActionBindings, sink: &mut impl EventSink) {
        if mask == 0 {
            self.apply("", sink);
            self.previous_button_mask = 0;
            return;
        }
        if self.previous_button_mask != mask {
            let index = mask.ilog2() as usize;
            match bindings.tablet_buttons.get(index) {
                Some(action) => self.apply(action, sink),
                None => log::warn!("tablet button {} has no binding", index),
            }
        }
        self.previous_button_mask = mask;
    }

    /// Position zero means untouched. A move between nonzero positions fires
    /// the increase/decrease one-shot first, then the position's own binding.
    pub fn scrollbar(&mut self, position: u8, bindings: &ActionBindings, sink: &mut impl EventSink) {
        if position == 0 {
            self.apply("", sink);
            self.previous_scrollbar = 0;
            return;
        }
        if self.previous_scrollbar != 0 {
            if position > self.previous_scrollbar {
                self.apply(&bindings.tablet_scrollbar_increase, sink);
            } else if position < self.previous_scrollbar {
                self.apply(&bindings.tablet_scrollbar_decrease, sink);
            }
        }
        if position != self.previous_scrollbar {
            match bindings.tablet_scrollbar.get(position as usize - 1) {
                Some(action) => self.apply(action, sink),
                None => log::warn!("scrollbar position {} has no binding", position),
            }
        }
        self.previous_scrollbar = position;
    }

    fn keys_for(&self, action: &str) -> Vec<Key> {
        if action.is_empty() {
            return Vec::new();
        }
        let mut keys = Vec::new();
        for name in action.split(ACTION_SPLIT_CHAR) {
            match resolve_key_name(name) {
                Some(key) => keys.push(key),
                None => {
                    log::warn!("unknown key name {:?} in action {:?}", name, action);
                    if self.policy == UnknownKeyPolicy::AbortAction {
                        return Vec::new();
                    }
                }
            }
        }
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evdevil::event::Abs;
    use std::error::Error;

    #[derive(Default)]
    struct MockSink {
        keys: Vec<(u16, PressState)>,
    }

    impl EventSink for MockSink {
        fn write_axis(&mut self, _axis: Abs, _value: i32) {}

        fn write_key(&mut self, key: Key, state: PressState) {
            self.keys.push((key.raw(), state));
        }

        fn sync(&mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
            Ok(())
        }
    }

    fn bindings(pen_touch: &str) -> ActionBindings {
        ActionBindings {
            pen_touch: pen_touch.to_string(),
            ..ActionBindings::default()
        }
    }

    #[test]
    fn test_press_hold_hold_release() {
        let bindings = bindings("KEY_A");
        let mut resolver = ActionResolver::new(UnknownKeyPolicy::BestEffort);
        let mut sink = MockSink::default();

        for _ in 0..3 {
            resolver.pen(PenKind::Touch, &bindings, &mut sink);
        }
        resolver.pen(PenKind::Idle, &bindings, &mut sink);

        let a = Key::KEY_A.raw();
        assert_eq!(
            sink.keys,
            vec![
                (a, PressState::Down),
                (a, PressState::Hold),
                (a, PressState::Hold),
                (a, PressState::Up),
            ]
        );
    }

    #[test]
    fn test_combo_presses_all_keys_in_one_cycle() {
        let bindings = bindings("KEY_A+KEY_B");
        let mut resolver = ActionResolver::new(UnknownKeyPolicy::BestEffort);
        let mut sink = MockSink::default();

        resolver.pen(PenKind::Touch, &bindings, &mut sink);

        assert_eq!(
            sink.keys,
            vec![
                (Key::KEY_A.raw(), PressState::Down),
                (Key::KEY_B.raw(), PressState::Down),
            ]
        );
    }

    #[test]
    fn test_combo_switch_releases_before_pressing() {
        let mut bindings = bindings("KEY_A+KEY_B");
        bindings.pen_button_1 = "KEY_C".to_string();
        let mut resolver = ActionResolver::new(UnknownKeyPolicy::BestEffort);
        let mut sink = MockSink::default();

        resolver.pen(PenKind::Touch, &bindings, &mut sink);
        resolver.pen(PenKind::Button1, &bindings, &mut sink);

        assert_eq!(
            sink.keys,
            vec![
                (Key::KEY_A.raw(), PressState::Down),
                (Key::KEY_B.raw(), PressState::Down),
                (Key::KEY_A.raw(), PressState::Up),
                (Key::KEY_B.raw(), PressState::Up),
                (Key::KEY_C.raw(), PressState::Down),
            ]
        );
    }

    #[test]
    fn test_tablet_button_bit_indices() {
        let bindings = ActionBindings {
            tablet_buttons: vec![
                "KEY_1".into(),
                "KEY_2".into(),
                "KEY_3".into(),
                "KEY_4".into(),
                "KEY_5".into(),
            ],
            ..ActionBindings::default()
        };
        let expected = [
            (1u8, Key::KEY_1.raw()),
            (2, Key::KEY_2.raw()),
            (4, Key::KEY_3.raw()),
            (8, Key::KEY_4.raw()),
            (16, Key::KEY_5.raw()),
        ];
        for (mask, key) in expected {
            let mut resolver = ActionResolver::new(UnknownKeyPolicy::BestEffort);
            let mut sink = MockSink::default();
            resolver.tablet_button(mask, &bindings, &mut sink);
            assert_eq!(sink.keys, vec![(key, PressState::Down)]);
        }
    }

    #[test]
    fn test_tablet_button_mask_zero_releases_and_resets() {
        let bindings = ActionBindings {
            tablet_buttons: vec!["KEY_1".into()],
            ..ActionBindings::default()
        };
        let mut resolver = ActionResolver::new(UnknownKeyPolicy::BestEffort);
        let mut sink = MockSink::default();

        resolver.tablet_button(1, &bindings, &mut sink);
        resolver.tablet_button(0, &bindings, &mut sink);
        // After the reset the same mask must fire again as a fresh press.
        resolver.tablet_button(1, &bindings, &mut sink);

        let k = Key::KEY_1.raw();
        assert_eq!(
            sink.keys,
            vec![
                (k, PressState::Down),
                (k, PressState::Up),
                (k, PressState::Down),
            ]
        );
    }

    #[test]
    fn test_tablet_button_held_mask_is_silent() {
        let bindings = ActionBindings {
            tablet_buttons: vec!["KEY_1".into()],
            ..ActionBindings::default()
        };
        let mut resolver = ActionResolver::new(UnknownKeyPolicy::BestEffort);
        let mut sink = MockSink::default();

        resolver.tablet_button(1, &bindings, &mut sink);
        resolver.tablet_button(1, &bindings, &mut sink);

        assert_eq!(sink.keys, vec![(Key::KEY_1.raw(), PressState::Down)]);
    }

    fn scrollbar_bindings() -> ActionBindings {
        ActionBindings {
            tablet_scrollbar: vec![
                "KEY_1".into(),
                "KEY_2".into(),
                "KEY_3".into(),
                "KEY_4".into(),
                "KEY_5".into(),
                "KEY_6".into(),
                "KEY_7".into(),
            ],
            tablet_scrollbar_increase: "KEY_I".into(),
            tablet_scrollbar_decrease: "KEY_D".into(),
            ..ActionBindings::default()
        }
    }

    #[test]
    fn test_scrollbar_increase_fires_one_shot_then_position_binding() {
        let bindings = scrollbar_bindings();
        let mut resolver = ActionResolver::new(UnknownKeyPolicy::BestEffort);
        let mut sink = MockSink::default();

        resolver.scrollbar(3, &bindings, &mut sink);
        sink.keys.clear();
        resolver.scrollbar(5, &bindings, &mut sink);

        // Release position 3's binding, one-shot increase, then position 5's
        // binding (list index 4).
        assert_eq!(
            sink.keys,
            vec![
                (Key::KEY_3.raw(), PressState::Up),
                (Key::KEY_I.raw(), PressState::Down),
                (Key::KEY_I.raw(), PressState::Up),
                (Key::KEY_5.raw(), PressState::Down),
            ]
        );
    }

    #[test]
    fn test_scrollbar_decrease() {
        let bindings = scrollbar_bindings();
        let mut resolver = ActionResolver::new(UnknownKeyPolicy::BestEffort);
        let mut sink = MockSink::default();

        resolver.scrollbar(5, &bindings, &mut sink);
        sink.keys.clear();
        resolver.scrollbar(2, &bindings, &mut sink);

        assert_eq!(
            sink.keys,
            vec![
                (Key::KEY_5.raw(), PressState::Up),
                (Key::KEY_D.raw(), PressState::Down),
                (Key::KEY_D.raw(), PressState::Up),
                (Key::KEY_2.raw(), PressState::Down),
            ]
        );
    }

    #[test]
    fn test_scrollbar_untouched_to_untouched_fires_nothing() {
        let bindings = scrollbar_bindings();
        let mut resolver = ActionResolver::new(UnknownKeyPolicy::BestEffort);
        let mut sink = MockSink::default();

        resolver.scrollbar(0, &bindings, &mut sink);
        resolver.scrollbar(0, &bindings, &mut sink);

        assert!(sink.keys.is_empty());
    }

    #[test]
    fn test_scrollbar_first_touch_skips_one_shots() {
        let bindings = scrollbar_bindings();
        let mut resolver = ActionResolver::new(UnknownKeyPolicy::BestEffort);
        let mut sink = MockSink::default();

        resolver.scrollbar(4, &bindings, &mut sink);

        assert_eq!(sink.keys, vec![(Key::KEY_4.raw(), PressState::Down)]);
    }

    #[test]
    fn test_unknown_key_best_effort_keeps_the_rest() {
        let bindings = bindings("KEY_A+KEY_BOGUS");
        let mut resolver = ActionResolver::new(UnknownKeyPolicy::BestEffort);
        let mut sink = MockSink::default();

        resolver.pen(PenKind::Touch, &bindings, &mut sink);
        resolver.pen(PenKind::Idle, &bindings, &mut sink);

        let a = Key::KEY_A.raw();
        assert_eq!(
            sink.keys,
            vec![(a, PressState::Down), (a, PressState::Up)]
        );
    }

    #[test]
    fn test_unknown_key_abort_suppresses_whole_action() {
        let bindings = bindings("KEY_A+KEY_BOGUS");
        let mut resolver = ActionResolver::new(UnknownKeyPolicy::AbortAction);
        let mut sink = MockSink::default();

        resolver.pen(PenKind::Touch, &bindings, &mut sink);

        assert!(sink.keys.is_empty());
    }

    #[test]
    fn test_fresh_resolver_starts_with_a_press() {
        // Reconnect semantics: a new resolver must never open with a hold.
        let bindings = bindings("KEY_A");
        let mut resolver = ActionResolver::new(UnknownKeyPolicy::BestEffort);
        let mut sink = MockSink::default();

        resolver.pen(PenKind::Touch, &bindings, &mut sink);

        assert_eq!(sink.keys, vec![(Key::KEY_A.raw(), PressState::Down)]);
    }

    #[test]
    fn test_key_names_collects_and_dedups() {
        let bindings = ActionBindings {
            pen_touch: "KEY_A".into(),
            pen_button_1: "KEY_A+KEY_B".into(),
            tablet_buttons: vec!["KEY_C".into(), String::new()],
            tablet_scrollbar_increase: "KEY_B".into(),
            ..ActionBindings::default()
        };
        assert_eq!(bindings.key_names(), vec!["KEY_A", "KEY_B", "KEY_C"]);
    }
}
