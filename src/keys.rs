//! Key-name lookup for action bindings.

use evdevil::event::Key;

/// Names accepted inside action strings, mapped to evdev key codes. The set
/// covers the keys a tablet binding realistically targets; anything missing
/// here is reported through the unknown-key policy rather than a panic.
static KEY_TABLE: &[(&str, Key)] = &[
    ("BTN_TOUCH", Key::BTN_TOUCH),
    ("BTN_TOOL_PEN", Key::BTN_TOOL_PEN),
    ("BTN_TOOL_RUBBER", Key::BTN_TOOL_RUBBER),
    ("BTN_STYLUS", Key::BTN_STYLUS),
    ("BTN_STYLUS2", Key::BTN_STYLUS2),
    ("BTN_LEFT", Key::BTN_LEFT),
    ("BTN_RIGHT", Key::BTN_RIGHT),
    ("BTN_MIDDLE", Key::BTN_MIDDLE),
    ("KEY_A", Key::KEY_A),
    ("KEY_B", Key::KEY_B),
    ("KEY_C", Key::KEY_C),
    ("KEY_D", Key::KEY_D),
    ("KEY_E", Key::KEY_E),
    ("KEY_F", Key::KEY_F),
    ("KEY_G", Key::KEY_G),
    ("KEY_H", Key::KEY_H),
    ("KEY_I", Key::KEY_I),
    ("KEY_J", Key::KEY_J),
    ("KEY_K", Key::KEY_K),
    ("KEY_L", Key::KEY_L),
    ("KEY_M", Key::KEY_M),
    ("KEY_N", Key::KEY_N),
    ("KEY_O", Key::KEY_O),
    ("KEY_P", Key::KEY_P),
    ("KEY_Q", Key::KEY_Q),
    ("KEY_R", Key::KEY_R),
    ("KEY_S", Key::KEY_S),
    ("KEY_T", Key::KEY_T),
    ("KEY_U", Key::KEY_U),
    ("KEY_V", Key::KEY_V),
    ("KEY_W", Key::KEY_W),
    ("KEY_X", Key::KEY_X),
    ("KEY_Y", Key::KEY_Y),
    ("KEY_Z", Key::KEY_Z),
    ("KEY_0", Key::KEY_0),
    ("KEY_1", Key::KEY_1),
    ("KEY_2", Key::KEY_2),
    ("KEY_3", Key::KEY_3),
    ("KEY_4", Key::KEY_4),
    ("KEY_5", Key::KEY_5),
    ("KEY_6", Key::KEY_6),
    ("KEY_7", Key::KEY_7),
    ("KEY_8", Key::KEY_8),
    ("KEY_9", Key::KEY_9),
    ("KEY_F1", Key::KEY_F1),
    ("KEY_F2", Key::KEY_F2),
    ("KEY_F3", Key::KEY_F3),
    ("KEY_F4", Key::KEY_F4),
    ("KEY_F5", Key::KEY_F5),
    ("KEY_F6", Key::KEY_F6),
    ("KEY_F7", Key::KEY_F7),
    ("KEY_F8", Key::KEY_F8),
    ("KEY_F9", Key::KEY_F9),
    ("KEY_F10", Key::KEY_F10),
    ("KEY_F11", Key::KEY_F11),
    ("KEY_F12", Key::KEY_F12),
    ("KEY_LEFTCTRL", Key::KEY_LEFTCTRL),
    ("KEY_RIGHTCTRL", Key::KEY_RIGHTCTRL),
    ("KEY_LEFTSHIFT", Key::KEY_LEFTSHIFT),
    ("KEY_RIGHTSHIFT", Key::KEY_RIGHTSHIFT),
    ("KEY_LEFTALT", Key::KEY_LEFTALT),
    ("KEY_RIGHTALT", Key::KEY_RIGHTALT),
    ("KEY_LEFTMETA", Key::KEY_LEFTMETA),
    ("KEY_RIGHTMETA", Key::KEY_RIGHTMETA),
    ("KEY_ESC", Key::KEY_ESC),
    ("KEY_TAB", Key::KEY_TAB),
    ("KEY_BACKSPACE", Key::KEY_BACKSPACE),
    ("KEY_ENTER", Key::KEY_ENTER),
    ("KEY_SPACE", Key::KEY_SPACE),
    ("KEY_CAPSLOCK", Key::KEY_CAPSLOCK),
    ("KEY_UP", Key::KEY_UP),
    ("KEY_DOWN", Key::KEY_DOWN),
    ("KEY_LEFT", Key::KEY_LEFT),
    ("KEY_RIGHT", Key::KEY_RIGHT),
    ("KEY_HOME", Key::KEY_HOME),
    ("KEY_END", Key::KEY_END),
    ("KEY_PAGEUP", Key::KEY_PAGEUP),
    ("KEY_PAGEDOWN", Key::KEY_PAGEDOWN),
    ("KEY_INSERT", Key::KEY_INSERT),
    ("KEY_DELETE", Key::KEY_DELETE),
    ("KEY_MINUS", Key::KEY_MINUS),
    ("KEY_EQUAL", Key::KEY_EQUAL),
    ("KEY_LEFTBRACE", Key::KEY_LEFTBRACE),
    ("KEY_RIGHTBRACE", Key::KEY_RIGHTBRACE),
    ("KEY_SEMICOLON", Key::KEY_SEMICOLON),
    ("KEY_APOSTROPHE", Key::KEY_APOSTROPHE),
    ("KEY_GRAVE", Key::KEY_GRAVE),
    ("KEY_BACKSLASH", Key::KEY_BACKSLASH),
    ("KEY_COMMA", Key::KEY_COMMA),
    ("KEY_DOT", Key::KEY_DOT),
    ("KEY_SLASH", Key::KEY_SLASH),
];

/// Resolve one key name to its evdev code. Names are exact, matching the
/// kernel's input-event-codes spelling.
pub fn resolve_key_name(name: &str) -> Option<Key> {
    KEY_TABLE
        .iter()
        .find(|(table_name, _)| *table_name == name)
        .map(|&(_, key)| key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve_raw(name: &str) -> Option<u16> {
        resolve_key_name(name).map(|key| key.raw())
    }

    #[test]
    fn test_resolves_keys_and_buttons() {
        assert_eq!(resolve_raw("KEY_A"), Some(Key::KEY_A.raw()));
        assert_eq!(resolve_raw("KEY_LEFTCTRL"), Some(Key::KEY_LEFTCTRL.raw()));
        assert_eq!(resolve_raw("BTN_STYLUS2"), Some(Key::BTN_STYLUS2.raw()));
    }

    #[test]
    fn test_unknown_names_do_not_resolve() {
        assert_eq!(resolve_raw("KEY_BOGUS"), None);
        assert_eq!(resolve_raw("key_a"), None);
        assert_eq!(resolve_raw(""), None);
    }
}
