// Physical input simulation via enigo. Every function here blocks; callers run
// them on a blocking thread.
use std::time::Duration;

use enigo::{Button, Coordinate, Direction, Enigo, Key, Keyboard, Mouse, Settings};

use crate::agent_engine::state::ClickKind;
use crate::errors::{GruntyError, GruntyResult};

const DRAG_STEPS: i32 = 10;
const DRAG_DURATION: Duration = Duration::from_millis(500);
const CLICK_GAP: Duration = Duration::from_millis(60);

fn input_err(e: impl std::fmt::Display) -> GruntyError {
    GruntyError::Capability(format!("input failed: {e}"))
}

pub fn connect() -> GruntyResult<Enigo> {
    Enigo::new(&Settings::default())
        .map_err(|e| GruntyError::Capability(format!("cannot connect to input system: {e}")))
}

pub fn move_to(enigo: &mut Enigo, x: i32, y: i32) -> GruntyResult<()> {
    enigo.move_mouse(x, y, Coordinate::Abs).map_err(input_err)
}

/// Clicks at the current cursor position.
pub fn click(enigo: &mut Enigo, kind: ClickKind) -> GruntyResult<()> {
    match kind {
        ClickKind::Left => enigo.button(Button::Left, Direction::Click),
        ClickKind::Right => enigo.button(Button::Right, Direction::Click),
        ClickKind::Middle => enigo.button(Button::Middle, Direction::Click),
        ClickKind::Double => enigo.button(Button::Left, Direction::Click).and_then(|()| {
            std::thread::sleep(CLICK_GAP);
            enigo.button(Button::Left, Direction::Click)
        }),
    }
    .map_err(input_err)
}

/// Left-button drag from the current cursor position to (x, y).
pub fn drag_to(enigo: &mut Enigo, x: i32, y: i32) -> GruntyResult<()> {
    let (start_x, start_y) = enigo.location().map_err(input_err)?;
    enigo.button(Button::Left, Direction::Press).map_err(input_err)?;

    let step_pause = DRAG_DURATION / DRAG_STEPS as u32;
    let mut moved = Ok(());
    for step in 1..=DRAG_STEPS {
        let ix = interpolate(start_x, x, step, DRAG_STEPS);
        let iy = interpolate(start_y, y, step, DRAG_STEPS);
        moved = enigo.move_mouse(ix, iy, Coordinate::Abs);
        if moved.is_err() {
            break;
        }
        std::thread::sleep(step_pause);
    }

    // Always release, even if a move failed.
    let released = enigo.button(Button::Left, Direction::Release);
    moved.and(released).map_err(input_err)
}

/// Point `step` of `steps` on the line from `start` to `end`, computed in i64.
/// The last step is exactly `end`.
fn interpolate(start: i32, end: i32, step: i32, steps: i32) -> i32 {
    let start = i64::from(start);
    let delta = i64::from(end) - start;
    let point = start + delta * i64::from(step) / i64::from(steps);
    point.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

pub fn type_text(enigo: &mut Enigo, text: &str) -> GruntyResult<()> {
    enigo.text(text).map_err(input_err)
}

/// Presses a key or `+`-joined combination such as `ctrl+shift+t`.
pub fn press_keys(enigo: &mut Enigo, combo: &str) -> GruntyResult<()> {
    let keys = parse_key_combo(combo)?;
    let Some((main, modifiers)) = keys.split_last() else {
        return Err(GruntyError::Capability("empty key combination".into()));
    };

    let mut pressed = Vec::with_capacity(modifiers.len());
    let mut result = Ok(());
    for key in modifiers {
        result = enigo.key(*key, Direction::Press);
        if result.is_err() {
            break;
        }
        pressed.push(*key);
    }
    if result.is_ok() {
        result = enigo.key(*main, Direction::Click);
    }
    for key in pressed.iter().rev() {
        let released = enigo.key(*key, Direction::Release);
        result = result.and(released);
    }
    result.map_err(input_err)
}

pub fn cursor_location(enigo: &Enigo) -> GruntyResult<(i32, i32)> {
    enigo.location().map_err(input_err)
}

/// Split `ctrl+shift+t` style input into keys: modifiers first, main key last.
pub fn parse_key_combo(combo: &str) -> GruntyResult<Vec<Key>> {
    let combo = combo.trim();
    // A lone "+" is the plus key, not a separator.
    if combo == "+" {
        return Ok(vec![Key::Unicode('+')]);
    }
    combo
        .split('+')
        .map(|part| {
            let part = part.trim();
            if part.is_empty() {
                return Err(GruntyError::Capability(format!("invalid key combination: {combo}")));
            }
            map_key_name(part)
                .ok_or_else(|| GruntyError::Capability(format!("unknown key: {part}")))
        })
        .collect()
}

/// xdotool-style key names (as the model uses them) to enigo keys.
fn map_key_name(name: &str) -> Option<Key> {
    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Some(Key::Unicode(c));
    }

    let key = match name.to_ascii_lowercase().as_str() {
        "return" | "enter" | "kp_enter" => Key::Return,
        "tab" => Key::Tab,
        "escape" | "esc" => Key::Escape,
        "backspace" => Key::Backspace,
        "delete" | "del" => Key::Delete,
        "space" => Key::Space,
        "up" => Key::UpArrow,
        "down" => Key::DownArrow,
        "left" => Key::LeftArrow,
        "right" => Key::RightArrow,
        "home" => Key::Home,
        "end" => Key::End,
        "page_up" | "pageup" | "prior" => Key::PageUp,
        "page_down" | "pagedown" | "next" => Key::PageDown,
        "ctrl" | "control" | "control_l" | "control_r" | "ctrl_l" | "ctrl_r" => Key::Control,
        "shift" | "shift_l" | "shift_r" => Key::Shift,
        "alt" | "alt_l" | "alt_r" | "option" => Key::Alt,
        "super" | "super_l" | "super_r" | "meta" | "cmd" | "command" | "win" => Key::Meta,
        "caps_lock" | "capslock" => Key::CapsLock,
        "f1" => Key::F1,
        "f2" => Key::F2,
        "f3" => Key::F3,
        "f4" => Key::F4,
        "f5" => Key::F5,
        "f6" => Key::F6,
        "f7" => Key::F7,
        "f8" => Key::F8,
        "f9" => Key::F9,
        "f10" => Key::F10,
        "f11" => Key::F11,
        "f12" => Key::F12,
        "minus" => Key::Unicode('-'),
        "plus" => Key::Unicode('+'),
        "period" => Key::Unicode('.'),
        "comma" => Key::Unicode(','),
        "slash" => Key::Unicode('/'),
        _ => return None,
    };
    Some(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drag_path_reaches_the_endpoint() {
        let path: Vec<i32> = (1..=DRAG_STEPS).map(|s| interpolate(100, 200, s, DRAG_STEPS)).collect();
        assert_eq!(path.first(), Some(&110));
        assert_eq!(path[4], 150);
        assert_eq!(path.last(), Some(&200));
    }

    #[test]
    fn drag_path_survives_extreme_endpoints() {
        for (start, end) in [(0, i32::MAX), (i32::MAX, i32::MIN), (-5000, i32::MIN), (1920, i32::MAX)] {
            let mut last = start;
            for step in 1..=DRAG_STEPS {
                let point = interpolate(start, end, step, DRAG_STEPS);
                if end > start {
                    assert!(point >= last);
                } else {
                    assert!(point <= last);
                }
                last = point;
            }
            assert_eq!(last, end);
        }
        assert_eq!(interpolate(0, i32::MAX, 5, 10), i32::MAX / 2);
    }

    #[test]
    fn single_named_keys() {
        assert_eq!(parse_key_combo("Return").unwrap(), vec![Key::Return]);
        assert_eq!(parse_key_combo("Page_Down").unwrap(), vec![Key::PageDown]);
        assert_eq!(parse_key_combo("esc").unwrap(), vec![Key::Escape]);
        assert_eq!(parse_key_combo("F5").unwrap(), vec![Key::F5]);
    }

    #[test]
    fn single_characters_are_unicode() {
        assert_eq!(parse_key_combo("a").unwrap(), vec![Key::Unicode('a')]);
        assert_eq!(parse_key_combo("+").unwrap(), vec![Key::Unicode('+')]);
    }

    #[test]
    fn modifiers_come_first() {
        assert_eq!(
            parse_key_combo("ctrl+shift+t").unwrap(),
            vec![Key::Control, Key::Shift, Key::Unicode('t')]
        );
        assert_eq!(
            parse_key_combo("super + Left").unwrap(),
            vec![Key::Meta, Key::LeftArrow]
        );
    }

    #[test]
    fn bad_combinations_are_rejected() {
        assert!(parse_key_combo("ctrl+").is_err());
        assert!(parse_key_combo("").is_err());
        let err = parse_key_combo("hyperdrive").unwrap_err();
        assert!(err.to_string().contains("unknown key: hyperdrive"));
    }
}
