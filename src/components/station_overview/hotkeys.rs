//! Global zoom hotkeys.
//!
//! The application turns matching key chords into an `sf:zoom-hotkey`
//! `CustomEvent` on `window`; any zoomable view listens for it. The detail is
//! plain JSON, `{"command": "zoom_in", "source": "keyboard"}`.

use log::debug;
use serde::{Deserialize, Serialize};
use wasm_bindgen::JsValue;
use web_sys::{CustomEvent, CustomEventInit, KeyboardEvent, Window};

pub const ZOOM_HOTKEY_EVENT: &str = "sf:zoom-hotkey";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoomCommand {
	ZoomIn,
	ZoomOut,
	ZoomReset,
	ZoomFit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HotkeySource {
	Keyboard,
	Ui,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoomHotkeyDetail {
	pub command: ZoomCommand,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub source: Option<HotkeySource>,
}

/// The parts of a `keydown` that matter for hotkeys.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyChord {
	/// `KeyboardEvent.key`.
	pub key: String,
	/// `KeyboardEvent.code`.
	pub code: String,
	pub ctrl: bool,
	pub meta: bool,
	pub shift: bool,
	pub alt: bool,
}

impl KeyChord {
	pub fn from_event(event: &KeyboardEvent) -> Self {
		Self {
			key: event.key(),
			code: event.code(),
			ctrl: event.ctrl_key(),
			meta: event.meta_key(),
			shift: event.shift_key(),
			alt: event.alt_key(),
		}
	}
}

/// Maps a chord to a zoom command. Alt never matches.
pub fn parse_zoom_hotkey(chord: &KeyChord) -> Option<ZoomCommand> {
	if chord.alt {
		return None;
	}
	let key = chord.key.to_lowercase();
	let key = key.as_str();
	let code = chord.code.as_str();
	let modified = chord.ctrl || chord.meta;
	let numpad = matches!(code, "NumpadAdd" | "NumpadSubtract" | "Numpad0");

	if chord.shift && (code == "Digit1" || key == "!") {
		return Some(ZoomCommand::ZoomFit);
	}
	if modified || numpad {
		if matches!(key, "=" | "+") || matches!(code, "Equal" | "NumpadAdd") {
			return Some(ZoomCommand::ZoomIn);
		}
		if matches!(key, "-" | "_") || matches!(code, "Minus" | "NumpadSubtract") {
			return Some(ZoomCommand::ZoomOut);
		}
		if key == "0" || matches!(code, "Digit0" | "Numpad0") {
			return Some(ZoomCommand::ZoomReset);
		}
	}
	if modified && (key == "9" || key == "f" || code == "Digit9") {
		return Some(ZoomCommand::ZoomFit);
	}
	None
}

/// Fires the global hotkey event on `window`.
pub fn dispatch_zoom_hotkey(window: &Window, detail: ZoomHotkeyDetail) {
	let Ok(json) = serde_json::to_string(&detail) else {
		return;
	};
	let Ok(value) = js_sys::JSON::parse(&json) else {
		return;
	};
	let init = CustomEventInit::new();
	init.set_detail(&value);
	if let Ok(event) = CustomEvent::new_with_event_init_dict(ZOOM_HOTKEY_EVENT, &init) {
		debug!("symbolfield-station: dispatch {:?}", detail.command);
		let _ = window.dispatch_event(&event);
	}
}

/// Reads the command carried by an `sf:zoom-hotkey` event.
pub fn read_zoom_hotkey(event: &CustomEvent) -> Option<ZoomCommand> {
	detail_from_js(&event.detail())
}

fn detail_from_js(value: &JsValue) -> Option<ZoomCommand> {
	let json: String = js_sys::JSON::stringify(value).ok()?.into();
	serde_json::from_str::<ZoomHotkeyDetail>(&json)
		.ok()
		.map(|detail| detail.command)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn chord(key: &str, code: &str) -> KeyChord {
		KeyChord {
			key: key.into(),
			code: code.into(),
			..Default::default()
		}
	}

	fn ctrl(key: &str, code: &str) -> KeyChord {
		KeyChord {
			ctrl: true,
			..chord(key, code)
		}
	}

	#[test]
	fn test_modified_zoom_keys() {
		assert_eq!(parse_zoom_hotkey(&ctrl("=", "Equal")), Some(ZoomCommand::ZoomIn));
		assert_eq!(parse_zoom_hotkey(&ctrl("+", "")), Some(ZoomCommand::ZoomIn));
		assert_eq!(parse_zoom_hotkey(&ctrl("_", "Minus")), Some(ZoomCommand::ZoomOut));
		assert_eq!(parse_zoom_hotkey(&ctrl("0", "Digit0")), Some(ZoomCommand::ZoomReset));
		assert_eq!(parse_zoom_hotkey(&ctrl("F", "KeyF")), Some(ZoomCommand::ZoomFit));
		let meta = KeyChord {
			meta: true,
			..chord("9", "Digit9")
		};
		assert_eq!(parse_zoom_hotkey(&meta), Some(ZoomCommand::ZoomFit));
	}

	#[test]
	fn test_numpad_needs_no_modifier() {
		assert_eq!(parse_zoom_hotkey(&chord("+", "NumpadAdd")), Some(ZoomCommand::ZoomIn));
		assert_eq!(parse_zoom_hotkey(&chord("-", "NumpadSubtract")), Some(ZoomCommand::ZoomOut));
		assert_eq!(parse_zoom_hotkey(&chord("0", "Numpad0")), Some(ZoomCommand::ZoomReset));
	}

	#[test]
	fn test_unmodified_and_alt_chords_are_ignored() {
		assert_eq!(parse_zoom_hotkey(&chord("=", "Equal")), None);
		assert_eq!(parse_zoom_hotkey(&chord("f", "KeyF")), None);
		let alt = KeyChord {
			alt: true,
			..ctrl("=", "Equal")
		};
		assert_eq!(parse_zoom_hotkey(&alt), None);
	}

	#[test]
	fn test_shift_one_fits() {
		let shifted = KeyChord {
			shift: true,
			..chord("!", "Digit1")
		};
		assert_eq!(parse_zoom_hotkey(&shifted), Some(ZoomCommand::ZoomFit));
	}

	#[test]
	fn test_detail_json_shape() {
		let detail = ZoomHotkeyDetail {
			command: ZoomCommand::ZoomReset,
			source: Some(HotkeySource::Keyboard),
		};
		assert_eq!(
			serde_json::to_string(&detail).unwrap(),
			r#"{"command":"zoom_reset","source":"keyboard"}"#
		);
		let parsed: ZoomHotkeyDetail = serde_json::from_str(r#"{"command":"zoom_fit","step":0.25}"#).unwrap();
		assert_eq!(parsed.command, ZoomCommand::ZoomFit);
		assert_eq!(parsed.source, None);
	}
}
