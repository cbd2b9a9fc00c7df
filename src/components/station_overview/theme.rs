//! Colours for the station overview.

/// RGBA color representation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
	pub r: u8,
	pub g: u8,
	pub b: u8,
	pub a: f64,
}

impl Color {
	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b, a: 1.0 }
	}

	pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
		Self { r, g, b, a }
	}

	pub fn with_alpha(self, a: f64) -> Self {
		Self { a, ..self }
	}

	/// Lighten the color by a factor (0.0 = unchanged, 1.0 = white)
	pub fn lighten(self, factor: f64) -> Self {
		self.lerp(Color::rgba(255, 255, 255, self.a), factor)
	}

	/// Linear interpolation between two colors
	pub fn lerp(self, other: Color, t: f64) -> Self {
		let t = t.clamp(0.0, 1.0);
		let mix = |a: u8, b: u8| (a as f64 * (1.0 - t) + b as f64 * t).round() as u8;
		Self {
			r: mix(self.r, other.r),
			g: mix(self.g, other.g),
			b: mix(self.b, other.b),
			a: self.a * (1.0 - t) + other.a * t,
		}
	}

	pub fn to_css(self) -> String {
		if (self.a - 1.0).abs() < 0.001 {
			format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
		} else {
			format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
		}
	}
}

/// Parses `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb(..)` and `rgba(..)`.
pub fn parse_color(text: &str) -> Option<Color> {
	let text = text.trim();
	if let Some(hex) = text.strip_prefix('#') {
		return parse_hex(hex);
	}
	let inner = text
		.strip_prefix("rgba(")
		.or_else(|| text.strip_prefix("rgb("))?
		.strip_suffix(')')?;
	let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
	if !(3..=4).contains(&parts.len()) {
		return None;
	}
	let channel = |s: &str| s.parse::<f64>().ok().map(|v| v.clamp(0.0, 255.0).round() as u8);
	let a = match parts.get(3) {
		Some(s) => s.parse::<f64>().ok()?.clamp(0.0, 1.0),
		None => 1.0,
	};
	Some(Color::rgba(channel(parts[0])?, channel(parts[1])?, channel(parts[2])?, a))
}

fn parse_hex(hex: &str) -> Option<Color> {
	if !hex.is_ascii() {
		return None;
	}
	let byte = |s: &str| u8::from_str_radix(s, 16).ok();
	match hex.len() {
		3 => {
			let digit = |i: usize| byte(&hex[i..i + 1]).map(|v| v * 17);
			Some(Color::rgb(digit(0)?, digit(1)?, digit(2)?))
		}
		6 | 8 => {
			let a = if hex.len() == 8 {
				byte(&hex[6..8])? as f64 / 255.0
			} else {
				1.0
			};
			Some(Color::rgba(byte(&hex[0..2])?, byte(&hex[2..4])?, byte(&hex[4..6])?, a))
		}
		_ => None,
	}
}

/// Station palette.
#[derive(Clone, Debug, PartialEq)]
pub struct StationTheme {
	pub background: Color,
	pub archecore: Color,
	pub archecore_glow: Color,
	pub portal: Color,
	pub outline: Color,
	pub outline_fill: Color,
	pub hover: Color,
	pub selected: Color,
	pub highlight: Color,
	pub core_marker: Color,
	pub cluster_marker: Color,
	pub leaf: Color,
	pub link: Color,
	pub spoke: Color,
	pub area_fill: Color,
	pub label: Color,
	/// Per-space accents, picked by a stable hash of the space id.
	pub accents: Vec<Color>,
}

impl Default for StationTheme {
	fn default() -> Self {
		Self {
			background: Color::rgb(22, 27, 34),
			archecore: Color::rgb(214, 222, 235),
			archecore_glow: Color::rgba(214, 222, 235, 0.12),
			portal: Color::rgba(140, 160, 180, 0.25),
			outline: Color::rgba(140, 160, 180, 0.45),
			outline_fill: Color::rgba(140, 160, 180, 0.04),
			hover: Color::rgb(190, 210, 230),
			selected: Color::rgb(235, 200, 120),
			highlight: Color::rgb(120, 200, 190),
			core_marker: Color::rgb(214, 222, 235),
			cluster_marker: Color::rgb(129, 161, 193),
			leaf: Color::rgb(143, 163, 180),
			link: Color::rgba(140, 160, 180, 0.5),
			spoke: Color::rgba(140, 160, 180, 0.3),
			area_fill: Color::rgb(100, 148, 160),
			label: Color::rgb(200, 208, 220),
			accents: vec![
				Color::rgb(94, 129, 172),
				Color::rgb(100, 148, 160),
				Color::rgb(136, 160, 175),
				Color::rgb(130, 120, 150),
				Color::rgb(119, 158, 165),
				Color::rgb(180, 136, 100),
			],
		}
	}
}

impl StationTheme {
	pub fn accent(&self, id: &str) -> Color {
		if self.accents.is_empty() {
			return self.outline;
		}
		let hash = id
			.bytes()
			.fold(0usize, |h, b| h.wrapping_mul(31).wrapping_add(b as usize));
		self.accents[hash % self.accents.len()]
	}

	/// A stored colour string, or `fallback` when it is missing or unparseable.
	pub fn resolve(&self, stored: Option<&str>, fallback: Color) -> Color {
		stored.and_then(parse_color).unwrap_or(fallback)
	}
}
