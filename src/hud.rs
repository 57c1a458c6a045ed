use crate::item::ItemKind;
use crate::session::{GamePhase, GameSession};

pub const GAME_TITLE: &str = "GreenCity - Build your green city";
pub const START_LABEL: &str = "Start";
pub const REPLAY_LABEL: &str = "Play again";
pub const NIGHT_MODE_LABEL: &str = "Night mode";
pub const DAY_MODE_LABEL: &str = "Day mode";
pub const WIN_BANNER: &str = "Green city built!";
pub const LOSE_BANNER: &str = "Time's up!";
pub const TOOL_HINT: &str = "Select an item, then click the map to place it";
pub const INTRO_TEXT: &str = "Turn this polluted city into a green one by adding eco-friendly items.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerBand {
	Plenty,
	Hurry,
	Critical,
}

impl TimerBand {
	pub fn for_seconds(seconds: u32) -> Self {
		if seconds > 60 {
			TimerBand::Plenty
		} else if seconds > 30 {
			TimerBand::Hurry
		} else {
			TimerBand::Critical
		}
	}
}

/// `MM:SS`, minutes zero-padded and not wrapped at one hour.
pub fn format_time(seconds: u32) -> String {
	format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

pub fn progress_fraction(score: u32, target: u32) -> f32 {
	if target == 0 {
		return 1.0;
	}
	(score as f32 / target as f32).clamp(0.0, 1.0)
}

pub fn format_hud(score: u32, target: u32, time_left: u32) -> String {
	format!("Green score: {}/{} | {}", score, target, format_time(time_left))
}

pub fn day_night_label(night: bool) -> &'static str {
	if night { DAY_MODE_LABEL } else { NIGHT_MODE_LABEL }
}

pub fn end_banner(phase: GamePhase) -> Option<&'static str> {
	match phase {
		GamePhase::Won => Some(WIN_BANNER),
		GamePhase::Lost => Some(LOSE_BANNER),
		GamePhase::NotStarted | GamePhase::Running => None,
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolButton {
	pub kind: ItemKind,
	pub label: &'static str,
	pub bonus: &'static str,
	pub selected: bool,
	pub enabled: bool,
}

pub fn tool_buttons(session: &GameSession) -> Vec<ToolButton> {
	ItemKind::ALL
		.iter()
		.map(|&kind| ToolButton {
			kind,
			label: kind.label(),
			bonus: kind.bonus_label(),
			selected: session.selected() == Some(kind),
			enabled: session.is_active() && (kind != ItemKind::TurnOffLights || session.is_night()),
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::city::CityLayout;
	use crate::config::GameConfig;

	#[test]
	fn time_format() {
		assert_eq!(format_time(120), "02:00");
		assert_eq!(format_time(61), "01:01");
		assert_eq!(format_time(9), "00:09");
	}

	#[test]
	fn timer_bands() {
		assert_eq!(TimerBand::for_seconds(61), TimerBand::Plenty);
		assert_eq!(TimerBand::for_seconds(60), TimerBand::Hurry);
		assert_eq!(TimerBand::for_seconds(31), TimerBand::Hurry);
		assert_eq!(TimerBand::for_seconds(30), TimerBand::Critical);
	}

	#[test]
	fn hud_line() {
		let s = format_hud(35, 100, 75);
		assert!(s.contains("35/100"));
		assert!(s.contains("01:15"));
		assert_eq!(progress_fraction(35, 100), 0.35);
		assert_eq!(progress_fraction(150, 100), 1.0);
	}

	#[test]
	fn lights_button_disabled_by_day() {
		let mut s = GameSession::with_seed(GameConfig::default(), CityLayout::polluted_city(), 3).unwrap();
		assert!(tool_buttons(&s).iter().all(|b| !b.enabled));
		s.start();
		let buttons = tool_buttons(&s);
		assert_eq!(buttons.len(), 4);
		let lights = buttons.iter().find(|b| b.kind == ItemKind::TurnOffLights).unwrap();
		assert!(!lights.enabled);
		s.toggle_day_night();
		s.select_tool(ItemKind::TurnOffLights);
		let lights = tool_buttons(&s).into_iter().find(|b| b.kind == ItemKind::TurnOffLights).unwrap();
		assert!(lights.enabled && lights.selected);
	}

	#[test]
	fn banners() {
		assert_eq!(end_banner(GamePhase::Won), Some(WIN_BANNER));
		assert_eq!(end_banner(GamePhase::Lost), Some(LOSE_BANNER));
		assert_eq!(end_banner(GamePhase::Running), None);
		assert_eq!(day_night_label(false), NIGHT_MODE_LABEL);
	}
}
