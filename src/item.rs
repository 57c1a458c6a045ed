use serde::{Deserialize, Serialize};

use crate::coords::Point3;

/// Placeable tools. Only trees take a grid cell; the others modify a static
/// building or factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ItemKind {
	Tree,
	SolarPanel,
	RemoveChimney,
	TurnOffLights,
}

impl ItemKind {
	pub const ALL: [ItemKind; 4] = [
		ItemKind::Tree,
		ItemKind::SolarPanel,
		ItemKind::RemoveChimney,
		ItemKind::TurnOffLights,
	];

	pub fn score(self) -> u32 {
		match self {
			ItemKind::Tree => 5,
			ItemKind::SolarPanel => 7,
			ItemKind::RemoveChimney => 12,
			ItemKind::TurnOffLights => 4,
		}
	}

	pub fn occupies_cell(self) -> bool {
		matches!(self, ItemKind::Tree)
	}

	pub fn is_modifier(self) -> bool {
		!self.occupies_cell()
	}

	pub fn slug(self) -> &'static str {
		match self {
			ItemKind::Tree => "tree",
			ItemKind::SolarPanel => "solar-panel",
			ItemKind::RemoveChimney => "remove-chimney",
			ItemKind::TurnOffLights => "turn-off-lights",
		}
	}

	pub fn label(self) -> &'static str {
		match self {
			ItemKind::Tree => "Tree",
			ItemKind::SolarPanel => "Solar panel",
			ItemKind::RemoveChimney => "Remove chimney",
			ItemKind::TurnOffLights => "Turn off lights",
		}
	}

	pub fn bonus_label(self) -> &'static str {
		match self {
			ItemKind::Tree => "+5% O2",
			ItemKind::SolarPanel => "+7% energy",
			ItemKind::RemoveChimney => "-12% CO2",
			ItemKind::TurnOffLights => "+4% savings",
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedItem {
	pub id: String,
	pub kind: ItemKind,
	pub position: Point3,
	pub rotation: Point3,
	pub target_id: Option<String>,
}

impl PlacedItem {
	pub fn targets(&self, kind: ItemKind, target_id: &str) -> bool {
		self.kind == kind && self.target_id.as_deref() == Some(target_id)
	}
}
