use thiserror::Error;

use crate::city::{CityLayout, ElementKind, StaticCityElement};
use crate::config::GameConfig;
use crate::coords::{GridBounds, GridCell, Point3};
use crate::item::{ItemKind, PlacedItem};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlacementError {
	#[error("No tool selected")]
	NoToolSelected,
	#[error("Game is not running")]
	GameInactive,
	#[error("Cell ({x},{z}) is outside the city")]
	OutOfGrid { x: i32, z: i32 },
	#[error("Cell ({x},{z}) is already occupied")]
	CellOccupied { x: i32, z: i32 },
	#[error("Nothing to apply {0} to here")]
	NoTarget(&'static str),
	#[error("{target} already has {kind}")]
	AlreadyApplied { kind: &'static str, target: String },
	#[error("Lights can only be turned off at night")]
	NotNight,
	#[error("{0} has no lights")]
	NoLights(String),
	#[error("A {target} target cannot take {tool}")]
	ToolMismatch { tool: &'static str, target: &'static str },
}

/// Where a tool would land: either a grid cell (trees) or a static target.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementTarget {
	pub kind: ItemKind,
	pub position: Point3,
	pub rotation: Point3,
	pub cell: Option<GridCell>,
	pub target_id: Option<String>,
}

/// Maps pointer positions to placement targets against a static layout and
/// the items placed so far.
#[derive(Debug, Clone, Copy)]
pub struct PlacementResolver<'a> {
	city: &'a CityLayout,
	cell_size: f32,
	pick_radius: f32,
	bounds: GridBounds,
}

impl<'a> PlacementResolver<'a> {
	pub fn new(city: &'a CityLayout, config: &GameConfig) -> Self {
		Self {
			city,
			cell_size: config.cell_size,
			pick_radius: config.pick_radius,
			bounds: GridBounds::centered(config.grid_size),
		}
	}

	pub fn bounds(&self) -> GridBounds {
		self.bounds
	}

	pub fn cell_size(&self) -> f32 {
		self.cell_size
	}

	pub fn resolve(
		&self,
		tool: ItemKind,
		point: Point3,
		placed: &[PlacedItem],
		night: bool,
	) -> Result<PlacementTarget, PlacementError> {
		let Some(kind) = element_for(tool) else {
			return self.resolve_cell(tool, point, placed);
		};
		if tool == ItemKind::TurnOffLights && !night {
			return Err(PlacementError::NotNight);
		}
		let element = self.pick(kind, point, tool)?;
		self.resolve_on(tool, element, placed, night)
	}

	/// Re-checks a target resolved earlier against the current items, so a
	/// stale or foreign target cannot be recorded twice.
	pub fn confirm(
		&self,
		tool: ItemKind,
		target: &PlacementTarget,
		placed: &[PlacedItem],
		night: bool,
	) -> Result<PlacementTarget, PlacementError> {
		if target.kind != tool {
			return Err(PlacementError::ToolMismatch { tool: tool.slug(), target: target.kind.slug() });
		}
		match (element_for(tool), target.target_id.as_deref()) {
			(None, None) => self.resolve_cell(tool, target.position, placed),
			(Some(_), Some(id)) => {
				let element = self.city.get(id).ok_or(PlacementError::NoTarget(tool.slug()))?;
				self.resolve_on(tool, element, placed, night)
			}
			_ => Err(PlacementError::NoTarget(tool.slug())),
		}
	}

	/// Non-mutating preview of `resolve`, used for highlighting.
	pub fn hover(&self, tool: ItemKind, point: Point3, placed: &[PlacedItem], night: bool) -> Option<PlacementTarget> {
		self.resolve(tool, point, placed, night).ok()
	}

	pub fn is_cell_occupied(&self, cell: GridCell, placed: &[PlacedItem]) -> bool {
		placed
			.iter()
			.filter(|item| item.kind.occupies_cell())
			.any(|item| GridCell::snap(item.position, self.cell_size) == cell)
	}

	fn resolve_cell(&self, tool: ItemKind, point: Point3, placed: &[PlacedItem]) -> Result<PlacementTarget, PlacementError> {
		let cell = GridCell::snap(point, self.cell_size);
		if !self.bounds.contains(cell) {
			return Err(PlacementError::OutOfGrid { x: cell.x, z: cell.z });
		}
		if self.is_cell_occupied(cell, placed) {
			return Err(PlacementError::CellOccupied { x: cell.x, z: cell.z });
		}
		Ok(PlacementTarget {
			kind: tool,
			position: cell.center(self.cell_size),
			rotation: Point3::ZERO,
			cell: Some(cell),
			target_id: None,
		})
	}

	fn resolve_on(
		&self,
		tool: ItemKind,
		element: &StaticCityElement,
		placed: &[PlacedItem],
		night: bool,
	) -> Result<PlacementTarget, PlacementError> {
		if element_for(tool) != Some(element.kind) {
			return Err(PlacementError::NoTarget(tool.slug()));
		}
		if tool == ItemKind::TurnOffLights {
			if !night {
				return Err(PlacementError::NotNight);
			}
			if !element.has_lights {
				return Err(PlacementError::NoLights(element.id.clone()));
			}
		}
		ensure_unapplied(tool, element, placed)?;
		let position = match tool {
			ItemKind::SolarPanel => Point3::new(element.position.x, element.roof_height(), element.position.z),
			_ => element.position,
		};
		Ok(target_on(tool, element, position))
	}

	fn pick(&self, kind: ElementKind, point: Point3, tool: ItemKind) -> Result<&'a StaticCityElement, PlacementError> {
		self.city
			.find_near(kind, point, self.pick_radius)
			.ok_or(PlacementError::NoTarget(tool.slug()))
	}
}

fn element_for(tool: ItemKind) -> Option<ElementKind> {
	match tool {
		ItemKind::Tree => None,
		ItemKind::SolarPanel | ItemKind::TurnOffLights => Some(ElementKind::Building),
		ItemKind::RemoveChimney => Some(ElementKind::Factory),
	}
}

fn ensure_unapplied(tool: ItemKind, target: &StaticCityElement, placed: &[PlacedItem]) -> Result<(), PlacementError> {
	if placed.iter().any(|item| item.targets(tool, &target.id)) {
		return Err(PlacementError::AlreadyApplied { kind: tool.slug(), target: target.id.clone() });
	}
	Ok(())
}

fn target_on(tool: ItemKind, target: &StaticCityElement, position: Point3) -> PlacementTarget {
	PlacementTarget {
		kind: tool,
		position,
		rotation: Point3::ZERO,
		cell: None,
		target_id: Some(target.id.clone()),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn placed(kind: ItemKind, position: Point3, target: Option<&str>) -> PlacedItem {
		PlacedItem {
			id: format!("{}-test", kind.slug()),
			kind,
			position,
			rotation: Point3::ZERO,
			target_id: target.map(str::to_string),
		}
	}

	#[test]
	fn tree_snaps_to_cell() {
		let city = CityLayout::polluted_city();
		let r = PlacementResolver::new(&city, &GameConfig::default());
		let t = r.resolve(ItemKind::Tree, Point3::ground(3.2, -0.7), &[], false).unwrap();
		assert_eq!(t.cell, Some(GridCell::new(2, 0)));
		assert_eq!(t.position, Point3::ground(4.0, 0.0));
		assert!(t.target_id.is_none());
	}

	#[test]
	fn tree_rejected_on_occupied_or_outside_cell() {
		let city = CityLayout::polluted_city();
		let r = PlacementResolver::new(&city, &GameConfig::default());
		let items = vec![placed(ItemKind::Tree, Point3::ground(4.0, 0.0), None)];
		let err = r.resolve(ItemKind::Tree, Point3::ground(4.3, 0.2), &items, false).unwrap_err();
		assert_eq!(err, PlacementError::CellOccupied { x: 2, z: 0 });
		let err = r.resolve(ItemKind::Tree, Point3::ground(12.0, 0.0), &[], false).unwrap_err();
		assert_eq!(err, PlacementError::OutOfGrid { x: 6, z: 0 });
	}

	#[test]
	fn modifiers_do_not_occupy_cells() {
		let city = CityLayout::polluted_city();
		let r = PlacementResolver::new(&city, &GameConfig::default());
		let items = vec![placed(ItemKind::RemoveChimney, Point3::ground(0.0, 0.0), Some("factory-1"))];
		assert!(r.resolve(ItemKind::Tree, Point3::ground(0.0, 0.0), &items, false).is_ok());
	}

	#[test]
	fn solar_panel_lands_on_roof_once() {
		let city = CityLayout::polluted_city();
		let r = PlacementResolver::new(&city, &GameConfig::default());
		let t = r.resolve(ItemKind::SolarPanel, Point3::ground(-9.5, -6.4), &[], false).unwrap();
		assert_eq!(t.target_id.as_deref(), Some("building-2"));
		assert_eq!(t.position, Point3::new(-10.0, 4.0, -6.0));

		let items = vec![placed(ItemKind::SolarPanel, t.position, Some("building-2"))];
		let err = r.resolve(ItemKind::SolarPanel, Point3::ground(-10.0, -6.0), &items, false).unwrap_err();
		assert!(matches!(err, PlacementError::AlreadyApplied { .. }));
	}

	#[test]
	fn solar_panel_needs_a_building() {
		let city = CityLayout::polluted_city();
		let r = PlacementResolver::new(&city, &GameConfig::default());
		let err = r.resolve(ItemKind::SolarPanel, Point3::ground(-6.0, 6.0), &[], false).unwrap_err();
		assert_eq!(err, PlacementError::NoTarget("solar-panel"));
	}

	#[test]
	fn chimney_removed_once() {
		let city = CityLayout::polluted_city();
		let r = PlacementResolver::new(&city, &GameConfig::default());
		let t = r.resolve(ItemKind::RemoveChimney, Point3::ground(4.2, 2.3), &[], false).unwrap();
		assert_eq!(t.target_id.as_deref(), Some("factory-2"));
		let items = vec![placed(ItemKind::RemoveChimney, t.position, Some("factory-2"))];
		assert!(r.resolve(ItemKind::RemoveChimney, Point3::ground(4.0, 2.0), &items, false).is_err());
		assert!(r.resolve(ItemKind::RemoveChimney, Point3::ground(-4.0, 4.0), &items, false).is_ok());
	}

	#[test]
	fn lights_need_night_and_a_lit_building() {
		let city = CityLayout::polluted_city();
		let r = PlacementResolver::new(&city, &GameConfig::default());
		let lit = Point3::ground(0.0, 4.0);
		assert_eq!(r.resolve(ItemKind::TurnOffLights, lit, &[], false).unwrap_err(), PlacementError::NotNight);
		let t = r.resolve(ItemKind::TurnOffLights, lit, &[], true).unwrap();
		assert_eq!(t.target_id.as_deref(), Some("building-center-1"));

		let err = r.resolve(ItemKind::TurnOffLights, Point3::ground(-10.0, -10.0), &[], true).unwrap_err();
		assert_eq!(err, PlacementError::NoLights("building-1".to_string()));

		let items = vec![placed(ItemKind::TurnOffLights, lit, Some("building-center-1"))];
		assert!(r.hover(ItemKind::TurnOffLights, lit, &items, true).is_none());
	}

	#[test]
	fn confirm_rechecks_against_current_items() {
		let city = CityLayout::polluted_city();
		let r = PlacementResolver::new(&city, &GameConfig::default());
		let t = r.resolve(ItemKind::RemoveChimney, Point3::ground(0.0, 0.0), &[], false).unwrap();
		assert_eq!(r.confirm(ItemKind::RemoveChimney, &t, &[], false).unwrap(), t);

		let items = vec![placed(ItemKind::RemoveChimney, t.position, Some("factory-1"))];
		let err = r.confirm(ItemKind::RemoveChimney, &t, &items, false).unwrap_err();
		assert!(matches!(err, PlacementError::AlreadyApplied { .. }));

		let lights = PlacementTarget { kind: ItemKind::TurnOffLights, target_id: Some("factory-1".into()), ..t };
		assert_eq!(r.confirm(ItemKind::TurnOffLights, &lights, &[], true).unwrap_err(), PlacementError::NoTarget("turn-off-lights"));
	}
}
