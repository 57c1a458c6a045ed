use std::f32::consts::{FRAC_PI_2, PI};

use serde::{Deserialize, Serialize};

use crate::coords::Point3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Building,
    Road,
    Factory,
    Car,
}

/// Part of the fixed base layout. Never modified during a session; placed
/// items refer to it by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticCityElement {
    pub id: String,
    pub kind: ElementKind,
    pub position: Point3,
    #[serde(default)]
    pub rotation: Point3,
    #[serde(default = "unit_scale")]
    pub scale: Point3,
    #[serde(default)]
    pub has_lights: bool,
}

fn unit_scale() -> Point3 {
    Point3::new(1.0, 1.0, 1.0)
}

impl StaticCityElement {
    fn new(kind: ElementKind, id: impl Into<String>, position: Point3) -> Self {
        Self {
            id: id.into(),
            kind,
            position,
            rotation: Point3::ZERO,
            scale: unit_scale(),
            has_lights: false,
        }
    }

    fn building(id: impl Into<String>, x: f32, z: f32, scale: Point3) -> Self {
        Self { scale, ..Self::new(ElementKind::Building, id, Point3::ground(x, z)) }
    }

    fn lit_building(id: impl Into<String>, x: f32, z: f32, scale: Point3) -> Self {
        Self { has_lights: true, ..Self::building(id, x, z, scale) }
    }

    fn road(id: impl Into<String>, x: f32, z: f32, yaw: f32) -> Self {
        Self { rotation: Point3::new(0.0, yaw, 0.0), ..Self::new(ElementKind::Road, id, Point3::ground(x, z)) }
    }

    fn factory(id: impl Into<String>, x: f32, z: f32, s: f32) -> Self {
        Self { scale: Point3::new(s, s, s), ..Self::new(ElementKind::Factory, id, Point3::ground(x, z)) }
    }

    fn car(id: impl Into<String>, x: f32, z: f32, yaw: f32) -> Self {
        Self {
            rotation: Point3::new(0.0, yaw, 0.0),
            ..Self::new(ElementKind::Car, id, Point3::new(x, 0.1, z))
        }
    }

    /// Height of the top face; solar panels sit here.
    pub fn roof_height(&self) -> f32 {
        self.position.y + self.scale.y * 2.0
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CityLayout {
    elements: Vec<StaticCityElement>,
}

impl CityLayout {
    pub fn new(elements: Vec<StaticCityElement>) -> Self {
        Self { elements }
    }

    /// The polluted starting city: a ring of buildings, a square road loop,
    /// lit towers and factories in the centre, and a few cars.
    pub fn polluted_city() -> Self {
        use StaticCityElement as E;
        let s = |h: f32| Point3::new(1.0, h, 1.0);
        let mut elements = vec![
            E::building("building-1", -10.0, -10.0, s(1.5)),
            E::building("building-2", -10.0, -6.0, s(2.0)),
            E::building("building-3", -10.0, -2.0, s(1.0)),
            E::building("building-4", -10.0, 2.0, s(1.8)),
            E::building("building-5", -6.0, -10.0, s(1.2)),
            E::building("building-6", -2.0, -10.0, s(1.7)),
            E::building("building-7", 2.0, -10.0, s(1.3)),
            E::building("building-8", 6.0, -10.0, s(1.5)),
            E::building("building-9", 10.0, -10.0, s(2.2)),
            E::building("building-10", 10.0, -6.0, s(1.6)),
            E::building("building-11", 10.0, -2.0, s(1.4)),
            E::building("building-12", 10.0, 2.0, s(1.9)),
            E::building("building-13", 10.0, 6.0, s(1.3)),
            E::building("building-14", 10.0, 10.0, s(1.7)),
            E::building("building-15", 6.0, 10.0, s(1.3)),
            E::building("building-16", 2.0, 10.0, s(1.7)),
            E::building("building-17", -2.0, 10.0, s(1.5)),
            E::building("building-18", -6.0, 10.0, s(2.1)),
            E::building("building-19", -10.0, 6.0, s(1.8)),
            E::building("building-20", -10.0, 10.0, s(1.4)),
            E::lit_building("building-center-1", 0.0, 4.0, Point3::new(1.2, 2.5, 1.2)),
            E::lit_building("building-center-2", -4.0, 0.0, Point3::new(1.3, 2.2, 1.3)),
            E::lit_building("building-center-3", 4.0, -4.0, Point3::new(1.4, 2.8, 1.4)),
            E::lit_building("building-center-4", 0.0, -4.0, Point3::new(1.2, 2.0, 1.2)),
            E::lit_building("building-center-5", 2.0, -2.0, Point3::new(1.1, 1.8, 1.1)),
        ];

        // Road loop: top and bottom rows run along X, the sides along Z.
        let mut road = 0;
        let mut push_road = |elements: &mut Vec<StaticCityElement>, x: f32, z: f32, yaw: f32| {
            road += 1;
            elements.push(E::road(format!("road-{road}"), x, z, yaw));
        };
        for i in -4..=4 {
            push_road(&mut elements, i as f32 * 2.0, -8.0, 0.0);
        }
        for i in -3..=4 {
            push_road(&mut elements, -8.0, i as f32 * 2.0, FRAC_PI_2);
        }
        for i in -4..=4 {
            push_road(&mut elements, i as f32 * 2.0, 8.0, 0.0);
        }
        for i in -3..=3 {
            push_road(&mut elements, 8.0, i as f32 * 2.0, FRAC_PI_2);
        }

        elements.extend([
            E::factory("factory-1", 0.0, 0.0, 1.5),
            E::factory("factory-2", 4.0, 2.0, 1.2),
            E::factory("factory-3", -4.0, 4.0, 1.3),
            E::factory("factory-5", -2.0, -2.0, 1.2),
        ]);

        elements.extend([
            E::car("car-1", -6.0, -8.0, 0.0),
            E::car("car-2", 2.0, -8.0, 0.0),
            E::car("car-3", -8.0, 2.0, FRAC_PI_2),
            E::car("car-4", 8.0, -4.0, FRAC_PI_2),
            E::car("car-5", 4.0, 8.0, PI),
            E::car("car-6", -4.0, 8.0, PI),
            E::car("car-7", 8.0, 4.0, FRAC_PI_2),
            E::car("car-8", -8.0, -4.0, FRAC_PI_2),
        ]);

        Self { elements }
    }

    pub fn elements(&self) -> &[StaticCityElement] {
        &self.elements
    }

    pub fn get(&self, id: &str) -> Option<&StaticCityElement> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn of_kind(&self, kind: ElementKind) -> impl Iterator<Item = &StaticCityElement> {
        self.elements.iter().filter(move |e| e.kind == kind)
    }

    /// First element of `kind` whose centre is within `radius` of `p` on both
    /// ground axes.
    pub fn find_near(&self, kind: ElementKind, p: Point3, radius: f32) -> Option<&StaticCityElement> {
        self.of_kind(kind).find(|e| e.position.near_on_ground(p, radius))
    }
}

/// Where the `lane`-th car is `elapsed` seconds into the scene, and its
/// heading around the vertical axis. Cars shuttle back and forth on the four
/// ring roads, one lane per car index modulo 4.
pub fn car_pose(lane: usize, elapsed: f32) -> (Point3, f32) {
    match lane % 4 {
        0 => {
            let x = -6.0 + (elapsed * 0.5).sin() * 12.0;
            (Point3::ground(x, -8.0), if x > 0.0 { PI } else { 0.0 })
        }
        1 => {
            let z = -4.0 + (elapsed * 0.4).sin() * 10.0;
            (Point3::ground(8.0, z), if z > 0.0 { 3.0 * FRAC_PI_2 } else { FRAC_PI_2 })
        }
        2 => {
            let x = 4.0 - (elapsed * 0.3).sin() * 10.0;
            (Point3::ground(x, 8.0), if x < 0.0 { 0.0 } else { PI })
        }
        _ => {
            let z = 2.0 - (elapsed * 0.45).sin() * 8.0;
            (Point3::ground(-8.0, z), if z < 0.0 { FRAC_PI_2 } else { 3.0 * FRAC_PI_2 })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polluted_city_counts() {
        let city = CityLayout::polluted_city();
        assert_eq!(city.of_kind(ElementKind::Building).count(), 25);
        assert_eq!(city.of_kind(ElementKind::Factory).count(), 4);
        assert_eq!(city.of_kind(ElementKind::Road).count(), 33);
        assert_eq!(city.of_kind(ElementKind::Car).count(), 8);
        let lit = city.of_kind(ElementKind::Building).filter(|b| b.has_lights).count();
        assert_eq!(lit, 5);
    }

    #[test]
    fn ids_are_unique() {
        let city = CityLayout::polluted_city();
        let mut ids: Vec<_> = city.elements().iter().map(|e| e.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), city.elements().len());
    }

    #[test]
    fn find_near_uses_radius() {
        let city = CityLayout::polluted_city();
        let hit = city.find_near(ElementKind::Factory, Point3::ground(0.9, -1.0), 1.5);
        assert_eq!(hit.map(|e| e.id.as_str()), Some("factory-1"));
        assert!(city.find_near(ElementKind::Factory, Point3::ground(0.0, 8.0), 1.5).is_none());
    }

    #[test]
    fn roof_height_follows_scale() {
        let city = CityLayout::polluted_city();
        let b = city.get("building-2").unwrap();
        assert_eq!(b.roof_height(), 4.0);
    }

    #[test]
    fn cars_stay_on_their_ring_road() {
        assert_eq!(car_pose(0, 0.0), (Point3::ground(-6.0, -8.0), 0.0));
        for step in 0..200 {
            let t = step as f32 * 0.37;
            assert_eq!(car_pose(0, t).0.z, -8.0);
            assert_eq!(car_pose(1, t).0.x, 8.0);
            assert_eq!(car_pose(2, t).0.z, 8.0);
            assert_eq!(car_pose(3, t).0.x, -8.0);
            assert_eq!(car_pose(5, t), car_pose(1, t));
            let (p, _) = car_pose(0, t);
            assert!((-18.0..=6.0).contains(&p.x));
        }
    }
}
