pub mod api;
pub mod city;
pub mod config;
pub mod coords;
pub mod hud;
pub mod item;
pub mod placement;
pub mod portal;
pub mod session;

// Re-exports for convenience in tests and integration users.
pub use api::{ApiClient, ApiError, Idea, NewUser, TokenStore, Transport, User};
pub use city::{CityLayout, ElementKind, StaticCityElement, car_pose};
pub use config::{ApiConfig, AppConfig, ConfigError, GameConfig};
pub use coords::{GridBounds, GridCell, Point3};
pub use hud::{TimerBand, format_hud, format_time, tool_buttons};
pub use item::{ItemKind, PlacedItem};
pub use placement::{PlacementError, PlacementResolver, PlacementTarget};
pub use portal::{Flow, Notice, NoticeKind, Portal, PortalCommand, PortalView, PortalWorker, Route};
pub use session::{GameOutcome, GamePhase, GameSession};
