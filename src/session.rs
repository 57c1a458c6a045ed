use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::city::CityLayout;
use crate::config::{ConfigError, GameConfig};
use crate::coords::Point3;
use crate::item::{ItemKind, PlacedItem};
use crate::placement::{PlacementError, PlacementResolver, PlacementTarget};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    NotStarted,
    Running,
    Won,
    Lost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOutcome {
    Won,
    Lost,
}

/// State of one play-through: score, countdown, placed items and the tool
/// currently armed. Every transition into `over` goes through `settle`.
#[derive(Debug, Clone)]
pub struct GameSession {
    config: GameConfig,
    city: CityLayout,
    score: u32,
    time_left: u32,
    started: bool,
    over: bool,
    won: bool,
    night: bool,
    selected: Option<ItemKind>,
    items: Vec<PlacedItem>,
    next_seq: u64,
    rng: StdRng,
}

impl GameSession {
    pub fn new(config: GameConfig, city: CityLayout) -> Result<Self, ConfigError> {
        Self::with_rng(config, city, StdRng::from_entropy())
    }

    /// Deterministic item ids, for tests and replays.
    pub fn with_seed(config: GameConfig, city: CityLayout, seed: u64) -> Result<Self, ConfigError> {
        Self::with_rng(config, city, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: GameConfig, city: CityLayout, rng: StdRng) -> Result<Self, ConfigError> {
        config.validate()?;
        let time_left = config.duration_secs;
        Ok(Self {
            config,
            city,
            score: 0,
            time_left,
            started: false,
            over: false,
            won: false,
            night: false,
            selected: None,
            items: Vec::new(),
            next_seq: 0,
            rng,
        })
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }
    pub fn city(&self) -> &CityLayout {
        &self.city
    }
    pub fn score(&self) -> u32 {
        self.score
    }
    pub fn target_score(&self) -> u32 {
        self.config.target_score
    }
    pub fn time_left(&self) -> u32 {
        self.time_left
    }
    pub fn is_started(&self) -> bool {
        self.started
    }
    pub fn is_over(&self) -> bool {
        self.over
    }
    pub fn is_won(&self) -> bool {
        self.won
    }
    pub fn is_night(&self) -> bool {
        self.night
    }
    pub fn selected(&self) -> Option<ItemKind> {
        self.selected
    }
    pub fn items(&self) -> &[PlacedItem] {
        &self.items
    }

    pub fn is_active(&self) -> bool {
        self.started && !self.over
    }

    pub fn phase(&self) -> GamePhase {
        match (self.started, self.over, self.won) {
            (false, _, _) => GamePhase::NotStarted,
            (true, false, _) => GamePhase::Running,
            (true, true, true) => GamePhase::Won,
            (true, true, false) => GamePhase::Lost,
        }
    }

    pub fn resolver(&self) -> PlacementResolver<'_> {
        PlacementResolver::new(&self.city, &self.config)
    }

    pub fn start(&mut self) {
        self.started = true;
        self.over = false;
        self.won = false;
        self.score = 0;
        self.time_left = self.config.duration_secs;
        self.items.clear();
        self.selected = None;
        tracing::info!(duration = self.time_left, target = self.config.target_score, "game started");
    }

    pub fn reset(&mut self) {
        self.started = false;
        self.over = false;
        self.won = false;
        self.score = 0;
        self.time_left = self.config.duration_secs;
        self.items.clear();
        self.selected = None;
        self.night = false;
        tracing::info!("game reset");
    }

    /// Arms a tool. Returns false when the game is not running or the tool is
    /// unavailable (lights can only be armed at night).
    pub fn select_tool(&mut self, kind: ItemKind) -> bool {
        if !self.is_active() {
            return false;
        }
        if kind == ItemKind::TurnOffLights && !self.night {
            return false;
        }
        self.selected = Some(kind);
        true
    }

    pub fn clear_tool(&mut self) {
        self.selected = None;
    }

    /// Flips day/night while the game is running. Returns the new night flag.
    pub fn toggle_day_night(&mut self) -> bool {
        if !self.is_active() {
            return self.night;
        }
        self.night = !self.night;
        if !self.night && self.selected == Some(ItemKind::TurnOffLights) {
            self.selected = None;
        }
        tracing::debug!(night = self.night, "day/night toggled");
        self.night
    }

    /// Hover preview for the armed tool at `point`.
    pub fn hover(&self, point: Point3) -> Option<PlacementTarget> {
        let tool = self.selected?;
        if !self.is_active() {
            return None;
        }
        self.resolver().hover(tool, point, &self.items, self.night)
    }

    /// Resolves `point` with the armed tool and records the placement.
    pub fn place_at(&mut self, point: Point3) -> Result<&PlacedItem, PlacementError> {
        let tool = self.selected.ok_or(PlacementError::NoToolSelected)?;
        if !self.is_active() {
            return Err(PlacementError::GameInactive);
        }
        let target = self.resolver().resolve(tool, point, &self.items, self.night);
        match target {
            Ok(target) => self.record(tool, target),
            Err(e) => {
                tracing::debug!(tool = tool.slug(), error = %e, "placement rejected");
                Err(e)
            }
        }
    }

    /// Records a placement resolved earlier for the armed tool. The target is
    /// confirmed against the current items first.
    pub fn place_item(&mut self, target: PlacementTarget) -> Result<&PlacedItem, PlacementError> {
        let tool = self.selected.ok_or(PlacementError::NoToolSelected)?;
        if !self.is_active() {
            return Err(PlacementError::GameInactive);
        }
        let target = self.resolver().confirm(tool, &target, &self.items, self.night)?;
        self.record(tool, target)
    }

    fn record(&mut self, tool: ItemKind, target: PlacementTarget) -> Result<&PlacedItem, PlacementError> {
        let id = self.next_item_id(tool);
        let item = PlacedItem {
            id,
            kind: tool,
            position: target.position,
            rotation: target.rotation,
            target_id: target.target_id,
        };
        tracing::debug!(id = %item.id, target = ?item.target_id, "item placed");
        self.items.push(item);
        self.score = self.score.saturating_add(tool.score()).min(self.config.target_score);
        self.selected = None;
        self.settle();
        let idx = self.items.len() - 1;
        Ok(&self.items[idx])
    }

    /// One second of countdown. Returns the outcome when this tick ends the
    /// game.
    pub fn tick(&mut self) -> Option<GameOutcome> {
        if !self.is_active() {
            return None;
        }
        self.time_left = self.time_left.saturating_sub(1);
        self.settle()
    }

    fn settle(&mut self) -> Option<GameOutcome> {
        if !self.is_active() {
            return None;
        }
        let outcome = if self.score >= self.config.target_score {
            GameOutcome::Won
        } else if self.time_left == 0 {
            GameOutcome::Lost
        } else {
            return None;
        };
        self.over = true;
        self.won = outcome == GameOutcome::Won;
        self.selected = None;
        tracing::info!(score = self.score, time_left = self.time_left, ?outcome, "game over");
        Some(outcome)
    }

    fn next_item_id(&mut self, kind: ItemKind) -> String {
        self.next_seq += 1;
        let suffix: String = (0..9)
            .map(|_| std::char::from_digit(self.rng.gen_range(0..36), 36).unwrap_or('0'))
            .collect();
        format!("{}-{}-{}", kind.slug(), self.next_seq, suffix)
    }
}
