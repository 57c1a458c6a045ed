use std::time::Duration;

use bevy::input::mouse::{AccumulatedMouseMotion, AccumulatedMouseScroll};
use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use bevy_egui::{EguiContexts, EguiPlugin, EguiPrimaryContextPass, egui};
use greencity::api::{FileTokenStore, ReqwestTransport};
use greencity::hud::{self, TimerBand};
use greencity::portal::{self, DELETE_CONFIRM_PROMPT};
use greencity::*;
use tracing_subscriber::EnvFilter;

// ---------- Constants ----------
const PIXELS_PER_UNIT: f32 = 20.0;
const TOAST_SECONDS: f32 = 2.5;
const DAY_SKY: Color = Color::srgb(0.55, 0.75, 0.92);
const NIGHT_SKY: Color = Color::srgb(0.04, 0.05, 0.12);

// ---------- Components ----------
#[derive(Component)]
struct SceneLayer; // Marker to despawn/rebuild when the session changes

#[derive(Component)]
struct HoverOverlay;

/// Lane index of a moving car sprite.
#[derive(Component)]
struct CarSprite(usize);

// ---------- Resources ----------
#[derive(Resource)]
struct Game {
	session: GameSession,
}

#[derive(Resource)]
struct Countdown(Timer);

#[derive(Resource)]
struct PortalLink(PortalWorker);

#[derive(Resource)]
struct UiState {
	route: Route,
	login_email: String,
	login_password: String,
	register_email: String,
	register_password: String,
	register_name: String,
	idea_input: String,
	notice: Option<Notice>,
	toast: Option<(String, f32)>, // (message, remaining_seconds)
	pending_delete: Option<i64>,
	view: PortalView,
}

impl Default for UiState {
	fn default() -> Self {
		Self {
			route: Route::Home,
			login_email: String::new(),
			login_password: String::new(),
			register_email: String::new(),
			register_password: String::new(),
			register_name: String::new(),
			idea_input: String::new(),
			notice: None,
			toast: None,
			pending_delete: None,
			view: PortalView::default(),
		}
	}
}

/// Everything a click in the UI can ask for; applied once drawing is done.
#[derive(Debug, Clone, PartialEq)]
enum UiAction {
	Navigate(Route),
	StartGame,
	ResetGame,
	SelectTool(ItemKind),
	ToggleDayNight,
	Portal(PortalCommand),
	AskDeleteUser(i64),
	CancelDelete,
}

// ---------- Entry ----------
fn main() {
	init_tracing();

	let config = match AppConfig::load() {
		Ok(c) => c,
		Err(e) => {
			tracing::error!(error = %e, "failed to load configuration");
			std::process::exit(2);
		}
	};
	let transport = match ReqwestTransport::new(&config.api.base_url, Duration::from_secs(config.api.timeout_secs)) {
		Ok(t) => t,
		Err(e) => {
			tracing::error!(error = %e, "failed to build http client");
			std::process::exit(2);
		}
	};
	let store = FileTokenStore::new(config.api.token_path.clone());
	let mut worker = match PortalWorker::spawn(Portal::new(ApiClient::new(transport), store)) {
		Ok(w) => w,
		Err(e) => {
			tracing::error!(error = %e, "failed to start portal worker");
			std::process::exit(2);
		}
	};
	let session = match GameSession::new(config.game.clone(), CityLayout::polluted_city()) {
		Ok(s) => s,
		Err(e) => {
			tracing::error!(error = %e, "invalid game settings");
			std::process::exit(2);
		}
	};
	worker.send(PortalCommand::Restore);
	worker.send(PortalCommand::LoadHome);
	tracing::info!(api = %config.api.base_url, "starting GreenCity");

	App::new()
		.add_plugins(DefaultPlugins.set(WindowPlugin {
			primary_window: Some(Window {
				title: hud::GAME_TITLE.to_string(),
				resolution: (1280, 800).into(),
				..Default::default()
			}),
			..Default::default()
		}))
		.add_plugins(EguiPlugin::default())
		// Resources
		.insert_resource(ClearColor(DAY_SKY))
		.insert_resource(Game { session })
		.insert_resource(Countdown(Timer::from_seconds(1.0, TimerMode::Repeating)))
		.insert_resource(PortalLink(worker))
		.insert_resource(UiState::default())
		// Setup
		.add_systems(Startup, setup_camera)
		// Frame systems
		.add_systems(
			Update,
			(
				handle_pan_zoom,
				handle_pointer,
				tick_countdown,
				(rebuild_scene_when_changed, drive_cars).chain(),
				pump_portal,
				update_toast_timer,
			),
		)
		.add_systems(EguiPrimaryContextPass, draw_ui)
		.run();
}

fn init_tracing() {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,wgpu=warn"));
	tracing_subscriber::fmt().with_env_filter(filter).with_target(false).compact().init();
}

// ---------- Setup ----------
fn setup_camera(mut commands: Commands) {
	commands.spawn((Camera2d, Transform::from_xyz(0.0, 0.0, 1000.0)));
}

// ---------- Utilities ----------
fn city_to_screen(p: Point3, layer: f32) -> Vec3 {
	Vec3::new(p.x * PIXELS_PER_UNIT, -p.z * PIXELS_PER_UNIT, layer)
}

fn screen_to_city(p: Vec2) -> Point3 {
	Point3::ground(p.x / PIXELS_PER_UNIT, -p.y / PIXELS_PER_UNIT)
}

fn screen_to_world_2d(camera_q: &Query<(&Camera, &GlobalTransform)>, screen_pos: Vec2) -> Option<Vec2> {
	let (camera, camera_transform) = camera_q.single().ok()?;
	camera.viewport_to_world_2d(camera_transform, screen_pos).ok()
}

fn set_toast(ui: &mut UiState, msg: impl Into<String>) {
	ui.toast = Some((msg.into(), TOAST_SECONDS));
}

fn has_modifier(session: &GameSession, kind: ItemKind, target: &str) -> bool {
	session.items().iter().any(|i| i.targets(kind, target))
}

/// Colour and footprint (in city units) of a static element for the
/// current session state.
fn element_look(el: &StaticCityElement, session: &GameSession) -> (Color, Vec2) {
	let night = session.is_night();
	match el.kind {
		ElementKind::Building => {
			let size = Vec2::new(1.8 * el.scale.x, 1.8 * el.scale.z);
			let lit = el.has_lights && night && !has_modifier(session, ItemKind::TurnOffLights, &el.id);
			let color = if lit {
				Color::srgb(0.95, 0.85, 0.35)
			} else if night {
				Color::srgb(0.22, 0.22, 0.3)
			} else {
				Color::srgb(0.62, 0.6, 0.58)
			};
			(color, size)
		}
		ElementKind::Factory => {
			let size = Vec2::new(2.0 * el.scale.x, 2.0 * el.scale.z);
			(Color::srgb(0.45, 0.3, 0.25), size)
		}
		ElementKind::Road => (Color::srgb(0.18, 0.18, 0.2), Vec2::new(2.0, 2.0)),
		ElementKind::Car => {
			// Heading comes from the sprite rotation.
			let size = Vec2::new(0.9, 0.45);
			let color = if night { Color::srgb(1.0, 0.95, 0.6) } else { Color::srgb(0.8, 0.15, 0.15) };
			(color, size)
		}
	}
}

fn item_look(kind: ItemKind) -> Option<(Color, Vec2)> {
	match kind {
		ItemKind::Tree => Some((Color::srgb(0.15, 0.6, 0.2), Vec2::splat(1.3))),
		ItemKind::SolarPanel => Some((Color::srgb(0.15, 0.3, 0.75), Vec2::splat(1.1))),
		// Drawn through the factory/building they modify.
		ItemKind::RemoveChimney | ItemKind::TurnOffLights => None,
	}
}

fn spawn_rect(commands: &mut Commands, color: Color, size_units: Vec2, at: Vec3) -> Entity {
	commands
		.spawn((
			Sprite::from_color(color, size_units * PIXELS_PER_UNIT),
			Transform::from_translation(at),
			Visibility::Visible,
			SceneLayer,
		))
		.id()
}

// ---------- Systems: Scene ----------
fn rebuild_scene_when_changed(
	mut commands: Commands,
	game: Res<Game>,
	mut clear: ResMut<ClearColor>,
	existing: Query<Entity, With<SceneLayer>>,
) {
	if !game.is_changed() {
		return;
	}
	for e in &existing {
		commands.entity(e).despawn();
	}
	let session = &game.session;
	clear.0 = if session.is_night() { NIGHT_SKY } else { DAY_SKY };

	let cell = session.config().cell_size;
	let side = session.config().grid_size as f32 * cell;
	let ground = Color::srgb(0.55, 0.55, 0.55);
	let half = Point3::ground(-cell * 0.5, -cell * 0.5);
	spawn_rect(&mut commands, ground, Vec2::splat(side), city_to_screen(half, 0.0));

	let mut lane = 0;
	for el in session.city().elements() {
		let layer = match el.kind {
			ElementKind::Road => 1.0,
			ElementKind::Building | ElementKind::Factory => 2.0,
			ElementKind::Car => 3.0,
		};
		let (color, size) = element_look(el, session);
		let entity = spawn_rect(&mut commands, color, size, city_to_screen(el.position, layer));
		if el.kind == ElementKind::Car {
			let heading = Quat::from_rotation_z(el.rotation.y);
			let transform = Transform::from_translation(city_to_screen(el.position, layer)).with_rotation(heading);
			commands.entity(entity).insert((CarSprite(lane), transform));
			lane += 1;
		}

		if el.kind == ElementKind::Factory && !has_modifier(session, ItemKind::RemoveChimney, &el.id) {
			let offset = Point3::ground(el.position.x + 0.5 * el.scale.x, el.position.z - 0.5 * el.scale.z);
			let smoke = if session.is_night() { Color::srgb(0.35, 0.3, 0.3) } else { Color::srgb(0.2, 0.2, 0.2) };
			spawn_rect(&mut commands, smoke, Vec2::splat(0.5 * el.scale.x), city_to_screen(offset, 2.5));
		}
	}

	for item in session.items() {
		if let Some((color, size)) = item_look(item.kind) {
			spawn_rect(&mut commands, color, size, city_to_screen(item.position, 4.0));
		}
	}
	tracing::trace!(items = session.items().len(), "scene rebuilt");
}

fn drive_cars(time: Res<Time>, mut cars: Query<(&CarSprite, &mut Transform)>) {
	let elapsed = time.elapsed_secs();
	for (car, mut transform) in &mut cars {
		let (at, heading) = car_pose(car.0, elapsed);
		transform.translation = city_to_screen(at, transform.translation.z);
		transform.rotation = Quat::from_rotation_z(heading);
	}
}

// ---------- Systems: Camera Pan/Zoom ----------
fn handle_pan_zoom(
	motion: Res<AccumulatedMouseMotion>,
	scroll: Res<AccumulatedMouseScroll>,
	mouse_buttons: Res<ButtonInput<MouseButton>>,
	mut q_cam: Query<(&mut Projection, &mut Transform), With<Camera>>,
) {
	let Ok((mut proj, mut cam_transform)) = q_cam.single_mut() else { return };

	if mouse_buttons.pressed(MouseButton::Middle) || mouse_buttons.pressed(MouseButton::Right) {
		let delta = motion.delta;
		if delta.length_squared() > 0.0 {
			// Pan opposite of mouse drag direction (screen to world)
			cam_transform.translation.x -= delta.x;
			cam_transform.translation.y += delta.y;
		}
	}

	if scroll.delta.y != 0.0 {
		let factor = 1.0 - scroll.delta.y * 0.1;
		if let Projection::Orthographic(ortho) = &mut *proj {
			ortho.scale = (ortho.scale * factor).clamp(0.3, 4.0);
		}
	}
}

// ---------- Systems: Placement ----------
fn handle_pointer(
	mut commands: Commands,
	mut egui_ctx: EguiContexts,
	windows: Query<&Window, With<PrimaryWindow>>,
	q_cam: Query<(&Camera, &GlobalTransform)>,
	mouse_buttons: Res<ButtonInput<MouseButton>>,
	keys: Res<ButtonInput<KeyCode>>,
	mut game: ResMut<Game>,
	mut ui: ResMut<UiState>,
	q_overlay: Query<Entity, With<HoverOverlay>>,
) {
	for e in &q_overlay {
		commands.entity(e).despawn();
	}
	if ui.route != Route::Game || game.session.selected().is_none() {
		return;
	}
	if keys.just_pressed(KeyCode::Escape) {
		game.session.clear_tool();
		return;
	}
	if let Ok(ctx) = egui_ctx.ctx_mut() {
		if ctx.is_pointer_over_area() {
			return;
		}
	}

	let Ok(window) = windows.single() else { return };
	let Some(cursor) = window.cursor_position() else { return };
	let Some(world_pos) = screen_to_world_2d(&q_cam, cursor) else { return };
	let point = screen_to_city(world_pos);

	if let Some(target) = game.session.hover(point) {
		let at = city_to_screen(Point3::ground(target.position.x, target.position.z), 20.0);
		commands.spawn((
			Sprite::from_color(Color::srgba(0.3, 1.0, 0.4, 0.35), Vec2::splat(2.0 * PIXELS_PER_UNIT)),
			Transform::from_translation(at),
			HoverOverlay,
		));
	}

	if mouse_buttons.just_pressed(MouseButton::Left) {
		if let Err(e) = game.session.place_at(point) {
			set_toast(&mut ui, e.to_string());
		}
	}
}

// ---------- Systems: Countdown ----------
fn tick_countdown(time: Res<Time>, mut countdown: ResMut<Countdown>, mut game: ResMut<Game>, mut ui: ResMut<UiState>) {
	// Leaving the game screen drops the play-through.
	if ui.route != Route::Game && game.session.is_started() {
		game.session.reset();
	}
	if !game.session.is_active() {
		countdown.0.reset();
		return;
	}
	countdown.0.tick(time.delta());
	for _ in 0..countdown.0.times_finished_this_tick() {
		if let Some(outcome) = game.session.tick() {
			let msg = match outcome {
				GameOutcome::Won => hud::WIN_BANNER,
				GameOutcome::Lost => hud::LOSE_BANNER,
			};
			set_toast(&mut ui, msg);
			break;
		}
	}
}

// ---------- Systems: Portal ----------
fn pump_portal(mut link: ResMut<PortalLink>, mut ui: ResMut<UiState>) {
	while let Some(view) = link.0.try_recv() {
		if let Some(notice) = &view.flow.notice {
			ui.notice = Some(notice.clone());
		}
		if let Some(route) = view.flow.redirect {
			if route == Route::Home {
				link.0.send(PortalCommand::LoadHome);
			}
			if route == Route::Login {
				ui.login_password.clear();
			}
			ui.route = route;
		}
		ui.view = view;
	}
}

// ---------- Systems: Toast ----------
fn update_toast_timer(time: Res<Time>, mut ui: ResMut<UiState>) {
	if let Some((_, ref mut remaining)) = ui.toast {
		*remaining -= time.delta_secs();
		if *remaining <= 0.0 {
			ui.toast = None;
		}
	}
}

// ---------- Systems: UI ----------
fn draw_ui(
	mut egui_ctx: EguiContexts,
	mut ui: ResMut<UiState>,
	mut game: ResMut<Game>,
	mut link: ResMut<PortalLink>,
	mut countdown: ResMut<Countdown>,
) {
	let Ok(ctx) = egui_ctx.ctx_mut() else { return };
	let mut actions = Vec::new();
	let busy = link.0.is_busy();

	egui::TopBottomPanel::top("nav").show(&*ctx, |bar| {
		bar.horizontal(|row| {
			row.heading("GreenCity");
			row.separator();
			for route in [Route::Home, Route::Game] {
				if row.selectable_label(ui.route == route, route.title()).clicked() {
					actions.push(UiAction::Navigate(route));
				}
			}
			let admin = ui.view.current_user.as_ref().is_some_and(|u| u.is_admin);
			if admin && row.selectable_label(ui.route == Route::Dashboard, Route::Dashboard.title()).clicked() {
				actions.push(UiAction::Navigate(Route::Dashboard));
			}
			row.separator();
			match &ui.view.current_user {
				Some(user) => {
					row.label(format!("Hello, {}", user.display_name()));
					if row.button("Log out").clicked() {
						actions.push(UiAction::Portal(PortalCommand::Logout));
					}
				}
				None => {
					if row.button(Route::Login.title()).clicked() {
						actions.push(UiAction::Navigate(Route::Login));
					}
					if row.button(Route::Register.title()).clicked() {
						actions.push(UiAction::Navigate(Route::Register));
					}
				}
			}
			if busy {
				row.spinner();
			}
			if let Some((msg, _)) = &ui.toast {
				row.separator();
				row.colored_label(egui::Color32::YELLOW, msg);
			}
		});
	});

	match ui.route {
		Route::Game => draw_game(&*ctx, &game.session, &mut actions),
		Route::Home => draw_home(&*ctx, &mut ui, &mut actions),
		Route::Login => draw_login(&*ctx, &mut ui, &mut actions),
		Route::Register => draw_register(&*ctx, &mut ui, &mut actions),
		Route::Dashboard => draw_dashboard(&*ctx, &mut ui, &mut actions),
	}

	for action in actions {
		apply_action(action, &mut ui, &mut game, &mut link, &mut countdown);
	}
}

fn notice_label(ui: &mut egui::Ui, notice: &Option<Notice>) {
	if let Some(n) = notice {
		let color = match n.kind {
			NoticeKind::Success => egui::Color32::from_rgb(22, 163, 74),
			NoticeKind::Error => egui::Color32::from_rgb(220, 38, 38),
		};
		ui.colored_label(color, &n.text);
	}
}

fn draw_game(ctx: &egui::Context, session: &GameSession, actions: &mut Vec<UiAction>) {
	egui::TopBottomPanel::top("game_hud").show(ctx, |panel| {
		panel.horizontal(|row| {
			let (score, target) = (session.score(), session.target_score());
			row.label(format!("Green score {score}/{target}"));
			row.add(
				egui::ProgressBar::new(hud::progress_fraction(score, target))
					.desired_width(220.0)
					.fill(egui::Color32::from_rgb(34, 197, 94)),
			);
			row.separator();
			let time_color = match TimerBand::for_seconds(session.time_left()) {
				TimerBand::Plenty => egui::Color32::from_rgb(34, 197, 94),
				TimerBand::Hurry => egui::Color32::from_rgb(234, 179, 8),
				TimerBand::Critical => egui::Color32::from_rgb(239, 68, 68),
			};
			row.colored_label(time_color, hud::format_time(session.time_left()));
			row.separator();
			row.add_enabled_ui(session.is_active(), |r| {
				if r.button(hud::day_night_label(session.is_night())).clicked() {
					actions.push(UiAction::ToggleDayNight);
				}
			});
			if let Some(banner) = hud::end_banner(session.phase()) {
				row.separator();
				let color = if session.is_won() { egui::Color32::GREEN } else { egui::Color32::RED };
				row.colored_label(color, egui::RichText::new(banner).strong());
			}
		});
	});

	egui::TopBottomPanel::bottom("build_controls").show(ctx, |panel| match session.phase() {
		GamePhase::NotStarted => {
			panel.vertical_centered(|col| {
				col.heading(hud::GAME_TITLE);
				col.label(hud::INTRO_TEXT);
				if col.button(hud::START_LABEL).clicked() {
					actions.push(UiAction::StartGame);
				}
			});
		}
		GamePhase::Won | GamePhase::Lost => {
			panel.vertical_centered(|col| {
				if col.button(hud::REPLAY_LABEL).clicked() {
					actions.push(UiAction::ResetGame);
				}
			});
		}
		GamePhase::Running => {
			panel.label(hud::TOOL_HINT);
			panel.horizontal(|row| {
				for button in hud::tool_buttons(session) {
					row.add_enabled_ui(button.enabled, |r| {
						let text = format!("{}\n{}", button.label, button.bonus);
						if r.selectable_label(button.selected, text).clicked() {
							actions.push(UiAction::SelectTool(button.kind));
						}
					});
				}
			});
		}
	});
}

fn draw_home(ctx: &egui::Context, ui: &mut UiState, actions: &mut Vec<UiAction>) {
	egui::CentralPanel::default().show(ctx, |panel| {
		panel.heading("Build a greener city together");
		if panel.button("Play the game").clicked() {
			actions.push(UiAction::Navigate(Route::Game));
		}
		panel.separator();

		panel.heading("Share an idea");
		panel.horizontal(|row| {
			row.add(egui::TextEdit::singleline(&mut ui.idea_input).hint_text("Your idea for a greener city"));
			if row.button("Submit").clicked() {
				actions.push(UiAction::Portal(PortalCommand::SubmitIdea(ui.idea_input.clone())));
			}
		});
		notice_label(panel, &ui.notice);
		panel.separator();

		panel.columns(2, |cols| {
			cols[0].heading("Ideas");
			egui::ScrollArea::vertical().id_salt("ideas").show(&mut cols[0], |list| {
				let me = ui.view.current_user.as_ref();
				for idea in &ui.view.ideas {
					list.horizontal(|row| {
						row.label(format!("{} - {}", idea.idea, idea.user.display_name()));
						let can_delete = me.is_some_and(|u| u.is_admin || u.id == idea.user_id);
						if can_delete && row.small_button("Delete").clicked() {
							actions.push(UiAction::Portal(PortalCommand::DeleteIdea(idea.id)));
						}
					});
				}
			});
			cols[1].heading("People");
			egui::ScrollArea::vertical().id_salt("people").show(&mut cols[1], |list| {
				for person in &ui.view.people {
					list.label(person.display_name());
				}
			});
		});
	});
}

fn draw_login(ctx: &egui::Context, ui: &mut UiState, actions: &mut Vec<UiAction>) {
	egui::CentralPanel::default().show(ctx, |panel| {
		panel.heading(Route::Login.title());
		panel.add(egui::TextEdit::singleline(&mut ui.login_email).hint_text("Email"));
		panel.add(egui::TextEdit::singleline(&mut ui.login_password).password(true).hint_text("Password"));
		let ready = !ui.login_email.trim().is_empty() && !ui.login_password.is_empty();
		if panel.add_enabled(ready, egui::Button::new("Log in")).clicked() {
			actions.push(UiAction::Portal(PortalCommand::Login {
				email: ui.login_email.clone(),
				password: ui.login_password.clone(),
			}));
		}
		notice_label(panel, &ui.notice);
	});
}

fn draw_register(ctx: &egui::Context, ui: &mut UiState, actions: &mut Vec<UiAction>) {
	egui::CentralPanel::default().show(ctx, |panel| {
		panel.heading(Route::Register.title());
		panel.add(egui::TextEdit::singleline(&mut ui.register_email).hint_text("Email"));
		panel.add(egui::TextEdit::singleline(&mut ui.register_name).hint_text("Name (optional)"));
		panel.add(egui::TextEdit::singleline(&mut ui.register_password).password(true).hint_text("Password"));
		let ready = !ui.register_email.trim().is_empty() && !ui.register_password.is_empty();
		if panel.add_enabled(ready, egui::Button::new("Sign up")).clicked() {
			let name = Some(ui.register_name.clone()).filter(|n| !n.trim().is_empty());
			actions.push(UiAction::Portal(PortalCommand::Register {
				email: ui.register_email.clone(),
				password: ui.register_password.clone(),
				name,
			}));
		}
		notice_label(panel, &ui.notice);
	});
}

fn draw_dashboard(ctx: &egui::Context, ui: &mut UiState, actions: &mut Vec<UiAction>) {
	egui::CentralPanel::default().show(ctx, |panel| {
		panel.heading("Admin dashboard");
		notice_label(panel, &ui.notice);
		egui::Grid::new("users").striped(true).num_columns(5).show(panel, |grid| {
			for header in ["ID", "Email", "Name", "Role", "Actions"] {
				grid.strong(header);
			}
			grid.end_row();
			for user in &ui.view.people {
				grid.label(user.id.to_string());
				grid.label(&user.email);
				grid.label(user.name.as_deref().unwrap_or("N/A"));
				grid.label(user.role_label());
				if !user.is_admin && grid.button("Delete user").clicked() {
					actions.push(UiAction::AskDeleteUser(user.id));
				} else if user.is_admin {
					grid.label("");
				}
				grid.end_row();
			}
		});
	});

	if let Some(user_id) = ui.pending_delete {
		egui::Window::new("Confirm").collapsible(false).resizable(false).show(ctx, |win| {
			win.label(DELETE_CONFIRM_PROMPT);
			win.horizontal(|row| {
				if row.button("Delete").clicked() {
					actions.push(UiAction::Portal(PortalCommand::DeleteUser(user_id)));
				}
				if row.button("Cancel").clicked() {
					actions.push(UiAction::CancelDelete);
				}
			});
		});
	}
}

fn apply_action(action: UiAction, ui: &mut UiState, game: &mut Game, link: &mut PortalLink, countdown: &mut Countdown) {
	match action {
		UiAction::Navigate(route) => {
			ui.notice = None;
			match route {
				Route::Home => {
					link.0.send(PortalCommand::LoadHome);
				}
				Route::Dashboard => {
					link.0.send(PortalCommand::OpenDashboard);
				}
				Route::Game | Route::Login | Route::Register => {}
			}
			ui.route = route;
		}
		UiAction::StartGame => {
			game.session.start();
			countdown.0.reset();
		}
		UiAction::ResetGame => {
			game.session.reset();
			countdown.0.reset();
		}
		UiAction::SelectTool(kind) => {
			if !game.session.select_tool(kind) {
				set_toast(ui, format!("{} is not available now", kind.label()));
			}
		}
		UiAction::ToggleDayNight => {
			game.session.toggle_day_night();
		}
		UiAction::Portal(cmd) => {
			ui.notice = None;
			if matches!(cmd, PortalCommand::SubmitIdea(_)) {
				ui.idea_input.clear();
			}
			if matches!(cmd, PortalCommand::DeleteUser(_)) {
				ui.pending_delete = None;
			}
			if !link.0.send(cmd) {
				ui.notice = Some(Notice::error(portal::UNREACHABLE_MESSAGE));
			}
		}
		UiAction::AskDeleteUser(id) => ui.pending_delete = Some(id),
		UiAction::CancelDelete => ui.pending_delete = None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use bevy::prelude::{MinimalPlugins, TransformPlugin};

	fn app_with_session(session: GameSession) -> App {
		let mut app = App::new();
		app.add_plugins((MinimalPlugins, TransformPlugin));
		app.insert_resource(ClearColor(DAY_SKY));
		app.insert_resource(Game { session });
		app.add_systems(Update, rebuild_scene_when_changed);
		app
	}

	fn scene_count(world: &mut bevy::prelude::World) -> usize {
		world.query_filtered::<Entity, With<SceneLayer>>().iter(world).count()
	}

	#[test]
	fn scene_contains_city_and_trees() {
		let mut session = GameSession::with_seed(GameConfig::default(), CityLayout::polluted_city(), 5).unwrap();
		session.start();
		session.select_tool(ItemKind::Tree);
		session.place_at(Point3::ground(0.0, 6.0)).unwrap();
		let elements = session.city().elements().len();
		let factories = session.city().of_kind(ElementKind::Factory).count();

		let mut app = app_with_session(session);
		app.update();
		// ground + every element + one chimney per factory + the tree
		assert_eq!(scene_count(app.world_mut()), 1 + elements + factories + 1);
	}

	#[test]
	fn removed_chimney_is_not_drawn() {
		let mut session = GameSession::with_seed(GameConfig::default(), CityLayout::polluted_city(), 5).unwrap();
		session.start();
		session.select_tool(ItemKind::RemoveChimney);
		session.place_at(Point3::ground(0.0, 0.0)).unwrap();
		let elements = session.city().elements().len();
		let factories = session.city().of_kind(ElementKind::Factory).count();

		let mut app = app_with_session(session);
		app.update();
		assert_eq!(scene_count(app.world_mut()), 1 + elements + factories - 1);
	}

	#[test]
	fn night_switches_sky() {
		let mut session = GameSession::with_seed(GameConfig::default(), CityLayout::polluted_city(), 5).unwrap();
		session.start();
		session.toggle_day_night();
		let mut app = app_with_session(session);
		app.update();
		assert_eq!(app.world().resource::<ClearColor>().0, NIGHT_SKY);
	}

	#[test]
	fn cars_follow_their_lanes() {
		let session = GameSession::with_seed(GameConfig::default(), CityLayout::polluted_city(), 5).unwrap();
		let mut app = App::new();
		app.insert_resource(Time::<()>::default());
		app.insert_resource(ClearColor(DAY_SKY));
		app.insert_resource(Game { session });
		app.add_systems(Update, (rebuild_scene_when_changed, drive_cars).chain());
		app.update();
		app.world_mut().resource_mut::<Time>().advance_by(Duration::from_secs(3));
		app.update();

		let world = app.world_mut();
		let mut cars: Vec<(usize, Vec3)> =
			world.query::<(&CarSprite, &Transform)>().iter(world).map(|(c, t)| (c.0, t.translation)).collect();
		cars.sort_by_key(|c| c.0);
		assert_eq!(cars.len(), 8);
		for (lane, at) in cars {
			let (expected, _) = car_pose(lane, 3.0);
			assert_eq!(at, city_to_screen(expected, 3.0));
		}
	}

	fn countdown_app(route: Route) -> App {
		let mut session = GameSession::with_seed(GameConfig::default(), CityLayout::polluted_city(), 5).unwrap();
		session.start();
		let mut app = App::new();
		app.insert_resource(Time::<()>::default());
		app.insert_resource(Game { session });
		app.insert_resource(Countdown(Timer::from_seconds(1.0, TimerMode::Repeating)));
		app.insert_resource(UiState { route, ..Default::default() });
		app.add_systems(Update, tick_countdown);
		app
	}

	fn advance(app: &mut App, millis: u64) {
		app.world_mut().resource_mut::<Time>().advance_by(Duration::from_millis(millis));
		app.update();
	}

	fn time_left(app: &App) -> u32 {
		app.world().resource::<Game>().session.time_left()
	}

	#[test]
	fn countdown_ticks_once_per_second() {
		let mut app = countdown_app(Route::Game);
		advance(&mut app, 600);
		assert_eq!(time_left(&app), 120);
		advance(&mut app, 600);
		assert_eq!(time_left(&app), 119);
		advance(&mut app, 2_000);
		assert_eq!(time_left(&app), 117);
	}

	#[test]
	fn countdown_stops_when_game_ends() {
		let mut app = countdown_app(Route::Game);
		app.world_mut().resource_mut::<Game>().session = {
			let config = GameConfig { duration_secs: 2, ..GameConfig::default() };
			let mut s = GameSession::with_seed(config, CityLayout::polluted_city(), 5).unwrap();
			s.start();
			s
		};
		advance(&mut app, 1_000);
		advance(&mut app, 1_000);
		assert_eq!(app.world().resource::<Game>().session.phase(), GamePhase::Lost);
		assert_eq!(app.world().resource::<UiState>().toast.as_ref().map(|t| t.0.as_str()), Some(hud::LOSE_BANNER));
		advance(&mut app, 3_000);
		assert_eq!(time_left(&app), 0);
		assert_eq!(app.world().resource::<Countdown>().0.elapsed(), Duration::ZERO);
	}

	#[test]
	fn leaving_game_screen_drops_the_session() {
		let mut app = countdown_app(Route::Game);
		advance(&mut app, 1_000);
		assert_eq!(time_left(&app), 119);

		app.world_mut().resource_mut::<UiState>().route = Route::Home;
		advance(&mut app, 5_000);
		let session = &app.world().resource::<Game>().session;
		assert_eq!(session.phase(), GamePhase::NotStarted);
		assert_eq!(session.time_left(), 120);
	}

	#[test]
	fn screen_mapping_round_trips() {
		let p = Point3::ground(3.0, -4.0);
		let s = city_to_screen(p, 0.0);
		assert_eq!(screen_to_city(s.truncate()), p);
	}
}
