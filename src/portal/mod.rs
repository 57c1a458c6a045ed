//! Screen-level flows of the GreenCity site: home (people and ideas), login,
//! registration and the admin dashboard. Each flow talks to the API and
//! yields a `Flow` telling the front end what to show and where to go.

pub mod worker;

use crate::api::{ApiClient, ApiError, Idea, NewUser, TokenStore, Transport, User};

pub use worker::{PortalCommand, PortalView, PortalWorker};

pub const UNREACHABLE_MESSAGE: &str = "Cannot reach the server.";
pub const BAD_CREDENTIALS_MESSAGE: &str = "Incorrect email or password.";
pub const LOGIN_OK_MESSAGE: &str = "Logged in! Redirecting...";
pub const REGISTER_OK_MESSAGE: &str = "Registration successful! Redirecting...";
pub const REGISTER_FAILED_MESSAGE: &str = "Registration failed.";
pub const LOGIN_REQUIRED_MESSAGE: &str = "You must be logged in to submit an idea.";
pub const EMPTY_IDEA_MESSAGE: &str = "Your idea is empty.";
pub const USER_DELETED_MESSAGE: &str = "User and their ideas deleted.";
pub const IDEA_DELETED_MESSAGE: &str = "Idea deleted.";
pub const DELETE_CONFIRM_PROMPT: &str =
    "Delete this user and all their ideas? This cannot be undone.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Game,
    Login,
    Register,
    Dashboard,
}

impl Route {
    pub const ALL: [Route; 5] = [Route::Home, Route::Game, Route::Login, Route::Register, Route::Dashboard];

    pub fn path(self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::Game => "/jeu",
            Route::Login => "/login",
            Route::Register => "/register",
            Route::Dashboard => "/dashboard",
        }
    }

    pub fn from_path(path: &str) -> Option<Route> {
        let trimmed = path.trim_end_matches('/');
        let normalized = if trimmed.is_empty() { "/" } else { trimmed };
        Route::ALL.into_iter().find(|r| r.path() == normalized)
    }

    pub fn title(self) -> &'static str {
        match self {
            Route::Home => "Home",
            Route::Game => "Game",
            Route::Login => "Log in",
            Route::Register => "Sign up",
            Route::Dashboard => "Dashboard",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    pub fn success(text: impl Into<String>) -> Self {
        Self { kind: NoticeKind::Success, text: text.into() }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self { kind: NoticeKind::Error, text: text.into() }
    }
}

/// What a flow asks the front end to do next.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Flow {
    pub notice: Option<Notice>,
    pub redirect: Option<Route>,
}

impl Flow {
    fn notice(notice: Notice) -> Self {
        Self { notice: Some(notice), redirect: None }
    }

    fn redirect(route: Route) -> Self {
        Self { notice: None, redirect: Some(route) }
    }

    fn then(mut self, route: Route) -> Self {
        self.redirect = Some(route);
        self
    }
}

pub struct Portal<T: Transport, S: TokenStore> {
    client: ApiClient<T>,
    store: S,
    token: Option<String>,
    current_user: Option<User>,
    people: Vec<User>,
    ideas: Vec<Idea>,
}

impl<T: Transport, S: TokenStore> Portal<T, S> {
    pub fn new(client: ApiClient<T>, store: S) -> Self {
        let token = store.load();
        Self {
            client,
            store,
            token,
            current_user: None,
            people: Vec::new(),
            ideas: Vec::new(),
        }
    }

    pub fn client(&self) -> &ApiClient<T> {
        &self.client
    }
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
    pub fn current_user(&self) -> Option<&User> {
        self.current_user.as_ref()
    }
    pub fn people(&self) -> &[User] {
        &self.people
    }
    pub fn ideas(&self) -> &[Idea] {
        &self.ideas
    }

    /// Resolves the stored token into a user. A rejected token is dropped;
    /// a network failure keeps it for the next attempt.
    pub fn restore_session(&mut self) -> Option<&User> {
        let token = self.token.clone()?;
        match self.client.current_user(&token) {
            Ok(user) => self.current_user = Some(user),
            Err(e) if e.is_network() => tracing::warn!(error = %e, "could not verify stored session"),
            Err(e) => {
                tracing::info!(error = %e, "stored session rejected");
                self.forget_token();
            }
        }
        self.current_user.as_ref()
    }

    /// Loads the people and idea lists shown on the home screen. Failures
    /// leave the previous lists in place.
    pub fn load_home(&mut self) {
        match self.client.list_users(None) {
            Ok(people) => self.people = people,
            Err(e) => tracing::warn!(error = %e, "failed to load people"),
        }
        match self.client.list_ideas() {
            Ok(ideas) => self.ideas = ideas,
            Err(e) => tracing::warn!(error = %e, "failed to load ideas"),
        }
    }

    pub fn login(&mut self, email: &str, password: &str) -> Flow {
        match self.client.login(email.trim(), password) {
            Ok(token) => {
                if let Err(e) = self.store.save(&token.access_token) {
                    tracing::warn!(error = %e, "failed to persist session token");
                }
                self.token = Some(token.access_token);
                self.restore_session();
                tracing::info!(email = email.trim(), "logged in");
                Flow::notice(Notice::success(LOGIN_OK_MESSAGE)).then(Route::Home)
            }
            Err(e) if e.is_network() => Flow::notice(Notice::error(UNREACHABLE_MESSAGE)),
            Err(_) => Flow::notice(Notice::error(BAD_CREDENTIALS_MESSAGE)),
        }
    }

    pub fn register(&mut self, email: &str, password: &str, name: Option<&str>) -> Flow {
        let new_user = NewUser {
            email: email.trim().to_string(),
            password: password.to_string(),
            name: name.map(str::trim).filter(|n| !n.is_empty()).map(str::to_string),
        };
        match self.client.register(&new_user) {
            Ok(user) => {
                tracing::info!(id = user.id, "registered");
                Flow::notice(Notice::success(REGISTER_OK_MESSAGE)).then(Route::Login)
            }
            Err(e) if e.is_network() => Flow::notice(Notice::error(UNREACHABLE_MESSAGE)),
            Err(e) => Flow::notice(Notice::error(e.detail().unwrap_or(REGISTER_FAILED_MESSAGE))),
        }
    }

    pub fn logout(&mut self) {
        self.forget_token();
        tracing::info!("logged out");
    }

    /// Posts an idea; on success it is shown first in the list.
    pub fn submit_idea(&mut self, text: &str) -> Flow {
        let Some(token) = self.token.clone() else {
            return Flow::notice(Notice::error(LOGIN_REQUIRED_MESSAGE));
        };
        let text = text.trim();
        if text.is_empty() {
            return Flow::notice(Notice::error(EMPTY_IDEA_MESSAGE));
        }
        match self.client.post_idea(&token, text) {
            Ok(idea) => {
                self.ideas.insert(0, idea);
                Flow::default()
            }
            Err(e) => self.api_failure(e),
        }
    }

    pub fn delete_idea(&mut self, idea_id: i64) -> Flow {
        let Some(token) = self.token.clone() else {
            return Flow::redirect(Route::Login);
        };
        match self.client.delete_idea(&token, idea_id) {
            Ok(()) => {
                self.ideas.retain(|i| i.id != idea_id);
                Flow::notice(Notice::success(IDEA_DELETED_MESSAGE))
            }
            Err(e) => self.api_failure(e),
        }
    }

    /// Entering the dashboard: anonymous or rejected sessions go to login,
    /// non-admins go home, admins get the full user list.
    pub fn open_dashboard(&mut self) -> Flow {
        let Some(token) = self.token.clone() else {
            return Flow::redirect(Route::Login);
        };
        let user = match self.client.current_user(&token) {
            Ok(user) => user,
            Err(e) if e.is_network() => return Flow::notice(Notice::error(UNREACHABLE_MESSAGE)),
            Err(e) => {
                tracing::info!(error = %e, "dashboard auth failed");
                self.forget_token();
                return Flow::redirect(Route::Login);
            }
        };
        let is_admin = user.is_admin;
        self.current_user = Some(user);
        if !is_admin {
            return Flow::redirect(Route::Home);
        }
        match self.client.list_users(Some(&token)) {
            Ok(users) => {
                self.people = users;
                Flow::default()
            }
            Err(e) => self.api_failure(e),
        }
    }

    /// Admin-only. Admin accounts are never offered for deletion; the server
    /// refuses them as well.
    pub fn delete_user(&mut self, user_id: i64) -> Flow {
        let Some(token) = self.token.clone() else {
            return Flow::redirect(Route::Login);
        };
        match self.client.delete_user(&token, user_id) {
            Ok(()) => {
                self.people.retain(|u| u.id != user_id);
                self.ideas.retain(|i| i.user_id != user_id);
                tracing::info!(user_id, "user deleted");
                Flow::notice(Notice::success(USER_DELETED_MESSAGE))
            }
            Err(e) => self.api_failure(e),
        }
    }

    fn api_failure(&mut self, e: ApiError) -> Flow {
        if e.is_network() {
            return Flow::notice(Notice::error(UNREACHABLE_MESSAGE));
        }
        if e.is_auth_failure() {
            self.forget_token();
            return Flow::notice(Notice::error(format!("Error: {e}"))).then(Route::Login);
        }
        let text = e.detail().map(str::to_string).unwrap_or_else(|| e.to_string());
        Flow::notice(Notice::error(format!("Error: {text}")))
    }

    fn forget_token(&mut self) {
        self.token = None;
        self.current_user = None;
        if let Err(e) = self.store.clear() {
            tracing::warn!(error = %e, "failed to clear session token");
        }
    }
}
