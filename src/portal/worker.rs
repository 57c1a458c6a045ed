use std::thread;

use crossbeam_channel::{Receiver, Sender, unbounded};

use crate::api::{Idea, TokenStore, Transport, User};
use crate::portal::{Flow, Portal};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortalCommand {
	Restore,
	LoadHome,
	Login { email: String, password: String },
	Register { email: String, password: String, name: Option<String> },
	Logout,
	SubmitIdea(String),
	DeleteIdea(i64),
	OpenDashboard,
	DeleteUser(i64),
}

/// Snapshot sent back after each command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortalView {
	pub current_user: Option<User>,
	pub logged_in: bool,
	pub people: Vec<User>,
	pub ideas: Vec<Idea>,
	pub flow: Flow,
}

/// Runs a `Portal` on its own thread so blocking HTTP never stalls the
/// frame loop. Commands are handled in order; dropping the worker stops the
/// thread after the request in flight.
pub struct PortalWorker {
	commands: Sender<PortalCommand>,
	views: Receiver<PortalView>,
	in_flight: usize,
}

impl PortalWorker {
	pub fn spawn<T, S>(mut portal: Portal<T, S>) -> std::io::Result<Self>
	where
		T: Transport + 'static,
		S: TokenStore + 'static,
	{
		let (cmd_tx, cmd_rx) = unbounded::<PortalCommand>();
		let (view_tx, view_rx) = unbounded::<PortalView>();
		thread::Builder::new().name("portal".to_string()).spawn(move || {
			while let Ok(cmd) = cmd_rx.recv() {
				let flow = run_command(&mut portal, cmd);
				let view = PortalView {
					current_user: portal.current_user().cloned(),
					logged_in: portal.token().is_some(),
					people: portal.people().to_vec(),
					ideas: portal.ideas().to_vec(),
					flow,
				};
				if view_tx.send(view).is_err() {
					break;
				}
			}
		})?;
		Ok(Self { commands: cmd_tx, views: view_rx, in_flight: 0 })
	}

	pub fn send(&mut self, cmd: PortalCommand) -> bool {
		let ok = self.commands.send(cmd).is_ok();
		if ok {
			self.in_flight += 1;
		}
		ok
	}

	pub fn is_busy(&self) -> bool {
		self.in_flight > 0
	}

	/// Next finished command, if any.
	pub fn try_recv(&mut self) -> Option<PortalView> {
		let view = self.views.try_recv().ok()?;
		self.in_flight = self.in_flight.saturating_sub(1);
		Some(view)
	}

	/// Blocks until the next command finishes.
	pub fn recv(&mut self) -> Option<PortalView> {
		let view = self.views.recv().ok()?;
		self.in_flight = self.in_flight.saturating_sub(1);
		Some(view)
	}
}

fn run_command<T: Transport, S: TokenStore>(portal: &mut Portal<T, S>, cmd: PortalCommand) -> Flow {
	match cmd {
		PortalCommand::Restore => {
			portal.restore_session();
			Flow::default()
		}
		PortalCommand::LoadHome => {
			portal.load_home();
			Flow::default()
		}
		PortalCommand::Login { email, password } => portal.login(&email, &password),
		PortalCommand::Register { email, password, name } => portal.register(&email, &password, name.as_deref()),
		PortalCommand::Logout => {
			portal.logout();
			Flow::default()
		}
		PortalCommand::SubmitIdea(text) => portal.submit_idea(&text),
		PortalCommand::DeleteIdea(id) => portal.delete_idea(id),
		PortalCommand::OpenDashboard => portal.open_dashboard(),
		PortalCommand::DeleteUser(id) => portal.delete_user(id),
	}
}
