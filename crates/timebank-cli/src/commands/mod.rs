pub mod balance;
pub mod config;
pub mod countdown;

use std::error::Error;

use timebank_core::{now_ms, BankSession, Config, Database, Event};

use crate::terminal::{RenderMode, TerminalBell, TerminalRenderer};

/// Everything a command needs: the persisted bank plus its collaborators.
pub(crate) struct Context {
    pub session: BankSession<Database>,
    pub config: Config,
    pub json: bool,
    pub renderer: TerminalRenderer,
    pub bell: TerminalBell,
}

impl Context {
    pub fn open(json: bool) -> Result<Self, Box<dyn Error>> {
        Self::open_with(json, RenderMode::Full)
    }

    pub fn open_with(json: bool, mode: RenderMode) -> Result<Self, Box<dyn Error>> {
        let config = Config::load()?;
        let db = Database::open()?;
        let session = BankSession::open(db, config.policy(), now_ms())?;
        let mode = if json { RenderMode::Quiet } else { mode };
        let bell = TerminalBell::new(config.alarm.enabled, config.alarm.bell_interval_ms);
        Ok(Self {
            session,
            config,
            json,
            renderer: TerminalRenderer::new(mode),
            bell,
        })
    }

    /// Print or render one event and drive the alarm for it.
    pub fn emit(&mut self, event: &Event) -> Result<(), Box<dyn Error>> {
        if self.json {
            println!("{}", serde_json::to_string(event)?);
        }
        self.session
            .dispatch(event, &mut self.renderer, &mut self.bell);
        Ok(())
    }

    /// Report a command that had nothing to do.
    pub fn noop(&self, message: &str) {
        if self.json {
            println!("{}", serde_json::json!({ "type": "NoOp", "message": message }));
        } else {
            println!("{message}");
        }
    }
}
