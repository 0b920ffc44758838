use std::error::Error;

use clap::Args;
use timebank_core::{now_ms, BankError, DurationInput, TimeUnit};

use super::Context;

#[derive(Args)]
pub struct AmountArgs {
    /// Hours (blank or a non-negative integer)
    #[arg(long, conflicts_with = "amount")]
    hours: Option<String>,
    /// Minutes; 60 or more roll over into hours
    #[arg(long, conflicts_with = "amount")]
    minutes: Option<String>,
    /// Raw amount in balance units (seconds or minutes, see `config get unit`)
    #[arg(long, allow_hyphen_values = true)]
    amount: Option<i64>,
}

impl AmountArgs {
    fn units(&self, unit: TimeUnit) -> Result<i64, BankError> {
        if let Some(amount) = self.amount {
            return Ok(amount);
        }
        let input = DurationInput::parse(
            self.hours.as_deref().unwrap_or_default(),
            self.minutes.as_deref().unwrap_or_default(),
        )?;
        i64::try_from(input.to_units(unit)).map_err(|_| BankError::invalid_amount(input.total_secs()))
    }
}

pub fn add(args: AmountArgs, json: bool) -> Result<(), Box<dyn Error>> {
    let mut ctx = Context::open(json)?;
    let amount = args.units(ctx.config.unit)?;
    let event = ctx.session.add_time(amount, now_ms())?;
    ctx.emit(&event)
}

pub fn sub(args: AmountArgs, json: bool) -> Result<(), Box<dyn Error>> {
    let mut ctx = Context::open(json)?;
    let amount = args.units(ctx.config.unit)?;
    let event = ctx.session.subtract_time(amount, now_ms())?;
    ctx.emit(&event)
}

pub fn undo(json: bool) -> Result<(), Box<dyn Error>> {
    let mut ctx = Context::open(json)?;
    match ctx.session.undo(now_ms())? {
        Some(event) => ctx.emit(&event),
        None => {
            ctx.noop("nothing to undo");
            Ok(())
        }
    }
}

pub fn status(json: bool) -> Result<(), Box<dyn Error>> {
    let mut ctx = Context::open(json)?;
    let snapshot = ctx.session.engine().snapshot(now_ms());
    ctx.emit(&snapshot)
}

pub fn history(json: bool) -> Result<(), Box<dyn Error>> {
    let ctx = Context::open(json)?;
    let view = ctx.session.view();
    if json {
        println!("{}", serde_json::to_string_pretty(&view.history)?);
        return Ok(());
    }
    if view.history.is_empty() {
        println!("no history");
    }
    for entry in view.history.iter().rev() {
        println!("{}", timebank_core::describe_entry(entry, view.unit));
    }
    Ok(())
}

pub fn clear(json: bool) -> Result<(), Box<dyn Error>> {
    let mut ctx = Context::open(json)?;
    ctx.session.clear()?;
    let snapshot = ctx.session.engine().snapshot(now_ms());
    ctx.emit(&snapshot)
}
