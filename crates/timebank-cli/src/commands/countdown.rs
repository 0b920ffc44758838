use std::error::Error;
use std::time::Duration;

use clap::Subcommand;
use timebank_core::{now_ms, CountdownPhase};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use super::Context;
use crate::terminal::RenderMode;

#[derive(Subcommand)]
pub enum CountdownAction {
    /// Start draining the balance from now
    Start,
    /// Stop the countdown, or acknowledge the alarm
    Stop,
    /// Follow the countdown in the foreground; Ctrl-C stops it.
    ///
    /// Exits when another `countdown stop` or `start` changes the countdown.
    Watch,
}

pub fn run(action: CountdownAction, json: bool) -> Result<(), Box<dyn Error>> {
    match action {
        CountdownAction::Start => {
            let mut ctx = Context::open(json)?;
            let event = ctx.session.start_countdown(now_ms())?;
            ctx.emit(&event)
        }
        CountdownAction::Stop => {
            let mut ctx = Context::open(json)?;
            match ctx.session.stop_countdown(now_ms())? {
                Some(event) => ctx.emit(&event),
                None => {
                    ctx.noop("no countdown running");
                    Ok(())
                }
            }
        }
        CountdownAction::Watch => {
            let ctx = Context::open_with(json, RenderMode::Ticker)?;
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            runtime.block_on(watch(ctx))
        }
    }
}

/// Tick once per configured interval until the countdown is stopped.
///
/// Leaving the loop drops the interval, so no tick can run after the stop.
async fn watch(mut ctx: Context) -> Result<(), Box<dyn Error>> {
    if ctx.session.engine().countdown_phase() == CountdownPhase::Idle {
        ctx.noop("no countdown running");
        return Ok(());
    }
    ctx.session.sync_alarm(&mut ctx.bell);

    let period = Duration::from_millis(ctx.config.tick_interval_ms.max(1));
    let mut ticks = tokio::time::interval(period);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
    debug!(period_ms = period.as_millis() as u64, "watching countdown");
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = ticks.tick() => {
                if ctx.session.countdown_superseded()? {
                    info!("countdown changed by another process");
                    ctx.noop("countdown changed elsewhere; stopped watching");
                    break;
                }
                let now = now_ms();
                match ctx.session.engine().countdown_phase() {
                    CountdownPhase::Running => {
                        let Some(ticker) = ctx.session.engine().ticker() else {
                            break;
                        };
                        if let Some(event) = ctx.session.tick(ticker.run_id, now)? {
                            ctx.emit(&event)?;
                        }
                    }
                    CountdownPhase::Alarming => ctx.bell.ring_if_due(now),
                    CountdownPhase::Idle => break,
                }
            }
            res = &mut ctrl_c => {
                res?;
                if ctx.session.countdown_superseded()? {
                    break;
                }
                if let Some(event) = ctx.session.stop_countdown(now_ms())? {
                    if !ctx.json {
                        println!();
                    }
                    ctx.emit(&event)?;
                }
                break;
            }
        }
    }
    Ok(())
}
