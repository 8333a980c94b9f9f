//! Main application orchestration.
//!
//! Runs the strategy on a single task. Each loop iteration dispatches one
//! unit of work to completion, in priority order:
//! - order requests from the strategy, executed by the paper exchange
//! - expired timers (enable, PnL)
//! - replayed book snapshots
//! - shutdown signal

use helium_core::{OrderEvent, OrderRequest};
use helium_mm::{Helium, MidVolatility, OrderLifecycle, RiskPolicy, TimerScheduler, TimerTask};
use helium_telemetry::Metrics;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::book::LadderBook;
use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::paper::{ChannelTransport, PaperExchange};
use crate::replay::{replay_file, BookSnapshot};
use crate::scheduler::Scheduler;

/// Snapshot channel depth; the replay task waits when the loop falls behind.
const SNAPSHOT_CHANNEL_CAPACITY: usize = 64;

/// Main application.
pub struct Application {
    config: AppConfig,
    strategy: Helium<LadderBook, ChannelTransport>,
    exchange: PaperExchange,
    requests: mpsc::UnboundedReceiver<OrderRequest>,
    snapshot_count: u64,
}

impl Application {
    /// Create a new application.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let (transport, requests) = ChannelTransport::new();
        let mut strategy = Helium::new(config.strategy.clone(), LadderBook::new(), transport)?;
        if config.volatility.enabled {
            strategy = strategy.with_volatility_monitor(Box::new(MidVolatility::new(
                config.volatility.window,
                config.volatility.min_samples,
            )));
        }
        let exchange = PaperExchange::new(config.paper.max_fill_fraction);

        Ok(Self {
            config,
            strategy,
            exchange,
            requests,
            snapshot_count: 0,
        })
    }

    pub fn strategy(&self) -> &Helium<LadderBook, ChannelTransport> {
        &self.strategy
    }

    pub fn exchange(&self) -> &PaperExchange {
        &self.exchange
    }

    /// Run until the replay ends (if configured) or Ctrl-C.
    pub async fn run(&mut self) -> AppResult<()> {
        info!(
            replay = %self.config.paper.replay_path,
            warmup_ms = self.config.warmup_ms,
            "Starting application"
        );

        let (snapshot_tx, mut snapshots) = mpsc::channel::<BookSnapshot>(SNAPSHOT_CHANNEL_CAPACITY);
        let replay_handle = tokio::spawn(replay_file(
            self.config.paper.replay_path.clone(),
            self.config.replay_interval(),
            snapshot_tx,
        ));

        let mut scheduler = Scheduler::new();
        scheduler.run_after(self.config.warmup(), TimerTask::Enable);
        if self.config.strategy.track_pnl.is_some() {
            scheduler.run_after(self.config.pnl_start_delay(), TimerTask::ComputePnl);
        }

        let mut replay_done = false;

        info!("Entering main event loop");
        loop {
            tokio::select! {
                biased;

                Some(request) = self.requests.recv() => {
                    let events = self.exchange.handle(request, self.strategy.book());
                    self.dispatch(events);
                }

                Some(task) = scheduler.next_task() => {
                    debug!(?task, "Timer fired");
                    self.strategy.on_timer(task, &mut scheduler);
                }

                snapshot = snapshots.recv(), if !replay_done => match snapshot {
                    Some(snapshot) => self.on_snapshot(snapshot),
                    None => {
                        info!(snapshots = self.snapshot_count, "Replay exhausted");
                        replay_done = true;
                        if self.config.paper.exit_on_replay_end {
                            break;
                        }
                    }
                },

                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        // Work queued by the last event still reaches the exchange
        while let Ok(request) = self.requests.try_recv() {
            let events = self.exchange.handle(request, self.strategy.book());
            self.dispatch(events);
        }

        replay_handle.abort();
        let result = match replay_handle.await {
            Ok(result) => result.map(|_| ()),
            Err(e) if e.is_cancelled() => Ok(()),
            Err(e) => Err(AppError::Replay(format!("replay task failed: {e}"))),
        };
        if let Err(e) = &result {
            error!(error = %e, "Replay failed");
        }

        self.log_summary();
        result
    }

    fn on_snapshot(&mut self, snapshot: BookSnapshot) {
        self.snapshot_count += 1;
        let now_ms = snapshot.timestamp_ms();
        if let Err(e) = self
            .strategy
            .book_mut()
            .replace(&snapshot.bids, &snapshot.asks)
        {
            warn!(error = %e, snapshot = self.snapshot_count, "Rejected book snapshot");
            return;
        }

        self.strategy.observe_market(now_ms);
        let fills = self.exchange.match_book(self.strategy.book());
        self.dispatch(fills);
        self.strategy.update();
    }

    fn dispatch(&mut self, events: Vec<OrderEvent>) {
        for event in events {
            self.strategy.on_order_event(event);
        }
    }

    fn log_summary(&self) {
        let ledger = self.strategy.ledger();
        let (open_bids, open_asks) = ledger.open_size();
        info!(
            state = %self.strategy.state(),
            lockdown_reason = ?self.strategy.lockdown_reason().map(|r| r.to_string()),
            snapshots = self.snapshot_count,
            fills = ledger.fill_count(),
            position = %ledger.position(),
            avg_entry = %ledger.avg_entry(),
            realized_pnl = %ledger.realized_pnl(),
            profit_loss = %self.strategy.profit_loss(),
            open_bids = %open_bids,
            open_asks = %open_asks,
            "Final summary"
        );
        match Metrics::encode() {
            Ok(text) => debug!(metrics = %text, "Final metrics"),
            Err(e) => warn!(error = %e, "Failed to encode metrics"),
        }
    }
}
