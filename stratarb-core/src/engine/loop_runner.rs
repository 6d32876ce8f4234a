//! Bar loop: drives every strategy over its series and manages positions.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info, warn};

use crate::data::validate_series;
use crate::domain::{
    Bar, ExitReason, Position, PositionKey, PositionSide, SeriesKey, Signal, SignalAction, Trade,
};
use crate::risk::RiskManager;
use crate::strategy::{BarContext, Strategy};

use super::accounting::{entry_price, exit_price, gross_pnl, round_trip_fees};
use super::config::{ConfigError, EngineConfig};
use super::state::{EngineState, RunResult};

/// Event-driven backtester.
///
/// Series are processed in key order; within a series, strategies run in the
/// order given. All strategies draw on one running balance, so a strategy's
/// sizing depends on the PnL realized by the strategies that ran before it.
#[derive(Debug, Clone)]
pub struct BacktestEngine {
    config: EngineConfig,
    risk: RiskManager,
}

impl BacktestEngine {
    pub fn new(config: EngineConfig, risk: RiskManager) -> Result<Self, ConfigError> {
        config.validate()?;
        let problems = risk.config().problems();
        if !problems.is_empty() {
            return Err(ConfigError::InvalidRisk(problems));
        }
        Ok(Self { config, risk })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn risk(&self) -> &RiskManager {
        &self.risk
    }

    /// Run every strategy over its (symbol, timeframe) series.
    ///
    /// Fails if a series is not strictly ascending in time or if two
    /// strategies share a (name, symbol, timeframe) key. Both are checked
    /// before the first bar is processed.
    pub fn run(
        &self,
        data: &BTreeMap<SeriesKey, Vec<Bar>>,
        strategies: &mut [Box<dyn Strategy>],
    ) -> Result<RunResult, ConfigError> {
        for ((symbol, timeframe), bars) in data {
            validate_series(symbol, timeframe, bars)?;
        }

        let mut keys = BTreeSet::new();
        for strategy in strategies.iter() {
            let key = PositionKey::new(strategy.name(), strategy.symbol(), strategy.timeframe());
            if keys.contains(&key) {
                return Err(ConfigError::DuplicateStrategy(key.to_string()));
            }
            keys.insert(key);
        }

        let mut names: Vec<String> = Vec::new();
        for strategy in strategies.iter() {
            if !names.iter().any(|n| n == strategy.name()) {
                names.push(strategy.name().to_string());
            }
            let key = (strategy.symbol().to_string(), strategy.timeframe().to_string());
            if !data.contains_key(&key) {
                warn!(
                    strategy = strategy.name(),
                    symbol = strategy.symbol(),
                    timeframe = strategy.timeframe(),
                    "no bars for strategy series"
                );
            }
        }

        let mut state = EngineState::new(self.config.initial_balance);
        for ((symbol, timeframe), bars) in data {
            let valid: Vec<Bar> = bars
                .iter()
                .enumerate()
                .filter(|(i, b)| b.check(*i).is_ok())
                .map(|(_, b)| *b)
                .collect();

            for strategy in strategies
                .iter_mut()
                .filter(|s| s.symbol() == symbol && s.timeframe() == timeframe)
            {
                self.run_single(&mut state, strategy.as_mut(), bars, &valid);
            }
        }

        info!(
            trades = state.trades.len(),
            final_balance = state.ledger.balance(),
            void_bars = state.void_bars,
            strategy_errors = state.strategy_errors,
            "backtest complete"
        );
        Ok(state.into_result(names))
    }

    fn run_single(
        &self,
        state: &mut EngineState,
        strategy: &mut dyn Strategy,
        bars: &[Bar],
        valid: &[Bar],
    ) {
        let key = PositionKey::new(strategy.name(), strategy.symbol(), strategy.timeframe());
        let symbol = key.symbol.clone();
        let timeframe = key.timeframe.clone();
        let mut seen = 0usize;
        let mut last_valid: Option<(usize, Bar)> = None;

        for (index, bar) in bars.iter().enumerate() {
            state.bars_processed += 1;
            if let Err(err) = bar.check(index) {
                state.void_bars += 1;
                warn!(
                    symbol = %symbol,
                    timeframe = %timeframe,
                    strategy = %key.strategy,
                    index,
                    timestamp = %bar.timestamp,
                    error = %err,
                    "skipping void bar"
                );
                continue;
            }
            seen += 1;
            last_valid = Some((index, *bar));

            strategy.on_data(bar);
            let Some(ctx) = BarContext::new(&symbol, &timeframe, &valid[..seen]) else {
                continue;
            };
            let signal = self.poll(state, strategy, &ctx, index);
            let action = signal.as_ref().map_or(SignalAction::Hold, |s| s.action);

            match state.book.get(&key) {
                None => {
                    if let Some(signal) = signal.filter(|s| s.action.is_entry()) {
                        self.open(state, &key, &signal, bar, index);
                    }
                }
                Some(position) => {
                    if let Some((reason, level)) = check_exit(position, bar, action) {
                        self.close(state, &key, reason, level, bar, index);
                    }
                }
            }
        }

        if state.book.is_open(&key) {
            if let Some((index, bar)) = last_valid {
                self.close(state, &key, ExitReason::EndOfData, bar.close, &bar, index);
            }
        }
    }

    /// Ask the strategy for a signal; errors and invalid signals become `None`.
    fn poll(
        &self,
        state: &mut EngineState,
        strategy: &mut dyn Strategy,
        ctx: &BarContext<'_>,
        index: usize,
    ) -> Option<Signal> {
        match strategy.generate_signal(ctx) {
            Ok(signal) => match signal.validate() {
                Ok(()) => Some(signal),
                Err(err) => {
                    state.invalid_signals += 1;
                    warn!(
                        symbol = ctx.symbol,
                        timeframe = ctx.timeframe,
                        strategy = strategy.name(),
                        index,
                        timestamp = %ctx.current().timestamp,
                        error = %err,
                        "ignoring invalid signal"
                    );
                    None
                }
            },
            Err(err) => {
                state.strategy_errors += 1;
                warn!(
                    symbol = ctx.symbol,
                    timeframe = ctx.timeframe,
                    strategy = strategy.name(),
                    index,
                    timestamp = %ctx.current().timestamp,
                    error = %err,
                    "strategy failed, holding"
                );
                None
            }
        }
    }

    fn open(
        &self,
        state: &mut EngineState,
        key: &PositionKey,
        signal: &Signal,
        bar: &Bar,
        index: usize,
    ) {
        let side = PositionSide::from_action(signal.action);
        let price = entry_price(bar.close, side, self.config.slippage_pct);
        if let Err(err) = signal.validate_levels(price) {
            state.invalid_signals += 1;
            warn!(
                symbol = %key.symbol,
                timeframe = %key.timeframe,
                strategy = %key.strategy,
                index,
                timestamp = %bar.timestamp,
                error = %err,
                "ignoring invalid signal"
            );
            return;
        }
        let quantity = self
            .risk
            .size_position(state.ledger.balance(), price, signal.stop_loss);
        if !(quantity > 0.0) {
            state.zero_size_entries += 1;
            debug!(
                symbol = %key.symbol,
                timeframe = %key.timeframe,
                strategy = %key.strategy,
                index,
                timestamp = %bar.timestamp,
                price,
                stop_loss = ?signal.stop_loss,
                "entry sized to zero, staying flat"
            );
            return;
        }

        let position = Position {
            side,
            entry_price: price,
            entry_time: bar.timestamp,
            entry_bar: index,
            quantity,
            stop_loss: signal.stop_loss,
            take_profit: signal.take_profit,
        };
        match state.book.open(key.clone(), position) {
            Ok(()) => debug!(
                strategy = %key.strategy,
                index,
                side = ?side,
                price,
                quantity,
                "opened position"
            ),
            Err(err) => warn!(strategy = %key.strategy, index, error = %err, "open refused"),
        }
    }

    fn close(
        &self,
        state: &mut EngineState,
        key: &PositionKey,
        reason: ExitReason,
        level: f64,
        bar: &Bar,
        index: usize,
    ) {
        let position = match state.book.close(key) {
            Ok(position) => position,
            Err(err) => {
                warn!(strategy = %key.strategy, index, error = %err, "close refused");
                return;
            }
        };

        let exit = exit_price(level, position.side, self.config.slippage_pct);
        let qty = position.quantity;
        let fees = round_trip_fees(position.entry_price, exit, qty, self.config.fee_pct);
        let pnl = gross_pnl(position.side, position.entry_price, exit, qty) - fees;
        state.ledger.realize(pnl, fees);

        debug!(
            strategy = %key.strategy,
            index,
            reason = reason.as_str(),
            exit,
            pnl,
            "closed position"
        );

        state.trades.push(Trade {
            strategy: key.strategy.clone(),
            symbol: key.symbol.clone(),
            timeframe: key.timeframe.clone(),
            side: position.side,
            entry_bar: position.entry_bar,
            entry_time: position.entry_time,
            entry_price: position.entry_price,
            exit_bar: index,
            exit_time: bar.timestamp,
            exit_price: exit,
            exit_reason: reason,
            sl: position.stop_loss,
            tp: position.take_profit,
            qty,
            fees,
            pnl,
        });
    }
}

/// Exit decision for an open position on `bar`, as `(reason, fill level)`.
///
/// Priority is stop-loss, then take-profit, then an opposite signal. Stops
/// and targets fill at their level; signal exits fill at the close.
pub fn check_exit(
    position: &Position,
    bar: &Bar,
    action: SignalAction,
) -> Option<(ExitReason, f64)> {
    let (sl_hit, tp_hit) = match position.side {
        PositionSide::Long => (
            position.stop_loss.is_some_and(|sl| bar.low <= sl),
            position.take_profit.is_some_and(|tp| bar.high >= tp),
        ),
        PositionSide::Short => (
            position.stop_loss.is_some_and(|sl| bar.high >= sl),
            position.take_profit.is_some_and(|tp| bar.low <= tp),
        ),
        PositionSide::Flat => return None,
    };

    if sl_hit {
        position.stop_loss.map(|sl| (ExitReason::StopLoss, sl))
    } else if tp_hit {
        position.take_profit.map(|tp| (ExitReason::TakeProfit, tp))
    } else if position.side.exit_action() == Some(action) {
        Some((ExitReason::Signal, bar.close))
    } else {
        None
    }
}
