// Monitoring loop: drives analysis cycles and alerts on notable changes.

use crate::analyzer::{TimeframeEstimator, combine};
use crate::config::AppConfig;
use crate::event_log::{EventLog, Severity};
use crate::model::{CycleError, PredictionResult, Timeframe, TimeframeSignal};
use crate::notifier::Notifier;
use crate::quote::QuoteSource;
use crate::ui::{UiState, UiSurface};
use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::{Mutex, Notify};
use tokio::time::{Duration, interval, sleep};
use tracing::{info, warn};

/// A foreground result at or above this confidence is final; below it the
/// background loop is armed.
const HIGH_CONFIDENCE: u8 = 80;

/// A background result at or above this confidence is notable even without a
/// direction flip.
const NOTABLE_CONFIDENCE: u8 = 85;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Idle,
    Analyzing,
    ActiveMonitoring,
}

/// One-at-a-time analysis driver. Re-entrancy is enforced by the state enum
/// itself: `start` is only accepted in `Idle`.
pub struct Monitor {
    config: AppConfig,
    source: Arc<dyn QuoteSource>,
    estimator: Arc<dyn TimeframeEstimator>,
    notifier: Arc<dyn Notifier>,
    log: Arc<EventLog>,
    ui: Arc<dyn UiSurface>,
    state: Mutex<MonitorState>,
    last_result: Mutex<Option<PredictionResult>>,
    stop_signal: Notify,
}

impl Monitor {
    pub fn new(
        config: AppConfig,
        source: Arc<dyn QuoteSource>,
        estimator: Arc<dyn TimeframeEstimator>,
        notifier: Arc<dyn Notifier>,
        log: Arc<EventLog>,
        ui: Arc<dyn UiSurface>,
    ) -> Self {
        Self {
            config,
            source,
            estimator,
            notifier,
            log,
            ui,
            state: Mutex::new(MonitorState::Idle),
            last_result: Mutex::new(None),
            stop_signal: Notify::new(),
        }
    }

    pub async fn state(&self) -> MonitorState {
        *self.state.lock().await
    }

    pub async fn last_result(&self) -> Option<PredictionResult> {
        self.last_result.lock().await.clone()
    }

    /// Runs one foreground analysis. High confidence ends in `Idle`; low
    /// confidence arms the background loop.
    pub async fn start(self: &Arc<Self>) {
        {
            let mut state = self.state.lock().await;
            if *state != MonitorState::Idle {
                warn!("⚠️ Analysis already in progress, ignoring start");
                return;
            }
            *state = MonitorState::Analyzing;
        }
        self.ui.set_state(UiState::Analyzing);
        self.log.log("Starting market analysis...", Severity::Info);

        let outcome = self.run_cycle().await;

        // stop() may have fired while the cycle was in flight; the fetch is
        // not cancelled, its result is just discarded.
        if *self.state.lock().await != MonitorState::Analyzing {
            info!("🛑 Stopped mid-flight, discarding analysis result");
            return;
        }

        match outcome {
            Ok(result) => {
                self.ui.render(&result);
                let direction = result.direction;
                let confidence = result.confidence;
                *self.last_result.lock().await = Some(result);

                if confidence >= HIGH_CONFIDENCE {
                    self.log.log(
                        format!("Analysis complete. High confidence: {confidence}%"),
                        Severity::Success,
                    );
                    if self.config.notifications_enabled {
                        if let Err(e) = self
                            .notifier
                            .notify(
                                "Analysis Complete",
                                &format!("{direction} - Confidence: {confidence}%"),
                                Severity::Success,
                            )
                            .await
                        {
                            info!("🔕 Notification suppressed: {e}");
                        }
                    }
                    *self.state.lock().await = MonitorState::Idle;
                    self.ui.set_state(UiState::Waiting);
                } else {
                    self.log.log(
                        format!("Low confidence ({confidence}%). Enabling background monitoring."),
                        Severity::Warning,
                    );
                    self.arm_background().await;
                }
            }
            Err(e) => {
                self.log.log(format!("Analysis error: {e}"), Severity::Error);
                *self.state.lock().await = MonitorState::Idle;
                self.ui.set_state(UiState::Waiting);
            }
        }
    }

    /// Cancels both background timers and returns to `Idle` immediately.
    pub async fn stop(&self) {
        let mut state = self.state.lock().await;
        match *state {
            MonitorState::Idle => return,
            MonitorState::ActiveMonitoring => self.stop_signal.notify_one(),
            MonitorState::Analyzing => {}
        }
        *state = MonitorState::Idle;
        drop(state);

        self.ui.set_state(UiState::Waiting);
        self.log.log("Analysis stopped", Severity::Info);
    }

    /// Quote fetch, fan-out over the four timeframes, combination.
    async fn run_cycle(&self) -> Result<PredictionResult, CycleError> {
        let quote = self.source.fetch_quote().await;
        self.log.log(
            format!(
                "Quote {} @ {} ({})",
                quote.symbol, quote.current_price, quote.source
            ),
            Severity::Info,
        );

        let futures = Timeframe::ALL.map(|timeframe| {
            let quote = &quote;
            async move {
                self.estimator
                    .estimate(quote, timeframe)
                    .await
                    .map(|signal| (timeframe, signal))
            }
        });
        let signals: Vec<(Timeframe, TimeframeSignal)> = join_all(futures)
            .await
            .into_iter()
            .collect::<Result<_, _>>()?;

        let combined = combine(&signals);
        Ok(PredictionResult {
            direction: combined.direction,
            confidence: combined.confidence,
            rationale: combined.rationale,
            timestamp: Utc::now(),
            quote,
            timeframes: signals,
        })
    }

    /// Arms the recurring check plus one extra early check. Both timers are
    /// cancelled together by `stop`.
    async fn arm_background(self: &Arc<Self>) {
        {
            let mut state = self.state.lock().await;
            if *state != MonitorState::Analyzing {
                info!("🛑 Stop raced the arming, staying idle");
                return;
            }
            *state = MonitorState::ActiveMonitoring;
        }
        self.ui.set_state(UiState::Active);
        self.log
            .log("Background monitoring activated", Severity::Success);

        let monitor = Arc::clone(self);
        tokio::spawn(async move {
            let poll = Duration::from_secs(monitor.config.poll_interval_seconds);
            let early = Duration::from_secs(monitor.config.first_check_delay_seconds);

            let mut ticker = interval(poll);
            ticker.tick().await; // consume the immediate first tick

            let early_check = sleep(early);
            tokio::pin!(early_check);
            let mut early_done = false;

            loop {
                tokio::select! {
                    _ = &mut early_check, if !early_done => {
                        early_done = true;
                        monitor.background_cycle().await;
                    }
                    _ = ticker.tick() => {
                        monitor.background_cycle().await;
                    }
                    _ = monitor.stop_signal.notified() => {
                        info!("🛑 Background monitoring cancelled");
                        break;
                    }
                }
            }
        });
    }

    /// One background check: alert on a direction flip or high confidence,
    /// refresh the stored baseline either way. Errors keep the timers alive.
    async fn background_cycle(&self) {
        self.ui.set_last_check(Utc::now());

        match self.run_cycle().await {
            Ok(result) => {
                if *self.state.lock().await != MonitorState::ActiveMonitoring {
                    info!("🛑 Stopped mid-flight, discarding background result");
                    return;
                }

                let notable = match self.last_result.lock().await.as_ref() {
                    Some(prev) => {
                        result.direction != prev.direction
                            || result.confidence >= NOTABLE_CONFIDENCE
                    }
                    None => false,
                };

                if notable {
                    self.log.log(
                        format!(
                            "Change detected: {} ({}%)",
                            result.direction, result.confidence
                        ),
                        Severity::Warning,
                    );
                    if self.config.notifications_enabled {
                        if let Err(e) = self
                            .notifier
                            .notify(
                                "Important Change!",
                                &format!(
                                    "Direction: {}, Confidence: {}%",
                                    result.direction, result.confidence
                                ),
                                Severity::Warning,
                            )
                            .await
                        {
                            info!("🔕 Notification suppressed: {e}");
                        }
                    }
                    self.ui.render(&result);
                }

                *self.last_result.lock().await = Some(result);
            }
            Err(e) => {
                self.log
                    .log(format!("Background check error: {e}"), Severity::Error);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Direction, IndicatorSnapshot, Quote};
    use crate::quote::fetcher::simulated_quote;
    use chrono::{DateTime, Utc};
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubSource;

    #[async_trait::async_trait]
    impl QuoteSource for StubSource {
        async fn fetch_quote(&self) -> Quote {
            simulated_quote("EURUSD")
        }
    }

    /// Pops one scripted (direction, confidence) pair per estimate call;
    /// yields NEUTRAL/50 once the script runs out.
    struct ScriptedEstimator {
        script: StdMutex<VecDeque<(Direction, u8)>>,
        delay: Duration,
    }

    impl ScriptedEstimator {
        fn new(cycles: &[(Direction, u8)]) -> Self {
            Self::with_delay(cycles, Duration::ZERO)
        }

        fn with_delay(cycles: &[(Direction, u8)], delay: Duration) -> Self {
            let mut script = VecDeque::new();
            for &step in cycles {
                for _ in 0..Timeframe::ALL.len() {
                    script.push_back(step);
                }
            }
            Self {
                script: StdMutex::new(script),
                delay,
            }
        }
    }

    #[async_trait::async_trait]
    impl TimeframeEstimator for ScriptedEstimator {
        async fn estimate(
            &self,
            _quote: &Quote,
            _timeframe: Timeframe,
        ) -> Result<TimeframeSignal, CycleError> {
            if !self.delay.is_zero() {
                sleep(self.delay).await;
            }
            let (direction, confidence) = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or((Direction::Neutral, 50));
            Ok(TimeframeSignal {
                direction,
                confidence,
                rationale: String::new(),
                indicators: IndicatorSnapshot {
                    rsi: 50.0,
                    macd: 0.0,
                    sma20: 1.0850,
                    ema12: 1.0850,
                },
            })
        }
    }

    struct CountingNotifier {
        count: AtomicUsize,
    }

    impl CountingNotifier {
        fn new() -> Self {
            Self {
                count: AtomicUsize::new(0),
            }
        }

        fn count(&self) -> usize {
            self.count.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl Notifier for CountingNotifier {
        async fn notify(
            &self,
            _title: &str,
            _body: &str,
            _severity: Severity,
        ) -> Result<(), crate::model::NotifyError> {
            self.count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct NullUi;

    impl UiSurface for NullUi {
        fn set_state(&self, _state: UiState) {}
        fn set_last_check(&self, _at: DateTime<Utc>) {}
        fn render(&self, _result: &PredictionResult) {}
    }

    fn test_config(first_check_delay: u64, poll: u64, notifications: bool) -> AppConfig {
        AppConfig {
            api_key: "test".to_string(),
            from_currency: "EUR".to_string(),
            to_currency: "USD".to_string(),
            notifications_enabled: notifications,
            poll_interval_seconds: poll,
            first_check_delay_seconds: first_check_delay,
        }
    }

    fn build_monitor(
        config: AppConfig,
        estimator: ScriptedEstimator,
    ) -> (Arc<Monitor>, Arc<CountingNotifier>) {
        let notifier = Arc::new(CountingNotifier::new());
        let monitor = Arc::new(Monitor::new(
            config,
            Arc::new(StubSource),
            Arc::new(estimator),
            notifier.clone(),
            Arc::new(EventLog::new()),
            Arc::new(NullUi),
        ));
        (monitor, notifier)
    }

    #[tokio::test]
    async fn confidence_80_finishes_in_idle_with_one_notification() {
        let estimator = ScriptedEstimator::new(&[(Direction::Up, 80)]);
        let (monitor, notifier) = build_monitor(test_config(3600, 3600, true), estimator);

        monitor.start().await;

        assert_eq!(monitor.state().await, MonitorState::Idle);
        assert_eq!(notifier.count(), 1);
        let result = monitor.last_result().await.unwrap();
        assert_eq!(result.confidence, 80);
        assert_eq!(result.direction, Direction::Up);
    }

    #[tokio::test]
    async fn confidence_79_arms_background_monitoring() {
        let estimator = ScriptedEstimator::new(&[(Direction::Up, 79)]);
        let (monitor, notifier) = build_monitor(test_config(3600, 3600, true), estimator);

        monitor.start().await;
        assert_eq!(monitor.state().await, MonitorState::ActiveMonitoring);
        assert_eq!(notifier.count(), 0);

        monitor.stop().await;
        assert_eq!(monitor.state().await, MonitorState::Idle);
    }

    #[tokio::test]
    async fn direction_flip_triggers_exactly_one_notification() {
        let estimator =
            ScriptedEstimator::new(&[(Direction::Up, 70), (Direction::Down, 70)]);
        let (monitor, notifier) = build_monitor(test_config(0, 3600, true), estimator);

        monitor.start().await;
        assert_eq!(monitor.state().await, MonitorState::ActiveMonitoring);

        // let the early one-shot check fire
        sleep(Duration::from_millis(300)).await;

        assert_eq!(notifier.count(), 1);
        // baseline refreshed with the new direction
        assert_eq!(
            monitor.last_result().await.unwrap().direction,
            Direction::Down
        );
        monitor.stop().await;
    }

    #[tokio::test]
    async fn high_confidence_without_flip_is_still_notable() {
        let estimator = ScriptedEstimator::new(&[(Direction::Up, 70), (Direction::Up, 90)]);
        let (monitor, notifier) = build_monitor(test_config(0, 3600, true), estimator);

        monitor.start().await;
        sleep(Duration::from_millis(300)).await;

        assert_eq!(notifier.count(), 1);
        assert_eq!(monitor.last_result().await.unwrap().confidence, 90);
        monitor.stop().await;
    }

    #[tokio::test]
    async fn quiet_background_cycle_stays_silent() {
        let estimator = ScriptedEstimator::new(&[(Direction::Up, 70), (Direction::Up, 70)]);
        let (monitor, notifier) = build_monitor(test_config(0, 3600, true), estimator);

        monitor.start().await;
        sleep(Duration::from_millis(300)).await;

        assert_eq!(notifier.count(), 0);
        assert_eq!(monitor.state().await, MonitorState::ActiveMonitoring);
        monitor.stop().await;
    }

    #[tokio::test]
    async fn disabled_notifications_suppress_alerts() {
        let estimator =
            ScriptedEstimator::new(&[(Direction::Up, 70), (Direction::Down, 90)]);
        let (monitor, notifier) = build_monitor(test_config(0, 3600, false), estimator);

        monitor.start().await;
        sleep(Duration::from_millis(300)).await;

        assert_eq!(notifier.count(), 0);
        monitor.stop().await;
    }

    #[tokio::test]
    async fn reentrant_start_is_ignored_while_monitoring() {
        let estimator = ScriptedEstimator::new(&[(Direction::Up, 70)]);
        let (monitor, notifier) = build_monitor(test_config(3600, 3600, true), estimator);

        monitor.start().await;
        assert_eq!(monitor.state().await, MonitorState::ActiveMonitoring);

        monitor.start().await;
        assert_eq!(monitor.state().await, MonitorState::ActiveMonitoring);
        assert_eq!(notifier.count(), 0);
        monitor.stop().await;
    }

    #[tokio::test]
    async fn stop_mid_flight_discards_the_result() {
        let estimator = ScriptedEstimator::with_delay(
            &[(Direction::Up, 90)],
            Duration::from_millis(300),
        );
        let (monitor, notifier) = build_monitor(test_config(3600, 3600, true), estimator);

        let runner = Arc::clone(&monitor);
        let handle = tokio::spawn(async move { runner.start().await });

        sleep(Duration::from_millis(50)).await;
        monitor.stop().await;
        handle.await.unwrap();

        assert_eq!(monitor.state().await, MonitorState::Idle);
        assert!(monitor.last_result().await.is_none());
        assert_eq!(notifier.count(), 0);
    }

    #[tokio::test]
    async fn estimator_failure_returns_to_idle() {
        struct FailingEstimator;

        #[async_trait::async_trait]
        impl TimeframeEstimator for FailingEstimator {
            async fn estimate(
                &self,
                _quote: &Quote,
                _timeframe: Timeframe,
            ) -> Result<TimeframeSignal, CycleError> {
                Err(CycleError::Estimation("no data".to_string()))
            }
        }

        let notifier = Arc::new(CountingNotifier::new());
        let monitor = Arc::new(Monitor::new(
            test_config(3600, 3600, true),
            Arc::new(StubSource),
            Arc::new(FailingEstimator),
            notifier.clone(),
            Arc::new(EventLog::new()),
            Arc::new(NullUi),
        ));

        monitor.start().await;
        assert_eq!(monitor.state().await, MonitorState::Idle);
        assert!(monitor.last_result().await.is_none());
        assert_eq!(notifier.count(), 0);
    }
}
