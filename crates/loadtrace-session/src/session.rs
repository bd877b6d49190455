use std::time::Duration;

use loadtrace_driver::{BrowserDriver, DriverError, EventKind, EventStream, PerformanceTiming};

use crate::{EventLog, Report, SessionConfig, SessionError, SettleDetector, SettleOutcome};

/// Pause after the cache warm-up visit before the measured load starts.
pub const CACHE_WARMUP_PAUSE: Duration = Duration::from_secs(1);

/// How long `prevent_auto_close` keeps the page open before settling is awaited.
pub const HOLD_OPEN: Duration = Duration::from_secs(60);

/// Loads `config.url` through `driver` and returns its network timeline.
///
/// Only driver failures end the session early. A settle timeout, missing
/// navigation marks and malformed event URLs are logged and surface as
/// [`Report::warnings`].
pub async fn run(config: &SessionConfig, driver: &dyn BrowserDriver) -> Result<Report, SessionError> {
    config.validate()?;
    tracing::info!(
        target: "loadtrace_session",
        url = %config.url,
        driver = driver.name(),
        quiet_ms = config.quiet_period_ms,
        timeout_sec = config.timeout_sec,
        "session starting"
    );

    let (log, timing, outcome) = match capture(config, driver).await {
        Ok(captured) => captured,
        Err(error) => {
            if let Err(close_error) = driver.close().await {
                tracing::warn!(
                    target: "loadtrace_session",
                    error = %close_error,
                    "driver close after failed session also failed"
                );
            }
            return Err(error);
        }
    };

    driver.close().await?;

    let report = Report::assemble(
        log,
        timing,
        outcome,
        config.setup.network,
        config.correlation,
    );
    tracing::info!(
        target: "loadtrace_session",
        entries = report.timeline.len(),
        request_count = report.request_count,
        degraded = report.is_degraded(),
        "report assembled"
    );
    Ok(report)
}

/// Drives the page from warm-up to the timing read. The caller closes the
/// driver on every exit path.
async fn capture(
    config: &SessionConfig,
    driver: &dyn BrowserDriver,
) -> Result<(EventLog, Option<PerformanceTiming>, SettleOutcome), SessionError> {
    if config.use_cache {
        tracing::info!(target: "loadtrace_session", "warming cache");
        driver.preload(&config.url, &config.setup).await?;
        tokio::time::sleep(CACHE_WARMUP_PAUSE).await;
    }

    driver.prepare(&config.setup).await?;
    let mut events = driver.subscribe().await?;
    let mut log = EventLog::new(config.match_rule());
    let mut detector = SettleDetector::new(config.quiet_period(), config.absolute_timeout());

    tokio::time::sleep(config.pre_navigation_delay()).await;
    driver.navigate(&config.url).await?;
    for script in config.scripts() {
        driver.inject_script(script).await?;
    }
    if config.prevent_auto_close {
        tracing::info!(
            target: "loadtrace_session",
            hold_sec = HOLD_OPEN.as_secs(),
            "holding page open"
        );
        tokio::time::sleep(HOLD_OPEN).await;
    }

    let outcome = await_settled(&mut events, &mut log, &mut detector).await;
    match outcome {
        SettleOutcome::Settled => tracing::info!(
            target: "loadtrace_session",
            retained = log.snapshot().len(),
            requests = log.request_count(),
            "network settled"
        ),
        SettleOutcome::TimedOut => tracing::warn!(
            target: "loadtrace_session",
            timeout_sec = config.timeout_sec,
            retained = log.snapshot().len(),
            "network did not settle before the timeout; reporting what was captured"
        ),
    }

    let timing = read_timing(driver).await?;

    let late = drain_late(&mut events, &mut log);
    if late > 0 {
        tracing::debug!(target: "loadtrace_session", late, "events arrived after settling");
    }

    Ok((log, timing, outcome))
}

/// Ingests events until the detector resolves. Events win ties with the
/// deadlines so that activity arriving exactly at a deadline still counts.
async fn await_settled(
    events: &mut EventStream,
    log: &mut EventLog,
    detector: &mut SettleDetector,
) -> SettleOutcome {
    let mut stream_open = true;
    loop {
        tokio::select! {
            biased;
            event = events.recv(), if stream_open => match event {
                Some(event) => {
                    if event.kind != EventKind::PerformanceMark {
                        detector.notify_activity();
                    }
                    log.ingest(event);
                }
                None => {
                    tracing::debug!(
                        target: "loadtrace_session",
                        "driver closed the event stream; waiting on timers"
                    );
                    stream_open = false;
                }
            },
            outcome = detector.next_resolution() => return outcome,
        }
    }
}

/// Reads the navigation marks. A page without marks degrades the report;
/// any other driver error means the driver is gone and ends the session.
async fn read_timing(
    driver: &dyn BrowserDriver,
) -> Result<Option<PerformanceTiming>, SessionError> {
    match driver.performance_timing().await {
        Ok(timing) if timing.is_available() => {
            tracing::debug!(
                target: "loadtrace_session",
                navigation_start = timing.navigation_start,
                dom_content_loaded = timing.dom_content_loaded_event_start,
                load = timing.load_event_start,
                "performance timing read"
            );
            Ok(Some(timing))
        }
        Ok(_) => {
            tracing::warn!(
                target: "loadtrace_session",
                "navigation start is zero; offsets will be absolute timestamps"
            );
            Ok(None)
        }
        Err(error @ (DriverError::Unavailable(_) | DriverError::NotNavigated)) => {
            tracing::warn!(
                target: "loadtrace_session",
                error = %error,
                "performance marks unavailable; offsets will be absolute timestamps"
            );
            Ok(None)
        }
        Err(error) => Err(error.into()),
    }
}

/// Appends events already queued after resolution without touching the detector.
fn drain_late(events: &mut EventStream, log: &mut EventLog) -> usize {
    let mut drained = 0;
    while let Ok(event) = events.try_recv() {
        log.ingest(event);
        drained += 1;
    }
    drained
}
