//! Definition of metrics exposed by the command monitor.
use anyhow::Result;
use once_cell::sync::Lazy;
use prometheus::Counter;
use prometheus::CounterVec;
use prometheus::HistogramOpts;
use prometheus::HistogramVec;
use prometheus::Opts;

/// Duration (in seconds) of MongoDB commands observed by the monitor.
pub static COMMANDS_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "otelmongo_commands_duration",
            "Duration (in seconds) of MongoDB commands observed by the monitor",
        )
        .buckets(vec![0.001, 0.01, 0.1, 1.0, 10.0, 60.0]),
        &["op"],
    )
    .expect("failed to initialise COMMANDS_DURATION histogram")
});

/// Number of MongoDB commands the server returned an error for.
pub static COMMANDS_ERR: Lazy<CounterVec> = Lazy::new(|| {
    CounterVec::new(
        Opts::new(
            "otelmongo_commands_error",
            "Number of MongoDB commands the server returned an error for",
        ),
        &["op"],
    )
    .expect("failed to initialise COMMANDS_ERR counter")
});

/// Number of completion events with no matching in-flight command span.
pub static COMPLETIONS_UNMATCHED: Lazy<Counter> = Lazy::new(|| {
    Counter::new(
        "otelmongo_completions_unmatched",
        "Number of completion events with no matching in-flight command span",
    )
    .expect("failed to initialise COMPLETIONS_UNMATCHED counter")
});

/// Register the monitor metrics with a prometheus registry.
pub fn register(registry: &prometheus::Registry) -> Result<()> {
    let collectors: [Box<dyn prometheus::core::Collector>; 3] = [
        Box::new(COMMANDS_DURATION.clone()),
        Box::new(COMMANDS_ERR.clone()),
        Box::new(COMPLETIONS_UNMATCHED.clone()),
    ];
    for collector in collectors {
        registry.register(collector)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::register;

    #[test]
    fn collectors_register() {
        let registry = prometheus::Registry::new();
        register(&registry).unwrap();
        // Registering the same collectors twice is rejected by prometheus.
        assert!(register(&registry).is_err());
    }
}
