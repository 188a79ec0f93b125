use connectors::{
    adapter::{CountInfo, CounterFactory, CounterOutput},
    args::AdapterRequest,
    error::AdapterError,
};
use engine_core::{
    progress::{format_rate, format_seconds, plural_rows},
    range::RangeWindow,
};

/// Runs a counter adapter, calling its deferred counter when it returns one.
pub async fn resolve(
    factory: &dyn CounterFactory,
    request: &AdapterRequest,
) -> Result<CountInfo, AdapterError> {
    match factory.create(request).await? {
        CounterOutput::Info(info) => Ok(info),
        CounterOutput::Deferred(mut counter) => counter.count(request).await,
    }
}

/// The expected total never exceeds the window; a bounded window without a
/// count uses its own size.
pub fn cap(count: Option<u64>, window: &RangeWindow) -> Option<u64> {
    match window.diff {
        Some(diff) => Some(count.map_or(diff, |count| count.min(diff))),
        None => count,
    }
}

/// `Count:` status line, only when a count is known.
pub fn message(info: &CountInfo) -> Option<String> {
    let count = info.count?;
    Some(format!(
        "{:<20}{} {}, {}s, {} rows/s",
        "Count:",
        count,
        plural_rows(count),
        format_seconds(info.duration.unwrap_or(0.0)),
        format_rate(info.rate)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use connectors::adapter::CountFn;

    struct Deferred;

    #[async_trait]
    impl CountFn for Deferred {
        async fn count(&mut self, request: &AdapterRequest) -> Result<CountInfo, AdapterError> {
            Ok(CountInfo::of(request.args.len() as u64))
        }
    }

    struct DeferredFactory;

    #[async_trait]
    impl CounterFactory for DeferredFactory {
        async fn create(&self, _request: &AdapterRequest) -> Result<CounterOutput, AdapterError> {
            Ok(CounterOutput::Deferred(Box::new(Deferred)))
        }
    }

    #[tokio::test]
    async fn deferred_counters_are_called_with_the_request() {
        let request = AdapterRequest {
            args: "abc".into(),
            ..Default::default()
        };
        let info = resolve(&DeferredFactory, &request).await.unwrap();
        assert_eq!(info.count, Some(3));
    }

    #[test]
    fn window_caps_the_total() {
        let bounded = RangeWindow::resolve(Some(2), Some(5), None).unwrap();
        assert_eq!(cap(Some(100), &bounded), Some(3));
        assert_eq!(cap(Some(1), &bounded), Some(1));
        assert_eq!(cap(None, &bounded), Some(3));

        let open = RangeWindow::default();
        assert_eq!(cap(Some(100), &open), Some(100));
        assert_eq!(cap(None, &open), None);
    }

    #[test]
    fn count_line() {
        let info = CountInfo {
            count: Some(10),
            duration: Some(0.5),
            rate: Some(20.0),
        };
        assert_eq!(
            message(&info).unwrap(),
            "Count:              10 rows, 0.500s, 20 rows/s"
        );
        assert_eq!(
            message(&CountInfo::of(1)).unwrap(),
            "Count:              1 row, 0s, ? rows/s"
        );
        assert!(message(&CountInfo::default()).is_none());
    }
}
