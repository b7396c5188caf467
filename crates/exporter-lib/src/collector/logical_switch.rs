//! Logical switch realization state

use super::{join_details, list_failed, paginate, CollectStats, Collector};
use crate::client::LogicalSwitchApi;
use crate::error::CollectError;
use crate::metrics::{MetricDesc, SampleSink};
use crate::models::{LogicalSwitch, LogicalSwitchState};
use crate::observability::StructuredLogger;
use crate::status::{StatusVocabulary, SwitchState};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

pub const NAME: &str = "logical_switch";

pub struct LogicalSwitchCollector<A: ?Sized> {
    api: Arc<A>,
    logger: StructuredLogger,
    state: Arc<MetricDesc>,
}

impl<A: LogicalSwitchApi + ?Sized + 'static> LogicalSwitchCollector<A> {
    pub fn new(api: Arc<A>, logger: StructuredLogger) -> Result<Self> {
        Ok(Self {
            api,
            logger,
            state: MetricDesc::new(
                "logical_switch_state",
                "Realization state of the logical switch (one sample per possible state)",
                &["id", "name", "transport_zone_id", "state"],
            )?,
        })
    }

    pub fn factory(api: Arc<A>, logger: StructuredLogger) -> Result<Box<dyn Collector>> {
        Ok(Box::new(Self::new(api, logger)?))
    }
}

#[async_trait]
impl<A: LogicalSwitchApi + ?Sized + 'static> Collector for LogicalSwitchCollector<A> {
    fn describe(&self) -> Vec<Arc<MetricDesc>> {
        vec![self.state.clone()]
    }

    async fn collect(&self, sink: &SampleSink) -> Result<CollectStats, CollectError> {
        let api = &self.api;

        let switches = paginate(|cursor| async move { api.list_logical_switches(&cursor).await })
            .await
            .map_err(|e| list_failed(&self.logger, "logical switches", e))?;

        Ok(join_details(
            &self.logger,
            "logical switch",
            &switches,
            |switch| switch.id.as_str(),
            |id| async move { api.get_logical_switch_state(&id).await },
            |switch: &LogicalSwitch, state: LogicalSwitchState| {
                sink.emit_one_hot(
                    &self.state,
                    &SwitchState::one_hot(&state.state),
                    &[&switch.id, &switch.display_name, &switch.transport_zone_id],
                );
            },
        )
        .await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ApiError, ApiResult};
    use crate::models::Page;

    struct MockSwitches {
        switches: Vec<LogicalSwitch>,
    }

    #[async_trait]
    impl LogicalSwitchApi for MockSwitches {
        async fn list_logical_switches(&self, _cursor: &str) -> ApiResult<Page<LogicalSwitch>> {
            Ok(Page::last(self.switches.clone()))
        }

        async fn get_logical_switch_state(&self, id: &str) -> ApiResult<LogicalSwitchState> {
            match id {
                "ls-ok" => Ok(LogicalSwitchState { state: "success".into() }),
                "ls-new" => Ok(LogicalSwitchState { state: "not_a_state".into() }),
                _ => Err(ApiError::Other("timeout".into())),
            }
        }
    }

    fn switch(id: &str) -> LogicalSwitch {
        LogicalSwitch {
            id: id.to_string(),
            display_name: id.to_uppercase(),
            transport_zone_id: "tz-1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_state_one_hot_and_unknown_state() {
        let api = Arc::new(MockSwitches {
            switches: vec![switch("ls-ok"), switch("ls-broken"), switch("ls-new")],
        });
        let collector = LogicalSwitchCollector::new(api, StructuredLogger::new(NAME)).unwrap();
        let (sink, mut rx) = SampleSink::channel();

        let stats = collector.collect(&sink).await.unwrap();
        drop(sink);

        let mut samples = Vec::new();
        while let Some(sample) = rx.recv().await {
            samples.push(sample);
        }

        assert_eq!(stats, CollectStats { objects: 2, skipped: 1 });
        assert_eq!(samples.len(), 2 * SwitchState::ALL.len());

        let ok_hot: Vec<&str> = samples
            .iter()
            .filter(|s| s.label("id") == Some("ls-ok") && s.value == 1.0)
            .map(|s| s.label("state").unwrap())
            .collect();
        assert_eq!(ok_hot, vec!["SUCCESS"]);

        // Unrecognized state exports as all zeros
        assert!(samples
            .iter()
            .filter(|s| s.label("id") == Some("ls-new"))
            .all(|s| s.value == 0.0));
        assert!(samples.iter().all(|s| s.label("transport_zone_id") == Some("tz-1")));
    }

    struct SwitchesDown;

    #[async_trait]
    impl LogicalSwitchApi for SwitchesDown {
        async fn list_logical_switches(&self, _cursor: &str) -> ApiResult<Page<LogicalSwitch>> {
            Err(ApiError::Status { status: 401, body: "unauthorized".into() })
        }

        async fn get_logical_switch_state(&self, _id: &str) -> ApiResult<LogicalSwitchState> {
            unreachable!("state fetched without switches")
        }
    }

    #[tokio::test]
    async fn test_switch_list_failure() {
        let collector =
            LogicalSwitchCollector::new(Arc::new(SwitchesDown), StructuredLogger::new(NAME)).unwrap();
        let (sink, mut rx) = SampleSink::channel();

        let result = collector.collect(&sink).await;
        drop(sink);

        assert!(matches!(
            result,
            Err(CollectError::List { object: "logical switches", .. })
        ));
        assert!(rx.recv().await.is_none());
    }
}
