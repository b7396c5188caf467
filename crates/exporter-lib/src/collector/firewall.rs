//! Distributed firewall rule statistics
//!
//! Three levels: sections, the rules of each section and the stats of each
//! rule. Listing sections is the family's list call; a failure to list one
//! section's rules skips that section, a failure to read one rule's stats
//! skips that rule.

use super::{join_details, list_failed, CollectStats, Collector};
use crate::client::FirewallApi;
use crate::error::CollectError;
use crate::metrics::{MetricDesc, SampleSink};
use crate::models::{FirewallRule, FirewallRuleStats, FirewallSection};
use crate::observability::StructuredLogger;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

pub const NAME: &str = "firewall";

const RULE_LABELS: &[&str] = &["id", "name", "section_id"];

pub struct FirewallCollector<A: ?Sized> {
    api: Arc<A>,
    logger: StructuredLogger,
    section_rules: Arc<MetricDesc>,
    rule_packets: Arc<MetricDesc>,
    rule_bytes: Arc<MetricDesc>,
    rule_sessions: Arc<MetricDesc>,
    rule_hits: Arc<MetricDesc>,
}

impl<A: FirewallApi + ?Sized + 'static> FirewallCollector<A> {
    pub fn new(api: Arc<A>, logger: StructuredLogger) -> Result<Self> {
        Ok(Self {
            api,
            logger,
            section_rules: MetricDesc::new(
                "firewall_section_rules",
                "Number of rules in the firewall section",
                &["id", "name"],
            )?,
            rule_packets: MetricDesc::new(
                "firewall_rule_packets",
                "Packets matched by the firewall rule",
                RULE_LABELS,
            )?,
            rule_bytes: MetricDesc::new(
                "firewall_rule_bytes",
                "Bytes matched by the firewall rule",
                RULE_LABELS,
            )?,
            rule_sessions: MetricDesc::new(
                "firewall_rule_sessions",
                "Sessions handled by the firewall rule",
                RULE_LABELS,
            )?,
            rule_hits: MetricDesc::new(
                "firewall_rule_hits",
                "Hit count of the firewall rule",
                RULE_LABELS,
            )?,
        })
    }

    pub fn factory(api: Arc<A>, logger: StructuredLogger) -> Result<Box<dyn Collector>> {
        Ok(Box::new(Self::new(api, logger)?))
    }

    async fn collect_section(&self, sink: &SampleSink, section: &FirewallSection) -> CollectStats {
        let api = &self.api;

        let rules = match api.list_firewall_rules(&section.id).await {
            Ok(rules) => rules,
            Err(e) => {
                self.logger
                    .log_status_failure("firewall section rules", &section.id, &e);
                return CollectStats { objects: 0, skipped: 1 };
            }
        };

        sink.emit(
            &self.section_rules,
            section.rule_count as f64,
            &[&section.id, &section.display_name],
        );

        let section_id = section.id.as_str();
        join_details(
            &self.logger,
            "firewall rule",
            &rules,
            |rule| rule.id.as_str(),
            |rule_id| async move { api.get_firewall_rule_stats(section_id, &rule_id).await },
            |rule: &FirewallRule, stats: FirewallRuleStats| {
                let labels = [rule.id.as_str(), rule.display_name.as_str(), section_id];
                sink.emit(&self.rule_packets, stats.packet_count as f64, &labels);
                sink.emit(&self.rule_bytes, stats.byte_count as f64, &labels);
                sink.emit(&self.rule_sessions, stats.session_count as f64, &labels);
                sink.emit(&self.rule_hits, stats.hit_count as f64, &labels);
            },
        )
        .await
    }
}

#[async_trait]
impl<A: FirewallApi + ?Sized + 'static> Collector for FirewallCollector<A> {
    fn describe(&self) -> Vec<Arc<MetricDesc>> {
        vec![
            self.section_rules.clone(),
            self.rule_packets.clone(),
            self.rule_bytes.clone(),
            self.rule_sessions.clone(),
            self.rule_hits.clone(),
        ]
    }

    async fn collect(&self, sink: &SampleSink) -> Result<CollectStats, CollectError> {
        let sections = self
            .api
            .list_firewall_sections()
            .await
            .map_err(|e| list_failed(&self.logger, "firewall sections", e))?;

        let mut stats = CollectStats::default();
        for section in &sections {
            stats.merge(self.collect_section(sink, section).await);
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ApiError, ApiResult};
    use crate::metrics::Sample;

    struct MockFirewall;

    #[async_trait]
    impl FirewallApi for MockFirewall {
        async fn list_firewall_sections(&self) -> ApiResult<Vec<FirewallSection>> {
            Ok(vec![
                FirewallSection { id: "s1".into(), display_name: "default".into(), rule_count: 2 },
                FirewallSection { id: "s2".into(), display_name: "locked".into(), rule_count: 5 },
            ])
        }

        async fn list_firewall_rules(&self, section_id: &str) -> ApiResult<Vec<FirewallRule>> {
            match section_id {
                "s1" => Ok(vec![
                    FirewallRule { id: "r1".into(), display_name: "allow-web".into() },
                    FirewallRule { id: "r2".into(), display_name: "deny-all".into() },
                ]),
                _ => Err(ApiError::Status { status: 403, body: "locked".into() }),
            }
        }

        async fn get_firewall_rule_stats(
            &self,
            section_id: &str,
            rule_id: &str,
        ) -> ApiResult<FirewallRuleStats> {
            assert_eq!(section_id, "s1");
            match rule_id {
                "r1" => Ok(FirewallRuleStats { packet_count: 10, byte_count: 2048, session_count: 3, hit_count: 4 }),
                _ => Err(ApiError::Other("stats unavailable".into())),
            }
        }
    }

    async fn collect_all() -> (CollectStats, Vec<Sample>) {
        let collector =
            FirewallCollector::new(Arc::new(MockFirewall), StructuredLogger::new(NAME)).unwrap();
        let (sink, mut rx) = SampleSink::channel();
        let stats = collector.collect(&sink).await.unwrap();
        drop(sink);

        let mut samples = Vec::new();
        while let Some(sample) = rx.recv().await {
            samples.push(sample);
        }
        (stats, samples)
    }

    #[tokio::test]
    async fn test_skips_locked_section_and_failed_rule() {
        let (stats, samples) = collect_all().await;

        // r1 emitted; r2 and section s2 skipped
        assert_eq!(stats, CollectStats { objects: 1, skipped: 2 });

        let sections: Vec<&Sample> = samples
            .iter()
            .filter(|s| s.desc.fq_name() == "nsxt_firewall_section_rules")
            .collect();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].label("id"), Some("s1"));
        assert_eq!(sections[0].value, 2.0);

        let rule_samples: Vec<&Sample> = samples
            .iter()
            .filter(|s| s.desc.fq_name().starts_with("nsxt_firewall_rule_"))
            .collect();
        assert_eq!(rule_samples.len(), 4);
        assert!(rule_samples.iter().all(|s| s.label("id") == Some("r1")));
        assert!(rule_samples.iter().all(|s| s.label("section_id") == Some("s1")));
    }

    #[tokio::test]
    async fn test_rule_counter_values() {
        let (_, samples) = collect_all().await;

        let value = |metric: &str| {
            samples
                .iter()
                .find(|s| s.desc.fq_name() == metric)
                .map(|s| s.value)
        };
        assert_eq!(value("nsxt_firewall_rule_packets"), Some(10.0));
        assert_eq!(value("nsxt_firewall_rule_bytes"), Some(2048.0));
        assert_eq!(value("nsxt_firewall_rule_sessions"), Some(3.0));
        assert_eq!(value("nsxt_firewall_rule_hits"), Some(4.0));
    }

    struct SectionsDown;

    #[async_trait]
    impl FirewallApi for SectionsDown {
        async fn list_firewall_sections(&self) -> ApiResult<Vec<FirewallSection>> {
            Err(ApiError::Status { status: 503, body: "unavailable".into() })
        }

        async fn list_firewall_rules(&self, _section_id: &str) -> ApiResult<Vec<FirewallRule>> {
            unreachable!("rules listed without sections")
        }

        async fn get_firewall_rule_stats(
            &self,
            _section_id: &str,
            _rule_id: &str,
        ) -> ApiResult<FirewallRuleStats> {
            unreachable!("stats fetched without sections")
        }
    }

    #[tokio::test]
    async fn test_section_list_failure() {
        let collector =
            FirewallCollector::new(Arc::new(SectionsDown), StructuredLogger::new(NAME)).unwrap();
        let (sink, mut rx) = SampleSink::channel();

        let result = collector.collect(&sink).await;
        drop(sink);

        assert!(matches!(
            result,
            Err(CollectError::List { object: "firewall sections", .. })
        ));
        assert!(rx.recv().await.is_none());
    }
}
