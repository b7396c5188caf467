//! Metric descriptors, samples and the shared scrape sink
//!
//! Collectors do not touch a Prometheus registry. They emit [`Sample`]s into a
//! [`SampleSink`] that every collector task of a scrape writes to concurrently,
//! and the samples are turned into metric families once the scrape is joined.

use prometheus::core::Desc;
use prometheus::proto::{Gauge, LabelPair, Metric, MetricFamily, MetricType};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Common prefix of every exported NSX-T metric
pub const NAMESPACE: &str = "nsxt";

/// Static description of a gauge a collector can emit
#[derive(Debug)]
pub struct MetricDesc {
    desc: Desc,
}

impl MetricDesc {
    /// Build a descriptor named `nsxt_<name>` with ordered variable labels.
    ///
    /// Fails when the name or one of the labels is not a valid Prometheus
    /// identifier.
    pub fn new(name: &str, help: &str, labels: &[&str]) -> prometheus::Result<Arc<Self>> {
        let desc = Desc::new(
            format!("{}_{}", NAMESPACE, name),
            help.to_string(),
            labels.iter().map(|l| l.to_string()).collect(),
            HashMap::new(),
        )?;
        Ok(Arc::new(Self { desc }))
    }

    pub fn fq_name(&self) -> &str {
        &self.desc.fq_name
    }

    pub fn help(&self) -> &str {
        &self.desc.help
    }

    pub fn labels(&self) -> &[String] {
        &self.desc.variable_labels
    }
}

/// A single gauge observation
#[derive(Debug, Clone)]
pub struct Sample {
    pub desc: Arc<MetricDesc>,
    pub value: f64,
    pub label_values: Vec<String>,
}

impl Sample {
    /// Value of the label called `name`, if the descriptor declares it.
    pub fn label(&self, name: &str) -> Option<&str> {
        self.desc
            .labels()
            .iter()
            .position(|l| l == name)
            .and_then(|i| self.label_values.get(i))
            .map(String::as_str)
    }
}

/// Concurrent write end of a scrape.
///
/// Cloned into every collector task; emitting never blocks.
#[derive(Debug, Clone)]
pub struct SampleSink {
    tx: mpsc::UnboundedSender<Sample>,
}

impl SampleSink {
    /// Create a sink and the receiver that drains it
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Sample>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Emit one gauge sample
    pub fn emit<S: AsRef<str>>(&self, desc: &Arc<MetricDesc>, value: f64, label_values: &[S]) {
        let sample = Sample {
            desc: Arc::clone(desc),
            value,
            label_values: label_values.iter().map(|v| v.as_ref().to_string()).collect(),
        };

        if self.tx.send(sample).is_err() {
            debug!(metric = %desc.fq_name(), "Scrape receiver dropped, discarding sample");
        }
    }

    /// Emit a boolean as 1.0 / 0.0
    pub fn emit_bool<S: AsRef<str>>(&self, desc: &Arc<MetricDesc>, value: bool, label_values: &[S]) {
        self.emit(desc, if value { 1.0 } else { 0.0 }, label_values);
    }

    /// Emit a one-hot status vector as one sample per vocabulary member.
    ///
    /// `label_values` are the identifying labels; the vocabulary member is
    /// appended as the last label value.
    pub fn emit_one_hot<V, S>(&self, desc: &Arc<MetricDesc>, one_hot: &[(V, f64)], label_values: &[S])
    where
        V: crate::status::StatusVocabulary,
        S: AsRef<str>,
    {
        for (member, value) in one_hot {
            let mut labels: Vec<&str> = label_values.iter().map(|v| v.as_ref()).collect();
            labels.push(member.as_str());
            self.emit(desc, *value, &labels);
        }
    }
}

/// Group samples into gauge metric families, in first-seen order.
///
/// Samples whose label cardinality does not match their descriptor are dropped.
pub fn encode(samples: &[Sample]) -> Vec<MetricFamily> {
    let mut families: Vec<MetricFamily> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for sample in samples {
        let labels = sample.desc.labels();
        if labels.len() != sample.label_values.len() {
            warn!(
                metric = %sample.desc.fq_name(),
                expected = labels.len(),
                actual = sample.label_values.len(),
                "Dropping sample with mismatched label cardinality"
            );
            continue;
        }

        let slot = *index.entry(sample.desc.fq_name()).or_insert_with(|| {
            let mut family = MetricFamily::default();
            family.set_name(sample.desc.fq_name().to_string());
            family.set_help(sample.desc.help().to_string());
            family.set_field_type(MetricType::GAUGE);
            families.push(family);
            families.len() - 1
        });

        let mut metric = Metric::default();
        for (name, value) in labels.iter().zip(&sample.label_values) {
            let mut pair = LabelPair::default();
            pair.set_name(name.clone());
            pair.set_value(value.clone());
            metric.mut_label().push(pair);
        }
        let mut gauge = Gauge::default();
        gauge.set_value(sample.value);
        metric.set_gauge(gauge);

        families[slot].mut_metric().push(metric);
    }

    families
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::{PortStatus, StatusVocabulary};

    #[test]
    fn test_desc_prefixes_namespace() {
        let desc = MetricDesc::new("logical_port_status", "help", &["id", "status"]).unwrap();
        assert_eq!(desc.fq_name(), "nsxt_logical_port_status");
        assert_eq!(desc.labels(), ["id".to_string(), "status".to_string()]);
    }

    #[test]
    fn test_desc_rejects_invalid_label() {
        assert!(MetricDesc::new("ok_name", "help", &["bad-label"]).is_err());
    }

    #[tokio::test]
    async fn test_sink_one_hot_appends_status_label() {
        let desc = MetricDesc::new("port_status", "help", &["id", "status"]).unwrap();
        let (sink, mut rx) = SampleSink::channel();

        sink.emit_one_hot(&desc, &PortStatus::one_hot("down"), &["p1"]);
        drop(sink);

        let mut samples = Vec::new();
        while let Some(sample) = rx.recv().await {
            samples.push(sample);
        }

        assert_eq!(samples.len(), 3);
        assert_eq!(samples[1].label("status"), Some("DOWN"));
        assert_eq!(samples[1].value, 1.0);
        assert_eq!(samples[0].value + samples[2].value, 0.0);
        assert!(samples.iter().all(|s| s.label("id") == Some("p1")));
    }

    #[test]
    fn test_encode_groups_by_descriptor() {
        let a = MetricDesc::new("a", "first", &["id"]).unwrap();
        let b = MetricDesc::new("b", "second", &[]).unwrap();
        let samples = vec![
            Sample { desc: a.clone(), value: 1.0, label_values: vec!["x".into()] },
            Sample { desc: b.clone(), value: 2.0, label_values: vec![] },
            Sample { desc: a.clone(), value: 3.0, label_values: vec!["y".into()] },
        ];

        let families = encode(&samples);

        assert_eq!(families.len(), 2);
        assert_eq!(families[0].get_name(), "nsxt_a");
        assert_eq!(families[0].get_metric().len(), 2);
        assert_eq!(families[0].get_metric()[1].get_gauge().get_value(), 3.0);
        assert_eq!(families[1].get_name(), "nsxt_b");
    }

    #[test]
    fn test_encode_drops_mismatched_labels() {
        let a = MetricDesc::new("a", "first", &["id", "name"]).unwrap();
        let samples = vec![Sample { desc: a, value: 1.0, label_values: vec!["x".into()] }];

        assert!(encode(&samples).is_empty());
    }
}
