//! Elasticsearch bulk-format sink
//!
//! Each record becomes a bulk `index` action line followed by a document
//! line. The document is built from the structured record carried with the
//! write, never from the wire line.

use super::transport::{parse_endpoint, NetworkTransport};
use crate::config::FieldMapping;
use crate::core::{LogContext, Result, Sink, WriteMeta};
use chrono::SecondsFormat;
use serde_json::{json, Map, Value};

pub struct ElasticSink {
    index_name: String,
    doc_type: String,
    fields: Vec<FieldMapping>,
    transport: NetworkTransport,
}

impl ElasticSink {
    pub fn new(
        uri: &str,
        index_name: impl Into<String>,
        doc_type: impl Into<String>,
        fields: Vec<FieldMapping>,
    ) -> Result<Self> {
        let address = parse_endpoint(uri)?;
        Ok(Self {
            index_name: index_name.into(),
            doc_type: doc_type.into(),
            fields,
            transport: NetworkTransport::new(address),
        })
    }

    /// Bulk action line for one document
    pub fn action_line(&self) -> String {
        json!({ "index": { "_index": self.index_name, "_type": self.doc_type } }).to_string()
    }

    /// Document for the record carried by `meta`
    pub fn document(&self, meta: &WriteMeta) -> Value {
        let record = &meta.record;
        let mut source = record.structured_fields();
        source.add_field("level", meta.level.to_str());
        source.add_field("time", record.wire_time());
        if let Some(ref message) = meta.message {
            source.add_field(meta.logger.message_key(), message.as_str());
        }
        source.merge_missing(meta.logger.bindings());

        let mut doc = Map::new();
        doc.insert(
            "@timestamp".to_string(),
            Value::String(record.time.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        for mapping in &self.fields {
            if let Some(value) = lookup(&source, &mapping.value_index) {
                doc.insert(mapping.field_name.clone(), value);
            }
        }
        Value::Object(doc)
    }
}

fn lookup(source: &LogContext, key: &str) -> Option<Value> {
    source.get(key).map(|value| value.to_json_value())
}

impl Sink for ElasticSink {
    fn write(&mut self, _chunk: &str, meta: &WriteMeta) -> Result<()> {
        let doc = self.document(meta);
        self.transport
            .send(format!("{}\n{}\n", self.action_line(), doc))
    }

    fn flush(&mut self) -> Result<()> {
        self.transport.flush()
    }

    fn name(&self) -> &str {
        "elastic"
    }
}
