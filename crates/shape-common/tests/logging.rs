//! Subscriber installation writes structured events and redacts cell values.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use shape_common::logging::{
    LogConfig, LogFormat, REDACTED_VALUE, init_logging_with_writer, redact_value,
};
use tracing_subscriber::fmt::MakeWriter;

#[derive(Clone, Default)]
struct BufferWriter {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl Write for BufferWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.lock().unwrap().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for BufferWriter {
    type Writer = BufferWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[test]
fn json_subscriber_captures_events_and_rejects_second_init() {
    let writer = BufferWriter::default();
    let config = LogConfig::from_verbosity(1).with_format(LogFormat::Json);
    init_logging_with_writer(&config, writer.clone()).expect("first init succeeds");

    tracing::info!(target: "shape_source", source_id = "demo", "source loaded");
    tracing::debug!(target: "some_other_crate", "filtered out");

    let output = String::from_utf8(writer.buf.lock().unwrap().clone()).unwrap();
    assert!(output.contains("source loaded"));
    assert!(output.contains("\"source_id\":\"demo\""));
    assert!(!output.contains("filtered out"));

    assert_eq!(redact_value("248153007"), REDACTED_VALUE);
    assert!(init_logging_with_writer(&config, writer).is_err());
}
