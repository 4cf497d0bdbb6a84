use std::sync::{Arc, Mutex, OnceLock};

use super::*;

#[derive(Clone)]
struct SharedLogBuffer(Arc<Mutex<Vec<u8>>>);

struct SharedLogWriter(Arc<Mutex<Vec<u8>>>);

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for SharedLogBuffer {
    type Writer = SharedLogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        SharedLogWriter(Arc::clone(&self.0))
    }
}

impl std::io::Write for SharedLogWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Install a process-wide subscriber once and return its cleared buffer.
fn log_sink() -> SharedLogBuffer {
    static LOG_SINK: OnceLock<SharedLogBuffer> = OnceLock::new();
    let sink = LOG_SINK
        .get_or_init(|| {
            let sink = SharedLogBuffer(Arc::new(Mutex::new(Vec::new())));
            let subscriber = tracing_subscriber::fmt()
                .with_ansi(false)
                .without_time()
                .with_target(false)
                .with_max_level(tracing::Level::DEBUG)
                .with_writer(sink.clone())
                .finish();
            tracing::subscriber::set_global_default(subscriber)
                .expect("global test subscriber should initialize");
            tracing::callsite::rebuild_interest_cache();
            sink
        })
        .clone();
    sink.0.lock().unwrap().clear();
    sink
}

fn captured(sink: &SharedLogBuffer) -> String {
    String::from_utf8(sink.0.lock().unwrap().clone()).unwrap()
}

#[test]
#[serial_test::serial]
fn test_parse_logs_completion_counts() {
    let sink = log_sink();
    parse_str(END_TO_END).unwrap();

    let logs = captured(&sink);
    assert!(logs.contains("Complete"), "expected parse completion, logs: {logs}");
    assert!(logs.contains("groups=1"), "expected group count in logs: {logs}");
    assert!(logs.contains("rules=2"), "expected rule count in logs: {logs}");
    assert!(logs.contains("AddGroup"), "expected mutation events in logs: {logs}");
}

#[test]
#[serial_test::serial]
fn test_parse_failure_logs_line() {
    let sink = log_sink();
    parse_str("[groups]\n[myrepo:/trunk]\n@nosuchgroup = rw\n").unwrap_err();

    let logs = captured(&sink);
    assert!(logs.contains("WARN"), "expected a warning, logs: {logs}");
    assert!(logs.contains("Failed"), "expected parse failure event, logs: {logs}");
    assert!(logs.contains("line=3"), "expected failing line in logs: {logs}");
}

#[test]
#[serial_test::serial]
fn test_generate_logs_output_size() {
    let sink = log_sink();
    let doc = parse_str(END_TO_END).unwrap();
    let text = generate(&doc, Some(PREVIEW_WRAP_WIDTH));

    let logs = captured(&sink);
    assert!(
        logs.contains(&format!("bytes={}", text.len())),
        "expected generated size in logs: {logs}"
    );
    assert!(logs.contains("wrapped=true"), "expected wrap flag in logs: {logs}");
}
