use serde_json::Value;

/// Diagnostics sink handed in by the embedding application.
///
/// Logging never gates control flow: implementations may drop anything.
pub trait BasicLogger {
    fn log_event(&self, name: &str, props: &Value);
    fn log_warning(&self, message: &str, props: Option<&Value>);
}

/// Forwards everything to the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogLogger;

impl BasicLogger for LogLogger {
    fn log_event(&self, name: &str, props: &Value) {
        log::info!(target: "cord_locator::event", "{name} {props}");
    }

    fn log_warning(&self, message: &str, props: Option<&Value>) {
        match props {
            Some(props) => log::warn!(target: "cord_locator::warning", "{message} {props}"),
            None => log::warn!(target: "cord_locator::warning", "{message}"),
        }
    }
}
