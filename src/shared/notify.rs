/// Sink for user-facing error messages.
///
/// Fire-and-forget: nothing is returned and a failing sink must not
/// affect the caller.
pub trait Notifier: Send + Sync {
    fn report_error(&self, message: &str);
}

/// Routes notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn report_error(&self, message: &str) {
        log::error!("[Alert] {}", message);
    }
}
