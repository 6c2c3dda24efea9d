use std::cell::RefCell;

/// Side channel for soft data problems. Chart builders report here and
/// return "no chart" instead of failing the whole render cycle.
pub trait Notifier {
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
}

/// Forwards reports to the tracing subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn warn(&self, message: &str) {
        tracing::warn!("{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!("{}", message);
    }
}

/// Collects reports in memory so callers can inspect what was raised.
#[derive(Debug, Default)]
pub struct BufferNotifier {
    warnings: RefCell<Vec<String>>,
    errors: RefCell<Vec<String>>,
}

impl BufferNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.warnings.borrow().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.borrow().clone()
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.borrow().is_empty() && self.errors.borrow().is_empty()
    }
}

impl Notifier for BufferNotifier {
    fn warn(&self, message: &str) {
        self.warnings.borrow_mut().push(message.to_string());
    }

    fn error(&self, message: &str) {
        self.errors.borrow_mut().push(message.to_string());
    }
}
