use std::collections::VecDeque;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub level: Level,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Notification {
            level: Level::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Notification {
            level: Level::Error,
            message: message.into(),
        }
    }
}

/// The parent view a task card reports to.
pub trait Feedback {
    fn notify(&mut self, notification: Notification);

    /// Asks the parent to refetch the checklist.
    fn request_refresh(&mut self);
}

const MAX_TOASTS: usize = 5;

/// Toast queue and pending-refresh flag owned by the app.
#[derive(Debug, Default)]
pub struct Inbox {
    toasts: VecDeque<Notification>,
    refresh_pending: bool,
}

impl Inbox {
    pub fn latest(&self) -> Option<&Notification> {
        self.toasts.back()
    }

    pub fn take_refresh(&mut self) -> bool {
        std::mem::take(&mut self.refresh_pending)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.toasts.len()
    }
}

impl Feedback for Inbox {
    fn notify(&mut self, notification: Notification) {
        if self.toasts.len() == MAX_TOASTS {
            self.toasts.pop_front();
        }
        self.toasts.push_back(notification);
    }

    fn request_refresh(&mut self) {
        self.refresh_pending = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inbox_keeps_latest_toasts() {
        let mut inbox = Inbox::default();
        for i in 0..7 {
            inbox.notify(Notification::success(format!("toast {}", i)));
        }
        assert_eq!(inbox.len(), MAX_TOASTS);
        assert_eq!(inbox.latest().unwrap().message, "toast 6");
    }

    #[test]
    fn test_refresh_flag_is_consumed() {
        let mut inbox = Inbox::default();
        assert!(!inbox.take_refresh());
        inbox.request_refresh();
        assert!(inbox.take_refresh());
        assert!(!inbox.take_refresh());
    }
}
