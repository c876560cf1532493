//! Process-wide notification banner state. Peripheral to the record store:
//! just a state cell with explicit read/update and a quiet default, so any
//! frontend can surface failures without the core knowing how.

use std::sync::{LazyLock, RwLock};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub severity: Severity,
    pub message: String,
    pub visible: bool,
}

impl Notification {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            visible: true,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            message: message.into(),
            visible: true,
        }
    }
}

impl Default for Notification {
    fn default() -> Self {
        Self {
            severity: Severity::Info,
            message: String::new(),
            visible: false,
        }
    }
}

static GLOBAL: LazyLock<RwLock<Notification>> =
    LazyLock::new(|| RwLock::new(Notification::default()));

pub fn read() -> Notification {
    GLOBAL
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone()
}

pub fn update(notification: Notification) {
    *GLOBAL
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner()) = notification;
}

pub fn clear() {
    update(Notification::default());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_hidden_and_round_trips_updates() {
        clear();
        let initial = read();
        assert!(!initial.visible);
        assert_eq!(initial.message, "");

        update(Notification::error("storage failure"));
        let current = read();
        assert!(current.visible);
        assert_eq!(current.severity, Severity::Error);
        assert_eq!(current.message, "storage failure");

        clear();
        assert!(!read().visible);
    }
}
