//! Desktop notifications.

use std::process::{Command, Stdio};

/// Title of every notification atool sends.
pub const NOTIFICATION_TITLE: &str = "atool";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub subtitle: Option<String>,
}

impl Notification {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            title: NOTIFICATION_TITLE.to_string(),
            message: message.into(),
            subtitle: None,
        }
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        let subtitle = subtitle.into();
        self.subtitle = (!subtitle.is_empty()).then_some(subtitle);
        self
    }
}

/// Sink for build notifications.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: &Notification);
}

/// Shows notifications through the desktop's notification service:
/// `osascript` on macOS, `notify-send` elsewhere. Delivery failures are
/// logged at debug level and otherwise ignored.
#[derive(Debug, Default, Clone, Copy)]
pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    fn notify(&self, notification: &Notification) {
        let mut command = desktop_command(notification);
        let spawned = command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        match spawned {
            // Reap the child off the build thread.
            Ok(mut child) => {
                std::thread::spawn(move || child.wait());
            }
            Err(e) => tracing::debug!("Desktop notification unavailable: {e}"),
        }
    }
}

fn desktop_command(notification: &Notification) -> Command {
    if cfg!(target_os = "macos") {
        let mut script = format!(
            "display notification {} with title {}",
            apple_quote(&notification.message),
            apple_quote(&notification.title)
        );
        if let Some(subtitle) = &notification.subtitle {
            script.push_str(&format!(" subtitle {}", apple_quote(subtitle)));
        }
        script.push_str(" sound name \"Glass\"");

        let mut command = Command::new("osascript");
        command.arg("-e").arg(script);
        command
    } else {
        let body = match &notification.subtitle {
            Some(subtitle) => format!("{}\n{}", notification.message, subtitle),
            None => notification.message.clone(),
        };
        let mut command = Command::new("notify-send");
        command.arg(&notification.title).arg(body);
        command
    }
}

fn apple_quote(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}
