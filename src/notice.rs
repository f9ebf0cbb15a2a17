use indicatif::MultiProgress;
use log::{info, warn};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Failure,
}

/// A user-visible message, the client's only "exit code".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Failure,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = match self.level {
            NoticeLevel::Success => "✔",
            NoticeLevel::Info => "ℹ",
            NoticeLevel::Failure => "✘",
        };
        write!(f, "{} {}", marker, self.message)
    }
}

pub trait NoticeSink: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Prints notices for the terminal user and mirrors them to the log.
///
/// Output goes through `progress` so a ticking spinner is cleared first
/// and redrawn below the message.
pub struct ConsoleNotices {
    progress: MultiProgress,
}

impl ConsoleNotices {
    pub fn new(progress: MultiProgress) -> Self {
        Self { progress }
    }
}

impl NoticeSink for ConsoleNotices {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Failure => {
                warn!("{}", notice.message);
                self.progress.suspend(|| eprintln!("{}", notice));
            }
            NoticeLevel::Success | NoticeLevel::Info => {
                info!("{}", notice.message);
                self.progress.suspend(|| println!("{}", notice));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::with_spinner;
    use indicatif::ProgressDrawTarget;

    #[test]
    fn test_notice_display() {
        assert_eq!(Notice::success("Rating submitted!").to_string(), "✔ Rating submitted!");
        assert_eq!(Notice::failure("Failed").to_string(), "✘ Failed");
    }

    #[tokio::test]
    async fn test_console_notices_print_while_spinner_runs() {
        let progress = MultiProgress::with_draw_target(ProgressDrawTarget::hidden());
        let notices = ConsoleNotices::new(progress.clone());

        let value = with_spinner(&progress, "loading", async {
            notices.notify(Notice::failure("Failed to load sighting"));
            notices.notify(Notice::info("Please enable location first"));
            7
        })
        .await;

        assert_eq!(value, 7);
    }
}
