// bndl/src/cli/status.rs
//! Renders installer events on the terminal.
use bndl_common::events::{EventLevel, InstallEvent, Notifier, SkipReason};
use colored::Colorize;

#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, event: InstallEvent) {
        tracing::debug!("Installer event: {:?}", event);
        match (&event, event.level()) {
            (_, EventLevel::Warn) => eprintln!("{} {}", "Warning:".yellow().bold(), event),
            (_, EventLevel::Confirm) => println!("{}", event.to_string().green().bold()),
            (InstallEvent::ResolutionStarted, _) | (InstallEvent::IndexFetchStarted { .. }, _) => {
                println!("{}", event.to_string().cyan())
            }
            (InstallEvent::InstallStarted { .. }, _) => {
                println!("{}{}", "==> ".bold().blue(), event)
            }
            (
                InstallEvent::InstallSkipped {
                    reason: SkipReason::ExcludedGroups { .. },
                    ..
                },
                _,
            ) => println!("{}", event.to_string().dimmed()),
            _ => println!("{event}"),
        }
    }
}
