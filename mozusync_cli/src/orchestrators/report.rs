//! Event log and end-of-run summary

use crate::actions::ActionKind;
use crate::output::{Console, format_bytes, pluralize};
use mozusync_core::progress::{Phase, ProgressEvent, ProgressProvider};
use std::sync::Mutex;

/// Progress sink for one invocation
///
/// Every event is appended in emission order. `Before` events only reach the
/// debug log; the rest are printed as a table row for the action.
pub struct EventLog {
    action: ActionKind,
    console: Console,
    events: Mutex<Vec<ProgressEvent>>,
}

impl EventLog {
    pub fn new(action: ActionKind, console: Console) -> Self {
        Self {
            action,
            console,
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl ProgressProvider for EventLog {
    fn report(&self, event: ProgressEvent) {
        if event.phase == Phase::Before {
            log::debug!(
                "{} {}",
                self.action.present_tense(),
                serde_json::to_string(&event).unwrap_or_default()
            );
        } else {
            self.console.line(&self.action.logline(&event.data));
        }

        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

/// Sum of `size_in_bytes` over completed events
pub fn completed_bytes(events: &[ProgressEvent]) -> u64 {
    events
        .iter()
        .filter(|event| event.phase == Phase::Completed)
        .map(|event| event.data.size_in_bytes())
        .sum()
}

/// Summary lines: the completed tally, then one line per omission or
/// rejection reason in the order reasons first appeared
pub fn summarize(action: ActionKind, application_key: &str, events: &[ProgressEvent]) -> Vec<String> {
    let mut lines = Vec::new();

    let completed = events
        .iter()
        .filter(|event| event.phase == Phase::Completed)
        .count();
    if completed > 0 {
        let mut tally = format!(
            "{} {completed} {}",
            action.past_tense(),
            pluralize(completed, "file/files")
        );
        let bytes = completed_bytes(events);
        if bytes > 0 {
            tally.push_str(&format!(" for a total of {}", format_bytes(bytes)));
        }
        tally.push_str(&format!(" in application \"{application_key}\""));
        lines.push(tally);
    }

    for phase in [Phase::Omitted, Phase::Rejected] {
        let mut reasons: Vec<(Option<&str>, usize)> = Vec::new();
        for event in events.iter().filter(|event| event.phase == phase) {
            let reason = event.reason.as_deref();
            match reasons.iter_mut().find(|(seen, _)| *seen == reason) {
                Some((_, count)) => *count += 1,
                None => reasons.push((reason, 1)),
            }
        }

        for (reason, count) in reasons {
            let mut line = format!(
                "{count} {} {phase}",
                pluralize(count, "file was/files were")
            );
            if let Some(reason) = reason.filter(|r| !r.is_empty()) {
                line.push_str(&format!(" because {reason}"));
            }
            lines.push(line);
        }
    }

    lines
}
