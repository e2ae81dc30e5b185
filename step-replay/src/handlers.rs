// Replay handlers
//
// Applies each input message to the debugger session and reports the outcome.

use crate::protocol::*;
use step_engine::{DebuggerSession, SessionError, StepDecision};
use tracing::{debug, info, warn};

pub struct ReplayHandler {
    session: DebuggerSession,
}

impl ReplayHandler {
    pub fn new() -> Self {
        Self {
            session: DebuggerSession::new(),
        }
    }

    /// Handle one input message. Returns `None` for events that do not suspend.
    pub fn handle_message(&mut self, line: usize, message: ReplayMessage) -> Option<ReplayOutput> {
        let result = match message {
            ReplayMessage::Enable { elements } => self.session.set_source_elements(&elements),
            ReplayMessage::Step(request) => request
                .build()
                .map(|config| self.session.prepare_step(config))
                .map_err(SessionError::from),
            ReplayMessage::Cancel => self.session.cancel_step().map(|_| ()),
            ReplayMessage::Event(event) => {
                let count = self.session.active_step().map(|config| config.count());
                return match self.session.on_event(&event, event.anchor) {
                    StepDecision::Suspend => {
                        info!(line, location = ?event.location, "Suspended");
                        Some(ReplayOutput::Suspended {
                            line,
                            event,
                            count: count.unwrap_or(1),
                        })
                    }
                    decision => {
                        debug!(line, ?decision, "Event not suspending");
                        None
                    }
                };
            }
        };

        Some(match result {
            Ok(()) => ReplayOutput::Ok { line },
            Err(e) => {
                warn!(line, "Rejected: {}", e);
                ReplayOutput::Error {
                    line,
                    message: e.to_string(),
                }
            }
        })
    }

    /// Handle one raw input line
    pub fn handle_line(&mut self, line: usize, text: &str) -> Option<ReplayOutput> {
        match serde_json::from_str::<ReplayMessage>(text) {
            Ok(message) => self.handle_message(line, message),
            Err(e) => {
                warn!(line, "Parse error: {}", e);
                Some(ReplayOutput::Error {
                    line,
                    message: format!("Parse error: {}", e),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(handler: &mut ReplayHandler, lines: &[&str]) -> Vec<serde_json::Value> {
        lines
            .iter()
            .enumerate()
            .filter_map(|(i, text)| handler.handle_line(i + 1, text))
            .map(|out| serde_json::to_value(out).unwrap())
            .collect()
    }

    #[test]
    fn test_replay_step_over_statements() {
        let mut handler = ReplayHandler::new();
        let out = run(
            &mut handler,
            &[
                r#"{"type":"step","count":2}"#,
                r#"{"type":"event","tags":["expression"],"anchor":"before","location":"a:1"}"#,
                r#"{"type":"event","tags":["statement"],"anchor":"before","location":"a:2"}"#,
                r#"{"type":"event","tags":["statement"],"anchor":"before","location":"a:3"}"#,
                r#"{"type":"event","tags":["statement"],"anchor":"before","location":"a:4"}"#,
            ],
        );

        assert_eq!(out.len(), 2);
        assert_eq!(out[0]["type"], "ok");
        assert_eq!(out[1]["type"], "suspended");
        assert_eq!(out[1]["line"], 4);
        assert_eq!(out[1]["event"]["location"], "a:3");
        assert_eq!(out[1]["count"], 2);
    }

    #[test]
    fn test_replay_errors() {
        let mut handler = ReplayHandler::new();
        let out = run(
            &mut handler,
            &[
                r#"{"type":"cancel"}"#,
                r#"{"type":"step","count":-1}"#,
                r#"{"type":"enable","elements":[]}"#,
                "not json",
            ],
        );

        assert_eq!(out.len(), 4);
        assert!(out.iter().all(|o| o["type"] == "error"));
        assert_eq!(out[0]["message"], "No active step");
        assert_eq!(
            out[1]["message"],
            "Step request rejected: Invalid argument: Step count must be > 0"
        );
    }

    #[test]
    fn test_replay_tag_step() {
        let mut handler = ReplayHandler::new();
        let out = run(
            &mut handler,
            &[
                r#"{"type":"enable","elements":["statement","expression"]}"#,
                r#"{"type":"step","tag":{"name":"call","anchor":"after"}}"#,
                r#"{"type":"event","tags":["statement","call"],"anchor":"before"}"#,
                r#"{"type":"event","tags":["call"],"anchor":"after"}"#,
            ],
        );

        assert_eq!(out.len(), 3);
        assert_eq!(out[2]["type"], "suspended");
        assert_eq!(out[2]["line"], 4);
    }
}
