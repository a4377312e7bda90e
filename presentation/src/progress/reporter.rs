//! Progress reporting for deliberations
//!
//! Both reporters implement [`EventSink`] and are driven by the
//! deliberation loop.

use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use panel_application::{DeliberationEvent, EventSink};
use std::io::Write;
use std::sync::Mutex;
use std::time::Duration;

/// Reports progress with a spinner per speaking participant
pub struct ProgressReporter {
    multi: MultiProgress,
    speaker: Mutex<Option<(ProgressBar, usize)>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            speaker: Mutex::new(None),
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {prefix:.bold} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn println(&self, line: String) {
        let _ = self.multi.println(line);
    }

    fn finish_speaker(&self, message: String) {
        if let Ok(mut speaker) = self.speaker.lock()
            && let Some((bar, _)) = speaker.take()
        {
            bar.finish_with_message(message);
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for ProgressReporter {
    fn emit(&self, _session_id: &str, event: &DeliberationEvent) {
        match event {
            DeliberationEvent::PhaseStart {
                phase,
                participants,
            } => self.println(format!(
                "{} {} ({} participants)",
                "->".cyan(),
                phase.display_name().bold(),
                participants
            )),
            DeliberationEvent::ParticipantStart {
                participant,
                round,
                attempt,
                ..
            } => {
                // A retry replaces the spinner of the failed attempt
                self.finish_speaker(format!("{}", "retrying".yellow()));
                let bar = self.multi.add(ProgressBar::new_spinner());
                bar.set_style(Self::spinner_style());
                bar.set_prefix(participant.to_string());
                let suffix = if *attempt > 1 {
                    format!(" (retry {})", attempt - 1)
                } else {
                    String::new()
                };
                bar.set_message(format!("round {}{}", round, suffix));
                bar.enable_steady_tick(Duration::from_millis(120));
                if let Ok(mut speaker) = self.speaker.lock() {
                    *speaker = Some((bar, 0));
                }
            }
            DeliberationEvent::Delta { chunk, .. } => {
                if let Ok(mut speaker) = self.speaker.lock()
                    && let Some((bar, chars)) = speaker.as_mut()
                {
                    *chars += chunk.chars().count();
                    bar.set_message(format!("{} chars", chars));
                }
            }
            DeliberationEvent::ParticipantComplete { sequence, .. } => {
                self.finish_speaker(format!("{} #{}", "v".green(), sequence));
            }
            DeliberationEvent::PhaseComplete { phase, rounds } => self.println(format!(
                "   {} complete after {} round(s)",
                phase.display_name().green(),
                rounds
            )),
            DeliberationEvent::Converged {
                reason,
                rounds,
                risk_level,
            } => self.println(format!(
                "{} {} after {} rounds, gate: {}",
                "=>".green().bold(),
                reason.as_str(),
                rounds,
                risk_level.as_str().bold()
            )),
            DeliberationEvent::Error { message, .. } => {
                self.finish_speaker(format!("{}", "x".red()));
                self.println(format!("{} {}", "x".red().bold(), message));
            }
        }
    }
}

/// Simple text-based progress (no fancy UI) that streams participant output
pub struct StreamingProgress {
    at_line_start: Mutex<bool>,
}

impl StreamingProgress {
    pub fn new() -> Self {
        Self {
            at_line_start: Mutex::new(true),
        }
    }

    fn end_line(&self) {
        if let Ok(mut start) = self.at_line_start.lock() {
            if !*start {
                println!();
            }
            *start = true;
        }
    }
}

impl Default for StreamingProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for StreamingProgress {
    fn emit(&self, _session_id: &str, event: &DeliberationEvent) {
        match event {
            DeliberationEvent::PhaseStart { phase, .. } => {
                self.end_line();
                println!("\n{} {}", "==".cyan(), phase.display_name().cyan().bold());
            }
            DeliberationEvent::ParticipantStart {
                participant,
                attempt,
                ..
            } => {
                self.end_line();
                if *attempt > 1 {
                    println!("{}", "  (previous attempt failed, retrying)".yellow());
                }
                println!("{}", format!("[{}]", participant).yellow().bold());
            }
            DeliberationEvent::Delta { chunk, .. } => {
                print!("{}", chunk);
                let _ = std::io::stdout().flush();
                if let Ok(mut start) = self.at_line_start.lock() {
                    *start = chunk.ends_with('\n');
                }
            }
            DeliberationEvent::ParticipantComplete { .. } => self.end_line(),
            DeliberationEvent::PhaseComplete { .. } => {}
            DeliberationEvent::Converged { reason, rounds, .. } => {
                self.end_line();
                println!(
                    "\n{} {} after {} rounds",
                    "=>".green().bold(),
                    reason.as_str(),
                    rounds
                );
            }
            DeliberationEvent::Error { message, .. } => {
                self.end_line();
                println!("{} {}", "x".red().bold(), message);
            }
        }
    }
}
