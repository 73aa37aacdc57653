// src/app.rs

use ratatui::widgets::{ListState, ScrollbarState};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use shadowrecon::core::attack_surface::AttackSurface;
use shadowrecon::core::cancel::CancelHandle;
use shadowrecon::core::engine::ScanEvent;
use shadowrecon::core::models::{Phase, PhaseStatus, ScanResults, Severity, Vulnerability};

pub const SPINNER_CHARS: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
const MAX_LOG_LINES: usize = 200;
const MAX_PROGRESS_LINES: usize = 50;

pub enum AppState {
    Disclaimer,
    Idle,
    Scanning,
    Finished,
}

#[derive(Debug, Default)]
pub struct ScanSummary {
    pub score: u32,
    pub critical_issues: usize,
    pub high_issues: usize,
    pub medium_issues: usize,
    pub findings: usize,
    pub targets: usize,
    pub failed_phases: usize,
}

pub struct App {
    pub should_quit: bool,
    pub state: AppState,
    pub input: String,
    pub results: Vec<ScanResults>,
    pub summary: ScanSummary,
    /// Displayed score, animated towards `summary.score`.
    pub displayed_score: u32,
    pub progress: Vec<String>,
    pub current_phase: Option<(String, Phase)>,
    pub error: Option<String>,
    pub cancel: Option<CancelHandle>,
    /// Set when the user quit mid-scan; the app exits once the batch reports.
    pub quit_when_done: bool,
    pub spinner_frame: usize,
    pub scroll_offset: usize,
    pub report_scroll_state: ScrollbarState,
    pub vulnerability_list_state: ListState,
    pub show_logs: bool,
    pub log_path: Option<PathBuf>,
    pub log_content: Vec<String>,
    pub log_horizontal_scroll: usize,
    pub log_horizontal_scroll_state: ScrollbarState,
}

impl App {
    pub fn new(log_path: Option<PathBuf>) -> Self {
        Self {
            should_quit: false,
            state: AppState::Disclaimer,
            input: String::new(),
            results: Vec::new(),
            summary: ScanSummary::default(),
            displayed_score: 0,
            progress: Vec::new(),
            current_phase: None,
            error: None,
            cancel: None,
            quit_when_done: false,
            spinner_frame: 0,
            scroll_offset: 0,
            report_scroll_state: ScrollbarState::default(),
            vulnerability_list_state: ListState::default(),
            show_logs: false,
            log_path,
            log_content: Vec::new(),
            log_horizontal_scroll: 0,
            log_horizontal_scroll_state: ScrollbarState::default(),
        }
    }

    /// The comma-separated targets typed by the user, trimmed and without blanks.
    pub fn targets(&self) -> Vec<String> {
        self.input.split(',').map(str::trim).filter(|t| !t.is_empty()).map(str::to_string).collect()
    }

    pub fn vulnerabilities(&self) -> Vec<&Vulnerability> {
        self.results.iter().flat_map(|r| r.vulnerabilities.iter()).collect()
    }

    pub fn scroll_up(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(1);
        self.report_scroll_state = self.report_scroll_state.position(self.scroll_offset);
    }

    pub fn scroll_down(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_add(1);
        self.report_scroll_state = self.report_scroll_state.position(self.scroll_offset);
    }

    pub fn select_next(&mut self) {
        let total = self.vulnerabilities().len();
        if total == 0 {
            return;
        }
        let next = self.vulnerability_list_state.selected().map_or(0, |i| (i + 1) % total);
        self.vulnerability_list_state.select(Some(next));
    }

    pub fn select_previous(&mut self) {
        let total = self.vulnerabilities().len();
        if total == 0 {
            return;
        }
        let previous = self.vulnerability_list_state.selected().map_or(0, |i| (i + total - 1) % total);
        self.vulnerability_list_state.select(Some(previous));
    }

    pub fn scroll_logs_left(&mut self) {
        self.log_horizontal_scroll = self.log_horizontal_scroll.saturating_sub(4);
        self.log_horizontal_scroll_state = self.log_horizontal_scroll_state.position(self.log_horizontal_scroll);
    }

    pub fn scroll_logs_right(&mut self) {
        self.log_horizontal_scroll = self.log_horizontal_scroll.saturating_add(4);
        self.log_horizontal_scroll_state = self.log_horizontal_scroll_state.position(self.log_horizontal_scroll);
    }

    /// Folds a progress event into the display state.
    pub fn on_scan_event(&mut self, event: ScanEvent) {
        let line = match event {
            ScanEvent::TargetStarted { target, index, total } => format!("[{}/{}] {}", index + 1, total, target),
            ScanEvent::PhaseStarted { target, phase } => {
                self.current_phase = Some((target, phase));
                return;
            }
            ScanEvent::PhaseFinished { phase, status, .. } => match status {
                PhaseStatus::Completed => format!("  ✓ {phase}"),
                PhaseStatus::Skipped(reason) => format!("  - {phase} ({reason})"),
                PhaseStatus::Failed(reason) => format!("  ✗ {phase}: {reason}"),
            },
            ScanEvent::Finished(results) => {
                let line = match &results.metadata.fatal_error {
                    Some(error) => format!("  ✗ {}: {error}", results.target),
                    None => format!("  {} findings for {}", results.finding_count(), results.target),
                };
                self.results.push(*results);
                self.update_summary();
                line
            }
        };
        self.progress.push(line);
        if self.progress.len() > MAX_PROGRESS_LINES {
            self.progress.remove(0);
        }
    }

    /// Marks the batch finished.
    pub fn on_scan_complete(&mut self) {
        self.state = AppState::Finished;
        self.current_phase = None;
        self.cancel = None;
        self.update_summary();
        if self.quit_when_done {
            self.should_quit = true;
        }
    }

    pub fn request_cancel(&mut self) {
        if let Some(cancel) = &self.cancel {
            cancel.cancel();
            self.progress.push("  Cancelling, waiting for in-flight probes...".to_string());
        }
    }

    pub fn update_summary(&mut self) {
        let count = |severity| self.results.iter().map(|r| r.count_by_severity(severity)).sum::<usize>();
        let score = self
            .results
            .iter()
            .map(|r| r.attack_surface.as_ref().map_or(0, |surface: &AttackSurface| surface.exposure_score(r)))
            .max()
            .unwrap_or(0);
        let failed_phases = self
            .results
            .iter()
            .flat_map(|r| r.metadata.phases.iter())
            .filter(|record| matches!(record.status, PhaseStatus::Failed(_)))
            .count();
        self.summary = ScanSummary {
            score,
            critical_issues: count(Severity::Critical),
            high_issues: count(Severity::High),
            medium_issues: count(Severity::Medium),
            findings: self.results.iter().map(ScanResults::finding_count).sum(),
            targets: self.results.len(),
            failed_phases,
        };
    }

    pub fn on_tick(&mut self) {
        if matches!(self.state, AppState::Scanning) {
            self.spinner_frame = (self.spinner_frame + 1) % SPINNER_CHARS.len();
        }
        if self.displayed_score < self.summary.score {
            self.displayed_score += 1;
        } else if self.displayed_score > self.summary.score {
            self.displayed_score = self.summary.score;
        }
        if self.show_logs {
            self.refresh_logs();
        }
    }

    fn refresh_logs(&mut self) {
        let Some(path) = &self.log_path else {
            return;
        };
        let Ok(file) = File::open(path) else {
            return;
        };
        let lines: Vec<String> = BufReader::new(file).lines().map_while(Result::ok).collect();
        let start = lines.len().saturating_sub(MAX_LOG_LINES);
        self.log_content = lines[start..].to_vec();
    }

    /// Cancels the running batch and quits once its partial results are
    /// reported. A second request quits immediately.
    pub fn quit_after_scan(&mut self) {
        if self.quit_when_done || self.cancel.is_none() {
            self.quit();
            return;
        }
        self.request_cancel();
        self.quit_when_done = true;
        self.progress.push("  Quitting after the report is written...".to_string());
    }

    pub fn quit(&mut self) {
        if let Some(cancel) = &self.cancel {
            cancel.cancel();
        }
        self.should_quit = true;
    }

    pub fn reset(&mut self) {
        self.state = AppState::Idle;
        self.input = String::new();
        self.results.clear();
        self.summary = ScanSummary::default();
        self.displayed_score = 0;
        self.progress.clear();
        self.current_phase = None;
        self.error = None;
        self.cancel = None;
        self.scroll_offset = 0;
        self.report_scroll_state = ScrollbarState::default();
        self.vulnerability_list_state = ListState::default();
    }
}
