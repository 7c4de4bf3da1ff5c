//! Terminal typewriter
//!
//! Reveals a fixed script one character at a time. The sequencer never
//! sleeps or owns a timer: every transition returns the delay the caller
//! should wait before the next `tick`, so tests can run it with no clock.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::lerp;
use crate::settings::TypewriterConfig;

/// Presentation class of a line (does not affect sequencing)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Command,
    Log,
    Success,
    /// Command prompt with a blinking cursor
    BlinkingCommand,
}

/// A scripted line and how much of it is showing
#[derive(Debug, Clone, PartialEq)]
pub struct TerminalLine {
    pub text: String,
    pub kind: LineKind,
    revealed_chars: u32,
}

impl TerminalLine {
    pub fn new(text: &str, kind: LineKind) -> Self {
        Self {
            text: text.to_string(),
            kind,
            revealed_chars: 0,
        }
    }

    pub fn revealed_chars(&self) -> u32 {
        self.revealed_chars
    }

    pub fn char_count(&self) -> u32 {
        self.text.chars().count() as u32
    }

    pub fn is_complete(&self) -> bool {
        self.revealed_chars >= self.char_count()
    }

    /// The revealed prefix
    pub fn visible_text(&self) -> &str {
        match self.text.char_indices().nth(self.revealed_chars as usize) {
            Some((end, _)) => &self.text[..end],
            None => &self.text,
        }
    }
}

/// Where the sequencer is in the script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerPhase {
    /// Not triggered yet
    Idle,
    /// Typing the current line
    Revealing,
    /// Pausing after a finished line
    Advancing,
    /// Script finished; nothing more will be scheduled
    Done,
}

/// Result of one transition
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TypeStep {
    /// Line whose visible text changed
    pub line: Option<usize>,
    /// Wait this long (ms) before the next tick; None = stop scheduling
    pub next_delay: Option<f64>,
}

/// The typewriter state machine
#[derive(Debug, Clone)]
pub struct TypewriterSequencer {
    lines: Vec<TerminalLine>,
    phase: SequencerPhase,
    line_index: usize,
    config: TypewriterConfig,
    rng: Pcg32,
}

impl TypewriterSequencer {
    pub fn new(lines: Vec<TerminalLine>, config: TypewriterConfig, seed: u64) -> Self {
        Self {
            lines,
            phase: SequencerPhase::Idle,
            line_index: 0,
            config,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn phase(&self) -> SequencerPhase {
        self.phase
    }

    pub fn lines(&self) -> &[TerminalLine] {
        &self.lines
    }

    pub fn line_index(&self) -> usize {
        self.line_index
    }

    pub fn is_done(&self) -> bool {
        self.phase == SequencerPhase::Done
    }

    /// Begin typing; only the first call does anything
    pub fn start(&mut self) -> TypeStep {
        if self.phase != SequencerPhase::Idle {
            log::debug!("Typewriter already started ({:?}), ignoring trigger", self.phase);
            return TypeStep::default();
        }

        self.line_index = 0;
        if self.lines.is_empty() {
            self.phase = SequencerPhase::Done;
            return TypeStep::default();
        }

        log::info!("Typewriter started ({} lines)", self.lines.len());
        self.phase = SequencerPhase::Revealing;
        self.reveal_next_char()
    }

    /// Run the transition that was scheduled by the previous step
    pub fn tick(&mut self) -> TypeStep {
        match self.phase {
            SequencerPhase::Idle | SequencerPhase::Done => TypeStep::default(),
            SequencerPhase::Revealing => self.reveal_next_char(),
            SequencerPhase::Advancing => {
                self.line_index += 1;
                if self.line_index >= self.lines.len() {
                    self.phase = SequencerPhase::Done;
                    log::info!("Typewriter finished");
                    TypeStep::default()
                } else {
                    self.phase = SequencerPhase::Revealing;
                    self.reveal_next_char()
                }
            }
        }
    }

    fn reveal_next_char(&mut self) -> TypeStep {
        let index = self.line_index;
        let line = &mut self.lines[index];

        if line.is_complete() {
            self.phase = SequencerPhase::Advancing;
            return TypeStep {
                line: None,
                next_delay: Some(self.config.line_pause_ms),
            };
        }

        line.revealed_chars += 1;
        TypeStep {
            line: Some(index),
            next_delay: Some(self.char_delay()),
        }
    }

    /// Uniform in [min_delay, max_delay)
    fn char_delay(&mut self) -> f64 {
        lerp(
            self.config.min_delay_ms,
            self.config.max_delay_ms,
            self.rng.random::<f64>(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sequencer(lines: &[(&str, LineKind)]) -> TypewriterSequencer {
        let lines = lines.iter().map(|(t, k)| TerminalLine::new(t, *k)).collect();
        TypewriterSequencer::new(lines, TypewriterConfig::default(), 42)
    }

    /// Tick until nothing more is scheduled; returns the delays seen
    fn run_to_end(seq: &mut TypewriterSequencer, first: TypeStep) -> Vec<f64> {
        let mut delays = Vec::new();
        let mut step = first;
        while let Some(delay) = step.next_delay {
            delays.push(delay);
            step = seq.tick();
            assert!(delays.len() < 10_000, "sequencer never finished");
        }
        delays
    }

    #[test]
    fn test_single_line_completes() {
        let mut seq = sequencer(&[("AB", LineKind::Command)]);
        assert_eq!(seq.phase(), SequencerPhase::Idle);

        let first = seq.start();
        assert_eq!(first.line, Some(0));
        assert_eq!(seq.lines()[0].visible_text(), "A");

        let delays = run_to_end(&mut seq, first);
        assert_eq!(seq.phase(), SequencerPhase::Done);
        assert_eq!(seq.lines()[0].revealed_chars(), 2);
        // A, B, then the line pause
        assert_eq!(delays.len(), 3);
        assert_eq!(delays[2], 200.0);
    }

    #[test]
    fn test_start_is_idempotent() {
        let mut seq = sequencer(&[("AB", LineKind::Command)]);
        let first = seq.start();
        let again = seq.start();
        assert_eq!(again, TypeStep::default());
        assert_eq!(seq.lines()[0].revealed_chars(), 1);

        run_to_end(&mut seq, first);
        assert_eq!(seq.lines()[0].revealed_chars(), 2);
        assert_eq!(seq.start(), TypeStep::default());
    }

    #[test]
    fn test_char_delays_within_bounds() {
        let mut seq = sequencer(&[("hello world", LineKind::Log)]);
        let first = seq.start();
        let delays = run_to_end(&mut seq, first);
        let (typed, pause) = delays.split_at(delays.len() - 1);
        assert_eq!(typed.len(), 11);
        assert!(typed.iter().all(|d| (10.0..40.0).contains(d)));
        assert_eq!(pause, &[200.0]);
    }

    #[test]
    fn test_advances_through_lines_in_order() {
        let mut seq = sequencer(&[
            ("ab", LineKind::Command),
            ("", LineKind::Log),
            ("ok", LineKind::Success),
        ]);
        let first = seq.start();
        let mut step = first;
        let mut touched = Vec::new();
        while step.next_delay.is_some() {
            if let Some(line) = step.line {
                touched.push(line);
            }
            step = seq.tick();
        }
        assert_eq!(touched, vec![0, 0, 2, 2]);
        assert!(seq.lines().iter().all(TerminalLine::is_complete));
        assert!(seq.is_done());
    }

    #[test]
    fn test_empty_script_is_done_immediately() {
        let mut seq = sequencer(&[]);
        assert_eq!(seq.start(), TypeStep::default());
        assert!(seq.is_done());
    }

    #[test]
    fn test_tick_before_start_does_nothing() {
        let mut seq = sequencer(&[("x", LineKind::Command)]);
        assert_eq!(seq.tick(), TypeStep::default());
        assert_eq!(seq.phase(), SequencerPhase::Idle);
    }

    #[test]
    fn test_visible_text_multibyte() {
        let mut line = TerminalLine::new("é>ok", LineKind::Log);
        line.revealed_chars = 2;
        assert_eq!(line.visible_text(), "é>");
        assert_eq!(line.char_count(), 4);
    }
}
