//! Typing-effect schedule for clause explanations.
//!
//! Explanations are revealed one character at a time at a fixed cadence
//! rather than shown all at once.  This module only computes *when* each
//! character is due; the session runtime in `app::reveal` owns the timers
//! and cancellation.

use std::time::Duration;

/// Per-character reveal speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadence {
    /// Delay between two consecutive characters.
    pub per_char: Duration,
    /// Extra pause inserted after each source chunk.
    pub chunk_gap: Duration,
}

impl Cadence {
    pub fn from_millis(per_char_ms: u64, chunk_gap_ms: u64) -> Self {
        Self {
            per_char: Duration::from_millis(per_char_ms),
            chunk_gap: Duration::from_millis(chunk_gap_ms),
        }
    }
}

impl Default for Cadence {
    fn default() -> Self {
        Self::from_millis(2, 2)
    }
}

/// One scheduled character: reveal `ch` once `at` has elapsed since the
/// session started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealStep {
    pub at: Duration,
    pub ch: char,
}

/// The full, precomputed reveal plan for a known set of chunks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevealSchedule {
    steps: Vec<RevealStep>,
}

impl RevealSchedule {
    /// Schedule a single body of text: character `i` is due at `i × per_char`.
    pub fn for_text(text: &str, cadence: Cadence) -> Self {
        Self::for_chunks([text], cadence)
    }

    /// Schedule several chunks back to back.  Character `i` is due at
    /// `i × per_char + (chunks finished before it) × chunk_gap`.
    pub fn for_chunks<I, S>(chunks: I, cadence: Cadence) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut steps = Vec::new();
        let mut at = Duration::ZERO;
        let mut started = false;

        for chunk in chunks {
            let chunk = chunk.as_ref();
            if chunk.is_empty() {
                continue;
            }
            if started {
                at += cadence.chunk_gap;
            }
            for ch in chunk.chars() {
                steps.push(RevealStep { at, ch });
                at += cadence.per_char;
            }
            started = true;
        }

        Self { steps }
    }

    pub fn steps(&self) -> &[RevealStep] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Offset of the last character, i.e. when the reveal completes.
    pub fn duration(&self) -> Duration {
        self.steps.last().map_or(Duration::ZERO, |s| s.at)
    }

    /// The text that is visible once `elapsed` has passed.
    pub fn prefix_at(&self, elapsed: Duration) -> String {
        self.steps
            .iter()
            .take_while(|s| s.at <= elapsed)
            .map(|s| s.ch)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn single_text_is_evenly_spaced() {
        let schedule = RevealSchedule::for_text("Risk", Cadence::from_millis(2, 2));
        let offsets: Vec<_> = schedule.steps().iter().map(|s| s.at).collect();
        assert_eq!(offsets, vec![ms(0), ms(2), ms(4), ms(6)]);
        assert_eq!(schedule.prefix_at(ms(3)), "Ri");
        assert_eq!(schedule.prefix_at(ms(8)), "Risk");
    }

    #[test]
    fn fully_revealed_within_len_times_cadence() {
        let cadence = Cadence::from_millis(2, 0);
        for text in ["a", "Low", "indemnification survives termination", "§ 4.2 — ✓"] {
            let schedule = RevealSchedule::for_text(text, cadence);
            let budget = cadence.per_char * text.chars().count() as u32;
            assert!(schedule.duration() < budget);
            assert_eq!(schedule.prefix_at(budget), text);
        }
    }

    #[test]
    fn chunk_gap_is_added_between_chunks_only() {
        let schedule = RevealSchedule::for_chunks(["ab ", "", "c"], Cadence::from_millis(2, 5));
        let offsets: Vec<_> = schedule.steps().iter().map(|s| s.at).collect();
        // a=0 b=2 ' '=4, gap after first chunk, c=6+5
        assert_eq!(offsets, vec![ms(0), ms(2), ms(4), ms(11)]);
        assert_eq!(schedule.prefix_at(ms(10)), "ab ");
    }

    #[test]
    fn empty_text_schedules_nothing() {
        let schedule = RevealSchedule::for_text("", Cadence::default());
        assert!(schedule.is_empty());
        assert_eq!(schedule.duration(), Duration::ZERO);
        assert_eq!(schedule.prefix_at(Duration::ZERO), "");
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prefix_grows_one_char_per_tick(text in "\\PC{0,32}", per_char in 1u64..10) {
                let cadence = Cadence::from_millis(per_char, 0);
                let schedule = RevealSchedule::for_text(&text, cadence);
                let count = text.chars().count();

                for i in 0..count {
                    let shown = schedule.prefix_at(cadence.per_char * i as u32);
                    prop_assert_eq!(shown.chars().count(), i + 1);
                    prop_assert!(text.starts_with(&shown));
                }
                prop_assert_eq!(schedule.prefix_at(cadence.per_char * count as u32), text);
            }
        }
    }
}
