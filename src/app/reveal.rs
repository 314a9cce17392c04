//! Clause explanation reveal sessions.
//!
//! A [`Revealer`] owns at most one live session.  Each session is a tokio
//! task that walks a [`RevealSchedule`] per incoming chunk, sleeping until
//! every character is due and sending it to the event loop.
//!
//! Two mechanisms keep sessions from interleaving:
//! - cancelling aborts the task, which drops its chunk stream (and any
//!   request behind it), and sets a flag the task checks before each send;
//! - a generation id on every update; [`Revealer::apply`] drops updates
//!   from anything but the current generation, so even an update already
//!   sitting in the channel when a new clause is picked never lands.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tokio::time::{sleep_until, Instant};

use crate::api::stream::ChunkStream;
use crate::core::reveal::{Cadence, RevealSchedule};

/// Shown in place of the explanation when the session fails.
pub const EXPLAIN_FAILED: &str = "An error occurred while explaining the clause.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RevealPhase {
    /// No session; the prefix is whatever was last shown.
    #[default]
    Idle,
    /// Session started, no character has arrived yet.
    Waiting,
    Revealing,
    Complete,
}

#[derive(Debug)]
pub enum RevealEvent {
    Char(char),
    Finished,
    Failed(String),
}

#[derive(Debug)]
pub struct RevealUpdate {
    pub generation: u64,
    pub event: RevealEvent,
}

/// What [`Revealer::apply`] did with an update.
#[derive(Debug, PartialEq, Eq)]
pub enum Applied {
    /// From a cancelled session; ignored.
    Stale,
    Progress,
    Finished,
    Failed(String),
}

/// Handles to the live session's task.
struct Session {
    cancel: Arc<AtomicBool>,
    task: AbortHandle,
}

impl Session {
    fn stop(self) {
        self.cancel.store(true, Ordering::Relaxed);
        self.task.abort();
    }
}

pub struct Revealer {
    cadence: Cadence,
    tx: mpsc::UnboundedSender<RevealUpdate>,
    generation: u64,
    session: Option<Session>,
    revealed: String,
    phase: RevealPhase,
}

impl Revealer {
    /// Create a revealer and the receiving end the event loop drains.
    pub fn new(cadence: Cadence) -> (Self, mpsc::UnboundedReceiver<RevealUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let revealer = Self {
            cadence,
            tx,
            generation: 0,
            session: None,
            revealed: String::new(),
            phase: RevealPhase::Idle,
        };
        (revealer, rx)
    }

    pub fn revealed(&self) -> &str {
        &self.revealed
    }

    pub fn phase(&self) -> RevealPhase {
        self.phase
    }

    /// `true` while a session may still produce characters.
    pub fn is_active(&self) -> bool {
        matches!(self.phase, RevealPhase::Waiting | RevealPhase::Revealing)
    }

    /// Takes effect from the next session.
    pub fn set_cadence(&mut self, cadence: Cadence) {
        self.cadence = cadence;
    }

    /// Reveal a fully known text.  Character `i` appears `i × per_char`
    /// after the call.  The empty string completes immediately.
    pub fn start_reveal(&mut self, source: &str) {
        self.begin();
        if source.is_empty() {
            self.phase = RevealPhase::Complete;
            return;
        }
        let chunks = stream::iter([Ok(source.to_string())]).boxed();
        self.spawn(chunks);
    }

    /// Reveal chunks as they arrive.  A chunk that shows up after the
    /// previous one has finished is revealed from its arrival time.
    pub fn start_stream(&mut self, chunks: ChunkStream) {
        self.begin();
        self.spawn(chunks);
    }

    /// Stop the current session.  Characters already shown stay; nothing
    /// else from that session will be applied.  Idempotent.
    pub fn cancel_reveal(&mut self) {
        if let Some(session) = self.session.take() {
            session.stop();
            self.generation = self.generation.wrapping_add(1);
            tracing::debug!(generation = self.generation, "reveal cancelled");
        }
        if self.is_active() {
            self.phase = RevealPhase::Idle;
        }
    }

    /// Cancel and forget the displayed text (clause deselected).
    pub fn clear(&mut self) {
        self.cancel_reveal();
        self.revealed.clear();
        self.phase = RevealPhase::Idle;
    }

    /// Commit an update from the channel.
    pub fn apply(&mut self, update: RevealUpdate) -> Applied {
        if update.generation != self.generation || self.session.is_none() {
            return Applied::Stale;
        }
        match update.event {
            RevealEvent::Char(ch) => {
                self.revealed.push(ch);
                self.phase = RevealPhase::Revealing;
                Applied::Progress
            }
            RevealEvent::Finished => {
                self.session = None;
                self.phase = RevealPhase::Complete;
                Applied::Finished
            }
            RevealEvent::Failed(message) => {
                self.session = None;
                self.revealed = EXPLAIN_FAILED.to_string();
                self.phase = RevealPhase::Complete;
                Applied::Failed(message)
            }
        }
    }

    fn begin(&mut self) {
        self.cancel_reveal();
        self.generation = self.generation.wrapping_add(1);
        self.revealed.clear();
        self.phase = RevealPhase::Waiting;
    }

    fn spawn(&mut self, chunks: ChunkStream) {
        let cancel = Arc::new(AtomicBool::new(false));
        let task = tokio::spawn(run_session(
            chunks,
            self.cadence,
            self.generation,
            Arc::clone(&cancel),
            self.tx.clone(),
        ));
        self.session = Some(Session {
            cancel,
            task: task.abort_handle(),
        });
    }
}

impl Drop for Revealer {
    fn drop(&mut self) {
        self.cancel_reveal();
    }
}

async fn run_session(
    mut chunks: ChunkStream,
    cadence: Cadence,
    generation: u64,
    cancel: Arc<AtomicBool>,
    tx: mpsc::UnboundedSender<RevealUpdate>,
) {
    let send = |event| {
        if cancel.load(Ordering::Relaxed) {
            return false;
        }
        tx.send(RevealUpdate { generation, event }).is_ok()
    };

    // When the next chunk may start revealing.
    let mut next_start = Instant::now();

    while let Some(item) = chunks.next().await {
        if cancel.load(Ordering::Relaxed) {
            return;
        }
        let chunk = match item {
            Ok(chunk) => chunk,
            Err(e) => {
                tracing::warn!("clause explanation failed: {e}");
                send(RevealEvent::Failed(e.to_string()));
                return;
            }
        };

        let start = next_start.max(Instant::now());
        let schedule = RevealSchedule::for_text(&chunk, cadence);
        for step in schedule.steps() {
            sleep_until(start + step.at).await;
            if !send(RevealEvent::Char(step.ch)) {
                return;
            }
        }
        if !schedule.is_empty() {
            next_start = start + schedule.duration() + cadence.per_char + cadence.chunk_gap;
        }
    }

    send(RevealEvent::Finished);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::api::ApiError;
    use pretty_assertions::assert_eq;

    const CADENCE: Cadence = Cadence {
        per_char: Duration::from_millis(2),
        chunk_gap: Duration::from_millis(2),
    };

    /// Apply everything currently queued, returning every intermediate
    /// prefix the UI would have drawn.
    fn drain(revealer: &mut Revealer, rx: &mut mpsc::UnboundedReceiver<RevealUpdate>) -> Vec<String> {
        let mut seen = Vec::new();
        while let Ok(update) = rx.try_recv() {
            if revealer.apply(update) == Applied::Progress {
                seen.push(revealer.revealed().to_string());
            }
        }
        seen
    }

    async fn advance_ms(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn reveals_whole_text_within_len_times_cadence() {
        let (mut revealer, mut rx) = Revealer::new(CADENCE);
        revealer.start_reveal("Risk");
        assert_eq!(revealer.phase(), RevealPhase::Waiting);

        advance_ms(8).await;
        let seen = drain(&mut revealer, &mut rx);

        assert_eq!(revealer.revealed(), "Risk");
        assert_eq!(seen, vec!["R", "Ri", "Ris", "Risk"]);
        assert_eq!(revealer.phase(), RevealPhase::Complete);
        assert!(!revealer.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn reveal_is_incremental() {
        let (mut revealer, mut rx) = Revealer::new(CADENCE);
        revealer.start_reveal("Risk");

        advance_ms(3).await;
        drain(&mut revealer, &mut rx);
        assert_eq!(revealer.revealed(), "Ri");
        assert!(revealer.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn new_clause_mid_reveal_never_mixes_text() {
        let (mut revealer, mut rx) = Revealer::new(CADENCE);
        revealer.start_reveal("Risk");

        advance_ms(3).await;
        drain(&mut revealer, &mut rx);
        assert_eq!(revealer.revealed(), "Ri");

        revealer.start_reveal("Low");
        assert_eq!(revealer.revealed(), "");

        advance_ms(6).await;
        let seen = drain(&mut revealer, &mut rx);

        assert_eq!(revealer.revealed(), "Low");
        for shown in seen {
            assert!("Low".starts_with(&shown), "mixed output: {shown:?}");
        }

        // Nothing from the first session trickles in later.
        advance_ms(50).await;
        drain(&mut revealer, &mut rx);
        assert_eq!(revealer.revealed(), "Low");
    }

    /// Reveal `first`, switch to `second` after `switch_ms`, and let the
    /// second session finish.  Returns the prefix shown at the switch, every
    /// prefix drawn afterwards, and the final text.
    async fn reveal_then_switch(
        first: &str,
        second: &str,
        switch_ms: u64,
        drain_before_switch: bool,
    ) -> (String, Vec<String>, String) {
        let (mut revealer, mut rx) = Revealer::new(CADENCE);
        revealer.start_reveal(first);
        advance_ms(switch_ms).await;
        if drain_before_switch {
            drain(&mut revealer, &mut rx);
        }
        let before = revealer.revealed().to_string();

        revealer.start_reveal(second);
        let mut seen = drain(&mut revealer, &mut rx);
        advance_ms(2 * second.chars().count() as u64 + 20).await;
        seen.extend(drain(&mut revealer, &mut rx));
        (before, seen, revealer.revealed().to_string())
    }

    #[tokio::test(start_paused = true)]
    async fn switching_at_any_instant_never_mixes_text() {
        let first = "Termination: 90 días";
        let second = "Low risk";
        let budget = 2 * first.chars().count() as u64;
        // Even instants land exactly on a character's due time.
        for t in 1..budget {
            for drain_first in [true, false] {
                let (before, seen, last) = reveal_then_switch(first, second, t, drain_first).await;
                assert!(first.starts_with(&before), "switch at {t}ms: {before:?}");
                for shown in &seen {
                    assert!(second.starts_with(shown.as_str()), "switch at {t}ms showed {shown:?}");
                }
                assert_eq!(last, second, "switch at {t}ms");
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_releases_the_chunk_stream() {
        let guard = Arc::new(());
        let held = Arc::clone(&guard);
        let chunks = stream::iter([Ok::<_, ApiError>("ab".to_string())])
            .chain(stream::pending())
            .map(move |chunk| {
                let _ = &held;
                chunk
            })
            .boxed();

        let (mut revealer, mut rx) = Revealer::new(CADENCE);
        revealer.start_stream(chunks);
        advance_ms(4).await;
        drain(&mut revealer, &mut rx);
        assert_eq!(revealer.revealed(), "ab");
        assert_eq!(Arc::strong_count(&guard), 2, "session is waiting on the stream");

        revealer.cancel_reveal();
        advance_ms(1).await;
        assert_eq!(Arc::strong_count(&guard), 1, "cancelled session still holds its stream");
        assert_eq!(revealer.revealed(), "ab");
    }

    #[tokio::test(start_paused = true)]
    async fn new_session_releases_the_previous_stream() {
        let guard = Arc::new(());
        let held = Arc::clone(&guard);
        let chunks = stream::pending::<Result<String, ApiError>>()
            .map(move |chunk| {
                let _ = &held;
                chunk
            })
            .boxed();

        let (mut revealer, mut rx) = Revealer::new(CADENCE);
        revealer.start_stream(chunks);
        advance_ms(1).await;
        revealer.start_reveal("ok");
        advance_ms(10).await;
        drain(&mut revealer, &mut rx);

        assert_eq!(Arc::strong_count(&guard), 1);
        assert_eq!(revealer.revealed(), "ok");
    }

    #[tokio::test(start_paused = true)]
    async fn updates_queued_before_restart_are_dropped() {
        let (mut revealer, mut rx) = Revealer::new(CADENCE);
        revealer.start_reveal("abcdef");
        advance_ms(5).await;
        // "abc" is sitting in the channel, unapplied.
        revealer.start_reveal("xy");
        advance_ms(10).await;
        drain(&mut revealer, &mut rx);
        assert_eq!(revealer.revealed(), "xy");
    }

    #[tokio::test(start_paused = true)]
    async fn empty_text_completes_immediately() {
        let (mut revealer, mut rx) = Revealer::new(CADENCE);
        revealer.start_reveal("");
        assert_eq!(revealer.revealed(), "");
        assert_eq!(revealer.phase(), RevealPhase::Complete);
        assert!(!revealer.is_active());

        advance_ms(10).await;
        assert!(rx.try_recv().is_err(), "nothing was scheduled");
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_without_session_is_a_noop() {
        let (mut revealer, _rx) = Revealer::new(CADENCE);
        revealer.cancel_reveal();
        revealer.cancel_reveal();
        assert_eq!(revealer.revealed(), "");
        assert_eq!(revealer.phase(), RevealPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_keeps_revealed_prefix() {
        let (mut revealer, mut rx) = Revealer::new(CADENCE);
        revealer.start_reveal("Risk");
        advance_ms(3).await;
        drain(&mut revealer, &mut rx);

        revealer.cancel_reveal();
        advance_ms(20).await;
        drain(&mut revealer, &mut rx);

        assert_eq!(revealer.revealed(), "Ri");
        assert_eq!(revealer.phase(), RevealPhase::Idle);
        // Second cancel leaves the display untouched too.
        revealer.cancel_reveal();
        assert_eq!(revealer.revealed(), "Ri");
    }

    #[tokio::test(start_paused = true)]
    async fn streamed_chunks_are_revealed_in_order_with_gap() {
        let (mut revealer, mut rx) = Revealer::new(CADENCE);
        let chunks: Vec<Result<String, ApiError>> = vec![Ok("Low ".into()), Ok("risk".into())];
        revealer.start_stream(stream::iter(chunks).boxed());

        // "Low " at 0,2,4,6; gap; "risk" from 10.
        advance_ms(8).await;
        drain(&mut revealer, &mut rx);
        assert_eq!(revealer.revealed(), "Low ");

        advance_ms(10).await;
        drain(&mut revealer, &mut rx);
        assert_eq!(revealer.revealed(), "Low risk");
        assert_eq!(revealer.phase(), RevealPhase::Complete);
    }

    #[tokio::test(start_paused = true)]
    async fn stream_error_replaces_text_with_message() {
        let (mut revealer, mut rx) = Revealer::new(CADENCE);
        let chunks: Vec<Result<String, ApiError>> = vec![Ok("Pa".into()), Err(ApiError::Unauthorized)];
        revealer.start_stream(stream::iter(chunks).boxed());

        advance_ms(10).await;
        let mut failure = None;
        while let Ok(update) = rx.try_recv() {
            if let Applied::Failed(message) = revealer.apply(update) {
                failure = Some(message);
            }
        }

        assert_eq!(failure.as_deref(), Some("unauthorized, please log in"));
        assert_eq!(revealer.revealed(), EXPLAIN_FAILED);
        assert!(!revealer.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_revealer_stops_the_session() {
        let (mut revealer, mut rx) = Revealer::new(CADENCE);
        revealer.start_reveal("long explanation");
        drop(revealer);

        advance_ms(100).await;
        let mut received = 0;
        while let Ok(update) = rx.try_recv() {
            if matches!(update.event, RevealEvent::Char(_)) {
                received += 1;
            }
        }
        // At most the character due at t=0 made it out.
        assert!(received <= 1, "received {received} characters after teardown");
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        fn paused_runtime() -> tokio::runtime::Runtime {
            tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .start_paused(true)
                .build()
                .unwrap()
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(64))]

            #[test]
            fn any_switch_shows_only_the_new_text(
                first in "\\PC{1,16}",
                second in "\\PC{0,16}",
                offset in 0u64..64,
                drain_first in any::<bool>(),
            ) {
                let budget = 2 * first.chars().count() as u64;
                let switch_ms = 1 + offset % (budget - 1);
                let (before, seen, last) = paused_runtime()
                    .block_on(reveal_then_switch(&first, &second, switch_ms, drain_first));

                prop_assert!(first.starts_with(&before));
                for shown in &seen {
                    prop_assert!(second.starts_with(shown.as_str()), "showed {:?}", shown);
                }
                prop_assert_eq!(last, second);
            }

            #[test]
            fn full_text_is_revealed_within_len_times_cadence(text in "\\PC{0,24}") {
                let revealed = paused_runtime().block_on(async {
                    let (mut revealer, mut rx) = Revealer::new(CADENCE);
                    revealer.start_reveal(&text);
                    advance_ms(2 * text.chars().count() as u64).await;
                    drain(&mut revealer, &mut rx);
                    revealer.revealed().to_string()
                });
                prop_assert_eq!(revealed, text);
            }
        }
    }
}
