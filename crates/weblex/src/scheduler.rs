//! Incremental scheduler.
//!
//! Decides which lines to lex after an edit, a full-document request or a
//! visibility change.
//!
//! * An edit of lines `[a, b]` re-lexes from `a` with the stored end state
//!   of `a - 1`, always through `b`, then keeps going while each new end
//!   state differs from the one stored before the run. The loop stops at the
//!   end of the document, so it halts within `line_count` lines.
//! * A full pass lexes from line 0 in slices of `yield_interval` lines.
//!   Between slices it reports progress and checks that the host still
//!   wants the result.
//! * When the host has reported a visible window, a full pass stops at
//!   `last_visible + visible_margin`; the rest of the document is deferred
//!   until [`Scheduler::advance_window`] reaches it.

use tracing::{debug, info_span, trace};
use weblex_core::LexerConfig;

use crate::document::{Document, HighlightObserver};
use crate::line::LineLexer;
use crate::store::LineStore;

/// Outcome of one call into a full pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassStatus {
    /// No pass is running.
    Idle,
    /// A slice finished; call again to continue.
    Yielded { percent: u8 },
    /// Every eager line was lexed.
    Completed { lexed: usize },
    /// The observer reported the document gone.
    Cancelled,
}

/// Outcome of an incremental run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Relex {
    /// First line lexed (may precede the edit when earlier lines were
    /// never lexed).
    pub from: usize,
    pub lexed: usize,
    /// Stopped early because an end state matched its stored value.
    pub converged: bool,
}

#[derive(Debug, Clone, Copy)]
struct FullPass {
    next: usize,
    lexed: usize,
}

#[derive(Debug, Clone)]
pub struct Scheduler {
    yield_interval: usize,
    visible_margin: usize,
    last_visible: Option<usize>,
    pass: Option<FullPass>,
}

impl Scheduler {
    #[must_use]
    pub fn new(config: &LexerConfig) -> Self {
        Self {
            yield_interval: config.yield_interval.max(1),
            visible_margin: config.visible_margin,
            last_visible: None,
            pass: None,
        }
    }

    pub fn set_config(&mut self, config: &LexerConfig) {
        self.yield_interval = config.yield_interval.max(1);
        self.visible_margin = config.visible_margin;
    }

    #[must_use]
    pub fn last_visible(&self) -> Option<usize> {
        self.last_visible
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.pass.is_some()
    }

    /// Drop a running pass and the visible window.
    pub fn reset(&mut self) {
        self.pass = None;
        self.last_visible = None;
    }

    /// First line past the eager window.
    fn window_end(&self, line_count: usize) -> usize {
        self.last_visible.map_or(line_count, |last| {
            last.saturating_add(self.visible_margin)
                .saturating_add(1)
                .min(line_count)
        })
    }

    /// Lines at or after this are lexed by someone else (the running pass or
    /// the window).
    fn stop_line(&self, store: &LineStore, line_count: usize) -> usize {
        let mut stop = line_count;
        if let Some(d) = store.deferred_from() {
            stop = stop.min(d);
        }
        if let Some(pass) = self.pass {
            stop = stop.min(pass.next);
        }
        stop
    }

    // -- edits ---------------------------------------------------------------

    pub fn on_lines_inserted(&mut self, at: usize, count: usize) {
        if let Some(pass) = self.pass.as_mut()
            && at < pass.next
        {
            pass.next += count;
        }
    }

    pub fn on_lines_removed(&mut self, at: usize, count: usize) {
        if let Some(pass) = self.pass.as_mut()
            && at < pass.next
        {
            pass.next = pass.next.saturating_sub(count).max(at);
        }
    }

    /// Re-lex after lines `[first, last]` changed, propagating forward until
    /// convergence.
    pub fn relex<D: Document + ?Sized>(
        &mut self,
        lexer: &LineLexer<'_>,
        store: &mut LineStore,
        doc: &D,
        first: usize,
        last: usize,
    ) -> Relex {
        let line_count = doc.line_count();
        store.resize(line_count);
        let stop = self.stop_line(store, line_count);
        if first >= stop {
            return Relex {
                from: first,
                ..Relex::default()
            };
        }

        let mut from = first;
        while from > 0 && !store.is_lexed(from - 1) {
            from -= 1;
        }

        let mut run = Relex {
            from,
            ..Relex::default()
        };
        let mut line = from;
        while line < stop {
            let incoming = store
                .load(line)
                .cloned()
                .unwrap_or_else(|| lexer.initial_state());
            let data = lexer.lex_line(&doc.line_text(line), &incoming);
            let unchanged = store
                .get(line)
                .is_some_and(|old| old.end_state == data.end_state);
            store.save(line, data);
            run.lexed += 1;
            if line >= last && unchanged {
                run.converged = true;
                break;
            }
            line += 1;
        }
        debug!(
            from = run.from,
            lexed = run.lexed,
            converged = run.converged,
            "weblex relex"
        );
        run
    }

    // -- full pass -----------------------------------------------------------

    /// Begin a full pass from line 0. Existing records stay readable until
    /// the pass overwrites them; records past the eager window are dropped
    /// when it completes.
    pub fn start_full_pass(&mut self, store: &mut LineStore, line_count: usize) {
        store.resize(line_count);
        store.defer_from(None);
        self.pass = Some(FullPass { next: 0, lexed: 0 });
    }

    /// Lex one slice of the running pass.
    pub fn resume<D, O>(
        &mut self,
        lexer: &LineLexer<'_>,
        store: &mut LineStore,
        doc: &D,
        observer: &mut O,
    ) -> PassStatus
    where
        D: Document + ?Sized,
        O: HighlightObserver + ?Sized,
    {
        let Some(mut pass) = self.pass else {
            return PassStatus::Idle;
        };
        if !observer.is_alive() {
            self.pass = None;
            debug!(next = pass.next, "weblex full pass cancelled");
            return PassStatus::Cancelled;
        }

        let line_count = doc.line_count();
        store.resize(line_count);
        let end = self.window_end(line_count);
        let slice_end = pass.next.saturating_add(self.yield_interval).min(end);
        {
            let _span = info_span!("weblex.full_pass", lines = line_count).entered();
            for line in pass.next..slice_end {
                let incoming = store
                    .load(line)
                    .cloned()
                    .unwrap_or_else(|| lexer.initial_state());
                let data = lexer.lex_line(&doc.line_text(line), &incoming);
                store.save(line, data);
            }
        }
        pass.lexed += slice_end.saturating_sub(pass.next);
        pass.next = slice_end.max(pass.next);

        if pass.next >= end {
            self.pass = None;
            // Records past the window describe text from before this pass.
            for line in end..line_count {
                store.invalidate(line);
            }
            store.defer_from((end < line_count).then_some(end));
            observer.on_progress(100);
            debug!(lexed = pass.lexed, deferred = line_count - end, "weblex full pass done");
            return PassStatus::Completed { lexed: pass.lexed };
        }
        self.pass = Some(pass);
        let percent = percent_of(pass.next, end);
        observer.on_progress(percent);
        PassStatus::Yielded { percent }
    }

    // -- visible window ------------------------------------------------------

    /// Record the last visible line and lex deferred lines that came into
    /// the eager window. Returns the number of lines lexed.
    pub fn advance_window<D: Document + ?Sized>(
        &mut self,
        lexer: &LineLexer<'_>,
        store: &mut LineStore,
        doc: &D,
        last_visible: usize,
    ) -> usize {
        self.last_visible = Some(last_visible);
        let line_count = doc.line_count();
        store.resize(line_count);
        let Some(from) = store.deferred_from() else {
            return 0;
        };
        let end = self.window_end(line_count);
        if end <= from {
            return 0;
        }
        for line in from..end {
            let incoming = store
                .load(line)
                .cloned()
                .unwrap_or_else(|| lexer.initial_state());
            let data = lexer.lex_line(&doc.line_text(line), &incoming);
            store.save(line, data);
        }
        store.defer_from((end < line_count).then_some(end));
        trace!(from, to = end, "weblex window advanced");
        end - from
    }
}

fn percent_of(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    u8::try_from(done.saturating_mul(100) / total).unwrap_or(100)
}

#[cfg(test)]
mod tests {
    use weblex_core::{DocumentKind, LanguageTables};

    use super::*;
    use crate::document::TextDocument;
    use crate::state::StateTag;

    struct Recorder {
        progress: Vec<u8>,
        alive_for: usize,
    }

    impl HighlightObserver for Recorder {
        fn on_progress(&mut self, percent: u8) {
            self.progress.push(percent);
        }

        fn is_alive(&self) -> bool {
            self.progress.len() < self.alive_for
        }
    }

    fn setup(lines: &[&str]) -> (TextDocument, LineStore) {
        let doc = TextDocument::from_lines(lines.iter().copied());
        let mut store = LineStore::new();
        store.resize(doc.line_count());
        (doc, store)
    }

    fn config() -> LexerConfig {
        LexerConfig::default()
            .with_yield_interval(2)
            .with_visible_margin(1)
    }

    fn run_to_end(
        sched: &mut Scheduler,
        lexer: &LineLexer<'_>,
        store: &mut LineStore,
        doc: &TextDocument,
    ) {
        sched.start_full_pass(store, doc.line_count());
        while let PassStatus::Yielded { .. } = sched.resume(lexer, store, doc, &mut ()) {}
    }

    // -- relex ---------------------------------------------------------------

    #[test]
    fn relex_stops_on_convergence() {
        let tables = LanguageTables::builtin();
        let lexer = LineLexer::new(&tables, DocumentKind::Js);
        let (mut doc, mut store) = setup(&["a;", "b;", "c;", "d;"]);
        let mut sched = Scheduler::new(&config());
        let first = sched.relex(&lexer, &mut store, &doc, 0, 0);
        assert_eq!(first.lexed, 4);
        assert!(!first.converged);

        doc.set_line(1, "bb;");
        let run = sched.relex(&lexer, &mut store, &doc, 1, 1);
        assert_eq!(run, Relex {
            from: 1,
            lexed: 1,
            converged: true
        });
    }

    #[test]
    fn relex_propagates_past_edit() {
        let tables = LanguageTables::builtin();
        let lexer = LineLexer::new(&tables, DocumentKind::Js);
        let (mut doc, mut store) = setup(&["a;", "b;", "c;", "d;"]);
        let mut sched = Scheduler::new(&config());
        sched.relex(&lexer, &mut store, &doc, 0, 0);

        doc.set_line(1, "/* open");
        let run = sched.relex(&lexer, &mut store, &doc, 1, 1);
        assert_eq!(run.lexed, 3);
        assert!(!run.converged);
        assert_eq!(
            store.get(3).map(|d| d.end_state.state_tag()),
            Some(StateTag::CommentMlJs)
        );

        doc.set_line(2, "*/");
        let run = sched.relex(&lexer, &mut store, &doc, 2, 2);
        assert_eq!(run.lexed, 2);
        assert_eq!(
            store.get(3).map(|d| d.end_state.state_tag()),
            Some(StateTag::None)
        );
    }

    #[test]
    fn relex_backs_up_to_unlexed_lines() {
        let tables = LanguageTables::builtin();
        let lexer = LineLexer::new(&tables, DocumentKind::Js);
        let (doc, mut store) = setup(&["/* a", "b", "c */", "d"]);
        let mut sched = Scheduler::new(&config());
        let run = sched.relex(&lexer, &mut store, &doc, 2, 2);
        assert_eq!(run.from, 0);
        assert_eq!(
            store.get(3).map(|d| d.end_state.state_tag()),
            Some(StateTag::None)
        );
    }

    // -- full pass -----------------------------------------------------------

    #[test]
    fn full_pass_yields_and_reports_progress() {
        let tables = LanguageTables::builtin();
        let lexer = LineLexer::new(&tables, DocumentKind::Js);
        let (doc, mut store) = setup(&["a", "b", "c", "d", "e"]);
        let mut sched = Scheduler::new(&config());
        let mut obs = Recorder {
            progress: Vec::new(),
            alive_for: usize::MAX,
        };
        sched.start_full_pass(&mut store, doc.line_count());
        assert_eq!(
            sched.resume(&lexer, &mut store, &doc, &mut obs),
            PassStatus::Yielded { percent: 40 }
        );
        assert_eq!(
            sched.resume(&lexer, &mut store, &doc, &mut obs),
            PassStatus::Yielded { percent: 80 }
        );
        assert_eq!(
            sched.resume(&lexer, &mut store, &doc, &mut obs),
            PassStatus::Completed { lexed: 5 }
        );
        assert_eq!(obs.progress, vec![40, 80, 100]);
        assert_eq!(
            sched.resume(&lexer, &mut store, &doc, &mut obs),
            PassStatus::Idle
        );
        assert_eq!(store.iter().count(), 5);
    }

    #[test]
    fn full_pass_cancels_at_yield_point() {
        let tables = LanguageTables::builtin();
        let lexer = LineLexer::new(&tables, DocumentKind::Js);
        let (doc, mut store) = setup(&["a", "b", "c", "d", "e"]);
        let mut sched = Scheduler::new(&config());
        let mut obs = Recorder {
            progress: Vec::new(),
            alive_for: 1,
        };
        sched.start_full_pass(&mut store, doc.line_count());
        assert!(matches!(
            sched.resume(&lexer, &mut store, &doc, &mut obs),
            PassStatus::Yielded { .. }
        ));
        assert_eq!(
            sched.resume(&lexer, &mut store, &doc, &mut obs),
            PassStatus::Cancelled
        );
        assert!(!sched.is_running());
        assert_eq!(store.iter().count(), 2);
    }

    #[test]
    fn edits_during_pass_leave_the_rest_to_it() {
        let tables = LanguageTables::builtin();
        let lexer = LineLexer::new(&tables, DocumentKind::Js);
        let (doc, mut store) = setup(&["a", "b", "c", "d", "e"]);
        let mut sched = Scheduler::new(&config());
        sched.start_full_pass(&mut store, doc.line_count());
        sched.resume(&lexer, &mut store, &doc, &mut ());
        let run = sched.relex(&lexer, &mut store, &doc, 3, 3);
        assert_eq!(run.lexed, 0);
        let run = sched.relex(&lexer, &mut store, &doc, 0, 0);
        assert_eq!(run.lexed, 1);
    }

    // -- window --------------------------------------------------------------

    #[test]
    fn visible_window_defers_and_advances() {
        let tables = LanguageTables::builtin();
        let lexer = LineLexer::new(&tables, DocumentKind::Js);
        let lines: Vec<String> = (0..10).map(|n| format!("v{n};")).collect();
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let (doc, mut store) = setup(&refs);
        let mut sched = Scheduler::new(&config());

        sched.advance_window(&lexer, &mut store, &doc, 2);
        run_to_end(&mut sched, &lexer, &mut store, &doc);
        assert_eq!(store.deferred_from(), Some(4));
        assert!(store.is_lexed(3));
        assert!(!store.is_lexed(4));

        assert_eq!(sched.advance_window(&lexer, &mut store, &doc, 5), 3);
        assert_eq!(store.deferred_from(), Some(7));
        assert_eq!(sched.advance_window(&lexer, &mut store, &doc, 20), 3);
        assert_eq!(store.deferred_from(), None);
        assert_eq!(store.iter().count(), 10);
    }

    #[test]
    fn windowed_pass_drops_stale_records() {
        let tables = LanguageTables::builtin();
        let lexer = LineLexer::new(&tables, DocumentKind::Js);
        let (mut doc, mut store) = setup(&["a;", "b;", "c;", "var gone = 1;"]);
        let mut sched = Scheduler::new(&config().with_visible_margin(0));
        sched.advance_window(&lexer, &mut store, &doc, 10);
        run_to_end(&mut sched, &lexer, &mut store, &doc);
        assert!(store.is_lexed(3));

        doc.set_line(3, "d;");
        sched.advance_window(&lexer, &mut store, &doc, 0);
        run_to_end(&mut sched, &lexer, &mut store, &doc);
        assert_eq!(store.deferred_from(), Some(1));
        assert!(store.is_lexed(0));
        assert!((1..4).all(|n| !store.is_lexed(n)));

        sched.advance_window(&lexer, &mut store, &doc, 10);
        assert!(store.get(3).is_some_and(|d| d.symbols.variables.is_empty()));
    }

    #[test]
    fn percent_handles_empty() {
        assert_eq!(percent_of(0, 0), 100);
        assert_eq!(percent_of(1, 3), 33);
    }
}
