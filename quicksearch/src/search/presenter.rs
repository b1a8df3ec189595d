use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

use crate::projector::Row;
use crate::results::SearchStatus;

/// Message from the controller or a finished generation to the render side
#[derive(Debug)]
pub enum UiEvent {
    /// Query became empty: clear rows, show `Normal`
    Reset { generation: u64 },
    /// A generation started
    Pending { generation: u64 },
    Completed {
        generation: u64,
        rows: Vec<Row>,
        status: SearchStatus,
    },
    Failed { generation: u64, error: String },
}

/// The visible result list and status indicator.
///
/// Only [`Presenter`] calls these methods, from whichever thread owns it.
pub trait Renderer {
    fn set_status(&mut self, status: SearchStatus);

    /// Replaces every visible row at once and selects the first, if any
    fn install_rows(&mut self, rows: Vec<Row>);
}

/// In-memory renderer holding exactly what a list widget would show
#[derive(Debug, Default)]
pub struct ResultView {
    rows: Vec<Row>,
    selected: Option<usize>,
    status: SearchStatus,
}

impl ResultView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_row(&self) -> Option<&Row> {
        self.selected.and_then(|index| self.rows.get(index))
    }

    pub fn status(&self) -> SearchStatus {
        self.status
    }

    pub fn labels(&self) -> Vec<&str> {
        self.rows.iter().map(Row::label).collect()
    }
}

impl Renderer for ResultView {
    fn set_status(&mut self, status: SearchStatus) {
        self.status = status;
    }

    fn install_rows(&mut self, rows: Vec<Row>) {
        self.selected = if rows.is_empty() { None } else { Some(0) };
        self.rows = rows;
    }
}

/// Receiving end of the delivery channel; the single writer of a [`Renderer`].
///
/// Completions are applied only if their generation is still the live one,
/// so a superseded search can never reach the renderer even if it finished.
pub struct Presenter {
    events: Receiver<UiEvent>,
    generation: Arc<AtomicU64>,
    stable_status: SearchStatus,
    in_flight: Option<u64>,
    last_error: Option<String>,
}

impl Presenter {
    pub(crate) fn new(events: Receiver<UiEvent>, generation: Arc<AtomicU64>) -> Self {
        Self {
            events,
            generation,
            stable_status: SearchStatus::Normal,
            in_flight: None,
            last_error: None,
        }
    }

    /// True when no generation is waiting to deliver
    pub fn is_settled(&self) -> bool {
        self.in_flight.is_none()
    }

    /// Error of the live generation, if it faulted
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Applies every pending event without blocking; returns how many were
    /// applied (stale completions are dropped and not counted)
    pub fn pump<R: Renderer + ?Sized>(&mut self, renderer: &mut R) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events.try_recv() {
            if self.apply(event, renderer) {
                applied += 1;
            }
        }
        applied
    }

    /// Blocks until the live generation has delivered, failed or been reset.
    ///
    /// Returns false if `timeout` elapses first.
    pub fn settle<R: Renderer + ?Sized>(&mut self, renderer: &mut R, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        self.pump(renderer);
        while !self.is_settled() {
            match self
                .events
                .recv_timeout(deadline.saturating_duration_since(Instant::now()))
            {
                Ok(event) => {
                    self.apply(event, renderer);
                }
                Err(RecvTimeoutError::Timeout) => return false,
                Err(RecvTimeoutError::Disconnected) => {
                    debug!("Delivery channel closed with a generation in flight");
                    self.in_flight = None;
                }
            }
        }
        true
    }

    fn is_live(&self, generation: u64) -> bool {
        generation == self.generation.load(Ordering::Acquire)
    }

    fn apply<R: Renderer + ?Sized>(&mut self, event: UiEvent, renderer: &mut R) -> bool {
        match event {
            UiEvent::Reset { generation } => {
                trace!("Generation {} reset", generation);
                self.in_flight = None;
                self.last_error = None;
                self.stable_status = SearchStatus::Normal;
                renderer.install_rows(Vec::new());
                renderer.set_status(SearchStatus::Normal);
            }
            UiEvent::Pending { generation } => {
                self.in_flight = Some(generation);
                self.last_error = None;
                renderer.set_status(SearchStatus::Pending);
            }
            UiEvent::Completed {
                generation,
                rows,
                status,
            } => {
                if !self.is_live(generation) {
                    trace!("Dropping rows of superseded generation {}", generation);
                    return false;
                }
                debug!("Generation {} delivered {} rows", generation, rows.len());
                self.in_flight = None;
                self.stable_status = status;
                renderer.install_rows(rows);
                renderer.set_status(status);
            }
            UiEvent::Failed { generation, error } => {
                if !self.is_live(generation) {
                    return false;
                }
                warn!("Search generation {} failed: {}", generation, error);
                self.in_flight = None;
                self.last_error = Some(error);
                renderer.set_status(self.stable_status);
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::Entry;
    use crossbeam_channel::unbounded;

    fn row(label: &str) -> Row {
        Row {
            entry: Arc::new(Entry::new(label).with_title(label)),
            cells: vec![label.to_string()],
            icon_index: 0,
            foreground: None,
            background: None,
        }
    }

    fn setup(generation: u64) -> (crossbeam_channel::Sender<UiEvent>, Presenter, Arc<AtomicU64>) {
        let (tx, rx) = unbounded();
        let current = Arc::new(AtomicU64::new(generation));
        (tx, Presenter::new(rx, current.clone()), current)
    }

    #[test]
    fn test_completion_installs_rows_and_selects_first() {
        let (tx, mut presenter, _) = setup(1);
        let mut view = ResultView::new();
        tx.send(UiEvent::Pending { generation: 1 }).unwrap();
        assert_eq!(presenter.pump(&mut view), 1);
        assert_eq!(view.status(), SearchStatus::Pending);
        assert!(!presenter.is_settled());

        tx.send(UiEvent::Completed {
            generation: 1,
            rows: vec![row("a"), row("b")],
            status: SearchStatus::Success,
        })
        .unwrap();
        presenter.pump(&mut view);
        assert_eq!(view.labels(), vec!["a", "b"]);
        assert_eq!(view.selected(), Some(0));
        assert_eq!(view.selected_row().unwrap().label(), "a");
        assert_eq!(view.status(), SearchStatus::Success);
        assert!(presenter.is_settled());
    }

    #[test]
    fn test_stale_completion_is_dropped() {
        let (tx, mut presenter, _) = setup(2);
        let mut view = ResultView::new();
        tx.send(UiEvent::Completed {
            generation: 1,
            rows: vec![row("old")],
            status: SearchStatus::Success,
        })
        .unwrap();
        assert_eq!(presenter.pump(&mut view), 0);
        assert!(view.rows().is_empty());
        assert_eq!(view.status(), SearchStatus::Normal);
    }

    #[test]
    fn test_reset_clears_rows() {
        let (tx, mut presenter, _) = setup(1);
        let mut view = ResultView::new();
        view.install_rows(vec![row("a")]);
        view.set_status(SearchStatus::Success);

        tx.send(UiEvent::Reset { generation: 1 }).unwrap();
        presenter.pump(&mut view);
        assert!(view.rows().is_empty());
        assert_eq!(view.selected(), None);
        assert_eq!(view.status(), SearchStatus::Normal);
    }

    #[test]
    fn test_failure_restores_last_stable_status() {
        let (tx, mut presenter, current) = setup(1);
        let mut view = ResultView::new();
        tx.send(UiEvent::Pending { generation: 1 }).unwrap();
        tx.send(UiEvent::Completed {
            generation: 1,
            rows: vec![],
            status: SearchStatus::NoMatches,
        })
        .unwrap();
        presenter.pump(&mut view);

        current.store(2, Ordering::Release);
        tx.send(UiEvent::Pending { generation: 2 }).unwrap();
        tx.send(UiEvent::Failed {
            generation: 2,
            error: "bad regex".to_string(),
        })
        .unwrap();
        presenter.pump(&mut view);
        assert_eq!(view.status(), SearchStatus::NoMatches);
        assert_eq!(presenter.last_error(), Some("bad regex"));
        assert!(presenter.is_settled());
    }

    #[test]
    fn test_settle_times_out_while_pending() {
        let (tx, mut presenter, _) = setup(1);
        let mut view = ResultView::new();
        tx.send(UiEvent::Pending { generation: 1 }).unwrap();
        assert!(!presenter.settle(&mut view, Duration::from_millis(20)));
        assert_eq!(view.status(), SearchStatus::Pending);
    }

    #[test]
    fn test_settle_returns_once_delivered() {
        let (tx, mut presenter, _) = setup(1);
        let mut view = ResultView::new();
        tx.send(UiEvent::Pending { generation: 1 }).unwrap();
        let sender = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(10));
            tx.send(UiEvent::Completed {
                generation: 1,
                rows: vec![row("late")],
                status: SearchStatus::Success,
            })
            .unwrap();
        });
        assert!(presenter.settle(&mut view, Duration::from_secs(5)));
        assert_eq!(view.labels(), vec!["late"]);
        sender.join().unwrap();
    }
}
