//! Integration tests for the interactive query loop, driven on paused time.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use tagnav::{
    AdminAction, PickerEvent, PickerItem, Presenter, QuerySession, SessionOptions,
    SessionOutcome, TagKind, TagRecord,
};

const DEBOUNCE: Duration = Duration::from_millis(300);

struct Recorder {
    shown: mpsc::UnboundedSender<Vec<PickerItem>>,
    busy: Vec<bool>,
    values: Vec<String>,
    notices: Vec<String>,
}

impl Presenter for Recorder {
    fn show_items(&mut self, items: Vec<PickerItem>) {
        let _ = self.shown.send(items);
    }

    fn set_busy(&mut self, busy: bool) {
        self.busy.push(busy);
    }

    fn set_value(&mut self, value: &str) {
        self.values.push(value.to_string());
    }

    fn notify(&mut self, message: &str) {
        self.notices.push(message.to_string());
    }
}

fn tag(name: &str, line: u32) -> TagRecord {
    TagRecord {
        name: name.to_string(),
        file_path: PathBuf::from("/work/src/lib.rs"),
        display_path: "src/lib.rs".to_string(),
        line_number: line,
        kind: TagKind::Function,
        scope: None,
    }
}

fn records() -> Arc<[TagRecord]> {
    Arc::from(vec![
        tag("foo", 1),
        tag("fooBar", 2),
        tag("food", 3),
        tag("bar", 4),
        tag("dup", 5),
        tag("dup", 9),
    ])
}

struct Harness {
    events: mpsc::Sender<PickerEvent>,
    shown: mpsc::UnboundedReceiver<Vec<PickerItem>>,
    session: JoinHandle<(SessionOutcome, Recorder)>,
}

fn start(seed: Option<&'static str>) -> Harness {
    let (events, rx) = mpsc::channel(16);
    let (shown_tx, shown) = mpsc::unbounded_channel();
    let session = tokio::spawn(async move {
        let mut recorder = Recorder {
            shown: shown_tx,
            busy: Vec::new(),
            values: Vec::new(),
            notices: Vec::new(),
        };
        let options = SessionOptions {
            debounce: DEBOUNCE,
            max_matches: 50,
        };
        let outcome = QuerySession::new(records(), options)
            .run(seed, &mut recorder, rx)
            .await;
        (outcome, recorder)
    });
    Harness {
        events,
        shown,
        session,
    }
}

fn names(items: &[PickerItem]) -> Vec<&str> {
    items
        .iter()
        .map(|item| match item {
            PickerItem::Tag(record) => record.name.as_str(),
            PickerItem::Action(action) => action.label(),
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_rapid_typing_searches_once() {
    let mut h = start(None);

    for value in ["f", "fo", "foo"] {
        h.events.send(PickerEvent::Input(value.to_string())).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    let items = h.shown.recv().await.unwrap();
    let shown = names(&items);
    assert_eq!(shown[0], "foo");
    assert!(shown.contains(&"fooBar"));
    assert!(shown.contains(&"food"));
    assert!(!shown.contains(&"bar"));

    h.events.send(PickerEvent::Dismiss).await.unwrap();
    let (outcome, recorder) = h.session.await.unwrap();
    assert_eq!(outcome, SessionOutcome::Cancelled);
    assert_eq!(recorder.busy, vec![true, false]);
    assert!(h.shown.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_dismiss_before_deadline_cancels_search() {
    let mut h = start(None);

    h.events.send(PickerEvent::Input("foo".to_string())).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    h.events.send(PickerEvent::Dismiss).await.unwrap();

    let (outcome, recorder) = h.session.await.unwrap();
    assert_eq!(outcome, SessionOutcome::Cancelled);
    assert!(recorder.busy.is_empty());
    assert!(h.shown.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_closed_event_stream_cancels() {
    let h = start(None);
    drop(h.events);
    let (outcome, _) = h.session.await.unwrap();
    assert_eq!(outcome, SessionOutcome::Cancelled);
}

#[tokio::test(start_paused = true)]
async fn test_command_mode_offers_actions() {
    let mut h = start(None);

    h.events.send(PickerEvent::Input("fo".to_string())).await.unwrap();
    h.events.send(PickerEvent::Input(">".to_string())).await.unwrap();

    let items = h.shown.recv().await.unwrap();
    assert_eq!(items, PickerItem::admin_actions());

    // The debounced "fo" must not replace the action list
    tokio::time::sleep(DEBOUNCE * 2).await;
    assert!(h.shown.try_recv().is_err());

    h.events
        .send(PickerEvent::Select(PickerItem::Action(AdminAction::ShowCommand)))
        .await
        .unwrap();
    let (outcome, recorder) = h.session.await.unwrap();
    assert_eq!(outcome, SessionOutcome::Action(AdminAction::ShowCommand));
    assert!(!recorder.busy.contains(&true));
}

#[tokio::test(start_paused = true)]
async fn test_selecting_a_tag_returns_it() {
    let mut h = start(None);

    h.events.send(PickerEvent::Input("food".to_string())).await.unwrap();
    let items = h.shown.recv().await.unwrap();
    let first = items.into_iter().next().expect("food should match");

    h.events.send(PickerEvent::Select(first.clone())).await.unwrap();
    let (outcome, _) = h.session.await.unwrap();
    match (first, outcome) {
        (PickerItem::Tag(expected), SessionOutcome::Selected(record)) => {
            assert_eq!(record, expected);
            assert_eq!(record.name, "food");
            assert_eq!(record.editor_line(), 2);
        }
        (_, outcome) => panic!("unexpected outcome {:?}", outcome),
    }
}

#[tokio::test(start_paused = true)]
async fn test_clearing_the_query_clears_the_list() {
    let mut h = start(None);

    h.events.send(PickerEvent::Input("food".to_string())).await.unwrap();
    assert!(!h.shown.recv().await.unwrap().is_empty());

    h.events.send(PickerEvent::Input(String::new())).await.unwrap();
    assert!(h.shown.recv().await.unwrap().is_empty());

    h.events.send(PickerEvent::Dismiss).await.unwrap();
    h.session.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_unique_seed_selects_without_picker() {
    let mut h = start(Some("bar"));

    let (outcome, recorder) = h.session.await.unwrap();
    assert_eq!(outcome, SessionOutcome::Selected(tag("bar", 4)));
    assert!(recorder.values.is_empty());
    assert!(h.shown.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_ambiguous_seed_shows_candidates() {
    let mut h = start(Some("dup"));

    let items = h.shown.recv().await.unwrap();
    assert_eq!(
        items,
        vec![PickerItem::Tag(tag("dup", 5)), PickerItem::Tag(tag("dup", 9))]
    );

    // Echoing the seed back does not trigger a search
    h.events.send(PickerEvent::Input("dup".to_string())).await.unwrap();
    tokio::time::sleep(DEBOUNCE * 2).await;
    assert!(h.shown.try_recv().is_err());

    h.events.send(PickerEvent::Dismiss).await.unwrap();
    let (_, recorder) = h.session.await.unwrap();
    assert_eq!(recorder.values, vec!["dup".to_string()]);
    assert!(recorder.busy.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_unknown_seed_falls_back_to_fuzzy_search() {
    let mut h = start(Some("fo"));

    let items = h.shown.recv().await.unwrap();
    assert!(names(&items).contains(&"foo"));

    h.events.send(PickerEvent::Dismiss).await.unwrap();
    let (_, recorder) = h.session.await.unwrap();
    assert_eq!(recorder.notices, vec!["Nothing found for fo".to_string()]);
    assert_eq!(recorder.values, vec!["fo".to_string()]);
}
