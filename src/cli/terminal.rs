//! Line-oriented picker for terminals.
//!
//! Every typed line replaces the query. `:N` selects row N of the last list,
//! `:q` or end of input dismisses the picker.

use std::io::Write;
use std::path::Path;
use std::process::Command;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use tagnav::error::{Result, TagError};
use tagnav::{Editor, PickerEvent, PickerItem, Presenter};

type SharedItems = Arc<Mutex<Vec<PickerItem>>>;

#[derive(Default)]
pub struct TerminalPresenter {
    items: SharedItems,
}

impl TerminalPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// List currently on screen, read by the input task to resolve `:N`
    pub fn items(&self) -> SharedItems {
        Arc::clone(&self.items)
    }
}

impl Presenter for TerminalPresenter {
    fn show_items(&mut self, items: Vec<PickerItem>) {
        let mut err = std::io::stderr().lock();
        if items.is_empty() {
            let _ = writeln!(err, "  (no matches)");
        }
        for (i, item) in items.iter().enumerate() {
            let _ = writeln!(err, "{:>4}  {}", i + 1, item);
        }
        let _ = write!(err, "> ");
        let _ = err.flush();
        *self.items.lock().unwrap_or_else(PoisonError::into_inner) = items;
    }

    fn set_busy(&mut self, busy: bool) {
        if busy {
            eprintln!("searching...");
        }
    }

    fn set_value(&mut self, value: &str) {
        eprintln!("> {}", value);
    }

    fn notify(&mut self, message: &str) {
        eprintln!("{}", message);
    }
}

enum Line {
    Query(String),
    Pick(usize),
    Quit,
}

fn classify(line: &str) -> Line {
    let line = line.trim_end_matches(&['\n', '\r'][..]);
    match line.strip_prefix(':') {
        Some("q") => Line::Quit,
        Some(n) => match n.trim().parse::<usize>() {
            Ok(n) => Line::Pick(n),
            Err(_) => Line::Query(line.to_string()),
        },
        None => Line::Query(line.to_string()),
    }
}

/// Reads stdin lines and forwards them as picker events until a selection,
/// a dismissal, or the session dropping its receiver.
pub fn spawn_stdin_events(tx: mpsc::Sender<PickerEvent>, items: SharedItems) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    let _ = tx.send(PickerEvent::Dismiss).await;
                    return;
                }
                Err(e) => {
                    tracing::error!("Failed to read input: {}", e);
                    let _ = tx.send(PickerEvent::Dismiss).await;
                    return;
                }
            };

            let event = match classify(&line) {
                Line::Quit => PickerEvent::Dismiss,
                Line::Query(query) => PickerEvent::Input(query),
                Line::Pick(n) => {
                    let picked = items
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .get(n.wrapping_sub(1))
                        .cloned();
                    match picked {
                        Some(item) => PickerEvent::Select(item),
                        None => {
                            eprintln!("No row {}", n);
                            continue;
                        }
                    }
                }
            };

            let last = !matches!(event, PickerEvent::Input(_));
            if tx.send(event).await.is_err() || last {
                return;
            }
        }
    });
}

/// Prints `path:line`, or opens `$EDITOR` at the line
pub struct TerminalEditor {
    pub open: bool,
}

impl Editor for TerminalEditor {
    fn open_and_reveal(&self, path: &Path, line: u32) -> Result<()> {
        let line = line + 1;
        if !self.open {
            println!("{}:{}", path.display(), line);
            return Ok(());
        }

        let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());
        let status = Command::new(&editor)
            .arg(format!("+{}", line))
            .arg(path)
            .status()?;
        if !status.success() {
            return Err(TagError::Config(format!("{} exited with {}", editor, status)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_lines() {
        assert!(matches!(classify(":q"), Line::Quit));
        assert!(matches!(classify(":3"), Line::Pick(3)));
        assert!(matches!(classify("foo\r\n"), Line::Query(q) if q == "foo"));
        assert!(matches!(classify(":x"), Line::Query(q) if q == ":x"));
        assert!(matches!(classify(">"), Line::Query(q) if q == ">"));
    }
}
