//! Up/down recall over a session's command history.
//!
//! The cursor ranges over `[0, len]`; `len` means the user is editing fresh input.
//! Nothing here mutates the history itself.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recall {
    pub index: usize,
    /// Text for the input line. Empty clears it.
    pub text: String,
}

pub fn recall_previous(history: &[String], index: usize) -> Recall {
    let index = index.min(history.len());
    if index > 0 {
        let index = index - 1;
        return Recall {
            index,
            text: history[index].clone(),
        };
    }

    // Floor: stay on the oldest entry.
    Recall {
        index: 0,
        text: history.first().cloned().unwrap_or_default(),
    }
}

pub fn recall_next(history: &[String], index: usize) -> Recall {
    let index = index.min(history.len());
    if index + 1 < history.len() {
        let index = index + 1;
        return Recall {
            index,
            text: history[index].clone(),
        };
    }

    Recall {
        index: history.len(),
        text: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history() -> Vec<String> {
        vec!["ls".to_string(), "pwd".to_string(), "whoami".to_string()]
    }

    #[test]
    fn previous_walks_back_and_floors_at_oldest() {
        let h = history();
        let r = recall_previous(&h, 3);
        assert_eq!(r, Recall { index: 2, text: "whoami".into() });
        let r = recall_previous(&h, r.index);
        let r = recall_previous(&h, r.index);
        assert_eq!(r, Recall { index: 0, text: "ls".into() });
        for _ in 0..5 {
            assert_eq!(recall_previous(&h, 0), Recall { index: 0, text: "ls".into() });
        }
    }

    #[test]
    fn next_moves_past_newest_then_stabilizes() {
        let h = history();
        assert_eq!(recall_next(&h, 0), Recall { index: 1, text: "pwd".into() });
        assert_eq!(recall_next(&h, 1), Recall { index: 2, text: "whoami".into() });
        assert_eq!(recall_next(&h, 2), Recall { index: 3, text: String::new() });
        assert_eq!(recall_next(&h, 3), Recall { index: 3, text: String::new() });
    }

    #[test]
    fn empty_history_is_inert() {
        let h: Vec<String> = Vec::new();
        assert_eq!(recall_previous(&h, 0), Recall { index: 0, text: String::new() });
        assert_eq!(recall_next(&h, 0), Recall { index: 0, text: String::new() });
    }

    #[test]
    fn out_of_range_cursor_is_clamped() {
        let h = history();
        assert_eq!(recall_previous(&h, 40), Recall { index: 2, text: "whoami".into() });
        assert_eq!(recall_next(&h, 40), Recall { index: 3, text: String::new() });
    }
}
