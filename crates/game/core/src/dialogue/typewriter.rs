//! Character-by-character text reveal.
//!
//! The reveal is pure bookkeeping: the runtime decides when to call
//! [`Typewriter::advance`] (one call per interval) and [`Typewriter::skip`]
//! (player advance). Completion is reported exactly once, whichever of the
//! two reaches the end first.

/// Result of one reveal call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RevealStep {
    /// Number of visible characters after this call.
    Revealed(usize),
    /// The text just became fully visible. Returned once per text.
    Completed,
    /// The text was already fully visible before this call.
    AlreadyComplete,
}

#[derive(Clone, Debug, Default)]
pub struct Typewriter {
    chars: Vec<char>,
    visible: usize,
    completed: bool,
}

impl Typewriter {
    pub fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            visible: 0,
            completed: false,
        }
    }

    /// Reveals one more character.
    pub fn advance(&mut self) -> RevealStep {
        if self.completed {
            return RevealStep::AlreadyComplete;
        }
        if self.visible < self.chars.len() {
            self.visible += 1;
        }
        if self.visible >= self.chars.len() {
            self.completed = true;
            RevealStep::Completed
        } else {
            RevealStep::Revealed(self.visible)
        }
    }

    /// Reveals the remaining text at once.
    pub fn skip(&mut self) -> RevealStep {
        if self.completed {
            return RevealStep::AlreadyComplete;
        }
        self.visible = self.chars.len();
        self.completed = true;
        RevealStep::Completed
    }

    pub fn is_complete(&self) -> bool {
        self.completed
    }

    pub fn visible_text(&self) -> String {
        self.chars[..self.visible].iter().collect()
    }

    pub fn visible_len(&self) -> usize {
        self.visible
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_reported_once_by_timer() {
        let mut tw = Typewriter::new("hé!");
        assert_eq!(tw.advance(), RevealStep::Revealed(1));
        assert_eq!(tw.visible_text(), "h");
        assert_eq!(tw.advance(), RevealStep::Revealed(2));
        assert_eq!(tw.advance(), RevealStep::Completed);
        assert_eq!(tw.advance(), RevealStep::AlreadyComplete);
        assert_eq!(tw.skip(), RevealStep::AlreadyComplete);
        assert_eq!(tw.visible_text(), "hé!");
    }

    #[test]
    fn skip_mid_reveal_completes_once() {
        let mut tw = Typewriter::new("hello");
        tw.advance();
        assert_eq!(tw.skip(), RevealStep::Completed);
        assert_eq!(tw.visible_text(), "hello");
        assert_eq!(tw.advance(), RevealStep::AlreadyComplete);
    }

    #[test]
    fn empty_text_completes_on_first_call() {
        let mut tw = Typewriter::new("");
        assert_eq!(tw.advance(), RevealStep::Completed);
    }
}
