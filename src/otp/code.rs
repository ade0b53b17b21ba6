use super::OTP_LENGTH;

/// Six single-digit cells with their own focus.
///
/// Typing advances focus, backspace on an empty cell steps back and clears
/// the previous one, paste spreads digits from the first cell. Once all
/// cells are filled the code can be taken for submission exactly once until
/// the buffer is cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeInput {
    cells: [Option<char>; OTP_LENGTH],
    focus: usize,
    submitted: bool,
}

impl CodeInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn focus(&self) -> usize {
        self.focus
    }

    pub fn cells(&self) -> &[Option<char>; OTP_LENGTH] {
        &self.cells
    }

    /// Move focus to `index` (clicking a cell)
    pub fn set_focus(&mut self, index: usize) {
        self.focus = index.min(OTP_LENGTH - 1);
    }

    /// Type into the focused cell. Non-digits are ignored.
    pub fn input(&mut self, c: char) -> bool {
        if !c.is_ascii_digit() {
            return false;
        }
        self.cells[self.focus] = Some(c);
        if self.focus < OTP_LENGTH - 1 {
            self.focus += 1;
        }
        true
    }

    pub fn backspace(&mut self) {
        if self.cells[self.focus].is_some() {
            self.cells[self.focus] = None;
        } else if self.focus > 0 {
            self.focus -= 1;
            self.cells[self.focus] = None;
        }
    }

    /// Distribute the digits of `text` across the cells starting at index 0
    pub fn paste(&mut self, text: &str) {
        let digits: Vec<char> = text
            .chars()
            .filter(|c| c.is_ascii_digit())
            .take(OTP_LENGTH)
            .collect();
        if digits.is_empty() {
            return;
        }
        self.cells = [None; OTP_LENGTH];
        for (cell, digit) in self.cells.iter_mut().zip(&digits) {
            *cell = Some(*digit);
        }
        self.focus = digits.len().min(OTP_LENGTH - 1);
    }

    pub fn is_complete(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    /// The digits entered so far, in cell order, gaps skipped
    pub fn code(&self) -> String {
        self.cells.iter().flatten().collect()
    }

    /// Return the code for auto-submission.
    ///
    /// Yields `Some` only when all cells are filled, nothing is in flight,
    /// and this fill has not been handed out before.
    pub fn take_submission(&mut self, in_flight: bool) -> Option<String> {
        if self.submitted || in_flight || !self.is_complete() {
            return None;
        }
        self.submitted = true;
        Some(self.code())
    }

    /// Empty every cell and re-arm auto-submission
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
