// File: src/core/tokenizer.rs
use crate::core::frequency::SourceTally;
use crate::error::{ExpandError, ExpandResult};

/// CJK Unified Ideographs, Extension A and the compatibility block.
pub fn is_cjk(c: char) -> bool {
    matches!(c, '\u{3400}'..='\u{4DBF}' | '\u{4E00}'..='\u{9FFF}' | '\u{F900}'..='\u{FAFF}')
}

/// Keeps only the ideographs of `text`.
pub fn only_cjk(text: &str) -> String {
    text.chars().filter(|&c| is_cjk(c)).collect()
}

/// Splits unsegmented Chinese text into candidate words.
///
/// Every maximal run of ideographs yields all of its substrings whose length
/// is within `min_len..=max_len` characters. Anything else (latin text, SRT
/// cue numbers and `00:00:01,000 --> 00:00:02,000` timestamps, punctuation)
/// only acts as a run boundary.
#[derive(Debug, Clone, Copy)]
pub struct Tokenizer {
    min_len: usize,
    max_len: usize,
}

impl Tokenizer {
    pub fn new(min_len: usize, max_len: usize) -> ExpandResult<Self> {
        if min_len == 0 || min_len > max_len {
            return Err(ExpandError::InvalidThreshold(format!(
                "token length bounds must satisfy 1 <= min ({min_len}) <= max ({max_len})"
            )));
        }
        Ok(Self { min_len, max_len })
    }

    /// Adds every token of `text` to `tally`.
    /// O(n * (max_len - min_len + 1)) for n characters.
    pub fn count_into(&self, text: &str, tally: &mut SourceTally) {
        let mut run: Vec<char> = Vec::new();
        for c in text.chars() {
            if is_cjk(c) {
                run.push(c);
            } else if !run.is_empty() {
                self.count_run(&run, tally);
                run.clear();
            }
        }
        if !run.is_empty() {
            self.count_run(&run, tally);
        }
    }

    /// Returns the tokens of `text` in order of appearance.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let mut tokens = Vec::new();
        let mut run: Vec<char> = Vec::new();
        let flush = |run: &mut Vec<char>, tokens: &mut Vec<String>| {
            for (start, len) in self.spans(run.len()) {
                tokens.push(run[start..start + len].iter().collect());
            }
            run.clear();
        };
        for c in text.chars() {
            if is_cjk(c) {
                run.push(c);
            } else {
                flush(&mut run, &mut tokens);
            }
        }
        flush(&mut run, &mut tokens);
        tokens
    }

    fn count_run(&self, run: &[char], tally: &mut SourceTally) {
        let mut token = String::new();
        for (start, len) in self.spans(run.len()) {
            token.clear();
            token.extend(&run[start..start + len]);
            tally.add(&token, 1);
        }
    }

    fn spans(&self, run_len: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..run_len).flat_map(move |start| {
            let longest = self.max_len.min(run_len - start);
            (self.min_len..=longest).map(move |len| (start, len))
        })
    }
}
