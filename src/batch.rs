// src/batch.rs
//! Greedy packing of formatted records into size-bounded delivery chunks.

use crate::ingest::normalize::Record;

/// Discord's message limit.
pub const DEFAULT_MAX_CHARS: usize = 2000;
pub const DEFAULT_SEPARATOR: &str = "\n\n";

/// Records plus their joined display text. Lengths are counted in characters.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    records: Vec<Record>,
    text: String,
}

impl Batch {
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Batcher {
    max_chars: usize,
    separator: String,
}

impl Default for Batcher {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CHARS)
    }
}

impl Batcher {
    pub fn new(max_chars: usize) -> Self {
        Self {
            max_chars,
            separator: DEFAULT_SEPARATOR.to_string(),
        }
    }

    /// One record per batch, whatever its size.
    pub fn one_per_record() -> Self {
        Self::new(0)
    }

    pub fn with_separator(mut self, separator: &str) -> Self {
        self.separator = separator.to_string();
        self
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Pack `records` in order. A record joins the open batch while
    /// `current + separator + next <= max_chars`; otherwise it opens a new one.
    /// A record longer than `max_chars` on its own becomes a single-record batch;
    /// it is never split or dropped.
    pub fn pack<F>(&self, records: &[Record], formatter: F) -> Vec<Batch>
    where
        F: Fn(&Record) -> String,
    {
        let sep_len = self.separator.chars().count();
        let mut out = Vec::new();
        let mut current: Option<(Batch, usize)> = None;

        for rec in records {
            let text = formatter(rec);
            let len = text.chars().count();

            let fits = matches!(
                &current,
                Some((_, cur_len)) if *cur_len + sep_len + len <= self.max_chars
            );
            if fits {
                if let Some((batch, cur_len)) = current.as_mut() {
                    batch.text.push_str(&self.separator);
                    batch.text.push_str(&text);
                    batch.records.push(rec.clone());
                    *cur_len += sep_len + len;
                }
                continue;
            }

            if let Some((done, _)) = current.take() {
                out.push(done);
            }
            current = Some((
                Batch {
                    records: vec![rec.clone()],
                    text,
                },
                len,
            ));
        }

        if let Some((done, _)) = current {
            out.push(done);
        }
        out
    }
}
