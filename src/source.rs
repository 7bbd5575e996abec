//! Record source: a small tagged cursor over account ids, either a
//! descending range scan or a pre-materialized array. No dynamic dispatch
//! is needed for two variants.

/// A single-use, forward-only cursor over candidate account ids.
#[derive(Debug)]
pub enum RecordSource {
    /// Walks `current` down to (and including) `0`, one step at a time.
    /// `None` once exhausted.
    Range {
        /// The next id to yield, or `None` if exhausted.
        current: Option<u32>,
    },
    /// A pre-built list of ids in caller-chosen order, walked front to back.
    Array {
        /// Backing ids.
        ids: Vec<u32>,
        /// Index of the next id to yield.
        pos: usize,
    },
}

impl RecordSource {
    /// A descending range cursor over `0..=max_id`.
    #[must_use]
    pub fn range(max_id: u32) -> Self {
        RecordSource::Range {
            current: Some(max_id),
        }
    }

    /// An array cursor over a pre-materialized, descending-sorted id list.
    #[must_use]
    pub fn array(mut ids: Vec<u32>) -> Self {
        ids.sort_unstable_by(|a, b| b.cmp(a));
        RecordSource::Array { ids, pos: 0 }
    }

    /// Advances the cursor and returns the next id, or `None` when
    /// exhausted. Cursors are single-use; there is no reset.
    pub fn next(&mut self) -> Option<u32> {
        match self {
            RecordSource::Range { current } => {
                let value = (*current)?;
                *current = value.checked_sub(1);
                Some(value)
            }
            RecordSource::Array { ids, pos } => {
                let value = ids.get(*pos).copied()?;
                *pos += 1;
                Some(value)
            }
        }
    }
}

impl Iterator for RecordSource {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        RecordSource::next(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_walks_descending_to_zero_inclusive() {
        let source = RecordSource::range(3);
        assert_eq!(source.collect::<Vec<_>>(), vec![3, 2, 1, 0]);
    }

    #[test]
    fn array_preserves_descending_order_regardless_of_input_order() {
        let source = RecordSource::array(vec![3, 1, 2]);
        assert_eq!(source.collect::<Vec<_>>(), vec![3, 2, 1]);
    }

    #[test]
    fn cursors_are_single_use() {
        let mut source = RecordSource::range(1);
        assert_eq!(source.next(), Some(1));
        assert_eq!(source.next(), Some(0));
        assert_eq!(source.next(), None);
        assert_eq!(source.next(), None);
    }
}
