use crate::error::PipelineError;
use connectors::args::CommandArgs;
use serde::Serialize;

/// The row window of a run. Indexes are zero-based and the end is exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RangeWindow {
    pub start_index: Option<u64>,
    pub end_index: Option<u64>,
    /// Number of rows in the window, known when the end is.
    pub diff: Option<u64>,
}

/// Where a row falls relative to the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Before,
    Inside,
    /// The row is at or past the window end; no later row can be inside.
    End,
}

impl RangeWindow {
    /// `limit_rows` tightens the end to at most `start + limit_rows`.
    pub fn resolve(
        start_row: Option<u64>,
        end_row: Option<u64>,
        limit_rows: Option<u64>,
    ) -> Result<Self, PipelineError> {
        let mut end_index = end_row;
        if let Some(limit) = limit_rows {
            let limit_end = start_row.unwrap_or(0).saturating_add(limit);
            end_index = Some(end_index.map_or(limit_end, |end| end.min(limit_end)));
        }

        let diff = match end_index {
            Some(end) => {
                let start = start_row.unwrap_or(0);
                if end < start {
                    return Err(PipelineError::Configuration(format!(
                        "end row {end} is before start row {start}"
                    )));
                }
                Some(end - start)
            }
            None => None,
        };

        Ok(RangeWindow {
            start_index: start_row,
            end_index,
            diff,
        })
    }

    pub fn start_ordinal(&self) -> Option<u64> {
        self.start_index.map(|index| index + 1)
    }

    pub fn end_ordinal(&self) -> Option<u64> {
        self.end_index.map(|index| index + 1)
    }

    /// Classifies a row by its one-based ordinal.
    pub fn admit(&self, ordinal: u64) -> Admission {
        if self.start_ordinal().is_some_and(|start| ordinal < start) {
            Admission::Before
        } else if self.end_ordinal().is_some_and(|end| ordinal >= end) {
            Admission::End
        } else {
            Admission::Inside
        }
    }

    pub fn command_args(&self, batch_size: usize) -> CommandArgs {
        CommandArgs {
            start_row_index: self.start_index,
            start_row_ordinal: self.start_ordinal(),
            end_row_index: self.end_index,
            end_row_ordinal: self.end_ordinal(),
            start_end_row_diff: self.diff,
            batch_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_from_start_and_end() {
        let window = RangeWindow::resolve(Some(2), Some(5), None).unwrap();
        assert_eq!(window.start_ordinal(), Some(3));
        assert_eq!(window.end_ordinal(), Some(6));
        assert_eq!(window.diff, Some(3));

        let admitted = (1..=10)
            .filter(|ordinal| window.admit(*ordinal) == Admission::Inside)
            .collect::<Vec<_>>();
        assert_eq!(admitted, vec![3, 4, 5]);
        assert_eq!(window.admit(6), Admission::End);
        assert_eq!(window.admit(1), Admission::Before);
    }

    #[test]
    fn limit_takes_the_minimum() {
        let window = RangeWindow::resolve(Some(0), Some(100), Some(3)).unwrap();
        assert_eq!(window.end_index, Some(3));
        assert_eq!(window.diff, Some(3));

        let window = RangeWindow::resolve(Some(4), None, Some(2)).unwrap();
        assert_eq!(window.end_index, Some(6));

        let window = RangeWindow::resolve(None, Some(2), Some(10)).unwrap();
        assert_eq!(window.end_index, Some(2));
    }

    #[test]
    fn index_zero_is_a_real_bound() {
        let window = RangeWindow::resolve(Some(0), Some(0), None).unwrap();
        assert_eq!(window.start_ordinal(), Some(1));
        assert_eq!(window.diff, Some(0));
        assert_eq!(window.admit(1), Admission::End);
    }

    #[test]
    fn unbounded_window_admits_everything() {
        let window = RangeWindow::resolve(None, None, None).unwrap();
        assert_eq!(window.start_ordinal(), None);
        assert_eq!(window.end_ordinal(), None);
        assert_eq!(window.diff, None);
        assert_eq!(window.admit(1_000_000), Admission::Inside);
    }

    #[test]
    fn end_before_start_is_rejected() {
        let err = RangeWindow::resolve(Some(5), Some(2), None).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn command_args_mirror_the_window() {
        let args = RangeWindow::resolve(Some(1), Some(4), None)
            .unwrap()
            .command_args(50);
        assert_eq!(
            args,
            CommandArgs {
                start_row_index: Some(1),
                start_row_ordinal: Some(2),
                end_row_index: Some(4),
                end_row_ordinal: Some(5),
                start_end_row_diff: Some(3),
                batch_size: 50,
            }
        );
    }
}
