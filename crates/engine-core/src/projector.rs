use crate::error::PipelineError;
use model::records::row::Row;

/// Picks fields by one-based position. Positions may repeat or be reordered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnProjector {
    indexes: Vec<usize>,
}

impl ColumnProjector {
    /// Parses a comma-separated list such as `3,1,1`.
    pub fn parse(text: &str) -> Result<Self, PipelineError> {
        let indexes = text
            .trim()
            .split(',')
            .map(|part| match part.trim().parse::<usize>() {
                Ok(position) if position > 0 => Ok(position - 1),
                _ => Err(PipelineError::Configuration(format!(
                    "invalid column position {part:?} in only-columns {text:?}"
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ColumnProjector { indexes })
    }

    pub fn positions(&self) -> impl Iterator<Item = usize> + '_ {
        self.indexes.iter().map(|index| index + 1)
    }

    pub fn project(&self, row: Row) -> Result<Row, PipelineError> {
        self.indexes
            .iter()
            .map(|&index| {
                row.get(index)
                    .cloned()
                    .ok_or(PipelineError::Projection {
                        position: index + 1,
                        len: row.len(),
                    })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::row;

    #[test]
    fn reorders_and_repeats() {
        let projector = ColumnProjector::parse("3, 1,1").unwrap();
        assert_eq!(projector.positions().collect::<Vec<_>>(), vec![3, 1, 1]);
        assert_eq!(
            projector.project(row!["a", "b", "c"]).unwrap(),
            row!["c", "a", "a"]
        );
    }

    #[test]
    fn out_of_range_position_fails() {
        let projector = ColumnProjector::parse("2").unwrap();
        let err = projector.project(row!["only"]).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Projection {
                position: 2,
                len: 1
            }
        ));
    }

    #[test]
    fn rejects_malformed_lists() {
        assert!(ColumnProjector::parse("0").is_err());
        assert!(ColumnProjector::parse("1,x").is_err());
        assert!(ColumnProjector::parse("1,,2").is_err());
        assert!(ColumnProjector::parse("-1").is_err());
    }
}
