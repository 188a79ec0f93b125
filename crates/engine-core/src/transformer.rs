use crate::error::PipelineError;
use connectors::adapter::{FieldConverter, RowTransform, TransformOutput};
use model::records::row::{Row, RowOutcome};

/// Applies the configured per-field converters or whole-row transform.
pub enum RowTransformer {
    Identity,
    Fields(Vec<Option<FieldConverter>>),
    Row(Box<dyn RowTransform>),
}

impl From<TransformOutput> for RowTransformer {
    fn from(output: TransformOutput) -> Self {
        match output {
            TransformOutput::Identity => RowTransformer::Identity,
            TransformOutput::Fields(converters) => RowTransformer::Fields(converters),
            TransformOutput::Row(transform) => RowTransformer::Row(transform),
        }
    }
}

impl RowTransformer {
    pub fn apply(&mut self, row: Row) -> Result<RowOutcome, PipelineError> {
        match self {
            RowTransformer::Identity => Ok(RowOutcome::Value(row)),
            RowTransformer::Fields(converters) => {
                if converters.len() != row.len() {
                    return Err(PipelineError::Configuration(format!(
                        "{} field converter(s) configured for a row of {} field(s)",
                        converters.len(),
                        row.len()
                    )));
                }
                row.into_iter()
                    .zip(converters.iter())
                    .map(|(field, converter)| match converter {
                        Some(convert) => convert(field).map_err(PipelineError::Transform),
                        None => Ok(field),
                    })
                    .collect::<Result<Row, _>>()
                    .map(RowOutcome::Value)
            }
            RowTransformer::Row(transform) => {
                transform.apply(row).map_err(PipelineError::Transform)
            }
        }
    }
}
