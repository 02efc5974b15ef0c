use thiserror::Error;

/// Failures of a single provider call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Network failure, timeout or an undecodable provider body.
    #[error("transport failure: {0}")]
    TransportFailure(String),

    /// Non-success status from the provider, or no credential configured.
    #[error("provider rejected request{}: {detail}", .status.map(|s| format!(" ({})", s)).unwrap_or_default())]
    ProviderRejected { status: Option<u16>, detail: String },

    /// Success status but no usable content.
    #[error("provider returned an empty completion")]
    EmptyCompletion,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("response contains no parseable JSON object")]
    NoJsonObject,
}

/// The extracted object does not satisfy the output contract.
#[derive(Error, Debug, Clone, Default, PartialEq, Eq)]
#[error("schema violation (missing: [{}], invalid: [{}])", .missing_fields.join(", "), .invalid_fields.join(", "))]
pub struct SchemaViolation {
    pub missing_fields: Vec<String>,
    pub invalid_fields: Vec<String>,
}

impl SchemaViolation {
    pub fn missing(&mut self, field: impl Into<String>) {
        self.missing_fields.push(field.into());
    }

    pub fn invalid(&mut self, field: impl Into<String>) {
        self.invalid_fields.push(field.into());
    }

    pub fn is_empty(&self) -> bool {
        self.missing_fields.is_empty() && self.invalid_fields.is_empty()
    }

    /// `Ok(value)` when nothing was recorded, the violation otherwise.
    pub fn into_result<T>(self, value: T) -> Result<T, SchemaViolation> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("incomplete plan: {generated} day(s) generated, {requested} requested")]
pub struct IncompletePlan {
    pub requested: usize,
    pub generated: usize,
}

/// How a failure is surfaced to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller sent a bad request.
    InputInvalid,
    /// Provider unreachable, rejecting, or silent.
    Provider,
    /// Provider answered but the answer breaks the output contract.
    Contract,
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("invalid input: {0}")]
    InputInvalid(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Schema(#[from] SchemaViolation),

    #[error(transparent)]
    IncompletePlan(#[from] IncompletePlan),
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::InputInvalid(_) => ErrorKind::InputInvalid,
            PipelineError::Gateway(_) => ErrorKind::Provider,
            PipelineError::Extraction(_)
            | PipelineError::Schema(_)
            | PipelineError::IncompletePlan(_) => ErrorKind::Contract,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(PipelineError::InputInvalid("x".into()).kind(), ErrorKind::InputInvalid);
        assert_eq!(PipelineError::from(GatewayError::EmptyCompletion).kind(), ErrorKind::Provider);
        assert_eq!(PipelineError::from(ExtractionError::NoJsonObject).kind(), ErrorKind::Contract);
        assert_eq!(
            PipelineError::from(IncompletePlan { requested: 7, generated: 3 }).kind(),
            ErrorKind::Contract
        );
    }

    #[test]
    fn test_display_messages() {
        let rejected = GatewayError::ProviderRejected {
            status: Some(429),
            detail: "rate limited".into(),
        };
        assert_eq!(rejected.to_string(), "provider rejected request (429): rate limited");

        let mut violation = SchemaViolation::default();
        violation.missing("food");
        violation.invalid("calories");
        assert_eq!(
            violation.to_string(),
            "schema violation (missing: [food], invalid: [calories])"
        );
    }
}
