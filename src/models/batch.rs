use serde::Serialize;

/// Tally returned by operations that process many items independently:
/// one item's failure never aborts the rest.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport<R, E> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub success: usize,
    pub errors: usize,
    pub results: Vec<R>,
    pub errors_list: Vec<E>,
}

impl<R, E> BatchReport<R, E> {
    pub fn new(results: Vec<R>, failures: Vec<E>) -> Self {
        Self {
            message: None,
            success: results.len(),
            errors: failures.len(),
            results,
            errors_list: failures,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}
