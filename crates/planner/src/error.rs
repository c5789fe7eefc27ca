use thiserror::Error;

/// Result type for planner operations
pub type Result<T> = std::result::Result<T, PlannerError>;

/// Errors that can occur while planning or assembling a split
#[derive(Error, Debug)]
pub enum PlannerError {
    /// The renderer collaborator failed
    #[error("Render error: {0}")]
    Render(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Budget must be a positive number of lines
    #[error("Invalid budget: {0}")]
    InvalidBudget(usize),

    /// A finished plan broke one of its structural guarantees
    #[error("Invalid plan: {0}")]
    InvalidPlan(String),

    /// Output naming could not be derived
    #[error("Invalid output name: {0}")]
    InvalidName(String),
}

impl PlannerError {
    /// Wrap a renderer failure
    pub fn render<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Render(Box::new(err))
    }

    /// Create an invalid plan error
    pub fn invalid_plan(msg: impl Into<String>) -> Self {
        Self::InvalidPlan(msg.into())
    }

    /// Create an invalid name error
    pub fn invalid_name(msg: impl Into<String>) -> Self {
        Self::InvalidName(msg.into())
    }
}
