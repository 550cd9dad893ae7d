use shapeval_operators::OpError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PlanError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("malformed shape tree: {0}")]
    MalformedShapeTree(String),

    #[error(transparent)]
    Op(#[from] OpError),
}

impl From<shapeval_core::Error> for PlanError {
    fn from(e: shapeval_core::Error) -> Self {
        PlanError::Op(e.into())
    }
}
