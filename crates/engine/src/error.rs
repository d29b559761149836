use thiserror::Error;

/// A value from the panel that names nothing we know.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown stats source: {0}")]
    UnknownSource(String),

    #[error("unknown period: {0}")]
    UnknownPeriod(String),

    #[error("unknown chart type: {0}")]
    UnknownChartType(String),

    #[error("unknown city view: {0}")]
    UnknownView(String),

    #[error("invalid scale: {0}")]
    InvalidScale(String),
}
