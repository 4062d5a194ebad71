pub type ChartResult<T> = Result<T, ChartError>;

#[derive(thiserror::Error, Debug)]
pub enum ChartError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("data error: {0}")]
    Data(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ChartError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn data(msg: impl Into<String>) -> Self {
        Self::Data(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }
}

impl From<csv::Error> for ChartError {
    fn from(e: csv::Error) -> Self {
        Self::Data(e.to_string())
    }
}

impl From<image::ImageError> for ChartError {
    fn from(e: image::ImageError) -> Self {
        Self::Encode(e.to_string())
    }
}
