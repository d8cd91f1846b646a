use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("device timeout")]
    Timeout,
    #[error("device disconnected: {0}")]
    Disconnected(String),
    #[error("trace exhausted after {0} samples")]
    TraceExhausted(usize),
}
