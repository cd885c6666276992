use thiserror::Error;

/// Errors raised while setting up a gauge.
///
/// Rendering itself never fails; everything here is caught before the first
/// frame is drawn.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GaugeError {
    #[error("no drawing surface named `{id}`")]
    SurfaceUnavailable { id: String },

    #[error("invalid color `{value}`: expected #rgb or #rrggbb")]
    InvalidColor { value: String },

    #[error("invalid font `{value}`: expected a CSS font with a px size, e.g. `36px Arial`")]
    InvalidFont { value: String },

    #[error("color bands must contain a threshold at 0")]
    MissingBaseBand,

    #[error("invalid {field}: {value}")]
    InvalidGeometry { field: &'static str, value: f64 },

    #[error("tick marks are enabled but tickMark.number is 0")]
    NoTickMarks,
}

pub type Result<T, E = GaugeError> = std::result::Result<T, E>;
