/// Reasons a four-point selection cannot define a usable transform.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationError {
    #[error("calibration corners {corner} and its neighbours are collinear or repeated")]
    CollinearCorners { corner: usize },
    #[error("calibration corners do not form a convex quadrilateral (self-crossing or concave)")]
    NotConvex,
    #[error("calibration transform is singular")]
    SingularTransform,
}
