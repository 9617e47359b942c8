/// Easing curve applied to normalized animation progress.
///
/// Serialized names follow the editor vocabulary (`linear`, `easeIn`, `easeOut`, `easeInOut`); the
/// quadratic curves are the defaults behind those names.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Ease {
    /// `p`
    #[default]
    Linear,
    /// `p²`
    #[serde(rename = "easeIn", alias = "inQuad")]
    InQuad,
    /// `1-(1-p)²`
    #[serde(rename = "easeOut", alias = "outQuad")]
    OutQuad,
    /// `2p²` below one half, `1-(-2p+2)²/2` above.
    #[serde(rename = "easeInOut", alias = "inOutQuad")]
    InOutQuad,
    /// `p³`
    InCubic,
    /// `1-(1-p)³`
    OutCubic,
    /// Cubic ease-in/out.
    InOutCubic,
}

impl Ease {
    /// Apply this easing function to normalized progress `t`, clamped into `[0, 1]`.
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::InQuad => t * t,
            Self::OutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Self::InOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(2) / 2.0)
                }
            }
            Self::InCubic => t * t * t,
            Self::OutCubic => 1.0 - (1.0 - t).powi(3),
            Self::InOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(3) / 2.0)
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/ease.rs"]
mod tests;
