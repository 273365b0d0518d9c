//! Tunable timings and thresholds for an [`ElementTree`](crate::element::ElementTree).
//!
//! A config can be built in code or read from the declarative format:
//!
//! ```text
//! long-click-delay 400
//! animation-curve "smooth"
//! show-focus-state 1
//! ```

use tracing::debug;

use crate::animation::AnimationCurve;
use crate::parser::Node;
use crate::value::Value;

/// Errors from reading a config document.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct UiConfig {
    /// How long a pointer must stay down before a long click fires.
    pub long_click_delay_ms: u64,
    /// Pointer travel, in pixels on either axis, that cancels a pending long click.
    pub pan_threshold: i32,
    pub animation_duration_ms: u64,
    pub animation_curve: AnimationCurve,
    /// Opacity factor applied when painting disabled elements.
    pub disabled_opacity: f32,
    pub show_focus_state: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            long_click_delay_ms: 500,
            pan_threshold: 5,
            animation_duration_ms: 200,
            animation_curve: AnimationCurve::SlowDown,
            disabled_opacity: 0.3,
            show_focus_state: false,
        }
    }
}

impl UiConfig {
    pub fn with_long_click_delay_ms(mut self, ms: u64) -> Self {
        self.long_click_delay_ms = ms;
        self
    }

    pub fn with_pan_threshold(mut self, px: i32) -> Self {
        self.pan_threshold = px;
        self
    }

    pub fn with_animation_duration_ms(mut self, ms: u64) -> Self {
        self.animation_duration_ms = ms;
        self
    }

    pub fn with_animation_curve(mut self, curve: AnimationCurve) -> Self {
        self.animation_curve = curve;
        self
    }

    pub fn with_disabled_opacity(mut self, opacity: f32) -> Self {
        self.disabled_opacity = opacity;
        self
    }

    pub fn with_show_focus_state(mut self, show: bool) -> Self {
        self.show_focus_state = show;
        self
    }

    /// Parse a config document. Keys that are absent keep their defaults.
    pub fn parse(text: &str) -> Result<UiConfig, ConfigError> {
        UiConfig::from_node(&Node::parse(text))
    }

    /// Read the config keys among the children of `node`.
    pub fn from_node(node: &Node) -> Result<UiConfig, ConfigError> {
        let mut config = UiConfig::default();
        for child in node.children() {
            let key = child.name();
            let value = child.value();
            match key {
                "long-click-delay" => config.long_click_delay_ms = non_negative(key, value)?,
                "pan-threshold" => config.pan_threshold = non_negative(key, value)? as i32,
                "animation-duration" => config.animation_duration_ms = non_negative(key, value)?,
                "animation-curve" => {
                    let name = value.as_string();
                    config.animation_curve = AnimationCurve::parse(&name).ok_or_else(|| {
                        ConfigError::InvalidValue {
                            key: key.to_owned(),
                            message: format!("unknown curve: {name}"),
                        }
                    })?;
                }
                "disabled-opacity" => {
                    let opacity = value.as_float();
                    if !(0.0..=1.0).contains(&opacity) {
                        return Err(ConfigError::InvalidValue {
                            key: key.to_owned(),
                            message: format!("expected 0..1, got {opacity}"),
                        });
                    }
                    config.disabled_opacity = opacity as f32;
                }
                "show-focus-state" => config.show_focus_state = value.as_int() != 0,
                other => debug!(key = other, "skipping unknown config key"),
            }
        }
        Ok(config)
    }
}

fn non_negative(key: &str, value: &Value) -> Result<u64, ConfigError> {
    let n = value.as_int();
    u64::try_from(n).map_err(|_| ConfigError::InvalidValue {
        key: key.to_owned(),
        message: format!("expected a non-negative integer, got {n}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = UiConfig::default();
        assert_eq!(config.long_click_delay_ms, 500);
        assert_eq!(config.animation_curve, AnimationCurve::SlowDown);
        assert!(!config.show_focus_state);
    }

    #[test]
    fn test_parse_overrides_some_keys() {
        let config = UiConfig::parse(
            "long-click-delay 400\nanimation-curve smooth\nshow-focus-state 1\ndisabled-opacity 0.5\n",
        )
        .unwrap();
        assert_eq!(
            config,
            UiConfig::default()
                .with_long_click_delay_ms(400)
                .with_animation_curve(AnimationCurve::Smooth)
                .with_show_focus_state(true)
                .with_disabled_opacity(0.5)
        );
    }

    #[test]
    fn test_unknown_curve_is_rejected() {
        let err = UiConfig::parse("animation-curve wobbly\n").unwrap_err();
        assert_eq!(err.to_string(), "invalid value for animation-curve: unknown curve: wobbly");
    }

    #[test]
    fn test_negative_delay_is_rejected() {
        assert!(UiConfig::parse("long-click-delay -1\n").is_err());
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let config = UiConfig::parse("colour red\npan-threshold 8\n").unwrap();
        assert_eq!(config.pan_threshold, 8);
    }
}
