//! Configuration validation.

use url::Url;

use crate::error::ConfigError;
use crate::schema::GuideConfig;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Turn the first error into a [`ConfigError`].
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, ConfigError> {
        match self.errors.into_iter().next() {
            Some(e) => Err(ConfigError::InvalidValue {
                field: e.path,
                message: e.message,
            }),
            None => Ok(self.warnings),
        }
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &GuideConfig) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_executor(config, &mut result);
        Self::validate_scroll(config, &mut result);
        Self::validate_cursor(config, &mut result);
        Self::validate_highlight(config, &mut result);
        Self::validate_session(config, &mut result);
        Self::validate_browser(config, &mut result);

        result
    }

    fn validate_executor(config: &GuideConfig, result: &mut ValidationResult) {
        let executor = &config.executor;
        if executor.automation_attribute.trim().is_empty() {
            result.add_error(ValidationError::new(
                "executor.automation_attribute",
                "Automation attribute cannot be empty",
            ));
        }

        if executor.advance_key.is_empty() {
            result.add_error(ValidationError::new(
                "executor.advance_key",
                "Advance key cannot be empty",
            ));
        }

        if executor.frame_interval_ms == 0 {
            result.add_error(ValidationError::new(
                "executor.frame_interval_ms",
                "frame_interval_ms must be greater than 0",
            ));
        }

        if executor.parked_margin < 0.0 {
            result.add_error(ValidationError::new(
                "executor.parked_margin",
                "parked_margin cannot be negative",
            ));
        }

        let total_exit = executor.hide_gap_ms + executor.exit_wait_ms;
        if total_exit > 5_000 {
            result.add_warning(ValidationWarning::new(
                "executor.exit_wait_ms",
                "Exit animation takes longer than 5 seconds",
            ));
        }
    }

    fn validate_scroll(config: &GuideConfig, result: &mut ValidationResult) {
        let scroll = &config.scroll;
        if !(0.0..=1.0).contains(&scroll.viewport_fraction) {
            result.add_error(ValidationError::new(
                "scroll.viewport_fraction",
                "viewport_fraction must be within [0, 1]",
            ));
        }

        if scroll.stable_frames == 0 {
            result.add_error(ValidationError::new(
                "scroll.stable_frames",
                "stable_frames must be greater than 0",
            ));
        }

        if scroll.settle_timeout_ms == 0 {
            result.add_error(ValidationError::new(
                "scroll.settle_timeout_ms",
                "settle_timeout_ms must be greater than 0",
            ));
        }

        let settle_window = u64::from(scroll.stable_frames) * config.executor.frame_interval_ms;
        if scroll.settle_timeout_ms > 0 && scroll.settle_timeout_ms < settle_window {
            result.add_warning(ValidationWarning::new(
                "scroll.settle_timeout_ms",
                "Timeout is shorter than the settle window; scrolls will always time out",
            ));
        }
    }

    fn validate_cursor(config: &GuideConfig, result: &mut ValidationResult) {
        let cursor = &config.cursor;
        if cursor.size <= 0.0 {
            result.add_error(ValidationError::new("cursor.size", "size must be positive"));
        }

        for (path, value) in [
            ("cursor.move_duration_ms", cursor.move_duration_ms),
            ("cursor.click_duration_ms", cursor.click_duration_ms),
            ("cursor.pulse_period_ms", cursor.pulse_period_ms),
        ] {
            if value == 0 {
                result.add_error(ValidationError::new(path, "Duration must be greater than 0"));
            }
        }

        if cursor.trail_length > 64 {
            result.add_warning(ValidationWarning::new(
                "cursor.trail_length",
                "Very long trails are expensive to redraw every frame",
            ));
        }
    }

    fn validate_highlight(config: &GuideConfig, result: &mut ValidationResult) {
        let highlight = &config.highlight;
        if highlight.trace_duration_ms == 0 {
            result.add_error(ValidationError::new(
                "highlight.trace_duration_ms",
                "trace_duration_ms must be greater than 0",
            ));
        }

        if highlight.pulse_period_ms == 0 {
            result.add_error(ValidationError::new(
                "highlight.pulse_period_ms",
                "pulse_period_ms must be greater than 0",
            ));
        }

        let (min, max) = (highlight.pulse_min_opacity, highlight.pulse_max_opacity);
        if !(0.0..=1.0).contains(&min) || !(0.0..=1.0).contains(&max) || min > max {
            result.add_error(ValidationError::new(
                "highlight.pulse_min_opacity",
                "Pulse opacity range must satisfy 0 <= min <= max <= 1",
            ));
        }

        if highlight.label_font_px <= 0.0 {
            result.add_error(ValidationError::new(
                "highlight.label_font_px",
                "label_font_px must be positive",
            ));
        }
    }

    fn validate_session(config: &GuideConfig, result: &mut ValidationResult) {
        let session = &config.session;
        if session.max_iterations == 0 {
            result.add_error(ValidationError::new(
                "session.max_iterations",
                "max_iterations must be greater than 0",
            ));
        }

        if session.max_iterations > 200 {
            result.add_warning(ValidationWarning::new(
                "session.max_iterations",
                "max_iterations is very high (>200), a confused model may loop for a long time",
            ));
        }

        if let Err(e) = Url::parse(&session.analyze_url) {
            result.add_error(ValidationError::new(
                "session.analyze_url",
                format!("Invalid URL: {}", e),
            ));
        }
    }

    fn validate_browser(config: &GuideConfig, result: &mut ValidationResult) {
        match Url::parse(&config.browser.cdp_endpoint) {
            Ok(url) if url.scheme() != "http" && url.scheme() != "https" => {
                result.add_error(ValidationError::new(
                    "browser.cdp_endpoint",
                    "CDP endpoint must be an http(s) URL",
                ));
            }
            Ok(_) => {}
            Err(e) => {
                result.add_error(ValidationError::new(
                    "browser.cdp_endpoint",
                    format!("Invalid URL: {}", e),
                ));
            }
        }

        if config.browser.call_timeout_secs == 0 {
            result.add_error(ValidationError::new(
                "browser.call_timeout_secs",
                "call_timeout_secs must be greater than 0",
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
