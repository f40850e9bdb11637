use std::sync::Arc;

use chrono::{Datelike, Days, NaiveDate, Weekday};

use crate::assets::decode::{decode_image, encode_png};
use crate::assets::normalize::normalize_to_canvas;
use crate::foundation::config::KeyConventions;
use crate::foundation::core::Canvas;
use crate::foundation::error::{InkframeError, InkframeResult};
use crate::providers::ImageGenerator;
use crate::store::ObjectStore;

/// The Monday on or after `today`.
pub fn next_week_start(today: NaiveDate) -> NaiveDate {
    let ahead = (7 - today.weekday().num_days_from_monday()) % 7;
    today + Days::new(u64::from(ahead))
}

/// Outcome of one weekly batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct WeeklyReport {
    pub written: Vec<String>,
    pub failed: usize,
}

/// Batch job that pre-generates a week of backgrounds, one per (day, prompt).
pub struct WeeklyArtGenerator {
    store: Arc<dyn ObjectStore>,
    generator: Arc<dyn ImageGenerator>,
    keys: KeyConventions,
    prompts: Vec<String>,
    canvas: Canvas,
}

impl WeeklyArtGenerator {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        generator: Arc<dyn ImageGenerator>,
        keys: KeyConventions,
        prompts: Vec<String>,
        canvas: Canvas,
    ) -> Self {
        Self {
            store,
            generator,
            keys,
            prompts,
            canvas,
        }
    }

    /// Generate and store the week starting on `week_start`, which must be a Monday.
    ///
    /// Generation and decode failures are skipped. An unavailable store aborts the batch.
    #[tracing::instrument(skip(self), fields(prompts = self.prompts.len()))]
    pub fn generate_week(&self, week_start: NaiveDate) -> InkframeResult<WeeklyReport> {
        if week_start.weekday() != Weekday::Mon {
            return Err(InkframeError::validation(format!(
                "week start {week_start} is not a Monday"
            )));
        }
        let mut report = WeeklyReport::default();
        for day_index in 0..7u32 {
            let date = week_start + Days::new(u64::from(day_index));
            let day_name = date.format("%A").to_string();
            for (variant_index, template) in self.prompts.iter().enumerate() {
                let variant_index = variant_index as u32;
                let prompt = template.replace("{day_name}", &day_name);
                let key = self.keys.fresh_key(week_start, day_index, variant_index);
                match self.generate_one(&prompt) {
                    Ok(png) => {
                        self.store.write(&key, &png, "image/png")?;
                        tracing::info!(key = %key, "weekly background written");
                        report.written.push(key);
                    }
                    Err(e) => {
                        tracing::warn!(day_index, variant_index, error = %e, "weekly generation failed");
                        report.failed += 1;
                    }
                }
            }
        }
        Ok(report)
    }

    fn generate_one(&self, prompt: &str) -> InkframeResult<Vec<u8>> {
        let bytes = self.generator.generate(prompt)?;
        let img = normalize_to_canvas(decode_image(&bytes)?, self.canvas);
        encode_png(&img)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/weekly.rs"]
mod tests;
