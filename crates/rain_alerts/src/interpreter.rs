//! Forecast interpreter: raw forecast document to rain judgement.
//!
//! Pure and total: documents have already been validated by the client, and
//! anything that still fails to convert is shown as the raw timestamp.

use chrono::format::{Item, StrftimeItems};
use chrono_tz::Tz;
use common::config::DisplayConfig;
use common::{Error, ForecastDocument, ForecastJudgement, ForecastRecord};
use sataako_client::{parse_record_time, parse_timezone};

#[derive(Debug, Clone)]
pub struct Interpreter {
    display_tz: Tz,
    eta_format: String,
}

impl Interpreter {
    pub fn new(display_tz: Tz, eta_format: &str) -> Result<Self, Error> {
        if eta_format.is_empty()
            || StrftimeItems::new(eta_format).any(|item| matches!(item, Item::Error))
        {
            return Err(Error::Config(format!(
                "invalid ETA format {eta_format:?}"
            )));
        }
        Ok(Self {
            display_tz,
            eta_format: eta_format.to_string(),
        })
    }

    pub fn from_config(display: &DisplayConfig) -> Result<Self, Error> {
        let tz = parse_timezone(&display.timezone).ok_or_else(|| {
            Error::Config(format!("unknown display timezone {:?}", display.timezone))
        })?;
        Self::new(tz, &display.eta_format)
    }

    /// The first step decides whether it is raining now; the first step
    /// whose wet/dry sign differs is the change ETA. Scanning stops there.
    pub fn interpret(&self, doc: &ForecastDocument) -> ForecastJudgement {
        let mut steps = doc.forecasts.iter();
        let Some(first) = steps.next() else {
            return ForecastJudgement {
                is_raining: None,
                change_eta: None,
                accumulation_mm: doc.accumulation,
            };
        };

        let raining = first.is_wet();
        let change_eta = steps
            .find(|record| record.is_wet() != raining)
            .map(|record| self.display_time(record, doc));

        ForecastJudgement {
            is_raining: Some(raining),
            change_eta,
            accumulation_mm: doc.accumulation,
        }
    }

    fn display_time(&self, record: &ForecastRecord, doc: &ForecastDocument) -> String {
        parse_timezone(&doc.timezone)
            .and_then(|tz| parse_record_time(&record.time, &doc.time_format, &tz))
            .map(|t| {
                t.with_timezone(&self.display_tz)
                    .format(&self.eta_format)
                    .to_string()
            })
            .unwrap_or_else(|| record.time.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FMT: &str = "%Y-%m-%d %H:%M:%S";

    fn helsinki() -> Interpreter {
        Interpreter::new(chrono_tz::Europe::Helsinki, "%H:%M").expect("valid format")
    }

    fn make_doc(steps: &[(&str, f64)], accumulation: f64) -> ForecastDocument {
        ForecastDocument {
            forecasts: steps
                .iter()
                .map(|(time, rain)| ForecastRecord {
                    time: (*time).into(),
                    rain_intensity: *rain,
                })
                .collect(),
            accumulation,
            time_format: FMT.into(),
            timezone: "UTC".into(),
        }
    }

    #[test]
    fn test_empty_forecast_is_unknown() {
        let judgement = helsinki().interpret(&make_doc(&[], 0.0));
        assert_eq!(judgement.is_raining, None);
        assert_eq!(judgement.change_eta, None);
        assert!(!judgement.about_to_rain());
    }

    #[test]
    fn test_no_sign_change_leaves_eta_unset() {
        let interp = helsinki();
        for len in [1usize, 2, 5, 24] {
            let dry: Vec<(&str, f64)> = (0..len).map(|_| ("2026-10-15 12:00:00", 0.0)).collect();
            let wet: Vec<(&str, f64)> = (0..len).map(|_| ("2026-10-15 12:00:00", 0.7)).collect();

            let dry_j = interp.interpret(&make_doc(&dry, 0.0));
            assert_eq!(dry_j.is_raining, Some(false));
            assert_eq!(dry_j.change_eta, None, "len={len}");

            let wet_j = interp.interpret(&make_doc(&wet, 3.0));
            assert_eq!(wet_j.is_raining, Some(true));
            assert_eq!(wet_j.change_eta, None, "len={len}");
        }
    }

    #[test]
    fn test_first_change_converted_to_display_zone() {
        let doc = make_doc(
            &[
                ("2026-10-15 09:00:00", 0.0),
                ("2026-10-15 09:05:00", 0.0),
                ("2026-10-15 09:10:00", 1.2),
                ("2026-10-15 09:15:00", 0.0),
                ("2026-10-15 09:20:00", 2.0),
            ],
            0.6,
        );
        let judgement = helsinki().interpret(&doc);

        assert_eq!(judgement.is_raining, Some(false));
        // Helsinki is UTC+3 in October before the DST switch.
        assert_eq!(judgement.change_eta.as_deref(), Some("12:10"));
        assert!((judgement.accumulation_mm - 0.6).abs() < 1e-9);
        assert!(judgement.about_to_rain());
    }

    #[test]
    fn test_rain_stopping_sets_eta() {
        let doc = make_doc(
            &[("2026-10-15 09:00:00", 0.5), ("2026-10-15 09:05:00", 0.0)],
            0.1,
        );
        let judgement = helsinki().interpret(&doc);
        assert_eq!(judgement.is_raining, Some(true));
        assert_eq!(judgement.change_eta.as_deref(), Some("12:05"));
        assert!(!judgement.about_to_rain());
    }

    #[test]
    fn test_records_after_change_are_not_read() {
        // The trailing record is unreadable; the scan must stop before it.
        let mut doc = make_doc(
            &[("2026-10-15 09:00:00", 0.0), ("2026-10-15 09:05:00", 0.3)],
            0.0,
        );
        doc.forecasts.push(ForecastRecord {
            time: "garbage".into(),
            rain_intensity: 0.0,
        });
        let judgement = helsinki().interpret(&doc);
        assert_eq!(judgement.change_eta.as_deref(), Some("12:05"));
    }

    #[test]
    fn test_source_zone_is_honoured() {
        let mut doc = make_doc(
            &[("2026-10-15 12:00:00", 0.0), ("2026-10-15 12:30:00", 0.9)],
            0.0,
        );
        doc.timezone = "Europe/Helsinki".into();
        let utc = Interpreter::new(chrono_tz::UTC, "%H:%M").expect("valid");
        assert_eq!(utc.interpret(&doc).change_eta.as_deref(), Some("09:30"));
    }

    #[test]
    fn test_unconvertible_time_falls_back_to_raw() {
        let mut doc = make_doc(&[("a", 0.0), ("b", 0.4)], 0.0);
        doc.time_format = "%Y".into();
        assert_eq!(helsinki().interpret(&doc).change_eta.as_deref(), Some("b"));
    }

    #[test]
    fn test_invalid_eta_format_rejected() {
        assert!(Interpreter::new(chrono_tz::UTC, "%Q").is_err());
        assert!(Interpreter::new(chrono_tz::UTC, "").is_err());
        assert!(Interpreter::from_config(&DisplayConfig {
            timezone: "Nowhere/Special".into(),
            eta_format: "%H:%M".into(),
        })
        .is_err());
    }
}
