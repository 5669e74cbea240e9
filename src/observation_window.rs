//! Publication windows of the national forecast service
//!
//! The service publishes on a fixed schedule: nowcast observations every hour,
//! short-range forecasts eight times a day. Requests must name the latest
//! published window, expressed as a `base_date` (`YYYYMMDD`) and a
//! `base_time` (`HHMM`).

use chrono::{Days, NaiveDate, NaiveDateTime, Timelike};

/// Forecast publication hours
pub const FORECAST_HOURS: [u32; 8] = [2, 5, 8, 11, 14, 17, 20, 23];

/// Kind of product requested from the service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowKind {
    /// Hourly observations of the current hour
    Nowcast,
    /// Short-range forecast
    Forecast,
}

/// A published data window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservationWindow {
    /// `YYYYMMDD`
    pub base_date: String,
    /// `HHMM`
    pub base_time: String,
}

impl ObservationWindow {
    fn new(date: NaiveDate, hour: u32) -> Self {
        Self {
            base_date: date.format("%Y%m%d").to_string(),
            base_time: format!("{:02}00", hour),
        }
    }
}

fn previous_day(date: NaiveDate) -> NaiveDate {
    date.checked_sub_days(Days::new(1)).unwrap_or(date)
}

/// Select the latest window published at `now`.
pub fn select_window(now: NaiveDateTime, kind: WindowKind) -> ObservationWindow {
    let date = now.date();
    let hour = now.hour();

    match kind {
        WindowKind::Nowcast => {
            if now.minute() == 0 {
                // The on-the-hour observation is not out yet
                if hour == 0 {
                    ObservationWindow::new(previous_day(date), 23)
                } else {
                    ObservationWindow::new(date, hour - 1)
                }
            } else {
                ObservationWindow::new(date, hour)
            }
        }
        WindowKind::Forecast => match FORECAST_HOURS.iter().rev().find(|&&h| h <= hour) {
            Some(&h) => ObservationWindow::new(date, h),
            None => ObservationWindow::new(previous_day(date), 23),
        },
    }
}
