//! Holiday book feeding the calendar view.
//!
//! Stored under [`HOLIDAYS_KEY`] as a `{"YYYY-MM-DD": "label"}` object. The
//! first time a year with no entries is requested it is seeded with the fixed
//! national holidays.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

use crate::{Error, Result, backend::Backend};

pub const HOLIDAYS_KEY: &str = "holidays";

/// `(month, day, label)` of the holidays every year starts with.
pub const NATIONAL_HOLIDAYS: [(u32, u32, &str); 5] = [
  (1, 1, "New Year's Day"),
  (1, 26, "Republic Day"),
  (8, 15, "Independence Day"),
  (10, 2, "Gandhi Jayanti"),
  (12, 25, "Christmas"),
];

pub type Holidays = BTreeMap<NaiveDate, String>;

/// Holidays of `year`, seeding the national set if the year has none yet.
pub fn for_year<B: Backend>(backend: &mut B, year: i32) -> Result<Holidays> {
  let mut all = load(backend);

  if !all.keys().any(|date| date.year() == year) {
    for (month, day, label) in NATIONAL_HOLIDAYS {
      if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
        all.insert(date, label.to_owned());
      }
    }
    save(backend, &all)?;
    tracing::debug!(year, "seeded national holidays");
  }

  Ok(all.into_iter().filter(|(date, _)| date.year() == year).collect())
}

/// Add or relabel a holiday.
pub fn add<B: Backend>(backend: &mut B, date: NaiveDate, label: &str) -> Result<()> {
  let label = label.trim();
  if label.is_empty() {
    return Err(Error::Validation("holiday label is required".into()));
  }
  // Seed first so a custom entry does not suppress the national set.
  for_year(backend, date.year())?;
  let mut all = load(backend);
  all.insert(date, label.to_owned());
  save(backend, &all)
}

fn load<B: Backend>(backend: &B) -> Holidays {
  match backend.get(HOLIDAYS_KEY) {
    Ok(Some(value)) => serde_json::from_value(value).unwrap_or_else(|err| {
      tracing::warn!(error = %err, "holiday book corrupt, treating as empty");
      Holidays::new()
    }),
    Ok(None) => Holidays::new(),
    Err(err) => {
      tracing::warn!(error = %err, "holiday book unreadable, treating as empty");
      Holidays::new()
    }
  }
}

fn save<B: Backend>(backend: &mut B, all: &Holidays) -> Result<()> {
  let value = serde_json::to_value(all)?;
  backend.put(HOLIDAYS_KEY, value).map_err(Error::storage)
}
