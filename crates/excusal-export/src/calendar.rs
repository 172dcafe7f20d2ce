//! Month grid of request statuses and holidays.

use std::{
  collections::BTreeMap,
  fmt::{self, Write as _},
};

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use excusal_core::{
  holiday::Holidays,
  request::{Request, RequestStatus},
};

use crate::{Error, Result};

pub const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Status shown for each absence date. When several requests cover the same
/// date the most recently submitted one wins.
pub fn status_by_date<'a, I>(requests: I) -> BTreeMap<NaiveDate, RequestStatus>
where
  I: IntoIterator<Item = &'a Request>,
{
  let mut latest: BTreeMap<NaiveDate, (DateTime<Utc>, RequestStatus)> = BTreeMap::new();
  for r in requests {
    match latest.get(&r.date) {
      Some((at, _)) if *at > r.submitted_at => {}
      _ => {
        latest.insert(r.date, (r.submitted_at, r.status));
      }
    }
  }
  latest.into_iter().map(|(date, (_, status))| (date, status)).collect()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Day {
  pub date:    NaiveDate,
  pub today:   bool,
  pub status:  Option<RequestStatus>,
  pub holiday: Option<String>,
}

impl Day {
  fn marker(&self) -> char {
    match (self.status, &self.holiday) {
      (Some(RequestStatus::Pending), _) => '?',
      (Some(RequestStatus::Approved), _) => '+',
      (Some(RequestStatus::Rejected), _) => 'x',
      (None, Some(_)) => 'h',
      (None, None) => ' ',
    }
  }
}

/// One calendar month laid out in Sunday-first weeks. Cells outside the
/// month are `None`.
#[derive(Clone, Debug)]
pub struct MonthGrid {
  first:    NaiveDate,
  weeks:    Vec<[Option<Day>; 7]>,
  holidays: Vec<(NaiveDate, String)>,
}

impl MonthGrid {
  pub fn new(
    year: i32,
    month: u32,
    today: NaiveDate,
    statuses: &BTreeMap<NaiveDate, RequestStatus>,
    holidays: &Holidays,
  ) -> Result<Self> {
    let first =
      NaiveDate::from_ymd_opt(year, month, 1).ok_or(Error::InvalidMonth { year, month })?;

    let mut weeks = Vec::new();
    let mut week: [Option<Day>; 7] = Default::default();
    let mut column = first.weekday().num_days_from_sunday() as usize;

    for date in first.iter_days().take_while(|d| d.month() == month) {
      week[column] = Some(Day {
        date,
        today: date == today,
        status: statuses.get(&date).copied(),
        holiday: holidays.get(&date).cloned(),
      });
      column += 1;
      if column == 7 {
        weeks.push(std::mem::take(&mut week));
        column = 0;
      }
    }
    if column > 0 {
      weeks.push(week);
    }

    let holidays = holidays
      .range(first..)
      .take_while(|(date, _)| date.month() == month && date.year() == year)
      .map(|(date, label)| (*date, label.clone()))
      .collect();

    Ok(Self { first, weeks, holidays })
  }

  pub fn weeks(&self) -> &[[Option<Day>; 7]] { &self.weeks }

  /// Holidays falling in this month, in date order.
  pub fn holidays(&self) -> &[(NaiveDate, String)] { &self.holidays }

  pub fn render(&self) -> String { self.to_string() }
}

impl fmt::Display for MonthGrid {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let title = self.first.format("%B %Y").to_string();
    writeln!(f, "{title:^35}")?;

    let mut header = String::new();
    for name in WEEKDAYS {
      let _ = write!(header, "{name:^5}");
    }
    writeln!(f, "{}", header.trim_end())?;

    for week in &self.weeks {
      let mut line = String::new();
      for cell in week {
        match cell {
          Some(day) => {
            let (open, close) = if day.today { ('[', ']') } else { (' ', ' ') };
            let _ = write!(line, "{open}{:>2}{close}{}", day.date.day(), day.marker());
          }
          None => line.push_str("     "),
        }
      }
      writeln!(f, "{}", line.trim_end())?;
    }

    writeln!(f)?;
    writeln!(f, "[dd] today  ? pending  + approved  x rejected  h holiday")?;
    for (date, label) in &self.holidays {
      writeln!(f, "  {date}  {label}")?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;
  use excusal_core::partition::Queue;

  use super::*;

  fn date(s: &str) -> NaiveDate { s.parse().unwrap() }

  fn make(day: &str, status: RequestStatus, hour: u32) -> Request {
    Request {
      id: format!("{day}-{hour}"),
      student_name: "student1".into(),
      subject: "Math".into(),
      date: date(day),
      reason: "sick".into(),
      status,
      sent_to: Queue::Faculty,
      submitted_at: Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap(),
      updated_at: None,
      urgent: false,
      rejection_reason: None,
    }
  }

  #[test]
  fn latest_submission_wins_per_date() {
    let requests = [
      make("2024-03-10", RequestStatus::Approved, 12),
      make("2024-03-10", RequestStatus::Rejected, 9),
      make("2024-03-11", RequestStatus::Pending, 9),
    ];
    let statuses = status_by_date(&requests);
    assert_eq!(statuses.len(), 2);
    assert_eq!(statuses[&date("2024-03-10")], RequestStatus::Approved);
    assert_eq!(statuses[&date("2024-03-11")], RequestStatus::Pending);
  }

  #[test]
  fn weeks_start_on_sunday() {
    // 2024-03-01 is a Friday.
    let grid =
      MonthGrid::new(2024, 3, date("2024-03-15"), &BTreeMap::new(), &Holidays::new()).unwrap();
    let first_week = &grid.weeks()[0];
    assert!(first_week[..5].iter().all(Option::is_none));
    assert_eq!(first_week[5].as_ref().unwrap().date, date("2024-03-01"));
    assert_eq!(grid.weeks().len(), 6);

    let days: usize = grid.weeks().iter().map(|w| w.iter().flatten().count()).sum();
    assert_eq!(days, 31);
  }

  #[test]
  fn cells_carry_today_status_and_holiday() {
    let statuses = BTreeMap::from([(date("2024-01-10"), RequestStatus::Rejected)]);
    let holidays = Holidays::from([
      (date("2024-01-26"), "Republic Day".to_owned()),
      (date("2024-08-15"), "Independence Day".to_owned()),
    ]);
    let grid = MonthGrid::new(2024, 1, date("2024-01-10"), &statuses, &holidays).unwrap();

    let cell = |d: &str| {
      grid
        .weeks()
        .iter()
        .flatten()
        .flatten()
        .find(|day| day.date == date(d))
        .cloned()
        .unwrap()
    };
    let tenth = cell("2024-01-10");
    assert!(tenth.today);
    assert_eq!(tenth.status, Some(RequestStatus::Rejected));
    assert_eq!(cell("2024-01-26").holiday.as_deref(), Some("Republic Day"));
    assert_eq!(grid.holidays(), &[(date("2024-01-26"), "Republic Day".to_owned())]);

    let text = grid.render();
    assert!(text.contains("January 2024"));
    assert!(text.contains("Sun  Mon  Tue  Wed  Thu  Fri  Sat"));
    assert!(text.contains("[10]x"));
    assert!(text.contains(" 26 h"));
    assert!(text.contains("2024-01-26  Republic Day"));
    assert!(!text.contains("Independence Day"));
  }

  #[test]
  fn invalid_month_is_rejected() {
    let err = MonthGrid::new(2024, 13, date("2024-01-01"), &BTreeMap::new(), &Holidays::new())
      .unwrap_err();
    assert!(matches!(err, Error::InvalidMonth { year: 2024, month: 13 }));
  }
}
