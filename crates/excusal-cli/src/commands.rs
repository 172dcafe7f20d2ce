//! Portal subcommands that run against the local data file.
//!
//! Every command is one synchronous pass over the store and returns the text
//! to print. The logged-in session is persisted alongside the requests, so
//! `login` in one invocation applies to the next.

use std::path::PathBuf;

use anyhow::{Context as _, Result, bail};
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate};
use clap::{Args, Subcommand, ValueEnum};
use excusal_api::Store;
use excusal_core::{
  Error,
  backend::Backend,
  holiday,
  partition::Partition,
  query::RequestFilter,
  request::{Decision, NewRequest, Recipient, RejectionReason, RequestStatus},
  session::{Role, Session},
};
use excusal_export::calendar::{self, MonthGrid};

use crate::display;

#[derive(Debug, Subcommand)]
pub enum PortalCommand {
  /// Log in as one of the portal accounts.
  Login {
    username: String,
    #[arg(short, long)]
    password: String,
  },
  /// Forget the logged-in account.
  Logout,
  /// Show the logged-in account.
  Whoami,
  /// Submit an attendance exception request (students).
  Submit {
    #[arg(long)]
    subject: String,
    /// Absence date, YYYY-MM-DD.
    #[arg(long)]
    date:    String,
    #[arg(long)]
    reason:  String,
    /// Who reviews the request: hod, faculty or both.
    #[arg(long = "to", default_value = "hod")]
    sent_to: Recipient,
    #[arg(long)]
    urgent:  bool,
  },
  /// Approve or reject one request in your queue.
  Review {
    id:       String,
    /// approve or reject
    decision: Decision,
    /// Rejection reason, e.g. "Invalid date".
    #[arg(long)]
    reason:   Option<RejectionReason>,
  },
  /// Apply one decision to several requests in your queue.
  BulkReview {
    decision: Decision,
    #[arg(required = true)]
    ids:      Vec<String>,
  },
  /// Apply one decision to every pending request mentioning a keyword.
  KeywordReview { decision: Decision, keyword: String },
  /// List requests, newest and urgent first.
  List {
    /// Defaults to your role's own partition.
    partition: Option<Partition>,
    #[command(flatten)]
    filter:    FilterArgs,
  },
  /// Dashboard statistics for a partition.
  Stats { partition: Option<Partition> },
  /// Write a partition to a CSV or HTML file.
  Export {
    format:    Format,
    partition: Option<Partition>,
    #[arg(short, long)]
    output:    Option<PathBuf>,
  },
  /// Month calendar of your requests and holidays.
  Calendar {
    #[arg(long)]
    year:  Option<i32>,
    #[arg(long)]
    month: Option<u32>,
  },
  /// Add or relabel a holiday.
  Holiday { date: NaiveDate, label: String },
  /// Show or manage notifications.
  Notifications {
    #[command(subcommand)]
    action: Option<NotificationAction>,
  },
}

#[derive(Debug, Default, Args)]
pub struct FilterArgs {
  /// Text matched against student, subject and reason.
  #[arg(long)]
  pub search:  Option<String>,
  #[arg(long)]
  pub status:  Option<RequestStatus>,
  #[arg(long)]
  pub subject: Option<String>,
  #[arg(long)]
  pub from:    Option<NaiveDate>,
  #[arg(long)]
  pub to:      Option<NaiveDate>,
}

impl From<FilterArgs> for RequestFilter {
  fn from(a: FilterArgs) -> Self {
    RequestFilter {
      search:    a.search,
      status:    a.status,
      subject:   a.subject,
      date_from: a.from,
      date_to:   a.to,
    }
  }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Format {
  Csv,
  Html,
}

impl Format {
  fn extension(self) -> &'static str {
    match self {
      Format::Csv => "csv",
      Format::Html => "html",
    }
  }
}

#[derive(Debug, Subcommand)]
pub enum NotificationAction {
  List,
  /// Mark one notification read.
  Read { id: String },
  ReadAll,
  Clear,
}

// ─── Runner ───────────────────────────────────────────────────────────────────

pub struct Portal<B: Backend> {
  store: Store<B>,
}

impl<B: Backend> Portal<B> {
  pub fn new(store: Store<B>) -> Self { Self { store } }

  /// Run `command`. `now` supplies the viewer's timezone and "today".
  pub fn run(&mut self, command: PortalCommand, now: DateTime<FixedOffset>) -> Result<String> {
    match command {
      PortalCommand::Login { username, password } => {
        let session = Session::authenticate(&username, &password)?;
        session.save(self.store.backend_mut())?;
        Ok(format!("Logged in as {} ({}).\n", session.username, session.role))
      }
      PortalCommand::Logout => {
        Session::clear(self.store.backend_mut())?;
        Ok("Logged out.\n".to_owned())
      }
      PortalCommand::Whoami => Ok(match Session::load(self.store.backend()) {
        Some(s) => format!("{} ({})\n", s.username, s.role),
        None => "Not logged in.\n".to_owned(),
      }),
      PortalCommand::Submit { subject, date, reason, sent_to, urgent } => {
        let session = self.session()?;
        session.require_role(Role::Student, "submit requests")?;
        let input = NewRequest::new(session.username, subject, date, reason, sent_to).urgent(urgent);
        let created = self.store.submit(&input)?;

        let mut out = format!("Submitted {} record(s):\n", created.len());
        for r in &created {
          out.push_str(&format!("  {} -> {}\n", r.id, r.sent_to.title()));
        }
        Ok(out)
      }
      PortalCommand::Review { id, decision, reason } => {
        let session = self.session()?;
        let queue = session.require_queue()?;
        if self.store.queue_of(&id)? != queue {
          return Err(other_queue(&session).into());
        }
        let updated = self.store.review(&id, decision, reason)?;
        Ok(format!("{} is now {}.\n", updated.id, updated.status))
      }
      PortalCommand::BulkReview { decision, ids } => {
        let queue = self.session()?.require_queue()?;
        let total = ids.len();
        let own: Vec<String> = ids
          .into_iter()
          .filter(|id| self.store.queue_of(id).is_ok_and(|owner| owner == queue))
          .collect();
        let reviewed = self.store.bulk_review(own, decision);
        Ok(format!("Reviewed {reviewed} of {total} request(s).\n"))
      }
      PortalCommand::KeywordReview { decision, keyword } => {
        let queue = self.session()?.require_queue()?;
        let reviewed = self.store.keyword_review(queue, &keyword, decision);
        Ok(format!("Reviewed {reviewed} request(s) matching {keyword:?}.\n"))
      }
      PortalCommand::List { partition, filter } => {
        let partition = self.readable(partition)?;
        let filter = RequestFilter::from(filter);
        let rows = self.store.query(partition, &filter);
        let mut out = display::request_table(&rows, now.to_utc());
        let active = filter.active_count();
        if active > 0 {
          out.push_str(&format!("({} shown, {active} filter(s) active)\n", rows.len()));
        }
        Ok(out)
      }
      PortalCommand::Stats { partition } => {
        let partition = self.readable(partition)?;
        Ok(display::statistics(&self.store.statistics(partition, &now)))
      }
      PortalCommand::Export { format, partition, output } => {
        let partition = self.readable(partition)?;
        let rows = self.store.load(partition);
        let tz = now.timezone();
        let content = match format {
          Format::Csv => excusal_export::csv::to_csv(&rows, &tz)?,
          Format::Html => excusal_export::report::to_html(
            display::report_title(partition),
            &rows,
            now.to_utc(),
            &tz,
          )?,
        };
        let path = output.unwrap_or_else(|| {
          PathBuf::from(excusal_export::export_filename(
            partition.key(),
            now.date_naive(),
            format.extension(),
          ))
        });
        std::fs::write(&path, content)
          .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(format!("Exported {} record(s) to {}.\n", rows.len(), path.display()))
      }
      PortalCommand::Calendar { year, month } => {
        let session = self.session()?;
        let partition = home_partition(session.role);
        let year = year.unwrap_or(now.year());
        let month = month.unwrap_or(now.month());
        let statuses = calendar::status_by_date(&self.store.load(partition));
        let holidays = holiday::for_year(self.store.backend_mut(), year)?;
        let grid = MonthGrid::new(year, month, now.date_naive(), &statuses, &holidays)?;
        Ok(grid.render())
      }
      PortalCommand::Holiday { date, label } => {
        self.session()?;
        holiday::add(self.store.backend_mut(), date, &label)?;
        Ok(format!("Added holiday {date}: {}.\n", label.trim()))
      }
      PortalCommand::Notifications { action } => {
        self.session()?;
        let log = self.store.notifier_mut();
        match action.unwrap_or(NotificationAction::List) {
          NotificationAction::List => Ok(display::notifications(&log.list())),
          NotificationAction::Read { id } => {
            if !log.mark_read(&id)? {
              bail!("no notification with id {id}");
            }
            Ok("Marked as read.\n".to_owned())
          }
          NotificationAction::ReadAll => {
            log.mark_all_read()?;
            Ok("All notifications marked as read.\n".to_owned())
          }
          NotificationAction::Clear => {
            log.clear()?;
            Ok("Notifications cleared.\n".to_owned())
          }
        }
      }
    }
  }

  fn session(&self) -> Result<Session> {
    Session::load(self.store.backend())
      .context("not logged in; run `excusal login <username> --password <password>` first")
  }

  /// `partition`, or the caller's own one, checked against the caller's role.
  fn readable(&self, partition: Option<Partition>) -> Result<Partition> {
    let session = self.session()?;
    let partition = partition.unwrap_or(home_partition(session.role));
    session.require_read(partition)?;
    Ok(partition)
  }
}

/// The partition a role works from by default.
fn home_partition(role: Role) -> Partition {
  match role {
    Role::Student => Partition::StudentRequests,
    Role::Hod => Partition::PendingRequests,
    Role::Faculty => Partition::FacultyPendingRequests,
  }
}

fn other_queue(session: &Session) -> Error {
  Error::Forbidden {
    role:   session.role,
    action: "review another role's queue",
  }
}
