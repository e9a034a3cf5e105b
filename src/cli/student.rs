use chrono::{NaiveDate, Utc};
use clap::Args;

use crate::cli::{PortalOptions, Session};
use crate::core::Action;
use crate::portal::attendance::{self, AttendanceStatus};
use crate::portal::materials;
use crate::portal::student;
use crate::Result;

/// Show or record attendance
#[derive(Args, Debug)]
pub struct AttendanceCommand {
    /// Record this status, one of Hadir, Sakit, Izin, Alpa
    #[arg(long, value_parser = parse_status)]
    status: Option<AttendanceStatus>,
    /// Day to record, defaults to today
    #[arg(long)]
    date: Option<NaiveDate>,
}

impl AttendanceCommand {
    pub async fn run(self, options: PortalOptions) -> Result<()> {
        let session = Session::open(&options).await?;
        session.authorize(Action::RecordAttendance)?;
        let principal = session.principal()?;
        let date = self.date.unwrap_or_else(|| Utc::now().date_naive());

        match self.status {
            Some(status) => {
                attendance::record(session.backend(), principal, date, status).await?;
                println!("Recorded {} for {}", status, date);
            }
            None => match attendance::today(session.backend(), principal, date).await? {
                Some(entry) => println!("{}: {}", date, entry.status),
                None => println!("{}: not recorded yet", date),
            },
        }

        println!("history:");
        for entry in attendance::history(session.backend(), principal).await? {
            println!("  {}\t{}", entry.date, entry.status);
        }

        session.close().await
    }
}

fn parse_status(s: &str) -> std::result::Result<AttendanceStatus, String> {
    s.parse::<AttendanceStatus>().map_err(|err| err.to_string())
}

/// Show the student dashboard
#[derive(Args, Debug)]
pub struct DashboardCommand {}

impl DashboardCommand {
    pub async fn run(self, options: PortalOptions) -> Result<()> {
        let session = Session::open(&options).await?;
        session.authorize(Action::StudentOverview)?;

        let now = Utc::now();
        let overview = student::summary(session.backend(), session.principal()?, now).await?;

        println!("Welcome, {}", session.profile()?.full_name);
        println!("unread notifications: {}", overview.unread_notifications);
        println!("upcoming assignments:");
        for assignment in &overview.upcoming {
            println!(
                "  {}\t{}",
                assignment.title,
                student::due_label(assignment.due_date, now)
            );
        }
        println!("announcements:");
        for announcement in &overview.announcements {
            println!(
                "  {}\t{}",
                announcement.created_at.format("%Y-%m-%d"),
                announcement.title
            );
        }

        session.close().await
    }
}

/// List learning materials
#[derive(Args, Debug)]
pub struct MaterialsCommand {
    /// Only materials of this course id
    #[arg(long)]
    course: Option<String>,
    /// Match title or description
    #[arg(long, default_value = "")]
    search: String,
}

impl MaterialsCommand {
    pub async fn run(self, options: PortalOptions) -> Result<()> {
        let session = Session::open(&options).await?;
        session.authorize(Action::BrowseMaterials)?;

        let courses = materials::courses(session.backend()).await?;
        let all = materials::list(session.backend()).await?;
        let found = materials::filter(&all, self.course.as_deref(), &self.search);

        if found.is_empty() {
            println!("no materials found");
        }
        for material in found {
            let course = courses
                .iter()
                .find(|course| course.id == material.course_id)
                .map_or(material.course_id.as_str(), |course| course.course_name.as_str());
            println!("{}\t{}", course, material.title);
            if let Some(module) = &material.module {
                println!("  module: {}", module);
            }
            if let Some(url) = &material.file_url {
                println!("  {}", url);
            }
        }

        session.close().await
    }
}
