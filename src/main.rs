use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};

use absensi_client::api::attendance::{self, Punch};
use absensi_client::api::leave::LeaveApplication;
use absensi_client::api::request::Attachment;
use absensi_client::api::types::{Coordinates, LeaveKind};
use absensi_client::api::ApiError;
use absensi_client::commands;
use absensi_client::config::AppConfig;
use absensi_client::period::{self, MonthPeriod};
use absensi_client::session::{LogOnlyPrompt, LogoutPrompt, TerminalPrompt};
use absensi_client::state::AppState;

#[derive(Parser, Debug)]
#[command(name = "absensi", version, about = "Employee attendance and leave client")]
struct Cli {
    /// Backend base URL (overrides ABSENSI_API_URL / API_BASE_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Log the logout notice instead of waiting for Enter
    #[arg(long, global = true)]
    non_interactive: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and store the session
    Login {
        #[arg(long)]
        username: Option<String>,
        /// Read from ABSENSI_PASSWORD if omitted
        #[arg(long)]
        password: Option<String>,
        /// Save username and password for the next login
        #[arg(long)]
        remember: bool,
    },
    /// Remove the stored session
    Logout,
    /// Show the stored session
    Whoami,
    /// Check in with a selfie and location
    CheckIn(PunchArgs),
    /// Check out with a selfie and location
    CheckOut(PunchArgs),
    /// Leave requests
    #[command(subcommand)]
    Leave(LeaveCommand),
    /// Monthly recaps
    #[command(subcommand)]
    Recap(RecapCommand),
    /// Show the employee profile
    Profile,
}

#[derive(Args, Debug)]
struct PunchArgs {
    /// Selfie image
    #[arg(long)]
    photo: PathBuf,
    #[arg(long, allow_hyphen_values = true)]
    lat: f64,
    #[arg(long, allow_hyphen_values = true)]
    lon: f64,
}

#[derive(Subcommand, Debug)]
enum LeaveCommand {
    /// Submit a leave request
    Submit {
        #[arg(long, value_enum)]
        kind: KindArg,
        /// First day, YYYY-MM-DD
        #[arg(long)]
        start: NaiveDate,
        /// Last day, YYYY-MM-DD
        #[arg(long)]
        end: NaiveDate,
        #[arg(long, default_value = "")]
        remarks: String,
        /// Supporting document
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// List your leave requests
    History {
        /// Only requests starting in this month, YYYY-MM
        #[arg(long)]
        month: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum RecapCommand {
    Attendance(MonthArg),
    Leave(MonthArg),
    Overtime(MonthArg),
}

#[derive(Args, Debug)]
struct MonthArg {
    /// YYYY-MM, defaults to the current month
    #[arg(long)]
    month: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum KindArg {
    Izin,
    Sakit,
    Cuti,
}

impl From<KindArg> for LeaveKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Izin => LeaveKind::Izin,
            KindArg::Sakit => LeaveKind::Sakit,
            KindArg::Cuti => LeaveKind::Cuti,
        }
    }
}

fn month_or_current(month: Option<&str>) -> Result<MonthPeriod, String> {
    match month {
        Some(m) => MonthPeriod::parse(m).map_err(|e| e.to_string()),
        None => Ok(MonthPeriod::current()),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    env_logger::init();

    let cli = Cli::parse();

    let mut config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(url) = cli.api_url.clone() {
        config.api_base_url = url;
    }
    log::debug!("Using API at {}", config.api_base_url);

    let prompt: Arc<dyn LogoutPrompt> = if cli.non_interactive {
        Arc::new(LogOnlyPrompt)
    } else {
        Arc::new(TerminalPrompt)
    };
    let state = match AppState::from_config(&config, prompt) {
        Ok(state) => state,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = run(&state, cli.command).await;

    // Let an open logout prompt finish before exiting
    state.session.settle().await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(state: &AppState, command: Command) -> Result<(), String> {
    match command {
        Command::Login {
            username,
            password,
            remember,
        } => {
            let remembered = commands::remembered_credentials(state).await.map_err(|e| e.to_string())?;
            let username = username
                .or_else(|| remembered.as_ref().map(|c| c.username.clone()))
                .ok_or("--username is required")?;
            let password = password
                .or_else(|| std::env::var("ABSENSI_PASSWORD").ok())
                .or_else(|| {
                    remembered
                        .as_ref()
                        .filter(|c| c.username == username)
                        .map(|c| c.password.clone())
                })
                .ok_or("--password or ABSENSI_PASSWORD is required")?;

            let session = commands::login(state, &username, &password, remember)
                .await
                .map_err(|e| e.to_string())?;
            println!("Logged in as {}", session.user.nama);
        }
        Command::Logout => {
            commands::logout(state).await.map_err(|e| e.to_string())?;
            println!("Logged out");
        }
        Command::Whoami => match commands::restore_session(state).await.map_err(|e| e.to_string())? {
            Some(session) => println!(
                "{} (id_karyawan {})",
                session.user.nama,
                session.employee_id().unwrap_or("-")
            ),
            None => println!("Not logged in"),
        },
        Command::CheckIn(args) => punch(state, args, Punch::CheckIn).await?,
        Command::CheckOut(args) => punch(state, args, Punch::CheckOut).await?,
        Command::Leave(LeaveCommand::Submit {
            kind,
            start,
            end,
            remarks,
            file,
        }) => {
            let attachment = match file {
                Some(path) => Some(Attachment::from_path(&path).await.map_err(|e| e.to_string())?),
                None => None,
            };
            let application = LeaveApplication {
                kind: kind.into(),
                start,
                end,
                remarks,
                attachment,
            };
            let message = commands::submit_leave(state, application)
                .await
                .map_err(|e| e.to_string())?;
            println!("{}", message.unwrap_or_else(|| "Pengajuan berhasil dikirim".to_string()));
        }
        Command::Leave(LeaveCommand::History { month }) => {
            let month = match month {
                Some(m) => Some(MonthPeriod::parse(&m).map_err(|e| e.to_string())?),
                None => None,
            };
            let history = commands::leave_history(state, month).await.map_err(|e| e.to_string())?;
            for r in &history.records {
                println!(
                    "{:<8} {} s/d {}  {:<9} {}",
                    r.nama_izin,
                    r.tgl_mulai,
                    r.tgl_selesai,
                    r.status_approval,
                    r.alasan_penolakan.as_deref().unwrap_or("")
                );
            }
            let s = history.summary;
            println!(
                "Total {}  disetujui {}  ditolak {}  menunggu {}",
                s.total, s.approved, s.rejected, s.pending
            );
        }
        Command::Recap(RecapCommand::Attendance(arg)) => {
            let month = month_or_current(arg.month.as_deref())?;
            let recap = commands::attendance_recap(state, month).await.map_err(|e| e.to_string())?;
            for day in &recap.days {
                println!("{}  {:<8} {}", day.tanggal, day.status_hari, day.nama_status);
            }
            let s = recap.summary;
            println!("{}: hadir {}  alfa {}  izin {}", recap.month, s.present, s.absent, s.excused);
        }
        Command::Recap(RecapCommand::Leave(arg)) => {
            let month = month_or_current(arg.month.as_deref())?;
            let recap = commands::leave_recap(state, month).await.map_err(|e| e.to_string())?;
            for entry in &recap.entries {
                let r = &entry.record;
                println!(
                    "{:<6} {} s/d {}  {} hari  {}",
                    r.kind().map(|k| k.label()).unwrap_or("-"),
                    r.tgl_mulai,
                    r.tgl_selesai,
                    entry.days.map(|d| d.to_string()).unwrap_or_else(|| "?".to_string()),
                    r.keterangan.as_deref().unwrap_or("")
                );
            }
            let s = recap.summary;
            println!("{}: sakit {}  izin {}  cuti {}", recap.month, s.sakit, s.izin, s.cuti);
        }
        Command::Recap(RecapCommand::Overtime(arg)) => {
            let month = month_or_current(arg.month.as_deref())?;
            let recap = commands::overtime_recap(state, month).await.map_err(|e| e.to_string())?;
            for r in &recap.records {
                println!(
                    "{}  {}-{}  {}  Rp {:.0}",
                    r.tanggal,
                    r.jam_mulai,
                    r.jam_selesai,
                    period::format_minutes(r.menit_lembur),
                    r.total_bayaran
                );
            }
            let t = recap.totals;
            println!(
                "{}: {} lembur  {}  Rp {:.0}",
                recap.month,
                t.count,
                t.duration(),
                t.pay
            );
        }
        Command::Profile => {
            let p = commands::profile(state).await.map_err(|e| e.to_string())?;
            println!("Nama      : {}", p.nama);
            if let Some(v) = &p.nama_panggilan {
                println!("Panggilan : {}", v);
            }
            if let Some(v) = &p.nip {
                println!("NIP       : {}", v);
            }
            if let Some(v) = &p.jenis {
                println!("Jenis     : {}", v);
            }
            if let Some(v) = &p.tipe {
                println!("Tipe      : {}", v);
            }
            if let Some(v) = p.gaji_pokok {
                println!("Gaji pokok: Rp {:.0}", v);
            }
            if let (Some(bank), Some(no)) = (&p.bank, &p.no_rekening) {
                println!("Rekening  : {} {}", bank, no);
            }
        }
    }
    Ok(())
}

async fn punch(state: &AppState, args: PunchArgs, kind: Punch) -> Result<(), String> {
    let photo = Attachment::from_path(&args.photo).await.map_err(|e| e.to_string())?;
    let at = Coordinates {
        latitude: args.lat,
        longitude: args.lon,
    };
    let result = match kind {
        Punch::CheckIn => commands::check_in(state, photo, at).await,
        Punch::CheckOut => commands::check_out(state, photo, at).await,
    };
    match result {
        Ok(receipt) => {
            println!("{}", receipt.message.unwrap_or_else(|| format!("{} berhasil", kind.label())));
            Ok(())
        }
        Err(ApiError::NotLoggedIn) => Err(ApiError::NotLoggedIn.to_string()),
        Err(e) => {
            log::warn!("Attendance failed: {}", e);
            Err(attendance::failure_message(&e).to_string())
        }
    }
}
