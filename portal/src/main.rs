//! Command-line front end for the CarePortal client.
//!
//! Sets up logging, loads configuration from the environment and flags, and
//! dispatches one subcommand against the portal context. The session is kept
//! in a JSON file between invocations.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{bail, Context};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use portal::api::models::{DocumentListItem, HospitalFilter};
use portal::config::{PortalConfig, ENV_SESSION_FILE};
use portal::features::booking::{self, BookingForm};
use portal::features::patient_search::{self, PatientSearchQuery};
use portal::features::{analytics, check_in, documents};
use portal::{AuthState, Portal, Role};

const ENV_PASSWORD: &str = "CAREPORTAL_PASSWORD";

#[derive(Parser)]
#[command(name = "careportal")]
#[command(about = "Patient, doctor and admin client for the CarePortal API")]
struct Cli {
    /// API base URL, overrides CAREPORTAL_API_BASE_URL
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Session file, overrides CAREPORTAL_SESSION_FILE
    #[arg(long, global = true)]
    session_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the session
    Login {
        /// Email for patients and staff, username for doctors and admins
        identifier: String,
        /// patient, doctor, admin, hr, nurse or receptionist
        #[arg(short, long)]
        role: Option<Role>,
        /// Falls back to CAREPORTAL_PASSWORD
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Forget the stored session
    Logout {
        /// Also call the backend logout endpoint
        #[arg(long)]
        remote: bool,
    },
    /// Show the signed-in user
    Whoami,
    /// Exchange the refresh token for a new access token
    Refresh,
    /// Manage medical documents
    Documents {
        #[command(subcommand)]
        command: DocumentCommands,
    },
    /// Book an appointment
    Book {
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        hospital: Option<String>,
        #[arg(long)]
        hospital_group: Option<String>,
        #[arg(long)]
        department: Option<String>,
        #[arg(long)]
        doctor: Option<String>,
        /// YYYY-MM-DD
        #[arg(long)]
        date: Option<NaiveDate>,
        /// e.g. "10:00 AM"
        #[arg(long)]
        time: Option<String>,
        #[arg(long)]
        reason: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Check a patient in from a scanned QR payload or numeric code
    CheckIn {
        code: String,
        #[arg(long)]
        notes: Option<String>,
        /// Only look the appointment up
        #[arg(long)]
        no_confirm: bool,
    },
    /// List doctors
    Doctors {
        #[arg(long)]
        specialization: Option<String>,
        #[arg(long)]
        city: Option<String>,
    },
    /// List hospitals
    Hospitals {
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        group: Option<String>,
    },
    /// Dashboard metrics for the signed-in doctor or admin
    Dashboard,
    /// List disease templates (admin)
    Templates,
    /// Search patients (requires patient_search or patient_read)
    Patients {
        #[arg(long)]
        department: Option<String>,
        #[arg(long)]
        doctor: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        rmn: Option<String>,
    },
    /// Switch to a fabricated, unauthenticated user for a walkthrough
    #[cfg(feature = "demo")]
    DemoRole { role: Role },
}

#[derive(Subcommand)]
enum DocumentCommands {
    /// List documents grouped by category
    List,
    /// Upload a PDF or image
    Upload {
        path: Option<PathBuf>,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Download a document
    Download {
        id: String,
        /// File or directory, defaults to the current directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Delete a document
    Delete { id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    debug!("Using API at {}", config.api_base_url);
    let portal = Portal::init(config).context("Failed to start the portal client")?;

    run(&portal, cli.command).await
}

fn load_config(cli: &Cli) -> anyhow::Result<PortalConfig> {
    let mut config = PortalConfig::from_env()?;
    if let Some(url) = &cli.api_url {
        config = config.with_api_base_url(url)?;
    }
    if let Some(path) = &cli.session_file {
        config = config.with_session_file(path);
    } else if config.session_file.is_none() {
        match default_session_file() {
            Some(path) => config = config.with_session_file(path),
            None => bail!("No HOME directory; pass --session-file or set {}", ENV_SESSION_FILE),
        }
    }
    Ok(config)
}

fn default_session_file() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .map(|home| PathBuf::from(home).join(".careportal").join("session.json"))
}

async fn run(portal: &Portal, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Login {
            identifier,
            role,
            password,
        } => {
            let password = password
                .or_else(|| std::env::var(ENV_PASSWORD).ok())
                .with_context(|| format!("Pass --password or set {}", ENV_PASSWORD))?;
            let user = portal.login(&identifier, &password, role).await?;
            println!("Signed in as {} ({})", user.display_name(), user.role);
        }
        Commands::Logout { remote } => {
            if remote {
                portal.logout_remote().await;
            } else {
                portal.logout();
            }
            println!("Signed out");
        }
        Commands::Whoami => match portal.state() {
            AuthState::Authenticated(user) => {
                println!("{} ({})", user.display_name(), user.role);
                if let Some(email) = &user.email {
                    println!("  email: {}", email);
                }
                match &user.permissions {
                    Some(permissions) if !permissions.is_empty() => {
                        println!("  permissions: {}", permissions.join(", "))
                    }
                    _ => println!("  permissions: none"),
                }
            }
            _ => println!("Not signed in"),
        },
        Commands::Refresh => {
            portal.auth().refresh().await?;
            println!("Access token refreshed");
        }
        Commands::Documents { command } => run_documents(portal, command).await?,
        Commands::Book {
            city,
            hospital,
            hospital_group,
            department,
            doctor,
            date,
            time,
            reason,
            notes,
        } => {
            let form = BookingForm {
                city_id: city,
                hospital_id: hospital,
                hospital_group_id: hospital_group,
                department,
                doctor_id: doctor,
                date,
                time,
                reason,
                notes,
            };
            let response = booking::submit(portal.queries(), &form).await?;
            println!(
                "{}",
                response
                    .message
                    .unwrap_or_else(|| "Appointment booked successfully!".to_string())
            );
        }
        Commands::CheckIn {
            code,
            notes,
            no_confirm,
        } => {
            let found = check_in::scan(portal.queries(), &code).await?;
            let appointment = &found.appointment;
            println!(
                "Appointment {} for {} on {} at {}",
                appointment.id,
                appointment.patient_name.as_deref().unwrap_or("unknown patient"),
                appointment.date.as_deref().unwrap_or("-"),
                appointment.time.as_deref().unwrap_or("-"),
            );
            if !no_confirm {
                check_in::confirm(portal.queries(), &found, notes.as_deref()).await?;
                println!("Checked in via {}", found.code.method);
            }
        }
        Commands::Doctors {
            specialization,
            city,
        } => {
            let mut filters = BTreeMap::new();
            if let Some(specialization) = specialization {
                filters.insert("specialization".to_string(), specialization);
            }
            if let Some(city) = city {
                filters.insert("cityId".to_string(), city);
            }
            for doctor in portal.queries().doctors(&filters).await? {
                println!(
                    "{}  {}  {}",
                    doctor.id,
                    doctor.display_name(),
                    doctor.specialization.as_deref().unwrap_or("-")
                );
            }
        }
        Commands::Hospitals { city, group } => {
            let filter = HospitalFilter {
                city_id: city,
                hospital_group_id: group,
            };
            for hospital in portal.queries().hospitals(&filter).await? {
                println!("{}  {}", hospital.id, hospital.name);
            }
        }
        Commands::Dashboard => {
            let Some(user) = portal.current_user() else {
                bail!("Not signed in");
            };
            let metrics = analytics::metrics_for(portal.queries(), &user).await?;
            if metrics.is_empty() {
                println!("No dashboard for role {}", user.role);
            }
            for metric in metrics {
                println!("{}", metric);
            }
        }
        Commands::Templates => {
            for template in portal.queries().disease_templates().await? {
                println!(
                    "{}  {}  [{}]  {} fields",
                    template.id,
                    template.disease_name,
                    template.keywords.join(", "),
                    template.fields.len()
                );
            }
        }
        Commands::Patients {
            department,
            doctor,
            name,
            rmn,
        } => {
            let query = PatientSearchQuery {
                department,
                doctor_id: doctor,
                patient_name: name,
                rmn,
            };
            let found = patient_search::search(portal.queries(), &portal.gate(), &query).await?;
            if found.is_empty() {
                println!("No matching patients");
            }
            for appointment in found {
                println!(
                    "{}  {}  {}",
                    appointment.patient_id.as_deref().unwrap_or("-"),
                    appointment.patient_name.as_deref().unwrap_or("-"),
                    appointment.status.as_deref().unwrap_or("-")
                );
            }
        }
        #[cfg(feature = "demo")]
        Commands::DemoRole { role } => {
            let user = portal.demo().switch_role(role);
            println!("Demo user {} (not signed in)", user.display_name());
        }
    }
    Ok(())
}

async fn run_documents(portal: &Portal, command: DocumentCommands) -> anyhow::Result<()> {
    let queries = portal.queries();
    match command {
        DocumentCommands::List => {
            let grouped = documents::list(queries).await?;
            println!("{} documents", grouped.all.len());
            for category in documents::DocumentCategory::ALL {
                let docs = grouped.get(category);
                if docs.is_empty() {
                    continue;
                }
                println!("{} ({})", category, docs.len());
                for doc in docs {
                    print_document(doc);
                }
            }
        }
        DocumentCommands::Upload { path, description } => {
            let document =
                documents::upload(queries, path.as_deref(), description.as_deref()).await?;
            println!("Uploaded {} ({})", document.filename, document.id);
        }
        DocumentCommands::Download { id, output } => {
            let filename = queries
                .my_documents()
                .await?
                .into_iter()
                .find(|doc| doc.id == id)
                .map(|doc| doc.filename)
                .unwrap_or_else(|| id.clone());
            let target = output.unwrap_or_else(|| PathBuf::from("."));
            let written = documents::download(queries, &id, &filename, &target).await?;
            println!("Saved {}", written.display());
        }
        DocumentCommands::Delete { id } => {
            documents::delete(queries, &id).await?;
            println!("Deleted {}", id);
        }
    }
    Ok(())
}

fn print_document(doc: &DocumentListItem) {
    let uploaded = doc
        .uploaded_time()
        .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| doc.uploaded_at.clone());
    println!("  {}  {}  {}", doc.id, doc.filename, uploaded);
}
