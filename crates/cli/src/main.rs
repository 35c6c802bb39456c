use clap::{Parser, Subcommand};
use sickbay_core::config::data_dir_from_env_value;
use sickbay_core::staff::{NewStaff, StaffService};
use sickbay_core::students::StudentService;
use sickbay_core::{Caller, CoreConfig, EmailAddress, NonEmptyText, Role};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "sickbay")]
#[command(about = "School clinic record system CLI")]
struct Cli {
    /// Record storage directory (defaults to SICKBAY_DATA_DIR or "clinic_data")
    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an admin account (bootstrap; bypasses the access policy)
    CreateAdmin {
        /// Full name
        name: String,
        /// Login email
        email: String,
        /// Login password
        password: String,
    },
    /// List staff accounts
    ListStaff,
    /// List students
    ListStudents,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let data_dir = cli
        .data_dir
        .unwrap_or_else(|| data_dir_from_env_value(std::env::var("SICKBAY_DATA_DIR").ok()));
    std::fs::create_dir_all(&data_dir)?;
    let cfg = Arc::new(CoreConfig::new(data_dir)?);

    match cli.command {
        Some(Commands::CreateAdmin {
            name,
            email,
            password,
        }) => {
            let service = StaffService::new(cfg);
            match service.create_account(NewStaff {
                full_name: NonEmptyText::new(&name)?,
                email: EmailAddress::parse(&email)?,
                password: NonEmptyText::new(&password)?,
                role: Role::Admin,
            }) {
                Ok(profile) => println!("Created admin account with ID: {}", profile.id),
                Err(e) => eprintln!("Error creating admin account: {}", e),
            }
        }
        Some(Commands::ListStaff) => {
            // List with a synthetic admin caller; the CLI runs with direct
            // filesystem access, so the role gate adds nothing here.
            let service = StaffService::new(cfg);
            let admin = Caller {
                id: sickbay_core::RecordUuid::new(),
                role: Role::Admin,
                full_name: "cli".into(),
            };
            let profiles = service.list(&admin)?;
            if profiles.is_empty() {
                println!("No staff accounts found.");
            } else {
                for profile in profiles {
                    println!(
                        "ID: {}, Name: {}, Email: {}, Role: {}",
                        profile.id, profile.full_name, profile.email, profile.role
                    );
                }
            }
        }
        Some(Commands::ListStudents) => {
            let service = StudentService::new(cfg);
            let admin = Caller {
                id: sickbay_core::RecordUuid::new(),
                role: Role::Admin,
                full_name: "cli".into(),
            };
            let students = service.list(&admin)?;
            if students.is_empty() {
                println!("No students found.");
            } else {
                for student in students {
                    println!(
                        "ID: {}, Name: {}, Admission No: {}, Class: {}, Type: {}",
                        student.id,
                        student.full_name,
                        student.admission_no,
                        student.class_name,
                        student.student_type
                    );
                }
            }
        }
        None => {
            println!("Use 'sickbay --help' for commands");
        }
    }

    Ok(())
}
