use clap::Parser;
use record_signals::import::import_folder;
use record_signals::{Catalog, Config, Gender, ImageRecord, MediaRoot, RecordError, Student};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;

use cli::{Cli, Command, ImageCommand, StudentCommand};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| record_signals::config::DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = Config::from_env_or(cli.media_root, cli.db).map_err(|e| {
        error!("Failed to load configuration: {e}");
        e
    })?;

    info!("Media root: {}", config.media_root.display());
    info!("Database: {}", config.database_path.display());

    let outcome = match cli.command {
        Command::Import { folder } => {
            // rusqlite::Connection is not Sync, so the import opens its own
            // catalog on the blocking pool.
            let result = tokio::task::spawn_blocking(move || {
                let catalog = open_catalog(&config, 1)?;
                import_folder(&catalog, &folder)
            })
            .await?;

            result.map(|result| {
                println!(
                    "Imported {} images, skipped {} duplicates, {} failed.",
                    result.imported_count, result.skipped_count, result.failed_count
                );
            })
        }
        // Opening the catalog runs the migrations
        Command::Migrate { verbosity } => open_catalog(&config, verbosity).map(|_| {
            println!("Catalog is up to date.");
        }),
        Command::Student(command) => {
            open_catalog(&config, 1).and_then(|catalog| run_student(&catalog, command))
        }
        Command::Image(command) => {
            open_catalog(&config, 1).and_then(|catalog| run_image(&catalog, command))
        }
    };

    outcome.map_err(|e| {
        error!("{e}");
        Box::<dyn std::error::Error>::from(e)
    })
}

fn open_catalog(config: &Config, verbosity: u8) -> record_signals::Result<Catalog> {
    Catalog::open_standard(
        &config.database_path,
        MediaRoot::new(&config.media_root),
        verbosity,
    )
}

fn run_student(catalog: &Catalog, command: StudentCommand) -> record_signals::Result<()> {
    match command {
        StudentCommand::Add { name, gender } => {
            let student = catalog.create_student(&name, gender.into())?;
            print_student(&student);
        }
        StudentCommand::Update { id, name, gender } => {
            let mut student = catalog
                .get_student(id)?
                .ok_or(RecordError::NotFound { model: "Student", id })?;
            if let Some(name) = name {
                student.name = name;
            }
            if let Some(gender) = gender {
                student.gender = Gender::from(gender);
            }
            catalog.save_student(&mut student)?;
            print_student(&student);
        }
        StudentCommand::Delete { id } => {
            let student = catalog.delete_student(id)?;
            println!("Deleted student {} ({})", id, student.name);
        }
        StudentCommand::Show { id, output } => {
            let student = catalog
                .get_student(id)?
                .ok_or(RecordError::NotFound { model: "Student", id })?;
            if output.json {
                println!("{}", to_json(&student)?);
            } else {
                print_student(&student);
            }
        }
        StudentCommand::List { output } => {
            let students = catalog.list_students()?;
            if output.json {
                println!("{}", to_json(&students)?);
            } else {
                students.iter().for_each(print_student);
                println!("{} students.", students.len());
            }
        }
    }
    Ok(())
}

fn run_image(catalog: &Catalog, command: ImageCommand) -> record_signals::Result<()> {
    match command {
        ImageCommand::Add { path } => {
            let record = catalog.create_image(&path)?;
            print_image(&record);
        }
        ImageCommand::Delete { id } => {
            let record = catalog.delete_image(id)?;
            println!("Deleted image {} ({})", id, record.original_image);
        }
        ImageCommand::Show { id, output } => {
            let record = catalog
                .get_image(id)?
                .ok_or(RecordError::NotFound { model: "ImageRecord", id })?;
            if output.json {
                println!("{}", to_json(&record)?);
            } else {
                print_image(&record);
            }
        }
        ImageCommand::List { output } => {
            let records = catalog.list_images()?;
            if output.json {
                println!("{}", to_json(&records)?);
            } else {
                records.iter().for_each(print_image);
                println!("{} images.", records.len());
            }
        }
    }
    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T) -> record_signals::Result<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| RecordError::Config(format!("could not serialize output: {e}")))
}

fn print_student(student: &Student) {
    println!(
        "#{} {} ({}) {}",
        student.id.unwrap_or_default(),
        student.name,
        student.gender,
        student.identifier.as_deref().unwrap_or("-")
    );
}

fn print_image(record: &ImageRecord) {
    println!(
        "#{} {}\n  small:  {}\n  medium: {}\n  large:  {}",
        record.id.unwrap_or_default(),
        record.original_image,
        record.thumbnail_small.as_deref().unwrap_or("-"),
        record.thumbnail_medium.as_deref().unwrap_or("-"),
        record.thumbnail_large.as_deref().unwrap_or("-"),
    );
}
