//src/main.rs
mod cli; // Keep cli module for parsing args

use anyhow::{bail, Context, Result};
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use std::io::{self, stdout};
use tracing_subscriber::EnvFilter;

use gym_tracker_lib::{
    parse_color, AppService, Avatar, Bucket, Catalog, Command, Outcome, Profile, ProfileId,
    SetPatch, View,
};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    // --- Check for completion generation request FIRST ---
    let cli_args = cli::parse_args();
    let export_csv = cli_args.export_csv;

    if let cli::Commands::GenerateCompletion { shell } = cli_args.command {
        let mut cmd = cli::build_cli_command();
        let bin_name = cmd.get_name().to_string();

        eprintln!("Generating completion script for {shell}...");
        clap_complete::generate(shell, &mut cmd, bin_name, &mut stdout());
        return Ok(());
    }

    // Initialize the application service (loads config and the stored document)
    let mut service =
        AppService::initialize().context("Failed to initialize application service")?;

    let header_color = parse_color(&service.config.theme.header_color)
        .map(Color::from)
        .unwrap_or(Color::Green);

    match cli_args.command {
        cli::Commands::GenerateCompletion { .. } => {
            unreachable!("Completion generation should have exited already");
        }

        // --- Profile Commands ---
        cli::Commands::Profile(cli::ProfileCommands::List) => {
            print_profile_table(service.profiles(), service.document().active_profile_id, header_color);
        }
        cli::Commands::Profile(cli::ProfileCommands::Add { name, avatar }) => {
            match service.add_profile(&name, avatar.map(cli_avatar_to_avatar)) {
                Ok(Outcome::Created(id)) => {
                    println!("Successfully added profile '{}' (ID: {id}).", name.trim());
                }
                Ok(_) => println!("No profile was added."),
                Err(e) => bail!("Error adding profile: {}", e),
            }
        }
        cli::Commands::Profile(cli::ProfileCommands::Edit { id, name, avatar }) => {
            if name.is_none() && avatar.is_none() {
                bail!("Nothing to change: give --name and/or --avatar.");
            }
            match service.update_profile(id, name.as_deref(), avatar.map(cli_avatar_to_avatar)) {
                Ok(Outcome::Unchanged) => println!("Profile {id} not found or already up to date."),
                Ok(_) => println!("Successfully updated profile {id}."),
                Err(e) => bail!("Error editing profile {}: {}", id, e),
            }
        }
        cli::Commands::Profile(cli::ProfileCommands::Delete { id, yes }) => {
            require_confirmation(yes, &format!("delete profile {id} and all of its sets"))?;
            match service.delete_profile(id) {
                Ok(Outcome::Unchanged) => println!("No profile with ID {id}."),
                Ok(_) => {
                    println!("Successfully deleted profile {id}.");
                    if let Some(active) = service.active_profile() {
                        println!("Active profile: {} (ID: {}).", active.name, active.id);
                    }
                }
                Err(e) => bail!("Error deleting profile {}: {}", id, e),
            }
        }
        cli::Commands::Profile(cli::ProfileCommands::Switch { id }) => {
            match service.switch_profile(id) {
                Ok(_) if service.document().active_profile_id == id => {
                    println!("Active profile is now {id}.");
                }
                Ok(_) => bail!("No profile with ID {}.", id),
                Err(e) => bail!("Error switching profile: {}", e),
            }
        }

        // --- Logged Set Commands ---
        cli::Commands::Log(cli::LogCommands::Add {
            exercise,
            category,
            weight,
            reps,
            note,
        }) => {
            match service.add_logged_set(&exercise, category.as_deref(), &weight, &reps, &note) {
                Ok(Outcome::Created(id)) => {
                    let unit = &service.config.weight_unit_label;
                    if let Some(set) = service.find_set(id) {
                        println!(
                            "Successfully logged {} ({}): {} {unit} x {} (ID: {id}).",
                            set.name, set.category, set.weight, set.reps
                        );
                    }
                }
                Ok(_) => println!("No active profile to log the set on."),
                Err(e) => bail!("Error logging set: {}", e),
            }
        }
        cli::Commands::Log(cli::LogCommands::Edit {
            id,
            weight,
            reps,
            note,
        }) => {
            let patch = match SetPatch::parse(weight.as_deref(), reps.as_deref(), note.as_deref()) {
                Ok(patch) if patch.is_empty() => {
                    bail!("Nothing to change: give --weight, --reps and/or --note.")
                }
                Ok(patch) => patch,
                Err(e) => bail!("Error editing set {}: {}", id, e),
            };
            match service.dispatch(Command::UpdateLoggedSet { id, patch }) {
                Ok(Outcome::Unchanged) => println!("Set {id} not found or already up to date."),
                Ok(_) => println!("Successfully updated set {id}."),
                Err(e) => bail!("Error editing set {}: {}", id, e),
            }
        }
        cli::Commands::Log(cli::LogCommands::Delete { id, yes }) => {
            require_confirmation(yes, &format!("delete set {id}"))?;
            match service.delete_logged_set(id) {
                Ok(Outcome::Unchanged) => println!("No set with ID {id} on the active profile."),
                Ok(_) => println!("Successfully deleted set {id}."),
                Err(e) => bail!("Error deleting set {}: {}", id, e),
            }
        }
        cli::Commands::List { view } => {
            let view = view.map(cli_view_to_view);
            let unit = service.config.weight_unit_label.clone();
            let buckets = service.grouped_history(view);
            if buckets.is_empty() {
                println!("No sets logged yet.");
            } else if export_csv {
                print_history_csv(&buckets, &unit)?;
            } else {
                print_history_tables(&buckets, header_color, &unit);
            }
        }

        // --- Catalog Commands ---
        cli::Commands::Catalog(cli::CatalogCommands::List) => {
            if export_csv {
                print_catalog_csv(service.catalog())?;
            } else {
                print_catalog_table(service.catalog(), header_color);
            }
        }
        cli::Commands::Category(cli::CategoryCommands::Add { name }) => {
            match service.add_category(&name) {
                Ok(Outcome::Unchanged) => println!("Category '{}' already exists.", name.trim()),
                Ok(_) => println!("Successfully added category '{}'.", name.trim()),
                Err(e) => bail!("Error adding category: {}", e),
            }
        }
        cli::Commands::Category(cli::CategoryCommands::Rename { old, new }) => {
            match service.rename_category(&old, &new) {
                Ok(Outcome::Unchanged) => println!("No category named '{old}'."),
                Ok(_) => println!("Successfully renamed category '{old}' to '{}'.", new.trim()),
                Err(e) => bail!("Error renaming category '{}': {}", old, e),
            }
        }
        cli::Commands::Category(cli::CategoryCommands::Delete { name, yes }) => {
            require_confirmation(yes, &format!("delete category '{name}' and its exercises"))?;
            match service.delete_category(&name) {
                Ok(Outcome::Unchanged) => println!("No category named '{name}'."),
                Ok(_) => println!("Successfully deleted category '{name}'. Logged sets were kept."),
                Err(e) => bail!("Error deleting category '{}': {}", name, e),
            }
        }
        cli::Commands::Exercise(cli::ExerciseCommands::Add { category, name }) => {
            match service.add_exercise_to_category(&name, &category) {
                Ok(Outcome::Unchanged) => println!(
                    "Nothing added: no category '{category}', or '{}' is already in it.",
                    name.trim()
                ),
                Ok(_) => println!("Successfully added '{}' to '{category}'.", name.trim()),
                Err(e) => bail!("Error adding exercise: {}", e),
            }
        }
        cli::Commands::Exercise(cli::ExerciseCommands::Rename { category, old, new }) => {
            match service.rename_exercise(&category, &old, &new) {
                Ok(Outcome::Unchanged) => println!("No exercise '{old}' in category '{category}'."),
                Ok(_) => println!(
                    "Successfully renamed '{old}' to '{}'. Logged sets keep their old name.",
                    new.trim()
                ),
                Err(e) => bail!("Error renaming exercise '{}': {}", old, e),
            }
        }
        cli::Commands::Exercise(cli::ExerciseCommands::Delete { category, name, yes }) => {
            require_confirmation(yes, &format!("delete exercise '{name}' from '{category}'"))?;
            match service.delete_exercise(&category, &name) {
                Ok(Outcome::Unchanged) => println!("No exercise '{name}' in category '{category}'."),
                Ok(_) => println!("Successfully deleted '{name}' from '{category}'."),
                Err(e) => bail!("Error deleting exercise '{}': {}", name, e),
            }
        }

        // --- Config / Paths ---
        cli::Commands::SetDefaultView { view } => {
            let view = cli_view_to_view(view);
            service.set_default_view(view)?;
            println!(
                "Successfully set default view to {view}. Config updated: {:?}",
                service.get_config_path()
            );
        }
        cli::Commands::DataPath => {
            println!("Data file is located at: {}", service.data_location());
        }
        cli::Commands::ConfigPath => {
            println!("Config file is located at: {:?}", service.get_config_path());
        }
    }

    if let Some(e) = service.take_save_failure() {
        bail!("The change was applied but could not be saved: {}", e);
    }

    Ok(())
}

fn require_confirmation(yes: bool, action: &str) -> Result<()> {
    if !yes {
        bail!("Refusing to {action} without --yes.");
    }
    Ok(())
}

fn cli_avatar_to_avatar(avatar: cli::AvatarCli) -> Avatar {
    match avatar {
        cli::AvatarCli::Lifter => Avatar::Lifter,
        cli::AvatarCli::Runner => Avatar::Runner,
        cli::AvatarCli::Cyclist => Avatar::Cyclist,
        cli::AvatarCli::Swimmer => Avatar::Swimmer,
        cli::AvatarCli::Boxer => Avatar::Boxer,
        cli::AvatarCli::Climber => Avatar::Climber,
    }
}

fn cli_view_to_view(view: cli::ViewCli) -> View {
    match view {
        cli::ViewCli::Daily => View::Daily,
        cli::ViewCli::Weekly => View::Weekly,
        cli::ViewCli::Monthly => View::Monthly,
        cli::ViewCli::Yearly => View::Yearly,
    }
}

// --- Table Printing Functions ---

fn print_profile_table(profiles: &[Profile], active_id: ProfileId, header_color: Color) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Active").fg(header_color),
            Cell::new("ID").fg(header_color),
            Cell::new("Name").fg(header_color),
            Cell::new("Avatar").fg(header_color),
            Cell::new("Sets").fg(header_color),
        ]);

    for profile in profiles {
        let active = profile.id == active_id;
        let name_cell = if active {
            Cell::new(&profile.name).add_attribute(Attribute::Bold)
        } else {
            Cell::new(&profile.name)
        };
        table.add_row(vec![
            Cell::new(if active { "*" } else { "" }),
            Cell::new(profile.id.to_string()),
            name_cell,
            Cell::new(profile.avatar.to_string()),
            Cell::new(profile.exercises.len().to_string()),
        ]);
    }
    println!("{table}");
}

/// Prints one table per period, newest period first.
fn print_history_tables(buckets: &[Bucket<'_>], header_color: Color, unit: &str) {
    for bucket in buckets {
        println!("{}", bucket.title);
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("Exercise").fg(header_color),
                Cell::new("Category").fg(header_color),
                Cell::new("Set").fg(header_color),
                Cell::new("ID").fg(header_color),
                Cell::new("Date").fg(header_color),
                Cell::new(format!("Weight ({unit})")).fg(header_color),
                Cell::new("Reps").fg(header_color),
                Cell::new("Note").fg(header_color),
            ]);

        for group in &bucket.exercises {
            for (index, numbered) in group.sets.iter().enumerate() {
                // Name the exercise on its first row only
                let (name, category) = if index == 0 {
                    (group.name, group.category)
                } else {
                    ("", "")
                };
                table.add_row(vec![
                    Cell::new(name).add_attribute(Attribute::Bold),
                    Cell::new(category),
                    Cell::new(numbered.number.to_string()),
                    Cell::new(numbered.set.id.to_string()),
                    Cell::new(numbered.set.date.format("%Y-%m-%d").to_string()),
                    Cell::new(&numbered.set.weight),
                    Cell::new(&numbered.set.reps),
                    Cell::new(if numbered.set.note.is_empty() {
                        "-"
                    } else {
                        numbered.set.note.as_str()
                    }),
                ]);
            }
        }
        println!("{table}");
    }
}

fn print_catalog_table(catalog: &Catalog, header_color: Color) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Category").fg(header_color),
            Cell::new("Exercises").fg(header_color),
        ]);

    for (category, exercises) in catalog.iter() {
        table.add_row(vec![
            Cell::new(category),
            Cell::new(if exercises.is_empty() {
                "-".to_string()
            } else {
                exercises.join(", ")
            }),
        ]);
    }
    println!("{table}");
}

// --- CSV Printing Functions ---

fn print_history_csv(buckets: &[Bucket<'_>], unit: &str) -> Result<()> {
    let mut writer = csv::Writer::from_writer(io::stdout());
    let weight_header = format!("Weight_{unit}");

    writer.write_record([
        "Period",
        "Exercise",
        "Category",
        "Set",
        "ID",
        "Date",
        weight_header.as_str(),
        "Reps",
        "Note",
    ])?;

    for bucket in buckets {
        for group in &bucket.exercises {
            for numbered in &group.sets {
                writer.write_record([
                    bucket.key.clone(),
                    group.name.to_string(),
                    group.category.to_string(),
                    numbered.number.to_string(),
                    numbered.set.id.to_string(),
                    numbered.set.date.format("%Y-%m-%d").to_string(),
                    numbered.set.weight.clone(),
                    numbered.set.reps.clone(),
                    numbered.set.note.clone(),
                ])?;
            }
        }
    }

    writer.flush()?;
    Ok(())
}

fn print_catalog_csv(catalog: &Catalog) -> Result<()> {
    let mut writer = csv::Writer::from_writer(io::stdout());
    writer.write_record(["Category", "Exercise"])?;
    for (category, exercises) in catalog.iter() {
        if exercises.is_empty() {
            writer.write_record([category, ""])?;
        }
        for exercise in exercises {
            writer.write_record([category, exercise.as_str()])?;
        }
    }
    writer.flush()?;
    Ok(())
}
