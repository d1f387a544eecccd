use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use grid_core::geometry;
use grid_core::render::{render_svg, render_text};
use grid_core::{
    pack_floor, pack_section, summarize, summarize_all, CellRect, Dataset, FloorId, LayoutError,
    PackedSection, PlacementRequest, Section, SectionLayoutStore,
};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "gridctl")]
#[command(about = "Section grid tools - pack, check and summarize office floor layouts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pack stored rooms into section grids
    Pack {
        /// Dataset file (YAML or JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Floor to pack, e.g. 3F
        #[arg(short, long)]
        floor: FloorId,

        /// Only pack this section
        #[arg(short, long)]
        section: Option<Section>,

        /// Output file for packed sections (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print occupancy per floor, section and room type
    Summary {
        /// Dataset file (YAML or JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Only summarize this floor
        #[arg(short, long)]
        floor: Option<FloorId>,
    },

    /// Replay an authored layout through the placement rules
    Validate {
        /// Dataset file (YAML or JSON) whose rooms carry grid positions
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Generate SVG visualization from packed sections
    Generate {
        /// Packed sections file (JSON, as written by `pack`)
        #[arg(short, long)]
        input: PathBuf,

        /// Section to draw; defaults to the first one in the file
        #[arg(short, long)]
        section: Option<Section>,

        /// Output SVG file
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Pack {
            input,
            floor,
            section,
            output,
        } => {
            pack_command(input, floor, section, output)?;
        }
        Commands::Summary { input, floor } => {
            summary_command(input, floor)?;
        }
        Commands::Validate { input } => {
            validate_command(input)?;
        }
        Commands::Generate {
            input,
            section,
            output,
        } => {
            generate_command(input, section, output)?;
        }
    }

    Ok(())
}

fn load<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let ext = path.extension().and_then(|s| s.to_str());
    let value = if ext == Some("yaml") || ext == Some("yml") {
        serde_yaml::from_str(&content)?
    } else {
        serde_json::from_str(&content)?
    };
    Ok(value)
}

fn pack_command(
    input: PathBuf,
    floor: FloorId,
    section: Option<Section>,
    output: Option<PathBuf>,
) -> Result<()> {
    println!("{}", "🔍 Loading rooms...".bright_blue());
    let dataset: Dataset = load(&input)?;
    println!(
        "  {} rooms loaded",
        dataset.rooms.len().to_string().bright_white().bold()
    );
    println!();

    let packed: Vec<PackedSection> = match section {
        Some(section) => vec![pack_section(floor, section, &dataset.rooms)],
        None => pack_floor(floor, &dataset.rooms),
    };

    for grid in &packed {
        println!("{}", render_text(grid));
        for id in &grid.dropped {
            println!(
                "  {} room {} does not fit and was left out",
                "⚠".bright_yellow(),
                id.bright_white()
            );
        }
    }

    let json = serde_json::to_string_pretty(&packed)?;
    if let Some(output_path) = output {
        std::fs::write(&output_path, json)?;
        println!(
            "💾 Saved packed sections to {}",
            output_path.display().to_string().bright_white()
        );
    } else {
        println!("{}", json);
    }

    Ok(())
}

fn summary_command(input: PathBuf, floor: Option<FloorId>) -> Result<()> {
    let dataset: Dataset = load(&input)?;
    let summaries = match floor {
        Some(floor) => vec![summarize(floor, &dataset.rooms, &dataset.reservations)],
        None => summarize_all(&dataset.rooms, &dataset.reservations),
    };

    println!("{}", "📊 Occupancy:".bright_yellow().bold());
    for summary in &summaries {
        println!(
            "  {}: {}/{} available",
            summary.floor_id.to_string().bright_white().bold(),
            summary.available_rooms,
            summary.total_rooms
        );
        for (section, counts) in &summary.per_section {
            println!(
                "    • {}: {}/{} available",
                section, counts.available, counts.total
            );
            for (room_type, c) in counts.by_type.iter().filter(|(_, c)| c.total > 0) {
                println!(
                    "        {:<7} {}/{}",
                    room_type.to_string(),
                    c.available,
                    c.total
                );
            }
        }
    }

    Ok(())
}

fn validate_command(input: PathBuf) -> Result<()> {
    println!("{}", "🔍 Checking layout...".bright_blue());
    let dataset: Dataset = load(&input)?;
    let mut store = SectionLayoutStore::new();
    let mut rejected = 0;

    for room in &dataset.rooms {
        // records without spans take the default shape of their type
        let footprint = if geometry::is_legal(room.room_type, room.shape()) {
            room.footprint()
        } else {
            CellRect::anchored(
                i32::from(room.col),
                i32::from(room.row),
                geometry::default_shape(room.room_type),
            )
        };

        let request = PlacementRequest {
            floor_id: room.floor_id,
            section: room.section,
            rect: footprint,
            price: room.price,
        };
        match store.place(&request) {
            Ok(_) => println!(
                "  {} {} {}/{} {}",
                "✓".bright_green(),
                room.id,
                room.floor_id,
                room.section,
                footprint
            ),
            Err(LayoutError::Rejected(reason)) => {
                rejected += 1;
                println!(
                    "  {} {} {}/{} {}: {}",
                    "✗".bright_red(),
                    room.id,
                    room.floor_id,
                    room.section,
                    footprint,
                    reason
                );
            }
            Err(err) => return Err(err.into()),
        }
    }

    println!();
    if rejected > 0 {
        bail!("{} of {} rooms violate the layout rules", rejected, dataset.rooms.len());
    }
    println!("{}", "✅ Layout is valid".bright_green().bold());
    Ok(())
}

fn generate_command(input: PathBuf, section: Option<Section>, output: PathBuf) -> Result<()> {
    println!("{}", "🔍 Loading packed sections...".bright_blue());
    let packed: Vec<PackedSection> = load(&input)?;

    let grid = match section {
        Some(section) => packed.iter().find(|p| p.section == section),
        None => packed.first(),
    }
    .context("no matching section in input")?;

    println!("{}", "🎨 Generating SVG...".bright_blue());
    let svg = render_svg(grid)?;
    std::fs::write(&output, svg)?;

    println!();
    println!(
        "{} Saved SVG to {}",
        "✅".bright_green(),
        output.display().to_string().bright_white()
    );

    Ok(())
}
