//! dx-export - DirectX (.x) text exporter
//!
//! Converts scene snapshots (JSON, glTF/GLB) to .x files with meshes,
//! materials, skin weights and keyframed animation.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use dx_export::{
    export_to_file, list_scene, load_scene, ExportConfig, ExportMode, SnapshotTimeline,
    DEFAULT_FRAME_RATE,
};

#[derive(Parser)]
#[command(name = "dx-export")]
#[command(about = "DirectX (.x) text exporter")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export a scene to a .x file
    Export {
        /// Input scene (JSON snapshot, glTF or GLB)
        scene: PathBuf,

        /// Output .x file (default: scene path with .x extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Path to export.toml (command line flags override it)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Which objects to export
        #[arg(short, long, value_enum)]
        mode: Option<ExportMode>,

        /// Write vertex colors
        #[arg(long)]
        colors: bool,

        /// Write texture coordinates
        #[arg(long)]
        texcoords: bool,

        /// Skip the MeshNormals block
        #[arg(long)]
        no_normals: bool,

        /// Skip the MeshMaterialList block
        #[arg(long)]
        no_materials: bool,

        /// Keep Blender's right-handed Z-up axes
        #[arg(long)]
        no_swap_yz: bool,

        /// Do not add object world translations to vertices
        #[arg(long)]
        no_world: bool,

        /// Animation ticks per second (1-100)
        #[arg(short, long)]
        ticks: Option<u32>,

        /// Request compressed output (not supported)
        #[arg(long)]
        compressed: bool,

        /// Frame rate used to sample glTF animations
        #[arg(short, long, default_value_t = DEFAULT_FRAME_RATE)]
        frame_rate: f32,
    },

    /// List the objects, bones and actions in a scene
    List {
        /// Input scene (JSON snapshot, glTF or GLB)
        scene: PathBuf,

        /// Frame rate used to sample glTF animations
        #[arg(short, long, default_value_t = DEFAULT_FRAME_RATE)]
        frame_rate: f32,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Export {
            scene,
            output,
            config,
            mode,
            colors,
            texcoords,
            no_normals,
            no_materials,
            no_swap_yz,
            no_world,
            ticks,
            compressed,
            frame_rate,
        } => {
            let mut options = match config {
                Some(path) => ExportConfig::load(&path)?,
                None => ExportConfig::default(),
            };
            if let Some(mode) = mode {
                options.mode = mode;
            }
            if let Some(ticks) = ticks {
                options.ticks_per_second = ticks;
            }
            options.write_vertex_colors |= colors;
            options.write_texcoords |= texcoords;
            options.write_normals &= !no_normals;
            options.write_materials &= !no_materials;
            options.swap_y_z &= !no_swap_yz;
            options.apply_world_translation &= !no_world;
            options.compressed |= compressed;

            let output = output.unwrap_or_else(|| scene.with_extension("x"));
            tracing::info!("Exporting {:?} -> {:?} ({:?})", scene, output, options.mode);

            let loaded = load_scene(&scene, frame_rate)?;
            let mut timeline = SnapshotTimeline::new();
            export_to_file(&loaded, &mut timeline, &options, &output)?;
            tracing::info!("Done!");
        }

        Commands::List { scene, frame_rate } => {
            let loaded = load_scene(&scene, frame_rate)?;
            list_scene(&loaded);
        }
    }

    Ok(())
}
