use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;

use cubemarch::{Brush, EditMode, IsoSurface, MeshBuffers, MesherConfig, Pt3};

#[derive(Parser)]
#[command(name = "cubemarch")]
#[command(about = "Build a scalar-field grid, apply brush edits and write the marching-cubes mesh", long_about = None)]
struct Cli {
    /// JSON config file; defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output file (.json writes the buffers as JSON, anything else the binary blob)
    #[arg(short, long, default_value = "mesh.bin")]
    output: PathBuf,

    /// Brush center as x,y,z (repeatable)
    #[arg(long = "brush", value_parser = parse_point)]
    brushes: Vec<Pt3>,

    #[arg(long, default_value = "1.5")]
    brush_radius: f32,

    /// Change per second at the brush center
    #[arg(long, default_value = "1.0")]
    strength: f32,

    /// Seconds each brush is applied for
    #[arg(long, default_value = "0.1")]
    dt: f32,

    /// Lower values instead of raising them
    #[arg(long)]
    subtract: bool,

    /// Print the effective config as JSON and exit
    #[arg(long)]
    print_config: bool,
}

fn parse_point(s: &str) -> Result<Pt3, String> {
    let parts: Vec<f32> = s
        .split(',')
        .map(|p| p.trim().parse::<f32>().map_err(|e| format!("{}: {}", p, e)))
        .collect::<Result<_, _>>()?;
    match parts[..] {
        [x, y, z] => Ok(Pt3::new(x, y, z)),
        _ => Err(format!("expected x,y,z, got {:?}", s)),
    }
}

fn write_mesh(path: &Path, mesh: &MeshBuffers) -> Result<(), Box<dyn std::error::Error>> {
    let is_json = path
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        fs::write(path, serde_json::to_vec(mesh)?)?;
    } else {
        fs::write(path, mesh.to_bytes())?;
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => MesherConfig::load(path)?,
        None => MesherConfig::default(),
    };

    if cli.print_config {
        println!("{}", config.to_json_pretty()?);
        return Ok(());
    }

    let mut surface = IsoSurface::new(config)?;
    let mode = EditMode::from_add(!cli.subtract);
    for center in &cli.brushes {
        let brush = Brush::new(*center, cli.brush_radius, cli.strength);
        if !surface.edit(&brush, cli.dt, mode) {
            log::warn!("brush at {:?} touched no cell", center.coords.as_slice());
        }
    }

    let mesh = surface.mesh();
    write_mesh(&cli.output, mesh)?;
    log::info!(
        "wrote {} vertices, {} triangles to {}",
        mesh.vertex_count(),
        mesh.triangle_count(),
        cli.output.display()
    );

    Ok(())
}
