//! Command-line argument definitions for the `leaderline` renderer.

use crate::scene::DragSpec;
use clap::Parser;

/// Render the leader lines of a scene file to SVG
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input scene (JSON)
    #[arg(help = "Path to the scene file")]
    pub input: String,

    /// Path to the output SVG file
    #[arg(short, long, default_value = "out.svg")]
    pub output: String,

    /// Move an element before rendering, e.g. `#a:40,-10`. Repeatable.
    #[arg(long = "drag", value_name = "SELECTOR:DX,DY")]
    pub drags: Vec<DragSpec>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
