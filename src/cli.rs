//! CLI argument parsing for the hos-trip-planner binary.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "hos-trip-planner", about = "HOS-aware long-haul trip planner")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Plan a trip and print the resulting PlanResult as JSON (default if no subcommand given)
    Plan {
        /// Path to a TripInput JSON document; reads stdin if omitted
        #[arg(long)]
        input: Option<String>,
    },
    /// Validate a TripInput document without planning it
    Validate {
        /// Path to a TripInput JSON document; reads stdin if omitted
        #[arg(long)]
        input: Option<String>,
    },
}
