use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use crate::api::AppState;
use crate::config::GuideConfig;
use crate::crime::CrimeLoader;
use crate::itinerary;
use crate::views::ViewOrchestrator;
use crate::web;

#[derive(Debug, Parser)]
#[command(name = "cityguide", version, about = "City travel-guide dashboard")]
pub struct Cli {
    /// Configuration file (TOML)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the dashboard HTTP server
    Serve {
        #[arg(long)]
        port: Option<u16>,
    },
    /// Look up points of interest around a location
    Places {
        /// restaurant, hotel or attraction
        category: String,
        #[arg(long, allow_hyphen_values = true)]
        lat: Option<f64>,
        #[arg(long, allow_hyphen_values = true)]
        lng: Option<f64>,
        /// Search radius in meters
        #[arg(long)]
        radius: Option<u32>,
    },
    /// List itinerary themes, or the stops of one theme
    Themes { key: Option<String> },
    /// Print per-district crime totals
    Crime { path: Option<PathBuf> },
}

pub async fn run(cli: Cli, config: GuideConfig) -> Result<()> {
    match cli.command {
        Command::Serve { port } => {
            let port = port.unwrap_or(config.server.port);
            info!("Starting server for {}", config.map.city);
            let views = ViewOrchestrator::from_config(config)?;
            web::run(AppState::new(views), port).await
        }
        Command::Places {
            category,
            lat,
            lng,
            radius,
        } => {
            let lat = lat.unwrap_or(config.map.center_lat);
            let lng = lng.unwrap_or(config.map.center_lng);
            let radius = radius.unwrap_or(config.map.radius_m);
            let views = ViewOrchestrator::from_config(config)?;
            let places = views.places(&category, lat, lng, radius).await;
            println!("{} {} places within {}m", places.len(), category, radius);
            for place in places {
                match &place.cuisine {
                    Some(cuisine) => println!(
                        "  {} [{}] ({:.5}, {:.5})",
                        place.name, cuisine, place.lat, place.lng
                    ),
                    None => println!("  {} ({:.5}, {:.5})", place.name, place.lat, place.lng),
                }
            }
            Ok(())
        }
        Command::Themes { key: None } => {
            for theme in itinerary::themes() {
                println!("{:<16} {}", theme.key, theme.title);
            }
            Ok(())
        }
        Command::Themes { key: Some(key) } => {
            let theme = itinerary::theme_by_key(&key)?;
            println!("{}", theme.title);
            for stop in &theme.stops {
                println!("  {} {}", stop.kind.symbol(), stop.numbered_name());
                println!("     {}", stop.description);
                println!("     {}", itinerary::search_link(stop, &config.map.city));
            }
            Ok(())
        }
        Command::Crime { path } => {
            let path = path.unwrap_or_else(|| PathBuf::from(&config.crime.csv_path));
            let totals = CrimeLoader::default()
                .try_load(&path)
                .with_context(|| format!("Failed to load crime statistics from {}", path.display()))?;
            for aggregate in totals {
                println!("{:<32} {:>10.0}", aggregate.region_name, aggregate.total_incidents);
            }
            Ok(())
        }
    }
}
