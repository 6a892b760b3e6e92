use std::{
    io::{self, BufRead as _, Write as _},
    sync::Arc,
};

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use workouts::{
    AppError, FileBlobStore, FormSubmission, GeoPoint, SessionController, Workout, WorkoutId,
    WorkoutKind, WorkoutStore,
    config::AppConfig,
    models::RenderId,
    surface::{GeolocationProvider, MapSurface, MarkerStyle, WorkoutForm, WorkoutList},
};

fn init_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

/// Map surface that reports what it would draw.
struct TerminalMap;

impl MapSurface for TerminalMap {
    fn place_marker(&mut self, id: RenderId, point: GeoPoint, style: MarkerStyle) {
        tracing::debug!("map: marker {id} {style:?} at {point}");
    }

    fn remove_marker(&mut self, id: RenderId) {
        tracing::debug!("map: remove marker {id}");
    }

    fn draw_segment(&mut self, id: RenderId, from: GeoPoint, to: GeoPoint) {
        tracing::debug!("map: segment {id} {from} -> {to}");
    }

    fn remove_segment(&mut self, id: RenderId) {
        tracing::debug!("map: remove segment {id}");
    }

    fn fit_to_bounds(&mut self, points: &[GeoPoint]) {
        tracing::debug!("map: fit to {} points", points.len());
    }

    fn center_on(&mut self, point: GeoPoint) {
        println!("Map centered on {point}");
    }
}

struct TerminalForm;

impl WorkoutForm for TerminalForm {
    fn prefill_distance(&mut self, km: f64, _locked: bool) {
        println!("Distance: {km:.2} km");
    }

    fn show(&mut self) {
        println!("Enter: submit <running|hiking> <duration min> <cadence spm|elevation m>");
    }

    fn hide(&mut self) {}

    fn clear_fields(&mut self) {}
}

struct TerminalList;

impl WorkoutList for TerminalList {
    fn render_workout(&mut self, workout: &Workout) {
        print_workout(workout);
    }

    fn set_active(&mut self, id: &WorkoutId) {
        println!("Selected {id}");
    }

    fn set_instructions_visible(&mut self, visible: bool) {
        if visible {
            println!("No workouts yet. Add points with: click <lat> <lng>");
        }
    }
}

struct ConfiguredPosition(Option<GeoPoint>);

impl GeolocationProvider for ConfiguredPosition {
    fn current_position(&self) -> Result<GeoPoint, AppError> {
        self.0
            .ok_or_else(|| AppError::Geolocation("ROUTE_LOG_START is not set".to_string()))
    }
}

fn print_workout(workout: &Workout) {
    println!(
        "[{}] {} {}  {:.2} km  {:.0} min  {:.1} {}  {} {} {}",
        workout.id(),
        workout.display_icon(),
        workout.title(),
        workout.distance_km(),
        workout.duration_min(),
        workout.derived_metric(),
        workout.derived_unit(),
        workout.extra_icon(),
        workout.extra_metric(),
        workout.extra_unit(),
    );
}

/// One line typed at the prompt.
#[derive(Parser, Debug, PartialEq)]
#[command(name = "route-log", no_binary_name = true)]
#[command(about = "Draw routes on the map and log them as workouts", long_about = None)]
struct Repl {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// Add a route point
    Click {
        #[arg(value_parser = parse_latitude, allow_negative_numbers = true)]
        lat: f64,
        #[arg(value_parser = parse_longitude, allow_negative_numbers = true)]
        lng: f64,
    },
    /// Remove the last point
    Undo,
    /// Discard the route
    Cancel,
    /// Freeze the route and open the form
    Finish,
    /// Commit the finished route
    Submit {
        /// running or hiking
        kind: WorkoutKind,
        /// Duration in minutes
        duration: f64,
        /// Cadence in spm for runs, elevation gain in m for hikes
        #[arg(allow_negative_numbers = true)]
        extra: f64,
    },
    /// Discard a finished route
    Abandon,
    /// Show all workouts
    List,
    /// Draw a workout's route
    Show { id: String },
    #[command(alias = "exit")]
    Quit,
}

fn parse_degrees(raw: &str, limit: f64) -> Result<f64, String> {
    let value: f64 = raw.parse().map_err(|e| format!("{e}"))?;
    if value.is_finite() && value.abs() <= limit {
        Ok(value)
    } else {
        Err(format!("must be between -{limit} and {limit}"))
    }
}

fn parse_latitude(raw: &str) -> Result<f64, String> {
    parse_degrees(raw, 90.0)
}

fn parse_longitude(raw: &str) -> Result<f64, String> {
    parse_degrees(raw, 180.0)
}

type Session = SessionController<TerminalMap, TerminalForm, TerminalList>;

fn run_command(session: &mut Session, command: Command) -> anyhow::Result<bool> {
    match command {
        Command::Quit => return Ok(false),
        Command::Click { lat, lng } => {
            if session.point_clicked(GeoPoint::new(lat, lng)) {
                println!(
                    "{} points, {:.2} km",
                    session.builder().len(),
                    session.builder().total_distance_km()
                );
            } else {
                println!("Route is finished, submit or abandon it first");
            }
        }
        Command::Undo => {
            let removed = session.undo()?;
            println!("Removed {}", removed.point);
        }
        Command::Cancel => session.cancel(),
        Command::Finish => {
            session.finish()?;
        }
        Command::Submit {
            kind,
            duration,
            extra,
        } => {
            session.submit(FormSubmission {
                kind,
                duration_min: duration,
                extra,
            })?;
        }
        Command::Abandon => session.abandon(),
        Command::List => session.workouts().iter().for_each(print_workout),
        Command::Show { id } => session.select_workout(&WorkoutId::from(id))?,
    }
    Ok(true)
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let config = AppConfig::from_env();

    let backend = Arc::new(FileBlobStore::new(&config.data_dir, &config.storage_key)?);
    tracing::info!("Using workout log at {}", backend.path().display());
    let store = WorkoutStore::open_or_empty(backend)?;

    let mut session = SessionController::new(TerminalMap, TerminalForm, TerminalList, store);
    session.start(&ConfiguredPosition(config.start_position));

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        if line.trim().is_empty() {
            continue;
        }
        let repl = match Repl::try_parse_from(line.split_whitespace()) {
            Ok(repl) => repl,
            Err(e) => {
                e.print()?;
                continue;
            }
        };

        match run_command(&mut session, repl.command) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => println!("Error: {e}"),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    fn parse(line: &str) -> Result<Command, clap::Error> {
        Repl::try_parse_from(line.split_whitespace()).map(|repl| repl.command)
    }

    #[test]
    fn test_command_definition() {
        Repl::command().debug_assert();
    }

    #[test]
    fn test_parse_click_with_negative_longitude() {
        assert_eq!(
            parse("click 40.015 -105.27").unwrap(),
            Command::Click {
                lat: 40.015,
                lng: -105.27
            }
        );
    }

    #[test]
    fn test_click_rejects_invalid_coordinates() {
        for line in [
            "click 95 0",
            "click 0 -180.5",
            "click NaN 0",
            "click 0 inf",
            "click north east",
            "click 40.0",
        ] {
            assert!(parse(line).is_err(), "{line} accepted");
        }
    }

    #[test]
    fn test_parse_submit() {
        assert_eq!(
            parse("submit hiking 45 -50").unwrap(),
            Command::Submit {
                kind: WorkoutKind::Hiking,
                duration: 45.0,
                extra: -50.0
            }
        );
        assert!(parse("submit cycling 45 10").is_err());
        assert!(parse("submit running 45").is_err());
    }

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(parse("undo").unwrap(), Command::Undo);
        assert_eq!(parse("exit").unwrap(), Command::Quit);
        assert_eq!(
            parse("show 9876543210").unwrap(),
            Command::Show {
                id: "9876543210".to_string()
            }
        );
        assert!(parse("teleport").is_err());
    }
}
