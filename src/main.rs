use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use eyre::Context;
use phone_tracker::{
    fs,
    input::CoordinateInputs,
    location,
    options::{self, Options},
    plan::RenderPlan,
    reporting, storage,
    surface::GeoJsonGateway,
    tracker::GeoTrackerController,
};
use tracing_appender::rolling::Rotation;

/// Track a missing phone: plot both positions on a map and show the distance between them.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Also write log messages to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Update the coordinate form (missing fields keep their saved values) and redraw the map.
    Track(FormArgs),
    /// Fill in your position from the device location.
    Locate,
}

/// Raw coordinate form fields. Values are kept as typed, invalid values are simply not drawn.
#[derive(Args, Debug)]
struct FormArgs {
    /// Your latitude.
    #[arg(long, allow_hyphen_values = true)]
    my_lat: Option<String>,
    /// Your longitude.
    #[arg(long, allow_hyphen_values = true)]
    my_lng: Option<String>,
    /// Latitude of the missing phone.
    #[arg(long, allow_hyphen_values = true)]
    target_lat: Option<String>,
    /// Longitude of the missing phone.
    #[arg(long, allow_hyphen_values = true)]
    target_lng: Option<String>,
}

impl FormArgs {
    /// Replace the fields of `inputs` that were given on the command line. An empty value clears
    /// the field.
    fn apply(self, mut inputs: CoordinateInputs) -> CoordinateInputs {
        let fields = [
            (self.my_lat, &mut inputs.my_latitude),
            (self.my_lng, &mut inputs.my_longitude),
            (self.target_lat, &mut inputs.target_latitude),
            (self.target_lng, &mut inputs.target_longitude),
        ];
        for (value, field) in fields {
            if let Some(value) = value {
                *field = value;
            }
        }
        inputs
    }
}

type Tracker = GeoTrackerController<GeoJsonGateway, location::FixedGateway>;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = Cli::parse();

    let options_init = options::Options::initialize().await;
    let options: Options = options_init.result.map_err(|error| {
        options_init.logs.print();
        error
    })?;

    fs::create_dir_if_not_exists(&options.data_dir)
        .wrap_err_with(|| format!("Unable to create data directory {:?}", options.data_dir))
        .map_err(|error| {
            options_init.logs.print();
            error
        })?;

    let _reporting_guard = reporting::setup_reporting(&reporting::ReportingOptions {
        data_dir: options.data_dir.clone(),
        log_rotation: Rotation::DAILY,
        stderr: cli.verbose,
    })
    .map_err(|error| {
        options_init.logs.print();
        error
    })?;

    options_init.logs.present();

    let store = storage::FileGateway::new(&options.data_dir);
    let mut inputs = CoordinateInputs::default();
    storage::load_inputs(&store, &mut inputs).await;

    let locator = location::FixedGateway::new(options.device_position, options.device_accuracy)
        .with_latency(Duration::from_millis(options.device_latency_ms));
    let mut tracker = Tracker::with_inputs(GeoJsonGateway::new(), locator, inputs);

    match cli.command {
        Command::Track(form) => {
            let inputs = form.apply(tracker.inputs().clone());
            storage::save_inputs(&store, &inputs).await;
            tracing::info!("Tracking {:?}", inputs);
            let plan = tracker.update(inputs);
            write_map(&options, &tracker).await?;
            print_plan(&plan);
        }
        Command::Locate => match tracker.locate_self().await {
            Ok(located) => {
                storage::save_inputs(&store, tracker.inputs()).await;
                match located.fix.accuracy {
                    Some(accuracy) => {
                        println!("Your location: {} (±{:.0} m)", located.fix.position, accuracy)
                    }
                    None => println!("Your location: {}", located.fix.position),
                }
                if let Some(plan) = located.plan {
                    write_map(&options, &tracker).await?;
                    print_plan(&plan);
                }
            }
            Err(error) => println!("{}", error.user_message()),
        },
    }

    Ok(())
}

async fn write_map(options: &Options, tracker: &Tracker) -> eyre::Result<()> {
    let path = options.map_path();
    let geojson = serde_json::to_string_pretty(&tracker.surface().to_geojson())
        .wrap_err("Failed to serialize map")?;
    fs::write_file(&path, geojson)
        .await
        .wrap_err("Unable to write map")?;
    tracing::debug!("Map written to {:?}", path);
    Ok(())
}

fn print_plan(plan: &RenderPlan) {
    for marker in &plan.markers {
        println!("{}: {}", marker.role.title(), marker.popup());
    }
    match &plan.distance {
        Some(distance) => println!("Distance: {}", distance.display),
        None if plan.markers.is_empty() => {
            println!("Enter coordinates for both devices to begin tracking.")
        }
        None => println!("Enter both positions to see the distance."),
    }
}
