use clap::{Parser, Subcommand};
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tilt_servo::{
    spawn_dispatch, spawn_monitor, AngleEstimator, Config, Controller, DispatchResult, HttpActuator, Mode,
    ServoAngle, TiltCell, DEFAULT_HOST,
};
use tokio::io::{AsyncRead, BufReader};
use tokio::task::JoinHandle;

#[derive(Parser, Debug)]
#[command(version, about = "Drive a network servo by hand or from device tilt")]
struct Args {
    /// Actuator address, `host` or `host:port`
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,
    #[arg(long)]
    send_timeout_ms: Option<u64>,
    #[arg(long)]
    read_timeout_ms: Option<u64>,
    /// Cadence of the dispatch and monitor loops
    #[arg(long)]
    interval_ms: Option<u64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send a single angle (0-180)
    Manual {
        #[arg(allow_hyphen_values = true)]
        angle: i64,
    },
    /// Follow accelerometer samples (`x,y,z` per line) from a file or stdin
    Auto {
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        offset: String,
        #[arg(long)]
        input: Option<PathBuf>,
        /// Delay between samples; a file defaults to the dispatch interval
        #[arg(long)]
        pace_ms: Option<u64>,
    },
    /// Poll and print the current servo angle until Ctrl-C
    Monitor,
    /// Read the current servo angle once
    Get,
}

impl Args {
    fn config(&self) -> Config {
        let mut config = Config {
            host: self.host.clone(),
            ..Config::default()
        };
        if let Some(ms) = self.send_timeout_ms {
            config.send_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = self.read_timeout_ms {
            config.read_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = self.interval_ms {
            config.dispatch_interval = Duration::from_millis(ms);
            config.monitor_interval = Duration::from_millis(ms);
        }
        config
    }
}

fn print_feedback(controller: &Controller) -> JoinHandle<()> {
    let mut rx = controller.subscribe();
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let feedback = rx.borrow_and_update().clone();
            if feedback.last_error.is_empty() {
                println!("{}", feedback.message);
            } else {
                println!("{} ({})", feedback.message, feedback.last_error);
            }
        }
    })
}

async fn auto(
    controller: Arc<Controller>,
    estimator: AngleEstimator,
    config: &Config,
    offset: &str,
    input: Option<PathBuf>,
    pace: Option<Duration>,
) -> Result<(), Box<dyn Error>> {
    controller.set_mode(Mode::Automatic);
    controller.edit_offset(offset)?;
    controller.confirm_offset();

    // a replayed file holds each sample for at least one tick, a live stream is not paced
    let pace = match input {
        Some(_) => pace.or(Some(config.dispatch_interval)),
        None => pace,
    };
    let reader: Box<dyn AsyncRead + Unpin + Send> = match input {
        Some(path) => Box::new(tokio::fs::File::open(path).await?),
        None => Box::new(tokio::io::stdin()),
    };

    let printer = print_feedback(&controller);
    let handle = spawn_dispatch(controller.clone(), config.dispatch_interval);

    let outcome = tokio::select! {
        res = estimator.follow(BufReader::new(reader), pace) => res.map(|_| ()),
        res = tokio::signal::ctrl_c() => res,
    };

    handle.stop().await;
    printer.abort();

    let readout = controller.readout();
    println!("Tilt: {}, Strength: {}", readout.direction, readout.strength);
    println!("Servo Angle (without offset): {}", readout.angle_without_offset);
    println!("Servo Angle (with offset): {}", readout.angle_with_offset);

    outcome?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = args.config();

    let tilt = Arc::new(TiltCell::default());
    let actuator = Arc::new(HttpActuator::new(&config)?);
    let controller = Arc::new(Controller::new(actuator, tilt.clone()));

    match args.command {
        Command::Manual { angle } => {
            let angle = ServoAngle::new(angle)?;
            let result = controller.send_manual(angle).await?;
            println!("{}", controller.feedback().message);
            if let DispatchResult::Failed(message) = result {
                return Err(message.into());
            }
        }
        Command::Auto { offset, input, pace_ms } => {
            let estimator = AngleEstimator::new(tilt);
            auto(controller, estimator, &config, &offset, input, pace_ms.map(Duration::from_millis)).await?;
        }
        Command::Monitor => {
            let printer = print_feedback(&controller);
            let handle = spawn_monitor(controller.clone(), config.monitor_interval);
            tokio::signal::ctrl_c().await?;
            handle.stop().await;
            printer.abort();
        }
        Command::Get => {
            let angle = controller.refresh_current_angle().await?;
            println!("Current Servo angle: {}", angle);
        }
    }

    Ok(())
}
