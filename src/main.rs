//! `printer-fleet` command-line interface.
//!
//! `serve` and `demo` run the in-process stores; every other subcommand drives
//! a REST store at `--api-url`.

use clap::{Parser, Subcommand, ValueEnum};
use printer_fleet::clients::{EntityStore, FleetStores};
use printer_fleet::config::FleetConfig;
use printer_fleet::domain::{ModelId, NewPlastic, NewPrintModel, NewPrinter, PlasticId, PrinterId};
use printer_fleet::lifecycle::{setup_tracing, FleetSystem};
use printer_fleet::service::{PrintSimulator, PrinterService};
use serde::Serialize;
use std::net::SocketAddr;
use tracing::{info, Instrument};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Collection {
    Printers,
    Plastics,
    Models,
}

#[derive(Parser)]
#[command(name = "printer-fleet")]
#[command(about = "Manage a fleet of 3D printers, filament spools and print models", long_about = None)]
struct Args {
    /// Base URL of the REST store [env: PRINTER_FLEET_API_URL]
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// HTTP request timeout in seconds
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Chance of a printer fault per simulator tick, within [0, 1]
    #[arg(long, global = true)]
    fault_probability: Option<f64>,

    /// Simulator tick interval in milliseconds
    #[arg(long, global = true)]
    tick_ms: Option<u64>,

    /// Fixed simulator seed for reproducible runs
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve in-process stores over HTTP
    Serve {
        #[arg(long, default_value = "127.0.0.1:3000")]
        listen: SocketAddr,
    },
    /// Run a self-contained walkthrough against in-process stores
    Demo,
    /// Print every entity of a collection as JSON
    List {
        #[arg(value_enum)]
        collection: Collection,
    },
    /// Load a plastic spool into a printer
    Install { printer: u32, plastic: u32 },
    /// Unload the spool from a printer
    Remove { printer: u32 },
    /// Start a model on a printer, or queue it if the printer is busy
    Enqueue { printer: u32, model: u32 },
    /// Show a printer's active job and queue
    Queue { printer: u32 },
    /// Clear a printer's error state
    Reset { printer: u32 },
    /// Tick a printer until its job finishes, faults or it goes idle
    Simulate { printer: u32 },
}

impl Args {
    fn config(&self) -> Result<FleetConfig, String> {
        let mut config = FleetConfig::from_env().map_err(|e| e.to_string())?;
        if let Some(url) = &self.api_url {
            config = config.with_api_url(url);
        }
        if let Some(secs) = self.timeout_secs {
            config = config.with_request_timeout_secs(secs);
        }
        if let Some(probability) = self.fault_probability {
            config = config.with_fault_probability(probability);
        }
        if let Some(ms) = self.tick_ms {
            config = config.with_tick_interval_ms(ms);
        }
        if self.seed.is_some() {
            config = config.with_rng_seed(self.seed);
        }
        config.validate().map_err(|e| e.to_string())?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    let args = Args::parse();
    let config = args.config()?;

    match args.command {
        Command::Serve { listen } => serve(&config, listen).await,
        Command::Demo => demo(&config).await,
        command => {
            let stores = FleetStores::rest(&config).map_err(|e| e.to_string())?;
            let service = PrinterService::new(stores).with_fault_probability(config.fault_probability());
            remote(&config, &service, command).await
        }
    }
}

async fn serve(config: &FleetConfig, listen: SocketAddr) -> Result<(), String> {
    let system = FleetSystem::new(config);
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| format!("Cannot bind {listen}: {e}"))?;

    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
        info!("Interrupt received");
    };
    printer_fleet::server::serve(listener, system.stores(), shutdown)
        .await
        .map_err(|e| e.to_string())?;

    system.shutdown().await
}

async fn remote(config: &FleetConfig, service: &PrinterService, command: Command) -> Result<(), String> {
    let stores = service.stores();
    match command {
        Command::List { collection } => match collection {
            Collection::Printers => print_json(&stores.printers.list().await.map_err(|e| e.to_string())?),
            Collection::Plastics => print_json(&stores.plastics.list().await.map_err(|e| e.to_string())?),
            Collection::Models => print_json(&stores.models.list().await.map_err(|e| e.to_string())?),
        },
        Command::Install { printer, plastic } => {
            service
                .try_install_plastic(PrinterId(printer), PlasticId(plastic))
                .await
                .map_err(|e| e.to_string())?;
            println!("Installed plastic {plastic} in printer {printer}");
            Ok(())
        }
        Command::Remove { printer } => {
            let plastic = service
                .try_remove_plastic(PrinterId(printer))
                .await
                .map_err(|e| e.to_string())?;
            println!("Removed {plastic} from printer {printer}");
            Ok(())
        }
        Command::Enqueue { printer, model } => {
            let placement = service
                .try_add_model_to_printer(PrinterId(printer), ModelId(model))
                .await
                .map_err(|e| e.to_string())?;
            println!("Model {model} on printer {printer}: {placement:?}");
            Ok(())
        }
        Command::Queue { printer } => {
            let queue = service
                .print_queue(PrinterId(printer))
                .await
                .map_err(|e| e.to_string())?;
            print_json(&queue)
        }
        Command::Reset { printer } => {
            let reset = service
                .reset_printer(PrinterId(printer))
                .await
                .map_err(|e| e.to_string())?;
            print_json(&reset)
        }
        Command::Simulate { printer } => {
            let simulator = PrintSimulator::new(service.clone(), config);
            let outcome = simulator
                .run(PrinterId(printer))
                .await
                .map_err(|e| e.to_string())?;
            print_json(&outcome)
        }
        Command::Serve { .. } | Command::Demo => Ok(()),
    }
}

async fn demo(config: &FleetConfig) -> Result<(), String> {
    info!("Starting demo with in-process stores");
    let system = FleetSystem::new(config);

    let span = tracing::info_span!("inventory");
    let (printer, spool, models) = async {
        let printer = system
            .printers
            .create(NewPrinter::new("Prusa", "i3 MK3S+", 200))
            .await?;
        let spool = system.plastics.create(NewPlastic::new("PLA", "Orange", 50.0)).await?;
        let mut models = Vec::new();
        for (name, perimeter) in [("Benchy", 12.0), ("Gear", 8.0), ("Vase", 40.0)] {
            models.push(system.models.create(NewPrintModel::new(name, perimeter)).await?);
        }
        Ok::<_, printer_fleet::framework::StoreError>((printer, spool, models))
    }
    .instrument(span)
    .await
    .map_err(|e| e.to_string())?;

    let service = &system.service;
    if !service.install_plastic(printer.id, spool.id).await {
        return Err("Plastic install refused".to_string());
    }
    for model in &models {
        let placement = service
            .try_add_model_to_printer(printer.id, model.id)
            .await
            .map_err(|e| e.to_string())?;
        info!(model_id = %model.id, ?placement, "Model accepted");
    }
    print_json(&service.print_queue(printer.id).await.map_err(|e| e.to_string())?)?;

    let simulator = PrintSimulator::new(service.clone(), config);
    loop {
        let outcome = simulator.run(printer.id).await.map_err(|e| e.to_string())?;
        print_json(&outcome)?;
        match outcome {
            printer_fleet::service::TickOutcome::Finished { next: Some(_), .. } => continue,
            printer_fleet::service::TickOutcome::Faulted { .. } => {
                service.reset_printer(printer.id).await.map_err(|e| e.to_string())?;
                break;
            }
            _ => break,
        }
    }

    print_json(&system.printers.list().await.map_err(|e| e.to_string())?)?;
    print_json(&system.plastics.list().await.map_err(|e| e.to_string())?)?;
    print_json(&system.models.list().await.map_err(|e| e.to_string())?)?;

    system.shutdown().await
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    println!("{text}");
    Ok(())
}
