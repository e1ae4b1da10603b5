use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rust_i18n::{i18n, t};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

mod client;
mod config;
mod doctor;
mod footprint;
mod i18n;
mod report;
mod ui;
mod web;

use client::carbon::CarbonInterfaceClient;
use client::cohere::CohereClient;
use client::supabase::SupabaseUsageStore;
use config::Settings;
use doctor::Doctor;
use footprint::emissions::{EmissionFactors, EmissionsEstimator};
use footprint::input::{LifestyleInput, RecycleMaterial, TransportMode};
use footprint::prompt::PromptTemplate;
use footprint::usage::{MemoryUsageStore, UsageStore, today};
use report::{Report, ReportService};
use ui::chart::print_chart;
use ui::theme::create_skin;
use web::routes::AppState;

i18n!("locales", fallback = "en");

#[derive(Parser)]
#[command(name = "greenme", version, about = "Carbon footprint estimates and AI sustainability tips")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the web app (default)
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Generate a report in the terminal
    Report(ReportArgs),
    /// Show today's emissions-API usage
    Usage,
    /// Check configuration and connectivity
    Doctor,
}

#[derive(Args)]
struct ReportArgs {
    #[arg(long, default_value = "")]
    nickname: String,
    #[arg(long, default_value = "")]
    region: String,
    #[arg(long, default_value_t = 1)]
    family_size: u32,
    /// Monthly energy use (kWh)
    #[arg(long, default_value_t = 0.0)]
    energy_kwh: f64,
    /// Renewable share of energy use (%)
    #[arg(long, default_value_t = 0)]
    renewable: u8,
    /// Monthly water use (liters)
    #[arg(long, default_value_t = 0.0)]
    water: f64,
    /// Weekly commute (km)
    #[arg(long, default_value_t = 0.0)]
    commute_km: f64,
    /// car, bike, bus, train or electric_vehicle
    #[arg(long, default_value = "car")]
    transport: String,
    /// Weekly waste (kg)
    #[arg(long, default_value_t = 0.0)]
    waste: f64,
    /// Comma separated: plastic, glass, paper, e_waste, other
    #[arg(long, value_delimiter = ',')]
    recycle: Vec<String>,
    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

impl ReportArgs {
    fn to_input(&self) -> Result<LifestyleInput> {
        let transport_mode: TransportMode = self.transport.parse()?;
        let recycled = self
            .recycle
            .iter()
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.parse::<RecycleMaterial>())
            .collect::<Result<Vec<_>, _>>()?;

        let input = LifestyleInput {
            nickname: self.nickname.clone(),
            region: self.region.clone(),
            family_size: self.family_size,
            energy_kwh: self.energy_kwh,
            renewable_ratio: self.renewable,
            water_liters: self.water,
            commute_km: self.commute_km,
            transport_mode,
            weekly_waste_kg: self.waste,
            recycled,
        };
        Ok(input.validate()?)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("greenme=info,tower_http=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let settings = Settings::new().unwrap_or_else(|e| {
        eprintln!("{}", t!("config_error", error = e).red());
        std::process::exit(1);
    });
    i18n::set_locale(&settings.language);

    match cli.command.unwrap_or(Command::Serve { host: None, port: None }) {
        Command::Serve { host, port } => {
            let service = build_service(&settings)?;
            let host = host.unwrap_or_else(|| settings.server.host.clone());
            let port = port.unwrap_or(settings.server.port);
            info!("{}", t!("server_starting", address = format!("http://{host}:{port}")));
            web::start_server(Arc::new(AppState { service }), &host, port).await
        }
        Command::Report(args) => {
            let input = args.to_input()?;
            let service = build_service(&settings)?;
            if !args.json {
                println!("{}", t!("report_generating").green());
            }
            let report = service.generate(input).await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
            Ok(())
        }
        Command::Usage => {
            let store = usage_store(&settings)?;
            let date = today();
            let count = store.today_count(date).await?;
            let limit = settings.carbon.daily_limit;
            let name = store.name();
            println!(
                "{}",
                t!("usage_line", date = date, count = count, limit = limit, store = name)
            );
            Ok(())
        }
        Command::Doctor => Doctor::check(&settings).await,
    }
}

fn usage_store(settings: &Settings) -> Result<Arc<dyn UsageStore>> {
    match SupabaseUsageStore::from_config(&settings.supabase)? {
        Some(store) => Ok(Arc::new(store)),
        None => {
            warn!("{}", t!("store_memory"));
            Ok(Arc::new(MemoryUsageStore::new()))
        }
    }
}

fn build_service(settings: &Settings) -> Result<ReportService> {
    let carbon = CarbonInterfaceClient::new(&settings.carbon)?;
    if !carbon.has_key() {
        warn!("CARBON_API_KEY is not set; every estimate will use the static formula");
    }
    let cohere = CohereClient::new(&settings.llm)?;
    if !cohere.has_key() {
        warn!("COHERE_API_KEY is not set; tips cannot be generated");
    }

    let template = match &settings.llm.prompt_template_path {
        Some(path) => PromptTemplate::from_file(path).with_context(|| format!("loading prompt template {path}"))?,
        None => PromptTemplate::sustainability_report(),
    };

    let factors = EmissionFactors {
        fallback_kg_per_kwh: settings.factors.fallback_kg_per_kwh,
        commute_kg_per_km: settings.factors.commute_kg_per_km,
    };
    let estimator = EmissionsEstimator::new(
        Arc::new(carbon),
        usage_store(settings)?,
        factors,
        settings.carbon.daily_limit,
        settings.carbon.country.clone(),
    );

    Ok(ReportService::new(estimator, Arc::new(cohere), template))
}

fn print_report(report: &Report) {
    let rule = "─".repeat(60).truecolor(67, 160, 71);

    println!();
    print_chart(&t!("breakdown_title"), &report.breakdown.categories());
    for warning in &report.breakdown.warnings {
        println!("{} {}", "⚠".yellow(), warning.yellow());
    }
    println!("{}", t!("total_line", total = format!("{:.2}", report.breakdown.total_kg())));

    println!("{rule}");
    match (&report.tips, &report.tips_error) {
        (Some(tips), _) => {
            println!("{}", t!("tips_title").green().bold());
            create_skin().print_text(tips);
        }
        (None, Some(error)) => eprintln!("{} {}", "✗".red(), error),
        (None, None) => {}
    }
    println!("{rule}");

    if let Some(cost) = report.cost_usd {
        println!("{}", t!("cost_info", usd = format!("{cost:.6}")).dimmed());
    }
}
