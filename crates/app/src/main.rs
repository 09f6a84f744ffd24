//! Seatwise CLI

use std::{io, process};

use rusty_money::iso::Currency;
use seatwise::{
    clusters::ClusterKey,
    fixtures::Fixture,
    report::{SavingsReport, write_session},
    savings::{ByVendorId, ClusterSavings, FirstCandidate, VendorSelector},
    summary::ClusterSummary,
    switching::SwitchingPolicy,
    vendors::currency,
};
use seatwise_app::{
    config::{AssembleArgs, CliConfig, ClustersArgs, Command, DataServiceArgs, SavingsArgs},
    context::AppContext,
    observability,
    service::DataService,
};

#[tokio::main]
pub async fn main() {
    let config = match CliConfig::load() {
        Ok(config) => config,
        Err(error) => error.exit(),
    };

    if let Err(error) = observability::init(&config.logging) {
        eprintln!("{error}");
        process::exit(1);
    }

    if let Err(error) = run(config.command).await {
        eprintln!("{error}");
        process::exit(1);
    }
}

async fn run(command: Command) -> Result<(), String> {
    match command {
        Command::Savings(args) => savings(args),
        Command::Clusters(args) => clusters(args).await,
        Command::Assemble(args) => assemble(args).await,
    }
}

fn savings(args: SavingsArgs) -> Result<(), String> {
    let fixture = Fixture::load(&args.fixture)
        .map_err(|error| format!("failed to load fixture: {error}"))?;

    let selector = selector(args.vendor);
    let mut report = SavingsReport::new(report_currency(&args.currency)?);

    for cluster in fixture.clusters() {
        report.push(
            cluster,
            ClusterSavings::calculate(cluster, selector.as_ref(), fixture.policy()),
        );
    }

    report
        .write_to(io::stdout().lock())
        .map_err(|error| error.to_string())
}

async fn clusters(args: ClustersArgs) -> Result<(), String> {
    let context = context(&args.service, SwitchingPolicy::from(&args.policy))?;

    let clusters = context
        .clusters_with_pricing(&args.app_name)
        .await
        .map_err(|error| format!("failed to load clusters: {error}"))?;

    if clusters.is_empty() {
        println!("no clusters contain an application named {}", args.app_name);

        return Ok(());
    }

    let selector = selector(args.vendor);
    let mut report = SavingsReport::new(report_currency(&args.currency)?);

    for cluster in &clusters {
        report.push(
            cluster,
            ClusterSavings::calculate(cluster, selector.as_ref(), &context.policy),
        );
    }

    report
        .write_to(io::stdout().lock())
        .map_err(|error| error.to_string())
}

async fn assemble(args: AssembleArgs) -> Result<(), String> {
    let context = context(&args.service, SwitchingPolicy::from(&args.policy))?;
    let key = ClusterKey::from(args.cluster);
    let sessions = &context.sessions;

    let pricing = context
        .data
        .vendor_pricing(&key)
        .await
        .map_err(|error| format!("failed to load vendor pricing: {error}"))?;

    let mut resolutions = vec![
        sessions
            .select_app(&key, args.app_id.into())
            .await
            .map_err(|error| error.to_string())?,
    ];

    for code in args.add {
        match sessions.add_subsidiary(&key, code.into()).await {
            Ok(resolution) => resolutions.push(resolution),
            Err(error) => eprintln!("{error}"),
        }
    }

    for code in args.remove {
        match sessions.remove_subsidiary(&key, &code.into()).await {
            Ok(resolution) => resolutions.push(resolution),
            Err(error) => eprintln!("{error}"),
        }
    }

    for notification in resolutions
        .iter()
        .filter_map(|resolution| resolution.notification.as_ref())
    {
        println!("{notification}");
    }

    let currency = report_currency(&args.currency)?;
    let session = sessions.view(&key, |session| session.clone()).await;
    let chosen = selector(args.vendor).select(&pricing);
    let summary = ClusterSummary::from_rows(session.rows(), chosen, &context.policy);

    write_session(io::stdout().lock(), &session, &summary, currency)
        .map_err(|error| error.to_string())
}

fn context(
    service: &DataServiceArgs,
    policy: SwitchingPolicy,
) -> Result<AppContext, String> {
    let config = service.client_config().map_err(|error| error.to_string())?;

    Ok(AppContext::from_http(config, service.fetch_timeout(), policy))
}

fn selector(vendor: Option<String>) -> Box<dyn VendorSelector> {
    match vendor {
        Some(vendor) => Box::new(ByVendorId(vendor.into())),
        None => Box::new(FirstCandidate),
    }
}

fn report_currency(code: &str) -> Result<&'static Currency, String> {
    currency(code).map_err(|error| error.to_string())
}
