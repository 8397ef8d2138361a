//! SecOps Core - Headless Runner
//!
//! Chạy một audit hoặc network scan tới khi xong và in kết quả JSON.
//!
//! ```text
//! secops-core audit
//! secops-core scan <range> <ports> [quick|comprehensive|vulnerability]
//! ```

use secops_core::constants;
use secops_core::logic::pipeline::Progress;
use secops_core::logic::scan::{ScanConfig, ScanType};
use secops_core::{EngineConfig, EngineError, EngineResult, SecurityEngine};

const USAGE: &str = "usage: secops-core audit | secops-core scan <range> <ports> [quick|comprehensive|vulnerability]";

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting {} v{}", constants::APP_NAME, constants::APP_VERSION);

    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Err(e) = run(&args).await {
        log::error!("{}", e);
        eprintln!("{}", USAGE);
        std::process::exit(1);
    }
}

async fn run(args: &[String]) -> EngineResult<()> {
    let config = EngineConfig::from_env()?;
    let engine = SecurityEngine::new(config)?;

    let json = match args.first().map(String::as_str) {
        Some("audit") => {
            let started = engine.start_audit()?;
            log::info!("Audit {} started ({} checks)", started.id, started.progress.total_stages);
            let run = finished(engine.finish_audit().await)?;
            log_progress("audit", &run.progress);
            serde_json::to_string_pretty(&run.report())?
        }
        Some("scan") => {
            let scan_config = scan_config(&args[1..])?;
            let started = engine.start_scan(scan_config)?;
            log::info!("Scan {} started ({} hosts)", started.id, started.hosts_total);
            let run = finished(engine.finish_scan().await)?;
            log_progress("scan", &run.progress);
            serde_json::to_string_pretty(&run)?
        }
        _ => return Err(EngineError::invalid_config("expected 'audit' or 'scan'")),
    };

    println!("{}", json);
    Ok(())
}

fn scan_config(args: &[String]) -> EngineResult<ScanConfig> {
    let (range, ports) = match args {
        [range, ports, ..] => (range, ports),
        _ => return Err(EngineError::invalid_config("scan needs <range> and <ports>")),
    };
    let scan_type = match args.get(2) {
        Some(t) => t.parse::<ScanType>()?,
        None => ScanType::default(),
    };
    Ok(ScanConfig::new(scan_type, range, ports))
}

fn finished<T>(slot: Option<EngineResult<T>>) -> EngineResult<T> {
    slot.unwrap_or_else(|| Err(EngineError::RunAborted("no active run".to_string())))
}

fn log_progress(kind: &str, progress: &Progress) {
    log::info!(
        "{} finished: {}/{} stages ({}%)",
        kind,
        progress.completed_stages,
        progress.total_stages,
        progress.percent_rounded()
    );
}
