use anyhow::Context;
use clap::Parser;
use smart_traffic::core::ConfigProvider;
use smart_traffic::utils::{logger, validation::Validate};
use smart_traffic::{
    CliConfig, DetectionPipeline, DetectorSettings, LocalStorage, SignalController,
    SignalTimings, TerminalDisplay, TrafficConfig, TrafficEngine, TrafficError, YoloDetector,
};
use std::path::Path;

fn fail(e: &TrafficError, context: &str) -> ! {
    tracing::error!(
        "❌ {}: {} (Category: {:?}, Severity: {:?})",
        context,
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(e.exit_code().max(1));
}

fn detector_settings(config: &TrafficConfig) -> DetectorSettings {
    DetectorSettings {
        input_size: config.detector.input_size,
        confidence_threshold: config.detector.confidence_threshold,
        iou_threshold: config.detector.iou_threshold,
        num_threads: config.detector.num_threads,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliConfig::parse();

    let config = match args.resolve() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load configuration: {}", e);
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(e.exit_code().max(1));
        }
    };

    let log_file = config.log_file().map(Path::new);
    let logging = if args.json_logs {
        logger::init_json_logger(args.verbose, log_file)
    } else {
        logger::init_cli_logger(args.verbose, log_file)
    };
    logging.context("failed to open log file")?;

    tracing::info!("Starting smart-traffic");
    if args.verbose {
        tracing::debug!("CLI config: {:?}", args);
        tracing::debug!("Resolved config: {:?}", config);
    }

    if let Err(e) = args.validate().and_then(|_| config.validate()) {
        fail(&e, "Configuration validation failed");
    }

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No images will be processed");
        println!("Model:        {}", config.model_path());
        if let Some(fallback) = config.fallback_model_path() {
            println!("Fallback:     {}", fallback);
        }
        println!("Output:       {}", config.output_path());
        println!("Policy:       {:?}", config.policy());
        for image in &args.images {
            let exists = Path::new(image).is_file();
            println!("Image:        {} {}", image, if exists { "✓" } else { "✗ missing" });
        }
        return Ok(());
    }

    let detector = match YoloDetector::load(
        config.model_path(),
        config.fallback_model_path(),
        detector_settings(&config),
    ) {
        Ok(detector) => detector,
        Err(e) => fail(&e, "Failed to load YOLO model"),
    };

    let monitor_enabled = config.monitoring_enabled();
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let controller = SignalController::new(
        TerminalDisplay::new(),
        SignalTimings {
            red_hold: config.red_hold(),
            yellow_hold: config.yellow_hold(),
        },
    );

    let storage = LocalStorage::new(config.output_path());
    let pipeline = DetectionPipeline::new(storage, config, detector);
    let engine = TrafficEngine::new_with_monitoring(pipeline, monitor_enabled);

    let mut worst: Option<TrafficError> = None;
    for image in &args.images {
        controller.mark_processing();

        match engine.run(image).await {
            Ok(report) => {
                if args.no_signal {
                    println!("{}", report.summary());
                } else {
                    controller.run_cycle(&report).await;
                }
            }
            Err(e) => {
                controller.mark_failed();
                tracing::warn!("⚠️ No vehicle count for {}: {}", image, e);
                eprintln!("⚠️ {}: {}", image, e.user_friendly_message());
                if worst.as_ref().map_or(true, |w| e.severity() > w.severity()) {
                    worst = Some(e);
                }
            }
        }
    }

    match worst {
        None => {
            tracing::info!("✅ Processed {} image(s)", args.images.len());
            Ok(())
        }
        Some(e) => fail(&e, "Some images could not be processed"),
    }
}
