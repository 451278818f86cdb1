use anyhow::Context;
use bulk_order::core::export::write_record;
use bulk_order::core::SubmissionStatus;
use bulk_order::utils::{logger, validation::Validate};
use bulk_order::{
    validate_batch, BulkError, BulkPipeline, CliArgs, HttpTransport, LocalStorage, PipelineOutcome,
};
use clap::Parser;
use std::io::Read;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    // 初始化日誌
    if args.log_json {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting bulk-order");

    let config = match args.resolve_config() {
        Ok(config) => config,
        Err(e) => exit_with(&e),
    };
    tracing::debug!("Resolved config: {:?}", config);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - the backend will not be contacted");
        if let Err(e) = config.submission.validate() {
            exit_with(&e);
        }
        let raw_text = read_batch(args.input.as_deref())?;
        let report = validate_batch(&config, &raw_text);
        println!("{}", serde_json::to_string_pretty(&report)?);
        std::process::exit(if report.issues.is_empty() { 0 } else { 1 });
    }

    if let Err(e) = config.validate() {
        exit_with(&e);
    }

    let raw_text = read_batch(args.input.as_deref())?;

    let transport = match HttpTransport::new(&config.backend, &config) {
        Ok(transport) => transport,
        Err(e) => exit_with(&e),
    };
    let pipeline = BulkPipeline::new(transport, &config);

    // Ctrl-C 取消目前批次，已完成的項目仍會回報
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("🛑 Interrupt received, cancelling submission");
                cancel.cancel();
            }
        });
    }

    let outcome = match pipeline.run_with_cancellation(&raw_text, &cancel).await {
        Ok(outcome) => outcome,
        Err(e) => exit_with(&e),
    };

    let exit_code = match outcome {
        PipelineOutcome::NotSubmitted(report) => {
            for issue in &report.issues {
                eprintln!("❌ {}", issue);
            }
            if report.valid_entries.is_empty() && report.issues.is_empty() {
                eprintln!("Nothing to submit");
            }
            println!("{}", serde_json::to_string_pretty(&report)?);
            1
        }
        PipelineOutcome::Submitted { entries, result } => {
            if let Some(record_dir) = config.record_dir() {
                let storage = LocalStorage::new(record_dir.to_string());
                match write_record(&storage, &entries, &result).await {
                    Ok(location) => println!("📁 Submission record saved to: {}", location),
                    Err(e) => exit_with(&e),
                }
            }

            println!("{}", serde_json::to_string_pretty(&result)?);
            match result.status {
                SubmissionStatus::Success if !result.cancelled => 0,
                SubmissionStatus::Failed => 1,
                _ => 2,
            }
        }
    };

    std::process::exit(exit_code);
}

fn read_batch(input: Option<&str>) -> anyhow::Result<String> {
    match input {
        None | Some("-") => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("failed to read batch from stdin")?;
            Ok(text)
        }
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read batch file '{}'", path)),
    }
}

fn exit_with(e: &BulkError) -> ! {
    tracing::error!(
        "❌ bulk-order failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    std::process::exit(e.exit_code());
}
