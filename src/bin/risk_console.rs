use credit_risk_api::{
    config::ConsoleConfig,
    console::{ConsoleCommand, HELP},
    form_state::{ConsoleSession, FormField},
    presets::{builtin_presets, preset_by_number},
    render::{export_to_file, ResultView, EXPORT_FILE_NAME},
    scoring_client::ScoringClient,
};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Interactive console for scoring a single applicant against the API.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so they do not interleave with the prompt
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "credit_risk_api=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = ConsoleConfig::from_env()?;
    let client = ScoringClient::from_config(&config).map_err(|e| anyhow::anyhow!("{}", e))?;

    println!("Integrated Credit Risk Assessment System");
    println!("Multi-Model Risk Analysis: Credit | Fraud | AML");
    println!("Scoring endpoint: {}", client.api_url());
    println!("{}", HELP);

    let mut session = ConsoleSession::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"\nrisk> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        let command = match ConsoleCommand::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        match command {
            ConsoleCommand::Help => println!("{}", HELP),
            ConsoleCommand::Show => print_form(&session),
            ConsoleCommand::Set { field, value } => match session.set_field(&field, &value) {
                Ok(()) => println!("{} updated", field.to_ascii_uppercase()),
                Err(e) => {
                    println!("Rejected: {}", e);
                    if let Some(choices) = FormField::from_name(&field).and_then(|f| f.choices()) {
                        println!("Options: {}", choices.join(", "));
                    }
                }
            },
            ConsoleCommand::Presets => {
                for (i, preset) in builtin_presets().iter().enumerate() {
                    println!("  {}. {}", i + 1, preset.name());
                }
            }
            ConsoleCommand::Load(number) => match preset_by_number(number) {
                Some(preset) => match session.apply_preset(&preset) {
                    Ok(_) => println!("Test case '{}' loaded successfully!", preset.name()),
                    Err(e) => println!("Could not load test case: {}", e),
                },
                None => println!("No test case {}; type 'presets' to list them", number),
            },
            ConsoleCommand::Clear => {
                session.reset();
                println!("All inputs reset to defaults");
            }
            ConsoleCommand::Submit => {
                let submission = match session.begin_submit() {
                    Ok(submission) => submission,
                    Err(e) => {
                        println!("{}", e);
                        continue;
                    }
                };
                println!("Analyzing applicant risk profile...");
                let outcome = client.submit(&submission.record).await;
                session.complete_submit(submission.id, outcome);
                match (session.result(), session.last_error()) {
                    (Some(result), _) => print!("{}", ResultView::from_record(result).render_text()),
                    (None, Some(err)) => println!("{}", err),
                    (None, None) => {}
                }
            }
            ConsoleCommand::Result => match session.result() {
                Some(result) => {
                    print!("{}", ResultView::from_record(result).render_text());
                    match serde_json::to_string_pretty(result) {
                        Ok(raw) => println!("\nRaw API output:\n{}", raw),
                        Err(e) => println!("Could not format raw output: {}", e),
                    }
                }
                None => println!(
                    "No result yet. Enter applicant data or load a test case, then 'submit'."
                ),
            },
            ConsoleCommand::Export(path) => match session.result() {
                Some(result) => {
                    let path = path.unwrap_or_else(|| PathBuf::from(EXPORT_FILE_NAME));
                    match export_to_file(result, &path).await {
                        Ok(()) => println!("Results saved to {}", path.display()),
                        Err(e) => println!("Export failed: {}", e),
                    }
                }
                None => println!("Nothing to export yet"),
            },
            ConsoleCommand::Quit => break,
        }
    }

    Ok(())
}

fn print_form(session: &ConsoleSession) {
    let form = session.form();
    for field in FormField::ALL {
        match field.choices() {
            Some(choices) => println!(
                "  {:<18} {:<24} [{}]",
                field.name(),
                form.display_value(field),
                choices.join(" | ")
            ),
            None => println!("  {:<18} {}", field.name(), form.display_value(field)),
        }
    }
}
