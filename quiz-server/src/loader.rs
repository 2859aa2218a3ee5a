use std::path::Path;
use tracing::{info, warn};

use crate::config::Config;
use quiz_core::QuestionBank;

/// Loads the question bank from a base URL or a local directory.
///
/// A per-student file (`questions-student{N}.json`) is tried first when a
/// student id is configured, then the shared `questions.json`. The first
/// file that reads and parses wins.
pub async fn load_question_bank(
    config: &Config,
) -> Result<QuestionBank, Box<dyn std::error::Error>> {
    let mut candidates = Vec::new();
    if let Some(student) = &config.student {
        candidates.push(format!("questions-student{}.json", student));
    }
    candidates.push("questions.json".to_string());

    let mut last_error: Option<Box<dyn std::error::Error>> = None;
    for file in &candidates {
        let raw = match &config.questions_url {
            Some(base) => fetch_question_file(base, file).await,
            None => read_question_file(&config.questions_dir, file),
        };

        match raw {
            Ok(raw) => match QuestionBank::from_json(&raw) {
                Ok(bank) => {
                    info!("Loaded {} questions from {}", bank.len(), file);
                    return Ok(bank);
                }
                Err(e) => {
                    warn!("Question file {} is malformed: {}", file, e);
                    last_error = Some(e.into());
                }
            },
            Err(e) => {
                warn!("Could not read question file {}: {}", file, e);
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| "no question files available".into()))
}

async fn fetch_question_file(base: &str, file: &str) -> Result<String, Box<dyn std::error::Error>> {
    let url = format!("{}/{}", base.trim_end_matches('/'), file);
    let response = reqwest::get(&url).await?.error_for_status()?;
    Ok(response.text().await?)
}

fn read_question_file(dir: &str, file: &str) -> Result<String, Box<dyn std::error::Error>> {
    Ok(std::fs::read_to_string(Path::new(dir).join(file))?)
}
