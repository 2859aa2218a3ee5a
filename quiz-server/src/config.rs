use quiz_core::SessionRules;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub session_length: usize,
    pub question_time_seconds: u32,
    pub reveal_delay_seconds: u64,
    pub starting_lives: i32,
    pub power_up_charges: u32,
    pub questions_dir: String,
    pub questions_url: Option<String>,
    pub student: Option<String>,
    pub connection_timeout_seconds: u64,
    pub session_timeout_minutes: u64,
}

impl Config {
    pub fn new() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .expect("Invalid PORT"),
            session_length: env::var("SESSION_LENGTH")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .expect("Invalid SESSION_LENGTH"),
            question_time_seconds: env::var("QUESTION_TIME_SECONDS")
                .unwrap_or_else(|_| "25".to_string())
                .parse()
                .expect("Invalid QUESTION_TIME_SECONDS"),
            reveal_delay_seconds: env::var("REVEAL_DELAY_SECONDS")
                .unwrap_or_else(|_| "2".to_string())
                .parse()
                .expect("Invalid REVEAL_DELAY_SECONDS"),
            starting_lives: env::var("STARTING_LIVES")
                .unwrap_or_else(|_| "3".to_string())
                .parse()
                .expect("Invalid STARTING_LIVES"),
            power_up_charges: env::var("POWER_UP_CHARGES")
                .unwrap_or_else(|_| "2".to_string())
                .parse()
                .expect("Invalid POWER_UP_CHARGES"),
            questions_dir: env::var("QUESTIONS_DIR").unwrap_or_else(|_| "./questions".to_string()),
            questions_url: env::var("QUESTIONS_URL").ok(),
            student: env::var("STUDENT").ok(),
            connection_timeout_seconds: env::var("CONNECTION_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .expect("Invalid CONNECTION_TIMEOUT_SECONDS"),
            session_timeout_minutes: env::var("SESSION_TIMEOUT_MINUTES")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .expect("Invalid SESSION_TIMEOUT_MINUTES"),
        }
    }

    pub fn session_rules(&self) -> SessionRules {
        SessionRules {
            question_time_limit: self.question_time_seconds,
            starting_lives: self.starting_lives,
            power_up_charges: self.power_up_charges,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
