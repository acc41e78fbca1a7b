use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use crate::error::{AppError, Result};

pub const KB_FILE: &str = "chatbot_kb.json";
pub const COLLEGE_INFO_FILE: &str = "college_info.json";

#[derive(Clone)]
pub struct Config {
    pub server_addr: SocketAddr,
    /// Absent key leaves the server running with the chat generation path disabled.
    pub gemini_api_key: Option<String>,
    pub admin_username: String,
    pub admin_password: String,
    pub secret_key: String,
    pub website_url: String,
    pub data_dir: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load environment variables from .env file if it exists
        dotenv::dotenv().ok();

        let gemini_api_key = env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty());

        let admin_username = env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string());
        let admin_password = env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "change-me".to_string());
        let secret_key =
            env::var("SECRET_KEY").unwrap_or_else(|_| "change-this-in-production".to_string());

        let website_url = env::var("COLLEGE_WEBSITE")
            .unwrap_or_else(|_| "https://nationalcollege.ac.in/".to_string());
        let data_dir = PathBuf::from(env::var("DATA_DIR").unwrap_or_else(|_| ".".to_string()));

        // Load server configuration with defaults
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
        let port = port
            .parse::<u16>()
            .map_err(|e| AppError::Config(format!("Invalid port: {}", e)))?;
        let ip = IpAddr::from_str(&host)
            .map_err(|e| AppError::Config(format!("Invalid host address: {}", e)))?;

        let server_addr = SocketAddr::new(ip, port);

        Ok(Config {
            server_addr,
            gemini_api_key,
            admin_username,
            admin_password,
            secret_key,
            website_url,
            data_dir,
        })
    }

    pub fn kb_path(&self) -> PathBuf {
        self.data_dir.join(KB_FILE)
    }

    pub fn college_info_path(&self) -> PathBuf {
        self.data_dir.join(COLLEGE_INFO_FILE)
    }
}
