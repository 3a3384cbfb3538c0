use envconfig::Envconfig;

/// Connection settings for the inventory database.
#[derive(Envconfig, Debug, Clone)]
pub struct DatabaseConfig {
    /// Overrides the discrete `DB_*` settings. `sqlite:` URLs select SQLite.
    #[envconfig(from = "DATABASE_URL")]
    pub database_url: Option<String>,

    #[envconfig(from = "DB_HOST", default = "localhost")]
    pub db_host: String,

    #[envconfig(from = "DB_PORT", default = "5432")]
    pub db_port: u16,

    #[envconfig(from = "DB_NAME", default = "pharmasync")]
    pub db_name: String,

    #[envconfig(from = "DB_USER", default = "postgres")]
    pub db_user: String,

    #[envconfig(from = "DB_PASSWORD", default = "")]
    pub db_password: String,

    #[envconfig(from = "DB_MAX_CONNECTIONS", default = "1")]
    pub db_max_connections: u32,
}

/// Bot and alert settings.
#[derive(Envconfig, Debug, Clone)]
pub struct Config {
    #[envconfig(from = "TELEGRAM_BOT_TOKEN")]
    pub telegram_bot_token: String,

    /// Chat that receives scheduled expiry alerts. Alerts are off when unset.
    #[envconfig(from = "PHARMACY_CHAT_ID")]
    pub pharmacy_chat_id: Option<i64>,

    #[envconfig(from = "EXPIRY_ALERT_CRON", default = "0 0 8 * * *")]
    pub expiry_alert_cron: String,

    #[envconfig(from = "EXPIRY_ALERT_DAYS", default = "180")]
    pub expiry_alert_days: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn database_defaults() {
        let config = DatabaseConfig::init_from_hashmap(&HashMap::new()).unwrap();

        assert_eq!(config.database_url, None);
        assert_eq!(config.db_host, "localhost");
        assert_eq!(config.db_port, 5432);
        assert_eq!(config.db_name, "pharmasync");
        assert_eq!(config.db_user, "postgres");
        assert_eq!(config.db_max_connections, 1);
    }

    #[test]
    fn bot_defaults_apply_when_only_token_is_set() {
        let env = HashMap::from([("TELEGRAM_BOT_TOKEN".to_string(), "token".to_string())]);
        let config = Config::init_from_hashmap(&env).unwrap();

        assert_eq!(config.telegram_bot_token, "token");
        assert_eq!(config.pharmacy_chat_id, None);
        assert_eq!(config.expiry_alert_cron, "0 0 8 * * *");
        assert_eq!(config.expiry_alert_days, 180);
    }

    #[test]
    fn missing_token_is_an_error() {
        assert!(Config::init_from_hashmap(&HashMap::new()).is_err());
    }

    #[test]
    fn alert_chat_is_parsed() {
        let env = HashMap::from([
            ("TELEGRAM_BOT_TOKEN".to_string(), "token".to_string()),
            ("PHARMACY_CHAT_ID".to_string(), "-100123".to_string()),
        ]);
        let config = Config::init_from_hashmap(&env).unwrap();
        assert_eq!(config.pharmacy_chat_id, Some(-100123));
    }

    #[test]
    fn bad_port_is_an_error() {
        let env = HashMap::from([("DB_PORT".to_string(), "postgres".to_string())]);
        assert!(DatabaseConfig::init_from_hashmap(&env).is_err());
    }
}
