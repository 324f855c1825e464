use tapfolio_common::EnvVars;

pub struct ApiServerEnv {
    pub port: String,
    pub admin_bootstrap_user: String,
}

impl EnvVars for ApiServerEnv {
    fn load() -> Self {
        Self {
            port: std::env::var("PORT").unwrap_or("3080".into()),
            admin_bootstrap_user: std::env::var("ADMIN_BOOTSTRAP_USER").unwrap_or_default(),
        }
    }

    fn get_env_var(&self, key: &str) -> String {
        match key {
            "PORT" => self.port.clone(),
            "ADMIN_BOOTSTRAP_USER" => self.admin_bootstrap_user.clone(),
            _ => panic!("{} is not set", key),
        }
    }
}
