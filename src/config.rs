use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    /// Mirror token logins into the sessions table.
    pub create_session_on_login: bool,
    /// When true, a duplicate email on registration names the colliding
    /// field; when false the error stays generic.
    pub expose_conflict_field: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        Ok(Self {
            database_url,
            create_session_on_login: env_bool("CREATE_SESSION_ON_LOGIN", false),
            expose_conflict_field: env_bool("EXPOSE_CONFLICT_FIELD", false),
        })
    }
}

fn env_bool(name: &str, default: bool) -> bool {
    std::env::var(name)
        .ok()
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_bool_parses_truthy_values() {
        std::env::set_var("USERHUB_TEST_FLAG", "true");
        assert!(env_bool("USERHUB_TEST_FLAG", false));
        std::env::set_var("USERHUB_TEST_FLAG", "0");
        assert!(!env_bool("USERHUB_TEST_FLAG", true));
        std::env::remove_var("USERHUB_TEST_FLAG");
        assert!(env_bool("USERHUB_TEST_FLAG", true));
    }
}
