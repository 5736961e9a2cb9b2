use ts_domain::config::{Config, ConfigSeverity};

/// Parse and validate the config, printing any issues.
///
/// Returns `true` when there are no error-severity issues.
pub fn validate(config: &Config, config_path: &str) -> bool {
    let issues = config.validate();

    if issues.is_empty() {
        println!("Config OK ({config_path})");
        return true;
    }

    let error_count = issues
        .iter()
        .filter(|e| e.severity == ConfigSeverity::Error)
        .count();
    let warning_count = issues.len() - error_count;

    for issue in &issues {
        println!("{issue}");
    }

    println!(
        "\n{} error(s), {} warning(s) in {config_path}",
        error_count, warning_count,
    );

    error_count == 0
}

/// Dump the resolved config (with all defaults filled in) as TOML, with
/// the access key secret masked.
pub fn show(config: &Config) -> anyhow::Result<()> {
    print!("{}", render(config)?);
    Ok(())
}

fn render(config: &Config) -> anyhow::Result<String> {
    let mut masked = config.clone();
    if !masked.tablestore.access_key_secret.is_empty() {
        masked.tablestore.access_key_secret = mask_secret(&masked.tablestore.access_key_secret);
    }
    Ok(toml::to_string_pretty(&masked)?)
}

fn mask_secret(s: &str) -> String {
    let trimmed = s.trim();
    let n = trimmed.chars().count();
    if n <= 10 {
        return "****".to_string();
    }
    let head: String = trimmed.chars().take(4).collect();
    let tail: String = trimmed.chars().skip(n - 4).collect();
    format!("{head}...{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_secrets_are_fully_masked() {
        assert_eq!(mask_secret("abc"), "****");
        assert_eq!(mask_secret("0123456789"), "****");
    }

    #[test]
    fn long_secrets_keep_head_and_tail() {
        assert_eq!(mask_secret("LTAIabcdefghijklmnop"), "LTAI...mnop");
    }

    #[test]
    fn rendered_config_never_contains_secret() {
        let mut config = Config::default();
        config.tablestore.access_key_secret = "super-secret-value-123".into();
        config.session.prefix = "sess:".into();

        let out = render(&config).unwrap();
        assert!(!out.contains("super-secret-value-123"));
        assert!(out.contains("supe...-123"));
        assert!(out.contains("prefix = \"sess:\""));
        assert!(out.contains("expire = 3600"));
    }
}
