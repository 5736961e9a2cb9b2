use ts_domain::config::{Config, ConfigSeverity};
use ts_sessions::SessionStore;

/// Run all diagnostic checks and print a summary.
///
/// Returns `Ok(true)` when every check passes.
pub async fn run(config: &Config, config_path: &str) -> anyhow::Result<bool> {
    println!("tablesession doctor");
    println!("===================\n");

    let mut all_passed = true;

    check_config_file(config_path, &mut all_passed);
    let valid = check_config_validation(config, &mut all_passed);
    if valid {
        check_table_access(config, &mut all_passed).await;
    } else {
        print_check(
            "Table store reachable",
            false,
            "skipped (config has errors)".into(),
        );
    }

    println!();
    if all_passed {
        println!("All checks passed.");
    } else {
        println!("Some checks failed. Review the output above.");
    }

    Ok(all_passed)
}

// ── Individual checks ─────────────────────────────────────────────────

fn check_config_file(config_path: &str, all_passed: &mut bool) {
    let exists = std::path::Path::new(config_path).exists();
    print_check(
        "Config file exists",
        exists,
        if exists {
            config_path.to_owned()
        } else {
            format!("{config_path} not found (using defaults)")
        },
    );
    if !exists {
        *all_passed = false;
    }
}

fn check_config_validation(config: &Config, all_passed: &mut bool) -> bool {
    let issues = config.validate();
    let error_count = issues
        .iter()
        .filter(|e| e.severity == ConfigSeverity::Error)
        .count();

    if issues.is_empty() {
        print_check("Config validation", true, "no issues".into());
    } else {
        print_check(
            "Config validation",
            error_count == 0,
            format!("{} issue(s) ({} error(s))", issues.len(), error_count),
        );
        for issue in &issues {
            println!("      {issue}");
        }
    }

    if error_count > 0 {
        *all_passed = false;
    }
    error_count == 0
}

/// Read a random session ID that cannot exist.  Success proves the
/// endpoint, credentials and table name are all accepted.
async fn check_table_access(config: &Config, all_passed: &mut bool) {
    let probe = format!("doctor-probe-{}", uuid::Uuid::new_v4());
    let outcome = match SessionStore::from_config(config) {
        Ok(store) => store.read(&probe).await.map(|_| ()),
        Err(e) => Err(e),
    };

    let target = format!(
        "{} / {} / {}",
        config.tablestore.endpoint, config.tablestore.instance_name, config.tablestore.table_name
    );
    match outcome {
        Ok(()) => print_check("Table store reachable", true, target),
        Err(e) => {
            print_check("Table store reachable", false, format!("{target}: {e}"));
            *all_passed = false;
        }
    }
}

fn print_check(name: &str, passed: bool, detail: String) {
    let status = if passed { "PASS" } else { "FAIL" };
    println!("  [{status}] {name}: {detail}");
}
