use webscout_core::{Config, Paths};
use webscout_tools::browser::launch::find_browser_binary;
use webscout_tools::ToolRegistry;

/// Run environment diagnostics.
pub fn run() -> anyhow::Result<()> {
    let paths = Paths::new();

    println!();
    println!("🩺 webscout doctor — Environment Diagnostics");
    println!("================================");
    println!();

    let mut ok_count = 0u32;
    let mut warn_count = 0u32;
    let mut err_count = 0u32;

    // --- 1. Config ---
    println!("📋 Configuration");
    if paths.config_file().exists() {
        print_ok("Config file exists", &paths.config_file().display().to_string());
        ok_count += 1;
    } else {
        print_warn("Config file not found", "Defaults will be used; run any tool to create dirs");
        warn_count += 1;
    }

    let config = Config::load_or_default(&paths)?;
    println!("  Model: {}", config.agent.model);
    println!("  Headless: {}", config.browser.headless);
    println!("  Incognito: {}", config.browser.incognito);
    println!();

    // --- 2. Workspace ---
    println!("📁 Workspace");
    let ws = paths.workspace();
    if ws.exists() {
        print_ok("Workspace directory exists", &ws.display().to_string());
        ok_count += 1;

        let test_file = ws.join(".doctor_test");
        match std::fs::write(&test_file, "test") {
            Ok(_) => {
                let _ = std::fs::remove_file(&test_file);
                print_ok("Workspace writable", "");
                ok_count += 1;
            }
            Err(e) => {
                print_err("Workspace not writable", &e.to_string());
                err_count += 1;
            }
        }
    } else {
        print_warn("Workspace directory not found", "Created automatically on first run");
        warn_count += 1;
    }

    let shots = paths.screenshots_dir();
    if shots.exists() {
        let count = std::fs::read_dir(&shots).map(|d| d.count()).unwrap_or(0);
        print_ok("Screenshots directory", &format!("{} ({} files)", shots.display(), count));
        ok_count += 1;
    } else {
        print_warn("Screenshots directory not created yet", "Created on first screenshot");
        warn_count += 1;
    }
    println!();

    // --- 3. Tools ---
    println!("🔧 Tools");
    let registry = ToolRegistry::with_defaults();
    print_ok(&format!("{} tools registered", registry.tool_names().len()), "");
    ok_count += 1;
    println!();

    // --- 4. Browser ---
    println!("🌐 Browser");
    match find_browser_binary(config.browser.chrome_path.as_deref()) {
        Some(path) => {
            print_ok("Chrome/Chromium found", &path);
            ok_count += 1;
        }
        None => {
            print_err(
                "Chrome/Chromium not found",
                "Install Chrome or set browser.chromePath in config.json",
            );
            err_count += 1;
        }
    }
    if let Some(ref ua) = config.browser.chrome_version {
        println!("  User agent Chrome version override: {}", ua);
    }
    println!();

    // --- Summary ---
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!(
        "  ✅ {} passed  ⚠️  {} warnings  ❌ {} errors",
        ok_count, warn_count, err_count
    );

    if err_count > 0 {
        println!();
        println!("  {} error(s) must be fixed before normal use.", err_count);
    } else if warn_count > 0 {
        println!();
        println!("  Core features OK. Some optional features not ready.");
    } else {
        println!();
        println!("  🎉 All good!");
    }
    println!();

    Ok(())
}

fn print_ok(label: &str, detail: &str) {
    if detail.is_empty() {
        println!("  ✅ {}", label);
    } else {
        println!("  ✅ {} — {}", label, detail);
    }
}

fn print_warn(label: &str, hint: &str) {
    if hint.is_empty() {
        println!("  ⚠️  {}", label);
    } else {
        println!("  ⚠️  {} — {}", label, hint);
    }
}

fn print_err(label: &str, hint: &str) {
    if hint.is_empty() {
        println!("  ❌ {}", label);
    } else {
        println!("  ❌ {} — {}", label, hint);
    }
}
