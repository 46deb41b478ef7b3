use tome_core::Config;
use tome_telemetry::Paths;

pub fn run(force: bool) -> anyhow::Result<()> {
    let paths = Paths::new()?;
    let config_path = paths.config_file();

    if config_path.exists() && !force {
        println!(
            "Config already exists at {} (use --force to overwrite)",
            config_path.display()
        );
        return Ok(());
    }

    Config::new().save(&config_path)?;

    println!("✓ Wrote default config to {}", config_path.display());
    println!("\nSet the provider credentials with:");
    println!("  TOME_LLM_TYPE=openai|groq|samba");
    println!("  TOME_LLM_TOKEN=<api key>");

    Ok(())
}
