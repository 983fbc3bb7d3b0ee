use std::collections::BTreeMap;

use pipelink_client::{ConnectionConfig, PipeConnector, DEFAULT_ADDRESS_PREFIX};
use pipelink_transport::DefaultConnector;
use serde::Serialize;

use crate::cmd::EnvinfoArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::OutputFormat;

#[derive(Serialize)]
struct PlatformInfo {
    os: String,
    arch: String,
}

#[derive(Serialize)]
struct DefaultsInfo {
    transport: &'static str,
    address_prefix: &'static str,
    delimiter: String,
    retry_interval_ms: u128,
    connect_timeout_ms: u128,
    max_attempts: u32,
    mode: String,
}

#[derive(Serialize)]
struct EnvInfoOutput {
    version: String,
    target: String,
    platform: PlatformInfo,
    defaults: DefaultsInfo,
    dependencies: BTreeMap<String, String>,
    environment: BTreeMap<String, Option<String>>,
}

pub fn run(_args: EnvinfoArgs, format: OutputFormat) -> CliResult<i32> {
    let mut deps = BTreeMap::new();
    deps.insert("bytes".to_string(), "1".to_string());
    deps.insert("clap".to_string(), "4.5".to_string());
    deps.insert("tracing".to_string(), "0.1".to_string());
    if cfg!(unix) {
        deps.insert("libc".to_string(), "0.2".to_string());
    }
    if cfg!(windows) {
        deps.insert("windows-sys".to_string(), "0.61".to_string());
    }

    let mut env = BTreeMap::new();
    for key in ["PIPELINK_PREFIX", "PIPELINK_LOG_LEVEL", "RUST_LOG"] {
        env.insert(key.to_string(), std::env::var(key).ok());
    }

    let output = EnvInfoOutput {
        version: env!("CARGO_PKG_VERSION").to_string(),
        target: target_triple(),
        platform: PlatformInfo {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
        },
        defaults: defaults_info(&ConnectionConfig::default()),
        dependencies: deps,
        environment: env,
    };

    print_envinfo(&output, format);
    Ok(SUCCESS)
}

fn defaults_info(config: &ConnectionConfig) -> DefaultsInfo {
    DefaultsInfo {
        transport: DefaultConnector::default().transport_name(),
        address_prefix: DEFAULT_ADDRESS_PREFIX,
        delimiter: format!("0x{:02x}", config.delimiter),
        retry_interval_ms: config.retry_interval.as_millis(),
        connect_timeout_ms: config.connect_timeout.as_millis(),
        max_attempts: config.max_attempts,
        mode: config.mode.to_string(),
    }
}

fn target_triple() -> String {
    if let Some(target) = option_env!("PIPELINK_BUILD_TARGET") {
        return target.to_string();
    }

    match (std::env::consts::ARCH, std::env::consts::OS) {
        ("aarch64", "macos") => "aarch64-apple-darwin".to_string(),
        ("x86_64", "macos") => "x86_64-apple-darwin".to_string(),
        ("aarch64", "linux") => "aarch64-unknown-linux-gnu".to_string(),
        ("x86_64", "linux") => "x86_64-unknown-linux-gnu".to_string(),
        ("x86_64", "windows") => "x86_64-pc-windows-msvc".to_string(),
        (arch, os) => format!("{arch}-unknown-{os}"),
    }
}

fn print_envinfo(output: &EnvInfoOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string(output).unwrap_or_else(|_| "{}".to_string())
        ),
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("pipelink environment\n");
            println!("  Version:    {}", output.version);
            println!("  Target:     {}", output.target);
            println!(
                "  Platform:   {} ({})",
                output.platform.os, output.platform.arch
            );
            println!("\n  Defaults:");
            println!("    {:<16} {}", "transport", output.defaults.transport);
            println!("    {:<16} {}", "prefix", output.defaults.address_prefix);
            println!("    {:<16} {}", "delimiter", output.defaults.delimiter);
            println!(
                "    {:<16} {}ms",
                "retry interval", output.defaults.retry_interval_ms
            );
            println!(
                "    {:<16} {}ms",
                "connect timeout", output.defaults.connect_timeout_ms
            );
            println!("    {:<16} {}", "max attempts", output.defaults.max_attempts);
            println!("    {:<16} {}", "mode", output.defaults.mode);
            println!("\n  Dependencies:");
            for (k, v) in &output.dependencies {
                println!("    {:<12} {}", k, v);
            }
            println!("\n  Environment:");
            for (k, v) in &output.environment {
                println!("    {:<20} {}", k, v.as_deref().unwrap_or("(not set)"));
            }
        }
        OutputFormat::Raw => println!("{}", output.version),
    }
}
