use std::{env, fs, process};

use chef_wire_codec::{
    keys::{decode_key, PrivateKey},
    node_config::{
        assemble, client_rb_lines, render_chef_client_command, validation_pem_lines,
        CHEF_CONFIG_DIR,
    },
};
use chef_wire_domain::{
    config::ClientConfig,
    model::BootstrapConfig,
    services::{init_telemetry, TelemetryConfig},
};

const USAGE: &str =
    "Usage: first_boot <bootstrap-config.json> <group> <validator-name> <validator-key.pem>";

fn main() {
    if let Err(err) = init_telemetry(&TelemetryConfig::from_env("CHEF")) {
        eprintln!("failed to initialise telemetry: {err}");
        process::exit(1);
    }

    let args: Vec<String> = env::args().skip(1).collect();
    let [config_path, group, validator_name, key_path] = args.as_slice() else {
        eprintln!("{USAGE}");
        process::exit(1);
    };

    let client_config = match ClientConfig::load_from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("failed to load client configuration: {err}");
            process::exit(1);
        }
    };

    let config: BootstrapConfig = match read(config_path).and_then(|raw| {
        serde_json::from_str(&raw).map_err(|err| format!("invalid bootstrap configuration: {err}"))
    }) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            process::exit(1);
        }
    };

    let validator_key: PrivateKey = match read(key_path)
        .and_then(|raw| decode_key(&raw).map_err(|err| format!("invalid validator key: {err}")))
    {
        Ok(key) => key,
        Err(err) => {
            eprintln!("{err}");
            process::exit(1);
        }
    };

    let (document, pem_lines) = match (assemble(&config), validation_pem_lines(&validator_key)) {
        (Ok(document), Ok(lines)) => (document, lines),
        (Err(err), _) | (_, Err(err)) => {
            eprintln!("failed to render bootstrap files: {err}");
            process::exit(1);
        }
    };

    let first_boot_path = format!("{CHEF_CONFIG_DIR}/first-boot.json");
    println!("# {CHEF_CONFIG_DIR}/client.rb");
    for line in client_rb_lines(group, validator_name, client_config.server_url()) {
        println!("{line}");
    }
    println!("# {CHEF_CONFIG_DIR}/validation.pem");
    for line in pem_lines {
        println!("{line}");
    }
    println!("# {first_boot_path}");
    println!("{document}");
    println!("# command");
    println!("{}", render_chef_client_command(&config, &first_boot_path));
}

fn read(path: &str) -> Result<String, String> {
    fs::read_to_string(path).map_err(|err| format!("failed to read {path}: {err}"))
}
