//! Files and command line that bootstrap a node against the Chef server:
//! `client.rb`, `validation.pem`, the first-boot document and the
//! `chef-client` invocation.

use std::fmt;

use chef_wire_domain::model::BootstrapConfig;
use tracing::debug;

use crate::{
    error::{record_failure, CodecError, CodecResult},
    keys::{encode_key, PrivateKey},
};

/// Directory holding the chef-client configuration on the node.
pub const CHEF_CONFIG_DIR: &str = "/etc/chef";

/// `client.rb` lines. Nodes register as `<group>-<ip address>` and
/// authenticate first through the validator client.
pub fn client_rb_lines(group: &str, validator_name: &str, server_url: &str) -> Vec<String> {
    vec![
        "require 'rubygems'".to_string(),
        "require 'ohai'".to_string(),
        "o = Ohai::System.new".to_string(),
        "o.all_plugins".to_string(),
        format!("node_name \"{group}-\" + o[:ipaddress]"),
        "log_level :info".to_string(),
        "log_location STDOUT".to_string(),
        format!("validation_client_name \"{validator_name}\""),
        format!("chef_server_url \"{server_url}\""),
    ]
}

/// `validation.pem` lines for the validator key.
pub fn validation_pem_lines(validator_key: &PrivateKey) -> CodecResult<Vec<String>> {
    let pem = encode_key(validator_key)?;
    Ok(pem.lines().map(str::to_owned).collect())
}

/// Builds the first-boot JSON: the attributes object with a `run_list`
/// member appended.
///
/// Attributes are spliced as text, so their bytes survive untouched. An
/// attributes object without members gets no separating comma, which keeps
/// `{ }` valid. Run-list entries are quoted but not escaped; entries holding
/// `"` or `\` produce an invalid document.
pub fn assemble(config: &BootstrapConfig) -> CodecResult<String> {
    let mut json = match config.attributes() {
        Some(attributes) => open_attributes(attributes).inspect_err(record_failure)?,
        None => String::from("{"),
    };

    json.push_str("\"run_list\": [");
    let entries: Vec<String> = config
        .run_list()
        .iter()
        .map(|entry| format!("\"{entry}\""))
        .collect();
    json.push_str(&entries.join(","));
    json.push_str("]}");

    debug!(run_list = config.run_list().len(), "assembled first-boot document");
    Ok(json)
}

// Drops the closing brace and leaves the object open for one more member.
fn open_attributes(attributes: &str) -> CodecResult<String> {
    let close = attributes
        .rfind('}')
        .ok_or_else(|| CodecError::malformed("attributes are not a JSON object", attributes))?;
    let body = &attributes[..close];

    let mut json = String::with_capacity(attributes.len() + 16);
    json.push_str(body);
    if body.trim_end().ends_with('{') {
        return Ok(json);
    }
    json.push(',');
    Ok(json)
}

/// One `chef-client` command line switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChefClientOption {
    pub flag: &'static str,
    pub value: Option<String>,
}

impl ChefClientOption {
    fn switch(flag: &'static str) -> Self {
        Self { flag, value: None }
    }

    fn with_value(flag: &'static str, value: impl ToString) -> Self {
        Self {
            flag,
            value: Some(value.to_string()),
        }
    }
}

impl fmt::Display for ChefClientOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{} {}", self.flag, value),
            None => f.write_str(self.flag),
        }
    }
}

/// Switches in the order `chef-client` receives them.
pub fn chef_client_options(config: &BootstrapConfig, first_boot_path: &str) -> Vec<ChefClientOption> {
    let mut options = vec![ChefClientOption::with_value("-j", first_boot_path)];
    if let Some(environment) = config.environment() {
        options.push(ChefClientOption::with_value("-E", environment));
    }
    if let Some(interval) = config.interval() {
        options.push(ChefClientOption::with_value("-i", interval));
    }
    if let Some(splay) = config.splay() {
        options.push(ChefClientOption::with_value("-s", splay));
    }
    if config.daemonize() {
        options.push(ChefClientOption::switch("-d"));
    }
    options
}

pub fn render_chef_client_command(config: &BootstrapConfig, first_boot_path: &str) -> String {
    chef_client_options(config, first_boot_path)
        .iter()
        .fold(String::from("chef-client"), |mut command, option| {
            command.push(' ');
            command.push_str(&option.to_string());
            command
        })
}
