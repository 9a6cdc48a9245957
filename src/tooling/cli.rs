//! CLI Tooling
//!
//! Command-line front end over a sled-backed registry. Each invocation runs
//! one registry call on behalf of `--caller` and prints the notifications it
//! produced.

use crate::access::Role;
use crate::agent::{AgentDetails, AgentProfile, IdentityRegistry};
use crate::config::{ConfigLoader, RegistryConfig};
use crate::error::ApiError;
use crate::events::{RegistryEvent, TracingEventSink};
use crate::logging::{LogFormat, LogOutput};
use crate::store::SledStore;
use crate::types::{Address, AgentUuid, TagId};
use clap::{Args, Parser, Subcommand};
use comfy_table::Table;
use std::path::PathBuf;
use std::sync::Arc;

/// Identity registry CLI
#[derive(Parser)]
#[command(name = "identity-registry")]
#[command(about = "Role-gated agent identity registry")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Registry database path (overrides storage.path)
    #[arg(long)]
    pub store: Option<PathBuf>,

    /// Account the call is made from
    #[arg(long)]
    pub caller: Option<Address>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,

    /// Log output
    #[arg(long, value_enum)]
    pub log_output: Option<LogOutput>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Initialize the registry and make ADMIN its first admin
    Init { admin: Address },
    /// Grant a role (admin only)
    Grant { role: Role, account: Address },
    /// Revoke a role (admin only)
    Revoke { role: Role, account: Address },
    /// Drop a role held by the caller
    Renounce { role: Role },
    /// Check whether an account holds a role
    HasRole { role: Role, account: Address },
    /// Register a new agent
    Register(AgentArgs),
    /// Update an existing agent
    Update(AgentArgs),
    /// Set dictionary text for tag ids (pairs --id with --text in order)
    SetTag {
        #[arg(long = "id")]
        ids: Vec<TagId>,
        #[arg(long = "text")]
        texts: Vec<String>,
    },
    /// Toggle tag membership of an agent
    UpdateTags { uuid: AgentUuid, ids: Vec<TagId> },
    /// Show an agent profile
    Show {
        uuid: AgentUuid,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Print the dictionary text of a tag id
    Tag { id: TagId },
    /// Hand a new implementation to the upgrade handler (admin only)
    Upgrade {
        implementation: Address,
        /// Hex-encoded initialization call data
        #[arg(long)]
        init_call: Option<String>,
    },
    /// Show registry name, initialization and implementation
    Info,
    /// Print the effective configuration as TOML
    Config,
}

#[derive(Args, Debug, Clone)]
pub struct AgentArgs {
    #[arg(long)]
    pub uuid: AgentUuid,
    #[arg(long, default_value = "")]
    pub name: String,
    #[arg(long, default_value = "")]
    pub base_url: String,
    #[arg(long, default_value = "")]
    pub description: String,
    #[arg(long, default_value_t = 0)]
    pub version: u64,
    #[arg(long, default_value = "0x0000000000000000000000000000000000000000")]
    pub address: Address,
}

impl AgentArgs {
    fn details(&self) -> AgentDetails {
        AgentDetails {
            name: self.name.clone(),
            base_url: self.base_url.clone(),
            description: self.description.clone(),
            version: self.version,
            onchain_address: self.address,
        }
    }
}

/// CLI context for executing commands
pub struct CliContext {
    registry: IdentityRegistry,
    caller: Option<Address>,
    config: RegistryConfig,
}

impl CliContext {
    /// Open the configured store and wire the registry collaborators.
    pub fn new(
        config: &RegistryConfig,
        store_path: Option<PathBuf>,
        caller: Option<Address>,
    ) -> Result<Self, ApiError> {
        let path = match store_path {
            Some(path) => path,
            None => config.storage.resolve_path()?,
        };
        let store = SledStore::open(&path)?;
        let registry = IdentityRegistry::builder(Arc::new(store))
            .balances(Arc::new(config.balance_oracle()?))
            .events(Arc::new(TracingEventSink))
            .build();
        Ok(Self {
            registry,
            caller,
            config: config.clone(),
        })
    }

    pub fn with_registry(registry: IdentityRegistry, caller: Option<Address>) -> Self {
        Self {
            registry,
            caller,
            config: RegistryConfig::default(),
        }
    }

    pub fn registry(&self) -> &IdentityRegistry {
        &self.registry
    }

    fn caller(&self) -> Result<Address, ApiError> {
        self.caller.ok_or_else(|| {
            ApiError::InvalidArgument("--caller is required for this command".to_string())
        })
    }

    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        tracing::debug!(?command, "Executing command");
        match command {
            Commands::Init { admin } => {
                let events = self.registry.initialize(*admin)?;
                Ok(format_events(&events))
            }
            Commands::Grant { role, account } => {
                let events = self.registry.grant_role(&self.caller()?, *role, *account)?;
                Ok(format_events(&events))
            }
            Commands::Revoke { role, account } => {
                let events = self.registry.revoke_role(&self.caller()?, *role, *account)?;
                Ok(format_events(&events))
            }
            Commands::Renounce { role } => {
                let events = self.registry.renounce_role(&self.caller()?, *role)?;
                Ok(format_events(&events))
            }
            Commands::HasRole { role, account } => {
                Ok(self.registry.has_role(*role, account)?.to_string())
            }
            Commands::Register(args) => {
                let events = self
                    .registry
                    .register(&self.caller()?, args.uuid, args.details())?;
                Ok(format_events(&events))
            }
            Commands::Update(args) => {
                let events = self
                    .registry
                    .update(&self.caller()?, args.uuid, args.details())?;
                Ok(format_events(&events))
            }
            Commands::SetTag { ids, texts } => {
                let events = self.registry.set_tag(&self.caller()?, ids, texts)?;
                Ok(format_events(&events))
            }
            Commands::UpdateTags { uuid, ids } => {
                let events = self.registry.update_tags(&self.caller()?, *uuid, ids)?;
                Ok(format_events(&events))
            }
            Commands::Show { uuid, format } => {
                let profile = self.registry.get_profile(uuid)?;
                match format.as_str() {
                    "json" => serde_json::to_string_pretty(&profile).map_err(|e| {
                        ApiError::InvalidArgument(format!("Failed to render profile: {}", e))
                    }),
                    "text" => Ok(format_profile_text(uuid, &profile)),
                    other => Err(ApiError::InvalidArgument(format!(
                        "Invalid format: {} (must be 'text' or 'json')",
                        other
                    ))),
                }
            }
            Commands::Tag { id } => Ok(self.registry.get_tag_text(*id)?),
            Commands::Upgrade {
                implementation,
                init_call,
            } => {
                let data = match init_call {
                    Some(hex_data) => {
                        let digits = hex_data.strip_prefix("0x").unwrap_or(hex_data);
                        hex::decode(digits).map_err(|e| {
                            ApiError::InvalidArgument(format!("Invalid init call data: {}", e))
                        })?
                    }
                    None => Vec::new(),
                };
                let events = self
                    .registry
                    .upgrade_to(&self.caller()?, *implementation, &data)?;
                Ok(format_events(&events))
            }
            Commands::Info => {
                let implementation = self
                    .registry
                    .implementation()?
                    .map(|a| a.to_string())
                    .unwrap_or_else(|| "-".to_string());
                Ok(format!(
                    "name: {}\ninitialized: {}\nimplementation: {}",
                    self.registry.contract_name(),
                    self.registry.is_initialized()?,
                    implementation
                ))
            }
            Commands::Config => ConfigLoader::render(&self.config),
        }
    }
}

/// One JSON notification per line
fn format_events(events: &[RegistryEvent]) -> String {
    if events.is_empty() {
        return "No changes".to_string();
    }
    events
        .iter()
        .map(|event| serde_json::to_string(event).unwrap_or_else(|_| event.name().to_string()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_profile_text(uuid: &AgentUuid, profile: &AgentProfile) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Field", "Value"]);
    table.add_row(vec!["uuid".to_string(), uuid.to_string()]);
    table.add_row(vec![
        "status".to_string(),
        format!("{:?} ({})", profile.status, profile.status.code()),
    ]);
    table.add_row(vec!["name".to_string(), profile.name.clone()]);
    table.add_row(vec!["base_url".to_string(), profile.base_url.clone()]);
    table.add_row(vec!["description".to_string(), profile.description.clone()]);
    table.add_row(vec!["version".to_string(), profile.version.to_string()]);
    table.add_row(vec!["registered_at".to_string(), format_timestamp(profile.registered_at)]);
    table.add_row(vec!["updated_at".to_string(), format_timestamp(profile.updated_at)]);
    table.add_row(vec![
        "onchain_address".to_string(),
        profile.onchain_address.to_string(),
    ]);
    table.add_row(vec![
        "balance_snapshot".to_string(),
        profile.balance_snapshot.to_string(),
    ]);
    table.add_row(vec!["tags".to_string(), profile.tags.join(", ")]);
    table.to_string()
}

fn format_timestamp(ts: u64) -> String {
    if ts == 0 {
        return "-".to_string();
    }
    match chrono::DateTime::from_timestamp(ts as i64, 0) {
        Some(dt) => format!("{} ({})", ts, dt.to_rfc3339()),
        None => ts.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn context(caller: Option<Address>) -> CliContext {
        let registry = IdentityRegistry::builder(Arc::new(MemoryStore::new())).build();
        CliContext::with_registry(registry, caller)
    }

    #[test]
    fn test_cli_parses_register() {
        let cli = Cli::try_parse_from([
            "identity-registry",
            "--caller",
            "0x0000000000000000000000000000000000000002",
            "register",
            "--uuid",
            "00000000-0000-0000-0000-000000000001",
            "--name",
            "someName",
            "--version",
            "1",
        ])
        .unwrap();
        assert_eq!(cli.caller, Some(Address::from_low_u8(2)));
        assert!(cli.log_output.is_none());
        match cli.command {
            Commands::Register(args) => {
                assert_eq!(args.uuid, AgentUuid::from_u128(1));
                assert_eq!(args.name, "someName");
                assert_eq!(args.version, 1);
                assert!(args.address.is_zero());
            }
            _ => panic!("expected register"),
        }
    }

    #[test]
    fn test_cli_parses_log_flags() {
        let cli = Cli::try_parse_from([
            "identity-registry",
            "--log-format",
            "json",
            "--log-output",
            "file+stderr",
            "info",
        ])
        .unwrap();
        assert_eq!(cli.log_format, Some(LogFormat::Json));
        assert_eq!(cli.log_output, Some(LogOutput::FileAndStderr));
        assert!(Cli::try_parse_from(["identity-registry", "--log-output", "syslog", "info"]).is_err());
    }

    #[test]
    fn test_cli_parses_set_tag_pairs() {
        let cli = Cli::try_parse_from([
            "identity-registry",
            "set-tag",
            "--id",
            "0",
            "--text",
            "TagZero",
            "--id",
            "1",
            "--text",
            "TagOne",
        ])
        .unwrap();
        match cli.command {
            Commands::SetTag { ids, texts } => {
                assert_eq!(ids, vec![0, 1]);
                assert_eq!(texts, vec!["TagZero".to_string(), "TagOne".to_string()]);
            }
            _ => panic!("expected set-tag"),
        }
    }

    #[test]
    fn test_mutating_command_requires_caller() {
        let ctx = context(None);
        assert_eq!(ctx.execute(&Commands::Tag { id: 0 }).unwrap(), "");
        let err = ctx
            .execute(&Commands::Renounce {
                role: Role::Provider,
            })
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidArgument(_)));
    }

    #[test]
    fn test_command_flow() {
        let admin = Address::from_low_u8(1);
        let provider = Address::from_low_u8(2);
        let uuid = AgentUuid::from_u128(1);
        let ctx = context(Some(admin));

        let out = ctx.execute(&Commands::Init { admin }).unwrap();
        assert!(out.contains("Initialized"));
        ctx.execute(&Commands::Grant {
            role: Role::Provider,
            account: provider,
        })
        .unwrap();
        assert_eq!(
            ctx.execute(&Commands::HasRole {
                role: Role::Provider,
                account: provider,
            })
            .unwrap(),
            "true"
        );

        let ctx = CliContext::with_registry(
            IdentityRegistry::builder(Arc::new(MemoryStore::new())).build(),
            Some(provider),
        );
        let err = ctx
            .execute(&Commands::Register(AgentArgs {
                uuid,
                name: "a".to_string(),
                base_url: String::new(),
                description: String::new(),
                version: 0,
                address: Address::ZERO,
            }))
            .unwrap_err();
        assert!(matches!(err, ApiError::Registry(ref e) if e.code() == "Unauthorized"));
    }

    #[test]
    fn test_show_formats() {
        let ctx = context(None);
        let uuid = AgentUuid::from_u128(5);
        let text = ctx
            .execute(&Commands::Show {
                uuid,
                format: "text".to_string(),
            })
            .unwrap();
        assert!(text.contains("Unregistered (0)"));

        let json = ctx
            .execute(&Commands::Show {
                uuid,
                format: "json".to_string(),
            })
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["status"], "Unregistered");
        assert_eq!(value["tags"], serde_json::json!([]));

        assert!(ctx
            .execute(&Commands::Show {
                uuid,
                format: "yaml".to_string(),
            })
            .is_err());
    }

    #[test]
    fn test_config_command_renders_toml() {
        let ctx = context(None);
        let out = ctx.execute(&Commands::Config).unwrap();
        assert!(out.contains("[logging]"));
        assert!(out.contains("level = \"info\""));
    }

    #[test]
    fn test_format_events_empty() {
        assert_eq!(format_events(&[]), "No changes");
    }
}
