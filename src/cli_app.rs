//! Top-level CLI definition and dispatch.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell as CompletionShell, generate};
use colored::{Colorize, control};
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;

use vgw_manager::accounts::{Role, User};
use vgw_manager::core::config::Config;
use vgw_manager::core::errors::VgwError;
use vgw_manager::dataset::BucketSpec;
use vgw_manager::logger::diagnostics::{self, DiagnosticSink};
use vgw_manager::ops::provision::{self, completed_steps};
use vgw_manager::ops::{ProvisionRequest, RemovalPath, Services};
use vgw_manager::tui::theme::ColorMode;
use vgw_manager::tui::{SessionConfig, run_session};

/// Administration for a ZFS-backed S3 gateway. Without a subcommand, starts the
/// interactive session.
#[derive(Debug, Parser)]
#[command(
    name = "vgwm",
    author,
    version,
    about = "VersityGW Manager - users, buckets, ownership and public-read policies",
    long_about = None
)]
pub struct Cli {
    /// Override config file path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Force JSON output mode.
    #[arg(long, global = true)]
    json: bool,
    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
    /// Increase verbosity.
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// List all users and exit.
    ListUsers,
    /// List all buckets (datasets merged with the gateway's view) and exit.
    ListBuckets,
    /// Create a user, create a bucket, and set the bucket owner.
    Provision(ProvisionArgs),
    /// Create a new user.
    CreateUser(CreateUserArgs),
    /// Create a new bucket dataset.
    CreateBucket(CreateBucketArgs),
    /// Change a bucket's owner.
    ChangeOwner(ChangeOwnerArgs),
    /// Attach the public-read policy to a bucket.
    MakePublic(MakePublicArgs),
    /// Remove a bucket's policy.
    MakePrivate(BucketArg),
    /// Delete a user.
    DeleteUser(AccessArg),
    /// Delete a bucket (dataset first, then the gateway API).
    DeleteBucket(BucketArg),
    /// Show version.
    Version,
    /// Generate shell completions.
    Completions(CompletionsArgs),
    /// Launch the interactive session.
    Tui,
}

#[derive(Debug, Clone, Args, Serialize, Default)]
struct ProvisionArgs {
    /// Access key (user name).
    #[arg(long, default_value = "")]
    access: String,
    /// Secret key; generated when empty.
    #[arg(long, default_value = "")]
    secret: String,
    /// Role: admin, user, or userplus.
    #[arg(long, default_value = "user")]
    role: String,
    /// Numeric user ID.
    #[arg(long, default_value_t = 0)]
    uid: i64,
    /// Numeric group ID.
    #[arg(long, default_value_t = 0)]
    gid: i64,
    /// Project ID.
    #[arg(long, default_value_t = 0)]
    project_id: i64,
    /// Bucket name.
    #[arg(long, default_value = "")]
    bucket: String,
    /// Bucket quota (e.g. 2T, 500G).
    #[arg(long, default_value = "")]
    quota: String,
    /// Bucket owner access key; defaults to the access key.
    #[arg(long, default_value = "")]
    owner: String,
}

#[derive(Debug, Clone, Args, Serialize, Default)]
struct CreateUserArgs {
    /// Access key (user name).
    #[arg(long)]
    access: Option<String>,
    /// Secret key.
    #[arg(long)]
    secret: Option<String>,
    /// Role: admin, user, or userplus.
    #[arg(long, default_value = "user")]
    role: String,
    /// Numeric user ID.
    #[arg(long, default_value_t = 0)]
    uid: i64,
    /// Numeric group ID.
    #[arg(long, default_value_t = 0)]
    gid: i64,
    /// Project ID.
    #[arg(long, default_value_t = 0)]
    project_id: i64,
}

#[derive(Debug, Clone, Args, Serialize, Default)]
struct CreateBucketArgs {
    /// Bucket name.
    #[arg(long)]
    bucket: Option<String>,
    /// Bucket quota (e.g. 2T, 500G).
    #[arg(long)]
    quota: Option<String>,
    /// Owner access key.
    #[arg(long)]
    owner: Option<String>,
}

#[derive(Debug, Clone, Args, Serialize, Default)]
struct ChangeOwnerArgs {
    /// Bucket name.
    #[arg(long)]
    bucket: Option<String>,
    /// New owner access key.
    #[arg(long)]
    owner: Option<String>,
}

#[derive(Debug, Clone, Args, Serialize, Default)]
struct MakePublicArgs {
    /// Bucket name.
    #[arg(long)]
    bucket: Option<String>,
    /// Owner named in the policy; looked up from the bucket ACL when omitted.
    #[arg(long)]
    owner: Option<String>,
}

#[derive(Debug, Clone, Args, Serialize, Default)]
struct BucketArg {
    /// Bucket name.
    #[arg(long)]
    bucket: Option<String>,
}

#[derive(Debug, Clone, Args, Serialize, Default)]
struct AccessArg {
    /// Access key (user name).
    #[arg(long)]
    access: Option<String>,
}

#[derive(Debug, Clone, Args)]
struct CompletionsArgs {
    /// Shell to generate completion script for.
    #[arg(value_enum)]
    shell: CompletionShell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Human,
    Json,
}

/// CLI error type with explicit exit-code mapping.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid user input or configuration.
    #[error("{0}")]
    User(String),
    /// Gateway, dataset tool, or environment failure.
    #[error("{0}")]
    Runtime(String),
    /// Internal bug or invariant violation.
    #[error("{0}")]
    Internal(String),
    /// Operation partially succeeded.
    #[error("{0}")]
    Partial(String),
    /// JSON serialization failed.
    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
    /// Output write failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Process exit code contract for the CLI.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::User(_) => 1,
            Self::Runtime(_) | Self::Io(_) => 2,
            Self::Internal(_) | Self::Json(_) => 3,
            Self::Partial(_) => 4,
        }
    }

    /// Map a library failure, prefixed with what was being attempted.
    fn from_vgw(context: &str, err: &VgwError) -> Self {
        let message = format!("{context}: {}", err.message());
        match err {
            VgwError::Validation { .. }
            | VgwError::InvalidConfig { .. }
            | VgwError::MissingConfig { .. }
            | VgwError::ConfigParse { .. } => Self::User(message),
            VgwError::Serialization { .. } => Self::Internal(message),
            VgwError::Step { .. } if !completed_steps(err).is_empty() => Self::Partial(message),
            _ => Self::Runtime(message),
        }
    }
}

/// Dispatch CLI commands.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    if cli.no_color {
        control::set_override(false);
    }

    match &cli.command {
        None | Some(Command::Tui) => run_tui(cli),
        Some(command) => {
            init_diagnostics(DiagnosticSink::Stderr, cli.verbose)?;
            match command {
                Command::Version => emit_version(cli),
                Command::Completions(args) => {
                    let mut command = Cli::command();
                    let binary_name = command.get_name().to_string();
                    generate(args.shell, &mut command, binary_name, &mut io::stdout());
                    Ok(())
                }
                Command::Provision(args) => run_provision(cli, args),
                Command::CreateUser(args) => run_create_user(cli, args),
                Command::CreateBucket(args) => run_create_bucket(cli, args),
                Command::ChangeOwner(args) => run_change_owner(cli, args),
                Command::MakePublic(args) => run_make_public(cli, args),
                Command::MakePrivate(args) => run_make_private(cli, args),
                Command::DeleteUser(args) => run_delete_user(cli, args),
                Command::DeleteBucket(args) => run_delete_bucket(cli, args),
                Command::ListUsers => run_list_users(cli),
                Command::ListBuckets => run_list_buckets(cli),
                Command::Tui => run_tui(cli),
            }
        }
    }
}

fn init_diagnostics(sink: DiagnosticSink<'_>, verbose: bool) -> Result<(), CliError> {
    diagnostics::init(sink, verbose).map_err(|err| CliError::Runtime(err.message()))
}

fn load_config(cli: &Cli) -> Result<Config, CliError> {
    Config::load(cli.config.as_deref())
        .map_err(|err| CliError::from_vgw("Error loading config", &err))
}

fn services(config: &Config) -> Result<Services, CliError> {
    Services::from_config(config).map_err(|err| CliError::from_vgw("Error initializing", &err))
}

/// Empty or missing flags fail with `message` before any mutation.
fn required<'a>(value: Option<&'a str>, message: &str) -> Result<&'a str, CliError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(CliError::User(format!("Error: {message}"))),
    }
}

fn warn_line(message: &str) {
    eprintln!("{}", message.yellow());
}

// ──────────────────── interactive session ────────────────────

fn run_tui(cli: &Cli) -> Result<(), CliError> {
    let config = load_config(cli)?;
    match &config.logging.diagnostic_log {
        Some(path) => init_diagnostics(DiagnosticSink::File(path), cli.verbose)?,
        None => init_diagnostics(DiagnosticSink::Discard, cli.verbose)?,
    }
    let mut services = services(&config)?;
    let session = SessionConfig {
        page_size: config.ui.page_size,
        color: ColorMode::resolve(cli.no_color),
    };
    run_session(&mut services, session)
        .map_err(|err| CliError::Runtime(format!("Error running application: {err}")))
}

// ──────────────────── users ────────────────────

fn run_create_user(cli: &Cli, args: &CreateUserArgs) -> Result<(), CliError> {
    let message = "--access and --secret are required for create-user";
    let access = required(args.access.as_deref(), message)?;
    let secret = required(args.secret.as_deref(), message)?;
    let role: Role = args
        .role
        .parse()
        .map_err(|err: VgwError| CliError::User(format!("Error: {}", err.message())))?;

    let config = load_config(cli)?;
    let mut services = services(&config)?;
    let user = User {
        access: access.to_string(),
        secret: secret.to_string(),
        role: role.as_str().to_string(),
        user_id: args.uid,
        group_id: args.gid,
        project_id: args.project_id,
    };
    services
        .create_user(&user)
        .map_err(|err| CliError::from_vgw("Error creating user", &err))?;
    println!("User '{access}' created successfully.");
    Ok(())
}

fn run_delete_user(cli: &Cli, args: &AccessArg) -> Result<(), CliError> {
    let access = required(args.access.as_deref(), "--access is required for delete-user")?;
    let config = load_config(cli)?;
    let mut services = services(&config)?;
    services
        .delete_user(access)
        .map_err(|err| CliError::from_vgw("Error deleting user", &err))?;
    println!("User '{access}' deleted successfully.");
    Ok(())
}

fn run_list_users(cli: &Cli) -> Result<(), CliError> {
    let config = load_config(cli)?;
    let services = services(&config)?;
    let users = services
        .list_users()
        .map_err(|err| CliError::from_vgw("Error listing users", &err))?;

    match output_mode(cli) {
        OutputMode::Json => write_json_line(&serde_json::to_value(&users)?)?,
        OutputMode::Human => {
            let mut stdout = io::stdout().lock();
            writeln!(
                stdout,
                "{}",
                format!("{:<30} {:<45} {:<15}", "ACCESS KEY", "SECRET KEY", "ROLE").bold()
            )?;
            writeln!(stdout, "{}", "─".repeat(92))?;
            for user in &users {
                writeln!(
                    stdout,
                    "{:<30} {:<45} {:<15}",
                    user.access, user.secret, user.role
                )?;
            }
        }
    }
    Ok(())
}

// ──────────────────── buckets ────────────────────

fn run_create_bucket(cli: &Cli, args: &CreateBucketArgs) -> Result<(), CliError> {
    let message = "--bucket and --quota are required for create-bucket";
    let bucket = required(args.bucket.as_deref(), message)?;
    let quota = required(args.quota.as_deref(), message)?;
    let owner = args.owner.as_deref().map(str::trim).unwrap_or_default();
    if owner.is_empty() {
        warn_line(
            "Warning: No owner specified for bucket, using 'root' or creating without explicit owner change.",
        );
    }

    let config = load_config(cli)?;
    let mut services = services(&config)?;
    services
        .create_bucket(&BucketSpec::new(bucket, quota))
        .map_err(|err| CliError::from_vgw("Error creating ZFS bucket", &err))?;

    if !owner.is_empty() {
        match services.change_owner(bucket, owner) {
            Ok(()) => println!("Bucket '{bucket}' created with owner '{owner}'."),
            Err(err) => warn_line(&format!(
                "Warning: Bucket created but failed to set owner: {}",
                err.message()
            )),
        }
        return Ok(());
    }
    println!("Bucket '{bucket}' created.");
    Ok(())
}

fn run_delete_bucket(cli: &Cli, args: &BucketArg) -> Result<(), CliError> {
    let bucket = required(args.bucket.as_deref(), "--bucket is required for delete-bucket")?;
    let config = load_config(cli)?;
    let mut services = services(&config)?;
    let path = services
        .remove_bucket(bucket)
        .map_err(|err| CliError::from_vgw("Error deleting bucket", &err))?;
    match path {
        RemovalPath::Dataset => println!("Bucket '{bucket}' deleted (via ZFS)."),
        RemovalPath::Api { dataset_error } => {
            eprintln!("ZFS delete failed ({dataset_error}), attempting API delete...");
            println!("Bucket '{bucket}' deleted (via API).");
        }
    }
    Ok(())
}

fn run_change_owner(cli: &Cli, args: &ChangeOwnerArgs) -> Result<(), CliError> {
    let message = "--bucket and --owner are required for change-owner";
    let bucket = required(args.bucket.as_deref(), message)?;
    let owner = required(args.owner.as_deref(), message)?;
    let config = load_config(cli)?;
    let mut services = services(&config)?;
    services
        .change_owner(bucket, owner)
        .map_err(|err| CliError::from_vgw("Error changing owner", &err))?;
    println!("Owner of bucket '{bucket}' changed to '{owner}'.");
    Ok(())
}

fn run_make_public(cli: &Cli, args: &MakePublicArgs) -> Result<(), CliError> {
    let bucket = required(args.bucket.as_deref(), "--bucket is required for make-public")?;
    let config = load_config(cli)?;
    let mut services = services(&config)?;

    let owner = match args.owner.as_deref().map(str::trim).filter(|o| !o.is_empty()) {
        Some(owner) => owner.to_string(),
        None => match services.bucket_owner(bucket) {
            Ok(owner) if !owner.is_empty() => owner,
            _ => {
                return Err(CliError::User(
                    "Error resolving owner for policy generation. Please specify --owner explicitly."
                        .to_string(),
                ));
            }
        },
    };

    services
        .make_public(bucket, &owner)
        .map_err(|err| CliError::from_vgw("Error making bucket public", &err))?;
    println!("Bucket '{bucket}' is now PUBLIC.");
    Ok(())
}

fn run_make_private(cli: &Cli, args: &BucketArg) -> Result<(), CliError> {
    let bucket = required(args.bucket.as_deref(), "--bucket is required for make-private")?;
    let config = load_config(cli)?;
    let mut services = services(&config)?;
    services
        .make_private(bucket)
        .map_err(|err| CliError::from_vgw("Error removing policy", &err))?;
    println!("Bucket '{bucket}' is now PRIVATE (policy removed).");
    Ok(())
}

fn run_list_buckets(cli: &Cli) -> Result<(), CliError> {
    let config = load_config(cli)?;
    let services = services(&config)?;
    let buckets = services
        .list_buckets()
        .map_err(|err| CliError::from_vgw("Error listing buckets", &err))?;

    match output_mode(cli) {
        OutputMode::Json => write_json_line(&serde_json::to_value(&buckets)?)?,
        OutputMode::Human => {
            let mut stdout = io::stdout().lock();
            writeln!(
                stdout,
                "{}",
                format!(
                    "{:<30} {:<20} {:<15} {:<15} {:<15}",
                    "NAME", "OWNER", "QUOTA", "USED", "AVAILABLE"
                )
                .bold()
            )?;
            writeln!(stdout, "{}", "─".repeat(97))?;
            for bucket in &buckets {
                writeln!(
                    stdout,
                    "{:<30} {:<20} {:<15} {:<15} {:<15}",
                    bucket.name, bucket.owner, bucket.quota, bucket.used, bucket.available
                )?;
            }
        }
    }
    Ok(())
}

// ──────────────────── provisioning ────────────────────

impl From<&ProvisionArgs> for ProvisionRequest {
    fn from(args: &ProvisionArgs) -> Self {
        Self {
            access: args.access.trim().to_string(),
            secret: args.secret.trim().to_string(),
            role: args.role.trim().to_string(),
            user_id: args.uid,
            group_id: args.gid,
            project_id: args.project_id,
            bucket: args.bucket.trim().to_string(),
            quota: args.quota.trim().to_string(),
            owner: args.owner.trim().to_string(),
        }
    }
}

fn run_provision(cli: &Cli, args: &ProvisionArgs) -> Result<(), CliError> {
    let req = ProvisionRequest::from(args);
    provision::validate(&req)
        .map_err(|err| CliError::from_vgw("Error provisioning user/bucket", &err))?;

    let config = load_config(cli)?;
    let mut services = services(&config)?;
    let summary = services
        .provision(&req)
        .map_err(|err| CliError::from_vgw("Error provisioning user/bucket", &err))?;

    match output_mode(cli) {
        OutputMode::Json => write_json_line(&serde_json::to_value(&summary)?)?,
        OutputMode::Human => {
            println!(
                "User '{}' created with role '{}'",
                summary.access, summary.role
            );
            println!("Secret key: {}", summary.secret);
            println!(
                "Bucket '{}' created with quota {} and owner '{}'",
                summary.bucket, summary.quota, summary.owner
            );
            if summary.secret_generated {
                println!("(Secret key was auto-generated)");
            }
        }
    }
    Ok(())
}

// ──────────────────── version and output ────────────────────

fn emit_version(cli: &Cli) -> Result<(), CliError> {
    let version = env!("CARGO_PKG_VERSION");
    let package = env!("CARGO_PKG_NAME");
    let target = option_env!("TARGET").unwrap_or("unknown");
    let profile = option_env!("PROFILE").unwrap_or("unknown");

    match output_mode(cli) {
        OutputMode::Human => {
            println!("vgw-manager {version}");
            if cli.verbose {
                println!("package: {package}");
                println!("target: {target}");
                println!("profile: {profile}");
            }
        }
        OutputMode::Json => {
            let payload = json!({
                "binary": "vgwm",
                "version": version,
                "package": package,
                "build": {
                    "target": target,
                    "profile": profile,
                }
            });
            write_json_line(&payload)?;
        }
    }
    Ok(())
}

fn write_json_line(payload: &Value) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, payload)?;
    writeln!(stdout)?;
    Ok(())
}

fn output_mode(cli: &Cli) -> OutputMode {
    let env_mode = std::env::var("VGW_OUTPUT_FORMAT").ok();
    resolve_output_mode(cli.json, env_mode.as_deref())
}

/// `--json` wins; otherwise `VGW_OUTPUT_FORMAT`, defaulting to human text.
fn resolve_output_mode(json_flag: bool, env_mode: Option<&str>) -> OutputMode {
    if json_flag {
        return OutputMode::Json;
    }
    match env_mode
        .map(str::trim)
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("json") => OutputMode::Json,
        _ => OutputMode::Human,
    }
}
