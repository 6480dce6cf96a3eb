use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
mod auth;
use scryptpw::{Hasher, HasherConfig, ParamRule, ScryptParams, config::default_config_path};
use std::path::PathBuf;

#[derive(Debug, clap::Args)]
struct CostArgs {
    /// CPU/memory cost, a power of 2 (default: 16384)
    #[arg(short = 'N', long = "cost")]
    n: Option<u64>,

    /// Block size (default: 8)
    #[arg(short = 'r', long = "block-size")]
    r: Option<u64>,

    /// Parallelism (default: 2)
    #[arg(short = 'p', long = "parallelism")]
    p: Option<u64>,
}

impl CostArgs {
    fn to_params(&self, default: &ScryptParams, rule: ParamRule) -> Result<ScryptParams> {
        Ok(ScryptParams::with_rule(
            self.n.unwrap_or(default.n()),
            self.r.unwrap_or(default.r()),
            self.p.unwrap_or(default.p()),
            rule,
        )?)
    }
}

fn resolve_config(path: Option<PathBuf>) -> Result<HasherConfig> {
    let mut config = match path {
        Some(p) => HasherConfig::load(&p)?,
        None => HasherConfig::load_or_default(&default_config_path()?)?,
    };
    config.apply_env()?;
    Ok(config)
}

#[derive(Debug, Parser)]
#[command(name = "scryptpw")]
#[command(version, about = "Hash and verify passwords with scrypt.")]
struct Cli {
    /// Path to a JSON config file
    #[arg(long, global = true, value_name = "PATH", env = "SCRYPTPW_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Hashes a password into a storable record
    Hash {
        /// Salt to use instead of a random one
        #[arg(long)]
        salt: Option<String>,

        #[command(flatten)]
        cost: CostArgs,
    },

    /// Checks a password against a record
    #[command(arg_required_else_help = true)]
    Check { record: String },

    /// Prints a random salt
    Salt {
        /// Number of random bytes (default: 8)
        #[arg(short, long)]
        length: Option<usize>,
    },
}

fn main() -> Result<()> {
    // .env may set RUST_LOG
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Cli::parse();
    let config = resolve_config(args.config.clone())?;
    let hasher = Hasher::from_config(&config);

    match args.command {
        Commands::Hash { salt, cost } => {
            let params = cost.to_params(hasher.params(), hasher.rule())?;
            let password = auth::read_password()?;
            let record = hasher.hash_with_params(&password, salt.as_deref(), params)?;
            println!("{record}");
        }
        Commands::Check { record } => {
            let password = auth::read_password()?;
            if !hasher.check(&password, &record)? {
                bail!("password does not match");
            }
            println!("password matches");
        }
        Commands::Salt { length } => {
            let salt = hasher.generate_salt(length.unwrap_or(config.salt_length))?;
            println!("{salt}");
        }
    }

    Ok(())
}
