use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use membership_advisor::config::{Config, ConfigOverrides};
use membership_advisor::output::csv::{breakdown_to_csv, savings_to_csv};
use membership_advisor::output::json::render_json;
use membership_advisor::output::table::{
    render_promo_banner, render_quote_table, render_savings_table, render_welcome_table,
};
use membership_advisor::pricing::admission::determine_primary_location;
use membership_advisor::pricing::calculator::calculate_membership_costs;
use membership_advisor::pricing::discount::{
    guest_admission_savings, promotion_banner, welcome_program_pricing,
};
use membership_advisor::pricing::{GuestSavings, PromoBanner, Recommendation, WelcomeQuote};
use membership_advisor::server::run_server;
use membership_advisor::types::{Location, QuoteRequest, WelcomeMode};
use tracing::warn;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum WelcomeModeArg {
    Membership,
    SingleVisit,
}

impl From<WelcomeModeArg> for WelcomeMode {
    fn from(value: WelcomeModeArg) -> Self {
        match value {
            WelcomeModeArg::Membership => WelcomeMode::Membership,
            WelcomeModeArg::SingleVisit => WelcomeMode::SingleVisit,
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "membership-advisor",
    about = "Membership plan recommendations for the Discovery Place network"
)]
struct Cli {
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
    /// Override the promotional discount rate for what-if runs.
    #[arg(long = "discount-rate")]
    discount_rate: Option<f64>,
    /// Override the discount member threshold for what-if runs.
    #[arg(long = "minimum-members")]
    minimum_members: Option<u32>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, clap::Args, Clone)]
struct FamilyArgs {
    #[arg(long, default_value_t = 2)]
    adults: u32,
    #[arg(long, default_value_t = 2)]
    children: u32,
    /// Comma-separated child ages, e.g. "5,7".
    #[arg(long, default_value = "5,7")]
    ages: String,
    #[arg(long, default_value_t = 4)]
    science: u32,
    #[arg(long, default_value_t = 2)]
    dpkh: u32,
    #[arg(long, default_value_t = 0)]
    dpkr: u32,
    #[arg(long = "richmond-resident")]
    richmond_resident: bool,
    #[arg(long)]
    flexibility: bool,
    #[arg(long = "welcome-eligible")]
    welcome_eligible: bool,
    /// Parking at Science is included unless this is set.
    #[arg(long = "no-parking")]
    no_parking: bool,
}

impl FamilyArgs {
    fn to_request(&self) -> Result<QuoteRequest> {
        Ok(QuoteRequest {
            adult_count: self.adults,
            children_count: self.children,
            child_ages: parse_age_list(&self.ages)?,
            science_visits: self.science,
            dpkh_visits: self.dpkh,
            dpkr_visits: self.dpkr,
            is_richmond_resident: self.richmond_resident,
            needs_flexibility: self.flexibility,
            is_welcome_eligible: self.welcome_eligible,
            include_parking: !self.no_parking,
        })
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Price every plan and recommend the cheapest.
    Quote {
        #[command(flatten)]
        family: FamilyArgs,
    },
    /// Resolve the most-visited site for a visit plan.
    PrimaryLocation {
        #[arg(long, default_value_t = 0)]
        science: u32,
        #[arg(long, default_value_t = 0)]
        dpkh: u32,
        #[arg(long, default_value_t = 0)]
        dpkr: u32,
    },
    /// Guest-admission savings a membership would unlock.
    Savings {
        #[command(flatten)]
        family: FamilyArgs,
    },
    /// Welcome Program pricing on its own.
    Welcome {
        #[command(flatten)]
        family: FamilyArgs,
        #[arg(long, value_enum, default_value_t = WelcomeModeArg::Membership)]
        mode: WelcomeModeArg,
        /// Anchor location; defaults to the most-visited site.
        #[arg(long)]
        location: Option<String>,
    },
    /// Show the current promotion banner.
    Promo,
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[arg(long, default_value_t = 3001)]
        port: u16,
    },
    Config {
        #[arg(long)]
        init: bool,
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load(Some(&config_path))?;
    config.apply_overrides(ConfigOverrides {
        discount_rate: cli.discount_rate,
        minimum_members: cli.minimum_members,
    });
    config.validate()?;

    if matches!(cli.command, Commands::Config { .. }) {
        return handle_config_command(&cli.command, &config, &config_path);
    }
    if let Commands::Serve { host, port } = &cli.command {
        let bind = format!("{host}:{port}");
        let addr: SocketAddr = bind
            .parse()
            .map_err(|e| anyhow!("invalid bind address {bind}: {e}"))?;
        return run_server(config, addr).await;
    }

    match &cli.command {
        Commands::Quote { family } => {
            let request = validated_request(family, &config)?;
            let recommendation = calculate_membership_costs(&config, &request);
            print_quote(&recommendation, cli.output)?;
        }
        Commands::PrimaryLocation {
            science,
            dpkh,
            dpkr,
        } => {
            let primary = determine_primary_location(*science, *dpkh, *dpkr);
            match cli.output {
                OutputFormat::Table => println!("{} ({})", primary, primary.label()),
                OutputFormat::Json | OutputFormat::Csv => {
                    println!("{}", render_json(&primary)?)
                }
            }
        }
        Commands::Savings { family } => {
            let request = validated_request(family, &config)?;
            let primary = determine_primary_location(
                request.science_visits,
                request.dpkh_visits,
                request.dpkr_visits,
            );
            let savings = guest_admission_savings(&config, &request, primary);
            print_savings(&savings, cli.output)?;
        }
        Commands::Welcome {
            family,
            mode,
            location,
        } => {
            let request = validated_request(family, &config)?;
            let anchor = match location {
                Some(raw) => Location::from_str(raw)?,
                None => determine_primary_location(
                    request.science_visits,
                    request.dpkh_visits,
                    request.dpkr_visits,
                ),
            };
            let quote = welcome_program_pricing(&config, &request, (*mode).into(), anchor);
            print_welcome(&quote, cli.output)?;
        }
        Commands::Promo => {
            let banner = promotion_banner(&config);
            print_promo(&banner, cli.output)?;
        }
        Commands::Config { .. } => {}
        Commands::Serve { .. } => unreachable!("serve command handled before dispatch"),
    }

    Ok(())
}

fn handle_config_command(command: &Commands, config: &Config, config_path: &PathBuf) -> Result<()> {
    let Commands::Config { init, show } = command else {
        return Ok(());
    };
    if *init {
        Config::write_template(config_path)?;
        println!("Wrote config template to {}", config_path.display());
    }
    if *show || !*init {
        println!("{}", render_json(config)?);
    }
    Ok(())
}

fn validated_request(family: &FamilyArgs, config: &Config) -> Result<QuoteRequest> {
    let request = family.to_request()?;
    request.validate(config)?;
    Ok(request)
}

fn parse_age_list(raw: &str) -> Result<Vec<u8>> {
    let mut ages = Vec::new();
    for piece in raw.split(',') {
        let trimmed = piece.trim();
        if trimmed.is_empty() {
            continue;
        }
        let age: u8 = trimmed
            .parse()
            .map_err(|_| anyhow!("invalid child age: {trimmed}"))?;
        ages.push(age);
    }
    Ok(ages)
}

fn print_quote(recommendation: &Recommendation, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_quote_table(recommendation)),
        OutputFormat::Json => println!("{}", render_json(recommendation)?),
        OutputFormat::Csv => println!("{}", breakdown_to_csv(recommendation)?),
    }
    Ok(())
}

fn print_savings(savings: &GuestSavings, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_savings_table(savings)),
        OutputFormat::Json => println!("{}", render_json(savings)?),
        OutputFormat::Csv => println!("{}", savings_to_csv(savings)?),
    }
    Ok(())
}

fn print_welcome(quote: &WelcomeQuote, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_welcome_table(quote)),
        OutputFormat::Json => println!("{}", render_json(quote)?),
        OutputFormat::Csv => {
            warn!("CSV output for welcome not implemented, using JSON");
            println!("{}", render_json(quote)?);
        }
    }
    Ok(())
}

fn print_promo(banner: &PromoBanner, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_promo_banner(banner)),
        OutputFormat::Json => println!("{}", render_json(banner)?),
        OutputFormat::Csv => {
            warn!("CSV output for promo not implemented, using JSON");
            println!("{}", render_json(banner)?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::parse_age_list;

    #[test]
    fn parses_age_lists() {
        assert_eq!(parse_age_list("5,7").expect("ages parse"), vec![5, 7]);
        assert_eq!(parse_age_list(" 3 , 11 ").expect("ages parse"), vec![3, 11]);
        assert!(parse_age_list("").expect("empty list parses").is_empty());
        assert!(parse_age_list("five").is_err());
    }
}
