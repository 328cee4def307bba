use super::{
    Cli,
    commands::{Command, ConfigCommand},
};
use crate::{
    Result,
    compiler::{Dialect, ScriptOptions},
    config::Config,
    handlers::{self, record::RecordOptions},
    output,
};

fn resolve_dialect(requested: Option<&str>, config: &Config) -> Result<Dialect> {
    match requested {
        Some(name) => name.parse(),
        None => config.dialect(),
    }
}

pub async fn dispatch(mut cli: Cli, config: Config) -> Result<()> {
    let command = match cli.command.take() {
        Some(cmd) => cmd,
        None => {
            eprintln!("No command provided. Use --help for usage.");
            std::process::exit(1);
        }
    };

    let pretty = config.output.json_pretty;

    match command {
        Command::Record {
            url,
            dialect,
            duration,
            output: out,
            save,
            ..
        } => {
            let dialect = resolve_dialect(dialect.as_deref(), &config)?;
            let result = handlers::record::handle_record(
                &config,
                RecordOptions {
                    url,
                    dialect,
                    duration,
                    output: out,
                    save_report: save,
                },
            )
            .await?;
            output::print_output(&result, cli.json, pretty)
        }
        Command::Compile {
            input,
            url,
            dialect,
            suite,
            name,
            output: out,
        } => {
            let dialect = resolve_dialect(dialect.as_deref(), &config)?;
            let defaults = config.output.script_options();
            let options = ScriptOptions {
                suite_name: suite.unwrap_or(defaults.suite_name),
                test_name: name.unwrap_or(defaults.test_name),
            };
            let result =
                handlers::compile::handle_compile(&input, url.as_deref(), dialect, &options, out)?;
            output::print_output(&result, cli.json, pretty)
        }
        Command::Inspect { input, step } => {
            let result = handlers::inspect::handle_inspect(&input, step)?;
            output::print_output(&result, cli.json, pretty)
        }
        Command::Dialects => {
            let result = handlers::compile::handle_dialects(config.dialect()?);
            output::print_output(&result, cli.json, pretty)
        }
        Command::Config { subcommand } => handle_config_command(subcommand, &cli, &config),
    }
}

fn handle_config_command(subcommand: ConfigCommand, cli: &Cli, config: &Config) -> Result<()> {
    match subcommand {
        ConfigCommand::Init => {
            let result = handlers::config_handler::handle_config_init()?;
            output::print_output(&result, cli.json, true)
        }
        ConfigCommand::Show => {
            let result = handlers::config_handler::handle_config_show(config)?;
            output::print_output(&result, cli.json, true)
        }
        ConfigCommand::Edit => {
            let result = handlers::config_handler::handle_config_edit()?;
            output::print_output(&result, cli.json, true)
        }
        ConfigCommand::Path => {
            let result = handlers::config_handler::handle_config_path()?;
            output::print_output(&result, cli.json, true)
        }
    }
}
